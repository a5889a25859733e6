//! Подбор конкретных единиц техники для строк заказа.
//!
//! Пул доступных единиц загружается с сервиса доступности отдельно для
//! каждого товара и живёт только внутри текущего черновика. Статус `rented`
//! выставляется локально при выборе и на сервер не уходит до оформления.
//! Одна единица может быть закреплена только за одной строкой заказа.

use super::aggregate::{LineItem, OrderDraft};
use super::error::{DraftResult, OrderDraftError};
use crate::domain::a002_product::ProductId;
use crate::domain::a003_rental_asset::{AssetId, AssetRef, AssetStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Правило автоматического подбора
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutoAssignStrategy {
    /// Давно обслуживавшиеся первыми (без даты обслуживания считаются самыми старыми)
    Oldest,
    /// Недавно обслуживавшиеся первыми
    Newest,
    /// С наименьшим числом аренд
    LeastUsed,
}

impl AutoAssignStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            AutoAssignStrategy::Oldest => "Oldest first",
            AutoAssignStrategy::Newest => "Newest first",
            AutoAssignStrategy::LeastUsed => "Least used",
        }
    }

    /// Стабильная сортировка: при равенстве сохраняется порядок пула
    fn sort(&self, assets: &mut [AssetRef]) {
        match self {
            AutoAssignStrategy::Oldest => assets.sort_by_key(|a| a.last_maintenance_date),
            AutoAssignStrategy::Newest => {
                assets.sort_by(|a, b| b.last_maintenance_date.cmp(&a.last_maintenance_date))
            }
            AutoAssignStrategy::LeastUsed => assets.sort_by_key(|a| a.usage_count),
        }
    }
}

/// Пулы единиц по товарам в рамках одного черновика
#[derive(Debug, Clone, Default)]
pub struct AssetAssignmentEngine {
    pools: HashMap<ProductId, Vec<AssetRef>>,
}

impl AssetAssignmentEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Загрузить пул товара из ответа сервиса доступности.
    ///
    /// Недоступные по данным сервера единицы отбрасываются. Единицы, уже
    /// закреплённые в черновике, помечаются `rented`; выбранные в строке
    /// единицы, которых больше нет в ответе, остаются в пуле.
    pub fn load_pool(&mut self, draft: &OrderDraft, product_id: ProductId, assets: Vec<AssetRef>) {
        let mut pool: Vec<AssetRef> = assets.into_iter().filter(AssetRef::is_available).collect();

        for asset in pool.iter_mut() {
            if draft.line_holding_asset(asset.asset_id).is_some() {
                asset.status = AssetStatus::Rented;
            }
        }

        if let Some(line) = draft.line(product_id) {
            for selected in &line.selected_assets {
                if !pool.iter().any(|a| a.asset_id == selected.asset_id) {
                    log::warn!(
                        "asset {} selected for {} is no longer reported as available",
                        selected.asset_number,
                        product_id
                    );
                    pool.push(selected.clone());
                }
            }
        }

        log::debug!("loaded {} assets for product {}", pool.len(), product_id);
        self.pools.insert(product_id, pool);
    }

    pub fn pool(&self, product_id: ProductId) -> &[AssetRef] {
        self.pools.get(&product_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_pool(&self, product_id: ProductId) -> bool {
        self.pools.contains_key(&product_id)
    }

    /// Единицы, которые можно показать для выбора в строке товара:
    /// пул без единиц, закреплённых за другими строками
    pub fn selectable_assets(&self, draft: &OrderDraft, product_id: ProductId) -> Vec<AssetRef> {
        self.pool(product_id)
            .iter()
            .filter(|a| match draft.line_holding_asset(a.asset_id) {
                Some(holder) => holder == product_id,
                None => true,
            })
            .cloned()
            .collect()
    }

    /// Выбрать или снять единицу вручную. Возвращает `true`, если единица
    /// теперь выбрана.
    pub fn toggle_manual(
        &mut self,
        draft: &mut OrderDraft,
        product_id: ProductId,
        asset_id: AssetId,
    ) -> DraftResult<bool> {
        let line = tracked_line(draft, product_id)?;

        if line.has_asset(asset_id) {
            line.selected_assets.retain(|a| a.asset_id != asset_id);
            sync_quantity(line);
            self.set_status(asset_id, AssetStatus::Available);
            return Ok(false);
        }

        if let Some(holder) = draft.line_holding_asset(asset_id) {
            return Err(OrderDraftError::AssetHeldByOtherLine { asset_id, holder });
        }

        let asset = self
            .pool(product_id)
            .iter()
            .find(|a| a.asset_id == asset_id)
            .cloned()
            .ok_or(OrderDraftError::AssetNotInPool(asset_id))?;
        if !asset.is_available() {
            return Err(OrderDraftError::AssetUnavailable {
                asset_id,
                status: asset.status.as_str().to_string(),
            });
        }

        self.set_status(asset_id, AssetStatus::Rented);
        let line = tracked_line(draft, product_id)?;
        line.selected_assets.push(AssetRef {
            status: AssetStatus::Rented,
            ..asset
        });
        sync_quantity(line);
        Ok(true)
    }

    /// Автоматический подбор `count` единиц по правилу.
    ///
    /// Выбор строки заменяется целиком; если единиц меньше, чем запрошено,
    /// берутся все. Возвращает число выбранных единиц.
    pub fn auto_assign(
        &mut self,
        draft: &mut OrderDraft,
        product_id: ProductId,
        count: usize,
        strategy: AutoAssignStrategy,
    ) -> DraftResult<usize> {
        tracked_line(draft, product_id)?;

        let mut candidates: Vec<AssetRef> = self
            .pool(product_id)
            .iter()
            .filter(|a| match draft.line_holding_asset(a.asset_id) {
                Some(holder) => holder == product_id,
                None => a.is_available(),
            })
            .cloned()
            .collect();
        strategy.sort(&mut candidates);
        candidates.truncate(count);

        let previous = tracked_line(draft, product_id)?.selected_asset_ids();
        for asset_id in previous {
            self.set_status(asset_id, AssetStatus::Available);
        }
        for asset in &candidates {
            self.set_status(asset.asset_id, AssetStatus::Rented);
        }

        let line = tracked_line(draft, product_id)?;
        line.selected_assets = candidates
            .into_iter()
            .map(|asset| AssetRef {
                status: AssetStatus::Rented,
                ..asset
            })
            .collect();
        sync_quantity(line);

        log::debug!(
            "auto-assigned {} of {} requested assets to {} ({:?})",
            line.selected_assets.len(),
            count,
            product_id,
            strategy
        );
        Ok(line.selected_assets.len())
    }

    /// Снять выбранную единицу со строки
    pub fn remove_asset(
        &mut self,
        draft: &mut OrderDraft,
        product_id: ProductId,
        asset_id: AssetId,
    ) -> DraftResult<()> {
        let selected = draft
            .line(product_id)
            .ok_or(OrderDraftError::LineItemNotFound(product_id))?
            .has_asset(asset_id);
        if !selected {
            return Err(OrderDraftError::AssetNotSelected(asset_id));
        }
        self.toggle_manual(draft, product_id, asset_id).map(|_| ())
    }

    /// Вернуть в пул единицы удалённой строки
    pub fn release_line(&mut self, line: &LineItem) {
        for asset in &line.selected_assets {
            self.set_status(asset.asset_id, AssetStatus::Available);
        }
    }

    /// Привести локальные статусы пулов к выбору в черновике
    /// (после замены строк заказа целиком)
    pub fn sync_statuses(&mut self, draft: &OrderDraft) {
        for asset in self.pools.values_mut().flatten() {
            asset.status = if draft.line_holding_asset(asset.asset_id).is_some() {
                AssetStatus::Rented
            } else {
                AssetStatus::Available
            };
        }
    }

    pub fn clear(&mut self) {
        self.pools.clear();
    }

    /// Локальный статус единицы во всех пулах, где она встречается
    fn set_status(&mut self, asset_id: AssetId, status: AssetStatus) {
        for asset in self.pools.values_mut().flatten() {
            if asset.asset_id == asset_id {
                asset.status = status;
            }
        }
    }
}

fn tracked_line(draft: &mut OrderDraft, product_id: ProductId) -> DraftResult<&mut LineItem> {
    let line = draft
        .line_mut(product_id)
        .ok_or(OrderDraftError::LineItemNotFound(product_id))?;
    if !line.tracks_assets {
        return Err(OrderDraftError::AssetsNotTracked(product_id));
    }
    Ok(line)
}

fn sync_quantity(line: &mut LineItem) {
    line.quantity = line.selected_assets.len() as u32;
    debug_assert!(line.is_quantity_consistent());
}
