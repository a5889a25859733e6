//! Хранилище черновика заказа и его сохранение между сессиями.

use super::aggregate::{DraftPatch, OrderDraft, WizardStep};
use super::error::{DraftResult, OrderDraftError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Версия формата сохранённого черновика
pub const DRAFT_SCHEMA_VERSION: u32 = 1;

/// Сохранённый черновик вместе с временем сохранения
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedDraft {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub draft: OrderDraft,
}

impl PersistedDraft {
    pub fn new(draft: OrderDraft, saved_at: DateTime<Utc>) -> Self {
        Self {
            version: DRAFT_SCHEMA_VERSION,
            saved_at,
            draft,
        }
    }

    pub fn to_json(&self) -> DraftResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Разобрать сохранённый блоб; чужая версия формата считается ошибкой
    pub fn from_json(text: &str) -> DraftResult<Self> {
        let persisted: PersistedDraft = serde_json::from_str(text)?;
        if persisted.version != DRAFT_SCHEMA_VERSION {
            return Err(OrderDraftError::Serialization(format!(
                "unsupported draft version {} (expected {})",
                persisted.version, DRAFT_SCHEMA_VERSION
            )));
        }
        Ok(persisted)
    }
}

/// Key-value хранилище черновика (в браузере это localStorage)
pub trait DraftStorage {
    fn load(&self) -> DraftResult<Option<String>>;
    fn save(&mut self, value: &str) -> DraftResult<()>;
    fn clear(&mut self) -> DraftResult<()>;
}

/// Хранилище в памяти: для тестов и окружений без localStorage
#[derive(Debug, Clone, Default)]
pub struct MemoryDraftStorage {
    pub value: Option<String>,
    /// Имитировать отказ записи
    pub fail_writes: bool,
}

impl MemoryDraftStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStorage for MemoryDraftStorage {
    fn load(&self) -> DraftResult<Option<String>> {
        Ok(self.value.clone())
    }

    fn save(&mut self, value: &str) -> DraftResult<()> {
        if self.fail_writes {
            return Err(OrderDraftError::Storage("quota exceeded".to_string()));
        }
        self.value = Some(value.to_string());
        Ok(())
    }

    fn clear(&mut self) -> DraftResult<()> {
        self.value = None;
        Ok(())
    }
}

/// Черновик в памяти
#[derive(Debug, Clone, Default)]
pub struct DraftStore {
    draft: OrderDraft,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &OrderDraft {
        &self.draft
    }

    /// Изменяемый доступ для движков (подбор единиц, маршрут).
    /// Признак несохранённых изменений выставляет вызывающий контроллер.
    pub(crate) fn draft_mut(&mut self) -> &mut OrderDraft {
        &mut self.draft
    }

    pub fn snapshot(&self) -> OrderDraft {
        self.draft.clone()
    }

    /// Поверхностное слияние: заданные области патча заменяют области черновика
    pub fn merge_update(&mut self, patch: DraftPatch) {
        let DraftPatch {
            customer,
            timing,
            line_items,
            delivery,
            settings,
            damage_waiver,
        } = patch;

        if let Some(customer) = customer {
            self.draft.customer = customer;
        }
        if let Some(timing) = timing {
            self.draft.timing = timing;
        }
        if let Some(line_items) = line_items {
            self.draft.line_items = line_items;
        }
        if let Some(delivery) = delivery {
            self.draft.delivery = delivery;
        }
        if let Some(settings) = settings {
            self.draft.settings = settings;
        }
        if let Some(damage_waiver) = damage_waiver {
            self.draft.damage_waiver = damage_waiver;
        }
        self.mark_dirty();
    }

    pub fn mark_dirty(&mut self) {
        self.draft.draft_meta.is_dirty = true;
    }

    pub fn mark_saved(&mut self, at: DateTime<Utc>) {
        self.draft.draft_meta.last_saved_at = Some(at);
        self.draft.draft_meta.is_dirty = false;
    }

    /// Восстановить черновик из сохранённого блоба
    pub fn restore(&mut self, saved: PersistedDraft) {
        let mut draft = saved.draft;
        // номер шага уже проверен при десериализации; шаг, до которого
        // нельзя дойти по сохранённым отметкам, откатывается назад
        while let Some(previous) = draft.current_step.previous() {
            if draft.completed_steps.contains(previous) {
                break;
            }
            draft.current_step = previous;
        }
        draft.draft_meta.last_saved_at = Some(saved.saved_at);
        draft.draft_meta.is_dirty = false;
        self.draft = draft;
    }

    /// Очистить до пустого черновика
    pub fn reset(&mut self) {
        self.draft = OrderDraft::new();
    }

    pub fn current_step(&self) -> WizardStep {
        self.draft.current_step
    }
}
