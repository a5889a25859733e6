//! Контроллер мастера создания заказа.
//!
//! Все изменения черновика проходят через один путь: слияние в хранилище,
//! перерасчёт валидации, перерасчёт цены, планирование автосохранения.
//! Время передаётся явно, поэтому контроллер не зависит от часов браузера.

use super::aggregate::{
    CustomerSelection, DraftMeta, DraftPatch, LineItem, MaintenanceConfig, OrderDraft,
    OrderTiming, RentalDurationPreset, WizardStep,
};
use super::asset_assignment::{AssetAssignmentEngine, AutoAssignStrategy};
use super::autosave::AutoSaveScheduler;
use super::draft_store::{DraftStorage, DraftStore, PersistedDraft};
use super::error::{DraftResult, OrderDraftError};
use super::pricing::{compute_pricing, PricingSummary};
use super::route_assignment::RouteAssignmentState;
use super::submit::{SubmitOrderRequest, SubmitOrderResponse};
use super::validation::{FieldErrors, ValidationReport};
use crate::domain::a001_customer::CustomerDto;
use crate::domain::a002_product::{ProductDto, ProductId};
use crate::domain::a003_rental_asset::{AssetId, AssetRef};
use crate::domain::a004_delivery_route::{
    DeliveryAddress, GeocodeRequest, GeocodeResponse, RouteId, RouteMatchRequest,
    RouteMatchResponse,
};
use crate::shared::config::WizardConfig;
use crate::shared::request_guard::RequestTicket;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct WizardController<S: DraftStorage> {
    store: DraftStore,
    assets: AssetAssignmentEngine,
    routes: RouteAssignmentState,
    autosave: AutoSaveScheduler,
    storage: S,
    report: ValidationReport,
    pricing: PricingSummary,
    submitting: bool,
}

impl<S: DraftStorage> WizardController<S> {
    pub fn new(storage: S, config: &WizardConfig) -> Self {
        let store = DraftStore::new();
        let report = ValidationReport::compute(store.draft());
        let pricing = compute_pricing(store.draft());
        Self {
            store,
            assets: AssetAssignmentEngine::new(),
            routes: RouteAssignmentState::new(),
            autosave: AutoSaveScheduler::from_config(&config.autosave),
            storage,
            report,
            pricing,
            submitting: false,
        }
    }

    // ------------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------------

    pub fn draft(&self) -> &OrderDraft {
        self.store.draft()
    }

    pub fn current_step(&self) -> WizardStep {
        self.store.current_step()
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn current_errors(&self) -> &FieldErrors {
        self.report.errors(self.current_step())
    }

    pub fn pricing(&self) -> &PricingSummary {
        &self.pricing
    }

    pub fn assets(&self) -> &AssetAssignmentEngine {
        &self.assets
    }

    pub fn routes(&self) -> &RouteAssignmentState {
        &self.routes
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn is_dirty(&self) -> bool {
        self.draft().draft_meta.is_dirty
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn selectable_assets(&self, product_id: ProductId) -> Vec<AssetRef> {
        self.assets.selectable_assets(self.draft(), product_id)
    }

    // ------------------------------------------------------------------------
    // Mutation path
    // ------------------------------------------------------------------------

    fn recompute(&mut self) {
        self.report = ValidationReport::compute(self.store.draft());
        self.pricing = compute_pricing(self.store.draft());
    }

    fn after_mutation(&mut self, now: DateTime<Utc>) {
        self.store.mark_dirty();
        self.recompute();
        self.autosave.note_mutation(now);
    }

    /// Применить патч к черновику.
    ///
    /// Если патч меняет адрес доставки, координаты, подтверждение адреса и
    /// маршрут сбрасываются так же, как при `set_delivery_address`.
    pub fn apply(&mut self, mut patch: DraftPatch, now: DateTime<Utc>) {
        if let Some(delivery) = patch.delivery.as_mut() {
            let address = std::mem::replace(
                &mut delivery.address,
                self.store.draft().delivery.address.clone(),
            );
            self.routes.set_address(delivery, address);
        }
        let replaces_lines = patch.line_items.is_some();

        self.store.merge_update(patch);
        if replaces_lines {
            self.assets.sync_statuses(self.store.draft());
        }
        self.after_mutation(now);
    }

    pub fn set_customer(&mut self, customer: Option<&CustomerDto>, now: DateTime<Utc>) {
        self.apply(DraftPatch::customer(customer.map(CustomerSelection::from)), now);
    }

    pub fn set_timing(&mut self, timing: OrderTiming, now: DateTime<Utc>) {
        self.apply(DraftPatch::timing(timing), now);
    }

    pub fn apply_duration_preset(&mut self, preset: RentalDurationPreset, now: DateTime<Utc>) {
        let mut timing = self.draft().timing.clone();
        timing.apply_preset(preset);
        self.set_timing(timing, now);
    }

    pub fn set_use_expected_return_date(&mut self, enabled: bool, now: DateTime<Utc>) {
        let mut timing = self.draft().timing.clone();
        timing.set_use_expected_return_date(enabled);
        self.set_timing(timing, now);
    }

    // ------------------------------------------------------------------------
    // Line items
    // ------------------------------------------------------------------------

    pub fn add_line_item(&mut self, product: &ProductDto, now: DateTime<Utc>) -> DraftResult<()> {
        if self.draft().line(product.id).is_some() {
            return Err(OrderDraftError::DuplicateLineItem(product.id));
        }
        self.store
            .draft_mut()
            .line_items
            .push(LineItem::from_product(product));
        log::debug!("added product {} ({})", product.name, product.id);
        self.after_mutation(now);
        Ok(())
    }

    pub fn remove_line_item(&mut self, product_id: ProductId, now: DateTime<Utc>) -> DraftResult<()> {
        let lines = &mut self.store.draft_mut().line_items;
        let index = lines
            .iter()
            .position(|l| l.product_id == product_id)
            .ok_or(OrderDraftError::LineItemNotFound(product_id))?;
        let removed = lines.remove(index);
        self.assets.release_line(&removed);
        self.after_mutation(now);
        Ok(())
    }

    /// Количество для товара без поштучного учёта
    pub fn set_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> DraftResult<()> {
        let line = self
            .store
            .draft_mut()
            .line_mut(product_id)
            .ok_or(OrderDraftError::LineItemNotFound(product_id))?;
        if line.tracks_assets {
            return Err(OrderDraftError::QuantityDrivenByAssets(product_id));
        }
        line.quantity = quantity;
        self.after_mutation(now);
        Ok(())
    }

    pub fn set_maintenance_config(
        &mut self,
        product_id: ProductId,
        config: Option<MaintenanceConfig>,
        now: DateTime<Utc>,
    ) -> DraftResult<()> {
        let line = self
            .store
            .draft_mut()
            .line_mut(product_id)
            .ok_or(OrderDraftError::LineItemNotFound(product_id))?;
        line.maintenance_config = config;
        self.after_mutation(now);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Assets
    // ------------------------------------------------------------------------

    /// Загрузить ответ сервиса доступности; черновик не меняется
    pub fn load_asset_pool(&mut self, product_id: ProductId, assets: Vec<AssetRef>) {
        self.assets.load_pool(self.store.draft(), product_id, assets);
    }

    pub fn toggle_asset(
        &mut self,
        product_id: ProductId,
        asset_id: AssetId,
        now: DateTime<Utc>,
    ) -> DraftResult<bool> {
        let selected = self
            .assets
            .toggle_manual(self.store.draft_mut(), product_id, asset_id)?;
        self.after_mutation(now);
        Ok(selected)
    }

    pub fn auto_assign_assets(
        &mut self,
        product_id: ProductId,
        count: usize,
        strategy: AutoAssignStrategy,
        now: DateTime<Utc>,
    ) -> DraftResult<usize> {
        let taken = self
            .assets
            .auto_assign(self.store.draft_mut(), product_id, count, strategy)?;
        self.after_mutation(now);
        Ok(taken)
    }

    pub fn remove_asset(
        &mut self,
        product_id: ProductId,
        asset_id: AssetId,
        now: DateTime<Utc>,
    ) -> DraftResult<()> {
        self.assets
            .remove_asset(self.store.draft_mut(), product_id, asset_id)?;
        self.after_mutation(now);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Delivery & route
    // ------------------------------------------------------------------------

    pub fn set_delivery_address(&mut self, address: DeliveryAddress, now: DateTime<Utc>) {
        if self.draft().delivery.address == address {
            return;
        }
        self.routes
            .set_address(&mut self.store.draft_mut().delivery, address);
        self.after_mutation(now);
    }

    pub fn begin_geocode(&mut self) -> Option<(RequestTicket<String>, GeocodeRequest)> {
        self.routes.begin_geocode(&self.store.draft().delivery)
    }

    pub fn apply_geocode(
        &mut self,
        ticket: &RequestTicket<String>,
        result: Result<GeocodeResponse, String>,
        now: DateTime<Utc>,
    ) -> bool {
        let applied = self
            .routes
            .apply_geocode(&mut self.store.draft_mut().delivery, ticket, result);
        if applied {
            self.after_mutation(now);
        }
        applied
    }

    pub fn begin_route_match(&mut self) -> Option<(RequestTicket<String>, RouteMatchRequest)> {
        let date = self.draft().timing.delivery_date;
        self.routes.begin_match(&self.store.draft().delivery, date)
    }

    pub fn apply_route_match(
        &mut self,
        ticket: &RequestTicket<String>,
        response: RouteMatchResponse,
        now: DateTime<Utc>,
    ) -> bool {
        let applied = self
            .routes
            .apply_match(&mut self.store.draft_mut().delivery, ticket, response);
        if applied {
            self.after_mutation(now);
        }
        applied
    }

    pub fn route_match_failed(
        &mut self,
        ticket: &RequestTicket<String>,
        error: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let applied = self
            .routes
            .match_failed(&mut self.store.draft_mut().delivery, ticket, error);
        if applied {
            self.after_mutation(now);
        }
        applied
    }

    pub fn select_route(
        &mut self,
        route_id: RouteId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> DraftResult<()> {
        self.routes
            .select_route(&mut self.store.draft_mut().delivery, route_id, reason)?;
        self.after_mutation(now);
        Ok(())
    }

    pub fn select_floating_route(&mut self, reason: Option<String>, now: DateTime<Utc>) {
        self.routes
            .select_floating(&mut self.store.draft_mut().delivery, reason);
        self.after_mutation(now);
    }

    pub fn set_override_reason(&mut self, reason: String, now: DateTime<Utc>) {
        self.routes
            .set_override_reason(&mut self.store.draft_mut().delivery, reason);
        self.after_mutation(now);
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    pub fn can_go_next(&self) -> bool {
        let step = self.current_step();
        !step.is_terminal() && self.report.is_step_valid(step)
    }

    /// Шаг доступен, если он не дальше текущего или уже завершён
    pub fn is_step_reachable(&self, step: WizardStep) -> bool {
        step <= self.current_step() || self.draft().completed_steps.contains(step)
    }

    pub fn go_next(&mut self, now: DateTime<Utc>) -> DraftResult<WizardStep> {
        let step = self.current_step();
        let next = step.next().ok_or(OrderDraftError::AtLastStep)?;
        if !self.report.is_step_valid(step) {
            log::debug!(
                "step {} blocked by {} validation errors",
                step.number(),
                self.report.errors(step).len()
            );
            return Err(OrderDraftError::StepInvalid(step));
        }

        let draft = self.store.draft_mut();
        draft.completed_steps.insert(step);
        draft.current_step = next;
        log::info!("wizard step {} -> {}", step.number(), next.number());
        self.after_mutation(now);
        Ok(next)
    }

    pub fn go_previous(&mut self, now: DateTime<Utc>) -> DraftResult<WizardStep> {
        let step = self.current_step();
        let previous = step.previous().ok_or(OrderDraftError::AtFirstStep)?;
        self.store.draft_mut().current_step = previous;
        self.after_mutation(now);
        Ok(previous)
    }

    pub fn go_to_step(&mut self, step: WizardStep, now: DateTime<Utc>) -> DraftResult<()> {
        if !self.is_step_reachable(step) {
            return Err(OrderDraftError::StepNotReachable(step));
        }
        if step != self.current_step() {
            self.store.draft_mut().current_step = step;
            self.after_mutation(now);
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Сохранить черновик. При ошибке хранилища черновик в памяти остаётся
    /// несохранённым.
    pub fn save_draft(&mut self, now: DateTime<Utc>) -> DraftResult<()> {
        let mut draft = self.store.snapshot();
        draft.draft_meta = DraftMeta {
            last_saved_at: Some(now),
            is_dirty: false,
        };
        let result = PersistedDraft::new(draft, now)
            .to_json()
            .and_then(|json| self.storage.save(&json));

        match result {
            Ok(()) => {
                self.autosave.reset();
                self.store.mark_saved(now);
                log::debug!("draft saved at {}", now);
                Ok(())
            }
            Err(e) => {
                log::warn!("failed to save draft: {}", e);
                self.autosave.retry_after_failure(now);
                Err(e)
            }
        }
    }

    /// Срок следующего автосохранения для таймера UI
    pub fn next_autosave_at(&self) -> Option<DateTime<Utc>> {
        if self.is_dirty() {
            self.autosave.deadline()
        } else {
            None
        }
    }

    /// Проверка таймера: сохраняет черновик, если срок наступил.
    /// `None`, если сохранять было нечего.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<DraftResult<()>> {
        if !self.autosave.is_due(now) {
            return None;
        }
        if !self.is_dirty() {
            self.autosave.reset();
            return None;
        }
        Some(self.save_draft(now))
    }

    /// Сохранить несохранённые изменения (закрытие мастера)
    pub fn flush(&mut self, now: DateTime<Utc>) -> DraftResult<()> {
        if self.is_dirty() {
            self.save_draft(now)
        } else {
            Ok(())
        }
    }

    /// Восстановить черновик из хранилища. Повреждённый или чужой блоб
    /// пропускается, мастер начинает с пустого черновика.
    pub fn restore_from_storage(&mut self) -> bool {
        let text = match self.storage.load() {
            Ok(Some(text)) => text,
            Ok(None) => return false,
            Err(e) => {
                log::warn!("failed to read saved draft: {}", e);
                return false;
            }
        };

        match PersistedDraft::from_json(&text) {
            Ok(saved) => {
                let saved_at = saved.saved_at;
                self.store.restore(saved);
                self.assets.clear();
                self.routes.reset();
                self.autosave.reset();
                self.recompute();
                log::info!(
                    "restored draft saved at {} (step {})",
                    saved_at,
                    self.current_step().number()
                );
                true
            }
            Err(e) => {
                log::warn!("ignoring saved draft: {}", e);
                false
            }
        }
    }

    /// Удалить черновик: очистить состояние и хранилище
    pub fn discard_draft(&mut self) -> DraftResult<()> {
        self.store.reset();
        self.assets.clear();
        self.routes.reset();
        self.autosave.reset();
        self.submitting = false;
        self.recompute();
        self.storage.clear()
    }

    // ------------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------------

    pub fn prepare_submission(&mut self) -> DraftResult<SubmitOrderRequest> {
        if self.submitting {
            return Err(OrderDraftError::SubmissionInProgress);
        }
        if !self.current_step().is_terminal() {
            return Err(OrderDraftError::NotAtTerminalStep);
        }
        if !self.report.is_step_valid(WizardStep::Confirm) {
            return Err(OrderDraftError::StepInvalid(WizardStep::Confirm));
        }
        let request = SubmitOrderRequest::build(self.draft(), &self.pricing)
            .ok_or(OrderDraftError::StepInvalid(WizardStep::Confirm))?;
        self.submitting = true;
        Ok(request)
    }

    /// Заказ оформлен: черновик больше не нужен
    pub fn complete_submission(&mut self, response: &SubmitOrderResponse) -> DraftResult<()> {
        log::info!("order {} created", response.order_id);
        self.discard_draft()
    }

    /// Ошибка оформления: черновик остаётся как есть
    pub fn submission_failed(&mut self, error: &str) {
        log::warn!("order submission failed: {}", error);
        self.submitting = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_customer::{BillingAddress, CustomerId};
    use crate::domain::a003_rental_asset::AssetStatus;
    use crate::domain::a004_delivery_route::Route;
    use crate::domain::a005_rental_order::aggregate::{DeliveryDetails, OrderSettings};
    use crate::domain::a005_rental_order::draft_store::MemoryDraftStorage;
    use chrono::{Duration, NaiveDate, TimeZone};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use uuid::Uuid;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn controller() -> WizardController<MemoryDraftStorage> {
        WizardController::new(MemoryDraftStorage::new(), &WizardConfig::default())
    }

    fn customer() -> CustomerDto {
        CustomerDto {
            id: CustomerId::new_v4(),
            name: "Acme Builders".into(),
            email: "ops@acme.test".into(),
            payment_term: Some("30D".into()),
            invoice_run_code: None,
            billing_address: BillingAddress::default(),
        }
    }

    fn product(tracks_assets: bool) -> ProductDto {
        ProductDto {
            id: ProductId::new_v4(),
            name: "Plate compactor".into(),
            sku: "PC-200".into(),
            daily_rate: Decimal::new(10, 0),
            tax_rate_percent: Decimal::new(20, 0),
            quantity_available: 4,
            minimum_rental_period_days: 0,
            rental_days_per_week: 7,
            category: "Compaction".into(),
            tracks_assets,
            sale_price: None,
        }
    }

    fn asset(number: &str) -> AssetRef {
        AssetRef {
            asset_id: AssetId::new_v4(),
            asset_number: number.into(),
            condition: "good".into(),
            last_maintenance_date: None,
            usage_count: 0,
            status: AssetStatus::Available,
        }
    }

    fn address() -> DeliveryAddress {
        DeliveryAddress {
            line1: "4 Dock Road".into(),
            city: "Hull".into(),
            postcode: "HU1 2AA".into(),
            ..Default::default()
        }
    }

    fn fill_smart_start(wizard: &mut WizardController<MemoryDraftStorage>) {
        wizard.set_customer(Some(&customer()), at(0));
        wizard.set_timing(
            OrderTiming {
                order_date: Some(date(2024, 5, 1)),
                delivery_date: Some(date(2024, 5, 6)),
                use_expected_return_date: true,
                expected_return_date: Some(date(2024, 5, 8)),
                ..Default::default()
            },
            at(0),
        );
    }

    fn fill_delivery(wizard: &mut WizardController<MemoryDraftStorage>) {
        wizard.apply(
            DraftPatch::delivery(DeliveryDetails {
                address: address(),
                contact_name: "Sam".into(),
                contact_phone: "0123".into(),
                ..Default::default()
            }),
            at(0),
        );
        let (ticket, _) = wizard.begin_geocode().unwrap();
        wizard.apply_geocode(
            &ticket,
            Ok(GeocodeResponse {
                lat: 53.74,
                lng: -0.33,
                formatted_address: "4 Dock Road, Hull".into(),
            }),
            at(0),
        );
        let (ticket, request) = wizard.begin_route_match().unwrap();
        assert_eq!(request.date, Some(date(2024, 5, 6)));
        let route = Route {
            id: RouteId::new_v4(),
            name: "East 1".into(),
            depot: None,
            distance_km: None,
        };
        wizard.apply_route_match(
            &ticket,
            RouteMatchResponse {
                best_match: Some(route.clone()),
                suggestions: vec![route],
            },
            at(0),
        );
    }

    /// Мастер на шаге подтверждения с заказом 2 × 10 × 3 дня, НДС 20 %
    fn at_confirm() -> (WizardController<MemoryDraftStorage>, ProductId) {
        let mut wizard = controller();
        fill_smart_start(&mut wizard);
        wizard.go_next(at(1)).unwrap();

        let compactor = product(false);
        wizard.add_line_item(&compactor, at(2)).unwrap();
        wizard.set_quantity(compactor.id, 2, at(2)).unwrap();
        wizard.go_next(at(3)).unwrap();

        fill_delivery(&mut wizard);
        wizard.go_next(at(4)).unwrap();
        assert_eq!(wizard.current_step(), WizardStep::Confirm);
        (wizard, compactor.id)
    }

    #[test]
    fn test_go_next_blocked_by_validation() {
        let mut wizard = controller();
        assert!(!wizard.can_go_next());
        assert_eq!(
            wizard.go_next(at(0)),
            Err(OrderDraftError::StepInvalid(WizardStep::SmartStart))
        );
        assert_eq!(wizard.current_step(), WizardStep::SmartStart);
        assert!(wizard.draft().completed_steps.is_empty());
        assert!(wizard.current_errors().contains_key("customer"));

        fill_smart_start(&mut wizard);
        assert!(wizard.can_go_next());
        assert_eq!(wizard.go_next(at(1)), Ok(WizardStep::ProductBuilder));
        assert!(wizard.draft().completed_steps.contains(WizardStep::SmartStart));
    }

    #[test]
    fn test_end_to_end_pricing() {
        let (wizard, _) = at_confirm();
        let pricing = wizard.pricing();
        assert_eq!(pricing.subtotal, Decimal::new(60, 0));
        assert_eq!(pricing.tax, Decimal::new(12, 0));
        assert_eq!(pricing.total, Decimal::new(72, 0));
    }

    #[test]
    fn test_pricing_follows_upstream_changes() {
        let (mut wizard, _) = at_confirm();
        wizard.apply(
            DraftPatch::settings(OrderSettings {
                order_discount_percent: Decimal::new(10, 0),
                ..Default::default()
            }),
            at(5),
        );
        assert_eq!(wizard.pricing().discount_amount, Decimal::new(72, 1));
        assert_eq!(wizard.pricing().total, Decimal::new(648, 1));

        wizard.set_use_expected_return_date(false, at(6));
        assert_eq!(wizard.pricing().subtotal, Decimal::new(20, 0));
    }

    #[test]
    fn test_navigation_back_and_jump() {
        let (mut wizard, _) = at_confirm();
        assert_eq!(wizard.go_next(at(5)), Err(OrderDraftError::AtLastStep));

        assert_eq!(wizard.go_previous(at(5)), Ok(WizardStep::Delivery));
        assert!(wizard.draft().completed_steps.contains(WizardStep::Delivery));
        wizard.go_to_step(WizardStep::SmartStart, at(6)).unwrap();
        // завершённый шаг доступен и после возврата назад
        wizard.go_to_step(WizardStep::Delivery, at(7)).unwrap();
        assert_eq!(wizard.go_to_step(WizardStep::Confirm, at(8)), Ok(()));

        let mut fresh = controller();
        assert_eq!(fresh.go_previous(at(0)), Err(OrderDraftError::AtFirstStep));
        assert_eq!(
            fresh.go_to_step(WizardStep::Delivery, at(0)),
            Err(OrderDraftError::StepNotReachable(WizardStep::Delivery))
        );
    }

    #[test]
    fn test_duplicate_and_tracked_quantity_rejected() {
        let mut wizard = controller();
        let lift = product(true);
        wizard.add_line_item(&lift, at(0)).unwrap();
        assert_eq!(
            wizard.add_line_item(&lift, at(0)),
            Err(OrderDraftError::DuplicateLineItem(lift.id))
        );
        assert_eq!(
            wizard.set_quantity(lift.id, 3, at(0)),
            Err(OrderDraftError::QuantityDrivenByAssets(lift.id))
        );

        wizard.load_asset_pool(lift.id, vec![asset("SL-1"), asset("SL-2"), asset("SL-3")]);
        let taken = wizard
            .auto_assign_assets(lift.id, 2, AutoAssignStrategy::Oldest, at(1))
            .unwrap();
        assert_eq!(taken, 2);
        assert_eq!(wizard.draft().line(lift.id).unwrap().quantity, 2);
        assert_eq!(wizard.pricing().lines[0].billable_days, Some(1));

        wizard.remove_line_item(lift.id, at(2)).unwrap();
        assert!(wizard
            .assets()
            .pool(lift.id)
            .iter()
            .all(|a| a.status == AssetStatus::Available));
    }

    #[test]
    fn test_manual_route_requires_reason() {
        let (mut wizard, _) = at_confirm();
        let other = Route {
            id: RouteId::new_v4(),
            name: "East 2".into(),
            depot: None,
            distance_km: Some(4.2),
        };
        wizard.go_to_step(WizardStep::Delivery, at(5)).unwrap();
        let (ticket, _) = wizard.begin_route_match().unwrap();
        wizard.apply_route_match(
            &ticket,
            RouteMatchResponse {
                best_match: None,
                suggestions: vec![other.clone()],
            },
            at(5),
        );
        assert!(wizard
            .current_errors()
            .contains_key("delivery.assigned_route"));

        wizard.select_route(other.id, Some("  ".into()), at(6)).unwrap();
        assert!(wizard
            .current_errors()
            .contains_key("delivery.assigned_route.override_reason"));
        assert!(!wizard.can_go_next());

        wizard.set_override_reason("site access from east gate".into(), at(7));
        assert!(wizard.can_go_next());
    }

    #[test]
    fn test_address_change_through_patch_invalidates_route() {
        let (mut wizard, _) = at_confirm();
        let mut delivery = wizard.draft().delivery.clone();
        delivery.instructions = "Call on arrival".into();
        wizard.apply(DraftPatch::delivery(delivery.clone()), at(5));
        assert!(wizard.draft().delivery.location_verified);

        delivery.address.line1 = "6 Dock Road".into();
        wizard.apply(DraftPatch::delivery(delivery), at(6));
        assert!(!wizard.draft().delivery.location_verified);
        assert!(wizard.draft().delivery.assigned_route.is_none());
        assert!(!wizard.report().is_step_valid(WizardStep::Confirm));
    }

    #[test]
    fn test_autosave_after_quiet_period() {
        let mut wizard = controller();
        wizard.set_customer(Some(&customer()), at(0));
        assert_eq!(wizard.next_autosave_at(), Some(at(5)));
        assert!(wizard.tick(at(4)).is_none());

        assert_eq!(wizard.tick(at(5)), Some(Ok(())));
        assert!(!wizard.is_dirty());
        assert_eq!(wizard.draft().draft_meta.last_saved_at, Some(at(5)));
        assert!(wizard.storage().value.is_some());
        assert_eq!(wizard.next_autosave_at(), None);
    }

    #[test]
    fn test_save_failure_keeps_draft() {
        let mut storage = MemoryDraftStorage::new();
        storage.fail_writes = true;
        let mut wizard = WizardController::new(storage, &WizardConfig::default());
        wizard.set_customer(Some(&customer()), at(0));

        assert!(matches!(
            wizard.save_draft(at(1)),
            Err(OrderDraftError::Storage(_))
        ));
        assert!(wizard.is_dirty());
        assert!(wizard.draft().customer.is_some());
    }

    #[test]
    fn test_autosave_retries_after_failed_write() {
        let mut storage = MemoryDraftStorage::new();
        storage.fail_writes = true;
        let mut wizard = WizardController::new(storage, &WizardConfig::default());
        wizard.set_customer(Some(&customer()), at(0));

        assert!(matches!(
            wizard.tick(at(5)),
            Some(Err(OrderDraftError::Storage(_)))
        ));
        assert!(wizard.is_dirty());
        assert_eq!(wizard.next_autosave_at(), Some(at(10)));

        wizard.storage.fail_writes = false;
        assert!(wizard.tick(at(9)).is_none());
        assert_eq!(wizard.tick(at(10)), Some(Ok(())));
        assert!(!wizard.is_dirty());
        assert!(wizard.storage().value.is_some());
        assert_eq!(wizard.next_autosave_at(), None);
    }

    #[test]
    fn test_out_of_range_discount_reported_not_fatal() {
        let (mut wizard, _) = at_confirm();
        wizard.apply(
            DraftPatch::settings(OrderSettings {
                terms_accepted: true,
                order_discount_percent: Decimal::from_str("10000000000000000000000000000")
                    .unwrap(),
                ..Default::default()
            }),
            at(5),
        );
        assert_eq!(wizard.pricing().total, Decimal::ZERO);
        assert!(wizard
            .report()
            .error_for(WizardStep::Confirm, "settings.order_discount_percent")
            .is_some());
        assert_eq!(
            wizard.prepare_submission(),
            Err(OrderDraftError::StepInvalid(WizardStep::Confirm))
        );
    }

    #[test]
    fn test_restore_round_trip() {
        let (mut wizard, pid) = at_confirm();
        wizard.save_draft(at(10)).unwrap();

        let mut restored = WizardController::new(wizard.storage().clone(), &WizardConfig::default());
        assert!(restored.restore_from_storage());
        assert_eq!(restored.current_step(), WizardStep::Confirm);
        assert_eq!(restored.draft().line(pid).unwrap().quantity, 2);
        assert_eq!(restored.pricing().total, Decimal::new(72, 0));
        assert!(!restored.is_dirty());
    }

    #[test]
    fn test_corrupt_storage_ignored() {
        let storage = MemoryDraftStorage {
            value: Some("{\"version\":1,".into()),
            fail_writes: false,
        };
        let mut wizard = WizardController::new(storage, &WizardConfig::default());
        assert!(!wizard.restore_from_storage());
        assert!(wizard.draft().is_blank());
    }

    #[test]
    fn test_submission_flow() {
        let mut wizard = controller();
        assert_eq!(
            wizard.prepare_submission(),
            Err(OrderDraftError::NotAtTerminalStep)
        );

        let (mut wizard, pid) = at_confirm();
        assert_eq!(
            wizard.prepare_submission(),
            Err(OrderDraftError::StepInvalid(WizardStep::Confirm))
        );
        wizard.apply(
            DraftPatch::settings(OrderSettings {
                terms_accepted: true,
                ..Default::default()
            }),
            at(5),
        );
        let request = wizard.prepare_submission().unwrap();
        assert!(wizard.is_submitting());
        assert_eq!(
            wizard.prepare_submission(),
            Err(OrderDraftError::SubmissionInProgress)
        );
        assert_eq!(request.line_items[0].product_id, pid);
        assert_eq!(request.line_items[0].billable_days, Some(3));
        assert_eq!(request.pricing.total, Decimal::new(72, 0));

        wizard.submission_failed("503 Service Unavailable");
        assert!(!wizard.is_submitting());
        assert_eq!(wizard.current_step(), WizardStep::Confirm);

        wizard.save_draft(at(6)).unwrap();
        wizard
            .complete_submission(&SubmitOrderResponse {
                order_id: Uuid::new_v4(),
                order_number: Some("RO-1001".into()),
            })
            .unwrap();
        assert!(wizard.draft().is_blank());
        assert_eq!(wizard.current_step(), WizardStep::SmartStart);
        assert!(wizard.storage().value.is_none());
    }
}
