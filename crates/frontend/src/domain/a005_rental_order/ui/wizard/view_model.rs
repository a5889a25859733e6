//! Rental Order Wizard - ViewModel
//!
//! Контроллер мастера хранится в сигнале; все изменения черновика идут
//! через `mutate`, после которого планируется автосохранение.

use super::model;
use crate::shared::date_utils::now;
use crate::shared::form_utils::parse_decimal_input;
use crate::shared::storage::LocalDraftStorage;
use chrono::{DateTime, Utc};
use contracts::domain::a001_customer::{CustomerDto, CustomerSearchQuery};
use contracts::domain::a002_product::{ProductDto, ProductId, ProductQuery};
use contracts::domain::a003_rental_asset::{AssetAvailabilityQuery, AssetId};
use contracts::domain::a004_delivery_route::{DeliveryAddress, RouteId};
use contracts::domain::a005_rental_order::{
    AutoAssignStrategy, DeliveryDetails, DraftPatch, DraftResult, MaintenanceConfig,
    OrderDraftError, OrderSettings, OrderTiming, RentalDurationPreset, WizardController,
    WizardStep,
};
use contracts::shared::config::WizardConfig;
use contracts::shared::request_guard::LatestRequest;
use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

pub type Wizard = WizardController<LocalDraftStorage>;

/// ViewModel мастера создания заказа
#[derive(Clone, Copy)]
pub struct RentalOrderWizardVm {
    pub config: StoredValue<WizardConfig>,
    pub wizard: RwSignal<Wizard>,

    // Поиск клиентов и товаров
    pub customer_query: RwSignal<String>,
    pub customer_results: RwSignal<Vec<CustomerDto>>,
    customer_requests: RwSignal<LatestRequest<String>>,
    pub product_query: RwSignal<String>,
    pub product_results: RwSignal<Vec<ProductDto>>,
    product_requests: RwSignal<LatestRequest<String>>,

    // State signals
    pub show_errors: RwSignal<bool>,
    pub error: RwSignal<Option<String>>,
    pub notice: RwSignal<Option<String>>,
}

impl RentalOrderWizardVm {
    /// Создать ViewModel и восстановить сохранённый черновик
    pub fn new(config: WizardConfig) -> Self {
        let storage = LocalDraftStorage::new(config.storage.draft_key.clone());
        let mut wizard = WizardController::new(storage, &config);
        if wizard.restore_from_storage() {
            log::info!("continuing saved order draft");
        }

        Self {
            config: StoredValue::new(config),
            wizard: RwSignal::new(wizard),
            customer_query: RwSignal::new(String::new()),
            customer_results: RwSignal::new(Vec::new()),
            customer_requests: RwSignal::new(LatestRequest::new()),
            product_query: RwSignal::new(String::new()),
            product_results: RwSignal::new(Vec::new()),
            product_requests: RwSignal::new(LatestRequest::new()),
            show_errors: RwSignal::new(false),
            error: RwSignal::new(None),
            notice: RwSignal::new(None),
        }
    }

    /// Изменить черновик и запланировать автосохранение
    fn mutate<R>(&self, f: impl FnOnce(&mut Wizard, DateTime<Utc>) -> R) -> Option<R> {
        let at = now();
        let result = self.wizard.try_update(|w| f(w, at));
        self.schedule_autosave();
        result
    }

    fn report(&self, result: Option<DraftResult<()>>) {
        match result {
            Some(Err(e)) => self.error.set(Some(e.to_string())),
            _ => self.error.set(None),
        }
    }

    fn schedule_autosave(&self) {
        let Some(deadline) = self.wizard.with_untracked(|w| w.next_autosave_at()) else {
            return;
        };
        let delay = (deadline - now()).num_milliseconds().max(0) as u32;
        let vm = *self;
        spawn_local(async move {
            TimeoutFuture::new(delay).await;
            vm.run_autosave();
        });
    }

    /// Срабатывание таймера: сохраняет, только если срок действительно наступил
    fn run_autosave(&self) {
        let result = self.wizard.try_update(|w| w.tick(now())).flatten();
        if let Some(Err(e)) = result {
            self.notice.set(Some(format!("Draft could not be saved: {}", e)));
            self.schedule_autosave();
        }
    }

    pub fn save_now(&self) {
        let result = self.wizard.try_update(|w| w.save_draft(now()));
        match result {
            Some(Ok(())) => self.notice.set(Some("Draft saved".to_string())),
            Some(Err(e)) => {
                self.notice.set(Some(format!("Draft could not be saved: {}", e)));
                self.schedule_autosave();
            }
            None => {}
        }
    }

    /// Сохранить несохранённые изменения при закрытии мастера
    pub fn flush(&self) {
        let result = self.wizard.try_update_untracked(|w| w.flush(now()));
        if let Some(Err(e)) = result {
            log::warn!("draft not saved on close: {}", e);
        }
    }

    pub fn discard(&self) {
        let result = self.wizard.try_update(|w| w.discard_draft());
        self.report(result);
        self.show_errors.set(false);
        self.customer_results.set(Vec::new());
        self.product_results.set(Vec::new());
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    pub fn go_next(&self) {
        match self.mutate(|w, at| w.go_next(at)) {
            Some(Ok(step)) => {
                self.show_errors.set(false);
                self.error.set(None);
                if step == WizardStep::Delivery {
                    self.refresh_route();
                }
            }
            Some(Err(OrderDraftError::StepInvalid(_))) => self.show_errors.set(true),
            Some(Err(e)) => self.error.set(Some(e.to_string())),
            None => {}
        }
    }

    pub fn go_previous(&self) {
        let result = self.mutate(|w, at| w.go_previous(at).map(|_| ()));
        self.report(result);
    }

    pub fn go_to_step(&self, step: WizardStep) {
        let result = self.mutate(|w, at| w.go_to_step(step, at));
        self.report(result);
    }

    // ------------------------------------------------------------------------
    // Step 1: customer & timing
    // ------------------------------------------------------------------------

    pub fn search_customers(&self, q: String) {
        self.customer_query.set(q.clone());
        let query = CustomerSearchQuery::new(q.clone());
        if query.is_blank() {
            self.customer_requests.update(|r| r.cancel());
            self.customer_results.set(Vec::new());
            return;
        }

        let ticket = self.customer_requests.try_update(|r| r.issue(q));
        let Some(ticket) = ticket else { return };
        let vm = *self;
        spawn_local(async move {
            let config = vm.config.get_value();
            let result = model::search_customers(&config, &query).await;
            let current = vm.customer_requests.try_update(|r| r.accept(&ticket)).unwrap_or(false);
            if !current {
                return;
            }
            match result {
                Ok(customers) => vm.customer_results.set(customers),
                Err(e) => {
                    log::warn!("customer search failed: {}", e);
                    vm.customer_results.set(Vec::new());
                    vm.notice.set(Some("Customer search is unavailable".to_string()));
                }
            }
        });
    }

    pub fn select_customer(&self, customer: Option<CustomerDto>) {
        self.mutate(|w, at| w.set_customer(customer.as_ref(), at));
        self.customer_results.set(Vec::new());
    }

    pub fn update_timing(&self, f: impl FnOnce(&mut OrderTiming)) {
        let mut timing = self.wizard.with_untracked(|w| w.draft().timing.clone());
        f(&mut timing);
        self.mutate(|w, at| w.set_timing(timing, at));
    }

    pub fn apply_preset(&self, preset: RentalDurationPreset) {
        self.mutate(|w, at| w.apply_duration_preset(preset, at));
    }

    pub fn set_use_expected_return_date(&self, enabled: bool) {
        self.mutate(|w, at| w.set_use_expected_return_date(enabled, at));
    }

    pub fn apply_patch(&self, patch: DraftPatch) {
        self.mutate(|w, at| w.apply(patch, at));
    }

    pub fn update_settings(&self, f: impl FnOnce(&mut OrderSettings)) {
        let mut settings = self.wizard.with_untracked(|w| w.draft().settings.clone());
        f(&mut settings);
        self.apply_patch(DraftPatch::settings(settings));
    }

    /// Скидка из поля ввода; нечисловой текст не меняет сохранённое значение
    pub fn set_discount_percent(&self, text: String) {
        match parse_decimal_input(&text) {
            Some(value) => {
                self.error.set(None);
                self.update_settings(|s| s.order_discount_percent = value);
            }
            None => self
                .error
                .set(Some(format!("Discount '{}' is not a number", text.trim()))),
        }
    }

    /// Контакты и инструкции доставки; адрес меняется через `set_delivery_address`
    pub fn update_delivery(&self, f: impl FnOnce(&mut DeliveryDetails)) {
        let mut delivery = self.wizard.with_untracked(|w| w.draft().delivery.clone());
        f(&mut delivery);
        self.apply_patch(DraftPatch::delivery(delivery));
    }

    // ------------------------------------------------------------------------
    // Step 2: products & assets
    // ------------------------------------------------------------------------

    pub fn search_products(&self, search: String) {
        self.product_query.set(search.clone());
        let query = ProductQuery {
            search: search.clone(),
            vendor_id: None,
        };
        let Some(ticket) = self.product_requests.try_update(|r| r.issue(search)) else {
            return;
        };
        let vm = *self;
        spawn_local(async move {
            let config = vm.config.get_value();
            let result = model::fetch_products(&config, &query).await;
            let current = vm.product_requests.try_update(|r| r.accept(&ticket)).unwrap_or(false);
            if !current {
                return;
            }
            match result {
                Ok(products) => vm.product_results.set(products),
                Err(e) => {
                    log::warn!("product catalog failed: {}", e);
                    vm.product_results.set(Vec::new());
                    vm.notice.set(Some("Product catalog is unavailable".to_string()));
                }
            }
        });
    }

    pub fn add_product(&self, product: ProductDto) {
        let result = self.mutate(|w, at| w.add_line_item(&product, at));
        let added = matches!(result, Some(Ok(())));
        self.report(result);
        if added && product.tracks_assets {
            self.load_assets(product.id);
        }
    }

    pub fn remove_product(&self, product_id: ProductId) {
        let result = self.mutate(|w, at| w.remove_line_item(product_id, at));
        self.report(result);
    }

    pub fn set_quantity(&self, product_id: ProductId, quantity: u32) {
        let result = self.mutate(|w, at| w.set_quantity(product_id, quantity, at));
        self.report(result);
    }

    pub fn set_maintenance(&self, product_id: ProductId, config: Option<MaintenanceConfig>) {
        let result = self.mutate(|w, at| w.set_maintenance_config(product_id, config, at));
        self.report(result);
    }

    /// Загрузить доступные единицы на период аренды
    pub fn load_assets(&self, product_id: ProductId) {
        let query = self.wizard.with_untracked(|w| {
            let timing = &w.draft().timing;
            AssetAvailabilityQuery {
                product_id,
                start_date: timing.charging_start(),
                end_date: timing.expected_return_date,
            }
        });
        let vm = *self;
        spawn_local(async move {
            let config = vm.config.get_value();
            let assets = match model::fetch_available_assets(&config, &query).await {
                Ok(assets) => assets,
                Err(e) => {
                    log::warn!("asset availability failed for {}: {}", product_id, e);
                    vm.notice
                        .set(Some("Asset availability is unavailable".to_string()));
                    Vec::new()
                }
            };
            vm.wizard.update(|w| w.load_asset_pool(product_id, assets));
        });
    }

    pub fn toggle_asset(&self, product_id: ProductId, asset_id: AssetId) {
        let result = self.mutate(|w, at| w.toggle_asset(product_id, asset_id, at).map(|_| ()));
        self.report(result);
    }

    pub fn auto_assign(&self, product_id: ProductId, count: usize, strategy: AutoAssignStrategy) {
        let result = self.mutate(|w, at| {
            w.auto_assign_assets(product_id, count, strategy, at)
                .map(|_| ())
        });
        self.report(result);
    }

    pub fn remove_asset(&self, product_id: ProductId, asset_id: AssetId) {
        let result = self.mutate(|w, at| w.remove_asset(product_id, asset_id, at));
        self.report(result);
    }

    // ------------------------------------------------------------------------
    // Step 3: delivery & route
    // ------------------------------------------------------------------------

    pub fn set_delivery_address(&self, address: DeliveryAddress) {
        self.mutate(|w, at| w.set_delivery_address(address, at));
    }

    /// Проверить адрес геокодером, затем подобрать маршрут
    pub fn verify_address(&self) {
        let Some((ticket, request)) = self.wizard.try_update(|w| w.begin_geocode()).flatten() else {
            return;
        };
        let vm = *self;
        spawn_local(async move {
            let config = vm.config.get_value();
            let result = model::geocode(&config, &request).await;
            let applied = vm
                .mutate(|w, at| w.apply_geocode(&ticket, result, at))
                .unwrap_or(false);
            if applied {
                vm.refresh_route();
            }
        });
    }

    pub fn refresh_route(&self) {
        let Some((ticket, request)) = self.wizard.try_update(|w| w.begin_route_match()).flatten()
        else {
            return;
        };
        let vm = *self;
        spawn_local(async move {
            let config = vm.config.get_value();
            match model::match_route(&config, &request).await {
                Ok(response) => {
                    vm.mutate(|w, at| w.apply_route_match(&ticket, response, at));
                }
                Err(e) => {
                    vm.mutate(|w, at| w.route_match_failed(&ticket, &e, at));
                }
            }
        });
    }

    pub fn select_route(&self, route_id: RouteId) {
        let result = self.mutate(|w, at| w.select_route(route_id, None, at));
        self.report(result);
    }

    pub fn select_floating(&self) {
        self.mutate(|w, at| w.select_floating_route(None, at));
    }

    pub fn set_override_reason(&self, reason: String) {
        self.mutate(|w, at| w.set_override_reason(reason, at));
    }

    // ------------------------------------------------------------------------
    // Step 4: submission
    // ------------------------------------------------------------------------

    pub fn submit(&self) {
        let request = match self.wizard.try_update(|w| w.prepare_submission()) {
            Some(Ok(request)) => request,
            Some(Err(OrderDraftError::StepInvalid(_))) => {
                self.show_errors.set(true);
                return;
            }
            Some(Err(e)) => {
                self.error.set(Some(e.to_string()));
                return;
            }
            None => return,
        };

        let vm = *self;
        spawn_local(async move {
            let config = vm.config.get_value();
            match model::submit_order(&config, &request).await {
                Ok(response) => {
                    let result = vm.wizard.try_update(|w| w.complete_submission(&response));
                    vm.report(result);
                    vm.show_errors.set(false);
                    vm.notice.set(Some(match response.order_number {
                        Some(number) => format!("Order {} created", number),
                        None => format!("Order {} created", response.order_id),
                    }));
                }
                Err(e) => {
                    vm.wizard.update(|w| w.submission_failed(&e));
                    vm.error.set(Some(format!("Order could not be submitted: {}", e)));
                }
            }
        });
    }
}
