//! Валидаторы шагов мастера.
//!
//! Каждый валидатор является чистой функцией от черновика и возвращает карту
//! «поле → сообщение». Шаг считается завершённым, если карта пуста.

use super::aggregate::{
    LineItem, MaintenanceConfig, MaintenanceEndCondition, MaintenanceScheduleType, OrderDraft,
    WizardStep,
};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// Ошибки полей: ключом служит путь поля (`timing.delivery_date`, `line_items[0].quantity`)
pub type FieldErrors = BTreeMap<String, String>;

fn push(errors: &mut FieldErrors, field: impl Into<String>, message: impl Into<String>) {
    errors.entry(field.into()).or_insert_with(|| message.into());
}

/// Валидатор шага по номеру
pub fn validate_step(step: WizardStep, draft: &OrderDraft) -> FieldErrors {
    match step {
        WizardStep::SmartStart => validate_smart_start(draft),
        WizardStep::ProductBuilder => validate_product_builder(draft),
        WizardStep::Delivery => validate_delivery(draft),
        WizardStep::Confirm => validate_confirm(draft),
    }
}

// ============================================================================
// Step 1: Smart Start
// ============================================================================

pub fn validate_smart_start(draft: &OrderDraft) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let timing = &draft.timing;

    if draft.customer.is_none() {
        push(&mut errors, "customer", "Select a customer");
    }

    match timing.order_date {
        None => push(&mut errors, "timing.order_date", "Order date is required"),
        Some(order_date) => {
            if let Some(delivery) = timing.delivery_date.filter(|d| *d < order_date) {
                push(
                    &mut errors,
                    "timing.delivery_date",
                    format!("Delivery date {} is before the order date", delivery),
                );
            }
        }
    }

    match timing.delivery_date {
        None => push(&mut errors, "timing.delivery_date", "Delivery date is required"),
        Some(delivery) => {
            if timing.charging_start_date.is_some_and(|c| c < delivery) {
                push(
                    &mut errors,
                    "timing.charging_start_date",
                    "Charging cannot start before delivery",
                );
            }
        }
    }

    if timing.use_expected_return_date {
        match (timing.expected_return_date, timing.charging_start()) {
            (None, _) => push(
                &mut errors,
                "timing.expected_return_date",
                "Expected return date is required",
            ),
            (Some(ret), Some(start)) if ret < start => push(
                &mut errors,
                "timing.expected_return_date",
                "Expected return date is before the rental start",
            ),
            _ => {}
        }
    }

    errors
}

// ============================================================================
// Step 2: Product Builder
// ============================================================================

pub fn validate_product_builder(draft: &OrderDraft) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if draft.line_items.is_empty() {
        push(&mut errors, "line_items", "Add at least one product");
        return errors;
    }

    let mut asset_holders = HashMap::new();
    for (index, line) in draft.line_items.iter().enumerate() {
        validate_line(index, line, &mut errors);

        for asset in &line.selected_assets {
            if let Some(holder) = asset_holders.insert(asset.asset_id, index) {
                if holder != index {
                    push(
                        &mut errors,
                        format!("line_items[{}].selected_assets", index),
                        format!(
                            "Asset {} is already assigned to {}",
                            asset.asset_number, draft.line_items[holder].name
                        ),
                    );
                }
            }
        }
    }

    errors
}

fn validate_line(index: usize, line: &LineItem, errors: &mut FieldErrors) {
    let field = |name: &str| format!("line_items[{}].{}", index, name);

    if line.quantity == 0 {
        let message = if line.tracks_assets {
            "Select at least one asset"
        } else {
            "Quantity must be at least 1"
        };
        push(errors, field("quantity"), message);
    }
    if line.daily_rate < Decimal::ZERO {
        push(errors, field("daily_rate"), "Daily rate cannot be negative");
    }
    if line.tax_rate_percent < Decimal::ZERO {
        push(errors, field("tax_rate_percent"), "Tax rate cannot be negative");
    }
    if line.sale_price.is_some_and(|p| p < Decimal::ZERO) {
        push(errors, field("sale_price"), "Sale price cannot be negative");
    }
    if !(1..=7).contains(&line.rental_days_per_week) {
        push(
            errors,
            field("rental_days_per_week"),
            "Rental days per week must be between 1 and 7",
        );
    }
    if !line.is_quantity_consistent() {
        push(
            errors,
            field("selected_assets"),
            format!(
                "Quantity {} does not match {} selected assets",
                line.quantity,
                line.selected_assets.len()
            ),
        );
    }
    if let Some(config) = &line.maintenance_config {
        validate_maintenance(config, &field("maintenance_config"), errors);
    }
}

fn validate_maintenance(config: &MaintenanceConfig, prefix: &str, errors: &mut FieldErrors) {
    if !config.requires_maintenance {
        return;
    }
    if config.first_maintenance_date.is_none() {
        push(
            errors,
            format!("{}.first_maintenance_date", prefix),
            "First maintenance date is required",
        );
    }
    if config.schedule_type == MaintenanceScheduleType::Interval
        && config.repeat_every_x_days.unwrap_or(0) == 0
    {
        push(
            errors,
            format!("{}.repeat_every_x_days", prefix),
            "Repeat interval must be at least 1 day",
        );
    }
    match config.end_condition {
        MaintenanceEndCondition::Date => match (config.end_date, config.first_maintenance_date) {
            (None, _) => push(errors, format!("{}.end_date", prefix), "End date is required"),
            (Some(end), Some(first)) if end < first => push(
                errors,
                format!("{}.end_date", prefix),
                "End date is before the first maintenance",
            ),
            _ => {}
        },
        MaintenanceEndCondition::Count if config.occurrence_count.unwrap_or(0) == 0 => push(
            errors,
            format!("{}.occurrence_count", prefix),
            "Occurrence count must be at least 1",
        ),
        _ => {}
    }
}

// ============================================================================
// Step 3: Delivery
// ============================================================================

pub fn validate_delivery(draft: &OrderDraft) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let delivery = &draft.delivery;
    let address = &delivery.address;

    if address.line1.trim().is_empty() {
        push(&mut errors, "delivery.address.line1", "Address is required");
    }
    if address.city.trim().is_empty() {
        push(&mut errors, "delivery.address.city", "City is required");
    }
    if address.postcode.trim().is_empty() {
        push(&mut errors, "delivery.address.postcode", "Postcode is required");
    }
    if delivery.contact_name.trim().is_empty() {
        push(&mut errors, "delivery.contact_name", "Site contact name is required");
    }
    if delivery.contact_phone.trim().is_empty() {
        push(&mut errors, "delivery.contact_phone", "Site contact phone is required");
    }
    if !delivery.location_verified {
        push(
            &mut errors,
            "delivery.location_verified",
            "Verify the delivery location",
        );
    }

    match &delivery.assigned_route {
        None => push(&mut errors, "delivery.assigned_route", "Assign a delivery route"),
        Some(route) => {
            if route.assignment_type.requires_reason() && !route.has_reason() {
                push(
                    &mut errors,
                    "delivery.assigned_route.override_reason",
                    "Give a reason for overriding the suggested route",
                );
            }
        }
    }

    errors
}

// ============================================================================
// Step 4: Confirm
// ============================================================================

pub fn validate_confirm(draft: &OrderDraft) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let settings = &draft.settings;

    if !settings.terms_accepted {
        push(&mut errors, "settings.terms_accepted", "Accept the terms and conditions");
    }
    let discount = settings.order_discount_percent;
    if discount < Decimal::ZERO || discount > Decimal::ONE_HUNDRED {
        push(
            &mut errors,
            "settings.order_discount_percent",
            "Discount must be between 0 and 100 percent",
        );
    }
    if let Some(waiver) = &draft.damage_waiver {
        if waiver.amount < Decimal::ZERO || waiver.tax < Decimal::ZERO {
            push(&mut errors, "damage_waiver", "Damage waiver cannot be negative");
        }
    }

    // повторная проверка предыдущих шагов перед оформлением
    for step in [
        WizardStep::SmartStart,
        WizardStep::ProductBuilder,
        WizardStep::Delivery,
    ] {
        for (field, message) in validate_step(step, draft) {
            errors.entry(field).or_insert(message);
        }
    }

    errors
}

// ============================================================================
// Report
// ============================================================================

/// Результаты всех валидаторов для текущего состояния черновика
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    steps: BTreeMap<WizardStep, FieldErrors>,
}

impl ValidationReport {
    pub fn compute(draft: &OrderDraft) -> Self {
        let steps = WizardStep::ALL
            .into_iter()
            .map(|step| (step, validate_step(step, draft)))
            .collect();
        Self { steps }
    }

    pub fn errors(&self, step: WizardStep) -> &FieldErrors {
        static EMPTY: FieldErrors = FieldErrors::new();
        self.steps.get(&step).unwrap_or(&EMPTY)
    }

    pub fn is_step_valid(&self, step: WizardStep) -> bool {
        self.errors(step).is_empty()
    }

    pub fn error_for(&self, step: WizardStep, field: &str) -> Option<&str> {
        self.errors(step).get(field).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_customer::{BillingAddress, CustomerId};
    use crate::domain::a002_product::ProductId;
    use crate::domain::a003_rental_asset::{AssetId, AssetRef, AssetStatus};
    use crate::domain::a004_delivery_route::{
        DeliveryAddress, Route, RouteAssignment, RouteId,
    };
    use crate::domain::a005_rental_order::aggregate::{CustomerSelection, DeliveryDetails};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn customer() -> CustomerSelection {
        CustomerSelection {
            id: CustomerId::new_v4(),
            name: "Acme Builders".into(),
            email: "ops@acme.test".into(),
            payment_term_id: None,
            invoice_run_code_id: None,
            billing_address: BillingAddress::default(),
        }
    }

    fn line(tracks_assets: bool, quantity: u32) -> LineItem {
        LineItem {
            product_id: ProductId::new_v4(),
            name: "Scissor lift".into(),
            sku: "SL-10".into(),
            daily_rate: Decimal::new(40, 0),
            tax_rate_percent: Decimal::new(20, 0),
            quantity,
            minimum_rental_period_days: 0,
            rental_days_per_week: 7,
            sale_price: None,
            tracks_assets,
            selected_assets: Vec::new(),
            maintenance_config: None,
        }
    }

    fn asset(number: &str) -> AssetRef {
        AssetRef {
            asset_id: AssetId::new_v4(),
            asset_number: number.into(),
            condition: "good".into(),
            last_maintenance_date: None,
            usage_count: 0,
            status: AssetStatus::Rented,
        }
    }

    fn verified_delivery() -> DeliveryDetails {
        DeliveryDetails {
            address: DeliveryAddress {
                line1: "4 Dock Road".into(),
                city: "Hull".into(),
                postcode: "HU1 2AA".into(),
                ..Default::default()
            },
            coordinates: None,
            location_verified: true,
            contact_name: "Sam".into(),
            contact_phone: "0123".into(),
            instructions: String::new(),
            assigned_route: Some(RouteAssignment::automatic(&Route {
                id: RouteId::new_v4(),
                name: "East 1".into(),
                depot: None,
                distance_km: None,
            })),
        }
    }

    #[test]
    fn test_smart_start_requires_customer_and_dates() {
        let draft = OrderDraft::new();
        let errors = validate_smart_start(&draft);
        assert!(errors.contains_key("customer"));
        assert!(errors.contains_key("timing.order_date"));
        assert!(errors.contains_key("timing.delivery_date"));

        let mut draft = OrderDraft::new();
        draft.customer = Some(customer());
        draft.timing.order_date = Some(date(2024, 5, 6));
        draft.timing.delivery_date = Some(date(2024, 5, 7));
        assert!(validate_smart_start(&draft).is_empty());
    }

    #[test]
    fn test_smart_start_date_ordering() {
        let mut draft = OrderDraft::new();
        draft.customer = Some(customer());
        draft.timing.order_date = Some(date(2024, 5, 6));
        draft.timing.delivery_date = Some(date(2024, 5, 5));
        draft.timing.use_expected_return_date = true;
        draft.timing.expected_return_date = Some(date(2024, 5, 1));

        let errors = validate_smart_start(&draft);
        assert!(errors.contains_key("timing.delivery_date"));
        assert!(errors.contains_key("timing.expected_return_date"));
    }

    #[test]
    fn test_product_builder_quantity_must_match_assets() {
        let mut draft = OrderDraft::new();
        assert!(validate_product_builder(&draft).contains_key("line_items"));

        let mut item = line(true, 2);
        item.selected_assets.push(asset("SL-001"));
        draft.line_items.push(item);

        let errors = validate_product_builder(&draft);
        assert!(errors.contains_key("line_items[0].selected_assets"));

        draft.line_items[0].quantity = 1;
        assert!(validate_product_builder(&draft).is_empty());
    }

    #[test]
    fn test_product_builder_rejects_shared_asset() {
        let shared = asset("GEN-7");
        let mut first = line(true, 1);
        first.selected_assets.push(shared.clone());
        let mut second = line(true, 1);
        second.selected_assets.push(shared);

        let mut draft = OrderDraft::new();
        draft.line_items = vec![first, second];
        let errors = validate_product_builder(&draft);
        assert!(errors.contains_key("line_items[1].selected_assets"));
    }

    #[test]
    fn test_maintenance_rules() {
        let mut item = line(false, 1);
        item.maintenance_config = Some(MaintenanceConfig {
            requires_maintenance: true,
            schedule_type: MaintenanceScheduleType::Interval,
            end_condition: MaintenanceEndCondition::Count,
            ..Default::default()
        });
        let mut draft = OrderDraft::new();
        draft.line_items.push(item);

        let errors = validate_product_builder(&draft);
        assert!(errors.contains_key("line_items[0].maintenance_config.first_maintenance_date"));
        assert!(errors.contains_key("line_items[0].maintenance_config.repeat_every_x_days"));
        assert!(errors.contains_key("line_items[0].maintenance_config.occurrence_count"));
    }

    #[test]
    fn test_manual_route_without_reason_fails() {
        let mut draft = OrderDraft::new();
        draft.delivery = verified_delivery();
        assert!(validate_delivery(&draft).is_empty());

        let route = Route {
            id: RouteId::new_v4(),
            name: "West 3".into(),
            depot: None,
            distance_km: Some(4.2),
        };
        draft.delivery.assigned_route = Some(RouteAssignment::manual(&route, Some(String::new())));
        let errors = validate_delivery(&draft);
        assert!(errors.contains_key("delivery.assigned_route.override_reason"));

        draft.delivery.assigned_route = Some(RouteAssignment::manual(
            &route,
            Some("Customer asked for morning slot".into()),
        ));
        assert!(validate_delivery(&draft).is_empty());

        draft.delivery.assigned_route = Some(RouteAssignment::floating(None));
        assert!(!validate_delivery(&draft).is_empty());
    }

    #[test]
    fn test_delivery_requires_verified_location_and_route() {
        let mut draft = OrderDraft::new();
        draft.delivery = verified_delivery();
        draft.delivery.location_verified = false;
        draft.delivery.assigned_route = None;

        let errors = validate_delivery(&draft);
        assert!(errors.contains_key("delivery.location_verified"));
        assert!(errors.contains_key("delivery.assigned_route"));
    }

    #[test]
    fn test_confirm_rechecks_previous_steps() {
        let mut draft = OrderDraft::new();
        draft.settings.terms_accepted = true;
        let errors = validate_confirm(&draft);
        assert!(!errors.contains_key("settings.terms_accepted"));
        assert!(errors.contains_key("customer"));
        assert!(errors.contains_key("line_items"));

        draft.settings.order_discount_percent = Decimal::new(101, 0);
        assert!(validate_confirm(&draft).contains_key("settings.order_discount_percent"));
    }

    #[test]
    fn test_report_tracks_each_step() {
        let mut draft = OrderDraft::new();
        draft.customer = Some(customer());
        draft.timing.order_date = Some(date(2024, 5, 6));
        draft.timing.delivery_date = Some(date(2024, 5, 6));

        let report = ValidationReport::compute(&draft);
        assert!(report.is_step_valid(WizardStep::SmartStart));
        assert!(!report.is_step_valid(WizardStep::ProductBuilder));
        assert_eq!(
            report.error_for(WizardStep::ProductBuilder, "line_items"),
            Some("Add at least one product")
        );
    }
}
