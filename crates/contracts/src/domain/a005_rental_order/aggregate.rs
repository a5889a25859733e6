use crate::domain::a001_customer::{BillingAddress, CustomerDto, CustomerId};
use crate::domain::a002_product::{ProductDto, ProductId};
use crate::domain::a003_rental_asset::{AssetId, AssetRef};
use crate::domain::a004_delivery_route::{Coordinates, DeliveryAddress, RouteAssignment};
use chrono::{DateTime, Days, Months, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Wizard steps
// ============================================================================

/// Шаг мастера создания заказа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WizardStep {
    #[default]
    SmartStart = 1,
    ProductBuilder = 2,
    Delivery = 3,
    Confirm = 4,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        WizardStep::SmartStart,
        WizardStep::ProductBuilder,
        WizardStep::Delivery,
        WizardStep::Confirm,
    ];

    pub fn number(&self) -> u8 {
        *self as u8
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(WizardStep::SmartStart),
            2 => Some(WizardStep::ProductBuilder),
            3 => Some(WizardStep::Delivery),
            4 => Some(WizardStep::Confirm),
            _ => None,
        }
    }

    pub fn next(&self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn previous(&self) -> Option<Self> {
        self.number().checked_sub(1).and_then(Self::from_number)
    }

    pub fn is_terminal(&self) -> bool {
        *self == WizardStep::Confirm
    }

    /// Заголовок шага для индикатора прогресса
    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::SmartStart => "Smart Start",
            WizardStep::ProductBuilder => "Product Builder",
            WizardStep::Delivery => "Delivery",
            WizardStep::Confirm => "Confirm",
        }
    }
}

impl TryFrom<u8> for WizardStep {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_number(value).ok_or_else(|| format!("Invalid wizard step: {}", value))
    }
}

impl From<WizardStep> for u8 {
    fn from(step: WizardStep) -> Self {
        step.number()
    }
}

/// Множество завершённых шагов.
///
/// Хранится как битовая маска, сериализуется упорядоченным списком номеров
/// шагов (`[1, 2]`); неизвестные номера при чтении отбрасываются.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<u8>", into = "Vec<u8>")]
pub struct CompletedSteps(u8);

impl CompletedSteps {
    pub fn new() -> Self {
        Self(0)
    }

    fn bit(step: WizardStep) -> u8 {
        1 << (step.number() - 1)
    }

    pub fn insert(&mut self, step: WizardStep) {
        self.0 |= Self::bit(step);
    }

    pub fn remove(&mut self, step: WizardStep) {
        self.0 &= !Self::bit(step);
    }

    pub fn contains(&self, step: WizardStep) -> bool {
        self.0 & Self::bit(step) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Шаги в порядке возрастания
    pub fn iter(&self) -> impl Iterator<Item = WizardStep> + '_ {
        WizardStep::ALL.into_iter().filter(|s| self.contains(*s))
    }

    pub fn to_list(&self) -> Vec<u8> {
        self.iter().map(|s| s.number()).collect()
    }
}

impl From<Vec<u8>> for CompletedSteps {
    fn from(list: Vec<u8>) -> Self {
        let mut steps = CompletedSteps::new();
        for step in list.into_iter().filter_map(WizardStep::from_number) {
            steps.insert(step);
        }
        steps
    }
}

impl From<CompletedSteps> for Vec<u8> {
    fn from(steps: CompletedSteps) -> Self {
        steps.to_list()
    }
}

// ============================================================================
// Customer & timing
// ============================================================================

/// Выбранный клиент заказа
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSelection {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub payment_term_id: Option<String>,
    pub invoice_run_code_id: Option<String>,
    pub billing_address: BillingAddress,
}

impl From<&CustomerDto> for CustomerSelection {
    fn from(dto: &CustomerDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name.clone(),
            email: dto.email.clone(),
            payment_term_id: dto.payment_term.clone(),
            invoice_run_code_id: dto.invoice_run_code.clone(),
            billing_address: dto.billing_address.clone(),
        }
    }
}

/// Типовая длительность аренды
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentalDurationPreset {
    OneDay,
    ThreeDays,
    OneWeek,
    TwoWeeks,
    FourWeeks,
    Custom,
}

impl RentalDurationPreset {
    /// Количество календарных дней, включая день начала
    pub fn days(&self) -> Option<u64> {
        match self {
            RentalDurationPreset::OneDay => Some(1),
            RentalDurationPreset::ThreeDays => Some(3),
            RentalDurationPreset::OneWeek => Some(7),
            RentalDurationPreset::TwoWeeks => Some(14),
            RentalDurationPreset::FourWeeks => Some(28),
            RentalDurationPreset::Custom => None,
        }
    }
}

/// Сроки заказа
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTiming {
    pub order_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_time: Option<NaiveTime>,
    pub charging_start_date: Option<NaiveDate>,
    pub use_expected_return_date: bool,
    pub expected_return_date: Option<NaiveDate>,
    pub rental_duration_preset: Option<RentalDurationPreset>,
}

impl OrderTiming {
    /// Дата начала начисления: явная или дата доставки
    pub fn charging_start(&self) -> Option<NaiveDate> {
        self.charging_start_date.or(self.delivery_date)
    }

    /// Применить типовую длительность: дата возврата считается от начала
    /// начисления. Для `Custom` дата возврата не меняется.
    pub fn apply_preset(&mut self, preset: RentalDurationPreset) {
        self.rental_duration_preset = Some(preset);
        let (Some(days), Some(start)) = (preset.days(), self.charging_start()) else {
            return;
        };
        self.use_expected_return_date = true;
        self.expected_return_date = start.checked_add_days(Days::new(days - 1));
    }

    /// Отключение даты возврата очищает её, чтобы она не попадала в расчёт
    pub fn set_use_expected_return_date(&mut self, enabled: bool) {
        self.use_expected_return_date = enabled;
        if !enabled {
            self.expected_return_date = None;
            self.rental_duration_preset = None;
        }
    }
}

// ============================================================================
// Line items
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceScheduleType {
    #[default]
    Once,
    Daily,
    Interval,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceEndCondition {
    #[default]
    RentalEnd,
    Date,
    Count,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenancePriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

/// Плановое обслуживание техники на время аренды
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceConfig {
    pub requires_maintenance: bool,
    pub first_maintenance_date: Option<NaiveDate>,
    pub repeat_every_x_days: Option<u32>,
    pub schedule_type: MaintenanceScheduleType,
    pub end_condition: MaintenanceEndCondition,
    /// Для `end_condition = date`
    pub end_date: Option<NaiveDate>,
    /// Для `end_condition = count`
    pub occurrence_count: Option<u32>,
    pub task_type_id: Option<String>,
    pub estimated_duration_minutes: Option<u32>,
    pub priority: MaintenancePriority,
}

impl MaintenanceConfig {
    /// Даты обслуживания для предпросмотра, не более `limit` штук.
    ///
    /// `rental_end` ограничивает серию для `end_condition = rental_end`;
    /// если дата возврата неизвестна, серия ограничивается только `limit`.
    pub fn occurrences(&self, rental_end: Option<NaiveDate>, limit: usize) -> Vec<NaiveDate> {
        let Some(first) = self.first_maintenance_date.filter(|_| self.requires_maintenance) else {
            return Vec::new();
        };

        let last = match self.end_condition {
            MaintenanceEndCondition::RentalEnd => rental_end,
            MaintenanceEndCondition::Date => self.end_date,
            MaintenanceEndCondition::Count | MaintenanceEndCondition::Never => None,
        };
        let max_count = match self.end_condition {
            MaintenanceEndCondition::Count => {
                (self.occurrence_count.unwrap_or(0) as usize).min(limit)
            }
            _ => limit,
        };

        let mut dates = Vec::new();
        let mut current = Some(first);
        while let Some(date) = current {
            if dates.len() >= max_count || last.is_some_and(|l| date > l) {
                break;
            }
            dates.push(date);
            current = match self.schedule_type {
                MaintenanceScheduleType::Once => None,
                MaintenanceScheduleType::Daily => date.checked_add_days(Days::new(1)),
                MaintenanceScheduleType::Weekly => date.checked_add_days(Days::new(7)),
                MaintenanceScheduleType::Monthly => date.checked_add_months(Months::new(1)),
                MaintenanceScheduleType::Interval => match self.repeat_every_x_days {
                    Some(step) if step > 0 => date.checked_add_days(Days::new(step as u64)),
                    _ => None,
                },
            };
        }
        dates
    }
}

/// Строка заказа (одна позиция товара)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    pub sku: String,
    pub daily_rate: Decimal,
    pub tax_rate_percent: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub minimum_rental_period_days: u32,
    #[serde(default = "default_days_per_week")]
    pub rental_days_per_week: u8,
    #[serde(default)]
    pub sale_price: Option<Decimal>,
    /// Количество определяется выбранными единицами
    #[serde(default)]
    pub tracks_assets: bool,
    #[serde(default)]
    pub selected_assets: Vec<AssetRef>,
    #[serde(default)]
    pub maintenance_config: Option<MaintenanceConfig>,
}

fn default_days_per_week() -> u8 {
    7
}

impl LineItem {
    /// Новая строка из позиции каталога. Для поштучно учитываемого товара
    /// количество начинается с нуля и растёт по мере выбора единиц.
    pub fn from_product(product: &ProductDto) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            sku: product.sku.clone(),
            daily_rate: product.daily_rate,
            tax_rate_percent: product.tax_rate_percent,
            quantity: if product.tracks_assets { 0 } else { 1 },
            minimum_rental_period_days: product.minimum_rental_period_days,
            rental_days_per_week: product.rental_days_per_week,
            sale_price: product.sale_price,
            tracks_assets: product.tracks_assets,
            selected_assets: Vec::new(),
            maintenance_config: None,
        }
    }

    /// Разовая продажа вместо аренды
    pub fn is_sale(&self) -> bool {
        self.sale_price.is_some_and(|p| p > Decimal::ZERO)
    }

    pub fn has_asset(&self, asset_id: AssetId) -> bool {
        self.selected_assets.iter().any(|a| a.asset_id == asset_id)
    }

    pub fn selected_asset_ids(&self) -> Vec<AssetId> {
        self.selected_assets.iter().map(|a| a.asset_id).collect()
    }

    /// Количество совпадает с числом выбранных единиц
    pub fn is_quantity_consistent(&self) -> bool {
        !self.tracks_assets || self.quantity as usize == self.selected_assets.len()
    }
}

// ============================================================================
// Delivery & settings
// ============================================================================

/// Данные доставки
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDetails {
    pub address: DeliveryAddress,
    pub coordinates: Option<Coordinates>,
    pub location_verified: bool,
    pub contact_name: String,
    pub contact_phone: String,
    pub instructions: String,
    pub assigned_route: Option<RouteAssignment>,
}

/// Параметры оформления заказа
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSettings {
    pub depot: Option<String>,
    pub sales_person: Option<String>,
    pub invoice_run_code: Option<String>,
    pub payment_term: Option<String>,
    pub purchase_order_number: String,
    pub require_signature: bool,
    pub send_confirmation_email: bool,
    pub terms_accepted: bool,
    pub order_discount_percent: Decimal,
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self {
            depot: None,
            sales_person: None,
            invoice_run_code: None,
            payment_term: None,
            purchase_order_number: String::new(),
            require_signature: false,
            send_confirmation_email: true,
            terms_accepted: false,
            order_discount_percent: Decimal::ZERO,
        }
    }
}

/// Страховка от повреждений: сумма и налог рассчитываются внешним сервисом
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageWaiver {
    pub amount: Decimal,
    pub tax: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftMeta {
    pub last_saved_at: Option<DateTime<Utc>>,
    pub is_dirty: bool,
}

// ============================================================================
// Aggregate
// ============================================================================

/// Черновик заказа аренды: единый изменяемый документ мастера
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub current_step: WizardStep,
    pub completed_steps: CompletedSteps,
    pub customer: Option<CustomerSelection>,
    pub timing: OrderTiming,
    pub line_items: Vec<LineItem>,
    pub delivery: DeliveryDetails,
    pub settings: OrderSettings,
    pub damage_waiver: Option<DamageWaiver>,
    pub draft_meta: DraftMeta,
}

impl OrderDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&self, product_id: ProductId) -> Option<&LineItem> {
        self.line_items.iter().find(|l| l.product_id == product_id)
    }

    pub fn line_mut(&mut self, product_id: ProductId) -> Option<&mut LineItem> {
        self.line_items.iter_mut().find(|l| l.product_id == product_id)
    }

    /// Строка, за которой закреплена единица
    pub fn line_holding_asset(&self, asset_id: AssetId) -> Option<ProductId> {
        self.line_items
            .iter()
            .find(|l| l.has_asset(asset_id))
            .map(|l| l.product_id)
    }

    /// Черновик не содержит пользовательских данных
    pub fn is_blank(&self) -> bool {
        self.customer.is_none()
            && self.line_items.is_empty()
            && self.timing == OrderTiming::default()
            && self.delivery == DeliveryDetails::default()
    }
}

/// Частичное обновление черновика: каждая заданная область заменяет
/// соответствующую область черновика целиком.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftPatch {
    pub customer: Option<Option<CustomerSelection>>,
    pub timing: Option<OrderTiming>,
    pub line_items: Option<Vec<LineItem>>,
    pub delivery: Option<DeliveryDetails>,
    pub settings: Option<OrderSettings>,
    pub damage_waiver: Option<Option<DamageWaiver>>,
}

impl DraftPatch {
    pub fn customer(customer: Option<CustomerSelection>) -> Self {
        Self {
            customer: Some(customer),
            ..Default::default()
        }
    }

    pub fn timing(timing: OrderTiming) -> Self {
        Self {
            timing: Some(timing),
            ..Default::default()
        }
    }

    pub fn line_items(line_items: Vec<LineItem>) -> Self {
        Self {
            line_items: Some(line_items),
            ..Default::default()
        }
    }

    pub fn delivery(delivery: DeliveryDetails) -> Self {
        Self {
            delivery: Some(delivery),
            ..Default::default()
        }
    }

    pub fn settings(settings: OrderSettings) -> Self {
        Self {
            settings: Some(settings),
            ..Default::default()
        }
    }

    pub fn damage_waiver(waiver: Option<DamageWaiver>) -> Self {
        Self {
            damage_waiver: Some(waiver),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == DraftPatch::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_step_navigation_helpers() {
        assert_eq!(WizardStep::SmartStart.next(), Some(WizardStep::ProductBuilder));
        assert_eq!(WizardStep::Confirm.next(), None);
        assert_eq!(WizardStep::SmartStart.previous(), None);
        assert_eq!(WizardStep::try_from(3u8), Ok(WizardStep::Delivery));
        assert!(WizardStep::try_from(0u8).is_err());
    }

    #[test]
    fn test_completed_steps_serialize_as_list() {
        let mut steps = CompletedSteps::new();
        steps.insert(WizardStep::Delivery);
        steps.insert(WizardStep::SmartStart);
        assert_eq!(serde_json::to_string(&steps).unwrap(), "[1,3]");

        let restored: CompletedSteps = serde_json::from_str("[2,9,1,2]").unwrap();
        assert_eq!(restored.to_list(), vec![1, 2]);
        assert_eq!(restored.len(), 2);
    }

    #[test]
    fn test_preset_sets_inclusive_return_date() {
        let mut timing = OrderTiming {
            delivery_date: Some(date(2024, 5, 6)),
            ..Default::default()
        };
        timing.apply_preset(RentalDurationPreset::OneWeek);
        assert!(timing.use_expected_return_date);
        assert_eq!(timing.expected_return_date, Some(date(2024, 5, 12)));

        timing.charging_start_date = Some(date(2024, 5, 8));
        timing.apply_preset(RentalDurationPreset::ThreeDays);
        assert_eq!(timing.expected_return_date, Some(date(2024, 5, 10)));

        timing.set_use_expected_return_date(false);
        assert_eq!(timing.expected_return_date, None);
    }

    #[test]
    fn test_maintenance_occurrences() {
        let config = MaintenanceConfig {
            requires_maintenance: true,
            first_maintenance_date: Some(date(2024, 5, 1)),
            repeat_every_x_days: Some(10),
            schedule_type: MaintenanceScheduleType::Interval,
            end_condition: MaintenanceEndCondition::RentalEnd,
            ..Default::default()
        };
        assert_eq!(
            config.occurrences(Some(date(2024, 5, 25)), 10),
            vec![date(2024, 5, 1), date(2024, 5, 11), date(2024, 5, 21)]
        );

        let monthly = MaintenanceConfig {
            schedule_type: MaintenanceScheduleType::Monthly,
            end_condition: MaintenanceEndCondition::Count,
            occurrence_count: Some(2),
            ..config.clone()
        };
        assert_eq!(
            monthly.occurrences(None, 10),
            vec![date(2024, 5, 1), date(2024, 6, 1)]
        );

        let disabled = MaintenanceConfig {
            requires_maintenance: false,
            ..config
        };
        assert!(disabled.occurrences(None, 10).is_empty());
    }

    #[test]
    fn test_draft_roundtrip_keeps_step_list() {
        let mut draft = OrderDraft::new();
        draft.current_step = WizardStep::Delivery;
        draft.completed_steps.insert(WizardStep::SmartStart);
        draft.completed_steps.insert(WizardStep::ProductBuilder);

        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["currentStep"], 3);
        assert_eq!(json["completedSteps"], serde_json::json!([1, 2]));

        let back: OrderDraft = serde_json::from_value(json).unwrap();
        assert_eq!(back, draft);
    }
}
