//! Тело запроса на оформление заказа (`POST /api/orders`).

use super::aggregate::{
    DamageWaiver, LineItem, MaintenanceConfig, OrderDraft, OrderSettings, OrderTiming,
};
use super::pricing::PricingSummary;
use crate::domain::a001_customer::CustomerId;
use crate::domain::a002_product::ProductId;
use crate::domain::a003_rental_asset::AssetId;
use crate::domain::a004_delivery_route::{Coordinates, DeliveryAddress, RouteAssignment};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitLineItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub daily_rate: Decimal,
    pub tax_rate_percent: Decimal,
    pub sale_price: Option<Decimal>,
    pub asset_ids: Vec<AssetId>,
    pub billable_days: Option<u32>,
    pub line_total: Decimal,
    pub maintenance_config: Option<MaintenanceConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitDelivery {
    pub address: DeliveryAddress,
    pub coordinates: Option<Coordinates>,
    pub contact_name: String,
    pub contact_phone: String,
    pub instructions: String,
    pub route: RouteAssignment,
}

/// Заказ в виде, который принимает сервис заказов
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOrderRequest {
    pub customer_id: CustomerId,
    pub timing: OrderTiming,
    pub line_items: Vec<SubmitLineItem>,
    pub delivery: SubmitDelivery,
    pub settings: OrderSettings,
    pub damage_waiver: Option<DamageWaiver>,
    pub pricing: PricingSummary,
}

impl SubmitOrderRequest {
    /// Собрать запрос из проверенного черновика. `None`, если в черновике
    /// нет клиента или маршрута (валидаторы такой черновик не пропускают).
    pub fn build(draft: &OrderDraft, pricing: &PricingSummary) -> Option<Self> {
        let customer = draft.customer.as_ref()?;
        let route = draft.delivery.assigned_route.clone()?;

        let line_items = draft
            .line_items
            .iter()
            .map(|line| submit_line(line, pricing))
            .collect();

        Some(Self {
            customer_id: customer.id,
            timing: draft.timing.clone(),
            line_items,
            delivery: SubmitDelivery {
                address: draft.delivery.address.clone(),
                coordinates: draft.delivery.coordinates,
                contact_name: draft.delivery.contact_name.clone(),
                contact_phone: draft.delivery.contact_phone.clone(),
                instructions: draft.delivery.instructions.clone(),
                route,
            },
            settings: draft.settings.clone(),
            damage_waiver: draft.damage_waiver,
            pricing: pricing.clone(),
        })
    }
}

fn submit_line(line: &LineItem, pricing: &PricingSummary) -> SubmitLineItem {
    let priced = pricing.lines.iter().find(|p| p.product_id == line.product_id);
    SubmitLineItem {
        product_id: line.product_id,
        quantity: line.quantity,
        daily_rate: line.daily_rate,
        tax_rate_percent: line.tax_rate_percent,
        sale_price: line.sale_price,
        asset_ids: line.selected_asset_ids(),
        billable_days: priced.and_then(|p| p.billable_days),
        line_total: priced.map(|p| p.line_total).unwrap_or_default(),
        maintenance_config: line
            .maintenance_config
            .clone()
            .filter(|m| m.requires_maintenance),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOrderResponse {
    pub order_id: Uuid,
    #[serde(default)]
    pub order_number: Option<String>,
}
