use crate::domain::a002_product::ProductId;
use crate::domain::common::aggregate_id::parse_uuid;
use crate::domain::common::AggregateId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ID Type
// ============================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub Uuid);

impl AssetId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }

    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for AssetId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        parse_uuid(s).map(AssetId::new)
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Asset reference
// ============================================================================

/// Статус единицы техники
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    #[default]
    Available,
    Rented,
    Maintenance,
}

impl AssetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::Available => "available",
            AssetStatus::Rented => "rented",
            AssetStatus::Maintenance => "maintenance",
        }
    }
}

/// Конкретная единица техники (инвентарный экземпляр товара)
///
/// Статус `rented` внутри черновика выставляется локально при выборе
/// единицы и не отправляется на сервер до оформления заказа.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRef {
    pub asset_id: AssetId,
    pub asset_number: String,
    #[serde(default)]
    pub condition: String,
    pub last_maintenance_date: Option<NaiveDate>,
    #[serde(default)]
    pub usage_count: u32,
    #[serde(default)]
    pub status: AssetStatus,
}

impl AssetRef {
    pub fn is_available(&self) -> bool {
        self.status == AssetStatus::Available
    }
}

/// Запрос доступных единиц на период аренды
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetAvailabilityQuery {
    pub product_id: ProductId,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl AssetAvailabilityQuery {
    /// Путь запроса `GET /api/products/{id}/assets`
    pub fn to_path(&self) -> String {
        let mut path = format!("/api/products/{}/assets", self.product_id.as_string());
        let mut params = Vec::new();
        if let Some(start) = self.start_date {
            params.push(format!("start_date={}", start.format("%Y-%m-%d")));
        }
        if let Some(end) = self.end_date {
            params.push(format!("end_date={}", end.format("%Y-%m-%d")));
        }
        if !params.is_empty() {
            path.push('?');
            path.push_str(&params.join("&"));
        }
        path
    }
}
