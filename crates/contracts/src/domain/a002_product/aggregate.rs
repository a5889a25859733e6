use crate::domain::common::aggregate_id::parse_uuid;
use crate::domain::common::AggregateId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ID Type
// ============================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub Uuid);

impl ProductId {
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

impl AggregateId for ProductId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        parse_uuid(s).map(ProductId::new)
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// DTO
// ============================================================================

fn default_days_per_week() -> u8 {
    7
}

fn default_true() -> bool {
    true
}

/// Позиция каталога товаров (ответ `GET /api/products`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub sku: String,
    pub daily_rate: Decimal,
    #[serde(default)]
    pub tax_rate_percent: Decimal,
    #[serde(default)]
    pub quantity_available: u32,
    #[serde(default)]
    pub minimum_rental_period_days: u32,
    #[serde(default = "default_days_per_week")]
    pub rental_days_per_week: u8,
    #[serde(default)]
    pub category: String,

    /// Товар учитывается поштучно (нужен выбор конкретных единиц)
    #[serde(default = "default_true")]
    pub tracks_assets: bool,

    /// Цена разовой продажи; если задана, позиция продаётся, а не сдаётся
    #[serde(default)]
    pub sale_price: Option<Decimal>,
}

/// Параметры запроса каталога
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub search: String,
    pub vendor_id: Option<String>,
}

impl ProductQuery {
    /// Строка query-параметров для `GET /api/products`
    pub fn to_query_string(&self) -> String {
        let mut parts = vec![format!("search={}", urlencoding::encode(self.search.trim()))];
        if let Some(vendor) = self.vendor_id.as_deref().filter(|v| !v.is_empty()) {
            parts.push(format!("vendor_id={}", urlencoding::encode(vendor)));
        }
        parts.join("&")
    }
}
