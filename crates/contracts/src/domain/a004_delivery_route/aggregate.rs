use crate::domain::common::aggregate_id::parse_uuid;
use crate::domain::common::AggregateId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Отображаемое имя «плавающего» маршрута (маршрут не закреплён)
pub const FLOATING_ROUTE_NAME: &str = "Floating";

// ============================================================================
// ID Type
// ============================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteId(pub Uuid);

impl RouteId {
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

impl AggregateId for RouteId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        parse_uuid(s).map(RouteId::new)
    }
}

impl std::fmt::Display for RouteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Address & geocoding
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Адрес доставки
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    pub line1: String,
    #[serde(default)]
    pub line2: String,
    pub city: String,
    #[serde(default)]
    pub region: String,
    pub postcode: String,
    #[serde(default)]
    pub country: String,
}

impl DeliveryAddress {
    /// Нормализованная строка адреса; служит ключом запросов геокодирования
    /// и подбора маршрута
    pub fn query_key(&self) -> String {
        [
            &self.line1,
            &self.line2,
            &self.city,
            &self.region,
            &self.postcode,
            &self.country,
        ]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }

    pub fn is_blank(&self) -> bool {
        self.query_key().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeRequest {
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeResponse {
    pub lat: f64,
    pub lng: f64,
    pub formatted_address: String,
}

impl GeocodeResponse {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

// ============================================================================
// Routes
// ============================================================================

/// Маршрут доставки логистической службы
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: RouteId,
    pub name: String,
    #[serde(default)]
    pub depot: Option<String>,
    /// Расстояние от адреса до маршрута, км (для списка альтернатив)
    #[serde(default)]
    pub distance_km: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMatchRequest {
    pub coordinates: Option<Coordinates>,
    pub address: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMatchResponse {
    pub best_match: Option<Route>,
    #[serde(default)]
    pub suggestions: Vec<Route>,
}

/// Способ назначения маршрута
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteAssignmentType {
    /// Лучшее совпадение от сервиса маршрутов
    Automatic,
    /// Пользователь выбрал другой маршрут
    Manual,
    /// Маршрут не закреплён, планируется вручную
    Floating,
}

impl RouteAssignmentType {
    /// Для ручного и плавающего назначения обязательна причина
    pub fn requires_reason(&self) -> bool {
        !matches!(self, RouteAssignmentType::Automatic)
    }
}

/// Назначение маршрута для доставки заказа
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteAssignment {
    /// `None` только для плавающего маршрута
    pub route_id: Option<RouteId>,
    pub route_name: String,
    pub assignment_type: RouteAssignmentType,
    pub override_reason: Option<String>,
}

impl RouteAssignment {
    pub fn automatic(route: &Route) -> Self {
        Self {
            route_id: Some(route.id),
            route_name: route.name.clone(),
            assignment_type: RouteAssignmentType::Automatic,
            override_reason: None,
        }
    }

    pub fn manual(route: &Route, reason: Option<String>) -> Self {
        Self {
            route_id: Some(route.id),
            route_name: route.name.clone(),
            assignment_type: RouteAssignmentType::Manual,
            override_reason: reason,
        }
    }

    pub fn floating(reason: Option<String>) -> Self {
        Self {
            route_id: None,
            route_name: FLOATING_ROUTE_NAME.to_string(),
            assignment_type: RouteAssignmentType::Floating,
            override_reason: reason,
        }
    }

    /// Причина задана и не состоит из пробелов
    pub fn has_reason(&self) -> bool {
        self.override_reason
            .as_deref()
            .map(|r| !r.trim().is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_key_normalizes_whitespace_parts() {
        let address = DeliveryAddress {
            line1: " Unit 4 ".into(),
            line2: String::new(),
            city: "Bristol".into(),
            region: " ".into(),
            postcode: "BS1 6QH".into(),
            country: String::new(),
        };
        assert_eq!(address.query_key(), "Unit 4, Bristol, BS1 6QH");
        assert!(DeliveryAddress::default().is_blank());
    }

    #[test]
    fn test_reason_requirements() {
        assert!(!RouteAssignmentType::Automatic.requires_reason());
        assert!(RouteAssignmentType::Manual.requires_reason());
        assert!(RouteAssignmentType::Floating.requires_reason());

        let floating = RouteAssignment::floating(Some("   ".into()));
        assert!(!floating.has_reason());
        assert_eq!(floating.route_id, None);
        assert_eq!(floating.route_name, FLOATING_ROUTE_NAME);
    }
}
