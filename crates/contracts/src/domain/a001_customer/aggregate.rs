use crate::domain::common::aggregate_id::parse_uuid;
use crate::domain::common::AggregateId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ID Type
// ============================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomerId(pub Uuid);

impl CustomerId {
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

impl AggregateId for CustomerId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        parse_uuid(s).map(CustomerId::new)
    }
}

// ============================================================================
// DTO
// ============================================================================

/// Адрес для выставления счетов
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingAddress {
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

impl BillingAddress {
    /// Адрес в одну строку для сводки заказа
    pub fn one_line(&self) -> String {
        [
            self.line1.as_str(),
            self.line2.as_str(),
            self.city.as_str(),
            self.region.as_str(),
            self.postcode.as_str(),
            self.country.as_str(),
        ]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Клиент из сервиса поиска клиентов
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    pub id: CustomerId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub payment_term: Option<String>,
    pub invoice_run_code: Option<String>,
    #[serde(default)]
    pub billing_address: BillingAddress,
}

/// Параметры запроса поиска клиентов (`GET /api/customers?q=`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerSearchQuery {
    pub q: String,
}

impl CustomerSearchQuery {
    pub fn new(q: impl Into<String>) -> Self {
        Self { q: q.into() }
    }

    /// Пустой запрос не отправляется на сервер
    pub fn is_blank(&self) -> bool {
        self.q.trim().is_empty()
    }

    pub fn to_query_string(&self) -> String {
        format!("q={}", urlencoding::encode(self.q.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_line_skips_empty_parts() {
        let address = BillingAddress {
            line1: "12 Quarry Road".into(),
            line2: "  ".into(),
            city: "Leeds".into(),
            region: String::new(),
            postcode: "LS1 4AB".into(),
            country: "UK".into(),
        };
        assert_eq!(address.one_line(), "12 Quarry Road, Leeds, LS1 4AB, UK");
    }

    #[test]
    fn test_customer_id_roundtrip() {
        let id = CustomerId::new_v4();
        assert_eq!(CustomerId::from_string(&id.as_string()), Ok(id));
        assert!(CustomerId::from_string("not-a-uuid").is_err());
    }

    #[test]
    fn test_customer_dto_camel_case() {
        let json = r#"{
            "id": "6a1f3c2e-9d1b-4c55-8f0e-2b7d9a7c1e01",
            "name": "Acme Builders",
            "email": "ops@acme.test",
            "paymentTerm": "NET30",
            "invoiceRunCode": null,
            "billingAddress": {"line1": "1 High St", "city": "York", "postcode": "YO1 1AA"}
        }"#;
        let dto: CustomerDto = serde_json::from_str(json).unwrap();
        assert_eq!(dto.payment_term.as_deref(), Some("NET30"));
        assert_eq!(dto.billing_address.city, "York");
    }

    #[test]
    fn test_search_query_encoding() {
        let query = CustomerSearchQuery::new(" O'Brien & Sons ");
        assert_eq!(query.to_query_string(), "q=O%27Brien%20%26%20Sons");
        assert!(CustomerSearchQuery::new("   ").is_blank());
    }
}
