//! Rental Order Wizard - Model Layer
//!
//! HTTP calls to the customer, catalog, availability, routing, geocoding
//! and order services.

use crate::shared::api_utils::api_url;
use contracts::domain::a001_customer::{CustomerDto, CustomerSearchQuery};
use contracts::domain::a002_product::{ProductDto, ProductQuery};
use contracts::domain::a003_rental_asset::{AssetAvailabilityQuery, AssetRef};
use contracts::domain::a004_delivery_route::{
    GeocodeRequest, GeocodeResponse, RouteMatchRequest, RouteMatchResponse,
};
use contracts::domain::a005_rental_order::{SubmitOrderRequest, SubmitOrderResponse};
use contracts::shared::config::WizardConfig;
use gloo_net::http::Request;
use serde::de::DeserializeOwned;
use serde::Serialize;

async fn get_json<T: DeserializeOwned>(url: &str) -> Result<T, String> {
    let response = Request::get(url)
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    if !response.ok() {
        return Err(format!("HTTP error: {}", response.status()));
    }

    response
        .json()
        .await
        .map_err(|e| format!("Failed to parse response: {}", e))
}

async fn post_json<B: Serialize, T: DeserializeOwned>(url: &str, body: &B) -> Result<T, String> {
    let response = Request::post(url)
        .json(body)
        .map_err(|e| format!("Failed to serialize request: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    if !response.ok() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(if text.is_empty() {
            format!("HTTP error: {}", status)
        } else {
            format!("HTTP error: {}: {}", status, text)
        });
    }

    response
        .json()
        .await
        .map_err(|e| format!("Failed to parse response: {}", e))
}

/// Поиск клиентов
pub async fn search_customers(
    config: &WizardConfig,
    query: &CustomerSearchQuery,
) -> Result<Vec<CustomerDto>, String> {
    let url = api_url(config, &format!("/api/customers?{}", query.to_query_string()));
    get_json(&url).await
}

/// Каталог товаров
pub async fn fetch_products(
    config: &WizardConfig,
    query: &ProductQuery,
) -> Result<Vec<ProductDto>, String> {
    let url = api_url(config, &format!("/api/products?{}", query.to_query_string()));
    get_json(&url).await
}

/// Доступные единицы товара на период аренды
pub async fn fetch_available_assets(
    config: &WizardConfig,
    query: &AssetAvailabilityQuery,
) -> Result<Vec<AssetRef>, String> {
    get_json(&api_url(config, &query.to_path())).await
}

pub async fn match_route(
    config: &WizardConfig,
    request: &RouteMatchRequest,
) -> Result<RouteMatchResponse, String> {
    post_json(&api_url(config, "/api/routes/match"), request).await
}

pub async fn geocode(
    config: &WizardConfig,
    request: &GeocodeRequest,
) -> Result<GeocodeResponse, String> {
    post_json(&api_url(config, "/api/geocode"), request).await
}

/// Оформить заказ
pub async fn submit_order(
    config: &WizardConfig,
    request: &SubmitOrderRequest,
) -> Result<SubmitOrderResponse, String> {
    post_json(&api_url(config, "/api/orders"), request).await
}
