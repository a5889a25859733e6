//! Назначение маршрута доставки по адресу.
//!
//! Геокодирование и подбор маршрута выполняются асинхронно на стороне UI.
//! Здесь хранится только состояние: какой запрос последний, какие маршруты
//! предложены, и правила применения ответа к данным доставки.

use super::aggregate::DeliveryDetails;
use super::error::{DraftResult, OrderDraftError};
use crate::domain::a004_delivery_route::{
    DeliveryAddress, GeocodeRequest, GeocodeResponse, Route, RouteAssignment, RouteId,
    RouteMatchRequest, RouteMatchResponse,
};
use crate::shared::request_guard::{LatestRequest, RequestTicket};
use chrono::NaiveDate;

/// Состояние подбора маршрута для текущего адреса
#[derive(Debug, Clone, Default)]
pub struct RouteAssignmentState {
    geocode: LatestRequest<String>,
    route_match: LatestRequest<String>,
    last_match: Option<RouteMatchResponse>,
    warning: Option<String>,
}

impl RouteAssignmentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Сменить адрес доставки. Старые координаты, подтверждение адреса и
    /// назначенный маршрут больше не относятся к новому адресу.
    pub fn set_address(&mut self, delivery: &mut DeliveryDetails, address: DeliveryAddress) {
        if delivery.address == address {
            return;
        }
        delivery.address = address;
        delivery.coordinates = None;
        delivery.location_verified = false;
        delivery.assigned_route = None;
        self.geocode.cancel();
        self.route_match.cancel();
        self.last_match = None;
        self.warning = None;
    }

    /// Начать геокодирование; `None`, если адрес пустой
    pub fn begin_geocode(
        &mut self,
        delivery: &DeliveryDetails,
    ) -> Option<(RequestTicket<String>, GeocodeRequest)> {
        let key = delivery.address.query_key();
        if key.is_empty() {
            return None;
        }
        let ticket = self.geocode.issue(key.clone());
        Some((ticket, GeocodeRequest { address: key }))
    }

    /// Применить ответ геокодера. Возвращает `false` для устаревшего ответа.
    pub fn apply_geocode(
        &mut self,
        delivery: &mut DeliveryDetails,
        ticket: &RequestTicket<String>,
        result: Result<GeocodeResponse, String>,
    ) -> bool {
        if !self.geocode.accept(ticket) {
            log::debug!("discarding stale geocode response for '{}'", ticket.key);
            return false;
        }
        match result {
            Ok(response) => {
                delivery.coordinates = Some(response.coordinates());
                delivery.location_verified = true;
                self.warning = None;
            }
            Err(e) => {
                log::warn!("geocoding failed for '{}': {}", ticket.key, e);
                delivery.coordinates = None;
                delivery.location_verified = false;
                self.warning = Some(format!("Address could not be verified: {}", e));
            }
        }
        true
    }

    /// Начать подбор маршрута по адресу (и координатам, если они известны)
    pub fn begin_match(
        &mut self,
        delivery: &DeliveryDetails,
        date: Option<NaiveDate>,
    ) -> Option<(RequestTicket<String>, RouteMatchRequest)> {
        let key = delivery.address.query_key();
        if key.is_empty() && delivery.coordinates.is_none() {
            return None;
        }
        let ticket = self.route_match.issue(key.clone());
        let request = RouteMatchRequest {
            coordinates: delivery.coordinates,
            address: (!key.is_empty()).then_some(key),
            date,
        };
        Some((ticket, request))
    }

    /// Применить ответ сервиса маршрутов.
    ///
    /// Лучшее совпадение назначается автоматически и целиком заменяет прежнее
    /// назначение; без совпадения назначение очищается.
    pub fn apply_match(
        &mut self,
        delivery: &mut DeliveryDetails,
        ticket: &RequestTicket<String>,
        response: RouteMatchResponse,
    ) -> bool {
        if !self.route_match.accept(ticket) {
            log::debug!("discarding stale route match for '{}'", ticket.key);
            return false;
        }
        delivery.assigned_route = response.best_match.as_ref().map(RouteAssignment::automatic);
        self.warning = match &response.best_match {
            Some(route) => {
                log::info!("route '{}' matched for '{}'", route.name, ticket.key);
                None
            }
            None => Some("No delivery route matches this address".to_string()),
        };
        self.last_match = Some(response);
        true
    }

    /// Сбой сервиса маршрутов: считается отсутствием совпадения
    pub fn match_failed(
        &mut self,
        delivery: &mut DeliveryDetails,
        ticket: &RequestTicket<String>,
        error: &str,
    ) -> bool {
        if !self.route_match.accept(ticket) {
            return false;
        }
        log::warn!("route match failed for '{}': {}", ticket.key, error);
        delivery.assigned_route = None;
        self.last_match = Some(RouteMatchResponse::default());
        self.warning = Some(format!("Route lookup failed: {}", error));
        true
    }

    /// Выбрать маршрут из предложенных. Лучшее совпадение назначается как
    /// автоматическое, любой другой маршрут как ручной.
    pub fn select_route(
        &mut self,
        delivery: &mut DeliveryDetails,
        route_id: RouteId,
        reason: Option<String>,
    ) -> DraftResult<()> {
        let response = self
            .last_match
            .as_ref()
            .ok_or_else(|| OrderDraftError::UnknownRoute(route_id.to_string()))?;

        let assignment = match &response.best_match {
            Some(best) if best.id == route_id => RouteAssignment::automatic(best),
            _ => {
                let route = response
                    .suggestions
                    .iter()
                    .find(|r| r.id == route_id)
                    .ok_or_else(|| OrderDraftError::UnknownRoute(route_id.to_string()))?;
                RouteAssignment::manual(route, reason)
            }
        };
        delivery.assigned_route = Some(assignment);
        Ok(())
    }

    /// Оставить маршрут плавающим
    pub fn select_floating(&mut self, delivery: &mut DeliveryDetails, reason: Option<String>) {
        delivery.assigned_route = Some(RouteAssignment::floating(reason));
    }

    /// Обновить причину ручного или плавающего назначения
    pub fn set_override_reason(&mut self, delivery: &mut DeliveryDetails, reason: String) {
        if let Some(assignment) = delivery.assigned_route.as_mut() {
            if assignment.assignment_type.requires_reason() {
                assignment.override_reason = Some(reason);
            }
        }
    }

    pub fn best_match(&self) -> Option<&Route> {
        self.last_match.as_ref().and_then(|m| m.best_match.as_ref())
    }

    /// Все маршруты для выбора: лучшее совпадение первым
    pub fn candidates(&self) -> Vec<&Route> {
        let Some(response) = self.last_match.as_ref() else {
            return Vec::new();
        };
        response
            .best_match
            .iter()
            .chain(
                response
                    .suggestions
                    .iter()
                    .filter(|r| Some(r.id) != response.best_match.as_ref().map(|b| b.id)),
            )
            .collect()
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn is_geocoding(&self) -> bool {
        self.geocode.pending_key().is_some()
    }

    pub fn is_matching(&self) -> bool {
        self.route_match.pending_key().is_some()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
