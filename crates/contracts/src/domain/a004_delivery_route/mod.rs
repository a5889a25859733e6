pub mod aggregate;

pub use aggregate::{
    Coordinates, DeliveryAddress, GeocodeRequest, GeocodeResponse, Route, RouteAssignment,
    RouteAssignmentType, RouteId, RouteMatchRequest, RouteMatchResponse, FLOATING_ROUTE_NAME,
};
