pub mod a001_customer;
pub mod a002_product;
pub mod a003_rental_asset;
pub mod a004_delivery_route;
pub mod a005_rental_order;
pub mod common;
