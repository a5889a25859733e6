pub mod aggregate;

pub use aggregate::{ProductDto, ProductId, ProductQuery};
