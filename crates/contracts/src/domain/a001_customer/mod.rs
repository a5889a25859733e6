pub mod aggregate;

pub use aggregate::{BillingAddress, CustomerDto, CustomerId, CustomerSearchQuery};
