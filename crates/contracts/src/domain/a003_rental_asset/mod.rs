pub mod aggregate;

pub use aggregate::{AssetAvailabilityQuery, AssetId, AssetRef, AssetStatus};
