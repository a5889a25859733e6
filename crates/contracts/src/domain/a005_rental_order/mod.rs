pub mod aggregate;
pub mod asset_assignment;
pub mod autosave;
pub mod draft_store;
pub mod error;
pub mod pricing;
pub mod route_assignment;
pub mod submit;
pub mod validation;
pub mod wizard;

pub use aggregate::{
    CompletedSteps, CustomerSelection, DamageWaiver, DeliveryDetails, DraftMeta, DraftPatch,
    LineItem, MaintenanceConfig, MaintenanceEndCondition, MaintenancePriority,
    MaintenanceScheduleType, OrderDraft, OrderSettings, OrderTiming, RentalDurationPreset,
    WizardStep,
};
pub use asset_assignment::{AssetAssignmentEngine, AutoAssignStrategy};
pub use autosave::AutoSaveScheduler;
pub use draft_store::{
    DraftStorage, DraftStore, MemoryDraftStorage, PersistedDraft, DRAFT_SCHEMA_VERSION,
};
pub use error::{DraftResult, OrderDraftError};
pub use pricing::{compute_pricing, LinePricing, PricingSummary};
pub use route_assignment::RouteAssignmentState;
pub use submit::{SubmitLineItem, SubmitOrderRequest, SubmitOrderResponse};
pub use validation::{validate_step, FieldErrors, ValidationReport};
pub use wizard::WizardController;
