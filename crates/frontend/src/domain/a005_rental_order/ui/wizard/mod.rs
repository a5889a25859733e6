//! Rental Order Wizard UI Module (MVVM Standard)
//!
//! Structure:
//! - model.rs: API functions for customer, catalog, asset, route and order services
//! - view_model.rs: RentalOrderWizardVm with RwSignals over WizardController
//! - view.rs: Main component RentalOrderWizard

mod model;
mod view;
mod view_model;

pub use view::RentalOrderWizard;
pub use view_model::RentalOrderWizardVm;
