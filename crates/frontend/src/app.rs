use crate::domain::a005_rental_order::ui::wizard::RentalOrderWizard;
use contracts::shared::config::{load_config, WizardConfig};
use leptos::prelude::*;

#[component]
pub fn App() -> impl IntoView {
    let config = load_config(None).unwrap_or_else(|e| {
        log::warn!("wizard config rejected, using defaults: {}", e);
        WizardConfig::default()
    });

    view! {
        <RentalOrderWizard config=config />
    }
}
