//! Rental Order Wizard - View Component
//!
//! Четыре шага мастера, индикатор прогресса и сводка стоимости.

use super::view_model::RentalOrderWizardVm;
use crate::shared::date_utils::{
    format_date, format_datetime, parse_input_date, parse_input_time, to_input_date,
    to_input_time,
};
use contracts::domain::a002_product::ProductId;
use contracts::domain::a003_rental_asset::AssetRef;
use contracts::domain::a004_delivery_route::{DeliveryAddress, RouteAssignmentType};
use contracts::domain::a005_rental_order::{
    AutoAssignStrategy, LineItem, MaintenanceConfig, RentalDurationPreset, WizardStep,
};
use contracts::shared::config::WizardConfig;
use leptos::prelude::*;
use rust_decimal::Decimal;
use thaw::*;

fn money(value: Decimal) -> String {
    format!("{:.2}", value)
}

#[component]
#[allow(non_snake_case)]
pub fn RentalOrderWizard(config: WizardConfig) -> impl IntoView {
    let vm = RentalOrderWizardVm::new(config);

    on_cleanup(move || vm.flush());

    let current_step = Signal::derive(move || vm.wizard.with(|w| w.current_step()));

    view! {
        <div class="rental-order-wizard">
            <Flex justify=FlexJustify::SpaceBetween align=FlexAlign::Center>
                <h2 class="rental-order-wizard__title">"Create Order"</h2>
                <Space>
                    <span class="rental-order-wizard__saved">
                        {move || vm.wizard.with(|w| {
                            if w.is_dirty() {
                                "Unsaved changes".to_string()
                            } else {
                                w.draft()
                                    .draft_meta
                                    .last_saved_at
                                    .map(|at| format!("Saved {}", format_datetime(at)))
                                    .unwrap_or_default()
                            }
                        })}
                    </span>
                    <Button appearance=ButtonAppearance::Secondary on_click=move |_| vm.save_now()>
                        "Save draft"
                    </Button>
                    <Button appearance=ButtonAppearance::Subtle on_click=move |_| vm.discard()>
                        "Discard"
                    </Button>
                </Space>
            </Flex>

            <StepIndicator vm=vm />

            {move || vm.error.get().map(|err| view! {
                <div class="warning-box">
                    <span class="warning-box__icon">"⚠"</span>
                    <span class="warning-box__text">{err}</span>
                </div>
            })}
            {move || vm.notice.get().map(|msg| view! {
                <div class="info-box">{msg}</div>
            })}

            <div class="rental-order-wizard__body">
                <div class="rental-order-wizard__step">
                    {move || match current_step.get() {
                        WizardStep::SmartStart => view! { <SmartStartStep vm=vm /> }.into_any(),
                        WizardStep::ProductBuilder => view! { <ProductBuilderStep vm=vm /> }.into_any(),
                        WizardStep::Delivery => view! { <DeliveryStep vm=vm /> }.into_any(),
                        WizardStep::Confirm => view! { <ConfirmStep vm=vm /> }.into_any(),
                    }}
                </div>
                <PricingSummaryPanel vm=vm />
            </div>

            <Flex justify=FlexJustify::SpaceBetween>
                <Button
                    appearance=ButtonAppearance::Secondary
                    on_click=move |_| vm.go_previous()
                    disabled=Signal::derive(move || current_step.get() == WizardStep::SmartStart)
                >
                    "Back"
                </Button>
                {move || if current_step.get().is_terminal() {
                    view! {
                        <Button
                            appearance=ButtonAppearance::Primary
                            on_click=move |_| vm.submit()
                            disabled=Signal::derive(move || vm.wizard.with(|w| w.is_submitting()))
                        >
                            "Submit order"
                        </Button>
                    }.into_any()
                } else {
                    view! {
                        <Button appearance=ButtonAppearance::Primary on_click=move |_| vm.go_next()>
                            "Next"
                        </Button>
                    }.into_any()
                }}
            </Flex>
        </div>
    }
}

#[component]
#[allow(non_snake_case)]
fn StepIndicator(vm: RentalOrderWizardVm) -> impl IntoView {
    view! {
        <ol class="wizard-steps">
            {WizardStep::ALL
                .into_iter()
                .map(|step| {
                    let class = move || {
                        vm.wizard.with(|w| {
                            let mut class = String::from("wizard-steps__item");
                            if w.current_step() == step {
                                class.push_str(" wizard-steps__item--current");
                            }
                            if w.draft().completed_steps.contains(step) {
                                class.push_str(" wizard-steps__item--done");
                            }
                            if !w.is_step_reachable(step) {
                                class.push_str(" wizard-steps__item--locked");
                            }
                            class
                        })
                    };
                    view! {
                        <li class=class on:click=move |_| vm.go_to_step(step)>
                            <span class="wizard-steps__number">{step.number()}</span>
                            <span class="wizard-steps__title">{step.title()}</span>
                        </li>
                    }
                })
                .collect_view()}
        </ol>
    }
}

/// Сообщение валидатора для поля; показывается после попытки перейти дальше
#[component]
#[allow(non_snake_case)]
fn FieldError(vm: RentalOrderWizardVm, step: WizardStep, field: String) -> impl IntoView {
    move || {
        if !vm.show_errors.get() {
            return None;
        }
        vm.wizard
            .with(|w| w.report().error_for(step, &field).map(str::to_string))
            .map(|message| view! { <div class="form__error">{message}</div> })
    }
}

// ============================================================================
// Step 1: Smart Start
// ============================================================================

#[component]
#[allow(non_snake_case)]
fn SmartStartStep(vm: RentalOrderWizardVm) -> impl IntoView {
    const STEP: WizardStep = WizardStep::SmartStart;
    let timing = move || vm.wizard.with(|w| w.draft().timing.clone());

    let presets = [
        (RentalDurationPreset::OneDay, "1 day"),
        (RentalDurationPreset::ThreeDays, "3 days"),
        (RentalDurationPreset::OneWeek, "1 week"),
        (RentalDurationPreset::TwoWeeks, "2 weeks"),
        (RentalDurationPreset::FourWeeks, "4 weeks"),
    ];

    view! {
        <div class="card">
            <div class="card__header"><h3>"Customer"</h3></div>
            <div class="card__body">
                {move || vm.wizard.with(|w| w.draft().customer.clone()).map(|customer| view! {
                    <div class="selected-customer">
                        <strong>{customer.name.clone()}</strong>
                        <span>{customer.email.clone()}</span>
                        <span>{customer.billing_address.one_line()}</span>
                        <button class="button button--link" on:click=move |_| vm.select_customer(None)>
                            "Change"
                        </button>
                    </div>
                })}
                <input
                    class="form__input"
                    type="search"
                    placeholder="Search customers"
                    prop:value=move || vm.customer_query.get()
                    on:input=move |ev| vm.search_customers(event_target_value(&ev))
                />
                <ul class="search-results">
                    {move || vm.customer_results.get().into_iter().map(|customer| {
                        let label = format!("{} ({})", customer.name, customer.email);
                        view! {
                            <li on:click=move |_| vm.select_customer(Some(customer.clone()))>{label}</li>
                        }
                    }).collect_view()}
                </ul>
                <FieldError vm=vm step=STEP field="customer".to_string() />
            </div>
        </div>

        <div class="card">
            <div class="card__header"><h3>"Timing"</h3></div>
            <div class="card__body form__grid">
                <label class="form__label">"Order date"</label>
                <input type="date" prop:value=move || to_input_date(timing().order_date)
                    on:change=move |ev| {
                        let value = parse_input_date(&event_target_value(&ev));
                        vm.update_timing(|t| t.order_date = value);
                    } />
                <FieldError vm=vm step=STEP field="timing.order_date".to_string() />

                <label class="form__label">"Delivery date"</label>
                <input type="date" prop:value=move || to_input_date(timing().delivery_date)
                    on:change=move |ev| {
                        let value = parse_input_date(&event_target_value(&ev));
                        vm.update_timing(|t| t.delivery_date = value);
                    } />
                <input type="time" prop:value=move || to_input_time(timing().delivery_time)
                    on:change=move |ev| {
                        let value = parse_input_time(&event_target_value(&ev));
                        vm.update_timing(|t| t.delivery_time = value);
                    } />
                <FieldError vm=vm step=STEP field="timing.delivery_date".to_string() />

                <label class="form__label">"Charging starts"</label>
                <input type="date" prop:value=move || to_input_date(timing().charging_start_date)
                    on:change=move |ev| {
                        let value = parse_input_date(&event_target_value(&ev));
                        vm.update_timing(|t| t.charging_start_date = value);
                    } />
                <FieldError vm=vm step=STEP field="timing.charging_start_date".to_string() />

                <label class="form__checkbox">
                    <input type="checkbox" prop:checked=move || timing().use_expected_return_date
                        on:change=move |ev| vm.set_use_expected_return_date(event_target_checked(&ev)) />
                    "Expected return date"
                </label>
                <Show when=move || timing().use_expected_return_date>
                    <input type="date" prop:value=move || to_input_date(timing().expected_return_date)
                        on:change=move |ev| {
                            let value = parse_input_date(&event_target_value(&ev));
                            vm.update_timing(|t| {
                                t.expected_return_date = value;
                                t.rental_duration_preset = Some(RentalDurationPreset::Custom);
                            });
                        } />
                    <FieldError vm=vm step=STEP field="timing.expected_return_date".to_string() />
                </Show>

                <div class="preset-buttons">
                    {presets.into_iter().map(|(preset, label)| view! {
                        <button
                            class="button button--secondary"
                            class:button--active=move || timing().rental_duration_preset == Some(preset)
                            on:click=move |_| vm.apply_preset(preset)
                        >
                            {label}
                        </button>
                    }).collect_view()}
                </div>
            </div>
        </div>
    }
}

// ============================================================================
// Step 2: Product Builder
// ============================================================================

#[component]
#[allow(non_snake_case)]
fn ProductBuilderStep(vm: RentalOrderWizardVm) -> impl IntoView {
    let product_ids = move || {
        vm.wizard
            .with(|w| w.draft().line_items.iter().map(|l| l.product_id).collect::<Vec<_>>())
    };

    view! {
        <div class="card">
            <div class="card__header"><h3>"Products"</h3></div>
            <div class="card__body">
                <input
                    class="form__input"
                    type="search"
                    placeholder="Search catalog"
                    prop:value=move || vm.product_query.get()
                    on:input=move |ev| vm.search_products(event_target_value(&ev))
                />
                <ul class="search-results">
                    {move || vm.product_results.get().into_iter().map(|product| {
                        let label = format!(
                            "{} · {} · {}/day · {} available",
                            product.sku,
                            product.name,
                            money(product.daily_rate),
                            product.quantity_available
                        );
                        view! {
                            <li>
                                <span>{label}</span>
                                <button class="button button--link" on:click=move |_| vm.add_product(product.clone())>
                                    "Add"
                                </button>
                            </li>
                        }
                    }).collect_view()}
                </ul>
                <FieldError vm=vm step=WizardStep::ProductBuilder field="line_items".to_string() />
            </div>
        </div>

        <For
            each=product_ids
            key=|id| *id
            children=move |product_id| view! { <LineItemCard vm=vm product_id=product_id /> }
        />
    }
}

#[component]
#[allow(non_snake_case)]
fn LineItemCard(vm: RentalOrderWizardVm, product_id: ProductId) -> impl IntoView {
    const STEP: WizardStep = WizardStep::ProductBuilder;
    let line = move || vm.wizard.with(|w| w.draft().line(product_id).cloned());
    let index = move || {
        vm.wizard.with(|w| {
            w.draft()
                .line_items
                .iter()
                .position(|l| l.product_id == product_id)
                .unwrap_or_default()
        })
    };
    let field = move |name: &str| format!("line_items[{}].{}", index(), name);
    let line_total = move || {
        vm.wizard.with(|w| {
            w.pricing()
                .lines
                .iter()
                .find(|p| p.product_id == product_id)
                .map(|p| money(p.line_total))
                .unwrap_or_default()
        })
    };
    let auto_count = RwSignal::new(String::from("1"));

    move || {
        line().map(|item: LineItem| {
            let tracks_assets = item.tracks_assets;
            view! {
                <div class="card line-item">
                    <Flex justify=FlexJustify::SpaceBetween>
                        <h4>{format!("{} · {}", item.sku, item.name)}</h4>
                        <span class="line-item__total">{line_total}</span>
                        <button class="button button--link" on:click=move |_| vm.remove_product(product_id)>
                            "Remove"
                        </button>
                    </Flex>

                    {if tracks_assets {
                        view! {
                            <div class="line-item__assets">
                                <span>{format!("Quantity: {}", item.quantity)}</span>
                                <div class="asset-chips">
                                    {item.selected_assets.iter().map(|asset| {
                                        let asset_id = asset.asset_id;
                                        view! {
                                            <span class="asset-chip">
                                                {asset.asset_number.clone()}
                                                <button class="asset-chip__remove"
                                                    on:click=move |_| vm.remove_asset(product_id, asset_id)>
                                                    "×"
                                                </button>
                                            </span>
                                        }
                                    }).collect_view()}
                                </div>
                                <Flex>
                                    <input type="number" min="0" class="form__input form__input--small"
                                        prop:value=move || auto_count.get()
                                        on:input=move |ev| auto_count.set(event_target_value(&ev)) />
                                    {[AutoAssignStrategy::Oldest, AutoAssignStrategy::Newest, AutoAssignStrategy::LeastUsed]
                                        .into_iter()
                                        .map(|strategy| view! {
                                            <button class="button button--secondary" on:click=move |_| {
                                                let count = auto_count.get_untracked().trim().parse().unwrap_or(0);
                                                vm.auto_assign(product_id, count, strategy);
                                            }>
                                                {strategy.label()}
                                            </button>
                                        })
                                        .collect_view()}
                                    <button class="button button--link" on:click=move |_| vm.load_assets(product_id)>
                                        "Refresh availability"
                                    </button>
                                </Flex>
                                <AssetList vm=vm product_id=product_id />
                            </div>
                        }.into_any()
                    } else {
                        view! {
                            <label class="form__label">
                                "Quantity"
                                <input type="number" min="0" class="form__input form__input--small"
                                    prop:value=item.quantity.to_string()
                                    on:change=move |ev| {
                                        let quantity = event_target_value(&ev).trim().parse().unwrap_or(0);
                                        vm.set_quantity(product_id, quantity);
                                    } />
                            </label>
                        }.into_any()
                    }}
                    <FieldError vm=vm step=STEP field=field("quantity") />
                    <FieldError vm=vm step=STEP field=field("selected_assets") />

                    <MaintenanceEditor vm=vm product_id=product_id config=item.maintenance_config.clone() />
                    <FieldError vm=vm step=STEP field=field("maintenance_config.first_maintenance_date") />
                </div>
            }
        })
    }
}

#[component]
#[allow(non_snake_case)]
fn AssetList(vm: RentalOrderWizardVm, product_id: ProductId) -> impl IntoView {
    let assets = move || vm.wizard.with(|w| w.selectable_assets(product_id));

    view! {
        <table class="table asset-table">
            <thead>
                <tr>
                    <th></th>
                    <th>"Asset"</th>
                    <th>"Condition"</th>
                    <th>"Last maintenance"</th>
                    <th>"Rentals"</th>
                </tr>
            </thead>
            <tbody>
                {move || assets().into_iter().map(|asset: AssetRef| {
                    let asset_id = asset.asset_id;
                    let selected = move || vm.wizard.with(|w| {
                        w.draft().line(product_id).is_some_and(|l| l.has_asset(asset_id))
                    });
                    view! {
                        <tr>
                            <td>
                                <input type="checkbox" prop:checked=selected
                                    on:change=move |_| vm.toggle_asset(product_id, asset_id) />
                            </td>
                            <td>{asset.asset_number.clone()}</td>
                            <td>{asset.condition.clone()}</td>
                            <td>{format_date(asset.last_maintenance_date)}</td>
                            <td>{asset.usage_count}</td>
                        </tr>
                    }
                }).collect_view()}
            </tbody>
        </table>
    }
}

#[component]
#[allow(non_snake_case)]
fn MaintenanceEditor(
    vm: RentalOrderWizardVm,
    product_id: ProductId,
    config: Option<MaintenanceConfig>,
) -> impl IntoView {
    let enabled = config.as_ref().is_some_and(|c| c.requires_maintenance);
    let first_date = config.as_ref().and_then(|c| c.first_maintenance_date);
    let base = config.unwrap_or_default();
    let base_for_date = base.clone();

    view! {
        <div class="line-item__maintenance">
            <label class="form__checkbox">
                <input type="checkbox" prop:checked=enabled
                    on:change=move |ev| {
                        let config = event_target_checked(&ev).then(|| MaintenanceConfig {
                            requires_maintenance: true,
                            ..base.clone()
                        });
                        vm.set_maintenance(product_id, config);
                    } />
                "Schedule maintenance"
            </label>
            <Show when=move || enabled>
                <input type="date" prop:value=to_input_date(first_date)
                    on:change={
                        let base = base_for_date.clone();
                        move |ev| {
                            let config = MaintenanceConfig {
                                requires_maintenance: true,
                                first_maintenance_date: parse_input_date(&event_target_value(&ev)),
                                ..base.clone()
                            };
                            vm.set_maintenance(product_id, Some(config));
                        }
                    } />
            </Show>
        </div>
    }
}

// ============================================================================
// Step 3: Delivery
// ============================================================================

#[component]
#[allow(non_snake_case)]
fn DeliveryStep(vm: RentalOrderWizardVm) -> impl IntoView {
    const STEP: WizardStep = WizardStep::Delivery;
    let delivery = move || vm.wizard.with(|w| w.draft().delivery.clone());

    let address_input = move |label: &'static str, get: fn(&DeliveryAddress) -> String, set: fn(&mut DeliveryAddress, String)| {
        view! {
            <label class="form__label">{label}</label>
            <input class="form__input" prop:value=move || get(&delivery().address)
                on:change=move |ev| {
                    let mut address = delivery().address;
                    set(&mut address, event_target_value(&ev));
                    vm.set_delivery_address(address);
                } />
        }
    };

    view! {
        <div class="card">
            <div class="card__header"><h3>"Delivery address"</h3></div>
            <div class="card__body form__grid">
                {address_input("Address line 1", |a| a.line1.clone(), |a, v| a.line1 = v)}
                <FieldError vm=vm step=STEP field="delivery.address.line1".to_string() />
                {address_input("Address line 2", |a| a.line2.clone(), |a, v| a.line2 = v)}
                {address_input("City", |a| a.city.clone(), |a, v| a.city = v)}
                <FieldError vm=vm step=STEP field="delivery.address.city".to_string() />
                {address_input("Postcode", |a| a.postcode.clone(), |a, v| a.postcode = v)}
                <FieldError vm=vm step=STEP field="delivery.address.postcode".to_string() />

                <Flex align=FlexAlign::Center>
                    <Button appearance=ButtonAppearance::Secondary on_click=move |_| vm.verify_address()>
                        "Verify address"
                    </Button>
                    <span>
                        {move || {
                            if vm.wizard.with(|w| w.routes().is_geocoding()) {
                                "Verifying…"
                            } else if delivery().location_verified {
                                "✓ Location verified"
                            } else {
                                "Not verified"
                            }
                        }}
                    </span>
                </Flex>
                <FieldError vm=vm step=STEP field="delivery.location_verified".to_string() />
            </div>
        </div>

        <RoutePicker vm=vm />

        <div class="card">
            <div class="card__header"><h3>"Site contact"</h3></div>
            <div class="card__body form__grid">
                <label class="form__label">"Name"</label>
                <input class="form__input" prop:value=move || delivery().contact_name
                    on:change=move |ev| {
                        let value = event_target_value(&ev);
                        vm.update_delivery(|d| d.contact_name = value);
                    } />
                <FieldError vm=vm step=STEP field="delivery.contact_name".to_string() />
                <label class="form__label">"Phone"</label>
                <input class="form__input" type="tel" prop:value=move || delivery().contact_phone
                    on:change=move |ev| {
                        let value = event_target_value(&ev);
                        vm.update_delivery(|d| d.contact_phone = value);
                    } />
                <FieldError vm=vm step=STEP field="delivery.contact_phone".to_string() />
                <label class="form__label">"Instructions"</label>
                <textarea class="form__input" prop:value=move || delivery().instructions
                    on:change=move |ev| {
                        let value = event_target_value(&ev);
                        vm.update_delivery(|d| d.instructions = value);
                    } />
            </div>
        </div>
    }
}

#[component]
#[allow(non_snake_case)]
fn RoutePicker(vm: RentalOrderWizardVm) -> impl IntoView {
    const STEP: WizardStep = WizardStep::Delivery;
    let assigned = move || vm.wizard.with(|w| w.draft().delivery.assigned_route.clone());
    let candidates = move || {
        vm.wizard
            .with(|w| w.routes().candidates().into_iter().cloned().collect::<Vec<_>>())
    };
    let best_id = move || vm.wizard.with(|w| w.routes().best_match().map(|r| r.id));

    view! {
        <div class="card">
            <div class="card__header">
                <Flex justify=FlexJustify::SpaceBetween>
                    <h3>"Route"</h3>
                    <button class="button button--link" on:click=move |_| vm.refresh_route()>
                        "Find route"
                    </button>
                </Flex>
            </div>
            <div class="card__body">
                {move || vm.wizard.with(|w| w.routes().warning().map(str::to_string)).map(|warning| view! {
                    <div class="warning-box"><span class="warning-box__text">{warning}</span></div>
                })}
                <ul class="route-list">
                    {move || candidates().into_iter().map(|route| {
                        let route_id = route.id;
                        let checked = move || assigned().is_some_and(|a| a.route_id == Some(route_id));
                        let label = match (best_id() == Some(route_id), route.distance_km) {
                            (true, _) => format!("{} (suggested)", route.name),
                            (false, Some(km)) => format!("{} · {:.1} km", route.name, km),
                            (false, None) => route.name.clone(),
                        };
                        view! {
                            <li>
                                <label class="form__checkbox">
                                    <input type="radio" name="route" prop:checked=checked
                                        on:change=move |_| vm.select_route(route_id) />
                                    {label}
                                </label>
                            </li>
                        }
                    }).collect_view()}
                    <li>
                        <label class="form__checkbox">
                            <input type="radio" name="route"
                                prop:checked=move || assigned().is_some_and(|a| a.assignment_type == RouteAssignmentType::Floating)
                                on:change=move |_| vm.select_floating() />
                            "Floating (plan manually)"
                        </label>
                    </li>
                </ul>
                <FieldError vm=vm step=STEP field="delivery.assigned_route".to_string() />

                <Show when=move || assigned().is_some_and(|a| a.assignment_type.requires_reason())>
                    <label class="form__label">"Reason for override"</label>
                    <input class="form__input"
                        prop:value=move || assigned().and_then(|a| a.override_reason).unwrap_or_default()
                        on:change=move |ev| vm.set_override_reason(event_target_value(&ev)) />
                    <FieldError vm=vm step=STEP field="delivery.assigned_route.override_reason".to_string() />
                </Show>
            </div>
        </div>
    }
}

// ============================================================================
// Step 4: Confirm
// ============================================================================

#[component]
#[allow(non_snake_case)]
fn ConfirmStep(vm: RentalOrderWizardVm) -> impl IntoView {
    const STEP: WizardStep = WizardStep::Confirm;
    let settings = move || vm.wizard.with(|w| w.draft().settings.clone());
    let draft = move || vm.wizard.with(|w| w.draft().clone());

    view! {
        <div class="card">
            <div class="card__header"><h3>"Summary"</h3></div>
            <div class="card__body">
                {move || {
                    let draft = draft();
                    let customer = draft.customer.map(|c| c.name).unwrap_or_default();
                    let route = draft
                        .delivery
                        .assigned_route
                        .map(|r| r.route_name)
                        .unwrap_or_default();
                    view! {
                        <dl class="summary-list">
                            <dt>"Customer"</dt><dd>{customer}</dd>
                            <dt>"Delivery"</dt>
                            <dd>{format!("{} · {}", format_date(draft.timing.delivery_date), draft.delivery.address.query_key())}</dd>
                            <dt>"Return"</dt><dd>{format_date(draft.timing.expected_return_date)}</dd>
                            <dt>"Route"</dt><dd>{route}</dd>
                            <dt>"Products"</dt><dd>{draft.line_items.len()}</dd>
                        </dl>
                    }
                }}
                {move || {
                    if !vm.show_errors.get() {
                        return None;
                    }
                    let errors = vm.wizard.with(|w| w.report().errors(STEP).clone());
                    (!errors.is_empty()).then(|| view! {
                        <ul class="form__error-list">
                            {errors.into_values().map(|message| view! { <li>{message}</li> }).collect_view()}
                        </ul>
                    })
                }}
            </div>
        </div>

        <div class="card">
            <div class="card__header"><h3>"Order settings"</h3></div>
            <div class="card__body form__grid">
                <label class="form__label">"Purchase order number"</label>
                <input class="form__input" prop:value=move || settings().purchase_order_number
                    on:change=move |ev| {
                        let value = event_target_value(&ev);
                        vm.update_settings(|s| s.purchase_order_number = value);
                    } />
                <label class="form__label">"Order discount, %"</label>
                <input class="form__input" type="number" min="0" max="100" step="0.01"
                    prop:value=move || settings().order_discount_percent.to_string()
                    on:change=move |ev| vm.set_discount_percent(event_target_value(&ev)) />
                <FieldError vm=vm step=STEP field="settings.order_discount_percent".to_string() />
                <label class="form__checkbox">
                    <input type="checkbox" prop:checked=move || settings().require_signature
                        on:change=move |ev| {
                            let value = event_target_checked(&ev);
                            vm.update_settings(|s| s.require_signature = value);
                        } />
                    "Require signature on delivery"
                </label>
                <label class="form__checkbox">
                    <input type="checkbox" prop:checked=move || settings().send_confirmation_email
                        on:change=move |ev| {
                            let value = event_target_checked(&ev);
                            vm.update_settings(|s| s.send_confirmation_email = value);
                        } />
                    "Send confirmation email"
                </label>
                <label class="form__checkbox">
                    <input type="checkbox" prop:checked=move || settings().terms_accepted
                        on:change=move |ev| {
                            let value = event_target_checked(&ev);
                            vm.update_settings(|s| s.terms_accepted = value);
                        } />
                    "I accept the rental terms and conditions"
                </label>
                <FieldError vm=vm step=STEP field="settings.terms_accepted".to_string() />
            </div>
        </div>
    }
}

// ============================================================================
// Pricing
// ============================================================================

#[component]
#[allow(non_snake_case)]
fn PricingSummaryPanel(vm: RentalOrderWizardVm) -> impl IntoView {
    let pricing = move || vm.wizard.with(|w| w.pricing().clone());

    view! {
        <aside class="card pricing-summary">
            <div class="card__header"><h3>"Pricing"</h3></div>
            <div class="card__body">
                {move || {
                    let pricing = pricing();
                    let waiver = pricing.damage_waiver_amount + pricing.damage_waiver_tax;
                    view! {
                        <table class="table">
                            <tbody>
                                <tr><td>"Subtotal"</td><td class="num">{money(pricing.subtotal)}</td></tr>
                                <tr><td>"Tax"</td><td class="num">{money(pricing.tax)}</td></tr>
                                {(!pricing.discount_amount.is_zero()).then(|| view! {
                                    <tr><td>"Discount"</td><td class="num">{format!("-{}", money(pricing.discount_amount))}</td></tr>
                                })}
                                {(!waiver.is_zero()).then(|| view! {
                                    <tr><td>"Damage waiver"</td><td class="num">{money(waiver)}</td></tr>
                                })}
                                <tr class="pricing-summary__total">
                                    <td>"Total"</td><td class="num">{money(pricing.total)}</td>
                                </tr>
                            </tbody>
                        </table>
                    }
                }}
            </div>
        </aside>
    }
}
