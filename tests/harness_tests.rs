//! Store flows driven through EffectStoreTestHarness, plus keyboard input
//! routed through the dashboard components.

use pokedash::{
    action::Action,
    catalog::{CategoryId, CategoryKind},
    components::{
        CategoryTabs, CategoryTabsProps, Component, DetailsModal, DetailsModalProps,
        MissingModal, MissingModalProps, SpriteGallery, SpriteGalleryProps,
    },
    effect::Effect,
    modal::{AcquisitionKind, MissingEntry, MissingReport, ModalKind, RequestId},
    reducer::reducer,
    state::{AppState, DashboardStats, FocusArea, GenerationStat, PokemonDetails},
};
use crossterm::event::{KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use serde_json::json;
use tui_dispatch::testing::*;
use tui_dispatch::{EventKind, NumericComponentId};

fn catalog() -> serde_json::Value {
    json!({
        "generations": {
            "10": { "name": "Generation 10", "sprites": [{ "name": "Future", "sprite_url": "gen10/f.png" }] },
            "2": { "name": "Generation 2", "sprites": [{ "name": "Chikorita", "number": "152", "sprite_url": "gen2/152.png" }] },
            "1": { "name": "Generation 1", "sprites": [
                { "name": "Bulbasaur", "number": "001", "sprite_url": "gen1/001.png", "generation": 1 },
                { "name": "Mr. Mime", "number": "122", "sprite_url": "gen1/122.png", "generation": 1 }
            ] },
            "3": { "name": "Generation 3", "sprites": [] }
        },
        "other_forms": {
            "gmax": { "name": "Gigantamax", "sprites": [{ "name": "Gmax Pikachu", "sprite_url": "undefined" }] }
        }
    })
}

fn stats() -> DashboardStats {
    DashboardStats {
        total_pokemon: 1025,
        sprites_downloaded: 900,
        download_percentage: 87.8,
        total_forms: 120,
        generation_stats: vec![
            GenerationStat {
                generation: 1,
                total: 151,
                with_sprites: Some(151),
            },
            GenerationStat {
                generation: 2,
                total: 100,
                with_sprites: Some(80),
            },
        ],
        ..Default::default()
    }
}

/// Harness with stats and catalog already delivered.
macro_rules! loaded_harness {
    () => {{
        let mut harness = EffectStoreTestHarness::new(AppState::default(), reducer);
        harness.dispatch_collect(Action::Init);
        harness.drain_effects();
        harness.complete_action(Action::StatsDidLoad(stats()));
        harness.complete_action(Action::CatalogDidLoad(catalog()));
        harness.process_emitted();
        harness
    }};
}

fn missing_report() -> MissingReport {
    MissingReport {
        generation: 2,
        entries: vec![
            MissingEntry {
                name: "Unown".into(),
                number: Some("201".into()),
                has_sprite: false,
                has_details: true,
            },
            MissingEntry {
                name: "Celebi".into(),
                number: Some("251".into()),
                has_sprite: true,
                has_details: true,
            },
        ],
        total_pokemon: Some(100),
    }
}

fn missing_request(effects: &[Effect]) -> RequestId {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::LoadMissing { request, .. } => Some(*request),
            _ => None,
        })
        .expect("missing load effect")
}

fn details_request(effects: &[Effect]) -> RequestId {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::LoadDetails { request, .. } => Some(*request),
            _ => None,
        })
        .expect("details load effect")
}

fn mouse(kind: MouseEventKind, column: u16, row: u16) -> EventKind {
    EventKind::Mouse(MouseEvent {
        kind,
        column,
        row,
        modifiers: KeyModifiers::NONE,
    })
}

fn click(column: u16, row: u16) -> EventKind {
    mouse(MouseEventKind::Down(MouseButton::Left), column, row)
}

fn details_events(modal: &mut DetailsModal, state: &AppState, event: &EventKind) -> Vec<Action> {
    let props = DetailsModalProps {
        state,
        is_focused: true,
    };
    modal.handle_event(event, props).into_iter().collect()
}

fn render_details(
    harness: &mut EffectStoreTestHarness<AppState, Action, Effect>,
    modal: &mut DetailsModal,
) {
    harness.render_plain(100, 30, |frame, area, state| {
        let props = DetailsModalProps {
            state,
            is_focused: true,
        };
        modal.render(frame, area, props);
    });
}

// ============================================================================
// Startup and aggregation
// ============================================================================

#[test]
fn test_init_flow_selects_first_generation() {
    let mut harness = EffectStoreTestHarness::new(AppState::default(), reducer);

    harness.dispatch_collect(Action::Init);
    harness.assert_state(|s| s.stats.is_loading() && s.catalog_loading);
    let effects = harness.drain_effects();
    effects.effects_count(2);
    effects.effects_first_matches(|e| matches!(e, Effect::LoadStats));

    harness.complete_action(Action::StatsDidLoad(stats()));
    harness.complete_action(Action::CatalogDidLoad(catalog()));
    let (changed, total) = harness.process_emitted();
    assert_eq!((changed, total), (2, 2));

    harness.assert_state(|s| {
        s.gallery.selected_id() == Some(&CategoryId::new(CategoryKind::Generation, "1"))
    });
    harness.assert_state(|s| {
        let keys: Vec<&str> = s.gallery.categories().iter().map(|c| c.key.as_str()).collect();
        keys == ["1", "2", "10", "gmax"]
    });
    harness.assert_state(|s| s.counters.is_animating());
}

#[test]
fn test_invalid_catalog_leaves_no_tabs() {
    let mut harness = loaded_harness!();
    harness.complete_action(Action::CatalogDidLoad(json!([1, 2, 3])));
    harness.process_emitted();

    harness.assert_state(|s| s.gallery.categories().is_empty());
    harness.assert_state(|s| s.catalog_error.is_some());
}

#[test]
fn test_refresh_keeps_tab_selection() {
    let mut harness = loaded_harness!();
    let gmax = CategoryId::new(CategoryKind::Other, "gmax");
    harness.dispatch_collect(Action::CategorySelect(gmax.clone()));

    harness.dispatch_collect(Action::Refresh);
    harness.assert_state(|s| s.stats_refreshing && s.stats.is_loaded());
    harness.complete_action(Action::CatalogDidLoad(catalog()));
    harness.process_emitted();

    harness.assert_state(|s| s.gallery.selected_id() == Some(&gmax));
}

// ============================================================================
// Modal lifecycle
// ============================================================================

#[test]
fn test_details_last_request_wins() {
    let mut harness = loaded_harness!();

    harness.dispatch_collect(Action::DetailsOpen {
        name: "Bulbasaur".into(),
        generation: 1,
    });
    let first = details_request(&harness.drain_effects());
    harness.dispatch_collect(Action::DetailsOpen {
        name: "Chikorita".into(),
        generation: 2,
    });
    let second = details_request(&harness.drain_effects());
    assert_ne!(first, second);

    harness.complete_action(Action::DetailsDidLoad {
        request: second,
        details: PokemonDetails {
            name: "Chikorita".into(),
            generation: 2,
            ..Default::default()
        },
    });
    harness.complete_action(Action::DetailsDidLoad {
        request: first,
        details: PokemonDetails {
            name: "Bulbasaur".into(),
            generation: 1,
            ..Default::default()
        },
    });
    let (changed, total) = harness.process_emitted();
    assert_eq!((changed, total), (1, 2));

    harness.assert_state(|s| s.details.data().map(|d| d.name.as_str()) == Some("Chikorita"));
}

#[test]
fn test_error_auto_dismiss_flow() {
    let mut harness = loaded_harness!();

    harness.dispatch_collect(Action::MissingOpen(2));
    let request = missing_request(&harness.drain_effects());

    harness.complete_action(Action::MissingDidError {
        request,
        error: "HTTP 500: Internal Server Error".into(),
    });
    harness.process_emitted();
    harness.assert_state(|s| s.missing.error().is_some());

    let effects = harness.drain_effects();
    effects.effects_count(1);
    effects.effects_first_matches(|e| {
        matches!(e, Effect::ScheduleDismiss { modal: ModalKind::Missing, request: r, .. } if *r == request)
    });

    harness.complete_action(Action::ModalDismissExpired {
        modal: ModalKind::Missing,
        request,
    });
    harness.process_emitted();
    harness.assert_state(|s| !s.missing.is_open());
}

#[test]
fn test_manual_close_cancels_dismiss_timer() {
    let mut harness = loaded_harness!();

    harness.dispatch_collect(Action::DetailsOpen {
        name: "Bulbasaur".into(),
        generation: 1,
    });
    let request = details_request(&harness.drain_effects());
    harness.complete_action(Action::DetailsDidError {
        request,
        error: "boom".into(),
    });
    harness.process_emitted();
    harness.drain_effects();

    harness.dispatch_collect(Action::ModalClose(ModalKind::Details));
    let effects = harness.drain_effects();
    effects.effects_count(1);
    effects.effects_first_matches(|e| {
        matches!(e, Effect::CancelDismiss { modal: ModalKind::Details })
    });

    // Late timer after a fresh open must not close the new modal
    harness.dispatch_collect(Action::DetailsOpen {
        name: "Mr. Mime".into(),
        generation: 1,
    });
    harness.complete_action(Action::ModalDismissExpired {
        modal: ModalKind::Details,
        request,
    });
    let (changed, _) = harness.process_emitted();
    assert_eq!(changed, 0);
    harness.assert_state(|s| s.details.is_loading());
}

// ============================================================================
// Keyboard through components
// ============================================================================

#[test]
fn test_tabs_keys_cycle_categories() {
    let mut harness = loaded_harness!();
    harness.dispatch_collect(Action::FocusSet(FocusArea::Tabs));
    let mut tabs = CategoryTabs;

    let actions = harness.send_keys::<NumericComponentId, _, _>("l", |state, event| {
        let props = CategoryTabsProps {
            state,
            is_focused: true,
        };
        tabs.handle_event(&event.kind, props)
            .into_iter()
            .collect::<Vec<_>>()
    });
    actions.assert_count(1);
    actions.assert_first(Action::CategoryNext);

    for action in actions {
        harness.dispatch_collect(action);
    }
    harness.assert_state(|s| {
        s.gallery.selected_id() == Some(&CategoryId::new(CategoryKind::Generation, "2"))
    });
}

#[test]
fn test_gallery_page_key_shows_item_url() {
    let mut harness = loaded_harness!();
    harness.dispatch_collect(Action::ItemSelect(1));
    let mut gallery = SpriteGallery::new();

    let actions = harness.send_keys::<NumericComponentId, _, _>("o", |state, event| {
        let props = SpriteGalleryProps {
            state,
            is_focused: true,
        };
        gallery
            .handle_event(&event.kind, props)
            .into_iter()
            .collect::<Vec<_>>()
    });
    actions.assert_first(Action::ItemShowPage);

    for action in actions {
        harness.dispatch_collect(action);
    }
    harness.assert_state(|s| {
        s.message.as_deref() == Some("Page: http://127.0.0.1:5000/poke/Mr.%20Mime")
    });
}

#[test]
fn test_missing_modal_acquisition_is_not_yet_available() {
    let mut harness = loaded_harness!();
    harness.dispatch_collect(Action::MissingOpen(2));
    let request = missing_request(&harness.drain_effects());
    harness.complete_action(Action::MissingDidLoad {
        request,
        report: missing_report(),
    });
    harness.process_emitted();
    harness.drain_effects();

    let mut modal = MissingModal::new();
    let actions = harness.send_keys::<NumericComponentId, _, _>("s", |state, event| {
        let props = MissingModalProps {
            state,
            is_focused: true,
        };
        modal
            .handle_event(&event.kind, props)
            .into_iter()
            .collect::<Vec<_>>()
    });
    actions.assert_first(Action::AcquisitionRequest {
        kind: AcquisitionKind::Sprite,
        name: "Unown".into(),
        generation: 2,
    });

    for action in actions {
        harness.dispatch_collect(action);
    }
    let effects = harness.drain_effects();
    effects.effects_first_matches(|e| {
        matches!(e, Effect::RequestAcquisition { kind: AcquisitionKind::Sprite, name, .. } if name == "Unown")
    });

    harness.complete_action(Action::AcquisitionDidRespond(
        "sprite for Unown is not yet available".into(),
    ));
    harness.process_emitted();
    harness.assert_state(|s| {
        s.message
            .as_deref()
            .is_some_and(|m| m.contains("not yet available"))
    });
}

#[test]
fn test_missing_filter_does_not_touch_snapshot() {
    let mut harness = loaded_harness!();
    harness.dispatch_collect(Action::MissingOpen(2));
    let request = missing_request(&harness.drain_effects());
    harness.complete_action(Action::MissingDidLoad {
        request,
        report: missing_report(),
    });
    harness.process_emitted();

    let mut modal = MissingModal::new();
    let actions = harness.send_keys::<NumericComponentId, _, _>("l", |state, event| {
        let props = MissingModalProps {
            state,
            is_focused: true,
        };
        modal
            .handle_event(&event.kind, props)
            .into_iter()
            .collect::<Vec<_>>()
    });
    for action in actions {
        harness.dispatch_collect(action);
    }

    harness.assert_state(|s| s.missing_entries().len() == 1);
    harness.assert_state(|s| s.missing.data() == Some(&missing_report()));
}

// ============================================================================
// Closing modals with the mouse
// ============================================================================

#[test]
fn test_backdrop_click_closes_details() {
    let mut harness = loaded_harness!();
    harness.dispatch_collect(Action::DetailsOpen {
        name: "Bulbasaur".into(),
        generation: 1,
    });
    let request = details_request(&harness.drain_effects());
    harness.complete_action(Action::DetailsDidLoad {
        request,
        details: PokemonDetails {
            name: "Bulbasaur".into(),
            generation: 1,
            ..Default::default()
        },
    });
    harness.process_emitted();

    let mut modal = DetailsModal::new();
    render_details(&mut harness, &mut modal);
    let inside = DetailsModal::area(ratatui::layout::Rect::new(0, 0, 100, 30));

    let press_inside = click(inside.x + 1, inside.y + 1);
    let actions = details_events(&mut modal, harness.state(), &press_inside);
    assert!(actions.is_empty());
    let hover = mouse(MouseEventKind::Moved, 0, 0);
    let actions = details_events(&mut modal, harness.state(), &hover);
    assert!(actions.is_empty());

    let actions = details_events(&mut modal, harness.state(), &click(0, 0));
    assert_eq!(actions, vec![Action::ModalClose(ModalKind::Details)]);
    for action in actions {
        harness.dispatch_collect(action);
    }
    harness.assert_state(|s| !s.details.is_open());
}

#[test]
fn test_backdrop_click_closes_only_top_modal() {
    let mut harness = loaded_harness!();
    harness.dispatch_collect(Action::MissingOpen(2));
    let request = missing_request(&harness.drain_effects());
    harness.complete_action(Action::MissingDidLoad {
        request,
        report: missing_report(),
    });
    harness.process_emitted();
    harness.dispatch_collect(Action::DetailsOpen {
        name: "Unown".into(),
        generation: 2,
    });
    harness.drain_effects();
    harness.assert_state(|s| s.active_modal() == Some(ModalKind::Details));

    let mut modal = DetailsModal::new();
    render_details(&mut harness, &mut modal);
    let actions = details_events(&mut modal, harness.state(), &click(0, 0));
    assert_eq!(actions, vec![Action::ModalClose(ModalKind::Details)]);
    for action in actions {
        harness.dispatch_collect(action);
    }

    harness.assert_state(|s| !s.details.is_open());
    harness.assert_state(|s| s.active_modal() == Some(ModalKind::Missing));
}

#[test]
fn test_escape_then_backdrop_closes_once() {
    let mut harness = loaded_harness!();
    harness.dispatch_collect(Action::DetailsOpen {
        name: "Bulbasaur".into(),
        generation: 1,
    });
    let request = details_request(&harness.drain_effects());
    harness.complete_action(Action::DetailsDidError {
        request,
        error: "boom".into(),
    });
    harness.process_emitted();
    harness.drain_effects();

    let mut modal = DetailsModal::new();
    render_details(&mut harness, &mut modal);

    let escape = harness.send_keys::<NumericComponentId, _, _>("esc", |state, event| {
        details_events(&mut modal, state, &event.kind)
    });
    escape.assert_count(1);

    // Both triggers land in the same frame
    let mut changes = 0;
    for action in escape
        .into_iter()
        .chain([Action::ModalClose(ModalKind::Details)])
    {
        if harness.dispatch_collect(action) {
            changes += 1;
        }
    }
    assert_eq!(changes, 1);
    let effects = harness.drain_effects();
    effects.effects_count(1);
    effects.effects_first_matches(|e| {
        matches!(e, Effect::CancelDismiss { modal: ModalKind::Details })
    });

    // A stray click after closing does nothing
    let actions = details_events(&mut modal, harness.state(), &click(0, 0));
    assert!(actions.is_empty());
    harness.assert_state(|s| !s.details.is_open());
}
