//! Reducer - pure function: (state, action) -> DispatchResult

use tracing::{debug, info, warn};
use tui_dispatch::{DataResource, DispatchResult};

use crate::action::Action;
use crate::catalog::aggregate;
use crate::components::details_modal;
use crate::effect::Effect;
use crate::modal::{
    missing_row, AcquisitionKind, ModalKind, ModalState, RequestId, Resolution, RowAction,
};
use crate::state::{AppState, TICK_MS};

pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        Action::Init => {
            state.stats = DataResource::Loading;
            state.catalog_loading = true;
            state.message = None;
            DispatchResult::changed_with_many(vec![Effect::LoadStats, Effect::LoadCatalog])
        }

        Action::Refresh => {
            if state.stats.is_loaded() {
                state.stats_refreshing = true;
            } else {
                state.stats = DataResource::Loading;
            }
            state.catalog_loading = true;
            state.message = None;
            DispatchResult::changed_with_many(vec![Effect::LoadStats, Effect::LoadCatalog])
        }

        // ===== Stats =====
        Action::StatsDidLoad(stats) => {
            state.counters.retarget(&stats);
            state.stats = DataResource::Loaded(stats);
            state.stats_refreshing = false;
            let rows = state.generation_rows().len();
            if state.generation_index >= rows {
                state.generation_index = rows.saturating_sub(1);
            }
            DispatchResult::changed()
        }

        Action::StatsDidError(error) => {
            warn!(%error, "stats request failed");
            if state.stats_refreshing && state.stats.is_loaded() {
                state.message = Some(format!("Stats refresh failed: {error}"));
            } else {
                state.stats = DataResource::Failed(error);
            }
            state.stats_refreshing = false;
            DispatchResult::changed()
        }

        // ===== Catalog / gallery =====
        Action::CatalogDidLoad(document) => {
            state.catalog_loading = false;
            match aggregate(&document) {
                Ok(categories) => {
                    info!(tabs = categories.len(), "catalog loaded");
                    state.gallery.load(categories);
                    state.catalog_error = None;
                }
                Err(error) => {
                    warn!(%error, "catalog rejected");
                    state.gallery.load(Vec::new());
                    state.catalog_error = Some(error.to_string());
                }
            }
            let index = state.item_index;
            state.item_index = 0;
            state.set_item_index(index);
            DispatchResult::changed()
        }

        Action::CatalogDidError(error) => {
            warn!(%error, "catalog request failed");
            state.catalog_loading = false;
            state.catalog_error = Some(error);
            DispatchResult::changed()
        }

        Action::CategorySelect(id) => {
            state.gallery.select(id);
            state.item_index = 0;
            DispatchResult::changed()
        }

        Action::CategoryNext => cycle_category(state, 1),
        Action::CategoryPrev => cycle_category(state, -1),

        Action::ItemSelect(index) => {
            if state.set_item_index(index) {
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::ItemShowPage => {
            let Some(name) = state.selected_item().map(|item| item.name.clone()) else {
                return DispatchResult::unchanged();
            };
            state.message = Some(format!("Page: {}", state.item_page_url(&name)));
            DispatchResult::changed()
        }

        Action::GenerationSelect(index) => {
            let rows = state.generation_rows().len();
            let bounded = index.min(rows.saturating_sub(1));
            if rows == 0 || bounded == state.generation_index {
                return DispatchResult::unchanged();
            }
            state.generation_index = bounded;
            DispatchResult::changed()
        }

        // ===== Details modal =====
        Action::DetailsOpen { name, generation } => open_details(state, name, generation),

        Action::DetailsDidLoad { request, details } => {
            match state.details.resolve(request, Ok(details)) {
                Resolution::Stale => DispatchResult::unchanged(),
                _ => DispatchResult::changed(),
            }
        }

        Action::DetailsDidError { request, error } => {
            warn!(%error, "details request failed");
            let resolution = state.details.resolve(request, Err(error));
            after_failure(resolution, ModalKind::Details, request, state.error_dismiss_ms)
        }

        Action::DetailsScroll(delta) => {
            if !state.details.is_open() {
                return DispatchResult::unchanged();
            }
            let limit = i32::from(details_modal::max_scroll(state));
            let current = i32::from(state.details_scroll).min(limit);
            let next = (current + i32::from(delta)).clamp(0, limit) as u16;
            if next == state.details_scroll {
                return DispatchResult::unchanged();
            }
            state.details_scroll = next;
            DispatchResult::changed()
        }

        // ===== Missing modal =====
        Action::MissingOpen(generation) => {
            let mut effects = cancel_dismiss(&mut state.missing, ModalKind::Missing);
            let request = state.missing.open(format!("Generation {generation}"));
            state.missing_filter = Default::default();
            state.missing_index = 0;
            effects.push(Effect::LoadMissing {
                request,
                generation,
            });
            DispatchResult::changed_with_many(effects)
        }

        Action::MissingDidLoad { request, report } => {
            match state.missing.resolve(request, Ok(report)) {
                Resolution::Stale => DispatchResult::unchanged(),
                _ => {
                    state.missing_index = 0;
                    DispatchResult::changed()
                }
            }
        }

        Action::MissingDidError { request, error } => {
            warn!(%error, "missing report request failed");
            let resolution = state.missing.resolve(request, Err(error));
            after_failure(resolution, ModalKind::Missing, request, state.error_dismiss_ms)
        }

        Action::MissingFilterSet(filter) => {
            if state.missing_filter == filter {
                return DispatchResult::unchanged();
            }
            state.missing_filter = filter;
            state.missing_index = 0;
            DispatchResult::changed()
        }

        Action::MissingFilterNext => cycle_missing_filter(state, 1),
        Action::MissingFilterPrev => cycle_missing_filter(state, -1),

        Action::MissingRowSelect(index) => {
            let len = state.missing_entries().len();
            let bounded = index.min(len.saturating_sub(1));
            if len == 0 || bounded == state.missing_index {
                return DispatchResult::unchanged();
            }
            state.missing_index = bounded;
            DispatchResult::changed()
        }

        Action::MissingRowActivate => {
            let Some(report) = state.missing.data() else {
                return DispatchResult::unchanged();
            };
            let generation = report.generation;
            let Some(entry) = state.selected_missing_entry() else {
                return DispatchResult::unchanged();
            };
            let name = entry.name.clone();
            let primary = missing_row(entry).primary_action();
            match primary {
                RowAction::ViewDetails => open_details(state, name, generation),
                RowAction::Acquire(kind) => request_acquisition(state, kind, name, generation),
            }
        }

        // ===== Shared modal lifecycle =====
        Action::ModalClose(ModalKind::Details) => close(&mut state.details, ModalKind::Details),
        Action::ModalClose(ModalKind::Missing) => {
            let result = close(&mut state.missing, ModalKind::Missing);
            if result.changed {
                state.missing_index = 0;
            }
            result
        }

        Action::ModalDismissExpired { modal, request } => {
            let closed = match modal {
                ModalKind::Details => state.details.dismiss_expired(request),
                ModalKind::Missing => state.missing.dismiss_expired(request),
            };
            if closed {
                DispatchResult::changed()
            } else {
                debug!(modal = modal.label(), ?request, "ignoring expired dismiss timer");
                DispatchResult::unchanged()
            }
        }

        // ===== Acquisition stubs =====
        Action::AcquisitionRequest {
            kind,
            name,
            generation,
        } => request_acquisition(state, kind, name, generation),

        Action::AcquisitionDidRespond(message) => {
            state.message = Some(message);
            DispatchResult::changed()
        }

        Action::FocusNext => {
            state.focus_next();
            DispatchResult::changed()
        }

        Action::FocusPrev => {
            state.focus_prev();
            DispatchResult::changed()
        }

        Action::FocusSet(area) => {
            if state.focus == area {
                return DispatchResult::unchanged();
            }
            state.focus = area;
            DispatchResult::changed()
        }

        Action::UiTerminalResize(width, height) => {
            if state.terminal_size == (width, height) {
                return DispatchResult::unchanged();
            }
            state.terminal_size = (width, height);
            DispatchResult::changed()
        }

        Action::Tick => tick(state),

        Action::Quit => DispatchResult::unchanged(),
    }
}

fn cycle_category(state: &mut AppState, delta: isize) -> DispatchResult<Effect> {
    match state.gallery.neighbour(delta) {
        Some(id) => {
            state.gallery.select(id);
            state.item_index = 0;
            DispatchResult::changed()
        }
        None => DispatchResult::unchanged(),
    }
}

fn cycle_missing_filter(state: &mut AppState, delta: i16) -> DispatchResult<Effect> {
    state.missing_filter = state.missing_filter.cycle(delta);
    state.missing_index = 0;
    DispatchResult::changed()
}

fn open_details(state: &mut AppState, name: String, generation: u32) -> DispatchResult<Effect> {
    let mut effects = cancel_dismiss(&mut state.details, ModalKind::Details);
    let request = state.details.open(name.clone());
    state.details_scroll = 0;
    effects.push(Effect::LoadDetails {
        request,
        name,
        generation,
    });
    DispatchResult::changed_with_many(effects)
}

fn request_acquisition(
    state: &mut AppState,
    kind: AcquisitionKind,
    name: String,
    generation: u32,
) -> DispatchResult<Effect> {
    state.message = Some(format!("Requesting {} for {name}...", kind.label()));
    DispatchResult::changed_with(Effect::RequestAcquisition {
        kind,
        name,
        generation,
    })
}

/// Any transition on a modal first disarms its pending dismiss timer.
fn cancel_dismiss<T>(modal: &mut ModalState<T>, kind: ModalKind) -> Vec<Effect> {
    if modal.take_pending_dismiss() {
        vec![Effect::CancelDismiss { modal: kind }]
    } else {
        Vec::new()
    }
}

fn close<T>(modal: &mut ModalState<T>, kind: ModalKind) -> DispatchResult<Effect> {
    let effects = cancel_dismiss(modal, kind);
    if !modal.close() {
        return DispatchResult::unchanged();
    }
    if effects.is_empty() {
        DispatchResult::changed()
    } else {
        DispatchResult::changed_with_many(effects)
    }
}

fn after_failure(
    resolution: Resolution,
    modal: ModalKind,
    request: RequestId,
    after_ms: u64,
) -> DispatchResult<Effect> {
    match resolution {
        Resolution::Failed => DispatchResult::changed_with(Effect::ScheduleDismiss {
            modal,
            request,
            after_ms,
        }),
        Resolution::Loaded => DispatchResult::changed(),
        Resolution::Stale => DispatchResult::unchanged(),
    }
}

fn tick(state: &mut AppState) -> DispatchResult<Effect> {
    state.tick = state.tick.wrapping_add(1);
    let animating = state.counters.advance(TICK_MS);
    let spinning = state.stats.is_loading()
        || state.stats_refreshing
        || state.catalog_loading
        || state.details.is_loading()
        || state.missing.is_loading();
    if animating || spinning {
        DispatchResult::changed()
    } else {
        DispatchResult::unchanged()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CategoryId, CategoryKind};
    use crate::modal::{MissingEntry, MissingFilter, MissingReport};
    use crate::state::{DashboardStats, PokemonDetails};
    use serde_json::json;

    fn details(name: &str) -> PokemonDetails {
        PokemonDetails {
            name: name.to_string(),
            generation: 1,
            ..Default::default()
        }
    }

    fn catalog() -> serde_json::Value {
        json!({
            "generations": {
                "2": { "name": "Gen 2", "sprites": [{ "name": "Chikorita", "sprite_url": "gen2/a.png" }] },
                "1": { "name": "Gen 1", "sprites": [
                    { "name": "Bulbasaur", "sprite_url": "gen1/a.png" },
                    { "name": "Ivysaur", "sprite_url": "undefined" },
                    { "name": "Venusaur", "sprite_url": "gen1/c.png" }
                ] }
            },
            "regional_forms": {
                "alola": { "name": "Alola", "sprites": [{ "name": "Vulpix", "sprite_url": "alola/v.png" }] }
            }
        })
    }

    fn request_of(effects: &[Effect]) -> RequestId {
        effects
            .iter()
            .find_map(|effect| match effect {
                Effect::LoadDetails { request, .. } | Effect::LoadMissing { request, .. } => {
                    Some(*request)
                }
                _ => None,
            })
            .expect("load effect")
    }

    #[test]
    fn test_init_loads_stats_and_catalog() {
        let mut state = AppState::default();
        let result = reducer(&mut state, Action::Init);
        assert!(result.changed);
        assert!(state.stats.is_loading());
        assert!(state.catalog_loading);
        assert_eq!(result.effects, vec![Effect::LoadStats, Effect::LoadCatalog]);
    }

    #[test]
    fn test_refresh_keeps_loaded_stats() {
        let mut state = AppState {
            stats: DataResource::Loaded(DashboardStats::default()),
            ..Default::default()
        };
        reducer(&mut state, Action::Refresh);
        assert!(state.stats.is_loaded());
        assert!(state.stats_refreshing);

        reducer(&mut state, Action::StatsDidError("timeout".into()));
        assert!(state.stats.is_loaded());
        assert!(!state.stats_refreshing);
    }

    #[test]
    fn test_catalog_load_selects_first_generation() {
        let mut state = AppState::default();
        reducer(&mut state, Action::CatalogDidLoad(catalog()));

        assert_eq!(
            state.gallery.selected_id(),
            Some(&CategoryId::new(CategoryKind::Generation, "1"))
        );
        let names: Vec<&str> = state.visible_items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Bulbasaur", "Venusaur"]);
        assert_eq!(state.gallery.current().map(|c| c.items.len()), Some(3));
    }

    #[test]
    fn test_invalid_catalog_renders_nothing() {
        let mut state = AppState::default();
        reducer(&mut state, Action::CatalogDidLoad(catalog()));
        let result = reducer(&mut state, Action::CatalogDidLoad(json!("oops")));
        assert!(result.changed);
        assert!(state.gallery.categories().is_empty());
        assert!(state.catalog_error.is_some());
        assert!(state.visible_items().is_empty());
    }

    #[test]
    fn test_select_category_twice_is_idempotent() {
        let mut state = AppState::default();
        reducer(&mut state, Action::CatalogDidLoad(catalog()));
        let alola = CategoryId::new(CategoryKind::Regional, "alola");

        reducer(&mut state, Action::CategorySelect(alola.clone()));
        let first: Vec<String> = state.visible_items().iter().map(|i| i.name.clone()).collect();
        let result = reducer(&mut state, Action::CategorySelect(alola));
        let second: Vec<String> = state.visible_items().iter().map(|i| i.name.clone()).collect();

        assert!(result.changed);
        assert_eq!(first, second);
    }

    #[test]
    fn test_reload_keeps_explicit_selection() {
        let mut state = AppState::default();
        reducer(&mut state, Action::CatalogDidLoad(catalog()));
        reducer(&mut state, Action::CategoryNext);
        let selected = state.gallery.selected_id().cloned();
        reducer(&mut state, Action::CatalogDidLoad(catalog()));
        assert_eq!(state.gallery.selected_id().cloned(), selected);
        assert_eq!(selected.map(|id| id.key), Some("2".to_string()));
    }

    #[test]
    fn test_details_last_request_wins() {
        let mut state = AppState::default();
        let first = reducer(
            &mut state,
            Action::DetailsOpen {
                name: "Pikachu".into(),
                generation: 1,
            },
        );
        let second = reducer(
            &mut state,
            Action::DetailsOpen {
                name: "Bulbasaur".into(),
                generation: 1,
            },
        );
        let pikachu = request_of(&first.effects);
        let bulbasaur = request_of(&second.effects);

        let result = reducer(
            &mut state,
            Action::DetailsDidLoad {
                request: bulbasaur,
                details: details("Bulbasaur"),
            },
        );
        assert!(result.changed);
        let stale = reducer(
            &mut state,
            Action::DetailsDidLoad {
                request: pikachu,
                details: details("Pikachu"),
            },
        );
        assert!(!stale.changed);
        assert_eq!(state.details.data().map(|d| d.name.as_str()), Some("Bulbasaur"));
    }

    #[test]
    fn test_details_error_schedules_dismiss() {
        let mut state = AppState {
            error_dismiss_ms: 1500,
            ..Default::default()
        };
        let open = reducer(
            &mut state,
            Action::DetailsOpen {
                name: "Missingno".into(),
                generation: 1,
            },
        );
        let request = request_of(&open.effects);
        let result = reducer(
            &mut state,
            Action::DetailsDidError {
                request,
                error: "HTTP 404: Pokemon non trouvé".into(),
            },
        );
        assert_eq!(
            result.effects,
            vec![Effect::ScheduleDismiss {
                modal: ModalKind::Details,
                request,
                after_ms: 1500
            }]
        );
        assert_eq!(state.details.error(), Some("HTTP 404: Pokemon non trouvé"));

        reducer(
            &mut state,
            Action::ModalDismissExpired {
                modal: ModalKind::Details,
                request,
            },
        );
        assert!(!state.details.is_open());
    }

    #[test]
    fn test_close_cancels_pending_dismiss_and_reopen_survives_timer() {
        let mut state = AppState::default();
        let open = reducer(&mut state, Action::MissingOpen(3));
        let failed = request_of(&open.effects);
        reducer(
            &mut state,
            Action::MissingDidError {
                request: failed,
                error: "HTTP 500: boom".into(),
            },
        );

        let closed = reducer(&mut state, Action::ModalClose(ModalKind::Missing));
        assert_eq!(
            closed.effects,
            vec![Effect::CancelDismiss {
                modal: ModalKind::Missing
            }]
        );

        let reopen = reducer(&mut state, Action::MissingOpen(4));
        assert!(!reopen
            .effects
            .iter()
            .any(|e| matches!(e, Effect::CancelDismiss { .. })));
        let fresh = request_of(&reopen.effects);
        reducer(
            &mut state,
            Action::MissingDidLoad {
                request: fresh,
                report: MissingReport {
                    generation: 4,
                    ..Default::default()
                },
            },
        );

        let late = reducer(
            &mut state,
            Action::ModalDismissExpired {
                modal: ModalKind::Missing,
                request: failed,
            },
        );
        assert!(!late.changed);
        assert!(state.missing.is_open());
        assert_eq!(state.missing.data().map(|r| r.generation), Some(4));
    }

    #[test]
    fn test_reopen_after_error_cancels_timer() {
        let mut state = AppState::default();
        let open = reducer(
            &mut state,
            Action::DetailsOpen {
                name: "A".into(),
                generation: 1,
            },
        );
        reducer(
            &mut state,
            Action::DetailsDidError {
                request: request_of(&open.effects),
                error: "x".into(),
            },
        );
        let reopen = reducer(
            &mut state,
            Action::DetailsOpen {
                name: "B".into(),
                generation: 1,
            },
        );
        assert_eq!(
            reopen.effects[0],
            Effect::CancelDismiss {
                modal: ModalKind::Details
            }
        );
        assert!(state.details.is_loading());
    }

    #[test]
    fn test_close_twice_is_safe() {
        let mut state = AppState::default();
        reducer(
            &mut state,
            Action::DetailsOpen {
                name: "A".into(),
                generation: 1,
            },
        );
        assert!(reducer(&mut state, Action::ModalClose(ModalKind::Details)).changed);
        let again = reducer(&mut state, Action::ModalClose(ModalKind::Details));
        assert!(!again.changed);
        assert!(again.effects.is_empty());
    }

    #[test]
    fn test_details_scroll_stops_at_last_line() {
        let mut state = AppState::default();
        let open = reducer(
            &mut state,
            Action::DetailsOpen {
                name: "mew".into(),
                generation: 1,
            },
        );
        reducer(
            &mut state,
            Action::DetailsDidLoad {
                request: request_of(&open.effects),
                details: details("mew"),
            },
        );
        let last = details_modal::max_scroll(&state);
        assert!(last > 0);

        reducer(&mut state, Action::DetailsScroll(i16::MAX));
        assert_eq!(state.details_scroll, last);
        assert!(!reducer(&mut state, Action::DetailsScroll(10)).changed);

        // One step back is visible straight away
        assert!(reducer(&mut state, Action::DetailsScroll(-1)).changed);
        assert_eq!(state.details_scroll, last - 1);
    }

    #[test]
    fn test_missing_empty_report_is_loaded_not_error() {
        let mut state = AppState::default();
        let open = reducer(&mut state, Action::MissingOpen(3));
        reducer(
            &mut state,
            Action::MissingDidLoad {
                request: request_of(&open.effects),
                report: MissingReport {
                    generation: 3,
                    ..Default::default()
                },
            },
        );
        assert!(state.missing.error().is_none());
        assert_eq!(state.missing.data().map(|r| r.entries.len()), Some(0));
    }

    #[test]
    fn test_missing_row_activate_dispatches_primary_action() {
        let mut state = AppState::default();
        let open = reducer(&mut state, Action::MissingOpen(2));
        reducer(
            &mut state,
            Action::MissingDidLoad {
                request: request_of(&open.effects),
                report: MissingReport {
                    generation: 2,
                    entries: vec![
                        MissingEntry {
                            name: "Togepi".into(),
                            number: None,
                            has_sprite: true,
                            has_details: true,
                        },
                        MissingEntry {
                            name: "Igglybuff".into(),
                            number: None,
                            has_sprite: false,
                            has_details: true,
                        },
                    ],
                    total_pokemon: None,
                },
            },
        );

        let view = reducer(&mut state, Action::MissingRowActivate);
        assert!(matches!(
            &view.effects[..],
            [Effect::LoadDetails { name, generation: 2, .. }] if name == "Togepi"
        ));

        reducer(&mut state, Action::MissingFilterSet(MissingFilter::SpriteMissing));
        let acquire = reducer(&mut state, Action::MissingRowActivate);
        assert!(matches!(
            &acquire.effects[..],
            [Effect::RequestAcquisition { name, .. }] if name == "Igglybuff"
        ));
        // Filtering never touches the snapshot
        assert_eq!(state.missing.data().map(|r| r.entries.len()), Some(2));
    }

    #[test]
    fn test_tick_only_changes_while_animating() {
        let mut state = AppState::default();
        assert!(!reducer(&mut state, Action::Tick).changed);

        reducer(
            &mut state,
            Action::StatsDidLoad(DashboardStats {
                total_pokemon: 100,
                ..Default::default()
            }),
        );
        assert!(reducer(&mut state, Action::Tick).changed);
        assert!(state.counters.total_pokemon.value() > 0.0);
    }

    #[test]
    fn test_item_show_page_uses_encoded_url() {
        let mut state = AppState::new("http://dex.local".into(), 3000);
        reducer(&mut state, Action::CatalogDidLoad(catalog()));
        reducer(&mut state, Action::ItemShowPage);
        assert_eq!(
            state.message.as_deref(),
            Some("Page: http://dex.local/poke/Bulbasaur")
        );
    }
}
