//! Application state - single source of truth

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tui_dispatch::DataResource;
use tui_dispatch_debug::debug::{ron_string, DebugSection, DebugState};

use crate::catalog::{Gallery, Item};
use crate::modal::{filtered_entries, MissingEntry, MissingFilter, MissingReport, ModalKind, ModalState};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_ERROR_DISMISS_MS: u64 = 3000;

/// Tick cadence while a counter animates.
pub const TICK_MS: u64 = 50;
pub const COUNTER_ANIM_MS: u64 = 1000;

/// Totals from `/api/stats`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DashboardStats {
    pub total_pokemon: u32,
    pub sprites_downloaded: u32,
    pub download_percentage: f64,
    pub total_forms: u32,
    pub generation_stats: Vec<GenerationStat>,
    pub top_forms: Vec<FormEntry>,
    pub recent_pokemon: Vec<RecentPokemon>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GenerationStat {
    pub generation: u32,
    pub total: u32,
    /// Only some server versions report this column.
    pub with_sprites: Option<u32>,
}

impl GenerationStat {
    pub fn percentage(&self) -> Option<f64> {
        let with_sprites = self.with_sprites?;
        if self.total == 0 {
            return Some(0.0);
        }
        Some(f64::from(with_sprites) / f64::from(self.total) * 100.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormEntry {
    pub name: String,
    pub generation: Option<u32>,
    pub sprite_path: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RecentPokemon {
    pub name: String,
    pub generation: u32,
    pub sprite_path: Option<String>,
}

/// Payload of the details modal
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PokemonDetails {
    pub name: String,
    pub number: Option<String>,
    pub generation: u32,
    pub sprite_path: Option<String>,
    pub high_quality_image: Option<String>,
    pub is_shiny_lock: bool,
    pub description: Option<String>,
    pub forms: Vec<String>,
    pub games: Vec<GameEntry>,
    pub hunt_methods: Vec<HuntMethod>,
    pub locations: Vec<LocationEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GameEntry {
    pub name: String,
    pub generation: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HuntMethod {
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub game: Option<String>,
    pub location: Option<String>,
    pub probability: Option<String>,
    pub conditions: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LocationEntry {
    pub name: String,
    pub region: Option<String>,
    pub game: Option<String>,
    pub method: Option<String>,
    pub rarity: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum FocusArea {
    Generations,
    Tabs,
    Gallery,
}

/// `1 - (1 - t)^4`
pub fn ease_out_quart(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(4)
}

/// A number easing from its last shown value toward a new target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnimatedCounter {
    from: f64,
    to: f64,
    elapsed_ms: u64,
}

impl Default for AnimatedCounter {
    fn default() -> Self {
        Self {
            from: 0.0,
            to: 0.0,
            elapsed_ms: COUNTER_ANIM_MS,
        }
    }
}

impl AnimatedCounter {
    pub fn retarget(&mut self, target: f64) {
        self.from = self.value();
        self.to = target;
        self.elapsed_ms = 0;
    }

    pub fn advance(&mut self, ms: u64) -> bool {
        if !self.is_animating() {
            return false;
        }
        self.elapsed_ms = (self.elapsed_ms + ms).min(COUNTER_ANIM_MS);
        true
    }

    pub fn is_animating(&self) -> bool {
        self.elapsed_ms < COUNTER_ANIM_MS
    }

    pub fn value(&self) -> f64 {
        let progress = self.elapsed_ms as f64 / COUNTER_ANIM_MS as f64;
        self.from + (self.to - self.from) * ease_out_quart(progress)
    }

    pub fn target(&self) -> f64 {
        self.to
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Counters {
    pub total_pokemon: AnimatedCounter,
    pub sprites_downloaded: AnimatedCounter,
    pub download_percentage: AnimatedCounter,
    pub total_forms: AnimatedCounter,
}

impl Counters {
    pub fn retarget(&mut self, stats: &DashboardStats) {
        self.total_pokemon.retarget(f64::from(stats.total_pokemon));
        self.sprites_downloaded
            .retarget(f64::from(stats.sprites_downloaded));
        self.download_percentage
            .retarget(stats.download_percentage);
        self.total_forms.retarget(f64::from(stats.total_forms));
    }

    /// Step every counter; true while any of them moved.
    pub fn advance(&mut self, ms: u64) -> bool {
        let mut moved = false;
        for counter in [
            &mut self.total_pokemon,
            &mut self.sprites_downloaded,
            &mut self.download_percentage,
            &mut self.total_forms,
        ] {
            moved |= counter.advance(ms);
        }
        moved
    }

    pub fn is_animating(&self) -> bool {
        self.total_pokemon.is_animating()
            || self.sprites_downloaded.is_animating()
            || self.download_percentage.is_animating()
            || self.total_forms.is_animating()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppState {
    pub terminal_size: (u16, u16),
    pub focus: FocusArea,
    pub base_url: String,
    pub error_dismiss_ms: u64,

    pub stats: DataResource<DashboardStats>,
    /// Stats already shown while a refresh is in flight
    pub stats_refreshing: bool,
    pub counters: Counters,
    pub generation_index: usize,

    pub gallery: Gallery,
    pub catalog_loading: bool,
    pub catalog_error: Option<String>,
    pub item_index: usize,

    pub details: ModalState<PokemonDetails>,
    pub details_scroll: u16,
    pub missing: ModalState<MissingReport>,
    pub missing_filter: MissingFilter,
    pub missing_index: usize,

    pub message: Option<String>,
    pub tick: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL.to_string(), DEFAULT_ERROR_DISMISS_MS)
    }
}

impl AppState {
    pub fn new(base_url: String, error_dismiss_ms: u64) -> Self {
        Self {
            terminal_size: (80, 24),
            focus: FocusArea::Gallery,
            base_url,
            error_dismiss_ms,
            stats: DataResource::Empty,
            stats_refreshing: false,
            counters: Counters::default(),
            generation_index: 0,
            gallery: Gallery::default(),
            catalog_loading: false,
            catalog_error: None,
            item_index: 0,
            details: ModalState::default(),
            details_scroll: 0,
            missing: ModalState::default(),
            missing_filter: MissingFilter::All,
            missing_index: 0,
            message: None,
            tick: 0,
        }
    }

    /// Grid cells of the active tab.
    pub fn visible_items(&self) -> Vec<&Item> {
        self.gallery
            .current()
            .map(|category| category.visible_items().collect())
            .unwrap_or_default()
    }

    pub fn selected_item(&self) -> Option<&Item> {
        self.visible_items().get(self.item_index).copied()
    }

    pub fn set_item_index(&mut self, index: usize) -> bool {
        let len = self.visible_items().len();
        let bounded = if len == 0 { 0 } else { index.min(len - 1) };
        if bounded != self.item_index {
            self.item_index = bounded;
            return true;
        }
        false
    }

    pub fn generation_rows(&self) -> &[GenerationStat] {
        self.stats
            .data()
            .map(|stats| stats.generation_stats.as_slice())
            .unwrap_or(&[])
    }

    pub fn selected_generation(&self) -> Option<u32> {
        self.generation_rows()
            .get(self.generation_index)
            .map(|row| row.generation)
    }

    pub fn missing_entries(&self) -> Vec<&MissingEntry> {
        self.missing
            .data()
            .map(|report| filtered_entries(report, self.missing_filter))
            .unwrap_or_default()
    }

    pub fn selected_missing_entry(&self) -> Option<&MissingEntry> {
        self.missing_entries().get(self.missing_index).copied()
    }

    /// Topmost open overlay. Details can be stacked over the missing list.
    pub fn active_modal(&self) -> Option<ModalKind> {
        if self.details.is_open() {
            Some(ModalKind::Details)
        } else if self.missing.is_open() {
            Some(ModalKind::Missing)
        } else {
            None
        }
    }

    pub fn item_page_url(&self, name: &str) -> String {
        crate::api::item_page_url(&self.base_url, name)
    }

    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            FocusArea::Generations => FocusArea::Tabs,
            FocusArea::Tabs => FocusArea::Gallery,
            FocusArea::Gallery => FocusArea::Generations,
        };
    }

    pub fn focus_prev(&mut self) {
        self.focus = match self.focus {
            FocusArea::Generations => FocusArea::Gallery,
            FocusArea::Tabs => FocusArea::Generations,
            FocusArea::Gallery => FocusArea::Tabs,
        };
    }
}

fn phase_label<T>(modal: &ModalState<T>) -> &'static str {
    use crate::modal::ModalPhase;
    match modal.phase() {
        ModalPhase::Closed => "closed",
        ModalPhase::Loading => "loading",
        ModalPhase::Loaded(_) => "loaded",
        ModalPhase::Error(_) => "error",
    }
}

impl DebugState for AppState {
    fn debug_sections(&self) -> Vec<DebugSection> {
        vec![
            DebugSection::new("Stats")
                .entry("loading", ron_string(&self.stats.is_loading()))
                .entry("refreshing", ron_string(&self.stats_refreshing))
                .entry(
                    "total",
                    ron_string(&self.stats.data().map(|stats| stats.total_pokemon)),
                )
                .entry("generation", ron_string(&self.selected_generation()))
                .entry("error", ron_string(&self.stats.error())),
            DebugSection::new("Gallery")
                .entry("tabs", ron_string(&self.gallery.categories().len()))
                .entry("selected", ron_string(&self.gallery.selected_id()))
                .entry("visible", ron_string(&self.visible_items().len()))
                .entry("item", ron_string(&self.item_index))
                .entry("catalog_loading", ron_string(&self.catalog_loading))
                .entry("catalog_error", ron_string(&self.catalog_error)),
            DebugSection::new("Modals")
                .entry("details", ron_string(&phase_label(&self.details)))
                .entry("details_request", ron_string(&self.details.request()))
                .entry("details_subject", ron_string(&self.details.subject()))
                .entry("details_scroll", ron_string(&self.details_scroll))
                .entry("missing", ron_string(&phase_label(&self.missing)))
                .entry("missing_request", ron_string(&self.missing.request()))
                .entry("missing_filter", ron_string(&self.missing_filter))
                .entry("missing_index", ron_string(&self.missing_index)),
            DebugSection::new("Status")
                .entry("focus", ron_string(&self.focus))
                .entry("message", ron_string(&self.message)),
        ]
    }
}
