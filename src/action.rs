//! Dashboard actions

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::catalog::CategoryId;
use crate::modal::{AcquisitionKind, MissingFilter, MissingReport, ModalKind, RequestId};
use crate::state::{DashboardStats, FocusArea, PokemonDetails};

#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[action(infer_categories)]
pub enum Action {
    Init,
    /// Reload stats and catalog, keeping what is shown until they arrive
    Refresh,

    // ===== Stats =====
    StatsDidLoad(DashboardStats),
    StatsDidError(String),

    // ===== Catalog / gallery =====
    /// Raw `/api/sprites` document; aggregated by the reducer
    CatalogDidLoad(serde_json::Value),
    CatalogDidError(String),
    CategorySelect(CategoryId),
    CategoryNext,
    CategoryPrev,
    ItemSelect(usize),
    ItemShowPage,

    GenerationSelect(usize),

    // ===== Details modal =====
    DetailsOpen { name: String, generation: u32 },
    DetailsDidLoad { request: RequestId, details: PokemonDetails },
    DetailsDidError { request: RequestId, error: String },
    /// Scroll the details body by a line delta
    DetailsScroll(i16),

    // ===== Missing modal =====
    MissingOpen(u32),
    MissingDidLoad { request: RequestId, report: MissingReport },
    MissingDidError { request: RequestId, error: String },
    MissingFilterSet(MissingFilter),
    MissingFilterNext,
    MissingFilterPrev,
    MissingRowSelect(usize),
    /// Run the selected row's primary follow-up
    MissingRowActivate,

    // ===== Shared modal lifecycle =====
    ModalClose(ModalKind),
    /// Error auto-dismiss timer fired for `request`
    ModalDismissExpired { modal: ModalKind, request: RequestId },

    // ===== Acquisition stubs =====
    AcquisitionRequest { kind: AcquisitionKind, name: String, generation: u32 },
    AcquisitionDidRespond(String),

    FocusNext,
    FocusPrev,
    FocusSet(FocusArea),

    UiTerminalResize(u16, u16),
    Tick,
    Quit,
}
