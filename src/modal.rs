//! Modal lifecycle for the details and missing overlays
//!
//! Each overlay moves through Closed → Loading → Loaded/Error → Closed. Every open or
//! close bumps a request counter, and async results are only applied when they carry
//! the current value (last request wins).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ModalKind {
    Details,
    Missing,
}

impl ModalKind {
    pub fn label(self) -> &'static str {
        match self {
            ModalKind::Details => "details",
            ModalKind::Missing => "missing",
        }
    }

    pub fn fetch_task_key(self) -> &'static str {
        match self {
            ModalKind::Details => "details_fetch",
            ModalKind::Missing => "missing_fetch",
        }
    }

    pub fn dismiss_task_key(self) -> &'static str {
        match self {
            ModalKind::Details => "details_dismiss",
            ModalKind::Missing => "missing_dismiss",
        }
    }
}

/// Token identifying one open request on one modal.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub struct RequestId(pub u64);

impl RequestId {
    fn next(self) -> Self {
        RequestId(self.0.wrapping_add(1))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub enum ModalPhase<T> {
    Closed,
    Loading,
    Loaded(T),
    Error(String),
}

impl<T> ModalPhase<T> {
    pub fn is_open(&self) -> bool {
        !matches!(self, ModalPhase::Closed)
    }
}

/// What happened when a fetch result reached the modal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Loaded,
    Failed,
    Stale,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModalState<T> {
    phase: ModalPhase<T>,
    request: RequestId,
    /// Title of whatever the modal was opened for ("Pikachu", "Generation 3").
    subject: Option<String>,
    dismiss_pending: bool,
}

impl<T> Default for ModalState<T> {
    fn default() -> Self {
        Self {
            phase: ModalPhase::Closed,
            request: RequestId::default(),
            subject: None,
            dismiss_pending: false,
        }
    }
}

impl<T> ModalState<T> {
    pub fn phase(&self) -> &ModalPhase<T> {
        &self.phase
    }

    pub fn request(&self) -> RequestId {
        self.request
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.phase.is_open()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, ModalPhase::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match &self.phase {
            ModalPhase::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            ModalPhase::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Whether an auto-dismiss timer is armed. Clears the flag; the caller cancels it.
    pub fn take_pending_dismiss(&mut self) -> bool {
        std::mem::take(&mut self.dismiss_pending)
    }

    /// Start a new request, superseding whatever was loading or shown.
    pub fn open(&mut self, subject: impl Into<String>) -> RequestId {
        self.request = self.request.next();
        self.subject = Some(subject.into());
        self.phase = ModalPhase::Loading;
        self.dismiss_pending = false;
        self.request
    }

    /// Apply a fetch outcome if it belongs to the current request.
    pub fn resolve(&mut self, request: RequestId, outcome: Result<T, String>) -> Resolution {
        if request != self.request || !self.is_loading() {
            debug!(?request, current = ?self.request, "dropping stale modal result");
            return Resolution::Stale;
        }
        match outcome {
            Ok(data) => {
                self.phase = ModalPhase::Loaded(data);
                Resolution::Loaded
            }
            Err(message) => {
                self.phase = ModalPhase::Error(message);
                self.dismiss_pending = true;
                Resolution::Failed
            }
        }
    }

    /// Force the modal shut. Returns false when it already was.
    pub fn close(&mut self) -> bool {
        if !self.is_open() {
            return false;
        }
        self.request = self.request.next();
        self.phase = ModalPhase::Closed;
        self.subject = None;
        self.dismiss_pending = false;
        true
    }

    /// Timer callback: close only if the error it was armed for is still showing.
    pub fn dismiss_expired(&mut self, request: RequestId) -> bool {
        if request != self.request || !matches!(self.phase, ModalPhase::Error(_)) {
            return false;
        }
        self.close()
    }
}

/// How far along a missing entry is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Completeness {
    Complete,
    SpriteMissing,
    DetailsMissing,
    BothMissing,
}

impl Completeness {
    pub fn classify(has_sprite: bool, has_details: bool) -> Self {
        match (has_sprite, has_details) {
            (true, true) => Completeness::Complete,
            (false, true) => Completeness::SpriteMissing,
            (true, false) => Completeness::DetailsMissing,
            (false, false) => Completeness::BothMissing,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Completeness::Complete => "Complete",
            Completeness::SpriteMissing => "No sprite",
            Completeness::DetailsMissing => "No details",
            Completeness::BothMissing => "Missing",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MissingEntry {
    pub name: String,
    pub number: Option<String>,
    pub has_sprite: bool,
    pub has_details: bool,
}

/// Snapshot shown in the missing modal; replaced whole on every load.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MissingReport {
    pub generation: u32,
    pub entries: Vec<MissingEntry>,
    pub total_pokemon: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum AcquisitionKind {
    Sprite,
    Details,
}

impl AcquisitionKind {
    pub fn label(self) -> &'static str {
        match self {
            AcquisitionKind::Sprite => "sprite",
            AcquisitionKind::Details => "details",
        }
    }
}

/// Follow-up a missing row offers. Bound to keys by the UI, never built from strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum RowAction {
    ViewDetails,
    Acquire(AcquisitionKind),
}

impl RowAction {
    pub fn label(self) -> &'static str {
        match self {
            RowAction::ViewDetails => "view",
            RowAction::Acquire(AcquisitionKind::Sprite) => "get sprite",
            RowAction::Acquire(AcquisitionKind::Details) => "get details",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MissingRow<'a> {
    pub entry: &'a MissingEntry,
    pub status: Completeness,
    pub actions: Vec<RowAction>,
}

impl MissingRow<'_> {
    pub fn primary_action(&self) -> RowAction {
        self.actions.first().copied().unwrap_or(RowAction::ViewDetails)
    }
}

pub fn missing_row(entry: &MissingEntry) -> MissingRow<'_> {
    let status = Completeness::classify(entry.has_sprite, entry.has_details);
    let actions = match status {
        Completeness::Complete => vec![RowAction::ViewDetails],
        Completeness::SpriteMissing => vec![
            RowAction::Acquire(AcquisitionKind::Sprite),
            RowAction::ViewDetails,
        ],
        Completeness::DetailsMissing => vec![RowAction::Acquire(AcquisitionKind::Details)],
        Completeness::BothMissing => vec![
            RowAction::Acquire(AcquisitionKind::Sprite),
            RowAction::Acquire(AcquisitionKind::Details),
        ],
    };
    MissingRow {
        entry,
        status,
        actions,
    }
}

pub fn missing_rows(entries: &[MissingEntry]) -> Vec<MissingRow<'_>> {
    entries.iter().map(missing_row).collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum MissingFilter {
    #[default]
    All,
    SpriteMissing,
    DetailsMissing,
}

impl MissingFilter {
    pub const ALL: [MissingFilter; 3] = [
        MissingFilter::All,
        MissingFilter::SpriteMissing,
        MissingFilter::DetailsMissing,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MissingFilter::All => "All",
            MissingFilter::SpriteMissing => "Sprite missing",
            MissingFilter::DetailsMissing => "Details missing",
        }
    }

    pub fn matches(self, entry: &MissingEntry) -> bool {
        match self {
            MissingFilter::All => true,
            MissingFilter::SpriteMissing => !entry.has_sprite,
            MissingFilter::DetailsMissing => !entry.has_details,
        }
    }

    pub fn cycle(self, delta: i16) -> Self {
        let len = Self::ALL.len() as i16;
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0) as i16;
        Self::ALL[(idx + delta).rem_euclid(len) as usize]
    }
}

/// Entries of the report that pass `filter`, in report order.
pub fn filtered_entries(report: &MissingReport, filter: MissingFilter) -> Vec<&MissingEntry> {
    report
        .entries
        .iter()
        .filter(|entry| filter.matches(entry))
        .collect()
}
