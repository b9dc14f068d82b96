use crate::modal::{AcquisitionKind, ModalKind, RequestId};

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    LoadStats,
    LoadCatalog,
    LoadDetails {
        request: RequestId,
        name: String,
        generation: u32,
    },
    LoadMissing {
        request: RequestId,
        generation: u32,
    },
    /// Arm the error auto-dismiss timer for one request
    ScheduleDismiss {
        modal: ModalKind,
        request: RequestId,
        after_ms: u64,
    },
    CancelDismiss {
        modal: ModalKind,
    },
    RequestAcquisition {
        kind: AcquisitionKind,
        name: String,
        generation: u32,
    },
}
