pub mod category_tabs;
pub mod details_modal;
pub mod missing_modal;
pub mod sprite_gallery;
pub mod stats_panel;
pub mod theme;

// Re-export core Component trait
pub use tui_dispatch::Component;

pub use category_tabs::{CategoryTabs, CategoryTabsProps};
pub use details_modal::{DetailsModal, DetailsModalProps};
pub use missing_modal::{MissingModal, MissingModalProps};
pub use sprite_gallery::{SpriteGallery, SpriteGalleryProps};
pub use stats_panel::{StatsPanel, StatsPanelProps};

use crossterm::event::MouseEventKind;
use ratatui::{layout::Rect, Frame};
use tui_dispatch::EventKind;
use tui_dispatch_components::{Modal, ModalBehavior, ModalProps, ModalStyle};

use crate::action::Action;

pub(crate) fn modal_behavior() -> ModalBehavior {
    ModalBehavior {
        close_on_esc: true,
        close_on_backdrop: true,
    }
}

/// Close action for a mouse press outside `area`, the rect the modal last rendered into.
pub(crate) fn backdrop_close(
    modal: &mut Modal,
    area: Rect,
    event: &EventKind,
    style: ModalStyle,
    on_close: fn() -> Action,
) -> Vec<Action> {
    // Motion and release reports come through mouse capture too
    let EventKind::Mouse(mouse) = event else {
        return Vec::new();
    };
    if area.is_empty() || !matches!(mouse.kind, MouseEventKind::Down(_)) {
        return Vec::new();
    }
    let props = ModalProps {
        is_open: true,
        is_focused: true,
        area,
        style,
        behavior: modal_behavior(),
        on_close,
        render_content: &mut |_: &mut Frame, _: Rect| {},
    };
    <Modal as Component<Action>>::handle_event(modal, event, props)
        .into_iter()
        .collect()
}
