use ratatui::{
    style::{Color, Modifier, Style},
    widgets::{Block, Borders},
};
use tui_dispatch_components::{BaseStyle, Padding, SelectListStyle, SelectionStyle};

use crate::modal::Completeness;

pub const BG_BASE: Color = Color::Rgb(12, 18, 28);
pub const BG_PANEL: Color = Color::Rgb(20, 32, 46);
pub const BG_PANEL_ALT: Color = Color::Rgb(26, 40, 58);
pub const BG_HIGHLIGHT: Color = Color::Rgb(28, 92, 110);
pub const TEXT_MAIN: Color = Color::Rgb(232, 242, 244);
pub const TEXT_DIM: Color = Color::Rgb(176, 195, 207);
pub const ACCENT_TEAL: Color = Color::Rgb(72, 204, 184);
pub const ACCENT_GOLD: Color = Color::Rgb(228, 176, 88);
pub const ACCENT_RED: Color = Color::Rgb(226, 96, 96);

pub fn panel(title: &str, focused: bool) -> Block<'_> {
    let border = if focused {
        Style::default().fg(ACCENT_TEAL)
    } else {
        Style::default().fg(TEXT_DIM)
    };
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN))
        .border_style(border)
}

pub fn list_style(bg: Option<Color>) -> SelectListStyle {
    SelectListStyle {
        base: BaseStyle {
            border: None,
            padding: Padding::xy(1, 0),
            bg,
            fg: Some(TEXT_MAIN),
        },
        selection: SelectionStyle {
            style: Some(
                Style::default()
                    .bg(BG_HIGHLIGHT)
                    .fg(TEXT_MAIN)
                    .add_modifier(Modifier::BOLD),
            ),
            marker: None,
            disabled: false,
        },
        ..SelectListStyle::default()
    }
}

pub fn heading() -> Style {
    Style::default()
        .fg(ACCENT_TEAL)
        .add_modifier(Modifier::BOLD)
}

pub fn dim() -> Style {
    Style::default().fg(TEXT_DIM)
}

pub fn completeness_style(status: Completeness) -> Style {
    let color = match status {
        Completeness::Complete => ACCENT_TEAL,
        Completeness::SpriteMissing | Completeness::DetailsMissing => ACCENT_GOLD,
        Completeness::BothMissing => ACCENT_RED,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}
