use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Borders, Paragraph, Wrap},
    Frame,
};
use tui_dispatch::EventKind;
use tui_dispatch_components::style::BorderStyle;
use tui_dispatch_components::{centered_rect, BaseStyle, Modal, ModalProps, ModalStyle, Padding};

use super::theme::{self, ACCENT_GOLD, ACCENT_RED, ACCENT_TEAL, BG_PANEL, TEXT_DIM, TEXT_MAIN};
use super::{backdrop_close, modal_behavior, Component};
use crate::action::Action;
use crate::modal::{ModalKind, ModalPhase};
use crate::state::{AppState, PokemonDetails};

pub const MODAL_WIDTH: u16 = 76;
pub const MODAL_HEIGHT: u16 = 24;

pub struct DetailsModalProps<'a> {
    pub state: &'a AppState,
    pub is_focused: bool,
}

#[derive(Default)]
pub struct DetailsModal {
    modal: Modal,
    area: Rect,
}

impl DetailsModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn area(area: Rect) -> Rect {
        centered_rect(MODAL_WIDTH, MODAL_HEIGHT, area)
    }
}

fn close() -> Action {
    Action::ModalClose(ModalKind::Details)
}

fn modal_style() -> ModalStyle {
    ModalStyle {
        base: BaseStyle {
            border: Some(BorderStyle {
                borders: Borders::ALL,
                style: Style::default().fg(TEXT_DIM),
                focused_style: Some(Style::default().fg(ACCENT_TEAL)),
            }),
            padding: Padding::xy(1, 0),
            bg: Some(BG_PANEL),
            fg: Some(TEXT_MAIN),
        },
        ..Default::default()
    }
}

fn section<'a>(lines: &mut Vec<Line<'a>>, title: &'a str) {
    lines.push(Line::raw(""));
    lines.push(Line::styled(title, theme::heading()));
}

fn field(label: &str, value: Option<&str>) -> Option<Line<'static>> {
    value.map(|value| {
        Line::from(vec![
            Span::styled(format!("  {label}: "), theme::dim()),
            Span::raw(value.to_string()),
        ])
    })
}

/// Body text for loaded details.
pub fn detail_lines(details: &PokemonDetails, base_url: &str) -> Vec<Line<'static>> {
    let mut title = vec![Span::styled(
        details.name.clone(),
        Style::default()
            .fg(ACCENT_TEAL)
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(number) = &details.number {
        title.push(Span::styled(format!("  #{number}"), theme::dim()));
    }
    title.push(Span::styled(
        format!("  Generation {}", details.generation),
        theme::dim(),
    ));
    if details.is_shiny_lock {
        title.push(Span::styled("  shiny-locked", Style::default().fg(ACCENT_GOLD)));
    }
    let mut lines = vec![Line::from(title)];

    let image = details
        .high_quality_image
        .as_deref()
        .or(details.sprite_path.as_deref());
    if let Some(path) = image {
        lines.push(Line::styled(
            crate::api::asset_url(base_url, path),
            theme::dim(),
        ));
    }
    if let Some(description) = &details.description {
        lines.push(Line::raw(""));
        lines.push(Line::raw(description.clone()));
    }
    if !details.forms.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Forms: ", theme::dim()),
            Span::raw(details.forms.join(", ")),
        ]));
    }

    section(&mut lines, "Games");
    if details.games.is_empty() {
        lines.push(Line::styled("  No game data", theme::dim()));
    }
    for game in &details.games {
        let generation = game
            .generation
            .map(|g| format!(" (gen {g})"))
            .unwrap_or_default();
        lines.push(Line::from(vec![
            Span::raw(format!("  {}", game.name)),
            Span::styled(generation, theme::dim()),
        ]));
    }

    section(&mut lines, "Hunt methods");
    if details.hunt_methods.is_empty() {
        lines.push(Line::styled("  No hunt methods recorded", theme::dim()));
    }
    for method in &details.hunt_methods {
        let mut head = vec![Span::styled(
            format!("- {}", method.name),
            Style::default().fg(TEXT_MAIN).add_modifier(Modifier::BOLD),
        )];
        if let Some(category) = &method.category {
            head.push(Span::styled(format!(" [{category}]"), theme::dim()));
        }
        if let Some(probability) = &method.probability {
            head.push(Span::styled(
                format!(" {probability}"),
                Style::default().fg(ACCENT_GOLD),
            ));
        }
        lines.push(Line::from(head));
        lines.extend(
            [
                field("game", method.game.as_deref()),
                field("location", method.location.as_deref()),
                field("conditions", method.conditions.as_deref()),
                field("about", method.description.as_deref()),
            ]
            .into_iter()
            .flatten(),
        );
    }

    section(&mut lines, "Locations");
    if details.locations.is_empty() {
        lines.push(Line::styled("  No locations recorded", theme::dim()));
    }
    for location in &details.locations {
        let extra: Vec<&str> = [
            location.region.as_deref(),
            location.game.as_deref(),
            location.method.as_deref(),
            location.rarity.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();
        let mut spans = vec![Span::raw(format!("  {}", location.name))];
        if !extra.is_empty() {
            spans.push(Span::styled(format!(" ({})", extra.join(", ")), theme::dim()));
        }
        lines.push(Line::from(spans));
    }
    lines
}

fn phase_lines(state: &AppState) -> Vec<Line<'static>> {
    let subject = state.details.subject().unwrap_or("pokemon").to_string();
    match state.details.phase() {
        ModalPhase::Closed => Vec::new(),
        ModalPhase::Loading => vec![Line::styled(format!("Loading {subject}..."), theme::dim())],
        ModalPhase::Error(error) => vec![
            Line::styled(
                format!("Could not load {subject}"),
                Style::default().fg(ACCENT_RED).add_modifier(Modifier::BOLD),
            ),
            Line::raw(error.clone()),
            Line::raw(""),
            Line::styled("This message closes on its own.", theme::dim()),
        ],
        ModalPhase::Loaded(details) => detail_lines(details, &state.base_url),
    }
}

fn last_line(lines: &[Line<'_>]) -> u16 {
    u16::try_from(lines.len().saturating_sub(1)).unwrap_or(u16::MAX)
}

/// Furthest the body can scroll for the current details phase.
pub fn max_scroll(state: &AppState) -> u16 {
    last_line(&phase_lines(state))
}

impl Component<Action> for DetailsModal {
    type Props<'a> = DetailsModalProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = Action> {
        if !props.is_focused || !props.state.details.is_open() {
            return Vec::new();
        }
        let EventKind::Key(key) = event else {
            return backdrop_close(&mut self.modal, self.area, event, modal_style(), close);
        };
        match key.code {
            KeyCode::Esc | KeyCode::Char('x') => vec![close()],
            KeyCode::Up | KeyCode::Char('k') => vec![Action::DetailsScroll(-1)],
            KeyCode::Down | KeyCode::Char('j') => vec![Action::DetailsScroll(1)],
            KeyCode::PageUp => vec![Action::DetailsScroll(-10)],
            KeyCode::PageDown => vec![Action::DetailsScroll(10)],
            // Keys stay inside the modal
            _ => Vec::new(),
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let state = props.state;
        if !state.details.is_open() {
            return;
        }
        self.area = Self::area(area);
        let lines = phase_lines(state);
        let scroll = state.details_scroll.min(last_line(&lines));
        let mut render_content = |frame: &mut Frame, content_area: Rect| {
            let paragraph = Paragraph::new(lines.clone())
                .wrap(Wrap { trim: false })
                .scroll((scroll, 0));
            frame.render_widget(paragraph, content_area);
        };

        self.modal.render(
            frame,
            area,
            ModalProps {
                is_open: true,
                is_focused: props.is_focused,
                area: self.area,
                style: modal_style(),
                behavior: modal_behavior(),
                on_close: close,
                render_content: &mut render_content,
            },
        );
    }
}
