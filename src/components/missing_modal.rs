use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Borders, Paragraph, Tabs, Wrap},
    Frame,
};
use tui_dispatch::EventKind;
use tui_dispatch_components::style::BorderStyle;
use tui_dispatch_components::{
    centered_rect, BaseStyle, Modal, ModalProps, ModalStyle, Padding, SelectList, SelectListBehavior,
    SelectListProps,
};

use super::theme::{self, ACCENT_GOLD, ACCENT_RED, ACCENT_TEAL, BG_PANEL, TEXT_DIM, TEXT_MAIN};
use super::{backdrop_close, modal_behavior, Component};
use crate::action::Action;
use crate::modal::{
    missing_row, AcquisitionKind, MissingEntry, MissingFilter, MissingReport, ModalKind,
    ModalPhase, RowAction,
};
use crate::state::AppState;

pub const MODAL_WIDTH: u16 = 72;
pub const MODAL_HEIGHT: u16 = 22;

pub struct MissingModalProps<'a> {
    pub state: &'a AppState,
    pub is_focused: bool,
}

/// Per-generation list of entries lacking a sprite or details.
#[derive(Default)]
pub struct MissingModal {
    modal: Modal,
    list: SelectList,
    area: Rect,
}

impl MissingModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn area(area: Rect) -> Rect {
        centered_rect(MODAL_WIDTH, MODAL_HEIGHT, area)
    }

    fn items(entries: &[&MissingEntry]) -> Vec<Line<'static>> {
        entries.iter().map(|entry| row_line(entry)).collect()
    }
}

fn close() -> Action {
    Action::ModalClose(ModalKind::Missing)
}

fn modal_style() -> ModalStyle {
    ModalStyle {
        base: BaseStyle {
            border: Some(BorderStyle {
                borders: Borders::ALL,
                style: Style::default().fg(TEXT_DIM),
                focused_style: Some(Style::default().fg(ACCENT_GOLD)),
            }),
            padding: Padding::xy(1, 0),
            bg: Some(BG_PANEL),
            fg: Some(TEXT_MAIN),
        },
        ..Default::default()
    }
}

fn row_line(entry: &MissingEntry) -> Line<'static> {
    let row = missing_row(entry);
    let number = entry
        .number
        .as_deref()
        .map(|n| format!("#{n:<5}"))
        .unwrap_or_else(|| " ".repeat(6));
    let actions: Vec<&str> = row.actions.iter().map(|action| action.label()).collect();
    Line::from(vec![
        Span::styled(number, theme::dim()),
        Span::raw(format!(" {:<22}", entry.name)),
        Span::styled(format!("{:<11}", row.status.label()), theme::completeness_style(row.status)),
        Span::styled(format!(" {}", actions.join(" / ")), theme::dim()),
    ])
}

fn summary_line(report: &MissingReport, shown: usize) -> Line<'static> {
    let mut spans = vec![
        Span::styled(format!("Generation {}", report.generation), theme::heading()),
        Span::raw(format!("  {shown} of {} shown", report.entries.len())),
    ];
    if let Some(total) = report.total_pokemon {
        spans.push(Span::styled(format!("  ({total} pokemon)"), theme::dim()));
    }
    Line::from(spans)
}

fn filter_tabs(selected: MissingFilter) -> Tabs<'static> {
    let index = MissingFilter::ALL
        .iter()
        .position(|filter| *filter == selected)
        .unwrap_or(0);
    Tabs::new(MissingFilter::ALL.iter().map(|filter| filter.label()))
        .select(index)
        .style(Style::default().fg(TEXT_DIM))
        .highlight_style(
            Style::default()
                .fg(ACCENT_TEAL)
                .add_modifier(Modifier::BOLD),
        )
}

/// Message for a report with nothing to list under the current filter.
pub fn empty_message(report: &MissingReport, filter: MissingFilter) -> String {
    if report.entries.is_empty() {
        format!("Every pokemon in generation {} is complete.", report.generation)
    } else {
        format!("No entries match the \"{}\" filter.", filter.label())
    }
}

fn hint_line(entry: Option<&MissingEntry>) -> Line<'static> {
    let Some(entry) = entry else {
        return Line::styled("Esc close  h/l filter", theme::dim());
    };
    let row = missing_row(entry);
    let mut spans = vec![
        Span::styled("Enter ", Style::default().fg(ACCENT_TEAL)),
        Span::styled(row.primary_action().label().to_string(), theme::dim()),
    ];
    for action in &row.actions {
        let key = match action {
            RowAction::ViewDetails => "v",
            RowAction::Acquire(AcquisitionKind::Sprite) => "s",
            RowAction::Acquire(AcquisitionKind::Details) => "d",
        };
        spans.push(Span::styled(format!("  {key} "), Style::default().fg(ACCENT_TEAL)));
        spans.push(Span::styled(action.label().to_string(), theme::dim()));
    }
    spans.push(Span::styled("  Esc ", Style::default().fg(ACCENT_TEAL)));
    spans.push(Span::styled("close", theme::dim()));
    Line::from(spans)
}

fn acquisition(state: &AppState, kind: AcquisitionKind) -> Option<Action> {
    let generation = state.missing.data()?.generation;
    let entry = state.selected_missing_entry()?;
    Some(Action::AcquisitionRequest {
        kind,
        name: entry.name.clone(),
        generation,
    })
}

impl Component<Action> for MissingModal {
    type Props<'a> = MissingModalProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = Action> {
        let state = props.state;
        if !props.is_focused || !state.missing.is_open() {
            return Vec::new();
        }
        let EventKind::Key(key) = event else {
            return backdrop_close(&mut self.modal, self.area, event, modal_style(), close);
        };
        match key.code {
            KeyCode::Esc | KeyCode::Char('x') => vec![close()],
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('[') => {
                vec![Action::MissingFilterPrev]
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(']') => {
                vec![Action::MissingFilterNext]
            }
            KeyCode::Enter => {
                if state.selected_missing_entry().is_some() {
                    vec![Action::MissingRowActivate]
                } else {
                    Vec::new()
                }
            }
            KeyCode::Char('s') => acquisition(state, AcquisitionKind::Sprite)
                .into_iter()
                .collect(),
            KeyCode::Char('d') => acquisition(state, AcquisitionKind::Details)
                .into_iter()
                .collect(),
            KeyCode::Char('v') => {
                let generation = state.missing.data().map(|report| report.generation);
                match (state.selected_missing_entry(), generation) {
                    (Some(entry), Some(generation)) => vec![Action::DetailsOpen {
                        name: entry.name.clone(),
                        generation,
                    }],
                    _ => Vec::new(),
                }
            }
            _ => {
                let entries = state.missing_entries();
                let items = Self::items(&entries);
                let list_props = SelectListProps {
                    items: &items,
                    count: items.len(),
                    selected: state.missing_index,
                    is_focused: true,
                    style: theme::list_style(None),
                    behavior: SelectListBehavior {
                        show_scrollbar: true,
                        wrap_navigation: false,
                    },
                    on_select: Action::MissingRowSelect,
                    render_item: &|item| item.clone(),
                };
                self.list.handle_event(event, list_props).into_iter().collect()
            }
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let state = props.state;
        if !state.missing.is_open() {
            return;
        }

        self.area = Self::area(area);
        let MissingModal { modal, list, area: modal_area } = self;
        let subject = state.missing.subject().unwrap_or("Generation").to_string();
        let mut render_content = |frame: &mut Frame, content_area: Rect| match state
            .missing
            .phase()
        {
            ModalPhase::Closed => {}
            ModalPhase::Loading => {
                frame.render_widget(
                    Paragraph::new(format!("Loading missing report for {subject}..."))
                        .style(theme::dim()),
                    content_area,
                );
            }
            ModalPhase::Error(error) => {
                let lines = vec![
                    Line::styled(
                        format!("Could not load the missing report for {subject}"),
                        Style::default().fg(ACCENT_RED).add_modifier(Modifier::BOLD),
                    ),
                    Line::raw(error.clone()),
                    Line::raw(""),
                    Line::styled("This message closes on its own.", theme::dim()),
                ];
                frame.render_widget(
                    Paragraph::new(lines).wrap(Wrap { trim: false }),
                    content_area,
                );
            }
            ModalPhase::Loaded(report) => {
                let chunks = Layout::vertical([
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Min(3),
                    Constraint::Length(1),
                ])
                .split(content_area);

                let entries = state.missing_entries();
                frame.render_widget(summary_line(report, entries.len()), chunks[0]);
                frame.render_widget(filter_tabs(state.missing_filter), chunks[1]);

                if entries.is_empty() {
                    frame.render_widget(
                        Paragraph::new(empty_message(report, state.missing_filter))
                            .style(Style::default().fg(ACCENT_TEAL))
                            .wrap(Wrap { trim: true }),
                        chunks[2],
                    );
                } else {
                    let items = MissingModal::items(&entries);
                    let list_props = SelectListProps {
                        items: &items,
                        count: items.len(),
                        selected: state.missing_index,
                        is_focused: props.is_focused,
                        style: theme::list_style(None),
                        behavior: SelectListBehavior {
                            show_scrollbar: true,
                            wrap_navigation: false,
                        },
                        on_select: Action::MissingRowSelect,
                        render_item: &|item| item.clone(),
                    };
                    list.render(frame, chunks[2], list_props);
                }
                frame.render_widget(hint_line(state.selected_missing_entry()), chunks[3]);
            }
        };

        modal.render(
            frame,
            area,
            ModalProps {
                is_open: true,
                is_focused: props.is_focused,
                area: *modal_area,
                style: modal_style(),
                behavior: modal_behavior(),
                on_close: close,
                render_content: &mut render_content,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, has_sprite: bool, has_details: bool) -> MissingEntry {
        MissingEntry {
            name: name.into(),
            number: None,
            has_sprite,
            has_details,
        }
    }

    #[test]
    fn test_empty_message_distinguishes_complete_from_filtered() {
        let empty = MissingReport {
            generation: 4,
            ..Default::default()
        };
        assert!(empty_message(&empty, MissingFilter::All).contains("complete"));

        let report = MissingReport {
            generation: 4,
            entries: vec![entry("gible", false, true)],
            total_pokemon: None,
        };
        let message = empty_message(&report, MissingFilter::DetailsMissing);
        assert!(message.contains(MissingFilter::DetailsMissing.label()), "{message}");
    }

    #[test]
    fn test_row_line_lists_follow_ups() {
        let line = row_line(&entry("gible", false, false));
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.contains("get sprite / get details"), "{text}");
    }

    #[test]
    fn test_backdrop_press_closes_missing_modal() {
        use crate::reducer::reducer;
        use crossterm::event::{KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
        use tui_dispatch::testing::RenderHarness;

        let mut state = AppState::default();
        reducer(&mut state, Action::MissingOpen(4));
        let mut modal = MissingModal::new();

        let press = EventKind::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        });
        let props = || MissingModalProps {
            state: &state,
            is_focused: true,
        };
        // Nothing to hit-test against before the first frame
        let before: Vec<Action> = modal.handle_event(&press, props()).into_iter().collect();
        assert!(before.is_empty());

        let mut render = RenderHarness::new(100, 30);
        render.render(|frame| modal.render(frame, frame.area(), props()));
        let after: Vec<Action> = modal.handle_event(&press, props()).into_iter().collect();
        assert_eq!(after, vec![close()]);
    }
}
