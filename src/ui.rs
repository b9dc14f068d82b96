//! Screen layout, event routing and the footer status bar

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tui_dispatch::{EventContext, EventKind, EventRoutingState, HandlerResponse, RenderContext};
use tui_dispatch_components::style::BorderStyle;
use tui_dispatch_components::{
    BaseStyle, Padding, StatusBar, StatusBarHint, StatusBarItem, StatusBarProps, StatusBarSection,
    StatusBarStyle,
};

use crate::action::Action;
use crate::components::theme::{ACCENT_GOLD, ACCENT_TEAL, BG_BASE, BG_PANEL, TEXT_DIM, TEXT_MAIN};
use crate::components::{
    CategoryTabs, CategoryTabsProps, Component, DetailsModal, DetailsModalProps, MissingModal,
    MissingModalProps, SpriteGallery, SpriteGalleryProps, StatsPanel, StatsPanelProps,
};
use crate::modal::ModalKind;
use crate::state::{AppState, FocusArea};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

#[derive(tui_dispatch::ComponentId, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DashComponentId {
    Generations,
    Tabs,
    Gallery,
    Details,
    Missing,
}

#[derive(tui_dispatch::BindingContext, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashContext {
    Main,
    Modal,
}

impl EventRoutingState<DashComponentId, DashContext> for AppState {
    fn focused(&self) -> Option<DashComponentId> {
        if let Some(modal) = self.modal() {
            return Some(modal);
        }
        match self.focus {
            FocusArea::Generations => Some(DashComponentId::Generations),
            FocusArea::Tabs => Some(DashComponentId::Tabs),
            FocusArea::Gallery => Some(DashComponentId::Gallery),
        }
    }

    fn modal(&self) -> Option<DashComponentId> {
        self.active_modal().map(|kind| match kind {
            ModalKind::Details => DashComponentId::Details,
            ModalKind::Missing => DashComponentId::Missing,
        })
    }

    fn binding_context(&self, id: DashComponentId) -> DashContext {
        match id {
            DashComponentId::Details | DashComponentId::Missing => DashContext::Modal,
            _ => DashContext::Main,
        }
    }

    fn default_context(&self) -> DashContext {
        DashContext::Main
    }
}

pub struct DashboardUi {
    stats: StatsPanel,
    tabs: CategoryTabs,
    gallery: SpriteGallery,
    details: DetailsModal,
    missing: MissingModal,
    status_bar: StatusBar,
}

impl Default for DashboardUi {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardUi {
    pub fn new() -> Self {
        Self {
            stats: StatsPanel::new(),
            tabs: CategoryTabs,
            gallery: SpriteGallery::new(),
            details: DetailsModal::new(),
            missing: MissingModal::new(),
            status_bar: StatusBar::new(),
        }
    }

    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        state: &AppState,
        render_ctx: RenderContext,
        event_ctx: &mut EventContext<DashComponentId>,
    ) {
        let base = Block::default().style(Style::default().bg(BG_BASE));
        frame.render_widget(base, area);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(area);

        let focused = render_ctx.is_focused();
        render_header(frame, layout[0], state);
        self.render_body(frame, layout[1], state, focused, event_ctx);
        render_footer(frame, layout[2], state, &mut self.status_bar);

        let modal = state.active_modal();
        if state.missing.is_open() {
            event_ctx.set_component_area(DashComponentId::Missing, MissingModal::area(area));
            let props = MissingModalProps {
                state,
                is_focused: focused && modal == Some(ModalKind::Missing),
            };
            self.missing.render(frame, area, props);
        } else {
            event_ctx.component_areas.remove(&DashComponentId::Missing);
        }
        if state.details.is_open() {
            event_ctx.set_component_area(DashComponentId::Details, DetailsModal::area(area));
            let props = DetailsModalProps {
                state,
                is_focused: focused,
            };
            self.details.render(frame, area, props);
        } else {
            event_ctx.component_areas.remove(&DashComponentId::Details);
        }
    }

    fn render_body(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        state: &AppState,
        focused: bool,
        event_ctx: &mut EventContext<DashComponentId>,
    ) {
        let focus = |area: FocusArea| {
            focused && state.active_modal().is_none() && state.focus == area
        };
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(36), Constraint::Percentage(64)])
            .split(area);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(4)])
            .split(columns[1]);

        event_ctx.set_component_area(DashComponentId::Generations, columns[0]);
        self.stats.render(
            frame,
            columns[0],
            StatsPanelProps {
                state,
                is_focused: focus(FocusArea::Generations),
            },
        );

        event_ctx.set_component_area(DashComponentId::Tabs, right[0]);
        self.tabs.render(
            frame,
            right[0],
            CategoryTabsProps {
                state,
                is_focused: focus(FocusArea::Tabs),
            },
        );

        event_ctx.set_component_area(DashComponentId::Gallery, right[1]);
        self.gallery.render(
            frame,
            right[1],
            SpriteGalleryProps {
                state,
                is_focused: focus(FocusArea::Gallery),
            },
        );
    }

    pub fn handle_generations_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        let props = StatsPanelProps {
            state,
            is_focused: true,
        };
        handler_response(self.stats.handle_event(event, props).into_iter().collect())
    }

    pub fn handle_tabs_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        let props = CategoryTabsProps {
            state,
            is_focused: true,
        };
        handler_response(self.tabs.handle_event(event, props).into_iter().collect())
    }

    pub fn handle_gallery_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        let props = SpriteGalleryProps {
            state,
            is_focused: true,
        };
        handler_response(self.gallery.handle_event(event, props).into_iter().collect())
    }

    pub fn handle_details_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        let props = DetailsModalProps {
            state,
            is_focused: true,
        };
        modal_response(self.details.handle_event(event, props).into_iter().collect())
    }

    pub fn handle_missing_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        let props = MissingModalProps {
            state,
            is_focused: true,
        };
        modal_response(self.missing.handle_event(event, props).into_iter().collect())
    }
}

fn handler_response(actions: Vec<Action>) -> HandlerResponse<Action> {
    if actions.is_empty() {
        HandlerResponse::ignored()
    } else {
        HandlerResponse {
            actions,
            consumed: true,
            needs_render: false,
        }
    }
}

/// Open modals swallow every event, even ones they do not map.
fn modal_response(actions: Vec<Action>) -> HandlerResponse<Action> {
    HandlerResponse {
        actions,
        consumed: true,
        needs_render: false,
    }
}

fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
    let title_style = Style::default()
        .fg(ACCENT_TEAL)
        .add_modifier(Modifier::BOLD);
    let current = state
        .gallery
        .current()
        .map(|category| {
            format!(
                "{}: {}/{} with sprites",
                category.name,
                category.visible_count(),
                category.items.len()
            )
        })
        .unwrap_or_else(|| "no category".to_string());
    let busy = state.stats.is_loading()
        || state.stats_refreshing
        || state.catalog_loading
        || state.details.is_loading()
        || state.missing.is_loading();
    let refresh = if busy {
        format!("  {} loading", SPINNER[(state.tick as usize) % SPINNER.len()])
    } else {
        String::new()
    };
    let text = Text::from(vec![
        Line::from(vec![
            Span::styled("POKEDASH", title_style),
            Span::raw("  "),
            Span::styled(state.base_url.clone(), Style::default().fg(TEXT_DIM)),
            Span::styled(refresh, Style::default().fg(ACCENT_GOLD)),
        ]),
        Line::from(vec![
            Span::raw(format!(
                "{} categories  |  ",
                state.gallery.categories().len()
            )),
            Span::styled(current, Style::default().fg(ACCENT_GOLD)),
        ]),
    ]);
    let block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN))
        .border_style(Style::default().fg(TEXT_DIM));
    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn render_footer(frame: &mut Frame, area: Rect, state: &AppState, status_bar: &mut StatusBar) {
    let status = state.message.clone().unwrap_or_else(|| {
        if state.stats.is_loading() {
            "Loading stats...".to_string()
        } else if state.catalog_loading {
            "Loading catalog...".to_string()
        } else if state.details.is_loading() {
            "Loading details...".to_string()
        } else if state.missing.is_loading() {
            "Loading missing report...".to_string()
        } else {
            String::new()
        }
    });
    let hints = status_hints(state);
    let global = [StatusBarHint::new("r", "Refresh"), StatusBarHint::new("q", "Quit")];
    let status_span = Span::styled(status.as_str(), Style::default().fg(ACCENT_GOLD));
    let status_items = [StatusBarItem::span(status_span)];

    let style = StatusBarStyle {
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
        text: Style::default().fg(TEXT_DIM),
        hint_key: Style::default()
            .fg(ACCENT_TEAL)
            .add_modifier(Modifier::BOLD),
        hint_label: Style::default().fg(TEXT_DIM),
        separator: Style::default().fg(TEXT_DIM),
    };

    let props = StatusBarProps {
        left: StatusBarSection::hints(&hints).with_separator("  "),
        center: StatusBarSection::hints(&global).with_separator("  "),
        right: StatusBarSection::items(&status_items).with_separator("  "),
        style,
        is_focused: false,
    };
    Component::<Action>::render(status_bar, frame, area, props);
}

pub fn status_hints(state: &AppState) -> Vec<StatusBarHint<'static>> {
    match state.active_modal() {
        Some(ModalKind::Details) => {
            return vec![
                StatusBarHint::new("j/k", "Scroll"),
                StatusBarHint::new("Esc", "Close"),
            ];
        }
        Some(ModalKind::Missing) => {
            return vec![
                StatusBarHint::new("h/l", "Filter"),
                StatusBarHint::new("Enter", "Open"),
                StatusBarHint::new("s/d", "Acquire"),
                StatusBarHint::new("Esc", "Close"),
            ];
        }
        None => {}
    }
    let mut hints = vec![StatusBarHint::new("Tab", "Focus")];
    match state.focus {
        FocusArea::Generations => hints.extend([
            StatusBarHint::new("j/k", "Move"),
            StatusBarHint::new("Enter", "Missing"),
        ]),
        FocusArea::Tabs => hints.extend([
            StatusBarHint::new("h/l", "Tabs"),
            StatusBarHint::new("1-9", "Jump"),
        ]),
        FocusArea::Gallery => hints.extend([
            StatusBarHint::new("j/k", "Move"),
            StatusBarHint::new("Enter", "Details"),
            StatusBarHint::new("o", "Page"),
        ]),
    }
    hints
}
