use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Paragraph, Tabs},
    Frame,
};
use tui_dispatch::EventKind;

use super::theme::{self, ACCENT_RED, ACCENT_TEAL, TEXT_DIM};
use super::Component;
use crate::action::Action;
use crate::state::{AppState, FocusArea};

pub struct CategoryTabsProps<'a> {
    pub state: &'a AppState,
    pub is_focused: bool,
}

/// One tab per non-empty category, labelled `name (count)`.
#[derive(Default)]
pub struct CategoryTabs;

impl Component<Action> for CategoryTabs {
    type Props<'a> = CategoryTabsProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = Action> {
        if !props.is_focused {
            return None;
        }
        match event {
            EventKind::Key(key) => match key.code {
                KeyCode::Left | KeyCode::Char('h') => Some(Action::CategoryPrev),
                KeyCode::Right | KeyCode::Char('l') => Some(Action::CategoryNext),
                KeyCode::Enter | KeyCode::Down => Some(Action::FocusSet(FocusArea::Gallery)),
                KeyCode::Char(c @ '1'..='9') => {
                    let index = c as usize - '1' as usize;
                    props
                        .state
                        .gallery
                        .categories()
                        .get(index)
                        .map(|category| Action::CategorySelect(category.id()))
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let state = props.state;
        let block = theme::panel("CATEGORIES", props.is_focused);

        if let Some(error) = &state.catalog_error {
            let paragraph = Paragraph::new(format!("Catalog unavailable: {error}"))
                .style(Style::default().fg(ACCENT_RED))
                .block(block);
            frame.render_widget(paragraph, area);
            return;
        }
        let categories = state.gallery.categories();
        if categories.is_empty() {
            let text = if state.catalog_loading {
                "Loading catalog..."
            } else {
                "No sprites yet"
            };
            frame.render_widget(Paragraph::new(text).style(theme::dim()).block(block), area);
            return;
        }

        let labels: Vec<String> = categories.iter().map(|c| c.tab_label()).collect();
        let tabs = Tabs::new(labels)
            .block(block)
            .select(state.gallery.selected_index())
            .style(Style::default().fg(TEXT_DIM))
            .highlight_style(
                Style::default()
                    .fg(ACCENT_TEAL)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }
}
