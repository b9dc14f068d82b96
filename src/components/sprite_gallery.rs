use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_dispatch::EventKind;
use tui_dispatch_components::{SelectList, SelectListBehavior, SelectListProps};

use super::theme::{self, ACCENT_GOLD};
use super::Component;
use crate::action::Action;
use crate::catalog::Item;
use crate::state::AppState;

pub struct SpriteGalleryProps<'a> {
    pub state: &'a AppState,
    pub is_focused: bool,
}

/// Items of the selected category that have a usable sprite.
#[derive(Default)]
pub struct SpriteGallery {
    list: SelectList,
}

impl SpriteGallery {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(state: &AppState) -> Vec<Line<'static>> {
        state
            .visible_items()
            .into_iter()
            .map(|item| item_line(item, &state.base_url))
            .collect()
    }
}

fn item_line(item: &Item, base_url: &str) -> Line<'static> {
    let number = item
        .number
        .as_deref()
        .map(|n| format!("#{n:<5}"))
        .unwrap_or_else(|| " ".repeat(6));
    let mut spans = vec![
        Span::styled(number, theme::dim()),
        Span::raw(format!(" {:<24}", item.name)),
    ];
    if item.is_shiny_lock {
        spans.push(Span::styled(" shiny-locked ", Style::default().fg(ACCENT_GOLD)));
    }
    if let Some(path) = item.sprite_path() {
        spans.push(Span::styled(
            format!(" {}", crate::api::asset_url(base_url, path)),
            theme::dim(),
        ));
    }
    Line::from(spans)
}

impl Component<Action> for SpriteGallery {
    type Props<'a> = SpriteGalleryProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = Action> {
        if !props.is_focused {
            return Vec::new();
        }
        let EventKind::Key(key) = event else {
            return Vec::new();
        };
        let state = props.state;
        match key.code {
            KeyCode::Enter => state
                .selected_item()
                .map(|item| Action::DetailsOpen {
                    name: item.name.clone(),
                    generation: item.generation(),
                })
                .into_iter()
                .collect(),
            KeyCode::Char('o') => vec![Action::ItemShowPage],
            KeyCode::Left | KeyCode::Char('h') => vec![Action::CategoryPrev],
            KeyCode::Right | KeyCode::Char('l') => vec![Action::CategoryNext],
            _ => {
                let items = Self::items(state);
                let list_props = SelectListProps {
                    items: &items,
                    count: items.len(),
                    selected: state.item_index,
                    is_focused: true,
                    style: theme::list_style(None),
                    behavior: SelectListBehavior {
                        show_scrollbar: true,
                        wrap_navigation: false,
                    },
                    on_select: Action::ItemSelect,
                    render_item: &|item| item.clone(),
                };
                self.list.handle_event(event, list_props).into_iter().collect()
            }
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let state = props.state;
        let title = state
            .gallery
            .current()
            .map(|category| category.name.clone())
            .unwrap_or_else(|| "GALLERY".to_string());
        let block = theme::panel(&title, props.is_focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let items = Self::items(state);
        if items.is_empty() {
            let text = if state.catalog_loading {
                "Loading sprites..."
            } else {
                "Nothing to show in this category"
            };
            frame.render_widget(Paragraph::new(text).style(theme::dim()), inner);
            return;
        }

        let list_props = SelectListProps {
            items: &items,
            count: items.len(),
            selected: state.item_index,
            is_focused: props.is_focused,
            style: theme::list_style(None),
            behavior: SelectListBehavior {
                show_scrollbar: true,
                wrap_navigation: false,
            },
            on_select: Action::ItemSelect,
            render_item: &|item| item.clone(),
        };
        self.list.render(frame, inner, list_props);
    }
}
