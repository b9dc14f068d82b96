use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Gauge, Paragraph},
    Frame,
};
use tui_dispatch::{DataResource, EventKind};
use tui_dispatch_components::{SelectList, SelectListBehavior, SelectListProps};

use super::theme::{self, ACCENT_GOLD, ACCENT_RED, ACCENT_TEAL, BG_PANEL_ALT, TEXT_MAIN};
use super::Component;
use crate::action::Action;
use crate::state::{AppState, Counters, DashboardStats, GenerationStat};

const LIST_LIMIT: usize = 5;

pub struct StatsPanelProps<'a> {
    pub state: &'a AppState,
    pub is_focused: bool,
}

/// Animated totals, per-generation progress, top forms and recent additions.
///
/// Enter on a generation row opens its missing report.
#[derive(Default)]
pub struct StatsPanel {
    generations: SelectList,
}

impl StatsPanel {
    pub fn new() -> Self {
        Self::default()
    }

    fn generation_items(rows: &[GenerationStat]) -> Vec<Line<'static>> {
        rows.iter().map(generation_line).collect()
    }
}

fn generation_line(row: &GenerationStat) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!("Gen {:<3}", row.generation),
        Style::default().fg(ACCENT_TEAL),
    )];
    match (row.with_sprites, row.percentage()) {
        (Some(with_sprites), Some(pct)) => {
            spans.push(Span::raw(format!(" {with_sprites:>4}/{:<4}", row.total)));
            spans.push(Span::styled(
                format!(" {pct:>5.1}%"),
                Style::default().fg(ACCENT_GOLD),
            ));
        }
        _ => spans.push(Span::raw(format!(" {:>4} pokemon", row.total))),
    }
    Line::from(spans)
}

fn counter_lines(counters: &Counters) -> Vec<Line<'static>> {
    let value = |n: f64| format!("{}", n.round() as u64);
    vec![
        Line::from(vec![
            Span::styled("Pokemon ", theme::dim()),
            Span::styled(value(counters.total_pokemon.value()), theme::heading()),
            Span::styled("   Sprites ", theme::dim()),
            Span::styled(
                value(counters.sprites_downloaded.value()),
                theme::heading(),
            ),
        ]),
        Line::from(vec![
            Span::styled("Forms   ", theme::dim()),
            Span::styled(value(counters.total_forms.value()), theme::heading()),
            Span::styled("   Done    ", theme::dim()),
            Span::styled(
                format!("{:.1}%", counters.download_percentage.value()),
                Style::default().fg(ACCENT_GOLD),
            ),
        ]),
    ]
}

fn highlight_lines(stats: &DashboardStats) -> Vec<Line<'static>> {
    let mut lines = vec![Line::styled("Top forms", theme::heading())];
    if stats.top_forms.is_empty() {
        lines.push(Line::styled("  none", theme::dim()));
    }
    for form in stats.top_forms.iter().take(LIST_LIMIT) {
        let generation = form
            .generation
            .map(|g| format!(" (gen {g})"))
            .unwrap_or_default();
        lines.push(Line::from(vec![
            Span::raw(format!("  {}", form.name)),
            Span::styled(generation, theme::dim()),
        ]));
    }
    lines.push(Line::styled("Recent", theme::heading()));
    if stats.recent_pokemon.is_empty() {
        lines.push(Line::styled("  none", theme::dim()));
    }
    for recent in stats.recent_pokemon.iter().take(LIST_LIMIT) {
        lines.push(Line::from(vec![
            Span::raw(format!("  {}", recent.name)),
            Span::styled(format!(" (gen {})", recent.generation), theme::dim()),
        ]));
    }
    lines
}

impl Component<Action> for StatsPanel {
    type Props<'a> = StatsPanelProps<'a>;

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
                .selected_generation()
                .map(Action::MissingOpen)
                .into_iter()
                .collect(),
            _ => {
                let items = Self::generation_items(state.generation_rows());
                let list_props = SelectListProps {
                    items: &items,
                    count: items.len(),
                    selected: state.generation_index,
                    is_focused: true,
                    style: theme::list_style(Some(BG_PANEL_ALT)),
                    behavior: SelectListBehavior {
                        show_scrollbar: false,
                        wrap_navigation: false,
                    },
                    on_select: Action::GenerationSelect,
                    render_item: &|item| item.clone(),
                };
                self.generations
                    .handle_event(event, list_props)
                    .into_iter()
                    .collect()
            }
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let block = theme::panel("STATS", props.is_focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let stats = match &props.state.stats {
            DataResource::Loaded(stats) => stats,
            DataResource::Loading | DataResource::Empty => {
                frame.render_widget(Paragraph::new("Loading stats...").style(theme::dim()), inner);
                return;
            }
            DataResource::Failed(error) => {
                frame.render_widget(
                    Paragraph::new(format!("Stats unavailable: {error}"))
                        .style(Style::default().fg(ACCENT_RED)),
                    inner,
                );
                return;
            }
        };

        let highlights = highlight_lines(stats);
        let chunks = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(highlights.len() as u16),
        ])
        .split(inner);

        frame.render_widget(Paragraph::new(counter_lines(&props.state.counters)), chunks[0]);

        let pct = props.state.counters.download_percentage.value();
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(ACCENT_TEAL).bg(BG_PANEL_ALT))
            .ratio((pct / 100.0).clamp(0.0, 1.0))
            .label(Span::styled(format!("{pct:.1}%"), Style::default().fg(TEXT_MAIN)));
        frame.render_widget(gauge, chunks[1]);

        frame.render_widget(Line::styled("Generations", theme::heading()), chunks[2]);
        let items = Self::generation_items(&stats.generation_stats);
        let list_props = SelectListProps {
            items: &items,
            count: items.len(),
            selected: props.state.generation_index,
            is_focused: props.is_focused,
            style: theme::list_style(Some(BG_PANEL_ALT)),
            behavior: SelectListBehavior {
                show_scrollbar: true,
                wrap_navigation: false,
            },
            on_select: Action::GenerationSelect,
            render_item: &|item| item.clone(),
        };
        self.generations.render(frame, chunks[3], list_props);

        frame.render_widget(Paragraph::new(highlights), chunks[4]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_line_without_sprite_column() {
        let line = generation_line(&GenerationStat {
            generation: 3,
            total: 135,
            with_sprites: None,
        });
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.contains("135 pokemon"), "{text}");
        assert!(!text.contains('%'));
    }

    #[test]
    fn test_generation_line_with_progress() {
        let line = generation_line(&GenerationStat {
            generation: 1,
            total: 200,
            with_sprites: Some(50),
        });
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.contains("25.0%"), "{text}");
    }
}
