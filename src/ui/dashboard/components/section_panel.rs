//! Section panel component
//!
//! Lists the widgets of the current section, or its loading, empty or error
//! message.

use super::super::state::DashboardState;
use super::super::utils::tone_color;
use crate::logging::LogLevel;
use crate::sync::widget::{Tone, Widget, WidgetBody};
use crate::sync::{Renderer, SectionState};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph, Wrap};

fn notice_color(level: LogLevel) -> Color {
    match level {
        LogLevel::Error => Color::LightRed,
        LogLevel::Warn => Color::LightYellow,
        _ => Color::LightGreen,
    }
}

/// One list entry per widget; cards and panels take two or more lines.
fn widget_lines(widget: &Widget) -> Vec<Line<'static>> {
    match &widget.body {
        WidgetBody::Row(cells) => {
            let mut spans = Vec::with_capacity(cells.len() * 2);
            for (i, cell) in cells.iter().enumerate() {
                if i > 0 {
                    spans.push(Span::styled(" │ ", Style::default().fg(Color::DarkGray)));
                }
                spans.push(Span::styled(
                    cell.text.clone(),
                    Style::default().fg(tone_color(cell.tone)),
                ));
            }
            vec![Line::from(spans)]
        }
        WidgetBody::Card(card) => {
            let mut title = vec![Span::styled(
                card.title.clone(),
                Style::default()
                    .fg(tone_color(card.tone))
                    .add_modifier(Modifier::BOLD),
            )];
            if !card.subtitle.is_empty() {
                title.push(Span::styled(
                    format!("  {}", card.subtitle),
                    Style::default().fg(Color::Gray),
                ));
            }
            for badge in &card.badges {
                title.push(Span::styled(
                    format!(" [{}]", badge),
                    Style::default().fg(Color::LightBlue),
                ));
            }
            let mut lines = vec![Line::from(title)];
            if !card.body.is_empty() {
                lines.push(Line::from(format!("  {}", card.body)));
            }
            lines
        }
        WidgetBody::Chart(chart) => {
            let mut lines = vec![Line::from(Span::styled(
                format!("▤ {}", chart.title),
                Style::default().add_modifier(Modifier::BOLD),
            ))];
            lines.extend(
                chart
                    .captions
                    .iter()
                    .map(|caption| Line::from(format!("  {}", caption))),
            );
            lines
        }
        WidgetBody::Panel(panel) => {
            let mut lines = vec![Line::from(Span::styled(
                format!("  ▾ {}", panel.title),
                Style::default().fg(Color::LightBlue),
            ))];
            lines.extend(
                panel
                    .rows
                    .iter()
                    .map(|(label, value)| Line::from(format!("      {}: {}", label, value))),
            );
            lines
        }
    }
}

pub fn render_section_panel(f: &mut Frame, area: Rect, state: &DashboardState, renderer: &Renderer) {
    let section = state.current_section();
    let slot = renderer.slot(section);

    let updated = slot
        .last_updated
        .map(|at| format!(" - updated {}", at.format("%H:%M:%S")))
        .unwrap_or_default();
    let block = Block::default()
        .title(format!("{}{}", section.title().to_uppercase(), updated))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(if slot.notice.is_some() { 1 } else { 0 }),
            Constraint::Fill(1),
        ])
        .split(inner);

    if let Some(notice) = &slot.notice {
        f.render_widget(
            Paragraph::new(notice.message.clone())
                .style(Style::default().fg(notice_color(notice.level))),
            chunks[0],
        );
    }

    let message = match &slot.state {
        SectionState::Idle => Some((String::new(), Tone::Neutral)),
        SectionState::Loading { .. } => Some((section.loading_message(), Tone::Neutral)),
        SectionState::Empty { message } => Some((message.clone(), Tone::Neutral)),
        SectionState::Error { message, detail } => {
            Some((format!("{}\n{}", message, detail), Tone::Negative))
        }
        SectionState::Populated { .. } => None,
    };
    if let Some((text, tone)) = message {
        f.render_widget(
            Paragraph::new(text)
                .style(Style::default().fg(tone_color(tone)))
                .wrap(Wrap { trim: true }),
            chunks[1],
        );
        return;
    }

    let items: Vec<ListItem> = renderer
        .widgets(section)
        .into_iter()
        .map(|widget| ListItem::new(widget_lines(widget)))
        .collect();
    let list = List::new(items)
        .highlight_style(Style::default().bg(Color::Rgb(40, 48, 60)))
        .highlight_symbol("▶ ");
    let mut list_state = ListState::default().with_selected(Some(state.selected));
    f.render_stateful_widget(list, chunks[1], &mut list_state);
}
