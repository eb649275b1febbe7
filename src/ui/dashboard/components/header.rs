//! Dashboard header component
//!
//! Renders the title line and the section tabs

use super::super::state::DashboardState;
use super::super::utils::format_uptime;
use crate::sync::{Renderer, SectionState};

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Tabs};

fn state_marker(state: &SectionState, tick: usize) -> &'static str {
    const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];
    match state {
        SectionState::Idle => " ",
        SectionState::Loading { .. } => SPINNER[tick % SPINNER.len()],
        SectionState::Populated { .. } => "*",
        SectionState::Empty { .. } => "o",
        SectionState::Error { .. } => "!",
    }
}

pub fn render_header(f: &mut Frame, area: Rect, state: &DashboardState, renderer: &Renderer) {
    let header_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Length(2)])
        .split(area);

    let version = env!("CARGO_PKG_VERSION");
    let title_text = format!(
        "PORTFOLIO VIEW v{}  |  {} ({})  |  up {}  |  {} refreshes, {} writes, {} errors",
        version,
        state.environment,
        state.server_url,
        format_uptime(state.start_time.elapsed().as_secs()),
        state.stats.refreshes,
        state.stats.writes,
        state.stats.errors,
    );
    let title = Paragraph::new(title_text)
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_type(BorderType::Thick),
        );
    f.render_widget(title, header_chunks[0]);

    let titles: Vec<Line> = state
        .sections
        .iter()
        .map(|section| {
            let timer = if renderer.has_timer(*section) { "" } else { " (paused)" };
            Line::from(format!(
                "{} {}{}",
                state_marker(renderer.state(*section), state.tick),
                section.title(),
                timer
            ))
        })
        .collect();
    let tabs = Tabs::new(titles)
        .select(state.current)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::LightYellow)
                .add_modifier(Modifier::BOLD),
        )
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    f.render_widget(tabs, header_chunks[1]);
}
