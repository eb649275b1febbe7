//! Dashboard footer component
//!
//! Renders key help, or the open prompt with its input

use super::super::state::DashboardState;
use crate::sync::Section;
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::prelude::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

fn key_help(section: Section) -> &'static str {
    match section {
        Section::Recommendations => {
            "[←/→] Section [↑/↓] Select [Enter] Trade [I] Impact [F] Feedback [R] Refresh [P] Timer [Q] Quit"
        }
        Section::Performance => {
            "[←/→] Section [↑/↓] Select [S] Sell [X] Remove [R] Refresh [P] Timer [Q] Quit"
        }
        _ => "[←/→] Section [↑/↓] Select [R] Refresh [Shift+R] Refresh all [P] Timer [Q] Quit",
    }
}

pub fn render_footer(f: &mut Frame, area: Rect, state: &DashboardState) {
    let (footer_text, footer_color) = match &state.prompt {
        Some(prompt) => (
            format!("{}: {}_   [Enter] Submit [Esc] Cancel", prompt.label(), prompt.input),
            Color::LightYellow,
        ),
        None => match &state.status {
            Some(status) => (
                format!("{}  |  {}", status, key_help(state.current_section())),
                Color::Cyan,
            ),
            None => (key_help(state.current_section()).to_string(), Color::Cyan),
        },
    };

    let footer = Paragraph::new(footer_text)
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(footer_color)
                .add_modifier(Modifier::BOLD),
        )
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_type(BorderType::Thick),
        );
    f.render_widget(footer, area);
}
