//! Dashboard state update logic
//!
//! Contains all methods for updating dashboard state from events and keys

use super::prompt::{Prompt, PromptKind};
use super::state::DashboardState;
use crate::events::{Event, EventType, Source};

impl DashboardState {
    /// Advances the tick, drains queued events and keeps the selection inside
    /// the current section's `widget_count`.
    pub fn update(&mut self, widget_count: usize) {
        self.tick += 1;

        while let Some(event) = self.pending_events.pop_front() {
            self.process_event(&event);
            self.add_to_activity_log(event);
        }

        self.clamp_selection(widget_count);
    }

    fn process_event(&mut self, event: &Event) {
        match (event.source, event.event_type) {
            (Source::Renderer, EventType::Success) => self.stats.refreshes += 1,
            (Source::Action, EventType::Success) => self.stats.writes += 1,
            (_, EventType::Error) => self.stats.errors += 1,
            _ => {}
        }
    }

    fn clamp_selection(&mut self, widget_count: usize) {
        if widget_count == 0 {
            self.selected = 0;
        } else if self.selected >= widget_count {
            self.selected = widget_count - 1;
        }
    }

    pub fn next_section(&mut self) {
        self.current = (self.current + 1) % self.sections.len();
        self.selected = 0;
        self.status = None;
    }

    pub fn previous_section(&mut self) {
        self.current = (self.current + self.sections.len() - 1) % self.sections.len();
        self.selected = 0;
        self.status = None;
    }

    pub fn select_next(&mut self, widget_count: usize) {
        if self.selected + 1 < widget_count {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn open_prompt(&mut self, kind: PromptKind) {
        self.prompt = Some(Prompt::new(self.current_section(), kind));
    }
}
