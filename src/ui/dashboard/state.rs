//! Dashboard state management
//!
//! Contains the main dashboard state struct. Section contents live in the
//! [`Renderer`](crate::sync::Renderer); this only tracks what the user is
//! looking at.

use super::prompt::Prompt;
use crate::consts::cli_consts::MAX_ACTIVITY_LOGS;
use crate::environment::Environment;
use crate::events::Event;
use crate::sync::Section;
use crate::ui::app::UIConfig;

use std::collections::VecDeque;
use std::time::Instant;

/// Counters shown in the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityStats {
    pub refreshes: usize,
    pub writes: usize,
    pub errors: usize,
}

#[derive(Debug)]
pub struct DashboardState {
    pub environment: Environment,
    pub server_url: String,
    /// The start time of the application, used for computing uptime.
    pub start_time: Instant,
    /// Tabs, in order.
    pub sections: Vec<Section>,
    /// Index into `sections`.
    pub current: usize,
    /// Index of the selected widget in the current section.
    pub selected: usize,
    /// Queue of events waiting to be processed
    pub pending_events: VecDeque<Event>,
    /// Activity logs for display (bounded by `MAX_ACTIVITY_LOGS`)
    pub activity_logs: VecDeque<Event>,
    pub stats: ActivityStats,
    /// Open input prompt, if any. Keys go to it while it is open.
    pub prompt: Option<Prompt>,
    /// One-line feedback for the last key press.
    pub status: Option<String>,
    pub with_background_color: bool,
    /// Animation tick counter
    pub tick: usize,
}

impl DashboardState {
    pub fn new(
        environment: Environment,
        server_url: String,
        sections: Vec<Section>,
        start_time: Instant,
        ui_config: UIConfig,
    ) -> Self {
        let sections = if sections.is_empty() {
            Section::ALL.to_vec()
        } else {
            sections
        };
        Self {
            environment,
            server_url,
            start_time,
            sections,
            current: 0,
            selected: 0,
            pending_events: VecDeque::new(),
            activity_logs: VecDeque::new(),
            stats: ActivityStats::default(),
            prompt: None,
            status: None,
            with_background_color: ui_config.with_background_color,
            tick: 0,
        }
    }

    pub fn current_section(&self) -> Section {
        self.sections[self.current % self.sections.len()]
    }

    /// Add an event to activity logs with size limit
    pub fn add_to_activity_log(&mut self, event: Event) {
        if self.activity_logs.len() >= MAX_ACTIVITY_LOGS {
            self.activity_logs.pop_front();
        }
        self.activity_logs.push_back(event);
    }

    /// Add an event to the processing queue
    pub fn add_event(&mut self, event: Event) {
        self.pending_events.push_back(event);
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }
}
