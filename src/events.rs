//! Event System
//!
//! Activity events emitted by the synchronization engine and consumed by the
//! dashboard activity log or the headless printer.

use crate::logging::{LogLevel, should_log_with_env};
use crate::sync::Section;
use chrono::Local;
use std::fmt::Display;
use tokio::sync::mpsc;

#[derive(Debug, Copy, Clone, Eq, PartialEq, strum::Display)]
pub enum Source {
    /// Network reads and writes.
    Fetcher,
    /// Section reconciliation and widget lifecycle.
    Renderer,
    /// User-triggered writes (buy, sell, feedback, settings).
    Action,
    /// Periodic and delayed refresh timers.
    Scheduler,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, strum::Display)]
pub enum EventType {
    Success,
    Error,
    Refresh,
    Waiting,
    StateChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub source: Source,
    pub section: Option<Section>,
    pub msg: String,
    pub timestamp: String,
    pub event_type: EventType,
    pub log_level: LogLevel,
}

impl Event {
    pub fn new(
        source: Source,
        section: Option<Section>,
        msg: String,
        event_type: EventType,
        log_level: LogLevel,
    ) -> Self {
        Self {
            source,
            section,
            msg,
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            event_type,
            log_level,
        }
    }

    pub fn should_display(&self) -> bool {
        if self.event_type == EventType::Success || self.log_level >= LogLevel::Info {
            return true;
        }
        should_log_with_env(self.log_level)
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.section {
            Some(section) => write!(
                f,
                "{} [{}] {}: {}",
                self.event_type, self.timestamp, section, self.msg
            ),
            None => write!(f, "{} [{}] {}", self.event_type, self.timestamp, self.msg),
        }
    }
}

/// Non-blocking event emitter shared by the engine components.
///
/// The renderer mutates state synchronously, so events are offered with
/// `try_send`; when the display falls behind, the newest events are dropped
/// rather than stalling a refresh.
#[derive(Clone, Debug)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Creates a sender together with its receiving end.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self::new(sender), receiver)
    }

    pub fn send_event(&self, event: Event) {
        log::log!(
            log::Level::from(event.log_level),
            "{}: {}",
            event.source,
            event.msg
        );
        let _ = self.sender.try_send(event);
    }

    pub fn section_event(
        &self,
        source: Source,
        section: Section,
        msg: String,
        event_type: EventType,
        log_level: LogLevel,
    ) {
        self.send_event(Event::new(source, Some(section), msg, event_type, log_level));
    }

    pub fn global_event(
        &self,
        source: Source,
        msg: String,
        event_type: EventType,
        log_level: LogLevel,
    ) {
        self.send_event(Event::new(source, None, msg, event_type, log_level));
    }
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::Level::Trace,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}
