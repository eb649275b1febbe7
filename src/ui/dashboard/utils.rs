//! Dashboard utility functions
//!
//! Contains helper functions used across dashboard components

use crate::events::Source;
use crate::sync::widget::Tone;
use ratatui::prelude::Color;

/// Get a ratatui color for an event based on where it came from
pub fn get_source_color(source: &Source) -> Color {
    match source {
        Source::Fetcher => Color::Cyan,
        Source::Renderer => Color::Gray,
        Source::Action => Color::Green,
        Source::Scheduler => Color::DarkGray,
    }
}

pub fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Positive => Color::LightGreen,
        Tone::Negative => Color::LightRed,
        Tone::Warning => Color::LightYellow,
        Tone::Neutral => Color::White,
    }
}

/// Format compact timestamp with date and time from full timestamp
pub fn format_compact_timestamp(timestamp: &str) -> String {
    // "YYYY-MM-DD HH:MM:SS" -> "MM-DD HH:MM"
    let mut parts = timestamp.split(' ');
    if let (Some(date), Some(time)) = (parts.next(), parts.next()) {
        if let (Some(month_day), Some(hour_min)) = (date.get(5..10), time.get(0..5)) {
            return format!("{} {}", month_day, hour_min);
        }
    }
    timestamp.to_string()
}

/// `1h 02m 03s`
pub fn format_uptime(secs: u64) -> String {
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else {
        format!("{}m {:02}s", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_timestamp() {
        assert_eq!(format_compact_timestamp("2024-03-09 14:05:59"), "03-09 14:05");
        assert_eq!(format_compact_timestamp("garbage"), "garbage");
    }

    #[test]
    fn test_uptime() {
        assert_eq!(format_uptime(59), "0m 59s");
        assert_eq!(format_uptime(3723), "1h 02m 03s");
    }
}
