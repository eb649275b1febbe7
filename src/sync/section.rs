//! Screen sections and their per-section lifecycle state.

use crate::logging::LogLevel;
use crate::network::endpoint::{Endpoint, endpoints};
use crate::sync::interactions::InteractionCategory;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A named screen region with its own fetch and render lifecycle.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Section {
    Recommendations,
    Risk,
    Forecasts,
    Performance,
    History,
    News,
    Market,
    Movers,
}

impl Section {
    pub const ALL: [Section; 8] = [
        Section::Recommendations,
        Section::Risk,
        Section::Forecasts,
        Section::Performance,
        Section::History,
        Section::News,
        Section::Market,
        Section::Movers,
    ];

    /// Stable string key.
    pub fn key(&self) -> &'static str {
        match self {
            Section::Recommendations => "recommendations",
            Section::Risk => "risk",
            Section::Forecasts => "forecasts",
            Section::Performance => "performance",
            Section::History => "history",
            Section::News => "news",
            Section::Market => "market",
            Section::Movers => "movers",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Section::Recommendations => "Recommendations",
            Section::Risk => "Risk",
            Section::Forecasts => "Forecasts",
            Section::Performance => "Performance",
            Section::History => "History",
            Section::News => "News",
            Section::Market => "Market",
            Section::Movers => "Movers",
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        match self {
            Section::Recommendations => endpoints::ENHANCED_RECOMMENDATIONS,
            Section::Risk => endpoints::RISK_ANALYSIS,
            Section::Forecasts => endpoints::FORECASTS,
            Section::Performance => endpoints::PERFORMANCE,
            Section::History => endpoints::HISTORICAL_PERFORMANCE,
            Section::News => endpoints::NEWS,
            Section::Market => endpoints::MARKET_INDICES,
            Section::Movers => endpoints::MARKET_MOVERS,
        }
    }

    pub fn empty_message(&self) -> &'static str {
        match self {
            Section::Recommendations => "No recommendations available at this time",
            Section::Risk => "No risk data available",
            Section::Forecasts => "No forecast data available",
            Section::Performance => "No holdings in your portfolio yet",
            Section::History => "No portfolio history recorded yet",
            Section::News => "No news available for your holdings",
            Section::Market => "No index quotes available",
            Section::Movers => "No market movers available",
        }
    }

    pub fn error_message(&self) -> &'static str {
        match self {
            Section::Recommendations => "Failed to load recommendations. Please try again later.",
            Section::Risk => "Failed to load risk analysis. Please try again later.",
            Section::Forecasts => "Failed to load forecasts. Please try again later.",
            Section::Performance => "Failed to load performance data. Please try again later.",
            Section::History => "Failed to load portfolio history. Please try again later.",
            Section::News => "Failed to load news. Please try again later.",
            Section::Market => "Failed to load market indices. Please try again later.",
            Section::Movers => "Failed to fetch market movers. Please try again later.",
        }
    }

    pub fn loading_message(&self) -> String {
        format!("Loading {}...", self.key())
    }

    /// Interaction categories that widgets of this section take part in.
    pub fn interaction_categories(&self) -> &'static [InteractionCategory] {
        match self {
            Section::Recommendations => &[
                InteractionCategory::TradeActions,
                InteractionCategory::ImpactToggle,
                InteractionCategory::Feedback,
            ],
            Section::Performance => &[InteractionCategory::HoldingActions],
            Section::Risk
            | Section::Forecasts
            | Section::History
            | Section::News
            | Section::Market
            | Section::Movers => &[],
        }
    }

    pub fn next(&self) -> Section {
        let index = Section::ALL.iter().position(|s| s == self).unwrap_or(0);
        Section::ALL[(index + 1) % Section::ALL.len()]
    }

    pub fn previous(&self) -> Section {
        let index = Section::ALL.iter().position(|s| s == self).unwrap_or(0);
        Section::ALL[(index + Section::ALL.len() - 1) % Section::ALL.len()]
    }
}

/// `Idle -> Loading -> {Populated, Empty, Error}`; any state goes back to
/// `Loading` on the next refresh.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SectionState {
    #[default]
    Idle,
    Loading {
        request_id: u64,
    },
    Populated {
        rendered: usize,
        skipped: usize,
    },
    Empty {
        message: String,
    },
    Error {
        message: String,
        detail: String,
    },
}

impl SectionState {
    pub fn label(&self) -> &'static str {
        match self {
            SectionState::Idle => "idle",
            SectionState::Loading { .. } => "loading",
            SectionState::Populated { .. } => "populated",
            SectionState::Empty { .. } => "empty",
            SectionState::Error { .. } => "error",
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SectionState::Loading { .. })
    }
}

/// Inline message shown above a section, e.g. the outcome of a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct SectionSlot {
    pub state: SectionState,
    /// Id of the newest refresh started for this section.
    pub latest_request: u64,
    pub notice: Option<Notice>,
    pub last_updated: Option<DateTime<Local>>,
}

/// Identifies one refresh of one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    pub section: Section,
    pub request_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// A newer refresh of the same section started after this one.
    Stale,
}
