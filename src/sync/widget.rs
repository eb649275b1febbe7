//! Rendered widgets.
//!
//! A widget is the stateful view of one item: a chart, a table row, a card or
//! a collapsible panel. Widgets are owned by the registry and disposed
//! exactly once when replaced or cleared.

use crate::sync::section::Section;
use chrono::{DateTime, Local};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum WidgetKind {
    Chart,
    TableRow,
    Card,
    Panel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    Positive,
    Negative,
    Warning,
    #[default]
    Neutral,
}

impl Tone {
    /// Tone of a signed change; `None` and zero are neutral.
    pub fn of_change(value: Option<f64>) -> Self {
        match value {
            Some(v) if v > 0.0 => Tone::Positive,
            Some(v) if v < 0.0 => Tone::Negative,
            _ => Tone::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartStyle {
    Line,
    Radar,
    Bar,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    /// One point per label; gaps are `None`.
    pub points: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub style: ChartStyle,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
    pub captions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub text: String,
    pub tone: Tone,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Neutral,
        }
    }

    pub fn toned(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardSpec {
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub badges: Vec<String>,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelSpec {
    pub title: String,
    pub rows: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetBody {
    Chart(ChartSpec),
    Row(Vec<Cell>),
    Card(CardSpec),
    Panel(PanelSpec),
}

impl WidgetBody {
    pub fn kind(&self) -> WidgetKind {
        match self {
            WidgetBody::Chart(_) => WidgetKind::Chart,
            WidgetBody::Row(_) => WidgetKind::TableRow,
            WidgetBody::Card(_) => WidgetKind::Card,
            WidgetBody::Panel(_) => WidgetKind::Panel,
        }
    }
}

/// The recommendation a widget was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationRef {
    pub kind: String,
    pub action: String,
    /// A buy or sell on a symbol; only these can be traded or previewed.
    pub tradable: bool,
}

/// What an interaction on a widget acts on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Target {
    pub symbol: Option<String>,
    pub recommendation: Option<RecommendationRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub id: String,
    pub kind: WidgetKind,
    pub owner_section: Section,
    pub rendered_at: DateTime<Local>,
    /// Render order inside the registry, assigned on `put`.
    pub sequence: u64,
    pub target: Target,
    pub body: WidgetBody,
}

impl Widget {
    pub fn new(section: Section, id: impl Into<String>, body: WidgetBody) -> Self {
        Self {
            id: id.into(),
            kind: body.kind(),
            owner_section: section,
            rendered_at: Local::now(),
            sequence: 0,
            target: Target::default(),
            body,
        }
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    /// Releases the widget. Consuming `self` makes a second dispose impossible.
    pub(crate) fn dispose(self) {
        log::trace!("disposed {} {}/{}", self.kind, self.owner_section, self.id);
    }
}

impl fmt::Display for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            WidgetBody::Chart(chart) => write!(f, "[chart] {}", chart.title),
            WidgetBody::Row(cells) => {
                let texts: Vec<&str> = cells.iter().map(|c| c.text.as_str()).collect();
                write!(f, "{}", texts.join(" | "))
            }
            WidgetBody::Card(card) => write!(f, "{} ({})", card.title, card.subtitle),
            WidgetBody::Panel(panel) => write!(f, "[panel] {}", panel.title),
        }
    }
}
