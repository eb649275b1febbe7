//! Response payloads of the portfolio server.
//!
//! Every numeric display field is an `Option<f64>`: numbers, numeric strings
//! and nulls are accepted, and anything non-finite becomes `None` so it is
//! shown as `N/A` and never used in further arithmetic.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Radar chart fallback when the server omits `beta`.
pub const DEFAULT_BETA: f64 = 1.0;
/// Radar chart fallback when the server omits `correlation`.
pub const DEFAULT_CORRELATION: f64 = 0.8;

fn finite_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        // Market quotes arrive as text, sometimes with a trailing `%`.
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

fn finite<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(finite_number))
}

fn finite_series<'de, D>(deserializer: D) -> Result<Vec<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<Value>::deserialize(deserializer)?;
    Ok(values.iter().map(finite_number).collect())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    #[default]
    #[serde(other)]
    Low,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: String,
    pub action: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "finite")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
}

impl Recommendation {
    /// Buy and sell recommendations on a symbol can be previewed and acted on.
    pub fn is_tradable(&self) -> bool {
        self.symbol.is_some() && matches!(self.kind.as_str(), "buy" | "sell")
    }
}

/// Portfolio-wide part of the risk analysis.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RiskSummary {
    #[serde(default, deserialize_with = "finite")]
    pub volatility: Option<f64>,
    #[serde(default, deserialize_with = "finite")]
    pub sharpe_ratio: Option<f64>,
    #[serde(default, deserialize_with = "finite")]
    pub diversification_score: Option<f64>,
    #[serde(default, deserialize_with = "finite")]
    pub beta: Option<f64>,
    #[serde(default, deserialize_with = "finite")]
    pub correlation: Option<f64>,
}

impl RiskSummary {
    pub fn beta(&self) -> f64 {
        self.beta.unwrap_or(DEFAULT_BETA)
    }

    pub fn correlation(&self) -> f64 {
        self.correlation.unwrap_or(DEFAULT_CORRELATION)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StockRisk {
    #[serde(default, deserialize_with = "finite")]
    pub volatility: Option<f64>,
    pub risk_level: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Forecast {
    pub dates: Vec<String>,
    #[serde(deserialize_with = "finite_series")]
    pub historical_prices: Vec<Option<f64>>,
    #[serde(default)]
    pub forecast_dates: Vec<String>,
    #[serde(default, deserialize_with = "finite_series")]
    pub forecast_prices: Vec<Option<f64>>,
    #[serde(default, deserialize_with = "finite")]
    pub predicted_return: Option<f64>,
    #[serde(default, deserialize_with = "finite")]
    pub current_price: Option<f64>,
    #[serde(default, deserialize_with = "finite")]
    pub target_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoricalPoint {
    pub date: String,
    #[serde(default, deserialize_with = "finite")]
    pub value: Option<f64>,
    #[serde(default, deserialize_with = "finite")]
    pub return_percentage: Option<f64>,
}

/// Portfolio-wide part of the performance document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PerformanceSummary {
    #[serde(default, deserialize_with = "finite")]
    pub total_value: Option<f64>,
    #[serde(default, deserialize_with = "finite")]
    pub total_return: Option<f64>,
    #[serde(default, deserialize_with = "finite")]
    pub total_return_percentage: Option<f64>,
    #[serde(default)]
    pub historical_data: Vec<HistoricalPoint>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Holding {
    pub symbol: String,
    #[serde(default, deserialize_with = "finite")]
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "finite")]
    pub purchase_price: Option<f64>,
    #[serde(default, deserialize_with = "finite")]
    pub current_price: Option<f64>,
    #[serde(default, deserialize_with = "finite")]
    pub current_value: Option<f64>,
    #[serde(default, deserialize_with = "finite")]
    pub gain_loss: Option<f64>,
    #[serde(default, deserialize_with = "finite")]
    pub gain_loss_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewsEntry {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RiskSnapshot {
    #[serde(default, deserialize_with = "finite")]
    pub volatility: Option<f64>,
    #[serde(default, deserialize_with = "finite")]
    pub diversification: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AllocationWeight {
    pub symbol: String,
    #[serde(default, deserialize_with = "finite")]
    pub weight: Option<f64>,
}

/// What a recommendation would do to the portfolio if followed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImpactAnalysis {
    #[serde(default, deserialize_with = "finite")]
    pub current_value: Option<f64>,
    #[serde(default, deserialize_with = "finite")]
    pub projected_value: Option<f64>,
    #[serde(default)]
    pub current_risk: RiskSnapshot,
    #[serde(default)]
    pub projected_risk: RiskSnapshot,
    #[serde(default)]
    pub projected_allocation: Vec<AllocationWeight>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HoldingQuantity {
    #[serde(default, deserialize_with = "finite")]
    pub quantity: Option<f64>,
}

/// Response of `holdings?symbol=`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HoldingLookup {
    #[serde(default)]
    pub holding: Option<HoldingQuantity>,
    #[serde(default)]
    pub error: Option<String>,
}

impl HoldingLookup {
    /// Quantity currently held, `None` when unknown or not held.
    pub fn quantity(&self) -> Option<f64> {
        self.holding.as_ref().and_then(|h| h.quantity)
    }
}

/// `historical_performance`: recorded portfolio values, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PortfolioHistory {
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default, deserialize_with = "finite_series")]
    pub values: Vec<Option<f64>>,
    /// Percent return of each value against the first one.
    #[serde(default, deserialize_with = "finite_series")]
    pub returns: Vec<Option<f64>>,
    #[serde(default, deserialize_with = "finite")]
    pub current_value: Option<f64>,
    #[serde(default, deserialize_with = "finite")]
    pub total_return: Option<f64>,
}

/// Quote of a market index. Every number may be `"N/A"`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IndexQuote {
    #[serde(default, deserialize_with = "finite")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "finite")]
    pub change: Option<f64>,
    #[serde(default, rename = "changePercent", deserialize_with = "finite")]
    pub change_percent: Option<f64>,
}

/// One of the top gainers, losers or most active stocks.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Mover {
    pub symbol: String,
    #[serde(default, deserialize_with = "finite")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "finite")]
    pub change: Option<f64>,
    #[serde(default, rename = "changePercent", deserialize_with = "finite")]
    pub change_percent: Option<f64>,
    #[serde(default, deserialize_with = "finite")]
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Preferences {
    pub risk_tolerance: String,
    pub default_chart_period: String,
    pub enable_notifications: bool,
    pub investment_goal: String,
    pub time_horizon: String,
    pub preferred_sectors: String,
    pub preferred_assets: String,
    pub tax_consideration: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            risk_tolerance: "Moderate".to_string(),
            default_chart_period: "1y".to_string(),
            enable_notifications: false,
            investment_goal: "Growth".to_string(),
            time_horizon: "Long-term".to_string(),
            preferred_sectors: String::new(),
            preferred_assets: String::new(),
            tax_consideration: false,
        }
    }
}
