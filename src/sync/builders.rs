//! Item to widget construction, one builder per section.
//!
//! Builders are pure: a malformed item yields an [`ItemRenderError`] for that
//! item alone and never affects its siblings.

use crate::network::endpoint::SUMMARY_KEY;
use crate::network::fetcher::Item;
use crate::portfolio::payloads::{
    Forecast, Holding, ImpactAnalysis, IndexQuote, Mover, NewsEntry, PerformanceSummary,
    PortfolioHistory, Priority, Recommendation, RiskSummary, StockRisk,
};
use crate::sync::format;
use crate::sync::section::Section;
use crate::sync::widget::{
    CardSpec, Cell, ChartSpec, ChartStyle, PanelSpec, RecommendationRef, Series, Target, Tone,
    Widget, WidgetBody,
};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemRenderError {
    /// The payload does not have the expected shape.
    #[error("{key}: malformed payload ({reason})")]
    Malformed { key: String, reason: String },

    /// A required sub-field is present but unusable, e.g. an empty series.
    #[error("{key}: missing {field}")]
    Incomplete { key: String, field: &'static str },
}

impl ItemRenderError {
    pub fn key(&self) -> &str {
        match self {
            ItemRenderError::Malformed { key, .. } | ItemRenderError::Incomplete { key, .. } => key,
        }
    }
}

fn parse<T: DeserializeOwned>(item: &Item) -> Result<T, ItemRenderError> {
    serde_json::from_value(item.payload.clone()).map_err(|e| ItemRenderError::Malformed {
        key: item.key.clone(),
        reason: e.to_string(),
    })
}

/// Id of the impact panel attached to a recommendation widget.
pub fn impact_panel_id(recommendation_id: &str) -> String {
    format!("{}/impact", recommendation_id)
}

pub fn build_widget(section: Section, item: &Item) -> Result<Widget, ItemRenderError> {
    match section {
        Section::Recommendations => recommendation_card(item),
        Section::Risk if item.key == SUMMARY_KEY => risk_radar(item),
        Section::Risk => stock_risk_row(item),
        Section::Forecasts => forecast_chart(item),
        Section::Performance if item.key == SUMMARY_KEY => performance_chart(item),
        Section::Performance => holding_row(item),
        Section::History => history_chart(item),
        Section::News => news_card(item),
        Section::Market => index_row(item),
        Section::Movers => mover_row(item),
    }
}

fn recommendation_card(item: &Item) -> Result<Widget, ItemRenderError> {
    let rec: Recommendation = parse(item)?;
    if rec.kind.trim().is_empty() {
        return Err(ItemRenderError::Incomplete {
            key: item.key.clone(),
            field: "type",
        });
    }
    if rec.action.trim().is_empty() {
        return Err(ItemRenderError::Incomplete {
            key: item.key.clone(),
            field: "action",
        });
    }

    let target_name = rec
        .symbol
        .clone()
        .or_else(|| rec.sector.clone())
        .unwrap_or_else(|| "portfolio".to_string());
    let mut badges = vec![format!("{} priority", rec.priority)];
    if let Some(confidence) = rec.confidence {
        badges.push(format!("{} confidence", format::fraction_percent(Some(confidence))));
    }
    let tone = match rec.kind.as_str() {
        "buy" => Tone::Positive,
        "sell" => Tone::Negative,
        _ if rec.priority == Priority::High => Tone::Warning,
        _ => Tone::Neutral,
    };

    let card = CardSpec {
        title: rec.action.clone(),
        subtitle: format!("{} · {}", rec.kind, target_name),
        body: rec.reasoning.clone(),
        badges,
        tone,
    };
    let tradable = rec.is_tradable();
    Ok(
        Widget::new(Section::Recommendations, &item.key, WidgetBody::Card(card)).with_target(
            Target {
                symbol: rec.symbol.clone(),
                recommendation: Some(RecommendationRef {
                    kind: rec.kind,
                    action: rec.action,
                    tradable,
                }),
            },
        ),
    )
}

fn risk_radar(item: &Item) -> Result<Widget, ItemRenderError> {
    let summary: RiskSummary = parse(item)?;
    let labels = ["Volatility", "Sharpe Ratio", "Diversification", "Beta", "Correlation"];
    let points = vec![
        summary.volatility,
        summary.sharpe_ratio,
        summary.diversification_score,
        Some(summary.beta()),
        Some(summary.correlation()),
    ];
    let chart = ChartSpec {
        title: "Portfolio Risk Profile".to_string(),
        style: ChartStyle::Radar,
        labels: labels.iter().map(|l| l.to_string()).collect(),
        series: vec![Series {
            name: "Your Portfolio".to_string(),
            points,
        }],
        captions: vec![
            format!("Volatility {}", format::fraction_percent(summary.volatility)),
            format!("Sharpe {}", format::decimal(summary.sharpe_ratio, 2)),
            format!(
                "Diversification {}",
                format::fraction_percent(summary.diversification_score)
            ),
            format!("Beta {:.2}", summary.beta()),
            format!("Correlation {:.2}", summary.correlation()),
        ],
    };
    Ok(Widget::new(Section::Risk, &item.key, WidgetBody::Chart(chart)))
}

fn stock_risk_row(item: &Item) -> Result<Widget, ItemRenderError> {
    let risk: StockRisk = parse(item)?;
    let tone = match risk.risk_level.to_lowercase().as_str() {
        "high" => Tone::Negative,
        "medium" => Tone::Warning,
        "low" => Tone::Positive,
        _ => Tone::Neutral,
    };
    let cells = vec![
        Cell::plain(item.key.clone()),
        Cell::plain(format::fraction_percent(risk.volatility)),
        Cell::toned(risk.risk_level, tone),
    ];
    Ok(Widget::new(Section::Risk, &item.key, WidgetBody::Row(cells)).with_target(Target {
        symbol: Some(item.key.clone()),
        recommendation: None,
    }))
}

fn forecast_chart(item: &Item) -> Result<Widget, ItemRenderError> {
    let forecast: Forecast = parse(item)?;
    if forecast.dates.is_empty() {
        return Err(ItemRenderError::Incomplete {
            key: item.key.clone(),
            field: "dates",
        });
    }
    if forecast.historical_prices.len() != forecast.dates.len() {
        return Err(ItemRenderError::Malformed {
            key: item.key.clone(),
            reason: format!(
                "{} dates but {} historical prices",
                forecast.dates.len(),
                forecast.historical_prices.len()
            ),
        });
    }
    if forecast.forecast_prices.len() != forecast.forecast_dates.len() {
        return Err(ItemRenderError::Malformed {
            key: item.key.clone(),
            reason: format!(
                "{} forecast dates but {} forecast prices",
                forecast.forecast_dates.len(),
                forecast.forecast_prices.len()
            ),
        });
    }

    let history_len = forecast.dates.len();
    let future_len = forecast.forecast_dates.len();
    let mut labels = forecast.dates.clone();
    labels.extend(forecast.forecast_dates.iter().cloned());

    let mut historical = forecast.historical_prices.clone();
    historical.resize(history_len + future_len, None);

    // The projection starts from the last known price so the two lines join.
    let mut projected = vec![None; history_len];
    if future_len > 0 {
        projected[history_len - 1] = forecast.historical_prices[history_len - 1];
    }
    projected.extend(forecast.forecast_prices.iter().copied());

    let chart = ChartSpec {
        title: format!("{} Price Forecast", item.key),
        style: ChartStyle::Line,
        labels,
        series: vec![
            Series {
                name: "Historical".to_string(),
                points: historical,
            },
            Series {
                name: "Forecast".to_string(),
                points: projected,
            },
        ],
        captions: vec![
            format!("Current {}", format::money(forecast.current_price)),
            format!("Target {}", format::money(forecast.target_price)),
            format!(
                "Predicted return {}",
                format::signed_percent(forecast.predicted_return)
            ),
        ],
    };
    Ok(
        Widget::new(Section::Forecasts, &item.key, WidgetBody::Chart(chart)).with_target(Target {
            symbol: Some(item.key.clone()),
            recommendation: None,
        }),
    )
}

fn performance_chart(item: &Item) -> Result<Widget, ItemRenderError> {
    let summary: PerformanceSummary = parse(item)?;
    let chart = ChartSpec {
        title: "Portfolio Value".to_string(),
        style: ChartStyle::Line,
        labels: summary
            .historical_data
            .iter()
            .map(|p| p.date.clone())
            .collect(),
        series: vec![Series {
            name: "Value".to_string(),
            points: summary.historical_data.iter().map(|p| p.value).collect(),
        }],
        captions: vec![
            format!("Total value {}", format::money(summary.total_value)),
            format!("Total return {}", format::money(summary.total_return)),
            format!(
                "Return {}",
                format::signed_percent(summary.total_return_percentage)
            ),
        ],
    };
    Ok(Widget::new(
        Section::Performance,
        &item.key,
        WidgetBody::Chart(chart),
    ))
}

fn holding_row(item: &Item) -> Result<Widget, ItemRenderError> {
    let holding: Holding = parse(item)?;
    let symbol = holding.symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(ItemRenderError::Incomplete {
            key: item.key.clone(),
            field: "symbol",
        });
    }
    let tone = Tone::of_change(holding.gain_loss);
    let cells = vec![
        Cell::plain(symbol.clone()),
        Cell::plain(format::quantity(holding.quantity)),
        Cell::plain(format::money(holding.purchase_price)),
        Cell::plain(format::money(holding.current_price)),
        Cell::plain(format::money(holding.current_value)),
        Cell::toned(format::money(holding.gain_loss), tone),
        Cell::toned(format::signed_percent(holding.gain_loss_percentage), tone),
    ];
    Ok(
        Widget::new(Section::Performance, &item.key, WidgetBody::Row(cells)).with_target(Target {
            symbol: Some(symbol),
            recommendation: None,
        }),
    )
}

fn history_chart(item: &Item) -> Result<Widget, ItemRenderError> {
    let history: PortfolioHistory = parse(item)?;
    if history.dates.is_empty() {
        return Err(ItemRenderError::Incomplete {
            key: item.key.clone(),
            field: "dates",
        });
    }
    if history.values.len() != history.dates.len() {
        return Err(ItemRenderError::Malformed {
            key: item.key.clone(),
            reason: format!(
                "{} dates but {} values",
                history.dates.len(),
                history.values.len()
            ),
        });
    }
    let chart = ChartSpec {
        title: "Portfolio History".to_string(),
        style: ChartStyle::Line,
        labels: history.dates,
        series: vec![Series {
            name: "Value".to_string(),
            points: history.values,
        }],
        captions: vec![
            format!("Current value {}", format::money(history.current_value)),
            format!("Total return {}", format::signed_percent(history.total_return)),
            format!(
                "Latest return {}",
                format::signed_percent(history.returns.last().copied().flatten())
            ),
        ],
    };
    Ok(Widget::new(
        Section::History,
        &item.key,
        WidgetBody::Chart(chart),
    ))
}

fn index_name(key: &str) -> &str {
    match key {
        "sp500" => "S&P 500",
        "nasdaq" => "NASDAQ",
        "dow" => "Dow Jones",
        other => other,
    }
}

fn index_row(item: &Item) -> Result<Widget, ItemRenderError> {
    let quote: IndexQuote = parse(item)?;
    let tone = Tone::of_change(quote.change);
    let cells = vec![
        Cell::plain(index_name(&item.key)),
        Cell::plain(format::decimal(quote.price, 2)),
        Cell::toned(format::signed_decimal(quote.change), tone),
        Cell::toned(format::signed_percent(quote.change_percent), tone),
    ];
    Ok(Widget::new(Section::Market, &item.key, WidgetBody::Row(cells)))
}

fn mover_row(item: &Item) -> Result<Widget, ItemRenderError> {
    let mover: Mover = parse(item)?;
    let symbol = mover.symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(ItemRenderError::Incomplete {
            key: item.key.clone(),
            field: "symbol",
        });
    }
    let group = match item.key.split_once('/').map(|(group, _)| group) {
        Some("gainers") => "gainer",
        Some("losers") => "loser",
        _ => "active",
    };
    let tone = Tone::of_change(mover.change);
    let cells = vec![
        Cell::plain(group),
        Cell::plain(symbol.clone()),
        Cell::plain(format::decimal(mover.price, 2)),
        Cell::toned(format::signed_decimal(mover.change), tone),
        Cell::toned(format::signed_percent(mover.change_percent), tone),
        Cell::plain(format::count(mover.volume)),
    ];
    Ok(
        Widget::new(Section::Movers, &item.key, WidgetBody::Row(cells)).with_target(Target {
            symbol: Some(symbol),
            recommendation: None,
        }),
    )
}

/// Quantity shown by a holding row, used to cap sells.
pub fn held_quantity(item: &Item) -> Option<(String, f64)> {
    let holding: Holding = serde_json::from_value(item.payload.clone()).ok()?;
    Some((holding.symbol.trim().to_uppercase(), holding.quantity?))
}

fn news_card(item: &Item) -> Result<Widget, ItemRenderError> {
    let entry: NewsEntry = parse(item)?;
    if entry.title.trim().is_empty() {
        return Err(ItemRenderError::Incomplete {
            key: item.key.clone(),
            field: "title",
        });
    }
    let sentiment = entry.sentiment.clone().unwrap_or_else(|| "neutral".to_string());
    let tone = match sentiment.as_str() {
        "bullish" | "somewhat-bullish" => Tone::Positive,
        "bearish" | "somewhat-bearish" => Tone::Negative,
        _ => Tone::Neutral,
    };
    let mut badges = vec![sentiment];
    if let Some(symbol) = &entry.symbol {
        badges.push(symbol.clone());
    }
    let card = CardSpec {
        title: entry.title,
        subtitle: [entry.source, entry.published_at]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" · "),
        body: entry.summary,
        badges,
        tone,
    };
    Ok(
        Widget::new(Section::News, &item.key, WidgetBody::Card(card)).with_target(Target {
            symbol: entry.symbol,
            recommendation: None,
        }),
    )
}

/// Collapsible panel with the projected effect of following a recommendation.
pub fn impact_panel(recommendation_id: &str, impact: &ImpactAnalysis) -> Widget {
    let mut rows = vec![
        (
            "Portfolio value".to_string(),
            format!(
                "{} -> {}",
                format::money(impact.current_value),
                format::money(impact.projected_value)
            ),
        ),
        (
            "Volatility".to_string(),
            format!(
                "{} -> {}",
                format::fraction_percent(impact.current_risk.volatility),
                format::fraction_percent(impact.projected_risk.volatility)
            ),
        ),
        (
            "Diversification".to_string(),
            format!(
                "{} -> {}",
                format::decimal(impact.current_risk.diversification, 2),
                format::decimal(impact.projected_risk.diversification, 2)
            ),
        ),
    ];
    rows.extend(impact.projected_allocation.iter().map(|weight| {
        (
            format!("  {}", weight.symbol),
            format::fraction_percent(weight.weight),
        )
    }));
    Widget::new(
        Section::Recommendations,
        impact_panel_id(recommendation_id),
        WidgetBody::Panel(PanelSpec {
            title: "Impact Analysis".to_string(),
            rows,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::widget::WidgetKind;
    use serde_json::json;

    #[test]
    fn test_forecast_without_dates_is_skipped_not_fatal() {
        let valid = Item::new(
            "AAPL",
            json!({
                "dates": ["2024-01-01", "2024-01-02"],
                "historical_prices": [180.0, 182.5],
                "forecast_dates": ["2024-01-03"],
                "forecast_prices": [184.0],
                "predicted_return": 1.2,
                "current_price": 182.5,
                "target_price": 184.0,
            }),
        );
        let missing_dates = Item::new("MSFT", json!({"historical_prices": [400.0]}));
        let empty_dates = Item::new("NVDA", json!({"dates": [], "historical_prices": []}));

        let widget = build_widget(Section::Forecasts, &valid).unwrap();
        assert_eq!(widget.kind, WidgetKind::Chart);
        assert!(matches!(
            build_widget(Section::Forecasts, &missing_dates),
            Err(ItemRenderError::Malformed { .. })
        ));
        assert_eq!(
            build_widget(Section::Forecasts, &empty_dates),
            Err(ItemRenderError::Incomplete {
                key: "NVDA".to_string(),
                field: "dates",
            })
        );
    }

    #[test]
    fn test_forecast_line_joins_history_and_projection() {
        let item = Item::new(
            "AAPL",
            json!({
                "dates": ["d1", "d2"],
                "historical_prices": [1.0, 2.0],
                "forecast_dates": ["d3"],
                "forecast_prices": [3.0],
            }),
        );
        let widget = build_widget(Section::Forecasts, &item).unwrap();
        let WidgetBody::Chart(chart) = widget.body else {
            panic!("expected chart");
        };
        assert_eq!(chart.labels, ["d1", "d2", "d3"]);
        assert_eq!(chart.series[0].points, [Some(1.0), Some(2.0), None]);
        assert_eq!(chart.series[1].points, [None, Some(2.0), Some(3.0)]);
        assert!(chart.captions.contains(&"Target N/A".to_string()));
    }

    #[test]
    fn test_risk_radar_uses_defaults_for_missing_beta_and_correlation() {
        let item = Item::new(SUMMARY_KEY, json!({"volatility": 0.2, "sharpe_ratio": null}));
        let widget = build_widget(Section::Risk, &item).unwrap();
        let WidgetBody::Chart(chart) = widget.body else {
            panic!("expected chart");
        };
        assert_eq!(chart.style, ChartStyle::Radar);
        assert_eq!(
            chart.series[0].points,
            [Some(0.2), None, None, Some(1.0), Some(0.8)]
        );
        assert!(chart.captions.contains(&"Sharpe N/A".to_string()));
    }

    #[test]
    fn test_holding_row_shows_na_for_missing_numbers() {
        let item = Item::new("AAPL", json!({"symbol": "aapl", "quantity": 3, "gain_loss": "NaN"}));
        let widget = build_widget(Section::Performance, &item).unwrap();
        assert_eq!(widget.kind, WidgetKind::TableRow);
        assert_eq!(widget.target.symbol.as_deref(), Some("AAPL"));
        assert_eq!(widget.to_string(), "AAPL | 3 | N/A | N/A | N/A | N/A | N/A");
        assert_eq!(held_quantity(&item), Some(("AAPL".to_string(), 3.0)));
    }

    #[test]
    fn test_recommendation_card_carries_its_target() {
        let item = Item::new(
            "buy-AAPL",
            json!({
                "type": "buy",
                "action": "Buy more AAPL",
                "reasoning": "Strong forecast",
                "priority": "high",
                "confidence": 0.85,
                "symbol": "AAPL",
            }),
        );
        let widget = build_widget(Section::Recommendations, &item).unwrap();
        assert_eq!(widget.kind, WidgetKind::Card);
        assert_eq!(
            widget.target.recommendation,
            Some(RecommendationRef {
                kind: "buy".to_string(),
                action: "Buy more AAPL".to_string(),
                tradable: true,
            })
        );
        let WidgetBody::Card(card) = widget.body else {
            panic!("expected card");
        };
        assert_eq!(card.badges, ["high priority", "85.00% confidence"]);
    }

    #[test]
    fn test_impact_panel_lists_allocation() {
        let impact: ImpactAnalysis = serde_json::from_value(json!({
            "current_value": 1000.0,
            "projected_value": 1100.0,
            "current_risk": {"volatility": 0.2, "diversification": 0.5},
            "projected_risk": {"volatility": 0.18},
            "projected_allocation": [{"symbol": "AAPL", "weight": 0.6}],
        }))
        .unwrap();
        let panel = impact_panel("buy-AAPL", &impact);
        assert_eq!(panel.id, "buy-AAPL/impact");
        assert_eq!(panel.kind, WidgetKind::Panel);
        let WidgetBody::Panel(spec) = panel.body else {
            panic!("expected panel");
        };
        assert_eq!(
            spec.rows[0],
            ("Portfolio value".to_string(), "$1,000.00 -> $1,100.00".to_string())
        );
        assert_eq!(spec.rows[2].1, "0.50 -> N/A");
        assert_eq!(spec.rows[3], ("  AAPL".to_string(), "60.00%".to_string()));
    }

    #[test]
    fn test_history_chart_plots_values_with_gaps() {
        let item = Item::new(
            SUMMARY_KEY,
            json!({
                "dates": ["2024-01-01", "2024-01-02", "2024-01-03"],
                "values": [1000.0, null, 1100.0],
                "returns": [0.0, null, 10.0],
                "current_value": 1100.0,
                "total_return": 10.0,
            }),
        );
        let widget = build_widget(Section::History, &item).unwrap();
        let WidgetBody::Chart(chart) = widget.body else {
            panic!("expected chart");
        };
        assert_eq!(chart.series[0].points, [Some(1000.0), None, Some(1100.0)]);
        assert_eq!(
            chart.captions,
            ["Current value $1,100.00", "Total return +10.00%", "Latest return +10.00%"]
        );

        let short = Item::new(SUMMARY_KEY, json!({"dates": ["2024-01-01"], "values": []}));
        assert!(matches!(
            build_widget(Section::History, &short),
            Err(ItemRenderError::Malformed { .. })
        ));
    }

    #[test]
    fn test_unavailable_index_quote_reads_not_available() {
        let item = Item::new("nasdaq", json!({"price": "N/A", "change": "N/A"}));
        let widget = build_widget(Section::Market, &item).unwrap();
        let WidgetBody::Row(cells) = widget.body else {
            panic!("expected row");
        };
        let texts: Vec<&str> = cells.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["NASDAQ", "N/A", "N/A", "N/A"]);
    }

    #[test]
    fn test_mover_row_names_its_group() {
        let item = Item::new(
            "losers/TSLA",
            json!({"symbol": "TSLA", "price": "100.00", "change": "-1.00",
                   "changePercent": "-1.00", "volume": 5000000}),
        );
        let widget = build_widget(Section::Movers, &item).unwrap();
        assert_eq!(widget.target.symbol.as_deref(), Some("TSLA"));
        let WidgetBody::Row(cells) = widget.body else {
            panic!("expected row");
        };
        assert_eq!(cells[0].text, "loser");
        assert_eq!(cells[3].tone, Tone::Negative);
        assert_eq!(cells[5].text, "5,000,000");
    }
}
