//! Event delegation for widget interactions.
//!
//! Handlers are registered per category, not per widget, so re-rendering a
//! section never adds handlers. The renderer registers them behind the
//! registry's attach guard.

use crate::sync::registry::WidgetRegistry;
use crate::sync::section::Section;
use crate::sync::widget::Widget;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum InteractionCategory {
    /// Buy or sell from a recommendation.
    TradeActions,
    /// Expand or collapse a recommendation's impact panel.
    ImpactToggle,
    /// Rate a recommendation.
    Feedback,
    /// Sell or remove from a holding row.
    HoldingActions,
}

/// A user gesture on one widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub category: InteractionCategory,
    pub section: Section,
    pub widget_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// What the surface should do in answer to an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    PromptTrade {
        side: TradeSide,
        symbol: String,
    },
    ToggleImpact {
        widget_id: String,
    },
    PromptFeedback {
        recommendation_type: String,
        recommendation_action: String,
    },
}

pub type Handler = Box<dyn Fn(&Widget) -> Option<Command> + Send>;

#[derive(Default)]
pub struct InteractionRouter {
    handlers: HashMap<InteractionCategory, Vec<Handler>>,
    invocations: HashMap<InteractionCategory, usize>,
}

impl InteractionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, category: InteractionCategory, handler: Handler) {
        self.handlers.entry(category).or_default().push(handler);
    }

    /// Runs every handler of the interaction's category against its widget.
    pub fn dispatch(&mut self, interaction: &Interaction, registry: &WidgetRegistry) -> Vec<Command> {
        let Some(widget) = registry.get(interaction.section, &interaction.widget_id) else {
            log::debug!(
                "{} on missing widget {}/{}",
                interaction.category,
                interaction.section,
                interaction.widget_id
            );
            return Vec::new();
        };
        let Some(handlers) = self.handlers.get(&interaction.category) else {
            return Vec::new();
        };
        *self.invocations.entry(interaction.category).or_default() += handlers.len();
        handlers.iter().filter_map(|handler| handler(widget)).collect()
    }

    pub fn handler_count(&self, category: InteractionCategory) -> usize {
        self.handlers.get(&category).map_or(0, Vec::len)
    }

    /// Total handler invocations for `category` so far.
    pub fn invocations(&self, category: InteractionCategory) -> usize {
        self.invocations.get(&category).copied().unwrap_or(0)
    }
}

/// The stock handler of each category.
pub fn default_handler(category: InteractionCategory) -> Handler {
    match category {
        InteractionCategory::TradeActions => Box::new(|widget: &Widget| {
            let rec = widget.target.recommendation.as_ref()?;
            if !rec.tradable {
                return None;
            }
            let symbol = widget.target.symbol.clone()?;
            let side = match rec.kind.as_str() {
                "buy" => TradeSide::Buy,
                "sell" => TradeSide::Sell,
                _ => return None,
            };
            Some(Command::PromptTrade { side, symbol })
        }),
        InteractionCategory::ImpactToggle => Box::new(|widget: &Widget| {
            widget.target.recommendation.as_ref()?;
            Some(Command::ToggleImpact {
                widget_id: widget.id.clone(),
            })
        }),
        InteractionCategory::Feedback => Box::new(|widget: &Widget| {
            let rec = widget.target.recommendation.as_ref()?;
            Some(Command::PromptFeedback {
                recommendation_type: rec.kind.clone(),
                recommendation_action: rec.action.clone(),
            })
        }),
        InteractionCategory::HoldingActions => Box::new(|widget: &Widget| {
            Some(Command::PromptTrade {
                side: TradeSide::Sell,
                symbol: widget.target.symbol.clone()?,
            })
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::widget::{CardSpec, Cell, RecommendationRef, Target, Tone, WidgetBody};

    fn holding_row(symbol: &str) -> Widget {
        Widget::new(
            Section::Performance,
            symbol,
            WidgetBody::Row(vec![Cell::plain(symbol)]),
        )
        .with_target(Target {
            symbol: Some(symbol.to_string()),
            recommendation: None,
        })
    }

    #[test]
    fn test_holding_actions_prompt_a_sell() {
        let mut registry = WidgetRegistry::new();
        registry.put(holding_row("AAPL"));
        let mut router = InteractionRouter::new();
        router.register(
            InteractionCategory::HoldingActions,
            default_handler(InteractionCategory::HoldingActions),
        );

        let commands = router.dispatch(
            &Interaction {
                category: InteractionCategory::HoldingActions,
                section: Section::Performance,
                widget_id: "AAPL".to_string(),
            },
            &registry,
        );
        assert_eq!(
            commands,
            vec![Command::PromptTrade {
                side: TradeSide::Sell,
                symbol: "AAPL".to_string(),
            }]
        );
    }

    fn recommendation_card(id: &str, kind: &str, tradable: bool) -> Widget {
        let card = CardSpec {
            title: id.to_string(),
            subtitle: kind.to_string(),
            body: String::new(),
            badges: Vec::new(),
            tone: Tone::Neutral,
        };
        Widget::new(Section::Recommendations, id, WidgetBody::Card(card)).with_target(Target {
            symbol: tradable.then(|| "AAPL".to_string()),
            recommendation: Some(RecommendationRef {
                kind: kind.to_string(),
                action: id.to_string(),
                tradable,
            }),
        })
    }

    #[test]
    fn test_only_tradable_recommendations_prompt_a_trade() {
        let mut registry = WidgetRegistry::new();
        registry.put(recommendation_card("buy-AAPL", "buy", true));
        registry.put(recommendation_card("sector-Energy", "sector", false));
        let mut router = InteractionRouter::new();
        router.register(
            InteractionCategory::TradeActions,
            default_handler(InteractionCategory::TradeActions),
        );
        let mut trade = |widget_id: &str| {
            router.dispatch(
                &Interaction {
                    category: InteractionCategory::TradeActions,
                    section: Section::Recommendations,
                    widget_id: widget_id.to_string(),
                },
                &registry,
            )
        };

        assert_eq!(
            trade("buy-AAPL"),
            vec![Command::PromptTrade {
                side: TradeSide::Buy,
                symbol: "AAPL".to_string(),
            }]
        );
        assert!(trade("sector-Energy").is_empty());
    }

    #[test]
    fn test_dispatch_on_missing_widget_does_nothing() {
        let registry = WidgetRegistry::new();
        let mut router = InteractionRouter::new();
        router.register(
            InteractionCategory::HoldingActions,
            default_handler(InteractionCategory::HoldingActions),
        );
        let commands = router.dispatch(
            &Interaction {
                category: InteractionCategory::HoldingActions,
                section: Section::Performance,
                widget_id: "GONE".to_string(),
            },
            &registry,
        );
        assert!(commands.is_empty());
        assert_eq!(router.invocations(InteractionCategory::HoldingActions), 0);
    }
}
