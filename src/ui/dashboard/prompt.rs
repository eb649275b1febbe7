//! Single-line input prompts opened from widget interactions.

use crate::portfolio::{Action, Feedback, TradeOrder};
use crate::sync::{Section, TradeSide};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    /// Asks for a share quantity.
    Trade { side: TradeSide, symbol: String },
    /// Asks for `<rating> [y|n] [comment]`.
    Feedback {
        recommendation_type: String,
        recommendation_action: String,
    },
    /// Asks for `y` before dropping a whole position.
    ConfirmRemove { symbol: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// Section the resulting action is reported in.
    pub section: Section,
    pub kind: PromptKind,
    pub input: String,
}

impl Prompt {
    pub fn new(section: Section, kind: PromptKind) -> Self {
        Self {
            section,
            kind,
            input: String::new(),
        }
    }

    pub fn label(&self) -> String {
        match &self.kind {
            PromptKind::Trade { side, symbol } => format!("{} {} - quantity", side, symbol),
            PromptKind::Feedback {
                recommendation_type,
                recommendation_action,
            } => format!(
                "Rate \"{}\" ({}) - 1-5 [y|n followed] [comment]",
                recommendation_action, recommendation_type
            ),
            PromptKind::ConfirmRemove { symbol } => {
                format!("Remove every {} share? y/n", symbol)
            }
        }
    }

    pub fn push(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn pop(&mut self) {
        self.input.pop();
    }

    /// Turns the typed input into an action. Range checks are left to
    /// [`Action::validate`]; this only parses.
    ///
    /// `Ok(None)` means the user declined.
    pub fn into_action(self) -> Result<Option<Action>, String> {
        let input = self.input.trim();
        match self.kind {
            PromptKind::Trade { side, symbol } => {
                let quantity: f64 = input
                    .parse()
                    .map_err(|_| format!("Not a quantity: {:?}", input))?;
                let order = TradeOrder::new(&symbol, quantity);
                Ok(Some(match side {
                    TradeSide::Buy => Action::Buy(order),
                    TradeSide::Sell => Action::Sell(order),
                }))
            }
            PromptKind::Feedback {
                recommendation_type,
                recommendation_action,
            } => {
                let mut parts = input.splitn(3, ' ');
                let rating: u8 = parts
                    .next()
                    .unwrap_or_default()
                    .parse()
                    .map_err(|_| format!("Not a rating: {:?}", input))?;
                let was_followed = matches!(parts.next(), Some("y" | "Y" | "yes"));
                let comment = parts
                    .next()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string);
                Ok(Some(Action::Rate(Feedback {
                    recommendation_type,
                    recommendation_action,
                    rating,
                    was_followed,
                    comment,
                })))
            }
            PromptKind::ConfirmRemove { symbol } => {
                if input.eq_ignore_ascii_case("y") || input.eq_ignore_ascii_case("yes") {
                    Ok(Some(Action::RemoveAll { symbol }))
                } else {
                    Ok(None)
                }
            }
        }
    }
}
