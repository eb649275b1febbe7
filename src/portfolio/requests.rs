//! User-triggered writes and their local field contracts.

use crate::consts::cli_consts::trading::{MAX_RATING, MIN_QUANTITY, MIN_RATING};
use crate::network::endpoint::{Endpoint, endpoints};
use crate::portfolio::payloads::Preferences;
use crate::sync::Section;
use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("A stock symbol is required")]
    MissingSymbol,

    #[error("Quantity must be at least {min} shares (got {quantity})", min = MIN_QUANTITY)]
    QuantityTooSmall { quantity: f64 },

    #[error("Price must be a positive number (got {price})")]
    InvalidPrice { price: f64 },

    #[error("Cannot sell {requested} shares of {symbol}: only {held} held")]
    SellExceedsHolding {
        symbol: String,
        requested: f64,
        held: f64,
    },

    #[error("Rating must be between {min} and {max} (got {0})", min = MIN_RATING, max = MAX_RATING)]
    RatingOutOfRange(u8),

    #[error("Feedback must name the recommendation it rates")]
    MissingRecommendation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeOrder {
    pub symbol: String,
    pub quantity: f64,
    /// Purchase or sell price; the server uses the market price when absent.
    pub price: Option<f64>,
    /// `YYYY-MM-DD`; the server uses today when absent.
    pub date: Option<String>,
}

impl TradeOrder {
    pub fn new(symbol: &str, quantity: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            quantity,
            price: None,
            date: None,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        normalize_symbol(&self.symbol)?;
        // NaN fails the comparison, so it is rejected here too.
        if !(self.quantity.is_finite() && self.quantity >= MIN_QUANTITY) {
            return Err(ValidationError::QuantityTooSmall {
                quantity: self.quantity,
            });
        }
        if let Some(price) = self.price {
            if !(price.is_finite() && price > 0.0) {
                return Err(ValidationError::InvalidPrice { price });
            }
        }
        Ok(())
    }

    fn body(&self, price_field: &str, date_field: &str) -> Result<Value, ValidationError> {
        let mut body = Map::new();
        body.insert("symbol".into(), json!(normalize_symbol(&self.symbol)?));
        body.insert("quantity".into(), json!(self.quantity));
        if let Some(price) = self.price {
            body.insert(price_field.into(), json!(price));
        }
        if let Some(date) = &self.date {
            body.insert(date_field.into(), json!(date));
        }
        Ok(Value::Object(body))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
    pub recommendation_type: String,
    pub recommendation_action: String,
    pub rating: u8,
    pub was_followed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Buy(TradeOrder),
    Sell(TradeOrder),
    /// Drops the whole position.
    RemoveAll { symbol: String },
    Rate(Feedback),
    SavePreferences(Preferences),
}

/// A validated write, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRequest {
    pub endpoint: Endpoint,
    pub path: String,
    /// `None` for DELETE.
    pub body: Option<Value>,
}

fn normalize_symbol(symbol: &str) -> Result<String, ValidationError> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(ValidationError::MissingSymbol);
    }
    Ok(symbol.to_uppercase())
}

impl Action {
    /// Checks the field contract of the target endpoint.
    ///
    /// `held` is the quantity currently held, when known; a sell larger than
    /// that is rejected.
    pub fn validate(&self, held: Option<f64>) -> Result<(), ValidationError> {
        match self {
            Action::Buy(order) => order.validate(),
            Action::Sell(order) => {
                order.validate()?;
                match held {
                    Some(held) if order.quantity > held => {
                        Err(ValidationError::SellExceedsHolding {
                            symbol: order.symbol.trim().to_uppercase(),
                            requested: order.quantity,
                            held,
                        })
                    }
                    _ => Ok(()),
                }
            }
            Action::RemoveAll { symbol } => normalize_symbol(symbol).map(|_| ()),
            Action::Rate(feedback) => {
                if feedback.recommendation_type.trim().is_empty()
                    || feedback.recommendation_action.trim().is_empty()
                {
                    return Err(ValidationError::MissingRecommendation);
                }
                if !(MIN_RATING..=MAX_RATING).contains(&feedback.rating) {
                    return Err(ValidationError::RatingOutOfRange(feedback.rating));
                }
                Ok(())
            }
            Action::SavePreferences(_) => Ok(()),
        }
    }

    /// Validates and builds the request for this action.
    pub fn to_request(&self) -> Result<WriteRequest, ValidationError> {
        self.validate(None)?;
        let request = match self {
            Action::Buy(order) => WriteRequest {
                endpoint: endpoints::ADD_STOCK,
                path: endpoints::ADD_STOCK.path.to_string(),
                body: Some(order.body("purchase_price", "purchase_date")?),
            },
            Action::Sell(order) => WriteRequest {
                endpoint: endpoints::SELL_SHARES,
                path: endpoints::SELL_SHARES.path.to_string(),
                body: Some(order.body("sell_price", "sell_date")?),
            },
            Action::RemoveAll { symbol } => WriteRequest {
                endpoint: endpoints::REMOVE_STOCK,
                path: format!(
                    "{}/{}",
                    endpoints::REMOVE_STOCK.path,
                    urlencoding::encode(&normalize_symbol(symbol)?)
                ),
                body: None,
            },
            Action::Rate(feedback) => WriteRequest {
                endpoint: endpoints::RECOMMENDATION_FEEDBACK,
                path: endpoints::RECOMMENDATION_FEEDBACK.path.to_string(),
                body: Some(json!(feedback)),
            },
            Action::SavePreferences(preferences) => WriteRequest {
                endpoint: endpoints::SAVE_PREFERENCES,
                path: endpoints::SAVE_PREFERENCES.path.to_string(),
                body: Some(json!(preferences)),
            },
        };
        Ok(request)
    }

    /// Symbol the action trades, if any.
    pub fn symbol(&self) -> Option<String> {
        match self {
            Action::Buy(order) | Action::Sell(order) => Some(order.symbol.trim().to_uppercase()),
            Action::RemoveAll { symbol } => Some(symbol.trim().to_uppercase()),
            Action::Rate(_) | Action::SavePreferences(_) => None,
        }
    }

    /// Other sections whose data changes when this action succeeds.
    pub fn dependent_sections(&self) -> &'static [Section] {
        match self {
            Action::Buy(_) | Action::Sell(_) | Action::RemoveAll { .. } => {
                &[Section::Recommendations, Section::Performance]
            }
            Action::Rate(_) | Action::SavePreferences(_) => &[],
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Action::Buy(order) => format!("buy {} {}", order.quantity, order.symbol.to_uppercase()),
            Action::Sell(order) => {
                format!("sell {} {}", order.quantity, order.symbol.to_uppercase())
            }
            Action::RemoveAll { symbol } => format!("remove {}", symbol.to_uppercase()),
            Action::Rate(feedback) => format!(
                "rate {} recommendation {}/{}",
                feedback.recommendation_type, feedback.rating, MAX_RATING
            ),
            Action::SavePreferences(_) => "save preferences".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_boundary() {
        let too_small = Action::Buy(TradeOrder::new("AAPL", 0.0009));
        assert_eq!(
            too_small.validate(None),
            Err(ValidationError::QuantityTooSmall { quantity: 0.0009 })
        );
        let smallest = Action::Buy(TradeOrder::new("AAPL", 0.001));
        assert_eq!(smallest.validate(None), Ok(()));
        assert_eq!(
            ValidationError::QuantityTooSmall { quantity: 0.0009 }.to_string(),
            "Quantity must be at least 0.001 shares (got 0.0009)"
        );
    }

    #[test]
    fn test_non_finite_quantity_is_rejected() {
        for quantity in [f64::NAN, f64::INFINITY, -1.0] {
            let action = Action::Sell(TradeOrder::new("AAPL", quantity));
            assert!(matches!(
                action.validate(None),
                Err(ValidationError::QuantityTooSmall { .. })
            ));
        }
    }

    #[test]
    fn test_sell_is_capped_by_known_holding() {
        let action = Action::Sell(TradeOrder::new("aapl", 12.0));
        assert_eq!(action.validate(None), Ok(()));
        assert_eq!(action.validate(Some(12.0)), Ok(()));
        assert_eq!(
            action.validate(Some(10.0)),
            Err(ValidationError::SellExceedsHolding {
                symbol: "AAPL".to_string(),
                requested: 12.0,
                held: 10.0,
            })
        );
    }

    #[test]
    fn test_buy_body_uses_purchase_fields_and_upper_cases_symbol() {
        let mut order = TradeOrder::new(" msft ", 2.5);
        order.price = Some(410.0);
        let request = Action::Buy(order).to_request().unwrap();
        assert_eq!(request.path, "portfolio/add_stock");
        assert_eq!(
            request.body,
            Some(json!({"symbol": "MSFT", "quantity": 2.5, "purchase_price": 410.0}))
        );
    }

    #[test]
    fn test_remove_encodes_symbol_in_path() {
        let request = Action::RemoveAll {
            symbol: "brk.b/x".to_string(),
        }
        .to_request()
        .unwrap();
        assert_eq!(request.path, "portfolio/remove_stock/BRK.B%2FX");
        assert_eq!(request.body, None);
    }

    #[test]
    fn test_rating_bounds() {
        let feedback = |rating| {
            Action::Rate(Feedback {
                recommendation_type: "buy".to_string(),
                recommendation_action: "Buy AAPL".to_string(),
                rating,
                was_followed: false,
                comment: None,
            })
        };
        assert_eq!(feedback(0).validate(None), Err(ValidationError::RatingOutOfRange(0)));
        assert_eq!(feedback(6).validate(None), Err(ValidationError::RatingOutOfRange(6)));
        assert_eq!(feedback(5).validate(None), Ok(()));
        assert_eq!(
            ValidationError::RatingOutOfRange(9).to_string(),
            "Rating must be between 1 and 5 (got 9)"
        );
        assert_eq!(
            feedback(3).to_request().unwrap().body,
            Some(json!({
                "recommendation_type": "buy",
                "recommendation_action": "Buy AAPL",
                "rating": 3,
                "was_followed": false,
            }))
        );
    }

    #[test]
    fn test_only_trades_refresh_other_sections() {
        let buy = Action::Buy(TradeOrder::new("AAPL", 1.0));
        assert_eq!(
            buy.dependent_sections(),
            &[Section::Recommendations, Section::Performance]
        );
        let prefs = Action::SavePreferences(Preferences::default());
        assert!(prefs.dependent_sections().is_empty());
    }
}
