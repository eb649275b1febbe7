//! Endpoint contracts of the portfolio server.
//!
//! An [`Endpoint`] names a path and method and, for collection reads, where
//! the collection lives in the response and how each entry is keyed.

use crate::network::fetcher::Item;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

/// Shape of the collection field in a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `[{..}, {..}]`
    List,
    /// `{key: {..}, key: {..}}`
    Map,
    /// The whole body is one item, present while the field is a non-empty
    /// list.
    Whole,
    /// Named top-level fields instead of one collection field. A list field
    /// gives one item per entry keyed `field/key`; an object field is one item
    /// keyed by the field name.
    Fields(&'static [&'static str]),
}

impl Shape {
    fn expected(&self) -> &'static str {
        match self {
            Shape::List | Shape::Whole => "a list",
            Shape::Map => "an object",
            Shape::Fields(_) => "a list or an object",
        }
    }
}

/// How an entry of a collection derives its stable key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRule {
    /// The key of a map entry.
    MapKey,
    /// The entry's `symbol`, trimmed and upper-cased like every symbol the
    /// client sends.
    Symbol,
    /// `type-symbol`, `type-sector` or `type-general`.
    Recommendation,
    /// `url`, falling back to `title`.
    News,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collection {
    /// Field holding the collection; unused by [`Shape::Fields`].
    pub field: &'static str,
    pub shape: Shape,
    pub key: KeyRule,
    /// Also emit the rest of the response envelope as a `summary` item.
    pub summary: bool,
}

/// Key of the item built from a response envelope.
pub const SUMMARY_KEY: &str = "summary";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub name: &'static str,
    pub path: &'static str,
    pub method: HttpMethod,
    pub collection: Option<Collection>,
}

/// Flat request parameters: a query string for GET, a JSON object otherwise.
pub type Params = Vec<(String, String)>;

impl Collection {
    /// Pulls the items out of a decoded body.
    ///
    /// Returns `Ok(None)` when the field is absent or empty, and an error when
    /// the field exists with the wrong JSON type.
    pub fn extract(&self, body: &Value) -> Result<Option<Vec<Item>>, String> {
        if let Shape::Fields(fields) = self.shape {
            return self.extract_fields(body, fields);
        }
        let Some(field) = body.get(self.field) else {
            return Ok(None);
        };

        let mut entries: Vec<(String, Value)> = match (self.shape, field) {
            (_, Value::Null) => return Ok(None),
            (Shape::Whole, Value::Array(list)) if list.is_empty() => return Ok(None),
            (Shape::Whole, Value::Array(_)) => {
                return Ok(Some(vec![Item::new(SUMMARY_KEY, body.clone())]));
            }
            (Shape::List, Value::Array(list)) => list
                .iter()
                .enumerate()
                .map(|(index, entry)| (self.key_for(None, entry, index), entry.clone()))
                .collect(),
            (Shape::Map, Value::Object(map)) => map
                .iter()
                .enumerate()
                .map(|(index, (key, entry))| {
                    (self.key_for(Some(key), entry, index), entry.clone())
                })
                .collect(),
            (shape, other) => {
                return Err(format!(
                    "field `{}` should be {} but is {}",
                    self.field,
                    shape.expected(),
                    json_type(other)
                ));
            }
        };

        if entries.is_empty() {
            return Ok(None);
        }

        disambiguate(&mut entries);
        let mut items = Vec::with_capacity(entries.len() + 1);
        if self.summary {
            let mut envelope = body.clone();
            if let Value::Object(map) = &mut envelope {
                map.remove(self.field);
            }
            items.push(Item::new(SUMMARY_KEY, envelope));
        }
        items.extend(entries.into_iter().map(|(key, payload)| Item::new(key, payload)));
        Ok(Some(items))
    }

    fn extract_fields(
        &self,
        body: &Value,
        fields: &[&'static str],
    ) -> Result<Option<Vec<Item>>, String> {
        let mut entries: Vec<(String, Value)> = Vec::new();
        for name in fields {
            match body.get(*name) {
                None | Some(Value::Null) => {}
                Some(Value::Array(list)) => {
                    entries.extend(list.iter().enumerate().map(|(index, entry)| {
                        let key = format!("{}/{}", name, self.key_for(None, entry, index));
                        (key, entry.clone())
                    }))
                }
                Some(entry @ Value::Object(_)) => entries.push((name.to_string(), entry.clone())),
                Some(other) => {
                    return Err(format!(
                        "field `{}` should be {} but is {}",
                        name,
                        self.shape.expected(),
                        json_type(other)
                    ));
                }
            }
        }
        if entries.is_empty() {
            return Ok(None);
        }
        disambiguate(&mut entries);
        Ok(Some(
            entries
                .into_iter()
                .map(|(key, payload)| Item::new(key, payload))
                .collect(),
        ))
    }

    fn key_for(&self, map_key: Option<&String>, entry: &Value, index: usize) -> String {
        let text = |name: &str| {
            entry
                .get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let key = match self.key {
            KeyRule::MapKey => map_key.cloned(),
            KeyRule::Symbol => text("symbol")
                .map(|symbol| symbol.trim().to_uppercase())
                .filter(|symbol| !symbol.is_empty()),
            KeyRule::Recommendation => text("type").map(|kind| {
                let target = text("symbol")
                    .or_else(|| text("sector"))
                    .unwrap_or_else(|| "general".to_string());
                format!("{}-{}", kind, target)
            }),
            KeyRule::News => text("url").filter(|url| url != "#").or_else(|| text("title")),
        };
        key.unwrap_or_else(|| format!("item-{}", index))
    }
}

/// Appends `~n` to repeated keys so every entry keeps its own widget.
fn disambiguate(entries: &mut [(String, Value)]) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for (key, _) in entries.iter_mut() {
        let count = seen.entry(key.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            *key = format!("{}~{}", key, count);
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The endpoint table.
pub mod endpoints {
    use super::*;

    pub const ENHANCED_RECOMMENDATIONS: Endpoint = Endpoint {
        name: "enhanced-recommendations",
        path: "portfolio/enhanced-recommendations",
        method: HttpMethod::Get,
        collection: Some(Collection {
            field: "recommendations",
            shape: Shape::List,
            key: KeyRule::Recommendation,
            summary: false,
        }),
    };

    pub const RISK_ANALYSIS: Endpoint = Endpoint {
        name: "risk_analysis",
        path: "portfolio/risk_analysis",
        method: HttpMethod::Get,
        collection: Some(Collection {
            field: "individual_stock_risks",
            shape: Shape::Map,
            key: KeyRule::MapKey,
            summary: true,
        }),
    };

    pub const FORECASTS: Endpoint = Endpoint {
        name: "forecasts",
        path: "portfolio/forecasts",
        method: HttpMethod::Get,
        collection: Some(Collection {
            field: "forecasts",
            shape: Shape::Map,
            key: KeyRule::MapKey,
            summary: false,
        }),
    };

    pub const PERFORMANCE: Endpoint = Endpoint {
        name: "performance",
        path: "portfolio/performance",
        method: HttpMethod::Get,
        collection: Some(Collection {
            field: "holdings",
            shape: Shape::List,
            key: KeyRule::Symbol,
            summary: true,
        }),
    };

    pub const HISTORICAL_PERFORMANCE: Endpoint = Endpoint {
        name: "historical_performance",
        path: "portfolio/historical_performance",
        method: HttpMethod::Get,
        collection: Some(Collection {
            field: "dates",
            shape: Shape::Whole,
            key: KeyRule::MapKey,
            summary: false,
        }),
    };

    /// `sp500`, `nasdaq` and `dow` quotes at the top level.
    pub const MARKET_INDICES: Endpoint = Endpoint {
        name: "indices",
        path: "market/indices",
        method: HttpMethod::Get,
        collection: Some(Collection {
            field: "",
            shape: Shape::Fields(&["sp500", "nasdaq", "dow"]),
            key: KeyRule::MapKey,
            summary: false,
        }),
    };

    pub const MARKET_MOVERS: Endpoint = Endpoint {
        name: "movers",
        path: "market/movers",
        method: HttpMethod::Get,
        collection: Some(Collection {
            field: "",
            shape: Shape::Fields(&["gainers", "losers", "mostActive"]),
            key: KeyRule::Symbol,
            summary: false,
        }),
    };

    pub const NEWS: Endpoint = Endpoint {
        name: "news",
        path: "portfolio/news",
        method: HttpMethod::Get,
        collection: Some(Collection {
            field: "news",
            shape: Shape::List,
            key: KeyRule::News,
            summary: false,
        }),
    };

    pub const ADD_STOCK: Endpoint = Endpoint {
        name: "add_stock",
        path: "portfolio/add_stock",
        method: HttpMethod::Post,
        collection: None,
    };

    pub const SELL_SHARES: Endpoint = Endpoint {
        name: "sell_shares",
        path: "portfolio/sell_shares",
        method: HttpMethod::Post,
        collection: None,
    };

    /// The symbol is appended as a path segment.
    pub const REMOVE_STOCK: Endpoint = Endpoint {
        name: "remove_stock",
        path: "portfolio/remove_stock",
        method: HttpMethod::Delete,
        collection: None,
    };

    pub const RECOMMENDATION_FEEDBACK: Endpoint = Endpoint {
        name: "recommendation-feedback",
        path: "portfolio/recommendation-feedback",
        method: HttpMethod::Post,
        collection: None,
    };

    pub const IMPACT_ANALYSIS: Endpoint = Endpoint {
        name: "impact-analysis",
        path: "portfolio/impact-analysis",
        method: HttpMethod::Get,
        collection: None,
    };

    pub const HOLDINGS: Endpoint = Endpoint {
        name: "holdings",
        path: "portfolio/holdings",
        method: HttpMethod::Get,
        collection: None,
    };

    pub const PREFERENCES: Endpoint = Endpoint {
        name: "preferences",
        path: "settings/preferences",
        method: HttpMethod::Get,
        collection: None,
    };

    pub const SAVE_PREFERENCES: Endpoint = Endpoint {
        name: "preferences",
        path: "settings/preferences",
        method: HttpMethod::Post,
        collection: None,
    };
}
