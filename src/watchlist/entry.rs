use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::round2;
use crate::scanner::engine::sell_price;
use crate::scanner::market::sell_time;
use crate::scanner::{Marketplace, ScannedItem};

/// A persisted watchlist row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    pub item_name: String,
    pub category: String,
    pub price: f64,
    #[serde(default)]
    pub profit: f64,
    pub confidence: f64,
    pub marketplace: Marketplace,
    pub id: String,
    #[serde(default)]
    pub sell_price: f64,
    #[serde(default)]
    pub sell_time: String,
    pub starting_bid: f64,
    pub suggested_max_bid: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl WatchlistEntry {
    /// Case-insensitive identity used by the duplicate guard.
    pub fn identity(&self) -> (String, String, String) {
        identity(&self.item_name, self.marketplace.as_str(), &self.category)
    }

    pub fn matches(&self, item_name: &str, marketplace: &str, category: &str) -> bool {
        self.identity() == identity(item_name, marketplace, category)
    }

    pub fn label(&self) -> String {
        format!("{} ({}, {})", self.item_name, self.marketplace, self.category)
    }
}

pub fn identity(item_name: &str, marketplace: &str, category: &str) -> (String, String, String) {
    (
        item_name.trim().to_lowercase(),
        marketplace.trim().to_lowercase(),
        category.trim().to_lowercase(),
    )
}

/// Shape check applied when reading persisted rows: required strings must be
/// non-empty and numeric fields must be numbers.
pub fn has_valid_shape(value: &Value) -> bool {
    let Some(record) = value.as_object() else {
        return false;
    };
    let non_empty = |key: &str| {
        record
            .get(key)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty())
    };
    let number = |key: &str| record.get(key).is_some_and(Value::is_number);

    non_empty("itemName")
        && non_empty("category")
        && number("price")
        && number("confidence")
        && non_empty("marketplace")
        && non_empty("id")
        && number("startingBid")
        && number("suggestedMaxBid")
}

/// Fallbacks for bid fields a record does not carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BidDefaults {
    /// Same rule as the normalizer: 80% of price, capped at price.
    #[default]
    FromPrice,
    /// Half-price rule of the old watchlist screens (`price * 0.5 * 0.8`,
    /// `price * 0.5`, with 28/35 when the price is zero).
    LegacyHalfPrice,
}

impl BidDefaults {
    pub fn starting_bid(&self, price: f64) -> f64 {
        match self {
            BidDefaults::FromPrice => round2(price * 0.8),
            BidDefaults::LegacyHalfPrice => non_zero_or(round2(price * 0.5 * 0.8), 28.0),
        }
    }

    pub fn suggested_max_bid(&self, price: f64) -> f64 {
        match self {
            BidDefaults::FromPrice => round2(price),
            BidDefaults::LegacyHalfPrice => non_zero_or(round2(price * 0.5), 35.0),
        }
    }
}

fn non_zero_or(value: f64, fallback: f64) -> f64 {
    if value == 0.0 || !value.is_finite() {
        fallback
    } else {
        value
    }
}

/// Candidate row for `add`/`add_many`. Built from a scanned item or from
/// loosely typed input.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchCandidate {
    pub item_name: String,
    pub category: String,
    pub price: f64,
    pub confidence: f64,
    pub marketplace: String,
    pub id: Option<String>,
    pub starting_bid: Option<f64>,
    pub suggested_max_bid: Option<f64>,
}

impl From<&ScannedItem> for WatchCandidate {
    fn from(item: &ScannedItem) -> Self {
        Self {
            item_name: item.item_name.clone(),
            category: item.category.clone(),
            price: item.price,
            confidence: item.confidence,
            marketplace: item.marketplace.to_string(),
            id: Some(item.id.clone()),
            starting_bid: Some(item.starting_bid),
            suggested_max_bid: Some(item.suggested_max_bid),
        }
    }
}

impl WatchCandidate {
    /// Reason the candidate cannot be stored, if any.
    pub fn invalid_reason(&self) -> Option<&'static str> {
        if self.item_name.trim().is_empty() {
            Some("missing item name")
        } else if self.category.trim().is_empty() {
            Some("missing category")
        } else if self.marketplace.trim().is_empty() {
            Some("missing marketplace")
        } else if !self.price.is_finite() || self.price < 0.0 {
            Some("invalid price")
        } else if !self.confidence.is_finite() {
            Some("invalid confidence")
        } else if self.starting_bid.is_some_and(|b| !b.is_finite())
            || self.suggested_max_bid.is_some_and(|b| !b.is_finite())
        {
            Some("invalid bid")
        } else {
            None
        }
    }

    /// Build the persisted row: cents-rounded price, 20% resale markup,
    /// sell-time estimate, bid fallbacks and an id when none was given.
    pub fn into_entry(self, bids: BidDefaults) -> WatchlistEntry {
        let marketplace = Marketplace::from(self.marketplace.as_str());
        let price = round2(self.price);
        let sell_price = sell_price(price);
        let profit = round2(sell_price - price);
        let starting_bid = self
            .starting_bid
            .filter(|b| *b != 0.0)
            .map(round2)
            .unwrap_or_else(|| bids.starting_bid(price));
        let suggested_max_bid = self
            .suggested_max_bid
            .filter(|b| *b != 0.0)
            .map(round2)
            .unwrap_or_else(|| bids.suggested_max_bid(price));
        let id = self.id.filter(|id| !id.trim().is_empty()).unwrap_or_else(|| {
            format!(
                "item-{}-{}-{}",
                self.category,
                self.item_name.split_whitespace().collect::<Vec<_>>().join("-"),
                uuid::Uuid::new_v4().simple()
            )
        });

        WatchlistEntry {
            sell_time: sell_time(&marketplace, &self.category).to_string(),
            item_name: self.item_name,
            category: self.category,
            price,
            profit,
            confidence: self.confidence.round(),
            marketplace,
            id,
            sell_price,
            starting_bid,
            suggested_max_bid,
            saved_at: Some(Utc::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate() -> WatchCandidate {
        WatchCandidate {
            item_name: "Widget".to_string(),
            category: "toys".to_string(),
            price: 10.0,
            confidence: 72.6,
            marketplace: "ebay".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_entry_derivations() {
        let entry = candidate().into_entry(BidDefaults::FromPrice);
        assert_eq!(entry.sell_price, 12.0);
        assert_eq!(entry.profit, 2.0);
        assert_eq!(entry.confidence, 73.0);
        assert_eq!(entry.sell_time, "3-7 days");
        assert_eq!(entry.starting_bid, 8.0);
        assert_eq!(entry.suggested_max_bid, 10.0);
        assert!(entry.id.starts_with("item-toys-Widget-"));
    }

    #[test]
    fn test_legacy_bid_defaults() {
        let entry = candidate().into_entry(BidDefaults::LegacyHalfPrice);
        assert_eq!(entry.starting_bid, 4.0);
        assert_eq!(entry.suggested_max_bid, 5.0);

        assert_eq!(BidDefaults::LegacyHalfPrice.starting_bid(0.0), 28.0);
        assert_eq!(BidDefaults::LegacyHalfPrice.suggested_max_bid(0.0), 35.0);
    }

    #[test]
    fn test_identity_ignores_case() {
        let entry = candidate().into_entry(BidDefaults::FromPrice);
        assert!(entry.matches("WIDGET", "EBAY", "Toys"));
        assert!(!entry.matches("Widget", "amazon", "toys"));
    }

    #[test]
    fn test_shape_validation() {
        let entry = candidate().into_entry(BidDefaults::FromPrice);
        let value = serde_json::to_value(&entry).unwrap();
        assert!(has_valid_shape(&value));

        let mut missing = value.clone();
        missing.as_object_mut().unwrap().remove("startingBid");
        assert!(!has_valid_shape(&missing));

        let wrong_type = json!({
            "itemName": "Widget", "category": "toys", "price": "10",
            "confidence": 70, "marketplace": "ebay", "id": "x",
            "startingBid": 8, "suggestedMaxBid": 10
        });
        assert!(!has_valid_shape(&wrong_type));
        assert!(!has_valid_shape(&json!("Widget")));
    }

    #[test]
    fn test_invalid_candidates() {
        let mut bad = candidate();
        bad.item_name = "  ".to_string();
        assert_eq!(bad.invalid_reason(), Some("missing item name"));

        let mut bad = candidate();
        bad.price = f64::NAN;
        assert_eq!(bad.invalid_reason(), Some("invalid price"));

        assert_eq!(candidate().invalid_reason(), None);
    }
}
