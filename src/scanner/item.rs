use serde::{Deserialize, Serialize};
use std::fmt;

/// Marketplace tag. The set is open: unknown names are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Marketplace {
    Ebay,
    Amazon,
    Mock,
    Other(String),
}

impl Marketplace {
    pub fn as_str(&self) -> &str {
        match self {
            Marketplace::Ebay => "ebay",
            Marketplace::Amazon => "amazon",
            Marketplace::Mock => "mock",
            Marketplace::Other(name) => name,
        }
    }
}

impl From<&str> for Marketplace {
    fn from(name: &str) -> Self {
        let lower = name.trim().to_lowercase();
        match lower.as_str() {
            "ebay" => Marketplace::Ebay,
            "amazon" => Marketplace::Amazon,
            "mock" => Marketplace::Mock,
            _ => Marketplace::Other(lower),
        }
    }
}

impl From<String> for Marketplace {
    fn from(name: String) -> Self {
        Marketplace::from(name.as_str())
    }
}

impl From<Marketplace> for String {
    fn from(marketplace: Marketplace) -> Self {
        marketplace.as_str().to_string()
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical listing produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedItem {
    pub item_name: String,
    pub category_path: String,
    pub price: f64,
    pub confidence: f64,
    pub marketplace: Marketplace,
    pub id: String,
    pub starting_bid: f64,
    pub suggested_max_bid: f64,
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// A listing that passed a scan. Rebuilt on every scan, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedItem {
    /// Display id, unique within one scan and stable across identical scans.
    pub id: String,
    pub source_id: String,
    pub item_name: String,
    pub category: String,
    pub category_path: String,
    pub price: f64,
    /// Confidence after clamping into the scan range.
    pub confidence: f64,
    pub profit: f64,
    pub sell_price: f64,
    pub marketplace: Marketplace,
    pub starting_bid: f64,
    pub suggested_max_bid: f64,
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl ScannedItem {
    pub fn profit_percent(&self) -> f64 {
        if self.price > 0.0 {
            crate::core::round2(self.profit / self.price * 100.0)
        } else {
            0.0
        }
    }
}
