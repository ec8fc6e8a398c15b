use serde::{Deserialize, Serialize};

/// Which export shape a source document uses. Drives field mapping in the
/// normalizer and the default marketplace for items that carry none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Scored,
    Ebay,
    Amazon,
    Search,
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Scored => "scored_items",
            SourceKind::Ebay => "items_ebay",
            SourceKind::Amazon => "items_amazon",
            SourceKind::Search => "search",
        }
    }

    pub fn default_marketplace(&self) -> &'static str {
        match self {
            SourceKind::Amazon => "amazon",
            SourceKind::Scored | SourceKind::Ebay | SourceKind::Search => "ebay",
        }
    }
}

/// A JSON document to load: an HTTP(S) URL or a path on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub kind: SourceKind,
    pub location: String,
}

impl SourceLocation {
    pub fn new(kind: SourceKind, location: impl Into<String>) -> Self {
        Self {
            kind,
            location: location.into(),
        }
    }

    pub fn is_remote(&self) -> bool {
        self.location.starts_with("http://") || self.location.starts_with("https://")
    }
}

/// One row returned by the proxy search endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: String,
    pub image: Option<String>,
}
