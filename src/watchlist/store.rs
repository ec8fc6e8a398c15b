use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::entry::{has_valid_shape, BidDefaults, WatchCandidate, WatchlistEntry};
use super::guard::SaveFlag;
use super::kv::KeyValueStore;
use crate::core::{round2, FlipperError, Result, StatusMessage};
use crate::scanner::engine::sell_price;
use crate::scanner::market::sell_time;
use crate::scanner::normalizer::{id_value, DEFAULT_CONFIDENCE};
use crate::scanner::Marketplace;

pub const WATCHLIST_KEY: &str = "watchlist";
pub const EXPORT_FILE_NAME: &str = "flipper-watchlist.json";

/// How `import` treats the `price` of incoming rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportPolicy {
    /// Keep prices as exported; fill missing bids from the price.
    #[default]
    PreservePrice,
    /// Halve every imported price and fill missing bids with the half-price
    /// rule, as older exports were read.
    LegacyHalfPrice,
}

impl ImportPolicy {
    fn bid_defaults(&self) -> BidDefaults {
        match self {
            ImportPolicy::PreservePrice => BidDefaults::FromPrice,
            ImportPolicy::LegacyHalfPrice => BidDefaults::LegacyHalfPrice,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    Saved(WatchlistEntry),
    /// Rejected: the same (name, marketplace, category) is already stored.
    Duplicate(String),
}

impl AddOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, AddOutcome::Saved(_))
    }

    pub fn message(&self) -> StatusMessage {
        match self {
            AddOutcome::Saved(entry) => {
                StatusMessage::success(format!("{} saved to watchlist!", entry.item_name))
            }
            AddOutcome::Duplicate(label) => {
                StatusMessage::error(format!("{} is already in watchlist!", label))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddManySummary {
    pub saved_count: usize,
    pub duplicates: Vec<String>,
    pub invalid: usize,
}

impl AddManySummary {
    pub fn message(&self) -> StatusMessage {
        let skipped = if self.duplicates.is_empty() {
            String::new()
        } else {
            format!(
                " Skipped {} duplicate item(s): {}.",
                self.duplicates.len(),
                self.duplicates.join(", ")
            )
        };

        if self.saved_count > 0 {
            StatusMessage::success(format!(
                "Saved {} new item(s) to watchlist!{}",
                self.saved_count, skipped
            ))
        } else if !self.duplicates.is_empty() && self.invalid == 0 {
            StatusMessage::error(format!("All selected items are already in watchlist.{}", skipped))
        } else {
            StatusMessage::info(format!("No new items saved to watchlist.{}", skipped))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    pub added: usize,
    pub duplicates: usize,
    pub skipped: usize,
}

impl ImportSummary {
    pub fn message(&self) -> StatusMessage {
        StatusMessage::success(format!(
            "Imported {} new item(s) to watchlist!",
            self.added
        ))
    }
}

/// Loosely typed row from an import file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportedRow {
    item_name: String,
    category: String,
    marketplace: String,
    price: f64,
    confidence: Option<f64>,
    #[serde(default)]
    id: Option<Value>,
    profit: Option<f64>,
    sell_price: Option<f64>,
    sell_time: Option<String>,
    starting_bid: Option<f64>,
    suggested_max_bid: Option<f64>,
    saved_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// The user's persisted shortlist.
pub struct WatchlistStore {
    storage: Arc<dyn KeyValueStore>,
    save_flag: SaveFlag,
    import_policy: ImportPolicy,
}

impl WatchlistStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            save_flag: SaveFlag::new(),
            import_policy: ImportPolicy::default(),
        }
    }

    pub fn with_import_policy(mut self, policy: ImportPolicy) -> Self {
        self.import_policy = policy;
        self
    }

    /// Hold the save flag from outside, e.g. while a confirmation is shown.
    pub fn save_flag(&self) -> &SaveFlag {
        &self.save_flag
    }

    /// Stored entries. Rows that fail the shape check are dropped (and
    /// logged); a stored value that is not an array is reset to empty.
    pub async fn get(&self) -> Result<Vec<WatchlistEntry>> {
        let Some(raw) = self.storage.get(WATCHLIST_KEY).await? else {
            return Ok(Vec::new());
        };

        let rows = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(rows)) => rows,
            _ => {
                tracing::warn!("⚠️  Corrupted watchlist, resetting...");
                self.storage.set(WATCHLIST_KEY, "[]").await?;
                return Ok(Vec::new());
            }
        };

        let total = rows.len();
        let entries: Vec<WatchlistEntry> = rows
            .into_iter()
            .filter(has_valid_shape)
            .filter_map(|row| serde_json::from_value(row).ok())
            .collect();

        if entries.len() < total {
            tracing::warn!(
                "Dropped {} invalid watchlist entr(ies)",
                total - entries.len()
            );
        }
        Ok(entries)
    }

    /// Overwrite the stored list.
    pub async fn save(&self, entries: &[WatchlistEntry]) -> Result<()> {
        let json = serde_json::to_string(entries)?;
        self.storage.set(WATCHLIST_KEY, &json).await?;
        tracing::debug!("Saved watchlist: {} entries", entries.len());
        Ok(())
    }

    /// Overwrite the stored list from untyped JSON, which must be an array.
    pub async fn save_value(&self, value: &Value) -> Result<()> {
        if !value.is_array() {
            return Err(FlipperError::InvalidShape(
                "Watchlist must be an array".to_string(),
            ));
        }
        self.storage
            .set(WATCHLIST_KEY, &serde_json::to_string(value)?)
            .await
    }

    pub async fn contains(&self, item_name: &str, marketplace: &str, category: &str) -> Result<bool> {
        Ok(self
            .get()
            .await?
            .iter()
            .any(|entry| entry.matches(item_name, marketplace, category)))
    }

    pub async fn len(&self) -> Result<usize> {
        Ok(self.get().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Add one item. A duplicate is reported through `AddOutcome`, not as an
    /// error.
    pub async fn add(&self, candidate: WatchCandidate) -> Result<AddOutcome> {
        let _guard = self.save_flag.acquire()?;

        if let Some(reason) = candidate.invalid_reason() {
            tracing::error!("Invalid item data for watchlist: {}", reason);
            return Err(FlipperError::validation(format!(
                "Invalid item data for watchlist: {}",
                reason
            )));
        }

        let mut entries = self.get().await?;
        if entries
            .iter()
            .any(|e| e.matches(&candidate.item_name, &candidate.marketplace, &candidate.category))
        {
            let label = format!(
                "{} from {} ({})",
                candidate.item_name, candidate.marketplace, candidate.category
            );
            tracing::info!("Duplicate item blocked: {}", label);
            return Ok(AddOutcome::Duplicate(label));
        }

        let entry = candidate.into_entry(BidDefaults::FromPrice);
        entries.push(entry.clone());
        self.save(&entries).await?;

        tracing::info!("⭐ Saved to watchlist: {}, id: {}", entry.item_name, entry.id);
        Ok(AddOutcome::Saved(entry))
    }

    /// Add several items, skipping duplicates and invalid rows. Nothing is
    /// written when no row was accepted.
    pub async fn add_many(&self, candidates: Vec<WatchCandidate>) -> Result<AddManySummary> {
        let _guard = self.save_flag.acquire()?;

        let mut entries = self.get().await?;
        let mut summary = AddManySummary::default();

        for candidate in candidates {
            if entries
                .iter()
                .any(|e| e.matches(&candidate.item_name, &candidate.marketplace, &candidate.category))
            {
                let label = format!(
                    "{} ({}, {})",
                    candidate.item_name, candidate.marketplace, candidate.category
                );
                tracing::info!("Duplicate item blocked: {}", label);
                summary.duplicates.push(label);
                continue;
            }
            if let Some(reason) = candidate.invalid_reason() {
                tracing::warn!("Invalid item data skipped: {} ({})", candidate.item_name, reason);
                summary.invalid += 1;
                continue;
            }

            entries.push(candidate.into_entry(BidDefaults::FromPrice));
            summary.saved_count += 1;
        }

        if summary.saved_count > 0 {
            self.save(&entries).await?;
        }

        tracing::info!(
            "⭐ Batch save: {} saved, {} duplicates, {} invalid",
            summary.saved_count,
            summary.duplicates.len(),
            summary.invalid
        );
        Ok(summary)
    }

    pub async fn clear(&self) -> Result<()> {
        let _guard = self.save_flag.acquire()?;
        self.save(&[]).await?;
        tracing::info!("🗑️  Watchlist cleared");
        Ok(())
    }

    /// Pretty-printed JSON array of the stored entries.
    pub async fn export(&self) -> Result<String> {
        let entries = self.get().await?;
        Ok(serde_json::to_string_pretty(&entries)?)
    }

    /// Write the export into `dir` and return the file path.
    pub async fn export_to(&self, dir: &Path) -> Result<PathBuf> {
        let json = self.export().await?;
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(EXPORT_FILE_NAME);
        tokio::fs::write(&path, json).await?;
        tracing::info!("📤 Watchlist exported to {}", path.display());
        Ok(path)
    }

    /// Merge an exported document. Malformed JSON or a non-array aborts
    /// without touching stored state.
    pub async fn import(&self, json: &str) -> Result<ImportSummary> {
        let _guard = self.save_flag.acquire()?;

        let document: Value = serde_json::from_str(json)
            .map_err(|e| FlipperError::Parse(format!("watchlist file: {}", e)))?;
        let Value::Array(rows) = document else {
            return Err(FlipperError::InvalidFormat);
        };

        let mut entries = self.get().await?;
        let mut summary = ImportSummary::default();

        for row in rows {
            let row: ImportedRow = match serde_json::from_value(row) {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!("Skipping unreadable watchlist row: {}", e);
                    summary.skipped += 1;
                    continue;
                }
            };
            if entries
                .iter()
                .any(|e| e.matches(&row.item_name, &row.marketplace, &row.category))
            {
                summary.duplicates += 1;
                continue;
            }
            match self.entry_from_import(row) {
                Some(entry) => {
                    entries.push(entry);
                    summary.added += 1;
                }
                None => summary.skipped += 1,
            }
        }

        self.save(&entries).await?;
        tracing::info!(
            "📥 Imported {} new item(s) ({} duplicates, {} skipped)",
            summary.added,
            summary.duplicates,
            summary.skipped
        );
        Ok(summary)
    }

    pub async fn import_file(&self, path: &Path) -> Result<ImportSummary> {
        let json = tokio::fs::read_to_string(path).await?;
        self.import(&json).await
    }

    fn entry_from_import(&self, row: ImportedRow) -> Option<WatchlistEntry> {
        if row.item_name.trim().is_empty()
            || row.category.trim().is_empty()
            || row.marketplace.trim().is_empty()
            || !row.price.is_finite()
        {
            return None;
        }

        let bids = self.import_policy.bid_defaults();
        let price = match self.import_policy {
            ImportPolicy::PreservePrice => round2(row.price),
            ImportPolicy::LegacyHalfPrice => {
                let halved = round2(row.price * 0.5);
                if halved == 0.0 {
                    35.0
                } else {
                    halved
                }
            }
        };
        let marketplace = Marketplace::from(row.marketplace.as_str());
        let sell = row.sell_price.unwrap_or_else(|| sell_price(price));

        Some(WatchlistEntry {
            price,
            profit: row.profit.unwrap_or_else(|| round2(sell - price)),
            confidence: row
                .confidence
                .filter(|c| c.is_finite())
                .unwrap_or(DEFAULT_CONFIDENCE),
            id: id_value(row.id.as_ref()).unwrap_or_else(|| {
                format!("item-{}-{}", row.category, uuid::Uuid::new_v4().simple())
            }),
            sell_price: sell,
            sell_time: row
                .sell_time
                .unwrap_or_else(|| sell_time(&marketplace, &row.category).to_string()),
            starting_bid: row
                .starting_bid
                .filter(|b| *b != 0.0)
                .map(round2)
                .unwrap_or_else(|| bids.starting_bid(row.price)),
            suggested_max_bid: row
                .suggested_max_bid
                .filter(|b| *b != 0.0)
                .map(round2)
                .unwrap_or_else(|| bids.suggested_max_bid(row.price)),
            saved_at: row.saved_at,
            item_name: row.item_name,
            category: row.category,
            marketplace,
        })
    }
}
