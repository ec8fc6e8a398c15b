use std::sync::Arc;

use super::kv::KeyValueStore;
use crate::core::config::DEFAULT_BUDGET;
use crate::core::{FlipperError, Result};
use crate::scanner::ScanFilters;

pub const THUMBNAIL_DISPLAY_KEY: &str = "thumbnailDisplay";
pub const CONFIDENCE_LIMIT_KEY: &str = "confidenceLimit";
pub const PROFIT_LIMIT_KEY: &str = "profitLimit";
pub const USER_BUDGET_KEY: &str = "userBudget";

/// Snapshot of every persisted preference.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsSnapshot {
    pub thumbnail_display: bool,
    pub confidence_limit: f64,
    pub profit_limit: f64,
    pub user_budget: f64,
}

impl SettingsSnapshot {
    /// Copy the limits and budget onto scan filters.
    pub fn apply_to(&self, filters: &mut ScanFilters) {
        filters.confidence_limit = self.confidence_limit;
        filters.profit_limit = self.profit_limit;
        filters.budget = self.user_budget;
    }
}

/// Typed access to the user preferences kept next to the watchlist.
pub struct UserSettings {
    storage: Arc<dyn KeyValueStore>,
    default_budget: f64,
}

impl UserSettings {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            default_budget: DEFAULT_BUDGET,
        }
    }

    /// Budget reported while none is stored.
    pub fn with_default_budget(mut self, budget: f64) -> Self {
        if budget.is_finite() && budget > 0.0 {
            self.default_budget = budget;
        }
        self
    }

    pub async fn thumbnail_display(&self) -> Result<bool> {
        Ok(self
            .storage
            .get(THUMBNAIL_DISPLAY_KEY)
            .await?
            .is_some_and(|v| v != "false"))
    }

    pub async fn set_thumbnail_display(&self, enabled: bool) -> Result<()> {
        self.storage
            .set(THUMBNAIL_DISPLAY_KEY, if enabled { "true" } else { "false" })
            .await
    }

    pub async fn confidence_limit(&self) -> Result<f64> {
        let limit = self.read_number(CONFIDENCE_LIMIT_KEY).await?.unwrap_or(0.0);
        Ok(limit.clamp(0.0, 100.0))
    }

    pub async fn set_confidence_limit(&self, limit: f64) -> Result<()> {
        if !(0.0..=100.0).contains(&limit) {
            return Err(FlipperError::validation(
                "Confidence limit must be between 0 and 100.",
            ));
        }
        self.storage
            .set(CONFIDENCE_LIMIT_KEY, &limit.to_string())
            .await
    }

    pub async fn profit_limit(&self) -> Result<f64> {
        let limit = self.read_number(PROFIT_LIMIT_KEY).await?.unwrap_or(0.0);
        Ok(limit.max(0.0))
    }

    pub async fn set_profit_limit(&self, limit: f64) -> Result<()> {
        if !limit.is_finite() || limit < 0.0 {
            return Err(FlipperError::validation("Profit limit cannot be negative."));
        }
        self.storage.set(PROFIT_LIMIT_KEY, &limit.to_string()).await
    }

    /// Stored budget, or the default when absent or not positive.
    pub async fn user_budget(&self) -> Result<f64> {
        Ok(self
            .read_number(USER_BUDGET_KEY)
            .await?
            .filter(|b| *b > 0.0)
            .unwrap_or(self.default_budget))
    }

    pub async fn set_user_budget(&self, budget: f64) -> Result<()> {
        if !budget.is_finite() || budget <= 0.0 {
            return Err(FlipperError::validation(
                "Please enter a valid budget greater than 0.",
            ));
        }
        self.storage
            .set(USER_BUDGET_KEY, &format!("{:.2}", budget))
            .await?;
        tracing::info!("💰 Budget set to ${:.2}", budget);
        Ok(())
    }

    pub async fn snapshot(&self) -> Result<SettingsSnapshot> {
        Ok(SettingsSnapshot {
            thumbnail_display: self.thumbnail_display().await?,
            confidence_limit: self.confidence_limit().await?,
            profit_limit: self.profit_limit().await?,
            user_budget: self.user_budget().await?,
        })
    }

    async fn read_number(&self, key: &str) -> Result<Option<f64>> {
        let Some(raw) = self.storage.get(key).await? else {
            return Ok(None);
        };
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Some(value)),
            _ => {
                tracing::warn!("Ignoring unreadable {} setting: {:?}", key, raw);
                Ok(Some(0.0))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watchlist::kv::MemoryStore;

    fn settings() -> (Arc<MemoryStore>, UserSettings) {
        let memory = Arc::new(MemoryStore::new());
        (memory.clone(), UserSettings::new(memory))
    }

    #[tokio::test]
    async fn test_defaults() {
        let (_, settings) = settings();
        let snapshot = settings.snapshot().await.unwrap();
        assert!(!snapshot.thumbnail_display);
        assert_eq!(snapshot.confidence_limit, 0.0);
        assert_eq!(snapshot.profit_limit, 0.0);
        assert_eq!(snapshot.user_budget, DEFAULT_BUDGET);
    }

    #[tokio::test]
    async fn test_thumbnail_flag_reads_anything_but_false_as_true() {
        let (memory, settings) = settings();
        memory.set(THUMBNAIL_DISPLAY_KEY, "yes").await.unwrap();
        assert!(settings.thumbnail_display().await.unwrap());

        settings.set_thumbnail_display(false).await.unwrap();
        assert!(!settings.thumbnail_display().await.unwrap());
    }

    #[tokio::test]
    async fn test_unparseable_limit_reads_as_zero() {
        let (memory, settings) = settings();
        memory.set(CONFIDENCE_LIMIT_KEY, "abc").await.unwrap();
        assert_eq!(settings.confidence_limit().await.unwrap(), 0.0);

        memory.set(USER_BUDGET_KEY, "-5").await.unwrap();
        assert_eq!(settings.user_budget().await.unwrap(), DEFAULT_BUDGET);

        let settings = UserSettings::new(memory).with_default_budget(500.0);
        assert_eq!(settings.user_budget().await.unwrap(), 500.0);
    }

    #[tokio::test]
    async fn test_setters_validate() {
        let (memory, settings) = settings();
        assert!(settings.set_confidence_limit(101.0).await.is_err());
        assert!(settings.set_profit_limit(-1.0).await.is_err());
        assert!(settings.set_user_budget(0.0).await.is_err());

        settings.set_confidence_limit(70.0).await.unwrap();
        settings.set_user_budget(250.5).await.unwrap();
        assert_eq!(
            memory.get(USER_BUDGET_KEY).await.unwrap().as_deref(),
            Some("250.50")
        );

        let mut filters = ScanFilters::default();
        settings.snapshot().await.unwrap().apply_to(&mut filters);
        assert_eq!(filters.confidence_limit, 70.0);
        assert_eq!(filters.budget, 250.5);
    }
}
