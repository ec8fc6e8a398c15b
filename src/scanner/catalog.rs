use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::item::NormalizedItem;
use super::market::bucket_for;
use super::metrics::ScanMetrics;
use super::normalizer::Normalizer;
use crate::api::{MarketplaceClient, SourceLocation};
use crate::core::Result;

pub type Buckets = HashMap<String, Vec<NormalizedItem>>;

/// In-memory catalog of normalized items grouped by bucket.
///
/// Every load replaces the whole catalog. Loads are not coordinated with each
/// other: whichever finishes last is what scans see.
#[derive(Clone)]
pub struct CatalogStore {
    buckets: Arc<RwLock<Buckets>>,
    metrics: Arc<ScanMetrics>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new(Arc::new(ScanMetrics::new()))
    }
}

impl CatalogStore {
    pub fn new(metrics: Arc<ScanMetrics>) -> Self {
        Self {
            buckets: Arc::new(RwLock::new(HashMap::new())),
            metrics,
        }
    }

    /// Fetch every configured source, normalize and install the result.
    /// A failing source counts as empty.
    pub async fn load(&self, client: &MarketplaceClient, normalizer: &Normalizer) -> Result<usize> {
        tracing::info!("📦 Loading marketplace data...");
        self.metrics.increment_loads();

        let sources = client.catalog_sources();
        let fetches = sources
            .iter()
            .map(|source| Self::fetch_source(client, normalizer, source, &self.metrics));
        let results = futures::future::join_all(fetches).await;

        let items: Vec<NormalizedItem> = results.into_iter().flatten().collect();
        Ok(self.replace(items).await)
    }

    /// Replace the catalog with the results of a proxy search.
    pub async fn load_search(
        &self,
        client: &MarketplaceClient,
        normalizer: &Normalizer,
        query: &str,
    ) -> Result<usize> {
        tracing::info!("🔎 Loading search results for '{}'", query);
        self.metrics.increment_loads();

        let items = match client.search(query).await {
            Ok(results) => normalizer.normalize_search(&results),
            Err(e) => {
                tracing::error!("❌ Error fetching search data: {}", e);
                self.metrics.increment_fetch_failures();
                Vec::new()
            }
        };

        Ok(self.replace(items).await)
    }

    async fn fetch_source(
        client: &MarketplaceClient,
        normalizer: &Normalizer,
        source: &SourceLocation,
        metrics: &ScanMetrics,
    ) -> Vec<NormalizedItem> {
        match client.fetch_items(source).await {
            Ok(raw) => {
                let (items, skipped) = normalizer.normalize_all(source.kind, &raw);
                metrics.add_parse_failures(skipped as u64);
                tracing::debug!(
                    "✅ {}: {} items ({} skipped)",
                    source.kind.name(),
                    items.len(),
                    skipped
                );
                items
            }
            Err(e) => {
                tracing::warn!("Failed to load {}: {}", source.kind.name(), e);
                metrics.increment_fetch_failures();
                Vec::new()
            }
        }
    }

    /// Bucket and install already-normalized items. Returns the item count.
    pub async fn replace(&self, items: Vec<NormalizedItem>) -> usize {
        let count = items.len();
        let mut grouped: Buckets = HashMap::new();
        for item in items {
            let bucket = bucket_for(&item.category_path, &item.marketplace);
            grouped.entry(bucket.to_string()).or_default().push(item);
        }

        *self.buckets.write().await = grouped;
        self.metrics.add_items_loaded(count as u64);
        tracing::info!("✅ Catalog loaded: {} items", count);
        count
    }

    pub async fn snapshot(&self) -> Buckets {
        self.buckets.read().await.clone()
    }

    pub async fn is_empty(&self) -> bool {
        self.buckets.read().await.values().all(Vec::is_empty)
    }

    pub async fn len(&self) -> usize {
        self.buckets.read().await.values().map(Vec::len).sum()
    }

    /// Item counts per bucket, sorted by bucket name.
    pub async fn bucket_counts(&self) -> BTreeMap<String, usize> {
        self.buckets
            .read()
            .await
            .iter()
            .map(|(bucket, items)| (bucket.clone(), items.len()))
            .collect()
    }

    pub async fn clear(&self) {
        self.buckets.write().await.clear();
    }
}
