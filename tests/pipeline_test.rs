use flipper_scanner::api::MarketplaceClient;
use flipper_scanner::core::config::SourcesConfig;
use flipper_scanner::scanner::{
    CatalogStore, Marketplace, Normalizer, ScanMetrics, ScanSession, ScanStatus,
};
use flipper_scanner::watchlist::{
    AddOutcome, MemoryStore, SqliteStore, WatchCandidate, WatchlistStore,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

struct Fixture {
    dir: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("flipper-pipeline-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        Self { dir }
    }

    fn write(&self, name: &str, body: serde_json::Value) -> String {
        let path = self.dir.join(name);
        std::fs::write(&path, body.to_string()).unwrap();
        path.to_string_lossy().into_owned()
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.dir).ok();
    }
}

fn sources(fixture: &Fixture) -> SourcesConfig {
    SourcesConfig {
        scored_items: Some(fixture.write(
            "scored_items.json",
            json!([
                {
                    "title": "Apple iPhone 12",
                    "categoryPath": "Electronics",
                    "price": 250.0,
                    "confidenceScore": 88,
                    "marketplace": "ebay",
                    "itemId": "v1|1234|0"
                },
                {
                    "title": "Apple iPhone 12",
                    "categoryPath": "Electronics",
                    "price": 250.0,
                    "confidenceScore": 88,
                    "marketplace": "ebay",
                    "itemId": "v1|1234|0"
                },
                "not an item"
            ]),
        )),
        amazon_items: Some(fixture.write(
            "items_amazon.json",
            json!([
                {
                    "Title": "Lego Classic Box",
                    "ASIN": "B00NHQFA1I",
                    "ListPrice": {"Amount": 4999},
                    "categoryName": "Toys & Games"
                }
            ]),
        )),
        ebay_items: Some(fixture.dir.join("missing.json").to_string_lossy().into_owned()),
        search_endpoint: "http://127.0.0.1:9/".to_string(),
        fetch_timeout_secs: 2,
    }
}

#[tokio::test]
async fn test_catalog_to_watchlist_pipeline() {
    let fixture = Fixture::new();
    let metrics = Arc::new(ScanMetrics::new());
    let client = assert_ok!(MarketplaceClient::new(sources(&fixture)));

    let catalog = CatalogStore::new(metrics.clone());
    let loaded = assert_ok!(catalog.load(&client, &Normalizer::default()).await);
    assert_eq!(loaded, 3);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.fetch_failures, 1);
    assert_eq!(snapshot.parse_failures, 1);

    let mut session = ScanSession::new(30, metrics.clone());
    let page = assert_ok!(session.scan(&catalog).await);
    assert_eq!(page.status, ScanStatus::Loaded);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].item_name, "Apple iPhone 12");
    assert_eq!(page.items[0].sell_price, 300.0);
    assert_eq!(page.items[1].marketplace, Marketplace::Amazon);
    assert_eq!(page.items[1].category, "toys");
    assert_eq!(page.items[1].price, 49.99);
    assert_eq!(page.items[1].confidence, 75.0);
    assert_eq!(metrics.snapshot().duplicates_skipped, 1);

    let storage = Arc::new(assert_ok!(SqliteStore::in_memory().await));
    let watchlist = WatchlistStore::new(storage);

    let candidates: Vec<WatchCandidate> = page.items.iter().map(WatchCandidate::from).collect();
    let summary = assert_ok!(watchlist.add_many(candidates).await);
    assert_eq!(summary.saved_count, 2);

    let again = assert_ok!(watchlist.add(WatchCandidate::from(&page.items[0])).await);
    assert!(matches!(again, AddOutcome::Duplicate(_)));

    let exported = assert_ok!(watchlist.export().await);

    let restored = WatchlistStore::new(Arc::new(MemoryStore::new()));
    let imported = assert_ok!(restored.import(&exported).await);
    assert_eq!(imported.added, 2);
    assert_eq!(assert_ok!(restored.get().await), assert_ok!(watchlist.get().await));

    let second = assert_ok!(restored.import(&exported).await);
    assert_eq!(second.added, 0);
    assert_eq!(second.duplicates, 2);
}

#[tokio::test]
async fn test_filters_narrow_the_scan() {
    let fixture = Fixture::new();
    let client = assert_ok!(MarketplaceClient::new(sources(&fixture)));
    let catalog = CatalogStore::default();
    assert_ok!(catalog.load(&client, &Normalizer::default()).await);

    let mut session = ScanSession::default();
    session.set_category("toy");
    let page = assert_ok!(session.scan(&catalog).await);
    assert_eq!(page.items.len(), 1);

    session.set_category("all");
    session.filters.budget = 100.0;
    session.filters.marketplaces = vec![Marketplace::Ebay];
    let page = assert_ok!(session.scan(&catalog).await);
    assert!(!page.has_valid_items);
    assert!(matches!(page.status, ScanStatus::NoneMeetLimits { .. }));

    session.filters.marketplaces.clear();
    assert_err!(session.scan(&catalog).await);
}
