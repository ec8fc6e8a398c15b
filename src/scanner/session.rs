use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

use super::catalog::CatalogStore;
use super::engine::{self, CategoryFilter, PageInfo, Pagination, ScanFilters, ScanPage, ScanStatus, SortKey};
use super::item::ScannedItem;
use super::market::sell_time;
use super::metrics::ScanMetrics;
use crate::core::config::DEFAULT_PAGE_SIZE;
use crate::core::{round2, Result};

/// Sums over the selected items, shown next to the budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Toolbar {
    pub total_buy_price: f64,
    pub total_profit: f64,
    pub budget: f64,
}

impl Toolbar {
    pub fn remaining_budget(&self) -> f64 {
        round2(self.budget - self.total_buy_price)
    }
}

/// Profit breakdown for one scanned item against a budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfitAnalysis {
    pub item_name: String,
    pub price: f64,
    pub sell_price: f64,
    pub profit: f64,
    pub profit_percent: f64,
    pub starting_bid: f64,
    pub suggested_max_bid: f64,
    pub sell_time: &'static str,
    pub suggestion: Option<String>,
}

/// Per-user scan state: filters, sort, current page, the last results
/// (looked up by display id) and the selection.
pub struct ScanSession {
    pub filters: ScanFilters,
    pub sort: SortKey,
    page: usize,
    page_size: usize,
    results: Vec<ScannedItem>,
    index: HashMap<String, usize>,
    status: Option<ScanStatus>,
    selected: BTreeSet<String>,
    metrics: Arc<ScanMetrics>,
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, Arc::new(ScanMetrics::new()))
    }
}

impl ScanSession {
    pub fn new(page_size: usize, metrics: Arc<ScanMetrics>) -> Self {
        Self {
            filters: ScanFilters::default(),
            sort: SortKey::default(),
            page: 1,
            page_size: page_size.max(1),
            results: Vec::new(),
            index: HashMap::new(),
            status: None,
            selected: BTreeSet::new(),
            metrics,
        }
    }

    pub fn with_filters(mut self, filters: ScanFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Switching category starts over from the first page.
    pub fn set_category(&mut self, category: &str) {
        self.filters.category = CategoryFilter::parse(category);
        self.page = 1;
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.page_size)
    }

    /// Run a scan over the current catalog. The current page is kept even
    /// if the new result no longer reaches it.
    pub async fn scan(&mut self, catalog: &CatalogStore) -> Result<ScanPage> {
        let buckets = catalog.snapshot().await;
        let started = Instant::now();

        let outcome = match engine::scan(&buckets, &self.filters, self.sort) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.reset_results();
                return Err(e);
            }
        };

        self.metrics
            .record_scan(outcome.items.len(), outcome.duplicates_skipped, started.elapsed());

        self.index = outcome
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.id.clone(), i))
            .collect();
        self.results = outcome.items;
        self.status = Some(outcome.status);

        let index = &self.index;
        self.selected.retain(|id| index.contains_key(id));

        tracing::debug!(
            "Rendered {} items (category: {}, sort: {})",
            self.results.len(),
            self.filters.category,
            self.sort
        );

        Ok(self.current_page())
    }

    fn reset_results(&mut self) {
        self.results.clear();
        self.index.clear();
        self.status = None;
        self.selected.clear();
    }

    pub fn go_to_page(&mut self, page: usize) -> ScanPage {
        self.page = page;
        self.current_page()
    }

    pub fn current_page(&self) -> ScanPage {
        let pagination = self.pagination();
        let items = engine::paginate(&self.results, pagination).to_vec();
        ScanPage {
            has_valid_items: !items.is_empty(),
            info: PageInfo::new(self.results.len(), pagination),
            items,
            status: self.status.clone().unwrap_or(ScanStatus::NoCategories),
        }
    }

    pub fn results(&self) -> &[ScannedItem] {
        &self.results
    }

    /// Full item data for a display id from the last scan.
    pub fn item(&self, id: &str) -> Option<&ScannedItem> {
        self.index.get(id).map(|&i| &self.results[i])
    }

    pub fn select(&mut self, id: &str) -> bool {
        if self.index.contains_key(id) {
            self.selected.insert(id.to_string())
        } else {
            false
        }
    }

    pub fn deselect(&mut self, id: &str) -> bool {
        self.selected.remove(id)
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn selected_items(&self) -> Vec<&ScannedItem> {
        self.selected.iter().filter_map(|id| self.item(id)).collect()
    }

    pub fn toolbar(&self, budget: f64) -> Toolbar {
        let selected = self.selected_items();
        Toolbar {
            total_buy_price: round2(selected.iter().map(|item| item.price).sum()),
            total_profit: round2(selected.iter().map(|item| item.profit).sum()),
            budget,
        }
    }

    pub fn analyze(&self, id: &str, budget: f64) -> Option<ProfitAnalysis> {
        let item = self.item(id)?;
        let sell_price = engine::sell_price(item.price);
        let profit = round2(sell_price - item.price);
        let profit_percent = if item.price > 0.0 {
            round2(profit / item.price * 100.0)
        } else {
            0.0
        };
        let suggestion = (budget < item.price && item.price > 0.0).then(|| {
            format!(
                "Budget too low! Suggested budget for {}: ${:.2} or higher.",
                item.item_name, item.price
            )
        });

        Some(ProfitAnalysis {
            item_name: item.item_name.clone(),
            price: item.price,
            sell_price,
            profit,
            profit_percent,
            starting_bid: item.starting_bid,
            suggested_max_bid: item.suggested_max_bid,
            sell_time: sell_time(&item.marketplace, &item.category),
            suggestion,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::item::{Marketplace, NormalizedItem};

    fn item(name: &str, price: f64) -> NormalizedItem {
        NormalizedItem {
            item_name: name.to_string(),
            category_path: "Electronics".to_string(),
            price,
            confidence: 80.0,
            marketplace: Marketplace::Ebay,
            id: format!("id-{}", name),
            starting_bid: round2(price * 0.8),
            suggested_max_bid: price,
            image: None,
            images: Vec::new(),
        }
    }

    async fn loaded_catalog(count: usize) -> CatalogStore {
        let catalog = CatalogStore::default();
        catalog
            .replace((0..count).map(|i| item(&format!("Item {}", i), 10.0 + i as f64)).collect())
            .await;
        catalog
    }

    #[tokio::test]
    async fn test_scan_and_lookup_by_id() {
        let catalog = loaded_catalog(3).await;
        let mut session = ScanSession::default();
        let page = session.scan(&catalog).await.unwrap();

        assert!(page.has_valid_items);
        let id = page.items[0].id.clone();
        assert_eq!(session.item(&id).unwrap().item_name, page.items[0].item_name);
        assert!(session.item("item-missing").is_none());
    }

    #[tokio::test]
    async fn test_budget_shrink_keeps_page() {
        let catalog = loaded_catalog(65).await;
        let mut session = ScanSession::default();
        session.scan(&catalog).await.unwrap();

        let page = session.go_to_page(3);
        assert_eq!(page.items.len(), 5);

        session.filters.budget = 20.0;
        let page = session.scan(&catalog).await.unwrap();
        assert!(page.items.is_empty());
        assert!(session.results().iter().all(|i| i.price <= 20.0));
        assert_eq!(page.info.page, 3);
    }

    #[tokio::test]
    async fn test_selection_survives_rescan() {
        let catalog = loaded_catalog(3).await;
        let mut session = ScanSession::default();
        let page = session.scan(&catalog).await.unwrap();
        let id = page.items[0].id.clone();
        assert!(session.select(&id));
        assert!(!session.select("unknown"));

        session.scan(&catalog).await.unwrap();
        assert_eq!(session.selected_items().len(), 1);

        let toolbar = session.toolbar(100.0);
        assert_eq!(toolbar.total_buy_price, session.item(&id).unwrap().price);
    }

    #[tokio::test]
    async fn test_category_change_resets_page() {
        let catalog = loaded_catalog(40).await;
        let mut session = ScanSession::default();
        session.scan(&catalog).await.unwrap();
        session.go_to_page(2);

        session.set_category("electronics");
        assert_eq!(session.pagination().page, 1);
    }

    #[tokio::test]
    async fn test_analyze_suggests_budget() {
        let catalog = loaded_catalog(1).await;
        let mut session = ScanSession::default();
        let page = session.scan(&catalog).await.unwrap();
        let id = page.items[0].id.clone();

        let analysis = session.analyze(&id, 5.0).unwrap();
        assert_eq!(analysis.sell_price, 12.0);
        assert_eq!(analysis.profit, 2.0);
        assert_eq!(analysis.profit_percent, 20.0);
        assert_eq!(analysis.sell_time, "3-7 days");
        assert!(analysis.suggestion.unwrap().contains("$10.00"));

        assert!(session.analyze(&id, 50.0).unwrap().suggestion.is_none());
    }

    #[tokio::test]
    async fn test_failed_validation_clears_results() {
        let catalog = loaded_catalog(2).await;
        let mut session = ScanSession::default();
        session.scan(&catalog).await.unwrap();

        session.filters.marketplaces.clear();
        assert!(session.scan(&catalog).await.is_err());
        assert!(session.results().is_empty());
    }
}
