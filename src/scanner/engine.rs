use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use super::catalog::Buckets;
use super::item::{Marketplace, NormalizedItem, ScannedItem};
use super::normalizer::content_hash;
use crate::core::config::DEFAULT_PAGE_SIZE;
use crate::core::{round2, FlipperError, Result, StatusMessage};

pub const CONFIDENCE_FLOOR: f64 = 50.0;
pub const CONFIDENCE_CEILING: f64 = 90.0;
pub const RESALE_MARKUP: f64 = 1.2;

pub fn clamp_confidence(confidence: f64) -> f64 {
    confidence.clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING)
}

pub fn sell_price(price: f64) -> f64 {
    round2(price * RESALE_MARKUP)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Confidence,
    Profit,
    Price,
    ItemName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Parsed form of `field-direction`, e.g. `price-desc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortKey {
    fn default() -> Self {
        Self {
            field: SortField::Confidence,
            direction: SortDirection::Desc,
        }
    }
}

impl FromStr for SortKey {
    type Err = FlipperError;

    fn from_str(s: &str) -> Result<Self> {
        let (field, direction) = s
            .split_once('-')
            .ok_or_else(|| FlipperError::validation(format!("Invalid sort key: {}", s)))?;

        let field = match field {
            "confidence" => SortField::Confidence,
            "profit" => SortField::Profit,
            "price" => SortField::Price,
            "itemName" | "itemname" | "name" => SortField::ItemName,
            other => return Err(FlipperError::validation(format!("Unknown sort field: {}", other))),
        };
        let direction = match direction {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            other => {
                return Err(FlipperError::validation(format!(
                    "Unknown sort direction: {}",
                    other
                )))
            }
        };

        Ok(Self { field, direction })
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self.field {
            SortField::Confidence => "confidence",
            SortField::Profit => "profit",
            SortField::Price => "price",
            SortField::ItemName => "itemName",
        };
        let direction = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{}-{}", field, direction)
    }
}

impl SortKey {
    fn compare(&self, a: &ScannedItem, b: &ScannedItem) -> Ordering {
        let ordering = match self.field {
            SortField::Confidence => a.confidence.total_cmp(&b.confidence),
            SortField::Profit => a.profit.total_cmp(&b.profit),
            SortField::Price => a.price.total_cmp(&b.price),
            SortField::ItemName => a
                .item_name
                .to_lowercase()
                .cmp(&b.item_name.to_lowercase())
                .then_with(|| a.item_name.cmp(&b.item_name)),
        };
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// `all` or a bucket-name prefix, matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Prefix(String),
}

impl CategoryFilter {
    pub fn parse(category: &str) -> Self {
        let category = category.trim();
        if category.is_empty() || category.eq_ignore_ascii_case("all") {
            CategoryFilter::All
        } else {
            CategoryFilter::Prefix(category.to_lowercase())
        }
    }

    pub fn matches(&self, bucket: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Prefix(prefix) => bucket.to_lowercase().starts_with(prefix.as_str()),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Prefix(prefix) => f.write_str(prefix),
        }
    }
}

/// User thresholds applied by a scan. Every filter must pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanFilters {
    pub category: CategoryFilter,
    pub marketplaces: Vec<Marketplace>,
    pub query: String,
    pub confidence_limit: f64,
    pub profit_limit: f64,
    pub budget: f64,
}

impl Default for ScanFilters {
    fn default() -> Self {
        Self {
            category: CategoryFilter::All,
            marketplaces: vec![Marketplace::Ebay, Marketplace::Amazon],
            query: String::new(),
            confidence_limit: 0.0,
            profit_limit: 0.0,
            budget: crate::core::config::DEFAULT_BUDGET,
        }
    }
}

impl ScanFilters {
    pub fn validate(&self) -> Result<()> {
        if !self.budget.is_finite() || self.budget <= 0.0 {
            return Err(FlipperError::validation(
                "Please enter a valid budget greater than 0.",
            ));
        }
        if self.marketplaces.is_empty() {
            return Err(FlipperError::validation(
                "Please select at least one marketplace.",
            ));
        }
        Ok(())
    }

    fn normalized_query(&self) -> String {
        self.query.trim().to_lowercase()
    }
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self {
            page,
            page_size: page_size.max(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

impl PageInfo {
    pub fn new(total_items: usize, pagination: Pagination) -> Self {
        let total_pages = total_items.div_ceil(pagination.page_size);
        Self {
            page: pagination.page,
            total_pages,
            total_items,
            has_prev: pagination.page > 1,
            has_next: pagination.page < total_pages,
        }
    }
}

/// Slice of `items` for a 1-based page. Out-of-range pages are empty.
pub fn paginate(items: &[ScannedItem], pagination: Pagination) -> &[ScannedItem] {
    if pagination.page == 0 {
        return &[];
    }
    let start = (pagination.page - 1).saturating_mul(pagination.page_size);
    if start >= items.len() {
        return &[];
    }
    let end = (start + pagination.page_size).min(items.len());
    &items[start..end]
}

/// Why a scan produced what it did.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanStatus {
    Loaded,
    NoCategories,
    NoQueryMatches {
        query: String,
    },
    NoneMeetLimits {
        confidence_limit: f64,
        profit_limit: f64,
        budget: f64,
    },
}

impl ScanStatus {
    pub fn message(&self) -> StatusMessage {
        match self {
            ScanStatus::Loaded => {
                StatusMessage::info("Scanned items loaded. Select an item to save to watchlist.")
            }
            ScanStatus::NoCategories => {
                StatusMessage::error("No valid categories in marketplace data.")
            }
            ScanStatus::NoQueryMatches { query } => StatusMessage::error(format!(
                "No items matching \"{}\" found within budget.",
                query
            )),
            ScanStatus::NoneMeetLimits {
                confidence_limit,
                profit_limit,
                budget,
            } => StatusMessage::error(format!(
                "No items meet the limits (conf ≥ {}%, profit ≥ ${}, budget ≥ ${:.2}).",
                confidence_limit, profit_limit, budget
            )),
        }
    }
}

/// Ordered result of one scan.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub items: Vec<ScannedItem>,
    pub status: ScanStatus,
    pub duplicates_skipped: usize,
}

impl ScanOutcome {
    pub fn has_valid_items(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn page(&self, pagination: Pagination) -> &[ScannedItem] {
        paginate(&self.items, pagination)
    }

    pub fn page_info(&self, pagination: Pagination) -> PageInfo {
        PageInfo::new(self.items.len(), pagination)
    }
}

/// One page of a scan, ready to display.
#[derive(Debug, Clone)]
pub struct ScanPage {
    pub items: Vec<ScannedItem>,
    pub info: PageInfo,
    pub has_valid_items: bool,
    pub status: ScanStatus,
}

/// Filter, de-duplicate and sort the catalog.
///
/// Buckets are visited in name order so that "first occurrence" during
/// de-duplication does not depend on map iteration order.
pub fn scan(catalog: &Buckets, filters: &ScanFilters, sort: SortKey) -> Result<ScanOutcome> {
    filters.validate()?;

    let mut buckets: Vec<(&String, &Vec<NormalizedItem>)> = catalog
        .iter()
        .filter(|(bucket, items)| !items.is_empty() && filters.category.matches(bucket))
        .collect();
    buckets.sort_by(|a, b| a.0.cmp(b.0));

    if buckets.is_empty() {
        return Ok(ScanOutcome {
            items: Vec::new(),
            status: ScanStatus::NoCategories,
            duplicates_skipped: 0,
        });
    }

    let query = filters.normalized_query();
    let mut seen: HashSet<String> = HashSet::new();
    let mut duplicates_skipped = 0;
    let mut items = Vec::new();

    for (bucket, bucket_items) in buckets {
        for (index, data) in bucket_items.iter().enumerate() {
            if data.item_name.is_empty() || !data.price.is_finite() || !data.confidence.is_finite() {
                tracing::warn!("Invalid item data in {}: {:?}", bucket, data.item_name);
                continue;
            }
            if !filters.marketplaces.contains(&data.marketplace) {
                continue;
            }
            if !query.is_empty() && !data.item_name.to_lowercase().contains(&query) {
                continue;
            }
            if data.price > filters.budget {
                tracing::trace!("Skipping {} due to budget {} > {}", data.item_name, data.price, filters.budget);
                continue;
            }

            let confidence = clamp_confidence(data.confidence);
            let sell_price = sell_price(data.price);
            let profit = sell_price - data.price;
            if confidence < filters.confidence_limit || profit < filters.profit_limit {
                continue;
            }

            let source_id = if data.id.is_empty() {
                index.to_string()
            } else {
                data.id.clone()
            };
            let key = dedupe_key(data, bucket, &source_id);
            if !seen.insert(key.clone()) {
                duplicates_skipped += 1;
                tracing::debug!(
                    "Skipping duplicate item in scan: {} from {} ({})",
                    data.item_name,
                    data.marketplace,
                    bucket
                );
                continue;
            }

            items.push(ScannedItem {
                id: format!("item-{}-{}", bucket, content_hash(&[key.as_str()])),
                source_id,
                item_name: data.item_name.clone(),
                category: bucket.clone(),
                category_path: data.category_path.clone(),
                price: data.price,
                confidence,
                profit,
                sell_price,
                marketplace: data.marketplace.clone(),
                starting_bid: data.starting_bid,
                suggested_max_bid: data.suggested_max_bid,
                image: data.image.clone(),
                images: data.images.clone(),
            });
        }
    }

    items.sort_by(|a, b| sort.compare(a, b));

    let status = if !items.is_empty() {
        ScanStatus::Loaded
    } else if !query.is_empty() {
        ScanStatus::NoQueryMatches { query }
    } else {
        ScanStatus::NoneMeetLimits {
            confidence_limit: filters.confidence_limit,
            profit_limit: filters.profit_limit,
            budget: filters.budget,
        }
    };

    Ok(ScanOutcome {
        items,
        status,
        duplicates_skipped,
    })
}

/// `scan` followed by pagination.
pub fn scan_page(
    catalog: &Buckets,
    filters: &ScanFilters,
    sort: SortKey,
    pagination: Pagination,
) -> Result<ScanPage> {
    let outcome = scan(catalog, filters, sort)?;
    let items = outcome.page(pagination).to_vec();
    Ok(ScanPage {
        has_valid_items: !items.is_empty(),
        info: outcome.page_info(pagination),
        items,
        status: outcome.status,
    })
}

// Category half of the key is the bucket; the path is display-only.
fn dedupe_key(item: &NormalizedItem, bucket: &str, source_id: &str) -> String {
    format!(
        "{}\u{1f}{}\u{1f}{}\u{1f}{}",
        item.item_name.to_lowercase(),
        item.marketplace,
        bucket,
        source_id
    )
}
