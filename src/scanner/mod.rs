pub mod catalog;
pub mod engine;
pub mod item;
pub mod market;
pub mod metrics;
pub mod name_cleaner;
pub mod normalizer;
pub mod session;

pub use catalog::{Buckets, CatalogStore};
pub use engine::{
    scan, scan_page, CategoryFilter, PageInfo, Pagination, ScanFilters, ScanOutcome, ScanPage,
    ScanStatus, SortDirection, SortField, SortKey,
};
pub use item::{Marketplace, NormalizedItem, ScannedItem};
pub use metrics::{MetricsSnapshot, ScanMetrics};
pub use name_cleaner::{CategoryPathCleaner, NameCleaner, PassthroughCleaner};
pub use normalizer::Normalizer;
pub use session::{ProfitAnalysis, ScanSession, Toolbar};
