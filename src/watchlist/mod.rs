pub mod entry;
pub mod guard;
pub mod kv;
pub mod settings;
pub mod store;

pub use entry::{BidDefaults, WatchCandidate, WatchlistEntry};
pub use guard::{SaveFlag, SaveGuard};
pub use kv::{KeyValueStore, MemoryStore, SqliteStore};
pub use settings::{SettingsSnapshot, UserSettings};
pub use store::{AddManySummary, AddOutcome, ImportPolicy, ImportSummary, WatchlistStore};
