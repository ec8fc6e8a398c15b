pub mod client;
pub mod types;

pub use client::MarketplaceClient;
pub use types::*;
