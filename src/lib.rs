pub mod api;
pub mod core;
pub mod scanner;
pub mod watchlist;
