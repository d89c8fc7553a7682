//! File-backed stores
//!
//! Every store is a single JSON document that is read whole and rewritten
//! whole. Missing or malformed files are treated as empty.

pub mod history;
pub mod json_file;
pub mod travel_cache;

pub use history::HistoryStore;
pub use travel_cache::{CacheLookup, TravelCache, TravelCacheEntry};
