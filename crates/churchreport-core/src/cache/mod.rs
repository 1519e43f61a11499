//! Opt-in debug cache for enriched rosters.
//!
//! Building a roster costs one request per person plus one per child, so
//! during template work the finished roster can be stored as JSON and
//! reused. Snapshots never expire; delete the files to refresh them.

pub mod manager;

pub use manager::{CacheManager, CachedData};
