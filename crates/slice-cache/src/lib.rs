//! Range-indexed in-memory LRU cache.
//!
//! Entries are contiguous byte spans keyed by source URL. Each source keeps
//! its spans in a sorted index; a single global min-heap over last-access
//! ticks drives size-budget eviction across all sources.

pub mod engine;
pub mod error;
mod heap;
mod index;

pub use engine::{CacheEngine, CacheStats};
pub use error::CacheError;
