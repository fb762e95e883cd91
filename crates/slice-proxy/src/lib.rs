//! Byte-range-aware caching proxy.
//!
//! Clients ask for a sub-range of a remote resource; the proxy serves it
//! from the in-process range cache or fetches it from the origin, answers
//! the caller, and populates the cache off the request path.

pub mod config;
pub mod error;
pub mod origin;
pub mod proxy;
pub mod range;
pub mod stats;
