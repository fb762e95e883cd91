use thiserror::Error;

/// Errors surfaced by [`CacheEngine`](crate::engine::CacheEngine).
///
/// `Miss` is the expected/common case and drives the caller's fallback
/// fetch; the remaining variants reject malformed insertions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    /// No cached entry fully contains the requested range.
    #[error("value not in cache")]
    Miss,

    /// Ranges are half-open and must be non-empty.
    #[error("invalid range {start}..{end}")]
    InvalidRange { start: u64, end: u64 },

    /// Buffer length must equal the declared range width.
    #[error("buffer of {len} bytes does not match range {start}..{end}")]
    LengthMismatch { start: u64, end: u64, len: usize },

    /// The payload can never fit, even into an empty cache.
    #[error("entry of {len} bytes exceeds cache budget of {max_bytes} bytes")]
    TooLarge { len: usize, max_bytes: usize },

    /// Source keys partition the cache and must be non-empty.
    #[error("empty source key")]
    EmptySourceKey,
}
