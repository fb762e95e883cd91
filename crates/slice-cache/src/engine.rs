use crate::error::CacheError;
use crate::heap::{EntryRef, EvictionHeap, HeapNode};
use crate::index::{CacheEntry, RangeIndex};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Snapshot of engine counters.
#[derive(Clone, Debug, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
    pub current_bytes: usize,
    pub max_bytes: usize,
}

/// Range-indexed LRU cache with a global byte budget.
///
/// Entries are contiguous byte spans keyed by source URL. Each source keeps
/// its spans sorted in a [`RangeIndex`]; one min-heap over last-access
/// ticks orders eviction across all sources. A single lock guards the
/// source map, the heap, and the byte counter — they must always move
/// together, and one lock rules out any ordering hazard between them.
///
/// Payload bytes are copied on the way in and on the way out; callers never
/// alias cache-owned storage.
pub struct CacheEngine {
    max_bytes: usize,
    state: Mutex<EngineState>,
}

#[derive(Default)]
struct EngineState {
    sources: HashMap<Arc<str>, RangeIndex>,
    heap: EvictionHeap,
    current_bytes: usize,
    clock: u64,
    next_id: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl EngineState {
    /// Logical access clock. Strictly monotonic so recency comparisons
    /// never tie, unlike wall-clock seconds.
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Evict least-recently-used entries until `needed` bytes of headroom
    /// exist. Whole entries only; an entry is never partially freed.
    ///
    /// Callers must ensure `needed <= max_bytes`. The heap draining before
    /// headroom is found means the one-node-per-entry pairing was broken,
    /// which is worth dying loudly for.
    fn evict(&mut self, needed: usize, max_bytes: usize) {
        while max_bytes - self.current_bytes < needed {
            let Some(node) = self.heap.pop_min() else {
                panic!(
                    "eviction heap drained with {} bytes of headroom still owed",
                    needed - (max_bytes - self.current_bytes)
                );
            };
            let victim = node.entry;

            let Some(index) = self.sources.get_mut(victim.source.as_ref()) else {
                panic!("eviction heap references unknown source {}", victim.source);
            };

            // Containment search first, per the index's lookup contract.
            // Under the overlapping-insert pathology it can land on a
            // different entry than this node tracks, so fall back to
            // identity to keep node and entry lifetimes paired.
            let slot = index
                .find(victim.start, victim.end)
                .filter(|&i| index.entry_at(i).id == victim.id)
                .or_else(|| index.position_of(victim.id));
            let Some(slot) = slot else {
                panic!("eviction heap references missing entry {}", victim.id);
            };

            let (freed, source_drained) = {
                let entry = index.remove(slot);
                (entry.size(), index.is_empty())
            };
            self.current_bytes -= freed;
            self.evictions += 1;

            tracing::debug!(
                source = %victim.source,
                start = victim.start,
                end = victim.end,
                freed,
                "evicted range"
            );

            if source_drained {
                self.sources.remove(victim.source.as_ref());
            }
        }
    }
}

impl CacheEngine {
    pub fn new(max_bytes: usize) -> Self {
        assert!(max_bytes > 0, "cache budget must be > 0");
        Self {
            max_bytes,
            state: Mutex::new(EngineState::default()),
        }
    }

    /// Budget expressed in megabytes, as the service config does.
    pub fn with_capacity_mb(mb: usize) -> Self {
        Self::new(mb * 1_000_000)
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Stores a copy of `buffer` as the cached content of `[start, end)`
    /// for `source`, evicting least-recently-used entries (across all
    /// sources) as needed to respect the byte budget.
    pub fn put(&self, start: u64, end: u64, buffer: &[u8], source: &str) -> Result<(), CacheError> {
        if end <= start {
            return Err(CacheError::InvalidRange { start, end });
        }
        if buffer.len() as u64 != end - start {
            return Err(CacheError::LengthMismatch {
                start,
                end,
                len: buffer.len(),
            });
        }
        if source.is_empty() {
            return Err(CacheError::EmptySourceKey);
        }
        if buffer.len() > self.max_bytes {
            return Err(CacheError::TooLarge {
                len: buffer.len(),
                max_bytes: self.max_bytes,
            });
        }

        let mut state = self.state.lock();

        if state.current_bytes + buffer.len() > self.max_bytes {
            state.evict(buffer.len(), self.max_bytes);
        }

        let id = state.next_id;
        state.next_id += 1;
        let access = state.tick();
        let source_key: Arc<str> = Arc::from(source);

        state.heap.push(HeapNode {
            access,
            entry: EntryRef {
                id,
                source: Arc::clone(&source_key),
                start,
                end,
            },
        });
        state.current_bytes += buffer.len();
        state.sources.entry(source_key).or_default().insert(CacheEntry {
            id,
            start,
            end,
            payload: Bytes::copy_from_slice(buffer),
        });

        Ok(())
    }

    /// Returns a copy of the bytes for `[start, end)` if some cached entry
    /// for `source` fully contains the range, refreshing that entry's
    /// recency. Never mutates entry contents or positions.
    pub fn get(&self, start: u64, end: u64, source: &str) -> Result<Bytes, CacheError> {
        let mut state = self.state.lock();

        let found = match state.sources.get(source) {
            Some(index) => index.find(start, end).map(|slot| {
                let entry = index.entry_at(slot);
                let lo = (start - entry.start) as usize;
                let hi = (end - entry.start) as usize;
                (entry.id, Bytes::copy_from_slice(&entry.payload[lo..hi]))
            }),
            None => None,
        };

        match found {
            Some((id, bytes)) => {
                let access = state.tick();
                state.heap.touch(id, access);
                state.hits += 1;
                Ok(bytes)
            }
            None => {
                state.misses += 1;
                Err(CacheError::Miss)
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            entries: state.heap.len(),
            current_bytes: state.current_bytes,
            max_bytes: self.max_bytes,
        }
    }
}
