use bytes::Bytes;

/// Process-unique identity for a cache entry. The eviction heap refers to
/// entries by id instead of holding them.
pub(crate) type EntryId = u64;

/// One cached contiguous byte span for one source.
///
/// Offsets are half-open: `payload.len() == end - start`.
#[derive(Debug)]
pub(crate) struct CacheEntry {
    pub id: EntryId,
    pub start: u64,
    pub end: u64,
    pub payload: Bytes,
}

impl CacheEntry {
    pub fn size(&self) -> usize {
        self.payload.len()
    }
}

/// Per-source list of cached entries, kept sorted ascending by `start`
/// after every insert.
///
/// Overlapping or duplicate ranges may coexist; the index never merges,
/// splits, or rejects them. `find` assumes disjoint spans, so lookups that
/// touch overlapped offsets are deterministic for a given insertion order
/// but otherwise unspecified.
#[derive(Debug, Default)]
pub(crate) struct RangeIndex {
    entries: Vec<CacheEntry>,
}

impl RangeIndex {
    pub fn insert(&mut self, entry: CacheEntry) {
        #[cfg(debug_assertions)]
        self.flag_overlap(&entry);
        self.entries.push(entry);
        self.entries.sort_by_key(|e| e.start);
    }

    /// Binary search for the entry that fully contains `[start, end)`.
    ///
    /// A match requires `e.start <= start < e.end` and `end <= e.end`: a
    /// read is served from a single entry, never assembled from neighbors.
    pub fn find(&self, start: u64, end: u64) -> Option<usize> {
        let mut lower: isize = 0;
        let mut upper: isize = self.entries.len() as isize - 1;

        while lower <= upper {
            let mid = ((lower + upper) / 2) as usize;
            let e = &self.entries[mid];

            if e.start <= start && start < e.end {
                return if end <= e.end { Some(mid) } else { None };
            }

            if e.start < start {
                lower = mid as isize + 1;
            } else {
                upper = mid as isize - 1;
            }
        }

        None
    }

    /// Linear scan by identity. Fallback for eviction when overlapping
    /// inserts make `find` land on a different entry than the heap tracks.
    pub fn position_of(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn entry_at(&self, index: usize) -> &CacheEntry {
        &self.entries[index]
    }

    /// Removes in place, preserving the order of the remaining entries.
    pub fn remove(&mut self, index: usize) -> CacheEntry {
        self.entries.remove(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(debug_assertions)]
    fn flag_overlap(&self, entry: &CacheEntry) {
        for existing in &self.entries {
            if entry.start < existing.end && existing.start < entry.end {
                tracing::warn!(
                    new_start = entry.start,
                    new_end = entry.end,
                    old_start = existing.start,
                    old_end = existing.end,
                    "overlapping range inserted; lookups over the overlap are order-dependent"
                );
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: EntryId, start: u64, end: u64) -> CacheEntry {
        CacheEntry {
            id,
            start,
            end,
            payload: Bytes::from(vec![0u8; (end - start) as usize]),
        }
    }

    #[test]
    fn insert_keeps_start_order() {
        let mut index = RangeIndex::default();
        index.insert(entry(1, 100, 200));
        index.insert(entry(2, 0, 50));
        index.insert(entry(3, 50, 100));

        let starts: Vec<u64> = (0..index.len()).map(|i| index.entry_at(i).start).collect();
        assert_eq!(starts, vec![0, 50, 100]);
    }

    #[test]
    fn find_exact_range() {
        let mut index = RangeIndex::default();
        index.insert(entry(1, 0, 100));
        index.insert(entry(2, 100, 200));
        index.insert(entry(3, 200, 300));

        let i = index.find(100, 200).unwrap();
        assert_eq!(index.entry_at(i).id, 2);
    }

    #[test]
    fn find_contained_subrange() {
        let mut index = RangeIndex::default();
        index.insert(entry(1, 0, 100));
        index.insert(entry(2, 100, 200));

        let i = index.find(120, 180).unwrap();
        assert_eq!(index.entry_at(i).id, 2);
    }

    #[test]
    fn find_rejects_straddling_range() {
        let mut index = RangeIndex::default();
        index.insert(entry(1, 0, 100));
        index.insert(entry(2, 100, 200));

        // Starts inside entry 1 but ends inside entry 2 — never assembled.
        assert_eq!(index.find(50, 150), None);
    }

    #[test]
    fn find_misses_outside_coverage() {
        let mut index = RangeIndex::default();
        index.insert(entry(1, 100, 200));

        assert_eq!(index.find(0, 50), None);
        assert_eq!(index.find(200, 250), None);
        assert_eq!(index.find(150, 250), None);
    }

    #[test]
    fn find_on_empty_index() {
        let index = RangeIndex::default();
        assert_eq!(index.find(0, 1), None);
    }

    #[test]
    fn remove_preserves_order() {
        let mut index = RangeIndex::default();
        index.insert(entry(1, 0, 10));
        index.insert(entry(2, 10, 20));
        index.insert(entry(3, 20, 30));

        let removed = index.remove(1);
        assert_eq!(removed.id, 2);

        let starts: Vec<u64> = (0..index.len()).map(|i| index.entry_at(i).start).collect();
        assert_eq!(starts, vec![0, 20]);
    }

    #[test]
    fn duplicate_ranges_coexist() {
        let mut index = RangeIndex::default();
        index.insert(entry(1, 0, 100));
        index.insert(entry(2, 0, 100));

        assert_eq!(index.len(), 2);
        // Deterministic: some covering entry is found.
        assert!(index.find(0, 100).is_some());
    }

    #[test]
    fn position_of_finds_by_identity() {
        let mut index = RangeIndex::default();
        index.insert(entry(7, 0, 100));
        index.insert(entry(9, 100, 200));

        assert_eq!(index.position_of(9), Some(1));
        assert_eq!(index.position_of(42), None);
    }
}
