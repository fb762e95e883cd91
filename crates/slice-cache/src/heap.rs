use crate::index::EntryId;
use std::collections::HashMap;
use std::sync::Arc;

/// Non-owning back-reference to a cache entry: enough to locate it in its
/// source's range index during eviction. The entry itself is owned by the
/// index alone.
#[derive(Debug, Clone)]
pub(crate) struct EntryRef {
    pub id: EntryId,
    pub source: Arc<str>,
    pub start: u64,
    pub end: u64,
}

/// Heap node: the tracked entry's last-access tick plus its back-reference.
#[derive(Debug)]
pub(crate) struct HeapNode {
    pub access: u64,
    pub entry: EntryRef,
}

/// Indexed binary min-heap over last-access ticks.
///
/// Holds exactly one node per live entry. `touch` restores ordering in
/// place after an access bump rather than removing and reinserting, and
/// nodes only ever leave through `pop_min` during eviction, so node and
/// entry lifetimes stay paired.
#[derive(Debug, Default)]
pub(crate) struct EvictionHeap {
    nodes: Vec<HeapNode>,
    pos: HashMap<EntryId, usize>,
}

impl EvictionHeap {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn push(&mut self, node: HeapNode) {
        let i = self.nodes.len();
        self.pos.insert(node.entry.id, i);
        self.nodes.push(node);
        self.sift_up(i);
    }

    /// Removes and returns the globally least-recently-accessed node.
    pub fn pop_min(&mut self) -> Option<HeapNode> {
        if self.nodes.is_empty() {
            return None;
        }
        let last = self.nodes.len() - 1;
        if last > 0 {
            self.swap_nodes(0, last);
        }
        let node = self.nodes.pop().expect("heap checked non-empty");
        self.pos.remove(&node.entry.id);
        if !self.nodes.is_empty() {
            self.sift_down(0);
        }
        Some(node)
    }

    /// Bumps a node's access tick and re-heapifies it in place.
    ///
    /// Unknown ids are ignored; the engine only touches ids it just read.
    pub fn touch(&mut self, id: EntryId, access: u64) {
        if let Some(&i) = self.pos.get(&id) {
            self.nodes[i].access = access;
            if !self.sift_down(i) {
                self.sift_up(i);
            }
        }
    }

    #[cfg(test)]
    pub fn peek_min(&self) -> Option<&HeapNode> {
        self.nodes.first()
    }

    fn swap_nodes(&mut self, a: usize, b: usize) {
        self.nodes.swap(a, b);
        self.pos.insert(self.nodes[a].entry.id, a);
        self.pos.insert(self.nodes[b].entry.id, b);
    }

    fn sift_up(&mut self, mut i: usize) -> bool {
        let from = i;
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.nodes[i].access >= self.nodes[parent].access {
                break;
            }
            self.swap_nodes(i, parent);
            i = parent;
        }
        i != from
    }

    fn sift_down(&mut self, mut i: usize) -> bool {
        let from = i;
        loop {
            let left = 2 * i + 1;
            if left >= self.nodes.len() {
                break;
            }
            let right = left + 1;
            let mut child = left;
            if right < self.nodes.len() && self.nodes[right].access < self.nodes[left].access {
                child = right;
            }
            if self.nodes[child].access >= self.nodes[i].access {
                break;
            }
            self.swap_nodes(i, child);
            i = child;
        }
        i != from
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: EntryId, access: u64) -> HeapNode {
        HeapNode {
            access,
            entry: EntryRef {
                id,
                source: Arc::from("http://origin/file"),
                start: id * 100,
                end: id * 100 + 100,
            },
        }
    }

    #[test]
    fn pops_in_access_order() {
        let mut heap = EvictionHeap::default();
        heap.push(node(1, 30));
        heap.push(node(2, 10));
        heap.push(node(3, 20));

        let order: Vec<EntryId> = std::iter::from_fn(|| heap.pop_min().map(|n| n.entry.id)).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn touch_demotes_accessed_node() {
        let mut heap = EvictionHeap::default();
        heap.push(node(1, 1));
        heap.push(node(2, 2));
        heap.push(node(3, 3));
        assert_eq!(heap.peek_min().unwrap().entry.id, 1);

        // Re-access the oldest node; the next oldest becomes the victim.
        heap.touch(1, 4);
        assert_eq!(heap.pop_min().unwrap().entry.id, 2);
        assert_eq!(heap.pop_min().unwrap().entry.id, 3);
        assert_eq!(heap.pop_min().unwrap().entry.id, 1);
    }

    #[test]
    fn touch_unknown_id_is_ignored() {
        let mut heap = EvictionHeap::default();
        heap.push(node(1, 1));
        heap.touch(99, 5);
        assert_eq!(heap.len(), 1);
        assert_eq!(heap.pop_min().unwrap().entry.id, 1);
    }

    #[test]
    fn pop_empty_returns_none() {
        let mut heap = EvictionHeap::default();
        assert!(heap.pop_min().is_none());
    }

    #[test]
    fn position_map_stays_consistent() {
        let mut heap = EvictionHeap::default();
        for id in 0..32 {
            heap.push(node(id, 100 - id));
        }
        // Touch every node so each one moves.
        for id in 0..32 {
            heap.touch(id, 200 + id);
        }

        let order: Vec<u64> = std::iter::from_fn(|| heap.pop_min().map(|n| n.access)).collect();
        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(order, sorted);
        assert!(heap.is_empty());
    }
}
