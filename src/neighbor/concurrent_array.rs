//! ConcurrentNeighborArray (§4.2, component B): a [`NeighborArray`] that
//! additionally guarantees no two entries share a node id.

use crate::neighbor::array::NeighborArray;
use crate::{Error, Neighbor, NodeId};

/// Same invariants as [`NeighborArray`] plus uniqueness of node ids.
/// Duplicate inserts of an already-present `(node, score)` pair are
/// idempotent no-ops.
#[derive(Debug, Clone, Default)]
pub struct ConcurrentNeighborArray {
    inner: NeighborArray,
}

impl ConcurrentNeighborArray {
    pub fn new() -> Self {
        Self {
            inner: NeighborArray::new(),
        }
    }

    /// Wraps an already sorted, already deduplicated set of entries — used
    /// internally by merge/diversity, which build output that is correct by
    /// construction and would otherwise pay for a redundant scan here.
    pub(crate) fn from_sorted_deduplicated(entries: Vec<Neighbor>) -> Self {
        Self {
            inner: NeighborArray::from_sorted_entries(entries),
        }
    }

    pub fn size(&self) -> usize {
        self.inner.size()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn entries(&self) -> &[Neighbor] {
        self.inner.entries()
    }

    /// Indices `[start, end)` of the run of entries whose score equals
    /// `score` exactly (ties), per the descending sort order.
    fn tie_run(&self, score: f32) -> std::ops::Range<usize> {
        let entries = self.inner.entries();
        let start = entries.partition_point(|e| e.score > score);
        let end = entries.partition_point(|e| e.score >= score);
        start..end
    }

    /// Inserts `(node, score)`, first scanning the tie run at `score` for an
    /// existing entry with the same node id (§4.2). If found, this is a
    /// no-op and the existing index is returned; otherwise delegates to
    /// [`NeighborArray::insert_sorted`].
    #[tracing::instrument(skip(self))]
    pub fn insert_sorted(&mut self, node: NodeId, score: f32) -> usize {
        let run = self.tie_run(score);
        if let Some(existing) = self.inner.entries()[run.clone()]
            .iter()
            .position(|e| e.node == node)
        {
            return run.start + existing;
        }
        self.inner.insert_sorted(node, score)
    }

    pub fn node(&self, index: usize) -> Result<NodeId, Error> {
        self.inner.node(index)
    }

    pub fn score(&self, index: usize) -> Result<f32, Error> {
        self.inner.score(index)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.inner.contains(node)
    }

    pub fn remove_index(&mut self, index: usize) -> Result<Neighbor, Error> {
        self.inner.remove_index(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Neighbor> {
        self.inner.iter()
    }

    pub fn into_vec(self) -> Vec<Neighbor> {
        self.inner.into_vec()
    }
}
