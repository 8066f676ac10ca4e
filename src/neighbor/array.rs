//! NeighborArray (§4.1, component A): a growable, descending-sorted
//! sequence of `(node, score)` pairs. Duplicates are permitted here —
//! rejecting them is [`crate::neighbor::concurrent_array::ConcurrentNeighborArray`]'s job.

use crate::{Error, Neighbor, NodeId};

/// A descending-sorted sequence of [`Neighbor`] entries.
///
/// Stored as a single `Vec` rather than literal parallel `node[]`/`score[]`
/// arrays — `Neighbor` keeps the pair together, which is the idiomatic Rust
/// shape for this; the invariants (sortedness, bounds) are identical either
/// way.
#[derive(Debug, Clone, Default)]
pub struct NeighborArray {
    entries: Vec<Neighbor>,
}

impl NeighborArray {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Builds an array directly from already-sorted, already-validated
    /// entries (used by merge/diversity, which construct sorted output
    /// incrementally and know it is in order by construction).
    pub(crate) fn from_sorted_entries(entries: Vec<Neighbor>) -> Self {
        debug_assert!(is_descending(&entries), "entries must be descending-sorted");
        Self { entries }
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Neighbor] {
        &self.entries
    }

    /// Appends `(node, score)`, requiring `score <= score[size-1]` (§4.1).
    #[tracing::instrument(skip(self))]
    pub fn add_in_order(&mut self, node: NodeId, score: f32) -> Result<(), Error> {
        if let Some(last) = self.entries.last() {
            if score > last.score {
                return Err(Error::OrderingViolation {
                    incoming: score,
                    last: last.score,
                });
            }
        }
        self.entries.push(Neighbor::new(node, score));
        Ok(())
    }

    /// Inserts `(node, score)` at its descending-sorted position, placing it
    /// at the *end* of any run of equal scores (§4.1's stability rule).
    /// Returns the index at which the entry landed.
    #[tracing::instrument(skip(self))]
    pub fn insert_sorted(&mut self, node: NodeId, score: f32) -> usize {
        let index = self.entries.partition_point(|e| e.score >= score);
        self.entries.insert(index, Neighbor::new(node, score));
        index
    }

    pub fn node(&self, index: usize) -> Result<NodeId, Error> {
        self.entries
            .get(index)
            .map(|e| e.node)
            .ok_or(Error::Bounds {
                index,
                len: self.entries.len(),
            })
    }

    pub fn score(&self, index: usize) -> Result<f32, Error> {
        self.entries
            .get(index)
            .map(|e| e.score)
            .ok_or(Error::Bounds {
                index,
                len: self.entries.len(),
            })
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.entries.iter().any(|e| e.node == node)
    }

    pub fn remove_index(&mut self, index: usize) -> Result<Neighbor, Error> {
        if index >= self.entries.len() {
            return Err(Error::Bounds {
                index,
                len: self.entries.len(),
            });
        }
        Ok(self.entries.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Neighbor> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<Neighbor> {
        self.entries
    }
}

pub(crate) fn is_descending(entries: &[Neighbor]) -> bool {
    entries.windows(2).all(|pair| pair[0].score >= pair[1].score)
}
