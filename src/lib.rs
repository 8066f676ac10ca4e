//! Lock-free concurrent neighbor sets for the base layer of an HNSW-family
//! vector index.
//!
//! The correctness-critical piece here is [`neighbor::set::ConcurrentNeighborSet`]:
//! a per-node façade that keeps a sorted, deduplicated, degree-capped,
//! diversity-pruned list of edges and publishes updates to it via a single
//! atomic pointer swap. Everything else in this crate — the distance
//! kernels, the embedding handle, the outer graph map — exists to make that
//! structure exercisable, not to implement a full index.

pub mod distance;
pub mod embedding_key;
pub mod error;
pub mod graph;
pub mod neighbor;
pub mod oracle;

#[cfg(test)]
pub mod tests;

pub use embedding_key::EmbeddingKey;
pub use error::Error;
pub use neighbor::{
    array::NeighborArray,
    concurrent_array::ConcurrentNeighborArray,
    diversity::DiversityConfig,
    merge::merge,
    set::{ConcurrentNeighborSet, NeighborSetConfig, PlatformConstants},
};
pub use oracle::{ApproximateOracle, DistanceFn, LinearAlgorithm, SimilarityOracle, VectorOracle};

/// Globally-unique, externally-assigned node identifier (§3 of the spec).
///
/// Distinct from a content-hash id: callers own the id space (typically an
/// ordinal into whatever vector store backs the oracle).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u32);

impl From<u32> for NodeId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single (node, score) edge proposal, descending-sorted by convention
/// wherever it appears in a [`NeighborArray`].
///
/// Ordering is never derived via `Ord` on the pair because `f32` is not
/// `Ord`; callers compare via [`Neighbor::cmp_desc`] instead, which encodes
/// the tie-break rule from §3 (descending score, then ascending node id).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub node: NodeId,
    pub score: f32,
}

impl Neighbor {
    pub fn new(node: NodeId, score: f32) -> Self {
        Self { node, score }
    }

    /// Descending-score, ascending-node-id comparator (§3). Returns
    /// `Ordering::Less` when `self` should sort *before* `other`.
    pub fn cmp_desc(&self, other: &Self) -> std::cmp::Ordering {
        other
            .score
            .partial_cmp(&self.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| self.node.cmp(&other.node))
    }
}
