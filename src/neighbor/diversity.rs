//! Diversity filter (§4.5, component E): the Vamana/RNG-α pruning rule.
//!
//! Conceptually descended from the teacher crate's
//! `select_neighbours_heuristic` (Algorithm 4 of the HNSW paper), which
//! rejected a candidate if it was closer to an already-kept neighbor than to
//! the query. Rebuilt here over a descending-sorted array instead of a
//! min-heap of unsorted candidates, per this crate's §4.5.

use crate::neighbor::array::NeighborArray;
use crate::neighbor::concurrent_array::ConcurrentNeighborArray;
use crate::oracle::SimilarityOracle;
use crate::{Neighbor, NodeId};

/// Tunable knobs for the diversity filter. `alpha = 1.0` is the strict RNG
/// rule from §4.5; the teacher crate's `HNSWConfig` established the
/// convention of modeling per-build tunables as a `Copy` struct with a
/// `Default` impl, which this mirrors.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiversityConfig {
    /// Relaxes the RNG comparator to `score(n, c) > alpha * s_oc`.
    /// `1.0` recovers the strict rule.
    pub alpha: f32,
}

impl Default for DiversityConfig {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

/// Runs the diversity filter over `candidates` (descending-sorted,
/// deduplicated, assumed not to contain `owner` — callers are responsible
/// for that, since `OwnerAsNeighbor` is raised at the `ConcurrentNeighborSet`
/// boundary rather than here), keeping at most `max_degree` entries.
#[tracing::instrument(skip(oracle, candidates))]
pub fn filter(
    owner: NodeId,
    max_degree: usize,
    oracle: &dyn SimilarityOracle,
    candidates: &NeighborArray,
    config: DiversityConfig,
) -> Result<ConcurrentNeighborArray, crate::Error> {
    debug_assert!(
        !candidates.contains(owner),
        "diversity filter candidates must exclude the owner node"
    );
    debug_assert!(
        oracle.is_exact(),
        "diversity decisions require an exact scorer (§4.3); got an approximate/lossy oracle"
    );

    let mut kept: Vec<Neighbor> = Vec::with_capacity(max_degree.min(candidates.size()));

    'candidates: for &candidate in candidates.entries() {
        if kept.len() == max_degree {
            break;
        }
        let s_oc = candidate.score;
        for kept_neighbor in &kept {
            let s_nc = oracle.score(kept_neighbor.node, candidate.node)?;
            if s_nc > config.alpha * s_oc {
                tracing::trace!(
                    rejected = candidate.node.0,
                    against = kept_neighbor.node.0,
                    "candidate rejected by diversity rule"
                );
                continue 'candidates;
            }
        }
        kept.push(candidate);
    }

    Ok(ConcurrentNeighborArray::from_sorted_deduplicated(kept))
}
