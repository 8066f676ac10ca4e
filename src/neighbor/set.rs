//! ConcurrentNeighborSet (§4.6, component F): the per-node façade that
//! atomically publishes a new [`ConcurrentNeighborArray`] on every mutation.
//!
//! The CAS-retry-loop-over-an-epoch-guarded-atomic-pointer shape is carried
//! over from the teacher crate's lock-free KD-tree (`insert_recursive` /
//! `delete_recursive`), which already pins a guard and retries a
//! `compare_exchange` rather than taking a lock.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crossbeam::epoch::{self, Atomic, Owned};

use crate::neighbor::array::NeighborArray;
use crate::neighbor::concurrent_array::ConcurrentNeighborArray;
use crate::neighbor::diversity::{self, DiversityConfig};
use crate::neighbor::merge;
use crate::oracle::SimilarityOracle;
use crate::{Error, Neighbor, NodeId};

/// Per-build tunables for a [`ConcurrentNeighborSet`], mirroring the
/// teacher crate's `HNSWConfig` shape: a `Copy` struct with a documented
/// `Default`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NeighborSetConfig {
    /// Hard cap on the number of neighbors a set may hold.
    pub max_degree: usize,
    /// Diversity filter relaxation factor (§4.5, §9). `1.0` is strict RNG.
    pub alpha: f32,
}

impl Default for NeighborSetConfig {
    /// `max_degree = 96` matches the teacher's base-layer degree cap
    /// (`maximum_connections_zero`), since this crate is specialized to the
    /// base layer only.
    fn default() -> Self {
        Self {
            max_degree: 96,
            alpha: 1.0,
        }
    }
}

/// Platform constants used by [`ConcurrentNeighborSet::memory_footprint`].
/// Defaults assume a 64-bit host: an 8-byte reference and a conservative
/// 24-byte allocation header for the backing `Vec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformConstants {
    pub reference_width: usize,
    pub header_width: usize,
}

impl Default for PlatformConstants {
    fn default() -> Self {
        Self {
            reference_width: std::mem::size_of::<usize>(),
            header_width: 24,
        }
    }
}

/// A triple `(owner, max_degree, current)` (§3) where `current` is an
/// atomically-referenced [`ConcurrentNeighborArray`], published by a single
/// pointer swap per mutation. `S` is the similarity oracle type shared by
/// every node in a graph; see [`crate::graph::NodeGraph`].
pub struct ConcurrentNeighborSet<S: SimilarityOracle> {
    owner: NodeId,
    config: NeighborSetConfig,
    current: Atomic<ConcurrentNeighborArray>,
    oracle: Arc<S>,
}

impl<S: SimilarityOracle> ConcurrentNeighborSet<S> {
    pub fn new(owner: NodeId, config: NeighborSetConfig, oracle: Arc<S>) -> Self {
        Self {
            owner,
            config,
            current: Atomic::new(ConcurrentNeighborArray::new()),
            oracle,
        }
    }

    pub fn owner(&self) -> NodeId {
        self.owner
    }

    pub fn config(&self) -> NeighborSetConfig {
        self.config
    }

    pub fn size(&self) -> usize {
        let guard = epoch::pin();
        let shared = self.current.load(Ordering::Acquire, &guard);
        unsafe { shared.as_ref() }.map(ConcurrentNeighborArray::size).unwrap_or(0)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        let guard = epoch::pin();
        let shared = self.current.load(Ordering::Acquire, &guard);
        unsafe { shared.as_ref() }
            .map(|array| array.contains(node))
            .unwrap_or(false)
    }

    /// Debug/reporting accessor for the current snapshot (§6).
    pub fn get_current(&self) -> ConcurrentNeighborArray {
        let guard = epoch::pin();
        let shared = self.current.load(Ordering::Acquire, &guard);
        match unsafe { shared.as_ref() } {
            Some(array) => array.clone(),
            None => ConcurrentNeighborArray::new(),
        }
    }

    /// Snapshot iterator over the current array, descending-score order.
    pub fn iterator(&self) -> Vec<Neighbor> {
        self.get_current().into_vec()
    }

    /// Byte footprint of this set, inclusive of its current array (§6).
    pub fn memory_footprint(&self, platform: PlatformConstants) -> usize {
        let size = self.size();
        platform.header_width + size * (platform.reference_width + std::mem::size_of::<f32>())
    }

    /// Single-entry insertion under the degree cap (§4.6). The incoming
    /// `(node, score)` is merged against the current array via the same
    /// left-wins [`merge::merge`] rule `insert_diverse` uses (§4.4, §5): a
    /// node already present keeps its published score rather than being
    /// silently overwritten by a later proposal. On CAS success, if the
    /// merged size exceeds `max_degree`, every non-diverse neighbor is
    /// evicted in one pass by rerunning the diversity filter over the full
    /// sorted array — this can shrink `size` well below `max_degree` (see
    /// the degree-cap decision in DESIGN.md).
    #[tracing::instrument(skip(self))]
    pub fn insert(&self, node: NodeId, score: f32) -> Result<(), Error> {
        if node == self.owner {
            return Err(Error::OwnerAsNeighbor { node });
        }
        if !score.is_finite() {
            return Err(Error::ScoreNaN {
                a: self.owner,
                b: node,
            });
        }

        let mut proposal = NeighborArray::new();
        proposal.add_in_order(node, score).expect("singleton array is trivially ordered");

        let guard = epoch::pin();
        loop {
            let shared = self.current.load(Ordering::Acquire, &guard);
            let current_array = match unsafe { shared.as_ref() } {
                Some(array) => NeighborArray::from_sorted_entries(array.entries().to_vec()),
                None => NeighborArray::new(),
            };
            let merged = merge::merge(&current_array, &proposal);

            let new_array = if merged.size() > self.config.max_degree {
                diversity::filter(
                    self.owner,
                    self.config.max_degree,
                    self.oracle.as_ref(),
                    &merged,
                    DiversityConfig {
                        alpha: self.config.alpha,
                    },
                )?
            } else {
                ConcurrentNeighborArray::from_sorted_deduplicated(merged.into_vec())
            };

            let new_owned = Owned::new(new_array);
            match self
                .current
                .compare_exchange(shared, new_owned, Ordering::AcqRel, Ordering::Acquire, &guard)
            {
                Ok(_) => {
                    if !shared.is_null() {
                        unsafe {
                            guard.defer_destroy(shared);
                        }
                    }
                    return Ok(());
                }
                Err(_) => {
                    tracing::trace!(owner = self.owner.0, node = node.0, "CAS retry on insert");
                    continue;
                }
            }
        }
    }

    /// Build-time bulk path (§4.6): merges `natural` and `concurrent` with
    /// the currently-installed array (all via left-wins merge, so already
    /// published entries are never silently dropped by a later call), runs
    /// the diversity filter over the result, then CAS-installs it.
    #[tracing::instrument(skip(self, natural, concurrent))]
    pub fn insert_diverse(
        &self,
        natural: &NeighborArray,
        concurrent: &NeighborArray,
    ) -> Result<(), Error> {
        if natural.contains(self.owner) || concurrent.contains(self.owner) {
            return Err(Error::OwnerAsNeighbor { node: self.owner });
        }

        let proposals = merge::merge(natural, concurrent);

        let guard = epoch::pin();
        loop {
            let shared = self.current.load(Ordering::Acquire, &guard);
            let current_array = match unsafe { shared.as_ref() } {
                Some(array) => NeighborArray::from_sorted_entries(array.entries().to_vec()),
                None => NeighborArray::new(),
            };
            let combined = merge::merge(&current_array, &proposals);
            let filtered = diversity::filter(
                self.owner,
                self.config.max_degree,
                self.oracle.as_ref(),
                &combined,
                DiversityConfig {
                    alpha: self.config.alpha,
                },
            )?;

            let new_owned = Owned::new(filtered);
            match self
                .current
                .compare_exchange(shared, new_owned, Ordering::AcqRel, Ordering::Acquire, &guard)
            {
                Ok(_) => {
                    if !shared.is_null() {
                        unsafe {
                            guard.defer_destroy(shared);
                        }
                    }
                    return Ok(());
                }
                Err(_) => {
                    tracing::trace!(owner = self.owner.0, "CAS retry on insert_diverse");
                    continue;
                }
            }
        }
    }

    /// Forwards to `other.insert(self.owner(), score)` (§4.6, §9): `self`
    /// just chose `other` as a neighbor, so `other` records the reverse
    /// edge. No shared structure is mutated beyond `other`'s own atomic
    /// pointer, which avoids cyclic ownership between sets.
    #[tracing::instrument(skip(self, other))]
    pub fn backlink(&self, other: &ConcurrentNeighborSet<S>, score: f32) -> Result<(), Error> {
        other.insert(self.owner, score)
    }
}

impl<S: SimilarityOracle> std::fmt::Debug for ConcurrentNeighborSet<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentNeighborSet")
            .field("owner", &self.owner)
            .field("config", &self.config)
            .field("size", &self.size())
            .finish()
    }
}
