//! Outer graph map (§6, component H; §10): a thin integration example
//! wiring [`NodeId`]s to [`ConcurrentNeighborSet`]s via `papaya::HashMap`,
//! the same lock-free concurrent map this crate family already standardizes
//! on (see the teacher's `hnsw/index.rs`, which keys its own node/graph maps
//! the same way). Not part of the correctness-critical core — exists so the
//! concurrency test (§8) can exercise multiple owners from multiple threads.

use std::sync::Arc;

use papaya::HashMap;

use crate::neighbor::set::{ConcurrentNeighborSet, NeighborSetConfig};
use crate::oracle::SimilarityOracle;
use crate::NodeId;

/// Associative map from node id to neighbor set, all sharing one
/// [`NeighborSetConfig`] and one similarity oracle instance.
pub struct NodeGraph<S: SimilarityOracle> {
    nodes: HashMap<NodeId, Arc<ConcurrentNeighborSet<S>>>,
    config: NeighborSetConfig,
    oracle: Arc<S>,
}

impl<S: SimilarityOracle> NodeGraph<S> {
    pub fn new(config: NeighborSetConfig, oracle: Arc<S>) -> Self {
        Self {
            nodes: HashMap::new(),
            config,
            oracle,
        }
    }

    pub fn get(&self, node: NodeId) -> Option<Arc<ConcurrentNeighborSet<S>>> {
        self.nodes.pin().get(&node).cloned()
    }

    /// Returns the set for `node`, creating an empty one (with this graph's
    /// shared config and oracle) if absent.
    pub fn get_or_insert(&self, node: NodeId) -> Arc<ConcurrentNeighborSet<S>> {
        let pinned = self.nodes.pin();
        pinned
            .get_or_insert_with(node, || {
                Arc::new(ConcurrentNeighborSet::new(node, self.config, self.oracle.clone()))
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.nodes.pin().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.pin().keys().copied().collect()
    }
}
