//! End-to-end and property coverage for the public surface (§8). Per-module
//! unit tests live alongside their modules; this is the cross-cutting
//! suite — universal invariants, the randomized merge-law check, and the
//! concurrency scenario.

use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::neighbor::array::NeighborArray;
use crate::neighbor::diversity::{self, DiversityConfig};
use crate::neighbor::merge;
use crate::neighbor::set::{ConcurrentNeighborSet, NeighborSetConfig};
use crate::oracle::{LinearAlgorithm, SimilarityOracle, VectorOracle};
use crate::{EmbeddingKey, Neighbor, NodeId};

fn ring_vectors(n: usize) -> Vec<EmbeddingKey> {
    (0..n)
        .map(|i| {
            let theta = 2.0 * std::f32::consts::PI * (i as f32) / (n as f32);
            EmbeddingKey::new(vec![theta.cos(), theta.sin()])
        })
        .collect()
}

/// Universal invariants that must hold for a `ConcurrentNeighborSet` after
/// every public operation (§8).
fn assert_universal_invariants<S: SimilarityOracle>(set: &ConcurrentNeighborSet<S>) {
    let current = set.get_current();
    let entries = current.entries();

    assert!(
        crate::neighbor::array::is_descending(entries),
        "sortedness violated: {entries:?}"
    );

    let mut ids: Vec<_> = entries.iter().map(|e| e.node).collect();
    let before = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(before, ids.len(), "uniqueness violated: duplicate node ids present");

    assert!(
        !entries.iter().any(|e| e.node == set.owner()),
        "owner-exclusion violated: owner present in its own neighbor set"
    );

    assert!(
        entries.len() <= set.config().max_degree,
        "degree cap violated: {} > {}",
        entries.len(),
        set.config().max_degree
    );
}

// --- Concrete end-to-end scenarios (§8) ---

#[test]
fn scenario_1_simple_insert_and_cap() {
    let vectors: Vec<EmbeddingKey> = (0..4).map(|i| EmbeddingKey::new(vec![i as f32])).collect();
    let oracle = Arc::new(VectorOracle::new(
        Box::leak(vectors.into_boxed_slice()),
        LinearAlgorithm::EuclideanDistance,
    ));
    let config = NeighborSetConfig {
        max_degree: 2,
        alpha: 1.0,
    };
    let set = ConcurrentNeighborSet::new(NodeId(0), config, oracle.clone());

    for id in [1u32, 2, 3] {
        let score = oracle.score(NodeId(0), NodeId(id)).unwrap();
        set.insert(NodeId(id), score).unwrap();
    }

    assert_eq!(set.size(), 1);
    assert_eq!(set.iterator()[0].node, NodeId(1));
    assert_universal_invariants(&set);
}

#[test]
fn scenario_2_insert_diverse_on_ring() {
    let vectors = ring_vectors(10);
    let leaked: &'static [EmbeddingKey] = Box::leak(vectors.into_boxed_slice());
    let oracle = Arc::new(VectorOracle::new(leaked, LinearAlgorithm::DotProductSimilarity));
    let owner = NodeId(7);
    let config = NeighborSetConfig {
        max_degree: 3,
        alpha: 1.0,
    };
    let set = ConcurrentNeighborSet::new(owner, config, oracle.clone());

    let mut natural = NeighborArray::new();
    let mut scored: Vec<(u32, f32)> = (0..10u32)
        .filter(|&i| i != 7)
        .map(|i| (i, oracle.score(owner, NodeId(i)).unwrap()))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
    for (id, score) in scored {
        natural.insert_sorted(NodeId(id), score);
    }

    set.insert_diverse(&natural, &NeighborArray::new()).unwrap();

    let mut ids: Vec<_> = set.iterator().iter().map(|n| n.node.0).collect();
    ids.sort();
    assert_eq!(ids, vec![6, 8]);
    assert_universal_invariants(&set);
}

#[test]
fn scenario_3_insert_diverse_with_split_candidate_list() {
    let vectors = ring_vectors(10);
    let leaked: &'static [EmbeddingKey] = Box::leak(vectors.into_boxed_slice());
    let oracle = Arc::new(VectorOracle::new(leaked, LinearAlgorithm::DotProductSimilarity));
    let owner = NodeId(7);
    let config = NeighborSetConfig {
        max_degree: 3,
        alpha: 1.0,
    };
    let set = ConcurrentNeighborSet::new(owner, config, oracle.clone());

    let mut natural = NeighborArray::new();
    let mut natural_scored: Vec<(u32, f32)> = (0..7u32)
        .map(|i| (i, oracle.score(owner, NodeId(i)).unwrap()))
        .collect();
    natural_scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
    for (id, score) in natural_scored {
        natural.insert_sorted(NodeId(id), score);
    }

    let mut concurrent = NeighborArray::new();
    let mut concurrent_scored: Vec<(u32, f32)> = [8u32, 9]
        .into_iter()
        .map(|i| (i, oracle.score(owner, NodeId(i)).unwrap()))
        .collect();
    concurrent_scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
    for (id, score) in concurrent_scored {
        concurrent.insert_sorted(NodeId(id), score);
    }

    set.insert_diverse(&natural, &concurrent).unwrap();

    let mut ids: Vec<_> = set.iterator().iter().map(|n| n.node.0).collect();
    ids.sort();
    assert_eq!(ids, vec![6, 8]);
    assert_universal_invariants(&set);
}

#[test]
fn scenario_4_duplicate_rejection() {
    use crate::neighbor::concurrent_array::ConcurrentNeighborArray;

    let mut arr = ConcurrentNeighborArray::new();
    for (node, score) in [(1, 10.0), (2, 9.0), (3, 8.0), (1, 10.0), (3, 8.0)] {
        arr.insert_sorted(NodeId(node), score);
    }
    let ids: Vec<_> = arr.iter().map(|e| e.node.0).collect();
    let scores: Vec<_> = arr.iter().map(|e| e.score).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(scores, vec![10.0, 9.0, 8.0]);
}

#[test]
fn scenario_5_duplicate_rejection_with_equal_scores() {
    use crate::neighbor::concurrent_array::ConcurrentNeighborArray;

    let mut arr = ConcurrentNeighborArray::new();
    for (node, score) in [(1, 10.0), (2, 10.0), (3, 10.0), (1, 10.0), (3, 10.0)] {
        arr.insert_sorted(NodeId(node), score);
    }
    let ids: Vec<_> = arr.iter().map(|e| e.node.0).collect();
    let scores: Vec<_> = arr.iter().map(|e| e.score).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(scores, vec![10.0, 10.0, 10.0]);
}

#[test]
fn scenario_6_merge_with_ties_and_duplicates() {
    let mut l = NeighborArray::new();
    for (node, score) in [(3, 3.0), (2, 2.0), (1, 1.0)] {
        l.add_in_order(NodeId(node), score).unwrap();
    }
    let mut r = NeighborArray::new();
    for (node, score) in [(4, 4.0), (2, 2.0), (1, 1.0)] {
        r.add_in_order(NodeId(node), score).unwrap();
    }
    let m = merge::merge(&l, &r);
    let pairs: Vec<_> = m.entries().iter().map(|e| (e.node.0, e.score)).collect();
    assert_eq!(pairs, vec![(4, 4.0), (3, 3.0), (2, 2.0), (1, 1.0)]);

    let mut l2 = NeighborArray::new();
    for (node, score) in [(3, 3.0), (2, 2.0)] {
        l2.add_in_order(NodeId(node), score).unwrap();
    }
    let mut r2 = NeighborArray::new();
    r2.add_in_order(NodeId(2), 2.0).unwrap();
    let m2 = merge::merge(&l2, &r2);
    let pairs2: Vec<_> = m2.entries().iter().map(|e| (e.node.0, e.score)).collect();
    assert_eq!(pairs2, vec![(3, 3.0), (2, 2.0)]);
}

// --- Merge laws, randomized property test (§8) ---

fn assert_merge_laws(l: &NeighborArray, r: &NeighborArray, m: &NeighborArray) {
    let l_ids: std::collections::BTreeSet<_> = l.entries().iter().map(|e| e.node).collect();
    let r_ids: std::collections::BTreeSet<_> = r.entries().iter().map(|e| e.node).collect();
    let m_ids: Vec<_> = m.entries().iter().map(|e| e.node).collect();
    let m_id_set: std::collections::BTreeSet<_> = m_ids.iter().copied().collect();

    // Coverage
    for id in l_ids.union(&r_ids) {
        assert!(m_id_set.contains(id), "coverage violated for {id:?}");
    }
    // Dedup
    assert_eq!(m_ids.len(), m_id_set.len(), "dedup violated");
    // Sortedness
    assert!(
        crate::neighbor::array::is_descending(m.entries()),
        "sortedness violated: {:?}",
        m.entries()
    );
    // Size bounds
    let max_input = l.size().max(r.size());
    assert!(m.size() >= max_input, "size lower bound violated");
    assert!(m.size() <= l.size() + r.size(), "size upper bound violated");
}

fn random_array(rng: &mut StdRng, max_len: usize, node_space: u32) -> NeighborArray {
    let len = rng.gen_range(0..=max_len);
    let mut pairs: Vec<(u32, f32)> = (0..len)
        .map(|_| {
            let node = rng.gen_range(0..node_space);
            // small score space to force heavy tie pressure
            let score = rng.gen_range(0..4) as f32;
            (node, score)
        })
        .collect();
    pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
    let mut arr = NeighborArray::new();
    for (node, score) in pairs {
        arr.add_in_order(NodeId(node), score).unwrap();
    }
    arr
}

#[test]
fn randomized_merge_law_property() {
    let mut rng = StdRng::seed_from_u64(0x5EED_F00D);
    for _ in 0..10_000 {
        let l = random_array(&mut rng, 5, 6);
        let r = random_array(&mut rng, 5, 6);
        let m = merge::merge(&l, &r);
        assert_merge_laws(&l, &r, &m);
    }
}

#[test]
fn merge_idempotence_property() {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    for _ in 0..1_000 {
        let x = random_array(&mut rng, 5, 6);
        let m = merge::merge(&x, &x);
        let x_ids: std::collections::BTreeSet<_> = x.entries().iter().map(|e| e.node).collect();
        let m_ids: std::collections::BTreeSet<_> = m.entries().iter().map(|e| e.node).collect();
        assert_eq!(x_ids, m_ids, "idempotence violated");
    }
}

// --- Diversity filter invariant sanity (feeds into universal invariant 5) ---

#[test]
fn diversity_filter_never_exceeds_max_degree() {
    let vectors = ring_vectors(20);
    let leaked: &'static [EmbeddingKey] = Box::leak(vectors.into_boxed_slice());
    let oracle = VectorOracle::new(leaked, LinearAlgorithm::DotProductSimilarity);
    let owner = NodeId(0);

    let mut candidates = NeighborArray::new();
    let mut scored: Vec<(u32, f32)> = (1..20u32)
        .map(|i| (i, oracle.score(owner, NodeId(i)).unwrap()))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
    for (id, score) in scored {
        candidates.insert_sorted(NodeId(id), score);
    }

    let kept = diversity::filter(owner, 5, &oracle, &candidates, DiversityConfig::default()).unwrap();
    assert!(kept.size() <= 5);
}

// --- Concurrency test (§8) ---

#[test]
fn concurrent_inserts_with_disjoint_ranges_preserve_invariants() {
    const THREADS: usize = 8;
    const PER_THREAD: u32 = 25;

    let vectors = ring_vectors((THREADS as u32 * PER_THREAD + 1) as usize);
    let leaked: &'static [EmbeddingKey] = Box::leak(vectors.into_boxed_slice());
    let oracle = Arc::new(VectorOracle::new(leaked, LinearAlgorithm::DotProductSimilarity));
    let owner = NodeId(0);
    let config = NeighborSetConfig {
        max_degree: 8,
        alpha: 1.0,
    };
    let set = Arc::new(ConcurrentNeighborSet::new(owner, config, oracle.clone()));

    let attempted = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::new();
    for t in 0..THREADS {
        let set = set.clone();
        let oracle = oracle.clone();
        let attempted = attempted.clone();
        handles.push(thread::spawn(move || {
            let base = 1 + t as u32 * PER_THREAD;
            for offset in 0..PER_THREAD {
                let node = NodeId(base + offset);
                let score = oracle.score(owner, node).unwrap();
                set.insert(node, score).unwrap();
                attempted.fetch_add(1, AtomicOrdering::Relaxed);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(attempted.load(AtomicOrdering::Relaxed), THREADS * PER_THREAD as usize);
    assert_universal_invariants(&set);

    // Every surviving neighbor's omission of any proposed-but-absent node
    // must be explainable by the diversity rule against a neighbor present
    // in the final state.
    let kept: Vec<Neighbor> = set.iterator();
    for offset in 0..(THREADS as u32 * PER_THREAD) {
        let node = NodeId(1 + offset);
        if kept.iter().any(|n| n.node == node) {
            continue;
        }
        let s_oc = oracle.score(owner, node).unwrap();
        let rejected_by_someone = kept
            .iter()
            .any(|k| oracle.score(k.node, node).unwrap() > s_oc);
        assert!(
            rejected_by_someone,
            "node {node:?} missing without an explaining diversity rejection"
        );
    }
}
