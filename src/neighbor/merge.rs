//! Merge operator (§4.4, component D): deduplicating, left-wins merge of
//! two descending-sorted [`NeighborArray`]s.

use ahash::AHashSet;

use crate::neighbor::array::NeighborArray;
use crate::Neighbor;

/// Merges `left` and `right` into a new descending-sorted, deduplicated
/// array. When a node id appears in both inputs, the entry from `left` is
/// kept (§4.4) — including its score, regardless of which side's occurrence
/// would otherwise be visited first by a plain two-pointer scan. To honor
/// that for node ids whose `left`/`right` scores differ, `right` is first
/// filtered against the full set of `left`'s ids before the pointer merge
/// runs, rather than relying on "skip if already emitted" during the scan.
#[tracing::instrument(skip_all)]
pub fn merge(left: &NeighborArray, right: &NeighborArray) -> NeighborArray {
    let mut left_dedup = Vec::with_capacity(left.size());
    let mut left_ids = AHashSet::with_capacity(left.size());
    for &entry in left.entries() {
        if left_ids.insert(entry.node) {
            left_dedup.push(entry);
        }
    }

    let mut right_dedup = Vec::with_capacity(right.size());
    let mut right_ids = AHashSet::with_capacity(right.size());
    for &entry in right.entries() {
        if left_ids.contains(&entry.node) {
            continue;
        }
        if right_ids.insert(entry.node) {
            right_dedup.push(entry);
        }
    }

    let mut out = Vec::with_capacity(left_dedup.len() + right_dedup.len());
    let (mut i, mut j) = (0, 0);
    while i < left_dedup.len() && j < right_dedup.len() {
        if left_dedup[i].score >= right_dedup[j].score {
            out.push(left_dedup[i]);
            i += 1;
        } else {
            out.push(right_dedup[j]);
            j += 1;
        }
    }
    out.extend_from_slice(&left_dedup[i..]);
    out.extend_from_slice(&right_dedup[j..]);

    NeighborArray::from_sorted_entries(out)
}

fn array_of(pairs: &[(u32, f32)]) -> NeighborArray {
    let mut arr = NeighborArray::new();
    for &(node, score) in pairs {
        arr.add_in_order(crate::NodeId(node), score).unwrap();
    }
    arr
}

pub(crate) fn as_pairs(array: &NeighborArray) -> Vec<(u32, f32)> {
    array.entries().iter().map(|e: &Neighbor| (e.node.0, e.score)).collect()
}
