//! Grouping sampled trees by topology and ordering them by frequency.
//!
//! Topology ids are handed out in first-appearance order over the
//! original forest; that same order is the tie-break when two topologies
//! occur equally often. After [`sort_by_frequency`] the forest is a
//! concatenation of maximal same-topology runs, most frequent first.

use std::collections::HashMap;

use crate::tree::Node;

/// One sampled tree tagged with its topology id. Replaces the classic
/// parallel-array bookkeeping: the pair travels through the sort as a
/// unit.
#[derive(Debug, Clone)]
pub struct SampledTree {
    pub tree: Node,
    pub topology: usize,
}

/// Assigns each tree a topology id, first-seen ids starting at 0.
///
/// Two trees share an id iff their [`Node::topology_key`] strings are
/// equal. The keys themselves are not retained.
pub fn classify(trees: Vec<Node>) -> Vec<SampledTree> {
    let mut ids: HashMap<String, usize> = HashMap::new();
    trees
        .into_iter()
        .map(|tree| {
            let next = ids.len();
            let topology = *ids.entry(tree.topology_key()).or_insert(next);
            SampledTree { tree, topology }
        })
        .collect()
}

/// Number of distinct topology ids among `records`.
pub fn num_topologies(records: &[SampledTree]) -> usize {
    records.iter().map(|r| r.topology + 1).max().unwrap_or(0)
}

/// Occurrence count per topology id, one linear pass.
pub fn count_by_topology(records: &[SampledTree]) -> Vec<usize> {
    let mut counts = vec![0usize; num_topologies(records)];
    for record in records {
        counts[record.topology] += 1;
    }
    counts
}

/// Reorders the forest so that more frequent topologies come first;
/// equal frequency falls back to ascending first-appearance id.
///
/// A stable sort on `(descending count, ascending id)` satisfies the
/// ordering contract for every index pair and leaves each topology's
/// members contiguous.
pub fn sort_by_frequency(records: &mut [SampledTree], counts: &[usize]) {
    records.sort_by_key(|r| (std::cmp::Reverse(counts[r.topology]), r.topology));
}
