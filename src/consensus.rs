//! Consensus trees and per-group statistics for one topology run.
//!
//! After sorting, each maximal run of same-topology trees produces one
//! consensus tree: the first member cloned, branch lengths summed in
//! node-by-node across the rest of the run, then divided by the run
//! length. The accompanying [`GroupStats`] context accumulates the
//! theta and height samples of the run, keyed by node index, and is
//! dropped when the run's report block is finished; nothing is shared
//! between groups.

use crate::error::AnalyseError;
use crate::topology::SampledTree;
use crate::tree::Node;

/// The averaged tree of one topology run plus its coverage.
#[derive(Debug)]
pub struct Consensus {
    pub tree: Node,
    /// Number of sampled trees in the run.
    pub count: usize,
    /// `count / total tree count`.
    pub weight: f64,
}

/// Averages one maximal same-topology run into a consensus tree.
///
/// `group` must be non-empty and `total` non-zero; a run of length 1
/// reproduces its single member unchanged.
pub fn build_consensus(group: &[SampledTree], total: usize) -> Consensus {
    let mut tree = group[0].tree.clone();
    for member in &group[1..] {
        add_lengths(&member.tree, &mut tree);
    }
    divide_lengths(&mut tree, group.len() as f64);
    Consensus {
        tree,
        count: group.len(),
        weight: group.len() as f64 / total as f64,
    }
}

/// Adds the branch lengths of `src` into `target`, node by node.
/// Assumes both trees share one topology.
fn add_lengths(src: &Node, target: &mut Node) {
    if let (Some((sl, sr)), Some((tl, tr))) = (src.children(), target.children_mut()) {
        add_lengths(sl, tl);
        add_lengths(sr, tr);
    }
    target.length += src.length;
}

fn divide_lengths(node: &mut Node, divisor: f64) {
    if let Some((left, right)) = node.children_mut() {
        divide_lengths(left, divisor);
        divide_lengths(right, divisor);
    }
    node.length /= divisor;
}

/// Per-run accumulator of theta and height samples, keyed by node index.
///
/// Freshly allocated per run; lists from different runs are never
/// compared or merged.
pub struct GroupStats {
    thetas: Vec<Vec<f64>>,
    heights: Vec<Vec<f64>>,
}

impl GroupStats {
    pub fn new(num_nodes: usize) -> Self {
        GroupStats {
            thetas: vec![Vec::new(); num_nodes],
            heights: vec![Vec::new(); num_nodes],
        }
    }

    /// Renders one table row for a sampled tree while recording its
    /// values: postorder `<theta> <height>` pairs, where the height is
    /// `height(node) - length(node)` (the height at the start of the
    /// node's own branch).
    pub fn sample_row(&mut self, tree: &Node) -> Result<String, AnalyseError> {
        let mut row = String::new();
        self.collect(tree, &mut row)?;
        Ok(row)
    }

    fn collect(&mut self, node: &Node, row: &mut String) -> Result<(), AnalyseError> {
        if let Some((left, right)) = node.children() {
            self.collect(left, row)?;
            self.collect(right, row)?;
        }
        let theta_text = theta_text(&node.metadata);
        let theta = parse_theta(&node.metadata)?;
        let height = node.height() - node.length;
        self.thetas[node.index].push(theta);
        self.heights[node.index].push(height);
        if !row.is_empty() {
            row.push(' ');
        }
        row.push_str(theta_text);
        row.push(' ');
        row.push_str(&height.to_string());
        Ok(())
    }

    /// Overwrites every consensus-node's metadata with the mean theta
    /// of its group, `mTheta=<mean truncated to 6 characters>`.
    pub fn annotate_means(&self, node: &mut Node) {
        node.metadata = format!("mTheta={}", truncate(mean(&self.thetas[node.index]), 6));
        if let Some((left, right)) = node.children_mut() {
            self.annotate_means(left);
            self.annotate_means(right);
        }
    }
}

/// The metadata's value text, with the `theta=` prefix stripped.
fn theta_text(metadata: &str) -> &str {
    metadata.strip_prefix("theta=").unwrap_or(metadata)
}

fn parse_theta(metadata: &str) -> Result<f64, AnalyseError> {
    theta_text(metadata)
        .parse()
        .map_err(|_| AnalyseError::MalformedMetadata {
            value: metadata.to_string(),
        })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Cuts the decimal representation of `value` to at most `max_len`
/// characters. This truncates, never rounds: a display convention, not
/// an arithmetic one.
pub fn truncate(value: f64, max_len: usize) -> String {
    let mut text = value.to_string();
    if text.len() > max_len {
        text.truncate(max_len);
    }
    text
}
