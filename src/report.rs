//! Rendering the two summary reports.
//!
//! The primary report (stdout) carries, per topology block, a
//! placeholder-annotated Newick line, a postorder column header and one
//! numeric row per sampled tree. The secondary report (stderr) carries
//! one consensus Newick per topology, with `mTheta` annotations and
//! mean branch lengths, leaves rendered by node index.
//!
//! Both emitters are generic over `io::Write` so tests can capture the
//! streams in memory.

use std::io::Write;

use crate::consensus::{build_consensus, truncate, GroupStats};
use crate::error::AnalyseError;
use crate::topology::SampledTree;
use crate::tree::Node;

/// Emits both reports for a frequency-sorted forest.
///
/// `records` must already be sorted by [`crate::topology::sort_by_frequency`]
/// so that every topology's members are contiguous. Consensus building
/// and statistics collection are interleaved per group, one group at a
/// time.
pub fn emit<W: Write, E: Write>(
    records: &[SampledTree],
    labels: &[String],
    num_nodes: usize,
    out: &mut W,
    err: &mut E,
) -> Result<(), AnalyseError> {
    if records.is_empty() {
        return Err(AnalyseError::EmptyInput);
    }
    let total = records.len();

    writeln!(out, "#nr coverage tree")?;
    let mut sample = 0usize;
    for (i, group) in records
        .chunk_by(|a, b| a.topology == b.topology)
        .enumerate()
    {
        let mut consensus = build_consensus(group, total);
        let percent = format!("{:.2}", consensus.weight * 100.0);

        writeln!(
            out,
            "#Tree {i}. {percent}% {}",
            placeholder_topology(&consensus.tree, labels)
        )?;
        writeln!(out, "nr {}", header(&consensus.tree))?;

        let mut stats = GroupStats::new(num_nodes);
        for member in group {
            writeln!(out, "{sample} {}", stats.sample_row(&member.tree)?)?;
            sample += 1;
        }

        stats.annotate_means(&mut consensus.tree);
        writeln!(err, "#Tree {i}. {percent}% {}", consensus_newick(&consensus.tree))?;
    }
    out.flush()?;
    err.flush()?;
    Ok(())
}

/// Newick-shaped line with `theta<idx>`/`height<idx>` placeholders in
/// place of values; leaves carry their label.
fn placeholder_topology(node: &Node, labels: &[String]) -> String {
    let idx = node.index;
    match node.children() {
        None => format!("{}[theta{idx}]:height{idx}", labels[idx]),
        Some((left, right)) => format!(
            "({},{})[theta{idx}]:height{idx}",
            placeholder_topology(left, labels),
            placeholder_topology(right, labels)
        ),
    }
}

/// Postorder column header, `theta<idx> height<idx>` per node.
fn header(node: &Node) -> String {
    let mut columns = Vec::new();
    node.postorder(&mut |n| columns.push(format!("theta{0} height{0}", n.index)));
    columns.join(" ")
}

/// Consensus Newick: leaves by node index, `[metadata]` annotations,
/// branch lengths truncated to 6 characters.
fn consensus_newick(node: &Node) -> String {
    let mut text = match node.children() {
        None => node.index.to_string(),
        Some((left, right)) => {
            format!("({},{})", consensus_newick(left), consensus_newick(right))
        }
    };
    if !node.metadata.is_empty() {
        text.push('[');
        text.push_str(&node.metadata);
        text.push(']');
    }
    text.push(':');
    text.push_str(&truncate(node.length, 6));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::parse_tree_set;
    use crate::topology::{classify, count_by_topology, sort_by_frequency};

    /// Three leaves, two samples of ((A,B),C), one of (A,(B,C)),
    /// deliberately interleaved so the sorter has work to do.
    const SCENARIO: &str = "\
((A[theta=0.1]:1.0,B[theta=0.2]:1.0)[theta=0.4]:0.5,C[theta=0.3]:1.5)[theta=0.5]:1.0;
(A[theta=0.2]:1.0,(B[theta=0.1]:0.5,C[theta=0.3]:0.5)[theta=0.4]:0.5)[theta=0.5]:1.0;
((A[theta=0.3]:2.0,B[theta=0.2]:2.0)[theta=0.4]:1.0,C[theta=0.1]:3.0)[theta=0.5]:1.0;
";

    fn run_scenario() -> (String, String) {
        let set = parse_tree_set(SCENARIO).unwrap();
        let num_nodes = set.num_nodes();
        let labels = set.labels.clone();
        let mut records = classify(set.trees);
        let counts = count_by_topology(&records);
        sort_by_frequency(&mut records, &counts);

        let mut out = Vec::new();
        let mut err = Vec::new();
        emit(&records, &labels, num_nodes, &mut out, &mut err).unwrap();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn primary_report_end_to_end() {
        let (out, _) = run_scenario();
        let expected = "\
#nr coverage tree
#Tree 0. 66.67% ((A[theta0]:height0,B[theta1]:height1)[theta3]:height3,C[theta2]:height2)[theta4]:height4
nr theta0 height0 theta1 height1 theta3 height3 theta2 height2 theta4 height4
0 0.1 0 0.2 0 0.4 1 0.3 0 0.5 1.5
1 0.3 0 0.2 0 0.4 2 0.1 0 0.5 3
#Tree 1. 33.33% (A[theta0]:height0,(B[theta1]:height1,C[theta2]:height2)[theta3]:height3)[theta4]:height4
nr theta0 height0 theta1 height1 theta2 height2 theta3 height3 theta4 height4
2 0.2 0 0.1 0 0.3 0 0.4 0.5 0.5 1
";
        assert_eq!(out, expected);
    }

    #[test]
    fn secondary_report_end_to_end() {
        let (_, err) = run_scenario();
        let expected = "\
#Tree 0. 66.67% ((0[mTheta=0.2]:1.5,1[mTheta=0.2]:1.5)[mTheta=0.4]:0.75,2[mTheta=0.2]:2.25)[mTheta=0.5]:1
#Tree 1. 33.33% (0[mTheta=0.2]:1,(1[mTheta=0.1]:0.5,2[mTheta=0.3]:0.5)[mTheta=0.4]:0.5)[mTheta=0.5]:1
";
        assert_eq!(err, expected);
    }

    #[test]
    fn row_counts_match_group_sizes_and_total() {
        let (out, _) = run_scenario();
        let rows: Vec<&str> = out
            .lines()
            .filter(|l| l.chars().next().is_some_and(|c| c.is_ascii_digit()))
            .collect();
        assert_eq!(rows.len(), 3);
        // Global sample indices keep counting across blocks.
        assert!(rows[0].starts_with("0 "));
        assert!(rows[2].starts_with("2 "));
    }

    #[test]
    fn coverage_weights_sum_to_one() {
        let (_, err) = run_scenario();
        let mut coverages: Vec<f64> = Vec::new();
        for line in err.lines() {
            let percent = line.split_whitespace().nth(2).unwrap();
            coverages.push(percent.trim_end_matches('%').parse::<f64>().unwrap() / 100.0);
        }
        assert!((coverages.iter().sum::<f64>() - 1.0).abs() < 1e-3);
        // Adjacent blocks are in descending coverage order.
        for pair in coverages.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
    }

    #[test]
    fn empty_forest_is_rejected() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        assert!(matches!(
            emit(&[], &[], 0, &mut out, &mut err),
            Err(AnalyseError::EmptyInput)
        ));
        assert!(out.is_empty());
    }
}
