//! Crate root: lightweight module orchestration and public re-exports.
//!
//! Modules:
//! - `tree`: binary tree model for sampled and consensus trees.
//! - `io`: reading NEXUS/Newick tree-set files with theta annotations.
//! - `topology`: topology classification and frequency sorting.
//! - `consensus`: per-run branch-length averaging and theta/height stats.
//! - `report`: the stdout table and stderr consensus-Newick emitters.
//! - `error`: the shared `AnalyseError` type.

pub mod consensus;
pub mod error;
pub mod io;
pub mod report;
pub mod topology;
pub mod tree;

// Re-export frequently used types & functions
pub use error::AnalyseError;
pub use io::{parse_tree_set, read_tree_set};
pub use tree::{Node, TreeSet};
