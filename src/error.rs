//! Error type shared across the analysis pipeline.
//!
//! Library code propagates with `?`; `main` maps each variant to a
//! distinct exit code and a human-readable diagnostic on stderr.

use std::io;
use thiserror::Error;

/// Everything that can go wrong between reading a tree-set file and
/// emitting the two reports.
#[derive(Debug, Error)]
pub enum AnalyseError {
    /// The input file could not be read.
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),

    /// The Newick text is malformed. `offset` is a byte position into
    /// the tree string being parsed.
    #[error("malformed Newick at byte {offset}: {msg}")]
    Newick { offset: usize, msg: String },

    /// A node's metadata did not match the `theta=<real>` shape.
    #[error("malformed node metadata (expected theta=<number>): {value:?}")]
    MalformedMetadata { value: String },

    /// A leaf referenced a taxon id with no entry in the Translate block.
    #[error("leaf references unknown taxon {id:?}")]
    UnknownTaxon { id: String },

    /// The file parsed cleanly but contained zero trees. Reported
    /// explicitly so the weight computation never divides by zero.
    #[error("no trees found in input")]
    EmptyInput,
}

impl AnalyseError {
    pub(crate) fn newick(offset: usize, msg: impl Into<String>) -> Self {
        AnalyseError::Newick {
            offset,
            msg: msg.into(),
        }
    }
}
