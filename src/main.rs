use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process;

use tree_set_analyser::error::AnalyseError;
use tree_set_analyser::io::read_tree_set;
use tree_set_analyser::report;
use tree_set_analyser::topology::{classify, count_by_topology, sort_by_frequency};

/// Summarize a set of sampled phylogenetic trees by topology frequency.
///
/// Prints, on stdout, one block per distinct topology (most frequent
/// first) with per-sample theta and height columns; on stderr, one
/// mean-annotated consensus Newick per topology.
#[derive(Parser, Debug)]
#[command(name = "tree-set-analyser", version, about = "Topology-frequency summary for sampled tree sets")]
struct Args {
    /// Path to the tree-set file (NEXUS .trees or one Newick per line,
    /// optionally gzipped). With several paths given, only the last is
    /// analysed; earlier ones are accepted and ignored.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

fn main() {
    let args = Args::parse();
    // clap enforces at least one input.
    let path = &args.inputs[args.inputs.len() - 1];

    let set = match read_tree_set(path) {
        Ok(set) => set,
        Err(AnalyseError::EmptyInput) => {
            eprintln!("No trees found in {:?}.", path);
            process::exit(2);
        }
        Err(e) => {
            eprintln!("Failed to read {:?}: {e}", path);
            process::exit(3);
        }
    };

    let num_nodes = set.num_nodes();
    let labels = set.labels;
    let mut records = classify(set.trees);
    let counts = count_by_topology(&records);
    sort_by_frequency(&mut records, &counts);

    let stdout = io::stdout();
    let stderr = io::stderr();
    if let Err(e) = report::emit(
        &records,
        &labels,
        num_nodes,
        &mut stdout.lock(),
        &mut stderr.lock(),
    ) {
        eprintln!("Failed to summarize tree set: {e}");
        process::exit(4);
    }
}
