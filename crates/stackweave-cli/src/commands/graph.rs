//! `weave graph` — Print the dependency edges of a stack file.

use std::path::PathBuf;

use clap::Args;

use crate::stackfile::StackFile;

/// Arguments for the `graph` command.
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Path to the stack file.
    #[arg(default_value = "stack.yaml")]
    pub file: PathBuf,

    /// Emit Graphviz DOT instead of one edge per line.
    #[arg(long)]
    pub dot: bool,
}

/// Executes the `graph` command.
///
/// # Errors
///
/// Returns an error if loading, composition or graph validation fails.
pub fn execute(args: &GraphArgs) -> anyhow::Result<()> {
    let (_, graph) = StackFile::load(&args.file)?.synth()?;

    if args.dot {
        print!("{}", graph.to_dot());
        return Ok(());
    }

    for edge in graph.edges() {
        println!("{} -> {}", edge.from, edge.to);
    }
    // Isolated resources would otherwise not appear at all.
    for address in graph.order() {
        if graph.dependencies_of(address).is_empty() && graph.dependents_of(address).is_empty() {
            println!("{address}");
        }
    }

    Ok(())
}
