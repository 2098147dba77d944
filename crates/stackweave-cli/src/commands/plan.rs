//! `weave plan` — Show the creation plan of a stack file.

use std::path::PathBuf;

use clap::Args;

use crate::output;
use crate::stackfile::StackFile;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to the stack file.
    #[arg(default_value = "stack.yaml")]
    pub file: PathBuf,

    /// Also print the merged configuration of every resource.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Executes the `plan` command.
///
/// Composes the stack file, validates the dependency graph and prints the
/// resources stage by stage. Resources within a stage have no ordering
/// constraint between them.
///
/// # Errors
///
/// Returns an error if loading, composition or graph validation fails.
pub fn execute(args: &PlanArgs) -> anyhow::Result<()> {
    let (manifest, _) = StackFile::load(&args.file)?.synth()?;

    println!("Creation plan for: {}", manifest.stack);
    println!("{}", output::rule());

    for (index, stage) in manifest.stages.iter().enumerate() {
        println!();
        println!("  Stage {}", index + 1);
        for address in stage {
            let Some(resource) = manifest.resource(address) else {
                continue;
            };
            println!("    + {address} ({})", resource.kind);
            if args.verbose {
                for (key, value) in &resource.config {
                    println!("        {key}: {}", output::format_value(value));
                }
            }
            for dependency in &resource.depends_on {
                println!("        after: {dependency}");
            }
        }
    }

    println!();
    println!(
        "  {} in {}, {}.",
        output::count(manifest.resources.len(), "resource"),
        output::count(manifest.stages.len(), "stage"),
        output::count(manifest.edges.len(), "edge"),
    );

    Ok(())
}
