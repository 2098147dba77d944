//! `weave synth` — Write the provisioning manifest of a stack file.

use std::path::PathBuf;

use clap::Args;
use stackweave_common::error::write_file;

use crate::stackfile::StackFile;

/// Arguments for the `synth` command.
#[derive(Args, Debug)]
pub struct SynthArgs {
    /// Path to the stack file.
    #[arg(default_value = "stack.yaml")]
    pub file: PathBuf,

    /// Write the manifest to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Executes the `synth` command.
///
/// # Errors
///
/// Returns an error if composition fails or the manifest cannot be written.
pub fn execute(args: &SynthArgs) -> anyhow::Result<()> {
    let (manifest, _) = StackFile::load(&args.file)?.synth()?;
    let json = manifest.to_json()?;

    if let Some(ref out_path) = args.output {
        write_file(out_path, &format!("{json}\n"))?;
        tracing::info!(
            path = %out_path.display(),
            resources = manifest.resources.len(),
            "manifest written"
        );
        println!("Synthesized {} -> {}", args.file.display(), out_path.display());
    } else {
        println!("{json}");
    }

    Ok(())
}
