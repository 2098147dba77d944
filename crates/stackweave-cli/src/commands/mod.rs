//! CLI command definitions and dispatch.

pub mod graph;
pub mod plan;
pub mod render;
pub mod synth;

use clap::{Parser, Subcommand, ValueEnum};
use stackweave_common::constants::BIN_NAME;

/// stackweave — Dependency-aware composition of cloud resources.
#[derive(Parser, Debug)]
#[command(name = BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Log output format (filtered by `RUST_LOG`).
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the creation plan of a stack file, stage by stage.
    Plan(plan::PlanArgs),
    /// Write the provisioning manifest of a stack file as JSON.
    Synth(synth::SynthArgs),
    /// Print the dependency edges of a stack file.
    Graph(graph::GraphArgs),
    /// Render a pipeline template with named variables.
    Render(render::RenderArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Plan(args) => plan::execute(&args),
        Command::Synth(args) => synth::execute(&args),
        Command::Graph(args) => graph::execute(&args),
        Command::Render(args) => render::execute(&args),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn binary_name_matches_constant() {
        assert_eq!(Cli::command().get_name(), BIN_NAME);
    }

    #[test]
    fn render_vars_are_repeatable() {
        let cli = Cli::try_parse_from([BIN_NAME, "render", "t.tpl", "--var", "A=1", "--var", "B=2"])
            .expect("parse");
        match cli.command {
            Command::Render(args) => assert_eq!(args.vars.len(), 2),
            other => panic!("expected render, got {other:?}"),
        }
    }
}
