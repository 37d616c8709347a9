//! qar CLI - print patterns, simulate engines and manage presets.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qar")]
#[command(author, version, about = "Quad algorithmic rhythm engine CLI", long_about = None)]
struct Cli {
    /// Log engine events (chain transitions, resync, pattern changes)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the beats and accents of one track's parameters
    Pattern(commands::pattern::PatternArgs),

    /// Run a preset against a fixed-tempo clock and print what plays
    Simulate(commands::simulate::SimulateArgs),

    /// List, show, save and manage presets
    Presets(commands::presets::PresetsArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Pattern(args) => commands::pattern::run(args),
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Presets(args) => commands::presets::run(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["qar", "pattern", "8", "3", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Pattern(_)));
    }
}
