// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::default_config_path;
use crate::types::ConcurrencyPolicy;

/// Command-line arguments for `termdeck`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "termdeck",
    version,
    about = "Run named shell commands from a deck of profiles.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the deck file (TOML). Defaults to `Termdeck.toml` in the
    /// current directory.
    #[arg(long, value_name = "PATH", env = "TERMDECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TERMDECK_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: DeckCommand,
}

impl CliArgs {
    /// The deck file to load: `--config`, else the default location.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_config_path)
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum DeckCommand {
    /// List profiles and their commands.
    List,

    /// Run one or more commands and stream their output.
    Run {
        /// Command ids to run.
        #[arg(required = true, value_name = "ID")]
        ids: Vec<String>,

        /// Skip the confirmation step for flagged commands.
        #[arg(long, short = 'y')]
        yes: bool,

        /// Print every execution event as a JSON line on stdout.
        #[arg(long)]
        json: bool,

        /// Override the deck's concurrency policy for this invocation.
        #[arg(long, value_name = "POLICY")]
        policy: Option<ConcurrencyPolicy>,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_falls_back_to_the_default_file() {
        let args = CliArgs::try_parse_from(["termdeck", "list"]).unwrap();
        if std::env::var_os("TERMDECK_CONFIG").is_none() {
            assert_eq!(args.config_path(), default_config_path());
        }

        let args =
            CliArgs::try_parse_from(["termdeck", "--config", "decks/dev.toml", "list"]).unwrap();
        assert_eq!(args.config_path(), PathBuf::from("decks/dev.toml"));
    }

    #[test]
    fn run_requires_at_least_one_id() {
        assert!(CliArgs::try_parse_from(["termdeck", "run"]).is_err());

        let args = CliArgs::try_parse_from(["termdeck", "run", "a", "b", "-y", "--json"]).unwrap();
        let DeckCommand::Run { ids, yes, json, policy } = args.command else {
            panic!("expected run");
        };
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
        assert!(yes && json);
        assert!(policy.is_none());
    }
}
