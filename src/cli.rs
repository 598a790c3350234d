// src/cli.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;

/// CI lifecycle event normalizer.
///
/// Correlates pipeline graph nodes into paired stage events and turns
/// job/pipeline notifications into structured JSON events.
#[derive(Parser, Debug)]
#[command(
    name = "stagewatch",
    version,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// All supported CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Receive notifications over HTTP until Ctrl-C.
    Serve {
        /// Path to config file
        ///
        /// Defaults to ./config.yaml (built-in defaults if missing)
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Override server.addr
        #[arg(long)]
        addr: Option<String>,
    },

    /// Feed a recorded notification stream through the correlator.
    ///
    /// The feed holds one JSON notification per line. Blank lines and
    /// lines starting with `#` are skipped. Stages still open at the end
    /// are force-closed.
    Replay {
        /// Path to the JSON-lines feed
        feed: PathBuf,

        /// Path to config file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },

    /// Validate a config file and print the result as JSON.
    Validate {
        /// Path to config file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },

    /// Initialise a project scaffold.
    ///
    /// Creates:
    /// - config.yaml
    /// - feeds/sample.jsonl
    Init,
}
