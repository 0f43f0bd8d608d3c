//! CLI module for Opwright
//!
//! - `apply`: execute the directives of a response against a project
//! - `parse`: print the extracted batch without executing anything
//! - `sanitize`: print the display text of a response
//! - `config`: show or change persisted settings

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};

pub mod apply;
pub mod config;
pub mod loader;
pub mod parse;
pub mod sanitize;

/// Opwright CLI
#[derive(Parser, Debug)]
#[command(name = "opwright")]
#[command(about = "Execute the operation directives embedded in assistant responses")]
#[command(version)]
pub struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute the directives in a response
    Apply(apply::ApplyArgs),
    /// Print the directives in a response as JSON
    Parse {
        /// Response file, or `-` for stdin
        input: PathBuf,
    },
    /// Print a response with directives replaced by labels
    Sanitize {
        /// Response file, or `-` for stdin
        input: PathBuf,
    },
    /// Show or change settings
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

/// Run the CLI command
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Apply(args)) => apply::run(args).await,
        Some(Commands::Parse { input }) => parse::run(&input),
        Some(Commands::Sanitize { input }) => sanitize::run(&input),
        Some(Commands::Config(cmd)) => config::run(cmd),
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

/// Read a response from a file, or from stdin for `-`
pub(crate) fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read response from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read response from {}", input.display()))
}
