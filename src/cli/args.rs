//! CLI argument definitions and parsing structures
//!
//! This module defines the command-line interface structure using clap,
//! including the main `Cli` struct and the subcommand enum.

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use crate::CliArgs;

/// roadmapper - resumable learning roadmap generation
#[derive(Parser, Debug)]
#[command(name = "roadmapper")]
#[command(about = "Generate multi-phase learning roadmaps with LLM providers")]
#[command(long_about = r#"
roadmapper turns a learning objective into a phased roadmap. A structure call
outlines the phases, then one call per phase fills in goals, mini-goals,
resources and a project. Every phase is checkpointed, so an interrupted run
can be resumed where it stopped.

EXAMPLES:
  # Generate a roadmap
  roadmapper generate --objective "Learn Rust" --goal "Write a CLI tool"

  # Try the pipeline offline
  roadmapper generate --objective "Learn Rust" --goal "Write a CLI tool" --dry-run

  # Prefer specific models, in order
  roadmapper generate --objective "Learn Go" --goal "Ship a service" \
      --model google/gemini-2.0-flash-001 --model meta-llama/llama-3.3-70b-instruct

  # Continue an interrupted roadmap
  roadmapper resume learn-rust-roadmap

  # Inspect stored roadmaps
  roadmapper list
  roadmapper show learn-rust-roadmap --json

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > environment > config file > defaults
  Config file is discovered by searching upward from CWD for .roadmapper/config.toml
  Use --config to specify an explicit config file path

Press Ctrl-C during generation to pause: the in-flight request finishes or is
discarded, the job is parked, and `roadmapper resume` picks it up later.
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding roadmap documents
    #[arg(long, global = true)]
    pub store_dir: Option<String>,

    /// LLM provider: openrouter, anthropic or dry-run
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Model to try, in fallback order (repeatable)
    #[arg(long = "model", global = true)]
    pub models: Vec<String>,

    /// Maximum provider calls for this run
    #[arg(long, global = true)]
    pub call_budget: Option<u32>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use the offline dry-run provider (no network, no API key)
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a new roadmap and wait for it to finish
    Generate {
        /// What the learner wants to learn
        #[arg(long)]
        objective: String,

        /// What the learner wants to be able to do at the end
        #[arg(long)]
        goal: String,

        /// Starting level (free text, e.g. "beginner")
        #[arg(long, default_value = "")]
        level: String,
    },

    /// Continue an incomplete roadmap from its first undetailed phase
    Resume {
        /// Roadmap id (see `roadmapper list`)
        id: String,
    },

    /// Rebuild an existing roadmap from scratch under the same id
    Regenerate {
        /// Roadmap id (see `roadmapper list`)
        id: String,
    },

    /// List stored roadmaps
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one roadmap
    Show {
        id: String,

        /// Output the stored document as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a stored roadmap
    Delete { id: String },

    /// Print the effective configuration and where each value came from
    Config,
}

impl Cli {
    /// Configuration overrides carried by the global flags.
    #[must_use]
    pub fn to_cli_args(&self) -> CliArgs {
        CliArgs {
            config_path: self.config.clone(),
            store_dir: self.store_dir.clone(),
            provider: self.provider.clone(),
            models: self.models.clone(),
            call_budget: self.call_budget,
            // Only an explicit flag overrides the config file
            verbose: self.verbose.then_some(true),
            dry_run: self.dry_run,
        }
    }
}

/// Build the clap command (used for completions and argument tests).
#[must_use]
pub fn build_cli() -> clap::Command {
    Cli::command()
}
