//! CLI entry point and dispatch logic
//!
//! This module owns the `run()` function which:
//! - Parses CLI arguments
//! - Builds CliArgs and discovers Config
//! - Creates the tokio runtime
//! - Dispatches to command handlers
//! - Handles all error output

use anyhow::Result;
use clap::Parser;

use super::args::{Cli, Commands};
use super::commands;

use crate::{Config, ExitCode, RoadmapperError, UserFriendlyError};
use roadmapper_utils::error::ConfigError;
use roadmapper_utils::logging::init_tracing;
use roadmapper_utils::redaction::redact_error_message;

/// Main CLI execution function.
///
/// This function handles ALL output including errors. It returns `Result<(), ExitCode>`:
/// - On success: returns `Ok(())` after printing any output
/// - On error: prints a user-facing report, returns `Err(ExitCode)`
///
/// main.rs only calls `std::process::exit(code.as_i32())` on error - it does NOT print.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();
    let cli_args = cli.to_cli_args();

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => {
            match err.downcast_ref::<ConfigError>() {
                Some(config_error) => eprintln!("{}", config_error.display_for_user()),
                None => eprintln!("✗ Failed to load configuration: {err:#}"),
            }
            return Err(ExitCode::CLI_ARGS);
        }
    };

    if let Err(e) = init_tracing(config.verbose()) {
        eprintln!("Warning: failed to initialize logging: {e}");
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let result: Result<ExitCode> = rt.block_on(async {
        match cli.command {
            Commands::Generate {
                objective,
                goal,
                level,
            } => commands::execute_generate_command(&objective, &goal, &level, &config).await,
            Commands::Resume { id } => commands::execute_resume_command(&id, &config).await,
            Commands::Regenerate { id } => {
                commands::execute_regenerate_command(&id, &config).await
            }
            Commands::List { json } => commands::execute_list_command(json, &config),
            Commands::Show { id, json } => commands::execute_show_command(&id, json, &config),
            Commands::Delete { id } => commands::execute_delete_command(&id, &config),
            Commands::Config => commands::execute_config_command(&config),
        }
    });

    match result {
        Ok(code) if code == ExitCode::SUCCESS => Ok(()),
        Ok(code) => Err(code),
        Err(error) => Err(report_error(&error)),
    }
}

/// Print `error` for the user and pick the exit code.
pub(crate) fn report_error(error: &anyhow::Error) -> ExitCode {
    if let Some(roadmapper_error) = error.downcast_ref::<RoadmapperError>() {
        eprintln!(
            "{}",
            redact_error_message(&roadmapper_error.display_for_user())
        );
        return roadmapper_error.exit_code();
    }

    eprintln!(
        "✗ Unexpected error: {}",
        redact_error_message(&format!("{error:#}"))
    );
    eprintln!("\n  General troubleshooting:");
    eprintln!("    - Run with --verbose for more detailed output");
    eprintln!("    - Check that the store directory is writable");
    ExitCode::INTERNAL
}
