//! Logging and observability infrastructure for roadmapper
//!
//! Structured logging goes through `tracing`; the CLI installs a
//! `tracing-subscriber` once at startup. Library crates only emit events and
//! never install a subscriber themselves.

use tracing::{Level, info, span, warn};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::redaction::redact_error_message;

/// Initialize tracing subscriber for structured logging
///
/// `RUST_LOG` takes precedence. Otherwise the filter is `roadmapper=info,warn`,
/// or `roadmapper=debug,info` when `verbose` is set.
///
/// Verbose mode also emits span close events so per-job and per-phase
/// durations show up in the log.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("roadmapper=debug,info")
            } else {
                EnvFilter::try_new("roadmapper=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Span covering one generation job.
pub fn job_span(job_id: &str, objective: &str) -> tracing::Span {
    span!(
        Level::INFO,
        "roadmap_job",
        job_id = %job_id,
        objective = %objective,
    )
}

/// Span covering one unit of work (structure call or one phase detail call).
pub fn phase_span(job_id: &str, unit: &str) -> tracing::Span {
    span!(Level::DEBUG, "roadmap_unit", job_id = %job_id, unit = %unit)
}

/// Log a completed checkpoint.
pub fn log_checkpoint(roadmap_id: &str, detailed: usize, total: usize) {
    info!(
        roadmap_id = %roadmap_id,
        detailed = detailed,
        total = total,
        "Checkpointed roadmap"
    );
}

/// Log a job failure. The message is redacted before it reaches the log.
pub fn log_job_error(job_id: &str, error: &str) {
    warn!(
        job_id = %job_id,
        error = %redact_error_message(error),
        "Roadmap job failed"
    );
}
