//! Foreground draining with progress output and Ctrl-C handling.

use tokio::sync::watch;

use crate::{ExitCode, Orchestrator, OrchestratorStatus};

/// How a foreground drain ended.
#[derive(Debug, Clone)]
pub struct DrainSummary {
    pub status: OrchestratorStatus,
    /// Ctrl-C was received and the queue paused
    pub interrupted: bool,
}

impl DrainSummary {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.interrupted || self.status.is_paused {
            ExitCode::INTERRUPTED
        } else if self.status.failed_jobs > 0 {
            ExitCode::JOB_FAILED
        } else {
            ExitCode::SUCCESS
        }
    }
}

/// One progress line for `status`, or `None` when nothing is executing.
#[must_use]
pub fn progress_line(status: &OrchestratorStatus) -> Option<String> {
    let job = status.current_job.as_ref()?;
    let line = match &status.current_roadmap {
        Some(roadmap) if !roadmap.phases.is_empty() => format!(
            "{}: phase {}/{} detailed",
            roadmap.title,
            roadmap.detailed_count(),
            roadmap.phases.len()
        ),
        _ => format!("{}: generating structure", job.objective.trim()),
    };
    Some(line)
}

/// Wait for the worker to go idle, printing progress to stderr.
///
/// The first Ctrl-C pauses the queue; the worker parks the executing job
/// once its in-flight request returns, and the drain ends when it does.
pub async fn drain_queue(orchestrator: &Orchestrator) -> DrainSummary {
    let mut rx = orchestrator.subscribe();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut interrupted = false;
    let mut signal_done = false;
    let mut last_line = String::new();

    loop {
        let status = current(&mut rx);
        if let Some(line) = progress_line(&status)
            && line != last_line
        {
            eprintln!("  {line}");
            last_line = line;
        }
        if status.is_idle() {
            return DrainSummary {
                status,
                interrupted,
            };
        }

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    return DrainSummary { status: orchestrator.status(), interrupted };
                }
            }
            signal = &mut ctrl_c, if !signal_done => {
                signal_done = true;
                if signal.is_ok() {
                    interrupted = true;
                    eprintln!("Pausing; waiting for the in-flight request to return...");
                    orchestrator.pause_queue();
                }
            }
        }
    }
}

fn current(rx: &mut watch::Receiver<OrchestratorStatus>) -> OrchestratorStatus {
    rx.borrow_and_update().clone()
}
