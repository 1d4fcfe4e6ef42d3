//! Generate, resume and regenerate commands.
//!
//! All three enqueue one job on a fresh worker session and drain it in the
//! foreground.

use anyhow::Result;

use super::common::WorkerSession;
use super::drain::{DrainSummary, drain_queue};

use crate::{Config, ExitCode, RoadmapJob, RoadmapStore, RoadmapperError};

/// Execute `roadmapper generate`
pub async fn execute_generate_command(
    objective: &str,
    goal: &str,
    level: &str,
    config: &Config,
) -> Result<ExitCode> {
    let session = WorkerSession::open(config)?;
    session
        .orchestrator
        .enqueue(RoadmapJob::new(objective, goal, level));

    eprintln!("Generating roadmap for '{}'", objective.trim());
    let summary = drain_queue(&session.orchestrator).await;
    Ok(finish(&session, &summary, objective.trim()))
}

/// Execute `roadmapper resume <id>`
pub async fn execute_resume_command(roadmap_id: &str, config: &Config) -> Result<ExitCode> {
    let session = WorkerSession::open(config)?;
    if !session
        .orchestrator
        .retry(roadmap_id)
        .map_err(RoadmapperError::from)?
    {
        println!("Roadmap '{roadmap_id}' is already queued");
        return Ok(ExitCode::SUCCESS);
    }

    eprintln!("Resuming roadmap '{roadmap_id}'");
    let summary = drain_queue(&session.orchestrator).await;
    Ok(finish(&session, &summary, roadmap_id))
}

/// Execute `roadmapper regenerate <id>`
pub async fn execute_regenerate_command(roadmap_id: &str, config: &Config) -> Result<ExitCode> {
    let session = WorkerSession::open(config)?;
    session
        .orchestrator
        .regenerate(roadmap_id)
        .map_err(RoadmapperError::from)?;

    eprintln!("Regenerating roadmap '{roadmap_id}' from scratch");
    let summary = drain_queue(&session.orchestrator).await;
    Ok(finish(&session, &summary, roadmap_id))
}

/// Print the outcome of a drain. `reference` names what the command was
/// started with (objective or roadmap id).
fn finish(session: &WorkerSession, summary: &DrainSummary, reference: &str) -> ExitCode {
    let code = summary.exit_code();

    if code == ExitCode::INTERRUPTED {
        match summary.status.queue.first().and_then(|j| j.roadmap_id.clone()) {
            Some(id) => println!("Paused. Continue with: roadmapper resume {id}"),
            None => println!("Paused before the structure was saved; nothing to resume."),
        }
        return code;
    }

    if let Some(error) = &summary.status.last_error {
        eprintln!("✗ {error}");
    }

    if let Some(roadmap) = &summary.status.current_roadmap {
        let stored = session.store.get(&roadmap.id).ok();
        let roadmap = stored.as_ref().unwrap_or(roadmap);
        println!(
            "{} [{}] {}/{} phases detailed ({})",
            roadmap.id,
            roadmap.generation_state,
            roadmap.detailed_count(),
            roadmap.phases.len(),
            roadmap.title
        );
        if code != ExitCode::SUCCESS {
            println!("Continue with: roadmapper resume {}", roadmap.id);
        }
    } else if code != ExitCode::SUCCESS {
        println!("No roadmap was saved for '{reference}'");
    }

    code
}
