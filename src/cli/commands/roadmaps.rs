//! Read-only and delete commands over the roadmap store.

use anyhow::{Context, Result};
use serde::Serialize;

use super::common::open_store;

use crate::{Config, ExitCode, GenerationState, Roadmap, RoadmapStore, RoadmapperError};

/// Row of `roadmapper list --json`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapSummary {
    pub id: String,
    pub title: String,
    pub generation_state: GenerationState,
    pub detailed_phases: usize,
    pub total_phases: usize,
    pub progress_percentage: u8,
}

impl From<&Roadmap> for RoadmapSummary {
    fn from(roadmap: &Roadmap) -> Self {
        Self {
            id: roadmap.id.clone(),
            title: roadmap.title.clone(),
            generation_state: roadmap.generation_state,
            detailed_phases: roadmap.detailed_count(),
            total_phases: roadmap.phases.len(),
            progress_percentage: roadmap.progress_percentage(),
        }
    }
}

/// Execute `roadmapper list`
pub fn execute_list_command(json: bool, config: &Config) -> Result<ExitCode> {
    let store = open_store(config)?;
    let roadmaps = store.list_all().map_err(RoadmapperError::from)?;

    if json {
        let rows: Vec<RoadmapSummary> = roadmaps.iter().map(RoadmapSummary::from).collect();
        let out = serde_json::to_string_pretty(&rows).context("Failed to emit roadmap list JSON")?;
        println!("{out}");
        return Ok(ExitCode::SUCCESS);
    }

    if roadmaps.is_empty() {
        println!("No roadmaps in {}", store.root());
        return Ok(ExitCode::SUCCESS);
    }

    for roadmap in &roadmaps {
        println!(
            "{:<40} {:<12} {}/{}  {}",
            roadmap.id,
            roadmap.generation_state.to_string(),
            roadmap.detailed_count(),
            roadmap.phases.len(),
            roadmap.title
        );
    }
    Ok(ExitCode::SUCCESS)
}

/// Execute `roadmapper show <id>`
pub fn execute_show_command(roadmap_id: &str, json: bool, config: &Config) -> Result<ExitCode> {
    let store = open_store(config)?;
    let roadmap = store.get(roadmap_id).map_err(RoadmapperError::from)?;

    if json {
        let out = serde_json::to_string_pretty(&roadmap).context("Failed to emit roadmap JSON")?;
        println!("{out}");
    } else {
        print!("{}", render_roadmap(&roadmap));
    }
    Ok(ExitCode::SUCCESS)
}

/// Execute `roadmapper delete <id>`
pub fn execute_delete_command(roadmap_id: &str, config: &Config) -> Result<ExitCode> {
    let store = open_store(config)?;
    store.remove(roadmap_id).map_err(RoadmapperError::from)?;
    println!("Deleted roadmap '{roadmap_id}'");
    Ok(ExitCode::SUCCESS)
}

/// Human-readable rendering used by `show`.
pub(crate) fn render_roadmap(roadmap: &Roadmap) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", roadmap.title));
    out.push_str(&format!("  Id:        {}\n", roadmap.id));
    out.push_str(&format!("  Objective: {}\n", roadmap.objective));
    out.push_str(&format!("  Goal:      {}\n", roadmap.final_goal));
    if !roadmap.starting_level.is_empty() {
        out.push_str(&format!("  Level:     {}\n", roadmap.starting_level));
    }
    out.push_str(&format!(
        "  State:     {} ({}/{} phases detailed)\n",
        roadmap.generation_state,
        roadmap.detailed_count(),
        roadmap.phases.len()
    ));

    for phase in &roadmap.phases {
        out.push('\n');
        out.push_str(&format!("Phase {}: {}", phase.phase_number, phase.title));
        if !phase.duration.is_empty() {
            out.push_str(&format!(" ({})", phase.duration));
        }
        out.push('\n');
        if !phase.is_detailed() {
            out.push_str("  (not yet detailed)\n");
            continue;
        }
        out.push_str(&format!("  Goal: {}\n", phase.goal));
        for goal in &phase.mini_goals {
            let mark = if goal.completed { "x" } else { " " };
            out.push_str(&format!("  [{mark}] {}\n", goal.title));
        }
        if let Some(project) = &phase.project {
            out.push_str(&format!("  Project: {}\n", project.title));
        }
        if !phase.milestone.is_empty() {
            out.push_str(&format!("  Milestone: {}\n", phase.milestone));
        }
    }
    out
}
