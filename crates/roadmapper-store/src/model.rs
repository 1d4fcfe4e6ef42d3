//! Roadmap document model.
//!
//! Documents serialize with camelCase keys so stored files stay compatible
//! with the JSON shape the models are prompted to produce.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Goal value marking a phase that has not been detailed yet.
pub const SENTINEL_GOAL: &str = "...";

fn sentinel() -> String {
    SENTINEL_GOAL.to_string()
}

/// Lifecycle of a stored roadmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationState {
    #[default]
    Queued,
    InProgress,
    Completed,
}

impl fmt::Display for GenerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::InProgress => write!(f, "in-progress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roadmap {
    /// Store key; empty until the first save assigns one
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub objective: String,
    pub final_goal: String,
    #[serde(default)]
    pub starting_level: String,
    #[serde(default)]
    pub generation_state: GenerationState,
    #[serde(default)]
    pub phases: Vec<Phase>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Roadmap {
    /// A fresh roadmap with no structure yet.
    #[must_use]
    pub fn new(
        objective: impl Into<String>,
        final_goal: impl Into<String>,
        starting_level: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            title: String::new(),
            objective: objective.into(),
            final_goal: final_goal.into(),
            starting_level: starting_level.into(),
            generation_state: GenerationState::Queued,
            phases: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// True once the structure exists and every phase is detailed.
    ///
    /// A roadmap without phases is never complete.
    #[must_use]
    pub fn is_fully_detailed(&self) -> bool {
        !self.phases.is_empty() && self.phases.iter().all(Phase::is_detailed)
    }

    /// Index of the first phase still carrying the sentinel goal.
    #[must_use]
    pub fn first_undetailed(&self) -> Option<usize> {
        self.phases.iter().position(|p| !p.is_detailed())
    }

    #[must_use]
    pub fn detailed_count(&self) -> usize {
        self.phases.iter().filter(|p| p.is_detailed()).count()
    }

    /// Derive `generation_state` from the phases.
    ///
    /// `Completed` exactly when [`Roadmap::is_fully_detailed`] holds; a
    /// roadmap with structure but undetailed phases is `InProgress`.
    pub fn refresh_generation_state(&mut self) {
        self.generation_state = if self.is_fully_detailed() {
            GenerationState::Completed
        } else if self.phases.is_empty() && self.generation_state == GenerationState::Queued {
            GenerationState::Queued
        } else {
            GenerationState::InProgress
        };
    }

    /// Overall progress across every mini-goal, 0 when there are none.
    #[must_use]
    pub fn progress_percentage(&self) -> u8 {
        let (done, total) = self.phases.iter().fold((0usize, 0usize), |(d, t), p| {
            (
                d + p.mini_goals.iter().filter(|g| g.completed).count(),
                t + p.mini_goals.len(),
            )
        });
        percentage(done, total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    #[serde(default)]
    pub phase_number: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default = "sentinel")]
    pub goal: String,
    #[serde(default)]
    pub mini_goals: Vec<MiniGoal>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub project: Option<Project>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub milestone: String,
    #[serde(default)]
    pub progress_percentage: u8,
}

impl Phase {
    /// Structure-only phase: number and title, sentinel goal.
    #[must_use]
    pub fn placeholder(phase_number: u32, title: impl Into<String>) -> Self {
        Self {
            phase_number,
            title: title.into(),
            duration: String::new(),
            goal: sentinel(),
            mini_goals: Vec::new(),
            resources: Vec::new(),
            project: None,
            skills: Vec::new(),
            milestone: String::new(),
            progress_percentage: 0,
        }
    }

    #[must_use]
    pub fn is_detailed(&self) -> bool {
        self.goal != SENTINEL_GOAL
    }

    /// Recompute `progress_percentage` from the mini-goals.
    pub fn recompute_progress(&mut self) {
        let done = self.mini_goals.iter().filter(|g| g.completed).count();
        self.progress_percentage = percentage(done, self.mini_goals.len());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniGoal {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub estimated_time: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub completed: bool,
    /// Set iff `completed`
    #[serde(default)]
    pub completed_date: Option<DateTime<Utc>>,
}

impl MiniGoal {
    /// Mark (or unmark) as completed, keeping `completed_date` in step.
    pub fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
        self.completed_date = completed.then(Utc::now);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deliverables: Vec<String>,
}

fn percentage(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((done as f64 * 100.0) / total as f64).round() as u8
}
