use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use roadmapper_store::Roadmap;

/// One request to generate, resume or regenerate a single roadmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapJob {
    pub job_id: String,
    pub objective: String,
    pub final_goal: String,
    #[serde(default)]
    pub starting_level: String,
    /// Stored roadmap to continue; set once the roadmap has been saved
    #[serde(default)]
    pub roadmap_id: Option<String>,
    #[serde(default)]
    pub is_resume: bool,
    #[serde(default)]
    pub is_regeneration: bool,
    /// Roadmap a regeneration replaces
    #[serde(default)]
    pub original_roadmap_id: Option<String>,
    /// Stamped by the orchestrator on enqueue
    #[serde(default)]
    pub enqueued_at: Option<DateTime<Utc>>,
}

impl RoadmapJob {
    /// A fresh generation request.
    #[must_use]
    pub fn new(
        objective: impl Into<String>,
        final_goal: impl Into<String>,
        starting_level: impl Into<String>,
    ) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            objective: objective.into(),
            final_goal: final_goal.into(),
            starting_level: starting_level.into(),
            roadmap_id: None,
            is_resume: false,
            is_regeneration: false,
            original_roadmap_id: None,
            enqueued_at: None,
        }
    }

    /// Continue an incomplete stored roadmap from its first undetailed phase.
    #[must_use]
    pub fn resume(roadmap: &Roadmap) -> Self {
        let mut job = Self::new(
            &roadmap.objective,
            &roadmap.final_goal,
            &roadmap.starting_level,
        );
        job.roadmap_id = Some(roadmap.id.clone());
        job.is_resume = true;
        job
    }

    /// Rebuild a stored roadmap from scratch under its existing id.
    #[must_use]
    pub fn regenerate(roadmap: &Roadmap) -> Self {
        let mut job = Self::new(
            &roadmap.objective,
            &roadmap.final_goal,
            &roadmap.starting_level,
        );
        job.is_regeneration = true;
        job.original_roadmap_id = Some(roadmap.id.clone());
        job
    }

    /// Whether `id` names this job or the roadmap it works on.
    #[must_use]
    pub fn matches(&self, id: &str) -> bool {
        self.job_id == id
            || self.roadmap_id.as_deref() == Some(id)
            || self.original_roadmap_id.as_deref() == Some(id)
    }
}
