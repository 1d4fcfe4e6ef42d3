//! Per-job phase state machine.
//!
//! ```text
//! NeedsStructure --structure ok--> StructureGenerated --> Detailing(i) --> ... --> Complete
//! ```
//!
//! The state is always re-derivable from the stored roadmap, which is what
//! makes resumption work: phases are detailed in ascending order, never
//! skipped and never regenerated once their goal is set.

use serde::Deserialize;
use serde_json::Value;

use roadmapper_store::{MiniGoal, Phase, Project, Resource, Roadmap, SENTINEL_GOAL};

use crate::error::GenerationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseState {
    NeedsStructure,
    StructureGenerated,
    /// Zero-based index of the next phase to detail
    Detailing(usize),
    Complete,
}

impl PhaseState {
    /// Entry state for a (possibly partially generated) roadmap.
    #[must_use]
    pub fn of(roadmap: &Roadmap) -> Self {
        if roadmap.phases.is_empty() {
            Self::NeedsStructure
        } else {
            Self::next_undetailed(roadmap)
        }
    }

    /// First phase still carrying the sentinel, or `Complete`.
    #[must_use]
    pub fn next_undetailed(roadmap: &Roadmap) -> Self {
        match roadmap.first_undetailed() {
            Some(index) => Self::Detailing(index),
            None => Self::Complete,
        }
    }
}

/// Replace the roadmap's outline with the structure response.
///
/// # Errors
///
/// `InvalidStructure` unless `value` is an object with a non-empty `phases`
/// array of objects. The roadmap is untouched on error.
pub fn apply_structure(roadmap: &mut Roadmap, value: &Value) -> Result<(), GenerationError> {
    let invalid = |reason: &str| GenerationError::InvalidStructure {
        reason: reason.to_string(),
    };

    let object = value.as_object().ok_or_else(|| invalid("response is not an object"))?;
    let phases = object
        .get("phases")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid("missing 'phases' array"))?;
    if phases.is_empty() {
        return Err(invalid("'phases' is empty"));
    }

    let mut outline = Vec::with_capacity(phases.len());
    for (i, entry) in phases.iter().enumerate() {
        let entry = entry
            .as_object()
            .ok_or_else(|| invalid("phase entries must be objects"))?;
        let number = (i + 1) as u32;
        let title = entry
            .get("title")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map_or_else(|| format!("Phase {number}"), str::to_string);
        outline.push(Phase::placeholder(number, title));
    }

    if let Some(title) = object
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        roadmap.title = title.to_string();
    } else if roadmap.title.is_empty() {
        roadmap.title = format!("{} Roadmap", roadmap.objective.trim());
    }

    roadmap.phases = outline;
    roadmap.refresh_generation_state();
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhaseDetail {
    #[serde(default)]
    duration: String,
    #[serde(default)]
    goal: String,
    #[serde(default)]
    mini_goals: Vec<MiniGoalDraft>,
    #[serde(default)]
    resources: Vec<Resource>,
    #[serde(default)]
    project: Option<Project>,
    #[serde(default)]
    skills: Vec<String>,
    #[serde(default)]
    milestone: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MiniGoalDraft {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    estimated_time: String,
    #[serde(default)]
    priority: String,
}

/// Merge a phase-detail response into the phase at `index`.
///
/// Mini-goal ids default to `mini-goal-{index+1}-{j+1}`; every mini-goal
/// starts incomplete. The phase keeps its number and outline title.
///
/// # Errors
///
/// `MalformedResponse` when the response does not describe a phase or has no
/// usable goal (which would leave the phase undetailed).
pub fn merge_phase_detail(
    roadmap: &mut Roadmap,
    index: usize,
    value: &Value,
) -> Result<(), GenerationError> {
    let malformed = |reason: String| GenerationError::MalformedResponse { reason };

    // Some models nest the answer under "phase"
    let body = value.get("phase").filter(|v| v.is_object()).unwrap_or(value);
    let detail: PhaseDetail = serde_json::from_value(body.clone())
        .map_err(|e| malformed(format!("phase detail has unexpected shape: {e}")))?;

    let goal = detail.goal.trim();
    if goal.is_empty() || goal == SENTINEL_GOAL {
        return Err(malformed("phase detail has no goal".to_string()));
    }

    let phase = roadmap
        .phases
        .get_mut(index)
        .ok_or_else(|| malformed(format!("phase index {index} out of range")))?;

    phase.duration = detail.duration;
    phase.goal = goal.to_string();
    phase.resources = detail.resources;
    phase.project = detail.project;
    phase.skills = detail.skills;
    phase.milestone = detail.milestone;
    phase.mini_goals = detail
        .mini_goals
        .into_iter()
        .enumerate()
        .map(|(j, draft)| MiniGoal {
            id: draft
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| format!("mini-goal-{}-{}", index + 1, j + 1)),
            title: draft.title,
            description: draft.description,
            estimated_time: draft.estimated_time,
            priority: draft.priority,
            completed: false,
            completed_date: None,
        })
        .collect();
    phase.recompute_progress();

    roadmap.refresh_generation_state();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadmapper_store::GenerationState;
    use serde_json::json;

    fn outlined() -> Roadmap {
        let mut roadmap = Roadmap::new("Learn Rust", "Write a CLI tool", "");
        apply_structure(
            &mut roadmap,
            &json!({"title": "Rust Path", "phases": [{"title": "A"}, {"title": "B"}, {"title": "C"}]}),
        )
        .unwrap();
        roadmap
    }

    fn detail(goal: &str) -> Value {
        json!({
            "duration": "1 week",
            "goal": goal,
            "miniGoals": [{"title": "one"}, {"id": "custom", "title": "two"}],
            "resources": [{"title": "Book", "url": "https://x", "type": "book"}],
            "skills": ["s"],
            "milestone": "m"
        })
    }

    #[test]
    fn test_structure_produces_sentinel_phases() {
        let roadmap = outlined();
        assert_eq!(roadmap.title, "Rust Path");
        assert_eq!(roadmap.phases.len(), 3);
        assert!(roadmap.phases.iter().all(|p| p.goal == SENTINEL_GOAL));
        assert_eq!(roadmap.phases[2].phase_number, 3);
        assert_eq!(roadmap.generation_state, GenerationState::InProgress);
        assert_eq!(PhaseState::of(&roadmap), PhaseState::Detailing(0));
    }

    #[test]
    fn test_invalid_structure_leaves_roadmap_untouched() {
        let mut roadmap = Roadmap::new("Learn Rust", "Write a CLI tool", "");
        for bad in [json!([]), json!({"phases": []}), json!({"title": "x"}), json!({"phases": [1]})] {
            assert!(matches!(
                apply_structure(&mut roadmap, &bad),
                Err(GenerationError::InvalidStructure { .. })
            ));
        }
        assert!(roadmap.phases.is_empty());
        assert_eq!(PhaseState::of(&roadmap), PhaseState::NeedsStructure);
    }

    #[test]
    fn test_missing_titles_get_defaults() {
        let mut roadmap = Roadmap::new("Learn Rust", "Write a CLI tool", "");
        apply_structure(&mut roadmap, &json!({"phases": [{}, {"title": " "}]})).unwrap();
        assert_eq!(roadmap.title, "Learn Rust Roadmap");
        assert_eq!(roadmap.phases[1].title, "Phase 2");
    }

    #[test]
    fn test_merge_defaults_mini_goals_and_advances() {
        let mut roadmap = outlined();
        merge_phase_detail(&mut roadmap, 0, &detail("Read the book")).unwrap();

        let phase = &roadmap.phases[0];
        assert!(phase.is_detailed());
        assert_eq!(phase.title, "A");
        assert_eq!(phase.mini_goals[0].id, "mini-goal-1-1");
        assert_eq!(phase.mini_goals[1].id, "custom");
        assert!(phase.mini_goals.iter().all(|g| !g.completed && g.completed_date.is_none()));
        assert_eq!(phase.progress_percentage, 0);
        assert_eq!(PhaseState::next_undetailed(&roadmap), PhaseState::Detailing(1));
    }

    #[test]
    fn test_nested_phase_object_is_accepted() {
        let mut roadmap = outlined();
        merge_phase_detail(&mut roadmap, 1, &json!({"phase": detail("Nested")})).unwrap();
        assert_eq!(roadmap.phases[1].goal, "Nested");
        assert_eq!(roadmap.phases[1].mini_goals[0].id, "mini-goal-2-1");
    }

    #[test]
    fn test_goalless_detail_is_malformed() {
        let mut roadmap = outlined();
        for bad in [detail(""), detail("..."), json!({"goal": 5})] {
            assert!(matches!(
                merge_phase_detail(&mut roadmap, 0, &bad),
                Err(GenerationError::MalformedResponse { .. })
            ));
        }
        assert!(!roadmap.phases[0].is_detailed());
    }

    #[test]
    fn test_completed_iff_every_phase_detailed() {
        let mut roadmap = outlined();
        for i in 0..3 {
            assert_ne!(roadmap.generation_state, GenerationState::Completed);
            merge_phase_detail(&mut roadmap, i, &detail("g")).unwrap();
        }
        assert_eq!(roadmap.generation_state, GenerationState::Completed);
        assert_eq!(PhaseState::of(&roadmap), PhaseState::Complete);
    }
}
