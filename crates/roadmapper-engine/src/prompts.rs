//! Prompt construction for the two units of work.

use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::Duration;

use roadmapper_llm::{
    CompletionRequest, META_OBJECTIVE, META_PHASE_NUMBER, META_PHASE_TITLE, META_UNIT,
};
use roadmapper_store::Roadmap;

use crate::job::RoadmapJob;

const SYSTEM: &str = "You are an expert curriculum designer. You answer with a single JSON \
object and nothing else: no commentary, no Markdown.";

/// Which unit of work a prompt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Structure,
    /// Zero-based phase index
    Phase(usize),
}

impl Unit {
    #[must_use]
    pub fn label(self) -> String {
        match self {
            Self::Structure => "structure".to_string(),
            Self::Phase(index) => format!("phase-{}", index + 1),
        }
    }
}

/// A model-independent prompt; the retrier stamps the model on each attempt.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub unit: Unit,
    pub system: String,
    pub text: String,
    pub metadata: HashMap<String, Value>,
}

impl Prompt {
    #[must_use]
    pub fn to_request(&self, job_id: &str, model: &str, timeout: Duration) -> CompletionRequest {
        let mut request = CompletionRequest::new(job_id, model, self.text.clone(), timeout)
            .with_system(self.system.clone());
        request.metadata = self.metadata.clone();
        request
    }
}

fn level_clause(level: &str) -> String {
    if level.trim().is_empty() {
        "The learner's starting level is unknown; assume a motivated beginner.".to_string()
    } else {
        format!("The learner's starting level is: {}.", level.trim())
    }
}

/// Outline request: title plus ordered phase titles.
#[must_use]
pub fn structure_prompt(job: &RoadmapJob) -> Prompt {
    let text = format!(
        "Design a learning roadmap.\n\n\
         Objective: {objective}\n\
         Final goal: {goal}\n\
         {level}\n\n\
         Split the journey into 3 to 7 sequential phases. Respond with JSON of the form:\n\
         {{\"title\": \"<roadmap title>\", \"phases\": [{{\"phaseNumber\": 1, \"title\": \"<phase title>\"}}]}}",
        objective = job.objective.trim(),
        goal = job.final_goal.trim(),
        level = level_clause(&job.starting_level),
    );

    let mut metadata = HashMap::new();
    metadata.insert(META_UNIT.to_string(), json!("structure"));
    metadata.insert(META_OBJECTIVE.to_string(), json!(job.objective.trim()));

    Prompt {
        unit: Unit::Structure,
        system: SYSTEM.to_string(),
        text,
        metadata,
    }
}

/// Detail request for the phase at `index`.
#[must_use]
pub fn phase_prompt(roadmap: &Roadmap, index: usize) -> Prompt {
    let outline = roadmap
        .phases
        .iter()
        .map(|p| format!("{}. {}", p.phase_number, p.title))
        .collect::<Vec<_>>()
        .join("\n");
    let phase = &roadmap.phases[index];

    let text = format!(
        "Roadmap: {title}\n\
         Objective: {objective}\n\
         Final goal: {goal}\n\
         {level}\n\n\
         Phases:\n{outline}\n\n\
         Detail phase {number} (\"{phase_title}\"). Respond with JSON of the form:\n\
         {{\"duration\": \"<e.g. 2 weeks>\", \"goal\": \"<what the learner achieves>\", \
         \"miniGoals\": [{{\"title\": \"\", \"description\": \"\", \"estimatedTime\": \"\", \"priority\": \"high|medium|low\"}}], \
         \"resources\": [{{\"title\": \"\", \"url\": \"\", \"type\": \"article|video|book|course|docs\"}}], \
         \"project\": {{\"title\": \"\", \"description\": \"\", \"deliverables\": [\"\"]}}, \
         \"skills\": [\"\"], \"milestone\": \"\"}}",
        title = roadmap.title,
        objective = roadmap.objective,
        goal = roadmap.final_goal,
        level = level_clause(&roadmap.starting_level),
        number = phase.phase_number,
        phase_title = phase.title,
    );

    let mut metadata = HashMap::new();
    metadata.insert(META_UNIT.to_string(), json!("phase"));
    metadata.insert(META_PHASE_NUMBER.to_string(), json!(phase.phase_number));
    metadata.insert(META_PHASE_TITLE.to_string(), json!(phase.title));

    Prompt {
        unit: Unit::Phase(index),
        system: SYSTEM.to_string(),
        text,
        metadata,
    }
}
