//! Offline provider returning canned roadmap JSON.
//!
//! Lets the whole pipeline run without network access or API keys. Output is
//! a pure function of the request metadata, so repeated runs produce the same
//! roadmap.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

use roadmapper_utils::error::CompletionError;

use crate::types::{
    Completion, CompletionProvider, CompletionRequest, META_PHASE_NUMBER, META_PHASE_TITLE,
};

/// Metadata key carrying the learning objective for structure requests
pub const META_OBJECTIVE: &str = "objective";

const PHASE_TITLES: &[&str] = &["Foundations", "Core Practice", "Applied Project"];

#[derive(Debug, Clone, Default)]
pub struct DryRunProvider {
    latency: Duration,
}

impl DryRunProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate network latency on every call
    #[must_use]
    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }

    fn structure(request: &CompletionRequest) -> String {
        let objective = request
            .metadata
            .get(META_OBJECTIVE)
            .and_then(|v| v.as_str())
            .unwrap_or("Your Objective");
        let phases: Vec<_> = PHASE_TITLES
            .iter()
            .enumerate()
            .map(|(i, title)| json!({ "phaseNumber": i + 1, "title": title }))
            .collect();
        let body = json!({ "title": format!("{objective} Roadmap"), "phases": phases });
        format!("```json\n{body:#}\n```")
    }

    fn phase(request: &CompletionRequest) -> String {
        let number = request
            .metadata
            .get(META_PHASE_NUMBER)
            .and_then(|v| v.as_u64())
            .unwrap_or(1);
        let title = request
            .metadata
            .get(META_PHASE_TITLE)
            .and_then(|v| v.as_str())
            .unwrap_or("Phase");
        json!({
            "duration": format!("{} weeks", number + 1),
            "goal": format!("Complete {title}"),
            "miniGoals": [
                {
                    "title": format!("Study {title}"),
                    "description": format!("Read and take notes on {title}."),
                    "estimatedTime": "3 days",
                    "priority": "high"
                },
                {
                    "title": format!("Practice {title}"),
                    "description": "Work through exercises.",
                    "estimatedTime": "1 week",
                    "priority": "medium"
                }
            ],
            "resources": [
                { "title": format!("{title} guide"), "url": "https://example.com/guide", "type": "article" }
            ],
            "project": {
                "title": format!("{title} mini project"),
                "description": "Apply what you learned.",
                "deliverables": ["Working code", "Short write-up"]
            },
            "skills": [title],
            "milestone": format!("{title} done")
        })
        .to_string()
    }
}

#[async_trait]
impl CompletionProvider for DryRunProvider {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CompletionError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let text = match request.unit() {
            Some("structure") => Self::structure(&request),
            Some("phase") => Self::phase(&request),
            other => {
                return Err(CompletionError::Unsupported(format!(
                    "dry-run provider cannot answer unit {other:?}"
                )));
            }
        };

        Ok(Completion::new(text, "dry-run", request.model))
    }
}
