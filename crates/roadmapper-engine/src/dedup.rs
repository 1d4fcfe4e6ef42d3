//! Semantic equivalence of queue entries.

use unicode_normalization::UnicodeNormalization;

use crate::job::RoadmapJob;

/// Canonical form used for comparison: NFC, trimmed, lower-cased.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.nfc().collect::<String>().trim().to_lowercase()
}

/// Roadmap a job writes to, if it is tied to one.
fn target(job: &RoadmapJob) -> Option<&str> {
    if job.is_regeneration {
        job.original_roadmap_id.as_deref()
    } else {
        job.roadmap_id.as_deref()
    }
}

/// Whether `candidate` duplicates `existing`.
///
/// Plain jobs are equivalent when their normalized `(objective, final_goal)`
/// pairs match; `starting_level` is ignored. A regeneration only conflicts
/// with entries tied to the same stored roadmap.
#[must_use]
pub fn is_equivalent(candidate: &RoadmapJob, existing: &RoadmapJob) -> bool {
    if candidate.is_regeneration || existing.is_regeneration {
        return match (target(candidate), target(existing)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };
    }

    normalize(&candidate.objective) == normalize(&existing.objective)
        && normalize(&candidate.final_goal) == normalize(&existing.final_goal)
}
