use std::collections::VecDeque;

use crate::dedup::is_equivalent;
use crate::job::RoadmapJob;

/// Ordered pending jobs. FIFO, except that parked jobs return to the head.
#[derive(Debug, Clone, Default)]
pub struct GenerationQueue {
    jobs: VecDeque<RoadmapJob>,
}

impl GenerationQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoadmapJob> {
        self.jobs.iter()
    }

    #[must_use]
    pub fn contains_job(&self, job_id: &str) -> bool {
        self.jobs.iter().any(|j| j.job_id == job_id)
    }

    /// First queued job equivalent to `candidate`, if any.
    #[must_use]
    pub fn find_equivalent(&self, candidate: &RoadmapJob) -> Option<&RoadmapJob> {
        self.jobs.iter().find(|j| is_equivalent(candidate, j))
    }

    pub fn push_back(&mut self, job: RoadmapJob) {
        self.jobs.push_back(job);
    }

    pub fn push_front(&mut self, job: RoadmapJob) {
        self.jobs.push_front(job);
    }

    pub fn pop_front(&mut self) -> Option<RoadmapJob> {
        self.jobs.pop_front()
    }

    /// Remove every job whose id or target roadmap id equals `id`.
    pub fn remove_matching(&mut self, id: &str) -> Vec<RoadmapJob> {
        let (removed, kept): (Vec<_>, Vec<_>) = self.jobs.drain(..).partition(|j| j.matches(id));
        self.jobs = kept.into();
        removed
    }

    /// Remove entries carrying exactly this job id.
    pub fn remove_job(&mut self, job_id: &str) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|j| j.job_id != job_id);
        before - self.jobs.len()
    }

    /// Point queued copies of `job_id` that have no roadmap yet at
    /// `roadmap_id`, turning them into resumes.
    pub fn attach_roadmap(&mut self, job_id: &str, roadmap_id: &str) {
        for job in self.jobs.iter_mut().filter(|j| j.job_id == job_id && j.roadmap_id.is_none()) {
            job.roadmap_id = Some(roadmap_id.to_string());
            job.is_resume = true;
        }
    }

    /// Move a job to `index` (clamped to the end). Returns false if absent.
    pub fn move_to(&mut self, job_id: &str, index: usize) -> bool {
        let Some(from) = self.jobs.iter().position(|j| j.job_id == job_id) else {
            return false;
        };
        let Some(job) = self.jobs.remove(from) else {
            return false;
        };
        let to = index.min(self.jobs.len());
        self.jobs.insert(to, job);
        true
    }

    pub fn clear(&mut self) -> usize {
        let count = self.jobs.len();
        self.jobs.clear();
        count
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<RoadmapJob> {
        self.jobs.iter().cloned().collect()
    }
}
