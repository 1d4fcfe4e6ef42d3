//! The single worker loop and per-job execution.

use std::sync::Arc;
use tracing::{Instrument, debug, info};

use roadmapper_store::{GenerationState, Roadmap, StoreError};
use roadmapper_utils::error::UserFriendlyError;
use roadmapper_utils::logging::{job_span, log_checkpoint, log_job_error, phase_span};

use super::Inner;
use crate::error::GenerationError;
use crate::job::RoadmapJob;
use crate::phases::{PhaseState, apply_structure, merge_phase_detail};
use crate::prompts::{Prompt, phase_prompt, structure_prompt};
use crate::retrier::{ModelRotation, Outcome};

/// How a job that did not fail ended.
#[derive(Debug)]
enum JobRun {
    Completed(Roadmap),
    /// Stopped at a suspension point by pause, removal or clear
    Interrupted,
}

impl Inner {
    /// Process queued jobs until the queue is empty or paused.
    ///
    /// The exit decision and `is_processing = false` happen under the same
    /// lock `enqueue` uses to decide whether to start a worker, so a job
    /// enqueued while the loop is finishing is never stranded.
    pub(super) async fn drain(self: Arc<Self>) {
        loop {
            let job = {
                let mut state = self.lock();
                let next = if state.is_paused {
                    None
                } else {
                    state.queue.pop_front()
                };
                let Some(job) = next else {
                    state.is_processing = false;
                    state.current_job = None;
                    state.current_cancelled = false;
                    debug!(paused = state.is_paused, queued = state.queue.len(), "Worker idle");
                    self.publish(&state);
                    return;
                };
                state.current_job = Some(job.clone());
                state.current_cancelled = false;
                state.current_roadmap = None;
                self.interrupt.clear();
                self.publish(&state);
                job
            };

            let span = job_span(&job.job_id, &job.objective);
            let result = self.run_job(&job).instrument(span).await;

            {
                let mut state = self.lock();
                match result {
                    Ok(JobRun::Completed(roadmap)) => {
                        info!(
                            job_id = %job.job_id,
                            roadmap_id = %roadmap.id,
                            phases = roadmap.phases.len(),
                            "Roadmap generation completed"
                        );
                        state.completed_jobs += 1;
                        // A pause that landed after the last call may have
                        // parked a copy
                        state.queue.remove_job(&job.job_id);
                    }
                    Ok(JobRun::Interrupted) => {
                        info!(
                            job_id = %job.job_id,
                            paused = state.is_paused,
                            cancelled = state.current_cancelled,
                            "Job interrupted"
                        );
                    }
                    Err(e) => {
                        log_job_error(&job.job_id, &e.to_string());
                        state.last_error = Some(e.user_message());
                        state.failed_jobs += 1;
                        // Failed jobs are resumed explicitly, never by a
                        // parked copy
                        state.queue.remove_job(&job.job_id);
                    }
                }
                state.current_job = None;
                state.current_cancelled = false;
                self.publish(&state);
            }

            if !self.options.job_yield.is_zero() {
                tokio::time::sleep(self.options.job_yield).await;
            }
        }
    }

    async fn run_job(&self, job: &RoadmapJob) -> Result<JobRun, GenerationError> {
        let mut roadmap = self.starting_roadmap(job)?;
        let mut rotation = ModelRotation::new(self.options.models.clone())?;
        let mut phase = PhaseState::of(&roadmap);
        debug!(job_id = %job.job_id, state = ?phase, "Starting job");

        loop {
            match phase {
                PhaseState::NeedsStructure => {
                    let prompt = structure_prompt(job);
                    let Some(value) = self.call(job, &prompt, &mut rotation).await? else {
                        return Ok(JobRun::Interrupted);
                    };
                    apply_structure(&mut roadmap, &value)?;
                    roadmap = self.checkpoint(job, roadmap)?;
                    phase = PhaseState::StructureGenerated;
                }
                PhaseState::StructureGenerated => {
                    phase = PhaseState::next_undetailed(&roadmap);
                }
                PhaseState::Detailing(index) => {
                    let prompt = phase_prompt(&roadmap, index);
                    let Some(value) = self.call(job, &prompt, &mut rotation).await? else {
                        return Ok(JobRun::Interrupted);
                    };
                    merge_phase_detail(&mut roadmap, index, &value)?;
                    roadmap = self.checkpoint(job, roadmap)?;
                    phase = PhaseState::next_undetailed(&roadmap);
                }
                PhaseState::Complete => {
                    if roadmap.generation_state != GenerationState::Completed {
                        roadmap.refresh_generation_state();
                        roadmap = self.checkpoint(job, roadmap)?;
                    }
                    return Ok(JobRun::Completed(roadmap));
                }
            }
        }
    }

    /// The roadmap a job starts from: the stored one for resumes, otherwise a
    /// fresh document (keeping the original id for regenerations).
    fn starting_roadmap(&self, job: &RoadmapJob) -> Result<Roadmap, GenerationError> {
        if let Some(id) = &job.roadmap_id {
            let roadmap = self.store.get(id)?;
            info!(
                roadmap_id = %id,
                detailed = roadmap.detailed_count(),
                total = roadmap.phases.len(),
                "Resuming roadmap"
            );
            return Ok(roadmap);
        }

        let mut roadmap = Roadmap::new(&job.objective, &job.final_goal, &job.starting_level);
        if job.is_regeneration
            && let Some(original_id) = &job.original_roadmap_id
        {
            roadmap.id = original_id.clone();
            match self.store.get(original_id) {
                Ok(original) => roadmap.created_at = original.created_at,
                Err(StoreError::NotFound { .. }) => {
                    debug!(roadmap_id = %original_id, "Original roadmap gone; regenerating under its id");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(roadmap)
    }

    /// One unit of work through the retrier. `None` means interrupted.
    async fn call(
        &self,
        job: &RoadmapJob,
        prompt: &Prompt,
        rotation: &mut ModelRotation,
    ) -> Result<Option<serde_json::Value>, GenerationError> {
        let span = phase_span(&job.job_id, &prompt.unit.label());
        let outcome = self
            .retrier
            .generate(&job.job_id, prompt, rotation, &self.interrupt)
            .instrument(span)
            .await?;
        Ok(match outcome {
            Outcome::Done(value) => Some(value),
            Outcome::Interrupted => None,
        })
    }

    /// Persist `roadmap` and publish it. The store's copy (with its assigned
    /// id) becomes the working document.
    fn checkpoint(&self, job: &RoadmapJob, roadmap: Roadmap) -> Result<Roadmap, GenerationError> {
        let saved = match self.store.save(&roadmap) {
            Ok(saved) => saved,
            Err(e) => {
                let mut state = self.lock();
                state.current_roadmap = Some(roadmap);
                self.publish(&state);
                return Err(GenerationError::Persistence(e));
            }
        };
        log_checkpoint(&saved.id, saved.detailed_count(), saved.phases.len());

        let mut state = self.lock();
        state.current_roadmap = Some(saved.clone());
        if let Some(current) = state.current_job.as_mut()
            && current.job_id == job.job_id
            && current.roadmap_id.is_none()
        {
            current.roadmap_id = Some(saved.id.clone());
        }
        state.queue.attach_roadmap(&job.job_id, &saved.id);
        self.publish(&state);
        Ok(saved)
    }
}
