//! Model fallback retrier.
//!
//! One logical call is attempted against the configured models in rotation.
//! Recoverable failures (rate limits, unavailable models, transient server
//! errors, timeouts) advance the cursor and retry after a fixed backoff; the
//! call fails once the cursor returns to where it started. The cursor lives
//! in [`ModelRotation`] and persists across calls within a job, so a model
//! that just failed is not retried first on the next phase.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use roadmapper_llm::{CompletionError, CompletionProvider};

use crate::error::GenerationError;
use crate::extraction::extract_json_object;
use crate::interrupt::InterruptToken;
use crate::prompts::Prompt;

/// Ordered model list plus the rotation cursor.
#[derive(Debug, Clone)]
pub struct ModelRotation {
    models: Vec<String>,
    cursor: usize,
}

impl ModelRotation {
    /// # Errors
    ///
    /// `GenerationError::NoModels` for an empty list.
    pub fn new(models: Vec<String>) -> Result<Self, GenerationError> {
        if models.is_empty() {
            return Err(GenerationError::NoModels);
        }
        Ok(Self { models, cursor: 0 })
    }

    #[must_use]
    pub fn current(&self) -> &str {
        &self.models[self.cursor]
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % self.models.len();
    }
}

/// Result of a call that was not a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Done(T),
    /// The interrupt token was set before or during the call; nothing was
    /// produced and nothing should be merged.
    Interrupted,
}

pub struct Retrier {
    provider: Arc<dyn CompletionProvider>,
    backoff: Duration,
    call_timeout: Duration,
}

impl Retrier {
    #[must_use]
    pub fn new(provider: Arc<dyn CompletionProvider>, backoff: Duration, call_timeout: Duration) -> Self {
        Self {
            provider,
            backoff,
            call_timeout,
        }
    }

    /// Run `prompt` until it yields a parsed JSON object, a fatal error, or
    /// an interrupt.
    ///
    /// The token is checked before every attempt and again when a call
    /// returns; a result that arrives after the interrupt is discarded.
    ///
    /// # Errors
    ///
    /// - `Provider` for a non-recoverable provider error
    /// - `ModelsExhausted` after every model failed recoverably once
    /// - `MalformedResponse` when the winning response holds no JSON object
    pub async fn generate(
        &self,
        job_id: &str,
        prompt: &Prompt,
        rotation: &mut ModelRotation,
        interrupt: &InterruptToken,
    ) -> Result<Outcome<Value>, GenerationError> {
        let start = rotation.cursor();
        let mut attempts = 0usize;

        loop {
            if interrupt.is_requested() {
                debug!(job_id, unit = %prompt.unit.label(), "Interrupt observed before call");
                return Ok(Outcome::Interrupted);
            }

            let model = rotation.current().to_string();
            debug!(job_id, model = %model, unit = %prompt.unit.label(), "Requesting completion");
            let request = prompt.to_request(job_id, &model, self.call_timeout);
            let result = match tokio::time::timeout(self.call_timeout, self.provider.complete(request)).await {
                Ok(result) => result,
                Err(_) => Err(CompletionError::Timeout {
                    duration: self.call_timeout,
                }),
            };

            if interrupt.is_requested() {
                debug!(job_id, model = %model, "Interrupt observed after call; discarding result");
                return Ok(Outcome::Interrupted);
            }

            let error = match result {
                Ok(completion) => {
                    return extract_json_object(&completion.text).map(Outcome::Done);
                }
                Err(e) if !e.is_recoverable() => return Err(GenerationError::Provider(e)),
                Err(e) => e,
            };

            attempts += 1;
            rotation.advance();
            if rotation.cursor() == start {
                warn!(job_id, attempts, error = %error, "All models exhausted");
                return Err(GenerationError::ModelsExhausted {
                    attempts,
                    last: error,
                });
            }

            warn!(
                job_id,
                model = %model,
                kind = %error.kind(),
                next_model = rotation.current(),
                "Recoverable provider error; rotating model"
            );
            if !self.backoff.is_zero() {
                tokio::time::sleep(self.backoff).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::RoadmapJob;
    use crate::prompts::structure_prompt;
    use async_trait::async_trait;
    use roadmapper_llm::{Completion, CompletionRequest};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted results and records the model of every call.
    struct Scripted {
        results: Mutex<VecDeque<Result<String, CompletionError>>>,
        calls: Mutex<Vec<String>>,
        interrupt_on_call: Option<InterruptToken>,
    }

    impl Scripted {
        fn new(results: Vec<Result<&str, CompletionError>>) -> Self {
            Self {
                results: Mutex::new(results.into_iter().map(|r| r.map(str::to_string)).collect()),
                calls: Mutex::new(Vec::new()),
                interrupt_on_call: None,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: CompletionRequest) -> Result<Completion, CompletionError> {
            self.calls.lock().unwrap().push(request.model.clone());
            if let Some(token) = &self.interrupt_on_call {
                token.request();
            }
            let next = self
                .results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(CompletionError::Transport("script exhausted".into())));
            next.map(|text| Completion::new(text, "scripted", request.model))
        }
    }

    fn models() -> ModelRotation {
        ModelRotation::new(vec!["m1".into(), "m2".into(), "m3".into()]).unwrap()
    }

    fn prompt() -> Prompt {
        structure_prompt(&RoadmapJob::new("Learn Rust", "Write a CLI tool", ""))
    }

    fn retrier(provider: Arc<Scripted>) -> Retrier {
        Retrier::new(provider, Duration::ZERO, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_rotates_past_recoverable_failures() {
        let provider = Arc::new(Scripted::new(vec![
            Err(CompletionError::RateLimited("429".into())),
            Err(CompletionError::ModelUnavailable("404".into())),
            Ok(r#"{"ok": 3}"#),
        ]));
        let mut rotation = models();

        let outcome = retrier(provider.clone())
            .generate("job", &prompt(), &mut rotation, &InterruptToken::new())
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Done(serde_json::json!({"ok": 3})));
        assert_eq!(provider.calls(), vec!["m1", "m2", "m3"]);
        assert_eq!(rotation.cursor(), 2, "cursor is not reset after success");
    }

    #[tokio::test]
    async fn test_exhausts_after_one_full_cycle() {
        let provider = Arc::new(Scripted::new(vec![
            Err(CompletionError::Transient("503".into())),
            Err(CompletionError::RateLimited("429".into())),
            Err(CompletionError::Timeout {
                duration: Duration::from_secs(1),
            }),
            Ok("{}"),
        ]));
        let mut rotation = models();

        let err = retrier(provider.clone())
            .generate("job", &prompt(), &mut rotation, &InterruptToken::new())
            .await
            .unwrap_err();

        match err {
            GenerationError::ModelsExhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(last, CompletionError::Timeout { .. }));
            }
            other => panic!("expected ModelsExhausted, got {other:?}"),
        }
        assert_eq!(provider.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_cycle_starts_from_persisted_cursor() {
        let provider = Arc::new(Scripted::new(vec![
            Err(CompletionError::RateLimited("429".into())),
            Ok("{}"),
        ]));
        let mut rotation = models();
        rotation.advance();

        retrier(provider.clone())
            .generate("job", &prompt(), &mut rotation, &InterruptToken::new())
            .await
            .unwrap();
        assert_eq!(provider.calls(), vec!["m2", "m3"]);
    }

    #[tokio::test]
    async fn test_fatal_error_propagates_without_rotation() {
        let provider = Arc::new(Scripted::new(vec![Err(CompletionError::Auth("401".into()))]));
        let mut rotation = models();

        let err = retrier(provider.clone())
            .generate("job", &prompt(), &mut rotation, &InterruptToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Provider(CompletionError::Auth(_))));
        assert_eq!(provider.calls().len(), 1);
        assert_eq!(rotation.cursor(), 0);
    }

    #[tokio::test]
    async fn test_malformed_output_is_fatal_for_the_call() {
        let provider = Arc::new(Scripted::new(vec![Ok("I cannot help with that."), Ok("{}")]));
        let err = retrier(provider.clone())
            .generate("job", &prompt(), &mut models(), &InterruptToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::MalformedResponse { .. }));
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_interrupt_before_call_issues_nothing() {
        let provider = Arc::new(Scripted::new(vec![Ok("{}")]));
        let token = InterruptToken::new();
        token.request();

        let outcome = retrier(provider.clone())
            .generate("job", &prompt(), &mut models(), &token)
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Interrupted);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_result_arriving_after_interrupt_is_discarded() {
        let token = InterruptToken::new();
        let mut scripted = Scripted::new(vec![Ok(r#"{"late": true}"#)]);
        scripted.interrupt_on_call = Some(token.clone());
        let provider = Arc::new(scripted);

        let outcome = retrier(provider.clone())
            .generate("job", &prompt(), &mut models(), &token)
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Interrupted);
        assert_eq!(provider.calls().len(), 1, "the in-flight call still ran");
    }

    #[tokio::test]
    async fn test_slow_provider_times_out_as_recoverable() {
        struct Slow;

        #[async_trait]
        impl CompletionProvider for Slow {
            fn name(&self) -> &str {
                "slow"
            }

            async fn complete(&self, _r: CompletionRequest) -> Result<Completion, CompletionError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Completion::new("{}", "slow", "m"))
            }
        }

        let retrier = Retrier::new(Arc::new(Slow), Duration::ZERO, Duration::from_millis(20));
        let mut rotation = ModelRotation::new(vec!["only".into()]).unwrap();
        let err = retrier
            .generate("job", &prompt(), &mut rotation, &InterruptToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GenerationError::ModelsExhausted {
                attempts: 1,
                last: CompletionError::Timeout { .. }
            }
        ));
    }

    fn spawn_generate(
        provider: Arc<Scripted>,
        backoff: Duration,
        token: InterruptToken,
    ) -> tokio::task::JoinHandle<Result<Outcome<Value>, GenerationError>> {
        let retrier = Retrier::new(provider, backoff, Duration::from_secs(30));
        tokio::spawn(async move {
            let mut rotation = models();
            retrier.generate("job", &prompt(), &mut rotation, &token).await
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_delays_the_next_model() {
        let provider = Arc::new(Scripted::new(vec![
            Err(CompletionError::RateLimited("429".into())),
            Ok("{}"),
        ]));
        let task = spawn_generate(provider.clone(), Duration::from_secs(1), InterruptToken::new());

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert_eq!(provider.calls(), vec!["m1"]);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(provider.calls(), vec!["m1", "m2"]);
        assert_eq!(task.await.unwrap().unwrap(), Outcome::Done(serde_json::json!({})));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_during_backoff_stops_rotation() {
        let provider = Arc::new(Scripted::new(vec![
            Err(CompletionError::Transient("503".into())),
            Ok("{}"),
        ]));
        let token = InterruptToken::new();
        let task = spawn_generate(provider.clone(), Duration::from_secs(1), token.clone());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(provider.calls().len(), 1);
        token.request();

        assert_eq!(task.await.unwrap().unwrap(), Outcome::Interrupted);
        assert_eq!(provider.calls(), vec!["m1"]);
    }

    #[test]
    fn test_empty_model_list_is_rejected() {
        assert!(matches!(ModelRotation::new(vec![]), Err(GenerationError::NoModels)));
    }
}
