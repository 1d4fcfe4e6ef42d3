//! Call-budget wrapper for completion providers
//!
//! The budget counts attempted calls, not successful ones, so model rotation
//! cannot spend past the limit by failing fast.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, warn};

use roadmapper_utils::error::CompletionError;

use crate::types::{Completion, CompletionProvider, CompletionRequest};

/// Caps the number of calls made through the wrapped provider per process.
pub struct BudgetedProvider {
    inner: Arc<dyn CompletionProvider>,
    calls: AtomicU32,
    limit: u32,
}

impl BudgetedProvider {
    #[must_use]
    pub fn new(inner: Arc<dyn CompletionProvider>, limit: u32) -> Self {
        debug!(limit, provider = inner.name(), "Creating BudgetedProvider");
        Self {
            inner,
            calls: AtomicU32::new(0),
            limit,
        }
    }

    /// Calls attempted so far, including rejected ones
    #[must_use]
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }
}

#[async_trait]
impl CompletionProvider for BudgetedProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CompletionError> {
        // Counted before the call: failures still consume a slot
        let current = self.calls.fetch_add(1, Ordering::SeqCst);

        if current >= self.limit {
            let attempted = current + 1;
            warn!(limit = self.limit, attempted, "Call budget exceeded");
            return Err(CompletionError::BudgetExceeded {
                limit: self.limit,
                attempted,
            });
        }

        let result = self.inner.complete(request).await;
        if let Err(e) = &result {
            debug!(
                call_count = current + 1,
                limit = self.limit,
                error = %e,
                "Inner provider failed (budget slot still consumed)"
            );
        }
        result
    }
}
