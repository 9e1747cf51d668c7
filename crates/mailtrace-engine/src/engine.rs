use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::{stream, FutureExt, StreamExt};
use mailtrace_core::{AppConfig, ResolutionResult};
use mailtrace_sources::ServiceAdapter;

use crate::error::ResolveError;
use crate::merge::merge_by_priority;
use crate::report::{AdapterOutcome, AdapterStatus, ResolutionReport};

/// Runs a fixed, priority-ordered adapter list for one address at a time.
///
/// Adapters run concurrently, at most `max_concurrent` at once, each bounded
/// by `adapter_timeout`. A failing, slow or panicking adapter only loses its
/// own answer. Results are merged by rank after all adapters finish, so
/// completion order never affects the outcome.
pub struct ResolutionEngine {
    adapters: Vec<Arc<dyn ServiceAdapter>>,
    max_concurrent: usize,
    adapter_timeout: Duration,
}

struct Invocation {
    outcome: AdapterOutcome,
    result: ResolutionResult,
}

struct Run {
    invocations: Vec<Invocation>,
    finished: bool,
    elapsed: Duration,
}

impl ResolutionEngine {
    /// `adapters` must already be in priority order, highest first.
    #[must_use]
    pub fn new(
        adapters: Vec<Arc<dyn ServiceAdapter>>,
        max_concurrent: usize,
        adapter_timeout: Duration,
    ) -> Self {
        Self {
            adapters,
            max_concurrent: max_concurrent.max(1),
            adapter_timeout,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig, adapters: Vec<Arc<dyn ServiceAdapter>>) -> Self {
        Self::new(
            adapters,
            config.max_concurrent_adapters,
            config.adapter_timeout(),
        )
    }

    /// Adapter names in priority order.
    #[must_use]
    pub fn adapter_names(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Resolve `email` with no overall deadline. Never fails: when nothing is
    /// found the mapping is empty.
    pub async fn resolve(&self, email: &str) -> ResolutionResult {
        self.resolve_report(email).await.result
    }

    /// Like [`Self::resolve`], also reporting how each adapter ended.
    pub async fn resolve_report(&self, email: &str) -> ResolutionReport {
        let run = self.run(email, None).await;
        let (result, outcomes) = finish(run.invocations);
        log_summary(&result, &outcomes, run.elapsed);
        ResolutionReport {
            result,
            outcomes,
            elapsed: run.elapsed,
        }
    }

    /// Resolve `email`, giving up on adapters still running at `deadline`.
    ///
    /// Unfinished adapter calls are dropped, which cancels them at their next
    /// await point.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::DeadlineExceeded`] with the merged answers of
    /// the adapters that did finish.
    pub async fn resolve_with_deadline(
        &self,
        email: &str,
        deadline: Duration,
    ) -> Result<ResolutionResult, ResolveError> {
        let run = self.run(email, Some(deadline)).await;
        let completed = run.invocations.len();
        let (result, outcomes) = finish(run.invocations);

        if run.finished {
            log_summary(&result, &outcomes, run.elapsed);
            return Ok(result);
        }

        let total = self.adapters.len();
        tracing::warn!(
            completed,
            total,
            deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
            "resolution deadline exceeded"
        );
        Err(ResolveError::DeadlineExceeded {
            partial: result,
            completed,
            total,
        })
    }

    async fn run(&self, email: &str, deadline: Option<Duration>) -> Run {
        let started = Instant::now();
        let mut invocations = Vec::with_capacity(self.adapters.len());

        let mut pending = stream::iter(self.adapters.iter().enumerate())
            .map(|(rank, adapter)| self.invoke(rank, adapter.as_ref(), email))
            .buffer_unordered(self.max_concurrent);

        let drain = async {
            while let Some(invocation) = pending.next().await {
                invocations.push(invocation);
            }
        };

        let finished = match deadline {
            Some(deadline) => tokio::time::timeout(deadline, drain).await.is_ok(),
            None => {
                drain.await;
                true
            }
        };

        Run {
            invocations,
            finished,
            elapsed: started.elapsed(),
        }
    }

    async fn invoke(&self, rank: usize, adapter: &dyn ServiceAdapter, email: &str) -> Invocation {
        let name = adapter.name();
        let started = Instant::now();
        let call = AssertUnwindSafe(adapter.lookup(email)).catch_unwind();

        let (status, result) = match tokio::time::timeout(self.adapter_timeout, call).await {
            Ok(Ok(result)) if result.is_empty() => (AdapterStatus::Empty, result),
            Ok(Ok(result)) => (AdapterStatus::Found(result.len()), result),
            Ok(Err(_)) => {
                tracing::warn!(adapter = name, rank, "adapter panicked");
                (AdapterStatus::Panicked, ResolutionResult::new())
            }
            Err(_) => {
                tracing::warn!(
                    adapter = name,
                    rank,
                    timeout_ms = u64::try_from(self.adapter_timeout.as_millis()).unwrap_or(u64::MAX),
                    "adapter timed out"
                );
                (AdapterStatus::TimedOut, ResolutionResult::new())
            }
        };

        Invocation {
            outcome: AdapterOutcome {
                adapter: name,
                rank,
                status,
                elapsed: started.elapsed(),
            },
            result,
        }
    }
}

/// Merge by rank and order the outcomes by rank.
fn finish(invocations: Vec<Invocation>) -> (ResolutionResult, Vec<AdapterOutcome>) {
    let mut outcomes = Vec::with_capacity(invocations.len());
    let mut ranked = Vec::with_capacity(invocations.len());
    for invocation in invocations {
        ranked.push((invocation.outcome.rank, invocation.result));
        outcomes.push(invocation.outcome);
    }
    outcomes.sort_by_key(|o| o.rank);
    (merge_by_priority(ranked), outcomes)
}

fn log_summary(result: &ResolutionResult, outcomes: &[AdapterOutcome], elapsed: Duration) {
    let found = outcomes
        .iter()
        .filter(|o| matches!(o.status, AdapterStatus::Found(_)))
        .count();
    tracing::info!(
        services = result.len(),
        adapters = outcomes.len(),
        adapters_found = found,
        elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        "resolution complete"
    );
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
