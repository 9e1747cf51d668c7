use mailtrace_core::ResolutionResult;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The overall deadline passed before every adapter finished. `partial`
    /// holds the merged answers of the adapters that did finish.
    #[error("resolution deadline exceeded: {completed} of {total} adapters finished")]
    DeadlineExceeded {
        partial: ResolutionResult,
        completed: usize,
        total: usize,
    },
}

impl ResolveError {
    /// The partial mapping carried by the error.
    #[must_use]
    pub fn into_partial(self) -> ResolutionResult {
        match self {
            ResolveError::DeadlineExceeded { partial, .. } => partial,
        }
    }
}
