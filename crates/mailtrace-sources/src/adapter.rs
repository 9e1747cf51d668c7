//! The contract every identity source implements.

use async_trait::async_trait;
use mailtrace_core::ResolutionResult;

use crate::error::{ErrorKind, SourceError};

/// One external identity source.
///
/// Implementors provide [`ServiceAdapter::fetch`], which reports *why* a
/// lookup produced nothing. Callers use [`ServiceAdapter::lookup`], which
/// logs the cause and collapses every failure to an empty result.
#[async_trait]
pub trait ServiceAdapter: Send + Sync {
    /// Service key this adapter answers for (e.g. `"flickr"`).
    fn name(&self) -> &'static str;

    /// Query the source for `email`.
    ///
    /// Returns the adapter's own record and, for conglomerators, records for
    /// recognized secondary services. Must not retry.
    async fn fetch(&self, email: &str) -> Result<ResolutionResult, SourceError>;

    /// Query the source, treating every failure as "nothing found".
    async fn lookup(&self, email: &str) -> ResolutionResult {
        match self.fetch(email).await {
            Ok(result) => result,
            Err(err) => {
                log_failure(self.name(), &err);
                ResolutionResult::new()
            }
        }
    }
}

fn log_failure(adapter: &'static str, err: &SourceError) {
    let kind = err.kind();
    match kind {
        ErrorKind::NotFound => {
            tracing::debug!(adapter, cause = kind.as_str(), error = %err, "no profile found");
        }
        ErrorKind::Unreachable | ErrorKind::Unparseable => {
            tracing::warn!(adapter, cause = kind.as_str(), error = %err, "lookup failed");
        }
    }
}

/// Lowercased, trimmed email used for hashing and query parameters.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Split an address into `(local, domain)`; `None` when either part is empty.
pub(crate) fn split_email(email: &str) -> Option<(&str, &str)> {
    let (local, domain) = email.trim().rsplit_once('@')?;
    if local.is_empty() || domain.is_empty() {
        return None;
    }
    Some((local, domain))
}
