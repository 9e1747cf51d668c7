use std::time::Duration;

use mailtrace_core::ResolutionResult;

/// How one adapter's invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterStatus {
    /// Produced this many records.
    Found(usize),
    /// Finished with nothing, whatever the cause.
    Empty,
    TimedOut,
    Panicked,
}

impl AdapterStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AdapterStatus::Found(_) => "found",
            AdapterStatus::Empty => "empty",
            AdapterStatus::TimedOut => "timed_out",
            AdapterStatus::Panicked => "panicked",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterOutcome {
    pub adapter: &'static str,
    /// Position in the priority order, 0 is highest.
    pub rank: usize,
    pub status: AdapterStatus,
    pub elapsed: Duration,
}

/// Merged result plus per-adapter outcomes, ordered by rank.
#[derive(Debug, Clone)]
pub struct ResolutionReport {
    pub result: ResolutionResult,
    pub outcomes: Vec<AdapterOutcome>,
    pub elapsed: Duration,
}

impl ResolutionReport {
    /// Outcomes that ended without any record.
    pub fn failures(&self) -> impl Iterator<Item = &AdapterOutcome> {
        self.outcomes
            .iter()
            .filter(|o| !matches!(o.status, AdapterStatus::Found(_)))
    }
}
