//! Resolution engine: runs every adapter for one address and merges the
//! answers by adapter priority.

mod engine;
mod error;
mod merge;
mod report;

pub use engine::ResolutionEngine;
pub use error::ResolveError;
pub use merge::merge_by_priority;
pub use report::{AdapterOutcome, AdapterStatus, ResolutionReport};
