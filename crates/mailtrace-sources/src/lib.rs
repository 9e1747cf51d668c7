//! Identity sources for mailtrace.
//!
//! Each external directory is wrapped in a [`ServiceAdapter`] that turns its
//! response into normalized [`mailtrace_core::ProfileRecord`]s. Conglomerator
//! adapters also report mentions of other services, which the
//! [`SecondaryResolver`] normalizes into the same record shape.
//!
//! Transport ([`Transport`]) and local process execution ([`CommandRunner`])
//! are injected so adapters can be exercised against mock servers and fake
//! processes.

pub mod adapter;
pub mod adapters;
pub mod document;
pub mod error;
pub mod process;
pub mod secondary;
pub mod transport;

pub use adapter::ServiceAdapter;
pub use adapters::{build_adapters, PRIORITY};
pub use document::{Document, Node};
pub use error::{ErrorKind, SourceError};
pub use process::{CommandOutput, CommandRunner, TokioCommandRunner};
pub use secondary::{resolve_mentions, ResolvedMention, SecondaryResolver, ServiceRule, UrlCapture};
pub use transport::{HttpResponse, HttpTransport, Transport};
