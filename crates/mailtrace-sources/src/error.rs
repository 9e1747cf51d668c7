use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("process error: {0}")]
    Process(String),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed {format} document: {reason}")]
    Malformed {
        format: &'static str,
        reason: String,
    },

    #[error("invalid request URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{service}: response has no {field}")]
    NotFound {
        service: &'static str,
        field: &'static str,
    },
}

/// Coarse failure classes used when logging a failed lookup.
///
/// All three collapse to "nothing found" for the caller; the class only
/// decides how loudly the failure is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure, non-2xx status, or a process that could not run.
    Unreachable,
    /// The source answered with something that does not parse.
    Unparseable,
    /// Well-formed answer without the service's defining field.
    NotFound,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Unreachable => "unreachable",
            ErrorKind::Unparseable => "unparseable",
            ErrorKind::NotFound => "not_found",
        }
    }
}

impl SourceError {
    #[must_use]
    pub fn not_found(service: &'static str, field: &'static str) -> Self {
        SourceError::NotFound { service, field }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            SourceError::Http(_)
            | SourceError::UnexpectedStatus { .. }
            | SourceError::Process(_)
            | SourceError::InvalidUrl { .. } => ErrorKind::Unreachable,
            SourceError::Xml(_) | SourceError::Json(_) | SourceError::Malformed { .. } => {
                ErrorKind::Unparseable
            }
            SourceError::NotFound { .. } => ErrorKind::NotFound,
        }
    }
}
