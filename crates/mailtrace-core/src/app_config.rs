use std::path::PathBuf;
use std::time::Duration;

/// Process-wide settings read once at startup.
///
/// Provider credentials are loaded separately (see [`crate::providers`]) so
/// this struct never holds secrets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub log_level: String,
    pub providers_path: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_concurrent_adapters: usize,
    pub adapter_timeout_secs: u64,
    pub resolve_deadline_secs: Option<u64>,
    /// Base of a `{base}/{user}@{service}` avatar proxy. Unset disables
    /// synthesized avatars for secondary services.
    pub avatar_proxy_url: Option<String>,
    pub finger_enabled: bool,
}

impl AppConfig {
    #[must_use]
    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_secs(self.adapter_timeout_secs)
    }

    #[must_use]
    pub fn resolve_deadline(&self) -> Option<Duration> {
        self.resolve_deadline_secs.map(Duration::from_secs)
    }
}
