//! Provider credentials: `providers.yaml` plus per-provider env overrides.
//!
//! Credentials are read once at startup and handed to each adapter at
//! construction. A provider without credentials simply has its adapter
//! disabled; nothing here is fatal except a malformed file.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

/// Providers whose adapters take credentials.
pub const KNOWN_PROVIDERS: [&str; 2] = ["flickr", "amazon"];

#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderCredentials {
    pub api_key: String,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub associate_tag: Option<String>,
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("api_key", &"[redacted]")
            .field("secret", &self.secret.as_ref().map(|_| "[redacted]"))
            .field("associate_tag", &self.associate_tag)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProvidersFile {
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderCredentials>,
}

/// Provider name → credentials, after file load and env overrides.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    providers: BTreeMap<String, ProviderCredentials>,
}

impl Credentials {
    #[must_use]
    pub fn get(&self, provider: &str) -> Option<&ProviderCredentials> {
        self.providers.get(provider)
    }

    pub fn insert(&mut self, provider: &str, credentials: ProviderCredentials) {
        self.providers.insert(provider.to_string(), credentials);
    }

    #[must_use]
    pub fn providers(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    /// Load credentials from an optional YAML file, then apply
    /// `MAILTRACE_<PROVIDER>_API_KEY` / `_SECRET` / `_ASSOCIATE_TAG` overrides
    /// from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key))
    }

    pub(crate) fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let mut credentials = match path {
            Some(path) => Self {
                providers: load_providers(path)?.providers,
            },
            None => Self::default(),
        };
        credentials.apply_env_overrides(lookup);
        Ok(credentials)
    }

    fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        for provider in KNOWN_PROVIDERS {
            let prefix = format!("MAILTRACE_{}", provider.to_ascii_uppercase());
            let api_key = lookup(&format!("{prefix}_API_KEY")).ok();
            let secret = lookup(&format!("{prefix}_SECRET")).ok();
            let associate_tag = lookup(&format!("{prefix}_ASSOCIATE_TAG")).ok();

            if api_key.is_none() && secret.is_none() && associate_tag.is_none() {
                continue;
            }

            let entry = self.providers.entry(provider.to_string()).or_default();
            if let Some(key) = api_key {
                entry.api_key = key;
            }
            if secret.is_some() {
                entry.secret = secret;
            }
            if associate_tag.is_some() {
                entry.associate_tag = associate_tag;
            }
        }

        // An override that sets only a secret leaves an unusable entry behind.
        self.providers
            .retain(|_, creds| !creds.api_key.trim().is_empty());
    }
}

/// Load and validate provider credentials from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_providers(path: &Path) -> Result<ProvidersFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ProvidersFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_providers(&content)
}

fn parse_providers(content: &str) -> Result<ProvidersFile, ConfigError> {
    if content.trim().is_empty() {
        return Ok(ProvidersFile::default());
    }
    let providers_file: ProvidersFile = serde_yaml::from_str(content)?;
    validate_providers(&providers_file)?;
    Ok(providers_file)
}

fn validate_providers(providers_file: &ProvidersFile) -> Result<(), ConfigError> {
    for (name, creds) in &providers_file.providers {
        if !KNOWN_PROVIDERS.contains(&name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "unknown provider '{name}'; expected one of: {}",
                KNOWN_PROVIDERS.join(", ")
            )));
        }
        if creds.api_key.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "provider '{name}' has an empty api_key"
            )));
        }
    }
    Ok(())
}
