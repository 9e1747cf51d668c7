use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable is optional; the lookup is injected so tests can use a
/// plain `HashMap` instead of mutating the process environment.
pub(crate) fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let log_level = or_default("MAILTRACE_LOG_LEVEL", "info");
    let providers_path = lookup("MAILTRACE_PROVIDERS_PATH").ok().map(PathBuf::from);
    let request_timeout_secs = parse_u64("MAILTRACE_REQUEST_TIMEOUT_SECS", "15")?;
    let user_agent = or_default("MAILTRACE_USER_AGENT", "mailtrace/0.1 (identity-lookup)");
    let max_concurrent_adapters = parse_usize("MAILTRACE_MAX_CONCURRENT_ADAPTERS", "4")?.max(1);
    let adapter_timeout_secs = parse_u64("MAILTRACE_ADAPTER_TIMEOUT_SECS", "20")?;

    let resolve_deadline_secs = match lookup("MAILTRACE_RESOLVE_DEADLINE_SECS") {
        Ok(raw) => Some(
            raw.parse::<u64>()
                .map_err(|e| ConfigError::InvalidEnvVar {
                    var: "MAILTRACE_RESOLVE_DEADLINE_SECS".to_string(),
                    reason: e.to_string(),
                })?,
        ),
        Err(_) => None,
    };

    let avatar_proxy_url = lookup("MAILTRACE_AVATAR_PROXY_URL")
        .ok()
        .map(|raw| raw.trim().trim_end_matches('/').to_string())
        .filter(|url| !url.is_empty());
    let finger_enabled = parse_bool(
        "MAILTRACE_FINGER_ENABLED",
        &or_default("MAILTRACE_FINGER_ENABLED", "false"),
    )?;

    Ok(AppConfig {
        log_level,
        providers_path,
        request_timeout_secs,
        user_agent,
        max_concurrent_adapters,
        adapter_timeout_secs,
        resolve_deadline_secs,
        avatar_proxy_url,
        finger_enabled,
    })
}

/// Parse a boolean flag. Accepts `true`/`false`, `1`/`0`, `yes`/`no`.
fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
