//! Legacy `finger` lookup via the local `finger` binary.
//!
//! Invokes `finger -l -m {user}@{host}` and reads the `Login:`, `Name:` and
//! `Office:` fields. Only useful where the target host still runs fingerd,
//! so it is off unless explicitly enabled.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use mailtrace_core::{ProfileRecord, ResolutionResult};
use regex::Regex;

use crate::adapter::{split_email, ServiceAdapter};
use crate::error::SourceError;
use crate::process::CommandRunner;

pub const NAME: &str = "finger";

const PROGRAM: &str = "finger";

static LOGIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Login(?: name)?:\s*(\S+)").expect("valid regex"));
static FULL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:In real life|Name):\s*([^\t\r\n]+)").expect("valid regex"));
static OFFICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Office:\s*([^\t\r\n]+)").expect("valid regex"));

pub struct FingerAdapter {
    runner: Arc<dyn CommandRunner>,
}

impl FingerAdapter {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl ServiceAdapter for FingerAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch(&self, email: &str) -> Result<ResolutionResult, SourceError> {
        let target = finger_target(email).ok_or_else(|| SourceError::not_found(NAME, "address"))?;
        let args = vec!["-l".to_string(), "-m".to_string(), target];

        let output = self.runner.run(PROGRAM, &args).await?;
        if !output.success {
            tracing::debug!(adapter = NAME, "finger returned non-zero exit");
            return Err(SourceError::not_found(NAME, "Login"));
        }

        let record = parse_output(&output.stdout)?;
        Ok(ResolutionResult::single(NAME, record))
    }
}

/// `user@host` argument, refusing anything that could be read as an option or
/// that carries whitespace.
fn finger_target(email: &str) -> Option<String> {
    let (local, domain) = split_email(email)?;
    let unsafe_part = |part: &str| part.starts_with('-') || part.chars().any(char::is_whitespace);
    if unsafe_part(local) || unsafe_part(domain) {
        return None;
    }
    Some(format!("{local}@{domain}"))
}

fn capture(re: &Regex, text: &str) -> String {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

fn parse_output(stdout: &str) -> Result<ProfileRecord, SourceError> {
    let user_name = capture(&LOGIN, stdout);
    if user_name.is_empty() {
        return Err(SourceError::not_found(NAME, "Login"));
    }
    Ok(ProfileRecord {
        user_name,
        display_name: capture(&FULL_NAME, stdout),
        location: capture(&OFFICE, stdout),
        ..ProfileRecord::default()
    })
}
