//! AIM screen names for AOL-hosted addresses.
//!
//! No directory is queried: the local part of an `aol.com` / `aim.com`
//! address is the screen name. The only network call is a HEAD probe for the
//! buddy icon.

use std::sync::Arc;

use async_trait::async_trait;
use mailtrace_core::{ProfileRecord, ResolutionResult};

use crate::adapter::{normalize_email, split_email, ServiceAdapter};
use crate::error::SourceError;
use crate::transport::{build_url, url_exists, Transport};

pub const NAME: &str = "aim";

const DEFAULT_BASE_URL: &str = "https://api.oscar.aol.com";

const AIM_DOMAINS: [&str; 2] = ["aol.com", "aim.com"];

pub struct AimAdapter {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl AimAdapter {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_base_url(transport, DEFAULT_BASE_URL)
    }

    #[must_use]
    pub fn with_base_url(transport: Arc<dyn Transport>, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.to_string(),
        }
    }

    fn buddy_icon_url(&self, screen_name: &str) -> Result<String, SourceError> {
        build_url(
            &self.base_url,
            "/expressions/get",
            &[("t", screen_name), ("f", "native"), ("type", "buddyIcon")],
        )
    }
}

#[async_trait]
impl ServiceAdapter for AimAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch(&self, email: &str) -> Result<ResolutionResult, SourceError> {
        let email = normalize_email(email);
        let screen_name = screen_name(&email).ok_or_else(|| SourceError::not_found(NAME, "domain"))?;

        let icon = self.buddy_icon_url(screen_name)?;
        let portrait_url = if url_exists(self.transport.as_ref(), &icon).await {
            icon
        } else {
            String::new()
        };

        Ok(ResolutionResult::single(
            NAME,
            ProfileRecord {
                user_name: screen_name.to_string(),
                portrait_url,
                ..ProfileRecord::default()
            },
        ))
    }
}

/// Local part of an AOL-hosted address.
fn screen_name(email: &str) -> Option<&str> {
    let (local, domain) = split_email(email)?;
    AIM_DOMAINS
        .iter()
        .any(|d| domain.eq_ignore_ascii_case(d))
        .then_some(local)
}
