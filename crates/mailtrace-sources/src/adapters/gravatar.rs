//! Gravatar profile lookup keyed by the SHA-256 of the address.

use std::sync::Arc;

use async_trait::async_trait;
use mailtrace_core::{ProfileRecord, ResolutionResult};
use sha2::{Digest, Sha256};

use crate::adapter::{normalize_email, ServiceAdapter};
use crate::document::Document;
use crate::error::SourceError;
use crate::transport::{build_url, fetch_profile_body, Transport};

pub const NAME: &str = "gravatar";

const DEFAULT_BASE_URL: &str = "https://en.gravatar.com";

/// Placeholder images Gravatar reports for accounts without an avatar.
const DEFAULT_PORTRAITS: [&str; 3] = [
    "https://secure.gravatar.com/avatar/?d=mp",
    "https://secure.gravatar.com/images/gravatar-default.png",
    "https://0.gravatar.com/avatar/00000000000000000000000000000000",
];

pub struct GravatarAdapter {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl GravatarAdapter {
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
}

#[async_trait]
impl ServiceAdapter for GravatarAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch(&self, email: &str) -> Result<ResolutionResult, SourceError> {
        let url = build_url(&self.base_url, &format!("/{}.json", email_hash(email)), &[])?;
        let body = fetch_profile_body(self.transport.as_ref(), &url, NAME).await?;
        let record = parse_profile(&Document::from_json(&body)?)?;
        Ok(ResolutionResult::single(NAME, record))
    }
}

/// Lowercase hex SHA-256 of the trimmed, lowercased address.
pub(crate) fn email_hash(email: &str) -> String {
    format!("{:x}", Sha256::digest(normalize_email(email).as_bytes()))
}

fn parse_profile(doc: &Document) -> Result<ProfileRecord, SourceError> {
    let entry = doc
        .path(&["entry", "0"])
        .ok_or_else(|| SourceError::not_found(NAME, "entry"))?;

    let mut record = ProfileRecord {
        user_id: entry.path_text(&["id"], ""),
        user_name: entry.path_text(&["preferredUsername"], ""),
        display_name: entry.path_text(&["displayName"], ""),
        portrait_url: entry.path_text(&["thumbnailUrl"], ""),
        location: entry.path_text(&["currentLocation"], ""),
    }
    .trimmed();

    if record.user_name.is_empty() {
        return Err(SourceError::not_found(NAME, "preferredUsername"));
    }
    record.scrub_portrait(&DEFAULT_PORTRAITS);
    Ok(record)
}
