//! YouTube user search (GData Atom feed).

use std::sync::Arc;

use async_trait::async_trait;
use mailtrace_core::{ProfileRecord, ResolutionResult};

use crate::adapter::{normalize_email, ServiceAdapter};
use crate::document::{Document, Node};
use crate::error::SourceError;
use crate::transport::{build_url, fetch_profile_body, Transport};

pub const NAME: &str = "youtube";

const DEFAULT_BASE_URL: &str = "https://gdata.youtube.com";

const DEFAULT_THUMBNAILS: [&str; 2] = [
    "https://s.ytimg.com/yt/img/no_videos_140.png",
    "https://s.ytimg.com/yt/img/default_avatar.png",
];

pub struct YoutubeAdapter {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl YoutubeAdapter {
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
impl ServiceAdapter for YoutubeAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch(&self, email: &str) -> Result<ResolutionResult, SourceError> {
        let email = normalize_email(email);
        let url = build_url(&self.base_url, "/feeds/api/users", &[("email", email.as_str())])?;
        let body = fetch_profile_body(self.transport.as_ref(), &url, NAME).await?;
        let record = parse_feed(&Document::from_xml(&body)?)?;
        Ok(ResolutionResult::single(NAME, record))
    }
}

fn parse_feed(doc: &Document) -> Result<ProfileRecord, SourceError> {
    // Search feeds wrap the profile in <entry>; a direct profile is the root.
    let scope = doc.find("entry").unwrap_or_else(|| doc.root());

    let user_name = scope.text("username", "");
    if user_name.trim().is_empty() {
        return Err(SourceError::not_found(NAME, "username"));
    }

    let author_name = scope
        .find("author")
        .and_then(|author| author.get("name"))
        .and_then(Node::as_text)
        .unwrap_or_default()
        .to_string();

    let mut record = ProfileRecord {
        user_id: scope.text("userId", ""),
        user_name,
        display_name: scope.attr_of("username", "display", &author_name),
        portrait_url: scope.attr_of("thumbnail", "url", ""),
        location: scope.text("location", ""),
    }
    .trimmed();

    record.scrub_portrait(&DEFAULT_THUMBNAILS);
    Ok(record)
}
