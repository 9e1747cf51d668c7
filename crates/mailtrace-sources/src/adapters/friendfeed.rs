//! FriendFeed feed info: the user's own profile plus linked services.

use std::sync::Arc;

use async_trait::async_trait;
use mailtrace_core::{ProfileRecord, ResolutionResult, ServiceMention};

use crate::adapter::{normalize_email, ServiceAdapter};
use crate::document::{Document, Node};
use crate::error::SourceError;
use crate::secondary::{resolve_mentions, SecondaryResolver};
use crate::transport::{build_url, fetch_profile_body, Transport};

pub const NAME: &str = "friendfeed";

const DEFAULT_BASE_URL: &str = "https://friendfeed-api.com";

/// FriendFeed's own pseudo services, never real accounts elsewhere.
const PSEUDO_SERVICES: [&str; 2] = ["internal", "feed"];

pub struct FriendfeedAdapter {
    transport: Arc<dyn Transport>,
    resolver: Arc<SecondaryResolver>,
    base_url: String,
}

impl FriendfeedAdapter {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, resolver: Arc<SecondaryResolver>) -> Self {
        Self::with_base_url(transport, resolver, DEFAULT_BASE_URL)
    }

    #[must_use]
    pub fn with_base_url(
        transport: Arc<dyn Transport>,
        resolver: Arc<SecondaryResolver>,
        base_url: &str,
    ) -> Self {
        Self {
            transport,
            resolver,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ServiceAdapter for FriendfeedAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch(&self, email: &str) -> Result<ResolutionResult, SourceError> {
        let email = normalize_email(email);
        let url = build_url(&self.base_url, "/v2/feedinfo", &[("email", email.as_str())])?;
        let body = fetch_profile_body(self.transport.as_ref(), &url, NAME).await?;
        let doc = Document::from_json(&body)?;

        let own = parse_own_record(&doc, &self.base_url)?;
        let mentions = parse_mentions(&doc);

        let mut result = resolve_mentions(&self.resolver, self.transport.as_ref(), &mentions).await;
        result.insert(NAME, own);
        Ok(result)
    }
}

fn parse_own_record(doc: &Document, base_url: &str) -> Result<ProfileRecord, SourceError> {
    let kind = doc.path_text(&["type"], "user");
    if kind != "user" {
        tracing::debug!(adapter = NAME, kind = %kind, "feed is not a user feed");
        return Err(SourceError::not_found(NAME, "type"));
    }

    let id = doc.path_text(&["id"], "").trim().to_string();
    if id.is_empty() {
        return Err(SourceError::not_found(NAME, "id"));
    }

    Ok(ProfileRecord {
        portrait_url: format!("{base_url}/{id}/picture?size=large"),
        display_name: doc.path_text(&["name"], "").trim().to_string(),
        user_name: id.clone(),
        user_id: id,
        location: doc.path_text(&["location"], "").trim().to_string(),
    })
}

fn parse_mentions(doc: &Document) -> Vec<ServiceMention> {
    doc.path(&["services"])
        .map(Node::items)
        .unwrap_or_default()
        .iter()
        .filter_map(|service| {
            let id = service.path_text(&["id"], "");
            if id.is_empty() || PSEUDO_SERVICES.contains(&id.as_str()) {
                return None;
            }
            Some(ServiceMention::new(
                &id,
                &service.path_text(&["username"], ""),
                "",
                &service.path_text(&["profileUrl"], ""),
            ))
        })
        .collect()
}
