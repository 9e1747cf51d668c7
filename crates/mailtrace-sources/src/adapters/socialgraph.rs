//! Social Graph lookup: profile URLs claimed by, or pointing at, an address.
//!
//! Only URLs come back, so every mention is URL-only and the service is
//! guessed from the host. The graph has no profile of its own to report.

use std::sync::Arc;

use async_trait::async_trait;
use mailtrace_core::{ResolutionResult, ServiceMention};
use reqwest::Url;

use crate::adapter::{normalize_email, ServiceAdapter};
use crate::document::{Document, Node};
use crate::error::SourceError;
use crate::secondary::{resolve_mentions, SecondaryResolver};
use crate::transport::{build_url, fetch_profile_body, Transport};

pub const NAME: &str = "socialgraph";

const DEFAULT_BASE_URL: &str = "https://socialgraph.googleapis.com";

/// Node fields whose values are lists of related profile URLs.
const EDGE_FIELDS: [&str; 2] = ["claimed_nodes", "nodes_referenced_by"];

/// Hosts whose registrable label is not the service name.
const HOST_ALIASES: [(&str, &str); 2] = [("del.icio.us", "delicious"), ("icio.us", "delicious")];

pub struct SocialGraphAdapter {
    transport: Arc<dyn Transport>,
    resolver: Arc<SecondaryResolver>,
    base_url: String,
}

impl SocialGraphAdapter {
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
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl ServiceAdapter for SocialGraphAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch(&self, email: &str) -> Result<ResolutionResult, SourceError> {
        let query = format!("mailto:{}", normalize_email(email));
        let url = build_url(
            &self.base_url,
            "/lookup",
            &[("q", query.as_str()), ("fme", "1"), ("edi", "1")],
        )?;
        let body = fetch_profile_body(self.transport.as_ref(), &url, NAME).await?;
        let mentions = parse_mentions(&Document::from_json(&body)?)?;
        Ok(resolve_mentions(&self.resolver, self.transport.as_ref(), &mentions).await)
    }
}

fn parse_mentions(doc: &Document) -> Result<Vec<ServiceMention>, SourceError> {
    let nodes = doc
        .path(&["nodes"])
        .ok_or_else(|| SourceError::not_found(NAME, "nodes"))?;

    let mut urls: Vec<String> = Vec::new();
    let mut push = |url: &str| {
        let url = url.trim();
        if is_web_url(url) && !urls.iter().any(|seen| seen == url) {
            urls.push(url.to_string());
        }
    };

    for (key, node) in nodes.entries() {
        push(key);
        for field in EDGE_FIELDS {
            for edge in node.get(field).map(Node::items).unwrap_or_default() {
                if let Some(url) = edge.as_text() {
                    push(url);
                }
            }
        }
    }

    Ok(urls
        .iter()
        .filter_map(|url| service_for_url(url).map(|service| ServiceMention::from_url(&service, url)))
        .collect())
}

fn is_web_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Service name guessed from a profile URL's host, e.g. `www.linkedin.com` → `linkedin`.
fn service_for_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();

    if let Some((_, service)) = HOST_ALIASES
        .iter()
        .find(|(alias, _)| host == *alias || host.ends_with(&format!(".{alias}")))
    {
        return Some((*service).to_string());
    }

    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    match labels.as_slice() {
        [.., name, _tld] => Some((*name).to_string()),
        _ => None,
    }
}
