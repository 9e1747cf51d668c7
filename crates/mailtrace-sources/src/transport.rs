//! Outbound HTTP used by every network adapter.
//!
//! [`Transport`] is deliberately small: a GET that hands back status and body,
//! and a HEAD that hands back only a status. It never retries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::error::SourceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET. Non-2xx statuses are returned, not raised.
    async fn get(&self, url: &str) -> Result<HttpResponse, SourceError>;

    /// Issue a HEAD and return only the status code.
    async fn head(&self, url: &str) -> Result<u16, SourceError>;
}

/// `reqwest`-backed [`Transport`].
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with the given request timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, SourceError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }

    async fn head(&self, url: &str) -> Result<u16, SourceError> {
        let response = self.client.head(url).send().await?;
        Ok(response.status().as_u16())
    }
}

/// GET `url` and return the body, treating any non-2xx status as an error.
///
/// # Errors
///
/// Returns [`SourceError::UnexpectedStatus`] on a non-2xx status, or whatever
/// the transport reports for network failures.
pub(crate) async fn fetch_body(transport: &dyn Transport, url: &str) -> Result<String, SourceError> {
    let response = transport.get(url).await?;
    if !response.is_success() {
        return Err(SourceError::UnexpectedStatus {
            status: response.status,
            url: url.to_string(),
        });
    }
    Ok(response.body)
}

/// Like [`fetch_body`], but a 404 means the source has no such user.
///
/// # Errors
///
/// Returns [`SourceError::NotFound`] on 404 and [`SourceError::UnexpectedStatus`]
/// on any other non-2xx status.
pub(crate) async fn fetch_profile_body(
    transport: &dyn Transport,
    url: &str,
    service: &'static str,
) -> Result<String, SourceError> {
    let response = transport.get(url).await?;
    if response.status == 404 {
        return Err(SourceError::not_found(service, "profile"));
    }
    if !response.is_success() {
        return Err(SourceError::UnexpectedStatus {
            status: response.status,
            url: url.to_string(),
        });
    }
    Ok(response.body)
}

/// HEAD probe: `true` only for a 2xx answer. Network errors count as absent.
pub(crate) async fn url_exists(transport: &dyn Transport, url: &str) -> bool {
    match transport.head(url).await {
        Ok(status) => (200..300).contains(&status),
        Err(e) => {
            tracing::debug!(url, error = %e, "existence probe failed");
            false
        }
    }
}

/// Build `base` + `path` with the given query pairs, percent-encoded.
///
/// # Errors
///
/// Returns [`SourceError::InvalidUrl`] if `base` is not an absolute URL.
pub(crate) fn build_url(base: &str, path: &str, query: &[(&str, &str)]) -> Result<String, SourceError> {
    let raw = format!("{}{path}", base.trim_end_matches('/'));
    let mut url = Url::parse(&raw).map_err(|e| SourceError::InvalidUrl {
        url: raw.clone(),
        reason: e.to_string(),
    })?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url.to_string())
}
