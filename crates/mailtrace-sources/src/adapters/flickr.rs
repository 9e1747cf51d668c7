//! Flickr REST lookup: `findByEmail` for the NSID, then `getInfo` for the profile.

use std::sync::Arc;

use async_trait::async_trait;
use mailtrace_core::{ProfileRecord, ResolutionResult};

use crate::adapter::{normalize_email, ServiceAdapter};
use crate::document::Document;
use crate::error::SourceError;
use crate::transport::{build_url, fetch_body, Transport};

pub const NAME: &str = "flickr";

const DEFAULT_BASE_URL: &str = "https://api.flickr.com/services/rest/";

/// Buddy icon Flickr serves for members who never uploaded one.
const DEFAULT_BUDDY_ICON: &str = "https://www.flickr.com/images/buddyicon.gif";

pub struct FlickrAdapter {
    transport: Arc<dyn Transport>,
    api_key: String,
    base_url: String,
}

impl FlickrAdapter {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, api_key: &str) -> Self {
        Self::with_base_url(transport, api_key, DEFAULT_BASE_URL)
    }

    #[must_use]
    pub fn with_base_url(transport: Arc<dyn Transport>, api_key: &str, base_url: &str) -> Self {
        Self {
            transport,
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
        }
    }

    async fn call(&self, method: &str, params: &[(&str, &str)]) -> Result<Document, SourceError> {
        let mut query = vec![("method", method), ("api_key", self.api_key.as_str())];
        query.extend_from_slice(params);
        let url = build_url(&self.base_url, "", &query)?;
        let body = fetch_body(self.transport.as_ref(), &url).await?;
        Document::from_xml(&body)
    }
}

#[async_trait]
impl ServiceAdapter for FlickrAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch(&self, email: &str) -> Result<ResolutionResult, SourceError> {
        let email = normalize_email(email);
        let found = self
            .call("flickr.people.findByEmail", &[("find_email", email.as_str())])
            .await?;
        let (nsid, username) = parse_find_by_email(&found)?;

        let info = self
            .call("flickr.people.getInfo", &[("user_id", nsid.as_str())])
            .await?;
        let record = parse_person(&info, &nsid, &username)?;
        Ok(ResolutionResult::single(NAME, record))
    }
}

fn ensure_ok(doc: &Document, field: &'static str) -> Result<(), SourceError> {
    if doc.attr("rsp", "stat", "") == "ok" {
        Ok(())
    } else {
        tracing::debug!(
            adapter = NAME,
            code = %doc.attr("err", "code", ""),
            message = %doc.attr("err", "msg", ""),
            "flickr returned a failure envelope"
        );
        Err(SourceError::not_found(NAME, field))
    }
}

fn parse_find_by_email(doc: &Document) -> Result<(String, String), SourceError> {
    ensure_ok(doc, "user")?;
    let nsid = doc.attr("user", "nsid", &doc.attr("user", "id", ""));
    if nsid.trim().is_empty() {
        return Err(SourceError::not_found(NAME, "nsid"));
    }
    Ok((nsid.trim().to_string(), doc.text("username", "")))
}

fn parse_person(doc: &Document, nsid: &str, username: &str) -> Result<ProfileRecord, SourceError> {
    ensure_ok(doc, "person")?;

    let mut record = ProfileRecord {
        user_id: nsid.to_string(),
        user_name: doc.text("username", username),
        display_name: doc.text("realname", ""),
        portrait_url: buddy_icon_url(
            &doc.attr("person", "iconserver", ""),
            &doc.attr("person", "iconfarm", ""),
            nsid,
        ),
        location: doc.text("location", ""),
    }
    .trimmed();

    record.scrub_portrait(&[DEFAULT_BUDDY_ICON]);
    Ok(record)
}

/// Flickr's buddy-icon URL convention; a zero icon server means "no icon".
fn buddy_icon_url(icon_server: &str, icon_farm: &str, nsid: &str) -> String {
    match icon_server.trim().parse::<u64>() {
        Ok(server) if server > 0 => {
            let farm = icon_farm.trim();
            let farm = if farm.is_empty() { "1" } else { farm };
            format!("https://farm{farm}.staticflickr.com/{server}/buddyicons/{nsid}.jpg")
        }
        _ => DEFAULT_BUDDY_ICON.to_string(),
    }
}
