//! Amazon Product Advertising customer-content lookup.
//!
//! Two calls: `CustomerContentSearch` by email for the customer id, then
//! `CustomerContentLookup` for the public profile. When a secret is
//! configured, requests carry a signature-v2 `Signature` parameter.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use mailtrace_core::{ProfileRecord, ResolutionResult};
use percent_encoding::utf8_percent_encode;
use reqwest::Url;
use sha2::Sha256;

use crate::adapter::{normalize_email, ServiceAdapter};
use crate::document::Document;
use crate::error::SourceError;
use crate::secondary::PATH_SEGMENT;
use crate::transport::{fetch_body, Transport};

pub const NAME: &str = "amazon";

const DEFAULT_BASE_URL: &str = "https://webservices.amazon.com/onca/xml";
const API_VERSION: &str = "2011-08-01";

type HmacSha256 = Hmac<Sha256>;

pub struct AmazonAdapter {
    transport: Arc<dyn Transport>,
    access_key: String,
    associate_tag: String,
    secret: Option<String>,
    base_url: String,
}

impl AmazonAdapter {
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        access_key: &str,
        associate_tag: &str,
        secret: Option<&str>,
    ) -> Self {
        Self::with_base_url(transport, access_key, associate_tag, secret, DEFAULT_BASE_URL)
    }

    #[must_use]
    pub fn with_base_url(
        transport: Arc<dyn Transport>,
        access_key: &str,
        associate_tag: &str,
        secret: Option<&str>,
        base_url: &str,
    ) -> Self {
        Self {
            transport,
            access_key: access_key.to_string(),
            associate_tag: associate_tag.to_string(),
            secret: secret.map(str::to_string),
            base_url: base_url.to_string(),
        }
    }

    async fn call(&self, operation: &str, params: &[(&str, &str)]) -> Result<Document, SourceError> {
        let timestamp = Utc::now();
        let url = self.request_url(operation, params, timestamp)?;
        let body = fetch_body(self.transport.as_ref(), &url).await?;
        Document::from_xml(&body)
    }

    fn request_url(
        &self,
        operation: &str,
        params: &[(&str, &str)],
        timestamp: DateTime<Utc>,
    ) -> Result<String, SourceError> {
        let stamp = timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let mut query: Vec<(&str, &str)> = vec![
            ("Service", "AWSECommerceService"),
            ("AWSAccessKeyId", self.access_key.as_str()),
            ("AssociateTag", self.associate_tag.as_str()),
            ("Operation", operation),
            ("Version", API_VERSION),
            ("Timestamp", stamp.as_str()),
        ];
        query.extend_from_slice(params);
        signed_url(&self.base_url, &query, self.secret.as_deref())
    }
}

#[async_trait]
impl ServiceAdapter for AmazonAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch(&self, email: &str) -> Result<ResolutionResult, SourceError> {
        let email = normalize_email(email);
        let search = self
            .call("CustomerContentSearch", &[("Email", email.as_str())])
            .await?;
        let customer_id = parse_customer_id(&search)?;

        let lookup = self
            .call(
                "CustomerContentLookup",
                &[("CustomerId", customer_id.as_str()), ("ResponseGroup", "CustomerInfo")],
            )
            .await?;
        let record = parse_customer(&lookup, &customer_id)?;
        Ok(ResolutionResult::single(NAME, record))
    }
}

/// Canonical query string: pairs sorted by key, RFC 3986 encoded.
fn canonical_query(query: &[(&str, &str)]) -> String {
    let mut pairs: Vec<(String, String)> = query
        .iter()
        .map(|(k, v)| {
            (
                utf8_percent_encode(k, PATH_SEGMENT).to_string(),
                utf8_percent_encode(v, PATH_SEGMENT).to_string(),
            )
        })
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the request URL, appending a signature-v2 `Signature` when a secret
/// is available.
fn signed_url(base: &str, query: &[(&str, &str)], secret: Option<&str>) -> Result<String, SourceError> {
    let url = Url::parse(base).map_err(|e| SourceError::InvalidUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    let host = url.host_str().ok_or_else(|| SourceError::InvalidUrl {
        url: base.to_string(),
        reason: "missing host".to_string(),
    })?;
    let host = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    let canonical = canonical_query(query);
    let base = base.trim_end_matches('?');
    let Some(secret) = secret else {
        return Ok(format!("{base}?{canonical}"));
    };

    let to_sign = format!("GET\n{}\n{}\n{canonical}", host.to_lowercase(), url.path());
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| SourceError::Malformed {
        format: "signing key",
        reason: e.to_string(),
    })?;
    mac.update(to_sign.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    Ok(format!(
        "{base}?{canonical}&Signature={}",
        utf8_percent_encode(&signature, PATH_SEGMENT)
    ))
}

/// Logs the first `Error` element, if any, and reports whether one was present.
fn log_error_element(doc: &Document) -> bool {
    let Some(error) = doc.find("Error") else {
        return false;
    };
    tracing::debug!(
        adapter = NAME,
        code = %error.text("Code", ""),
        message = %error.text("Message", ""),
        "amazon returned an error element"
    );
    true
}

fn parse_customer_id(doc: &Document) -> Result<String, SourceError> {
    let id = doc.text("CustomerId", "");
    if id.trim().is_empty() {
        log_error_element(doc);
        return Err(SourceError::not_found(NAME, "CustomerId"));
    }
    Ok(id.trim().to_string())
}

fn parse_customer(doc: &Document, customer_id: &str) -> Result<ProfileRecord, SourceError> {
    let Some(customer) = doc.find("Customer") else {
        log_error_element(doc);
        return Err(SourceError::not_found(NAME, "Customer"));
    };
    if log_error_element(doc) || customer.text("CustomerId", "").trim().is_empty() {
        return Err(SourceError::not_found(NAME, "Customer"));
    }

    Ok(ProfileRecord {
        user_id: customer_id.to_string(),
        user_name: customer.text("Nickname", ""),
        display_name: customer.text("Name", ""),
        portrait_url: String::new(),
        location: customer.text("UserDefinedLocation", ""),
    }
    .trimmed())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn query(stamp: &str) -> Vec<(&str, &str)> {
        vec![
            ("Operation", "CustomerContentSearch"),
            ("Email", "jane@example.com"),
            ("AWSAccessKeyId", "AKID"),
            ("Timestamp", stamp),
        ]
    }

    #[test]
    fn canonical_query_sorts_and_encodes() {
        let q = canonical_query(&[("b", "x y"), ("a", "jane@example.com"), ("C", "1:2")]);
        assert_eq!(q, "C=1%3A2&a=jane%40example.com&b=x%20y");
    }

    #[test]
    fn unsigned_url_has_no_signature() {
        let url = signed_url(DEFAULT_BASE_URL, &query("2024-03-01T12:00:00Z"), None).unwrap();
        assert!(url.starts_with("https://webservices.amazon.com/onca/xml?AWSAccessKeyId=AKID&"));
        assert!(!url.contains("Signature="));
    }

    #[test]
    fn signature_is_deterministic_and_depends_on_secret() {
        let q = query("2024-03-01T12:00:00Z");
        let a = signed_url(DEFAULT_BASE_URL, &q, Some("secret-a")).unwrap();
        let again = signed_url(DEFAULT_BASE_URL, &q, Some("secret-a")).unwrap();
        let b = signed_url(DEFAULT_BASE_URL, &q, Some("secret-b")).unwrap();
        assert!(a.contains("&Signature="));
        assert_eq!(a, again);
        assert_ne!(a, b);
    }

    #[test]
    fn request_url_carries_fixed_parameters() {
        let transport: Arc<dyn Transport> =
            Arc::new(crate::transport::HttpTransport::new(5, "test").unwrap());
        let adapter = AmazonAdapter::new(transport, "AKID", "tag-20", None);
        let url = adapter
            .request_url("CustomerContentSearch", &[("Email", "jane@example.com")], fixed_time())
            .unwrap();
        assert!(url.contains("AssociateTag=tag-20"));
        assert!(url.contains("Operation=CustomerContentSearch"));
        assert!(url.contains("Timestamp=2024-03-01T12%3A00%3A00Z"));
        assert!(url.contains("Service=AWSECommerceService"));
        assert!(url.contains("Email=jane%40example.com"));
    }

    #[test]
    fn customer_id_is_required() {
        let doc = Document::from_xml(
            "<CustomerContentSearchResponse><Customers><TotalResults>0</TotalResults></Customers>\
             </CustomerContentSearchResponse>",
        )
        .unwrap();
        assert!(matches!(
            parse_customer_id(&doc).unwrap_err(),
            SourceError::NotFound { field: "CustomerId", .. }
        ));
    }

    #[test]
    fn customer_profile_fields_are_text_nodes() {
        let search = Document::from_xml(
            "<R><Customers><Customer><CustomerId>A2JX</CustomerId></Customer></Customers></R>",
        )
        .unwrap();
        let id = parse_customer_id(&search).unwrap();
        assert_eq!(id, "A2JX");

        let lookup = Document::from_xml(
            "<R><Customer><CustomerId>A2JX</CustomerId><Nickname>janed</Nickname>\
             <Name>Jane Doe</Name><Location><UserDefinedLocation>Austin, TX</UserDefinedLocation>\
             </Location></Customer></R>",
        )
        .unwrap();
        let rec = parse_customer(&lookup, &id).unwrap();
        assert_eq!(rec.user_id, "A2JX");
        assert_eq!(rec.user_name, "janed");
        assert_eq!(rec.display_name, "Jane Doe");
        assert_eq!(rec.location, "Austin, TX");
        assert_eq!(rec.portrait_url, "");
    }

    #[test]
    fn lookup_error_envelope_is_not_found() {
        let lookup = Document::from_xml(
            "<CustomerContentLookupResponse><Customers><Request><Errors><Error>\
             <Code>AWS.InvalidParameterValue</Code><Message>A2JX is not a valid value</Message>\
             </Error></Errors></Request></Customers></CustomerContentLookupResponse>",
        )
        .unwrap();
        assert!(matches!(
            parse_customer(&lookup, "A2JX").unwrap_err(),
            SourceError::NotFound { field: "Customer", .. }
        ));
    }

    #[test]
    fn lookup_without_customer_id_is_not_found() {
        let lookup =
            Document::from_xml("<R><Customer><Nickname>janed</Nickname></Customer></R>").unwrap();
        assert!(parse_customer(&lookup, "A2JX").is_err());
    }
}
