//! Normalization of secondary-service mentions reported by conglomerators.
//!
//! A mention is a loose `(service, name, id, url)` tuple where any part may be
//! missing. The [`SecondaryResolver`] holds one [`ServiceRule`] per known
//! service and turns a mention into a [`ProfileRecord`], or drops it when the
//! service is unknown or nothing identifies the account.
//!
//! [`SecondaryResolver::resolve`] is pure. Synthesized avatar URLs are only
//! marked for probing; [`resolve_mentions`] performs the probes.

use std::collections::BTreeMap;

use futures::stream::{self, StreamExt};
use mailtrace_core::{ProfileRecord, ResolutionResult, ServiceMention};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;

use crate::transport::{url_exists, Transport};

/// Everything but RFC 3986 unreserved characters.
pub(crate) const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Facebook paths that are pages of the site rather than member vanity names.
const FACEBOOK_RESERVED: [&str; 8] = [
    "profile.php",
    "home.php",
    "people",
    "pages",
    "groups",
    "events",
    "login.php",
    "pg",
];

/// Upper bound on concurrent avatar probes for one mention list.
const MAX_CONCURRENT_PROBES: usize = 4;

/// Which record field a profile-URL pattern fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlCapture {
    UserName,
    UserId,
}

/// Normalization rule for one secondary service.
#[derive(Debug, Clone, Default)]
pub struct ServiceRule {
    url_patterns: Vec<(Regex, UrlCapture)>,
    reserved_segments: Vec<String>,
    numeric_name_is_id: bool,
    proxy_avatar: bool,
}

impl ServiceRule {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pattern whose first capture group fills `capture` when the
    /// mention carries neither a name nor an id. Patterns are tried in order.
    #[must_use]
    pub fn with_url_pattern(mut self, pattern: Regex, capture: UrlCapture) -> Self {
        self.url_patterns.push((pattern, capture));
        self
    }

    /// Path words a URL pattern may capture that never name an account
    /// (`profile.php`, `pages`). Matched case-insensitively.
    #[must_use]
    pub fn with_reserved_segments(mut self, segments: &[&str]) -> Self {
        self.reserved_segments
            .extend(segments.iter().map(|s| s.to_ascii_lowercase()));
        self
    }

    fn is_reserved(&self, value: &str) -> bool {
        let value = value.to_ascii_lowercase();
        self.reserved_segments.iter().any(|r| *r == value)
    }

    /// Treat an all-digit user name as the account id and blank the name.
    #[must_use]
    pub fn numeric_name_is_id(mut self) -> Self {
        self.numeric_name_is_id = true;
        self
    }

    /// Synthesize a portrait from the avatar proxy (`{proxy}/{user}@{service}`).
    #[must_use]
    pub fn proxy_avatar(mut self) -> Self {
        self.proxy_avatar = true;
        self
    }
}

/// A mention the registry recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMention {
    /// Canonical (lowercased) registry key.
    pub service: String,
    pub record: ProfileRecord,
    /// `portrait_url` was synthesized and must be confirmed with a HEAD probe.
    pub probe_portrait: bool,
}

#[derive(Debug, Clone)]
pub struct SecondaryResolver {
    rules: BTreeMap<String, ServiceRule>,
    avatar_proxy_url: Option<String>,
}

impl SecondaryResolver {
    /// Resolver preloaded with the built-in services. A blank
    /// `avatar_proxy_url` turns off synthesized avatars.
    #[must_use]
    pub fn new(avatar_proxy_url: &str) -> Self {
        let mut resolver = Self::empty(avatar_proxy_url);

        resolver.register(
            "twitter",
            ServiceRule::new()
                .with_url_pattern(
                    pattern(r"(?i)twitter\.com/(?:#!/)?@?([A-Za-z0-9_]+)"),
                    UrlCapture::UserName,
                )
                .proxy_avatar(),
        );
        resolver.register(
            "facebook",
            ServiceRule::new()
                .with_url_pattern(pattern(r"(?i)[?&]id=(\d+)"), UrlCapture::UserId)
                .with_url_pattern(
                    pattern(r"(?i)facebook\.com/(?:#!/)?([A-Za-z0-9.]+)"),
                    UrlCapture::UserName,
                )
                .with_reserved_segments(&FACEBOOK_RESERVED)
                .numeric_name_is_id()
                .proxy_avatar(),
        );
        resolver.register(
            "linkedin",
            ServiceRule::new().with_url_pattern(pattern(r"(?i)/in/([^/?#]+)"), UrlCapture::UserName),
        );
        resolver.register(
            "delicious",
            ServiceRule::new().with_url_pattern(
                pattern(r"(?i)(?:delicious\.com|del\.icio\.us)/([^/?#]+)"),
                UrlCapture::UserName,
            ),
        );
        resolver.register(
            "intensedebate",
            ServiceRule::new().with_url_pattern(
                pattern(r"(?i)intensedebate\.com/(?:people|profiles)/([^/?#]+)"),
                UrlCapture::UserName,
            ),
        );
        resolver.register(
            "disqus",
            ServiceRule::new().with_url_pattern(
                pattern(r"(?i)disqus\.com/(?:by/)?([^/?#]+)"),
                UrlCapture::UserName,
            ),
        );
        resolver.register(
            "digg",
            ServiceRule::new()
                .with_url_pattern(pattern(r"(?i)digg\.com/users/([^/?#]+)"), UrlCapture::UserName)
                .proxy_avatar(),
        );
        resolver.register("aim", ServiceRule::new().proxy_avatar());
        resolver.register(
            "myspace",
            ServiceRule::new()
                .with_url_pattern(pattern(r"(?i)friendid=(\d+)"), UrlCapture::UserId)
                .proxy_avatar(),
        );

        resolver
    }

    /// Resolver with no registered services.
    #[must_use]
    pub fn empty(avatar_proxy_url: &str) -> Self {
        Self {
            rules: BTreeMap::new(),
            avatar_proxy_url: Some(avatar_proxy_url.trim().trim_end_matches('/'))
                .filter(|url| !url.is_empty())
                .map(str::to_string),
        }
    }

    /// Register (or replace) the rule for `service`. Keys are case-insensitive.
    pub fn register(&mut self, service: &str, rule: ServiceRule) {
        self.rules.insert(canonical(service), rule);
    }

    #[must_use]
    pub fn is_registered(&self, service: &str) -> bool {
        self.rules.contains_key(&canonical(service))
    }

    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Normalize one mention.
    ///
    /// Returns `None` when the service is not registered, or when neither a
    /// user name nor an id can be established for it.
    #[must_use]
    pub fn resolve(&self, mention: &ServiceMention) -> Option<ResolvedMention> {
        let service = canonical(&mention.service);
        let rule = self.rules.get(&service)?;

        let mut user_name = mention.user_name.trim().to_string();
        let mut user_id = mention.user_id.trim().to_string();
        let profile_url = mention.profile_url.trim();

        if user_name.is_empty() && user_id.is_empty() && !profile_url.is_empty() {
            for (re, capture) in &rule.url_patterns {
                let Some(value) = re
                    .captures(profile_url)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().to_string())
                    .filter(|value| !rule.is_reserved(value))
                else {
                    continue;
                };
                match capture {
                    UrlCapture::UserName => user_name = value,
                    UrlCapture::UserId => user_id = value,
                }
                break;
            }
        }

        if rule.numeric_name_is_id
            && !user_name.is_empty()
            && user_name.chars().all(|c| c.is_ascii_digit())
        {
            if user_id.is_empty() {
                user_id = std::mem::take(&mut user_name);
            } else {
                user_name.clear();
            }
        }

        if user_name.is_empty() && user_id.is_empty() {
            return None;
        }

        let mut portrait_url = String::new();
        if let (true, Some(proxy)) = (rule.proxy_avatar, &self.avatar_proxy_url) {
            let key = if user_name.is_empty() { &user_id } else { &user_name };
            portrait_url = format!("{proxy}/{}@{service}", utf8_percent_encode(key, PATH_SEGMENT));
        }
        let probe_portrait = !portrait_url.is_empty();

        Some(ResolvedMention {
            service,
            record: ProfileRecord {
                user_id,
                user_name,
                display_name: String::new(),
                portrait_url,
                location: String::new(),
            },
            probe_portrait,
        })
    }
}

/// Resolve a conglomerator's mention list into service-keyed records.
///
/// Unrecognized mentions are dropped. A later mention of a service replaces
/// an earlier one. Synthesized portraits of the surviving mentions are probed,
/// a few at a time, and blanked when the probe fails.
pub async fn resolve_mentions(
    resolver: &SecondaryResolver,
    transport: &dyn Transport,
    mentions: &[ServiceMention],
) -> ResolutionResult {
    let mut latest: BTreeMap<String, ResolvedMention> = BTreeMap::new();
    for mention in mentions {
        match resolver.resolve(mention) {
            Some(resolved) => {
                latest.insert(resolved.service.clone(), resolved);
            }
            None => tracing::debug!(
                service = %mention.service,
                registered = resolver.is_registered(&mention.service),
                "dropping secondary mention"
            ),
        }
    }

    let probed: Vec<ResolvedMention> = stream::iter(latest.into_values())
        .map(|mut mention| async move {
            if mention.probe_portrait && !url_exists(transport, &mention.record.portrait_url).await {
                mention.record.portrait_url.clear();
            }
            mention
        })
        .buffer_unordered(MAX_CONCURRENT_PROBES)
        .collect()
        .await;

    let mut result = ResolutionResult::new();
    for mention in probed {
        result.insert(&mention.service, mention.record);
    }
    result
}

fn canonical(service: &str) -> String {
    service.trim().to_ascii_lowercase()
}

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("valid regex")
}

#[cfg(test)]
#[path = "secondary_test.rs"]
mod tests;
