//! Concrete identity sources and their priority order.

mod aim;
mod amazon;
mod finger;
mod flickr;
mod friendfeed;
mod gravatar;
mod socialgraph;
mod youtube;

pub use aim::AimAdapter;
pub use amazon::AmazonAdapter;
pub use finger::FingerAdapter;
pub use flickr::FlickrAdapter;
pub use friendfeed::FriendfeedAdapter;
pub use gravatar::GravatarAdapter;
pub use socialgraph::SocialGraphAdapter;
pub use youtube::YoutubeAdapter;

use std::sync::Arc;

use mailtrace_core::{AppConfig, Credentials};

use crate::adapter::ServiceAdapter;
use crate::process::CommandRunner;
use crate::secondary::SecondaryResolver;
use crate::transport::Transport;

/// Every adapter name, highest confidence first. Direct sources precede the
/// conglomerators.
pub const PRIORITY: [&str; 8] = [
    gravatar::NAME,
    flickr::NAME,
    youtube::NAME,
    amazon::NAME,
    aim::NAME,
    finger::NAME,
    friendfeed::NAME,
    socialgraph::NAME,
];

/// Build the enabled adapters in priority order.
///
/// Adapters whose credentials are missing, and the legacy finger adapter
/// unless enabled in `config`, are left out and logged at `info`.
#[must_use]
pub fn build_adapters(
    config: &AppConfig,
    credentials: &Credentials,
    transport: Arc<dyn Transport>,
    runner: Arc<dyn CommandRunner>,
) -> Vec<Arc<dyn ServiceAdapter>> {
    let proxy = config.avatar_proxy_url.as_deref().unwrap_or_default();
    let resolver = Arc::new(SecondaryResolver::new(proxy));
    let mut adapters: Vec<Arc<dyn ServiceAdapter>> = Vec::with_capacity(PRIORITY.len());

    adapters.push(Arc::new(GravatarAdapter::new(Arc::clone(&transport))));

    match credentials.get(flickr::NAME) {
        Some(creds) => adapters.push(Arc::new(FlickrAdapter::new(
            Arc::clone(&transport),
            &creds.api_key,
        ))),
        None => disabled(flickr::NAME, "no api_key configured"),
    }

    adapters.push(Arc::new(YoutubeAdapter::new(Arc::clone(&transport))));

    match credentials.get(amazon::NAME) {
        Some(creds) => match creds.associate_tag.as_deref() {
            Some(tag) if !tag.trim().is_empty() => adapters.push(Arc::new(AmazonAdapter::new(
                Arc::clone(&transport),
                &creds.api_key,
                tag,
                creds.secret.as_deref(),
            ))),
            _ => disabled(amazon::NAME, "no associate_tag configured"),
        },
        None => disabled(amazon::NAME, "no api_key configured"),
    }

    adapters.push(Arc::new(AimAdapter::new(Arc::clone(&transport))));

    if config.finger_enabled {
        adapters.push(Arc::new(FingerAdapter::new(runner)));
    } else {
        disabled(finger::NAME, "MAILTRACE_FINGER_ENABLED is not set");
    }

    adapters.push(Arc::new(FriendfeedAdapter::new(
        Arc::clone(&transport),
        Arc::clone(&resolver),
    )));
    adapters.push(Arc::new(SocialGraphAdapter::new(transport, resolver)));

    adapters
}

fn disabled(adapter: &'static str, reason: &str) {
    tracing::info!(adapter, reason, "adapter disabled");
}
