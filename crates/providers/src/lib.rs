//! Upstream chat-completion providers for docchat.
//!
//! All providers implement the `docchat_core::Provider` trait.
//! [`build_from_config`] assembles the provider stack the gateway uses.

pub mod openai_compat;
pub mod retry;

use std::sync::Arc;

use docchat_core::Provider;

pub use openai_compat::OpenAiCompatProvider;
pub use retry::{RetryPolicy, RetryProvider};

/// Build the upstream provider from configuration.
///
/// The credential is captured here, once. A missing key still yields a
/// provider; it reports `is_configured() == false` and refuses every call.
pub fn build_from_config(config: &docchat_config::AppConfig) -> Arc<dyn Provider> {
    let gateway: Arc<dyn Provider> = Arc::new(OpenAiCompatProvider::new(
        "ai-gateway",
        config.gateway_url.clone(),
        config.api_key.clone(),
        config.request_timeout(),
    ));

    if config.retry.max_retries == 0 {
        return gateway;
    }

    Arc::new(RetryProvider::new(
        gateway,
        RetryPolicy::from(&config.retry).with_attempt_timeout(config.request_timeout()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_without_key() {
        let provider = build_from_config(&docchat_config::AppConfig::default());
        assert!(!provider.is_configured());
        assert_eq!(provider.name(), "ai-gateway");
    }

    #[test]
    fn wraps_in_retry_when_enabled() {
        let mut config = docchat_config::AppConfig {
            api_key: Some("sk-test".into()),
            ..Default::default()
        };
        config.retry.max_retries = 2;
        let provider = build_from_config(&config);
        assert!(provider.is_configured());
        assert_eq!(provider.name(), "ai-gateway+retry");
    }
}
