//! HTTP providers behind [`VisionProvider`](crate::VisionProvider) and
//! [`KeywordScorer`](crate::KeywordScorer).

pub mod chat;
pub mod everypixel;

pub use chat::ChatCompletionsProvider;
pub use everypixel::EverypixelScorer;

use stockmeta_types::{MetadataError, ProviderFailure};

/// Map a transport error, turning deadline hits into `Timeout`.
pub(crate) fn send_error(provider: &str, timeout_secs: u64, err: reqwest::Error) -> MetadataError {
    if err.is_timeout() {
        MetadataError::Timeout {
            provider: provider.to_string(),
            seconds: timeout_secs,
        }
    } else {
        MetadataError::Provider {
            provider: provider.to_string(),
            failure: ProviderFailure::Status,
            status: err.status().map(|s| s.as_u16()),
            body: err.to_string(),
        }
    }
}
