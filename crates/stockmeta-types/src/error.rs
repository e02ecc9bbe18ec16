//! Error taxonomy shared by the media and pipeline crates.

use thiserror::Error;

/// Longest provider response body carried inside an error.
pub const MAX_ERROR_BODY: usize = 300;

/// Why a provider call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFailure {
    /// Non-2xx status without a more specific meaning.
    Status,
    InvalidCredentials,
    QuotaExceeded,
    UpstreamOverload,
    /// 2xx response whose payload did not have the expected shape.
    Malformed,
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Unsupported media: {0}")]
    UnsupportedMedia(String),
    #[error("Could not decode {name}: {reason}")]
    Decode { name: String, reason: String },
    #[error("{}", provider_message(.provider, .failure, .status, .body))]
    Provider {
        provider: String,
        failure: ProviderFailure,
        status: Option<u16>,
        body: String,
    },
    #[error("{provider} request timed out after {seconds}s")]
    Timeout { provider: String, seconds: u64 },
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Could not parse {what} from response: {snippet}")]
    Parse { what: String, snippet: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl MetadataError {
    /// Provider error from a non-2xx response.
    pub fn provider_status(provider: &str, status: u16, body: &str) -> Self {
        MetadataError::Provider {
            provider: provider.to_string(),
            failure: ProviderFailure::Status,
            status: Some(status),
            body: truncate_body(body),
        }
    }

    /// Provider error from a 2xx response with an unexpected payload.
    pub fn malformed(provider: &str, body: &str) -> Self {
        MetadataError::Provider {
            provider: provider.to_string(),
            failure: ProviderFailure::Malformed,
            status: None,
            body: truncate_body(body),
        }
    }

    pub fn parse(what: &str, raw: &str) -> Self {
        MetadataError::Parse {
            what: what.to_string(),
            snippet: truncate_body(raw),
        }
    }

    pub fn decode(name: &str, reason: impl ToString) -> Self {
        MetadataError::Decode {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn provider_message(
    provider: &str,
    failure: &ProviderFailure,
    status: &Option<u16>,
    body: &str,
) -> String {
    let code = status.map(|s| format!(" ({s})")).unwrap_or_default();
    match failure {
        ProviderFailure::InvalidCredentials => {
            format!("{provider}: invalid API credentials{code}, check the client id and secret")
        }
        ProviderFailure::QuotaExceeded => {
            format!("{provider}: request quota exceeded{code}, try again later or upgrade the plan")
        }
        ProviderFailure::UpstreamOverload => {
            format!("{provider}: service is overloaded{code}, try again in a moment")
        }
        ProviderFailure::Malformed => format!("{provider}: malformed response: {body}"),
        ProviderFailure::Status => format!("{provider} error{code}: {body}"),
    }
}

/// Cut a response body to [`MAX_ERROR_BODY`] characters.
pub fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => body[..idx].to_string(),
        None => body.to_string(),
    }
}
