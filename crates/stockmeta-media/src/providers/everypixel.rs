//! Everypixel keyword-scoring provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;

use stockmeta_config::KeywordServiceConfig;
use stockmeta_types::{MetadataError, ProviderFailure, error::truncate_body};

use super::send_error;
use crate::types::{KeywordScorer, ScoredKeyword};

/// Everypixel `/keywords` client (basic auth, multipart upload).
pub struct EverypixelScorer {
    client_id: String,
    client_secret: String,
    config: KeywordServiceConfig,
    client: reqwest::Client,
}

impl EverypixelScorer {
    pub fn new(client_id: String, client_secret: String, config: KeywordServiceConfig) -> Self {
        Self {
            client_id,
            client_secret,
            config,
            client: reqwest::Client::new(),
        }
    }
}

/// Map a non-2xx status to a failure kind with its own user-facing message.
pub fn failure_for_status(status: u16) -> ProviderFailure {
    match status {
        401 | 403 => ProviderFailure::InvalidCredentials,
        402 | 429 => ProviderFailure::QuotaExceeded,
        502..=504 => ProviderFailure::UpstreamOverload,
        _ => ProviderFailure::Status,
    }
}

/// Parse the keyword list, keeping the service's relevance order.
pub fn parse_keywords(json: &serde_json::Value) -> Option<Vec<ScoredKeyword>> {
    let items = json.get("keywords")?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| {
                let keyword = item.get("keyword")?.as_str()?.trim().to_string();
                let score = item.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0);
                (!keyword.is_empty()).then_some(ScoredKeyword { keyword, score })
            })
            .collect(),
    )
}

#[async_trait]
impl KeywordScorer for EverypixelScorer {
    fn id(&self) -> &str {
        "everypixel"
    }

    async fn score(
        &self,
        data: Vec<u8>,
        file_name: &str,
    ) -> Result<Vec<ScoredKeyword>, MetadataError> {
        let timeout_secs = self.config.timeout_secs;
        let part = multipart::Part::bytes(data).file_name(file_name.to_string());
        let form = multipart::Form::new().part("data", part);

        let resp = self
            .client
            .post(format!(
                "{}/keywords",
                self.config.base_url.trim_end_matches('/')
            ))
            .query(&[("num_keywords", self.config.num_keywords.to_string())])
            .query(&[("threshold", self.config.threshold.to_string())])
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .timeout(Duration::from_secs(timeout_secs))
            .multipart(form)
            .send()
            .await
            .map_err(|e| send_error(self.id(), timeout_secs, e))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| send_error(self.id(), timeout_secs, e))?;

        if !status.is_success() {
            return Err(MetadataError::Provider {
                provider: self.id().to_string(),
                failure: failure_for_status(status.as_u16()),
                status: Some(status.as_u16()),
                body: truncate_body(&text),
            });
        }

        let json: serde_json::Value =
            serde_json::from_str(&text).map_err(|_| MetadataError::malformed(self.id(), &text))?;
        if json.get("status").and_then(|s| s.as_str()) == Some("error") {
            return Err(MetadataError::malformed(self.id(), &text));
        }
        let keywords =
            parse_keywords(&json).ok_or_else(|| MetadataError::malformed(self.id(), &text))?;
        tracing::debug!(file = file_name, count = keywords.len(), "Keywords scored");
        Ok(keywords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_mapping() {
        assert_eq!(failure_for_status(401), ProviderFailure::InvalidCredentials);
        assert_eq!(failure_for_status(429), ProviderFailure::QuotaExceeded);
        assert_eq!(failure_for_status(503), ProviderFailure::UpstreamOverload);
        assert_eq!(failure_for_status(500), ProviderFailure::Status);
    }

    #[test]
    fn test_parse_keeps_order() {
        let json = serde_json::json!({
            "keywords": [
                { "keyword": "Beach", "score": 0.91 },
                { "keyword": " ", "score": 0.8 },
                { "keyword": "Sea", "score": 0.95 }
            ],
            "status": "ok"
        });
        let parsed = parse_keywords(&json).unwrap();
        let names: Vec<&str> = parsed.iter().map(|k| k.keyword.as_str()).collect();
        assert_eq!(names, vec!["Beach", "Sea"]);
    }

    #[test]
    fn test_parse_missing_keywords() {
        assert!(parse_keywords(&serde_json::json!({"status": "ok"})).is_none());
    }
}
