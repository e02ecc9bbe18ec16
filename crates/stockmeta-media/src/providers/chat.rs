//! OpenAI-compatible chat completions provider (Groq by default).

use std::time::Duration;

use async_trait::async_trait;

use stockmeta_config::ProviderConfig;
use stockmeta_types::MetadataError;

use super::send_error;
use crate::types::{CompletionRequest, VisionProvider};

/// Vision and text generation through a `/chat/completions` endpoint.
pub struct ChatCompletionsProvider {
    api_key: String,
    config: ProviderConfig,
    client: reqwest::Client,
}

impl ChatCompletionsProvider {
    pub fn new(api_key: String, config: ProviderConfig) -> Self {
        Self {
            api_key,
            config,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Model and deadline for a request: vision when an image is attached.
    fn route(&self, req: &CompletionRequest) -> (&str, u64) {
        if req.image_base64.is_some() {
            (&self.config.vision_model, self.config.vision_timeout_secs)
        } else {
            (&self.config.text_model, self.config.text_timeout_secs)
        }
    }
}

/// Build the chat completions request body.
pub fn request_body(model: &str, req: &CompletionRequest) -> serde_json::Value {
    let content = match &req.image_base64 {
        Some(b64) => serde_json::json!([
            {
                "type": "image_url",
                "image_url": { "url": format!("data:image/jpeg;base64,{b64}") }
            },
            { "type": "text", "text": req.prompt }
        ]),
        None => serde_json::Value::String(req.prompt.clone()),
    };
    serde_json::json!({
        "model": model,
        "messages": [{ "role": "user", "content": content }],
        "max_tokens": req.max_tokens
    })
}

/// Pull the first choice's message text out of a response body.
pub fn response_text(json: &serde_json::Value) -> Option<String> {
    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(|s| s.trim().to_string())
}

#[async_trait]
impl VisionProvider for ChatCompletionsProvider {
    fn id(&self) -> &str {
        "groq"
    }

    async fn complete(&self, req: CompletionRequest) -> Result<String, MetadataError> {
        let (model, timeout_secs) = self.route(&req);
        let body = request_body(model, &req);

        let resp = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .timeout(Duration::from_secs(timeout_secs))
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(self.id(), timeout_secs, e))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| send_error(self.id(), timeout_secs, e))?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), model, "Chat completion failed");
            return Err(MetadataError::provider_status(self.id(), status.as_u16(), &text));
        }

        let json: serde_json::Value =
            serde_json::from_str(&text).map_err(|_| MetadataError::malformed(self.id(), &text))?;
        response_text(&json).ok_or_else(|| MetadataError::malformed(self.id(), &text))
    }
}
