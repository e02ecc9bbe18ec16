//! Media types and provider traits.

use async_trait::async_trait;

use stockmeta_types::MetadataError;

/// Downsized JPEG representation of a media file, sent to AI providers.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Encoded JPEG bytes.
    pub jpeg: Vec<u8>,
    /// Base64 of `jpeg`, ready for a data URL.
    pub base64: String,
    pub width: u32,
    pub height: u32,
}

/// Generation request for the vision/text provider.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Base64 JPEG attached to the prompt; text-only when `None`.
    pub image_base64: Option<String>,
    /// Prompt text.
    pub prompt: String,
    /// Response size limit in tokens.
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn vision(sample: &Sample, prompt: String, max_tokens: u32) -> Self {
        Self {
            image_base64: Some(sample.base64.clone()),
            prompt,
            max_tokens,
        }
    }

    pub fn text(prompt: String, max_tokens: u32) -> Self {
        Self {
            image_base64: None,
            prompt,
            max_tokens,
        }
    }
}

/// One keyword from the scoring service.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredKeyword {
    pub keyword: String,
    pub score: f64,
}

/// Vision/text generation provider.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Provider identifier.
    fn id(&self) -> &str;
    /// Run one prompt and return the raw response text.
    async fn complete(&self, req: CompletionRequest) -> Result<String, MetadataError>;
}

/// Third-party keyword-scoring provider.
#[async_trait]
pub trait KeywordScorer: Send + Sync {
    /// Provider identifier.
    fn id(&self) -> &str;
    /// Score keywords for the given media bytes, ordered by descending relevance.
    async fn score(&self, data: Vec<u8>, file_name: &str)
    -> Result<Vec<ScoredKeyword>, MetadataError>;
}
