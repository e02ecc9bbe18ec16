//! Scripted providers for pipeline tests.

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use stockmeta_media::{CompletionRequest, KeywordScorer, Sample, ScoredKeyword, VisionProvider};
use stockmeta_types::{MediaFile, MetadataError};

use crate::parse::parse_numbered_lines;

/// Prompt fragments identifying each kind of request.
pub const ADOBE: &str = "keywords for Adobe Stock (";
pub const SHUTTER: &str = "keywords for Shutterstock (";
pub const ISTOCK: &str = "keywords for iStock/Getty (";
pub const METADATA: &str = "Return ONLY valid JSON";
pub const TRANSLATE: &str = "Translate each numbered";
pub const TEXT: &str = "Translate to ";

pub const METADATA_REPLY: &str = r#"{"title_en":"Red apple on table","title_tr":"Masada kırmızı elma","description_en":"Fresh red apple on a wooden kitchen table in soft daylight","description_tr":"Yumuşak gün ışığında ahşap masada taze kırmızı elma"}"#;

type Responder = Box<dyn Fn(&str) -> Result<String, MetadataError> + Send + Sync>;

pub fn status_error(status: u16) -> MetadataError {
    MetadataError::provider_status("mock", status, "scripted failure")
}

/// Answer a numbered translation prompt with `tr:<term>` for every line.
pub fn echo_translation(prompt: &str) -> String {
    let list = prompt.rsplit("\n\n").next().unwrap_or_default();
    parse_numbered_lines(list)
        .into_iter()
        .map(|(n, term)| format!("{n}. tr:{term}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Vision provider answering by the first rule whose fragment the prompt
/// contains. Unmatched prompts fail with status 500.
pub struct MockVision {
    rules: Vec<(String, Responder)>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockVision {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with<F>(mut self, fragment: &str, responder: F) -> Self
    where
        F: Fn(&str) -> Result<String, MetadataError> + Send + Sync + 'static,
    {
        self.rules.push((fragment.to_string(), Box::new(responder)));
        self
    }

    pub fn on(self, fragment: &str, reply: &str) -> Self {
        let reply = reply.to_string();
        self.with(fragment, move |_| Ok(reply.clone()))
    }

    pub fn fail_on(self, fragment: &str, status: u16) -> Self {
        self.with(fragment, move |_| Err(status_error(status)))
    }

    /// Metadata, keyword and translation rules that all succeed.
    pub fn happy() -> Self {
        Self::new()
            .on(METADATA, METADATA_REPLY)
            .on(ADOBE, "apple, fruit, red, food, healthy")
            .on(SHUTTER, "apple, kitchen, table, fresh")
            .on(ISTOCK, "apple, dog, organic")
            .with(TRANSLATE, |p| Ok(echo_translation(p)))
            .with(TEXT, |p| Ok(format!("en:{}", p.rsplit("\n\n").next().unwrap_or_default())))
    }

    /// [`MockVision::happy`] with one extra rule taking precedence.
    pub fn happy_with<F>(fragment: &str, responder: F) -> Self
    where
        F: Fn(&str) -> Result<String, MetadataError> + Send + Sync + 'static,
    {
        let mut mock = Self::new().with(fragment, responder);
        mock.rules.extend(Self::happy().rules);
        mock
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionProvider for MockVision {
    fn id(&self) -> &str {
        "mock"
    }

    async fn complete(&self, req: CompletionRequest) -> Result<String, MetadataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(req.prompt.clone());
        // Yield so concurrent requests interleave.
        tokio::task::yield_now().await;
        match self.rules.iter().find(|(frag, _)| req.prompt.contains(frag.as_str())) {
            Some((_, respond)) => respond(&req.prompt),
            None => Err(status_error(500)),
        }
    }
}

/// Keyword scorer returning a fixed list or a fixed failure.
pub struct MockScorer {
    result: Result<Vec<String>, u16>,
    calls: AtomicUsize,
}

impl MockScorer {
    pub fn ok(terms: &[String]) -> Self {
        Self {
            result: Ok(terms.to_vec()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            result: Err(status),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeywordScorer for MockScorer {
    fn id(&self) -> &str {
        "mock-scorer"
    }

    async fn score(
        &self,
        _data: Vec<u8>,
        _file_name: &str,
    ) -> Result<Vec<ScoredKeyword>, MetadataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.result {
            Ok(terms) => Ok(terms
                .iter()
                .enumerate()
                .map(|(i, k)| ScoredKeyword {
                    keyword: k.clone(),
                    score: 1.0 - i as f64 / 100.0,
                })
                .collect()),
            Err(status) => Err(status_error(*status)),
        }
    }
}

pub fn sample() -> Sample {
    Sample {
        jpeg: vec![0xFF, 0xD8, 0xFF, 0xD9],
        base64: "/9j/2Q==".into(),
        width: 300,
        height: 300,
    }
}

/// Write a small PNG and describe it as a media file.
pub fn write_image(dir: &Path, name: &str) -> MediaFile {
    let path = dir.join(name);
    let img = image::RgbImage::from_pixel(64, 48, image::Rgb([200, 30, 30]));
    img.save_with_format(&path, image::ImageFormat::Png).unwrap();
    MediaFile::from_path(&path).unwrap()
}
