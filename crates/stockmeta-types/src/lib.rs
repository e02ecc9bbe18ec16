//! stockmeta-types: shared data model for the metadata pipeline.

pub mod error;
pub mod json;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use error::{MetadataError, ProviderFailure};

// ──────────────────── Media Types ────────────────────

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif", "webp"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "m4v", "wmv"];

/// Declared category of a media file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Unsupported,
}

impl MediaKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Image
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Video
        } else {
            MediaKind::Unsupported
        }
    }

    pub fn is_supported(self) -> bool {
        self != MediaKind::Unsupported
    }
}

/// Stable identity of a media file: name + size + last-modified time.
///
/// Re-selecting the same filesystem object yields the same id; a renamed copy
/// with identical content does not.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn new(name: &str, size: u64, modified_ms: i64) -> Self {
        Self(format!("{name}:{size}:{modified_ms}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A media file selected for annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    /// Location on disk.
    pub path: PathBuf,
    /// File name (last path component).
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Last-modified time (unix millis).
    pub modified_ms: i64,
    /// Category derived from the extension.
    pub kind: MediaKind,
}

impl MediaFile {
    /// Stat a file on disk and build its descriptor.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        let modified_ms = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        Ok(Self {
            path: path.to_path_buf(),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            size: meta.len(),
            modified_ms,
            kind: MediaKind::from_path(path),
        })
    }

    pub fn id(&self) -> FileId {
        FileId::new(&self.name, self.size, self.modified_ms)
    }
}

// ──────────────────── Platform Types ────────────────────

/// Target stock-media marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Adobe,
    Shutter,
    #[serde(rename = "istock")]
    IStock,
}

impl Platform {
    /// All platforms in export order.
    pub const ALL: [Platform; 3] = [Platform::Adobe, Platform::Shutter, Platform::IStock];

    /// Maximum keyword count accepted by the platform.
    pub fn cap(self) -> usize {
        match self {
            Platform::Adobe => 49,
            Platform::Shutter => 50,
            Platform::IStock => 50,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Platform::Adobe => "adobe",
            Platform::Shutter => "shutter",
            Platform::IStock => "istock",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Platform::Adobe => "Adobe Stock",
            Platform::Shutter => "Shutterstock",
            Platform::IStock => "iStock",
        }
    }

    /// Whether the third-party keyword-scoring provider feeds this platform.
    pub fn uses_keyword_scorer(self) -> bool {
        self == Platform::Adobe
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "adobe" | "adobe_stock" => Ok(Platform::Adobe),
            "shutter" | "shutterstock" => Ok(Platform::Shutter),
            "istock" | "getty" => Ok(Platform::IStock),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

/// Metadata language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lang {
    En,
    Tr,
}

impl Lang {
    pub fn code(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Tr => "tr",
        }
    }

    /// Language name used in prompts.
    pub fn name(self) -> &'static str {
        match self {
            Lang::En => "English",
            Lang::Tr => "Turkish",
        }
    }

    pub fn other(self) -> Lang {
        match self {
            Lang::En => Lang::Tr,
            Lang::Tr => Lang::En,
        }
    }
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Lang::En),
            "tr" | "turkish" => Ok(Lang::Tr),
            other => Err(format!("unknown language: {other}")),
        }
    }
}

// ──────────────────── Record Types ────────────────────

/// Lowercase generic term → iStock-preferred replacement.
pub type IStockMap = BTreeMap<String, String>;

/// Free-text fields of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    TitleEn,
    TitleTr,
    DescriptionEn,
    DescriptionTr,
}

impl TextField {
    pub const ALL: [TextField; 4] = [
        TextField::TitleEn,
        TextField::TitleTr,
        TextField::DescriptionEn,
        TextField::DescriptionTr,
    ];
}

impl FromStr for TextField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title_en" => Ok(TextField::TitleEn),
            "title_tr" => Ok(TextField::TitleTr),
            "description_en" | "desc_en" => Ok(TextField::DescriptionEn),
            "description_tr" | "desc_tr" => Ok(TextField::DescriptionTr),
            other => Err(format!("unknown field: {other}")),
        }
    }
}

/// Bilingual stock metadata for one media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub file_path: String,
    pub file_name: String,
    /// Set when the record is first created; generation never alters it.
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub title_en: String,
    #[serde(default)]
    pub title_tr: String,
    #[serde(default)]
    pub description_en: String,
    #[serde(default)]
    pub description_tr: String,
    #[serde(default)]
    pub adobe_keywords_en: Vec<String>,
    #[serde(default)]
    pub adobe_keywords_tr: Vec<String>,
    #[serde(default)]
    pub shutter_keywords_en: Vec<String>,
    #[serde(default)]
    pub shutter_keywords_tr: Vec<String>,
    #[serde(default)]
    pub istock_keywords_en: Vec<String>,
    #[serde(default)]
    pub istock_keywords_tr: Vec<String>,
    /// iStock EN list as last generated or learned from. Edits are diffed
    /// against it to derive new iStock map entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub istock_snapshot: Vec<String>,
}

impl MetadataRecord {
    /// An empty record for a freshly selected file.
    pub fn empty(file: &MediaFile, created_at: DateTime<Utc>) -> Self {
        Self {
            file_path: file.path.to_string_lossy().into_owned(),
            file_name: file.name.clone(),
            created_at,
            title_en: String::new(),
            title_tr: String::new(),
            description_en: String::new(),
            description_tr: String::new(),
            adobe_keywords_en: Vec::new(),
            adobe_keywords_tr: Vec::new(),
            shutter_keywords_en: Vec::new(),
            shutter_keywords_tr: Vec::new(),
            istock_keywords_en: Vec::new(),
            istock_keywords_tr: Vec::new(),
            istock_snapshot: Vec::new(),
        }
    }

    pub fn keywords(&self, platform: Platform, lang: Lang) -> &Vec<String> {
        match (platform, lang) {
            (Platform::Adobe, Lang::En) => &self.adobe_keywords_en,
            (Platform::Adobe, Lang::Tr) => &self.adobe_keywords_tr,
            (Platform::Shutter, Lang::En) => &self.shutter_keywords_en,
            (Platform::Shutter, Lang::Tr) => &self.shutter_keywords_tr,
            (Platform::IStock, Lang::En) => &self.istock_keywords_en,
            (Platform::IStock, Lang::Tr) => &self.istock_keywords_tr,
        }
    }

    pub fn keywords_mut(&mut self, platform: Platform, lang: Lang) -> &mut Vec<String> {
        match (platform, lang) {
            (Platform::Adobe, Lang::En) => &mut self.adobe_keywords_en,
            (Platform::Adobe, Lang::Tr) => &mut self.adobe_keywords_tr,
            (Platform::Shutter, Lang::En) => &mut self.shutter_keywords_en,
            (Platform::Shutter, Lang::Tr) => &mut self.shutter_keywords_tr,
            (Platform::IStock, Lang::En) => &mut self.istock_keywords_en,
            (Platform::IStock, Lang::Tr) => &mut self.istock_keywords_tr,
        }
    }

    pub fn text(&self, field: TextField) -> &str {
        match field {
            TextField::TitleEn => &self.title_en,
            TextField::TitleTr => &self.title_tr,
            TextField::DescriptionEn => &self.description_en,
            TextField::DescriptionTr => &self.description_tr,
        }
    }

    pub fn text_mut(&mut self, field: TextField) -> &mut String {
        match field {
            TextField::TitleEn => &mut self.title_en,
            TextField::TitleTr => &mut self.title_tr,
            TextField::DescriptionEn => &mut self.description_en,
            TextField::DescriptionTr => &mut self.description_tr,
        }
    }

    /// True when the record has a title or at least one keyword.
    pub fn has_content(&self) -> bool {
        let has_title = !self.title_en.trim().is_empty() || !self.title_tr.trim().is_empty();
        has_title
            || Platform::ALL.iter().any(|p| {
                [Lang::En, Lang::Tr]
                    .iter()
                    .any(|l| self.keywords(*p, *l).iter().any(|k| !k.trim().is_empty()))
            })
    }
}
