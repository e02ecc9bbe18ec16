use std::path::Path;

use anyhow::{Context, Result};

use stockmeta_config::Settings;
use stockmeta_media::KeywordScorer;
use stockmeta_media::providers::{ChatCompletionsProvider, EverypixelScorer};
use stockmeta_pipeline::AppState;
use stockmeta_storage::StateStore;
use stockmeta_types::{FileId, MediaFile};

/// Load settings and open the persisted state.
pub async fn open_state() -> Result<AppState> {
    let settings = stockmeta_config::load_settings().context("Failed to load settings")?;
    let db = stockmeta_config::state_db_path()?;
    let store = StateStore::open(&db)
        .with_context(|| format!("Failed to open state store {}", db.display()))?;
    AppState::load(settings, store)
        .await
        .context("Failed to load state")
}

/// Describe a file given on the command line.
pub fn media_file(path: &Path) -> Result<MediaFile> {
    MediaFile::from_path(path).with_context(|| format!("Cannot read {}", path.display()))
}

pub fn file_id(path: &Path) -> Result<FileId> {
    Ok(media_file(path)?.id())
}

/// HTTP providers built from the settings.
pub struct Providers {
    pub vision: ChatCompletionsProvider,
    pub scorer: Option<EverypixelScorer>,
}

impl Providers {
    pub fn from_settings(settings: &Settings) -> Self {
        let scorer = settings.has_keyword_service().then(|| {
            EverypixelScorer::new(
                settings.everypixel_id.trim().to_string(),
                settings.everypixel_secret.trim().to_string(),
                settings.keyword_service.clone(),
            )
        });
        if scorer.is_none() {
            tracing::info!("Keyword scoring not configured, using vision keywords only");
        }
        Self {
            vision: ChatCompletionsProvider::new(
                settings.groq_api_key.trim().to_string(),
                settings.provider.clone(),
            ),
            scorer,
        }
    }

    pub fn scorer(&self) -> Option<&dyn KeywordScorer> {
        self.scorer.as_ref().map(|s| s as &dyn KeywordScorer)
    }
}
