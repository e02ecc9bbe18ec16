//! Per-file metadata synthesis.

use chrono::{DateTime, Utc};

use stockmeta_media::{CompletionRequest, KeywordScorer, MediaNormalizer, Sample, VisionProvider};
use stockmeta_types::{IStockMap, Lang, MediaFile, MetadataError, MetadataRecord, Platform};

use crate::istock;
use crate::keywords::{KeywordAcquirer, ScoringPayload};
use crate::parse::TextFields;
use crate::prompts::{METADATA_MAX_TOKENS, metadata_prompt};
use crate::translate::Translator;

/// Builds a complete [`MetadataRecord`] for one file.
pub struct Synthesizer<'a> {
    normalizer: &'a MediaNormalizer,
    vision: &'a dyn VisionProvider,
    scorer: Option<&'a dyn KeywordScorer>,
}

impl<'a> Synthesizer<'a> {
    pub fn new(
        normalizer: &'a MediaNormalizer,
        vision: &'a dyn VisionProvider,
        scorer: Option<&'a dyn KeywordScorer>,
    ) -> Self {
        Self {
            normalizer,
            vision,
            scorer,
        }
    }

    /// Generate every field of the record for `file`.
    ///
    /// The title/description request and the three keyword acquisitions run
    /// concurrently; the first failure among them fails the file. The three
    /// translations then run concurrently and never fail. `created_at` is
    /// carried over unchanged.
    pub async fn synthesize(
        &self,
        file: &MediaFile,
        hint: &str,
        istock_map: &IStockMap,
        created_at: DateTime<Utc>,
    ) -> Result<MetadataRecord, MetadataError> {
        if !file.kind.is_supported() {
            return Err(MetadataError::UnsupportedMedia(file.name.clone()));
        }

        let sample = self.normalizer.sample(file).await?;
        let payload = self.scoring_payload(file, &sample).await;

        let acquirer = KeywordAcquirer::new(self.vision, self.scorer);
        let (text, adobe_en, shutter_en, istock_raw) = futures::try_join!(
            self.text_fields(&sample, hint),
            acquirer.acquire(&sample, payload.as_ref(), Platform::Adobe, hint),
            acquirer.acquire(&sample, payload.as_ref(), Platform::Shutter, hint),
            acquirer.acquire(&sample, payload.as_ref(), Platform::IStock, hint),
        )?;

        let istock_en = istock::remap(&istock_raw, istock_map, Platform::IStock.cap());

        let translator = Translator::new(self.vision).with_hint(hint);
        let (adobe_tr, shutter_tr, istock_tr) = futures::join!(
            translator.translate_terms(&adobe_en, Lang::Tr),
            translator.translate_terms(&shutter_en, Lang::Tr),
            translator.translate_terms(&istock_en, Lang::Tr),
        );

        tracing::info!(
            file = %file.name,
            adobe = adobe_en.len(),
            shutter = shutter_en.len(),
            istock = istock_en.len(),
            "Metadata generated"
        );

        let mut record = MetadataRecord::empty(file, created_at);
        record.title_en = text.title_en;
        record.title_tr = text.title_tr;
        record.description_en = text.description_en;
        record.description_tr = text.description_tr;
        record.adobe_keywords_en = adobe_en;
        record.adobe_keywords_tr = adobe_tr;
        record.shutter_keywords_en = shutter_en;
        record.shutter_keywords_tr = shutter_tr;
        record.istock_snapshot = istock_en.clone();
        record.istock_keywords_en = istock_en;
        record.istock_keywords_tr = istock_tr;
        Ok(record)
    }

    async fn text_fields(&self, sample: &Sample, hint: &str) -> Result<TextFields, MetadataError> {
        let request = CompletionRequest::vision(sample, metadata_prompt(hint), METADATA_MAX_TOKENS);
        let raw = self.vision.complete(request).await?;
        TextFields::from_reply(&raw)
    }

    /// Scorer input, or `None` when no scorer is configured or the bytes
    /// cannot be read. Either way generation continues without scoring.
    async fn scoring_payload(&self, file: &MediaFile, sample: &Sample) -> Option<ScoringPayload> {
        self.scorer?;
        match self.normalizer.scoring_payload(file, sample).await {
            Ok(data) => Some(ScoringPayload {
                data,
                file_name: file.name.clone(),
            }),
            Err(e) => {
                tracing::warn!(file = %file.name, "Cannot prepare keyword scoring input: {e}");
                None
            }
        }
    }
}
