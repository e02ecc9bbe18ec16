//! Application state: settings, iStock map, per-file records, last error.
//!
//! All mutation goes through named operations on [`AppState`]. Each
//! operation that changes records or the iStock map persists the affected
//! blob before returning.

use chrono::Utc;

use stockmeta_config::Settings;
use stockmeta_storage::{RecordMap, StateStore};
use stockmeta_types::{
    FileId, IStockMap, Lang, MediaFile, MetadataError, MetadataRecord, Platform, TextField,
};

use crate::edit;
use crate::istock;
use crate::translate::Translator;

/// Which bilingual text pair to sync from Turkish to English.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncField {
    Title,
    Description,
}

impl SyncField {
    fn fields(self) -> (TextField, TextField) {
        match self {
            SyncField::Title => (TextField::TitleTr, TextField::TitleEn),
            SyncField::Description => (TextField::DescriptionTr, TextField::DescriptionEn),
        }
    }
}

pub struct AppState {
    settings: Settings,
    istock_map: IStockMap,
    records: RecordMap,
    last_error: Option<String>,
    store: StateStore,
}

impl AppState {
    /// Load the iStock map and records from `store`.
    pub async fn load(settings: Settings, store: StateStore) -> Result<Self, MetadataError> {
        let istock_map = store.load_istock_map().await?;
        let records = store.load_records().await?;
        tracing::debug!(
            records = records.len(),
            istock_entries = istock_map.len(),
            "State loaded"
        );
        Ok(Self {
            settings,
            istock_map,
            records,
            last_error: None,
            store,
        })
    }

    // ─── Accessors ───────────────────────────────────

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn istock_map(&self) -> &IStockMap {
        &self.istock_map
    }

    pub fn records(&self) -> &RecordMap {
        &self.records
    }

    pub fn record(&self, id: &FileId) -> Option<&MetadataRecord> {
        self.records.get(id)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Replace the settings held for this session. Saving them to disk is
    /// the caller's concern.
    pub fn update_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    // ─── Records ───────────────────────────────────

    /// Ensure a record exists for `file`, creating an empty one stamped now.
    pub async fn select_file(&mut self, file: &MediaFile) -> Result<&MetadataRecord, MetadataError> {
        let id = file.id();
        if !self.records.contains_key(&id) {
            self.records
                .insert(id.clone(), MetadataRecord::empty(file, Utc::now()));
            self.persist_records().await?;
        }
        self.records
            .get(&id)
            .ok_or_else(|| MetadataError::Storage(format!("record {id} vanished")))
    }

    /// Store a freshly generated record, keeping the existing `created_at`.
    pub async fn store_generated(
        &mut self,
        id: FileId,
        mut record: MetadataRecord,
    ) -> Result<(), MetadataError> {
        if let Some(existing) = self.records.get(&id) {
            record.created_at = existing.created_at;
        }
        self.records.insert(id, record);
        self.persist_records().await
    }

    pub async fn set_text(
        &mut self,
        id: &FileId,
        field: TextField,
        value: &str,
    ) -> Result<(), MetadataError> {
        let record = self.record_mut(id)?;
        *record.text_mut(field) = value.trim().to_string();
        self.persist_records().await
    }

    pub async fn set_keywords(
        &mut self,
        id: &FileId,
        platform: Platform,
        lang: Lang,
        terms: &[String],
    ) -> Result<(), MetadataError> {
        let record = self.record_mut(id)?;
        edit::set_keywords(record, platform, lang, terms);
        self.persist_records().await
    }

    /// Case-insensitive find & replace across `ids`, or every record when
    /// `ids` is empty. Returns the number of changed fields and entries.
    pub async fn find_replace(
        &mut self,
        ids: &[FileId],
        find: &str,
        replacement: &str,
    ) -> Result<usize, MetadataError> {
        let pattern = edit::replace_pattern(find)?;
        let mut changed = 0;
        for (id, record) in self.records.iter_mut() {
            if !ids.is_empty() && !ids.contains(id) {
                continue;
            }
            changed += edit::find_replace(record, &pattern, replacement);
        }
        if changed > 0 {
            self.persist_records().await?;
        }
        tracing::info!(find, changed, "Find and replace applied");
        Ok(changed)
    }

    /// Overwrite the English title or description with a translation of
    /// the Turkish one. Returns the new English text.
    pub async fn sync_to_english(
        &mut self,
        id: &FileId,
        field: SyncField,
        translator: &Translator<'_>,
    ) -> Result<String, MetadataError> {
        let (source, target) = field.fields();
        let text = self.record_mut(id)?.text(source).to_string();
        if text.trim().is_empty() {
            return Err(MetadataError::Validation(format!(
                "{source:?} is empty, nothing to translate"
            )));
        }
        let translated = translator.translate_text(&text, Lang::En).await?;
        *self.record_mut(id)?.text_mut(target) = translated.clone();
        self.persist_records().await?;
        Ok(translated)
    }

    /// Clear all records. The iStock map and settings are kept.
    pub async fn reset(&mut self) -> Result<(), MetadataError> {
        self.records.clear();
        self.last_error = None;
        self.store.clear_records().await?;
        tracing::info!("Session reset");
        Ok(())
    }

    // ─── iStock map ───────────────────────────────────

    pub async fn istock_set(&mut self, generic: &str, preferred: &str) -> Result<(), MetadataError> {
        let key = istock::map_key(generic);
        let value = preferred.trim();
        if key.is_empty() || value.is_empty() {
            return Err(MetadataError::Validation(
                "both the generic term and its iStock term are required".into(),
            ));
        }
        self.istock_map.insert(key, value.to_string());
        self.persist_istock().await
    }

    /// Returns whether an entry was removed.
    pub async fn istock_remove(&mut self, generic: &str) -> Result<bool, MetadataError> {
        let removed = self.istock_map.remove(&istock::map_key(generic)).is_some();
        if removed {
            self.persist_istock().await?;
        }
        Ok(removed)
    }

    /// Derive map entries from the user's edits to a record's iStock list
    /// and reset its snapshot. Returns the number of entries added or changed.
    pub async fn learn_istock(&mut self, id: &FileId) -> Result<usize, MetadataError> {
        let record = self.record_mut(id)?;
        let learned = istock::learn(&record.istock_keywords_en, &record.istock_snapshot);
        record.istock_snapshot = record.istock_keywords_en.clone();

        let mut count = 0;
        for (key, value) in learned {
            if self.istock_map.get(&key) != Some(&value) {
                self.istock_map.insert(key, value);
                count += 1;
            }
        }
        if count > 0 {
            self.persist_istock().await?;
        }
        self.persist_records().await?;
        tracing::info!(file = %id, learned = count, "iStock terms learned");
        Ok(count)
    }

    /// Re-apply the iStock map to a record's iStock list.
    pub async fn apply_istock(&mut self, id: &FileId) -> Result<(), MetadataError> {
        let map = self.istock_map.clone();
        let record = self.record_mut(id)?;
        let (en, tr) = istock::remap_pairs(
            &record.istock_keywords_en,
            &record.istock_keywords_tr,
            &map,
            Platform::IStock.cap(),
        );
        record.istock_keywords_en = en;
        record.istock_keywords_tr = tr;
        self.persist_records().await
    }

    // ─── Persistence ───────────────────────────────────

    fn record_mut(&mut self, id: &FileId) -> Result<&mut MetadataRecord, MetadataError> {
        self.records
            .get_mut(id)
            .ok_or_else(|| MetadataError::Validation(format!("no record for {id}")))
    }

    async fn persist_records(&self) -> Result<(), MetadataError> {
        self.store.save_records(&self.records).await?;
        Ok(())
    }

    async fn persist_istock(&self) -> Result<(), MetadataError> {
        self.store.save_istock_map(&self.istock_map).await?;
        Ok(())
    }
}
