//! Sequential batch generation over a file selection.

use std::fmt;

use chrono::Utc;

use stockmeta_types::{FileId, MediaFile, MetadataError};

use crate::state::AppState;
use crate::synthesize::Synthesizer;

/// Progress notification, sent before each file starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// Zero-based position in the eligible files.
    pub current_index: usize,
    pub total: usize,
}

impl fmt::Display for BatchProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.current_index + 1, self.total)
    }
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Files generated and persisted, in processing order.
    pub completed: Vec<FileId>,
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// The batch was rejected before any file was processed.
    #[error(transparent)]
    Rejected(MetadataError),
    /// A file failed; the batch stopped there. Earlier files were kept.
    #[error("{file_name} ({}/{}): {source}", .index + 1, .total)]
    File {
        index: usize,
        total: usize,
        file_name: String,
        completed: Vec<FileId>,
        source: MetadataError,
    },
}

/// Generate metadata for each supported file in `files`, one at a time.
///
/// Unsupported files are skipped. The batch is rejected when no file is
/// eligible or no API key is configured. Each success is stored before the
/// next file starts; the first failure stops the batch and is recorded as
/// the state's last error.
pub async fn run_batch<F>(
    state: &mut AppState,
    synth: &Synthesizer<'_>,
    files: &[MediaFile],
    hint: &str,
    mut on_progress: F,
) -> Result<BatchSummary, BatchError>
where
    F: FnMut(BatchProgress),
{
    state.clear_error();

    let eligible: Vec<&MediaFile> = files.iter().filter(|f| f.kind.is_supported()).collect();
    if eligible.is_empty() {
        return Err(reject(state, "No supported file selected"));
    }
    if !state.settings().has_api_key() {
        return Err(reject(state, "API key is missing"));
    }

    let total = eligible.len();
    let mut summary = BatchSummary::default();
    tracing::info!(total, skipped = files.len() - total, "Batch started");

    for (index, file) in eligible.into_iter().enumerate() {
        on_progress(BatchProgress {
            current_index: index,
            total,
        });

        let id = file.id();
        let created_at = state
            .record(&id)
            .map(|r| r.created_at)
            .unwrap_or_else(Utc::now);

        let generated = synth
            .synthesize(file, hint, state.istock_map(), created_at)
            .await;
        let result = match generated {
            Ok(record) => state.store_generated(id.clone(), record).await,
            Err(e) => Err(e),
        };

        if let Err(source) = result {
            tracing::error!(file = %file.name, index, "Generation failed: {source}");
            let err = BatchError::File {
                index,
                total,
                file_name: file.name.clone(),
                completed: summary.completed,
                source,
            };
            state.set_error(err.to_string());
            return Err(err);
        }
        summary.completed.push(id);
    }

    tracing::info!(completed = summary.completed.len(), "Batch finished");
    Ok(summary)
}

fn reject(state: &mut AppState, message: &str) -> BatchError {
    let err = MetadataError::Validation(message.to_string());
    state.set_error(err.to_string());
    BatchError::Rejected(err)
}
