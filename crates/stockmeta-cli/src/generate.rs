use std::path::PathBuf;

use anyhow::{Context, Result};

use stockmeta_media::MediaNormalizer;
use stockmeta_media::thumbnail::{
    PREVIEW_SIZE, THUMB_SIZE, ThumbnailCache, ThumbnailQueue, generate_thumbnails,
};
use stockmeta_pipeline::{BatchError, Synthesizer, run_batch};

use crate::context::{Providers, media_file, open_state};

/// Select every supported file in `folder` and remember it as the save directory.
pub async fn run_scan(folder: PathBuf) -> Result<()> {
    let files = stockmeta_media::scan_folder(&folder)
        .await
        .with_context(|| format!("Failed to scan {}", folder.display()))?;

    let mut state = open_state().await?;
    for file in &files {
        let record = state.select_file(file).await?;
        let status = if record.has_content() { "done" } else { "new" };
        println!("  [{status}] {} ({:?})", file.name, file.kind);
    }
    println!("{} supported file(s) in {}", files.len(), folder.display());

    remember_save_dir(&folder)?;
    Ok(())
}

/// Generate metadata for the given files and/or folder.
pub async fn run_generate(paths: Vec<PathBuf>, folder: Option<PathBuf>, hint: String) -> Result<()> {
    let mut files = paths
        .iter()
        .map(|p| media_file(p))
        .collect::<Result<Vec<_>>>()?;
    if let Some(folder) = &folder {
        let found = stockmeta_media::scan_folder(folder)
            .await
            .with_context(|| format!("Failed to scan {}", folder.display()))?;
        files.extend(found);
        remember_save_dir(folder)?;
    }

    let mut state = open_state().await?;
    for file in files.iter().filter(|f| f.kind.is_supported()) {
        state.select_file(file).await?;
    }

    let providers = Providers::from_settings(state.settings());
    let normalizer = MediaNormalizer::default();
    let synth = Synthesizer::new(&normalizer, &providers.vision, providers.scorer());

    let names: Vec<&str> = files
        .iter()
        .filter(|f| f.kind.is_supported())
        .map(|f| f.name.as_str())
        .collect();
    let outcome = run_batch(&mut state, &synth, &files, &hint, |progress| {
        let name = names.get(progress.current_index).copied().unwrap_or_default();
        eprintln!("[{progress}] {name}");
    })
    .await;

    match outcome {
        Ok(summary) => {
            println!("Generated metadata for {} file(s)", summary.completed.len());
            Ok(())
        }
        Err(BatchError::File { completed, .. }) if !completed.is_empty() => {
            println!("Generated metadata for {} file(s) before the failure", completed.len());
            Err(anyhow::anyhow!(state.last_error().unwrap_or("batch failed").to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Render thumbnails for every supported file in `folder`.
pub async fn run_thumbs(folder: PathBuf, preview: bool) -> Result<()> {
    let settings = stockmeta_config::load_settings().context("Failed to load settings")?;
    let files = stockmeta_media::scan_folder(&folder)
        .await
        .with_context(|| format!("Failed to scan {}", folder.display()))?;

    let cache = ThumbnailCache::new(stockmeta_config::thumbnail_dir()?);
    let queue = ThumbnailQueue::new(settings.thumbnail_concurrency);
    let normalizer = MediaNormalizer::default();
    let size = if preview { PREVIEW_SIZE } else { THUMB_SIZE };

    let results = generate_thumbnails(&files, &cache, &normalizer, &queue, size).await;
    let mut failed = 0;
    for (file, result) in files.iter().zip(results) {
        match result {
            Ok(path) => println!("  {} -> {}", file.name, path.display()),
            Err(e) => {
                failed += 1;
                println!("  {} failed: {e}", file.name);
            }
        }
    }
    println!(
        "{} thumbnail(s), {failed} failed, cache {}",
        files.len() - failed,
        cache.dir().display()
    );
    Ok(())
}

/// Persist `folder` as the default export location. Environment overrides
/// are not written back.
fn remember_save_dir(folder: &std::path::Path) -> Result<()> {
    let path = stockmeta_config::settings_file_path()?;
    let mut settings = stockmeta_config::load_settings_from(&path)?;
    let folder = folder.canonicalize().unwrap_or_else(|_| folder.to_path_buf());
    if settings.save_dir.as_deref() != Some(folder.as_path()) {
        settings.save_dir = Some(folder);
        stockmeta_config::save_settings(&settings).context("Failed to save settings")?;
    }
    Ok(())
}
