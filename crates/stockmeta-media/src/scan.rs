//! Folder scanning.

use std::path::Path;

use stockmeta_types::{MediaFile, MetadataError};

/// Supported media files directly inside `dir`, sorted by file name.
/// Subdirectories are not descended into.
pub async fn scan_folder(dir: &Path) -> Result<Vec<MediaFile>, MetadataError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let file = MediaFile::from_path(&entry.path())?;
        if file.kind.is_supported() {
            files.push(file);
        }
    }
    files.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    tracing::debug!(dir = %dir.display(), count = files.len(), "Folder scanned");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockmeta_types::MediaKind;

    #[tokio::test]
    async fn test_scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.JPG", "a.mp4", "notes.txt", "c.webp"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let files = scan_folder(dir.path()).await.unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.mp4", "b.JPG", "c.webp"]);
        assert_eq!(files[0].kind, MediaKind::Video);
    }

    #[tokio::test]
    async fn test_scan_missing_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan_folder(&dir.path().join("missing")).await.unwrap_err();
        assert!(matches!(err, MetadataError::Io(_)));
    }
}
