//! CSV export of metadata records.

use std::borrow::Cow;
use std::path::Path;

use stockmeta_types::{Lang, MetadataRecord, Platform};

/// Fixed export columns.
pub const CSV_HEADER: [&str; 13] = [
    "file_path",
    "file_name",
    "created_at",
    "title_en",
    "title_tr",
    "description_en",
    "description_tr",
    "adobe_keywords_en",
    "adobe_keywords_tr",
    "shutter_keywords_en",
    "shutter_keywords_tr",
    "istock_keywords_en",
    "istock_keywords_tr",
];

/// File name used when exporting into a media folder.
pub const DEFAULT_EXPORT_NAME: &str = "_metadata.csv";

/// Render records as CSV. Records without a title or keyword are skipped.
pub fn render_csv<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a MetadataRecord>,
{
    let mut out = String::new();
    push_row(&mut out, CSV_HEADER.iter().map(|h| Cow::Borrowed(*h)));
    for rec in records.into_iter().filter(|r| r.has_content()) {
        push_row(&mut out, record_cells(rec).into_iter());
    }
    out
}

/// Write records to `path`. Returns the number of data rows.
pub fn write_csv<'a, I>(path: &Path, records: I) -> std::io::Result<usize>
where
    I: IntoIterator<Item = &'a MetadataRecord>,
{
    let records: Vec<&MetadataRecord> = records.into_iter().collect();
    let rows = records.iter().filter(|r| r.has_content()).count();
    std::fs::write(path, render_csv(records))?;
    tracing::info!(rows, path = %path.display(), "CSV exported");
    Ok(rows)
}

fn record_cells(rec: &MetadataRecord) -> Vec<Cow<'_, str>> {
    let mut cells = vec![
        Cow::Borrowed(rec.file_path.as_str()),
        Cow::Borrowed(rec.file_name.as_str()),
        Cow::Owned(rec.created_at.format("%Y-%m-%d %H:%M").to_string()),
        Cow::Borrowed(rec.title_en.as_str()),
        Cow::Borrowed(rec.title_tr.as_str()),
        Cow::Borrowed(rec.description_en.as_str()),
        Cow::Borrowed(rec.description_tr.as_str()),
    ];
    for platform in Platform::ALL {
        for lang in [Lang::En, Lang::Tr] {
            cells.push(Cow::Owned(join_keywords(rec.keywords(platform, lang))));
        }
    }
    cells
}

/// Comma-space join with blank entries dropped.
pub fn join_keywords(list: &[String]) -> String {
    list.iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = Cow<'a, str>>) {
    let mut first = true;
    for cell in cells {
        if !first {
            out.push(',');
        }
        first = false;
        out.push_str(&escape_field(&cell));
    }
    out.push_str("\r\n");
}

/// Quote a field containing a comma, quote or newline; inner quotes are doubled.
pub fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use stockmeta_types::{MediaFile, MediaKind};

    fn record() -> MetadataRecord {
        let file = MediaFile {
            path: "/photos/beach.jpg".into(),
            name: "beach.jpg".into(),
            size: 1,
            modified_ms: 0,
            kind: MediaKind::Image,
        };
        let created = chrono::Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        MetadataRecord::empty(&file, created)
    }

    #[test]
    fn test_header_only_when_empty() {
        let csv = render_csv([&record()]);
        assert_eq!(csv.matches("\r\n").count(), 1);
        assert!(csv.starts_with("file_path,file_name,created_at,title_en"));
        assert!(csv.trim_end().ends_with("istock_keywords_tr"));
    }

    #[test]
    fn test_description_with_comma_is_quoted() {
        let mut rec = record();
        rec.title_en = "Beach".into();
        rec.description_en = "Sunny beach, with \"golden\" sand".into();
        let csv = render_csv([&rec]);
        let row = csv.split("\r\n").nth(1).unwrap();
        assert!(row.contains("\"Sunny beach, with \"\"golden\"\" sand\""));
        assert!(row.contains(",2024-05-01 09:30,"));
    }

    #[test]
    fn test_keywords_joined_without_blanks() {
        let mut rec = record();
        rec.adobe_keywords_en = vec!["sea".into(), " ".into(), "sand".into()];
        rec.adobe_keywords_tr = vec!["deniz".into(), String::new(), "kum".into()];
        let csv = render_csv([&rec]);
        let row = csv.split("\r\n").nth(1).unwrap();
        assert!(row.contains("\"sea, sand\",\"deniz, kum\""));
    }

    #[test]
    fn test_rows_end_with_crlf() {
        let mut rec = record();
        rec.title_tr = "Plaj".into();
        let csv = render_csv([&rec]);
        assert!(csv.ends_with("\r\n"));
        assert_eq!(csv.split("\r\n").count(), 3);
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a\nb"), "\"a\nb\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_write_csv_counts_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_EXPORT_NAME);
        let mut filled = record();
        filled.shutter_keywords_en = vec!["wave".into()];
        let rows = write_csv(&path, [&filled, &record()]).unwrap();
        assert_eq!(rows, 1);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("wave"));
    }
}
