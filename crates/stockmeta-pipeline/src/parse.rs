//! Parsing of free-form provider replies into typed results.
//!
//! Models are asked for a specific shape but routinely wrap it in prose,
//! code fences or numbering. Each expected shape has its own variant of
//! [`ProviderReply`] and its own cleanup rules.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use stockmeta_types::MetadataError;
use stockmeta_types::json::balanced_objects;

/// Longest accepted keyword, in words. Longer pieces are sentences.
const MAX_KEYWORD_WORDS: usize = 6;

static LEADING_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\d+[.)]|[-*•·])\s+").expect("valid regex"));

/// An intro clause such as `Keywords:` or `**Here they are:**` opening the reply.
static INTRO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[^,;\n:]*:[*_]*(?:\s+|$)").expect("valid regex"));

static NUMBERED_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s*[.):\-]\s*(.*?)\s*$").expect("valid regex"));

/// Shape a reply is expected to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// One JSON object, possibly surrounded by text.
    Object,
    /// Comma-separated keywords.
    KeywordLine,
    /// `N. text` lines.
    NumberedLines,
}

/// A provider reply after shape-specific cleanup.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderReply {
    Object(serde_json::Value),
    KeywordLine(Vec<String>),
    /// Ordinal (1-based, as written by the model) to text.
    NumberedLines(BTreeMap<usize, String>),
}

impl ProviderReply {
    /// Parse `raw` as `kind`. Only `Object` can fail; the list shapes yield
    /// empty collections instead.
    pub fn parse(kind: ReplyKind, raw: &str) -> Result<Self, MetadataError> {
        match kind {
            ReplyKind::Object => balanced_objects(raw)
                .find_map(|candidate| {
                    serde_json::from_str::<serde_json::Value>(candidate)
                        .ok()
                        .filter(|v| v.is_object())
                })
                .map(ProviderReply::Object)
                .ok_or_else(|| MetadataError::parse("JSON object", raw)),
            ReplyKind::KeywordLine => Ok(ProviderReply::KeywordLine(parse_keyword_line(raw))),
            ReplyKind::NumberedLines => Ok(ProviderReply::NumberedLines(parse_numbered_lines(raw))),
        }
    }
}

/// Title and description in both languages.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TextFields {
    #[serde(default)]
    pub title_en: String,
    #[serde(default)]
    pub title_tr: String,
    #[serde(default)]
    pub description_en: String,
    #[serde(default)]
    pub description_tr: String,
}

impl TextFields {
    /// Parse the metadata reply. A reply without any usable field is an error.
    pub fn from_reply(raw: &str) -> Result<Self, MetadataError> {
        let ProviderReply::Object(value) = ProviderReply::parse(ReplyKind::Object, raw)? else {
            return Err(MetadataError::parse("title/description", raw));
        };
        let mut fields: TextFields = serde_json::from_value(value)
            .map_err(|_| MetadataError::parse("title/description", raw))?;
        for text in [
            &mut fields.title_en,
            &mut fields.title_tr,
            &mut fields.description_en,
            &mut fields.description_tr,
        ] {
            *text = text.trim().to_string();
        }
        if fields.title_en.is_empty() && fields.description_en.is_empty() {
            return Err(MetadataError::parse("title/description", raw));
        }
        Ok(fields)
    }
}

/// Split a keyword reply into clean terms, in order, without duplicates.
///
/// Newlines and semicolons count as separators. An intro clause that opens
/// the reply and ends in a colon is dropped. Numbering and bullets are
/// removed only when whitespace follows them, so terms such as
/// `24-hour service` or `16:9 aspect` survive.
pub fn parse_keyword_line(raw: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let body = INTRO.replace(raw, "");
    body.split([',', '\n', ';'])
        .filter_map(clean_keyword)
        .filter(|k| seen.insert(k.to_lowercase()))
        .collect()
}

fn clean_keyword(piece: &str) -> Option<String> {
    let piece = LEADING_MARKER.replace(piece, "");
    let piece = piece
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '*' | '_' | '[' | ']' | '.'))
        .trim();
    let words: Vec<&str> = piece.split_whitespace().collect();
    if words.is_empty() || words.len() > MAX_KEYWORD_WORDS {
        return None;
    }
    Some(words.join(" "))
}

/// Collect `N. text` lines. The first occurrence of an ordinal wins; lines
/// without a leading ordinal are ignored.
pub fn parse_numbered_lines(raw: &str) -> BTreeMap<usize, String> {
    let mut out = BTreeMap::new();
    for line in raw.lines() {
        let Some(caps) = NUMBERED_LINE.captures(line) else {
            continue;
        };
        let Ok(ordinal) = caps[1].parse::<usize>() else {
            continue;
        };
        let text = caps[2]
            .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '*'))
            .trim()
            .to_string();
        out.entry(ordinal).or_insert(text);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_fields_inside_prose() {
        let raw = "Sure! Here it is:\n```json\n{\"title_en\": \" Sunset over sea \", \"title_tr\": \"Deniz üzerinde gün batımı\", \"description_en\": \"Warm light\", \"description_tr\": \"Sıcak ışık\"}\n```";
        let fields = TextFields::from_reply(raw).unwrap();
        assert_eq!(fields.title_en, "Sunset over sea");
        assert_eq!(fields.description_tr, "Sıcak ışık");
    }

    #[test]
    fn test_text_fields_skip_non_json_braces() {
        let raw = "Note {draft} then {\"title_en\": \"Cat\", \"description_en\": \"A cat\"}";
        let fields = TextFields::from_reply(raw).unwrap();
        assert_eq!(fields.title_en, "Cat");
        assert_eq!(fields.title_tr, "");
    }

    #[test]
    fn test_text_fields_error_keeps_snippet() {
        let err = TextFields::from_reply("I cannot describe this image.").unwrap_err();
        match err {
            MetadataError::Parse { snippet, .. } => assert!(snippet.contains("cannot describe")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(TextFields::from_reply("{\"foo\": 1}").is_err());
    }

    #[test]
    fn test_keyword_line_cleanup() {
        let raw = "Here are the keywords: 1. Beach, 2) sunset, \"Sea\", - travel\n* summer; beach";
        assert_eq!(
            parse_keyword_line(raw),
            vec!["Beach", "sunset", "Sea", "travel", "summer"]
        );
    }

    #[test]
    fn test_keyword_line_keeps_numeric_terms() {
        let raw = "24-hour service, 3-d printing, 16:9 aspect, 1.5 liter bottle, 1. beach";
        assert_eq!(
            parse_keyword_line(raw),
            vec!["24-hour service", "3-d printing", "16:9 aspect", "1.5 liter bottle", "beach"]
        );
    }

    #[test]
    fn test_keyword_line_markdown_intro() {
        let raw = "**Keywords:** harbor, boat";
        assert_eq!(parse_keyword_line(raw), vec!["harbor", "boat"]);
    }

    #[test]
    fn test_keyword_line_drops_sentences() {
        let raw = "woman, this image shows a woman standing near the old harbor at dusk, harbor";
        assert_eq!(parse_keyword_line(raw), vec!["woman", "harbor"]);
    }

    #[test]
    fn test_keyword_line_intro_on_own_line() {
        let raw = "Keywords for Adobe Stock:\nmountain, lake , , forest.";
        assert_eq!(parse_keyword_line(raw), vec!["mountain", "lake", "forest"]);
    }

    #[test]
    fn test_numbered_lines() {
        let raw = "Here you go:\n1. deniz\n2) kum\n 4 - \"güneş\"\n2. tekrar\nnot a line";
        let lines = parse_numbered_lines(raw);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[&1], "deniz");
        assert_eq!(lines[&2], "kum");
        assert_eq!(lines[&4], "güneş");
        assert!(!lines.contains_key(&3));
    }

    #[test]
    fn test_reply_kinds() {
        assert!(matches!(
            ProviderReply::parse(ReplyKind::KeywordLine, "a, b").unwrap(),
            ProviderReply::KeywordLine(v) if v.len() == 2
        ));
        assert!(ProviderReply::parse(ReplyKind::Object, "no json").is_err());
        assert!(matches!(
            ProviderReply::parse(ReplyKind::NumberedLines, "").unwrap(),
            ProviderReply::NumberedLines(m) if m.is_empty()
        ));
    }
}
