//! Record edits that keep EN/TR keyword lists aligned.

use std::collections::HashSet;

use regex::{NoExpand, Regex, RegexBuilder};

use stockmeta_types::{Lang, MetadataError, MetadataRecord, Platform, TextField};

/// Deduplicate an aligned pair of lists by their EN side.
///
/// Blank or repeated EN terms drop the whole pair. A missing or blank TR
/// entry falls back to the EN term. At most `cap` pairs are kept.
pub fn dedupe_pairs(en: &[String], tr: &[String], cap: usize) -> (Vec<String>, Vec<String>) {
    let mut seen = HashSet::new();
    let mut out_en = Vec::new();
    let mut out_tr = Vec::new();
    for (i, term) in en.iter().enumerate() {
        if out_en.len() >= cap {
            break;
        }
        let term = term.trim();
        if term.is_empty() || !seen.insert(term.to_lowercase()) {
            continue;
        }
        let translated = tr.get(i).map(|t| t.trim()).filter(|t| !t.is_empty());
        out_en.push(term.to_string());
        out_tr.push(translated.unwrap_or(term).to_string());
    }
    (out_en, out_tr)
}

/// Replace one keyword list of `record`.
///
/// Setting the EN list reuses existing translations of terms that were
/// already present. Setting the TR list forces it to the EN list's length.
pub fn set_keywords(record: &mut MetadataRecord, platform: Platform, lang: Lang, terms: &[String]) {
    let cap = platform.cap();
    match lang {
        Lang::En => {
            let old_en = record.keywords(platform, Lang::En).clone();
            let old_tr = record.keywords(platform, Lang::Tr).clone();
            let carried: Vec<String> = terms
                .iter()
                .map(|term| {
                    let key = term.trim().to_lowercase();
                    old_en
                        .iter()
                        .position(|e| e.trim().to_lowercase() == key)
                        .and_then(|j| old_tr.get(j).cloned())
                        .unwrap_or_default()
                })
                .collect();
            let (en, tr) = dedupe_pairs(terms, &carried, cap);
            *record.keywords_mut(platform, Lang::En) = en;
            *record.keywords_mut(platform, Lang::Tr) = tr;
        }
        Lang::Tr => {
            let en = record.keywords(platform, Lang::En).clone();
            let tr = en
                .iter()
                .enumerate()
                .map(|(i, e)| {
                    terms
                        .get(i)
                        .map(|t| t.trim())
                        .filter(|t| !t.is_empty())
                        .unwrap_or(e.as_str())
                        .to_string()
                })
                .collect();
            *record.keywords_mut(platform, Lang::Tr) = tr;
        }
    }
}

/// Case-insensitive literal pattern for find & replace.
pub fn replace_pattern(find: &str) -> Result<Regex, MetadataError> {
    if find.trim().is_empty() {
        return Err(MetadataError::Validation("search text is empty".into()));
    }
    RegexBuilder::new(&regex::escape(find))
        .case_insensitive(true)
        .build()
        .map_err(|e| MetadataError::Validation(format!("invalid search text: {e}")))
}

/// Replace every match in the text fields and keyword entries of `record`.
/// Returns how many fields or entries changed.
pub fn find_replace(record: &mut MetadataRecord, pattern: &Regex, replacement: &str) -> usize {
    let mut changed = 0;

    for field in TextField::ALL {
        let text = record.text_mut(field);
        if pattern.is_match(text) {
            *text = pattern.replace_all(text, NoExpand(replacement)).into_owned();
            changed += 1;
        }
    }

    for platform in Platform::ALL {
        let mut lists = [Lang::En, Lang::Tr].map(|lang| record.keywords(platform, lang).clone());
        for list in lists.iter_mut() {
            for term in list.iter_mut() {
                if pattern.is_match(term) {
                    *term = pattern.replace_all(term, NoExpand(replacement)).into_owned();
                    changed += 1;
                }
            }
        }
        let [en, tr] = lists;
        let (en, tr) = dedupe_pairs(&en, &tr, platform.cap());
        *record.keywords_mut(platform, Lang::En) = en;
        *record.keywords_mut(platform, Lang::Tr) = tr;
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stockmeta_types::{MediaFile, MediaKind};

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn record() -> MetadataRecord {
        let file = MediaFile {
            path: "/photos/apple.jpg".into(),
            name: "apple.jpg".into(),
            size: 1,
            modified_ms: 0,
            kind: MediaKind::Image,
        };
        let mut rec = MetadataRecord::empty(&file, Utc::now());
        rec.title_en = "Red Apple on table".into();
        rec.description_en = "An apple, a red apple".into();
        rec.adobe_keywords_en = list(&["apple", "red apple", "fruit"]);
        rec.adobe_keywords_tr = list(&["elma", "kırmızı elma", "meyve"]);
        rec
    }

    #[test]
    fn test_dedupe_pairs_fills_missing_translation() {
        let (en, tr) = dedupe_pairs(&list(&["a", "A", "", "b", "c"]), &list(&["x", "y", "z"]), 10);
        assert_eq!(en, vec!["a", "b", "c"]);
        assert_eq!(tr, vec!["x", "b", "c"]);
    }

    #[test]
    fn test_set_en_keywords_carries_translations() {
        let mut rec = record();
        set_keywords(&mut rec, Platform::Adobe, Lang::En, &list(&["Fruit", "orchard", "apple"]));
        assert_eq!(rec.adobe_keywords_en, vec!["Fruit", "orchard", "apple"]);
        assert_eq!(rec.adobe_keywords_tr, vec!["meyve", "orchard", "elma"]);
    }

    #[test]
    fn test_set_tr_keywords_follows_en_length() {
        let mut rec = record();
        set_keywords(&mut rec, Platform::Adobe, Lang::Tr, &list(&["elma", ""]));
        assert_eq!(rec.adobe_keywords_tr, vec!["elma", "red apple", "fruit"]);
    }

    #[test]
    fn test_find_replace_is_case_insensitive_and_literal() {
        let mut rec = record();
        let pattern = replace_pattern("APPLE").unwrap();
        let changed = find_replace(&mut rec, &pattern, "pear $1");
        assert_eq!(rec.title_en, "Red pear $1 on table");
        assert_eq!(rec.description_en, "An pear $1, a red pear $1");
        assert_eq!(rec.adobe_keywords_en, vec!["pear $1", "red pear $1", "fruit"]);
        assert_eq!(changed, 4);
    }

    #[test]
    fn test_find_replace_merges_collisions() {
        let mut rec = record();
        let pattern = replace_pattern("red apple").unwrap();
        find_replace(&mut rec, &pattern, "apple");
        assert_eq!(rec.adobe_keywords_en, vec!["apple", "fruit"]);
        assert_eq!(rec.adobe_keywords_tr, vec!["elma", "meyve"]);
    }

    #[test]
    fn test_empty_pattern_rejected() {
        assert!(matches!(replace_pattern("  "), Err(MetadataError::Validation(_))));
    }
}
