//! iStock controlled-vocabulary remapping.
//!
//! The map is keyed by the lowercased generic term; values are the preferred
//! iStock spellings. Lookups trim and lowercase the term first.

use std::collections::HashSet;

use stockmeta_types::IStockMap;

use crate::keywords::fill_to_max;

/// Normalized form used for map keys.
pub fn map_key(term: &str) -> String {
    term.trim().to_lowercase()
}

/// Replace mapped terms, then deduplicate and cap.
///
/// A hit replaces the term with the mapped value verbatim. A term that is
/// already exactly one of the map's values is left alone, so applying the
/// same map twice gives the same list.
pub fn remap(terms: &[String], map: &IStockMap, cap: usize) -> Vec<String> {
    let values = mapped_values(map);
    let mapped: Vec<String> = terms
        .iter()
        .map(|term| map_term(term, map, &values))
        .collect();
    fill_to_max::<String, String>(&[], cap, &mapped)
}

fn mapped_values(map: &IStockMap) -> HashSet<&str> {
    map.values()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect()
}

fn map_term(term: &str, map: &IStockMap, values: &HashSet<&str>) -> String {
    let term = term.trim();
    if values.contains(term) {
        return term.to_string();
    }
    match map.get(&map_key(term)) {
        Some(mapped) if !mapped.trim().is_empty() => mapped.trim().to_string(),
        _ => term.to_string(),
    }
}

/// Remap an aligned EN/TR pair of lists. A renamed EN term keeps its TR
/// entry; pairs whose EN term becomes a duplicate are dropped.
pub fn remap_pairs(
    en: &[String],
    tr: &[String],
    map: &IStockMap,
    cap: usize,
) -> (Vec<String>, Vec<String>) {
    let values = mapped_values(map);
    let mapped: Vec<String> = en.iter().map(|t| map_term(t, map, &values)).collect();
    crate::edit::dedupe_pairs(&mapped, tr, cap)
}

/// New map entries implied by edits to an iStock list.
///
/// Terms present in both lists (ignoring case) anchor the alignment, found
/// as a longest common subsequence. Between two anchors, the removed and
/// the added terms are paired in order only when their counts match, so a
/// deletion or insertion that shifts later terms learns nothing. A pair
/// whose terms differ only by case is learned as a respelling.
pub fn learn(current: &[String], snapshot: &[String]) -> Vec<(String, String)> {
    let now: Vec<&str> = current.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).collect();
    let before: Vec<&str> = snapshot.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).collect();

    let mut learned = Vec::new();
    let (mut i, mut j) = (0, 0);
    for (ai, aj) in common_anchors(&before, &now)
        .into_iter()
        .chain([(before.len(), now.len())])
    {
        let removed = &before[i..ai];
        let added = &now[j..aj];
        if removed.len() == added.len() {
            learned.extend(
                removed
                    .iter()
                    .zip(added)
                    .map(|(old, new)| (map_key(old), new.to_string())),
            );
        }
        if ai < before.len() && before[ai] != now[aj] {
            learned.push((map_key(before[ai]), now[aj].to_string()));
        }
        (i, j) = (ai + 1, aj + 1);
    }
    learned
}

/// Index pairs of a longest common subsequence, compared case-insensitively.
fn common_anchors(a: &[&str], b: &[&str]) -> Vec<(usize, usize)> {
    let a: Vec<String> = a.iter().map(|t| t.to_lowercase()).collect();
    let b: Vec<String> = b.iter().map(|t| t.to_lowercase()).collect();
    let mut table = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for i in (0..a.len()).rev() {
        for j in (0..b.len()).rev() {
            table[i][j] = if a[i] == b[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }

    let mut anchors = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            anchors.push((i, j));
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    anchors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn map(pairs: &[(&str, &str)]) -> IStockMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_remap_lookup_is_normalized() {
        let m = map(&[("dog", "Canine"), ("sea", "Ocean")]);
        let out = remap(&list(&[" Dog ", "beach", "SEA"]), &m, 50);
        assert_eq!(out, vec!["Canine", "beach", "Ocean"]);
    }

    #[test]
    fn test_remap_dedups_and_caps() {
        let m = map(&[("puppy", "Dog")]);
        let out = remap(&list(&["dog", "puppy", "cat", "bird"]), &m, 2);
        assert_eq!(out, vec!["dog", "cat"]);
    }

    #[test]
    fn test_remap_is_idempotent_with_chained_entries() {
        let m = map(&[("dog", "Canine"), ("canine", "Hound"), ("sea", "Ocean")]);
        let input = list(&["dog", "canine", "sea", "sky", "Ocean"]);
        let once = remap(&input, &m, 50);
        let twice = remap(&once, &m, 50);
        assert_eq!(once, twice);
        assert_eq!(once, vec!["Canine", "Hound", "Ocean", "sky"]);
    }

    #[test]
    fn test_remap_applies_case_only_mapping() {
        let m = map(&[("new york", "New York")]);
        let once = remap(&list(&["new york", "city"]), &m, 50);
        assert_eq!(once, vec!["New York", "city"]);
        assert_eq!(remap(&once, &m, 50), once);
    }

    #[test]
    fn test_remap_pairs_keeps_translations_aligned() {
        let m = map(&[("puppy", "Dog")]);
        let (en, tr) = remap_pairs(
            &list(&["puppy", "dog", "grass"]),
            &list(&["yavru", "köpek", "çimen"]),
            &m,
            50,
        );
        assert_eq!(en, vec!["Dog", "grass"]);
        assert_eq!(tr, vec!["yavru", "çimen"]);
    }

    #[test]
    fn test_learn_substitutions() {
        let snapshot = list(&["Dog", "sea", "sky", "tree"]);
        let current = list(&["Canine", "SEA", "sky", "Deciduous Tree", "extra"]);
        assert_eq!(
            learn(&current, &snapshot),
            vec![
                ("dog".to_string(), "Canine".to_string()),
                ("sea".to_string(), "SEA".to_string()),
            ]
        );
    }

    #[test]
    fn test_learn_aligned_replacement() {
        let snapshot = list(&["dog", "grass", "sky", "tree"]);
        let current = list(&["dog", "Lawn", "sky", "Deciduous Tree"]);
        assert_eq!(
            learn(&current, &snapshot),
            vec![
                ("grass".to_string(), "Lawn".to_string()),
                ("tree".to_string(), "Deciduous Tree".to_string()),
            ]
        );
    }

    #[test]
    fn test_learn_ignores_deleted_and_inserted_terms() {
        let snapshot = list(&["dog", "grass", "sky", "tree"]);
        assert!(learn(&list(&["dog", "sky", "tree"]), &snapshot).is_empty());
        assert!(learn(&list(&["dog", "puppy", "grass", "sky", "tree"]), &snapshot).is_empty());
        assert_eq!(
            learn(&list(&["dog", "sky", "Forest"]), &snapshot),
            vec![("tree".to_string(), "Forest".to_string())]
        );
    }
}
