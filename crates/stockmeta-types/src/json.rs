//! Lenient extraction of JSON objects embedded in free text.
//!
//! Model responses and persisted blobs may carry prose or garbage around the
//! object we want. Candidates are located by brace balancing (string-aware)
//! rather than by assuming the whole text is JSON.

use serde::de::DeserializeOwned;

/// Iterate over every balanced `{...}` substring, in order of its opening brace.
pub fn balanced_objects(text: &str) -> impl Iterator<Item = &str> {
    text.char_indices()
        .filter(|(_, c)| *c == '{')
        .filter_map(move |(start, _)| balanced_end(text, start).map(|end| &text[start..end]))
}

/// The first balanced `{...}` substring, if any.
pub fn first_balanced_object(text: &str) -> Option<&str> {
    balanced_objects(text).next()
}

/// Parse the first balanced substring that deserializes into `T`.
pub fn parse_lenient<T: DeserializeOwned>(text: &str) -> Option<T> {
    balanced_objects(text).find_map(|candidate| serde_json::from_str(candidate).ok())
}

/// Byte offset just past the brace closing the one at `start`.
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pair {
        a: i32,
    }

    #[test]
    fn test_trailing_prose() {
        let raw = "Sure! {\"a\": 1} Hope this helps {not json}";
        assert_eq!(first_balanced_object(raw), Some("{\"a\": 1}"));
        assert_eq!(parse_lenient::<Pair>(raw), Some(Pair { a: 1 }));
    }

    #[test]
    fn test_braces_inside_strings() {
        let raw = r#"{"title": "a } tricky { one", "n": {"x": "\"}"}} garbage"#;
        let obj = first_balanced_object(raw).unwrap();
        assert!(obj.ends_with("}}"));
        let v: serde_json::Value = serde_json::from_str(obj).unwrap();
        assert_eq!(v["title"], "a } tricky { one");
    }

    #[test]
    fn test_skips_non_parsing_candidate() {
        let raw = "Note {draft} then {\"a\": 7}";
        assert_eq!(parse_lenient::<Pair>(raw), Some(Pair { a: 7 }));
    }

    #[test]
    fn test_unbalanced() {
        assert_eq!(first_balanced_object("{\"a\": 1"), None);
        assert_eq!(parse_lenient::<Pair>("nothing here"), None);
    }
}
