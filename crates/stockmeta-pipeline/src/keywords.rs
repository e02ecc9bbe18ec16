//! Keyword acquisition for one platform.

use std::collections::HashSet;

use stockmeta_media::{CompletionRequest, KeywordScorer, Sample, VisionProvider};
use stockmeta_types::{MetadataError, Platform};

use crate::parse::parse_keyword_line;
use crate::prompts::{KEYWORDS_MAX_TOKENS, keyword_prompt};

/// Merge `existing` and then `candidates` into one list: trimmed, blanks
/// dropped, deduplicated case-insensitively (first spelling wins), at most
/// `cap` entries. Order is preserved.
pub fn fill_to_max<A, B>(existing: &[A], cap: usize, candidates: &[B]) -> Vec<String>
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(cap);
    let all = existing
        .iter()
        .map(AsRef::as_ref)
        .chain(candidates.iter().map(AsRef::as_ref));
    for term in all {
        if out.len() >= cap {
            break;
        }
        let term = term.trim();
        if term.is_empty() || !seen.insert(term.to_lowercase()) {
            continue;
        }
        out.push(term.to_string());
    }
    out
}

/// Bytes for the keyword-scoring service.
#[derive(Debug, Clone)]
pub struct ScoringPayload {
    pub data: Vec<u8>,
    pub file_name: String,
}

/// Produces the English keyword list for a platform.
pub struct KeywordAcquirer<'a> {
    vision: &'a dyn VisionProvider,
    scorer: Option<&'a dyn KeywordScorer>,
}

impl<'a> KeywordAcquirer<'a> {
    pub fn new(vision: &'a dyn VisionProvider, scorer: Option<&'a dyn KeywordScorer>) -> Self {
        Self { vision, scorer }
    }

    /// Acquire up to `platform.cap()` keywords.
    ///
    /// Scorer-eligible platforms take the scorer's terms first, in its order,
    /// and top up from the vision model. A failing scorer is logged and the
    /// vision model alone is used.
    pub async fn acquire(
        &self,
        sample: &Sample,
        payload: Option<&ScoringPayload>,
        platform: Platform,
        hint: &str,
    ) -> Result<Vec<String>, MetadataError> {
        let cap = platform.cap();

        if let (true, Some(scorer), Some(payload)) =
            (platform.uses_keyword_scorer(), self.scorer, payload)
        {
            match scorer.score(payload.data.clone(), &payload.file_name).await {
                Ok(scored) => {
                    let terms: Vec<&str> = scored.iter().map(|k| k.keyword.as_str()).collect();
                    let base = fill_to_max::<&str, &str>(&terms, cap, &[]);
                    if base.len() >= cap {
                        return Ok(base);
                    }
                    let extra = self.vision_keywords(sample, platform, hint).await?;
                    let merged = fill_to_max(&base, cap, &extra);
                    tracing::debug!(
                        platform = platform.key(),
                        scored = base.len(),
                        total = merged.len(),
                        "Keywords merged"
                    );
                    return Ok(merged);
                }
                Err(e) => {
                    tracing::warn!(
                        platform = platform.key(),
                        provider = scorer.id(),
                        "Keyword scoring failed, using vision keywords only: {e}"
                    );
                }
            }
        }

        let terms = self.vision_keywords(sample, platform, hint).await?;
        Ok(fill_to_max::<String, String>(&[], cap, &terms))
    }

    async fn vision_keywords(
        &self,
        sample: &Sample,
        platform: Platform,
        hint: &str,
    ) -> Result<Vec<String>, MetadataError> {
        let request =
            CompletionRequest::vision(sample, keyword_prompt(platform, hint), KEYWORDS_MAX_TOKENS);
        let raw = self.vision.complete(request).await?;
        let terms = parse_keyword_line(&raw);
        if terms.is_empty() {
            return Err(MetadataError::parse("keyword list", &raw));
        }
        Ok(terms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ADOBE, ISTOCK, MockScorer, MockVision, SHUTTER, sample};

    fn numbered(prefix: &str, n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("{prefix}{i}")).collect()
    }

    #[test]
    fn test_fill_to_max_dedups_and_caps() {
        let merged = fill_to_max(&["Sea", " beach ", ""], 4, &["sea", "SAND", "Beach", "sky", "sun"]);
        assert_eq!(merged, vec!["Sea", "beach", "SAND", "sky"]);
    }

    #[test]
    fn test_fill_to_max_zero_cap() {
        assert!(fill_to_max(&["a"], 0, &["b"]).is_empty());
    }

    #[tokio::test]
    async fn test_scored_terms_lead_and_vision_tops_up() {
        let scored = numbered("scored", 10);
        let ai = numbered("ai", 60);
        let vision = MockVision::new().on(ADOBE, &ai.join(", "));
        let scorer = MockScorer::ok(&scored);
        let acquirer = KeywordAcquirer::new(&vision, Some(&scorer));
        let payload = ScoringPayload { data: vec![1, 2, 3], file_name: "a.jpg".into() };

        let list = acquirer
            .acquire(&sample(), Some(&payload), Platform::Adobe, "")
            .await
            .unwrap();

        assert_eq!(list.len(), 49);
        assert_eq!(&list[..10], &scored[..]);
        assert_eq!(list[10], "ai1");
        assert_eq!(scorer.calls(), 1);
    }

    #[tokio::test]
    async fn test_full_scorer_list_skips_vision() {
        let scored = numbered("s", 55);
        let vision = MockVision::new();
        let scorer = MockScorer::ok(&scored);
        let acquirer = KeywordAcquirer::new(&vision, Some(&scorer));
        let payload = ScoringPayload { data: vec![0], file_name: "a.jpg".into() };

        let list = acquirer
            .acquire(&sample(), Some(&payload), Platform::Adobe, "")
            .await
            .unwrap();
        assert_eq!(list.len(), 49);
        assert_eq!(vision.calls(), 0);
    }

    #[tokio::test]
    async fn test_scorer_failure_falls_back_to_vision() {
        let ai = numbered("ai", 30);
        let vision = MockVision::new().on(ADOBE, &ai.join(", "));
        let scorer = MockScorer::failing(503);
        let acquirer = KeywordAcquirer::new(&vision, Some(&scorer));
        let payload = ScoringPayload { data: vec![0], file_name: "a.jpg".into() };

        let list = acquirer
            .acquire(&sample(), Some(&payload), Platform::Adobe, "")
            .await
            .unwrap();
        assert_eq!(list, ai);
    }

    #[tokio::test]
    async fn test_scorer_not_used_for_other_platforms() {
        let vision = MockVision::new().on(SHUTTER, "city, street, night");
        let scorer = MockScorer::ok(&numbered("s", 5));
        let acquirer = KeywordAcquirer::new(&vision, Some(&scorer));
        let payload = ScoringPayload { data: vec![0], file_name: "a.jpg".into() };

        let list = acquirer
            .acquire(&sample(), Some(&payload), Platform::Shutter, "")
            .await
            .unwrap();
        assert_eq!(list, vec!["city", "street", "night"]);
        assert_eq!(scorer.calls(), 0);
    }

    #[tokio::test]
    async fn test_vision_failure_propagates() {
        let vision = MockVision::new().fail_on(ISTOCK, 429);
        let acquirer = KeywordAcquirer::new(&vision, None);
        let err = acquirer
            .acquire(&sample(), None, Platform::IStock, "")
            .await
            .unwrap_err();
        assert!(matches!(err, MetadataError::Provider { status: Some(429), .. }));
    }

    #[tokio::test]
    async fn test_empty_vision_reply_is_parse_error() {
        let vision = MockVision::new().on(SHUTTER, "   \n , ,");
        let acquirer = KeywordAcquirer::new(&vision, None);
        let err = acquirer
            .acquire(&sample(), None, Platform::Shutter, "")
            .await
            .unwrap_err();
        assert!(matches!(err, MetadataError::Parse { .. }));
    }
}
