//! Position-preserving keyword translation.

use stockmeta_media::{CompletionRequest, VisionProvider};
use stockmeta_types::{Lang, MetadataError};

use crate::parse::parse_numbered_lines;
use crate::prompts::{
    TEXT_TRANSLATION_MAX_TOKENS, TRANSLATION_MAX_TOKENS, keyword_translation_prompt,
    text_translation_prompt,
};

/// Terms per translation request.
pub const TRANSLATION_BATCH: usize = 25;

/// Translates keyword lists so that `output[i]` always corresponds to
/// `input[i]`. A generation hint, when set, is added to every prompt.
pub struct Translator<'a> {
    provider: &'a dyn VisionProvider,
    batch_size: usize,
    hint: &'a str,
}

impl<'a> Translator<'a> {
    pub fn new(provider: &'a dyn VisionProvider) -> Self {
        Self {
            provider,
            batch_size: TRANSLATION_BATCH,
            hint: "",
        }
    }

    pub fn with_hint(mut self, hint: &'a str) -> Self {
        self.hint = hint;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Translate `terms` into `target`.
    ///
    /// The output has the input's length. Blank inputs stay blank. A term
    /// the reply does not cover, and every term of a failed batch, keeps its
    /// source text. This never fails.
    pub async fn translate_terms(&self, terms: &[String], target: Lang) -> Vec<String> {
        let mut out: Vec<String> = terms
            .iter()
            .map(|t| {
                let t = t.trim();
                if t.is_empty() { String::new() } else { t.to_string() }
            })
            .collect();

        let pending: Vec<usize> = (0..out.len()).filter(|&i| !out[i].is_empty()).collect();
        if pending.is_empty() {
            return out;
        }

        for (batch_no, chunk) in pending.chunks(self.batch_size).enumerate() {
            let sources: Vec<&str> = chunk.iter().map(|&i| terms[i].trim()).collect();
            let prompt = keyword_translation_prompt(&sources, target, self.hint);
            let reply = self
                .provider
                .complete(CompletionRequest::text(prompt, TRANSLATION_MAX_TOKENS))
                .await;
            let lines = match reply {
                Ok(raw) => parse_numbered_lines(&raw),
                Err(e) => {
                    tracing::warn!(
                        batch = batch_no,
                        size = chunk.len(),
                        lang = target.code(),
                        "Translation batch failed, keeping source terms: {e}"
                    );
                    continue;
                }
            };
            for (offset, &pos) in chunk.iter().enumerate() {
                if let Some(text) = lines.get(&(offset + 1)).filter(|t| !t.is_empty()) {
                    out[pos] = text.clone();
                }
            }
            let missing = (1..=chunk.len()).filter(|n| !lines.contains_key(n)).count();
            if missing > 0 {
                tracing::debug!(batch = batch_no, missing, "Translation reply skipped lines");
            }
        }
        out
    }

    /// Translate free text (title or description).
    pub async fn translate_text(&self, text: &str, target: Lang) -> Result<String, MetadataError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(String::new());
        }
        let prompt = text_translation_prompt(text, target, self.hint);
        let raw = self
            .provider
            .complete(CompletionRequest::text(prompt, TEXT_TRANSLATION_MAX_TOKENS))
            .await?;
        let translated = raw.trim().trim_matches('"').trim().to_string();
        if translated.is_empty() {
            return Err(MetadataError::parse("translation", &raw));
        }
        Ok(translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockVision, TEXT, TRANSLATE, echo_translation, status_error};

    fn terms(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_skipped_ordinal_keeps_source() {
        let vision = MockVision::new().on(TRANSLATE, "1. deniz\n2. kum\n4. güneş\n5. gökyüzü");
        let translator = Translator::new(&vision);
        let out = translator
            .translate_terms(&terms(&["sea", "sand", "wave", "sun", "sky"]), Lang::Tr)
            .await;
        assert_eq!(out, vec!["deniz", "kum", "wave", "güneş", "gökyüzü"]);
    }

    #[tokio::test]
    async fn test_blank_positions_preserved() {
        let vision = MockVision::new().with(TRANSLATE, |p| Ok(echo_translation(p)));
        let translator = Translator::new(&vision);
        let out = translator
            .translate_terms(&terms(&["sea", " ", "sun", ""]), Lang::Tr)
            .await;
        assert_eq!(out, vec!["tr:sea", "", "tr:sun", ""]);
    }

    #[tokio::test]
    async fn test_all_blank_makes_no_call() {
        let vision = MockVision::new();
        let translator = Translator::new(&vision);
        let out = translator.translate_terms(&terms(&["", "  "]), Lang::Tr).await;
        assert_eq!(out, vec!["", ""]);
        assert_eq!(vision.calls(), 0);
        assert!(translator.translate_terms(&[], Lang::Tr).await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_batch_is_isolated() {
        let input: Vec<String> = (1..=60).map(|i| format!("t{i}")).collect();
        let vision = MockVision::new().with(TRANSLATE, |p| {
            if p.contains("1. t26\n") {
                Err(status_error(503))
            } else {
                Ok(echo_translation(p))
            }
        });
        let translator = Translator::new(&vision);
        let out = translator.translate_terms(&input, Lang::Tr).await;

        assert_eq!(out.len(), 60);
        assert_eq!(vision.calls(), 3);
        assert_eq!(out[0], "tr:t1");
        assert_eq!(out[24], "tr:t25");
        assert_eq!(out[25], "t26");
        assert_eq!(out[49], "t50");
        assert_eq!(out[50], "tr:t51");
        assert_eq!(out[59], "tr:t60");
    }

    #[tokio::test]
    async fn test_out_of_range_ordinals_ignored() {
        let vision = MockVision::new().on(TRANSLATE, "0. sıfır\n1. bir\n9. dokuz");
        let translator = Translator::new(&vision);
        let out = translator.translate_terms(&terms(&["one", "two"]), Lang::Tr).await;
        assert_eq!(out, vec!["bir", "two"]);
    }

    #[tokio::test]
    async fn test_batch_size_is_respected() {
        let vision = MockVision::new().with(TRANSLATE, |p| Ok(echo_translation(p)));
        let translator = Translator::new(&vision).with_batch_size(2);
        let out = translator
            .translate_terms(&terms(&["a", "", "b", "c"]), Lang::Tr)
            .await;
        assert_eq!(out, vec!["tr:a", "", "tr:b", "tr:c"]);
        assert_eq!(vision.calls(), 2);
    }

    #[tokio::test]
    async fn test_translate_text() {
        let vision = MockVision::new().on(TEXT, "\"Red apple on the table\"");
        let translator = Translator::new(&vision);
        let out = translator.translate_text("Masada kırmızı elma", Lang::En).await.unwrap();
        assert_eq!(out, "Red apple on the table");
        assert_eq!(translator.translate_text("  ", Lang::En).await.unwrap(), "");
        assert_eq!(vision.calls(), 1);
    }

    #[tokio::test]
    async fn test_hint_reaches_translation_prompts() {
        let vision = MockVision::new().with(TRANSLATE, |p| Ok(echo_translation(p)));
        let translator = Translator::new(&vision).with_hint("Galata tower, Istanbul");
        let out = translator.translate_terms(&terms(&["tower", "city"]), Lang::Tr).await;
        assert_eq!(out, vec!["tr:tower", "tr:city"]);
        assert!(vision.prompts()[0].contains("Galata tower, Istanbul"));
    }
}
