//! Prompt templates for the vision/text provider.

use stockmeta_types::{Lang, Platform};

/// Response limit for the combined title/description call.
pub const METADATA_MAX_TOKENS: u32 = 600;
/// Response limit for one keyword line.
pub const KEYWORDS_MAX_TOKENS: u32 = 450;
/// Response limit for one numbered translation batch.
pub const TRANSLATION_MAX_TOKENS: u32 = 700;
/// Response limit for a free-text translation.
pub const TEXT_TRANSLATION_MAX_TOKENS: u32 = 350;

fn hint_block(hint: &str, label: &str) -> String {
    let hint = hint.trim();
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n\n{label}: {hint}")
    }
}

/// Bilingual title + description in one structured response.
pub fn metadata_prompt(hint: &str) -> String {
    let hint = hint_block(hint, "Additional reference (must be taken into account)");
    format!(
        r#"You are a professional stock photo metadata expert.
Analyze this image and generate optimized metadata for microstock platforms.{hint}

Consider: current market trends, buyer search behavior, commercial appeal, and SEO best practices.
Focus on what buyers actually search for on Adobe Stock, Shutterstock, and iStock.

Return ONLY valid JSON, nothing else:
{{"title_en":"...","title_tr":"...","description_en":"...","description_tr":"..."}}

Title (title_en / title_tr):
- Use the "Who, What, Where, When" formula: one clear sentence.
- Ideal length: 5-10 words. No unnecessary embellishments.
- Natural language: write a meaningful sentence, do NOT stack keywords. Example: "Woman working on laptop in bright modern office", NOT "Woman laptop office business".
- Both EN and TR must read naturally. Write the Turkish fields directly in Turkish, do not translate word for word.

Description (description_en / description_tr):
- Longer and more detailed than the title. Include mood, setting, lighting, use-cases, and context.
- 150-200 characters. Must be DIFFERENT from the title; never repeat the title verbatim."#
    )
}

fn platform_note(platform: Platform) -> &'static str {
    match platform {
        Platform::Adobe => "Adobe Stock (max 49 keywords, broad to specific)",
        Platform::Shutter => "Shutterstock (max 50 keywords, high commercial value)",
        Platform::IStock => "iStock/Getty (max 50 keywords, Getty controlled vocabulary preferred)",
    }
}

/// One comma-separated line of English keywords for `platform`.
pub fn keyword_prompt(platform: Platform, hint: &str) -> String {
    let note = platform_note(platform);
    let hint = hint_block(hint, "Extra context (important)");
    let count = platform.cap();
    format!(
        r#"You are a microstock SEO expert. Generate optimized English keywords for {note}.{hint}

First, interpret the image as a story in your mind only (who, what, why, when, where, concept). Do NOT output this story; use it only to choose keywords.

Keyword rules (follow strictly):
- Put the 10 most important, story-critical keywords FIRST. Platforms rank early positions higher; order by importance.
- Specific to general: (1) specific subject (e.g. Golden Retriever), (2) category (e.g. Dog, Pet), (3) concepts (e.g. Loyalty, Friendship).
- Singular form only; do not add plural variants.
- Include conceptual tags for the mood or message (e.g. Loneliness, Success, Sustainability).
- Only tag what is clearly visible and central; skip small background objects.

Also consider: buyer trends, commercial use (advertising, editorial, web, print), emotions, technical aspects, location/demographics if visible.

Output format (critical): exactly one line of comma-separated keywords. No introductory phrase, no sentences, no bullet points, no numbering. Example: wind turbine, power line, renewable energy, sustainability, outdoor, sunset. Generate exactly {count} keywords."#
    )
}

/// Numbered-list translation of stock keywords. The hint goes before the
/// list so the list stays the final block.
pub fn keyword_translation_prompt(terms: &[&str], target: Lang, hint: &str) -> String {
    let lang = target.name();
    let hint = hint_block(hint, "Image context (use it to pick the right sense)");
    let list = terms
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{}. {t}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Translate each numbered stock photo keyword to {lang}. Keep them short and natural, as a buyer would search.\n\
         Return ONLY the numbered list with the same numbers, one per line, formatted as \"N. translation\". \
         Do not skip, merge or add lines.{hint}\n\n{list}"
    )
}

/// Free-text translation (titles, descriptions).
pub fn text_translation_prompt(text: &str, target: Lang, hint: &str) -> String {
    let hint = hint_block(hint, "Image context");
    format!(
        "Translate to {}. Keep it natural and professional.{hint}\n\nReturn ONLY the translation:\n\n{text}",
        target.name()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_is_appended_only_when_present() {
        assert!(!metadata_prompt("   ").contains("Additional reference"));
        assert!(metadata_prompt("Istanbul, Galata tower").contains("Galata tower"));
        assert!(keyword_prompt(Platform::Adobe, "autumn").contains("Extra context (important): autumn"));
    }

    #[test]
    fn test_keyword_prompt_uses_platform_cap() {
        assert!(keyword_prompt(Platform::Adobe, "").contains("exactly 49 keywords"));
        assert!(keyword_prompt(Platform::IStock, "").contains("Getty"));
    }

    #[test]
    fn test_translation_prompt_numbers_from_one() {
        let prompt = keyword_translation_prompt(&["sea", "sand"], Lang::Tr, "");
        assert!(prompt.ends_with("\n\n1. sea\n2. sand"));
        assert!(prompt.contains("Turkish"));
    }

    #[test]
    fn test_translation_prompts_carry_hint() {
        let prompt = keyword_translation_prompt(&["bank"], Lang::Tr, "river bank at dawn");
        assert!(prompt.contains("river bank at dawn"));
        assert!(prompt.ends_with("\n\n1. bank"));

        let prompt = text_translation_prompt("Kıyıda sabah", Lang::En, "river bank");
        assert!(prompt.contains("Image context: river bank"));
        assert!(prompt.ends_with("\n\nKıyıda sabah"));
        assert!(!text_translation_prompt("x", Lang::En, " ").contains("Image context"));
    }
}
