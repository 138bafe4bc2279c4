//! Fixed prompts and user-facing strings

/// Instruction for the transcript clean-up completion
pub const CORRECTION_PROMPT: &str = "You are a helpful assistant for transcription correction. \
Your task is to correct any spelling discrepancies in the transcribed Korean text. \
Make sure to maintain the original meaning and only correct obvious errors. \
Add necessary punctuation such as periods, commas, and capitalization, and use only the context provided. \
Reply with the corrected text only.";

/// System prompt for the one-shot `/translate` endpoint
pub const TRANSLATOR_PROMPT: &str = "You are a professional Korean to English translator. \
Translate the user's Korean text into natural, fluent English. \
Reply with the translation only, without notes or explanations.";

/// Apology returned by every chat-family route on failure
pub const CHAT_APOLOGY: &str = "죄송합니다. 오류가 발생했습니다.";

/// Error string returned by `/translate` on failure
pub const TRANSLATION_ERROR: &str = "번역 중 오류가 발생했습니다.";

/// Placeholder substituted with the learner's TOPIK level
pub const LEVEL_PLACEHOLDER: &str = "{level}";

/// Substitute a level into a template
#[must_use]
pub fn render_level(template: &str, level: impl std::fmt::Display) -> String {
    template.replace(LEVEL_PLACEHOLDER, &level.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_level_replaces_every_placeholder() {
        let rendered = render_level("TOPIK {level}급, 다시 {level}급", 3);
        assert_eq!(rendered, "TOPIK 3급, 다시 3급");
    }

    #[test]
    fn render_level_without_placeholder_is_identity() {
        assert_eq!(render_level("no level here", 5), "no level here");
    }
}
