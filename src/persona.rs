//! Tutor persona
//!
//! The persona owns every prompt that shapes the tutor's voice: the leading
//! system message of each conversation, the opening turn sent on `/start`,
//! and the templates used once the learner reports a TOPIK level.

use serde::{Deserialize, Serialize};

use crate::prompt::render_level;
use crate::session::TopikLevel;

const DEFAULT_NAME: &str = "민쌤";

const DEFAULT_SYSTEM_PROMPT: &str = "당신은 친근하고 유머러스한 AI 한국어 튜터 '민쌤'입니다. \
짧게 짧게 대화하세요. 친구처럼 대화하세요. 상대방이 말을 하면 당신이 먼저 주제를 꺼냅니다. \
대화를 처음 시작할 때는 반갑게 인사하고 학습자의 한국어 수준(TOPIK 1급부터 6급)을 물어보세요. \
학습자가 틀린 표현을 쓰면 대화 흐름을 끊지 않고 자연스럽게 고쳐 주세요.";

const DEFAULT_OPENING_MESSAGE: &str = "안녕하세요, 민쌤! 한국어 대화 연습을 시작하고 싶어요.";

const DEFAULT_LEVEL_TEMPLATE: &str = "학습자의 한국어 수준은 TOPIK {level}급입니다. \
TOPIK {level}급 학습자가 이해할 수 있는 어휘와 문법만 사용하고, 문장 길이도 그 수준에 맞추세요.";

const DEFAULT_LEVEL_CONFIRMATION: &str = "제 한국어 수준은 TOPIK {level}급이에요.";

/// The tutor's identity and prompt set
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Persona {
    /// Display name
    pub name: String,

    /// Leading system message of every conversation
    pub system_prompt: String,

    /// User turn that opens a conversation on `/start`
    pub opening_message: String,

    /// Level-parameterized system message (`{level}` placeholder)
    pub level_template: String,

    /// User turn confirming the chosen level (`{level}` placeholder)
    pub level_confirmation: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            opening_message: DEFAULT_OPENING_MESSAGE.to_string(),
            level_template: DEFAULT_LEVEL_TEMPLATE.to_string(),
            level_confirmation: DEFAULT_LEVEL_CONFIRMATION.to_string(),
        }
    }
}

impl Persona {
    /// System message tailored to a TOPIK level
    #[must_use]
    pub fn level_prompt(&self, level: TopikLevel) -> String {
        render_level(&self.level_template, level)
    }

    /// User turn announcing a TOPIK level
    #[must_use]
    pub fn level_confirmation(&self, level: TopikLevel) -> String {
        render_level(&self.level_confirmation, level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_persona_is_minssem() {
        let p = Persona::default();
        assert_eq!(p.name, "민쌤");
        assert!(p.system_prompt.contains("민쌤"));
        assert!(!p.opening_message.is_empty());
    }

    #[test]
    fn level_templates_substitute_level() {
        let p = Persona::default();
        let level = TopikLevel::new(4).unwrap();
        assert!(p.level_prompt(level).contains("TOPIK 4급"));
        assert_eq!(p.level_confirmation(level), "제 한국어 수준은 TOPIK 4급이에요.");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let p: Persona = toml::from_str("name = \"Teacher Kim\"").unwrap();
        assert_eq!(p.name, "Teacher Kim");
        assert_eq!(p.opening_message, Persona::default().opening_message);
    }
}
