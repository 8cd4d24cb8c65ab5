// Prompts for the supportive chat assistant

use crate::i18n::{TextKey, Translator};

/// Messages of history sent with every completion request
pub const HISTORY_WINDOW: usize = 20;

const SYSTEM_PROMPT: &str = r#"You are a warm, supportive companion inside a mental-wellness app.
Use techniques from cognitive behavioral therapy: reflect feelings back, gently
question unhelpful thoughts, suggest small concrete coping steps and ask one
open question at a time.

Rules:
- Keep replies short (at most 120 words) and conversational.
- Never diagnose and never prescribe medication.
- You are not a substitute for a professional. If the user mentions self-harm,
  suicide or being in danger, urge them to contact local emergency services or a
  crisis line right away.
- Reply in {language}.
"#;

/// System prompt with the reply language filled in from the translator
pub fn system_prompt(translator: &Translator) -> String {
    SYSTEM_PROMPT.replace("{language}", &translator.text(TextKey::LanguageName))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Locales;

    #[test]
    fn test_system_prompt_names_language() {
        let locales = Locales::bundled("en").unwrap();
        let prompt = system_prompt(&locales.translator(Some("es")));
        assert!(prompt.contains("Reply in Español."));
        assert!(!prompt.contains("{language}"));
    }
}
