// Offline responder used when the completion API is unavailable
//
// Keyword groups are checked in order; the first group with a match picks the
// canned reply. Crisis keywords come first so they always win.

use std::sync::OnceLock;

use regex::Regex;

use crate::i18n::{TextKey, Translator};

const TOPICS: &[(TextKey, &str)] = &[
    (
        TextKey::FallbackCrisis,
        r"suicid|kill myself|end my life|self[- ]?harm|hurt myself|want to die|matarme|quitarme la vida|hacerme daño|no quiero vivir",
    ),
    (
        TextKey::FallbackAnxiety,
        r"anxi|panic|nervous|worr|ansie|pánico|panico|nervios|preocup",
    ),
    (
        TextKey::FallbackSleep,
        r"sleep|insomnia|\btired\b|exhausted|nightmare|dormir|sueño|insomnio|cansad|pesadilla",
    ),
    (
        TextKey::FallbackSadness,
        r"\bsad(ness|ly)?\b|depress|\bcr(y|ying|ied|ies)\b|hopeless|\bdown\b|triste|deprim|llor|desesper",
    ),
    (
        TextKey::FallbackStress,
        r"stress|overwhelm|pressure|burn ?out|estr[eé]s|agobi|presi[oó]n",
    ),
    (
        TextKey::FallbackAnger,
        r"\bang(er|ry)\b|furious|\bmad at\b|annoyed|enojad|enfadad|furios|\brabia\b",
    ),
    (
        TextKey::FallbackLoneliness,
        r"lonely|\balone\b|isolated|no friends|\bsol[oa]\b|soledad|aislad",
    ),
    (
        TextKey::FallbackGratitude,
        r"thank|grateful|\bhappy\b|great day|better now|gracias|agradecid|feliz|\bmejor\b",
    ),
    (
        TextKey::FallbackGreeting,
        r"^\s*(hi|hello|hey|good (morning|afternoon|evening)|hola|buen[oa]s)\b",
    ),
];

fn compiled() -> &'static [(TextKey, Regex)] {
    static COMPILED: OnceLock<Vec<(TextKey, Regex)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        TOPICS
            .iter()
            .filter_map(|(key, pattern)| match Regex::new(&format!("(?i){}", pattern)) {
                Ok(re) => Some((*key, re)),
                Err(e) => {
                    tracing::error!("Invalid fallback pattern for {:?}: {}", key, e);
                    None
                }
            })
            .collect()
    })
}

/// Pick the canned reply key for a user message
pub fn classify(text: &str) -> TextKey {
    compiled()
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(key, _)| *key)
        .unwrap_or(TextKey::FallbackDefault)
}

/// Canned reply in the translator's language
pub fn respond(text: &str, translator: &Translator) -> String {
    translator.text(classify(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Locales;

    #[test]
    fn test_keyword_groups() {
        assert_eq!(classify("I've been so anxious lately"), TextKey::FallbackAnxiety);
        assert_eq!(classify("I can't sleep at night"), TextKey::FallbackSleep);
        assert_eq!(classify("Feeling really SAD"), TextKey::FallbackSadness);
        assert_eq!(classify("work stress is killing me"), TextKey::FallbackStress);
        assert_eq!(classify("I'm so angry at him"), TextKey::FallbackAnger);
        assert_eq!(classify("I feel lonely"), TextKey::FallbackLoneliness);
        assert_eq!(classify("thanks, that helped"), TextKey::FallbackGratitude);
        assert_eq!(classify("hello there"), TextKey::FallbackGreeting);
        assert_eq!(classify("the weather is mild"), TextKey::FallbackDefault);
    }

    #[test]
    fn test_short_stems_need_whole_words() {
        assert_eq!(classify("I found a crystal at the shop"), TextKey::FallbackDefault);
        assert_eq!(classify("Downloading the new app"), TextKey::FallbackDefault);
        assert_eq!(classify("Sadie came over"), TextKey::FallbackDefault);
        assert_eq!(classify("there is danger nearby"), TextKey::FallbackDefault);
        assert_eq!(classify("I cried all night"), TextKey::FallbackSadness);
        assert_eq!(classify("feeling down today"), TextKey::FallbackSadness);
    }

    #[test]
    fn test_spanish_keywords() {
        assert_eq!(classify("tengo mucha ansiedad"), TextKey::FallbackAnxiety);
        assert_eq!(classify("no puedo dormir"), TextKey::FallbackSleep);
        assert_eq!(classify("Hola"), TextKey::FallbackGreeting);
    }

    #[test]
    fn test_crisis_wins_over_other_topics() {
        assert_eq!(
            classify("I'm anxious and sad and I want to die"),
            TextKey::FallbackCrisis
        );
    }

    #[test]
    fn test_respond_uses_locale() {
        let locales = Locales::bundled("en").unwrap();
        let en = respond("I want to hurt myself", &locales.translator(Some("en")));
        let es = respond("I want to hurt myself", &locales.translator(Some("es")));
        assert!(en.contains("crisis line"));
        assert!(es.contains("línea de crisis"));
    }
}
