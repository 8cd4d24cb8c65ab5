// Translations
//
// Locale tables are nested JSON objects bundled into the binary. A
// `Translator` is an explicit value handed to whatever needs text; there is
// no global "current language".

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

const BUNDLED: &[(&str, &str)] = &[
    ("en", include_str!("locales/en.json")),
    ("es", include_str!("locales/es.json")),
];

/// Keys the backend itself renders. Each maps to a dotted path present in
/// every bundled locale (checked in tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKey {
    LanguageName,
    ChatDefaultTitle,
    ChatGreeting,
    FallbackCrisis,
    FallbackAnxiety,
    FallbackSleep,
    FallbackSadness,
    FallbackStress,
    FallbackAnger,
    FallbackLoneliness,
    FallbackGratitude,
    FallbackGreeting,
    FallbackDefault,
}

impl TextKey {
    pub const ALL: [TextKey; 13] = [
        TextKey::LanguageName,
        TextKey::ChatDefaultTitle,
        TextKey::ChatGreeting,
        TextKey::FallbackCrisis,
        TextKey::FallbackAnxiety,
        TextKey::FallbackSleep,
        TextKey::FallbackSadness,
        TextKey::FallbackStress,
        TextKey::FallbackAnger,
        TextKey::FallbackLoneliness,
        TextKey::FallbackGratitude,
        TextKey::FallbackGreeting,
        TextKey::FallbackDefault,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            TextKey::LanguageName => "language.name",
            TextKey::ChatDefaultTitle => "chat.default_title",
            TextKey::ChatGreeting => "chat.greeting",
            TextKey::FallbackCrisis => "fallback.crisis",
            TextKey::FallbackAnxiety => "fallback.anxiety",
            TextKey::FallbackSleep => "fallback.sleep",
            TextKey::FallbackSadness => "fallback.sadness",
            TextKey::FallbackStress => "fallback.stress",
            TextKey::FallbackAnger => "fallback.anger",
            TextKey::FallbackLoneliness => "fallback.loneliness",
            TextKey::FallbackGratitude => "fallback.gratitude",
            TextKey::FallbackGreeting => "fallback.greeting",
            TextKey::FallbackDefault => "fallback.default",
        }
    }
}

/// Resolve a dotted key by descending object properties.
/// Returns `None` for a missing key or a non-string leaf.
pub fn lookup<'a>(table: &'a Value, key: &str) -> Option<&'a str> {
    key.split('.')
        .try_fold(table, |node, part| node.get(part))?
        .as_str()
}

/// All bundled locale tables
#[derive(Debug, Clone)]
pub struct Locales {
    tables: BTreeMap<String, Arc<Value>>,
    default_code: String,
}

impl Locales {
    /// Parse the bundled tables. `default_code` falls back to "en" when unknown.
    pub fn bundled(default_code: &str) -> Result<Self, serde_json::Error> {
        let mut tables = BTreeMap::new();
        for (code, raw) in BUNDLED {
            let table: Value = serde_json::from_str(raw)?;
            tables.insert(code.to_string(), Arc::new(table));
        }

        let default_code = if tables.contains_key(default_code) {
            default_code.to_string()
        } else {
            tracing::warn!("Unknown default locale {}, using en", default_code);
            "en".to_string()
        };

        Ok(Self {
            tables,
            default_code,
        })
    }

    pub fn codes(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.tables.contains_key(code)
    }

    pub fn table(&self, code: &str) -> Option<Arc<Value>> {
        self.tables.get(code).cloned()
    }

    /// Translator for `code`, or for the default locale when the code is
    /// missing or unsupported
    pub fn translator(&self, code: Option<&str>) -> Translator {
        let code = code
            .filter(|c| self.is_supported(c))
            .unwrap_or(&self.default_code);

        let table = self
            .tables
            .get(code)
            .cloned()
            .unwrap_or_else(|| Arc::new(Value::Object(Default::default())));

        Translator {
            code: code.to_string(),
            table,
        }
    }
}

/// Key lookup bound to one locale
#[derive(Debug, Clone)]
pub struct Translator {
    code: String,
    table: Arc<Value>,
}

impl Translator {
    pub fn new(code: &str, table: Value) -> Self {
        Self {
            code: code.to_string(),
            table: Arc::new(table),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Translate a dotted key; missing keys come back unchanged
    pub fn t(&self, key: &str) -> String {
        lookup(&self.table, key)
            .map(|s| s.to_string())
            .unwrap_or_else(|| key.to_string())
    }

    pub fn text(&self, key: TextKey) -> String {
        self.t(key.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessments::AssessmentKind;
    use serde_json::json;

    #[test]
    fn test_nested_lookup() {
        let tr = Translator::new("en", json!({"a": {"b": {"c": "deep"}}, "top": "level"}));
        assert_eq!(tr.t("a.b.c"), "deep");
        assert_eq!(tr.t("top"), "level");
    }

    #[test]
    fn test_missing_key_returns_key_unchanged() {
        let tr = Translator::new("en", json!({"a": {"b": "x"}}));
        assert_eq!(tr.t("a.b.c"), "a.b.c");
        assert_eq!(tr.t("nope"), "nope");
        assert_eq!(tr.t(""), "");
        // Non-string leaves are treated as missing
        assert_eq!(tr.t("a"), "a");
    }

    #[test]
    fn test_unsupported_code_uses_default() {
        let locales = Locales::bundled("en").unwrap();
        assert_eq!(locales.translator(Some("de")).code(), "en");
        assert_eq!(locales.translator(None).code(), "en");
        assert_eq!(locales.translator(Some("es")).code(), "es");
        assert_eq!(Locales::bundled("xx").unwrap().translator(None).code(), "en");
    }

    #[test]
    fn test_every_text_key_resolves_in_every_locale() {
        let locales = Locales::bundled("en").unwrap();
        for code in locales.codes() {
            let tr = locales.translator(Some(&code));
            for key in TextKey::ALL {
                assert_ne!(tr.text(key), key.path(), "{} missing {}", code, key.path());
            }
        }
    }

    #[test]
    fn test_questionnaire_keys_resolve_in_every_locale() {
        let locales = Locales::bundled("en").unwrap();
        for code in locales.codes() {
            let table = locales.table(&code).unwrap();
            for kind in AssessmentKind::ALL {
                let q = kind.questionnaire();
                let mut keys = vec![q.title_key, q.description_key];
                keys.extend(q.questions.iter().map(|x| x.text_key));
                keys.extend(q.options.iter().map(|o| o.label_key));
                keys.extend(q.bands.iter().map(|b| b.feedback_key));
                for key in keys {
                    assert!(lookup(&table, key).is_some(), "{} missing {}", code, key);
                }
            }
        }
    }
}
