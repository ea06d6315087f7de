//! Review language value object

use super::error::DomainError;
use serde::{Deserialize, Serialize};

/// Language of the review output (Value Object)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
        }
    }

    /// All declared languages. Every prompt template must cover each of them.
    pub fn all() -> [Language; 2] {
        [Language::En, Language::Es]
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "es" => Ok(Language::Es),
            other => Err(DomainError::UnsupportedLanguage(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_roundtrip() {
        for lang in Language::all() {
            let parsed: Language = lang.to_string().parse().unwrap();
            assert_eq!(parsed, lang);
        }
    }

    #[test]
    fn test_language_rejects_unknown() {
        let err = "fr".parse::<Language>().unwrap_err();
        assert_eq!(err, DomainError::UnsupportedLanguage("fr".to_string()));
    }

    #[test]
    fn test_language_serde() {
        assert_eq!(serde_json::to_string(&Language::Es).unwrap(), "\"es\"");
        let lang: Language = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(lang, Language::En);
        assert!(serde_json::from_str::<Language>("\"de\"").is_err());
    }
}
