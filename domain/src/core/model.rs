//! Model value object representing a hosted generative model

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Available review models (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Model {
    #[default]
    Gemini25Flash,
    Gemini25Pro,
    Gemini25FlashLite,
    Gemini20Flash,
    // Custom
    Custom(String),
}

impl Model {
    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        match self {
            Model::Gemini25Flash => "gemini-2.5-flash",
            Model::Gemini25Pro => "gemini-2.5-pro",
            Model::Gemini25FlashLite => "gemini-2.5-flash-lite",
            Model::Gemini20Flash => "gemini-2.0-flash",
            Model::Custom(s) => s,
        }
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "gemini-2.5-flash" => Model::Gemini25Flash,
            "gemini-2.5-pro" => Model::Gemini25Pro,
            "gemini-2.5-flash-lite" => Model::Gemini25FlashLite,
            "gemini-2.0-flash" => Model::Gemini20Flash,
            other => Model::Custom(other.to_string()),
        })
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.parse::<Model>() {
            Ok(model) => Ok(model),
            Err(never) => match never {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_roundtrip() {
        for model in [
            Model::Gemini25Flash,
            Model::Gemini25Pro,
            Model::Gemini25FlashLite,
            Model::Gemini20Flash,
        ] {
            let s = model.to_string();
            let parsed: Model = s.parse().unwrap();
            assert_eq!(model, parsed);
        }
    }

    #[test]
    fn test_custom_model() {
        let model: Model = "gemini-exp-1206".parse().unwrap();
        assert_eq!(model, Model::Custom("gemini-exp-1206".to_string()));
        assert_eq!(model.to_string(), "gemini-exp-1206");
    }

    #[test]
    fn test_model_default() {
        assert_eq!(Model::default(), Model::Gemini25Flash);
    }
}
