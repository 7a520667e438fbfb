use serde::{Deserialize, Serialize};

use crate::models::profile::UserProfile;

const PREVIEW_MASK: &str = "••••";
const PREVIEW_TAIL: usize = 4;

/// The single persisted configuration record.
#[derive(Debug, Clone, Default)]
pub struct StoredConfig {
    pub api_key: String,
    pub model_name: String,
    pub profile: UserProfile,
}

impl StoredConfig {
    pub fn provider(&self) -> ProviderConfig {
        ProviderConfig {
            api_key: self.api_key.clone(),
            model_name: self.model_name.clone(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// `••••abcd`: the last four characters of the key, or empty when unset.
    /// Keys of four characters or fewer are fully masked.
    pub fn key_preview(&self) -> String {
        if !self.has_api_key() {
            return String::new();
        }
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() <= PREVIEW_TAIL {
            return PREVIEW_MASK.to_string();
        }
        let tail: String = chars[chars.len() - PREVIEW_TAIL..].iter().collect();
        format!("{PREVIEW_MASK}{tail}")
    }
}

/// Credential and model read by the provider at request time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model_name: String,
}

/// Partial update of the configuration record. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    #[serde(skip)]
    pub profile: Option<UserProfile>,
}

/// What the settings surfaces expose. Never carries the key itself.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSummary {
    pub has_api_key: bool,
    pub model_name: String,
    pub key_preview: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_preview_shows_last_four() {
        let config = StoredConfig {
            api_key: "AIzaSecret1234".into(),
            ..Default::default()
        };
        assert_eq!(config.key_preview(), "••••1234");
    }

    #[test]
    fn test_key_preview_empty_without_key() {
        assert_eq!(StoredConfig::default().key_preview(), "");
    }

    #[test]
    fn test_key_preview_masks_short_keys() {
        for key in ["a", "ab", "abcd"] {
            let short = StoredConfig {
                api_key: key.into(),
                ..Default::default()
            };
            assert_eq!(short.key_preview(), "••••", "{key}");
        }
        let five = StoredConfig {
            api_key: "abcde".into(),
            ..Default::default()
        };
        assert_eq!(five.key_preview(), "••••bcde");
    }
}
