//! Session Configuration Module
//!
//! Branding text and feature toggles for the stage, resolved once at startup
//! by layering deployment overrides on top of built-in defaults. Overrides
//! come from `IMPROV_*` environment variables (a `.env` file is honoured).

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Fully-resolved configuration. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionConfig {
    pub page_title: String,
    pub page_description: String,
    pub company_name: String,

    pub supports_chat_input: bool,
    pub supports_video_input: bool,
    pub supports_screen_share: bool,
    pub is_pre_connect_buffer_enabled: bool,

    pub logo: String,
    pub start_button_text: String,
    pub accent: Option<String>,
    pub logo_dark: Option<String>,
    pub accent_dark: Option<String>,

    // Hosted sandbox backend.
    pub sandbox_id: Option<String>,
    pub agent_name: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            company_name: "Improv Battle".to_string(),
            page_title: "Improv Battle - Voice Improv Game Show".to_string(),
            page_description: "Think fast, act faster, make us laugh - AI-powered improv game"
                .to_string(),

            supports_chat_input: true,
            supports_video_input: false,
            supports_screen_share: false,
            is_pre_connect_buffer_enabled: true,

            logo: "/lk-logo.svg".to_string(),
            accent: Some("#9333ea".to_string()),
            logo_dark: Some("/lk-logo-dark.svg".to_string()),
            accent_dark: Some("#a855f7".to_string()),
            start_button_text: "Take The Stage".to_string(),

            sandbox_id: None,
            agent_name: None,
        }
    }
}

/// Deployment-provided overrides. `None` means "keep the default".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfigOverrides {
    pub page_title: Option<String>,
    pub page_description: Option<String>,
    pub company_name: Option<String>,

    pub supports_chat_input: Option<bool>,
    pub supports_video_input: Option<bool>,
    pub supports_screen_share: Option<bool>,
    pub is_pre_connect_buffer_enabled: Option<bool>,

    pub logo: Option<String>,
    pub start_button_text: Option<String>,
    pub accent: Option<String>,
    pub logo_dark: Option<String>,
    pub accent_dark: Option<String>,

    pub sandbox_id: Option<String>,
    pub agent_name: Option<String>,
}

impl SessionConfigOverrides {
    /// Reads overrides from the process environment.
    ///
    /// *   `IMPROV_PAGE_TITLE`, `IMPROV_PAGE_DESCRIPTION`, `IMPROV_COMPANY_NAME`
    /// *   `IMPROV_START_BUTTON_TEXT`, `IMPROV_LOGO`, `IMPROV_LOGO_DARK`
    /// *   `IMPROV_ACCENT`, `IMPROV_ACCENT_DARK`
    /// *   `IMPROV_SUPPORTS_CHAT_INPUT`, `IMPROV_SUPPORTS_VIDEO_INPUT`,
    ///     `IMPROV_SUPPORTS_SCREEN_SHARE`, `IMPROV_PRE_CONNECT_BUFFER` (booleans)
    /// *   `IMPROV_SANDBOX_ID`, `IMPROV_AGENT_NAME`
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Same as [`from_env`](Self::from_env) but over an explicit set of variables.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut overrides = Self::default();
        for (key, value) in vars {
            let value = value.into();
            match key.as_ref() {
                "IMPROV_PAGE_TITLE" => overrides.page_title = Some(value),
                "IMPROV_PAGE_DESCRIPTION" => overrides.page_description = Some(value),
                "IMPROV_COMPANY_NAME" => overrides.company_name = Some(value),
                "IMPROV_START_BUTTON_TEXT" => overrides.start_button_text = Some(value),
                "IMPROV_LOGO" => overrides.logo = Some(value),
                "IMPROV_LOGO_DARK" => overrides.logo_dark = Some(value),
                "IMPROV_ACCENT" => overrides.accent = Some(value),
                "IMPROV_ACCENT_DARK" => overrides.accent_dark = Some(value),
                "IMPROV_SANDBOX_ID" => overrides.sandbox_id = Some(value),
                "IMPROV_AGENT_NAME" => overrides.agent_name = Some(value),
                "IMPROV_SUPPORTS_CHAT_INPUT" => {
                    overrides.supports_chat_input = Some(parse_flag(key.as_ref(), &value)?)
                }
                "IMPROV_SUPPORTS_VIDEO_INPUT" => {
                    overrides.supports_video_input = Some(parse_flag(key.as_ref(), &value)?)
                }
                "IMPROV_SUPPORTS_SCREEN_SHARE" => {
                    overrides.supports_screen_share = Some(parse_flag(key.as_ref(), &value)?)
                }
                "IMPROV_PRE_CONNECT_BUFFER" => {
                    overrides.is_pre_connect_buffer_enabled =
                        Some(parse_flag(key.as_ref(), &value)?)
                }
                _ => {}
            }
        }
        Ok(overrides)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("'{value}' is not a boolean"),
        )),
    }
}

impl SessionConfig {
    /// Loads overrides from the environment and resolves them against the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::resolve(SessionConfigOverrides::from_env()?)?;
        tracing::debug!("Resolved session config: {:?}", config);
        Ok(config)
    }

    /// Merges `overrides` onto the defaults field by field and validates the result.
    pub fn resolve(overrides: SessionConfigOverrides) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            page_title: overrides.page_title.unwrap_or(defaults.page_title),
            page_description: overrides.page_description.unwrap_or(defaults.page_description),
            company_name: overrides.company_name.unwrap_or(defaults.company_name),

            supports_chat_input: overrides
                .supports_chat_input
                .unwrap_or(defaults.supports_chat_input),
            supports_video_input: overrides
                .supports_video_input
                .unwrap_or(defaults.supports_video_input),
            supports_screen_share: overrides
                .supports_screen_share
                .unwrap_or(defaults.supports_screen_share),
            is_pre_connect_buffer_enabled: overrides
                .is_pre_connect_buffer_enabled
                .unwrap_or(defaults.is_pre_connect_buffer_enabled),

            logo: overrides.logo.unwrap_or(defaults.logo),
            start_button_text: overrides
                .start_button_text
                .unwrap_or(defaults.start_button_text),
            accent: overrides.accent.or(defaults.accent),
            logo_dark: overrides.logo_dark.or(defaults.logo_dark),
            accent_dark: overrides.accent_dark.or(defaults.accent_dark),

            sandbox_id: overrides.sandbox_id.or(defaults.sandbox_id),
            agent_name: overrides.agent_name.or(defaults.agent_name),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("page_title", &self.page_title),
            ("page_description", &self.page_description),
            ("company_name", &self.company_name),
            ("logo", &self.logo),
            ("start_button_text", &self.start_button_text),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyField(name));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_overrides_yields_defaults() {
        let config = SessionConfig::resolve(SessionConfigOverrides::default()).unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.start_button_text, "Take The Stage");
        assert!(config.sandbox_id.is_none());
    }

    #[test]
    fn test_overrides_win_only_when_present() {
        let overrides = SessionConfigOverrides {
            company_name: Some("Late Night Laughs".to_string()),
            supports_video_input: Some(true),
            agent_name: Some("host".to_string()),
            ..Default::default()
        };
        let config = SessionConfig::resolve(overrides).unwrap();

        assert_eq!(config.company_name, "Late Night Laughs");
        assert!(config.supports_video_input);
        assert_eq!(config.agent_name.as_deref(), Some("host"));
        // Untouched fields keep their defaults.
        assert_eq!(config.page_title, "Improv Battle - Voice Improv Game Show");
        assert!(config.supports_chat_input);
    }

    #[test]
    fn test_blank_optional_is_distinct_from_unset() {
        let overrides = SessionConfigOverrides {
            accent: Some(String::new()),
            ..Default::default()
        };
        let config = SessionConfig::resolve(overrides).unwrap();
        assert_eq!(config.accent.as_deref(), Some(""));
        assert_eq!(config.sandbox_id, None);
    }

    #[test]
    fn test_empty_required_field_fails_at_load() {
        let overrides = SessionConfigOverrides {
            start_button_text: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(
            SessionConfig::resolve(overrides),
            Err(ConfigError::EmptyField("start_button_text"))
        );
    }

    #[test]
    fn test_from_vars_parses_strings_and_flags() {
        let vars = [
            ("IMPROV_PAGE_TITLE", "Friday Improv"),
            ("IMPROV_SUPPORTS_CHAT_INPUT", "no"),
            ("IMPROV_PRE_CONNECT_BUFFER", "FALSE"),
            ("IMPROV_SANDBOX_ID", "sbx-42"),
            ("UNRELATED", "ignored"),
        ];
        let overrides = SessionConfigOverrides::from_vars(vars).unwrap();
        assert_eq!(overrides.page_title.as_deref(), Some("Friday Improv"));
        assert_eq!(overrides.supports_chat_input, Some(false));
        assert_eq!(overrides.is_pre_connect_buffer_enabled, Some(false));
        assert_eq!(overrides.sandbox_id.as_deref(), Some("sbx-42"));
        assert_eq!(overrides.supports_video_input, None);
    }

    #[test]
    fn test_from_vars_rejects_bad_flag() {
        let result = SessionConfigOverrides::from_vars([("IMPROV_SUPPORTS_SCREEN_SHARE", "maybe")]);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue(key, _)) if key == "IMPROV_SUPPORTS_SCREEN_SHARE"
        ));
    }

    #[test]
    fn test_overrides_deserialize_from_json() {
        let overrides: SessionConfigOverrides =
            serde_json::from_str(r#"{"companyName": "Improv Night", "supportsScreenShare": true}"#)
                .unwrap();
        let config = SessionConfig::resolve(overrides).unwrap();
        assert_eq!(config.company_name, "Improv Night");
        assert!(config.supports_screen_share);
    }
}
