//! Configuration management for Tweetcast
//!
//! The configuration is consumed by whatever builds the concrete transport
//! (credentials, auth mode) and by the posting client (rate-limit intervals).
//!
//! ```toml
//! [auth]
//! auth_type = "oauth1"
//! api_key = "..."
//! api_secret = "..."
//! access_token = "..."
//! access_token_secret = "..."
//!
//! [rate_limit]
//! min_interval = "1s"
//!
//! [rate_limit.overrides]
//! media = "5s"
//! ```

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::rate_limiter::DEFAULT_MIN_INTERVAL;
use crate::types::ActionCategory;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// How the transport authenticates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    /// OAuth 1.0a user context (consumer key/secret + access token/secret)
    #[default]
    OAuth1,
    /// OAuth 2.0 user-context bearer token
    OAuth2,
}

impl AuthType {
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "oauth1" => Some(Self::OAuth1),
            "oauth2" => Some(Self::OAuth2),
            _ => None,
        }
    }
}

/// Credentials for the transport builder
///
/// Secret values are held in [`SecretString`], redacted from `Debug` output,
/// zeroed on drop and never serialized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub auth_type: AuthType,
    #[serde(default, skip_serializing, deserialize_with = "deserialize_secret")]
    pub api_key: Option<SecretString>,
    #[serde(default, skip_serializing, deserialize_with = "deserialize_secret")]
    pub api_secret: Option<SecretString>,
    #[serde(default, skip_serializing, deserialize_with = "deserialize_secret")]
    pub access_token: Option<SecretString>,
    #[serde(default, skip_serializing, deserialize_with = "deserialize_secret")]
    pub access_token_secret: Option<SecretString>,
    #[serde(default, skip_serializing, deserialize_with = "deserialize_secret")]
    pub bearer_token: Option<SecretString>,
}

fn deserialize_secret<'de, D>(deserializer: D) -> std::result::Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Spacing for every category, e.g. "1s" or "500ms"
    pub min_interval: Option<String>,
    /// Per-category spacing keyed by category name
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

impl RateLimitConfig {
    pub fn default_interval(&self) -> Result<Duration> {
        match &self.min_interval {
            Some(value) => parse_interval("rate_limit.min_interval", value),
            None => Ok(DEFAULT_MIN_INTERVAL),
        }
    }

    pub fn category_intervals(&self) -> Result<HashMap<ActionCategory, Duration>> {
        self.overrides
            .iter()
            .map(|(name, value)| -> Result<(ActionCategory, Duration)> {
                let field = format!("rate_limit.overrides.{}", name);
                let category = ActionCategory::from_name(name).ok_or_else(|| {
                    ConfigError::InvalidValue {
                        field: field.clone(),
                        reason: "unknown category (expected tweet, media or search)".to_string(),
                    }
                })?;
                Ok((category, parse_interval(&field, value)?))
            })
            .collect()
    }
}

fn parse_interval(field: &str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value.trim()).map_err(|e| {
        ConfigError::InvalidValue {
            field: field.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

impl Config {
    /// Load configuration from the default location, apply environment
    /// overrides and validate it
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        let mut config = Self::load_from_path(&config_path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Override credentials from `TWEETCAST_*` environment variables
    ///
    /// Empty variables are ignored.
    pub fn apply_env_overrides(&mut self) {
        fn var(name: &str) -> Option<String> {
            std::env::var(name).ok().filter(|v| !v.trim().is_empty())
        }

        if let Some(auth_type) = var("TWEETCAST_AUTH_TYPE").and_then(|v| AuthType::from_name(&v))
        {
            self.auth.auth_type = auth_type;
        }

        let overrides = [
            ("TWEETCAST_API_KEY", &mut self.auth.api_key),
            ("TWEETCAST_API_SECRET", &mut self.auth.api_secret),
            ("TWEETCAST_ACCESS_TOKEN", &mut self.auth.access_token),
            ("TWEETCAST_ACCESS_TOKEN_SECRET", &mut self.auth.access_token_secret),
            ("TWEETCAST_BEARER_TOKEN", &mut self.auth.bearer_token),
        ];
        for (name, field) in overrides {
            if let Some(value) = var(name) {
                *field = Some(SecretString::from(value));
            }
        }
    }

    /// Check that the credentials required by the auth type are present and
    /// the rate-limit intervals parse
    pub fn validate(&self) -> Result<()> {
        let required: Vec<(&str, &Option<SecretString>)> = match self.auth.auth_type {
            AuthType::OAuth1 => vec![
                ("auth.api_key", &self.auth.api_key),
                ("auth.api_secret", &self.auth.api_secret),
                ("auth.access_token", &self.auth.access_token),
                ("auth.access_token_secret", &self.auth.access_token_secret),
            ],
            AuthType::OAuth2 => vec![("auth.bearer_token", &self.auth.bearer_token)],
        };

        for (field, value) in required {
            let present = value
                .as_ref()
                .is_some_and(|v| !v.expose_secret().trim().is_empty());
            if !present {
                return Err(ConfigError::MissingField(field.to_string()).into());
            }
        }

        self.rate_limit.default_interval()?;
        self.rate_limit.category_intervals()?;
        Ok(())
    }
}

/// Resolve the configuration file path using the platform config directory
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("TWEETCAST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("tweetcast").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TweetcastError;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const OAUTH1_CONFIG: &str = r#"
[auth]
auth_type = "oauth1"
api_key = "key"
api_secret = "secret"
access_token = "token"
access_token_secret = "token-secret"

[rate_limit]
min_interval = "2s"

[rate_limit.overrides]
media = "500ms"
"#;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn exposed(value: &Option<SecretString>) -> Option<&str> {
        value.as_ref().map(|v| v.expose_secret())
    }

    fn clear_env() {
        for name in [
            "TWEETCAST_CONFIG",
            "TWEETCAST_AUTH_TYPE",
            "TWEETCAST_API_KEY",
            "TWEETCAST_API_SECRET",
            "TWEETCAST_ACCESS_TOKEN",
            "TWEETCAST_ACCESS_TOKEN_SECRET",
            "TWEETCAST_BEARER_TOKEN",
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn test_load_from_path() {
        let file = write_config(OAUTH1_CONFIG);
        let config = Config::load_from_path(file.path()).unwrap();

        assert_eq!(config.auth.auth_type, AuthType::OAuth1);
        assert_eq!(exposed(&config.auth.api_key), Some("key"));
        assert!(config.validate().is_ok());

        assert_eq!(
            config.rate_limit.default_interval().unwrap(),
            Duration::from_secs(2)
        );
        let intervals = config.rate_limit.category_intervals().unwrap();
        assert_eq!(
            intervals.get(&ActionCategory::Media),
            Some(&Duration::from_millis(500))
        );
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let result = Config::load_from_path(Path::new("/nonexistent/tweetcast.toml"));
        assert!(matches!(
            result,
            Err(TweetcastError::Config(ConfigError::ReadError(_)))
        ));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let file = write_config("[auth\napi_key = ");
        let result = Config::load_from_path(file.path());
        assert!(matches!(
            result,
            Err(TweetcastError::Config(ConfigError::ParseError(_)))
        ));
    }

    #[test]
    fn test_default_rate_limit() {
        let config = Config::default();
        assert_eq!(
            config.rate_limit.default_interval().unwrap(),
            DEFAULT_MIN_INTERVAL
        );
        assert!(config.rate_limit.category_intervals().unwrap().is_empty());
    }

    #[test]
    fn test_oauth1_requires_all_four_credentials() {
        let file = write_config(
            r#"
[auth]
auth_type = "oauth1"
api_key = "key"
api_secret = "secret"
access_token = "token"
"#,
        );
        let config = Config::load_from_path(file.path()).unwrap();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("auth.access_token_secret"));
    }

    #[test]
    fn test_oauth2_requires_bearer_token() {
        let mut config = Config::default();
        config.auth.auth_type = AuthType::OAuth2;
        config.auth.bearer_token = Some(SecretString::from("   ".to_string()));

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("auth.bearer_token"));

        config.auth.bearer_token = Some(SecretString::from("bearer".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_interval() {
        let mut config = Config::default();
        config.rate_limit.min_interval = Some("soon".to_string());

        let err = config.rate_limit.default_interval().unwrap_err();
        assert!(err.to_string().contains("rate_limit.min_interval"));
    }

    #[test]
    fn test_unknown_override_category() {
        let mut config = Config::default();
        config
            .rate_limit
            .overrides
            .insert("dm".to_string(), "1s".to_string());

        let err = config.rate_limit.category_intervals().unwrap_err();
        assert!(err.to_string().contains("rate_limit.overrides.dm"));
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let file = write_config(OAUTH1_CONFIG);
        let config = Config::load_from_path(file.path()).unwrap();

        let debug = format!("{:?}", config);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("token-secret"));
        assert!(!debug.contains("\"key\""));
    }

    #[test]
    fn test_serialized_config_omits_credentials() {
        let file = write_config(OAUTH1_CONFIG);
        let mut config = Config::load_from_path(file.path()).unwrap();
        config.auth.access_token_secret = Some(SecretString::from("super-secret-value".to_string()));

        let serialized = toml::to_string(&config).unwrap();

        assert!(!serialized.contains("super-secret-value"));
        assert!(!serialized.contains("access_token"));
        assert!(!serialized.contains("api_key"));
        assert!(serialized.contains("oauth1"));
        assert!(serialized.contains("min_interval"));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        std::env::set_var("TWEETCAST_AUTH_TYPE", "oauth2");
        std::env::set_var("TWEETCAST_BEARER_TOKEN", "from-env");
        std::env::set_var("TWEETCAST_API_KEY", "");

        let file = write_config(OAUTH1_CONFIG);
        let mut config = Config::load_from_path(file.path()).unwrap();
        config.apply_env_overrides();

        assert_eq!(config.auth.auth_type, AuthType::OAuth2);
        assert_eq!(exposed(&config.auth.bearer_token), Some("from-env"));
        // Empty variables leave the file value alone
        assert_eq!(exposed(&config.auth.api_key), Some("key"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_uses_env_path() {
        clear_env();
        let file = write_config(OAUTH1_CONFIG);
        std::env::set_var("TWEETCAST_CONFIG", file.path());

        let config = Config::load().unwrap();
        assert_eq!(exposed(&config.auth.access_token), Some("token"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_resolve_config_path_default() {
        clear_env();
        let home = tempfile::tempdir().unwrap();
        let previous_home = std::env::var_os("HOME");
        let previous_xdg = std::env::var_os("XDG_CONFIG_HOME");
        std::env::set_var("HOME", home.path());
        std::env::set_var("XDG_CONFIG_HOME", home.path().join(".config"));

        let resolved = resolve_config_path();

        match previous_home {
            Some(value) => std::env::set_var("HOME", value),
            None => std::env::remove_var("HOME"),
        }
        match previous_xdg {
            Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }

        let path = resolved.unwrap();
        assert!(path.ends_with("tweetcast/config.toml"));
    }

    #[test]
    #[serial]
    fn test_resolve_config_path_expands_env_override() {
        clear_env();
        std::env::set_var("TWEETCAST_CONFIG", "/etc/tweetcast/custom.toml");

        let path = resolve_config_path().unwrap();
        assert_eq!(path, PathBuf::from("/etc/tweetcast/custom.toml"));

        clear_env();
    }
}
