//! Application configuration
//!
//! Read from a TOML file, then overridden by environment variables. Secrets
//! never appear in the form and are held as [`SecretString`].
//!
//! ```toml
//! bind = "127.0.0.1:8501"
//! vocabulary_path = "data/lista_categorias.csv"
//! utc_offset_hours = -5
//!
//! [sheets]
//! api_base = "https://sheets.googleapis.com/v4"
//! timeout_secs = 15
//!
//! [secrets]
//! token = "..."
//! spreadsheet_key = "..."
//! access_token = "..."
//! ```

use crate::error::ConfigError;
use chrono::FixedOffset;
use secrecy::SecretString;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Environment override for the shared form token
pub const ENV_TOKEN: &str = "FOTOREG_TOKEN";
/// Environment override for the spreadsheet key
pub const ENV_SPREADSHEET_KEY: &str = "FOTOREG_SPREADSHEET_KEY";
/// Environment override for the spreadsheet access token
pub const ENV_ACCESS_TOKEN: &str = "FOTOREG_ACCESS_TOKEN";
/// Environment override for the listen address
pub const ENV_BIND: &str = "FOTOREG_BIND";

/// Default Google Sheets endpoint
pub const DEFAULT_SHEETS_API: &str = "https://sheets.googleapis.com/v4";

/// Spreadsheet service settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SheetsSettings {
    /// REST endpoint root
    pub api_base: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for SheetsSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_SHEETS_API.to_string(),
            timeout_secs: 15,
        }
    }
}

/// Out-of-band secrets
#[derive(Debug)]
pub struct Secrets {
    /// Token users must type into the form
    pub token: SecretString,
    /// Key of the destination spreadsheet
    pub spreadsheet_key: SecretString,
    /// OAuth bearer token for the spreadsheet service
    pub access_token: SecretString,
}

/// Resolved configuration
#[derive(Debug)]
pub struct AppConfig {
    /// Listen address of the form server
    pub bind: SocketAddr,
    /// Reference data CSV
    pub vocabulary_path: PathBuf,
    /// Zone used for write timestamps
    pub zone: FixedOffset,
    /// Spreadsheet service settings
    pub sheets: SheetsSettings,
    /// Secrets
    pub secrets: Secrets,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    bind: Option<String>,
    vocabulary_path: Option<PathBuf>,
    utc_offset_hours: Option<i32>,
    sheets: SheetsSettings,
    secrets: RawSecrets,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawSecrets {
    token: Option<String>,
    spreadsheet_key: Option<String>,
    access_token: Option<String>,
}

impl AppConfig {
    /// Load from an optional file plus the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Load with a custom environment lookup
    pub fn load_with_env(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let text = match path {
            Some(path) => std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?,
            None => String::new(),
        };
        Self::from_toml_with_env(&text, env)
    }

    /// Parse TOML text and apply environment overrides
    pub fn from_toml_with_env(
        text: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text)?;

        let bind_text = env(ENV_BIND)
            .or(raw.bind)
            .unwrap_or_else(|| "127.0.0.1:8501".to_string());
        let bind = bind_text
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                key: "bind",
                reason: format!("{bind_text}: {e}"),
            })?;

        let utc_offset_hours = raw.utc_offset_hours.unwrap_or(-5);
        let zone = (-23..=23)
            .contains(&utc_offset_hours)
            .then(|| FixedOffset::east_opt(utc_offset_hours * 3600))
            .flatten()
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "utc_offset_hours",
                reason: format!("{utc_offset_hours} is not between -23 and 23"),
            })?;

        if raw.sheets.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "sheets.timeout_secs",
                reason: "must be positive".to_string(),
            });
        }

        let secrets = Secrets {
            token: secret(&env, raw.secrets.token, "token", ENV_TOKEN)?,
            spreadsheet_key: secret(
                &env,
                raw.secrets.spreadsheet_key,
                "spreadsheet_key",
                ENV_SPREADSHEET_KEY,
            )?,
            access_token: secret(
                &env,
                raw.secrets.access_token,
                "access_token",
                ENV_ACCESS_TOKEN,
            )?,
        };

        Ok(Self {
            bind,
            vocabulary_path: raw
                .vocabulary_path
                .unwrap_or_else(|| PathBuf::from("data/lista_categorias.csv")),
            zone,
            sheets: raw.sheets,
            secrets,
        })
    }
}

fn secret(
    env: &impl Fn(&str) -> Option<String>,
    from_file: Option<String>,
    key: &'static str,
    env_key: &'static str,
) -> Result<SecretString, ConfigError> {
    env(env_key)
        .or(from_file)
        .filter(|v| !v.is_empty())
        .map(SecretString::from)
        .ok_or(ConfigError::MissingSecret { key, env: env_key })
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    const FULL: &str = r#"
bind = "0.0.0.0:9000"
vocabulary_path = "listas.csv"

[sheets]
timeout_secs = 5

[secrets]
token = "clave"
spreadsheet_key = "1AbC"
access_token = "ya29.x"
"#;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn parses_file() {
        let config = AppConfig::from_toml_with_env(FULL, no_env).unwrap();
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.vocabulary_path, PathBuf::from("listas.csv"));
        assert_eq!(config.sheets.timeout_secs, 5);
        assert_eq!(config.sheets.api_base, DEFAULT_SHEETS_API);
        assert_eq!(config.secrets.token.expose_secret(), "clave");
        assert_eq!(config.zone.local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn environment_overrides_file() {
        let config = AppConfig::from_toml_with_env(FULL, |key| {
            (key == ENV_TOKEN).then(|| "desde-env".to_string())
        })
        .unwrap();
        assert_eq!(config.secrets.token.expose_secret(), "desde-env");
        assert_eq!(config.secrets.spreadsheet_key.expose_secret(), "1AbC");
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = AppConfig::from_toml_with_env("", no_env).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingSecret { key: "token", .. }
        ));
    }

    #[test]
    fn secrets_from_env_only() {
        let config = AppConfig::from_toml_with_env("", |key| match key {
            ENV_TOKEN | ENV_SPREADSHEET_KEY | ENV_ACCESS_TOKEN => Some("x".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.bind.port(), 8501);
    }

    #[test]
    fn rejects_bad_offset_and_unknown_keys() {
        let text = "utc_offset_hours = 40\n[secrets]\ntoken='a'\nspreadsheet_key='b'\naccess_token='c'\n";
        assert!(matches!(
            AppConfig::from_toml_with_env(text, no_env),
            Err(ConfigError::InvalidValue { key: "utc_offset_hours", .. })
        ));
        assert!(matches!(
            AppConfig::from_toml_with_env("colour = 'red'", no_env),
            Err(ConfigError::Parse(_))
        ));
    }
}
