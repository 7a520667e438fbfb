use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::provider::ProviderKind;

pub const DEFAULT_PORT: u16 = 4173;
pub const DEFAULT_PROVIDER_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL_NAME: &str = "gemini-2.0-flash";

/// Process configuration loaded from the environment.
///
/// `~/.cvgenx.env` and `./.env` are loaded first when present. Everything has
/// a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub provider: ProviderKind,
    pub provider_url: String,
    pub default_model: String,
    pub reset_db: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            dotenvy::from_path(home.join(".cvgenx.env")).ok(); // optional
        }
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let data_dir = match std::env::var("CVGENX_DATA_DIR") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()
                .context("Could not determine the home directory; set CVGENX_DATA_DIR")?
                .join(".cvgenx"),
        };

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| format!("sqlite://{}", data_dir.join("cvgenx.db").display()));

        Ok(Config {
            database_url,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            provider: std::env::var("CVGENX_PROVIDER")
                .unwrap_or_else(|_| "gemini".to_string())
                .parse::<ProviderKind>()
                .map_err(anyhow::Error::msg)
                .context("CVGENX_PROVIDER must name a supported provider")?,
            provider_url: optional_env("CVGENX_PROVIDER_URL", DEFAULT_PROVIDER_URL),
            default_model: optional_env("CVGENX_DEFAULT_MODEL", DEFAULT_MODEL_NAME),
            reset_db: std::env::var("CVGENX_RESET_DB").is_ok_and(|v| v == "1"),
            data_dir,
        })
    }

    /// The model to use when the stored configuration names none.
    pub fn model_or_default<'a>(&'a self, stored: &'a str) -> &'a str {
        if stored.trim().is_empty() {
            &self.default_model
        } else {
            stored
        }
    }
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
impl Config {
    /// Configuration for tests: in-memory database, mock-friendly provider URL.
    pub fn for_tests(provider_url: &str) -> Self {
        Config {
            data_dir: std::env::temp_dir(),
            database_url: "sqlite::memory:".to_string(),
            port: DEFAULT_PORT,
            rust_log: "debug".to_string(),
            provider: ProviderKind::Gemini,
            provider_url: provider_url.to_string(),
            default_model: DEFAULT_MODEL_NAME.to_string(),
            reset_db: false,
        }
    }
}
