use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_SCORER_TIMEOUT_SECS: u64 = 120;

/// Application configuration loaded from environment variables.
/// Fails at startup if a numeric variable does not parse.
#[derive(Debug, Clone)]
pub struct Config {
    /// Unset disables score persistence.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub scorer_executable: PathBuf,
    pub scorer_script: Option<PathBuf>,
    /// `None` lets the scorer run until it exits.
    pub scorer_timeout: Option<Duration>,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let timeout_secs: u64 = parse_env("SCORER_TIMEOUT_SECS", DEFAULT_SCORER_TIMEOUT_SECS)?;

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 5)?,
            scorer_executable: optional_env("SCORER_EXECUTABLE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("python3")),
            scorer_script: optional_env("SCORER_SCRIPT").map(PathBuf::from),
            scorer_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            upload_dir: optional_env("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join("resume-uploads")),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Reads a variable, treating an empty value the same as an unset one.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'")),
        None => Ok(default),
    }
}
