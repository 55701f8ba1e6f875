use std::path::PathBuf;

use anyhow::{Context, Result};

/// Default per-file upload ceiling (5 MiB).
pub const DEFAULT_MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Every variable has a default, so a bare `cargo run` starts a local server.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Directory uploaded attachments are written to and served from.
    pub upload_dir: PathBuf,
    /// Static asset directory; `logo.png` is picked up from here.
    pub public_dir: PathBuf,
    /// `None` means uploads are unrestricted in size.
    pub upload_max_file_bytes: Option<u64>,
    pub upload_mime_filter: bool,
    pub organization_name: String,
    /// Text rendered in place of a missing form field.
    pub missing_field_placeholder: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: env_or(
                "DATABASE_URL",
                "postgres://127.0.0.1:5432/application_db",
            ),
            port: env_or("PORT", "3000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            upload_dir: PathBuf::from(env_or("UPLOAD_DIR", "uploads")),
            public_dir: PathBuf::from(env_or("PUBLIC_DIR", "public")),
            upload_max_file_bytes: parse_size_limit(&env_or(
                "UPLOAD_MAX_FILE_BYTES",
                &DEFAULT_MAX_FILE_BYTES.to_string(),
            ))
            .context("UPLOAD_MAX_FILE_BYTES must be a non-negative integer")?,
            upload_mime_filter: parse_flag(&env_or("UPLOAD_MIME_FILTER", "false"))
                .context("UPLOAD_MIME_FILTER must be a boolean")?,
            organization_name: env_or("ORGANIZATION_NAME", "7S IQ PRIVATE LIMITED"),
            missing_field_placeholder: env_or("MISSING_FIELD_PLACEHOLDER", ""),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// `0` disables the limit.
fn parse_size_limit(raw: &str) -> Result<Option<u64>> {
    let bytes = raw
        .trim()
        .parse::<u64>()
        .with_context(|| format!("'{raw}' is not a byte count"))?;
    Ok((bytes > 0).then_some(bytes))
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("'{other}' is not a boolean"),
    }
}

#[cfg(test)]
impl Config {
    /// Config pointing at throwaway directories, with the source defaults otherwise.
    pub fn for_tests(upload_dir: PathBuf, public_dir: PathBuf) -> Self {
        Config {
            database_url: "postgres://localhost/unused".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            upload_dir,
            public_dir,
            upload_max_file_bytes: Some(DEFAULT_MAX_FILE_BYTES),
            upload_mime_filter: false,
            organization_name: "7S IQ PRIVATE LIMITED".to_string(),
            missing_field_placeholder: String::new(),
        }
    }
}
