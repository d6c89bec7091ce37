use std::{collections::HashMap, fs, path::Path, time::Duration};

use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "reader.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReaderSettings {
    pub api_base_url: String,
    pub database_url: String,
    pub request_timeout_ms: u64,
    pub title_debounce_ms: u64,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            api_base_url: "https://szentiras.hu/api/".into(),
            database_url: "sqlite://./data/reader.db".into(),
            request_timeout_ms: 5_000,
            title_debounce_ms: 500,
        }
    }
}

impl ReaderSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn title_debounce(&self) -> Duration {
        Duration::from_millis(self.title_debounce_ms)
    }
}

pub fn load_settings() -> ReaderSettings {
    load_settings_from(Path::new(DEFAULT_CONFIG_FILE), |key| std::env::var(key).ok())
}

/// Reads `path` (a flat string table) and then applies environment overrides.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> ReaderSettings {
    let mut settings = ReaderSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("api_base_url") {
                settings.api_base_url = v.clone();
            }
            if let Some(v) = file_cfg.get("database_url") {
                settings.database_url = v.clone();
            }
            if let Some(v) = file_cfg.get("request_timeout_ms").and_then(|v| v.parse().ok()) {
                settings.request_timeout_ms = v;
            }
            if let Some(v) = file_cfg.get("title_debounce_ms").and_then(|v| v.parse().ok()) {
                settings.title_debounce_ms = v;
            }
        }
    }

    if let Some(v) = env("READER_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
        settings.request_timeout_ms = v;
    }
    if let Some(v) = env("APP__TITLE_DEBOUNCE_MS").and_then(|v| v.parse().ok()) {
        settings.title_debounce_ms = v;
    }

    settings
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    storage::ensure_sqlite_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return ReaderSettings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
