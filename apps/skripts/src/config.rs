use std::{fs, path::PathBuf, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use url::Url;

pub const SETTINGS_FILE: &str = "skripts.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub api_base: String,
    pub data_dir: Option<PathBuf>,
    pub undo_window_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".into(),
            api_base: "/api".into(),
            data_dir: dirs::data_local_dir().map(|dir| dir.join("skripts")),
            undo_window_ms: 5000,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    api_base: Option<String>,
    data_dir: Option<PathBuf>,
    undo_window_ms: Option<u64>,
}

impl Settings {
    /// Resolves the API root. An absolute `api_base` wins over `server_url`.
    pub fn api_url(&self) -> anyhow::Result<Url> {
        if let Ok(absolute) = Url::parse(&self.api_base) {
            return Ok(absolute);
        }
        let server = Url::parse(&self.server_url)
            .with_context(|| format!("invalid server url {:?}", self.server_url))?;
        server
            .join(&self.api_base)
            .with_context(|| format!("invalid api base {:?}", self.api_base))
    }

    pub fn undo_window(&self) -> Duration {
        Duration::from_millis(self.undo_window_ms)
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("skripts.log"))
    }
}

/// Reads `skripts.toml` and the process environment. Problems are returned
/// as warnings for the caller to log once a subscriber is installed.
pub fn load_settings() -> (Settings, Vec<String>) {
    let file = fs::read_to_string(SETTINGS_FILE).ok();
    layered_settings(file.as_deref(), |key| std::env::var(key).ok())
}

pub fn layered_settings(
    file: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> (Settings, Vec<String>) {
    let mut settings = Settings::default();
    let mut warnings = Vec::new();

    if let Some(raw) = file {
        if let Err(err) = apply_file(&mut settings, raw) {
            warnings.push(format!("ignoring {SETTINGS_FILE}: {err:#}"));
        }
    }
    warnings.extend(apply_env(&mut settings, lookup));

    (settings, warnings)
}

pub fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file: FileSettings = toml::from_str(raw).context("parse settings file")?;
    if let Some(v) = file.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file.api_base {
        settings.api_base = v;
    }
    if let Some(v) = file.data_dir {
        settings.data_dir = Some(v);
    }
    if let Some(v) = file.undo_window_ms {
        settings.undo_window_ms = v;
    }
    Ok(())
}

pub fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Some(v) = lookup("SKRIPTS_SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = lookup("API_BASE") {
        settings.api_base = v;
    }
    if let Some(v) = lookup("SKRIPTS_API_BASE") {
        settings.api_base = v;
    }

    if let Some(v) = lookup("SKRIPTS_DATA_DIR") {
        settings.data_dir = Some(PathBuf::from(v));
    }

    if let Some(v) = lookup("SKRIPTS_UNDO_WINDOW_MS") {
        match v.parse() {
            Ok(ms) => settings.undo_window_ms = ms,
            Err(_) => {
                warnings.push(format!("ignoring non-numeric SKRIPTS_UNDO_WINDOW_MS {v:?}"))
            }
        }
    }

    warnings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
