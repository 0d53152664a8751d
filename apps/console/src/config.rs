use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use shared::protocol::DEFAULT_ACTIVITY_LIMIT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleSettings {
    pub base_url: String,
    pub activity_limit: u32,
    pub placeholder_activity: bool,
    pub request_timeout_secs: Option<u64>,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".into(),
            activity_limit: DEFAULT_ACTIVITY_LIMIT,
            placeholder_activity: false,
            request_timeout_secs: None,
        }
    }
}

impl ConsoleSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    base_url: Option<String>,
    activity_limit: Option<u32>,
    placeholder_activity: Option<bool>,
    request_timeout_secs: Option<u64>,
}

/// Defaults, then `path` if it exists, then environment variables.
pub fn load_settings(path: &Path) -> anyhow::Result<ConsoleSettings> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

fn load_settings_with(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ConsoleSettings> {
    let mut settings = ConsoleSettings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
        if let Some(v) = file_cfg.base_url {
            settings.base_url = v;
        }
        if let Some(v) = file_cfg.activity_limit {
            settings.activity_limit = v;
        }
        if let Some(v) = file_cfg.placeholder_activity {
            settings.placeholder_activity = v;
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            settings.request_timeout_secs = Some(v);
        }
    }

    if let Some(v) = env("CONSOLE_BASE_URL") {
        settings.base_url = v;
    }
    if let Some(v) = env("APP__BASE_URL") {
        settings.base_url = v;
    }

    if let Some(v) = env("APP__ACTIVITY_LIMIT") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.activity_limit = parsed;
        }
    }

    if let Some(v) = env("APP__PLACEHOLDER_ACTIVITY") {
        settings.placeholder_activity = matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        );
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = Some(parsed);
        }
    }

    Ok(settings)
}
