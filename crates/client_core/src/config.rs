use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_SETTINGS_FILE: &str = "securechat.toml";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub auth_url: String,
    pub messages_url: String,
    pub poll_interval_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            auth_url: "http://127.0.0.1:8080/auth".into(),
            messages_url: "http://127.0.0.1:8080/messages".into(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl ClientSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn auth_endpoint(&self) -> anyhow::Result<Url> {
        parse_endpoint("auth_url", &self.auth_url)
    }

    pub fn messages_endpoint(&self) -> anyhow::Result<Url> {
        parse_endpoint("messages_url", &self.messages_url)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.auth_endpoint()?;
        self.messages_endpoint()?;
        Ok(())
    }
}

/// Defaults, then the TOML file (if present), then the environment.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<ClientSettings> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_SETTINGS_FILE));
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => toml::from_str::<ClientSettings>(&raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => ClientSettings::default(),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    };

    apply_overrides(&mut settings, |key| std::env::var(key).ok());
    if settings.poll_interval_ms == 0 {
        settings.poll_interval_ms = DEFAULT_POLL_INTERVAL_MS;
    }
    settings.validate()?;
    Ok(settings)
}

pub fn apply_overrides(settings: &mut ClientSettings, vars: impl Fn(&str) -> Option<String>) {
    if let Some(v) = vars("SECURECHAT_AUTH_URL") {
        settings.auth_url = v;
    }
    if let Some(v) = vars("APP__AUTH_URL") {
        settings.auth_url = v;
    }

    if let Some(v) = vars("SECURECHAT_MESSAGES_URL") {
        settings.messages_url = v;
    }
    if let Some(v) = vars("APP__MESSAGES_URL") {
        settings.messages_url = v;
    }

    if let Some(v) = vars("APP__POLL_INTERVAL_MS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.poll_interval_ms = parsed,
            Err(_) => tracing::warn!(value = %v, "ignoring invalid APP__POLL_INTERVAL_MS"),
        }
    }
}

fn parse_endpoint(name: &str, raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid {name} '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("{name} must use http or https, got '{}'", url.scheme());
    }
    Ok(url)
}
