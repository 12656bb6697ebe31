use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::{anyhow, Context};
use url::Url;

pub const DEFAULT_SETTINGS_FILE: &str = "client.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub viewer_id: Option<i64>,
    pub poll_interval_ms: u64,
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            viewer_id: None,
            poll_interval_ms: 2000,
            request_timeout_secs: None,
        }
    }
}

impl ClientSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Rejects URLs reqwest could not send to.
    pub fn validate(&self) -> anyhow::Result<()> {
        let url = Url::parse(&self.server_url)
            .with_context(|| format!("invalid server_url '{}'", self.server_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "server_url must use http or https, got '{}'",
                url.scheme()
            ));
        }
        Ok(())
    }

    fn apply(&mut self, values: &HashMap<String, String>) {
        if let Some(v) = values.get("server_url") {
            self.server_url = v.clone();
        }
        if let Some(v) = values.get("viewer_id").and_then(|v| v.parse().ok()) {
            self.viewer_id = Some(v);
        }
        if let Some(v) = values.get("poll_interval_ms").and_then(|v| v.parse().ok()) {
            self.poll_interval_ms = v;
        }
        if let Some(v) = values
            .get("request_timeout_secs")
            .and_then(|v| v.parse().ok())
        {
            self.request_timeout_secs = Some(v);
        }
    }
}

/// Defaults, then the settings file (usually `client.toml`), then `APP__*`
/// environment variables. A missing or unreadable file leaves the defaults.
pub fn load_settings_from(
    file: &Path,
    env: impl IntoIterator<Item = (String, String)>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(file) {
        if let Some(values) = parse_settings_file(&raw) {
            settings.apply(&values);
        }
    }

    let env_values: HashMap<String, String> = env
        .into_iter()
        .filter_map(|(key, value)| {
            key.strip_prefix("APP__")
                .map(|name| (name.to_ascii_lowercase(), value))
        })
        .collect();
    settings.apply(&env_values);

    settings
}

/// Flat `key = value` tables only; values of any scalar type are read as text.
fn parse_settings_file(raw: &str) -> Option<HashMap<String, String>> {
    let table = toml::from_str::<toml::Table>(raw).ok()?;
    Some(
        table
            .into_iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    toml::Value::String(s) => s,
                    toml::Value::Integer(i) => i.to_string(),
                    toml::Value::Float(f) => f.to_string(),
                    toml::Value::Boolean(b) => b.to_string(),
                    _ => return None,
                };
                Some((key, text))
            })
            .collect(),
    )
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
