use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://www.tabnews.com.br/api/v1";
pub const DEFAULT_SITE_URL: &str = "https://www.tabnews.com.br";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub site_url: String,
    pub request_timeout: Duration,
    pub data_dir: PathBuf,
    /// Bearer token for upvotes. Without one the upvote button is disabled.
    pub auth_token: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let request_timeout = match non_empty("TABTOK_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| anyhow!("TABTOK_TIMEOUT_SECS must be a number of seconds, got '{}'", raw))?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let data_dir = match non_empty("TABTOK_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        Ok(Self {
            api_base_url: non_empty("TABTOK_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            site_url: non_empty("TABTOK_SITE_URL").unwrap_or_else(|| DEFAULT_SITE_URL.to_string()),
            request_timeout,
            data_dir,
            auth_token: non_empty("TABTOK_TOKEN"),
        })
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("settings.db")
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let home_dir = dirs_next::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
    Ok(home_dir.join(".tabtok"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup_from(&[("TABTOK_DATA_DIR", "/tmp/tabtok")])).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.site_url, DEFAULT_SITE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.settings_path(), PathBuf::from("/tmp/tabtok/settings.db"));
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn overrides_are_read_and_trailing_slash_dropped() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("TABTOK_API_URL", "http://localhost:3000/api/v1/"),
            ("TABTOK_TIMEOUT_SECS", "5"),
            ("TABTOK_DATA_DIR", "/tmp/x"),
            ("TABTOK_TOKEN", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url, "http://localhost:3000/api/v1");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
    }

    #[test]
    fn blank_token_counts_as_unset() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("TABTOK_DATA_DIR", "/tmp/x"),
            ("TABTOK_TOKEN", "  "),
        ]))
        .unwrap();
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn bad_timeout_is_an_error() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("TABTOK_DATA_DIR", "/tmp/x"),
            ("TABTOK_TIMEOUT_SECS", "soon"),
        ]));
        assert!(result.is_err());
    }
}
