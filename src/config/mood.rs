// src/config/mood.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

pub const ENV_CONFIG_PATH: &str = "MOOD_CONFIG_PATH";
pub const ENV_STORE_PATH: &str = "MOOD_STORE_PATH";
pub const ENV_VALIDITY_SECS: &str = "MOOD_VALIDITY_SECS";
pub const ENV_EVICTION_SECS: &str = "MOOD_EVICTION_SECS";

fn default_validity_window_secs() -> u64 {
    30 * 60
}
fn default_eviction_window_secs() -> u64 {
    60 * 60
}
fn default_max_headlines() -> usize {
    15
}
fn default_per_provider_limit() -> usize {
    8
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; MarketMoodBot/0.1)".to_string()
}
fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::new(
            "Economic Times",
            "https://economictimes.indiatimes.com/markets",
            "h3 a, h2 a, .eachStory h3 a",
        ),
        SourceConfig::new(
            "Business Standard",
            "https://www.business-standard.com/markets",
            "h2 a, h3 a, .cardheading a",
        ),
        SourceConfig::new(
            "MoneyControl",
            "https://www.moneycontrol.com/news/business/markets/",
            "h2 a, h3 a, .news_title a",
        ),
    ]
}

/// A news page scraped for headline links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    /// CSS selector matching the headline `<a>` elements.
    pub selector: String,
}

impl SourceConfig {
    pub fn new(name: &str, url: &str, selector: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            selector: selector.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodConfig {
    /// A cached batch is served while younger than this.
    #[serde(default = "default_validity_window_secs")]
    pub validity_window_secs: u64,
    /// Rows older than this are deleted on every commit.
    #[serde(default = "default_eviction_window_secs")]
    pub eviction_window_secs: u64,
    #[serde(default = "default_max_headlines")]
    pub max_headlines: usize,
    #[serde(default = "default_per_provider_limit")]
    pub per_provider_limit: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// JSON file backing the headline table; in-memory when absent.
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self {
            validity_window_secs: default_validity_window_secs(),
            eviction_window_secs: default_eviction_window_secs(),
            max_headlines: default_max_headlines(),
            per_provider_limit: default_per_provider_limit(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
            store_path: None,
            sources: default_sources(),
        }
    }
}

impl MoodConfig {
    /// Load from an explicit path. Supports TOML or JSON (by extension).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading mood config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let cfg: MoodConfig = match ext.as_str() {
            "json" => serde_json::from_str(&content).context("parsing mood config json")?,
            "toml" => toml::from_str(&content).context("parsing mood config toml")?,
            other => bail!("unsupported mood config format: {other:?}"),
        };
        Ok(cfg.sanitized())
    }

    /// Load using env var + fallbacks, then apply env overrides:
    /// 1) $MOOD_CONFIG_PATH
    /// 2) config/mood.toml
    /// 3) config/mood.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        let base = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else if Path::new("config/mood.toml").exists() {
            Self::load_from_file("config/mood.toml")?
        } else if Path::new("config/mood.json").exists() {
            Self::load_from_file("config/mood.json")?
        } else {
            Self::default()
        };
        Ok(base.with_env_overrides())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(p) = env::var(ENV_STORE_PATH).ok().filter(|s| !s.trim().is_empty()) {
            self.store_path = Some(PathBuf::from(p.trim()));
        }
        if let Some(v) = parse_secs_env(env::var(ENV_VALIDITY_SECS).ok()) {
            self.validity_window_secs = v;
        }
        if let Some(v) = parse_secs_env(env::var(ENV_EVICTION_SECS).ok()) {
            self.eviction_window_secs = v;
        }
        self.sanitized()
    }

    fn sanitized(mut self) -> Self {
        if self.validity_window_secs == 0 {
            self.validity_window_secs = default_validity_window_secs();
        }
        // never evict a batch that could still be served
        if self.eviction_window_secs < self.validity_window_secs {
            self.eviction_window_secs = self.validity_window_secs;
        }
        if self.max_headlines == 0 {
            self.max_headlines = default_max_headlines();
        }
        if self.per_provider_limit == 0 {
            self.per_provider_limit = default_per_provider_limit();
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = default_request_timeout_secs();
        }
        self
    }
}

// positive integer seconds, anything else ignored
fn parse_secs_env(raw: Option<String>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok()).filter(|v| *v > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let c = MoodConfig::default();
        assert_eq!(c.validity_window_secs, 1800);
        assert_eq!(c.eviction_window_secs, 3600);
        assert_eq!(c.max_headlines, 15);
        assert_eq!(c.per_provider_limit, 8);
        assert_eq!(c.request_timeout_secs, 10);
        assert_eq!(c.sources.len(), 3);
        assert!(c.store_path.is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults_and_sanitizes() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("mood.toml");
        fs::write(
            &p,
            r#"
validity_window_secs = 600
eviction_window_secs = 60

[[sources]]
name = "Local"
url = "http://127.0.0.1:9/markets"
selector = "h2 a"
"#,
        )
        .unwrap();
        let c = MoodConfig::load_from_file(&p).unwrap();
        assert_eq!(c.validity_window_secs, 600);
        assert_eq!(c.eviction_window_secs, 600); // raised to validity
        assert_eq!(c.max_headlines, 15);
        assert_eq!(c.sources, vec![SourceConfig::new("Local", "http://127.0.0.1:9/markets", "h2 a")]);
    }

    #[test]
    fn json_config_is_supported_and_unknown_ext_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("mood.json");
        fs::write(&p, r#"{"max_headlines": 5, "store_path": "data/h.json"}"#).unwrap();
        let c = MoodConfig::load_from_file(&p).unwrap();
        assert_eq!(c.max_headlines, 5);
        assert_eq!(c.store_path, Some(PathBuf::from("data/h.json")));

        let bad = dir.path().join("mood.yaml");
        fs::write(&bad, "max_headlines: 5").unwrap();
        assert!(MoodConfig::load_from_file(&bad).is_err());
    }

    #[serial_test::serial]
    #[test]
    fn env_path_then_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("mood.json");
        fs::write(&p, r#"{"validity_window_secs": 120}"#).unwrap();

        env::set_var(ENV_CONFIG_PATH, p.display().to_string());
        env::set_var(ENV_EVICTION_SECS, "7200");
        env::set_var(ENV_VALIDITY_SECS, "not-a-number");
        env::set_var(ENV_STORE_PATH, "  /tmp/mood.json ");

        let c = MoodConfig::load_default().unwrap();
        assert_eq!(c.validity_window_secs, 120);
        assert_eq!(c.eviction_window_secs, 7200);
        assert_eq!(c.store_path, Some(PathBuf::from("/tmp/mood.json")));

        env::set_var(ENV_CONFIG_PATH, dir.path().join("missing.toml").display().to_string());
        assert!(MoodConfig::load_default().is_err());

        for k in [ENV_CONFIG_PATH, ENV_EVICTION_SECS, ENV_VALIDITY_SECS, ENV_STORE_PATH] {
            env::remove_var(k);
        }
    }
}
