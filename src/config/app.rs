// src/config/app.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

use crate::ingest::providers::linkedin_rss::{DEFAULT_TIMEOUT_SECS, LINKEDIN_JOBS_URL};
use crate::ingest::types::SearchQuery;
use crate::notify::discord::{DEFAULT_FOOTER, DEFAULT_PACING_MS, MAX_DESCRIPTION_CHARS};
use crate::store::DEFAULT_TTL_DAYS;

pub const ENV_CONFIG_FILE: &str = "CONFIG_FILE";
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// One `job_searches` entry as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub keywords: String,
    pub location: String,
    /// Literal URL or `${ENV_VAR}` placeholder.
    #[serde(default)]
    pub webhook_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            base_url: LINKEDIN_JOBS_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierSettings {
    /// Wait after each webhook call, in milliseconds.
    pub pacing_ms: u64,
    pub timeout_secs: u64,
    pub max_description_chars: usize,
    pub footer: String,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            pacing_ms: DEFAULT_PACING_MS,
            timeout_secs: 10,
            max_description_chars: MAX_DESCRIPTION_CHARS,
            footer: DEFAULT_FOOTER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    File,
    Memory,
    S3,
    Disabled,
}

pub const ENV_S3_BUCKET: &str = "S3_BUCKET";

impl StoreKind {
    /// Backend used when the config names none: `s3` once `S3_BUCKET` is set
    /// (and the crate is built with S3 support), the local file otherwise.
    pub fn from_env() -> Self {
        let bucket_set = env::var(ENV_S3_BUCKET).is_ok_and(|b| !b.trim().is_empty());
        if bucket_set && cfg!(feature = "s3") {
            StoreKind::S3
        } else {
            StoreKind::File
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreKind,
    pub path: String,
    pub ttl_days: i64,
    pub bucket: Option<String>,
    pub prefix: Option<String>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreKind::from_env(),
            path: crate::store::file::DEFAULT_PATH.to_string(),
            ttl_days: DEFAULT_TTL_DAYS,
            bucket: None,
            prefix: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub job_searches: Vec<SearchConfig>,
    #[serde(default)]
    pub feed: FeedSettings,
    #[serde(default)]
    pub notifier: NotifierSettings,
    #[serde(default)]
    pub store: StoreSettings,
}

impl AppConfig {
    /// Load from an explicit path; TOML or JSON by extension. Placeholders
    /// are resolved against the process environment.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let mut cfg = parse_config(&content, ext.as_str())
            .with_context(|| format!("parsing config {}", path.display()))?;
        cfg.resolve_placeholders(|name| env::var(name).ok());
        Ok(cfg)
    }

    /// `$CONFIG_FILE` (default `config.json`); on any error log it and fall
    /// back to [`AppConfig::fallback`].
    pub fn load_default() -> Self {
        let path = env::var(ENV_CONFIG_FILE).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        match Self::load_from(Path::new(&path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "config unavailable; using default searches");
                Self::fallback()
            }
        }
    }

    /// devops in Stockholm and Oslo, webhooks from `STOCKHOLM_WEBHOOK_URL` / `OSLO_WEBHOOK_URL`.
    pub fn fallback() -> Self {
        let search = |location: &str, var: &str| SearchConfig {
            keywords: "devops".to_string(),
            location: location.to_string(),
            webhook_url: env::var(var).unwrap_or_default(),
        };
        Self {
            job_searches: vec![
                search("stockholm", "STOCKHOLM_WEBHOOK_URL"),
                search("oslo", "OSLO_WEBHOOK_URL"),
            ],
            ..Self::default()
        }
    }

    /// Replace `${NAME}` webhook URLs with `lookup(NAME)`, empty when unset.
    pub fn resolve_placeholders<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for s in &mut self.job_searches {
            if let Some(name) = placeholder_name(&s.webhook_url) {
                s.webhook_url = lookup(name).unwrap_or_default();
            }
        }
    }

    pub fn queries(&self) -> Vec<SearchQuery> {
        self.job_searches
            .iter()
            .map(|s| SearchQuery::new(&s.keywords, &s.location, s.webhook_url.trim()))
            .collect()
    }
}

fn placeholder_name(s: &str) -> Option<&str> {
    let name = s.trim().strip_prefix("${")?.strip_suffix('}')?;
    (!name.is_empty()).then_some(name)
}

fn parse_config(s: &str, hint_ext: &str) -> Result<AppConfig> {
    let (first, second): (fn(&str) -> Result<AppConfig>, fn(&str) -> Result<AppConfig>) =
        if hint_ext == "toml" {
            (parse_toml, parse_json)
        } else {
            (parse_json, parse_toml)
        };
    match first(s) {
        Ok(v) => Ok(v),
        Err(e) => second(s).map_err(|_| anyhow!("unsupported config format: {e:#}")),
    }
}

fn parse_toml(s: &str) -> Result<AppConfig> {
    Ok(toml::from_str(s)?)
}

fn parse_json(s: &str) -> Result<AppConfig> {
    Ok(serde_json::from_str(s)?)
}
