use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_FILE: &str = ".env";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

/// Scan/scroll policy for collecting posts from a rendered profile page.
#[derive(Debug, Deserialize, Clone)]
pub struct FetcherConfig {
    #[serde(default = "default_profile_base_url")]
    pub profile_base_url: String,
    #[serde(default = "default_post_selector")]
    pub post_selector: String,
    #[serde(default = "default_post_count")]
    pub post_count: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_settle_timeout")]
    pub settle_timeout_ms: u64,
    #[serde(default = "default_scroll_timeout")]
    pub scroll_timeout_ms: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_profile_base_url() -> String { "https://twitter.com".to_string() }
fn default_post_selector() -> String { "article div[lang]".to_string() }
fn default_post_count() -> usize { 10 }
fn default_max_attempts() -> u32 { 5 }
fn default_settle_timeout() -> u64 { 3000 }
fn default_scroll_timeout() -> u64 { 2000 }
fn default_poll_interval() -> u64 { 250 }

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            profile_base_url: default_profile_base_url(),
            post_selector: default_post_selector(),
            post_count: default_post_count(),
            max_attempts: default_max_attempts(),
            settle_timeout_ms: default_settle_timeout(),
            scroll_timeout_ms: default_scroll_timeout(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl FetcherConfig {
    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }

    pub fn scroll_timeout(&self) -> Duration {
        Duration::from_millis(self.scroll_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// WebDriver endpoint and the capabilities requested for each session.
#[derive(Debug, Deserialize, Clone)]
pub struct BrowserConfig {
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default = "default_browser_name")]
    pub browser_name: String,
    #[serde(default = "default_browser_args")]
    pub args: Vec<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_webdriver_url() -> String { "http://localhost:9515".to_string() }
fn default_browser_name() -> String { "chrome".to_string() }
fn default_browser_args() -> Vec<String> {
    vec![
        "--headless".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
    ]
}
fn default_request_timeout() -> u64 { 30_000 }

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            browser_name: default_browser_name(),
            args: default_browser_args(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_classifier_path")]
    pub classifier_path: PathBuf,
    #[serde(default = "default_vectorizer_path")]
    pub vectorizer_path: PathBuf,
}

fn default_classifier_path() -> PathBuf { PathBuf::from("trained_model.json") }
fn default_vectorizer_path() -> PathBuf { PathBuf::from("vectorizer.json") }

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            classifier_path: default_classifier_path(),
            vectorizer_path: default_vectorizer_path(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| "Failed to parse config TOML")?;
        Ok(config)
    }

    /// Like `load`, but a missing file yields the built-in defaults.
    /// A file that exists and fails to parse is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Apply `TWEETPULSE_*` environment overrides on top of the file values.
    pub fn apply_env_overrides(&mut self) {
        if let Some(url) = env_value("TWEETPULSE_WEBDRIVER_URL") {
            self.browser.webdriver_url = url;
        }
        if let Some(path) = env_value("TWEETPULSE_CLASSIFIER_PATH") {
            self.model.classifier_path = PathBuf::from(path);
        }
        if let Some(path) = env_value("TWEETPULSE_VECTORIZER_PATH") {
            self.model.vectorizer_path = PathBuf::from(path);
        }
    }

    /// Load .env file into process environment. Real env vars take precedence.
    pub fn load_env_file() {
        let path = Path::new(ENV_FILE);
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return,
        };
        for (key, value) in parse_env_lines(&content) {
            if std::env::var(&key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| sanitize_value(&v))
        .filter(|v| !v.is_empty())
}

/// Parse KEY=VALUE lines, skipping blanks and `#` comments.
fn parse_env_lines(content: &str) -> Vec<(String, String)> {
    // Strip BOM if present (common on Windows-created files)
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    content
        .lines()
        .map(|line| line.trim().trim_matches('\r'))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}

/// Strip carriage returns, BOM, and other invisible chars from a value.
fn sanitize_value(raw: &str) -> String {
    raw.replace(['\r', '\u{feff}', '\u{200b}'], "")
        .trim()
        .to_string()
}
