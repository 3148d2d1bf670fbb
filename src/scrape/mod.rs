pub mod webdriver;

use crate::config::FetcherConfig;
use crate::error::PipelineError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::Instant;
use url::Url;

const MAX_USERNAME_LEN: usize = 15;

/// Launches browser sessions.
#[async_trait]
pub trait Browser: Send + Sync {
    async fn open(&self) -> Result<Box<dyn BrowserSession>>;
}

/// One live browser session. Callers must `quit` it exactly once.
#[async_trait]
pub trait BrowserSession: Send {
    async fn navigate(&mut self, url: &str) -> Result<()>;
    /// Rendered text of every element matching `css`, in document order.
    async fn element_texts(&mut self, css: &str) -> Result<Vec<String>>;
    /// Synthetic PAGE_DOWN on the page body.
    async fn scroll_down(&mut self) -> Result<()>;
    async fn quit(&mut self) -> Result<()>;
}

/// Strip an optional leading `@` and check the handle grammar.
pub fn validate_username(raw: &str) -> Result<&str, PipelineError> {
    let trimmed = raw.trim();
    let name = trimmed.strip_prefix('@').unwrap_or(trimmed);
    let valid = (1..=MAX_USERNAME_LEN).contains(&name.len())
        && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if valid {
        Ok(name)
    } else {
        Err(PipelineError::InvalidUsername(raw.to_string()))
    }
}

/// Distinct texts in first-seen order.
#[derive(Debug, Default)]
struct PostSet {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl PostSet {
    fn contains(&self, text: &str) -> bool {
        self.seen.contains(text)
    }

    fn extend(&mut self, texts: Vec<String>) {
        for text in texts {
            if text.trim().is_empty() || self.seen.contains(&text) {
                continue;
            }
            self.seen.insert(text.clone());
            self.ordered.push(text);
        }
    }

    fn len(&self) -> usize {
        self.ordered.len()
    }

    fn into_first(mut self, count: usize) -> Vec<String> {
        self.ordered.truncate(count);
        self.ordered
    }
}

/// Warns if a session is dropped without `quit`, which happens when the
/// `fetch` future is cancelled mid-flight. Cleanup needs an await, so a
/// cancelled fetch leaks the remote session until the driver reaps it.
struct OpenSession<'a> {
    url: &'a Url,
    closed: bool,
}

impl Drop for OpenSession<'_> {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!(url = %self.url, "fetch cancelled, browser session left open");
        }
    }
}

/// Collects post texts from a profile page with bounded scan/scroll cycles.
pub struct ContentFetcher {
    browser: Arc<dyn Browser>,
    config: FetcherConfig,
}

impl ContentFetcher {
    pub fn new(browser: Arc<dyn Browser>, config: FetcherConfig) -> Self {
        Self { browser, config }
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    pub fn profile_url(&self, username: &str) -> Result<Url, PipelineError> {
        let name = validate_username(username)?;
        let base = format!("{}/", self.config.profile_base_url.trim_end_matches('/'));
        Url::parse(&base)
            .and_then(|b| b.join(name))
            .with_context(|| format!("invalid profile base URL: {}", self.config.profile_base_url))
            .map_err(PipelineError::FetchFailure)
    }

    /// Up to `count` distinct post texts, or `None` when nothing was found.
    ///
    /// Once opened, the browser session is closed on every path that runs to
    /// completion. A cancelled fetch only logs the leak.
    pub async fn fetch(&self, username: &str, count: usize) -> Result<Option<Vec<String>>, PipelineError> {
        let url = self.profile_url(username)?;
        if count == 0 {
            return Ok(None);
        }

        let mut session = self
            .browser
            .open()
            .await
            .map_err(PipelineError::FetchFailure)?;

        let mut guard = OpenSession {
            url: &url,
            closed: false,
        };
        let outcome = self.collect(session.as_mut(), url.as_str(), count).await;

        if let Err(e) = session.quit().await {
            tracing::warn!(error = %format!("{:#}", e), "failed to close browser session");
        }
        guard.closed = true;

        let posts = outcome.map_err(PipelineError::FetchFailure)?;
        tracing::info!(url = %url, requested = count, collected = posts.len(), "fetch finished");
        Ok(if posts.is_empty() { None } else { Some(posts) })
    }

    async fn collect(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
        count: usize,
    ) -> Result<Vec<String>> {
        session
            .navigate(url)
            .await
            .with_context(|| format!("navigation to {} failed", url))?;

        let mut posts = PostSet::default();
        let mut visible = self
            .wait_for_new_posts(session, &posts, self.config.settle_timeout())
            .await?;

        for attempt in 1..=self.config.max_attempts {
            posts.extend(visible);
            tracing::debug!(attempt, collected = posts.len(), "scanned page");
            if posts.len() >= count || attempt == self.config.max_attempts {
                break;
            }

            session.scroll_down().await.context("scroll failed")?;
            visible = self
                .wait_for_new_posts(session, &posts, self.config.scroll_timeout())
                .await?;
        }

        Ok(posts.into_first(count))
    }

    /// Poll the post selector until a text not yet in `seen` is rendered or
    /// `timeout` elapses; returns the last scan either way.
    async fn wait_for_new_posts(
        &self,
        session: &mut dyn BrowserSession,
        seen: &PostSet,
        timeout: std::time::Duration,
    ) -> Result<Vec<String>> {
        let deadline = Instant::now() + timeout;
        loop {
            let texts = session
                .element_texts(&self.config.post_selector)
                .await
                .context("post query failed")?;
            let now = Instant::now();
            let has_new = texts
                .iter()
                .any(|t| !t.trim().is_empty() && !seen.contains(t));
            if has_new || now >= deadline {
                return Ok(texts);
            }
            let remaining = deadline.saturating_duration_since(now);
            tokio::time::sleep(self.config.poll_interval().min(remaining)).await;
        }
    }
}
