//! Minimal W3C WebDriver client (chromedriver, geckodriver, ...).
//!
//! Only the commands the fetcher needs are implemented: new session,
//! navigate, find element(s), element text, element send keys, delete
//! session.

use super::{Browser, BrowserSession};
use crate::config::BrowserConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// WebDriver key code for PAGE_DOWN.
const PAGE_DOWN: &str = "\u{E00F}";
const STALE_ELEMENT: &str = "stale element reference";
const NO_SUCH_ELEMENT: &str = "no such element";

/// Error object returned by the remote end.
#[derive(Debug, Clone, Error, Deserialize)]
#[error("webdriver error `{error}`: {message}")]
pub struct WebDriverError {
    pub error: String,
    #[serde(default)]
    pub message: String,
}

impl WebDriverError {
    pub fn is_stale_element(&self) -> bool {
        self.error == STALE_ELEMENT || self.error == NO_SUCH_ELEMENT
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    value: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewSession {
    session_id: String,
}

#[derive(Deserialize)]
struct ElementRef {
    // W3C web element identifier key
    #[serde(rename = "element-6066-11e4-a52e-4f735466cecf")]
    id: String,
}

/// Build the `capabilities` payload for a new headless session.
fn capabilities(browser_name: &str, args: &[String]) -> Value {
    let mut always_match = json!({ "browserName": browser_name });
    let options_key = match browser_name {
        "chrome" | "chromium" => Some("goog:chromeOptions"),
        "firefox" => Some("moz:firefoxOptions"),
        "MicrosoftEdge" | "msedge" => Some("ms:edgeOptions"),
        _ => None,
    };
    if let Some(key) = options_key {
        always_match[key] = json!({ "args": args });
    }
    json!({ "capabilities": { "alwaysMatch": always_match } })
}

#[derive(Clone)]
struct Remote {
    client: Client,
}

impl Remote {
    /// Send one command and unwrap the `value` envelope. Non-2xx responses
    /// carrying a W3C error object become [`WebDriverError`].
    async fn command<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> Result<T> {
        let mut req = self.client.request(method.clone(), url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("{} {} failed", method, url))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            if let Ok(Envelope { value }) = serde_json::from_str::<Envelope<WebDriverError>>(&body) {
                return Err(value.into());
            }
            anyhow::bail!("{} {} failed ({}): {}", method, url, status, body);
        }
        let parsed: Envelope<T> = resp
            .json()
            .await
            .with_context(|| format!("failed to parse response of {} {}", method, url))?;
        Ok(parsed.value)
    }
}

/// Connection to a WebDriver server; each `open` starts a fresh session.
pub struct WebDriver {
    remote: Remote,
    base_url: String,
    capabilities: Value,
}

impl WebDriver {
    pub fn new(config: &BrowserConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .context("failed to build WebDriver HTTP client")?;
        Ok(Self {
            remote: Remote { client },
            base_url: config.webdriver_url.trim_end_matches('/').to_string(),
            capabilities: capabilities(&config.browser_name, &config.args),
        })
    }
}

#[async_trait]
impl Browser for WebDriver {
    async fn open(&self) -> Result<Box<dyn BrowserSession>> {
        let url = format!("{}/session", self.base_url);
        let session: NewSession = self
            .remote
            .command(Method::POST, &url, Some(self.capabilities.clone()))
            .await
            .context("failed to start browser session")?;
        tracing::debug!(session_id = %session.session_id, "browser session started");
        Ok(Box::new(WebDriverSession {
            remote: self.remote.clone(),
            session_url: format!("{}/session/{}", self.base_url, session.session_id),
            session_id: session.session_id,
        }))
    }
}

pub struct WebDriverSession {
    remote: Remote,
    session_url: String,
    session_id: String,
}

impl WebDriverSession {
    async fn find_all(&self, css: &str) -> Result<Vec<ElementRef>> {
        let url = format!("{}/elements", self.session_url);
        self.remote
            .command(
                Method::POST,
                &url,
                Some(json!({ "using": "css selector", "value": css })),
            )
            .await
    }

    async fn find_one(&self, css: &str) -> Result<ElementRef> {
        let url = format!("{}/element", self.session_url);
        self.remote
            .command(
                Method::POST,
                &url,
                Some(json!({ "using": "css selector", "value": css })),
            )
            .await
    }

    async fn element_text(&self, element: &ElementRef) -> Result<String> {
        let url = format!("{}/element/{}/text", self.session_url, element.id);
        self.remote.command(Method::GET, &url, None).await
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let endpoint = format!("{}/url", self.session_url);
        let _: Value = self
            .remote
            .command(Method::POST, &endpoint, Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    async fn element_texts(&mut self, css: &str) -> Result<Vec<String>> {
        let elements = self.find_all(css).await?;
        let mut texts = Vec::with_capacity(elements.len());
        for element in &elements {
            match self.element_text(element).await {
                Ok(text) => texts.push(text),
                Err(e) if e.downcast_ref::<WebDriverError>().is_some_and(|w| w.is_stale_element()) => {
                    // Re-rendered between query and read; the next scan picks it up again.
                    tracing::debug!(element = %element.id, "skipping stale element");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(texts)
    }

    async fn scroll_down(&mut self) -> Result<()> {
        let body = self.find_one("body").await.context("page has no body")?;
        let url = format!("{}/element/{}/value", self.session_url, body.id);
        let _: Value = self
            .remote
            .command(
                Method::POST,
                &url,
                Some(json!({ "text": PAGE_DOWN, "value": [PAGE_DOWN] })),
            )
            .await?;
        Ok(())
    }

    async fn quit(&mut self) -> Result<()> {
        let _: Value = self
            .remote
            .command(Method::DELETE, &self.session_url, None)
            .await
            .with_context(|| format!("failed to end browser session {}", self.session_id))?;
        tracing::debug!(session_id = %self.session_id, "browser session ended");
        Ok(())
    }
}
