#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tweetpulse::config::{FetcherConfig, ModelConfig};
use tweetpulse::model::{ModelError, PredictionLabel, SentimentModel, SentimentPredictor};
use tweetpulse::scrape::{Browser, BrowserSession, ContentFetcher};

pub const VECTORIZER_JSON: &str = r#"{
    "vocabulary": {"love": 0, "thi": 1, "terribl": 2, "great": 3, "aw": 4},
    "idf": [1.0, 1.0, 1.0, 1.0, 1.0]
}"#;

pub const CLASSIFIER_JSON: &str = r#"{
    "coef": [[1.0, 0.0, -1.0, 1.0, -1.0]],
    "intercept": [0.0],
    "classes": [0, 1]
}"#;

#[derive(Default)]
pub struct SessionLog {
    pub opened: AtomicUsize,
    pub scrolls: AtomicUsize,
    pub quits: AtomicUsize,
    pub visited: Mutex<Vec<String>>,
}

impl SessionLog {
    pub fn quits(&self) -> usize {
        self.quits.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

/// In-memory stand-in for a WebDriver server. Page `n` is what the DOM
/// shows after `n` scrolls; the last page repeats once the feed runs dry.
pub struct FakeBrowser {
    pub pages: Vec<Vec<String>>,
    pub fail_open: bool,
    pub fail_on_scroll: Option<usize>,
    pub log: Arc<SessionLog>,
}

impl FakeBrowser {
    pub fn with_pages(pages: &[&[&str]]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|p| p.iter().map(|s| s.to_string()).collect())
                .collect(),
            fail_open: false,
            fail_on_scroll: None,
            log: Arc::new(SessionLog::default()),
        }
    }
}

struct FakeSession {
    pages: Vec<Vec<String>>,
    page: usize,
    fail_on_scroll: Option<usize>,
    log: Arc<SessionLog>,
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn open(&self) -> Result<Box<dyn BrowserSession>> {
        if self.fail_open {
            anyhow::bail!("session not created: chrome not reachable");
        }
        self.log.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            pages: self.pages.clone(),
            page: 0,
            fail_on_scroll: self.fail_on_scroll,
            log: self.log.clone(),
        }))
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.log.visited.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn element_texts(&mut self, _css: &str) -> Result<Vec<String>> {
        Ok(self
            .pages
            .get(self.page)
            .or(self.pages.last())
            .cloned()
            .unwrap_or_default())
    }

    async fn scroll_down(&mut self) -> Result<()> {
        let n = self.log.scrolls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_scroll == Some(n) {
            anyhow::bail!("javascript error: page crashed");
        }
        self.page += 1;
        Ok(())
    }

    async fn quit(&mut self) -> Result<()> {
        self.log.quits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn fetcher(browser: FakeBrowser) -> (ContentFetcher, Arc<SessionLog>) {
    let log = browser.log.clone();
    (ContentFetcher::new(Arc::new(browser), FetcherConfig::default()), log)
}

pub fn load_model(dir: &Path) -> SentimentModel {
    let vectorizer_path = dir.join("vectorizer.json");
    let classifier_path = dir.join("trained_model.json");
    std::fs::write(&vectorizer_path, VECTORIZER_JSON).unwrap();
    std::fs::write(&classifier_path, CLASSIFIER_JSON).unwrap();
    SentimentModel::load(&ModelConfig {
        classifier_path,
        vectorizer_path,
    })
    .unwrap()
}

/// Predictor that records how often it was called and returns a fixed reply.
pub struct CountingPredictor {
    pub calls: AtomicUsize,
    pub reply: fn(&[String]) -> Result<Vec<PredictionLabel>, ModelError>,
}

impl CountingPredictor {
    pub fn new(reply: fn(&[String]) -> Result<Vec<PredictionLabel>, ModelError>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            reply,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SentimentPredictor for CountingPredictor {
    fn predict(&self, normalized: &[String]) -> Result<Vec<PredictionLabel>, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.reply)(normalized)
    }
}
