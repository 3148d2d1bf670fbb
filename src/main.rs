use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tweetpulse::config::Config;
use tweetpulse::model::{SentimentClassifier, SentimentModel};
use tweetpulse::report::NO_CONTENT_MESSAGE;
use tweetpulse::scrape::{webdriver::WebDriver, ContentFetcher};
use tweetpulse::Pipeline;

const CONFIG_FILE: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the JSON result; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tweetpulse=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let fetch_only = args.iter().any(|arg| arg == "--fetch-only");
    let username = match args.iter().find(|arg| !arg.starts_with("--")) {
        Some(name) => name.clone(),
        None => prompt("Twitter username (without @)")?,
    };

    Config::load_env_file();
    let mut config = Config::load_or_default(Path::new(CONFIG_FILE))?;
    config.apply_env_overrides();

    let browser = Arc::new(WebDriver::new(&config.browser)?);
    let fetcher = ContentFetcher::new(browser, config.fetcher.clone());

    if fetch_only {
        match fetcher.fetch(&username, config.fetcher.post_count).await? {
            Some(posts) => println!("{}", posts.join("\n")),
            None => println!("{}", NO_CONTENT_MESSAGE),
        }
        return Ok(());
    }

    let model = SentimentModel::load(&config.model).context("failed to load sentiment model")?;
    let classifier = SentimentClassifier::new(Arc::new(model));
    let pipeline = Pipeline::new(fetcher, Arc::new(classifier));

    let result = pipeline.analyze(&username).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    eprint!("  {} > ", label);
    io::stderr().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let value = input.trim().to_string();
    if value.is_empty() {
        anyhow::bail!("{} cannot be empty", label);
    }
    Ok(value)
}
