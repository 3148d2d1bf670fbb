use crate::error::PipelineError;
use crate::model::{ModelError, PredictionLabel, SentimentPredictor};
use crate::report::{self, AnalysisResult, SentimentReport};
use crate::scrape::ContentFetcher;
use crate::text;
use std::sync::Arc;

/// Scrape → normalize → classify → summarize for one username.
pub struct Pipeline {
    fetcher: ContentFetcher,
    predictor: Arc<dyn SentimentPredictor>,
    post_count: usize,
}

impl Pipeline {
    pub fn new(fetcher: ContentFetcher, predictor: Arc<dyn SentimentPredictor>) -> Self {
        let post_count = fetcher.config().post_count;
        Self {
            fetcher,
            predictor,
            post_count,
        }
    }

    /// Override the number of posts requested per analysis.
    pub fn with_post_count(mut self, count: usize) -> Self {
        self.post_count = count;
        self
    }

    /// Run the full analysis. An empty scrape yields
    /// [`AnalysisResult::NoContent`]; every other failure is an error.
    pub async fn analyze(&self, username: &str) -> Result<AnalysisResult, PipelineError> {
        let Some(posts) = self.fetcher.fetch(username, self.post_count).await? else {
            tracing::info!(username, "no posts found");
            return Ok(AnalysisResult::no_content());
        };

        let normalized = text::normalize_all(&posts);
        let labels = self.predictor.predict(&normalized)?;
        let report = assemble(posts, normalized, labels)?;

        tracing::info!(
            username,
            total = report.summary.total,
            positive = report.summary.positive_count,
            negative = report.summary.negative_count,
            "analysis complete"
        );
        Ok(AnalysisResult::Analyzed(report))
    }
}

/// Join a fetched batch with its labels. The batch is non-empty by the
/// fetch contract; an empty one is an error here, never `NoContent`.
fn assemble(
    posts: Vec<String>,
    normalized: Vec<String>,
    labels: Vec<PredictionLabel>,
) -> Result<SentimentReport, PipelineError> {
    if labels.len() != posts.len() {
        return Err(ModelError::BatchSizeMismatch {
            expected: posts.len(),
            actual: labels.len(),
        }
        .into());
    }

    let tweets = report::build_records(posts, normalized, labels);
    let summary = report::summarize(&tweets).ok_or_else(|| {
        PipelineError::FetchFailure(anyhow::anyhow!("fetch returned an empty post batch"))
    })?;
    Ok(SentimentReport { tweets, summary })
}
