use crate::model::ModelError;
use thiserror::Error;

/// Failures that abort a single `analyze` call.
///
/// An empty scrape is not among them: it is reported as
/// [`AnalysisResult::NoContent`](crate::report::AnalysisResult::NoContent).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid username {0:?}: expected 1-15 letters, digits or underscores")]
    InvalidUsername(String),
    #[error("failed to fetch posts: {0:#}")]
    FetchFailure(anyhow::Error),
    #[error("classification failed")]
    ClassificationFailure(#[from] ModelError),
}
