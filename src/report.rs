//! Aggregation of per-post predictions into the response payload.

use crate::model::PredictionLabel;
use serde::Serialize;

pub const NO_CONTENT_MESSAGE: &str = "No tweets found.";

/// One analyzed post, in the shape returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub text: String,
    pub stemmed_content: String,
    pub target: PredictionLabel,
}

/// Counts and percentages over a non-empty set of records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentSummary {
    #[serde(skip_serializing)]
    pub positive_count: usize,
    #[serde(skip_serializing)]
    pub negative_count: usize,
    #[serde(skip_serializing)]
    pub total: usize,
    pub positive_percentage: f64,
    pub negative_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentReport {
    pub tweets: Vec<PostRecord>,
    #[serde(flatten)]
    pub summary: SentimentSummary,
}

/// Result of one `analyze` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Analyzed(SentimentReport),
    NoContent { error: &'static str },
}

impl AnalysisResult {
    pub fn no_content() -> Self {
        AnalysisResult::NoContent {
            error: NO_CONTENT_MESSAGE,
        }
    }

    pub fn is_no_content(&self) -> bool {
        matches!(self, AnalysisResult::NoContent { .. })
    }
}

/// Zip raw texts, their normalized forms and predicted labels into records.
/// The three inputs must be the same length.
pub fn build_records(
    raw: Vec<String>,
    normalized: Vec<String>,
    labels: Vec<PredictionLabel>,
) -> Vec<PostRecord> {
    debug_assert!(raw.len() == normalized.len() && raw.len() == labels.len());
    raw.into_iter()
        .zip(normalized)
        .zip(labels)
        .map(|((text, stemmed_content), target)| PostRecord {
            text,
            stemmed_content,
            target,
        })
        .collect()
}

/// Count records by label. `None` for an empty slice, where percentages
/// are undefined.
pub fn summarize(records: &[PostRecord]) -> Option<SentimentSummary> {
    if records.is_empty() {
        return None;
    }

    let total = records.len();
    let positive_count = records
        .iter()
        .filter(|r| r.target == PredictionLabel::Positive)
        .count();
    let negative_count = total - positive_count;

    Some(SentimentSummary {
        positive_count,
        negative_count,
        total,
        positive_percentage: positive_count as f64 / total as f64 * 100.0,
        negative_percentage: negative_count as f64 / total as f64 * 100.0,
    })
}
