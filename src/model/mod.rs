//! Frozen sentiment model: TF-IDF vectorizer plus binary linear classifier.
//!
//! Both artifacts are loaded once at startup and shared read-only.

pub mod linear;
pub mod vectorizer;

use crate::config::ModelConfig;
use linear::{ClassifierArtifact, LinearClassifier};
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use vectorizer::{TfidfVectorizer, VectorizerArtifact};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model artifact {path} is missing or unreadable")]
    ArtifactMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model artifact {path} is corrupt")]
    ArtifactCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("model artifact {path} is invalid: {reason}")]
    InvalidArtifact { path: PathBuf, reason: String },
    #[error("feature dimension mismatch: classifier expects {expected}, vectorizer produces {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("predictor returned {actual} labels for {expected} inputs")]
    BatchSizeMismatch { expected: usize, actual: usize },
}

/// Binary sentiment label. Serialized as the bare integer the model emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredictionLabel {
    Negative = 0,
    Positive = 1,
}

impl TryFrom<i64> for PredictionLabel {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Negative),
            1 => Ok(Self::Positive),
            other => Err(format!("unsupported class label {}", other)),
        }
    }
}

impl Serialize for PredictionLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let content = std::fs::read_to_string(path).map_err(|source| ModelError::ArtifactMissing {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ModelError::ArtifactCorrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// The immutable vectorizer/classifier pair.
#[derive(Debug)]
pub struct SentimentModel {
    vectorizer: TfidfVectorizer,
    classifier: LinearClassifier,
}

impl SentimentModel {
    pub fn new(vectorizer: TfidfVectorizer, classifier: LinearClassifier) -> Result<Self, ModelError> {
        if vectorizer.n_features() != classifier.n_features() {
            return Err(ModelError::DimensionMismatch {
                expected: classifier.n_features(),
                actual: vectorizer.n_features(),
            });
        }
        Ok(Self {
            vectorizer,
            classifier,
        })
    }

    /// Load both artifacts. Any failure here is a startup error.
    pub fn load(config: &ModelConfig) -> Result<Self, ModelError> {
        let vectorizer_artifact: VectorizerArtifact = read_artifact(&config.vectorizer_path)?;
        let vectorizer = TfidfVectorizer::try_from(vectorizer_artifact).map_err(|reason| {
            ModelError::InvalidArtifact {
                path: config.vectorizer_path.clone(),
                reason,
            }
        })?;

        let classifier_artifact: ClassifierArtifact = read_artifact(&config.classifier_path)?;
        let classifier = LinearClassifier::try_from(classifier_artifact).map_err(|reason| {
            ModelError::InvalidArtifact {
                path: config.classifier_path.clone(),
                reason,
            }
        })?;

        tracing::info!(
            features = vectorizer.n_features(),
            vectorizer = %config.vectorizer_path.display(),
            classifier = %config.classifier_path.display(),
            "sentiment model loaded"
        );
        Self::new(vectorizer, classifier)
    }
}

/// Seam between the pipeline and whatever produces labels.
pub trait SentimentPredictor: Send + Sync {
    /// One label per input, same order.
    fn predict(&self, normalized: &[String]) -> Result<Vec<PredictionLabel>, ModelError>;
}

/// Batched inference over a shared [`SentimentModel`].
#[derive(Debug, Clone)]
pub struct SentimentClassifier {
    model: Arc<SentimentModel>,
}

impl SentimentClassifier {
    pub fn new(model: Arc<SentimentModel>) -> Self {
        Self { model }
    }
}

impl SentimentPredictor for SentimentClassifier {
    fn predict(&self, normalized: &[String]) -> Result<Vec<PredictionLabel>, ModelError> {
        let features = self.model.vectorizer.transform(normalized);
        if features.n_features != self.model.classifier.n_features() {
            return Err(ModelError::DimensionMismatch {
                expected: self.model.classifier.n_features(),
                actual: features.n_features,
            });
        }
        let labels = self.model.classifier.predict(&features);
        tracing::debug!(batch = normalized.len(), nnz = features.nnz(), "classified batch");
        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VECTORIZER: &str = r#"{
        "vocabulary": {"love": 0, "thi": 1, "terribl": 2, "great": 3},
        "idf": [1.5, 1.0, 1.5, 1.5]
    }"#;
    const CLASSIFIER: &str = r#"{"coef": [[2.0, 0.0, -2.0, 1.5]], "intercept": [-0.1]}"#;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    fn model_config(dir: &Path, vectorizer: &str, classifier: &str) -> ModelConfig {
        ModelConfig {
            vectorizer_path: write_file(dir, "vectorizer.json", vectorizer),
            classifier_path: write_file(dir, "classifier.json", classifier),
        }
    }

    #[test]
    fn test_load_and_predict_batch() {
        let dir = tempfile::tempdir().unwrap();
        let model = SentimentModel::load(&model_config(dir.path(), VECTORIZER, CLASSIFIER)).unwrap();
        let clf = SentimentClassifier::new(Arc::new(model));

        let labels = clf
            .predict(&[
                "i love thi".to_string(),
                "thi is terribl".to_string(),
                String::new(),
            ])
            .unwrap();
        assert_eq!(
            labels,
            vec![
                PredictionLabel::Positive,
                PredictionLabel::Negative,
                PredictionLabel::Negative
            ]
        );
    }

    #[test]
    fn test_predict_empty_batch() {
        let dir = tempfile::tempdir().unwrap();
        let model = SentimentModel::load(&model_config(dir.path(), VECTORIZER, CLASSIFIER)).unwrap();
        let clf = SentimentClassifier::new(Arc::new(model));
        assert!(clf.predict(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_missing_artifact() {
        let config = ModelConfig {
            vectorizer_path: PathBuf::from("no/such/vectorizer.json"),
            classifier_path: PathBuf::from("no/such/model.json"),
        };
        let err = SentimentModel::load(&config).unwrap_err();
        assert!(matches!(err, ModelError::ArtifactMissing { .. }), "{err}");
    }

    #[test]
    fn test_corrupt_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = SentimentModel::load(&model_config(dir.path(), VECTORIZER, "\u{80}pickle"))
            .unwrap_err();
        assert!(matches!(err, ModelError::ArtifactCorrupt { .. }), "{err}");
    }

    #[test]
    fn test_invalid_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = SentimentModel::load(&model_config(
            dir.path(),
            VECTORIZER,
            r#"{"coef": [1.0], "intercept": 0.0, "classes": [0, 7]}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidArtifact { .. }), "{err}");
    }

    #[test]
    fn test_dimension_mismatch_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let err = SentimentModel::load(&model_config(
            dir.path(),
            VECTORIZER,
            r#"{"coef": [1.0, 2.0], "intercept": 0.0}"#,
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            ModelError::DimensionMismatch {
                expected: 2,
                actual: 4
            }
        ));
    }

    #[test]
    fn test_label_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&PredictionLabel::Positive).unwrap(), "1");
        assert_eq!(serde_json::to_string(&PredictionLabel::Negative).unwrap(), "0");
        assert_eq!(PredictionLabel::try_from(1).unwrap(), PredictionLabel::Positive);
        assert!(PredictionLabel::try_from(2).is_err());
    }
}
