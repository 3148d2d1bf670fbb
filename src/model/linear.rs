use super::vectorizer::FeatureMatrix;
use super::PredictionLabel;
use ndarray::Array1;
use serde::Deserialize;

/// On-disk export of a fitted binary linear classifier (logistic
/// regression, linear SVM, ...). `coef` and `intercept` are accepted both
/// flat and in scikit-learn's `(1, n_features)` / `(1,)` shapes.
#[derive(Debug, Deserialize)]
pub struct ClassifierArtifact {
    pub coef: Coefficients,
    pub intercept: Intercept,
    #[serde(default = "default_classes")]
    pub classes: [i64; 2],
}

fn default_classes() -> [i64; 2] {
    [0, 1]
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Coefficients {
    Flat(Vec<f64>),
    Rows(Vec<Vec<f64>>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Intercept {
    Scalar(f64),
    Array(Vec<f64>),
}

#[derive(Debug, Clone)]
pub struct LinearClassifier {
    coef: Array1<f64>,
    intercept: f64,
    /// Label for a non-positive decision, then for a positive one.
    classes: [PredictionLabel; 2],
}

impl TryFrom<ClassifierArtifact> for LinearClassifier {
    type Error = String;

    fn try_from(artifact: ClassifierArtifact) -> Result<Self, Self::Error> {
        let coef = match artifact.coef {
            Coefficients::Flat(c) => c,
            Coefficients::Rows(mut rows) if rows.len() == 1 => rows.remove(0),
            Coefficients::Rows(rows) => {
                return Err(format!(
                    "expected a single coefficient row for a binary classifier, got {}",
                    rows.len()
                ))
            }
        };
        if coef.is_empty() {
            return Err("coefficient vector is empty".to_string());
        }

        let intercept = match artifact.intercept {
            Intercept::Scalar(b) => b,
            Intercept::Array(b) if b.len() == 1 => b[0],
            Intercept::Array(b) => {
                return Err(format!("expected a single intercept, got {}", b.len()))
            }
        };

        let [neg, pos] = artifact.classes;
        let classes = [PredictionLabel::try_from(neg)?, PredictionLabel::try_from(pos)?];
        if classes[0] == classes[1] {
            return Err(format!("classes must be distinct, got [{}, {}]", neg, pos));
        }

        Ok(Self {
            coef: Array1::from(coef),
            intercept,
            classes,
        })
    }
}

impl LinearClassifier {
    pub fn n_features(&self) -> usize {
        self.coef.len()
    }

    /// `w · x + b` for every row of `features`.
    pub fn decision_function(&self, features: &FeatureMatrix) -> Array1<f64> {
        Array1::from_iter((0..features.n_rows()).map(|i| {
            features
                .row(i)
                .map(|(col, value)| self.coef[col] * value)
                .sum::<f64>()
                + self.intercept
        }))
    }

    pub fn predict(&self, features: &FeatureMatrix) -> Vec<PredictionLabel> {
        self.decision_function(features)
            .iter()
            .map(|&d| if d > 0.0 { self.classes[1] } else { self.classes[0] })
            .collect()
    }
}
