//! Frozen TF-IDF vectorizer.
//!
//! Mirrors the transform of a fitted scikit-learn `TfidfVectorizer`
//! exported to JSON: whitespace tokens of at least `min_token_len`
//! characters, n-grams over those tokens, raw or sublinear term frequency,
//! optional idf weighting and row normalization.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// On-disk vectorizer export.
#[derive(Debug, Deserialize)]
pub struct VectorizerArtifact {
    pub vocabulary: HashMap<String, usize>,
    #[serde(default)]
    pub idf: Option<Vec<f64>>,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,
    #[serde(default = "default_min_token_len")]
    pub min_token_len: usize,
}

fn default_ngram_range() -> (usize, usize) { (1, 1) }
fn default_norm() -> Option<Norm> { Some(Norm::L2) }
fn default_min_token_len() -> usize { 2 }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

/// Row-compressed sparse matrix: one row per document.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub n_features: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

impl FeatureMatrix {
    fn new(n_features: usize) -> Self {
        Self {
            n_features,
            indptr: vec![0],
            indices: Vec::new(),
            data: Vec::new(),
        }
    }

    fn push_row(&mut self, row: impl IntoIterator<Item = (usize, f64)>) {
        for (col, value) in row {
            self.indices.push(col);
            self.data.push(value);
        }
        self.indptr.push(self.indices.len());
    }

    pub fn n_rows(&self) -> usize {
        self.indptr.len() - 1
    }

    /// Non-zero `(column, value)` entries of row `i`, ascending by column.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let span = self.indptr[i]..self.indptr[i + 1];
        self.indices[span.clone()]
            .iter()
            .copied()
            .zip(self.data[span].iter().copied())
    }

    pub fn nnz(&self) -> usize {
        self.data.len()
    }
}

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Option<Vec<f64>>,
    ngram_range: (usize, usize),
    sublinear_tf: bool,
    norm: Option<Norm>,
    min_token_len: usize,
}

impl TryFrom<VectorizerArtifact> for TfidfVectorizer {
    type Error = String;

    fn try_from(artifact: VectorizerArtifact) -> Result<Self, Self::Error> {
        let n_features = artifact.vocabulary.len();
        if n_features == 0 {
            return Err("vocabulary is empty".to_string());
        }
        if let Some((term, &col)) = artifact.vocabulary.iter().find(|(_, &c)| c >= n_features) {
            return Err(format!(
                "term '{}' maps to column {} outside vocabulary size {}",
                term, col, n_features
            ));
        }
        if let Some(ref idf) = artifact.idf {
            if idf.len() != n_features {
                return Err(format!(
                    "idf has {} weights for a vocabulary of {} terms",
                    idf.len(),
                    n_features
                ));
            }
        }
        let (min_n, max_n) = artifact.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(format!("invalid ngram_range ({}, {})", min_n, max_n));
        }

        Ok(Self {
            vocabulary: artifact.vocabulary,
            idf: artifact.idf,
            ngram_range: artifact.ngram_range,
            sublinear_tf: artifact.sublinear_tf,
            norm: artifact.norm,
            min_token_len: artifact.min_token_len,
        })
    }
}

impl TfidfVectorizer {
    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    fn terms<'a>(&self, document: &'a str) -> Vec<String> {
        let tokens: Vec<&'a str> = document
            .split_whitespace()
            .filter(|t| t.chars().count() >= self.min_token_len)
            .collect();

        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n {
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        terms
    }

    /// Transform every document into one sparse row. Documents with no
    /// in-vocabulary term produce an all-zero row.
    pub fn transform<S: AsRef<str>>(&self, documents: &[S]) -> FeatureMatrix {
        let mut matrix = FeatureMatrix::new(self.n_features());

        for doc in documents {
            let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
            for term in self.terms(doc.as_ref()) {
                if let Some(&col) = self.vocabulary.get(&term) {
                    *counts.entry(col).or_insert(0.0) += 1.0;
                }
            }

            let mut row: Vec<(usize, f64)> = counts
                .into_iter()
                .map(|(col, tf)| {
                    let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
                    let idf = self.idf.as_ref().map_or(1.0, |idf| idf[col]);
                    (col, tf * idf)
                })
                .collect();

            let norm = match self.norm {
                Some(Norm::L2) => row.iter().map(|(_, v)| v * v).sum::<f64>().sqrt(),
                Some(Norm::L1) => row.iter().map(|(_, v)| v.abs()).sum::<f64>(),
                None => 0.0,
            };
            if norm > 0.0 {
                for (_, v) in &mut row {
                    *v /= norm;
                }
            }

            matrix.push_row(row);
        }

        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vectorizer(json: &str) -> TfidfVectorizer {
        let artifact: VectorizerArtifact = serde_json::from_str(json).unwrap();
        TfidfVectorizer::try_from(artifact).unwrap()
    }

    fn basic() -> TfidfVectorizer {
        vectorizer(
            r#"{
                "vocabulary": {"love": 0, "thi": 1, "terribl": 2},
                "idf": [2.0, 1.0, 3.0]
            }"#,
        )
    }

    #[test]
    fn test_defaults_applied() {
        let v = basic();
        assert_eq!(v.ngram_range, (1, 1));
        assert_eq!(v.norm, Some(Norm::L2));
        assert_eq!(v.min_token_len, 2);
        assert!(!v.sublinear_tf);
    }

    #[test]
    fn test_transform_l2_normalized() {
        let m = basic().transform(&["i love thi"]);
        assert_eq!(m.n_rows(), 1);
        let row: Vec<_> = m.row(0).collect();
        assert_eq!(row.len(), 2);
        let norm = 5.0_f64.sqrt();
        assert_eq!(row[0].0, 0);
        assert!((row[0].1 - 2.0 / norm).abs() < 1e-12);
        assert_eq!(row[1].0, 1);
        assert!((row[1].1 - 1.0 / norm).abs() < 1e-12);
    }

    #[test]
    fn test_empty_and_oov_documents_are_zero_rows() {
        let m = basic().transform(&["", "completely unknown words", "thi"]);
        assert_eq!(m.n_rows(), 3);
        assert_eq!(m.row(0).count(), 0);
        assert_eq!(m.row(1).count(), 0);
        assert_eq!(m.row(2).count(), 1);
        assert_eq!(m.nnz(), 1);
    }

    #[test]
    fn test_single_char_tokens_ignored() {
        let v = vectorizer(r#"{"vocabulary": {"i": 0, "love": 1}, "norm": null}"#);
        let row: Vec<_> = v.transform(&["i love"]).row(0).collect();
        assert_eq!(row, vec![(1, 1.0)]);
    }

    #[test]
    fn test_sublinear_tf_and_bigrams() {
        let v = vectorizer(
            r#"{
                "vocabulary": {"good": 0, "good good": 1},
                "ngram_range": [1, 2],
                "sublinear_tf": true,
                "norm": null
            }"#,
        );
        let row: Vec<_> = v.transform(&["good good good"]).row(0).collect();
        assert_eq!(row.len(), 2);
        assert!((row[0].1 - (1.0 + 3.0_f64.ln())).abs() < 1e-12);
        assert!((row[1].1 - (1.0 + 2.0_f64.ln())).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_artifacts_rejected() {
        let bad_idf: VectorizerArtifact =
            serde_json::from_str(r#"{"vocabulary": {"a": 0, "b": 1}, "idf": [1.0]}"#).unwrap();
        assert!(TfidfVectorizer::try_from(bad_idf).is_err());

        let bad_col: VectorizerArtifact =
            serde_json::from_str(r#"{"vocabulary": {"a": 0, "b": 5}}"#).unwrap();
        assert!(TfidfVectorizer::try_from(bad_col).is_err());

        let bad_ngram: VectorizerArtifact =
            serde_json::from_str(r#"{"vocabulary": {"a": 0}, "ngram_range": [2, 1]}"#).unwrap();
        assert!(TfidfVectorizer::try_from(bad_ngram).is_err());

        let empty: VectorizerArtifact = serde_json::from_str(r#"{"vocabulary": {}}"#).unwrap();
        assert!(TfidfVectorizer::try_from(empty).is_err());
    }
}
