//! TF-IDF + logistic regression sentence classifier.
//!
//! The model artifact is a JSON export of a trained text pipeline. Only
//! inference lives here; training happens offline.
//!
//! # Artifact
//!
//! ```json
//! {
//!   "format": "tfidf-logreg",
//!   "preprocess": "basic_clean",
//!   "ngram_range": [1, 2],
//!   "stop_words": ["the", "and"],
//!   "vocabulary": { "delve": 0, "rich tapestry": 1 },
//!   "idf": [2.1, 3.4],
//!   "coef": [1.7, 2.2],
//!   "intercept": -0.3
//! }
//! ```
//!
//! # Inference
//!
//! 1. `basic_clean`: drop URLs and e-mail addresses, delete ASCII
//!    punctuation, lowercase (the cleaning applied to training text).
//! 2. Tokens match `\b\w\w+\b`; stop words are removed.
//! 3. N-grams in `ngram_range` are joined with single spaces and looked up
//!    in the vocabulary.
//! 4. Raw counts × idf, L2-normalized.
//! 5. `p = sigmoid(coef · x + intercept)`.
//!
//! A model that fails to load or validate is a [`ModelLoadError`]; the
//! server refuses to start without one.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ai_detector_core::classifier::{Classifier, ClassifierError};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

const FORMAT: &str = "tfidf-logreg";
const TOKEN_PATTERN: &str = r"\b\w\w+\b";
const URL_PATTERN: &str = r"http\S+|www.\S+";
const EMAIL_PATTERN: &str = r"\S+@\S+";

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("failed to read model file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid model artifact: {0}")]
    Invalid(String),
    #[error("failed to compile tokenizer pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Preprocess {
    #[default]
    BasicClean,
    None,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

#[derive(Debug, Deserialize)]
struct ModelArtifact {
    format: String,
    #[serde(default)]
    preprocess: Preprocess,
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    #[serde(default)]
    stop_words: Vec<String>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    coef: Vec<f64>,
    intercept: f64,
}

/// Loaded, validated linear text model. Immutable after construction.
#[derive(Debug)]
pub struct LinearModel {
    preprocess: Preprocess,
    ngram_range: (usize, usize),
    stop_words: HashSet<String>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    coef: Vec<f64>,
    intercept: f64,
    token_re: Regex,
    url_re: Regex,
    email_re: Regex,
}

impl LinearModel {
    /// Read and validate a model artifact from disk.
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ModelLoadError> {
        let artifact: ModelArtifact = serde_json::from_str(content)?;
        Self::from_artifact(artifact)
    }

    fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelLoadError> {
        if artifact.format != FORMAT {
            return Err(ModelLoadError::Invalid(format!(
                "unsupported format '{}', expected '{}'",
                artifact.format, FORMAT
            )));
        }

        let (lo, hi) = artifact.ngram_range;
        if lo == 0 || lo > hi {
            return Err(ModelLoadError::Invalid(format!(
                "ngram_range must satisfy 1 <= lo <= hi, got ({}, {})",
                lo, hi
            )));
        }

        let dims = artifact.vocabulary.len();
        if artifact.idf.len() != dims || artifact.coef.len() != dims {
            return Err(ModelLoadError::Invalid(format!(
                "vocabulary has {} terms but idf has {} and coef has {}",
                dims,
                artifact.idf.len(),
                artifact.coef.len()
            )));
        }

        if let Some((term, index)) = artifact.vocabulary.iter().find(|&(_, &i)| i >= dims) {
            return Err(ModelLoadError::Invalid(format!(
                "vocabulary index {} for '{}' is out of range",
                index, term
            )));
        }

        let all_finite = artifact
            .idf
            .iter()
            .chain(artifact.coef.iter())
            .chain(std::iter::once(&artifact.intercept))
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(ModelLoadError::Invalid(
                "idf, coef and intercept must be finite".to_string(),
            ));
        }

        Ok(Self {
            preprocess: artifact.preprocess,
            ngram_range: artifact.ngram_range,
            stop_words: artifact.stop_words.into_iter().collect(),
            vocabulary: artifact.vocabulary,
            idf: artifact.idf,
            coef: artifact.coef,
            intercept: artifact.intercept,
            token_re: Regex::new(TOKEN_PATTERN)?,
            url_re: Regex::new(URL_PATTERN)?,
            email_re: Regex::new(EMAIL_PATTERN)?,
        })
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// AI-likelihood of `text` in `[0, 1]`.
    pub fn probability(&self, text: &str) -> f64 {
        let z = self
            .features(text)
            .into_iter()
            .map(|(index, weight)| weight * self.coef[index])
            .sum::<f64>()
            + self.intercept;
        sigmoid(z)
    }

    fn clean(&self, text: &str) -> String {
        match self.preprocess {
            Preprocess::None => text.to_string(),
            Preprocess::BasicClean => {
                let text = self.url_re.replace_all(text, "");
                let text = self.email_re.replace_all(&text, "");
                text.chars()
                    .filter(|c| !c.is_ascii_punctuation())
                    .collect::<String>()
                    .to_lowercase()
            }
        }
    }

    fn ngrams(&self, text: &str) -> Vec<String> {
        let tokens: Vec<&str> = self
            .token_re
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|t| !self.stop_words.contains(*t))
            .collect();

        let (lo, hi) = self.ngram_range;
        let mut grams = Vec::new();
        for n in lo..=hi {
            if n > tokens.len() {
                break;
            }
            grams.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        grams
    }

    /// Sparse L2-normalized TF-IDF vector.
    fn features(&self, text: &str) -> Vec<(usize, f64)> {
        let cleaned = self.clean(text);

        let mut counts: HashMap<usize, f64> = HashMap::new();
        for gram in self.ngrams(&cleaned) {
            if let Some(&index) = self.vocabulary.get(&gram) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut weighted: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(index, tf)| (index, tf * self.idf[index]))
            .collect();

        let norm = weighted.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in weighted.iter_mut() {
                *w /= norm;
            }
        }
        weighted
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// A [`LinearModel`] served as a [`Classifier`].
///
/// Inference runs on tokio's blocking pool, off the runtime workers, so a
/// caller's timeout can fire while a long sentence is still being scored.
/// The abandoned computation runs to completion and its result is dropped.
#[derive(Debug, Clone)]
pub struct LocalClassifier {
    model: Arc<LinearModel>,
}

impl LocalClassifier {
    pub fn new(model: LinearModel) -> Self {
        Self {
            model: Arc::new(model),
        }
    }
}

#[async_trait]
impl Classifier for LocalClassifier {
    fn name(&self) -> &str {
        FORMAT
    }

    async fn score(&self, text: &str) -> Result<f64, ClassifierError> {
        let model = self.model.clone();
        let text = text.to_string();

        tokio::task::spawn_blocking(move || model.probability(&text))
            .await
            .map_err(|e| ClassifierError::Aborted(format!("inference task failed: {}", e)))
    }
}

/// Load the model at `path` as a shared classifier handle.
pub fn load_classifier(path: &Path) -> Result<Arc<dyn Classifier>, ModelLoadError> {
    let model = LinearModel::load(path)?;
    info!(
        path = %path.display(),
        terms = model.vocabulary_size(),
        "model loaded"
    );
    Ok(Arc::new(LocalClassifier::new(model)))
}
