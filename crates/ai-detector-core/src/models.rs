//! Core data models used throughout the analysis pipeline.
//!
//! These types carry one request's sentences from segmentation through
//! scoring to rendering. None of them outlive the request.

use std::fmt;

use crate::fingerprint::Fingerprint;

/// Probability at or above which a sentence is labelled AI-generated.
pub const AI_THRESHOLD: f64 = 0.5;

/// One trimmed, non-empty sentence of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceUnit {
    /// Zero-based index in source order.
    pub position: usize,
    pub text: String,
    pub fingerprint: Fingerprint,
}

impl SentenceUnit {
    /// Build a unit, trimming `text` and deriving its fingerprint.
    pub fn new(position: usize, text: &str) -> Self {
        let text = text.trim();
        Self {
            position,
            text: text.to_string(),
            fingerprint: Fingerprint::of(text),
        }
    }
}

/// Outcome of scoring one sentence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    /// AI-likelihood in `[0, 1]`.
    Probability(f64),
    /// The classifier failed or timed out for this sentence.
    Indeterminate,
}

/// Binary verdict derived from a probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Ai,
    Human,
}

impl Label {
    pub fn from_probability(probability: f64) -> Self {
        if probability >= AI_THRESHOLD {
            Label::Ai
        } else {
            Label::Human
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Ai => f.write_str("AI"),
            Label::Human => f.write_str("Human"),
        }
    }
}

/// A sentence paired with its (possibly indeterminate) score, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedSentence {
    pub unit: SentenceUnit,
    pub score: Score,
}
