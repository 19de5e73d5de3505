//! Sentence segmentation.
//!
//! Boundary detection sits behind the [`Segmenter`] trait so any
//! tokenizer can be plugged in. [`segment`] turns whatever a segmenter
//! returns into ordered [`SentenceUnit`]s, re-trimming and dropping empty
//! pieces so a sloppy implementation cannot break the pipeline.
//!
//! The default [`UnicodeSegmenter`] uses the Unicode sentence boundary
//! rules of UAX #29: a boundary follows sentence-final punctuation plus
//! whitespace before a new clause, and every paragraph break.

use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

use crate::models::SentenceUnit;

#[derive(Debug, Error)]
pub enum SegmentationError {
    #[error("sentence segmentation failed: {0}")]
    Failed(String),
}

/// Splits raw text into sentence strings in source order.
pub trait Segmenter: Send + Sync {
    /// Returns a short identifier for logs (e.g. `"unicode"`).
    fn name(&self) -> &str;

    fn split(&self, text: &str) -> Result<Vec<String>, SegmentationError>;
}

/// UAX #29 sentence boundaries via `unicode-segmentation`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnicodeSegmenter;

impl Segmenter for UnicodeSegmenter {
    fn name(&self) -> &str {
        "unicode"
    }

    fn split(&self, text: &str) -> Result<Vec<String>, SegmentationError> {
        Ok(text
            .split_sentence_bounds()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// Segment `text` into positioned, fingerprinted sentence units.
///
/// Empty or whitespace-only input yields no units without consulting the
/// segmenter.
pub fn segment(
    segmenter: &dyn Segmenter,
    text: &str,
) -> Result<Vec<SentenceUnit>, SegmentationError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let units = segmenter
        .split(text)?
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(position, s)| SentenceUnit::new(position, s))
        .collect();

    Ok(units)
}

/// Treat the whole trimmed input as a single sentence.
///
/// Used when the segmenter fails. Whitespace-only input still yields
/// nothing.
pub fn whole_text(text: &str) -> Vec<SentenceUnit> {
    if text.trim().is_empty() {
        Vec::new()
    } else {
        vec![SentenceUnit::new(0, text)]
    }
}
