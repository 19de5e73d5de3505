//! Confidence highlighting.
//!
//! Each sentence becomes one [`HighlightedSegment`] whose background tint
//! encodes the verdict and whose intensity encodes distance from the
//! decision boundary:
//!
//! ```text
//! opacity = clamp(|p - 0.5| × 1.8, 0.15, 0.9)
//! p >= 0.5  →  warm  rgba(255, 80, 80, opacity)    (AI)
//! p <  0.5  →  cool  rgba(80, 255, 120, opacity)   (Human)
//! ```
//!
//! The formula and colors are fixed; clients compare renders visually
//! across versions. Indeterminate sentences get no tint and an explicit
//! `data-indeterminate` marker.

use serde::Serialize;

use crate::fingerprint::Fingerprint;
use crate::models::{AnalyzedSentence, Label, Score, AI_THRESHOLD};

pub const MIN_OPACITY: f64 = 0.15;
pub const MAX_OPACITY: f64 = 0.9;
const OPACITY_SCALE: f64 = 1.8;

/// Background intensity for a probability.
pub fn opacity(probability: f64) -> f64 {
    ((probability - AI_THRESHOLD).abs() * OPACITY_SCALE).clamp(MIN_OPACITY, MAX_OPACITY)
}

/// Color family of a tinted segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tint {
    /// Warm red, AI-likely.
    Ai,
    /// Cool green, human-likely.
    Human,
}

impl Tint {
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Tint::Ai => (255, 80, 80),
            Tint::Human => (80, 255, 120),
        }
    }
}

impl From<Label> for Tint {
    fn from(label: Label) -> Self {
        match label {
            Label::Ai => Tint::Ai,
            Label::Human => Tint::Human,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HighlightStyle {
    Tinted { tint: Tint, opacity: f64 },
    Indeterminate,
}

impl HighlightStyle {
    pub fn for_score(score: Score) -> Self {
        match score {
            Score::Probability(p) => HighlightStyle::Tinted {
                tint: Label::from_probability(p).into(),
                opacity: opacity(p),
            },
            Score::Indeterminate => HighlightStyle::Indeterminate,
        }
    }

    /// Inline CSS, or `None` for the neutral indeterminate style.
    pub fn css(&self) -> Option<String> {
        match self {
            HighlightStyle::Tinted { tint, opacity } => {
                let (r, g, b) = tint.rgb();
                Some(format!(
                    "background-color: rgba({}, {}, {}, {:.2});",
                    r, g, b, opacity
                ))
            }
            HighlightStyle::Indeterminate => None,
        }
    }
}

/// One rendered sentence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightedSegment {
    pub position: usize,
    pub text: String,
    pub fingerprint: Fingerprint,
    pub style: HighlightStyle,
}

impl HighlightedSegment {
    /// `<span>` carrying the fingerprint and inline style.
    pub fn to_html(&self) -> String {
        let text = escape_html(&self.text);
        match self.style.css() {
            Some(css) => format!(
                "<span data-id='{}' style='{}'>{}</span>",
                self.fingerprint, css, text
            ),
            None => format!(
                "<span data-id='{}' data-indeterminate='true'>{}</span>",
                self.fingerprint, text
            ),
        }
    }
}

/// Style every sentence, keeping order.
pub fn render(sentences: &[AnalyzedSentence]) -> Vec<HighlightedSegment> {
    sentences
        .iter()
        .map(|s| HighlightedSegment {
            position: s.unit.position,
            text: s.unit.text.clone(),
            fingerprint: s.unit.fingerprint.clone(),
            style: HighlightStyle::for_score(s.score),
        })
        .collect()
}

/// Space-joined spans for all segments.
pub fn to_html(segments: &[HighlightedSegment]) -> String {
    segments
        .iter()
        .map(HighlightedSegment::to_html)
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SentenceUnit;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn sentence(position: usize, text: &str, score: Score) -> AnalyzedSentence {
        AnalyzedSentence {
            unit: SentenceUnit::new(position, text),
            score,
        }
    }

    #[test]
    fn test_opacity_formula() {
        assert!(approx(opacity(0.5), 0.15));
        assert!(approx(opacity(1.0), 0.9));
        assert!(approx(opacity(0.0), 0.9));
        assert!(approx(opacity(0.95), 0.81));
        assert!(approx(opacity(0.1), 0.72));
        assert!(approx(opacity(0.55), 0.15));
    }

    #[test]
    fn test_tint_follows_threshold() {
        let ai = HighlightStyle::for_score(Score::Probability(0.5));
        let human = HighlightStyle::for_score(Score::Probability(0.49));
        assert!(matches!(ai, HighlightStyle::Tinted { tint: Tint::Ai, .. }));
        assert!(matches!(human, HighlightStyle::Tinted { tint: Tint::Human, .. }));
    }

    #[test]
    fn test_css_encoding() {
        let warm = HighlightStyle::for_score(Score::Probability(0.95));
        assert_eq!(
            warm.css().unwrap(),
            "background-color: rgba(255, 80, 80, 0.81);"
        );
        let cool = HighlightStyle::for_score(Score::Probability(0.0));
        assert_eq!(
            cool.css().unwrap(),
            "background-color: rgba(80, 255, 120, 0.90);"
        );
        assert!(HighlightStyle::Indeterminate.css().is_none());
    }

    #[test]
    fn test_two_sentence_scenario() {
        let sentences = vec![
            sentence(0, "The cat sat.", Score::Probability(0.1)),
            sentence(1, "A robot wrote this.", Score::Probability(0.95)),
        ];
        let segments = render(&sentences);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "The cat sat.");
        assert_eq!(segments[1].text, "A robot wrote this.");
        match segments[0].style {
            HighlightStyle::Tinted { tint, opacity } => {
                assert_eq!(tint, Tint::Human);
                assert!(approx(opacity, 0.72));
            }
            HighlightStyle::Indeterminate => panic!("expected tint"),
        }
        match segments[1].style {
            HighlightStyle::Tinted { tint, opacity } => {
                assert_eq!(tint, Tint::Ai);
                assert!(approx(opacity, 0.81));
            }
            HighlightStyle::Indeterminate => panic!("expected tint"),
        }
    }

    #[test]
    fn test_html_spans() {
        let sentences = vec![
            sentence(0, "Hi <b>there</b>.", Score::Probability(0.95)),
            sentence(1, "Unknown.", Score::Indeterminate),
        ];
        let html = to_html(&render(&sentences));
        let fp0 = Fingerprint::of("Hi <b>there</b>.");
        let fp1 = Fingerprint::of("Unknown.");
        assert_eq!(
            html,
            format!(
                "<span data-id='{}' style='background-color: rgba(255, 80, 80, 0.81);'>Hi &lt;b&gt;there&lt;/b&gt;.</span> \
                 <span data-id='{}' data-indeterminate='true'>Unknown.</span>",
                fp0, fp1
            )
        );
    }

    #[test]
    fn test_empty_render() {
        assert!(render(&[]).is_empty());
        assert_eq!(to_html(&[]), "");
    }
}
