//! Command-line scorer.
//!
//! Scores each argument as a standalone sentence and prints its verdict:
//!
//! ```text
//! $ ai-detector score "The cat sat." "Let us delve into the rich tapestry."
//! Human  (p= 0.05)
//! AI  (p= 0.99)
//! ```

use std::io::Write;
use std::path::Path;

use ai_detector_core::models::Label;
use anyhow::{Context, Result};

use crate::model::load_classifier;

/// One output line for a probability.
pub fn format_verdict(probability: f64) -> String {
    format!(
        "{}  (p= {:.2})",
        Label::from_probability(probability),
        probability
    )
}

/// Load the model and print one verdict per text.
///
/// A text the classifier cannot score is reported on its line and makes
/// the command fail after all texts have been printed.
pub async fn run_score(model_path: &Path, texts: &[String]) -> Result<()> {
    if texts.is_empty() {
        anyhow::bail!("Provide at least one sentence to classify.");
    }

    let classifier = load_classifier(model_path)
        .with_context(|| format!("Failed to load model: {}", model_path.display()))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut failures = 0usize;

    for text in texts {
        match classifier.score(text).await {
            Ok(p) => writeln!(out, "{}", format_verdict(p))?,
            Err(e) => {
                failures += 1;
                writeln!(out, "?  ({})", e)?;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} texts could not be scored", failures, texts.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_verdict() {
        assert_eq!(format_verdict(0.95), "AI  (p= 0.95)");
        assert_eq!(format_verdict(0.5), "AI  (p= 0.50)");
        assert_eq!(format_verdict(0.047), "Human  (p= 0.05)");
        assert_eq!(format_verdict(0.0), "Human  (p= 0.00)");
    }

    #[tokio::test]
    async fn test_no_texts_is_error() {
        let err = run_score(Path::new("unused.json"), &[]).await.unwrap_err();
        assert!(err.to_string().contains("at least one sentence"));
    }

    #[tokio::test]
    async fn test_missing_model_is_error() {
        let err = run_score(Path::new("/nonexistent/model.json"), &["Hi.".to_string()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to load model"));
    }
}
