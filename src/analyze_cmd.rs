//! Offline analysis of a whole document.
//!
//! Runs the same pipeline as `POST /analyze` against a file or stdin and
//! prints the highlighted HTML, or with `--json` a report that adds the
//! cache, per-request counters and each segment's style. With `--cache`, a `results` object saved
//! from an earlier run is reused so only new or edited sentences are
//! scored.

use std::io::Read;
use std::path::{Path, PathBuf};

use ai_detector_core::cache::ScoreCache;
use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::analyze::{Analysis, Coordinator};
use crate::config::Config;
use crate::model::load_classifier;

/// Options for a single `analyze` invocation.
pub struct AnalyzeOptions {
    /// Input document; `None` reads stdin.
    pub file: Option<PathBuf>,
    /// Print a JSON report instead of bare HTML.
    pub json: bool,
    /// Prior `results` object to reuse.
    pub cache: Option<PathBuf>,
}

pub async fn run_analyze(config: &Config, options: &AnalyzeOptions) -> Result<()> {
    let text = read_input(options.file.as_deref())?;
    let prior = match &options.cache {
        Some(path) => read_cache(path)?,
        None => ScoreCache::default(),
    };

    let classifier = load_classifier(&config.model.path)
        .with_context(|| format!("Failed to load model: {}", config.model.path.display()))?;
    let coordinator = Coordinator::with_classifier(classifier, &config.analysis);

    let analysis = coordinator.analyze(&text, &prior).await;
    info!(
        sentences = analysis.stats.sentences,
        hits = analysis.stats.hits,
        misses = analysis.stats.misses,
        indeterminate = analysis.stats.indeterminate,
        "analyzed document"
    );

    if options.json {
        println!("{}", serde_json::to_string_pretty(&json_report(&analysis))?);
    } else {
        println!("{}", analysis.html());
    }

    Ok(())
}

/// `{html, results, stats, segments}`. `results` is the cache to pass back
/// with `--cache` on the next run.
fn json_report(analysis: &Analysis) -> serde_json::Value {
    serde_json::json!({
        "html": analysis.html(),
        "results": analysis.cache,
        "stats": analysis.stats,
        "segments": analysis.segments,
    })
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display())),
        None => {
            if atty::is(atty::Stream::Stdin) {
                anyhow::bail!("No input file given and stdin is a terminal. Pipe a document in or pass a path.");
            }
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

/// Load a saved `results` object. Malformed entries are dropped with a
/// warning; a file that is not JSON at all is an error.
fn read_cache(path: &Path) -> Result<ScoreCache> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read cache file: {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Cache file is not valid JSON: {}", path.display()))?;

    let sanitized = ScoreCache::from_untrusted(&value);
    if sanitized.rejected > 0 {
        warn!(
            path = %path.display(),
            rejected = sanitized.rejected,
            "ignored malformed cache entries"
        );
    }
    Ok(sanitized.cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_cache_drops_bad_entries() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cache.json");
        fs::write(
            &path,
            r#"{"0123456789abcdef": 0.25, "nothex": 0.5, "fedcba9876543210": 7}"#,
        )
        .unwrap();

        let cache = read_cache(&path).unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_read_cache_rejects_non_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cache.json");
        fs::write(&path, "not json").unwrap();

        let err = read_cache(&path).unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[tokio::test]
    async fn test_json_report_fields() {
        use crate::config::AnalysisConfig;
        use ai_detector_core::classifier::{Classifier, ClassifierError};
        use async_trait::async_trait;
        use std::sync::Arc;

        struct Fixed;

        #[async_trait]
        impl Classifier for Fixed {
            fn name(&self) -> &str {
                "fixed"
            }

            async fn score(&self, text: &str) -> Result<f64, ClassifierError> {
                if text.contains("explode") {
                    Err(ClassifierError::Failed("boom".to_string()))
                } else {
                    Ok(0.95)
                }
            }
        }

        let coordinator =
            Coordinator::with_classifier(Arc::new(Fixed), &AnalysisConfig::default());
        let analysis = coordinator
            .analyze("A robot wrote this. This will explode.", &ScoreCache::new())
            .await;
        let report = json_report(&analysis);

        assert_eq!(report["html"], analysis.html());
        assert_eq!(report["results"].as_object().unwrap().len(), 1);
        assert_eq!(report["stats"]["sentences"], 2);
        assert_eq!(report["stats"]["misses"], 2);
        assert_eq!(report["stats"]["indeterminate"], 1);

        let segments = report["segments"].as_array().unwrap();
        assert_eq!(segments[0]["position"], 0);
        assert_eq!(segments[0]["text"], "A robot wrote this.");
        assert_eq!(segments[0]["style"]["kind"], "tinted");
        assert_eq!(segments[0]["style"]["tint"], "ai");
        assert_eq!(segments[1]["style"]["kind"], "indeterminate");
    }

    #[test]
    fn test_read_input_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("doc.txt");
        fs::write(&path, "The cat sat.").unwrap();
        assert_eq!(read_input(Some(&path)).unwrap(), "The cat sat.");
    }

    #[test]
    fn test_read_input_missing_file() {
        let err = read_input(Some(Path::new("/nonexistent/doc.txt"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read input file"));
    }
}
