//! Per-request analysis pipeline.
//!
//! The [`Coordinator`] runs one document through
//! segment → plan → score misses → resolve → reassemble → render and
//! returns the highlighted segments together with the cache the client
//! should send next time.
//!
//! # Concurrency
//!
//! Cache misses are scored concurrently on a [`JoinSet`], bounded by a
//! [`Semaphore`] of `max_concurrency` permits. Each call runs under its
//! own timeout; a slow or failing sentence becomes indeterminate instead
//! of failing the request. Joining the set is the only barrier before
//! rendering. Results are keyed by fingerprint, so completion order never
//! affects output order.
//!
//! Dropping the future returned by [`Coordinator::analyze`] (client
//! disconnect, outer timeout) drops the `JoinSet`, which aborts every
//! outstanding classifier task. Nothing is persisted, so there is nothing
//! to roll back.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use ai_detector_core::cache::{plan, reassemble, Miss, ScoreCache};
use ai_detector_core::classifier::{validate_probability, Classifier, ClassifierError};
use ai_detector_core::fingerprint::Fingerprint;
use ai_detector_core::models::Score;
use ai_detector_core::render::{render, to_html, HighlightedSegment};
use ai_detector_core::segment::{segment, whole_text, Segmenter, UnicodeSegmenter};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::AnalysisConfig;

/// Counters describing one analysis run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisStats {
    pub sentences: usize,
    pub distinct: usize,
    pub hits: usize,
    pub misses: usize,
    pub indeterminate: usize,
}

/// Output of [`Coordinator::analyze`].
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    /// One segment per sentence, in source order.
    pub segments: Vec<HighlightedSegment>,
    /// Cache to return to the client.
    pub cache: ScoreCache,
    pub stats: AnalysisStats,
}

impl Analysis {
    pub fn html(&self) -> String {
        to_html(&self.segments)
    }
}

/// Orchestrates segmentation, cache reuse, scoring, and rendering.
///
/// Holds only immutable handles; a single instance serves any number of
/// concurrent requests.
pub struct Coordinator {
    segmenter: Arc<dyn Segmenter>,
    classifier: Arc<dyn Classifier>,
    max_concurrency: usize,
    call_timeout: Duration,
}

impl Coordinator {
    pub fn new(
        segmenter: Arc<dyn Segmenter>,
        classifier: Arc<dyn Classifier>,
        config: &AnalysisConfig,
    ) -> Self {
        Self {
            segmenter,
            classifier,
            max_concurrency: config.max_concurrency.max(1),
            call_timeout: config.classifier_timeout(),
        }
    }

    /// Coordinator with the Unicode segmenter.
    pub fn with_classifier(classifier: Arc<dyn Classifier>, config: &AnalysisConfig) -> Self {
        Self::new(Arc::new(UnicodeSegmenter), classifier, config)
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Analyze `text`, reusing probabilities from `prior` where possible.
    pub async fn analyze(&self, text: &str, prior: &ScoreCache) -> Analysis {
        let units = match segment(self.segmenter.as_ref(), text) {
            Ok(units) => units,
            Err(e) => {
                warn!(
                    segmenter = self.segmenter.name(),
                    error = %e,
                    "segmentation failed, treating input as one sentence"
                );
                whole_text(text)
            }
        };

        if units.is_empty() {
            return Analysis::default();
        }

        let cache_plan = plan(&units, prior);
        let mut stats = AnalysisStats {
            sentences: units.len(),
            distinct: cache_plan.distinct.len(),
            hits: cache_plan.hits.len(),
            misses: cache_plan.misses.len(),
            indeterminate: 0,
        };

        let fresh = if cache_plan.is_fully_cached() {
            HashMap::new()
        } else {
            self.score_misses(&cache_plan.misses).await
        };

        let resolved = cache_plan.resolve(fresh);
        stats.indeterminate = resolved
            .scores
            .values()
            .filter(|s| **s == Score::Indeterminate)
            .count();

        let sentences = reassemble(units, &resolved.scores);
        let segments = render(&sentences);

        debug!(
            sentences = stats.sentences,
            distinct = stats.distinct,
            hits = stats.hits,
            misses = stats.misses,
            indeterminate = stats.indeterminate,
            "analysis complete"
        );

        Analysis {
            segments,
            cache: resolved.cache,
            stats,
        }
    }

    /// Score each miss once, concurrently, under the per-call timeout.
    async fn score_misses(&self, misses: &[Miss]) -> HashMap<Fingerprint, Score> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut join_set: JoinSet<(Fingerprint, Result<f64, ClassifierError>)> = JoinSet::new();

        for miss in misses {
            let classifier = self.classifier.clone();
            let semaphore = semaphore.clone();
            let fingerprint = miss.fingerprint.clone();
            let text = miss.text.clone();
            let limit = self.call_timeout;

            join_set.spawn(async move {
                let outcome = score_one(classifier.as_ref(), &semaphore, &text, limit).await;
                (fingerprint, outcome)
            });
        }

        let mut scores = HashMap::with_capacity(misses.len());
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((fingerprint, Ok(p))) => {
                    scores.insert(fingerprint, Score::Probability(p));
                }
                Ok((fingerprint, Err(e))) => {
                    warn!(%fingerprint, error = %e, "sentence left indeterminate");
                    scores.insert(fingerprint, Score::Indeterminate);
                }
                // The fingerprint is lost with the task; resolve() marks
                // anything without a result as indeterminate.
                Err(e) => warn!(error = %e, "classifier task failed"),
            }
        }
        scores
    }
}

async fn score_one(
    classifier: &dyn Classifier,
    semaphore: &Semaphore,
    text: &str,
    limit: Duration,
) -> Result<f64, ClassifierError> {
    let _permit = semaphore
        .acquire()
        .await
        .map_err(|e| ClassifierError::Aborted(e.to_string()))?;

    match tokio::time::timeout(limit, classifier.score(text)).await {
        Ok(result) => validate_probability(result?),
        Err(_) => Err(ClassifierError::Timeout(limit)),
    }
}
