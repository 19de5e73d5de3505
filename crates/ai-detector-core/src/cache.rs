//! Client-held score cache and the hit/miss merge.
//!
//! The cache never lives on the server. A client sends back the map it
//! received from its previous request; this module decides which
//! sentences of the current document can reuse a cached probability and
//! which must be scored, then builds the map to return.
//!
//! # Merge
//!
//! 1. Deduplicate the document's fingerprints, keeping first-seen order.
//! 2. A fingerprint present in the prior cache is a hit.
//! 3. Every other fingerprint is a miss, scored once regardless of how
//!    often its sentence repeats.
//! 4. The returned cache holds exactly the current document's fingerprints
//!    that have a probability. Prior entries for sentences no longer in
//!    the document are dropped; indeterminate sentences are left out so
//!    the next request retries them.
//!
//! # Untrusted input
//!
//! [`ScoreCache::from_untrusted`] accepts arbitrary JSON and keeps only
//! entries with a well-formed fingerprint key and a finite probability
//! value in `[0, 1]`.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use serde_json::Value;

use crate::classifier::validate_probability;
use crate::fingerprint::Fingerprint;
use crate::models::{AnalyzedSentence, Score, SentenceUnit};

/// Mapping from fingerprint to probability.
///
/// Serializes as a flat JSON object with keys in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ScoreCache {
    entries: BTreeMap<Fingerprint, f64>,
}

/// Result of sanitizing a client-supplied cache.
#[derive(Debug, Clone, Default)]
pub struct Sanitized {
    pub cache: ScoreCache,
    /// Number of entries (or whole payloads) that were ignored.
    pub rejected: usize,
}

impl ScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a cache received from a client, discarding anything malformed.
    ///
    /// `null` is an empty cache. Any other non-object value is ignored as
    /// a whole and counted as one rejection.
    pub fn from_untrusted(value: &Value) -> Sanitized {
        let map = match value {
            Value::Null => return Sanitized::default(),
            Value::Object(map) => map,
            _ => {
                return Sanitized {
                    cache: ScoreCache::new(),
                    rejected: 1,
                }
            }
        };

        let mut sanitized = Sanitized::default();
        for (key, raw) in map {
            let entry = Fingerprint::parse(key).ok().zip(
                raw.as_f64()
                    .and_then(|p| validate_probability(p).ok()),
            );
            match entry {
                Some((fingerprint, probability)) => {
                    sanitized.cache.entries.insert(fingerprint, probability);
                }
                None => sanitized.rejected += 1,
            }
        }
        sanitized
    }

    /// Insert a probability. Values outside `[0, 1]` are ignored.
    pub fn insert(&mut self, fingerprint: Fingerprint, probability: f64) -> bool {
        match validate_probability(probability) {
            Ok(p) => {
                self.entries.insert(fingerprint, p);
                true
            }
            Err(_) => false,
        }
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<f64> {
        self.entries.get(fingerprint).copied()
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.contains_key(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A sentence that needs a classifier call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Miss {
    pub fingerprint: Fingerprint,
    pub text: String,
}

/// Partition of one document's distinct sentences into hits and misses.
#[derive(Debug, Clone)]
pub struct CachePlan {
    /// Distinct fingerprints in first-seen order.
    pub distinct: Vec<Fingerprint>,
    pub hits: HashMap<Fingerprint, f64>,
    /// Misses in first-seen order, one per distinct fingerprint.
    pub misses: Vec<Miss>,
}

/// Scores for every distinct fingerprint plus the cache to hand back.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub scores: HashMap<Fingerprint, Score>,
    pub cache: ScoreCache,
}

/// Split `units` into cache hits and misses against `prior`.
pub fn plan(units: &[SentenceUnit], prior: &ScoreCache) -> CachePlan {
    let mut seen = HashSet::with_capacity(units.len());
    let mut plan = CachePlan {
        distinct: Vec::new(),
        hits: HashMap::new(),
        misses: Vec::new(),
    };

    for unit in units {
        if !seen.insert(unit.fingerprint.clone()) {
            continue;
        }
        plan.distinct.push(unit.fingerprint.clone());
        match prior.get(&unit.fingerprint) {
            Some(p) => {
                plan.hits.insert(unit.fingerprint.clone(), p);
            }
            None => plan.misses.push(Miss {
                fingerprint: unit.fingerprint.clone(),
                text: unit.text.clone(),
            }),
        }
    }

    plan
}

impl CachePlan {
    /// Combine hits with fresh classifier results.
    ///
    /// A distinct fingerprint with neither a hit nor a fresh result is
    /// indeterminate. Fresh results for fingerprints outside the plan are
    /// ignored.
    pub fn resolve(self, mut fresh: HashMap<Fingerprint, Score>) -> Resolved {
        let mut scores = HashMap::with_capacity(self.distinct.len());
        let mut cache = ScoreCache::new();

        for fingerprint in self.distinct {
            let score = match self.hits.get(&fingerprint) {
                Some(p) => Score::Probability(*p),
                None => fresh.remove(&fingerprint).unwrap_or(Score::Indeterminate),
            };
            let score = match score {
                Score::Probability(p) if validate_probability(p).is_ok() => {
                    cache.insert(fingerprint.clone(), p);
                    score
                }
                _ => Score::Indeterminate,
            };
            scores.insert(fingerprint, score);
        }

        Resolved { scores, cache }
    }

    pub fn is_fully_cached(&self) -> bool {
        self.misses.is_empty()
    }
}

/// Pair every unit with its score, preserving source order.
///
/// Repeated sentences share the score of their fingerprint.
pub fn reassemble(
    units: Vec<SentenceUnit>,
    scores: &HashMap<Fingerprint, Score>,
) -> Vec<AnalyzedSentence> {
    units
        .into_iter()
        .map(|unit| {
            let score = scores
                .get(&unit.fingerprint)
                .copied()
                .unwrap_or(Score::Indeterminate);
            AnalyzedSentence { unit, score }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn units(texts: &[&str]) -> Vec<SentenceUnit> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| SentenceUnit::new(i, t))
            .collect()
    }

    fn fp(text: &str) -> Fingerprint {
        Fingerprint::of(text)
    }

    #[test]
    fn test_empty_prior_all_misses() {
        let doc = units(&["A.", "B."]);
        let plan = plan(&doc, &ScoreCache::new());
        assert!(plan.hits.is_empty());
        assert_eq!(plan.misses.len(), 2);
        assert_eq!(plan.misses[0].text, "A.");
        assert_eq!(plan.misses[1].text, "B.");
    }

    #[test]
    fn test_duplicates_planned_once() {
        let doc = units(&["Same line.", "Other line.", "Same line."]);
        let plan = plan(&doc, &ScoreCache::new());
        assert_eq!(plan.distinct, vec![fp("Same line."), fp("Other line.")]);
        assert_eq!(plan.misses.len(), 2);
    }

    #[test]
    fn test_hits_and_misses_partition() {
        let doc = units(&["A.", "B.", "C."]);
        let mut prior = ScoreCache::new();
        prior.insert(fp("B."), 0.7);
        let plan = plan(&doc, &prior);
        assert_eq!(plan.hits.get(&fp("B.")), Some(&0.7));
        let missed: Vec<&str> = plan.misses.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(missed, vec!["A.", "C."]);
        assert!(!plan.is_fully_cached());
    }

    #[test]
    fn test_resolve_prunes_stale_entries() {
        let doc = units(&["Kept."]);
        let mut prior = ScoreCache::new();
        prior.insert(fp("Kept."), 0.2);
        prior.insert(fp("Dropped."), 0.9);

        let resolved = plan(&doc, &prior).resolve(HashMap::new());
        assert_eq!(resolved.cache.len(), 1);
        assert_eq!(resolved.cache.get(&fp("Kept.")), Some(0.2));
        assert!(!resolved.cache.contains(&fp("Dropped.")));
    }

    #[test]
    fn test_resolve_omits_indeterminate_from_cache() {
        let doc = units(&["Good.", "Bad.", "Lost."]);
        let mut fresh = HashMap::new();
        fresh.insert(fp("Good."), Score::Probability(0.6));
        fresh.insert(fp("Bad."), Score::Indeterminate);

        let resolved = plan(&doc, &ScoreCache::new()).resolve(fresh);
        assert_eq!(resolved.cache.len(), 1);
        assert_eq!(resolved.scores[&fp("Bad.")], Score::Indeterminate);
        assert_eq!(resolved.scores[&fp("Lost.")], Score::Indeterminate);
    }

    #[test]
    fn test_resolve_rejects_out_of_range_fresh_scores() {
        let doc = units(&["Weird."]);
        let mut fresh = HashMap::new();
        fresh.insert(fp("Weird."), Score::Probability(3.0));
        let resolved = plan(&doc, &ScoreCache::new()).resolve(fresh);
        assert!(resolved.cache.is_empty());
        assert_eq!(resolved.scores[&fp("Weird.")], Score::Indeterminate);
    }

    #[test]
    fn test_reassemble_keeps_order_and_shares_scores() {
        let doc = units(&["X.", "Y.", "X."]);
        let mut scores = HashMap::new();
        scores.insert(fp("X."), Score::Probability(0.9));
        scores.insert(fp("Y."), Score::Probability(0.1));

        let out = reassemble(doc, &scores);
        let positions: Vec<usize> = out.iter().map(|s| s.unit.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert_eq!(out[0].score, Score::Probability(0.9));
        assert_eq!(out[2].score, Score::Probability(0.9));
        assert_eq!(out[1].score, Score::Probability(0.1));
    }

    #[test]
    fn test_from_untrusted_filters_bad_entries() {
        let good = fp("Fine.");
        let value = json!({
            good.as_str(): 0.42,
            "not-a-fingerprint": 0.5,
            "0123456789abcdef": "0.5",
            "fedcba9876543210": 1.5,
            "aaaaaaaaaaaaaaaa": null,
        });
        let sanitized = ScoreCache::from_untrusted(&value);
        assert_eq!(sanitized.cache.len(), 1);
        assert_eq!(sanitized.cache.get(&good), Some(0.42));
        assert_eq!(sanitized.rejected, 4);
    }

    #[test]
    fn test_from_untrusted_non_object() {
        assert!(ScoreCache::from_untrusted(&Value::Null).cache.is_empty());
        assert_eq!(ScoreCache::from_untrusted(&Value::Null).rejected, 0);

        let sanitized = ScoreCache::from_untrusted(&json!([1, 2, 3]));
        assert!(sanitized.cache.is_empty());
        assert_eq!(sanitized.rejected, 1);
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let mut cache = ScoreCache::new();
        cache.insert(fp("A."), 0.25);
        let json = serde_json::to_value(&cache).unwrap();
        assert_eq!(json, json!({ fp("A.").as_str(): 0.25 }));
    }
}
