//! # AI Detector
//!
//! Sentence-level AI-vs-human text detection with incremental,
//! cache-aware highlighting.
//!
//! An editor re-submits its whole document as the user types, together
//! with the scores it received last time. Only new or edited sentences
//! reach the classifier; everything else is served from the returned
//! cache.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌────────────┐   ┌──────────┐
//! │  Text    │──▶│ Segmenter │──▶│ ScoreCache │──▶│ Renderer │──▶ html
//! └──────────┘   └───────────┘   │   plan     │   └──────────┘
//!                                └─────┬──────┘
//!                                      │ misses
//!                                      ▼
//!                                ┌────────────┐
//!                                │ Classifier │  (bounded, concurrent)
//!                                └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ai-detector score "Let us delve into the rich tapestry of ideas."
//! ai-detector analyze essay.txt --json > out.json
//! ai-detector serve --config ./config/detector.toml
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`model`] | TF-IDF + logistic regression classifier |
//! | [`analyze`] | Analysis coordinator |
//! | [`analyze_cmd`] | `analyze` command |
//! | [`score_cmd`] | `score` command |
//! | [`server`] | HTTP analysis server |
//! | [`logging`] | Tracing subscriber setup |

pub mod analyze;
pub mod analyze_cmd;
pub mod config;
pub mod logging;
pub mod model;
pub mod score_cmd;
pub mod server;
