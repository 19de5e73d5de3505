//! # AI Detector Core
//!
//! Runtime-agnostic logic for AI Detector: sentence units, fingerprints,
//! the classifier capability trait, score cache planning and merging,
//! and highlight rendering.
//!
//! This crate contains no tokio, HTTP, or filesystem I/O. The async
//! orchestration that dispatches classifier calls lives in the
//! `ai-detector` app crate.
//!
//! ## Pipeline
//!
//! ```text
//! text ──▶ segment ──▶ fingerprint ──▶ plan (hits / misses)
//!                                          │
//!                       classifier ◀───────┤ misses
//!                                          ▼
//!                     render ◀── reassemble ◀── resolve ──▶ updated cache
//! ```

pub mod cache;
pub mod classifier;
pub mod fingerprint;
pub mod models;
pub mod render;
pub mod segment;
