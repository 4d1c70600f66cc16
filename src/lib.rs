// Veil - PII Detection and Redaction Engine
// Copyright (c) 2025 Veil Contributors
// Licensed under the MIT License

//! # Veil - PII Detection and Redaction
//!
//! Veil detects spans of personally identifiable information in
//! unstructured text and produces a redacted copy with the spans replaced
//! by configurable placeholders, alongside per-category statistics and a
//! human-readable explanation.
//!
//! ## Overview
//!
//! Detection is multi-layered and the layers disagree on purpose:
//!
//! - **Pattern rules** match structurally regular PII (emails, phone
//!   numbers, SSNs, credit cards, street addresses) and over-include
//! - **An entity model** proposes person-name spans
//! - **A rule-driven filter** suppresses known false-positive contexts
//! - **A reconciler** merges everything into one ordered, disjoint span set
//! - **An LLM validation stage** confirms or rejects every candidate,
//!   discovers spans the rules missed, and writes the explanation. This
//!   stage is mandatory: when it cannot be reached, the request fails
//!   rather than silently degrading
//! - **The renderer** rewrites the text right-to-left so replacements never
//!   invalidate offsets that have not been processed yet
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`engine`] - Pipeline orchestration
//! - [`detect`] - Pattern and entity detection layers
//! - [`filter`] - Rule-driven false-positive suppression
//! - [`reconcile`] - Candidate merging and tie-breaking
//! - [`validate`] - LLM validation boundary
//! - [`render`] - Offset-safe redaction rendering
//! - [`stats`] - Per-category statistics
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use veil::config::load_config;
//! use veil::domain::{RedactionSettings, RedactionStyle};
//! use veil::engine::RedactionEngine;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("veil.toml")?;
//!     let engine = RedactionEngine::new(&config)?;
//!
//!     let settings = RedactionSettings::all_categories(RedactionStyle::Labels);
//!     let outcome = engine
//!         .redact("Contact: jane@example.com or 555-123-4567", &settings)
//!         .await?;
//!
//!     assert_eq!(outcome.redacted, "Contact: [EMAIL_1] or [PHONE_1]");
//!     println!("{}", outcome.explanation);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::VeilError`]. A request yields a
//! complete, consistent result or one category-labeled failure; there is no
//! partial success:
//!
//! ```rust,no_run
//! use veil::domain::VeilError;
//!
//! fn example() -> Result<(), VeilError> {
//!     let config = veil::config::load_config("veil.toml")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! Veil uses structured logging with the `tracing` crate. Span values are
//! never logged raw; digests stand in for them:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(spans = 3, "Redaction complete");
//! warn!(attempt = 2, "Retrying validation request");
//! ```

pub mod cli;
pub mod config;
pub mod detect;
pub mod domain;
pub mod engine;
pub mod filter;
pub mod logging;
pub mod reconcile;
pub mod render;
pub mod stats;
pub mod validate;
