//! Factsheet Pipeline
//!
//! Sequences the engine over one document:
//!
//! ```text
//! chunk → extract (checkpointed) → cluster + conflicts → categorize → records
//! ```
//!
//! Per-chunk and per-fact failures are isolated: a chunk whose extraction
//! fails contributes zero facts, a fact whose categorization fails keeps an
//! empty categorization. Only checkpoint I/O errors and an unreachable
//! provider end a run early.
//!
//! # Usage
//!
//! ```no_run
//! use factsheet_llm::MockProvider;
//! use factsheet_pipeline::{Pipeline, PipelineConfig, ResumeMode};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let llm = Arc::new(MockProvider::new("[]"));
//!     let pipeline = Pipeline::new(llm, PipelineConfig::default())?;
//!
//!     let document = std::fs::read_to_string("report.md")?;
//!     let output = pipeline.run(&document, &ResumeMode::Resume).await?;
//!
//!     println!("{}", output.summary.summary());
//!     println!("{} consolidated facts", output.records.consolidated.len());
//!     Ok(())
//! }
//! ```
//!
//! # Interrupts
//!
//! [`Pipeline::run_until`] takes a shutdown future (typically
//! `tokio::signal::ctrl_c`). When it resolves the progress is saved and the
//! run returns [`PipelineError::Interrupted`]; the next run over the same
//! document can resume from the checkpoint.

#![warn(missing_docs)]

mod config;
mod driver;
mod error;
mod metrics;
mod records;
mod resume;

pub use config::{LlmSettings, PipelineConfig, DEFAULT_MODEL, ENV_PREFIX};
pub use driver::{Pipeline, PipelineOutput};
pub use error::PipelineError;
pub use metrics::RunSummary;
pub use records::{ConsolidatedRecord, FactsheetRecord, MentionRecord, RecordSets};
pub use resume::{ResumeMode, ResumePrompt};
