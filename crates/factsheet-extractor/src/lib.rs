//! Factsheet Extractor
//!
//! Splits a converted report into chunks and turns each chunk into facts
//! using an LLM.
//!
//! # Overview
//!
//! The input is plain text with page marker tokens left by the document
//! converter. The extractor chunks it at paragraph boundaries, asks the
//! model for facts in a fixed JSON shape, and reads the answer defensively:
//! malformed output is repaired where possible and otherwise costs that one
//! chunk, never the run.
//!
//! # Architecture
//!
//! ```text
//! Text → TextChunker → Chunk → LLM → parse/repair → FactCandidate → Fact
//! ```
//!
//! # Key Features
//!
//! - **Paragraph chunking**: lossless, bounded by `chunk_max_chars`
//! - **Page tracking**: every fact carries the page its evidence is on
//! - **Repair parser**: code fences, wrapper objects, prose around arrays
//! - **Engine-computed fields**: signature and unit normalization are never
//!   taken from model output
//!
//! # Example Usage
//!
//! ```no_run
//! use factsheet_extractor::{ExtractorConfig, FactExtractor};
//! use factsheet_llm::MockProvider;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = Arc::new(MockProvider::new("[]"));
//! let extractor = FactExtractor::new(llm, ExtractorConfig::default())?;
//!
//! for chunk in extractor.chunk("<!-- page 1 -->\nThe site covers 120 ha.") {
//!     let outcome = extractor.extract(&chunk).await;
//!     println!("chunk {}: {} facts", chunk.index, outcome.facts().len());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunking;
mod config;
mod error;
mod extractor;
mod pages;
mod parser;
mod prompt;
mod types;

#[cfg(test)]
mod tests;

pub use chunking::{chunk, Chunk, TextChunker};
pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use extractor::FactExtractor;
pub use pages::{PageMarkers, DEFAULT_PAGE_MARKER_PATTERN};
pub use parser::parse_llm_response;
pub use prompt::FACT_SCHEMA;
pub use types::{ExtractionOutcome, FactCandidate};
