//! Factsheet Categorizer
//!
//! Classifies consolidated facts into a fixed taxonomy of 8 categories and
//! 32 subcategories using a second, taxonomy-constrained LLM call.
//!
//! # Caching
//!
//! Results are cached per trimmed, lowercased `(name, unit)`. The cache is
//! an explicit [`CategorizationCache`] injected through `Arc`, so several
//! concurrent categorization tasks can share it while keeping exact
//! hit/miss statistics.
//!
//! # Example
//!
//! ```no_run
//! use factsheet_categorizer::{Categorizer, CategorizerConfig};
//! use factsheet_llm::MockProvider;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = Arc::new(MockProvider::new(
//!     r#"{"category": "air_climate", "subcategory": "ghg_emissions", "confidence": "high", "rationale": "CO2"}"#,
//! ));
//! let categorizer = Categorizer::new(llm, CategorizerConfig::default());
//!
//! let categorization = categorizer.categorize("Annual CO2 emissions", "250000", "t/yr").await?;
//! println!("{} / {}", categorization.category, categorization.subcategory);
//! println!("{:?}", categorizer.stats());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod cache;
mod categorizer;
mod config;
mod error;
mod prompt;

pub use cache::{CacheKey, CacheStats, CategorizationCache};
pub use categorizer::{parse_categorization, Categorizer};
pub use config::CategorizerConfig;
pub use error::CategorizerError;
pub use prompt::{build_prompt, categorization_schema, taxonomy_listing};
