//! Factsheet Domain Layer
//!
//! This crate contains the data model shared by every stage of the fact
//! extraction pipeline. It holds pure logic only: no I/O, no async, no LLM
//! calls. Infrastructure implementations live in other crates.
//!
//! ## Key Concepts
//!
//! - **Fact**: One extracted mention of a quantity or categorical value
//! - **Signature**: Deterministic slug of a fact name, the clustering key
//! - **Unit normalization**: Static table mapping raw units to canonical ones
//! - **Taxonomy**: 8 categories, 32 subcategories, 3 confidence levels
//!
//! ## Architecture
//!
//! - Pure business logic only
//! - Trait definitions for all external interactions (see [`traits`])

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod fact;
pub mod signature;
pub mod taxonomy;
pub mod traits;
pub mod units;

// Re-exports for convenience
pub use fact::{Fact, FactFields, FactKind, Page, SourceLocation};
pub use signature::slugify;
pub use taxonomy::{Categorization, Category, Confidence, Subcategory, TaxonomyError};
pub use units::{normalize, Quantity, UnitConversion};
