//! Factsheet Reconciler
//!
//! Groups extracted facts by signature and flags numeric or categorical
//! disagreement inside each group.
//!
//! # Example
//!
//! ```
//! use factsheet_domain::{Fact, SourceLocation};
//! use factsheet_reconciler::ClusterSet;
//!
//! let mut clusters = ClusterSet::default();
//! clusters.add(Fact::quantity("Water use", "100", 100.0, "m3/d", "", SourceLocation::default()));
//! let cluster = clusters.add(Fact::quantity("Water Use", "1,000", 1000.0, "m3/d", "", SourceLocation::default()));
//!
//! assert_eq!(cluster.len(), 2);
//! assert!(cluster.has_conflict());
//! ```

#![warn(missing_docs)]

mod cluster;
mod config;
mod conflict;

pub use cluster::{ClusterSet, FactCluster, Representative};
pub use config::ConflictConfig;
pub use conflict::{ConflictDetector, ConflictFinding, ConflictReport};
