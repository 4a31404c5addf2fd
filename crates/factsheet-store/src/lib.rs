//! Factsheet Checkpoint Storage
//!
//! Persists extraction progress so a long run can resume after a crash or
//! an interrupt.
//!
//! # Format
//!
//! A checkpoint is one JSON document:
//!
//! - `format_version`: bumped on any incompatible change; other versions are refused
//! - `run_id`: UUIDv7 of the run that wrote it
//! - `document_fingerprint`: SHA-256 of the document text, so a checkpoint
//!   is never resumed against a different document
//! - `facts`: every fact extracted so far, in chunk order
//! - `processed_chunk_count`: length of the contiguous prefix of chunks done
//! - `saved_at`: Unix timestamp (seconds)
//!
//! Derived fact fields are written for readability but recomputed on load.
//!
//! # Examples
//!
//! ```no_run
//! use factsheet_store::{CheckpointManager, RunIdentity};
//!
//! let manager = CheckpointManager::new("factsheet.checkpoint.json");
//! let run = RunIdentity::for_document("document text");
//! manager.save(&run, &[], 0).unwrap();
//! let checkpoint = manager.load().unwrap();
//! assert!(checkpoint.is_some());
//! manager.clear().unwrap();
//! ```

#![warn(missing_docs)]

mod checkpoint;

pub use checkpoint::{
    fingerprint, Checkpoint, CheckpointManager, RunIdentity, DEFAULT_CHECKPOINT_PATH, FORMAT_VERSION,
};

use thiserror::Error;

/// Errors that can occur during checkpoint operations
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// Filesystem error (disk full, permission denied, ...)
    #[error("Checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Checkpoint could not be encoded or decoded
    #[error("Checkpoint serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Checkpoint written by an incompatible version
    #[error("Unsupported checkpoint format version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found on disk
        found: u32,
        /// Version this build writes
        expected: u32,
    },
}

impl CheckpointError {
    /// Whether the file on disk is unusable but the disk itself is fine
    ///
    /// Such a checkpoint can be discarded; I/O errors cannot.
    pub fn is_unreadable_checkpoint(&self) -> bool {
        matches!(
            self,
            CheckpointError::Serialization(_) | CheckpointError::UnsupportedVersion { .. }
        )
    }
}
