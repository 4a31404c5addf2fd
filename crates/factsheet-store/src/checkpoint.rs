//! Versioned, atomically written checkpoint files

use crate::CheckpointError;
use factsheet_domain::Fact;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

/// Format version written by this build
pub const FORMAT_VERSION: u32 = 1;

/// Checkpoint file used when none is configured
pub const DEFAULT_CHECKPOINT_PATH: &str = "factsheet.checkpoint.json";

/// Identifies one run over one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunIdentity {
    /// Fresh UUIDv7, or the id carried over from a resumed checkpoint
    pub run_id: String,
    /// SHA-256 of the document text
    pub document_fingerprint: String,
}

impl RunIdentity {
    /// Start a new run over `text`
    pub fn for_document(text: &str) -> Self {
        Self {
            run_id: Uuid::now_v7().to_string(),
            document_fingerprint: fingerprint(text),
        }
    }

    /// Continue the run recorded in `checkpoint`
    pub fn resumed(checkpoint: &Checkpoint) -> Self {
        Self {
            run_id: checkpoint.run_id.clone(),
            document_fingerprint: checkpoint.document_fingerprint.clone(),
        }
    }
}

/// Hex SHA-256 of a document's text
pub fn fingerprint(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{:02x}", byte);
    }
    hex
}

/// A loaded checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Always [`FORMAT_VERSION`] once loaded
    pub format_version: u32,
    /// Run that wrote the checkpoint
    pub run_id: String,
    /// SHA-256 of the document the run was processing
    pub document_fingerprint: String,
    /// Facts extracted from the first `processed_chunk_count` chunks
    pub facts: Vec<Fact>,
    /// Chunks `0..processed_chunk_count` are done
    pub processed_chunk_count: usize,
    /// Unix timestamp of the save (seconds)
    pub saved_at: u64,
}

impl Checkpoint {
    /// Whether this checkpoint was taken over the given document text
    pub fn matches_document(&self, text: &str) -> bool {
        self.document_fingerprint == fingerprint(text)
    }
}

/// Borrowed view written on save, so large fact lists are not cloned
#[derive(Serialize)]
struct CheckpointRef<'a> {
    format_version: u32,
    run_id: &'a str,
    document_fingerprint: &'a str,
    facts: &'a [Fact],
    processed_chunk_count: usize,
    saved_at: u64,
}

#[derive(Deserialize)]
struct VersionHeader {
    format_version: u32,
}

/// Saves, loads and clears the checkpoint file at one path
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    path: PathBuf,
}

impl CheckpointManager {
    /// Manage the checkpoint at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Location of the checkpoint file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a checkpoint file exists
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Replace the checkpoint with the given progress
    ///
    /// The file is written to a temporary sibling, flushed, then renamed over
    /// the old one. A crash mid-save leaves the previous checkpoint intact.
    pub fn save(
        &self,
        run: &RunIdentity,
        facts: &[Fact],
        processed_chunk_count: usize,
    ) -> Result<(), CheckpointError> {
        let snapshot = CheckpointRef {
            format_version: FORMAT_VERSION,
            run_id: &run.run_id,
            document_fingerprint: &run.document_fingerprint,
            facts,
            processed_chunk_count,
            saved_at: unix_now(),
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(
            path = %self.path.display(),
            processed_chunk_count,
            facts = facts.len(),
            "Checkpoint saved"
        );
        Ok(())
    }

    /// Load the checkpoint, if one exists
    ///
    /// Returns `UnsupportedVersion` for files written by another format
    /// version and `Serialization` for unparseable files; callers may discard
    /// those (see [`CheckpointError::is_unreadable_checkpoint`]).
    pub fn load(&self) -> Result<Option<Checkpoint>, CheckpointError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let header: VersionHeader = serde_json::from_slice(&bytes)?;
        if header.format_version != FORMAT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: header.format_version,
                expected: FORMAT_VERSION,
            });
        }

        let checkpoint: Checkpoint = serde_json::from_slice(&bytes)?;
        info!(
            path = %self.path.display(),
            run_id = %checkpoint.run_id,
            processed_chunk_count = checkpoint.processed_chunk_count,
            facts = checkpoint.facts.len(),
            "Checkpoint loaded"
        );
        Ok(Some(checkpoint))
    }

    /// Delete the checkpoint; a missing file is not an error
    pub fn clear(&self) -> Result<(), CheckpointError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Checkpoint cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for CheckpointManager {
    fn default() -> Self {
        Self::new(DEFAULT_CHECKPOINT_PATH)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
