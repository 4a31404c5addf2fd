//! Resume decision for an existing checkpoint

use factsheet_store::Checkpoint;

/// Decides whether a run picks up from a compatible checkpoint
///
/// Only consulted when the checkpoint matches the document being
/// processed. The CLI implements this by asking the operator.
pub trait ResumePrompt: Send + Sync {
    /// `true` to continue at `checkpoint.processed_chunk_count`,
    /// `false` to start again from chunk 0
    fn should_resume(&self, checkpoint: &Checkpoint) -> bool;
}

/// Fixed answer, for non-interactive runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResumeMode {
    /// Always resume
    #[default]
    Resume,
    /// Always start from chunk 0
    Restart,
}

impl ResumePrompt for ResumeMode {
    fn should_resume(&self, _checkpoint: &Checkpoint) -> bool {
        matches!(self, ResumeMode::Resume)
    }
}
