//! Command implementations.

pub mod checkpoint;
pub mod normalize;
pub mod run;

pub use self::checkpoint::execute_checkpoint;
pub use self::normalize::execute_normalize;
pub use self::run::{execute_run, write_records, StdinResumePrompt};
