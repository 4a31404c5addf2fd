//! Checkpoint command implementation.

use crate::cli::{CheckpointAction, CheckpointArgs};
use crate::error::Result;
use crate::output::Formatter;
use factsheet_store::CheckpointManager;
use std::io::{self, Write};

/// Execute the checkpoint command.
pub fn execute_checkpoint(
    args: CheckpointArgs,
    manager: &CheckpointManager,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        CheckpointAction::Show => match manager.load()? {
            Some(checkpoint) => println!("{}", formatter.format_checkpoint(&checkpoint)?),
            None => println!(
                "{}",
                formatter.info(&format!("No checkpoint at {}", manager.path().display()))
            ),
        },
        CheckpointAction::Clear { yes } => {
            if !manager.exists() {
                println!(
                    "{}",
                    formatter.info(&format!("No checkpoint at {}", manager.path().display()))
                );
                return Ok(());
            }

            if !yes {
                print!("Delete {}? Progress cannot be resumed afterwards. [y/N] ", manager.path().display());
                io::stdout().flush()?;

                let mut response = String::new();
                io::stdin().read_line(&mut response)?;

                if !response.trim().eq_ignore_ascii_case("y") {
                    println!("{}", formatter.info("Operation cancelled"));
                    return Ok(());
                }
            }

            manager.clear()?;
            println!("{}", formatter.success("Checkpoint deleted"));
        }
    }
    Ok(())
}
