//! Run command implementation.

use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use factsheet_llm::OllamaProvider;
use factsheet_pipeline::{Pipeline, PipelineConfig, RecordSets, ResumeMode, ResumePrompt};
use factsheet_store::Checkpoint;
use serde::Serialize;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Asks on the terminal whether to resume.
pub struct StdinResumePrompt;

impl ResumePrompt for StdinResumePrompt {
    fn should_resume(&self, checkpoint: &Checkpoint) -> bool {
        eprintln!(
            "Found a checkpoint for this document: {} chunks done, {} facts (run {}).",
            checkpoint.processed_chunk_count,
            checkpoint.facts.len(),
            checkpoint.run_id
        );
        eprint!("Resume? [Y/n] ");
        let _ = io::stderr().flush();

        let mut response = String::new();
        match io::stdin().read_line(&mut response) {
            Ok(_) => answer_is_yes(&response),
            Err(_) => true,
        }
    }
}

/// Empty input means yes.
fn answer_is_yes(response: &str) -> bool {
    let answer = response.trim();
    answer.is_empty() || answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

/// Execute the run command.
pub async fn execute_run(args: RunArgs, mut config: PipelineConfig, formatter: &Formatter) -> Result<()> {
    let document = fs::read_to_string(&args.input)
        .map_err(|e| CliError::InvalidInput(format!("Cannot read {}: {}", args.input.display(), e)))?;

    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }

    let llm = Arc::new(
        OllamaProvider::new(&config.llm.endpoint, &config.llm.model)
            .with_temperature(config.llm.temperature)
            .with_max_tokens(config.llm.max_tokens),
    );
    let pipeline = Pipeline::new(llm, config)?;

    let prompt: Box<dyn ResumePrompt> = if args.resume {
        Box::new(ResumeMode::Resume)
    } else if args.restart {
        Box::new(ResumeMode::Restart)
    } else {
        Box::new(StdinResumePrompt)
    };

    let shutdown = async {
        // Without a signal handler the run is never interrupted
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    let output = pipeline.run_until(&document, prompt.as_ref(), shutdown).await?;
    let written = write_records(&args.out_dir, &output.records)?;

    println!("{}", formatter.format_factsheet(&output.records.factsheet)?);
    eprintln!("{}", formatter.format_summary(&output.summary)?);
    for path in &written {
        eprintln!("{}", formatter.success(&format!("Wrote {}", path.display())));
    }
    if !output.summary.is_clean() {
        eprintln!(
            "{}",
            formatter.warning(&format!(
                "{} chunk(s) skipped, {} categorization(s) failed; see the log for details",
                output.summary.chunks_skipped, output.summary.categorization_failures
            ))
        );
    }

    Ok(())
}

/// Write the three record sets as JSON files into `out_dir`.
pub fn write_records(out_dir: &Path, records: &RecordSets) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;
    Ok(vec![
        write_json(&out_dir.join("mentions.json"), &records.mentions)?,
        write_json(&out_dir.join("consolidated.json"), &records.consolidated)?,
        write_json(&out_dir.join("factsheet.json"), &records.factsheet)?,
    ])
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_answer_is_yes() {
        assert!(answer_is_yes("\n"));
        assert!(answer_is_yes("Y\n"));
        assert!(answer_is_yes(" yes "));
        assert!(!answer_is_yes("n\n"));
        assert!(!answer_is_yes("no"));
    }

    #[test]
    fn test_write_records() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("reports");

        let written = write_records(&out, &RecordSets::default()).unwrap();

        assert_eq!(written.len(), 3);
        for name in ["mentions.json", "consolidated.json", "factsheet.json"] {
            let contents = fs::read_to_string(out.join(name)).unwrap();
            assert_eq!(contents.trim(), "[]");
        }
    }
}
