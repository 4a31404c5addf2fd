//! Output formatting for the CLI.

use crate::cli::CliFormat;
use crate::error::Result;
use colored::*;
use factsheet_domain::units::Quantity;
use factsheet_pipeline::{FactsheetRecord, RunSummary};
use factsheet_store::Checkpoint;
use serde_json::json;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Longest conflict description shown in a table cell
const MAX_CELL_CHARS: usize = 60;

/// Output formatter.
pub struct Formatter {
    format: CliFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: CliFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format factsheet rows.
    pub fn format_factsheet(&self, rows: &[FactsheetRecord]) -> Result<String> {
        match self.format {
            CliFormat::Json => Ok(serde_json::to_string_pretty(rows)?),
            CliFormat::Table => Ok(self.factsheet_table(rows)),
        }
    }

    fn factsheet_table(&self, rows: &[FactsheetRecord]) -> String {
        if rows.is_empty() {
            return self.colorize("No facts found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Fact", "Value", "Unit", "Seen", "Category", "Subcategory", "Confidence", "Conflict"]);

        for row in rows {
            let fact = &row.consolidated;
            let conflict = if fact.has_conflict {
                truncate(&fact.conflict_description, MAX_CELL_CHARS)
            } else {
                String::new()
            };
            builder.push_record([
                fact.name.clone(),
                fact.value.clone(),
                fact.unit.clone(),
                fact.occurrence_count.to_string(),
                row.category.map(|c| c.as_str().to_string()).unwrap_or_default(),
                row.subcategory.map(|s| s.as_str().to_string()).unwrap_or_default(),
                row.confidence.map(|c| c.as_str().to_string()).unwrap_or_default(),
                conflict,
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format a run summary.
    pub fn format_summary(&self, summary: &RunSummary) -> Result<String> {
        match self.format {
            CliFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
            CliFormat::Table => Ok(summary.summary()),
        }
    }

    /// Format a saved checkpoint.
    pub fn format_checkpoint(&self, checkpoint: &Checkpoint) -> Result<String> {
        match self.format {
            CliFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "format_version": checkpoint.format_version,
                "run_id": checkpoint.run_id,
                "document_fingerprint": checkpoint.document_fingerprint,
                "processed_chunk_count": checkpoint.processed_chunk_count,
                "facts": checkpoint.facts.len(),
                "saved_at": checkpoint.saved_at,
            }))?),
            CliFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Run", "Chunks done", "Facts", "Saved at (unix)", "Document"]);
                builder.push_record([
                    checkpoint.run_id.clone(),
                    checkpoint.processed_chunk_count.to_string(),
                    checkpoint.facts.len().to_string(),
                    checkpoint.saved_at.to_string(),
                    checkpoint.document_fingerprint.chars().take(12).collect::<String>(),
                ]);
                let mut table = builder.build();
                table.with(Style::rounded());
                Ok(table.to_string())
            }
        }
    }

    /// Format a unit normalization.
    pub fn format_normalized(
        &self,
        value: f64,
        unit: &str,
        normalized: (f64, &str),
        quantity: Option<Quantity>,
    ) -> Result<String> {
        let (normalized_value, normalized_unit) = normalized;
        match self.format {
            CliFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "value": value,
                "unit": unit,
                "normalized_value": normalized_value,
                "normalized_unit": normalized_unit,
                "quantity": quantity.map(|q| format!("{:?}", q)),
            }))?),
            CliFormat::Table => match quantity {
                Some(q) => Ok(format!(
                    "{} {} = {} {} ({:?})",
                    value, unit, normalized_value, normalized_unit, q
                )),
                None => Ok(self.warning(&format!("Unknown unit '{}', value passes through unchanged", unit))),
            },
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    short.push('…');
    short
}

#[cfg(test)]
mod tests {
    use super::*;
    use factsheet_domain::{Categorization, FactKind};
    use factsheet_pipeline::ConsolidatedRecord;

    fn row(categorized: bool) -> FactsheetRecord {
        let consolidated = ConsolidatedRecord {
            signature: "annual_co2_emissions".to_string(),
            name: "Annual CO2 emissions".to_string(),
            kind: FactKind::Quantity,
            aliases: vec![],
            value: "250,000".to_string(),
            normalized_value: 250_000_000.0,
            unit: "kg/yr".to_string(),
            min_value: 25_000_000.0,
            max_value: 250_000_000.0,
            occurrence_count: 2,
            pages: vec![4, 9],
            has_conflict: true,
            conflict_description: "probable decimal-shift error (25000000 vs 250000000 kg/yr)".to_string(),
        };
        let categorization = Categorization::from_labels("air_climate", "ghg_emissions", "high", "").unwrap();
        FactsheetRecord::new(consolidated, categorized.then_some(&categorization))
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(CliFormat::Table, false);
        let output = formatter.format_factsheet(&[row(true), row(false)]).unwrap();
        assert!(output.contains("Annual CO2 emissions"));
        assert!(output.contains("ghg_emissions"));
        assert!(output.contains("decimal-shift"));
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(CliFormat::Json, false);
        let output = formatter.format_factsheet(&[row(true)]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["category"], "air_climate");
        assert_eq!(value[0]["signature"], "annual_co2_emissions");
    }

    #[test]
    fn test_empty_table() {
        let formatter = Formatter::new(CliFormat::Table, false);
        assert_eq!(formatter.format_factsheet(&[]).unwrap(), "No facts found.");
    }

    #[test]
    fn test_normalized_unknown_unit() {
        let formatter = Formatter::new(CliFormat::Table, false);
        let output = formatter.format_normalized(7.0, "furlongs", (7.0, "furlongs"), None).unwrap();
        assert!(output.contains("Unknown unit"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(CliFormat::Table, false);
        assert_eq!(formatter.success("Done"), "✓ Done");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
