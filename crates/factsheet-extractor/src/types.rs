//! Extraction result types

use factsheet_domain::{Fact, FactFields, FactKind, SourceLocation};
use serde::{Deserialize, Serialize};

/// What happened to one chunk
///
/// Only `Facts` contributes to the run; the other two variants are counted
/// as skipped chunks. None of them stops the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    /// The response was read (possibly after repair); may be empty
    Facts(Vec<Fact>),

    /// The response could not be read as facts, even after repair
    SchemaViolation {
        /// Parser message
        reason: String,
    },

    /// The LLM call failed after retries, or timed out
    LlmFailure {
        /// Provider error message
        reason: String,
    },
}

impl ExtractionOutcome {
    /// Facts extracted from the chunk; empty for skipped chunks
    pub fn facts(&self) -> &[Fact] {
        match self {
            ExtractionOutcome::Facts(facts) => facts,
            _ => &[],
        }
    }

    /// Take the facts out of the outcome
    pub fn into_facts(self) -> Vec<Fact> {
        match self {
            ExtractionOutcome::Facts(facts) => facts,
            _ => Vec::new(),
        }
    }

    /// Whether the chunk yielded nothing because of a failure
    pub fn is_skipped(&self) -> bool {
        !matches!(self, ExtractionOutcome::Facts(_))
    }

    /// Failure reason for skipped chunks
    pub fn reason(&self) -> Option<&str> {
        match self {
            ExtractionOutcome::Facts(_) => None,
            ExtractionOutcome::SchemaViolation { reason } | ExtractionOutcome::LlmFailure { reason } => {
                Some(reason)
            }
        }
    }
}

/// One fact as read from model output, before the engine derives anything
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactCandidate {
    /// Human-readable label
    pub name: String,

    /// Quantity or categorical
    pub kind: FactKind,

    /// Value as written
    pub raw_value: String,

    /// Parsed numeric value
    pub numeric_value: f64,

    /// Unit as written
    pub raw_unit: String,

    /// Alternative names
    pub aliases: Vec<String>,

    /// Supporting quote
    pub evidence: String,
}

impl FactCandidate {
    /// Turn the candidate into a [`Fact`], computing signature and normalized value
    pub fn into_fact(self, source_location: SourceLocation) -> Fact {
        FactFields {
            name: self.name.trim().to_string(),
            kind: Some(self.kind),
            raw_value: self.raw_value,
            numeric_value: self.numeric_value,
            raw_unit: self.raw_unit,
            aliases: self.aliases,
            evidence: self.evidence,
            source_location,
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factsheet_domain::Page;

    #[test]
    fn test_candidate_into_fact_computes_derived_fields() {
        let candidate = FactCandidate {
            name: "  Project Area ".to_string(),
            kind: FactKind::Quantity,
            raw_value: "300".to_string(),
            numeric_value: 300.0,
            raw_unit: "acres".to_string(),
            aliases: vec!["site area".to_string()],
            evidence: "The project area is 300 acres.".to_string(),
        };
        let fact = candidate.into_fact(SourceLocation::new(2, Page::Number(7)));
        assert_eq!(fact.name, "Project Area");
        assert_eq!(fact.signature(), "project_area");
        assert_eq!(fact.normalized_unit(), "ha");
        assert!((fact.normalized_value() - 121.405692672).abs() < 1e-6);
        assert_eq!(fact.source_location.chunk_index, 2);
    }

    #[test]
    fn test_outcome_accessors() {
        let skipped = ExtractionOutcome::SchemaViolation {
            reason: "no array".to_string(),
        };
        assert!(skipped.is_skipped());
        assert!(skipped.facts().is_empty());
        assert_eq!(skipped.reason(), Some("no array"));

        let ok = ExtractionOutcome::Facts(Vec::new());
        assert!(!ok.is_skipped());
        assert_eq!(ok.reason(), None);
    }
}
