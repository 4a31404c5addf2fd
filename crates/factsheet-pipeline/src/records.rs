//! Output record sets handed to reporting

use factsheet_domain::{Categorization, Category, Confidence, Fact, FactKind, Page, Subcategory};
use factsheet_reconciler::{ClusterSet, FactCluster};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One row per fact occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionRecord {
    /// Clustering key derived from the name
    pub signature: String,
    /// Fact name as extracted
    pub name: String,
    /// Quantity or categorical
    pub kind: FactKind,
    /// Value text as written in the document
    pub raw_value: String,
    /// Unit text as written in the document
    pub raw_unit: String,
    /// Parsed value in the raw unit
    pub numeric_value: f64,
    /// Value converted to the canonical unit
    pub normalized_value: f64,
    /// Canonical unit, or the raw unit when unknown
    pub normalized_unit: String,
    /// Quote supporting the fact
    pub evidence: String,
    /// Page the evidence is on
    pub page: Page,
    /// Chunk the fact was extracted from (0-based)
    pub chunk_index: usize,
}

impl From<&Fact> for MentionRecord {
    fn from(fact: &Fact) -> Self {
        Self {
            signature: fact.signature().to_string(),
            name: fact.name.clone(),
            kind: fact.kind,
            raw_value: fact.raw_value.clone(),
            raw_unit: fact.raw_unit.clone(),
            numeric_value: fact.numeric_value,
            normalized_value: fact.normalized_value(),
            normalized_unit: fact.normalized_unit().to_string(),
            evidence: fact.evidence.clone(),
            page: fact.source_location.page,
            chunk_index: fact.source_location.chunk_index,
        }
    }
}

/// One row per cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedRecord {
    /// Cluster key
    pub signature: String,
    /// Name of the first occurrence
    pub name: String,
    /// Kind of the first occurrence
    pub kind: FactKind,
    /// Aliases across occurrences, deduplicated
    pub aliases: Vec<String>,
    /// Raw text of the modal value
    pub value: String,
    /// Modal normalized value; 0.0 for categorical facts
    pub normalized_value: f64,
    /// Normalized unit of the modal value
    pub unit: String,
    /// Smallest normalized value in the modal value's unit
    pub min_value: f64,
    /// Largest normalized value in the modal value's unit
    pub max_value: f64,
    /// Number of mentions in the cluster
    pub occurrence_count: usize,
    /// Distinct pages the fact was seen on, ascending; unknown pages omitted
    pub pages: Vec<u32>,
    /// Whether any conflict rule fired
    pub has_conflict: bool,
    /// Triggered rule explanations, empty without a conflict
    pub conflict_description: String,
}

impl From<&FactCluster> for ConsolidatedRecord {
    fn from(cluster: &FactCluster) -> Self {
        let representative = cluster.representative();
        let mut pages: Vec<u32> = cluster
            .occurrences()
            .iter()
            .filter_map(|f| f.source_location.page.number())
            .collect();
        pages.sort_unstable();
        pages.dedup();

        Self {
            signature: cluster.signature().to_string(),
            name: cluster.name().to_string(),
            kind: cluster.kind(),
            aliases: cluster.aliases(),
            value: representative.as_ref().map(|r| r.raw_value.clone()).unwrap_or_default(),
            normalized_value: representative.as_ref().map(|r| r.value).unwrap_or_default(),
            unit: representative.as_ref().map(|r| r.unit.clone()).unwrap_or_default(),
            min_value: representative.as_ref().map(|r| r.min).unwrap_or_default(),
            max_value: representative.as_ref().map(|r| r.max).unwrap_or_default(),
            occurrence_count: cluster.len(),
            pages,
            has_conflict: cluster.has_conflict(),
            conflict_description: cluster.conflict_description().to_string(),
        }
    }
}

/// Consolidated row joined with its categorization
///
/// The categorization columns are empty when categorization failed or was
/// disabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactsheetRecord {
    /// Top-level category
    pub category: Option<Category>,
    /// Subcategory within `category`
    pub subcategory: Option<Subcategory>,
    /// Model-reported confidence
    pub confidence: Option<Confidence>,
    /// Short explanation from the model
    pub rationale: Option<String>,
    /// Cluster columns
    #[serde(flatten)]
    pub consolidated: ConsolidatedRecord,
}

impl FactsheetRecord {
    /// Join a consolidated row with an optional categorization
    pub fn new(consolidated: ConsolidatedRecord, categorization: Option<&Categorization>) -> Self {
        Self {
            category: categorization.map(|c| c.category),
            subcategory: categorization.map(|c| c.subcategory),
            confidence: categorization.map(|c| c.confidence),
            rationale: categorization.map(|c| c.rationale.clone()),
            consolidated,
        }
    }

    /// Whether a categorization was attached
    pub fn is_categorized(&self) -> bool {
        self.category.is_some()
    }
}

/// The three record sets of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSets {
    /// Every occurrence, in chunk order
    pub mentions: Vec<MentionRecord>,
    /// One row per cluster, ordered by signature
    pub consolidated: Vec<ConsolidatedRecord>,
    /// Consolidated rows with categorization, ordered by signature
    pub factsheet: Vec<FactsheetRecord>,
}

impl RecordSets {
    /// Build all three record sets
    pub fn build(
        facts: &[Fact],
        clusters: &ClusterSet,
        categorizations: &HashMap<String, Categorization>,
    ) -> Self {
        let mentions = facts.iter().map(MentionRecord::from).collect();
        let consolidated: Vec<ConsolidatedRecord> = clusters.iter().map(ConsolidatedRecord::from).collect();
        let factsheet = consolidated
            .iter()
            .map(|row| FactsheetRecord::new(row.clone(), categorizations.get(&row.signature)))
            .collect();

        Self {
            mentions,
            consolidated,
            factsheet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factsheet_domain::SourceLocation;
    use factsheet_reconciler::ConflictDetector;

    fn co2(value: f64, raw: &str, chunk: usize, page: Page) -> Fact {
        Fact::quantity(
            "Annual CO2 emissions",
            raw,
            value,
            "t/yr",
            format!("emissions of {} t/yr", raw),
            SourceLocation::new(chunk, page),
        )
    }

    fn sample() -> (Vec<Fact>, ClusterSet) {
        let facts = vec![
            co2(250_000.0, "250,000", 0, Page::Number(4)),
            Fact::categorical("Wetland classification", "Category A", "", SourceLocation::new(1, Page::Unknown)),
            co2(250_000.0, "250 000", 2, Page::Number(9)),
            co2(25_000.0, "25,000", 3, Page::Number(4)),
        ];
        let mut clusters = ClusterSet::new(ConflictDetector::default());
        clusters.extend(facts.iter().cloned());
        (facts, clusters)
    }

    #[test]
    fn test_mentions_keep_chunk_order() {
        let (facts, clusters) = sample();
        let records = RecordSets::build(&facts, &clusters, &HashMap::new());

        assert_eq!(records.mentions.len(), 4);
        let chunks: Vec<usize> = records.mentions.iter().map(|m| m.chunk_index).collect();
        assert_eq!(chunks, vec![0, 1, 2, 3]);
        assert_eq!(records.mentions[0].normalized_unit, "kg/yr");
        assert_eq!(records.mentions[0].normalized_value, 250_000_000.0);
    }

    #[test]
    fn test_consolidated_row() {
        let (facts, clusters) = sample();
        let records = RecordSets::build(&facts, &clusters, &HashMap::new());

        let row = records
            .consolidated
            .iter()
            .find(|r| r.signature == "annual_co2_emissions")
            .unwrap();
        assert_eq!(row.occurrence_count, 3);
        assert_eq!(row.value, "250,000");
        assert_eq!(row.normalized_value, 250_000_000.0);
        assert_eq!(row.min_value, 25_000_000.0);
        assert_eq!(row.pages, vec![4, 9]);
        assert!(row.has_conflict);
        assert!(row.conflict_description.contains("decimal-shift"));
    }

    #[test]
    fn test_factsheet_join() {
        let (facts, clusters) = sample();
        let mut categorizations = HashMap::new();
        categorizations.insert(
            "annual_co2_emissions".to_string(),
            Categorization::from_labels("air_climate", "ghg_emissions", "high", "GHG").unwrap(),
        );
        let records = RecordSets::build(&facts, &clusters, &categorizations);

        assert_eq!(records.factsheet.len(), 2);
        let categorized: Vec<&FactsheetRecord> =
            records.factsheet.iter().filter(|r| r.is_categorized()).collect();
        assert_eq!(categorized.len(), 1);
        assert_eq!(categorized[0].category, Some(Category::AirClimate));
        assert_eq!(categorized[0].consolidated.signature, "annual_co2_emissions");
    }

    #[test]
    fn test_factsheet_json_is_flat() {
        let (facts, clusters) = sample();
        let records = RecordSets::build(&facts, &clusters, &HashMap::new());
        let json = serde_json::to_value(&records.factsheet[0]).unwrap();

        assert!(json.get("signature").is_some());
        assert!(json.get("consolidated").is_none());
        assert!(json["category"].is_null());
    }
}
