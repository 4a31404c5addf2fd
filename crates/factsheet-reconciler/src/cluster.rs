//! Fact clusters: every occurrence of one signature

use crate::conflict::ConflictDetector;
use factsheet_domain::{Fact, FactKind};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// All occurrences of one fact signature within a document
///
/// `has_conflict` and `conflict_description` are derived from the
/// occurrences and are recomputed on every addition; there is no way to
/// set them directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactCluster {
    signature: String,
    occurrences: Vec<Fact>,
    has_conflict: bool,
    conflict_description: String,
}

/// Consolidated value of a cluster
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Representative {
    /// Raw text of the first occurrence holding the modal value
    pub raw_value: String,

    /// Modal normalized value (0.0 for categorical clusters)
    pub value: f64,

    /// Normalized unit of the modal value
    pub unit: String,

    /// Smallest normalized value in the same unit
    pub min: f64,

    /// Largest normalized value in the same unit
    pub max: f64,
}

impl FactCluster {
    fn new(signature: String) -> Self {
        Self {
            signature,
            occurrences: Vec::new(),
            has_conflict: false,
            conflict_description: String::new(),
        }
    }

    /// Clustering key shared by every occurrence
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Occurrences in the order they were added
    pub fn occurrences(&self) -> &[Fact] {
        &self.occurrences
    }

    /// Number of occurrences
    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    /// Whether the cluster has no occurrences
    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    /// Whether any conflict rule fired
    pub fn has_conflict(&self) -> bool {
        self.has_conflict
    }

    /// Triggered rule explanations, empty without conflict
    pub fn conflict_description(&self) -> &str {
        &self.conflict_description
    }

    /// First occurrence; its name and unit represent the cluster
    pub fn first(&self) -> Option<&Fact> {
        self.occurrences.first()
    }

    /// Display name (first occurrence)
    pub fn name(&self) -> &str {
        self.first().map(|f| f.name.as_str()).unwrap_or_default()
    }

    /// Kind of the first occurrence
    pub fn kind(&self) -> FactKind {
        self.first().map(|f| f.kind).unwrap_or(FactKind::Quantity)
    }

    /// All aliases across occurrences, deduplicated, first-seen order
    pub fn aliases(&self) -> Vec<String> {
        let mut aliases: Vec<String> = Vec::new();
        for alias in self.occurrences.iter().flat_map(|f| f.aliases.iter()) {
            if !aliases.iter().any(|a| a.eq_ignore_ascii_case(alias)) {
                aliases.push(alias.clone());
            }
        }
        aliases
    }

    /// Modal value among occurrences of the cluster's kind
    ///
    /// Ties go to the value seen first. Quantities are compared on
    /// (normalized value, normalized unit); categorical values on their
    /// case-folded text.
    pub fn representative(&self) -> Option<Representative> {
        let kind = self.kind();
        let candidates: Vec<&Fact> = self.occurrences.iter().filter(|f| f.kind == kind).collect();

        // (key, count, index of first occurrence holding the key)
        let mut tally: Vec<(String, usize, usize)> = Vec::new();
        for (idx, fact) in candidates.iter().enumerate() {
            let key = match kind {
                FactKind::Quantity => format!("{:x}|{}", fact.normalized_value().to_bits(), fact.normalized_unit()),
                FactKind::Categorical => fact.raw_value.trim().to_lowercase(),
            };
            match tally.iter_mut().find(|(k, _, _)| *k == key) {
                Some((_, count, _)) => *count += 1,
                None => tally.push((key, 1, idx)),
            }
        }

        // max_by_key keeps the last maximum, so iterate in reverse to keep the first
        let (_, _, first_idx) = tally.iter().rev().max_by_key(|(_, count, _)| *count)?;
        let modal = candidates[*first_idx];

        let (min, max) = match kind {
            FactKind::Quantity => candidates
                .iter()
                .filter(|f| f.normalized_unit() == modal.normalized_unit())
                .map(|f| f.normalized_value())
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v))),
            FactKind::Categorical => (0.0, 0.0),
        };

        Some(Representative {
            raw_value: modal.raw_value.clone(),
            value: modal.normalized_value(),
            unit: modal.normalized_unit().to_string(),
            min,
            max,
        })
    }

    /// Recompute the derived conflict fields from the occurrences
    pub fn recompute(&mut self, detector: &ConflictDetector) {
        let (has_conflict, description) = detector.conflicts(&self.occurrences);
        self.has_conflict = has_conflict;
        self.conflict_description = description;
    }

    fn push(&mut self, fact: Fact, detector: &ConflictDetector) {
        self.occurrences.push(fact);
        self.recompute(detector);
    }
}

/// Map from signature to cluster
///
/// Iteration is ordered by signature. Within a cluster, occurrences keep
/// the order they were added in, which is chunk order when facts are added
/// as chunks complete.
#[derive(Debug, Clone, Default)]
pub struct ClusterSet {
    clusters: BTreeMap<String, FactCluster>,
    detector: ConflictDetector,
}

impl ClusterSet {
    /// Create an empty set using the given detector
    pub fn new(detector: ConflictDetector) -> Self {
        Self {
            clusters: BTreeMap::new(),
            detector,
        }
    }

    /// Append a fact to its cluster, creating the cluster on first sight
    pub fn add(&mut self, fact: Fact) -> &FactCluster {
        let signature = fact.signature().to_string();
        let cluster = self
            .clusters
            .entry(signature.clone())
            .or_insert_with(|| FactCluster::new(signature));
        cluster.push(fact, &self.detector);
        if cluster.has_conflict() {
            debug!(signature = cluster.signature(), "Conflict: {}", cluster.conflict_description());
        }
        cluster
    }

    /// Add facts in order
    pub fn extend(&mut self, facts: impl IntoIterator<Item = Fact>) {
        for fact in facts {
            self.add(fact);
        }
    }

    /// Recompute every cluster's conflict fields; idempotent
    pub fn recompute_all(&mut self) {
        for cluster in self.clusters.values_mut() {
            cluster.recompute(&self.detector);
        }
    }

    /// Look up a cluster
    pub fn get(&self, signature: &str) -> Option<&FactCluster> {
        self.clusters.get(signature)
    }

    /// Clusters ordered by signature
    pub fn iter(&self) -> impl Iterator<Item = &FactCluster> {
        self.clusters.values()
    }

    /// Number of clusters
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Whether there are no clusters
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Total occurrences across clusters
    pub fn fact_count(&self) -> usize {
        self.clusters.values().map(FactCluster::len).sum()
    }

    /// Number of clusters with a conflict
    pub fn conflicted_count(&self) -> usize {
        self.clusters.values().filter(|c| c.has_conflict()).count()
    }
}
