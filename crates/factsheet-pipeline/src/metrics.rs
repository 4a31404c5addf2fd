//! Counters reported at the end of a run

use factsheet_categorizer::CacheStats;
use serde::Serialize;

/// Counts collected during one pipeline run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// UUIDv7 of the run (kept across resumes)
    pub run_id: String,

    /// Model that served the LLM calls
    pub model: String,

    /// Chunks in the document
    pub chunks_total: usize,

    /// Chunks extracted during this invocation
    pub chunks_processed: usize,

    /// Chunks taken from a checkpoint instead of being extracted again
    pub chunks_resumed: usize,

    /// Chunks that yielded zero facts because of an LLM or output failure
    pub chunks_skipped: usize,

    /// Fact occurrences, including those restored from a checkpoint
    pub facts_extracted: usize,

    /// Distinct signatures
    pub clusters: usize,

    /// Clusters with a conflict
    pub conflicted_clusters: usize,

    /// Clusters that received a categorization
    pub categorized: usize,

    /// Clusters whose categorization failed
    pub categorization_failures: usize,

    /// Categorization cache statistics at the end of the run
    pub cache: CacheStats,

    /// Wall-clock time of this invocation (milliseconds)
    pub elapsed_ms: u64,
}

impl RunSummary {
    /// Create an empty summary for a run
    pub fn new(run_id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            model: model.into(),
            ..Self::default()
        }
    }

    /// Record one extracted chunk
    pub fn record_chunk(&mut self, facts: usize) {
        self.chunks_processed += 1;
        self.facts_extracted += facts;
    }

    /// Record one chunk that contributed zero facts after a failure
    pub fn record_skipped_chunk(&mut self) {
        self.chunks_processed += 1;
        self.chunks_skipped += 1;
    }

    /// Record a categorization result
    pub fn record_categorization(&mut self, succeeded: bool) {
        if succeeded {
            self.categorized += 1;
        } else {
            self.categorization_failures += 1;
        }
    }

    /// Whether every chunk and every categorization succeeded
    pub fn is_clean(&self) -> bool {
        self.chunks_skipped == 0 && self.categorization_failures == 0
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Factsheet Run Summary".to_string(),
            "=====================".to_string(),
            format!("Run: {}", self.run_id),
            format!("Model: {}", self.model),
            format!("Elapsed: {:.1}s", self.elapsed_ms as f64 / 1000.0),
            String::new(),
            "Chunks:".to_string(),
            format!("  Total: {}", self.chunks_total),
            format!("  Processed: {}", self.chunks_processed),
        ];
        if self.chunks_resumed > 0 {
            lines.push(format!("  Resumed from checkpoint: {}", self.chunks_resumed));
        }
        lines.push(format!("  Skipped: {}", self.chunks_skipped));
        lines.push(String::new());

        lines.push("Facts:".to_string());
        lines.push(format!("  Mentions: {}", self.facts_extracted));
        lines.push(format!("  Clusters: {}", self.clusters));
        lines.push(format!("  Conflicted clusters: {}", self.conflicted_clusters));
        lines.push(String::new());

        lines.push("Categorization:".to_string());
        lines.push(format!("  Categorized: {}", self.categorized));
        lines.push(format!("  Failed: {}", self.categorization_failures));
        lines.push(format!(
            "  Cache: {} hits, {} misses ({:.1}% hit rate), {} entries",
            self.cache.hits,
            self.cache.misses,
            self.cache.hit_rate * 100.0,
            self.cache.cache_size
        ));

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_chunks() {
        let mut summary = RunSummary::new("run", "mock");
        summary.record_chunk(3);
        summary.record_chunk(0);
        summary.record_skipped_chunk();

        assert_eq!(summary.chunks_processed, 3);
        assert_eq!(summary.chunks_skipped, 1);
        assert_eq!(summary.facts_extracted, 3);
        assert!(!summary.is_clean());
    }

    #[test]
    fn test_record_categorization() {
        let mut summary = RunSummary::new("run", "mock");
        summary.record_categorization(true);
        summary.record_categorization(true);
        summary.record_categorization(false);

        assert_eq!(summary.categorized, 2);
        assert_eq!(summary.categorization_failures, 1);
    }

    #[test]
    fn test_summary() {
        let mut summary = RunSummary::new("0190-abc", "llama3.1");
        summary.chunks_total = 20;
        summary.chunks_resumed = 10;
        summary.record_chunk(4);
        summary.clusters = 3;
        summary.cache = CacheStats {
            hits: 1,
            misses: 3,
            hit_rate: 0.25,
            cache_size: 3,
        };
        summary.elapsed_ms = 1500;

        let text = summary.summary();
        assert!(text.contains("Run: 0190-abc"));
        assert!(text.contains("Total: 20"));
        assert!(text.contains("Resumed from checkpoint: 10"));
        assert!(text.contains("Clusters: 3"));
        assert!(text.contains("25.0% hit rate"));
        assert!(text.contains("Elapsed: 1.5s"));
    }

    #[test]
    fn test_summary_omits_resume_line_for_fresh_runs() {
        let summary = RunSummary::new("run", "mock");
        assert!(!summary.summary().contains("Resumed"));
        assert!(summary.is_clean());
    }
}
