//! Core FactExtractor implementation

use crate::chunking::{Chunk, TextChunker};
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::pages::PageMarkers;
use crate::parser::parse_llm_response;
use crate::prompt::{PromptBuilder, FACT_SCHEMA};
use crate::types::ExtractionOutcome;
use factsheet_domain::traits::LlmProvider;
use factsheet_domain::{Fact, Page, SourceLocation};
use factsheet_llm::{invoke_structured, LlmError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The FactExtractor turns one chunk of text into facts
///
/// One schema-constrained LLM call is made per chunk. The response goes
/// through the repair parser; each surviving candidate gets its signature,
/// normalized value and source location computed here.
pub struct FactExtractor<L> {
    llm: Arc<L>,
    config: ExtractorConfig,
    markers: PageMarkers,
}

impl<L> FactExtractor<L>
where
    L: LlmProvider<Error = LlmError> + Send + Sync + 'static,
{
    /// Create a new FactExtractor
    pub fn new(llm: Arc<L>, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        let markers = PageMarkers::new(&config.page_marker_pattern)?;
        Ok(Self { llm, config, markers })
    }

    /// Get the configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Chunker using this extractor's chunk size and page markers
    pub fn chunker(&self) -> TextChunker {
        TextChunker::new(self.config.chunk_max_chars).with_page_markers(self.markers.clone())
    }

    /// Split a document into chunks
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        self.chunker().chunk(text)
    }

    /// Extract facts from a chunk
    ///
    /// Never fails: LLM errors, timeouts and unreadable output are reported
    /// in the outcome and logged, and the chunk contributes zero facts.
    pub async fn extract(&self, chunk: &Chunk) -> ExtractionOutcome {
        match self.try_extract(chunk).await {
            Ok(facts) => {
                debug!(chunk = chunk.index, facts = facts.len(), "Chunk extracted");
                ExtractionOutcome::Facts(facts)
            }
            Err(ExtractorError::Llm(e)) => {
                warn!(chunk = chunk.index, error = %e, "LLM call failed, skipping chunk");
                ExtractionOutcome::LlmFailure {
                    reason: e.to_string(),
                }
            }
            Err(e) => {
                warn!(chunk = chunk.index, error = %e, "Unreadable model output, skipping chunk");
                ExtractionOutcome::SchemaViolation {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Extract facts from a standalone piece of text, treated as chunk 0
    pub async fn extract_text(&self, text: &str) -> ExtractionOutcome {
        let chunk = Chunk {
            index: 0,
            text: text.to_string(),
            char_start: 0,
            char_end: text.chars().count(),
            page: self
                .markers
                .page_at(text, text.len() - text.trim_start().len())
                .map(Page::Number)
                .unwrap_or(Page::Unknown),
        };
        self.extract(&chunk).await
    }

    /// Extract facts from a chunk, surfacing the failure cause
    pub async fn try_extract(&self, chunk: &Chunk) -> Result<Vec<Fact>, ExtractorError> {
        if chunk.is_blank() {
            return Ok(Vec::new());
        }

        let prompt = PromptBuilder::new(chunk.text.as_str())
            .with_chunk_index(chunk.index)
            .build();
        debug!(chunk = chunk.index, "Prompt length: {} chars", prompt.len());

        let response = invoke_structured(&self.llm, &prompt, FACT_SCHEMA, &self.config.call).await?;
        debug!(chunk = chunk.index, "LLM response length: {} chars", response.len());

        let candidates = parse_llm_response(&response)?;
        if candidates.is_empty() {
            info!(chunk = chunk.index, "No facts found in chunk");
        }

        Ok(candidates
            .into_iter()
            .map(|candidate| {
                let page = self.evidence_page(chunk, &candidate.evidence);
                candidate.into_fact(SourceLocation::new(chunk.index, page))
            })
            .collect())
    }

    /// Page of the evidence quote: the last marker before it inside the chunk,
    /// falling back to the chunk's own page
    fn evidence_page(&self, chunk: &Chunk, evidence: &str) -> Page {
        let quote = evidence.trim();
        if quote.is_empty() {
            return chunk.page;
        }
        chunk
            .text
            .find(quote)
            .and_then(|pos| self.markers.page_at(&chunk.text, pos))
            .map(Page::Number)
            .unwrap_or(chunk.page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factsheet_llm::{CallPolicy, MockProvider};

    fn create_test_extractor(llm: MockProvider) -> (Arc<MockProvider>, FactExtractor<MockProvider>) {
        let llm = Arc::new(llm);
        let config = ExtractorConfig {
            call: CallPolicy {
                timeout_secs: 5,
                max_attempts: 2,
                backoff_base_ms: 1,
            },
            ..ExtractorConfig::default()
        };
        let extractor = FactExtractor::new(Arc::clone(&llm), config).unwrap();
        (llm, extractor)
    }

    #[tokio::test]
    async fn test_extract_empty_response() {
        let (_, extractor) = create_test_extractor(MockProvider::new("[]"));
        let outcome = extractor.extract_text("Some text").await;
        assert_eq!(outcome, ExtractionOutcome::Facts(Vec::new()));
    }

    #[tokio::test]
    async fn test_blank_chunk_makes_no_call() {
        let (llm, extractor) = create_test_extractor(MockProvider::new("[]"));
        let outcome = extractor.extract_text("  \n\n ").await;
        assert!(outcome.facts().is_empty());
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_llm_failure_is_an_outcome() {
        let mut mock = MockProvider::new("[]");
        mock.add_transient_error_containing("flaky");
        let (llm, extractor) = create_test_extractor(mock);

        let outcome = extractor.extract_text("a flaky section").await;
        assert!(matches!(outcome, ExtractionOutcome::LlmFailure { .. }));
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_schema_violation_is_an_outcome() {
        let (_, extractor) = create_test_extractor(MockProvider::new("I could not find any facts."));
        let outcome = extractor.extract_text("Some text").await;
        assert!(matches!(outcome, ExtractionOutcome::SchemaViolation { .. }));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ExtractorConfig {
            chunk_max_chars: 0,
            ..ExtractorConfig::default()
        };
        let result = FactExtractor::new(Arc::new(MockProvider::default()), config);
        assert!(matches!(result, Err(ExtractorError::Config(_))));
    }
}
