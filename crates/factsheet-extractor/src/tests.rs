//! Scenario tests for the FactExtractor

#[cfg(test)]
mod tests {
    use crate::{ExtractionOutcome, ExtractorConfig, FactExtractor};
    use factsheet_domain::{FactKind, Page};
    use factsheet_llm::{CallPolicy, MockProvider};
    use std::sync::Arc;
    use std::time::Duration;

    const DOCUMENT: &str = "<!-- page 1 -->\nThe project covers 1,250 acres of farmland.\n\n\
<!-- page 2 -->\nAnnual CO2 emissions are estimated at 250,000 t/yr.\n\n\
<!-- page 3 -->\nThe wetland on site is classified as Category A.";

    fn fast_config(chunk_max_chars: usize) -> ExtractorConfig {
        ExtractorConfig {
            chunk_max_chars,
            call: CallPolicy {
                timeout_secs: 1,
                max_attempts: 2,
                backoff_base_ms: 1,
            },
            ..ExtractorConfig::default()
        }
    }

    fn scripted_provider() -> MockProvider {
        let mut llm = MockProvider::new("[]");
        llm.add_response_containing(
            "farmland",
            r#"{"facts": [{"name": "Project area", "kind": "quantity", "raw_value": "1,250",
                "numeric_value": 1250, "raw_unit": "acres", "aliases": ["site area"],
                "evidence": "The project covers 1,250 acres of farmland.",
                "signature": "forged", "normalized_value": 1, "normalized_unit": "forged"}]}"#,
        );
        llm.add_response_containing(
            "estimated at",
            "```json\n[{\"name\": \"Annual CO₂ emissions\", \"kind\": \"quantity\", \"raw_value\": \"250,000\", \
\"numeric_value\": \"250,000\", \"raw_unit\": \"t/yr\", \
\"evidence\": \"Annual CO2 emissions are estimated at 250,000 t/yr.\"}]\n```",
        );
        llm.add_response_containing(
            "classified as",
            "Here is what I found: [{\"name\": \"Wetland classification\", \"kind\": \"categorical\", \
\"raw_value\": \"Category A\", \"evidence\": \"classified as Category A\"}] Hope this helps!",
        );
        llm
    }

    #[tokio::test]
    async fn test_full_extraction_flow() {
        let llm = Arc::new(scripted_provider());
        let extractor = FactExtractor::new(Arc::clone(&llm), fast_config(80)).unwrap();

        let chunks = extractor.chunk(DOCUMENT);
        assert_eq!(chunks.len(), 3);

        let mut facts = Vec::new();
        for chunk in &chunks {
            let outcome = extractor.extract(chunk).await;
            assert!(!outcome.is_skipped(), "chunk {} skipped: {:?}", chunk.index, outcome.reason());
            facts.extend(outcome.into_facts());
        }

        assert_eq!(facts.len(), 3);
        assert_eq!(llm.call_count(), 3);

        let area = &facts[0];
        assert_eq!(area.signature(), "project_area");
        assert_eq!(area.normalized_unit(), "ha");
        assert!((area.normalized_value() - 505.8570528).abs() < 1e-6);
        assert_eq!(area.source_location.chunk_index, 0);
        assert_eq!(area.source_location.page, Page::Number(1));

        let co2 = &facts[1];
        assert_eq!(co2.signature(), "annual_co2_emissions");
        assert_eq!(co2.numeric_value, 250_000.0);
        assert_eq!(co2.normalized_unit(), "kg/yr");
        assert_eq!(co2.normalized_value(), 250_000_000.0);
        assert_eq!(co2.source_location.page, Page::Number(2));

        let wetland = &facts[2];
        assert_eq!(wetland.kind, FactKind::Categorical);
        assert_eq!(wetland.numeric_value, 0.0);
        assert_eq!(wetland.source_location.page, Page::Number(3));
    }

    #[tokio::test]
    async fn test_evidence_page_inside_multi_page_chunk() {
        let llm = Arc::new(scripted_provider());
        let extractor = FactExtractor::new(llm, fast_config(4000)).unwrap();

        let chunks = extractor.chunk(DOCUMENT);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].page, Page::Number(1));

        // The first matching rule wins, so the whole-document chunk gets the area fact
        let outcome = extractor.extract(&chunks[0]).await;
        assert_eq!(outcome.facts().len(), 1);
        assert_eq!(outcome.facts()[0].source_location.page, Page::Number(1));
    }

    #[tokio::test]
    async fn test_evidence_not_found_uses_chunk_page() {
        let llm = MockProvider::new(
            r#"[{"name": "Noise limit", "numeric_value": 55, "raw_unit": "dB(A)", "evidence": "paraphrased"}]"#,
        );
        let extractor = FactExtractor::new(Arc::new(llm), fast_config(4000)).unwrap();

        let outcome = extractor.extract_text("[page 9]\nNight-time noise is limited to 55 dB(A).").await;
        let fact = &outcome.facts()[0];
        assert_eq!(fact.source_location.page, Page::Number(9));
        // Unknown units pass through
        assert_eq!(fact.normalized_unit(), "dB(A)");
        assert_eq!(fact.normalized_value(), 55.0);
    }

    #[tokio::test]
    async fn test_malformed_chunk_does_not_stop_later_chunks() {
        let mut llm = scripted_provider();
        llm.add_response_containing("malformed", "{\"facts\": [{\"name\": \"broken\"");
        let llm = Arc::new(llm);
        let extractor = FactExtractor::new(Arc::clone(&llm), fast_config(80)).unwrap();

        let document = format!("A malformed section.\n\n{}", DOCUMENT);
        let chunks = extractor.chunk(&document);
        let mut outcomes = Vec::new();
        for chunk in &chunks {
            outcomes.push(extractor.extract(chunk).await);
        }

        assert!(matches!(outcomes[0], ExtractionOutcome::SchemaViolation { .. }));
        let total: usize = outcomes.iter().map(|o| o.facts().len()).sum();
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn test_timeout_yields_llm_failure() {
        let llm = MockProvider::new("[]").with_delay(Duration::from_millis(1300));
        let config = ExtractorConfig {
            call: CallPolicy {
                timeout_secs: 1,
                max_attempts: 1,
                backoff_base_ms: 1,
            },
            ..ExtractorConfig::default()
        };
        let extractor = FactExtractor::new(Arc::new(llm), config).unwrap();

        let outcome = extractor.extract_text("Some text").await;
        assert!(matches!(outcome, ExtractionOutcome::LlmFailure { .. }));
        assert!(outcome.facts().is_empty());
    }
}
