//! Core Categorizer implementation

use crate::cache::{CacheKey, CacheStats, CategorizationCache};
use crate::config::CategorizerConfig;
use crate::error::CategorizerError;
use crate::prompt::{build_prompt, categorization_schema};
use factsheet_domain::traits::LlmProvider;
use factsheet_domain::Categorization;
use factsheet_llm::{invoke_structured, LlmError};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Assigns facts to the fixed taxonomy, one LLM call per distinct (name, unit)
pub struct Categorizer<L> {
    llm: Arc<L>,
    cache: Arc<CategorizationCache>,
    config: CategorizerConfig,
    schema: String,
}

impl<L> Categorizer<L>
where
    L: LlmProvider<Error = LlmError> + Send + Sync + 'static,
{
    /// Create a categorizer with its own empty cache
    pub fn new(llm: Arc<L>, config: CategorizerConfig) -> Self {
        Self::with_cache(llm, Arc::new(CategorizationCache::new()), config)
    }

    /// Create a categorizer using a shared cache
    pub fn with_cache(llm: Arc<L>, cache: Arc<CategorizationCache>, config: CategorizerConfig) -> Self {
        Self {
            llm,
            cache,
            config,
            schema: categorization_schema(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &CategorizerConfig {
        &self.config
    }

    /// The cache this categorizer reads and fills
    pub fn cache(&self) -> &Arc<CategorizationCache> {
        &self.cache
    }

    /// Cache statistics
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Categorize a fact
    ///
    /// A cached result for the same (name, unit) is returned without an LLM
    /// call, even when `raw_value` differs. Failures are not cached.
    pub async fn categorize(
        &self,
        name: &str,
        raw_value: &str,
        raw_unit: &str,
    ) -> Result<Categorization, CategorizerError> {
        let key = CacheKey::new(name, raw_unit);
        if let Some(cached) = self.cache.lookup(&key) {
            debug!(name = key.name(), unit = key.unit(), "Categorization cache hit");
            return Ok(cached);
        }

        let prompt = build_prompt(name, raw_value, raw_unit);
        let response = invoke_structured(&self.llm, &prompt, &self.schema, &self.config.call).await?;
        let categorization = parse_categorization(&response, self.config.max_rationale_chars)?;

        debug!(
            name = key.name(),
            category = %categorization.category,
            subcategory = %categorization.subcategory,
            "Categorized"
        );
        self.cache.insert(key, categorization.clone());
        Ok(categorization)
    }

    /// Categorize, logging failures instead of returning them
    pub async fn try_categorize(
        &self,
        signature: &str,
        name: &str,
        raw_value: &str,
        raw_unit: &str,
    ) -> Option<Categorization> {
        match self.categorize(name, raw_value, raw_unit).await {
            Ok(categorization) => Some(categorization),
            Err(e) => {
                warn!(signature, error = %e, "Categorization failed");
                None
            }
        }
    }
}

/// Read a categorization object from model output
pub fn parse_categorization(response: &str, max_rationale_chars: usize) -> Result<Categorization, CategorizerError> {
    let value = read_object(response)?;
    let Value::Object(obj) = value else {
        return Err(CategorizerError::InvalidResponse(
            "Expected a JSON object".to_string(),
        ));
    };

    let rationale: String = obj
        .get("rationale")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .chars()
        .take(max_rationale_chars)
        .collect();

    Ok(Categorization::from_labels(
        label(&obj, "category")?,
        label(&obj, "subcategory")?,
        label(&obj, "confidence")?,
        rationale,
    )?)
}

fn label<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a str, CategorizerError> {
    obj.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| CategorizerError::InvalidResponse(format!("Missing or invalid '{}'", key)))
}

/// Parse the response as JSON, falling back to the outermost `{...}`
fn read_object(response: &str) -> Result<Value, CategorizerError> {
    let trimmed = response.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => serde_json::from_str(&trimmed[start..=end])
            .map_err(|e| CategorizerError::InvalidResponse(format!("JSON parse error: {}", e))),
        _ => Err(CategorizerError::InvalidResponse(
            "No JSON object in response".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factsheet_domain::{Category, Confidence, Subcategory};
    use factsheet_llm::{CallPolicy, MockProvider};

    const GHG: &str = r#"{"category": "air_climate", "subcategory": "ghg_emissions", "confidence": "high", "rationale": "Greenhouse gas emissions."}"#;

    fn fast_config() -> CategorizerConfig {
        CategorizerConfig {
            call: CallPolicy {
                timeout_secs: 5,
                max_attempts: 2,
                backoff_base_ms: 1,
            },
            ..CategorizerConfig::default()
        }
    }

    fn categorizer(llm: MockProvider) -> (Arc<MockProvider>, Categorizer<MockProvider>) {
        let llm = Arc::new(llm);
        (Arc::clone(&llm), Categorizer::new(llm, fast_config()))
    }

    #[tokio::test]
    async fn test_cache_idempotence() {
        let (llm, categorizer) = categorizer(MockProvider::new(GHG));

        let first = categorizer
            .categorize("Annual CO2 emissions", "250000", "t/yr")
            .await
            .unwrap();
        let second = categorizer
            .categorize("Annual CO2 emissions", "300000", "t/yr")
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.category, Category::AirClimate);
        assert_eq!(first.subcategory, Subcategory::GhgEmissions);
        assert_eq!(first.confidence, Confidence::High);
        assert_eq!(llm.call_count(), 1);

        let stats = categorizer.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.cache_size, 1);
    }

    #[tokio::test]
    async fn test_key_ignores_case_and_whitespace() {
        let (llm, categorizer) = categorizer(MockProvider::new(GHG));
        categorizer.categorize("Annual CO2 emissions", "1", "t/yr").await.unwrap();
        categorizer.categorize(" annual co2 EMISSIONS", "2", "T/yr ").await.unwrap();
        assert_eq!(llm.call_count(), 1);

        categorizer.categorize("Annual CO2 emissions", "1", "kg/yr").await.unwrap();
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_subcategory_outside_category_fails() {
        let (_, categorizer) = categorizer(MockProvider::new(
            r#"{"category": "water", "subcategory": "ghg_emissions", "confidence": "high", "rationale": ""}"#,
        ));
        let result = categorizer.categorize("Annual CO2 emissions", "1", "t/yr").await;
        assert!(matches!(result, Err(CategorizerError::Taxonomy(_))));
        // Failures are not cached
        assert_eq!(categorizer.stats().cache_size, 0);
    }

    #[tokio::test]
    async fn test_llm_failure() {
        let mut mock = MockProvider::new(GHG);
        mock.add_error_containing("Broken fact");
        let (_, categorizer) = categorizer(mock);

        let result = categorizer.categorize("Broken fact", "1", "").await;
        assert!(matches!(result, Err(CategorizerError::Llm(_))));
        assert!(categorizer.try_categorize("broken_fact", "Broken fact", "1", "").await.is_none());
    }

    #[tokio::test]
    async fn test_shared_cache() {
        let llm = Arc::new(MockProvider::new(GHG));
        let cache = Arc::new(CategorizationCache::new());
        let a = Categorizer::with_cache(Arc::clone(&llm), Arc::clone(&cache), fast_config());
        let b = Categorizer::with_cache(Arc::clone(&llm), Arc::clone(&cache), fast_config());

        a.categorize("Methane emissions", "5", "t").await.unwrap();
        b.categorize("Methane emissions", "6", "t").await.unwrap();
        assert_eq!(llm.call_count(), 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_parse_tolerates_formatting() {
        let response = "```json\n{\"category\": \"Air & Climate\", \"subcategory\": \"GHG Emissions\", \"confidence\": \"Medium\"}\n```";
        let categorization = parse_categorization(response, 100).unwrap();
        assert_eq!(categorization.category, Category::AirClimate);
        assert_eq!(categorization.confidence, Confidence::Medium);
        assert_eq!(categorization.rationale, "");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_categorization("no idea", 100),
            Err(CategorizerError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_categorization(r#"{"category": "water"}"#, 100),
            Err(CategorizerError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_categorization(r#"{"category": "weather", "subcategory": "x", "confidence": "high"}"#, 100),
            Err(CategorizerError::Taxonomy(_))
        ));
    }

    #[test]
    fn test_rationale_truncated() {
        let response = r#"{"category": "water", "subcategory": "hydrology", "confidence": "low", "rationale": "abcdefgh"}"#;
        assert_eq!(parse_categorization(response, 3).unwrap().rationale, "abc");
    }
}
