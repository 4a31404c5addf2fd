//! LLM prompt and output schema for fact extraction

/// Builds prompts for the LLM to extract facts from one chunk
pub struct PromptBuilder {
    text: String,
    chunk_index: Option<usize>,
}

impl PromptBuilder {
    /// Create a new prompt builder
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            chunk_index: None,
        }
    }

    /// Mention the chunk position in the prompt header
    pub fn with_chunk_index(mut self, index: usize) -> Self {
        self.chunk_index = Some(index);
        self
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(EXTRACTION_INSTRUCTIONS);
        prompt.push_str("\n\n");

        if let Some(index) = self.chunk_index {
            prompt.push_str(&format!("Document section {}:\n", index + 1));
        } else {
            prompt.push_str("Document section:\n");
        }
        prompt.push_str("---\n");
        prompt.push_str(&self.text);
        prompt.push_str("\n---\n\n");

        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        prompt
    }
}

/// JSON schema passed to providers that support constrained output
///
/// Only model-supplied fields appear here. Signatures, normalized values
/// and page numbers are computed after the call.
pub const FACT_SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "facts": {
      "type": "array",
      "items": {
        "type": "object",
        "properties": {
          "name": {"type": "string"},
          "kind": {"type": "string", "enum": ["quantity", "categorical"]},
          "raw_value": {"type": "string"},
          "numeric_value": {"type": "number"},
          "raw_unit": {"type": "string"},
          "aliases": {"type": "array", "items": {"type": "string"}},
          "evidence": {"type": "string"}
        },
        "required": ["name", "kind", "raw_value", "numeric_value", "raw_unit", "aliases", "evidence"]
      }
    }
  },
  "required": ["facts"]
}"#;

const EXTRACTION_INSTRUCTIONS: &str = r#"Extract every quantitative or categorical fact from the following section of an environmental and social impact report.
Each fact should follow this format:

{
  "name": "short label for what is measured or classified",
  "kind": "quantity" or "categorical",
  "raw_value": "value exactly as written",
  "numeric_value": number (0 for categorical facts),
  "raw_unit": "unit exactly as written, or empty",
  "aliases": ["other names the text uses for the same thing"],
  "evidence": "verbatim sentence or phrase from the text"
}

Rules:
- One fact per value; a sentence with two numbers gives two facts
- Use a stable, generic name ("Annual CO2 emissions", not "CO2 emissions mentioned in Table 4")
- Copy raw_value and raw_unit as written; do not convert units
- numeric_value is the plain number without thousands separators
- Classes, ratings and designations ("Category A wetland", "high sensitivity") are categorical
- evidence must be copied from the text word for word
- Skip facts that have no supporting text"#;

const OUTPUT_FORMAT_REMINDER: &str = r#"Output format (JSON only, no additional text):
{
  "facts": [
    {
      "name": "Annual CO2 emissions",
      "kind": "quantity",
      "raw_value": "250,000",
      "numeric_value": 250000,
      "raw_unit": "t/yr",
      "aliases": ["GHG emissions"],
      "evidence": "The plant will emit about 250,000 t/yr of CO2."
    }
  ]
}

Return {"facts": []} if the section contains no facts."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_includes_text() {
        let prompt = PromptBuilder::new("The site covers 120 ha.").build();
        assert!(prompt.contains("The site covers 120 ha."));
    }

    #[test]
    fn test_prompt_includes_instructions() {
        let prompt = PromptBuilder::new("Test text").build();
        assert!(prompt.contains("Extract every quantitative or categorical fact"));
        assert!(prompt.contains("numeric_value"));
        assert!(prompt.contains("evidence"));
    }

    #[test]
    fn test_prompt_chunk_header() {
        let prompt = PromptBuilder::new("Test").with_chunk_index(4).build();
        assert!(prompt.contains("Document section 5:"));
    }

    #[test]
    fn test_schema_is_valid_json_without_derived_fields() {
        let schema: serde_json::Value = serde_json::from_str(FACT_SCHEMA).unwrap();
        let item = &schema["properties"]["facts"]["items"]["properties"];
        assert!(item.get("name").is_some());
        assert!(item.get("signature").is_none());
        assert!(item.get("normalized_value").is_none());
        assert!(item.get("normalized_unit").is_none());
    }
}
