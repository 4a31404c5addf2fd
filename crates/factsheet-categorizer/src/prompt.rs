//! Categorization prompt and taxonomy-constrained output schema

use factsheet_domain::{Category, Subcategory};
use serde_json::json;

/// Build the categorization prompt for one fact
pub fn build_prompt(name: &str, raw_value: &str, raw_unit: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str(INSTRUCTIONS);
    prompt.push_str("\n\nTaxonomy (category: subcategories):\n");
    prompt.push_str(&taxonomy_listing());
    prompt.push('\n');

    prompt.push_str("Fact:\n");
    prompt.push_str(&format!("- name: {}\n", name.trim()));
    if !raw_value.trim().is_empty() {
        prompt.push_str(&format!("- example value: {}\n", raw_value.trim()));
    }
    if !raw_unit.trim().is_empty() {
        prompt.push_str(&format!("- unit: {}\n", raw_unit.trim()));
    }
    prompt.push('\n');

    prompt.push_str(OUTPUT_FORMAT_REMINDER);
    prompt
}

/// One line per category listing its subcategories
pub fn taxonomy_listing() -> String {
    Category::ALL
        .iter()
        .map(|category| {
            let subs: Vec<&str> = category.subcategories().map(|s| s.as_str()).collect();
            format!("- {}: {}\n", category.as_str(), subs.join(", "))
        })
        .collect()
}

/// JSON schema restricting labels to the taxonomy
pub fn categorization_schema() -> String {
    let categories: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
    let subcategories: Vec<&str> = Subcategory::ALL.iter().map(|s| s.as_str()).collect();
    json!({
        "type": "object",
        "properties": {
            "category": {"type": "string", "enum": categories},
            "subcategory": {"type": "string", "enum": subcategories},
            "confidence": {"type": "string", "enum": ["high", "medium", "low"]},
            "rationale": {"type": "string"}
        },
        "required": ["category", "subcategory", "confidence", "rationale"]
    })
    .to_string()
}

const INSTRUCTIONS: &str = r#"Classify the following fact from an environmental and social impact report into exactly one category and one subcategory of the taxonomy below.

Rules:
- The subcategory must be one listed under the chosen category
- confidence is "high" when the fit is unambiguous, "medium" when plausible, "low" when guessing
- rationale is one short sentence"#;

const OUTPUT_FORMAT_REMINDER: &str = r#"Output format (JSON object only, no additional text):
{"category": "air_climate", "subcategory": "ghg_emissions", "confidence": "high", "rationale": "Direct greenhouse gas emissions."}"#;
