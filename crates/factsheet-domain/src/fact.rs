//! Fact module - one extracted mention of a quantity or categorical value

use crate::signature::slugify;
use crate::units::normalize;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Whether a fact carries a measurable value or a label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactKind {
    /// A numeric value with an optional unit
    Quantity,

    /// A label or class (e.g. "Category A wetland")
    Categorical,
}

impl FactKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            FactKind::Quantity => "quantity",
            FactKind::Categorical => "categorical",
        }
    }

    /// Parse a kind from a string, case-insensitive
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "quantity" | "quantitative" | "numeric" => Some(FactKind::Quantity),
            "categorical" | "category" | "qualitative" => Some(FactKind::Categorical),
            _ => None,
        }
    }
}

/// Page a mention was found on
///
/// Serialized as the page number, or the string `"?"` when no page marker
/// preceded the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Page {
    /// Known page number
    Number(u32),

    /// No page marker seen before the text
    #[default]
    Unknown,
}

impl Page {
    /// Page number, if known
    pub fn number(&self) -> Option<u32> {
        match self {
            Page::Number(n) => Some(*n),
            Page::Unknown => None,
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Page::Number(n) => write!(f, "{}", n),
            Page::Unknown => write!(f, "?"),
        }
    }
}

impl Serialize for Page {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Page::Number(n) => serializer.serialize_u32(*n),
            Page::Unknown => serializer.serialize_str("?"),
        }
    }
}

impl<'de> Deserialize<'de> for Page {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawPage {
            Number(u32),
            Text(String),
        }

        Ok(match RawPage::deserialize(deserializer)? {
            RawPage::Number(n) => Page::Number(n),
            RawPage::Text(s) => s.trim().parse().map(Page::Number).unwrap_or(Page::Unknown),
        })
    }
}

/// Where a mention was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Zero-based index of the chunk the mention was extracted from
    pub chunk_index: usize,

    /// Page the evidence quote appears on
    pub page: Page,
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(chunk_index: usize, page: Page) -> Self {
        Self { chunk_index, page }
    }
}

/// One extracted mention
///
/// The fields supplied by the model are public. `signature`,
/// `normalized_value` and `normalized_unit` are always computed here, both
/// on construction and on deserialization, so they can never be taken from
/// model output or a stale checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FactFields")]
pub struct Fact {
    /// Human-readable label (e.g. "Annual CO2 emissions")
    pub name: String,

    /// Quantity or categorical
    pub kind: FactKind,

    /// Value exactly as written in the source
    pub raw_value: String,

    /// Parsed numeric value; 0.0 for categorical facts
    pub numeric_value: f64,

    /// Unit as written in the source, possibly empty
    pub raw_unit: String,

    /// Alternative names used in the source
    pub aliases: Vec<String>,

    /// Verbatim quote supporting the fact
    pub evidence: String,

    /// Chunk and page of the mention
    pub source_location: SourceLocation,

    signature: String,
    normalized_value: f64,
    normalized_unit: String,
}

/// The model-supplied part of a fact, before derived fields are computed
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FactFields {
    /// Human-readable label
    pub name: String,
    /// Quantity or categorical
    pub kind: Option<FactKind>,
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
    /// Chunk and page
    pub source_location: SourceLocation,
}

impl From<FactFields> for Fact {
    fn from(fields: FactFields) -> Self {
        let kind = fields.kind.unwrap_or(FactKind::Quantity);
        let numeric_value = match kind {
            FactKind::Quantity => fields.numeric_value,
            FactKind::Categorical => 0.0,
        };
        let (normalized_value, normalized_unit) = match kind {
            FactKind::Quantity => normalize(numeric_value, &fields.raw_unit),
            FactKind::Categorical => (0.0, fields.raw_unit.trim().to_string()),
        };

        Self {
            signature: slugify(&fields.name),
            name: fields.name,
            kind,
            raw_value: fields.raw_value,
            numeric_value,
            raw_unit: fields.raw_unit,
            aliases: fields.aliases,
            evidence: fields.evidence,
            source_location: fields.source_location,
            normalized_value,
            normalized_unit,
        }
    }
}

impl Fact {
    /// Create a quantity fact
    ///
    /// # Examples
    ///
    /// ```
    /// use factsheet_domain::{Fact, SourceLocation};
    ///
    /// let fact = Fact::quantity("Project area", "1,250", 1250.0, "acres", "covers 1,250 acres", SourceLocation::default());
    /// assert_eq!(fact.signature(), "project_area");
    /// assert_eq!(fact.normalized_unit(), "ha");
    /// ```
    pub fn quantity(
        name: impl Into<String>,
        raw_value: impl Into<String>,
        numeric_value: f64,
        raw_unit: impl Into<String>,
        evidence: impl Into<String>,
        source_location: SourceLocation,
    ) -> Self {
        FactFields {
            name: name.into(),
            kind: Some(FactKind::Quantity),
            raw_value: raw_value.into(),
            numeric_value,
            raw_unit: raw_unit.into(),
            aliases: Vec::new(),
            evidence: evidence.into(),
            source_location,
        }
        .into()
    }

    /// Create a categorical fact; `numeric_value` is always 0.0
    pub fn categorical(
        name: impl Into<String>,
        raw_value: impl Into<String>,
        evidence: impl Into<String>,
        source_location: SourceLocation,
    ) -> Self {
        FactFields {
            name: name.into(),
            kind: Some(FactKind::Categorical),
            raw_value: raw_value.into(),
            evidence: evidence.into(),
            source_location,
            ..FactFields::default()
        }
        .into()
    }

    /// Replace the aliases
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Clustering key derived from `name`
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Value converted to the canonical unit
    pub fn normalized_value(&self) -> f64 {
        self.normalized_value
    }

    /// Canonical unit, or the raw unit when it is not in the table
    pub fn normalized_unit(&self) -> &str {
        &self.normalized_unit
    }

    /// Whether this mention takes part in numeric conflict detection
    pub fn is_quantity(&self) -> bool {
        self.kind == FactKind::Quantity
    }
}
