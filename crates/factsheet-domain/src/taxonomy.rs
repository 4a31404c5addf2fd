//! Fixed classification taxonomy for consolidated facts
//!
//! Eight categories, each owning exactly four subcategories, plus a
//! three-level self-reported confidence.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised when model output does not fit the taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaxonomyError {
    /// Category name not in the taxonomy
    #[error("unknown category '{0}'")]
    UnknownCategory(String),

    /// Subcategory name not in the taxonomy
    #[error("unknown subcategory '{0}'")]
    UnknownSubcategory(String),

    /// Confidence not one of high/medium/low
    #[error("unknown confidence '{0}'")]
    UnknownConfidence(String),

    /// Subcategory exists but belongs to another category
    #[error("subcategory '{subcategory}' belongs to '{}', not '{category}'", .subcategory.category())]
    SubcategoryMismatch {
        /// Category stated by the model
        category: Category,
        /// Subcategory stated by the model
        subcategory: Subcategory,
    },
}

/// Normalize a taxonomy label from model output (`"Air & Climate"` -> `air_climate`)
fn label_key(s: &str) -> String {
    crate::slugify(&s.replace('&', " "))
}

/// Top-level category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Emissions to air, noise and climate
    AirClimate,
    /// Surface and ground water
    Water,
    /// Land take, habitats and species
    LandBiodiversity,
    /// Energy and material consumption
    EnergyResources,
    /// Waste streams and hazardous substances
    WasteHazards,
    /// Affected communities and workforce
    SocialCommunity,
    /// Costs, revenues and local economy
    Economic,
    /// Physical description of the project itself
    ProjectDescription,
}

impl Category {
    /// All categories in display order
    pub const ALL: [Category; 8] = [
        Category::AirClimate,
        Category::Water,
        Category::LandBiodiversity,
        Category::EnergyResources,
        Category::WasteHazards,
        Category::SocialCommunity,
        Category::Economic,
        Category::ProjectDescription,
    ];

    /// Get the category name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::AirClimate => "air_climate",
            Category::Water => "water",
            Category::LandBiodiversity => "land_biodiversity",
            Category::EnergyResources => "energy_resources",
            Category::WasteHazards => "waste_hazards",
            Category::SocialCommunity => "social_community",
            Category::Economic => "economic",
            Category::ProjectDescription => "project_description",
        }
    }

    /// Parse a category, tolerating case, spaces and `&`
    pub fn parse(s: &str) -> Result<Self, TaxonomyError> {
        let key = label_key(s);
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == key)
            .ok_or_else(|| TaxonomyError::UnknownCategory(s.to_string()))
    }

    /// The four subcategories of this category
    pub fn subcategories(&self) -> impl Iterator<Item = Subcategory> + '_ {
        Subcategory::ALL.into_iter().filter(move |s| s.category() == *self)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Second-level classification, each owned by one category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum Subcategory {
    // AirClimate
    GhgEmissions,
    AirPollutants,
    NoiseVibration,
    ClimateResilience,
    // Water
    WaterWithdrawal,
    WastewaterDischarge,
    WaterQuality,
    Hydrology,
    // LandBiodiversity
    LandUse,
    HabitatLoss,
    ProtectedSpecies,
    Rehabilitation,
    // EnergyResources
    EnergyConsumption,
    RenewableEnergy,
    Materials,
    Fuel,
    // WasteHazards
    SolidWaste,
    HazardousMaterials,
    Tailings,
    SpillsIncidents,
    // SocialCommunity
    AffectedPopulation,
    Resettlement,
    Employment,
    CommunityHealth,
    // Economic
    CapitalCost,
    OperatingCost,
    RevenueTaxes,
    LocalProcurement,
    // ProjectDescription
    Footprint,
    Capacity,
    Schedule,
    Infrastructure,
}

impl Subcategory {
    /// All subcategories grouped by category
    pub const ALL: [Subcategory; 32] = [
        Subcategory::GhgEmissions,
        Subcategory::AirPollutants,
        Subcategory::NoiseVibration,
        Subcategory::ClimateResilience,
        Subcategory::WaterWithdrawal,
        Subcategory::WastewaterDischarge,
        Subcategory::WaterQuality,
        Subcategory::Hydrology,
        Subcategory::LandUse,
        Subcategory::HabitatLoss,
        Subcategory::ProtectedSpecies,
        Subcategory::Rehabilitation,
        Subcategory::EnergyConsumption,
        Subcategory::RenewableEnergy,
        Subcategory::Materials,
        Subcategory::Fuel,
        Subcategory::SolidWaste,
        Subcategory::HazardousMaterials,
        Subcategory::Tailings,
        Subcategory::SpillsIncidents,
        Subcategory::AffectedPopulation,
        Subcategory::Resettlement,
        Subcategory::Employment,
        Subcategory::CommunityHealth,
        Subcategory::CapitalCost,
        Subcategory::OperatingCost,
        Subcategory::RevenueTaxes,
        Subcategory::LocalProcurement,
        Subcategory::Footprint,
        Subcategory::Capacity,
        Subcategory::Schedule,
        Subcategory::Infrastructure,
    ];

    /// Get the subcategory name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Subcategory::GhgEmissions => "ghg_emissions",
            Subcategory::AirPollutants => "air_pollutants",
            Subcategory::NoiseVibration => "noise_vibration",
            Subcategory::ClimateResilience => "climate_resilience",
            Subcategory::WaterWithdrawal => "water_withdrawal",
            Subcategory::WastewaterDischarge => "wastewater_discharge",
            Subcategory::WaterQuality => "water_quality",
            Subcategory::Hydrology => "hydrology",
            Subcategory::LandUse => "land_use",
            Subcategory::HabitatLoss => "habitat_loss",
            Subcategory::ProtectedSpecies => "protected_species",
            Subcategory::Rehabilitation => "rehabilitation",
            Subcategory::EnergyConsumption => "energy_consumption",
            Subcategory::RenewableEnergy => "renewable_energy",
            Subcategory::Materials => "materials",
            Subcategory::Fuel => "fuel",
            Subcategory::SolidWaste => "solid_waste",
            Subcategory::HazardousMaterials => "hazardous_materials",
            Subcategory::Tailings => "tailings",
            Subcategory::SpillsIncidents => "spills_incidents",
            Subcategory::AffectedPopulation => "affected_population",
            Subcategory::Resettlement => "resettlement",
            Subcategory::Employment => "employment",
            Subcategory::CommunityHealth => "community_health",
            Subcategory::CapitalCost => "capital_cost",
            Subcategory::OperatingCost => "operating_cost",
            Subcategory::RevenueTaxes => "revenue_taxes",
            Subcategory::LocalProcurement => "local_procurement",
            Subcategory::Footprint => "footprint",
            Subcategory::Capacity => "capacity",
            Subcategory::Schedule => "schedule",
            Subcategory::Infrastructure => "infrastructure",
        }
    }

    /// The category owning this subcategory
    pub fn category(&self) -> Category {
        use Subcategory::*;
        match self {
            GhgEmissions | AirPollutants | NoiseVibration | ClimateResilience => Category::AirClimate,
            WaterWithdrawal | WastewaterDischarge | WaterQuality | Hydrology => Category::Water,
            LandUse | HabitatLoss | ProtectedSpecies | Rehabilitation => Category::LandBiodiversity,
            EnergyConsumption | RenewableEnergy | Materials | Fuel => Category::EnergyResources,
            SolidWaste | HazardousMaterials | Tailings | SpillsIncidents => Category::WasteHazards,
            AffectedPopulation | Resettlement | Employment | CommunityHealth => {
                Category::SocialCommunity
            }
            CapitalCost | OperatingCost | RevenueTaxes | LocalProcurement => Category::Economic,
            Footprint | Capacity | Schedule | Infrastructure => Category::ProjectDescription,
        }
    }

    /// Parse a subcategory, tolerating case, spaces and `&`
    pub fn parse(s: &str) -> Result<Self, TaxonomyError> {
        let key = label_key(s);
        Subcategory::ALL
            .into_iter()
            .find(|c| c.as_str() == key)
            .ok_or_else(|| TaxonomyError::UnknownSubcategory(s.to_string()))
    }
}

impl fmt::Display for Subcategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Self-reported certainty of a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Unambiguous fit
    High,
    /// Plausible fit
    Medium,
    /// Best guess
    Low,
}

impl Confidence {
    /// Get the confidence as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }

    /// Parse a confidence level, case-insensitive
    pub fn parse(s: &str) -> Result<Self, TaxonomyError> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Confidence::High),
            "medium" | "moderate" => Ok(Confidence::Medium),
            "low" => Ok(Confidence::Low),
            _ => Err(TaxonomyError::UnknownConfidence(s.to_string())),
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of one fact signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Categorization {
    /// Top-level category
    pub category: Category,
    /// Subcategory, always owned by `category`
    pub subcategory: Subcategory,
    /// Self-reported certainty
    pub confidence: Confidence,
    /// Short justification from the classifier
    pub rationale: String,
}

impl Categorization {
    /// Build a categorization from model-supplied labels
    ///
    /// Fails if any label is outside the taxonomy or the subcategory belongs
    /// to a different category than the one stated.
    pub fn from_labels(
        category: &str,
        subcategory: &str,
        confidence: &str,
        rationale: impl Into<String>,
    ) -> Result<Self, TaxonomyError> {
        let category = Category::parse(category)?;
        let subcategory = Subcategory::parse(subcategory)?;
        if subcategory.category() != category {
            return Err(TaxonomyError::SubcategoryMismatch { category, subcategory });
        }
        Ok(Self {
            category,
            subcategory,
            confidence: Confidence::parse(confidence)?,
            rationale: rationale.into(),
        })
    }
}
