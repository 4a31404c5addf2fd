//! Conflict detection over the occurrences of one cluster
//!
//! Quantity occurrences are compared only within the same normalized unit;
//! values in different canonical units describe different quantities and
//! are never compared. Rules, in reporting order per unit group:
//!
//! 1. sign disagreement (negative and positive values); when it fires the
//!    group is not compared further
//! 2. relative spread `(hi - lo) / lo >= tolerance`, skipped when `lo == 0`
//! 3. decimal shift: some pair of non-zero values with a ratio near 10
//!
//! Rules 2 and 3 are independent and are both reported when both fire.
//! Categorical occurrences are compared by their case-folded `raw_value`.

use crate::config::ConflictConfig;
use factsheet_domain::Fact;
use std::fmt;

/// Slack on the tolerance comparison so that a spread equal to the
/// tolerance is not lost to floating-point rounding
const TOLERANCE_SLACK: f64 = 1e-9;

/// One triggered conflict rule
#[derive(Debug, Clone, PartialEq)]
pub enum ConflictFinding {
    /// Negative and positive values for the same fact
    SignMismatch {
        /// Smallest value
        lo: f64,
        /// Largest value
        hi: f64,
        /// Normalized unit of the group
        unit: String,
    },

    /// Values spread beyond the tolerance
    RelativeSpread {
        /// (hi - lo) / lo
        spread: f64,
        /// Smallest magnitude
        lo: f64,
        /// Largest magnitude
        hi: f64,
        /// Normalized unit of the group
        unit: String,
    },

    /// Two values differ by a factor of about ten
    DecimalShift {
        /// Smaller value of the pair
        lo: f64,
        /// Larger value of the pair
        hi: f64,
        /// Normalized unit of the group
        unit: String,
    },

    /// Categorical values disagree
    CategoricalMismatch {
        /// Distinct values, first spelling seen, in occurrence order
        variants: Vec<String>,
    },
}

impl fmt::Display for ConflictFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictFinding::SignMismatch { lo, hi, unit } => {
                write!(f, "sign disagreement ({} vs {}{})", lo, hi, unit_suffix(unit))
            }
            ConflictFinding::RelativeSpread { spread, lo, hi, unit } => write!(
                f,
                "values differ by {:.1}% ({} to {}{})",
                spread * 100.0,
                lo,
                hi,
                unit_suffix(unit)
            ),
            ConflictFinding::DecimalShift { lo, hi, unit } => write!(
                f,
                "probable decimal-shift error ({} vs {}{}, ratio {:.2})",
                lo,
                hi,
                unit_suffix(unit),
                hi / lo
            ),
            ConflictFinding::CategoricalMismatch { variants } => {
                write!(f, "categorical values disagree: {}", variants.join(" / "))
            }
        }
    }
}

fn unit_suffix(unit: &str) -> String {
    if unit.is_empty() {
        String::new()
    } else {
        format!(" {}", unit)
    }
}

/// All findings for one cluster
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConflictReport {
    /// Triggered rules in reporting order
    pub findings: Vec<ConflictFinding>,
}

impl ConflictReport {
    /// Whether any rule fired
    pub fn has_conflict(&self) -> bool {
        !self.findings.is_empty()
    }

    /// Triggered rule explanations joined with "; ", empty without conflict
    pub fn description(&self) -> String {
        self.findings
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Runs the conflict rules
#[derive(Debug, Clone, Default)]
pub struct ConflictDetector {
    config: ConflictConfig,
}

impl ConflictDetector {
    /// Create a new detector
    pub fn new(config: ConflictConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &ConflictConfig {
        &self.config
    }

    /// `(has_conflict, description)` for a cluster's occurrences
    pub fn conflicts(&self, occurrences: &[Fact]) -> (bool, String) {
        let report = self.detect(occurrences);
        (report.has_conflict(), report.description())
    }

    /// Evaluate every rule over the occurrences
    pub fn detect(&self, occurrences: &[Fact]) -> ConflictReport {
        let mut findings = Vec::new();

        for (unit, values) in unit_groups(occurrences) {
            self.check_values(unit, &values, &mut findings);
        }

        if self.config.check_categorical {
            let variants = categorical_variants(occurrences);
            if variants.len() > 1 {
                findings.push(ConflictFinding::CategoricalMismatch { variants });
            }
        }

        ConflictReport { findings }
    }

    fn check_values(&self, unit: &str, values: &[f64], findings: &mut Vec<ConflictFinding>) {
        if values.len() < 2 {
            return;
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if min < 0.0 && max > 0.0 && self.config.check_sign {
            findings.push(ConflictFinding::SignMismatch {
                lo: min,
                hi: max,
                unit: unit.to_string(),
            });
            // Ratios across a sign change carry no meaning
            return;
        }

        // Signs agree, or sign is not checked; compare magnitudes
        let mut magnitudes: Vec<f64> = values.iter().map(|v| v.abs()).collect();
        magnitudes.sort_by(f64::total_cmp);
        magnitudes.dedup();

        let lo = magnitudes[0];
        let hi = magnitudes[magnitudes.len() - 1];

        if lo > 0.0 {
            let spread = (hi - lo) / lo;
            if spread >= self.config.tolerance - TOLERANCE_SLACK && hi > lo {
                findings.push(ConflictFinding::RelativeSpread {
                    spread,
                    lo,
                    hi,
                    unit: unit.to_string(),
                });
            }
        }

        if let Some((a, b)) = self.decimal_shift_pair(&magnitudes) {
            findings.push(ConflictFinding::DecimalShift {
                lo: a,
                hi: b,
                unit: unit.to_string(),
            });
        }
    }

    /// First pair (in ascending order) whose ratio is within epsilon of 10
    ///
    /// `sorted` must be ascending and deduplicated.
    fn decimal_shift_pair(&self, sorted: &[f64]) -> Option<(f64, f64)> {
        let eps = self.config.magnitude_epsilon;
        let nonzero_start = sorted.partition_point(|v| *v <= 0.0);
        let nonzero = &sorted[nonzero_start..];

        nonzero.iter().find_map(|&a| {
            let low = a * 10.0 * (1.0 - eps);
            let high = a * 10.0 * (1.0 + eps);
            let idx = nonzero.partition_point(|v| *v < low);
            nonzero
                .get(idx)
                .filter(|&&b| b <= high)
                .map(|&b| (a, b))
        })
    }
}

/// Quantity values grouped by normalized unit, groups in first-seen order
fn unit_groups(occurrences: &[Fact]) -> Vec<(&str, Vec<f64>)> {
    let mut groups: Vec<(&str, Vec<f64>)> = Vec::new();
    for fact in occurrences.iter().filter(|f| f.is_quantity()) {
        let value = fact.normalized_value();
        if !value.is_finite() {
            continue;
        }
        let unit = fact.normalized_unit();
        match groups.iter_mut().find(|(u, _)| *u == unit) {
            Some((_, values)) => values.push(value),
            None => groups.push((unit, vec![value])),
        }
    }
    groups
}

/// Distinct categorical values by case-folded comparison, first spelling kept
fn categorical_variants(occurrences: &[Fact]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut variants = Vec::new();
    for fact in occurrences.iter().filter(|f| !f.is_quantity()) {
        let value = fact.raw_value.trim();
        if value.is_empty() {
            continue;
        }
        let key = value.to_lowercase();
        if !seen.contains(&key) {
            seen.push(key);
            variants.push(value.to_string());
        }
    }
    variants
}

#[cfg(test)]
mod tests {
    use super::*;
    use factsheet_domain::SourceLocation;
    use proptest::prelude::*;

    fn quantities(values: &[f64], unit: &str) -> Vec<Fact> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                Fact::quantity("Annual water use", v.to_string(), *v, unit, "", SourceLocation::new(i, Default::default()))
            })
            .collect()
    }

    fn detector() -> ConflictDetector {
        ConflictDetector::default()
    }

    #[test]
    fn test_two_percent_spread_conflicts() {
        let (conflict, description) = detector().conflicts(&quantities(&[100.0, 102.0], "m3"));
        assert!(conflict);
        assert!(description.contains("2.0%"), "{}", description);
    }

    #[test]
    fn test_one_percent_spread_is_fine() {
        let (conflict, description) = detector().conflicts(&quantities(&[100.0, 101.0], "m3"));
        assert!(!conflict);
        assert!(description.is_empty());
    }

    #[test]
    fn test_order_of_magnitude_rule() {
        let report = detector().detect(&quantities(&[100.0, 1000.0], "m3"));
        assert!(report.has_conflict());
        assert!(report
            .findings
            .iter()
            .any(|f| matches!(f, ConflictFinding::DecimalShift { .. })));
        // The spread rule fires too and both are reported
        assert_eq!(report.findings.len(), 2);
        assert!(report.description().contains("decimal-shift"));
        assert!(report.description().contains("; "));
    }

    #[test]
    fn test_decimal_shift_within_epsilon() {
        let report = detector().detect(&quantities(&[4.2, 41.0], "m3"));
        assert!(report
            .findings
            .iter()
            .any(|f| matches!(f, ConflictFinding::DecimalShift { .. })));

        let report = detector().detect(&quantities(&[4.0, 60.0], "m3"));
        assert!(!report
            .findings
            .iter()
            .any(|f| matches!(f, ConflictFinding::DecimalShift { .. })));
    }

    #[test]
    fn test_zero_skips_relative_rule() {
        let report = detector().detect(&quantities(&[0.0, 5.0], "m3"));
        assert!(!report.has_conflict());

        // Decimal shift still checked among non-zero values
        let report = detector().detect(&quantities(&[0.0, 5.0, 50.0], "m3"));
        assert_eq!(report.findings.len(), 1);
        assert!(matches!(report.findings[0], ConflictFinding::DecimalShift { .. }));
    }

    #[test]
    fn test_units_are_not_mixed() {
        let mut facts = quantities(&[100.0], "m3");
        facts.extend(quantities(&[100.0], "mg/L"));
        assert!(!detector().detect(&facts).has_conflict());
    }

    #[test]
    fn test_converted_units_are_compared() {
        // 1 t and 1000 kg normalize to the same value
        let mut facts = quantities(&[1.0], "t");
        facts.extend(quantities(&[1000.0], "kg"));
        assert!(!detector().detect(&facts).has_conflict());
    }

    #[test]
    fn test_sign_mismatch() {
        let report = detector().detect(&quantities(&[-5.0, 5.0], "°C"));
        assert_eq!(report.findings.len(), 1);
        assert!(report.description().starts_with("sign disagreement"));

        let lenient = ConflictDetector::new(ConflictConfig::numeric_only());
        assert!(!lenient.detect(&quantities(&[-5.0, 5.0], "°C")).has_conflict());
    }

    #[test]
    fn test_mixed_signs_without_sign_rule_still_compare_magnitudes() {
        let lenient = ConflictDetector::new(ConflictConfig::numeric_only());
        let report = lenient.detect(&quantities(&[-5.0, 100.0, 10.0], "m3"));

        assert!(report.has_conflict());
        assert!(report
            .findings
            .iter()
            .any(|f| matches!(f, ConflictFinding::RelativeSpread { .. })));
        assert!(report
            .findings
            .iter()
            .any(|f| matches!(f, ConflictFinding::DecimalShift { lo, hi, .. } if *lo == 10.0 && *hi == 100.0)));
        assert!(!report
            .findings
            .iter()
            .any(|f| matches!(f, ConflictFinding::SignMismatch { .. })));
    }

    #[test]
    fn test_negative_values_compare_magnitudes() {
        assert!(!detector().detect(&quantities(&[-100.0, -101.0], "°C")).has_conflict());
        assert!(detector().detect(&quantities(&[-100.0, -110.0], "°C")).has_conflict());
    }

    #[test]
    fn test_categorical_variants() {
        let loc = SourceLocation::default();
        let facts = vec![
            Fact::categorical("Wetland class", "Category A", "", loc),
            Fact::categorical("Wetland class", " category a ", "", loc),
        ];
        assert!(!detector().detect(&facts).has_conflict());

        let mut facts = facts;
        facts.push(Fact::categorical("Wetland class", "Category B", "", loc));
        let (conflict, description) = detector().conflicts(&facts);
        assert!(conflict);
        assert_eq!(description, "categorical values disagree: Category A / Category B");
    }

    #[test]
    fn test_single_and_identical_values() {
        assert!(!detector().detect(&quantities(&[42.0], "ha")).has_conflict());
        assert!(!detector().detect(&quantities(&[42.0, 42.0, 42.0], "ha")).has_conflict());
        assert!(!detector().detect(&[]).has_conflict());
    }

    proptest! {
        #[test]
        fn prop_detection_ignores_occurrence_order(
            mut values in proptest::collection::vec(0.0f64..1e6, 0..12)
        ) {
            let forward = detector().detect(&quantities(&values, "kg")).has_conflict();
            values.reverse();
            let backward = detector().detect(&quantities(&values, "kg")).has_conflict();
            prop_assert_eq!(forward, backward);
        }
    }
}
