//! Fact signatures - the deduplication key
//!
//! Two mentions whose names slugify to the same signature are treated as the
//! same real-world fact, whatever their casing, accents, subscripts or
//! punctuation.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Separator placed between alphanumeric runs
const SEPARATOR: char = '_';

/// Derive the signature of a fact name
///
/// Applies NFKD compatibility decomposition (so `₂` becomes `2` and `é`
/// becomes `e` plus a combining mark), drops combining marks, lowercases,
/// and collapses every run of non-alphanumeric characters into a single `_`.
/// Leading and trailing separators are trimmed.
///
/// # Examples
///
/// ```
/// use factsheet_domain::slugify;
///
/// assert_eq!(slugify("CO₂ Emissions"), "co2_emissions");
/// assert_eq!(slugify("co2 emissions"), "co2_emissions");
/// assert_eq!(slugify("CO2_Emissions"), "co2_emissions");
/// assert_eq!(slugify("  Área   protegida! "), "area_protegida");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.nfkd().filter(|c| !is_combining_mark(*c)) {
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push(SEPARATOR);
            }
            pending_separator = false;
            slug.extend(c.to_lowercase().filter(|lc| !is_combining_mark(*lc)));
        } else {
            pending_separator = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_case_and_subscript_variants_collapse() {
        for name in ["CO₂ Emissions", "co2 emissions", "CO2_Emissions", "CO2 -- emissions."] {
            assert_eq!(slugify(name), "co2_emissions", "name: {name}");
        }
        assert_eq!(slugify("Co2Emissions"), "co2emissions");
    }

    #[test]
    fn test_diacritics_are_folded() {
        assert_eq!(slugify("Émissions de méthane"), "emissions_de_methane");
        assert_eq!(slugify("Superficie (m²)"), "superficie_m2");
    }

    #[test]
    fn test_empty_and_symbol_only() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify(" -- %% "), "");
    }

    #[test]
    fn test_non_latin_alphanumerics_are_kept() {
        assert_eq!(slugify("排放 总量"), "排放_总量");
    }

    proptest! {
        #[test]
        fn prop_slugify_is_deterministic(name in ".{0,64}") {
            prop_assert_eq!(slugify(&name), slugify(&name));
        }

        #[test]
        fn prop_slugify_is_idempotent(name in "[a-zA-Z0-9À-ÿ _.()-]{0,40}") {
            let once = slugify(&name);
            prop_assert_eq!(slugify(&once), once);
        }

        #[test]
        fn prop_slugify_ignores_ascii_case(name in "[A-Za-z0-9 _-]{0,40}") {
            prop_assert_eq!(slugify(&name.to_uppercase()), slugify(&name.to_lowercase()));
        }
    }
}
