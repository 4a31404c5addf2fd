//! Unit normalization
//!
//! A static table maps raw unit strings to a canonical unit and a
//! multiplicative factor. Entries are grouped by physical quantity so that
//! values of unrelated quantities never end up in the same canonical unit.
//!
//! Lookup is case-insensitive and trimmed, which makes a few spellings
//! ambiguous (`mL` vs `ML`, `mt` vs `Mt`). The table resolves these in favour
//! of the reading that is common in impact reports: `ml` is millilitres and
//! `mt` is megatonnes. Megalitres must be spelled out, except in the flow
//! rate `ml/d` where megalitres per day is the only plausible reading.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Physical quantity a canonical unit measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    /// Mass, canonical `kg`
    Mass,
    /// Mass per year, canonical `kg/yr`
    MassRate,
    /// Area, canonical `ha`
    Area,
    /// Length, canonical `m`
    Length,
    /// Power, canonical `MW`
    Power,
    /// Energy, canonical `MWh`
    Energy,
    /// Volume, canonical `m³`
    Volume,
    /// Volumetric flow per second, canonical `m³/s`
    FlowPerSecond,
    /// Volumetric flow per day, canonical `m³/d`
    FlowPerDay,
    /// Mass concentration in water, canonical `mg/L`
    ConcentrationWater,
    /// Mass concentration in air, canonical `µg/m³`
    ConcentrationAir,
    /// Mixing ratio, canonical `ppm`
    MixingRatio,
    /// Temperature, canonical `°C`
    Temperature,
    /// Pressure, canonical `kPa`
    Pressure,
}

/// One row of the conversion table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConversion {
    /// Target unit after normalization
    pub canonical_unit: &'static str,
    /// Multiply the raw value by this to get the canonical value
    pub factor: f64,
    /// Quantity measured
    pub quantity: Quantity,
}

/// Raw spellings (lowercase), canonical unit, factor, quantity
const UNIT_TABLE: &[(&[&str], &str, f64, Quantity)] = &[
    // Mass -> kg
    (&["kg", "kilogram", "kilograms", "kgs"], "kg", 1.0, Quantity::Mass),
    (&["g", "gram", "grams"], "kg", 1e-3, Quantity::Mass),
    (&["mg", "milligram", "milligrams"], "kg", 1e-6, Quantity::Mass),
    (&["t", "tonne", "tonnes", "ton", "tons", "metric ton", "metric tons", "mt."], "kg", 1e3, Quantity::Mass),
    (&["kt", "kilotonne", "kilotonnes", "thousand tonnes"], "kg", 1e6, Quantity::Mass),
    (&["mt", "megatonne", "megatonnes", "million tonnes"], "kg", 1e9, Quantity::Mass),
    (&["lb", "lbs", "pound", "pounds"], "kg", 0.453_592_37, Quantity::Mass),
    (&["tco2e", "t co2e", "tco2-e", "tonnes co2e", "t co2-eq"], "kg", 1e3, Quantity::Mass),
    // Mass per year -> kg/yr
    (&["kg/yr", "kg/year", "kg/a", "kg per year"], "kg/yr", 1.0, Quantity::MassRate),
    (&["t/yr", "t/year", "t/a", "tpa", "tonnes/year", "tonnes per year", "tonnes/yr", "t per year"], "kg/yr", 1e3, Quantity::MassRate),
    (&["tco2e/yr", "tco2e/year", "tco2e per year", "t co2e/yr"], "kg/yr", 1e3, Quantity::MassRate),
    (&["kt/yr", "kt/year", "ktpa"], "kg/yr", 1e6, Quantity::MassRate),
    (&["mt/yr", "mt/year", "mtpa", "million tonnes per year"], "kg/yr", 1e9, Quantity::MassRate),
    // Area -> ha
    (&["ha", "hectare", "hectares"], "ha", 1.0, Quantity::Area),
    (&["m2", "m²", "sq m", "square metre", "square metres", "square meter", "square meters"], "ha", 1e-4, Quantity::Area),
    (&["km2", "km²", "sq km", "square kilometre", "square kilometres", "square kilometer", "square kilometers"], "ha", 100.0, Quantity::Area),
    (&["acre", "acres", "ac"], "ha", 0.404_685_642_24, Quantity::Area),
    // Length -> m
    (&["m", "metre", "metres", "meter", "meters"], "m", 1.0, Quantity::Length),
    (&["km", "kilometre", "kilometres", "kilometer", "kilometers"], "m", 1e3, Quantity::Length),
    (&["cm", "centimetre", "centimetres"], "m", 1e-2, Quantity::Length),
    (&["mm", "millimetre", "millimetres"], "m", 1e-3, Quantity::Length),
    // Power -> MW
    (&["mw", "megawatt", "megawatts"], "MW", 1.0, Quantity::Power),
    (&["kw", "kilowatt", "kilowatts"], "MW", 1e-3, Quantity::Power),
    (&["w", "watt", "watts"], "MW", 1e-6, Quantity::Power),
    (&["gw", "gigawatt", "gigawatts"], "MW", 1e3, Quantity::Power),
    (&["mwe", "mwp", "mwac", "mwdc"], "MW", 1.0, Quantity::Power),
    // Energy -> MWh
    (&["mwh", "megawatt hour", "megawatt hours", "megawatt-hours"], "MWh", 1.0, Quantity::Energy),
    (&["kwh", "kilowatt hour", "kilowatt hours", "kilowatt-hours"], "MWh", 1e-3, Quantity::Energy),
    (&["wh", "watt hour", "watt hours"], "MWh", 1e-6, Quantity::Energy),
    (&["gwh", "gigawatt hour", "gigawatt hours", "gigawatt-hours"], "MWh", 1e3, Quantity::Energy),
    (&["twh", "terawatt hour", "terawatt hours"], "MWh", 1e6, Quantity::Energy),
    (&["gj", "gigajoule", "gigajoules"], "MWh", 1.0 / 3.6, Quantity::Energy),
    (&["tj", "terajoule", "terajoules"], "MWh", 1e3 / 3.6, Quantity::Energy),
    (&["mj", "megajoule", "megajoules"], "MWh", 1e-3 / 3.6, Quantity::Energy),
    // Volume -> m³
    (&["m3", "m³", "cubic metre", "cubic metres", "cubic meter", "cubic meters"], "m³", 1.0, Quantity::Volume),
    (&["l", "litre", "litres", "liter", "liters"], "m³", 1e-3, Quantity::Volume),
    (&["ml", "millilitre", "millilitres", "milliliter", "milliliters"], "m³", 1e-6, Quantity::Volume),
    (&["megalitre", "megalitres", "megaliter", "megaliters"], "m³", 1e3, Quantity::Volume),
    (&["gl", "gigalitre", "gigalitres", "gigaliter", "gigaliters"], "m³", 1e6, Quantity::Volume),
    (&["mm3", "mm³", "million cubic metres", "million m3", "million m³"], "m³", 1e6, Quantity::Volume),
    // Flow -> m³/s and m³/d
    (&["m3/s", "m³/s", "cumecs", "cubic metres per second"], "m³/s", 1.0, Quantity::FlowPerSecond),
    (&["l/s", "litres per second", "liters per second"], "m³/s", 1e-3, Quantity::FlowPerSecond),
    (&["m3/d", "m³/d", "m3/day", "m³/day", "cubic metres per day"], "m³/d", 1.0, Quantity::FlowPerDay),
    (&["l/d", "l/day", "litres per day", "liters per day"], "m³/d", 1e-3, Quantity::FlowPerDay),
    (&["ml/d", "megalitres per day", "megaliters per day"], "m³/d", 1e3, Quantity::FlowPerDay),
    // Concentration in water -> mg/L
    (&["mg/l", "milligrams per litre", "milligrams per liter"], "mg/L", 1.0, Quantity::ConcentrationWater),
    (&["µg/l", "μg/l", "ug/l", "micrograms per litre", "micrograms per liter"], "mg/L", 1e-3, Quantity::ConcentrationWater),
    (&["g/l", "grams per litre", "grams per liter"], "mg/L", 1e3, Quantity::ConcentrationWater),
    // Concentration in air -> µg/m³
    (&["µg/m3", "µg/m³", "μg/m3", "μg/m³", "ug/m3", "ug/m³"], "µg/m³", 1.0, Quantity::ConcentrationAir),
    (&["mg/m3", "mg/m³", "mg/nm3", "mg/nm³"], "µg/m³", 1e3, Quantity::ConcentrationAir),
    (&["ng/m3", "ng/m³"], "µg/m³", 1e-3, Quantity::ConcentrationAir),
    // Mixing ratio -> ppm
    (&["ppm", "parts per million"], "ppm", 1.0, Quantity::MixingRatio),
    (&["ppb", "parts per billion"], "ppm", 1e-3, Quantity::MixingRatio),
    // Temperature -> °C (multiplicative table: only Celsius spellings)
    (&["°c", "ºc", "degc", "deg c", "celsius", "degrees celsius", "c°"], "°C", 1.0, Quantity::Temperature),
    // Pressure -> kPa
    (&["kpa", "kilopascal", "kilopascals"], "kPa", 1.0, Quantity::Pressure),
    (&["pa", "pascal", "pascals"], "kPa", 1e-3, Quantity::Pressure),
    (&["mpa", "megapascal", "megapascals"], "kPa", 1e3, Quantity::Pressure),
    (&["bar", "bars"], "kPa", 100.0, Quantity::Pressure),
    (&["mbar", "millibar", "hpa"], "kPa", 0.1, Quantity::Pressure),
    (&["atm", "atmosphere", "atmospheres"], "kPa", 101.325, Quantity::Pressure),
    (&["psi"], "kPa", 6.894_757, Quantity::Pressure),
];

static UNIT_INDEX: LazyLock<HashMap<&'static str, UnitConversion>> = LazyLock::new(|| {
    let mut index = HashMap::new();
    for (spellings, canonical_unit, factor, quantity) in UNIT_TABLE {
        for spelling in *spellings {
            index.insert(
                *spelling,
                UnitConversion {
                    canonical_unit: *canonical_unit,
                    factor: *factor,
                    quantity: *quantity,
                },
            );
        }
    }
    index
});

/// Look up a raw unit in the conversion table
pub fn lookup(raw_unit: &str) -> Option<UnitConversion> {
    let key = raw_unit.trim().to_lowercase();
    if key.is_empty() {
        return None;
    }
    UNIT_INDEX.get(key.as_str()).copied()
}

/// Quantity measured by a raw or canonical unit, if known
pub fn quantity_of(unit: &str) -> Option<Quantity> {
    lookup(unit).map(|conversion| conversion.quantity)
}

/// Normalize a value to its canonical unit
///
/// Unknown units pass through unchanged: the value is returned as-is and the
/// unit is returned exactly as supplied. This never fails, so an exotic unit
/// can never block extraction.
///
/// # Examples
///
/// ```
/// use factsheet_domain::normalize;
///
/// assert_eq!(normalize(2.5, " MW "), (2.5, "MW".to_string()));
/// assert_eq!(normalize(1500.0, "kW"), (1.5, "MW".to_string()));
/// assert_eq!(normalize(7.0, "furlongs"), (7.0, "furlongs".to_string()));
/// ```
pub fn normalize(numeric_value: f64, raw_unit: &str) -> (f64, String) {
    match lookup(raw_unit) {
        Some(conversion) => (
            numeric_value * conversion.factor,
            conversion.canonical_unit.to_string(),
        ),
        None => (numeric_value, raw_unit.to_string()),
    }
}

/// Number of raw spellings in the table
pub fn table_len() -> usize {
    UNIT_INDEX.len()
}
