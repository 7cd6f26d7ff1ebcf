//! # Unit Catalog
//!
//! This module defines the fixed set of kitchen units recognised by the planner:
//! Swedish metric weights and volumes, spoon measures, pieces and a few textual
//! measures that can never be summed.
//!
//! ## Core Concepts
//!
//! - **Unit**: an immutable catalog entry looked up by its short code
//! - **UnitCategory**: the family a unit belongs to (weight, volume, spoon, count, other)
//! - **Conversion**: how a quantity in the unit reaches its aggregation base
//!
//! ## Usage
//!
//! ```rust
//! use matsedel::units::{is_summable, lookup_unit, UnitCategory};
//!
//! let dl = lookup_unit("dl").unwrap();
//! assert_eq!(dl.category, UnitCategory::Volume);
//! assert!(is_summable("dl"));
//! assert!(!is_summable("nypa"));
//! ```

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Base code for the volume family (volume and spoon measures)
pub const VOLUME_BASE: &str = "ml";
/// Base code for the weight family
pub const WEIGHT_BASE: &str = "g";
/// Code of the count unit, also used when an amount carries a bare number
pub const COUNT_UNIT: &str = "st";

/// Unit families, listed in catalog order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitCategory {
    /// Grams and kilograms
    Weight,
    /// Metric volumes
    Volume,
    /// Spoon measures (volumes, kept apart for display)
    Spoon,
    /// Pieces
    Count,
    /// Textual measures such as "a pinch"
    Other,
}

/// How a quantity expressed in a unit reaches its aggregation base
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Conversion {
    /// Multiply by the factor to get milliliters
    ToMilliliters(f64),
    /// Multiply by the factor to get grams
    ToGrams(f64),
    /// The unit is its own base
    Identity,
    /// Never converted nor summed
    NotSummable,
}

/// A kitchen unit from the static catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unit {
    /// Canonical short form (e.g. "dl")
    pub code: &'static str,
    /// Singular display name (e.g. "deciliter")
    pub display_name: &'static str,
    /// Plural display name (e.g. "matskedar")
    pub plural_display_name: &'static str,
    /// Family of the unit
    pub category: UnitCategory,
    /// Whether quantities in this unit may be added together
    pub summable: bool,
    #[serde(skip)]
    conversion: Conversion,
}

impl Unit {
    const fn new(
        code: &'static str,
        display_name: &'static str,
        plural_display_name: &'static str,
        category: UnitCategory,
        conversion: Conversion,
    ) -> Self {
        Self {
            code,
            display_name,
            plural_display_name,
            category,
            summable: !matches!(conversion, Conversion::NotSummable),
            conversion,
        }
    }

    /// Conversion towards the aggregation base of this unit's family
    pub fn conversion(&self) -> Conversion {
        self.conversion
    }

    /// Display name matching the given amount (singular for exactly one)
    pub fn name_for(&self, amount: f64) -> &'static str {
        if (amount - 1.0).abs() < f64::EPSILON {
            self.display_name
        } else {
            self.plural_display_name
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

impl UnitCategory {
    /// Every category in catalog order
    pub const ALL: [UnitCategory; 5] = [
        UnitCategory::Weight,
        UnitCategory::Volume,
        UnitCategory::Spoon,
        UnitCategory::Count,
        UnitCategory::Other,
    ];

    /// Lower-case identifier of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitCategory::Weight => "weight",
            UnitCategory::Volume => "volume",
            UnitCategory::Spoon => "spoon",
            UnitCategory::Count => "count",
            UnitCategory::Other => "other",
        }
    }

    /// Parse a category identifier, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_lowercase();
        Self::ALL.into_iter().find(|category| category.as_str() == value)
    }
}

impl fmt::Display for UnitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog in definition order: weight, volume, spoon measures, count, other
static UNITS: [Unit; 13] = [
    // Weight
    Unit::new("g", "gram", "gram", UnitCategory::Weight, Conversion::ToGrams(1.0)),
    Unit::new("kg", "kilogram", "kilogram", UnitCategory::Weight, Conversion::ToGrams(1000.0)),
    // Volume
    Unit::new("ml", "milliliter", "milliliter", UnitCategory::Volume, Conversion::ToMilliliters(1.0)),
    Unit::new("cl", "centiliter", "centiliter", UnitCategory::Volume, Conversion::ToMilliliters(10.0)),
    Unit::new("dl", "deciliter", "deciliter", UnitCategory::Volume, Conversion::ToMilliliters(100.0)),
    Unit::new("l", "liter", "liter", UnitCategory::Volume, Conversion::ToMilliliters(1000.0)),
    // Spoon measures
    Unit::new("krm", "kryddmått", "kryddmått", UnitCategory::Spoon, Conversion::ToMilliliters(1.0)),
    Unit::new("tsk", "tesked", "teskedar", UnitCategory::Spoon, Conversion::ToMilliliters(5.0)),
    Unit::new("msk", "matsked", "matskedar", UnitCategory::Spoon, Conversion::ToMilliliters(15.0)),
    // Count
    Unit::new("st", "styck", "stycken", UnitCategory::Count, Conversion::Identity),
    // Textual measures, never summed
    Unit::new("nypa", "nypa", "nypor", UnitCategory::Other, Conversion::NotSummable),
    Unit::new("knippe", "knippe", "knippen", UnitCategory::Other, Conversion::NotSummable),
    Unit::new("efter_smak", "efter smak", "efter smak", UnitCategory::Other, Conversion::NotSummable),
];

static UNITS_BY_CODE: LazyLock<HashMap<&'static str, &'static Unit>> =
    LazyLock::new(|| UNITS.iter().map(|unit| (unit.code, unit)).collect());

/// All units in definition order
pub fn all_units() -> &'static [Unit] {
    &UNITS
}

/// Units of one category, keeping definition order
pub fn units_by_category(category: UnitCategory) -> Vec<&'static Unit> {
    UNITS.iter().filter(|unit| unit.category == category).collect()
}

/// Look up a unit by its exact code
pub fn lookup_unit(code: &str) -> Option<&'static Unit> {
    UNITS_BY_CODE.get(code).copied()
}

/// Whether the code names a known, summable unit. Unknown codes are simply not summable.
pub fn is_summable(code: &str) -> bool {
    lookup_unit(code).is_some_and(|unit| unit.summable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_follows_categories() {
        let codes: Vec<&str> = all_units().iter().map(|u| u.code).collect();
        assert_eq!(
            codes,
            vec!["g", "kg", "ml", "cl", "dl", "l", "krm", "tsk", "msk", "st", "nypa", "knippe", "efter_smak"]
        );

        let mut last_rank = 0;
        for unit in all_units() {
            let rank = UnitCategory::ALL.iter().position(|c| *c == unit.category).unwrap();
            assert!(rank >= last_rank, "{} is out of category order", unit.code);
            last_rank = rank;
        }
    }

    #[test]
    fn test_codes_are_unique() {
        assert_eq!(UNITS_BY_CODE.len(), all_units().len());
    }

    #[test]
    fn test_units_by_category() {
        let spoons: Vec<&str> = units_by_category(UnitCategory::Spoon).iter().map(|u| u.code).collect();
        assert_eq!(spoons, vec!["krm", "tsk", "msk"]);

        let volumes: Vec<&str> = units_by_category(UnitCategory::Volume).iter().map(|u| u.code).collect();
        assert_eq!(volumes, vec!["ml", "cl", "dl", "l"]);

        assert_eq!(units_by_category(UnitCategory::Count).len(), 1);
    }

    #[test]
    fn test_lookup_unit() {
        let msk = lookup_unit("msk").unwrap();
        assert_eq!(msk.display_name, "matsked");
        assert_eq!(msk.plural_display_name, "matskedar");
        assert_eq!(msk.conversion(), Conversion::ToMilliliters(15.0));

        assert_eq!(lookup_unit("kg").unwrap().conversion(), Conversion::ToGrams(1000.0));
        assert!(lookup_unit("cups").is_none());
        assert!(lookup_unit("DL").is_none());
    }

    #[test]
    fn test_is_summable() {
        assert!(is_summable("g"));
        assert!(is_summable("st"));
        assert!(is_summable("krm"));
        assert!(!is_summable("nypa"));
        assert!(!is_summable("knippe"));
        assert!(!is_summable("efter_smak"));
        assert!(!is_summable("skivor"));
        assert!(!is_summable(""));
    }

    #[test]
    fn test_name_for_amount() {
        let tsk = lookup_unit("tsk").unwrap();
        assert_eq!(tsk.name_for(1.0), "tesked");
        assert_eq!(tsk.name_for(2.0), "teskedar");
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(UnitCategory::parse("Weight"), Some(UnitCategory::Weight));
        assert_eq!(UnitCategory::parse(" spoon "), Some(UnitCategory::Spoon));
        assert_eq!(UnitCategory::parse("liquid"), None);
    }
}
