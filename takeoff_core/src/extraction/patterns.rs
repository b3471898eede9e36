//! # Field Pattern Registry
//!
//! One recognition rule per field, compiled once and shared by every
//! extraction call. Rules are case-insensitive and tolerate label synonyms
//! ("Ridge" / "Ridges" / "Ridge Length"), `=` / `:` / no separator,
//! thousands separators, and unit suffixes. Each rule captures a single
//! `value` group.
//!
//! ## Usage
//!
//! ```rust
//! use takeoff_core::extraction::patterns::Field;
//!
//! let text = "Predominant Pitch = 6/12\nRidges = 80 ft (3 Ridges)";
//! assert_eq!(Field::Ridges.rule().find(text), Some("80"));
//! assert_eq!(Field::PredominantPitch.rule().find(text), Some("6/12"));
//! assert_eq!(Field::Valleys.rule().find(text), None);
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::measurements::LinearFeature;

/// Numeric value with optional thousands separators and decimals
const NUMBER: &str = r"(?P<value>\d[\d,]*(?:\.\d+)?)";
/// `=`, `:`, or nothing between label and value
const SEP: &str = r"\s*[=:]?\s*";

// ============================================================================
// Fields
// ============================================================================

/// Every field the registry knows how to recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    TotalArea,
    PredominantPitch,
    Ridges,
    Hips,
    Valleys,
    Rakes,
    Eaves,
    Flashing,
    StepFlashing,
    PenetrationsArea,
    PenetrationsPerimeter,
    TotalPenetrations,
    TotalFacets,
    NumberOfStories,
    SuggestedWaste,
    PropertyAddress,
}

impl Field {
    /// All fields in registry order
    pub const ALL: [Field; 16] = [
        Field::TotalArea,
        Field::PredominantPitch,
        Field::Ridges,
        Field::Hips,
        Field::Valleys,
        Field::Rakes,
        Field::Eaves,
        Field::Flashing,
        Field::StepFlashing,
        Field::PenetrationsArea,
        Field::PenetrationsPerimeter,
        Field::TotalPenetrations,
        Field::TotalFacets,
        Field::NumberOfStories,
        Field::SuggestedWaste,
        Field::PropertyAddress,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Field::TotalArea => "total_area",
            Field::PredominantPitch => "predominant_pitch",
            Field::Ridges => "ridges",
            Field::Hips => "hips",
            Field::Valleys => "valleys",
            Field::Rakes => "rakes",
            Field::Eaves => "eaves",
            Field::Flashing => "flashing",
            Field::StepFlashing => "step_flashing",
            Field::PenetrationsArea => "penetrations_area",
            Field::PenetrationsPerimeter => "penetrations_perimeter",
            Field::TotalPenetrations => "total_penetrations",
            Field::TotalFacets => "total_facets",
            Field::NumberOfStories => "number_of_stories",
            Field::SuggestedWaste => "suggested_waste",
            Field::PropertyAddress => "property_address",
        }
    }

    /// Regex source for this field's rule.
    ///
    /// A `skip` group marks a match that belongs to a different field (for
    /// example `Step Flashing` seen while looking for `Flashing`); such
    /// matches are passed over.
    pub fn pattern(&self) -> String {
        let length = |label: &str| format!(r"(?i)\b{label}(?:\s+Length)?{SEP}{NUMBER}(?:\s*(?:ft\b|feet\b|'))?");
        match self {
            Field::TotalArea => format!(
                r"(?i)\bTotal\s+(?:Roof\s+)?(?:Area|SF|Square\s+Footage)(?:\s*\(All\s+Pitches\))?{SEP}{NUMBER}"
            ),
            Field::PredominantPitch => format!(
                r"(?i)\b(?:Predominant|Primary|Main)\s+Pitch{SEP}(?P<value>\d{{1,2}}\s*/\s*\d{{1,2}})\b"
            ),
            Field::Ridges => length("Ridges?"),
            Field::Hips => length("Hips?"),
            Field::Valleys => length("Valleys?"),
            Field::Rakes => length("Rakes?†?"),
            Field::Eaves => length(r"Eaves?(?:\s*/\s*Starter)?‡?"),
            Field::Flashing => format!(
                r"(?i)(?P<skip>\bStep[\s-]*)?\bFlashing(?:\s+Length)?{SEP}{NUMBER}(?:\s*(?:ft\b|feet\b|'))?"
            ),
            Field::StepFlashing => length(r"Step[\s-]*Flashing"),
            Field::PenetrationsArea => format!(r"(?i)\b(?:Total\s+)?Penetrations?\s+Area{SEP}{NUMBER}"),
            Field::PenetrationsPerimeter => {
                format!(r"(?i)\b(?:Total\s+)?Penetrations?\s+Perimeter{SEP}{NUMBER}")
            }
            Field::TotalPenetrations => {
                format!(r"(?i)\b(?:Total|Number\s+of)\s+Penetrations{SEP}(?P<value>\d+)\b")
            }
            Field::TotalFacets => format!(r"(?i)\b(?:Total\s+)?(?:Roof\s+)?Facets{SEP}(?P<value>\d+)\b"),
            Field::NumberOfStories => {
                r"(?i)\b(?:Number\s+of\s+)?Stories[ \t]*(?:<=|>=|[=:])?[ \t]*(?P<value>\d+)\b".to_string()
            }
            Field::SuggestedWaste => format!(
                r"(?i)\b(?:(?:Suggested|Recommended)\s+Waste(?:\s+Factor)?|Waste\s+Factor){SEP}(?P<value>\d+(?:\.\d+)?)\s*%"
            ),
            Field::PropertyAddress => r"(?i)\bProperty\s+Address\s*[:=]?[ \t]*(?P<value>[^\n]*\S)".to_string(),
        }
    }

    /// The compiled rule for this field
    pub fn rule(&self) -> &'static FieldRule {
        &REGISTRY[*self as usize]
    }

    /// The linear feature this field measures, if any
    pub fn linear_feature(&self) -> Option<LinearFeature> {
        match self {
            Field::Ridges => Some(LinearFeature::Ridges),
            Field::Hips => Some(LinearFeature::Hips),
            Field::Valleys => Some(LinearFeature::Valleys),
            Field::Rakes => Some(LinearFeature::Rakes),
            Field::Eaves => Some(LinearFeature::Eaves),
            Field::Flashing => Some(LinearFeature::Flashing),
            Field::StepFlashing => Some(LinearFeature::StepFlashing),
            _ => None,
        }
    }

    /// The field holding a linear feature's length
    pub fn for_feature(feature: LinearFeature) -> Field {
        match feature {
            LinearFeature::Ridges => Field::Ridges,
            LinearFeature::Hips => Field::Hips,
            LinearFeature::Valleys => Field::Valleys,
            LinearFeature::Rakes => Field::Rakes,
            LinearFeature::Eaves => Field::Eaves,
            LinearFeature::Flashing => Field::Flashing,
            LinearFeature::StepFlashing => Field::StepFlashing,
        }
    }
}

// ============================================================================
// Rules
// ============================================================================

/// A compiled recognition rule.
#[derive(Debug)]
pub struct FieldRule {
    pub field: Field,
    regex: Regex,
}

impl FieldRule {
    fn compile(field: Field) -> Self {
        FieldRule {
            field,
            regex: Regex::new(&field.pattern()).expect("registry patterns are valid"),
        }
    }

    /// First value for this field in `text`, or `None`.
    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.regex
            .captures_iter(text)
            .filter(|caps| caps.name("skip").is_none())
            .find_map(|caps| caps.name("value"))
            .map(|m| m.as_str().trim())
    }
}

static REGISTRY: Lazy<Vec<FieldRule>> = Lazy::new(|| Field::ALL.iter().map(|f| FieldRule::compile(*f)).collect());

/// Every compiled rule, in [`Field::ALL`] order
pub fn registry() -> &'static [FieldRule] {
    &REGISTRY
}

// ============================================================================
// Shared Tokens
// ============================================================================

/// A rise/run pitch token such as `6/12`
pub static PITCH_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})\s*/\s*(\d{1,2})\b").expect("valid pitch token pattern"));

/// Header of the per-pitch area section
pub static PITCH_SECTION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bAreas?\s+per\s+Pitch\b").expect("valid section marker pattern"));

/// Normalize a pitch token: `"6 / 12"` becomes `"6/12"`.
pub fn normalize_pitch(token: &str) -> String {
    token.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Parse a numeric string with thousands separators.
pub fn parse_number(raw: &str) -> Result<f64, String> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned
        .parse::<f64>()
        .map_err(|e| e.to_string())
        .and_then(|v| if v.is_finite() { Ok(v) } else { Err("value is not finite".to_string()) })
}
