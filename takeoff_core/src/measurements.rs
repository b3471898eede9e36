//! # Measurement Record
//!
//! The normalized output of the extraction pipeline. A [`MeasurementRecord`]
//! is produced once per document by [`MeasurementBuilder::build`] and is not
//! modified afterwards; it is handed to [`crate::estimate`] and
//! [`crate::pdf`] or serialized straight to the caller.
//!
//! ## Structure
//!
//! ```text
//! MeasurementRecord
//! ├── total_area / total_squares (squares always = area / 100)
//! ├── predominant_pitch ("6/12")
//! ├── linear_features: BTreeMap<LinearFeature, LengthWithCount>
//! ├── drip_edge (rakes + eaves, only when both exist)
//! ├── areas_per_pitch: Vec<PitchArea>
//! └── penetrations, facets, stories, waste, address (optional)
//! ```
//!
//! A linear feature that was not found is *absent*, never zero: the costing
//! side has to tell "no eaves" apart from "eaves not reported".

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{TakeoffError, TakeoffResult};
use crate::units::{Feet, SqFt, Squares};

/// Largest segment count accepted for a linear feature
pub const MAX_SEGMENT_COUNT: u32 = 99;

// ============================================================================
// Linear Features
// ============================================================================

/// A category of roof edge measured as total length plus segment count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearFeature {
    Ridges,
    Hips,
    Valleys,
    Rakes,
    Eaves,
    Flashing,
    StepFlashing,
}

impl LinearFeature {
    /// All linear features in report order
    pub const ALL: [LinearFeature; 7] = [
        LinearFeature::Ridges,
        LinearFeature::Hips,
        LinearFeature::Valleys,
        LinearFeature::Rakes,
        LinearFeature::Eaves,
        LinearFeature::Flashing,
        LinearFeature::StepFlashing,
    ];

    /// Key used in serialized records
    pub fn key(&self) -> &'static str {
        match self {
            LinearFeature::Ridges => "ridges",
            LinearFeature::Hips => "hips",
            LinearFeature::Valleys => "valleys",
            LinearFeature::Rakes => "rakes",
            LinearFeature::Eaves => "eaves",
            LinearFeature::Flashing => "flashing",
            LinearFeature::StepFlashing => "step_flashing",
        }
    }

    /// Singular label stem as vendors print it ("Ridge" also matches "Ridges")
    pub fn label(&self) -> &'static str {
        match self {
            LinearFeature::Ridges => "Ridge",
            LinearFeature::Hips => "Hip",
            LinearFeature::Valleys => "Valley",
            LinearFeature::Rakes => "Rake",
            LinearFeature::Eaves => "Eave",
            LinearFeature::Flashing => "Flashing",
            LinearFeature::StepFlashing => "Step Flashing",
        }
    }

    /// Display name for reports
    pub fn display_name(&self) -> &'static str {
        match self {
            LinearFeature::Ridges => "Ridges",
            LinearFeature::Hips => "Hips",
            LinearFeature::Valleys => "Valleys",
            LinearFeature::Rakes => "Rakes",
            LinearFeature::Eaves => "Eaves",
            LinearFeature::Flashing => "Flashing",
            LinearFeature::StepFlashing => "Step Flashing",
        }
    }
}

impl fmt::Display for LinearFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Total length of a linear feature and how many segments compose it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthWithCount {
    pub length: Feet,
    pub count: u32,
}

impl LengthWithCount {
    /// Create a length/count pair, rejecting negative lengths and counts
    /// outside `1..=99`.
    pub fn new(length: Feet, count: u32) -> TakeoffResult<Self> {
        if !(length.0 >= 0.0) || !length.0.is_finite() {
            return Err(TakeoffError::invalid_input(
                "length",
                length.0.to_string(),
                "Length must be a non-negative number of feet",
            ));
        }
        if !(1..=MAX_SEGMENT_COUNT).contains(&count) {
            return Err(TakeoffError::invalid_input(
                "count",
                count.to_string(),
                "Segment count must be between 1 and 99",
            ));
        }
        Ok(LengthWithCount { length, count })
    }
}

/// Area of the roof at one pitch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchArea {
    /// Rise/run token as printed, e.g. `"6/12"`
    pub pitch: String,
    pub area: SqFt,
    /// Share of the total roof area, 0-100
    pub percentage: f64,
}

// ============================================================================
// Measurement Record
// ============================================================================

/// Normalized roof measurements for one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub total_area: SqFt,
    pub total_squares: Squares,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predominant_pitch: Option<String>,
    #[serde(default)]
    pub linear_features: BTreeMap<LinearFeature, LengthWithCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drip_edge: Option<LengthWithCount>,
    #[serde(default)]
    pub areas_per_pitch: Vec<PitchArea>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penetrations_area: Option<SqFt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penetrations_perimeter: Option<Feet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_penetrations: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_facets: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_stories: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_waste_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_address: Option<String>,
}

impl MeasurementRecord {
    /// Look up a linear feature, `None` when the report did not include it
    pub fn feature(&self, feature: LinearFeature) -> Option<&LengthWithCount> {
        self.linear_features.get(&feature)
    }

    /// Length of a feature, zero when absent (for quantity takeoffs only)
    pub fn feature_length(&self, feature: LinearFeature) -> Feet {
        self.feature(feature).map(|f| f.length).unwrap_or_default()
    }

    /// Sum of every linear feature present
    pub fn total_linear_length(&self) -> Feet {
        self.linear_features
            .values()
            .fold(Feet(0.0), |acc, f| acc + f.length)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Accumulates extracted values and produces a [`MeasurementRecord`].
///
/// Derived fields (`total_squares`, `drip_edge`) are computed in
/// [`build`](MeasurementBuilder::build) and cannot be set directly.
///
/// # Example
///
/// ```rust
/// use takeoff_core::measurements::{LengthWithCount, LinearFeature, MeasurementBuilder};
/// use takeoff_core::units::{Feet, SqFt};
///
/// let mut builder = MeasurementBuilder::new();
/// builder
///     .total_area(SqFt(2450.0))
///     .feature(LinearFeature::Rakes, LengthWithCount::new(Feet(60.0), 1).unwrap())
///     .feature(LinearFeature::Eaves, LengthWithCount::new(Feet(150.0), 1).unwrap());
///
/// let record = builder.build().unwrap();
/// assert_eq!(record.total_squares.0, 24.5);
/// assert_eq!(record.drip_edge.unwrap().length.0, 210.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MeasurementBuilder {
    total_area: Option<SqFt>,
    predominant_pitch: Option<String>,
    linear_features: BTreeMap<LinearFeature, LengthWithCount>,
    areas_per_pitch: Vec<PitchArea>,
    penetrations_area: Option<SqFt>,
    penetrations_perimeter: Option<Feet>,
    total_penetrations: Option<u32>,
    total_facets: Option<u32>,
    number_of_stories: Option<u32>,
    suggested_waste_percentage: Option<f64>,
    property_address: Option<String>,
}

impl MeasurementBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_area(&mut self, area: SqFt) -> &mut Self {
        self.total_area = Some(area);
        self
    }

    pub fn predominant_pitch(&mut self, pitch: impl Into<String>) -> &mut Self {
        self.predominant_pitch = Some(pitch.into());
        self
    }

    pub fn feature(&mut self, feature: LinearFeature, value: LengthWithCount) -> &mut Self {
        self.linear_features.insert(feature, value);
        self
    }

    pub fn areas_per_pitch(&mut self, areas: Vec<PitchArea>) -> &mut Self {
        self.areas_per_pitch = areas;
        self
    }

    pub fn penetrations_area(&mut self, area: SqFt) -> &mut Self {
        self.penetrations_area = Some(area);
        self
    }

    pub fn penetrations_perimeter(&mut self, perimeter: Feet) -> &mut Self {
        self.penetrations_perimeter = Some(perimeter);
        self
    }

    pub fn total_penetrations(&mut self, count: u32) -> &mut Self {
        self.total_penetrations = Some(count);
        self
    }

    pub fn total_facets(&mut self, count: u32) -> &mut Self {
        self.total_facets = Some(count);
        self
    }

    pub fn number_of_stories(&mut self, stories: u32) -> &mut Self {
        self.number_of_stories = Some(stories);
        self
    }

    pub fn suggested_waste_percentage(&mut self, percent: f64) -> &mut Self {
        self.suggested_waste_percentage = Some(percent);
        self
    }

    pub fn property_address(&mut self, address: impl Into<String>) -> &mut Self {
        self.property_address = Some(address.into());
        self
    }

    /// Finish the record.
    ///
    /// # Errors
    ///
    /// `MissingRequiredField` when no total area was supplied.
    pub fn build(self) -> TakeoffResult<MeasurementRecord> {
        let total_area = self
            .total_area
            .ok_or_else(|| TakeoffError::missing_field("total area"))?;

        let drip_edge = match (
            self.linear_features.get(&LinearFeature::Rakes),
            self.linear_features.get(&LinearFeature::Eaves),
        ) {
            (Some(rakes), Some(eaves)) => Some(LengthWithCount {
                length: rakes.length + eaves.length,
                count: 1,
            }),
            _ => None,
        };

        Ok(MeasurementRecord {
            total_area,
            total_squares: total_area.into(),
            predominant_pitch: self.predominant_pitch,
            linear_features: self.linear_features,
            drip_edge,
            areas_per_pitch: self.areas_per_pitch,
            penetrations_area: self.penetrations_area,
            penetrations_perimeter: self.penetrations_perimeter,
            total_penetrations: self.total_penetrations,
            total_facets: self.total_facets,
            number_of_stories: self.number_of_stories,
            suggested_waste_percentage: self.suggested_waste_percentage,
            property_address: self.property_address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn length(ft: f64, count: u32) -> LengthWithCount {
        LengthWithCount::new(Feet(ft), count).unwrap()
    }

    #[test]
    fn test_build_requires_total_area() {
        let mut builder = MeasurementBuilder::new();
        builder.feature(LinearFeature::Ridges, length(80.0, 3));
        let err = builder.build().unwrap_err();
        assert_eq!(err, TakeoffError::missing_field("total area"));
    }

    #[test]
    fn test_total_squares_recomputed() {
        let mut builder = MeasurementBuilder::new();
        builder.total_area(SqFt(3175.0));
        let record = builder.build().unwrap();
        assert_eq!(record.total_squares.0, 3175.0 / 100.0);
    }

    #[test]
    fn test_drip_edge_needs_rakes_and_eaves() {
        let mut only_eaves = MeasurementBuilder::new();
        only_eaves
            .total_area(SqFt(1000.0))
            .feature(LinearFeature::Eaves, length(150.0, 2));
        assert!(only_eaves.build().unwrap().drip_edge.is_none());

        let mut both = MeasurementBuilder::new();
        both.total_area(SqFt(1000.0))
            .feature(LinearFeature::Eaves, length(150.0, 2))
            .feature(LinearFeature::Rakes, length(60.5, 4));
        let drip = both.build().unwrap().drip_edge.unwrap();
        assert_eq!(drip.length.0, 210.5);
        assert_eq!(drip.count, 1);
    }

    #[test]
    fn test_count_bounds() {
        assert!(LengthWithCount::new(Feet(10.0), 0).is_err());
        assert!(LengthWithCount::new(Feet(10.0), 100).is_err());
        assert!(LengthWithCount::new(Feet(-1.0), 1).is_err());
        assert!(LengthWithCount::new(Feet(10.0), 99).is_ok());
    }

    #[test]
    fn test_absent_features_are_not_serialized_as_zero() {
        let mut builder = MeasurementBuilder::new();
        builder
            .total_area(SqFt(2450.0))
            .feature(LinearFeature::StepFlashing, length(24.0, 2));
        let record = builder.build().unwrap();

        let json = serde_json::to_value(&record).unwrap();
        let features = json["linear_features"].as_object().unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features["step_flashing"]["count"], 2);
        assert!(json.get("drip_edge").is_none());
        assert_eq!(json["total_squares"], 24.5);
    }

    #[test]
    fn test_total_linear_length() {
        let mut builder = MeasurementBuilder::new();
        builder
            .total_area(SqFt(2000.0))
            .feature(LinearFeature::Ridges, length(40.0, 1))
            .feature(LinearFeature::Hips, length(60.0, 4));
        let record = builder.build().unwrap();
        assert_eq!(record.total_linear_length().0, 100.0);
        assert_eq!(record.feature_length(LinearFeature::Valleys).0, 0.0);
    }
}
