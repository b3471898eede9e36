//! # Pricing Configuration
//!
//! Unit prices, coverage constants and labor rates used by
//! [`crate::estimate::calculate_estimate`]. Loaded from the `[pricing]` table
//! of the config file; every field has a default, so an empty table (or no
//! file) prices with the built-in list below.
//!
//! | Item | Unit | Default price | Coverage |
//! |------|------|---------------|----------|
//! | Shingles | square | 152.10 | 1 square |
//! | Underlayment | roll | 104.94 | 10 squares |
//! | Ice and water shield | roll | 117.50 | 66 ft |
//! | Starter strip | box | 63.25 | 120 ft |
//! | Ridge caps | bundle | 66.41 | 25 ft |
//! | Drip edge | piece | 7.50 | 10 ft |
//!
//! Labor is 100.00 per square, 110.00 at or above 8/12.

use serde::{Deserialize, Serialize};

use crate::errors::{TakeoffError, TakeoffResult};
use crate::units::Feet;

/// Waste added below this total linear length
const LOW_COMPLEXITY_FT: f64 = 500.0;
/// Waste added below this total linear length (and above the previous)
const MEDIUM_COMPLEXITY_FT: f64 = 1000.0;

/// Prices and coverage for one estimate.
///
/// ## TOML Example
///
/// ```toml
/// [pricing]
/// shingles_per_square = 152.10
/// labor_steep_per_square = 125.0
/// steep_threshold = 9
/// waste_factor = 0.12
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub shingles_per_square: f64,

    pub underlayment_per_roll: f64,
    pub underlayment_squares_per_roll: f64,

    pub ice_water_per_roll: f64,
    pub ice_water_ft_per_roll: f64,

    pub starter_per_box: f64,
    pub starter_ft_per_box: f64,

    pub ridge_cap_per_bundle: f64,
    pub ridge_cap_ft_per_bundle: f64,

    pub drip_edge_per_piece: f64,
    pub drip_edge_ft_per_piece: f64,

    /// Labor per square below the steep threshold
    pub labor_base_per_square: f64,
    /// Labor per square at or above the steep threshold
    pub labor_steep_per_square: f64,
    /// Rise (per 12 run) at which steep labor applies
    pub steep_threshold: f64,

    /// Fraction added to material squares (0.12 = 12%).
    /// When unset the waste policy picks one from roof complexity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waste_factor: Option<f64>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            shingles_per_square: 152.10,
            underlayment_per_roll: 104.94,
            underlayment_squares_per_roll: 10.0,
            ice_water_per_roll: 117.50,
            ice_water_ft_per_roll: 66.0,
            starter_per_box: 63.25,
            starter_ft_per_box: 120.0,
            ridge_cap_per_bundle: 66.41,
            ridge_cap_ft_per_bundle: 25.0,
            drip_edge_per_piece: 7.50,
            drip_edge_ft_per_piece: 10.0,
            labor_base_per_square: 100.0,
            labor_steep_per_square: 110.0,
            steep_threshold: 8.0,
            waste_factor: None,
        }
    }
}

impl PricingConfig {
    /// Validate prices and coverage.
    pub fn validate(&self) -> TakeoffResult<()> {
        let prices = [
            ("shingles_per_square", self.shingles_per_square),
            ("underlayment_per_roll", self.underlayment_per_roll),
            ("ice_water_per_roll", self.ice_water_per_roll),
            ("starter_per_box", self.starter_per_box),
            ("ridge_cap_per_bundle", self.ridge_cap_per_bundle),
            ("drip_edge_per_piece", self.drip_edge_per_piece),
            ("labor_base_per_square", self.labor_base_per_square),
            ("labor_steep_per_square", self.labor_steep_per_square),
        ];
        for (field, value) in prices {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(TakeoffError::invalid_input(
                    field,
                    value.to_string(),
                    "Price must be a non-negative number",
                ));
            }
        }

        let coverage = [
            ("underlayment_squares_per_roll", self.underlayment_squares_per_roll),
            ("ice_water_ft_per_roll", self.ice_water_ft_per_roll),
            ("starter_ft_per_box", self.starter_ft_per_box),
            ("ridge_cap_ft_per_bundle", self.ridge_cap_ft_per_bundle),
            ("drip_edge_ft_per_piece", self.drip_edge_ft_per_piece),
        ];
        for (field, value) in coverage {
            if !(value > 0.0) || !value.is_finite() {
                return Err(TakeoffError::invalid_input(
                    field,
                    value.to_string(),
                    "Coverage must be positive",
                ));
            }
        }

        if !(self.steep_threshold > 0.0) {
            return Err(TakeoffError::invalid_input(
                "steep_threshold",
                self.steep_threshold.to_string(),
                "Steep threshold must be a positive rise",
            ));
        }

        if let Some(waste) = self.waste_factor {
            if !(0.0..1.0).contains(&waste) {
                return Err(TakeoffError::invalid_input(
                    "waste_factor",
                    waste.to_string(),
                    "Waste factor is a fraction between 0 and 1 (0.12 = 12%)",
                ));
            }
        }

        Ok(())
    }

    /// The configured waste factor, or the policy value for a roof with
    /// this much total linear length.
    pub fn waste_for(&self, total_linear_length: Feet) -> f64 {
        self.waste_factor
            .unwrap_or_else(|| waste_policy(total_linear_length))
    }

    /// Labor rate per square for a pitch rise.
    pub fn labor_rate(&self, rise_per_12: f64) -> f64 {
        if rise_per_12 >= self.steep_threshold {
            self.labor_steep_per_square
        } else {
            self.labor_base_per_square
        }
    }
}

/// More ridges, hips and valleys mean more cut-off: 10% under 500 ft of
/// linear features, 12.5% under 1000 ft, 15% beyond.
pub fn waste_policy(total_linear_length: Feet) -> f64 {
    let length = total_linear_length.value();
    if length < LOW_COMPLEXITY_FT {
        0.10
    } else if length < MEDIUM_COMPLEXITY_FT {
        0.125
    } else {
        0.15
    }
}
