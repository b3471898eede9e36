//! # Cost Estimate
//!
//! Material and labor quantities priced from a [`MeasurementRecord`]. Pure
//! arithmetic: no rounding of money, quantities of sold units are rounded
//! up to whole units.
//!
//! ## Quantities
//!
//! - Squares with waste = `total_squares × (1 + waste)`
//! - Shingles: whole squares
//! - Underlayment: squares / roll coverage
//! - Ice and water shield: eaves + valleys, per roll length
//! - Starter strip: eaves + rakes, per box length
//! - Ridge caps: ridges + hips, per bundle length
//! - Drip edge: drip edge length, per piece length
//!
//! Edge-based lines are left out when none of their edges were measured.
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::estimate::calculate_estimate;
//! use takeoff_core::measurements::MeasurementBuilder;
//! use takeoff_core::pricing::PricingConfig;
//! use takeoff_core::units::SqFt;
//!
//! let mut builder = MeasurementBuilder::new();
//! builder.total_area(SqFt(2000.0)).predominant_pitch("6/12");
//! let record = builder.build().unwrap();
//!
//! let cost = calculate_estimate(&record, &PricingConfig::default()).unwrap();
//! assert_eq!(cost.materials[0].quantity, 22.0); // 20 squares + 10% waste
//! assert!((cost.materials_subtotal + cost.labor_subtotal - cost.total).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::TakeoffResult;
use crate::measurements::{LinearFeature, MeasurementRecord};
use crate::pricing::PricingConfig;
use crate::units::{Feet, Pitch, SqFt, Squares};

/// Priced material items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    Shingles,
    Underlayment,
    IceAndWater,
    StarterStrip,
    RidgeCaps,
    DripEdge,
}

impl Material {
    pub fn display_name(&self) -> &'static str {
        match self {
            Material::Shingles => "Shingles",
            Material::Underlayment => "Underlayment",
            Material::IceAndWater => "Ice & Water Shield",
            Material::StarterStrip => "Starter Strip",
            Material::RidgeCaps => "Ridge Caps",
            Material::DripEdge => "Drip Edge",
        }
    }

    /// Sold unit
    pub fn unit(&self) -> &'static str {
        match self {
            Material::Shingles => "square",
            Material::Underlayment | Material::IceAndWater => "roll",
            Material::StarterStrip => "box",
            Material::RidgeCaps => "bundle",
            Material::DripEdge => "piece",
        }
    }
}

/// One material row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialLine {
    pub material: Material,
    /// Whole units to order
    pub quantity: f64,
    pub unit_price: f64,
    pub total: f64,
}

/// Labor for one pitch area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaborLine {
    pub pitch: String,
    /// Squares including waste
    pub squares: f64,
    pub rate: f64,
    pub total: f64,
}

/// Complete priced estimate.
///
/// ## JSON Example
///
/// ```json
/// {
///   "waste_factor": 0.1,
///   "squares_with_waste": 26.95,
///   "materials": [
///     { "material": "shingles", "quantity": 27.0, "unit_price": 152.1, "total": 4106.7 }
///   ],
///   "labor": [
///     { "pitch": "6/12", "squares": 26.95, "rate": 100.0, "total": 2695.0 }
///   ],
///   "materials_subtotal": 4106.7,
///   "labor_subtotal": 2695.0,
///   "total": 6801.7
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub waste_factor: f64,
    pub squares_with_waste: f64,
    pub materials: Vec<MaterialLine>,
    pub labor: Vec<LaborLine>,
    pub materials_subtotal: f64,
    pub labor_subtotal: f64,
    pub total: f64,
}

impl CostBreakdown {
    pub fn material(&self, material: Material) -> Option<&MaterialLine> {
        self.materials.iter().find(|line| line.material == material)
    }
}

/// Price a measurement record.
///
/// # Errors
///
/// `InvalidInput` when the pricing configuration fails validation.
pub fn calculate_estimate(record: &MeasurementRecord, pricing: &PricingConfig) -> TakeoffResult<CostBreakdown> {
    pricing.validate()?;

    let waste_factor = pricing.waste_for(record.total_linear_length());
    let squares_with_waste = record.total_squares.value() * (1.0 + waste_factor);

    let materials = material_lines(record, pricing, squares_with_waste);
    let labor = labor_lines(record, pricing, waste_factor);

    let materials_subtotal: f64 = materials.iter().map(|line| line.total).sum();
    let labor_subtotal: f64 = labor.iter().map(|line| line.total).sum();

    log::debug!(
        "Estimate: {:.2} squares with {:.1}% waste, materials {:.2}, labor {:.2}",
        squares_with_waste,
        waste_factor * 100.0,
        materials_subtotal,
        labor_subtotal
    );

    Ok(CostBreakdown {
        waste_factor,
        squares_with_waste,
        materials,
        labor,
        materials_subtotal,
        labor_subtotal,
        total: materials_subtotal + labor_subtotal,
    })
}

fn material_lines(record: &MeasurementRecord, pricing: &PricingConfig, squares: f64) -> Vec<MaterialLine> {
    let mut lines = vec![
        line(Material::Shingles, whole_units(squares, 1.0), pricing.shingles_per_square),
        line(
            Material::Underlayment,
            whole_units(squares, pricing.underlayment_squares_per_roll),
            pricing.underlayment_per_roll,
        ),
    ];

    let along = |features: &[LinearFeature]| -> Option<Feet> {
        let present: Vec<Feet> = features
            .iter()
            .filter_map(|f| record.feature(*f).map(|v| v.length))
            .collect();
        if present.is_empty() {
            None
        } else {
            Some(present.into_iter().fold(Feet(0.0), |acc, l| acc + l))
        }
    };

    let edge_lines = [
        (
            Material::IceAndWater,
            along(&[LinearFeature::Eaves, LinearFeature::Valleys]),
            pricing.ice_water_ft_per_roll,
            pricing.ice_water_per_roll,
        ),
        (
            Material::StarterStrip,
            along(&[LinearFeature::Eaves, LinearFeature::Rakes]),
            pricing.starter_ft_per_box,
            pricing.starter_per_box,
        ),
        (
            Material::RidgeCaps,
            along(&[LinearFeature::Ridges, LinearFeature::Hips]),
            pricing.ridge_cap_ft_per_bundle,
            pricing.ridge_cap_per_bundle,
        ),
        (
            Material::DripEdge,
            record.drip_edge.map(|d| d.length),
            pricing.drip_edge_ft_per_piece,
            pricing.drip_edge_per_piece,
        ),
    ];

    for (material, length, coverage, price) in edge_lines {
        if let Some(length) = length {
            lines.push(line(material, whole_units(length.value(), coverage), price));
        }
    }

    lines
}

fn labor_lines(record: &MeasurementRecord, pricing: &PricingConfig, waste_factor: f64) -> Vec<LaborLine> {
    let areas: Vec<(String, SqFt)> = if record.areas_per_pitch.is_empty() {
        let pitch = record
            .predominant_pitch
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        vec![(pitch, record.total_area)]
    } else {
        record
            .areas_per_pitch
            .iter()
            .map(|area| (area.pitch.clone(), area.area))
            .collect()
    };

    areas
        .into_iter()
        .map(|(pitch, area)| {
            let rise = match pitch.parse::<Pitch>() {
                Ok(parsed) => parsed.rise_per_12(),
                Err(_) => {
                    log::warn!("Pitch '{}' not understood, pricing at base labor rate", pitch);
                    0.0
                }
            };
            let squares = Squares::from(area).value() * (1.0 + waste_factor);
            let rate = pricing.labor_rate(rise);
            LaborLine {
                pitch,
                squares,
                rate,
                total: squares * rate,
            }
        })
        .collect()
}

fn line(material: Material, quantity: f64, unit_price: f64) -> MaterialLine {
    MaterialLine {
        material,
        quantity,
        unit_price,
        total: quantity * unit_price,
    }
}

/// Whole units needed to cover `amount`; float noise below a millionth is ignored.
fn whole_units(amount: f64, per_unit: f64) -> f64 {
    let units = ((amount / per_unit) * 1e6).round() / 1e6;
    units.ceil().max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurements::{LengthWithCount, MeasurementBuilder, PitchArea};

    const EPSILON: f64 = 1e-6;

    fn scenario_a() -> MeasurementRecord {
        let mut builder = MeasurementBuilder::new();
        builder
            .total_area(SqFt(2450.0))
            .predominant_pitch("6/12")
            .feature(LinearFeature::Ridges, LengthWithCount::new(Feet(80.0), 3).unwrap())
            .feature(LinearFeature::Eaves, LengthWithCount::new(Feet(150.0), 1).unwrap())
            .feature(LinearFeature::Rakes, LengthWithCount::new(Feet(60.0), 1).unwrap());
        builder.build().unwrap()
    }

    #[test]
    fn test_material_quantities() {
        let cost = calculate_estimate(&scenario_a(), &PricingConfig::default()).unwrap();

        // 290 ft of edges -> 10% waste
        assert!((cost.waste_factor - 0.10).abs() < EPSILON);
        assert!((cost.squares_with_waste - 26.95).abs() < EPSILON);

        let quantity = |m| cost.material(m).map(|l| l.quantity);
        assert_eq!(quantity(Material::Shingles), Some(27.0));
        assert_eq!(quantity(Material::Underlayment), Some(3.0));
        assert_eq!(quantity(Material::IceAndWater), Some(3.0));
        assert_eq!(quantity(Material::StarterStrip), Some(2.0));
        assert_eq!(quantity(Material::RidgeCaps), Some(4.0));
        assert_eq!(quantity(Material::DripEdge), Some(21.0));

        let shingles = cost.material(Material::Shingles).unwrap();
        assert!((shingles.total - 27.0 * 152.10).abs() < EPSILON);
    }

    #[test]
    fn test_totals_add_up() {
        let cost = calculate_estimate(&scenario_a(), &PricingConfig::default()).unwrap();
        let materials: f64 = cost.materials.iter().map(|l| l.total).sum();
        assert!((cost.materials_subtotal - materials).abs() < EPSILON);
        assert!((cost.materials_subtotal + cost.labor_subtotal - cost.total).abs() < EPSILON);
    }

    #[test]
    fn test_labor_falls_back_to_predominant_pitch() {
        let cost = calculate_estimate(&scenario_a(), &PricingConfig::default()).unwrap();
        assert_eq!(cost.labor.len(), 1);
        assert_eq!(cost.labor[0].pitch, "6/12");
        assert_eq!(cost.labor[0].rate, 100.0);
        assert!((cost.labor[0].total - 2695.0).abs() < EPSILON);
    }

    #[test]
    fn test_labor_per_pitch_area_with_steep_rate() {
        let mut builder = MeasurementBuilder::new();
        builder.total_area(SqFt(2000.0)).areas_per_pitch(vec![
            PitchArea {
                pitch: "6/12".to_string(),
                area: SqFt(1000.0),
                percentage: 50.0,
            },
            PitchArea {
                pitch: "9/12".to_string(),
                area: SqFt(1000.0),
                percentage: 50.0,
            },
        ]);
        let record = builder.build().unwrap();
        let pricing = PricingConfig {
            waste_factor: Some(0.0),
            ..Default::default()
        };

        let cost = calculate_estimate(&record, &pricing).unwrap();
        assert_eq!(cost.labor.len(), 2);
        assert_eq!(cost.labor[0].rate, 100.0);
        assert_eq!(cost.labor[1].rate, 110.0);
        assert!((cost.labor_subtotal - 2100.0).abs() < EPSILON);
    }

    #[test]
    fn test_edge_lines_omitted_without_edges() {
        let mut builder = MeasurementBuilder::new();
        builder.total_area(SqFt(2000.0));
        let cost = calculate_estimate(&builder.build().unwrap(), &PricingConfig::default()).unwrap();

        assert_eq!(cost.materials.len(), 2);
        assert!(cost.material(Material::IceAndWater).is_none());
        assert!(cost.material(Material::DripEdge).is_none());
        assert_eq!(cost.labor[0].pitch, "unknown");
    }

    #[test]
    fn test_whole_units_ignores_float_noise() {
        // 20 * 1.1 is 22.000000000000004 in f64
        assert_eq!(whole_units(20.0 * 1.1, 1.0), 22.0);
        assert_eq!(whole_units(26.95, 10.0), 3.0);
        assert_eq!(whole_units(0.0, 25.0), 0.0);
    }

    #[test]
    fn test_invalid_pricing_is_rejected() {
        let pricing = PricingConfig {
            drip_edge_ft_per_piece: 0.0,
            ..Default::default()
        };
        let err = calculate_estimate(&scenario_a(), &pricing).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }
}
