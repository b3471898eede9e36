//! # takeoff_core - Roof Measurement Extraction and Estimating Engine
//!
//! `takeoff_core` reads aerial-survey roof measurement reports (PDF or plain
//! text) and turns them into a normalized [`MeasurementRecord`]: total area,
//! pitch breakdown, and the linear features (ridges, hips, valleys, rakes,
//! eaves, flashing) with their segment counts. The record can then be priced
//! and rendered as a PDF estimate.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: every call is independent; the compiled pattern registry
//!   is the only shared state and it is immutable
//! - **JSON-First**: records, estimates and errors all implement Serialize/Deserialize
//! - **Rich Errors**: structured error types, plus non-fatal [`diagnostics`]
//!   delivered to a caller-supplied sink
//! - **Format drift tolerant**: table extraction first, text patterns as fallback
//!
//! ## Quick Start
//!
//! ```rust
//! use takeoff_core::diagnostics::Diagnostics;
//! use takeoff_core::extraction::extract_from_text;
//! use takeoff_core::measurements::LinearFeature;
//!
//! let report = "Total Area = 2,450 sq ft\n\
//!               Predominant Pitch = 6/12\n\
//!               Ridges = 80 ft (3 Ridges)\n\
//!               Eaves = 150 ft\n\
//!               Rakes = 60 ft\n";
//!
//! let mut sink = Diagnostics::default();
//! let record = extract_from_text(report, &mut sink).unwrap().record;
//!
//! assert_eq!(record.total_squares.0, 24.5);
//! assert_eq!(record.feature(LinearFeature::Ridges).unwrap().count, 3);
//! assert_eq!(record.drip_edge.unwrap().length.0, 210.0);
//! ```
//!
//! ## Modules
//!
//! - [`document`] - Document access (PDF text and table detection)
//! - [`extraction`] - The measurement extraction pipeline
//! - [`measurements`] - The measurement record and its builder
//! - [`pricing`] / [`estimate`] - Pricing configuration and cost breakdown
//! - [`pdf`] - Estimate report rendering
//! - [`config`] / [`file_io`] - TOML configuration and atomic file writes
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] / [`diagnostics`] - Fatal errors and non-fatal reports

pub mod config;
pub mod diagnostics;
pub mod document;
pub mod errors;
pub mod estimate;
pub mod extraction;
#[cfg(not(target_arch = "wasm32"))]
pub mod fetch;
pub mod file_io;
pub mod measurements;
pub mod pdf;
pub mod pricing;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use config::{load_config, TakeoffConfig};
pub use diagnostics::{Diagnostic, DiagnosticSink, Diagnostics, LogSink};
pub use errors::{TakeoffError, TakeoffResult};
pub use estimate::{calculate_estimate, CostBreakdown};
pub use extraction::{extract_from_bytes, extract_measurements, ExtractOptions, Extraction, PitchSource};
pub use measurements::{LengthWithCount, LinearFeature, MeasurementRecord, PitchArea};
pub use pdf::{render_estimate_pdf, ReportInfo};
pub use pricing::PricingConfig;
