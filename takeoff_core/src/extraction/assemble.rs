//! Turns raw field strings into a [`MeasurementRecord`].

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::errors::{TakeoffError, TakeoffResult};
use crate::measurements::{LengthWithCount, LinearFeature, MeasurementBuilder, MeasurementRecord, PitchArea};
use crate::units::{Feet, SqFt};

use super::counts::{infer_count, CountRule};
use super::patterns::{normalize_pitch, parse_number, Field};
use super::text::TextFields;

/// Assemble the record from scalar fields, the chosen pitch breakdown, and
/// the full text (for count inference).
pub(super) fn assemble(
    text: &str,
    fields: &TextFields,
    areas_per_pitch: Vec<PitchArea>,
    sink: &mut dyn DiagnosticSink,
) -> TakeoffResult<MeasurementRecord> {
    let mut builder = MeasurementBuilder::new();
    let mut reader = FieldReader { fields, sink };

    match reader.number(Field::TotalArea) {
        Some(area) => builder.total_area(SqFt(area)),
        None => return Err(TakeoffError::missing_field("total area")),
    };

    if let Some(pitch) = fields.get(Field::PredominantPitch) {
        builder.predominant_pitch(normalize_pitch(pitch));
    }

    for feature in LinearFeature::ALL {
        let Some(length) = reader.number(Field::for_feature(feature)) else {
            continue;
        };
        let inferred = infer_count(text, feature.label(), length);
        if inferred.rule == CountRule::Default {
            log::debug!("{}: no count found, assuming 1", feature);
        } else {
            log::debug!("{}: count {} from {:?}", feature, inferred.count, inferred.rule);
        }
        match LengthWithCount::new(Feet(length), inferred.count) {
            Ok(value) => {
                builder.feature(feature, value);
            }
            Err(e) => reader.warn(Field::for_feature(feature), &length.to_string(), e.to_string()),
        }
    }

    if let Some(area) = reader.number(Field::PenetrationsArea) {
        builder.penetrations_area(SqFt(area));
    }
    if let Some(perimeter) = reader.number(Field::PenetrationsPerimeter) {
        builder.penetrations_perimeter(Feet(perimeter));
    }
    if let Some(count) = reader.integer(Field::TotalPenetrations) {
        builder.total_penetrations(count);
    }
    if let Some(count) = reader.integer(Field::TotalFacets) {
        builder.total_facets(count);
    }
    if let Some(stories) = reader.integer(Field::NumberOfStories) {
        builder.number_of_stories(stories);
    }
    if let Some(waste) = reader.number(Field::SuggestedWaste) {
        builder.suggested_waste_percentage(waste);
    }
    if let Some(address) = fields.get(Field::PropertyAddress) {
        builder.property_address(address);
    }

    builder.areas_per_pitch(areas_per_pitch);
    builder.build()
}

/// Parses field values, reporting failures as warnings.
struct FieldReader<'a> {
    fields: &'a TextFields,
    sink: &'a mut dyn DiagnosticSink,
}

impl FieldReader<'_> {
    fn number(&mut self, field: Field) -> Option<f64> {
        let raw = self.fields.get(field)?;
        match parse_number(raw) {
            Ok(value) if value >= 0.0 => Some(value),
            Ok(value) => {
                self.warn(field, raw, format!("negative value {}", value));
                None
            }
            Err(reason) => {
                self.warn(field, raw, reason);
                None
            }
        }
    }

    fn integer(&mut self, field: Field) -> Option<u32> {
        let raw = self.fields.get(field)?;
        match raw.parse::<u32>() {
            Ok(value) => Some(value),
            Err(e) => {
                self.warn(field, raw, e.to_string());
                None
            }
        }
    }

    fn warn(&mut self, field: Field, raw: &str, reason: impl Into<String>) {
        self.sink.report(Diagnostic::field_parse(field.key(), raw, reason));
    }
}
