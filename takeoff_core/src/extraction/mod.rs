//! # Measurement Extraction Pipeline
//!
//! Two-stage extraction of a [`MeasurementRecord`] from a [`DocumentSource`]:
//!
//! 1. **Table stage** ([`table`]): the per-pitch breakdown from a detected
//!    table on the selected pages.
//! 2. **Text stage** ([`text`]): every scalar field from the flattened text,
//!    plus the per-pitch breakdown when the table stage found none.
//!
//! Segment counts come from [`counts`] and the record is assembled through
//! [`MeasurementBuilder`](crate::measurements::MeasurementBuilder). The
//! outcome records which stage supplied the breakdown ([`PitchSource`]).
//!
//! Only `UnreadableDocument` and `MissingRequiredField` stop extraction.
//! Everything else (bad rows, bad values, table detection failing) is
//! reported to the [`DiagnosticSink`] and the pipeline carries on.
//!
//! ## Usage
//!
//! ```rust
//! use takeoff_core::diagnostics::Diagnostics;
//! use takeoff_core::extraction::{extract_from_text, PitchSource};
//!
//! let text = "Total Area = 2,450 sq ft\nRidges = 80 ft (3 Ridges)";
//! let mut sink = Diagnostics::default();
//! let extraction = extract_from_text(text, &mut sink).unwrap();
//!
//! assert_eq!(extraction.record.total_squares.0, 24.5);
//! assert_eq!(extraction.pitch_source, PitchSource::Absent);
//! ```

mod assemble;
pub mod counts;
pub mod patterns;
pub mod table;
pub mod text;

use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::document::{DocumentSource, PageSelector, PdfDocument, TextDocument};
use crate::errors::{TakeoffError, TakeoffResult};
use crate::measurements::{MeasurementRecord, PitchArea};

/// Extraction settings, the `[extraction]` table of the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Pages searched for the per-pitch table (1-based)
    pub table_pages: PageSelector,
}

/// Which stage supplied `areas_per_pitch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PitchSource {
    Table,
    Text,
    Absent,
}

/// A per-pitch breakdown tagged with its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchBreakdown {
    pub source: PitchSource,
    pub areas: Vec<PitchArea>,
}

/// The pipeline's result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub record: MeasurementRecord,
    pub pitch_source: PitchSource,
}

/// Run the full pipeline over a document.
///
/// # Errors
///
/// - `UnreadableDocument` when the document has no text at all
/// - `MissingRequiredField` when no usable total area was found
pub fn extract_measurements(
    doc: &dyn DocumentSource,
    options: &ExtractOptions,
    sink: &mut dyn DiagnosticSink,
) -> TakeoffResult<Extraction> {
    let text = doc.full_text();
    if text.trim().is_empty() {
        return Err(TakeoffError::unreadable_document(format!(
            "No text found in {} page(s); image-only documents are not supported",
            doc.page_count()
        )));
    }

    let fields = text::extract_fields(&text);
    if fields.is_empty() {
        log::warn!("No report fields recognized in {} page(s) of text", doc.page_count());
    }
    let breakdown = pitch_breakdown(doc, &text, options, sink);
    log::info!(
        "Extracted {} fields, {} pitch rows from {:?}",
        fields.len(),
        breakdown.areas.len(),
        breakdown.source
    );

    let record = assemble::assemble(&text, &fields, breakdown.areas, sink)?;
    Ok(Extraction {
        record,
        pitch_source: breakdown.source,
    })
}

/// Table stage first, text stage only when the table stage found nothing.
pub fn pitch_breakdown(
    doc: &dyn DocumentSource,
    text: &str,
    options: &ExtractOptions,
    sink: &mut dyn DiagnosticSink,
) -> PitchBreakdown {
    let tables = match doc.tables(&options.table_pages) {
        Ok(tables) => tables,
        Err(e) => {
            sink.report(Diagnostic::degradation(format!("Table detection failed: {}", e)));
            Vec::new()
        }
    };

    let areas = table::extract_pitch_areas(&tables, sink);
    if !areas.is_empty() {
        return PitchBreakdown {
            source: PitchSource::Table,
            areas,
        };
    }

    sink.report(Diagnostic::degradation(format!(
        "No per-pitch table on pages {}; using text fallback",
        options.table_pages
    )));

    let areas = text::extract_pitch_areas(text, sink);
    let source = if areas.is_empty() {
        PitchSource::Absent
    } else {
        PitchSource::Text
    };
    PitchBreakdown { source, areas }
}

/// Extract from raw PDF bytes.
pub fn extract_from_bytes(
    bytes: &[u8],
    options: &ExtractOptions,
    sink: &mut dyn DiagnosticSink,
) -> TakeoffResult<Extraction> {
    let doc = PdfDocument::load(bytes)?;
    extract_measurements(&doc, options, sink)
}

/// Extract from plain text (a single page, no tables).
pub fn extract_from_text(text: &str, sink: &mut dyn DiagnosticSink) -> TakeoffResult<Extraction> {
    let doc = TextDocument::from_text(text);
    extract_measurements(&doc, &ExtractOptions::default(), sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::document::Table;
    use crate::measurements::LinearFeature;

    struct BrokenTables(TextDocument);

    impl DocumentSource for BrokenTables {
        fn page_count(&self) -> usize {
            self.0.page_count()
        }

        fn page_text(&self, page_index: usize) -> String {
            self.0.page_text(page_index)
        }

        fn tables(&self, _selector: &PageSelector) -> TakeoffResult<Vec<Table>> {
            Err(TakeoffError::unreadable_document("table model unavailable"))
        }
    }

    #[test]
    fn test_blank_document_is_unreadable() {
        let doc = TextDocument::new(vec!["   ".to_string(), String::new()]);
        let err = extract_measurements(&doc, &ExtractOptions::default(), &mut Diagnostics::default()).unwrap_err();
        assert_eq!(err.error_code(), "UNREADABLE_DOCUMENT");
    }

    #[test]
    fn test_table_wins_over_text() {
        let text = "Total Area = 1,000\nAreas per Pitch\n4/12 = 1,000 sq ft (100%)\n";
        let doc = TextDocument::from_text(text).with_table(Table::from_rows(1, &[&["6/12", "1000", "100"]]));
        let extraction = extract_measurements(&doc, &ExtractOptions::default(), &mut Diagnostics::default()).unwrap();

        assert_eq!(extraction.pitch_source, PitchSource::Table);
        assert_eq!(extraction.record.areas_per_pitch[0].pitch, "6/12");
    }

    #[test]
    fn test_table_failure_degrades_to_text() {
        let text = "Total Area = 1,000\nAreas per Pitch\n4/12 = 1,000 sq ft (100%)\n";
        let doc = BrokenTables(TextDocument::from_text(text));
        let mut sink = Diagnostics::default();
        let extraction = extract_measurements(&doc, &ExtractOptions::default(), &mut sink).unwrap();

        assert_eq!(extraction.pitch_source, PitchSource::Text);
        assert_eq!(extraction.record.areas_per_pitch.len(), 1);
        assert!(sink
            .entries
            .iter()
            .any(|d| matches!(d, Diagnostic::ExtractorDegradation { reason } if reason.contains("table model"))));
    }

    #[test]
    fn test_page_selector_limits_table_search() {
        let doc = TextDocument::new(vec!["Total Area = 500".to_string(), "page two".to_string()])
            .with_table(Table::from_rows(2, &[&["6/12", "500", "100"]]));
        let options = ExtractOptions {
            table_pages: PageSelector::Pages(vec![1]),
        };
        let extraction = extract_measurements(&doc, &options, &mut Diagnostics::default()).unwrap();
        assert_eq!(extraction.pitch_source, PitchSource::Absent);
        assert!(extraction.record.areas_per_pitch.is_empty());
    }

    #[test]
    fn test_unparseable_total_area_is_missing() {
        let mut sink = Diagnostics::default();
        let text = format!("Total Area = {} sq ft", "9".repeat(400));
        let err = extract_from_text(&text, &mut sink).unwrap_err();
        assert_eq!(err, TakeoffError::missing_field("total area"));
        assert_eq!(sink.warnings().count(), 1);
    }

    #[test]
    fn test_counts_attached_to_features() {
        let text = "Total Area = 2,000\nHips = 64 ft (4 Hips)\nValleys = 30 ft\n";
        let record = extract_from_text(text, &mut Diagnostics::default()).unwrap().record;
        assert_eq!(record.feature(LinearFeature::Hips).map(|f| f.count), Some(4));
        assert_eq!(record.feature(LinearFeature::Valleys).map(|f| f.count), Some(1));
        assert!(record.feature(LinearFeature::Ridges).is_none());
    }

    #[test]
    fn test_supplementary_fields() {
        let text = "Property Address: 12 Elm St\nTotal Area = 2,000\nTotal Roof Facets = 9\n\
                    Number of Stories: 2\nSuggested Waste: 12%\n";
        let record = extract_from_text(text, &mut Diagnostics::default()).unwrap().record;
        assert_eq!(record.property_address.as_deref(), Some("12 Elm St"));
        assert_eq!(record.total_facets, Some(9));
        assert_eq!(record.number_of_stories, Some(2));
        assert_eq!(record.suggested_waste_percentage, Some(12.0));
    }
}
