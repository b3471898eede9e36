//! # Text Fallback Extractor
//!
//! Runs the [`patterns`](super::patterns) registry over the flattened
//! document text. Its scalar fields are always used; its per-pitch rows
//! only when the table extractor found none.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::measurements::PitchArea;
use crate::units::SqFt;

use super::patterns::{normalize_pitch, parse_number, registry, Field, PITCH_SECTION_MARKER, PITCH_TOKEN};

/// One row of the per-pitch section: pitch, area, percentage
static PITCH_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?P<pitch>\b\d{1,2}\s*/\s*\d{1,2})\b\s*(?:pitch\b)?\s*[=:]?\s*(?P<area>\d[\d,]*(?:\.\d+)?)\s*(?:sq\.?\s*ft\.?|sqft|sf)?\s*[(,]?\s*(?P<pct>\d+(?:\.\d+)?)\s*%\)?",
    )
    .expect("valid pitch row pattern")
});

/// Headings that close the per-pitch section
static NEXT_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:Waste\s+Calculation|Structure\s+Complexity|Lengths,?\s+Areas|Report\s+Summary|Property\s+Details|All\s+Structures|Penetrations\s+Notes)\b",
    )
    .expect("valid section heading pattern")
});

/// Closes the section, but only once its first pitch has been seen
static BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").expect("valid blank line pattern"));

/// Label of the area line in a columnar pitch table
static AREA_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:Roof\s+)?Areas?\b").expect("valid area line pattern"));

static COLUMN_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("valid column number pattern"));

static COLUMN_PERCENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*%").expect("valid column percent pattern"));

/// Raw field values found in the text, keyed by field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextFields {
    values: BTreeMap<Field, String>,
}

impl TextFields {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Apply every registry rule once; first match wins, misses are absent.
pub fn extract_fields(text: &str) -> TextFields {
    let values = registry()
        .iter()
        .filter_map(|rule| rule.find(text).map(|value| (rule.field, value.to_string())))
        .collect::<BTreeMap<_, _>>();

    log::debug!("Text rules matched {} of {} fields", values.len(), registry().len());

    TextFields { values }
}

/// The per-pitch section: from its header to the next heading, a blank
/// line after the first pitch, or the end of the text.
pub fn pitch_section(text: &str) -> Option<&str> {
    let header = PITCH_SECTION_MARKER.find(text)?;
    let rest = &text[header.end()..];
    let heading = NEXT_HEADING.find(rest).map_or(rest.len(), |m| m.start());

    // Extraction often leaves blank lines between the header and its rows
    let blank = PITCH_TOKEN
        .find(&rest[..heading])
        .and_then(|pitch| BLANK_LINE.find_at(rest, pitch.start()))
        .map(|m| m.start());

    let end = blank.map_or(heading, |blank| blank.min(heading));
    Some(&rest[..end])
}

/// Pitch rows from the per-pitch section, left to right. Inline rows
/// (`6/12 = 1,200 sq ft (49%)`) are read first; when there are none the
/// section is read as columns (a line of pitches, one of areas, one of
/// percentages).
pub fn extract_pitch_areas(text: &str, sink: &mut dyn DiagnosticSink) -> Vec<PitchArea> {
    let Some(section) = pitch_section(text) else {
        return Vec::new();
    };

    let mut areas: Vec<PitchArea> = PITCH_ROW
        .captures_iter(section)
        .filter_map(|caps| pitch_area(&caps["pitch"], &caps["area"], &caps["pct"], &caps[0], sink))
        .collect();

    if areas.is_empty() {
        areas = columnar_rows(section, sink);
        if !areas.is_empty() {
            log::debug!("Read per-pitch section as columns");
        }
    }

    log::debug!("Text section yielded {} pitch rows", areas.len());
    areas
}

fn columnar_rows(section: &str, sink: &mut dyn DiagnosticSink) -> Vec<PitchArea> {
    let mut lines = section.lines();
    let Some(pitch_line) = lines.by_ref().find(|line| PITCH_TOKEN.is_match(line)) else {
        return Vec::new();
    };
    let Some(area_line) = lines.by_ref().find(|line| AREA_LINE.is_match(line)) else {
        return Vec::new();
    };
    let Some(percent_line) = lines.find(|line| COLUMN_PERCENT.is_match(line)) else {
        return Vec::new();
    };

    let pitches: Vec<&str> = PITCH_TOKEN.find_iter(pitch_line).map(|m| m.as_str()).collect();
    let areas: Vec<&str> = COLUMN_NUMBER.find_iter(area_line).map(|m| m.as_str()).collect();
    let percentages: Vec<&str> = COLUMN_PERCENT
        .captures_iter(percent_line)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();

    let raw = format!("{} | {} | {}", pitch_line.trim(), area_line.trim(), percent_line.trim());
    if areas.len() != pitches.len() || percentages.len() != pitches.len() {
        sink.report(Diagnostic::field_parse(
            "areas_per_pitch",
            raw,
            format!(
                "{} pitches, {} areas and {} percentages do not line up",
                pitches.len(),
                areas.len(),
                percentages.len()
            ),
        ));
        return Vec::new();
    }

    pitches
        .into_iter()
        .zip(areas)
        .zip(percentages)
        .filter_map(|((pitch, area), pct)| pitch_area(pitch, area, pct, &raw, sink))
        .collect()
}

/// Parse one pitch row, reporting rejects as warnings.
fn pitch_area(pitch: &str, area: &str, pct: &str, raw: &str, sink: &mut dyn DiagnosticSink) -> Option<PitchArea> {
    match (parse_number(area), parse_number(pct)) {
        (Ok(area), Ok(percentage)) if (0.0..=100.0).contains(&percentage) => Some(PitchArea {
            pitch: normalize_pitch(pitch),
            area: SqFt(area),
            percentage,
        }),
        (Ok(_), Ok(percentage)) => {
            sink.report(Diagnostic::field_parse(
                "areas_per_pitch",
                raw,
                format!("percentage {} outside 0-100", percentage),
            ));
            None
        }
        (Err(reason), _) | (_, Err(reason)) => {
            sink.report(Diagnostic::field_parse("areas_per_pitch", raw, reason));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;

    const REPORT: &str = "Report Summary\n\
        Total Area (All Pitches) = 2,450 sq ft\n\
        Predominant Pitch = 6/12\n\
        Areas per Pitch\n\
        6/12 = 1,200 sq ft (49%)\n\
        8/12 = 1,250 sq ft (51%)\n\
        \n\
        Ridges = 80 ft (3 Ridges)\n\
        Eaves = 150 ft\n";

    #[test]
    fn test_scalar_fields() {
        let fields = extract_fields(REPORT);
        assert_eq!(fields.get(Field::TotalArea), Some("2,450"));
        assert_eq!(fields.get(Field::PredominantPitch), Some("6/12"));
        assert_eq!(fields.get(Field::Ridges), Some("80"));
        assert_eq!(fields.get(Field::Eaves), Some("150"));
        assert_eq!(fields.get(Field::Rakes), None);
    }

    #[test]
    fn test_pitch_section_stops_at_blank_line() {
        let section = pitch_section(REPORT).unwrap();
        assert!(section.contains("8/12"));
        assert!(!section.contains("Ridges"));
    }

    #[test]
    fn test_pitch_rows() {
        let areas = extract_pitch_areas(REPORT, &mut Diagnostics::default());
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0].pitch, "6/12");
        assert_eq!(areas[0].area.0, 1200.0);
        assert_eq!(areas[1].percentage, 51.0);
    }

    #[test]
    fn test_pitch_section_to_end_of_text() {
        let text = "Areas per Pitch 4/12 300 20% 10/12: 1,200.5 sq ft, 80.0%";
        let areas = extract_pitch_areas(text, &mut Diagnostics::default());
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[1].pitch, "10/12");
        assert_eq!(areas[1].area.0, 1200.5);
        assert_eq!(areas[1].percentage, 80.0);
    }

    #[test]
    fn test_no_section_marker() {
        let text = "6/12 = 1,200 sq ft (49%)";
        assert!(pitch_section(text).is_none());
        assert!(extract_pitch_areas(text, &mut Diagnostics::default()).is_empty());
    }

    #[test]
    fn test_out_of_range_percentage_warns() {
        let text = "Areas per Pitch\n6/12 = 1,200 sq ft (149%)\n";
        let mut sink = Diagnostics::default();
        assert!(extract_pitch_areas(text, &mut sink).is_empty());
        assert_eq!(sink.warnings().count(), 1);
    }

    #[test]
    fn test_blank_line_after_header() {
        let text = "Total Area = 2,450 sq ft\nAreas per Pitch\n\n6/12 = 1,200 sq ft (49%)\n8/12 = 1,250 sq ft (51%)\n";
        let areas = extract_pitch_areas(text, &mut Diagnostics::default());
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[1].pitch, "8/12");
    }

    #[test]
    fn test_columnar_section() {
        let text = "Areas per Pitch\n\
                    Roof Pitches 4/12 6/12\n\
                    Area (sq ft) 300.0 1,200.0\n\
                    % of Roof 20% 80%\n\
                    Structure Complexity Simple";
        let mut sink = Diagnostics::default();
        let areas = extract_pitch_areas(text, &mut sink);

        assert_eq!(
            areas,
            vec![
                PitchArea {
                    pitch: "4/12".to_string(),
                    area: SqFt(300.0),
                    percentage: 20.0,
                },
                PitchArea {
                    pitch: "6/12".to_string(),
                    area: SqFt(1200.0),
                    percentage: 80.0,
                },
            ]
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn test_misaligned_columns_warn() {
        let text = "Areas per Pitch\nRoof Pitches 4/12 6/12\nArea (sq ft) 300.0\n% of Roof 20% 80%\n";
        let mut sink = Diagnostics::default();
        assert!(extract_pitch_areas(text, &mut sink).is_empty());
        assert_eq!(sink.warnings().count(), 1);
    }
}
