//! # Table-Based Extractor
//!
//! Reads the per-pitch area breakdown from a detected table. This is the
//! primary source for `areas_per_pitch`; when it yields nothing the pipeline
//! falls back to [`super::text`].
//!
//! Merged and split cells are common in vendor tables, so a row is judged
//! only by what it contains: a pitch token somewhere, then at least two
//! numeric cells (area first, percentage second). Empty or label cells in
//! between are ignored.

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::document::Table;
use crate::measurements::PitchArea;
use crate::units::SqFt;

use super::patterns::{normalize_pitch, parse_number, PITCH_SECTION_MARKER, PITCH_TOKEN};

/// The first table that looks like a per-pitch breakdown.
pub fn find_pitch_table(tables: &[Table]) -> Option<&Table> {
    tables.iter().find(|table| {
        PITCH_SECTION_MARKER.is_match(&table.concatenated_text()) || table.cells().any(|c| PITCH_TOKEN.is_match(c))
    })
}

/// Extract pitch areas from the candidate table, in row order.
///
/// Returns an empty vector when no table qualifies.
pub fn extract_pitch_areas(tables: &[Table], sink: &mut dyn DiagnosticSink) -> Vec<PitchArea> {
    let Some(table) = find_pitch_table(tables) else {
        log::debug!("No per-pitch table among {} detected tables", tables.len());
        return Vec::new();
    };

    let mut areas = Vec::new();
    for (i, row) in table.rows.iter().enumerate() {
        match read_row(row) {
            Ok(Some(area)) => areas.push(area),
            Ok(None) => {}
            Err(reason) => {
                log::debug!("Pitch table on page {}: {}", table.page, table.concatenated_text());
                sink.report(Diagnostic::RowSkipped {
                    page: table.page,
                    row: i + 1,
                    cells: row.clone(),
                    reason,
                });
            }
        }
    }

    log::debug!("Table on page {} yielded {} pitch rows", table.page, areas.len());
    areas
}

/// `Ok(None)` for rows that are not pitch rows or are missing cells;
/// `Err` for rows that are pitch rows but hold unusable values.
fn read_row(row: &[String]) -> Result<Option<PitchArea>, String> {
    let Some(pitch) = row.iter().find_map(|cell| PITCH_TOKEN.find(cell)) else {
        return Ok(None);
    };

    let numbers: Vec<f64> = row.iter().filter_map(|cell| numeric_cell(cell)).collect();
    let &[area, percentage, ..] = numbers.as_slice() else {
        return Ok(None);
    };

    if area < 0.0 {
        return Err(format!("negative area {}", area));
    }
    let percentage = percentage.trunc();
    if !(0.0..=100.0).contains(&percentage) {
        return Err(format!("percentage {} outside 0-100", percentage));
    }

    Ok(Some(PitchArea {
        pitch: normalize_pitch(pitch.as_str()),
        area: SqFt(area),
        percentage,
    }))
}

/// A cell that is a pure number once thousands separators and a trailing
/// `%` are removed.
fn numeric_cell(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
    let is_numeric = !trimmed.is_empty()
        && trimmed
            .chars()
            .enumerate()
            .all(|(i, c)| c.is_ascii_digit() || c == ',' || c == '.' || (i == 0 && c == '-'));
    if !is_numeric {
        return None;
    }
    parse_number(trimmed).ok()
}
