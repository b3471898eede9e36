//! PDF documents via `pdf-extract`.
//!
//! Text comes from pure-Rust extraction, one string per page. `pdf-extract`
//! has no table model, so tables are recovered from the text itself: runs
//! of consecutive lines whose fields are separated by wide gaps (two or more
//! spaces, or a tab) become a grid, one row per line.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{DocumentSource, PageSelector, Table};
use crate::errors::{TakeoffError, TakeoffResult};

/// Column gap inside a table line
static CELL_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\t+|\s{2,}").expect("valid cell gap pattern"));

/// Minimum consecutive multi-cell lines before a block counts as a table
const MIN_TABLE_ROWS: usize = 2;

/// A loaded PDF: page text plus tables detected from it.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    pages: Vec<String>,
}

impl PdfDocument {
    /// Parse PDF bytes.
    ///
    /// # Errors
    ///
    /// `UnreadableDocument` if the bytes are not a PDF `pdf-extract` can read
    /// (encrypted, corrupt, or not a PDF at all).
    pub fn load(bytes: &[u8]) -> TakeoffResult<Self> {
        let pages = pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| {
            let message = e.to_string();
            if message.contains("decrypt") || message.contains("password") || message.contains("encryption") {
                TakeoffError::unreadable_document(format!(
                    "PDF appears to be encrypted or password-protected: {}",
                    message
                ))
            } else {
                TakeoffError::unreadable_document(format!("Failed to extract text: {}", message))
            }
        })?;

        log::debug!("Loaded PDF with {} pages", pages.len());

        Ok(PdfDocument { pages })
    }
}

impl DocumentSource for PdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, page_index: usize) -> String {
        self.pages.get(page_index).cloned().unwrap_or_default()
    }

    fn tables(&self, selector: &PageSelector) -> TakeoffResult<Vec<Table>> {
        let tables: Vec<Table> = self
            .pages
            .iter()
            .enumerate()
            .map(|(i, text)| (i + 1, text))
            .filter(|(page, _)| selector.contains(*page))
            .flat_map(|(page, text)| detect_tables(page, text))
            .collect();

        log::debug!("Detected {} tables on pages {}", tables.len(), selector);

        Ok(tables)
    }
}

/// Split page text into column-aligned blocks.
pub fn detect_tables(page: usize, text: &str) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();

    for line in text.lines() {
        let cells = split_cells(line);
        if cells.len() >= 2 {
            rows.push(cells);
            continue;
        }

        // Any single-field or blank line ends the current block
        if rows.len() >= MIN_TABLE_ROWS {
            tables.push(Table::new(page, std::mem::take(&mut rows)));
        } else {
            rows.clear();
        }
    }

    if rows.len() >= MIN_TABLE_ROWS {
        tables.push(Table::new(page, rows));
    }

    tables
}

fn split_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    CELL_GAP
        .split(trimmed)
        .map(|cell| cell.trim().to_string())
        .collect()
}
