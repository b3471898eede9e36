//! # Document Access
//!
//! The extraction pipeline never touches PDF internals. It sees a document
//! through [`DocumentSource`]: flattened text per page, plus whatever
//! tables the adapter detected on a selection of pages.
//!
//! - [`pdf::PdfDocument`] - PDF bytes via `pdf-extract`, tables detected from
//!   column-aligned text lines
//! - [`TextDocument`] - in-memory pages and tables (plain-text input, tests)
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::document::{DocumentSource, PageSelector, TextDocument};
//!
//! let doc = TextDocument::from_text("Total Area = 2,450 sq ft");
//! assert_eq!(doc.page_count(), 1);
//! assert!(doc.tables(&PageSelector::All).unwrap().is_empty());
//! ```

pub mod pdf;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{TakeoffError, TakeoffResult};

pub use pdf::PdfDocument;

// ============================================================================
// Tables
// ============================================================================

/// A detected table: a grid of text cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// 1-based page the table was found on
    pub page: usize,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(page: usize, rows: Vec<Vec<String>>) -> Self {
        Table { page, rows }
    }

    /// Build a table from string literals (mostly for tests and fixtures)
    pub fn from_rows(page: usize, rows: &[&[&str]]) -> Self {
        Table {
            page,
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    /// All cell text joined with spaces
    pub fn concatenated_text(&self) -> String {
        self.rows
            .iter()
            .flat_map(|row| row.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn cells(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flat_map(|row| row.iter().map(String::as_str))
    }
}

// ============================================================================
// Page Selection
// ============================================================================

/// Which pages to scan for tables (1-based, inclusive).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PageSelector {
    #[default]
    All,
    Range { start: usize, end: usize },
    Pages(Vec<usize>),
}

impl PageSelector {
    pub fn contains(&self, page: usize) -> bool {
        match self {
            PageSelector::All => true,
            PageSelector::Range { start, end } => (*start..=*end).contains(&page),
            PageSelector::Pages(pages) => pages.contains(&page),
        }
    }
}

impl FromStr for PageSelector {
    type Err = TakeoffError;

    /// Parses `all`, `3`, `2-4`, or `1,3,5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = |reason: &str| TakeoffError::invalid_input("pages", s, reason);

        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelector::All);
        }

        if let Some((start, end)) = s.split_once('-') {
            let start: usize = start.trim().parse().map_err(|_| invalid("range start is not a page number"))?;
            let end: usize = end.trim().parse().map_err(|_| invalid("range end is not a page number"))?;
            if start == 0 || end < start {
                return Err(invalid("pages are 1-based and the range must not be reversed"));
            }
            return Ok(PageSelector::Range { start, end });
        }

        let pages = s
            .split(',')
            .map(|p| p.trim().parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid("expected a comma-separated list of page numbers"))?;
        if pages.contains(&0) {
            return Err(invalid("pages are 1-based"));
        }
        Ok(PageSelector::Pages(pages))
    }
}

impl TryFrom<String> for PageSelector {
    type Error = TakeoffError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PageSelector> for String {
    fn from(selector: PageSelector) -> Self {
        selector.to_string()
    }
}

impl fmt::Display for PageSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSelector::All => f.write_str("all"),
            PageSelector::Range { start, end } => write!(f, "{}-{}", start, end),
            PageSelector::Pages(pages) => {
                let list: Vec<String> = pages.iter().map(|p| p.to_string()).collect();
                f.write_str(&list.join(","))
            }
        }
    }
}

// ============================================================================
// Document Source
// ============================================================================

/// Read-only view of a parsed document.
pub trait DocumentSource {
    fn page_count(&self) -> usize;

    /// Text of one page in reading order (0-based index). Pages without
    /// extractable text yield an empty string.
    fn page_text(&self, page_index: usize) -> String;

    /// Tables detected on the selected pages. Zero tables is an empty vector.
    fn tables(&self, selector: &PageSelector) -> TakeoffResult<Vec<Table>>;

    /// All page text joined by newlines.
    fn full_text(&self) -> String {
        (0..self.page_count())
            .map(|i| self.page_text(i))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// In-memory document: pages of text and explicitly supplied tables.
#[derive(Debug, Clone, Default)]
pub struct TextDocument {
    pages: Vec<String>,
    tables: Vec<Table>,
}

impl TextDocument {
    pub fn new(pages: Vec<String>) -> Self {
        TextDocument {
            pages,
            tables: Vec::new(),
        }
    }

    /// Single-page document
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(vec![text.into()])
    }

    pub fn with_table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }
}

impl DocumentSource for TextDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, page_index: usize) -> String {
        self.pages.get(page_index).cloned().unwrap_or_default()
    }

    fn tables(&self, selector: &PageSelector) -> TakeoffResult<Vec<Table>> {
        Ok(self
            .tables
            .iter()
            .filter(|t| selector.contains(t.page))
            .cloned()
            .collect())
    }
}
