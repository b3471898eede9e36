//! # PDF Generation Module
//!
//! Renders a priced estimate as a PDF using Typst.
//!
//! ## Architecture
//!
//! - The Typst template is embedded as a string constant
//! - Data is injected by single-pass placeholder substitution before compilation;
//!   every piece of user text passes through [`escape_typst`]
//! - Output is raw PDF bytes (`Vec<u8>`)
//!
//! ## Sections
//!
//! Header (title, property, preparer, date), measurements, materials, labor,
//! and a totals table.
//!
//! ## Example
//!
//! ```rust,no_run
//! use takeoff_core::estimate::calculate_estimate;
//! use takeoff_core::measurements::MeasurementBuilder;
//! use takeoff_core::pdf::{render_estimate_pdf, ReportInfo};
//! use takeoff_core::pricing::PricingConfig;
//! use takeoff_core::units::SqFt;
//!
//! let mut builder = MeasurementBuilder::new();
//! builder.total_area(SqFt(2450.0)).predominant_pitch("6/12");
//! let record = builder.build().unwrap();
//! let cost = calculate_estimate(&record, &PricingConfig::default()).unwrap();
//!
//! let info = ReportInfo::new("Roof Estimate").prepared_by("Acme Roofing");
//! let pdf_bytes = render_estimate_pdf(&record, &cost, &info).unwrap();
//! std::fs::write("estimate.pdf", pdf_bytes).unwrap();
//! ```

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};
use typst_pdf::PdfOptions;

use crate::errors::{TakeoffError, TakeoffResult};
use crate::estimate::CostBreakdown;
use crate::measurements::{LinearFeature, MeasurementRecord};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([A-Z_]+)\}\}").expect("valid placeholder pattern"));

// ============================================================================
// Typst World Implementation
// ============================================================================

/// A minimal Typst world for compiling documents without external files.
struct PdfWorld {
    /// The main source document
    main: Source,
    /// Font book
    book: LazyHash<FontBook>,
    /// Available fonts
    fonts: Vec<Font>,
    /// Library (standard functions)
    library: LazyHash<Library>,
}

impl PdfWorld {
    fn new(source: String) -> Self {
        let fonts = Self::load_fonts();
        let book = FontBook::from_fonts(&fonts);

        PdfWorld {
            main: Source::detached(source),
            book: LazyHash::new(book),
            fonts,
            library: LazyHash::new(Library::default()),
        }
    }

    /// Fonts bundled with typst-assets
    fn load_fonts() -> Vec<Font> {
        typst_assets::fonts()
            .flat_map(|font_bytes| Font::iter(Bytes::new(font_bytes.to_vec())))
            .collect()
    }
}

impl World for PdfWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        let now = Utc::now();
        Datetime::from_ymd(
            now.format("%Y").to_string().parse().ok()?,
            now.format("%m").to_string().parse().ok()?,
            now.format("%d").to_string().parse().ok()?,
        )
    }
}

// ============================================================================
// Report Header
// ============================================================================

/// Header fields for a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportInfo {
    pub title: String,
    /// Defaults to the address found in the measurement report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepared_for: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepared_by: Option<String>,
}

impl ReportInfo {
    pub fn new(title: impl Into<String>) -> Self {
        ReportInfo {
            title: title.into(),
            property_address: None,
            prepared_for: None,
            prepared_by: None,
        }
    }

    pub fn property_address(mut self, address: impl Into<String>) -> Self {
        self.property_address = Some(address.into());
        self
    }

    pub fn prepared_for(mut self, name: impl Into<String>) -> Self {
        self.prepared_for = Some(name.into());
        self
    }

    pub fn prepared_by(mut self, name: impl Into<String>) -> Self {
        self.prepared_by = Some(name.into());
        self
    }
}

impl Default for ReportInfo {
    fn default() -> Self {
        ReportInfo::new("Roofing Estimate")
    }
}

// ============================================================================
// PDF Template
// ============================================================================

/// Typst template for the estimate report
const ESTIMATE_TEMPLATE: &str = r##"
#set page(
  paper: "us-letter",
  margin: (top: 1in, bottom: 1in, left: 0.9in, right: 0.9in),
  header: align(right)[
    #text(size: 9pt, fill: gray)[Takeoff Roofing Estimate]
  ],
  footer: context [
    #line(length: 100%, stroke: 0.5pt + gray)
    #v(4pt)
    #grid(
      columns: (1fr, 1fr),
      align(left)[#text(size: 9pt)[{{DATE}}]],
      align(right)[#text(size: 9pt)[Page #counter(page).display()]],
    )
  ]
)

#set text(font: "Libertinus Serif", size: 11pt)

// Title Block
#align(center)[
  #block(width: 100%, fill: rgb("#f0f0f0"), inset: 12pt, radius: 4pt)[
    #text(size: 18pt, weight: "bold")[{{TITLE}}]
    #v(4pt)
    #text(size: 12pt)[{{PROPERTY}}]
  ]
]

#v(12pt)

#table(
  columns: (auto, 1fr),
  stroke: none,
  row-gutter: 4pt,
  [Prepared for:], [{{PREPARED_FOR}}],
  [Prepared by:], [{{PREPARED_BY}}],
  [Date:], [{{DATE}}],
)

#v(12pt)

== Roof Measurements

#table(
  columns: (1fr, auto, auto),
  inset: 8pt,
  stroke: 0.5pt,
  align: (left, right, left),
  table.header([*Measurement*], [*Value*], [*Unit*]),
{{MEASUREMENT_ROWS}}
)

#v(12pt)

== Materials

Waste factor: {{WASTE}}, {{SQUARES_WITH_WASTE}} squares with waste.

#table(
  columns: (1fr, auto, auto, auto, auto),
  inset: 8pt,
  stroke: 0.5pt,
  align: (left, right, left, right, right),
  table.header([*Item*], [*Qty*], [*Unit*], [*Unit Price*], [*Total*]),
{{MATERIAL_ROWS}}
)

#v(12pt)

== Labor

#table(
  columns: (1fr, auto, auto, auto),
  inset: 8pt,
  stroke: 0.5pt,
  align: (left, right, right, right),
  table.header([*Pitch*], [*Squares*], [*Rate*], [*Total*]),
{{LABOR_ROWS}}
)

#v(16pt)
#line(length: 100%, stroke: 0.5pt)
#v(8pt)

#align(right)[
  #table(
    columns: (auto, auto),
    inset: 8pt,
    stroke: 0.5pt,
    align: (left, right),
    [Materials], [{{MATERIALS_SUBTOTAL}}],
    [Labor], [{{LABOR_SUBTOTAL}}],
    [*Total*], [*{{TOTAL}}*],
  )
]

#v(24pt)

#text(size: 9pt, fill: gray)[
  Quantities are derived from the aerial measurement report and rounded up to whole units. \
  Prices are estimates and should be confirmed before ordering.
]
"##;

// ============================================================================
// PDF Rendering Functions
// ============================================================================

/// Render an estimate to PDF.
///
/// # Returns
///
/// * `Ok(Vec<u8>)` - PDF file as bytes
/// * `Err(TakeoffError::RenderFailed)` - Typst compilation or export failed
pub fn render_estimate_pdf(record: &MeasurementRecord, cost: &CostBreakdown, info: &ReportInfo) -> TakeoffResult<Vec<u8>> {
    let source = estimate_source(record, cost, info);
    compile_pdf(source)
}

/// The filled-in Typst source for an estimate.
pub fn estimate_source(record: &MeasurementRecord, cost: &CostBreakdown, info: &ReportInfo) -> String {
    let property = info
        .property_address
        .as_deref()
        .or(record.property_address.as_deref())
        .unwrap_or("");

    let values = [
        ("TITLE", escape_typst(&info.title)),
        ("PROPERTY", escape_typst(property)),
        ("PREPARED_FOR", escape_typst(info.prepared_for.as_deref().unwrap_or("-"))),
        ("PREPARED_BY", escape_typst(info.prepared_by.as_deref().unwrap_or("-"))),
        ("DATE", Utc::now().format("%Y-%m-%d").to_string()),
        ("MEASUREMENT_ROWS", measurement_rows(record)),
        ("WASTE", format!("{:.1}%", cost.waste_factor * 100.0)),
        ("SQUARES_WITH_WASTE", format!("{:.2}", cost.squares_with_waste)),
        ("MATERIAL_ROWS", material_rows(cost)),
        ("LABOR_ROWS", labor_rows(cost)),
        ("MATERIALS_SUBTOTAL", money(cost.materials_subtotal)),
        ("LABOR_SUBTOTAL", money(cost.labor_subtotal)),
        ("TOTAL", money(cost.total)),
    ];
    fill_template(ESTIMATE_TEMPLATE, &values)
}

/// Substitute `{{NAME}}` placeholders in one pass; inserted text is never rescanned.
fn fill_template(template: &str, values: &[(&str, String)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            values
                .iter()
                .find(|(name, _)| *name == &caps[1])
                .map(|(_, value)| value.clone())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn compile_pdf(source: String) -> TakeoffResult<Vec<u8>> {
    let world = PdfWorld::new(source);
    let warned = typst::compile(&world);

    let document = warned.output.map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        TakeoffError::render_failed(format!("Typst compilation failed: {}", error_msgs.join("; ")))
    })?;

    let pdf_bytes = typst_pdf::pdf(&document, &PdfOptions::default()).map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        TakeoffError::render_failed(format!("PDF rendering failed: {}", error_msgs.join("; ")))
    })?;

    log::debug!("Rendered estimate PDF ({} bytes)", pdf_bytes.len());
    Ok(pdf_bytes)
}

fn measurement_rows(record: &MeasurementRecord) -> String {
    let mut rows = vec![
        row(&["Total Area", &format!("{:.0}", record.total_area.value()), "sq ft"]),
        row(&["Total Squares", &format!("{:.2}", record.total_squares.value()), "squares"]),
    ];
    if let Some(pitch) = &record.predominant_pitch {
        rows.push(row(&["Predominant Pitch", &escape_typst(pitch), ""]));
    }
    for feature in LinearFeature::ALL {
        if let Some(value) = record.feature(feature) {
            rows.push(row(&[
                &format!("{} ({})", feature.display_name(), value.count),
                &format!("{:.1}", value.length.value()),
                "ft",
            ]));
        }
    }
    if let Some(drip) = &record.drip_edge {
        rows.push(row(&["Drip Edge", &format!("{:.1}", drip.length.value()), "ft"]));
    }
    for area in &record.areas_per_pitch {
        rows.push(row(&[
            &format!("Area at {} ({:.0}%)", escape_typst(&area.pitch), area.percentage),
            &format!("{:.0}", area.area.value()),
            "sq ft",
        ]));
    }
    rows.join("\n")
}

fn material_rows(cost: &CostBreakdown) -> String {
    cost.materials
        .iter()
        .map(|line| {
            row(&[
                line.material.display_name(),
                &format!("{:.0}", line.quantity),
                line.material.unit(),
                &money(line.unit_price),
                &money(line.total),
            ])
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn labor_rows(cost: &CostBreakdown) -> String {
    cost.labor
        .iter()
        .map(|line| {
            row(&[
                &escape_typst(&line.pitch),
                &format!("{:.2}", line.squares),
                &money(line.rate),
                &money(line.total),
            ])
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One table row; cells must already be escaped.
fn row(cells: &[&str]) -> String {
    let cells: Vec<String> = cells.iter().map(|c| format!("[{}]", c)).collect();
    format!("  {},", cells.join(", "))
}

/// `1234.5` -> `\$1,234.50` (escaped for Typst markup)
fn money(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    let dollars = (cents / 100).to_string();

    let mut grouped = String::new();
    for (i, c) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}\\${}.{:02}", sign, grouped, cents % 100)
}

/// Escape special Typst characters in user-provided text
fn escape_typst(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '*' => "\\*".to_string(),
            '_' => "\\_".to_string(),
            '#' => "\\#".to_string(),
            '$' => "\\$".to_string(),
            '@' => "\\@".to_string(),
            '<' => "\\<".to_string(),
            '>' => "\\>".to_string(),
            '[' => "\\[".to_string(),
            ']' => "\\]".to_string(),
            '\\' => "\\\\".to_string(),
            '`' => "\\`".to_string(),
            _ => c.to_string(),
        })
        .collect()
}
