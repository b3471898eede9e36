//! End-to-end extraction and estimating through the public API.

use takeoff_core::diagnostics::{Diagnostic, Diagnostics};
use takeoff_core::document::{DocumentSource, PageSelector, PdfDocument, Table, TextDocument};
use takeoff_core::estimate::{calculate_estimate, Material};
use takeoff_core::extraction::{extract_from_bytes, extract_measurements, ExtractOptions, PitchSource};
use takeoff_core::measurements::{LengthWithCount, LinearFeature, PitchArea};
use takeoff_core::pricing::PricingConfig;
use takeoff_core::units::{Feet, SqFt};
use takeoff_core::TakeoffError;

const SCENARIO_A: &str = "Total Area = 2,450 sq ft\n\
                          Predominant Pitch = 6/12\n\
                          Ridges = 80 ft (3 Ridges)\n\
                          Eaves = 150 ft\n\
                          Rakes = 60 ft\n";

/// A multi-page vendor report: summary on page 1, pitch table on page 2.
fn vendor_report() -> TextDocument {
    let summary = "ROOF MEASUREMENT REPORT\n\
                   Property Address: 42 Orchard Lane\n\
                   Total Area (All Pitches) = 3,120 sq ft\n\
                   Total Roof Facets = 12\n\
                   Predominant Pitch = 8/12\n\
                   Ridges = 96 ft (4 Ridges)\n\
                   Hips = 120 ft (6 Hips)\n\
                   Valleys = 44 ft (2 Valleys)\n\
                   Rakes† = 70 ft (4 Rakes)\n\
                   Eaves/Starter‡ = 210 ft (8 Eaves)\n\
                   Step Flashing = 18 ft (3)\n\
                   Flashing = 12 ft\n";
    let pitches = "Areas per Pitch\n\
                   Pitch    Area (sq ft)    % of Roof\n\
                   6/12     1,020.4         32.7%\n\
                   8/12     2,099.6         67.3%\n";

    TextDocument::new(vec![summary.to_string(), pitches.to_string()]).with_table(Table::from_rows(
        2,
        &[
            &["Pitch", "Area (sq ft)", "% of Roof"],
            &["6/12", "1,020.4", "32.7%"],
            &["8/12", "2,099.6", "67.3%"],
        ],
    ))
}

/// A minimal uncompressed PDF: one Helvetica text line per entry, one
/// `&[&str]` per page.
fn text_pdf(pages: &[&[&str]]) -> Vec<u8> {
    let font_id = 3 + 2 * pages.len();
    let kids: Vec<String> = (0..pages.len()).map(|i| format!("{} 0 R", 3 + 2 * i)).collect();

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), pages.len()),
    ];
    for (i, lines) in pages.iter().enumerate() {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources << /Font << /F1 {} 0 R >> >> /Contents {} 0 R >>",
            font_id,
            4 + 2 * i
        ));
        let mut stream = String::from("BT\n/F1 12 Tf\n72 740 Td\n");
        for (n, line) in lines.iter().enumerate() {
            if n > 0 {
                stream.push_str("0 -14 Td\n");
            }
            let escaped = line.replace('\\', "\\\\").replace('(', "\\(").replace(')', "\\)");
            stream.push_str(&format!("({}) Tj\n", escaped));
        }
        stream.push_str("ET");
        objects.push(format!("<< /Length {} >>\nstream\n{}\nendstream", stream.len(), stream));
    }
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_string());

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref = pdf.len();
    let mut trailer = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        trailer.push_str(&format!("{:010} 00000 n \n", offset));
    }
    trailer.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref
    ));
    pdf.extend_from_slice(trailer.as_bytes());
    pdf
}

#[test]
fn scenario_a_text_report() {
    let doc = TextDocument::from_text(SCENARIO_A);
    let extraction = extract_measurements(&doc, &ExtractOptions::default(), &mut Diagnostics::default()).unwrap();
    let record = extraction.record;

    assert_eq!(record.total_area, SqFt(2450.0));
    assert_eq!(record.total_squares.0, 24.5);
    assert_eq!(record.predominant_pitch.as_deref(), Some("6/12"));
    assert_eq!(
        record.feature(LinearFeature::Ridges),
        Some(&LengthWithCount::new(Feet(80.0), 3).unwrap())
    );
    assert_eq!(
        record.feature(LinearFeature::Eaves),
        Some(&LengthWithCount::new(Feet(150.0), 1).unwrap())
    );
    assert_eq!(record.drip_edge, Some(LengthWithCount::new(Feet(210.0), 1).unwrap()));
    assert!(record.feature(LinearFeature::Valleys).is_none());
    assert_eq!(extraction.pitch_source, PitchSource::Absent);
}

#[test]
fn scenario_b_missing_total_area() {
    let text = "Predominant Pitch = 6/12\nRidges = 80 ft (3 Ridges)\n";
    let doc = TextDocument::from_text(text);
    let err = extract_measurements(&doc, &ExtractOptions::default(), &mut Diagnostics::default()).unwrap_err();

    assert_eq!(err, TakeoffError::missing_field("total area"));
    assert_eq!(err.to_string(), "Could not find total area in document");
}

#[test]
fn scenario_c_merged_table_cell() {
    let doc = TextDocument::from_text("Total Area = 1,200.5")
        .with_table(Table::from_rows(1, &[&["6/12", "1200.5", "", "49"]]));
    let extraction = extract_measurements(&doc, &ExtractOptions::default(), &mut Diagnostics::default()).unwrap();

    assert_eq!(extraction.pitch_source, PitchSource::Table);
    assert_eq!(
        extraction.record.areas_per_pitch,
        vec![PitchArea {
            pitch: "6/12".to_string(),
            area: SqFt(1200.5),
            percentage: 49.0,
        }]
    );
}

#[test]
fn vendor_report_uses_table_and_all_features() {
    let mut sink = Diagnostics::default();
    let extraction = extract_measurements(&vendor_report(), &ExtractOptions::default(), &mut sink).unwrap();
    let record = &extraction.record;

    assert_eq!(extraction.pitch_source, PitchSource::Table);
    let pitches: Vec<(&str, f64)> = record
        .areas_per_pitch
        .iter()
        .map(|a| (a.pitch.as_str(), a.percentage))
        .collect();
    assert_eq!(pitches, [("6/12", 32.0), ("8/12", 67.0)]);

    let counts: Vec<(LinearFeature, u32)> = record
        .linear_features
        .iter()
        .map(|(feature, value)| (*feature, value.count))
        .collect();
    assert_eq!(
        counts,
        [
            (LinearFeature::Ridges, 4),
            (LinearFeature::Hips, 6),
            (LinearFeature::Valleys, 2),
            (LinearFeature::Rakes, 4),
            (LinearFeature::Eaves, 8),
            (LinearFeature::Flashing, 1),
            (LinearFeature::StepFlashing, 3),
        ]
    );
    assert_eq!(record.feature_length(LinearFeature::Flashing), Feet(12.0));
    assert_eq!(record.feature_length(LinearFeature::StepFlashing), Feet(18.0));
    assert_eq!(record.drip_edge.map(|d| d.length), Some(Feet(280.0)));
    assert_eq!(record.total_facets, Some(12));
    assert_eq!(record.property_address.as_deref(), Some("42 Orchard Lane"));
    assert_eq!(sink.warnings().count(), 0);
}

#[test]
fn text_fallback_when_table_pages_excluded() {
    let options = ExtractOptions {
        table_pages: PageSelector::Pages(vec![1]),
    };
    let mut sink = Diagnostics::default();
    let extraction = extract_measurements(&vendor_report(), &options, &mut sink).unwrap();

    assert_eq!(extraction.pitch_source, PitchSource::Text);
    assert!(sink
        .entries
        .iter()
        .any(|d| matches!(d, Diagnostic::ExtractorDegradation { .. })));
}

#[test]
fn text_fallback_reads_pitch_rows() {
    let text = format!("{SCENARIO_A}\nAreas per Pitch\n6/12 = 1,470 sq ft (60%)\n10/12 = 980 sq ft (40%)\n");
    let doc = TextDocument::from_text(text);
    let extraction = extract_measurements(&doc, &ExtractOptions::default(), &mut Diagnostics::default()).unwrap();

    assert_eq!(extraction.pitch_source, PitchSource::Text);
    assert_eq!(extraction.record.areas_per_pitch.len(), 2);
    assert_eq!(extraction.record.areas_per_pitch[1].pitch, "10/12");
    assert_eq!(extraction.record.areas_per_pitch[1].area, SqFt(980.0));
}

#[test]
fn extraction_feeds_estimate() {
    let extraction = extract_measurements(&vendor_report(), &ExtractOptions::default(), &mut Diagnostics::default()).unwrap();
    let cost = calculate_estimate(&extraction.record, &PricingConfig::default()).unwrap();

    // 570 ft of linear features -> 12.5% waste
    assert!((cost.waste_factor - 0.125).abs() < 1e-9);
    assert_eq!(cost.labor.len(), 2);
    assert_eq!(cost.labor[0].rate, 100.0);
    assert_eq!(cost.labor[1].rate, 110.0);
    assert!(cost.material(Material::IceAndWater).is_some());
    assert!((cost.materials_subtotal + cost.labor_subtotal - cost.total).abs() < 1e-6);
}

#[test]
fn blank_line_after_pitch_header() {
    let text = "Total Area = 2,450 sq ft\nAreas per Pitch\n\n6/12 = 1,200 sq ft (49%)\n8/12 = 1,250 sq ft (51%)\n";
    let doc = TextDocument::from_text(text);
    let extraction = extract_measurements(&doc, &ExtractOptions::default(), &mut Diagnostics::default()).unwrap();

    assert_eq!(extraction.pitch_source, PitchSource::Text);
    assert_eq!(extraction.record.areas_per_pitch.len(), 2);
}

#[test]
fn columnar_pitch_section() {
    let text = "Total Area = 1,500 sq ft\n\
                Areas per Pitch\n\
                Roof Pitches 4/12 6/12\n\
                Area (sq ft) 300.0 1200.0\n\
                % of Roof 20% 80%\n\
                Structure Complexity Normal\n";
    let doc = TextDocument::from_text(text);
    let extraction = extract_measurements(&doc, &ExtractOptions::default(), &mut Diagnostics::default()).unwrap();

    assert_eq!(extraction.pitch_source, PitchSource::Text);
    let pitches: Vec<(&str, f64, f64)> = extraction
        .record
        .areas_per_pitch
        .iter()
        .map(|a| (a.pitch.as_str(), a.area.0, a.percentage))
        .collect();
    assert_eq!(pitches, [("4/12", 300.0, 20.0), ("6/12", 1200.0, 80.0)]);
}

#[test]
fn pdf_report_through_table_detection() {
    let pdf = text_pdf(&[
        &[
            "Total Area = 2,450 sq ft",
            "Predominant Pitch = 6/12",
            "Ridges = 80 ft (3 Ridges)",
            "Eaves = 150 ft",
            "Rakes = 60 ft",
        ],
        &[
            "Areas per Pitch",
            "Pitch    Area (sq ft)    % of Roof",
            "6/12    1,020.4    41.6%",
            "8/12    1,429.6    58.4%",
        ],
    ]);

    let doc = PdfDocument::load(&pdf).unwrap();
    assert_eq!(doc.page_count(), 2);
    assert!(doc.page_text(0).contains("Total Area = 2,450"));
    let tables = doc.tables(&PageSelector::All).unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].page, 2);

    let mut sink = Diagnostics::default();
    let extraction = extract_from_bytes(&pdf, &ExtractOptions::default(), &mut sink).unwrap();
    let record = &extraction.record;

    assert_eq!(extraction.pitch_source, PitchSource::Table);
    assert_eq!(record.total_area, SqFt(2450.0));
    assert_eq!(record.feature(LinearFeature::Ridges).map(|r| r.count), Some(3));
    assert_eq!(record.drip_edge.map(|d| d.length), Some(Feet(210.0)));
    let pitches: Vec<(&str, f64)> = record
        .areas_per_pitch
        .iter()
        .map(|a| (a.pitch.as_str(), a.percentage))
        .collect();
    assert_eq!(pitches, [("6/12", 41.0), ("8/12", 58.0)]);
}
