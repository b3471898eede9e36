//! # Takeoff CLI Application
//!
//! Command-line front end for `takeoff_core`:
//!
//! - `takeoff extract <file> | --url <url>` prints the measurement record
//! - `takeoff estimate <file>` extracts and prices, optionally rendering a PDF
//! - `takeoff report --measurements m.json --out estimate.pdf` renders a
//!   report from a saved record
//!
//! Results and errors are printed to stdout as JSON; failures exit with
//! status 1. Logging goes to stderr and is controlled by `RUST_LOG`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use takeoff_core::diagnostics::{Diagnostic, DiagnosticSink, Diagnostics, LogSink};
use takeoff_core::document::{DocumentSource, PdfDocument, TextDocument};
use takeoff_core::errors::{TakeoffError, TakeoffResult};
use takeoff_core::estimate::{calculate_estimate, CostBreakdown};
use takeoff_core::extraction::{extract_measurements, Extraction};
use takeoff_core::fetch::fetch_document;
use takeoff_core::file_io::{load_json, read_bytes, save_json, write_atomic};
use takeoff_core::measurements::MeasurementRecord;
use takeoff_core::pdf::{render_estimate_pdf, ReportInfo};
use takeoff_core::{load_config, TakeoffConfig};

#[derive(Parser)]
#[command(name = "takeoff", version, about = "Roof measurement extraction and estimating")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a measurement record from a report
    Extract {
        #[command(flatten)]
        input: InputArgs,
        /// Also save the record to this JSON file
        #[arg(long)]
        out: Option<PathBuf>,
        /// Configuration file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Extract a record and price it
    Estimate {
        #[command(flatten)]
        input: InputArgs,
        /// Configuration file with a [pricing] table (TOML)
        #[arg(long, alias = "pricing")]
        config: Option<PathBuf>,
        /// Render the estimate to this PDF
        #[arg(long)]
        report: Option<PathBuf>,
        #[command(flatten)]
        header: HeaderArgs,
    },
    /// Render an estimate PDF from a saved measurement record
    Report {
        /// Measurement record JSON (from `takeoff extract --out`)
        #[arg(long)]
        measurements: PathBuf,
        /// Configuration file with a [pricing] table (TOML)
        #[arg(long, alias = "pricing")]
        config: Option<PathBuf>,
        /// Output PDF path
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        header: HeaderArgs,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Report file (PDF or plain text)
    #[arg(required_unless_present = "url", conflicts_with = "url")]
    file: Option<PathBuf>,
    /// Download the report from a URL instead
    #[arg(long)]
    url: Option<String>,
}

#[derive(Args)]
struct HeaderArgs {
    /// Report title
    #[arg(long, default_value = "Roofing Estimate")]
    title: String,
    /// Customer name shown on the report
    #[arg(long)]
    prepared_for: Option<String>,
    /// Company or estimator shown on the report
    #[arg(long)]
    prepared_by: Option<String>,
    /// Property address (defaults to the one in the measurement report)
    #[arg(long)]
    address: Option<String>,
}

impl HeaderArgs {
    fn report_info(&self) -> ReportInfo {
        ReportInfo {
            title: self.title.clone(),
            property_address: self.address.clone(),
            prepared_for: self.prepared_for.clone(),
            prepared_by: self.prepared_by.clone(),
        }
    }
}

#[derive(Serialize)]
struct ExtractOutput {
    #[serde(flatten)]
    extraction: Extraction,
    diagnostics: Vec<Diagnostic>,
}

#[derive(Serialize)]
struct EstimateOutput {
    record: MeasurementRecord,
    estimate: CostBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<PathBuf>,
}

#[derive(Serialize)]
struct ErrorOutput<'a> {
    code: &'static str,
    message: String,
    error: &'a TakeoffError,
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract { input, out, config } => run_extract(&input, out.as_deref(), config.as_deref()),
        Commands::Estimate {
            input,
            config,
            report,
            header,
        } => run_estimate(&input, config.as_deref(), report.as_deref(), &header),
        Commands::Report {
            measurements,
            config,
            out,
            header,
        } => run_report(&measurements, config.as_deref(), &out, &header),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            let payload = ErrorOutput {
                code: e.error_code(),
                message: e.to_string(),
                error: &e,
            };
            match serde_json::to_string_pretty(&payload) {
                Ok(json) => println!("{}", json),
                Err(_) => println!("{{\"code\":\"{}\"}}", e.error_code()),
            }
            ExitCode::FAILURE
        }
    }
}

fn run_extract(input: &InputArgs, out: Option<&Path>, config: Option<&Path>) -> TakeoffResult<()> {
    let config = load_config(config)?;
    let (extraction, diagnostics) = extract(input, &config)?;

    if let Some(out) = out {
        save_json(&extraction.record, out)?;
        log::info!("Saved measurement record to {}", out.display());
    }

    print_json(&ExtractOutput {
        extraction,
        diagnostics: diagnostics.entries,
    })
}

fn run_estimate(
    input: &InputArgs,
    config: Option<&Path>,
    report: Option<&Path>,
    header: &HeaderArgs,
) -> TakeoffResult<()> {
    let config = load_config(config)?;
    let (extraction, _) = extract(input, &config)?;
    let record = extraction.record;
    let estimate = calculate_estimate(&record, &config.pricing)?;

    if let Some(path) = report {
        write_report(&record, &estimate, header, path)?;
    }

    print_json(&EstimateOutput {
        record,
        estimate,
        report: report.map(Path::to_path_buf),
    })
}

fn run_report(measurements: &Path, config: Option<&Path>, out: &Path, header: &HeaderArgs) -> TakeoffResult<()> {
    let config = load_config(config)?;
    let record: MeasurementRecord = load_json(measurements)?;
    let estimate = calculate_estimate(&record, &config.pricing)?;
    write_report(&record, &estimate, header, out)?;

    print_json(&EstimateOutput {
        record,
        estimate,
        report: Some(out.to_path_buf()),
    })
}

/// Load the input and run extraction, forwarding diagnostics to the log.
fn extract(input: &InputArgs, config: &TakeoffConfig) -> TakeoffResult<(Extraction, Diagnostics)> {
    let doc = load_document(input)?;
    let mut diagnostics = Diagnostics::default();
    let extraction = extract_measurements(doc.as_ref(), &config.extraction, &mut diagnostics)?;

    let mut log_sink = LogSink;
    for diagnostic in &diagnostics.entries {
        log_sink.report(diagnostic.clone());
    }

    Ok((extraction, diagnostics))
}

/// PDF when the bytes carry the PDF signature, UTF-8 text otherwise.
fn load_document(input: &InputArgs) -> TakeoffResult<Box<dyn DocumentSource>> {
    let bytes = match (&input.file, &input.url) {
        (Some(file), _) => read_bytes(file)?,
        (None, Some(url)) => fetch_document(url)?,
        (None, None) => {
            return Err(TakeoffError::invalid_input("input", "", "A file or --url is required"));
        }
    };

    if bytes.starts_with(b"%PDF") {
        return Ok(Box::new(PdfDocument::load(&bytes)?));
    }

    let text = String::from_utf8(bytes)
        .map_err(|_| TakeoffError::unreadable_document("Input is neither a PDF nor UTF-8 text"))?;
    Ok(Box::new(TextDocument::from_text(text)))
}

fn write_report(record: &MeasurementRecord, estimate: &CostBreakdown, header: &HeaderArgs, path: &Path) -> TakeoffResult<()> {
    let pdf = render_estimate_pdf(record, estimate, &header.report_info())?;
    write_atomic(path, &pdf)?;
    log::info!("Wrote estimate report to {}", path.display());
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> TakeoffResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}
