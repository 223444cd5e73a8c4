//! CLI binary for gstbill.
//!
//! A thin shim over the library: loads the configuration, reads one invoice
//! submission and runs the generation pipeline with the bundled HTML
//! renderer and PDF converter.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use gstbill::core::{Config, ErrorKind, InvoicePipeline, ValidationPolicy};
use gstbill::html::HtmlTemplateRenderer;
use gstbill::pdf::PdfConverter;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXIT CODES:
  0  invoice generated
  1  configuration or input could not be read
  2  validation error (missing field, bad date, invalid item)
  3  conversion error (negative or unrepresentable total)
  4  collaborator error (template, PDF conversion, file write)

EXAMPLES:
  gstbill demos/sample_invoice.json
  gstbill --config config.json --json order.json
  cat order.json | gstbill -"#;

/// Generate a GST tax invoice (HTML + PDF) from JSON order data.
#[derive(Parser, Debug)]
#[command(
    name = "gstbill",
    version,
    about = "Generate a GST tax invoice (HTML + PDF) from JSON order data",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Invoice data JSON file, or `-` for stdin.
    data: String,

    /// Configuration file with template and output paths.
    #[arg(short, long, env = "GSTBILL_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Reject discounts above the gross amount and impossible calendar dates.
    #[arg(long)]
    strict: bool,

    /// Print the calculated invoice as JSON instead of the artifact paths.
    #[arg(long)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

fn read_data(source: &str) -> Result<serde_json::Value> {
    let text = if source == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read invoice data from stdin")?;
        buf
    } else {
        std::fs::read_to_string(Path::new(source))
            .with_context(|| format!("failed to read invoice data '{source}'"))?
    };
    serde_json::from_str(&text).context("invoice data is not valid JSON")
}

fn exit_code(kind: ErrorKind) -> ExitCode {
    match kind {
        ErrorKind::Validation => ExitCode::from(2),
        ErrorKind::Conversion => ExitCode::from(3),
        ErrorKind::Collaborator => ExitCode::from(4),
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let mut config = Config::load(&cli.config)?;
    if cli.strict {
        config.validation = ValidationPolicy {
            reject_negative_net: true,
            calendar_dates: true,
        };
    }
    let data = read_data(&cli.data)?;

    let pipeline = InvoicePipeline::new(config, HtmlTemplateRenderer::new(), PdfConverter::new());
    match pipeline.generate(&data) {
        Ok(generated) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&generated.document)?);
            } else if !cli.quiet {
                println!("{}", generated.html_path.display());
                println!("{}", generated.pdf_path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        // Already reported by the pipeline observer.
        Err(e) => Ok(exit_code(e.kind())),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
