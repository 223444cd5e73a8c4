use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use super::calculation::compute;
use super::config::Config;
use super::error::{CollaboratorError, InvoiceError};
use super::observer::{ArtifactKind, PipelineObserver, SharedObserver, TracingObserver};
use super::types::{InvoiceDocument, InvoiceRecord};
use super::validation::{parse_submission, validate_record};
use super::words::{AmountInWords, EnglishWords};

/// Produces markup from a calculated invoice and a template reference.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, document: &InvoiceDocument, template: &Path)
    -> Result<String, CollaboratorError>;
}

/// Produces a fixed-layout, print-ready document from markup.
pub trait DocumentConverter: Send + Sync {
    fn convert(&self, markup: &str) -> Result<Vec<u8>, CollaboratorError>;
}

/// Result of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct GeneratedInvoice {
    /// The calculated invoice the artifacts were rendered from.
    pub document: InvoiceDocument,
    pub html_path: PathBuf,
    pub pdf_path: PathBuf,
    /// Size of the written PDF.
    pub pdf_bytes: usize,
}

/// Validate → compute → render → write markup → convert → write document.
///
/// Every run reports exactly one outcome to the observer and returns it as a
/// typed [`InvoiceError`] on failure; nothing is written to disk unless
/// validation and calculation succeed.
pub struct InvoicePipeline<R, C> {
    config: Config,
    renderer: R,
    converter: C,
    words: Box<dyn AmountInWords>,
    observer: SharedObserver,
}

impl<R: TemplateRenderer, C: DocumentConverter> InvoicePipeline<R, C> {
    pub fn new(config: Config, renderer: R, converter: C) -> Self {
        Self {
            config,
            renderer,
            converter,
            words: Box::new(EnglishWords),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replace the number-to-words converter.
    pub fn words(mut self, words: impl AmountInWords + 'static) -> Self {
        self.words = Box::new(words);
        self
    }

    /// Replace the outcome observer.
    pub fn observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the pipeline on a raw JSON submission.
    pub fn generate(&self, submission: &Value) -> Result<GeneratedInvoice, InvoiceError> {
        let result = parse_submission(submission, &self.config.validation)
            .and_then(|record| self.run(&record));
        self.report(result)
    }

    /// Run the pipeline on a typed record (e.g. from [`crate::core::InvoiceRecordBuilder`]).
    pub fn generate_record(&self, record: &InvoiceRecord) -> Result<GeneratedInvoice, InvoiceError> {
        let result = validate_record(record, &self.config.validation)
            .map_err(InvoiceError::from)
            .and_then(|()| self.run(record));
        self.report(result)
    }

    fn run(&self, record: &InvoiceRecord) -> Result<GeneratedInvoice, InvoiceError> {
        let invoice_no = record.header.invoice_no.as_str();
        self.observer.on_validated(invoice_no);

        let document = compute(record, self.words.as_ref())?;
        self.observer.on_computed(invoice_no, document.total_amount);

        let markup = self
            .renderer
            .render(&document, &self.config.template_path)?;
        write_artifact(&self.config.output_html, markup.as_bytes())?;
        self.observer
            .on_artifact_written(ArtifactKind::Html, &self.config.output_html, markup.len());

        let pdf = self.converter.convert(&markup)?;
        write_artifact(&self.config.output_pdf, &pdf)?;
        self.observer
            .on_artifact_written(ArtifactKind::Pdf, &self.config.output_pdf, pdf.len());

        Ok(GeneratedInvoice {
            document,
            html_path: self.config.output_html.clone(),
            pdf_path: self.config.output_pdf.clone(),
            pdf_bytes: pdf.len(),
        })
    }

    fn report(
        &self,
        result: Result<GeneratedInvoice, InvoiceError>,
    ) -> Result<GeneratedInvoice, InvoiceError> {
        match &result {
            Ok(invoice) => self.observer.on_success(invoice),
            Err(e) => self.observer.on_failure(e),
        }
        result
    }
}

fn write_artifact(path: &Path, contents: &[u8]) -> Result<(), CollaboratorError> {
    std::fs::write(path, contents).map_err(|source| CollaboratorError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Generate an invoice with the bundled HTML renderer and PDF converter,
/// reporting through `tracing`.
#[cfg(all(feature = "html", feature = "pdf"))]
pub fn generate_invoice(
    submission: &Value,
    config: &Config,
) -> Result<GeneratedInvoice, InvoiceError> {
    InvoicePipeline::new(
        config.clone(),
        crate::html::HtmlTemplateRenderer::new(),
        crate::pdf::PdfConverter::new(),
    )
    .generate(submission)
}
