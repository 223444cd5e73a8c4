//! Outcome reporting for [`crate::core::InvoicePipeline`].
//!
//! The pipeline never logs on its own. It reports each step to an injected
//! [`PipelineObserver`], which defaults to [`TracingObserver`]. Use
//! [`NoopObserver`] to silence it, or implement the trait to forward outcomes
//! elsewhere (metrics, a job queue, a test recorder).

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, error, info};

use super::error::InvoiceError;
use super::pipeline::GeneratedInvoice;

/// Which artifact the pipeline wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Rendered markup (`output_html`).
    Html,
    /// Fixed-layout document (`output_pdf`).
    Pdf,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Html => f.write_str("html"),
            Self::Pdf => f.write_str("pdf"),
        }
    }
}

/// Receives pipeline events in order. All methods default to no-ops.
pub trait PipelineObserver: Send + Sync {
    /// The submission passed validation.
    fn on_validated(&self, invoice_no: &str) {
        let _ = invoice_no;
    }

    /// Amounts were calculated.
    fn on_computed(&self, invoice_no: &str, total: Decimal) {
        let _ = (invoice_no, total);
    }

    /// An artifact was written to disk.
    fn on_artifact_written(&self, kind: ArtifactKind, path: &Path, bytes: usize) {
        let _ = (kind, path, bytes);
    }

    /// Both artifacts exist; called once per successful run.
    fn on_success(&self, invoice: &GeneratedInvoice) {
        let _ = invoice;
    }

    /// The run failed; called once with the causing error.
    fn on_failure(&self, error: &InvoiceError) {
        let _ = error;
    }
}

/// Logs outcomes through `tracing`. This is the pipeline default.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_validated(&self, invoice_no: &str) {
        debug!(invoice_no, "submission validated");
    }

    fn on_computed(&self, invoice_no: &str, total: Decimal) {
        debug!(invoice_no, %total, "amounts computed");
    }

    fn on_artifact_written(&self, kind: ArtifactKind, path: &Path, bytes: usize) {
        debug!(%kind, path = %path.display(), bytes, "artifact written");
    }

    fn on_success(&self, _invoice: &GeneratedInvoice) {
        info!("Invoice generated successfully.");
    }

    fn on_failure(&self, e: &InvoiceError) {
        error!("Error generating invoice: {e}");
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Shared observer handle as stored by the pipeline.
pub type SharedObserver = Arc<dyn PipelineObserver>;
