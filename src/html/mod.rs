//! HTML rendering of calculated invoices.
//!
//! [`HtmlTemplateRenderer`] loads a template file and renders the flat
//! [`InvoiceDocument`] context through the Jinja-style [`Template`] language.
//!
//! ```no_run
//! use gstbill::core::TemplateRenderer;
//! use gstbill::html::HtmlTemplateRenderer;
//! # fn demo(document: &gstbill::core::InvoiceDocument) -> Result<(), gstbill::core::CollaboratorError> {
//! let markup = HtmlTemplateRenderer::new()
//!     .render(document, std::path::Path::new("templates/invoice.html"))?;
//! # Ok(())
//! # }
//! ```

mod template;

pub use template::Template;

use std::path::Path;

use crate::core::{CollaboratorError, InvoiceDocument, TemplateRenderer};

/// File-backed template renderer. The template is read on every call, so
/// edits take effect without restarting.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTemplateRenderer;

impl HtmlTemplateRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render a document against template source held in memory.
    pub fn render_source(
        &self,
        document: &InvoiceDocument,
        source: &str,
    ) -> Result<String, CollaboratorError> {
        let context = serde_json::to_value(document)
            .map_err(|e| CollaboratorError::Template(format!("cannot build context: {e}")))?;
        Template::parse(source)?.render(&context)
    }
}

impl TemplateRenderer for HtmlTemplateRenderer {
    fn render(
        &self,
        document: &InvoiceDocument,
        template: &Path,
    ) -> Result<String, CollaboratorError> {
        let source =
            std::fs::read_to_string(template).map_err(|_| CollaboratorError::TemplateNotFound {
                path: template.to_path_buf(),
            })?;
        self.render_source(document, &source)
    }
}
