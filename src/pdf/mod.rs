//! Markup to PDF conversion.
//!
//! [`PdfConverter`] reads the rendered HTML leniently with quick-xml, drops
//! `<head>`, `<style>` and `<script>` content, flattens the body into lines
//! (table rows become one line with cells separated by a gap) and lays the
//! lines out on fixed-size pages with lopdf, using the standard Helvetica
//! fonts. Images are not embedded. Output is deterministic: identical markup
//! always yields identical bytes.

mod layout;
mod markup;

use crate::core::{CollaboratorError, DocumentConverter};

/// Page geometry in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSetup {
    pub width: i64,
    pub height: i64,
    /// Margin on all four sides.
    pub margin: i64,
}

impl PageSetup {
    /// ISO A4 portrait with a 50pt margin.
    pub const A4: Self = Self {
        width: 595,
        height: 842,
        margin: 50,
    };

    /// US Letter portrait with a 50pt margin.
    pub const LETTER: Self = Self {
        width: 612,
        height: 792,
        margin: 50,
    };
}

impl Default for PageSetup {
    fn default() -> Self {
        Self::A4
    }
}

/// HTML to PDF document converter.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfConverter {
    page: PageSetup,
}

impl PdfConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_setup(mut self, page: PageSetup) -> Self {
        self.page = page;
        self
    }

    /// The text lines the converter would lay out, in order. Rules are
    /// omitted.
    pub fn text_lines(&self, markup: &str) -> Result<Vec<String>, CollaboratorError> {
        Ok(markup::flatten(markup)?
            .into_iter()
            .filter_map(|block| match block {
                markup::Block::Line { text, .. } => Some(text),
                markup::Block::Rule => None,
            })
            .collect())
    }
}

impl DocumentConverter for PdfConverter {
    fn convert(&self, markup: &str) -> Result<Vec<u8>, CollaboratorError> {
        let page = self.page;
        if page.width <= 2 * page.margin || page.height <= 2 * page.margin {
            return Err(CollaboratorError::Conversion(format!(
                "page {}x{} leaves no room inside a {}pt margin",
                page.width, page.height, page.margin
            )));
        }
        let blocks = markup::flatten(markup)?;
        layout::render(&blocks, &page)
    }
}
