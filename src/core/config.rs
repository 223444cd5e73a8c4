use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::validation::ValidationPolicy;

/// Settings for one pipeline run, loaded once and never mutated.
///
/// ```json
/// {
///   "template_path": "templates/invoice.html",
///   "output_html": "invoice.html",
///   "output_pdf": "invoice.pdf"
/// }
/// ```
///
/// Relative paths are used as given, i.e. resolved against the working
/// directory. Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Markup template handed to the template renderer.
    pub template_path: PathBuf,
    /// Where the rendered markup is written.
    pub output_html: PathBuf,
    /// Where the fixed-layout document is written.
    pub output_pdf: PathBuf,
    /// Optional validation hardening; all rules off when absent.
    #[serde(default)]
    pub validation: ValidationPolicy,
}

impl Config {
    pub fn new(
        template_path: impl Into<PathBuf>,
        output_html: impl Into<PathBuf>,
        output_pdf: impl Into<PathBuf>,
    ) -> Self {
        Self {
            template_path: template_path.into(),
            output_html: output_html.into(),
            output_pdf: output_pdf.into(),
            validation: ValidationPolicy::default(),
        }
    }

    /// Read and parse a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn with_validation(mut self, policy: ValidationPolicy) -> Self {
        self.validation = policy;
        self
    }
}
