use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while generating an invoice.
///
/// Every failure of [`crate::core::InvoicePipeline`] is reported as one of
/// these variants, so callers can tell a bad submission apart from a broken
/// template or an unwritable output path.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InvoiceError {
    /// The submission failed a validation rule.
    #[error("validation failed: {0}")]
    Validation(ValidationError),

    /// The total could not be represented (negative, or arithmetic overflow).
    #[error("conversion error: {0}")]
    Conversion(String),

    /// The template renderer, document converter or filesystem failed.
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

impl InvoiceError {
    /// Coarse failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conversion(_) => ErrorKind::Conversion,
            Self::Collaborator(_) => ErrorKind::Collaborator,
        }
    }

    /// The validation failure, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for InvoiceError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

/// Failure category of an [`InvoiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conversion,
    Collaborator,
}

/// Errors raised by the external collaborators of the pipeline.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CollaboratorError {
    /// The configured template file does not exist or cannot be read.
    #[error("template not found: '{}'", path.display())]
    TemplateNotFound { path: PathBuf },

    /// The template could not be parsed or rendered.
    #[error("template error: {0}")]
    Template(String),

    /// Markup could not be converted into the fixed-layout document.
    #[error("document conversion failed: {0}")]
    Conversion(String),

    /// An output artifact could not be written.
    #[error("failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The rule a [`ValidationError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationRule {
    /// A required top-level field is absent.
    RequiredField,
    /// A date does not match `YYYY-MM-DD`.
    DateFormat,
    /// A date matches the pattern but is not a real calendar date.
    CalendarDate,
    /// `items` is missing, not a list, or empty.
    Items,
    UnitPrice,
    Quantity,
    Discount,
    TaxRate,
    /// Discount exceeds the gross line amount.
    NetAmount,
}

impl ValidationRule {
    /// Short identifier used in messages.
    pub fn code(&self) -> &'static str {
        match self {
            Self::RequiredField => "required-field",
            Self::DateFormat => "date-format",
            Self::CalendarDate => "calendar-date",
            Self::Items => "items",
            Self::UnitPrice => "unit-price",
            Self::Quantity => "quantity",
            Self::Discount => "discount",
            Self::TaxRate => "tax-rate",
            Self::NetAmount => "net-amount",
        }
    }
}

/// A single validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Path to the offending field (e.g. "seller_gst", "items[1].quantity").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
    /// The rule that failed.
    pub rule: ValidationRule,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.rule.code(), self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn new(
        field: impl Into<String>,
        message: impl Into<String>,
        rule: ValidationRule,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule,
        }
    }
}

/// Errors loading the configuration file. These are fatal at startup and
/// never pass through the pipeline.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
