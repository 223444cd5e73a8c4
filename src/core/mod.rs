//! Core invoice types, validation, tax calculation and the generation pipeline.
//!
//! This module holds everything that does not depend on a concrete template
//! engine or document format: the submission model, the field validator, the
//! CGST/SGST/IGST calculator, amount-in-words and the orchestrating
//! [`InvoicePipeline`].

mod builder;
mod calculation;
mod config;
mod error;
mod observer;
mod pipeline;
mod types;
mod validation;
mod words;

pub use builder::*;
pub use calculation::*;
pub use config::*;
pub use error::*;
pub use observer::*;
pub use pipeline::*;
pub use types::*;
pub use validation::*;
pub use words::*;
