//! # gstbill
//!
//! GST tax invoice generation: field validation, the CGST/SGST versus IGST
//! split, amount in words, HTML rendering and PDF output.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//! Calculation is exact; amounts are only formatted when rendered.
//!
//! ## Quick Start
//!
//! ```rust
//! use gstbill::core::*;
//! use rust_decimal_macros::dec;
//!
//! let addressee = Addressee::new("Customer Name", "456 Billing St.", "Mumbai", "Maharashtra", "400001", "27");
//! let record = InvoiceRecordBuilder::new("INV123", "2024-01-02")
//!     .seller(SellerDetails::new("Example Seller", "123 Seller St.", "Pune", "Maharashtra", "411001")
//!         .pan("ABCDE1234F")
//!         .gst("27ABCDE1234F1Z5"))
//!     .billing(addressee.clone())
//!     .shipping(addressee)
//!     .order("ORD123", "2024-01-01")
//!     .places("Maharashtra", "Maharashtra")
//!     .add_item(LineItemBuilder::new("Item 1", dec!(100), 2).discount(dec!(10)).build())
//!     .add_item(LineItemBuilder::new("Item 2", dec!(200), 1).build())
//!     .build()
//!     .unwrap();
//!
//! let invoice = compute(&record, &EnglishWords).unwrap();
//! assert_eq!(invoice.tax_split, TaxSplit::IntraState);
//! assert_eq!(invoice.items[0].cgst_amount, dec!(17.1));
//! assert_eq!(invoice.total_amount, dec!(460.2));
//! assert_eq!(invoice.amount_in_words, "Four hundred and sixty point two");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Invoice types, validation, tax calculation, pipeline, config |
//! | `html` (default) | Jinja-style HTML template renderer |
//! | `pdf` (default) | HTML to PDF document converter |
//! | `cli` | `gstbill` command-line binary |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "html")]
pub mod html;

#[cfg(feature = "pdf")]
pub mod pdf;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
