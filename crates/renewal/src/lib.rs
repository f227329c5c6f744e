//! Renewal Form - fills the CFC insurance renewal PDF
//!
//! This crate provides:
//! - The `FormRecord` collected by the renewal UI
//! - Field mapping onto the fillable template, followed by flattening
//! - Annotation of the flattened page (rejection slashes, signature image)
//!   and the appended claim notice pages
//! - A freehand signature pad that rasterizes pointer input to a PNG
//!
//! # Example
//!
//! ```ignore
//! use renewal_form::{FormRecord, RenewalGenerator};
//!
//! let template = std::fs::read("CFC_Renewal_Form.pdf")?;
//! let record: FormRecord = serde_json::from_str(record_json)?;
//! record.validate_contact_stage()?;
//!
//! let output = RenewalGenerator::default().generate(&template, record)?;
//! std::fs::write(&output.file_name, &output.bytes)?;
//! ```

mod annotator;
mod generator;
pub mod layout;
mod mapper;
mod record;
mod report;
mod signature;

pub use annotator::{decode_data_url, slash_segment, Annotator};
pub use generator::{GeneratedPdf, RenewalGenerator};
pub use layout::RenewalLayout;
pub use mapper::{format_display_date, FieldMapper, FlattenedDocument, TemplateDocument};
pub use record::{AttachedFile, FormRecord, Signature};
pub use report::{FieldOutcome, FieldReport, FillReport, SignatureKind};
pub use signature::{ClientRect, SignatureMode, SignaturePad};

use thiserror::Error;

/// Errors that can occur while generating the renewal PDF
#[derive(Debug, Error)]
pub enum RenewalError {
    #[error("Failed to load template: {0}")]
    TemplateLoad(String),

    #[error("Invalid date: {0}. Expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Failed to decode signature: {0}")]
    SignatureDecode(String),

    #[error("Missing required fields: {}", .0.join(", "))]
    Incomplete(Vec<&'static str>),

    #[error("Invalid layout: {0}")]
    LayoutError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("PDF error: {0}")]
    PdfError(#[from] pdf_core::PdfError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type for renewal operations
pub type Result<T> = std::result::Result<T, RenewalError>;
