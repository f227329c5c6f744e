//! PDF Core - Low-level PDF manipulation
//!
//! This crate provides functionality for:
//! - Opening and saving PDF documents
//! - Filling AcroForm text fields and checkboxes
//! - Flattening form widgets into page content
//! - Drawing text (standard Helvetica), lines and images (JPEG, PNG)
//! - Appending blank pages
//!
//! All coordinates are PDF user space: origin at the bottom-left corner of
//! the page, in points.
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Color, PdfDocument};
//!
//! let mut doc = PdfDocument::open("form.pdf")?;
//! doc.set_text_field("CompanyName", "Acme Ltd")?;
//! doc.set_check_box("Check Box 22", true)?;
//! doc.flatten_form()?;
//! doc.draw_line(1, (297.0, 540.0), (305.0, 532.0), 2.0, Color::black())?;
//! let bytes = doc.to_bytes()?;
//! ```

mod document;
mod form;
mod image;
mod text;

pub use document::{Color, PdfDocument};
pub use form::{FieldKind, FormField};
pub use image::ImageXObject;
pub use text::{
    encode_win_ansi, generate_text_operators, simple_word_wrap, TextRenderContext, WinAnsiText,
};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to open PDF: {0}")]
    OpenError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Document has no interactive form")]
    NoForm,

    #[error("Form field not found: {0}")]
    FieldNotFound(String),

    #[error("Form field {name} is a {actual} field, expected {expected}")]
    FieldTypeMismatch {
        name: String,
        expected: FieldKind,
        actual: FieldKind,
    },

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Default page width for appended pages (A4, points)
pub const A4_WIDTH: f32 = 595.28;

/// Default page height for appended pages (A4, points)
pub const A4_HEIGHT: f32 = 841.89;
