//! Draws on the flattened template: rejection slashes, the signature image
//! and the claim notice pages

use crate::layout::{Point, RenewalLayout, SignaturePlacement, SlashStyle};
use crate::mapper::FlattenedDocument;
use crate::record::{FormRecord, Signature};
use crate::report::{FillReport, SignatureKind};
use crate::{RenewalError, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use pdf_core::{simple_word_wrap, Color, PdfError};
use tracing::debug;

const CLAIM_HEADING: &str = "Claim Details:";
const FILE_HEADING: &str = "Attached File Notice:";

/// End points of the rejection slash for a checkbox anchored at `anchor`
///
/// The slash starts at `anchor + offset` and runs down-right by `extent`.
///
/// # Example
/// ```
/// use renewal_form::layout::{Point, SlashStyle};
/// use renewal_form::slash_segment;
///
/// let (from, to) = slash_segment(Point::new(275.0, 534.0), &SlashStyle::default());
/// assert_eq!(from, Point::new(297.0, 540.0));
/// assert_eq!(to, Point::new(305.0, 532.0));
/// ```
pub fn slash_segment(anchor: Point, style: &SlashStyle) -> (Point, Point) {
    let from = Point::new(anchor.x + style.offset.x, anchor.y + style.offset.y);
    let to = Point::new(from.x + style.extent.x, from.y + style.extent.y);
    (from, to)
}

/// Decode a base64 image, accepting an optional `data:` URL prefix
pub fn decode_data_url(data: &str) -> Result<Vec<u8>> {
    let payload = match data.strip_prefix("data:") {
        Some(url) => {
            let (header, payload) = url.split_once(',').ok_or_else(|| {
                RenewalError::SignatureDecode("Data URL has no payload".to_string())
            })?;
            if !header.ends_with(";base64") {
                return Err(RenewalError::SignatureDecode(format!(
                    "Data URL is not base64 encoded: data:{header}"
                )));
            }
            payload
        }
        None => data,
    };

    STANDARD
        .decode(payload.trim())
        .map_err(|e| RenewalError::SignatureDecode(e.to_string()))
}

/// Draws the post-flatten annotations described by a layout
pub struct Annotator<'a> {
    layout: &'a RenewalLayout,
}

impl<'a> Annotator<'a> {
    pub fn new(layout: &'a RenewalLayout) -> Self {
        Self { layout }
    }

    /// Apply every annotation for `record`
    pub fn annotate(
        &self,
        doc: &mut FlattenedDocument,
        record: &FormRecord,
        report: &mut FillReport,
    ) -> Result<()> {
        self.draw_slashes(doc, record, report)?;
        self.embed_signature(doc, &record.signature, report)?;
        self.append_notice_pages(doc, record, report)?;
        Ok(())
    }

    /// Draw a slash next to every checkbox whose condition is false
    pub fn draw_slashes(
        &self,
        doc: &mut FlattenedDocument,
        record: &FormRecord,
        report: &mut FillReport,
    ) -> Result<()> {
        let style = &self.layout.slash;

        for checkbox in &self.layout.checkboxes {
            if checkbox.condition.value(record) {
                continue;
            }

            let (from, to) = slash_segment(checkbox.anchor, style);
            doc.pdf_mut().draw_line(
                style.page,
                (from.x, from.y),
                (to.x, to.y),
                style.width,
                Color::black(),
            )?;
            debug!(field = %checkbox.field, x = from.x, y = from.y, "drew rejection slash");
            report.slashes.push(checkbox.field.clone());
        }

        Ok(())
    }

    /// Draw the signature image
    ///
    /// Exactly one path runs, chosen by the signature variant. An absent
    /// signature is skipped.
    pub fn embed_signature(
        &self,
        doc: &mut FlattenedDocument,
        signature: &Signature,
        report: &mut FillReport,
    ) -> Result<()> {
        let (kind, image, placement) = match signature {
            Signature::Uploaded(bytes) if !bytes.is_empty() => (
                SignatureKind::Uploaded,
                bytes.clone(),
                self.layout.signature.uploaded,
            ),
            Signature::Drawn(data) if !data.is_empty() => (
                SignatureKind::Drawn,
                decode_data_url(data)?,
                self.layout.signature.drawn,
            ),
            _ => {
                debug!("no signature supplied");
                return Ok(());
            }
        };

        let (width, height) = self.place_image(doc, &image, placement)?;
        debug!(?kind, width, height, "embedded signature");
        report.signature = kind;

        Ok(())
    }

    fn place_image(
        &self,
        doc: &mut FlattenedDocument,
        image: &[u8],
        placement: SignaturePlacement,
    ) -> Result<(f64, f64)> {
        let position = placement.position;
        doc.pdf_mut()
            .insert_image(
                image,
                self.layout.signature.page,
                position.x,
                position.y,
                placement.scale,
            )
            .map_err(|e| match e {
                PdfError::ImageError(message) => RenewalError::SignatureDecode(message),
                other => other.into(),
            })
    }

    /// Append the claim details page, and the attached file notice when a
    /// claim file was attached
    ///
    /// Nothing is appended unless the record reports known claims.
    pub fn append_notice_pages(
        &self,
        doc: &mut FlattenedDocument,
        record: &FormRecord,
        report: &mut FillReport,
    ) -> Result<()> {
        if !record.aware_of_claims {
            return Ok(());
        }

        self.append_notice_page(doc, CLAIM_HEADING, &record.claim_details, report)?;

        if let Some(file) = &record.claim_file {
            let body = format!("Filename: {}", file.name);
            self.append_notice_page(doc, FILE_HEADING, &body, report)?;
        }

        Ok(())
    }

    fn append_notice_page(
        &self,
        doc: &mut FlattenedDocument,
        heading: &str,
        body: &str,
        report: &mut FillReport,
    ) -> Result<()> {
        let notice = &self.layout.notice;
        let pdf = doc.pdf_mut();

        let page = pdf.add_blank_page()?;
        let mut replaced = pdf.insert_text(
            heading,
            page,
            notice.heading.position.x,
            notice.heading.position.y,
            notice.heading.size,
        )?;

        let lines = simple_word_wrap(body, notice.wrap_chars);
        let mut y = notice.body.position.y;
        for (drawn, line) in lines.iter().enumerate() {
            if y < notice.bottom_margin {
                report.warn(format!(
                    "{heading} text truncated after {drawn} of {} lines",
                    lines.len()
                ));
                break;
            }
            replaced += pdf.insert_text(line, page, notice.body.position.x, y, notice.body.size)?;
            y -= notice.line_height;
        }

        if replaced > 0 {
            report.warn(format!(
                "{heading} {replaced} character(s) cannot be shown in Helvetica"
            ));
        }

        debug!(page, heading, "appended notice page");
        report.appended_pages += 1;

        Ok(())
    }
}
