//! Writes record values into the template form and flattens it

use crate::layout::{RenewalLayout, TextBinding, ValueFormat};
use crate::record::FormRecord;
use crate::report::{FieldOutcome, FillReport};
use crate::{RenewalError, Result};
use chrono::NaiveDate;
use pdf_core::{PdfDocument, PdfError};
use std::path::Path;
use tracing::debug;

/// Rewrite an ISO date (YYYY-MM-DD) as MM/DD/YYYY
///
/// An empty date stays empty.
///
/// # Example
/// ```
/// use renewal_form::format_display_date;
/// assert_eq!(format_display_date("2024-03-05").unwrap(), "03/05/2024");
/// assert_eq!(format_display_date("").unwrap(), "");
/// ```
pub fn format_display_date(iso_date: &str) -> Result<String> {
    if iso_date.is_empty() {
        return Ok(String::new());
    }

    let date = NaiveDate::parse_from_str(iso_date, "%Y-%m-%d")
        .map_err(|_| RenewalError::InvalidDate(iso_date.to_string()))?;
    Ok(date.format("%m/%d/%Y").to_string())
}

/// The fillable template, loaded fresh for each generation
pub struct TemplateDocument {
    doc: PdfDocument,
}

impl TemplateDocument {
    /// Load the template from bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let doc = PdfDocument::open_from_bytes(data)
            .map_err(|e| RenewalError::TemplateLoad(e.to_string()))?;
        Ok(Self { doc })
    }

    /// Load the template from a file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let doc = PdfDocument::open(path).map_err(|e| RenewalError::TemplateLoad(e.to_string()))?;
        Ok(Self { doc })
    }

    /// Fully qualified names of the template's form fields
    pub fn field_names(&self) -> Vec<String> {
        self.doc
            .form_fields()
            .map(|fields| fields.into_iter().map(|f| f.name).collect())
            .unwrap_or_default()
    }
}

/// A template whose form has been flattened
///
/// Only drawing and page operations remain available, so no field can be
/// written after flattening.
pub struct FlattenedDocument {
    doc: PdfDocument,
}

impl FlattenedDocument {
    pub fn page_count(&self) -> usize {
        self.doc.page_count()
    }

    /// Page content as it will be written, for inspection
    pub fn page_content(&self, page: usize) -> Result<Vec<u8>> {
        Ok(self.doc.page_content(page)?)
    }

    /// Serialize the finished document
    pub fn to_bytes(mut self) -> Result<Vec<u8>> {
        Ok(self.doc.to_bytes()?)
    }

    pub(crate) fn pdf_mut(&mut self) -> &mut PdfDocument {
        &mut self.doc
    }
}

/// Lookup failures that skip a field instead of failing the generation
fn skip_reason(err: &PdfError) -> Option<String> {
    match err {
        PdfError::NoForm | PdfError::FieldNotFound(_) | PdfError::FieldTypeMismatch { .. } => {
            Some(err.to_string())
        }
        _ => None,
    }
}

/// Maps a `FormRecord` onto the template's named fields
pub struct FieldMapper<'a> {
    layout: &'a RenewalLayout,
}

impl<'a> FieldMapper<'a> {
    pub fn new(layout: &'a RenewalLayout) -> Self {
        Self { layout }
    }

    /// Text written into a bound field
    pub fn render_value(&self, binding: &TextBinding, record: &FormRecord) -> Result<String> {
        let value = binding.source.value(record);
        match binding.format {
            ValueFormat::Plain => Ok(value.to_string()),
            ValueFormat::UsDate => format_display_date(value),
        }
    }

    /// Write all text fields and checkboxes, then flatten the form
    ///
    /// Missing fields are recorded as skipped in `report`. Flattening
    /// consumes the template, so it is always the last field operation.
    pub fn fill(
        &self,
        template: TemplateDocument,
        record: &FormRecord,
        report: &mut FillReport,
    ) -> Result<FlattenedDocument> {
        // Render every value first so a bad date fails before any write
        let mut values = Vec::with_capacity(self.layout.text_fields.len());
        for binding in &self.layout.text_fields {
            values.push((binding, self.render_value(binding, record)?));
        }

        let mut doc = template.doc;

        for (binding, value) in values {
            let outcome = match doc.set_text_field(&binding.field, &value) {
                Ok(replaced) => {
                    if replaced > 0 {
                        report.warn(format!(
                            "{}: {replaced} character(s) cannot be shown in Helvetica",
                            binding.field
                        ));
                    }
                    FieldOutcome::Written
                }
                Err(e) => match skip_reason(&e) {
                    Some(reason) => FieldOutcome::Skipped { reason },
                    None => return Err(e.into()),
                },
            };
            report.record(&binding.field, outcome);
        }

        for checkbox in &self.layout.checkboxes {
            let checked = checkbox.condition.value(record);
            let outcome = match doc.set_check_box(&checkbox.field, checked) {
                Ok(()) => FieldOutcome::Written,
                Err(e) => match skip_reason(&e) {
                    Some(reason) => FieldOutcome::Skipped { reason },
                    None => return Err(e.into()),
                },
            };
            report.record(&checkbox.field, outcome);
        }

        let baked = doc.flatten_form()?;
        debug!(widgets = baked, "flattened form");

        Ok(FlattenedDocument { doc })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::RecordField;

    #[test]
    fn test_format_display_date() {
        assert_eq!(format_display_date("2024-03-05").unwrap(), "03/05/2024");
        assert_eq!(format_display_date("1999-12-31").unwrap(), "12/31/1999");
        assert_eq!(format_display_date("").unwrap(), "");
    }

    #[test]
    fn test_format_display_date_invalid() {
        for input in ["invalid", "05/03/2024", "2024-13-01", "2023-02-29"] {
            assert!(
                matches!(format_display_date(input), Err(RenewalError::InvalidDate(ref d)) if d == input),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_render_value() {
        let layout = RenewalLayout::default();
        let mapper = FieldMapper::new(&layout);
        let record = FormRecord {
            date: "2024-03-05".to_string(),
            position: "CFO".to_string(),
            ..Default::default()
        };

        let date = TextBinding::date("Text field 101053", RecordField::Date);
        assert_eq!(mapper.render_value(&date, &record).unwrap(), "03/05/2024");

        let position = TextBinding::new("Text field 1024", RecordField::Position);
        assert_eq!(mapper.render_value(&position, &record).unwrap(), "CFO");

        let payroll = TextBinding::new("Text field 1042", RecordField::CurrentPayroll);
        assert_eq!(mapper.render_value(&payroll, &record).unwrap(), "");
    }

    #[test]
    fn test_skip_reason() {
        assert!(skip_reason(&PdfError::FieldNotFound("CompanyName".to_string())).is_some());
        assert!(skip_reason(&PdfError::NoForm).is_some());
        assert!(skip_reason(&PdfError::SaveError("disk full".to_string())).is_none());
    }

    #[test]
    fn test_template_load_failure() {
        let result = TemplateDocument::from_bytes(b"not a pdf");
        assert!(matches!(result, Err(RenewalError::TemplateLoad(_))));
    }
}
