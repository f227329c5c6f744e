//! One generation request: load, fill, flatten, annotate, serialize

use crate::annotator::Annotator;
use crate::layout::RenewalLayout;
use crate::mapper::{FieldMapper, TemplateDocument};
use crate::record::FormRecord;
use crate::report::FillReport;
use crate::Result;
use std::path::Path;
use tracing::debug;

/// The finished renewal PDF
#[derive(Debug, Clone)]
pub struct GeneratedPdf {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
    pub report: FillReport,
}

/// Generates filled renewal PDFs from a template
///
/// # Example
/// ```ignore
/// let generator = RenewalGenerator::default();
/// let output = generator.generate(&template_bytes, record)?;
/// assert_eq!(output.file_name, "CFC_Renewal_Filled.pdf");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RenewalGenerator {
    layout: RenewalLayout,
}

impl RenewalGenerator {
    pub fn new(layout: RenewalLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &RenewalLayout {
        &self.layout
    }

    /// Generate the filled PDF from template bytes
    ///
    /// Missing template fields are skipped and listed in the report; any
    /// other failure aborts the whole generation.
    pub fn generate(&self, template: &[u8], record: FormRecord) -> Result<GeneratedPdf> {
        let template = TemplateDocument::from_bytes(template)?;
        self.generate_from(template, record)
    }

    /// Generate the filled PDF from a template file
    pub fn generate_from_path<P: AsRef<Path>>(
        &self,
        template: P,
        record: FormRecord,
    ) -> Result<GeneratedPdf> {
        let template = TemplateDocument::open(template)?;
        self.generate_from(template, record)
    }

    fn generate_from(&self, template: TemplateDocument, record: FormRecord) -> Result<GeneratedPdf> {
        let mut report = FillReport::default();

        let mut doc = FieldMapper::new(&self.layout).fill(template, &record, &mut report)?;
        debug!(
            written = report.fields.len() - report.skipped().count(),
            skipped = report.skipped().count(),
            "filled template fields"
        );

        Annotator::new(&self.layout).annotate(&mut doc, &record, &mut report)?;

        let bytes = doc.to_bytes()?;
        debug!(size = bytes.len(), "serialized renewal PDF");

        Ok(GeneratedPdf {
            bytes,
            file_name: self.layout.output.file_name.clone(),
            mime_type: self.layout.output.mime_type.clone(),
            report,
        })
    }
}
