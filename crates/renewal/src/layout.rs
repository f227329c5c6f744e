//! Template layout configuration
//!
//! Describes which template fields receive which record values and where the
//! annotations go. `RenewalLayout::default()` is the layout of the CFC
//! renewal form; other template revisions can be described in JSON.

use crate::record::FormRecord;
use crate::{RenewalError, Result};
use serde::{Deserialize, Serialize};

/// A point in PDF user space (origin bottom-left, points)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Text values of a `FormRecord`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RecordField {
    Date,
    ContactName,
    Position,
    CompanyName,
    PolicyNumber,
    LastYearRevenue,
    CurrentYearRevenue,
    LastIntlRevenuePercent,
    CurrentIntlRevenuePercent,
    EmployeeCount,
    CurrentPayroll,
    BusinessDescription,
    PropertySumDetails,
    ClaimDetails,
    AdditionalInfo,
}

impl RecordField {
    /// Read this field from a record
    pub fn value<'a>(&self, record: &'a FormRecord) -> &'a str {
        match self {
            Self::Date => &record.date,
            Self::ContactName => &record.contact_name,
            Self::Position => &record.position,
            Self::CompanyName => &record.company_name,
            Self::PolicyNumber => &record.policy_number,
            Self::LastYearRevenue => &record.last_year_revenue,
            Self::CurrentYearRevenue => &record.current_year_revenue,
            Self::LastIntlRevenuePercent => &record.last_intl_revenue_percent,
            Self::CurrentIntlRevenuePercent => &record.current_intl_revenue_percent,
            Self::EmployeeCount => &record.employee_count,
            Self::CurrentPayroll => &record.current_payroll,
            Self::BusinessDescription => &record.business_description,
            Self::PropertySumDetails => &record.property_sum_details,
            Self::ClaimDetails => &record.claim_details,
            Self::AdditionalInfo => &record.additional_info,
        }
    }
}

/// Boolean values of a `FormRecord`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RecordFlag {
    PropertySumChanged,
    AwareOfClaims,
    WantQuote,
}

impl RecordFlag {
    /// Read this flag from a record
    pub fn value(&self, record: &FormRecord) -> bool {
        match self {
            Self::PropertySumChanged => record.property_sum_changed,
            Self::AwareOfClaims => record.aware_of_claims,
            Self::WantQuote => record.want_quote,
        }
    }
}

/// How a record value is written into its field
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ValueFormat {
    /// Written as entered
    #[default]
    Plain,
    /// ISO date rewritten as MM/DD/YYYY
    UsDate,
}

/// Binds a template text field to a record value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextBinding {
    /// Fully qualified template field name
    pub field: String,
    pub source: RecordField,
    #[serde(default)]
    pub format: ValueFormat,
}

impl TextBinding {
    pub fn new(field: &str, source: RecordField) -> Self {
        Self {
            field: field.to_string(),
            source,
            format: ValueFormat::Plain,
        }
    }

    pub fn date(field: &str, source: RecordField) -> Self {
        Self {
            format: ValueFormat::UsDate,
            ..Self::new(field, source)
        }
    }
}

/// Binds a template checkbox to a record flag
///
/// When the flag is false a rejection slash is drawn relative to `anchor`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckboxAnnotation {
    /// Fully qualified template field name
    pub field: String,
    pub condition: RecordFlag,
    pub anchor: Point,
}

impl CheckboxAnnotation {
    pub fn new(field: &str, condition: RecordFlag, x: f64, y: f64) -> Self {
        Self {
            field: field.to_string(),
            condition,
            anchor: Point::new(x, y),
        }
    }
}

/// Geometry of the rejection slash
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SlashStyle {
    /// Page the slashes are drawn on (1-indexed)
    pub page: usize,
    /// Start of the slash relative to the checkbox anchor
    pub offset: Point,
    /// Extent of the slash from its start
    pub extent: Point,
    /// Stroke width in points
    pub width: f64,
}

impl Default for SlashStyle {
    fn default() -> Self {
        Self {
            page: 1,
            offset: Point::new(22.0, 6.0),
            extent: Point::new(8.0, -8.0),
            width: 2.0,
        }
    }
}

/// Where and how large a signature image is drawn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignaturePlacement {
    /// Lower-left corner of the image
    pub position: Point,
    /// Factor applied to the image's pixel size
    pub scale: f64,
}

/// Signature placements per signature source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SignatureLayout {
    /// Page the signature is drawn on (1-indexed)
    pub page: usize,
    pub uploaded: SignaturePlacement,
    pub drawn: SignaturePlacement,
}

impl Default for SignatureLayout {
    fn default() -> Self {
        Self {
            page: 1,
            uploaded: SignaturePlacement {
                position: Point::new(170.0, 30.0),
                scale: 0.07,
            },
            drawn: SignaturePlacement {
                position: Point::new(150.0, 42.0),
                scale: 0.2,
            },
        }
    }
}

/// A line of text on a notice page
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextPlacement {
    /// Baseline start of the first line
    pub position: Point,
    /// Font size in points
    pub size: f32,
}

/// Layout of the appended notice pages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NoticeLayout {
    pub heading: TextPlacement,
    pub body: TextPlacement,
    /// Distance between body baselines
    pub line_height: f64,
    /// Lowest baseline a body line may use
    pub bottom_margin: f64,
    /// Maximum characters per wrapped body line
    pub wrap_chars: usize,
}

impl Default for NoticeLayout {
    fn default() -> Self {
        Self {
            heading: TextPlacement {
                position: Point::new(50.0, 750.0),
                size: 14.0,
            },
            body: TextPlacement {
                position: Point::new(50.0, 730.0),
                size: 10.0,
            },
            line_height: 12.0,
            bottom_margin: 50.0,
            wrap_chars: 95,
        }
    }
}

/// Name and type of the generated file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputConfig {
    pub file_name: String,
    pub mime_type: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file_name: "CFC_Renewal_Filled.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
        }
    }
}

/// Complete layout of a renewal template
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RenewalLayout {
    pub text_fields: Vec<TextBinding>,
    /// Checkbox bindings, in drawing order
    pub checkboxes: Vec<CheckboxAnnotation>,
    pub slash: SlashStyle,
    pub signature: SignatureLayout,
    pub notice: NoticeLayout,
    pub output: OutputConfig,
}

impl Default for RenewalLayout {
    fn default() -> Self {
        use RecordField::*;

        Self {
            text_fields: vec![
                TextBinding::date("Text field 101053", Date),
                TextBinding::new("Text field 1030", ContactName),
                TextBinding::new("Text field 1024", Position),
                TextBinding::new("CompanyName", CompanyName),
                TextBinding::new("PolicyNumber", PolicyNumber),
                TextBinding::new("Text field 1048", LastYearRevenue),
                TextBinding::new("Text field 1044", CurrentYearRevenue),
                TextBinding::new("Text field 1047", LastIntlRevenuePercent),
                TextBinding::new("Text field 1046b", CurrentIntlRevenuePercent),
                TextBinding::new("Text field 1046", EmployeeCount),
                TextBinding::new("Text field 1042", CurrentPayroll),
                TextBinding::new("Text field 1029", BusinessDescription),
                TextBinding::new("Text field 1031", PropertySumDetails),
                TextBinding::new("Text field 1032", AdditionalInfo),
            ],
            checkboxes: vec![
                CheckboxAnnotation::new("Check Box 24", RecordFlag::PropertySumChanged, 275.0, 534.0),
                CheckboxAnnotation::new("Check Box 20", RecordFlag::AwareOfClaims, 181.0, 423.5),
                CheckboxAnnotation::new("Check Box 22", RecordFlag::WantQuote, 504.0, 381.0),
            ],
            slash: SlashStyle::default(),
            signature: SignatureLayout::default(),
            notice: NoticeLayout::default(),
            output: OutputConfig::default(),
        }
    }
}

impl RenewalLayout {
    /// Parse a layout from JSON; omitted sections keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let layout: Self = serde_json::from_str(json)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Serialize the layout to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject layouts that cannot be drawn
    pub fn validate(&self) -> Result<()> {
        if self.slash.page == 0 || self.signature.page == 0 {
            return Err(RenewalError::LayoutError(
                "Page numbers start at 1".to_string(),
            ));
        }

        for placement in [&self.signature.uploaded, &self.signature.drawn] {
            if !(placement.scale.is_finite() && placement.scale > 0.0) {
                return Err(RenewalError::LayoutError(format!(
                    "Signature scale must be positive, got {}",
                    placement.scale
                )));
            }
        }

        if self.notice.line_height <= 0.0 {
            return Err(RenewalError::LayoutError(
                "Notice line height must be positive".to_string(),
            ));
        }

        if self.output.file_name.is_empty() {
            return Err(RenewalError::LayoutError(
                "Output file name is empty".to_string(),
            ));
        }

        Ok(())
    }
}
