//! Outcome report of one generation

use serde::Serialize;

/// Which signature path ran
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SignatureKind {
    #[default]
    None,
    Uploaded,
    Drawn,
}

/// Result of writing one template field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum FieldOutcome {
    Written,
    Skipped { reason: String },
}

/// Outcome for a named template field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReport {
    pub field: String,
    pub outcome: FieldOutcome,
}

/// Everything a generation did, returned alongside the PDF
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillReport {
    /// Text fields then checkboxes, in layout order
    pub fields: Vec<FieldReport>,
    /// Checkboxes that received a rejection slash
    pub slashes: Vec<String>,
    pub signature: SignatureKind,
    pub appended_pages: usize,
    /// Human-readable warnings, including every skipped field
    pub warnings: Vec<String>,
}

impl FillReport {
    /// Outcome recorded for a field
    pub fn outcome(&self, field: &str) -> Option<&FieldOutcome> {
        self.fields
            .iter()
            .find(|f| f.field == field)
            .map(|f| &f.outcome)
    }

    /// Fields that could not be written
    pub fn skipped(&self) -> impl Iterator<Item = &FieldReport> {
        self.fields
            .iter()
            .filter(|f| matches!(f.outcome, FieldOutcome::Skipped { .. }))
    }

    pub(crate) fn record(&mut self, field: &str, outcome: FieldOutcome) {
        if let FieldOutcome::Skipped { reason } = &outcome {
            tracing::warn!(field, %reason, "skipping template field");
            self.warnings.push(format!("{field}: {reason}"));
        }

        self.fields.push(FieldReport {
            field: field.to_string(),
            outcome,
        });
    }

    pub(crate) fn warn(&mut self, message: String) {
        tracing::warn!("{message}");
        self.warnings.push(message);
    }
}
