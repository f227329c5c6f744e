//! Renewal form record

use crate::{RenewalError, Result};
use serde::{Deserialize, Serialize};

/// Signature supplied with the record
///
/// Exactly one source can be present: storing a drawn signature replaces an
/// uploaded one and vice versa.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum Signature {
    #[default]
    None,
    /// Image file bytes (PNG or JPEG), base64 in JSON
    Uploaded(#[serde(with = "base64_bytes")] Vec<u8>),
    /// Base64 PNG, optionally as a `data:image/png;base64,` URL
    Drawn(String),
}

impl Signature {
    /// Whether the signature carries any data
    pub fn is_present(&self) -> bool {
        match self {
            Signature::None => false,
            Signature::Uploaded(bytes) => !bytes.is_empty(),
            Signature::Drawn(data) => !data.is_empty(),
        }
    }
}

/// Reference to the claim document attached in the UI
///
/// Only the name is kept; the file contents never reach the PDF.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedFile {
    pub name: String,
}

/// Flat record of everything the renewal form collects
///
/// Keys match the UI field names; absent values deserialize to empty
/// strings and `false`.
///
/// Generation expects a record that already passed
/// [`FormRecord::validate_contact_stage`]: a date that is not ISO
/// `YYYY-MM-DD` aborts generation with `RenewalError::InvalidDate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormRecord {
    // Section one: contact and signature
    pub contact_name: String,
    pub position: String,
    /// ISO date (YYYY-MM-DD)
    pub date: String,
    pub signature: Signature,

    // Section two: renewal details
    pub company_name: String,
    pub policy_number: String,
    pub last_year_revenue: String,
    pub current_year_revenue: String,
    pub last_intl_revenue_percent: String,
    pub current_intl_revenue_percent: String,
    pub employee_count: String,
    pub current_payroll: String,
    pub business_description: String,
    pub property_sum_changed: bool,
    pub property_sum_details: String,
    pub aware_of_claims: bool,
    pub claim_details: String,
    pub claim_file: Option<AttachedFile>,
    pub want_quote: bool,
    pub additional_info: String,
}

impl FormRecord {
    /// Parse a record from the UI's JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Replace the signature, discarding any previous one
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = signature;
        self
    }

    /// Check the fields the first form section requires
    ///
    /// Contact name, position, date and a signature are mandatory, and the
    /// date must be a valid ISO date. The second section has no required
    /// fields.
    pub fn validate_contact_stage(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.contact_name.is_empty() {
            missing.push("contactName");
        }
        if self.position.is_empty() {
            missing.push("position");
        }
        if !self.signature.is_present() {
            missing.push("signature");
        }
        if self.date.is_empty() {
            missing.push("date");
        }

        if !missing.is_empty() {
            return Err(RenewalError::Incomplete(missing));
        }

        crate::mapper::format_display_date(&self.date).map(|_| ())
    }
}

/// Serde adapter storing bytes as standard base64
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.trim())
            .map_err(serde::de::Error::custom)
    }
}
