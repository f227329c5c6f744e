//! WASM bindings for the renewal form generator
//!
//! This crate provides JavaScript-friendly API for:
//! - Generating the filled renewal PDF from a template and form record
//! - Capturing a freehand signature on a canvas
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { RenewalPdf, SignaturePad } from 'renewal-wasm';
//!
//! await init();
//!
//! const pad = new SignaturePad(500, 150);
//! pad.setMode('draw');
//! canvas.onmousedown = () => pad.pointerDown();
//! canvas.onmousemove = (e) => {
//!   const r = canvas.getBoundingClientRect();
//!   pad.pointerMove(e.clientX, e.clientY, r.left, r.top, r.width, r.height);
//! };
//! canvas.onmouseup = () => pad.pointerUp();
//! canvas.onmouseleave = () => pad.pointerLeave();
//!
//! const renewal = new RenewalPdf();
//! const output = renewal.generate(templateBytes, {
//!   contactName: 'Jane Doe',
//!   date: '2024-03-05',
//!   signature: { kind: 'drawn', data: pad.saveDataUrl() },
//! });
//! download(new Blob([output.bytes], { type: output.mimeType }), output.fileName);
//! ```

use renewal_form::{
    ClientRect, FormRecord, RenewalGenerator, RenewalLayout, Signature, SignatureMode,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Result handed back to JavaScript
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedOutput {
    #[serde(with = "serde_bytes_as_array")]
    bytes: Vec<u8>,
    file_name: String,
    mime_type: String,
    warnings: Vec<String>,
    report: renewal_form::FillReport,
}

/// Serialize bytes as a Uint8Array instead of a plain number array
mod serde_bytes_as_array {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(bytes)
    }
}

/// Renewal PDF generator
#[wasm_bindgen]
pub struct RenewalPdf {
    generator: RenewalGenerator,
}

#[wasm_bindgen]
impl RenewalPdf {
    /// Create a generator with the built-in renewal layout
    #[wasm_bindgen(constructor)]
    pub fn new() -> RenewalPdf {
        RenewalPdf {
            generator: RenewalGenerator::default(),
        }
    }

    /// Create a generator from a layout JSON
    ///
    /// Omitted layout sections keep their defaults.
    ///
    /// @param json - Layout JSON string
    /// @returns RenewalPdf instance
    #[wasm_bindgen(js_name = fromLayoutJson)]
    pub fn from_layout_json(json: &str) -> Result<RenewalPdf, JsValue> {
        let layout = RenewalLayout::from_json(json).map_err(to_js_error)?;
        Ok(RenewalPdf {
            generator: RenewalGenerator::new(layout),
        })
    }

    /// Layout in use, as JSON
    #[wasm_bindgen(js_name = layoutJson)]
    pub fn layout_json(&self) -> Result<String, JsValue> {
        self.generator.layout().to_json().map_err(to_js_error)
    }

    /// Check the contact stage of a record before submission
    ///
    /// @param record - Form record object
    /// @throws when contactName, position, signature or date is missing
    #[wasm_bindgen(js_name = validateContact)]
    pub fn validate_contact(&self, record: JsValue) -> Result<(), JsValue> {
        let record: FormRecord = serde_wasm_bindgen::from_value(record)?;
        record.validate_contact_stage().map_err(to_js_error)
    }

    /// Generate the filled renewal PDF
    ///
    /// @param template - Template PDF bytes (Uint8Array)
    /// @param record - Form record object
    /// @param uploadedSignature - Optional uploaded signature image bytes;
    ///   replaces any signature in `record`
    /// @returns { bytes, fileName, mimeType, warnings, report }
    pub fn generate(
        &self,
        template: &[u8],
        record: JsValue,
        uploaded_signature: Option<Vec<u8>>,
    ) -> Result<JsValue, JsValue> {
        let mut record: FormRecord = serde_wasm_bindgen::from_value(record)?;
        if let Some(bytes) = uploaded_signature {
            record.signature = Signature::Uploaded(bytes);
        }

        let output = self
            .generator
            .generate(template, record)
            .map_err(to_js_error)?;

        let result = GeneratedOutput {
            bytes: output.bytes,
            file_name: output.file_name,
            mime_type: output.mime_type,
            warnings: output.report.warnings.clone(),
            report: output.report,
        };
        Ok(serde_wasm_bindgen::to_value(&result)?)
    }
}

impl Default for RenewalPdf {
    fn default() -> Self {
        Self::new()
    }
}

/// Freehand signature canvas
#[wasm_bindgen]
pub struct SignaturePad {
    inner: renewal_form::SignaturePad,
}

#[wasm_bindgen]
impl SignaturePad {
    /// Create a transparent pad
    ///
    /// @param width - Backing canvas width in pixels
    /// @param height - Backing canvas height in pixels
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32) -> SignaturePad {
        SignaturePad {
            inner: renewal_form::SignaturePad::new(width, height),
        }
    }

    /// Switch between "upload" and "draw"
    #[wasm_bindgen(js_name = setMode)]
    pub fn set_mode(&mut self, mode: &str) -> Result<(), JsValue> {
        let mode = match mode {
            "upload" => SignatureMode::Upload,
            "draw" => SignatureMode::Draw,
            other => return Err(JsValue::from_str(&format!("Unknown signature mode: {other}"))),
        };
        self.inner.set_mode(mode);
        Ok(())
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self) {
        self.inner.pointer_down();
    }

    /// Extend the stroke to a pointer position
    ///
    /// @param clientX - Pointer x in client coordinates
    /// @param clientY - Pointer y in client coordinates
    /// @param left, top, width, height - Canvas bounding client rect
    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(
        &mut self,
        client_x: f64,
        client_y: f64,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
    ) {
        let rect = ClientRect {
            left,
            top,
            width,
            height,
        };
        self.inner.pointer_move(client_x, client_y, rect);
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self) {
        self.inner.pointer_up();
    }

    #[wasm_bindgen(js_name = pointerLeave)]
    pub fn pointer_leave(&mut self) {
        self.inner.pointer_leave();
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    #[wasm_bindgen(js_name = isBlank)]
    pub fn is_blank(&self) -> bool {
        self.inner.is_blank()
    }

    /// RGBA pixels for `ImageData`
    pub fn pixels(&self) -> Vec<u8> {
        self.inner.pixels().to_vec()
    }

    /// PNG data URL of the drawing, for the record's drawn signature
    #[wasm_bindgen(js_name = saveDataUrl)]
    pub fn save_data_url(&self) -> Result<String, JsValue> {
        self.inner.to_data_url().map_err(to_js_error)
    }
}
