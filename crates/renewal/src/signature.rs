//! Freehand signature capture
//!
//! `SignaturePad` mirrors the drawing canvas of the renewal UI: pointer
//! positions arrive in client (CSS) coordinates, are mapped onto the backing
//! raster and joined with round-capped strokes.

use crate::record::Signature;
use crate::{RenewalError, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use image::{ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Default backing raster width in pixels
pub const DEFAULT_WIDTH: u32 = 500;
/// Default backing raster height in pixels
pub const DEFAULT_HEIGHT: u32 = 150;
/// Stroke width in backing pixels
const STROKE_WIDTH: f64 = 2.0;
const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// How the user supplies a signature
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignatureMode {
    #[default]
    Upload,
    Draw,
}

/// Displayed bounds of the pad in client coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Signature drawing surface backed by an RGBA raster
pub struct SignaturePad {
    raster: RgbaImage,
    mode: SignatureMode,
    drawing: bool,
    /// Origin of the next stroke segment, in backing pixels
    last_point: Option<(f64, f64)>,
}

impl Default for SignaturePad {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl SignaturePad {
    /// Create a transparent pad with the given backing size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            raster: RgbaImage::new(width, height),
            mode: SignatureMode::default(),
            drawing: false,
            last_point: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn mode(&self) -> SignatureMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: SignatureMode) {
        self.mode = mode;
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// RGBA pixels, row-major, for display on a canvas
    pub fn pixels(&self) -> &[u8] {
        self.raster.as_raw()
    }

    /// Whether nothing has been drawn
    pub fn is_blank(&self) -> bool {
        self.raster.pixels().all(|p| p[3] == 0)
    }

    pub fn pointer_down(&mut self) {
        self.drawing = true;
    }

    /// Extend the stroke to a pointer position
    ///
    /// Ignored unless a stroke is in progress in draw mode. The first move
    /// of a stroke only sets its origin.
    pub fn pointer_move(&mut self, client_x: f64, client_y: f64, rect: ClientRect) {
        if !self.drawing || self.mode != SignatureMode::Draw {
            return;
        }
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return;
        }

        let scale_x = self.raster.width() as f64 / rect.width;
        let scale_y = self.raster.height() as f64 / rect.height;
        let point = (
            (client_x - rect.left) * scale_x,
            (client_y - rect.top) * scale_y,
        );

        if let Some(from) = self.last_point {
            self.stroke_segment(from, point);
        }
        self.last_point = Some(point);
    }

    pub fn pointer_up(&mut self) {
        self.end_stroke();
    }

    pub fn pointer_leave(&mut self) {
        self.end_stroke();
    }

    fn end_stroke(&mut self) {
        self.drawing = false;
        self.last_point = None;
    }

    /// Wipe the raster back to transparent
    pub fn clear(&mut self) {
        for pixel in self.raster.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
        self.last_point = None;
    }

    /// Encode the raster as PNG
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.raster
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| RenewalError::ImageError(e.to_string()))?;
        Ok(buffer)
    }

    /// PNG data URL of the raster
    pub fn to_data_url(&self) -> Result<String> {
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(self.to_png()?)))
    }

    /// Save the drawing as a signature for the record
    pub fn save(&self) -> Result<Signature> {
        Ok(Signature::Drawn(self.to_data_url()?))
    }

    /// Rasterize a round-capped segment of `STROKE_WIDTH`
    ///
    /// A pixel is inked when its center lies within half the stroke width of
    /// the segment.
    fn stroke_segment(&mut self, from: (f64, f64), to: (f64, f64)) {
        let radius = STROKE_WIDTH / 2.0;
        let (width, height) = (self.raster.width() as f64, self.raster.height() as f64);

        let min_x = (from.0.min(to.0) - radius).floor().clamp(0.0, width);
        let max_x = (from.0.max(to.0) + radius).ceil().clamp(0.0, width);
        let min_y = (from.1.min(to.1) - radius).floor().clamp(0.0, height);
        let max_y = (from.1.max(to.1) + radius).ceil().clamp(0.0, height);

        for py in min_y as u32..max_y as u32 {
            for px in min_x as u32..max_x as u32 {
                let center = (px as f64 + 0.5, py as f64 + 0.5);
                if distance_to_segment(center, from, to) <= radius {
                    self.raster.put_pixel(px, py, INK);
                }
            }
        }
    }
}

/// Distance from point `p` to the segment `a`-`b`
fn distance_to_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let length_sq = dx * dx + dy * dy;

    let t = if length_sq == 0.0 {
        0.0
    } else {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / length_sq).clamp(0.0, 1.0)
    };

    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}
