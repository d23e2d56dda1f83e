//! Persistable sketch documents.

use crate::stroke::Stroke;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Finished strokes of one sketch plus an optional raster preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchDocument {
    pub id: String,
    pub name: String,
    /// Backing width in pixels.
    pub width: u32,
    /// Backing height in pixels.
    pub height: u32,
    pub strokes: Vec<Stroke>,
    /// Base64-encoded PNG of the surface at the time of saving.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_png: Option<String>,
}

impl SketchDocument {
    /// Create an empty sketch for a raster of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: "Untitled".to_string(),
            width,
            height,
            strokes: Vec::new(),
            preview_png: None,
        }
    }

    pub fn add_stroke(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
    }

    /// Total number of raw samples across all strokes.
    pub fn sample_count(&self) -> usize {
        self.strokes.iter().map(Stroke::len).sum()
    }

    /// Drop every stroke and the preview.
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.preview_png = None;
    }

    /// Store encoded PNG bytes as the preview.
    pub fn set_preview_png(&mut self, png: &[u8]) {
        self.preview_png = Some(BASE64.encode(png));
    }

    /// Decode the preview, if one is stored and valid.
    pub fn preview_png_bytes(&self) -> Option<Vec<u8>> {
        let encoded = self.preview_png.as_ref()?;
        match BASE64.decode(encoded) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("Sketch {} has a corrupt preview: {}", self.id, e);
                None
            }
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
