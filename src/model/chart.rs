//! Chart regions, icon glyphs and raster images.

use serde::{Deserialize, Serialize};

use super::{BBox, ShapeId};

/// Encoded image bytes produced by a rasterizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterImage {
    /// Encoding of `data` (e.g. "png")
    pub format: String,
    pub width_px: u32,
    pub height_px: u32,
    pub data: Vec<u8>,
}

/// A cluster of shapes flattened to one raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRegion {
    /// Padded region that was rendered
    pub bbox: BBox,

    /// Shapes replaced by the raster
    pub members: Vec<ShapeId>,

    /// Render zoom (dpi / 72)
    pub zoom: f32,

    pub raster: RasterImage,

    pub is_chart: bool,
}

/// An icon-font glyph rendered to a picture instead of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconImage {
    /// Glyph box as drawn
    pub bbox: BBox,

    /// Padded region that was rendered
    pub clip: BBox,

    /// The glyph text, usually a Private Use Area code point
    pub glyph: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,

    pub raster: RasterImage,
}

/// An embedded picture passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageElement {
    pub bbox: BBox,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default)]
    pub data: Vec<u8>,
}
