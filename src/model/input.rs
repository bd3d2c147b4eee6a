//! Decoder records and their validation into page primitives.
//!
//! Records arrive as loosely typed JSON. Required fields are optional here so
//! that one malformed record can be reported and skipped without rejecting
//! the whole page.

use serde::{Deserialize, Serialize};

use super::{BBox, Color, ImageElement, Page, Shape, ShapeId, TextRun};
use crate::error::{Error, Result};

/// Decoder-specific corrections applied once per document during intake.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionCoefficients {
    /// Multiplier applied to every coordinate and size
    pub scale: f32,

    /// Multiplier applied to stroke widths after scaling
    pub stroke_width_scale: f32,

    /// Multiplier applied to font sizes after scaling
    pub font_size_scale: f32,
}

impl Default for CorrectionCoefficients {
    fn default() -> Self {
        Self {
            scale: 1.0,
            stroke_width_scale: 1.0,
            font_size_scale: 1.0,
        }
    }
}

/// A whole decoded document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentInput {
    #[serde(default)]
    pub coefficients: CorrectionCoefficients,

    pub pages: Vec<PageInput>,
}

/// One decoded page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageInput {
    /// Page number (1-indexed); defaults to the position in the document
    #[serde(default)]
    pub number: Option<u32>,

    pub width: f32,

    pub height: f32,

    #[serde(default)]
    pub texts: Vec<RawTextRun>,

    #[serde(default)]
    pub shapes: Vec<RawShape>,

    #[serde(default)]
    pub images: Vec<RawImage>,
}

/// Text run record as emitted by the decoder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTextRun {
    pub content: Option<String>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub x2: Option<f32>,
    pub y2: Option<f32>,
    pub font_size: Option<f32>,
    #[serde(default)]
    pub is_bold: bool,
    #[serde(default)]
    pub is_italic: bool,
    pub color: Option<String>,
    pub font_name: Option<String>,
}

/// Shape record as emitted by the decoder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawShape {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub fill_color: Option<String>,
    pub fill_opacity: Option<f32>,
    pub stroke_color: Option<String>,
    pub stroke_width: Option<f32>,
    #[serde(default)]
    pub line_count: u32,
    #[serde(default)]
    pub curve_count: u32,
}

/// Image record as emitted by the decoder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawImage {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub format: Option<String>,
    #[serde(default)]
    pub data: Vec<u8>,
}

fn required(value: Option<f32>, field: &str) -> Result<f32> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(Error::MalformedRecord(format!("{} is not finite ({})", field, v))),
        None => Err(Error::MalformedRecord(format!("missing {}", field))),
    }
}

/// Decoders write absent colors as null, "", or "None".
fn optional_color(value: Option<&str>) -> Result<Option<Color>> {
    match value.map(str::trim) {
        None | Some("") | Some("None") | Some("none") => Ok(None),
        Some(s) => s.parse().map(Some),
    }
}

fn checked_bbox(bbox: BBox) -> Result<BBox> {
    if bbox.is_valid() {
        Ok(bbox)
    } else {
        Err(Error::MalformedRecord(format!("inverted bbox {:?}", bbox)))
    }
}

impl RawTextRun {
    /// Validate into a [`TextRun`].
    pub fn to_run(&self, coeffs: &CorrectionCoefficients) -> Result<TextRun> {
        let content = self
            .content
            .clone()
            .ok_or_else(|| Error::MalformedRecord("missing content".to_string()))?;
        let bbox = checked_bbox(
            BBox::new(
                required(self.x, "x")?,
                required(self.y, "y")?,
                required(self.x2, "x2")?,
                required(self.y2, "y2")?,
            )
            .scaled(coeffs.scale),
        )?;
        // Without a font size the line height is the best estimate.
        let font_size = self
            .font_size
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(|s| s * coeffs.scale)
            .unwrap_or_else(|| bbox.height().max(1.0));

        let mut run = TextRun::new(content, bbox, font_size * coeffs.font_size_scale);
        run.is_bold = self.is_bold;
        run.is_italic = self.is_italic;
        run.color = optional_color(self.color.as_deref())?;
        run.font_name = self.font_name.clone();
        run.is_icon = super::text::is_icon_text(&run.content, run.font_name.as_deref());
        Ok(run)
    }
}

impl RawShape {
    /// Validate into a [`Shape`] with the given arena id.
    pub fn to_shape(&self, id: ShapeId, coeffs: &CorrectionCoefficients) -> Result<Shape> {
        let width = required(self.width, "width")?;
        let height = required(self.height, "height")?;
        if width < 0.0 || height < 0.0 {
            return Err(Error::MalformedRecord(format!(
                "negative size {}x{}",
                width, height
            )));
        }
        let bbox = BBox::from_xywh(required(self.x, "x")?, required(self.y, "y")?, width, height)
            .scaled(coeffs.scale);

        let mut shape = Shape::new(id, bbox).with_path_counts(self.line_count, self.curve_count);
        shape.fill_color = optional_color(self.fill_color.as_deref())?;
        shape.fill_opacity = self
            .fill_opacity
            .filter(|o| o.is_finite())
            .map(|o| o.clamp(0.0, 1.0))
            .unwrap_or(1.0);
        shape.stroke_color = optional_color(self.stroke_color.as_deref())?;
        shape.stroke_width = self
            .stroke_width
            .filter(|w| w.is_finite() && *w > 0.0)
            .map(|w| w * coeffs.scale * coeffs.stroke_width_scale)
            .unwrap_or(0.0);
        Ok(shape)
    }
}

impl RawImage {
    /// Validate into an [`ImageElement`].
    pub fn to_image(&self, coeffs: &CorrectionCoefficients) -> Result<ImageElement> {
        let bbox = checked_bbox(
            BBox::from_xywh(
                required(self.x, "x")?,
                required(self.y, "y")?,
                required(self.width, "width")?,
                required(self.height, "height")?,
            )
            .scaled(coeffs.scale),
        )?;
        Ok(ImageElement {
            bbox,
            format: self.format.clone(),
            data: self.data.clone(),
        })
    }
}

impl PageInput {
    /// Validate the page, skipping malformed records with a warning.
    ///
    /// `index` is the 0-based position in the document, used when the
    /// record carries no page number.
    pub fn to_page(&self, index: usize, coeffs: &CorrectionCoefficients) -> Result<Page> {
        let number = self.number.unwrap_or(index as u32 + 1);
        let width = self.width * coeffs.scale;
        let height = self.height * coeffs.scale;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(Error::InvalidPage {
                page: number,
                reason: format!("page size {}x{}", self.width, self.height),
            });
        }

        Ok(self.collect_records(Page::new(number, width, height), coeffs))
    }

    /// Convert the records without validating the page size.
    ///
    /// Used to pass a rejected page through unchanged.
    pub fn to_page_unchecked(&self, index: usize, coeffs: &CorrectionCoefficients) -> Page {
        let number = self.number.unwrap_or(index as u32 + 1);
        let page = Page::new(number, self.width * coeffs.scale, self.height * coeffs.scale);
        self.collect_records(page, coeffs)
    }

    fn collect_records(&self, mut page: Page, coeffs: &CorrectionCoefficients) -> Page {
        let number = page.number;
        for (i, raw) in self.shapes.iter().enumerate() {
            match raw.to_shape(ShapeId(page.shapes.len()), coeffs) {
                Ok(shape) => page.shapes.push(shape),
                Err(e) => log::warn!("page {}: skipping shape #{}: {}", number, i, e),
            }
        }

        for (i, raw) in self.texts.iter().enumerate() {
            match raw.to_run(coeffs) {
                Ok(run) => page.texts.push(run),
                Err(e) => log::warn!("page {}: skipping text run #{}: {}", number, i, e),
            }
        }

        for (i, raw) in self.images.iter().enumerate() {
            match raw.to_image(coeffs) {
                Ok(image) => page.images.push(image),
                Err(e) => log::warn!("page {}: skipping image #{}: {}", number, i, e),
            }
        }

        page
    }
}
