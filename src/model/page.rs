//! Page-level types.

use serde::{Deserialize, Serialize};

use super::{BBox, ChartRegion, IconImage, ImageElement, Shape, ShapeId, Table, TextBlock, TextRun};

/// Validated primitives of one page, ready for reconstruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Page width in points
    pub width: f32,

    /// Page height in points
    pub height: f32,

    /// Shape arena; `shapes[i].id == ShapeId(i)`
    pub shapes: Vec<Shape>,

    pub texts: Vec<TextRun>,

    pub images: Vec<ImageElement>,
}

impl Page {
    /// Create an empty page with the given dimensions.
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
            shapes: Vec::new(),
            texts: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Create an empty 16:9 slide-sized page (960 x 540 points).
    pub fn widescreen(number: u32) -> Self {
        Self::new(number, 960.0, 540.0)
    }

    /// Add a shape, assigning it the next arena id.
    pub fn add_shape(&mut self, mut shape: Shape) -> ShapeId {
        let id = ShapeId(self.shapes.len());
        shape.id = id;
        self.shapes.push(shape);
        id
    }

    /// Add a text run.
    pub fn add_text(&mut self, run: TextRun) {
        self.texts.push(run);
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn bbox(&self) -> BBox {
        BBox::new(0.0, 0.0, self.width, self.height)
    }

    /// Check if the page has no primitives.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty() && self.texts.is_empty() && self.images.is_empty()
    }
}

/// Reconstructed structure of one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageLayout {
    /// Page number (1-indexed)
    pub number: u32,

    pub width: f32,

    pub height: f32,

    /// Shapes left after merging, table and chart extraction and filtering
    pub shapes: Vec<Shape>,

    pub tables: Vec<Table>,

    pub charts: Vec<ChartRegion>,

    /// Text blocks in reading order
    pub text_blocks: Vec<TextBlock>,

    pub images: Vec<ImageElement>,

    /// Icon glyphs taken out of the text flow
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub icons: Vec<IconImage>,

    /// Set when reconstruction failed and primitives were passed through
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub passthrough: bool,
}

impl PageLayout {
    /// Layout with primitives copied as-is, one block per text run.
    pub fn passthrough(page: Page) -> Self {
        Self {
            number: page.number,
            width: page.width,
            height: page.height,
            shapes: page.shapes,
            tables: Vec::new(),
            charts: Vec::new(),
            text_blocks: page.texts.into_iter().map(TextBlock::from_run).collect(),
            images: page.images,
            icons: Vec::new(),
            passthrough: true,
        }
    }

    /// Get plain text content of the page.
    pub fn plain_text(&self) -> String {
        let mut parts: Vec<String> = self.text_blocks.iter().map(|b| b.text.clone()).collect();
        parts.extend(self.tables.iter().map(|t| t.plain_text()));
        parts.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Color;

    #[test]
    fn test_add_shape_assigns_ids() {
        let mut page = Page::widescreen(1);
        let a = page.add_shape(Shape::new(ShapeId(99), BBox::new(0.0, 0.0, 1.0, 1.0)));
        let b = page.add_shape(
            Shape::new(ShapeId(0), BBox::new(0.0, 0.0, 2.0, 2.0)).with_fill(Color::WHITE),
        );
        assert_eq!(a, ShapeId(0));
        assert_eq!(b, ShapeId(1));
        assert_eq!(page.shapes[1].id, ShapeId(1));
        assert_eq!(page.area(), 960.0 * 540.0);
    }

    #[test]
    fn test_passthrough_layout() {
        let mut page = Page::widescreen(2);
        page.add_text(TextRun::new("a", BBox::new(0.0, 0.0, 5.0, 5.0), 5.0));
        page.add_text(TextRun::new("b", BBox::new(10.0, 0.0, 15.0, 5.0), 5.0));
        let layout = PageLayout::passthrough(page);
        assert!(layout.passthrough);
        assert_eq!(layout.text_blocks.len(), 2);
        assert_eq!(layout.plain_text(), "a\nb");
    }
}
