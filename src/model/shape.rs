//! Shape primitives and their merged/classified form.

use serde::{Deserialize, Serialize};

use super::{BBox, Color};

/// Opacity at or below which a fill counts as see-through.
pub const HOLLOW_FILL_OPACITY: f32 = 0.1;

/// Index of a shape in its page's shape arena (draw order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(pub usize);

/// Classification used by the slide renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Oval,
    Line,
}

/// How a ring was recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RingType {
    /// Outer filled circle merged with an inner stroked circle
    Paired,
    /// A single stroked circle with a hollow center
    Standalone,
}

/// Edge of a box that a border strip was recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderSide {
    Left,
    Right,
    Top,
    Bottom,
}

/// What a shape does on the slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeRole {
    /// Covers most of the page
    Background,
    /// Thin accent strip along one side of a panel
    Border,
    /// Large panel that groups content
    CardBackground,
    Decoration,
}

/// A filled and/or stroked path, either as decoded or after merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Arena index of this shape
    pub id: ShapeId,

    pub bbox: BBox,

    pub fill_color: Option<Color>,

    /// Fill opacity (0.0-1.0)
    pub fill_opacity: f32,

    pub stroke_color: Option<Color>,

    /// Stroke width in points
    pub stroke_width: f32,

    /// Number of straight segments in the source path
    pub line_count: u32,

    /// Number of bezier segments in the source path
    pub curve_count: u32,

    pub shape_type: ShapeKind,

    pub is_ring: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ring_type: Option<RingType>,

    /// Visible ring color (outer fill for paired rings, stroke for standalone)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ring_color: Option<Color>,

    /// Input shapes this one was merged from
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<ShapeId>,

    /// Set on strips recovered from an offset transparent/opaque pair
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_side: Option<BorderSide>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<ShapeRole>,
}

impl Shape {
    /// Create an unstyled rectangle.
    pub fn new(id: ShapeId, bbox: BBox) -> Self {
        Self {
            id,
            bbox,
            fill_color: None,
            fill_opacity: 1.0,
            stroke_color: None,
            stroke_width: 0.0,
            line_count: 0,
            curve_count: 0,
            shape_type: ShapeKind::Rectangle,
            is_ring: false,
            ring_type: None,
            ring_color: None,
            sources: Vec::new(),
            border_side: None,
            role: None,
        }
    }

    /// Set the fill color.
    pub fn with_fill(mut self, color: Color) -> Self {
        self.fill_color = Some(color);
        self
    }

    /// Set the fill opacity.
    pub fn with_fill_opacity(mut self, opacity: f32) -> Self {
        self.fill_opacity = opacity;
        self
    }

    /// Set the stroke color and width.
    pub fn with_stroke(mut self, color: Color, width: f32) -> Self {
        self.stroke_color = Some(color);
        self.stroke_width = width;
        self
    }

    /// Set the path segment counts.
    pub fn with_path_counts(mut self, lines: u32, curves: u32) -> Self {
        self.line_count = lines;
        self.curve_count = curves;
        self
    }

    /// A stroke that will actually be drawn.
    pub fn has_stroke(&self) -> bool {
        self.stroke_color.is_some() && self.stroke_width > 0.0
    }

    /// A stroke in a non-black color, the kind rings are drawn with.
    pub fn has_colored_stroke(&self) -> bool {
        self.has_stroke() && self.stroke_color.is_some_and(|c| !c.is_black())
    }

    /// A fill that is present, not black, and not see-through.
    pub fn has_visible_fill(&self) -> bool {
        self.fill_color.is_some_and(|c| !c.is_black()) && self.fill_opacity > HOLLOW_FILL_OPACITY
    }

    /// Any fill color at all, regardless of opacity.
    pub fn has_fill(&self) -> bool {
        self.fill_color.is_some()
    }

    pub fn is_stroke_only(&self) -> bool {
        self.has_stroke() && !self.has_visible_fill()
    }

    /// A strip recovered from an offset duplicate; later passes leave it alone.
    pub fn is_border(&self) -> bool {
        self.border_side.is_some()
    }

    pub fn is_fill_only(&self) -> bool {
        self.has_visible_fill() && !self.has_stroke()
    }

    /// Aspect ratio within the near-circular band.
    pub fn is_near_circular(&self, min_aspect: f32, max_aspect: f32) -> bool {
        let aspect = self.bbox.aspect_ratio();
        aspect >= min_aspect && aspect <= max_aspect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(id: usize) -> Shape {
        Shape::new(ShapeId(id), BBox::from_xywh(0.0, 0.0, 40.0, 40.0))
    }

    #[test]
    fn test_fill_and_stroke_classification() {
        let filled = circle(0).with_fill(Color::rgb(200, 0, 0));
        assert!(filled.is_fill_only());
        assert!(!filled.is_stroke_only());

        let stroked = circle(1).with_stroke(Color::rgb(0, 0, 200), 3.0);
        assert!(stroked.is_stroke_only());
        assert!(stroked.has_colored_stroke());

        // A black fill counts as a hollow center
        let black_center = circle(2)
            .with_fill(Color::BLACK)
            .with_stroke(Color::rgb(0, 0, 200), 3.0);
        assert!(black_center.is_stroke_only());

        let faint = circle(3)
            .with_fill(Color::rgb(10, 200, 10))
            .with_fill_opacity(0.05)
            .with_stroke(Color::rgb(0, 0, 200), 3.0);
        assert!(faint.is_stroke_only());
    }

    #[test]
    fn test_zero_width_stroke_is_not_stroke() {
        let shape = circle(0).with_stroke(Color::rgb(0, 0, 200), 0.0);
        assert!(!shape.has_stroke());
        assert!(!shape.is_stroke_only());
    }

    #[test]
    fn test_shape_serialization() {
        let shape = circle(7).with_fill(Color::WHITE);
        let json = serde_json::to_string(&shape).unwrap();
        assert!(json.contains("\"id\":7"));
        assert!(json.contains("\"shape_type\":\"rectangle\""));
        assert!(!json.contains("ring_type"));
    }
}
