//! Bounding boxes and the small amount of geometry the heuristics need.
//!
//! Coordinates follow the decoder convention: origin at the top-left corner
//! of the page, y growing downwards, units in points.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    /// Left edge
    pub x0: f32,
    /// Top edge
    pub y0: f32,
    /// Right edge
    pub x1: f32,
    /// Bottom edge
    pub y1: f32,
}

impl BBox {
    /// Create a bbox from its edges.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Create a bbox from origin and size.
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    /// Width divided by height. Degenerate boxes report infinity.
    pub fn aspect_ratio(&self) -> f32 {
        let h = self.height();
        if h <= f32::EPSILON {
            f32::INFINITY
        } else {
            self.width() / h
        }
    }

    /// Longer side over shorter side, always >= 1.
    pub fn elongation(&self) -> f32 {
        let (w, h) = (self.width(), self.height());
        let short = w.min(h);
        if short <= f32::EPSILON {
            f32::INFINITY
        } else {
            w.max(h) / short
        }
    }

    /// True when all edges are finite and the box is not inverted.
    pub fn is_valid(&self) -> bool {
        [self.x0, self.y0, self.x1, self.y1]
            .iter()
            .all(|v| v.is_finite())
            && self.x1 >= self.x0
            && self.y1 >= self.y0
    }

    /// Overlapping region, if the boxes intersect with positive area.
    pub fn intersection(&self, other: &BBox) -> Option<BBox> {
        let x0 = self.x0.max(other.x0);
        let y0 = self.y0.max(other.y0);
        let x1 = self.x1.min(other.x1);
        let y1 = self.y1.min(other.y1);
        if x1 > x0 && y1 > y0 {
            Some(BBox::new(x0, y0, x1, y1))
        } else {
            None
        }
    }

    pub fn intersection_area(&self, other: &BBox) -> f32 {
        self.intersection(other).map(|b| b.area()).unwrap_or(0.0)
    }

    /// Fraction of `self` covered by `other` (0.0 for empty boxes).
    pub fn overlap_ratio(&self, other: &BBox) -> f32 {
        let area = self.area();
        if area <= 0.0 {
            return 0.0;
        }
        self.intersection_area(other) / area
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    /// Grow each side by a fraction of the box size, clamping at the page origin.
    pub fn padded(&self, fraction: f32) -> BBox {
        let pad_x = self.width() * fraction;
        let pad_y = self.height() * fraction;
        BBox::new(
            (self.x0 - pad_x).max(0.0),
            (self.y0 - pad_y).max(0.0),
            self.x1 + pad_x,
            self.y1 + pad_y,
        )
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    /// True when `other` lies inside `self` grown by `margin` on every side.
    pub fn encloses(&self, other: &BBox, margin: f32) -> bool {
        other.x0 >= self.x0 - margin
            && other.y0 >= self.y0 - margin
            && other.x1 <= self.x1 + margin
            && other.y1 <= self.y1 + margin
    }

    /// True when every edge of `other` is within `tolerance` of the same edge of `self`.
    pub fn matches_within(&self, other: &BBox, tolerance: f32) -> bool {
        (self.x0 - other.x0).abs() <= tolerance
            && (self.y0 - other.y0).abs() <= tolerance
            && (self.x1 - other.x1).abs() <= tolerance
            && (self.y1 - other.y1).abs() <= tolerance
    }

    /// Shortest distance between the two boxes, 0.0 when they touch or overlap.
    pub fn gap_distance(&self, other: &BBox) -> f32 {
        let dx = (other.x0 - self.x1).max(self.x0 - other.x1).max(0.0);
        let dy = (other.y0 - self.y1).max(self.y0 - other.y1).max(0.0);
        dx.hypot(dy)
    }

    /// Distance between the two centers.
    pub fn center_distance(&self, other: &BBox) -> f32 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (ax - bx).hypot(ay - by)
    }

    /// Scale every coordinate by `factor`.
    pub fn scaled(&self, factor: f32) -> BBox {
        BBox::new(
            self.x0 * factor,
            self.y0 * factor,
            self.x1 * factor,
            self.y1 * factor,
        )
    }
}

/// Two boxes are concentric when their centers lie within `tolerance`.
pub fn is_concentric(a: &BBox, b: &BBox, tolerance: f32) -> bool {
    a.center_distance(b) < tolerance
}

/// Ratio of the smaller box size to the larger one, using each box's longer side.
pub fn size_ratio(a: &BBox, b: &BBox) -> f32 {
    let sa = a.width().max(a.height());
    let sb = b.width().max(b.height());
    let big = sa.max(sb);
    if big <= 0.0 {
        return 0.0;
    }
    sa.min(sb) / big
}

/// Floor `value` to a multiple of `step`.
pub fn quantize(value: f32, step: f32) -> f32 {
    if step <= 0.0 {
        return value;
    }
    (value / step).floor() * step
}

/// Round `value` to the nearest multiple of `step`.
pub fn snap(value: f32, step: f32) -> f32 {
    if step <= 0.0 {
        return value;
    }
    (value / step).round() * step
}

/// Collapse sorted positions closer than `tolerance` into their first member.
pub fn dedup_positions(mut positions: Vec<f32>, tolerance: f32) -> Vec<f32> {
    positions.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mut merged: Vec<f32> = Vec::with_capacity(positions.len());
    for pos in positions {
        match merged.last() {
            Some(last) if pos - last < tolerance => {}
            _ => merged.push(pos),
        }
    }
    merged
}
