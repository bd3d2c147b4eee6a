//! Composite shape detection and shape cleanup.
//!
//! Slide generators draw a donut as a filled circle with a stroked circle on
//! top, emulate borders by stacking a transparent rectangle on an opaque one,
//! and emit diagonal strokes that have no rectangle equivalent. This module
//! undoes those artifacts in three passes:
//!
//! 1. Ring detection (paired and standalone) plus removal of arc fragments
//!    lying on a ring.
//! 2. Duplicate-overlap removal. When the solid copy of a bordered box is
//!    offset from its see-through copy, the exposed edge is kept as a
//!    border strip.
//! 3. Invalid-stroke filtering and line classification.

use crate::model::geometry::{is_concentric, size_ratio};
use crate::model::{BBox, BorderSide, Color, RingType, Shape, ShapeKind, ShapeRole};

use super::options::ShapeMergerConfig;
use super::union_find::UnionFind;

/// Merges composite shapes and drops unrepresentable ones.
pub struct ShapeMerger {
    config: ShapeMergerConfig,
}

impl ShapeMerger {
    /// Create a new shape merger with default configuration.
    pub fn new() -> Self {
        Self {
            config: ShapeMergerConfig::default(),
        }
    }

    /// Create a new shape merger with custom configuration.
    pub fn with_config(config: ShapeMergerConfig) -> Self {
        Self { config }
    }

    /// Run all passes. Running this again on its output changes nothing.
    pub fn merge(&self, shapes: Vec<Shape>) -> Vec<Shape> {
        let before = shapes.len();
        let shapes = self.merge_rings(shapes);
        let shapes = self.remove_duplicate_overlaps(shapes);
        let shapes = self.filter_invalid_strokes(shapes);
        log::debug!("ShapeMerger: {} shapes in, {} out", before, shapes.len());
        shapes
    }

    /// Pass 1: merge ring pairs, tag standalone rings, drop arcs on rings.
    pub fn merge_rings(&self, shapes: Vec<Shape>) -> Vec<Shape> {
        let n = shapes.len();
        let mut consumed = vec![false; n];
        let mut replacements: Vec<Option<Shape>> = vec![None; n];

        for i in 0..n {
            if consumed[i] || !self.is_ring_stroke(&shapes[i]) {
                continue;
            }
            let inner = &shapes[i];

            let partner = (0..n)
                .filter(|&j| j != i && !consumed[j] && self.is_ring_fill(&shapes[j]))
                .filter(|&j| shapes[j].fill_color == inner.stroke_color)
                .filter(|&j| {
                    is_concentric(&inner.bbox, &shapes[j].bbox, self.config.concentric_tolerance)
                        && size_ratio(&inner.bbox, &shapes[j].bbox) >= self.config.min_size_ratio
                })
                .min_by(|&a, &b| {
                    let da = inner.bbox.center_distance(&shapes[a].bbox);
                    let db = inner.bbox.center_distance(&shapes[b].bbox);
                    da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                });

            if let Some(j) = partner {
                consumed[i] = true;
                consumed[j] = true;
                log::debug!(
                    "ShapeMerger: paired ring from fill #{} and stroke #{}",
                    shapes[j].id.0,
                    inner.id.0
                );
                replacements[i.min(j)] = Some(paired_ring(&shapes[j], inner));
            } else {
                consumed[i] = true;
                log::debug!("ShapeMerger: standalone ring #{}", inner.id.0);
                replacements[i] = Some(standalone_ring(inner));
            }
        }

        // Arc fragments are checked against every ring, including rings from
        // an earlier run.
        let rings: Vec<&Shape> = replacements
            .iter()
            .flatten()
            .chain(shapes.iter().filter(|s| s.is_ring))
            .collect();
        let arcs: Vec<bool> = shapes
            .iter()
            .enumerate()
            .map(|(i, s)| !consumed[i] && self.is_arc_on_ring(s, &rings))
            .collect();

        let ring_count = replacements.iter().flatten().count();
        let arc_count = arcs.iter().filter(|a| **a).count();
        if ring_count > 0 || arc_count > 0 {
            log::debug!(
                "ShapeMerger: {} rings, {} arc fragments removed",
                ring_count,
                arc_count
            );
        }

        shapes
            .into_iter()
            .zip(replacements)
            .enumerate()
            .filter_map(|(i, (shape, replacement))| match replacement {
                Some(ring) => Some(ring),
                None if consumed[i] || arcs[i] => None,
                None => Some(shape),
            })
            .collect()
    }

    /// Pass 2: collapse stacked near-identical boxes to the most transparent one.
    ///
    /// The most opaque member of a group is replaced by a border strip when
    /// it peeks out from under the survivor on one side.
    pub fn remove_duplicate_overlaps(&self, shapes: Vec<Shape>) -> Vec<Shape> {
        let n = shapes.len();
        let mut uf = UnionFind::new(n);
        let mut linked = false;
        for i in 0..n {
            for j in (i + 1)..n {
                if self.is_duplicate_pair(&shapes[i], &shapes[j]) {
                    uf.union(i, j);
                    linked = true;
                }
            }
        }
        if !linked {
            return shapes;
        }

        let mut keep = vec![true; n];
        let mut borders: Vec<Option<Shape>> = vec![None; n];
        for group in uf.groups().into_iter().filter(|g| g.len() > 1) {
            let survivor = group
                .iter()
                .copied()
                .min_by(|&a, &b| {
                    shapes[a]
                        .fill_opacity
                        .partial_cmp(&shapes[b].fill_opacity)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .unwrap_or(group[0]);
            for &member in &group {
                if member != survivor {
                    keep[member] = false;
                }
            }
            log::debug!(
                "ShapeMerger: duplicate overlap of {} shapes, keeping #{} (opacity {:.4})",
                group.len(),
                shapes[survivor].id.0,
                shapes[survivor].fill_opacity
            );

            let opaque = group
                .iter()
                .copied()
                .max_by(|&a, &b| {
                    shapes[a]
                        .fill_opacity
                        .partial_cmp(&shapes[b].fill_opacity)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .unwrap_or(group[0]);
            if let Some(strip) = self.border_strip(&shapes[opaque], &shapes[survivor]) {
                log::debug!(
                    "ShapeMerger: {:?} border strip from #{} ({:.1}x{:.1})",
                    strip.border_side,
                    shapes[opaque].id.0,
                    strip.bbox.width(),
                    strip.bbox.height()
                );
                borders[opaque] = Some(strip);
            }
        }

        shapes
            .into_iter()
            .zip(keep)
            .zip(borders)
            .filter_map(|((shape, keep), border)| border.or(keep.then_some(shape)))
            .collect()
    }

    /// The edge of `opaque` left uncovered by its see-through copy.
    fn border_strip(&self, opaque: &Shape, transparent: &Shape) -> Option<Shape> {
        let config = &self.config;
        if transparent.fill_opacity >= config.border_transparent_max
            || opaque.fill_opacity < config.border_opaque_min
        {
            return None;
        }

        let in_range =
            |offset: f32| offset >= config.border_min_offset && offset <= config.border_max_offset;
        let aligned = |offset: f32| offset.abs() <= config.duplicate_tolerance;
        let (o, t) = (&opaque.bbox, &transparent.bbox);
        let dx = t.x0 - o.x0;
        let dy = t.y0 - o.y0;
        // Strips run along the shorter of the two boxes.
        let bottom = if o.height() <= t.height() { o.y1 } else { o.y0 + t.height() };
        let right = if o.width() <= t.width() { o.x1 } else { o.x0 + t.width() };

        let (side, bbox) = if in_range(dx) && aligned(dy) {
            (BorderSide::Left, BBox::new(o.x0, o.y0, t.x0, bottom))
        } else if in_range(-dx) && aligned(dy) {
            (BorderSide::Right, BBox::new(o.x1 + dx, o.y0, o.x1, bottom))
        } else if in_range(dy) && aligned(dx) {
            (BorderSide::Top, BBox::new(o.x0, o.y0, right, t.y0))
        } else if in_range(-dy) && aligned(dx) {
            (BorderSide::Bottom, BBox::new(o.x0, o.y1 + dy, right, o.y1))
        } else {
            return None;
        };

        Some(Shape {
            bbox,
            fill_opacity: 1.0,
            stroke_color: None,
            stroke_width: 0.0,
            shape_type: ShapeKind::Rectangle,
            sources: vec![opaque.id],
            border_side: Some(side),
            role: Some(ShapeRole::Border),
            ..opaque.clone()
        })
    }

    /// Pass 3: drop large diagonal strokes and classify thin shapes as lines.
    pub fn filter_invalid_strokes(&self, shapes: Vec<Shape>) -> Vec<Shape> {
        let thickness = self.config.line_max_thickness;
        let limit = self.config.invalid_stroke_min_size;

        shapes
            .into_iter()
            .filter_map(|mut shape| {
                if shape.is_ring || shape.is_border() {
                    return Some(shape);
                }
                let (w, h) = (shape.bbox.width(), shape.bbox.height());
                if w.min(h) < thickness {
                    shape.shape_type = ShapeKind::Line;
                    return Some(shape);
                }
                if shape.is_stroke_only() && w > limit && h > limit {
                    log::debug!(
                        "ShapeMerger: dropping diagonal stroke #{} ({:.1}x{:.1})",
                        shape.id.0,
                        w,
                        h
                    );
                    return None;
                }
                Some(shape)
            })
            .collect()
    }

    fn is_near_circular(&self, shape: &Shape) -> bool {
        shape.is_near_circular(self.config.ring_min_aspect, self.config.ring_max_aspect)
    }

    /// Candidate inner circle of a ring.
    fn is_ring_stroke(&self, shape: &Shape) -> bool {
        !shape.is_ring
            && shape.is_stroke_only()
            && shape.has_colored_stroke()
            && self.is_near_circular(shape)
    }

    /// Candidate outer disc of a ring.
    fn is_ring_fill(&self, shape: &Shape) -> bool {
        !shape.is_ring && !shape.is_border() && shape.is_fill_only() && self.is_near_circular(shape)
    }

    fn is_arc_on_ring(&self, shape: &Shape, rings: &[&Shape]) -> bool {
        if shape.is_ring || shape.is_border() || rings.is_empty() {
            return false;
        }
        if !shape.fill_color.is_some_and(|c| !c.is_black()) {
            return false;
        }
        if self.is_near_circular(shape) {
            return false;
        }
        // Wide shapes next to rings are label backgrounds.
        if shape.bbox.aspect_ratio() >= self.config.label_min_aspect {
            return false;
        }
        rings.iter().any(|ring| {
            let smaller = shape.bbox.area().min(ring.bbox.area());
            smaller > 0.0
                && shape.bbox.intersection_area(&ring.bbox) / smaller
                    >= self.config.arc_overlap_ratio
        })
    }

    fn is_duplicate_pair(&self, a: &Shape, b: &Shape) -> bool {
        if a.is_ring || b.is_ring || a.is_border() || b.is_border() {
            return false;
        }
        // A translucent track under a solid bar is two shapes, not one.
        if a.fill_color.is_none() || a.fill_color != b.fill_color {
            return false;
        }
        let tol = self.config.duplicate_tolerance;
        let same_origin = (a.bbox.x0 - b.bbox.x0).abs() <= tol && (a.bbox.y0 - b.bbox.y0).abs() <= tol;
        let same_extent = (a.bbox.width() - b.bbox.width()).abs() <= tol
            || (a.bbox.height() - b.bbox.height()).abs() <= tol;
        same_origin
            && same_extent
            && (a.fill_opacity - b.fill_opacity).abs() > self.config.opacity_epsilon
    }
}

impl Default for ShapeMerger {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge shapes with the default configuration.
pub fn merge_shapes(shapes: Vec<Shape>) -> Vec<Shape> {
    ShapeMerger::new().merge(shapes)
}

fn paired_ring(outer_fill: &Shape, inner_stroke: &Shape) -> Shape {
    let outer_size = outer_fill.bbox.width().max(outer_fill.bbox.height());
    let inner_size = inner_stroke.bbox.width().max(inner_stroke.bbox.height());
    let bbox = if outer_size >= inner_size {
        outer_fill.bbox
    } else {
        inner_stroke.bbox
    };

    let mut sources = vec![outer_fill.id, inner_stroke.id];
    sources.sort();

    Shape {
        id: outer_fill.id.min(inner_stroke.id),
        bbox,
        fill_color: Some(Color::WHITE),
        fill_opacity: 1.0,
        stroke_color: inner_stroke.stroke_color,
        stroke_width: inner_stroke.stroke_width,
        line_count: outer_fill.line_count + inner_stroke.line_count,
        curve_count: outer_fill.curve_count + inner_stroke.curve_count,
        shape_type: ShapeKind::Oval,
        is_ring: true,
        ring_type: Some(RingType::Paired),
        ring_color: outer_fill.fill_color,
        sources,
        border_side: None,
        role: None,
    }
}

fn standalone_ring(stroke: &Shape) -> Shape {
    Shape {
        fill_color: Some(Color::WHITE),
        fill_opacity: 1.0,
        shape_type: ShapeKind::Oval,
        is_ring: true,
        ring_type: Some(RingType::Standalone),
        ring_color: stroke.stroke_color,
        sources: vec![stroke.id],
        ..stroke.clone()
    }
}
