//! Decoration and overlap filtering.
//!
//! Purely subtractive passes: text already baked into a chart raster is
//! dropped before assembly, and filled shapes that only decorate a piece of
//! text are dropped after it.

use crate::model::{BBox, ChartRegion, Shape, TextBlock, TextRun};

use super::options::OverlapFilterConfig;

/// Removes decorations and text duplicated by chart rasters.
pub struct OverlapFilter {
    config: OverlapFilterConfig,
}

impl OverlapFilter {
    pub fn new() -> Self {
        Self {
            config: OverlapFilterConfig::default(),
        }
    }

    pub fn with_config(config: OverlapFilterConfig) -> Self {
        Self { config }
    }

    /// Drop filled shapes that decorate a text run.
    pub fn filter_decorations(&self, shapes: Vec<Shape>, blocks: &[TextBlock]) -> Vec<Shape> {
        let texts: Vec<&BBox> = blocks
            .iter()
            .flat_map(|b| b.runs.iter())
            .map(|r| &r.bbox)
            .collect();
        let before = shapes.len();
        let kept: Vec<Shape> = shapes
            .into_iter()
            .filter(|s| !self.is_decoration(s, &texts))
            .collect();
        if kept.len() < before {
            log::debug!("OverlapFilter: dropped {} text decorations", before - kept.len());
        }
        kept
    }

    fn is_decoration(&self, shape: &Shape, texts: &[&BBox]) -> bool {
        if shape.is_ring || !shape.has_visible_fill() {
            return false;
        }
        let c = &self.config;
        let area = shape.bbox.area();
        texts.iter().any(|text| {
            if text.encloses(&shape.bbox, c.enclosure_margin) {
                return true;
            }
            let overlap = shape.bbox.intersection_area(text);
            if overlap <= 0.0 {
                return false;
            }
            let text_area = text.area();
            let significant = overlap > area * c.decoration_overlap_ratio
                || overlap > text_area * c.decoration_overlap_ratio;
            significant && area < text_area * c.decoration_area_factor
        })
    }

    /// Drop runs mostly inside a chart raster.
    ///
    /// Runs before text assembly, so text on either side of a chart is never
    /// joined across it.
    pub fn filter_chart_runs(&self, runs: Vec<TextRun>, charts: &[ChartRegion]) -> Vec<TextRun> {
        let charts: Vec<&BBox> = charts.iter().filter(|c| c.is_chart).map(|c| &c.bbox).collect();
        if charts.is_empty() {
            return runs;
        }

        let before = runs.len();
        let kept: Vec<TextRun> = runs
            .into_iter()
            .filter(|r| !self.inside_chart(&r.bbox, &charts))
            .collect();
        if kept.len() < before {
            log::debug!("OverlapFilter: dropped {} runs inside charts", before - kept.len());
        }
        kept
    }

    fn inside_chart(&self, text: &BBox, charts: &[&BBox]) -> bool {
        let area = text.area();
        if area <= 0.0 {
            return charts.iter().any(|c| {
                let (x, y) = text.center();
                c.contains_point(x, y)
            });
        }
        charts
            .iter()
            .any(|c| text.intersection_area(c) > area * self.config.chart_text_overlap)
    }
}

impl Default for OverlapFilter {
    fn default() -> Self {
        Self::new()
    }
}
