//! Reconstruction statistics.

use serde::{Deserialize, Serialize};

use crate::model::{DocumentLayout, PageLayout};

/// Counts of what reconstruction produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconstructionStats {
    /// Total number of pages processed
    pub page_count: u32,

    /// Shapes left as editable vectors
    pub shape_count: u32,

    /// Rings among the remaining shapes
    pub ring_count: u32,

    /// Shapes demoted to lines
    pub line_count: u32,

    pub table_count: u32,

    /// Cells over all tables
    pub cell_count: u32,

    /// Cells spanning more than one row or column
    pub merged_cell_count: u32,

    /// Rows whose height could not be measured directly
    pub ambiguous_row_count: u32,

    pub chart_count: u32,

    /// Shapes replaced by chart rasters
    pub charted_shape_count: u32,

    pub text_block_count: u32,

    /// Text runs over all blocks
    pub text_run_count: u32,

    pub image_count: u32,

    /// Icon glyphs rendered as pictures
    pub icon_count: u32,

    /// Pages that fell back to pass-through
    pub failed_page_count: u32,
}

impl ReconstructionStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect statistics for a whole document.
    pub fn from_layout(layout: &DocumentLayout) -> Self {
        let mut stats = Self::new();
        for page in &layout.pages {
            stats.merge(&Self::from_page(page));
        }
        stats
    }

    /// Collect statistics for one page.
    pub fn from_page(page: &PageLayout) -> Self {
        Self {
            page_count: 1,
            shape_count: page.shapes.len() as u32,
            ring_count: page.shapes.iter().filter(|s| s.is_ring).count() as u32,
            line_count: page
                .shapes
                .iter()
                .filter(|s| s.shape_type == crate::model::ShapeKind::Line)
                .count() as u32,
            table_count: page.tables.len() as u32,
            cell_count: page.tables.iter().map(|t| t.cells.len() as u32).sum(),
            merged_cell_count: page
                .tables
                .iter()
                .flat_map(|t| t.cells.iter())
                .filter(|c| c.is_merged())
                .count() as u32,
            ambiguous_row_count: page
                .tables
                .iter()
                .map(|t| t.ambiguous_row_heights.len() as u32)
                .sum(),
            chart_count: page.charts.iter().filter(|c| c.is_chart).count() as u32,
            charted_shape_count: page.charts.iter().map(|c| c.members.len() as u32).sum(),
            text_block_count: page.text_blocks.len() as u32,
            text_run_count: page.text_blocks.iter().map(|b| b.runs.len() as u32).sum(),
            image_count: page.images.len() as u32,
            icon_count: page.icons.len() as u32,
            failed_page_count: page.passthrough as u32,
        }
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &ReconstructionStats) {
        self.page_count += other.page_count;
        self.shape_count += other.shape_count;
        self.ring_count += other.ring_count;
        self.line_count += other.line_count;
        self.table_count += other.table_count;
        self.cell_count += other.cell_count;
        self.merged_cell_count += other.merged_cell_count;
        self.ambiguous_row_count += other.ambiguous_row_count;
        self.chart_count += other.chart_count;
        self.charted_shape_count += other.charted_shape_count;
        self.text_block_count += other.text_block_count;
        self.text_run_count += other.text_run_count;
        self.image_count += other.image_count;
        self.icon_count += other.icon_count;
        self.failed_page_count += other.failed_page_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, Page, Shape, ShapeId, ShapeKind, TextRun};

    #[test]
    fn test_stats_from_layout() {
        let mut ring = Shape::new(ShapeId(0), BBox::new(0.0, 0.0, 40.0, 40.0));
        ring.is_ring = true;
        ring.shape_type = ShapeKind::Oval;
        let mut line = Shape::new(ShapeId(1), BBox::new(0.0, 50.0, 200.0, 51.0));
        line.shape_type = ShapeKind::Line;

        let mut doc = DocumentLayout::new();
        doc.add_page(PageLayout {
            number: 1,
            shapes: vec![ring, line],
            ..Default::default()
        });
        let mut failed = Page::widescreen(2);
        failed.add_text(TextRun::new("kept", BBox::new(0.0, 0.0, 20.0, 10.0), 10.0));
        doc.add_page(PageLayout::passthrough(failed));

        let stats = ReconstructionStats::from_layout(&doc);
        assert_eq!(stats.page_count, 2);
        assert_eq!(stats.shape_count, 2);
        assert_eq!(stats.ring_count, 1);
        assert_eq!(stats.line_count, 1);
        assert_eq!(stats.text_block_count, 1);
        assert_eq!(stats.failed_page_count, 1);
    }

    #[test]
    fn test_stats_merge() {
        let mut a = ReconstructionStats {
            table_count: 2,
            ..Default::default()
        };
        let b = ReconstructionStats {
            table_count: 1,
            chart_count: 3,
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.table_count, 3);
        assert_eq!(a.chart_count, 3);
    }
}
