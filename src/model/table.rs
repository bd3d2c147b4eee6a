//! Table types.

use serde::{Deserialize, Serialize};

use super::{BBox, Color, ShapeId};

/// Horizontal alignment of cell text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellAlignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Inner cell padding in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellMargins {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl CellMargins {
    /// Same padding on all sides.
    pub fn uniform(value: f32) -> Self {
        Self {
            left: value,
            right: value,
            top: value,
            bottom: value,
        }
    }
}

/// A table cell positioned on the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Row index (0-based)
    pub row: usize,

    /// Column index (0-based)
    pub col: usize,

    pub row_span: usize,

    pub col_span: usize,

    pub bbox: BBox,

    pub fill_color: Color,

    pub stroke_color: Option<Color>,

    pub stroke_width: f32,

    /// Cell text ("" when empty)
    pub text: String,

    pub alignment: CellAlignment,

    pub margins: CellMargins,

    /// Shapes that were deduplicated into this cell
    pub sources: Vec<ShapeId>,
}

impl TableCell {
    /// Check if the cell spans more than one grid slot.
    pub fn is_merged(&self) -> bool {
        self.row_span > 1 || self.col_span > 1
    }
}

/// A table reconstructed from cell rectangles or ruling lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub bbox: BBox,

    /// Number of rows
    pub rows: usize,

    /// Number of columns
    pub cols: usize,

    /// Cells in row-major order
    pub cells: Vec<TableCell>,

    /// Left edge of every column, ascending
    pub column_x_positions: Vec<f32>,

    pub column_widths: Vec<f32>,

    /// Rendered row heights
    pub row_heights: Vec<f32>,

    /// Rows whose height fell back because no single-row cell exists
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ambiguous_row_heights: Vec<usize>,

    /// Ruling lines the grid was drawn with
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rule_sources: Vec<ShapeId>,
}

impl Table {
    /// Look up the cell anchored at (row, col).
    pub fn cell(&self, row: usize, col: usize) -> Option<&TableCell> {
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }

    /// Check if the table has merged cells.
    pub fn has_merged_cells(&self) -> bool {
        self.cells.iter().any(|c| c.is_merged())
    }

    /// Every shape consumed by the table.
    pub fn source_shapes(&self) -> impl Iterator<Item = ShapeId> + '_ {
        self.cells
            .iter()
            .flat_map(|c| c.sources.iter().copied())
            .chain(self.rule_sources.iter().copied())
    }

    /// Get plain text representation of the table.
    pub fn plain_text(&self) -> String {
        (0..self.rows)
            .map(|r| {
                self.cells
                    .iter()
                    .filter(|c| c.row == r)
                    .map(|c| c.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
