//! Data model for layout reconstruction.
//!
//! Input records from the decoder are validated into a [`Page`] of
//! primitives. Reconstruction turns each page into a [`PageLayout`] of
//! merged shapes, tables, chart regions and text blocks.

mod chart;
mod color;
mod document;
pub mod geometry;
mod input;
mod page;
mod shape;
mod table;
mod text;

pub use chart::{ChartRegion, IconImage, ImageElement, RasterImage};
pub use color::Color;
pub use document::DocumentLayout;
pub use geometry::BBox;
pub use input::{
    CorrectionCoefficients, DocumentInput, PageInput, RawImage, RawShape, RawTextRun,
};
pub use page::{Page, PageLayout};
pub use shape::{BorderSide, RingType, Shape, ShapeId, ShapeKind, ShapeRole, HOLLOW_FILL_OPACITY};
pub use table::{CellAlignment, CellMargins, Table, TableCell};
pub use text::{is_icon_text, is_private_use, TextBlock, TextRole, TextRun};
