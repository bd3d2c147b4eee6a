//! # pdfdeck
//!
//! Layout reconstruction for slide decks exported to PDF.
//!
//! A PDF slide arrives as loose drawing primitives: rectangles, paths and
//! positioned text runs. This library rebuilds the structure a slide editor
//! needs from them: rings drawn as stacked circles, tables drawn as cell
//! rectangles, charts drawn as dozens of colored paths, and text broken
//! into style-consistent blocks.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfdeck::{reconstruct_file, render, ReconstructOptions};
//!
//! fn main() -> pdfdeck::Result<()> {
//!     // Read a page dump produced by a PDF decoder
//!     let layout = reconstruct_file("deck.json", ReconstructOptions::default())?;
//!
//!     // Serialize the reconstructed layout
//!     let json = render::to_json(&layout, render::JsonFormat::Pretty)?;
//!     println!("{}", json);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Ring merging**: outer fill + inner stroke pairs become one oval
//! - **Table detection**: cell grids with merged cells, fills and text
//! - **Ruled tables**: grids of ruling lines with painted cell backgrounds
//! - **Chart clustering**: multi-color shape clusters become rasters
//! - **Icon extraction**: icon-font glyphs become small rasters
//! - **Text assembly**: reading order and style-consistent blocks
//! - **Layout roles**: backgrounds, cards, borders, titles, headers and footers
//! - **Parallel processing**: optional Rayon fan-out over pages

pub mod error;
pub mod model;
pub mod raster;
pub mod reconstruct;
pub mod render;

// Re-export commonly used types
pub use error::{Error, Result};
pub use model::{
    BBox, CellAlignment, ChartRegion, Color, CorrectionCoefficients, DocumentInput,
    DocumentLayout, IconImage, Page, PageInput, PageLayout, Shape, ShapeId, ShapeKind, ShapeRole,
    Table, TableCell, TextBlock, TextRole, TextRun,
};
pub use raster::{NullRasterizer, Rasterizer};
pub use reconstruct::{merge_shapes, PageSelection, ReconstructOptions, Reconstructor};
pub use render::{to_json, JsonFormat, ReconstructionStats};

use std::io::Read;
use std::path::Path;

/// Parse a decoder page dump from a JSON string.
///
/// # Example
///
/// ```
/// let input = pdfdeck::parse_input(r#"{"pages": [{"width": 960, "height": 540}]}"#).unwrap();
/// assert_eq!(input.pages.len(), 1);
/// ```
pub fn parse_input(json: &str) -> Result<DocumentInput> {
    Ok(serde_json::from_str(json)?)
}

/// Read a decoder page dump from a file.
pub fn read_input<P: AsRef<Path>>(path: P) -> Result<DocumentInput> {
    let file = std::fs::File::open(path)?;
    read_input_from(file)
}

/// Read a decoder page dump from any reader.
pub fn read_input_from<R: Read>(reader: R) -> Result<DocumentInput> {
    Ok(serde_json::from_reader(std::io::BufReader::new(reader))?)
}

/// Reconstruct a document with default options.
pub fn reconstruct(input: &DocumentInput) -> DocumentLayout {
    Reconstructor::default().reconstruct(input)
}

/// Reconstruct a document with custom options.
///
/// # Example
///
/// ```no_run
/// use pdfdeck::{read_input, reconstruct_with_options, PageSelection, ReconstructOptions};
///
/// let input = read_input("deck.json").unwrap();
/// let options = ReconstructOptions::new()
///     .with_pages(PageSelection::Range(1..=5))
///     .with_charts(false);
/// let layout = reconstruct_with_options(&input, options);
/// println!("{} pages", layout.page_count());
/// ```
pub fn reconstruct_with_options(input: &DocumentInput, options: ReconstructOptions) -> DocumentLayout {
    Reconstructor::new(options).reconstruct(input)
}

/// Read a page dump and reconstruct it.
pub fn reconstruct_file<P: AsRef<Path>>(path: P, options: ReconstructOptions) -> Result<DocumentLayout> {
    let input = read_input(path)?;
    Ok(reconstruct_with_options(&input, options))
}

/// Reconstruct a JSON page dump straight to JSON output.
pub fn reconstruct_json(json: &str, format: JsonFormat) -> Result<String> {
    let input = parse_input(json)?;
    to_json(&reconstruct(&input), format)
}

/// Extract plain text from a page dump, tables included.
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let layout = reconstruct_file(path, ReconstructOptions::default())?;
    Ok(layout
        .pages
        .iter()
        .map(|p| p.plain_text())
        .collect::<Vec<_>>()
        .join("\n\n"))
}
