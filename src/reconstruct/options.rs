//! Reconstruction options and configuration.
//!
//! Every threshold the heuristics use is a named field with a default. The
//! defaults were tuned on a limited set of generated slide decks and should
//! be recalibrated against a broader corpus before being treated as exact.

use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Options for reconstructing a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructOptions {
    /// Ring merging and shape cleanup
    pub shapes: ShapeMergerConfig,

    /// Chart clustering
    pub charts: ChartClusterConfig,

    /// Table detection
    pub tables: TableDetectorConfig,

    /// Text line assembly
    pub text: TextAssemblyConfig,

    /// Decoration and overlap filtering
    pub overlap: OverlapFilterConfig,

    /// Icon glyph extraction
    pub icons: IconConfig,

    /// Shape and text role classification
    pub roles: LayoutRoleConfig,

    /// Run chart clustering
    pub detect_charts: bool,

    /// Run table detection
    pub detect_tables: bool,

    /// Rasterize icon-font glyphs instead of keeping them as text
    pub extract_icons: bool,

    /// Assign layout roles to shapes and text blocks
    pub classify_roles: bool,

    /// How many times a failed rasterization is retried
    pub raster_retries: u32,

    /// Reconstruct pages in parallel
    pub parallel: bool,

    /// Page selection (which pages to reconstruct)
    #[serde(skip)]
    pub pages: PageSelection,
}

impl ReconstructOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a JSON file; missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Set shape merger configuration.
    pub fn with_shape_config(mut self, config: ShapeMergerConfig) -> Self {
        self.shapes = config;
        self
    }

    /// Set chart clustering configuration.
    pub fn with_chart_config(mut self, config: ChartClusterConfig) -> Self {
        self.charts = config;
        self
    }

    /// Set table detector configuration.
    pub fn with_table_config(mut self, config: TableDetectorConfig) -> Self {
        self.tables = config;
        self
    }

    /// Set text assembly configuration.
    pub fn with_text_config(mut self, config: TextAssemblyConfig) -> Self {
        self.text = config;
        self
    }

    /// Set overlap filter configuration.
    pub fn with_overlap_config(mut self, config: OverlapFilterConfig) -> Self {
        self.overlap = config;
        self
    }

    /// Set icon extraction configuration.
    pub fn with_icon_config(mut self, config: IconConfig) -> Self {
        self.icons = config;
        self
    }

    /// Set role classification configuration.
    pub fn with_role_config(mut self, config: LayoutRoleConfig) -> Self {
        self.roles = config;
        self
    }

    /// Enable or disable icon extraction.
    pub fn with_icons(mut self, enabled: bool) -> Self {
        self.extract_icons = enabled;
        self
    }

    /// Enable or disable role classification.
    pub fn with_roles(mut self, enabled: bool) -> Self {
        self.classify_roles = enabled;
        self
    }

    /// Enable or disable chart clustering.
    pub fn with_charts(mut self, enabled: bool) -> Self {
        self.detect_charts = enabled;
        self
    }

    /// Enable or disable table detection.
    pub fn with_tables(mut self, enabled: bool) -> Self {
        self.detect_tables = enabled;
        self
    }

    /// Set rasterization retry count.
    pub fn with_raster_retries(mut self, retries: u32) -> Self {
        self.raster_retries = retries;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        Self {
            shapes: ShapeMergerConfig::default(),
            charts: ChartClusterConfig::default(),
            tables: TableDetectorConfig::default(),
            text: TextAssemblyConfig::default(),
            overlap: OverlapFilterConfig::default(),
            icons: IconConfig::default(),
            roles: LayoutRoleConfig::default(),
            detect_charts: true,
            detect_tables: true,
            extract_icons: true,
            classify_roles: true,
            raster_retries: 2,
            parallel: false,
            pages: PageSelection::All,
        }
    }
}

/// Shape merger configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeMergerConfig {
    /// Lowest width/height ratio treated as circular
    pub ring_min_aspect: f32,
    /// Highest width/height ratio treated as circular
    pub ring_max_aspect: f32,
    /// Maximum center distance for ring partners (points)
    pub concentric_tolerance: f32,
    /// Minimum smaller/larger size ratio for ring partners
    pub min_size_ratio: f32,
    /// Overlap (of the smaller area) that marks a filled shape as an arc fragment
    pub arc_overlap_ratio: f32,
    /// Shapes at least this wide relative to height are labels, never arcs
    pub label_min_aspect: f32,
    /// Edge tolerance for duplicate-overlap clustering (points)
    pub duplicate_tolerance: f32,
    /// Opacities closer than this count as equal
    pub opacity_epsilon: f32,
    /// Shapes thinner than this are connector lines (points)
    pub line_max_thickness: f32,
    /// Stroke-only shapes larger than this in both dimensions are dropped (points)
    pub invalid_stroke_min_size: f32,
    /// Smallest duplicate offset that leaves a border strip (points)
    pub border_min_offset: f32,
    /// Largest duplicate offset that leaves a border strip (points)
    pub border_max_offset: f32,
    /// The see-through copy of a bordered shape is below this opacity
    pub border_transparent_max: f32,
    /// The solid copy of a bordered shape is at least this opaque
    pub border_opaque_min: f32,
}

impl Default for ShapeMergerConfig {
    fn default() -> Self {
        Self {
            ring_min_aspect: 0.85,
            ring_max_aspect: 1.15,
            concentric_tolerance: 5.0,
            min_size_ratio: 0.8,
            arc_overlap_ratio: 0.3,
            label_min_aspect: 2.0,
            duplicate_tolerance: 2.0,
            opacity_epsilon: 0.01,
            line_max_thickness: 5.0,
            invalid_stroke_min_size: 100.0,
            border_min_offset: 1.0,
            border_max_offset: 10.0,
            border_transparent_max: 0.5,
            border_opaque_min: 0.9,
        }
    }
}

/// Chart clustering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartClusterConfig {
    /// Minimum shapes in an accepted cluster
    pub min_shapes: usize,
    /// Minimum distinct fill colors (white and black ignored)
    pub min_colors: usize,
    /// Edge tolerance for stacked exact-overlap groups (points)
    pub exact_overlap_tolerance: f32,
    /// Maximum gap between shapes of one spatial cluster (points)
    pub cluster_distance: f32,
    /// Minimum cluster bbox area for spatial clusters (square points)
    pub min_chart_area: f32,
    /// Fraction of `min_chart_area` required of exact-overlap clusters
    pub exact_overlap_area_factor: f32,
    /// Clusters covering more of the page than this are rejected
    pub max_page_fraction: f32,
    /// Shapes covering more of the page than this are backgrounds
    pub background_page_fraction: f32,
    /// Shapes smaller than this in either dimension are ignored (points)
    pub min_shape_size: f32,
    /// Thickness below which a page-spanning bar is a divider (points)
    pub thin_bar_thickness: f32,
    /// Width fraction that makes a thin bar full-width
    pub full_width_fraction: f32,
    /// Height fraction that makes a thin bar full-height
    pub full_height_fraction: f32,
    /// Padding added to each side, as a fraction of the cluster size
    pub padding: f32,
    /// Render resolution for the raster (zoom = dpi / 72)
    pub render_dpi: f32,
}

impl Default for ChartClusterConfig {
    fn default() -> Self {
        Self {
            min_shapes: 3,
            min_colors: 2,
            exact_overlap_tolerance: 5.0,
            cluster_distance: 50.0,
            min_chart_area: 10_000.0,
            exact_overlap_area_factor: 0.1,
            max_page_fraction: 0.4,
            background_page_fraction: 0.5,
            min_shape_size: 5.0,
            thin_bar_thickness: 15.0,
            full_width_fraction: 0.9,
            full_height_fraction: 0.8,
            padding: 0.05,
            render_dpi: 300.0,
        }
    }
}

/// Table detector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableDetectorConfig {
    /// Y tolerance for grouping cells into rows (points)
    pub alignment_tolerance: f32,
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Minimum cell width and height (points)
    pub min_cell_size: f32,
    /// Narrowest width used for column discovery (points)
    pub min_column_width: f32,
    /// Widest width used for column discovery (points)
    pub max_column_width: f32,
    /// Columns closer than this are one column (points)
    pub column_merge_tolerance: f32,
    /// Rectangles whose origins are this close are one cell (points)
    pub dedup_tolerance: f32,
    /// Lone cells taller than this may belong to the next row (points)
    pub tall_row_height: f32,
    /// Maximum distance to the row a tall cell merges into (points)
    pub tall_row_merge_gap: f32,
    /// Margin for a sparse first column left of the established ones (points)
    pub left_column_margin: f32,
    /// Fraction of a multi-cell row's columns that must match
    pub row_match_ratio: f32,
    /// Thin bars: height below this...
    pub thin_bar_height: f32,
    /// ...and width/height above this
    pub thin_bar_aspect: f32,
    /// Width/height above which a taller bar is still a bar
    pub wide_bar_aspect: f32,
    /// Candidates larger than this multiple of the 75th percentile area are backgrounds
    pub background_area_factor: f32,
    /// Minimum share of rows with more than one cell
    pub min_multi_cell_ratio: f32,
    /// Same, for tables of three rows or fewer
    pub small_table_multi_cell_ratio: f32,
    /// Tallest single-cell first row accepted as a merged header (points)
    pub max_header_height: f32,
    /// Minimum share of columns holding at least one cell
    pub min_column_usage: f32,
    /// Minimum share of cells with a stroke or fill
    pub min_border_ratio: f32,
    /// Two-row tables with a taller mean cell height are card layouts (points)
    pub card_mean_height: f32,
    /// Two-row tables with a taller cell are card layouts (points)
    pub card_max_height: f32,
    /// Horizontal gap that separates side-by-side tables (points)
    pub split_gap: f32,
    /// Share of rows that must show the gap for a split
    pub split_consistency: f32,
    /// Tables covering more of the page than this are rejected
    pub max_page_fraction: f32,
    /// Overlap (of the smaller table's area) that makes two tables conflict
    pub table_overlap_ratio: f32,
    /// Cell heights at or below this are ignored for row height (points)
    pub min_row_height: f32,
    /// Row height when no cell height is usable (points)
    pub default_row_height: f32,
    /// Padding on every cell side (points)
    pub cell_margin: f32,
    /// Text offset from the cell center, as a fraction of width, still counted as centered
    pub center_offset_ratio: f32,
    /// Text this close to a cell edge hugs that edge (points)
    pub edge_margin: f32,
    /// Margin ratio below which text leans to that side
    pub side_ratio: f32,
    /// Also build tables from grids of ruling lines
    pub line_tables: bool,
    /// Minimum average length of the ruling lines (points)
    pub min_line_span: f32,
    /// Row heights of a ruled grid must lie in this range (points)
    pub line_min_row_height: f32,
    pub line_max_row_height: f32,
    /// Column widths of a ruled grid must lie in this range (points)
    pub line_min_column_width: f32,
    pub line_max_column_width: f32,
    /// Rectangles larger than this in both dimensions may fill ruled cells (points)
    pub line_background_min_size: f32,
    /// Edge tolerance for matching a background rectangle to a ruled cell (points)
    pub line_background_tolerance: f32,
    /// A ruled grid whose widest column gap exceeds this...
    pub line_max_column_gap: f32,
    /// ...and this multiple of the median gap is two tables
    pub line_gap_ratio: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            alignment_tolerance: 3.0,
            min_rows: 2,
            min_columns: 2,
            min_cell_size: 10.0,
            min_column_width: 5.0,
            max_column_width: 300.0,
            column_merge_tolerance: 10.0,
            dedup_tolerance: 1.0,
            tall_row_height: 50.0,
            tall_row_merge_gap: 10.0,
            left_column_margin: 10.0,
            row_match_ratio: 0.8,
            thin_bar_height: 20.0,
            thin_bar_aspect: 6.0,
            wide_bar_aspect: 25.0,
            background_area_factor: 10.0,
            min_multi_cell_ratio: 0.5,
            small_table_multi_cell_ratio: 0.8,
            max_header_height: 150.0,
            min_column_usage: 0.6,
            min_border_ratio: 0.5,
            card_mean_height: 150.0,
            card_max_height: 250.0,
            split_gap: 50.0,
            split_consistency: 0.6,
            max_page_fraction: 0.6,
            table_overlap_ratio: 0.5,
            min_row_height: 5.0,
            default_row_height: 21.5,
            cell_margin: 0.5,
            center_offset_ratio: 0.08,
            edge_margin: 5.0,
            side_ratio: 0.7,
            line_tables: true,
            min_line_span: 20.0,
            line_min_row_height: 10.0,
            line_max_row_height: 150.0,
            line_min_column_width: 20.0,
            line_max_column_width: 600.0,
            line_background_min_size: 10.0,
            line_background_tolerance: 5.0,
            line_max_column_gap: 20.0,
            line_gap_ratio: 3.0,
        }
    }
}

/// Text line assembly configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextAssemblyConfig {
    /// Y quantization step for line grouping
    pub row_tolerance: f32,
    /// Largest horizontal gap bridged inside a block
    pub max_gap: f32,
    /// Largest gap between a bare number/address and a bracketed annotation
    pub annotation_gap: f32,
    /// Runs further apart than this are joined with a space
    pub space_gap: f32,
}

impl Default for TextAssemblyConfig {
    fn default() -> Self {
        Self {
            row_tolerance: 10.0,
            max_gap: 50.0,
            annotation_gap: 8.0,
            space_gap: 1.0,
        }
    }
}

/// Decoration and overlap filter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlapFilterConfig {
    /// Overlap (of either area) that makes a filled shape a text decoration
    pub decoration_overlap_ratio: f32,
    /// Decorations are smaller than this multiple of the text area
    pub decoration_area_factor: f32,
    /// Shapes within this distance of a text box on all sides are decorations
    pub enclosure_margin: f32,
    /// Text with more than this share of its area inside a chart is dropped
    pub chart_text_overlap: f32,
}

impl Default for OverlapFilterConfig {
    fn default() -> Self {
        Self {
            decoration_overlap_ratio: 0.3,
            decoration_area_factor: 2.0,
            enclosure_margin: 2.0,
            chart_text_overlap: 0.5,
        }
    }
}

/// Icon glyph extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconConfig {
    /// Padding added to each side of a glyph, as a fraction of its font size
    pub padding_fraction: f32,
    /// Render resolution for glyph rasters (zoom = dpi / 72)
    pub render_dpi: f32,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            padding_fraction: 0.15,
            render_dpi: 600.0,
        }
    }
}

/// Layout role classification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutRoleConfig {
    /// Shapes covering more of the page than this are backgrounds
    pub background_page_fraction: f32,
    /// Bars thinner than this...
    pub bar_max_height: f32,
    /// ...spanning more of the page width than this are decorations
    pub bar_min_width_fraction: f32,
    /// Vertical strips narrower than this...
    pub border_max_width: f32,
    /// ...and taller than this are borders (points)
    pub border_min_height: f32,
    /// Cards are wider than this...
    pub card_min_width: f32,
    /// ...and taller than this (points)
    pub card_min_height: f32,
    /// Text at least this large near the top of the page is a title or subtitle
    pub title_font_size: f32,
    /// Titles at least this large are titles, smaller ones subtitles
    pub large_title_font_size: f32,
    /// Text at least this large elsewhere is a heading
    pub heading_font_size: f32,
    /// Top band (fraction of page height) where titles live
    pub title_band: f32,
    /// Top band (fraction of page height) holding running headers
    pub header_band: f32,
    /// Text below this fraction of the page height is a footer
    pub footer_band: f32,
}

impl Default for LayoutRoleConfig {
    fn default() -> Self {
        Self {
            background_page_fraction: 0.5,
            bar_max_height: 15.0,
            bar_min_width_fraction: 0.9,
            border_max_width: 10.0,
            border_min_height: 50.0,
            card_min_width: 200.0,
            card_min_height: 50.0,
            title_font_size: 20.0,
            large_title_font_size: 30.0,
            heading_font_size: 18.0,
            title_band: 0.2,
            header_band: 0.1,
            footer_band: 0.9,
        }
    }
}

/// Page selection for reconstruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// All pages
    #[default]
    All,
    /// A range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Specific pages (1-indexed)
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s == "all" {
            return Ok(PageSelection::All);
        }

        let number = |part: &str| -> Result<u32> {
            part.trim()
                .parse()
                .map_err(|_| Error::InvalidPageRange(format!("invalid page number '{}'", part)))
        };

        // Simple range (e.g., "1-10")
        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                let (start, end) = (number(start)?, number(end)?);
                if start > end {
                    return Err(Error::InvalidPageRange(s.to_string()));
                }
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if let Some((start, end)) = part.split_once('-') {
                let (start, end) = (number(start)?, number(end)?);
                if start > end {
                    return Err(Error::InvalidPageRange(part.to_string()));
                }
                for p in start..=end {
                    if !pages.contains(&p) {
                        pages.push(p);
                    }
                }
            } else {
                let p = number(part)?;
                if !pages.contains(&p) {
                    pages.push(p);
                }
            }
        }

        pages.sort_unstable();
        Ok(PageSelection::Pages(pages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = ReconstructOptions::new()
            .with_charts(false)
            .with_raster_retries(5)
            .with_parallel(true)
            .with_pages(PageSelection::Pages(vec![2]));

        assert!(!options.detect_charts);
        assert!(options.detect_tables);
        assert_eq!(options.raster_retries, 5);
        assert!(options.parallel);
        assert!(options.pages.includes(2));
        assert!(!options.pages.includes(1));
    }

    #[test]
    fn test_default_thresholds() {
        let options = ReconstructOptions::default();
        assert_eq!(options.shapes.concentric_tolerance, 5.0);
        assert_eq!(options.charts.cluster_distance, 50.0);
        assert_eq!(options.tables.default_row_height, 21.5);
        assert_eq!(options.text.row_tolerance, 10.0);
        assert_eq!(options.overlap.chart_text_overlap, 0.5);
        assert_eq!(options.shapes.border_max_offset, 10.0);
        assert_eq!(options.icons.render_dpi, 600.0);
        assert_eq!(options.roles.title_font_size, 20.0);
        assert!(options.tables.line_tables);
        assert!(options.extract_icons && options.classify_roles);
        assert!(!options.parallel);
    }

    #[test]
    fn test_partial_json_config() {
        let json = r#"{"tables": {"alignment_tolerance": 4.5}, "detect_charts": false}"#;
        let options: ReconstructOptions = serde_json::from_str(json).unwrap();
        assert_eq!(options.tables.alignment_tolerance, 4.5);
        assert_eq!(options.tables.min_rows, 2);
        assert!(!options.detect_charts);
        assert_eq!(options.shapes, ShapeMergerConfig::default());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"text": {"max_gap": 30}}"#).unwrap();
        let options = ReconstructOptions::from_json_file(&path).unwrap();
        assert_eq!(options.text.max_gap, 30.0);

        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            ReconstructOptions::from_json_file(&path),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_page_selection_parse() {
        assert_eq!(PageSelection::parse("").unwrap(), PageSelection::All);
        assert_eq!(PageSelection::parse("2-4").unwrap(), PageSelection::Range(2..=4));
        assert_eq!(
            PageSelection::parse("5,1,3-4,3").unwrap(),
            PageSelection::Pages(vec![1, 3, 4, 5])
        );
        assert!(PageSelection::parse("a-3").is_err());
        assert!(PageSelection::parse("4-2").is_err());
    }

    #[test]
    fn test_page_selection_rejects_reversed_part_in_list() {
        assert!(matches!(
            PageSelection::parse("1,5-3"),
            Err(Error::InvalidPageRange(part)) if part == "5-3"
        ));
        assert_eq!(
            PageSelection::parse("1,3-3").unwrap(),
            PageSelection::Pages(vec![1, 3])
        );
    }
}
