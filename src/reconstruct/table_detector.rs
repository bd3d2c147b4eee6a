//! Table detection from cell rectangles and ruling lines.
//!
//! Slide generators draw tables as one rectangle per cell, often several
//! stacked at the same spot (white background, colored foreground, border).
//! This module groups such rectangles into rows, induces the column grid,
//! resolves merged cells and fills, and moves the text inside each cell
//! into the table.
//!
//! Some generators rule the grid with horizontal and vertical lines instead
//! and paint cell fills as separate rectangles. Connected groups of such
//! lines form a second kind of table; rectangle tables win where both
//! overlap.
//!
//! Pipeline:
//! 1. Filter cell candidates (drop hairlines, bars and backgrounds)
//! 2. Split side-by-side tables at consistent horizontal gaps
//! 3. Group candidates into rows, deduplicating stacked rectangles
//! 4. Grow tables from the rows with the most cells
//! 5. Validate the grid and resolve overlapping tables
//! 6. Build cells with spans, fills, text, alignment and row heights

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::model::geometry::{dedup_positions, snap};
use crate::model::{
    BBox, CellAlignment, CellMargins, Color, Shape, ShapeId, ShapeKind, Table, TableCell, TextRun,
};

use super::options::TableDetectorConfig;
use super::union_find::UnionFind;

/// Border given to ruled cells when the lines carry no usable color.
const DEFAULT_RULE_WIDTH: f32 = 0.5;

/// A rectangle that may be a table cell.
#[derive(Debug, Clone)]
struct CellCandidate {
    bbox: BBox,
    fill: Option<Color>,
    stroke: Option<Color>,
    stroke_width: f32,
    /// Draw order of the topmost source
    order: usize,
    sources: Vec<ShapeId>,
}

impl CellCandidate {
    fn from_shape(shape: &Shape) -> Self {
        let stroke = if shape.has_stroke() {
            shape.stroke_color
        } else {
            None
        };
        Self {
            bbox: shape.bbox,
            fill: shape.fill_color,
            stroke,
            stroke_width: shape.stroke_width,
            order: shape.id.0,
            sources: vec![shape.id],
        }
    }

    fn has_style(&self) -> bool {
        self.fill.is_some() || self.stroke.is_some()
    }
}

/// Cells sharing a quantized top edge.
#[derive(Debug, Clone)]
struct GridRow {
    top: f32,
    cells: Vec<CellCandidate>,
}

/// Rows accepted as one table.
#[derive(Debug, Clone)]
struct TableRegion {
    rows: Vec<GridRow>,
    bbox: BBox,
}

/// Result of table detection on one page.
#[derive(Debug, Clone, Default)]
pub struct TableDetection {
    pub tables: Vec<Table>,
    /// Shapes not consumed by any table
    pub shapes: Vec<Shape>,
    /// Text runs not placed in any cell
    pub texts: Vec<TextRun>,
}

/// Detects tables drawn as cell rectangles.
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a new table detector with default configuration.
    pub fn new() -> Self {
        Self {
            config: TableDetectorConfig::default(),
        }
    }

    /// Create a new table detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect tables, moving their shapes and cell text out of the page sets.
    pub fn detect(
        &self,
        shapes: Vec<Shape>,
        texts: Vec<TextRun>,
        page_width: f32,
        page_height: f32,
    ) -> TableDetection {
        let regions = self.find_regions(&shapes, page_width * page_height);
        let mut tables: Vec<Table> = regions.iter().filter_map(|r| self.build_table(r)).collect();

        if self.config.line_tables {
            let claimed: HashSet<ShapeId> = tables.iter().flat_map(|t| t.source_shapes()).collect();
            for table in self.find_line_tables(&shapes, &claimed) {
                let limit = self.config.table_overlap_ratio;
                let conflicts = tables.iter().any(|k| {
                    let smaller = table.bbox.area().min(k.bbox.area());
                    smaller > 0.0 && table.bbox.intersection_area(&k.bbox) > smaller * limit
                });
                if conflicts {
                    log::debug!("TableDetector: ruled grid at {:?} overlaps a cell table", table.bbox);
                    continue;
                }
                tables.push(table);
            }
            tables.sort_by(|a, b| {
                (a.bbox.y0, a.bbox.x0)
                    .partial_cmp(&(b.bbox.y0, b.bbox.x0))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        if tables.is_empty() {
            return TableDetection {
                tables,
                shapes,
                texts,
            };
        }

        // Cells that fit no column stay on the page as shapes
        let consumed: HashSet<ShapeId> = tables.iter().flat_map(|t| t.source_shapes()).collect();
        let used = self.populate_text(&mut tables, &texts);

        log::debug!(
            "TableDetector: {} tables, {} shapes and {} text runs consumed",
            tables.len(),
            consumed.len(),
            used.iter().filter(|u| **u).count()
        );

        TableDetection {
            tables,
            shapes: shapes
                .into_iter()
                .filter(|s| !consumed.contains(&s.id))
                .collect(),
            texts: texts
                .into_iter()
                .zip(used)
                .filter_map(|(t, used)| (!used).then_some(t))
                .collect(),
        }
    }

    fn find_regions(&self, shapes: &[Shape], page_area: f32) -> Vec<TableRegion> {
        let candidates = self.filter_candidates(shapes);
        log::debug!(
            "TableDetector: {} cell candidates from {} shapes",
            candidates.len(),
            shapes.len()
        );
        if candidates.len() < self.config.min_rows * self.config.min_columns {
            return vec![];
        }

        let mut regions = Vec::new();
        for group in self.split_side_by_side(candidates) {
            let rows = self.group_rows(group);
            if rows.len() < self.config.min_rows {
                log::debug!(
                    "TableDetector: not enough rows ({} < {})",
                    rows.len(),
                    self.config.min_rows
                );
                continue;
            }

            // Rows with the most cells first, so sparse columns are seen early
            let mut order: Vec<usize> = (0..rows.len()).collect();
            order.sort_by(|&a, &b| rows[b].cells.len().cmp(&rows[a].cells.len()));

            let found: Vec<TableRegion> = order
                .into_iter()
                .filter_map(|start| self.try_build_region(&rows, start, page_area))
                .collect();
            regions.extend(self.remove_overlapping(found));
        }

        regions.sort_by(|a, b| {
            a.bbox
                .y0
                .partial_cmp(&b.bbox.y0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(
                    a.bbox
                        .x0
                        .partial_cmp(&b.bbox.x0)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
        });
        regions
    }

    /// Keep rectangles with cell-like proportions, then drop backgrounds.
    fn filter_candidates(&self, shapes: &[Shape]) -> Vec<CellCandidate> {
        let c = &self.config;
        let mut candidates: Vec<CellCandidate> = shapes
            .iter()
            .filter(|s| !s.is_ring)
            .filter(|s| {
                let (w, h) = (s.bbox.width(), s.bbox.height());
                if w < c.min_cell_size || h < c.min_cell_size {
                    return false;
                }
                let elongation = s.bbox.elongation();
                if h < c.thin_bar_height && elongation > c.thin_bar_aspect {
                    return false;
                }
                if h >= c.thin_bar_height && elongation > c.wide_bar_aspect {
                    return false;
                }
                s.has_fill() || s.has_stroke()
            })
            .map(CellCandidate::from_shape)
            .collect();

        if candidates.is_empty() {
            return candidates;
        }

        let mut areas: Vec<f32> = candidates.iter().map(|c| c.bbox.area()).collect();
        areas.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let p75 = areas[(areas.len() as f32 * 0.75) as usize];
        let limit = p75 * c.background_area_factor;
        candidates.retain(|cand| cand.bbox.area() <= limit);
        candidates
    }

    fn row_key(&self, y: f32) -> i64 {
        (y / self.config.alignment_tolerance).round() as i64
    }

    /// Split candidates where most rows show the same wide horizontal gap.
    fn split_side_by_side(&self, candidates: Vec<CellCandidate>) -> Vec<Vec<CellCandidate>> {
        let mut rows: BTreeMap<i64, Vec<&CellCandidate>> = BTreeMap::new();
        for cand in &candidates {
            rows.entry(self.row_key(cand.bbox.y0)).or_default().push(cand);
        }
        if rows.len() < 2 {
            return vec![candidates];
        }

        let mut gap_counts: BTreeMap<i64, usize> = BTreeMap::new();
        for cells in rows.values() {
            let mut normal: Vec<&&CellCandidate> = cells
                .iter()
                .filter(|c| c.bbox.width() < self.config.max_column_width)
                .collect();
            normal.sort_by(|a, b| {
                a.bbox
                    .x0
                    .partial_cmp(&b.bbox.x0)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            for pair in normal.windows(2) {
                let gap = pair[1].bbox.x0 - pair[0].bbox.x1;
                if gap > self.config.split_gap {
                    let center = ((pair[0].bbox.x1 + pair[1].bbox.x0) / 20.0).round() as i64;
                    *gap_counts.entry(center).or_default() += 1;
                }
            }
        }

        let needed = rows.len() as f32 * self.config.split_consistency;
        let splits: Vec<f32> = gap_counts
            .iter()
            .filter(|(_, count)| **count as f32 >= needed)
            .map(|(center, _)| *center as f32 * 10.0)
            .collect();
        if splits.is_empty() {
            return vec![candidates];
        }
        log::debug!("TableDetector: splitting side-by-side tables at x = {:?}", splits);

        let mut groups: Vec<Vec<CellCandidate>> = vec![Vec::new(); splits.len() + 1];
        for cand in candidates {
            let (cx, _) = cand.bbox.center();
            let idx = splits.iter().take_while(|s| cx >= **s).count();
            groups[idx].push(cand);
        }
        groups.retain(|g| !g.is_empty());
        groups
    }

    /// Group candidates by quantized top edge and fold lone tall cells into the next row.
    fn group_rows(&self, candidates: Vec<CellCandidate>) -> Vec<GridRow> {
        let mut by_key: BTreeMap<i64, Vec<CellCandidate>> = BTreeMap::new();
        for cand in candidates {
            by_key.entry(self.row_key(cand.bbox.y0)).or_default().push(cand);
        }

        let rows: Vec<GridRow> = by_key
            .into_iter()
            .map(|(key, cells)| GridRow {
                top: key as f32 * self.config.alignment_tolerance,
                cells: self.dedup_cells(cells),
            })
            .collect();

        let mut merged: Vec<GridRow> = Vec::with_capacity(rows.len());
        let mut iter = rows.into_iter().peekable();
        while let Some(row) = iter.next() {
            let lone_tall = row.cells.len() == 1
                && row.cells[0].bbox.height() > self.config.tall_row_height;
            if lone_tall {
                if let Some(next) = iter.peek_mut() {
                    if next.top - row.top < self.config.tall_row_merge_gap && next.cells.len() >= 2 {
                        log::debug!(
                            "TableDetector: merging tall cell at y={:.1} into row y={:.1}",
                            row.top,
                            next.top
                        );
                        next.cells.extend(row.cells);
                        continue;
                    }
                }
            }
            merged.push(row);
        }

        for row in &mut merged {
            row.cells.sort_by(|a, b| {
                a.bbox
                    .x0
                    .partial_cmp(&b.bbox.x0)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        merged
    }

    /// Merge rectangles stacked at the same origin into one cell.
    fn dedup_cells(&self, cells: Vec<CellCandidate>) -> Vec<CellCandidate> {
        let tol = self.config.dedup_tolerance.max(f32::EPSILON);
        let mut groups: BTreeMap<(i64, i64), Vec<CellCandidate>> = BTreeMap::new();
        for cell in cells {
            let key = (
                (cell.bbox.x0 / tol).round() as i64,
                (cell.bbox.y0 / tol).round() as i64,
            );
            groups.entry(key).or_default().push(cell);
        }

        groups
            .into_values()
            .filter_map(|group| {
                if group.len() == 1 {
                    return group.into_iter().next();
                }
                self.merge_stack(group)
            })
            .collect()
    }

    fn merge_stack(&self, mut group: Vec<CellCandidate>) -> Option<CellCandidate> {
        let reasonable = |c: &CellCandidate| {
            let w = c.bbox.width();
            w >= self.config.min_column_width && w <= self.config.max_column_width
        };
        let by_width = |a: &&CellCandidate, b: &&CellCandidate| {
            a.bbox
                .width()
                .partial_cmp(&b.bbox.width())
                .unwrap_or(std::cmp::Ordering::Equal)
        };
        let base = group
            .iter()
            .filter(|c| reasonable(c))
            .max_by(by_width)
            .or_else(|| group.iter().max_by(by_width))?
            .bbox;

        // Topmost non-white fill wins
        group.sort_by(|a, b| b.order.cmp(&a.order));
        let fill = group
            .iter()
            .filter_map(|c| c.fill)
            .find(|f| !f.is_white())
            .or_else(|| group.iter().find_map(|c| c.fill));
        let (stroke, stroke_width) = group
            .iter()
            .rev()
            .find(|c| c.stroke.is_some())
            .map(|c| (c.stroke, c.stroke_width))
            .unwrap_or((None, 0.0));

        let mut sources: Vec<ShapeId> = group.iter().flat_map(|c| c.sources.iter().copied()).collect();
        sources.sort();

        Some(CellCandidate {
            bbox: base,
            fill,
            stroke,
            stroke_width,
            order: group[0].order,
            sources,
        })
    }

    /// Quantized left edges of a row's real cells.
    fn row_columns(&self, row: &GridRow) -> Vec<f32> {
        let mut cols: Vec<f32> = row
            .cells
            .iter()
            .filter(|c| c.bbox.width() >= self.config.min_column_width)
            .map(|c| snap(c.bbox.x0, self.config.alignment_tolerance))
            .collect();
        cols.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        cols.dedup();
        cols
    }

    /// Whether a row's columns fit the columns established so far.
    fn columns_match(&self, established: &[f32], cols: &[f32]) -> bool {
        if cols.is_empty() || established.is_empty() {
            return false;
        }
        let tol = self.config.alignment_tolerance * 2.0;
        let matched = cols
            .iter()
            .filter(|c| established.iter().any(|e| (*c - e).abs() <= tol))
            .count();

        if cols.len() == 1 {
            let leftmost = established.iter().copied().fold(f32::INFINITY, f32::min);
            return matched == 1 || cols[0] < leftmost - self.config.left_column_margin;
        }
        matched as f32 >= cols.len() as f32 * self.config.row_match_ratio
    }

    fn extend_columns(&self, established: &mut Vec<f32>, cols: &[f32]) {
        let tol = self.config.alignment_tolerance * 2.0;
        for &c in cols {
            if !established.iter().any(|e| (c - e).abs() <= tol) {
                established.push(c);
            }
        }
        established.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    }

    fn try_build_region(&self, rows: &[GridRow], start: usize, page_area: f32) -> Option<TableRegion> {
        let mut established = self.row_columns(&rows[start]);
        if established.len() < self.config.min_columns {
            return None;
        }

        let mut hi = start;
        for (i, row) in rows.iter().enumerate().skip(start + 1) {
            let cols = self.row_columns(row);
            if !self.columns_match(&established, &cols) {
                break;
            }
            self.extend_columns(&mut established, &cols);
            hi = i;
        }

        let mut lo = start;
        for i in (0..start).rev() {
            let cols = self.row_columns(&rows[i]);
            if !self.columns_match(&established, &cols) {
                break;
            }
            self.extend_columns(&mut established, &cols);
            lo = i;
        }

        if hi - lo + 1 < self.config.min_rows {
            return None;
        }

        let table_rows = rows[lo..=hi].to_vec();
        let bbox = table_rows
            .iter()
            .flat_map(|r| r.cells.iter())
            .map(|c| c.bbox)
            .reduce(|acc, b| acc.union(&b))?;

        if bbox.area() > page_area * self.config.max_page_fraction {
            log::debug!(
                "TableDetector: skipping region, covers {:.0}% of page",
                bbox.area() / page_area * 100.0
            );
            return None;
        }

        let columns = self.discover_columns(&table_rows);
        if !self.validate_grid(&table_rows, &columns) {
            log::debug!(
                "TableDetector: region {}x{} at ({:.1}, {:.1}) is not a grid",
                table_rows.len(),
                columns.len(),
                bbox.x0,
                bbox.y0
            );
            return None;
        }

        Some(TableRegion {
            rows: table_rows,
            bbox,
        })
    }

    /// Column left edges from cells with a plausible column width.
    fn discover_columns(&self, rows: &[GridRow]) -> Vec<f32> {
        let positions: Vec<f32> = rows
            .iter()
            .flat_map(|r| r.cells.iter())
            .filter(|c| {
                let w = c.bbox.width();
                w >= self.config.min_column_width && w <= self.config.max_column_width
            })
            .map(|c| c.bbox.x0)
            .collect();
        dedup_positions(positions, self.config.column_merge_tolerance)
    }

    /// Reject card layouts, single-column stacks and decorative alignments.
    fn validate_grid(&self, rows: &[GridRow], columns: &[f32]) -> bool {
        let c = &self.config;
        let num_rows = rows.len();
        let num_cols = columns.len();
        if num_rows < c.min_rows || num_cols < c.min_columns {
            return false;
        }

        let real_cells = |row: &GridRow| -> Vec<CellCandidate> {
            row.cells
                .iter()
                .filter(|cell| cell.bbox.width() > c.min_column_width)
                .cloned()
                .collect()
        };

        let mut multi_rows = 0;
        let mut single_rows = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            match real_cells(row).len() {
                0 => {}
                1 => single_rows.push(i),
                _ => multi_rows += 1,
            }
        }

        let small = num_rows <= 3;
        let merged_header = small && single_rows == [0] && multi_rows == num_rows - 1;
        if merged_header {
            let header_height = real_cells(&rows[0])
                .iter()
                .map(|cell| cell.bbox.height())
                .fold(0.0, f32::max);
            if header_height > c.max_header_height {
                return false;
            }
        }

        let min_ratio = if small && !merged_header {
            c.small_table_multi_cell_ratio
        } else {
            c.min_multi_cell_ratio
        };
        if (multi_rows as f32) < num_rows as f32 * min_ratio {
            return false;
        }

        let all_real: Vec<CellCandidate> = rows.iter().flat_map(|r| real_cells(r)).collect();
        let tol = c.alignment_tolerance * 2.0;
        let used_columns = columns
            .iter()
            .filter(|&&col| all_real.iter().any(|cell| (cell.bbox.x0 - col).abs() <= tol))
            .count();
        if (used_columns as f32) < num_cols as f32 * c.min_column_usage {
            return false;
        }

        if !all_real.is_empty() {
            let styled = all_real.iter().filter(|cell| cell.has_style()).count();
            if (styled as f32) < all_real.len() as f32 * c.min_border_ratio {
                return false;
            }
        }

        if num_rows <= 2 {
            let heights: Vec<f32> = all_real
                .iter()
                .map(|cell| cell.bbox.height())
                .filter(|h| *h > 0.0)
                .collect();
            if !heights.is_empty() {
                let mean = heights.iter().sum::<f32>() / heights.len() as f32;
                let max = heights.iter().copied().fold(0.0, f32::max);
                if mean > c.card_mean_height || max > c.card_max_height {
                    return false;
                }
            }
        }

        true
    }

    /// Among overlapping regions keep the larger one.
    ///
    /// A smaller region that only shares edge rows with a kept one loses
    /// those rows, so every shape ends up in at most one table.
    fn remove_overlapping(&self, mut regions: Vec<TableRegion>) -> Vec<TableRegion> {
        regions.sort_by(|a, b| {
            b.bbox
                .area()
                .partial_cmp(&a.bbox.area())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let mut kept: Vec<TableRegion> = Vec::new();
        let mut claimed: HashSet<ShapeId> = HashSet::new();
        for mut region in regions {
            let limit = region.bbox.area() * self.config.table_overlap_ratio;
            if kept
                .iter()
                .any(|k| region.bbox.intersection_area(&k.bbox) > limit)
            {
                continue;
            }

            region.rows.retain(|row| {
                row.cells
                    .iter()
                    .flat_map(|c| c.sources.iter())
                    .all(|id| !claimed.contains(id))
            });
            if region.rows.len() < self.config.min_rows {
                continue;
            }
            let Some(bbox) = region
                .rows
                .iter()
                .flat_map(|r| r.cells.iter())
                .map(|c| c.bbox)
                .reduce(|acc, b| acc.union(&b))
            else {
                continue;
            };
            region.bbox = bbox;

            claimed.extend(
                region
                    .rows
                    .iter()
                    .flat_map(|r| r.cells.iter())
                    .flat_map(|c| c.sources.iter().copied()),
            );
            kept.push(region);
        }
        kept
    }

    fn build_table(&self, region: &TableRegion) -> Option<Table> {
        let c = &self.config;
        let columns = self.discover_columns(&region.rows);
        if columns.len() < c.min_columns || region.rows.len() < c.min_rows {
            return None;
        }
        let tops: Vec<f32> = region.rows.iter().map(|r| r.top).collect();

        let mut cells: Vec<TableCell> = Vec::new();
        let mut taken: HashSet<(usize, usize)> = HashSet::new();
        for (r, row) in region.rows.iter().enumerate() {
            for cand in &row.cells {
                let Some(col) = columns
                    .iter()
                    .position(|&x| (cand.bbox.x0 - x).abs() < c.column_merge_tolerance)
                else {
                    log::debug!(
                        "TableDetector: cell at x={:.1} matches no column",
                        cand.bbox.x0
                    );
                    continue;
                };
                if !taken.insert((r, col)) {
                    continue;
                }

                let col_span = columns[col..]
                    .iter()
                    .filter(|&&x| x < cand.bbox.x1 - c.column_merge_tolerance)
                    .count()
                    .max(1);
                let row_span = tops[r..]
                    .iter()
                    .filter(|&&t| t < cand.bbox.y1 - c.alignment_tolerance)
                    .count()
                    .max(1);

                cells.push(TableCell {
                    row: r,
                    col,
                    row_span,
                    col_span,
                    bbox: cand.bbox,
                    fill_color: cand.fill.unwrap_or(Color::WHITE),
                    stroke_color: cand.stroke,
                    stroke_width: if cand.stroke.is_some() {
                        cand.stroke_width
                    } else {
                        0.0
                    },
                    text: String::new(),
                    alignment: CellAlignment::Left,
                    margins: CellMargins::uniform(c.cell_margin),
                    sources: cand.sources.clone(),
                });
            }
        }

        // Borderless cells inherit the table's first border
        if let Some((stroke, width)) = cells
            .iter()
            .find_map(|cell| cell.stroke_color.map(|s| (s, cell.stroke_width)))
        {
            for cell in cells.iter_mut().filter(|cell| cell.stroke_color.is_none()) {
                cell.stroke_color = Some(stroke);
                cell.stroke_width = width;
            }
        }

        let mut column_widths: Vec<f32> = columns.windows(2).map(|w| w[1] - w[0]).collect();
        if let Some(last) = columns.last() {
            column_widths.push(region.bbox.x1 - last);
        }

        let mut row_heights = Vec::with_capacity(tops.len());
        let mut ambiguous = Vec::new();
        for r in 0..tops.len() {
            let anchored: Vec<&TableCell> = cells.iter().filter(|cell| cell.row == r).collect();
            let heights: Vec<f32> = anchored.iter().map(|cell| cell.bbox.height()).collect();
            if !anchored.is_empty() && anchored.iter().all(|cell| cell.row_span > 1) {
                log::debug!(
                    "TableDetector: row {} has no single-row cell, height {:?} is a guess",
                    r,
                    heights
                );
                ambiguous.push(r);
            }
            row_heights.push(select_row_height(&heights, c.min_row_height).unwrap_or(c.default_row_height));
        }

        cells.sort_by_key(|cell| (cell.row, cell.col));

        Some(Table {
            bbox: region.bbox,
            rows: tops.len(),
            cols: columns.len(),
            cells,
            column_x_positions: columns,
            column_widths,
            row_heights,
            ambiguous_row_heights: ambiguous,
            rule_sources: Vec::new(),
        })
    }

    /// Build tables from connected grids of ruling lines.
    ///
    /// Shapes in `claimed` already belong to a cell table and are ignored.
    fn find_line_tables(&self, shapes: &[Shape], claimed: &HashSet<ShapeId>) -> Vec<Table> {
        let c = &self.config;
        let lines: Vec<&Shape> = shapes
            .iter()
            .filter(|s| s.shape_type == ShapeKind::Line && !claimed.contains(&s.id))
            .collect();
        if lines.len() < 4 {
            return vec![];
        }
        let backgrounds: Vec<&Shape> = shapes
            .iter()
            .filter(|s| {
                s.shape_type != ShapeKind::Line
                    && !s.is_ring
                    && s.has_fill()
                    && !claimed.contains(&s.id)
                    && s.bbox.width() > c.line_background_min_size
                    && s.bbox.height() > c.line_background_min_size
            })
            .collect();

        // Lines that touch belong to the same grid
        let mut uf = UnionFind::new(lines.len());
        for i in 0..lines.len() {
            for j in (i + 1)..lines.len() {
                if lines[i].bbox.gap_distance(&lines[j].bbox) <= c.alignment_tolerance {
                    uf.union(i, j);
                }
            }
        }

        let mut used_backgrounds: HashSet<ShapeId> = HashSet::new();
        uf.groups()
            .into_iter()
            .filter_map(|group| {
                let members: Vec<&Shape> = group.iter().map(|&i| lines[i]).collect();
                self.build_line_table(&members, &backgrounds, &mut used_backgrounds)
            })
            .collect()
    }

    fn build_line_table(
        &self,
        lines: &[&Shape],
        backgrounds: &[&Shape],
        used_backgrounds: &mut HashSet<ShapeId>,
    ) -> Option<Table> {
        let c = &self.config;
        let (horizontal, vertical): (Vec<&Shape>, Vec<&Shape>) = lines
            .iter()
            .copied()
            .partition(|l| l.bbox.width() > l.bbox.height());
        if horizontal.len() < 2 || vertical.len() < 2 {
            return None;
        }

        let mean = |values: Vec<f32>| values.iter().sum::<f32>() / values.len() as f32;
        let h_span = mean(horizontal.iter().map(|l| l.bbox.width()).collect());
        let v_span = mean(vertical.iter().map(|l| l.bbox.height()).collect());
        if h_span < c.min_line_span || v_span < c.min_line_span {
            log::debug!(
                "TableDetector: ruling lines too short ({:.1}, {:.1})",
                h_span,
                v_span
            );
            return None;
        }

        let ys = dedup_positions(
            horizontal.iter().map(|l| l.bbox.center().1).collect(),
            c.alignment_tolerance,
        );
        let xs = dedup_positions(
            vertical.iter().map(|l| l.bbox.center().0).collect(),
            c.alignment_tolerance,
        );
        let (rows, cols) = (ys.len().saturating_sub(1), xs.len().saturating_sub(1));
        if rows < c.min_rows || cols < c.min_columns {
            return None;
        }

        let row_heights: Vec<f32> = ys.windows(2).map(|w| w[1] - w[0]).collect();
        let column_widths: Vec<f32> = xs.windows(2).map(|w| w[1] - w[0]).collect();
        if row_heights
            .iter()
            .any(|h| *h < c.line_min_row_height || *h > c.line_max_row_height)
        {
            log::debug!("TableDetector: ruled rows out of range {:?}", row_heights);
            return None;
        }
        if column_widths
            .iter()
            .any(|w| *w < c.line_min_column_width || *w > c.line_max_column_width)
        {
            log::debug!("TableDetector: ruled columns out of range {:?}", column_widths);
            return None;
        }

        // One column far wider than the rest means two grids share the lines
        let mut sorted = column_widths.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let median = sorted[sorted.len() / 2];
        let widest = sorted[sorted.len() - 1];
        if widest > c.line_max_column_gap && widest > median * c.line_gap_ratio {
            log::debug!(
                "TableDetector: ruled column of {:.1} against median {:.1}, not one table",
                widest,
                median
            );
            return None;
        }

        let rule = lines[0];
        let (stroke, stroke_width) = if rule.has_stroke() {
            (rule.stroke_color, rule.stroke_width)
        } else {
            (rule.fill_color.or(Some(Color::BLACK)), DEFAULT_RULE_WIDTH)
        };

        let mut cells = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for col in 0..cols {
                let bbox = BBox::new(xs[col], ys[r], xs[col + 1], ys[r + 1]);
                let background = backgrounds.iter().find(|b| {
                    !used_backgrounds.contains(&b.id)
                        && b.bbox.matches_within(&bbox, c.line_background_tolerance)
                });
                let (fill_color, sources) = match background {
                    Some(b) => {
                        used_backgrounds.insert(b.id);
                        (b.fill_color.unwrap_or(Color::WHITE), vec![b.id])
                    }
                    None => (Color::WHITE, Vec::new()),
                };
                cells.push(TableCell {
                    row: r,
                    col,
                    row_span: 1,
                    col_span: 1,
                    bbox,
                    fill_color,
                    stroke_color: stroke,
                    stroke_width,
                    text: String::new(),
                    alignment: CellAlignment::Left,
                    margins: CellMargins::uniform(c.cell_margin),
                    sources,
                });
            }
        }

        let mut rule_sources: Vec<ShapeId> = lines.iter().map(|l| l.id).collect();
        rule_sources.sort();
        let bbox = BBox::new(xs[0], ys[0], xs[cols], ys[rows]);
        log::debug!(
            "TableDetector: ruled table {}x{} at {:?} from {} lines",
            rows,
            cols,
            bbox,
            rule_sources.len()
        );

        Some(Table {
            bbox,
            rows,
            cols,
            cells,
            column_x_positions: xs[..cols].to_vec(),
            column_widths,
            row_heights,
            ambiguous_row_heights: Vec::new(),
            rule_sources,
        })
    }

    /// Place each run in the smallest cell containing its center.
    ///
    /// Returns which runs were used.
    fn populate_text(&self, tables: &mut [Table], texts: &[TextRun]) -> Vec<bool> {
        let mut used = vec![false; texts.len()];
        let mut assigned: HashMap<(usize, usize), Vec<usize>> = HashMap::new();

        for (i, text) in texts.iter().enumerate() {
            let (cx, cy) = text.bbox.center();
            let best = tables
                .iter()
                .enumerate()
                .flat_map(|(t, table)| table.cells.iter().enumerate().map(move |(c, cell)| (t, c, cell)))
                .filter(|(_, _, cell)| cell.bbox.contains_point(cx, cy))
                .min_by(|a, b| {
                    a.2.bbox
                        .area()
                        .partial_cmp(&b.2.bbox.area())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|(t, c, _)| (t, c));
            if let Some(key) = best {
                assigned.entry(key).or_default().push(i);
                used[i] = true;
            }
        }

        let tol = self.config.alignment_tolerance;
        for ((t, c), mut indices) in assigned {
            indices.sort_by(|&a, &b| {
                let ka = (snap(texts[a].bbox.y0, tol), texts[a].bbox.x0);
                let kb = (snap(texts[b].bbox.y0, tol), texts[b].bbox.x0);
                ka.partial_cmp(&kb).unwrap_or(std::cmp::Ordering::Equal)
            });
            let runs: Vec<&TextRun> = indices.iter().map(|&i| &texts[i]).collect();

            let cell = &mut tables[t].cells[c];
            cell.text = runs
                .iter()
                .map(|r| r.content.trim())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            cell.alignment = self.detect_alignment(&cell.bbox, &runs);
        }

        used
    }

    /// Infer horizontal alignment from where the text sits in the cell.
    fn detect_alignment(&self, cell: &BBox, runs: &[&TextRun]) -> CellAlignment {
        if runs.is_empty() {
            return CellAlignment::Left;
        }
        let c = &self.config;
        let x_min = runs.iter().map(|r| r.bbox.x0).fold(f32::INFINITY, f32::min);
        let x_max = runs.iter().map(|r| r.bbox.x1).fold(f32::NEG_INFINITY, f32::max);

        let center_offset = ((x_min + x_max) / 2.0 - cell.center().0).abs();
        let left = x_min - cell.x0;
        let right = cell.x1 - x_max;

        if center_offset < cell.width() * c.center_offset_ratio {
            CellAlignment::Center
        } else if left < c.edge_margin {
            CellAlignment::Left
        } else if right < c.edge_margin {
            CellAlignment::Right
        } else if left < right * c.side_ratio {
            CellAlignment::Left
        } else if right < left * c.side_ratio {
            CellAlignment::Right
        } else {
            CellAlignment::Center
        }
    }
}

impl Default for TableDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Rendered height of a row from the heights of the cells anchored in it.
///
/// Taller cells are wrapped or span rows, so the smallest height above
/// `min_valid` is the single-line height. Falls back to the first non-zero
/// height, and to `None` when there is nothing to measure.
pub fn select_row_height(heights: &[f32], min_valid: f32) -> Option<f32> {
    heights
        .iter()
        .copied()
        .filter(|h| *h > min_valid)
        .reduce(f32::min)
        .or_else(|| heights.iter().copied().find(|h| *h > 0.0))
}
