//! Chart region detection.
//!
//! Pie, donut and bar charts arrive as dozens of overlapping colored paths
//! that the slide shape model cannot reproduce. Shapes that jointly form such
//! a graphic are clustered and replaced by a single raster of the page region.

use std::collections::HashSet;

use crate::model::{BBox, ChartRegion, Color, Shape, ShapeId};
use crate::raster::{rasterize_with_retry, Rasterizer};

use super::options::ChartClusterConfig;
use super::union_find::UnionFind;

/// How a cluster was formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterKind {
    /// Stacked boxes with identical bounds and different fills
    ExactOverlap,
    /// Shapes close to each other
    Spatial,
}

/// A group of shapes that passed the chart acceptance test.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartCluster {
    pub kind: ClusterKind,
    /// Union of the member boxes, before padding
    pub bbox: BBox,
    pub members: Vec<ShapeId>,
}

/// Groups shapes into chart regions.
pub struct ChartClusterer {
    config: ChartClusterConfig,
}

impl ChartClusterer {
    /// Create a new clusterer with default configuration.
    pub fn new() -> Self {
        Self {
            config: ChartClusterConfig::default(),
        }
    }

    /// Create a new clusterer with custom configuration.
    pub fn with_config(config: ChartClusterConfig) -> Self {
        Self { config }
    }

    /// Zoom factor used for rendering.
    pub fn zoom(&self) -> f32 {
        self.config.render_dpi / 72.0
    }

    /// Find clusters that qualify as charts. Nothing is rendered.
    pub fn find_clusters(&self, shapes: &[Shape], page_width: f32, page_height: f32) -> Vec<ChartCluster> {
        let candidates: Vec<&Shape> = shapes
            .iter()
            .filter(|s| self.is_candidate(s, page_width, page_height))
            .collect();
        log::debug!(
            "ChartClusterer: {} of {} shapes are candidates",
            candidates.len(),
            shapes.len()
        );
        if candidates.len() < self.config.min_shapes {
            return vec![];
        }

        let page_area = page_width * page_height;
        let mut accepted = Vec::new();

        // Step 1: stacked exact-overlap groups
        let exact_groups = self.exact_overlap_groups(&candidates);
        let grouped: HashSet<usize> = exact_groups.iter().flatten().copied().collect();
        for group in &exact_groups {
            let members: Vec<&Shape> = group.iter().map(|&i| candidates[i]).collect();
            if let Some(cluster) = self.accept(&members, ClusterKind::ExactOverlap, page_area) {
                accepted.push(cluster);
            }
        }

        // Step 2: spatial clustering of everything else
        let rest: Vec<&Shape> = candidates
            .iter()
            .enumerate()
            .filter(|(i, _)| !grouped.contains(i))
            .map(|(_, s)| *s)
            .collect();
        for group in self.spatial_groups(&rest) {
            let members: Vec<&Shape> = group.iter().map(|&i| rest[i]).collect();
            if let Some(cluster) = self.accept(&members, ClusterKind::Spatial, page_area) {
                accepted.push(cluster);
            }
        }

        log::debug!("ChartClusterer: {} clusters accepted", accepted.len());
        accepted
    }

    /// Detect chart regions and render them.
    ///
    /// Returns the regions and the shapes that were not absorbed. A cluster
    /// whose rasterization keeps failing is dropped and its shapes stay.
    pub fn detect(
        &self,
        page_number: u32,
        shapes: Vec<Shape>,
        page_width: f32,
        page_height: f32,
        rasterizer: &dyn Rasterizer,
        retries: u32,
    ) -> (Vec<ChartRegion>, Vec<Shape>) {
        let clusters = self.find_clusters(&shapes, page_width, page_height);
        if clusters.is_empty() {
            return (vec![], shapes);
        }

        let zoom = self.zoom();
        let mut regions = Vec::new();
        let mut absorbed: HashSet<ShapeId> = HashSet::new();

        for cluster in clusters {
            let padded = cluster.bbox.padded(self.config.padding);
            let clip = BBox::new(
                padded.x0,
                padded.y0,
                padded.x1.min(page_width),
                padded.y1.min(page_height),
            );
            match rasterize_with_retry(rasterizer, page_number, &clip, zoom, retries) {
                Ok(raster) => {
                    log::info!(
                        "page {}: chart region {:?} with {} shapes",
                        page_number,
                        clip,
                        cluster.members.len()
                    );
                    absorbed.extend(cluster.members.iter().copied());
                    regions.push(ChartRegion {
                        bbox: clip,
                        members: cluster.members,
                        zoom,
                        raster,
                        is_chart: true,
                    });
                }
                Err(e) => {
                    log::warn!(
                        "page {}: keeping chart shapes as vectors, rasterization failed: {}",
                        page_number,
                        e
                    );
                }
            }
        }

        let remaining = shapes
            .into_iter()
            .filter(|s| !absorbed.contains(&s.id))
            .collect();
        (regions, remaining)
    }

    /// Skip page backgrounds, tiny marks and page-spanning dividers.
    fn is_candidate(&self, shape: &Shape, page_width: f32, page_height: f32) -> bool {
        let (w, h) = (shape.bbox.width(), shape.bbox.height());
        let page_area = page_width * page_height;
        let c = &self.config;

        if shape.bbox.area() > page_area * c.background_page_fraction {
            return false;
        }
        if w < c.min_shape_size || h < c.min_shape_size {
            return false;
        }
        if h < c.thin_bar_thickness && w > page_width * c.full_width_fraction {
            return false;
        }
        if w < c.thin_bar_thickness && h > page_height * c.full_height_fraction {
            return false;
        }
        true
    }

    fn exact_overlap_groups(&self, candidates: &[&Shape]) -> Vec<Vec<usize>> {
        let n = candidates.len();
        let mut uf = UnionFind::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (candidates[i], candidates[j]);
                let different_fill = match (a.fill_color, b.fill_color) {
                    (Some(fa), Some(fb)) => fa != fb,
                    _ => false,
                };
                if different_fill
                    && a.bbox.matches_within(&b.bbox, self.config.exact_overlap_tolerance)
                {
                    uf.union(i, j);
                }
            }
        }
        uf.groups().into_iter().filter(|g| g.len() >= 2).collect()
    }

    fn spatial_groups(&self, shapes: &[&Shape]) -> Vec<Vec<usize>> {
        let n = shapes.len();
        let mut uf = UnionFind::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                if shapes[i].bbox.gap_distance(&shapes[j].bbox) <= self.config.cluster_distance {
                    uf.union(i, j);
                }
            }
        }
        uf.groups()
    }

    fn accept(&self, members: &[&Shape], kind: ClusterKind, page_area: f32) -> Option<ChartCluster> {
        let c = &self.config;
        if members.len() < c.min_shapes {
            return None;
        }

        let colors: HashSet<Color> = members
            .iter()
            .filter_map(|s| s.fill_color)
            .filter(|c| !c.is_white() && !c.is_black())
            .collect();
        if colors.len() < c.min_colors {
            log::debug!(
                "ChartClusterer: {} shapes rejected, only {} fill colors",
                members.len(),
                colors.len()
            );
            return None;
        }

        let bbox = members
            .iter()
            .skip(1)
            .fold(members[0].bbox, |acc, s| acc.union(&s.bbox));
        let min_area = match kind {
            ClusterKind::ExactOverlap => c.min_chart_area * c.exact_overlap_area_factor,
            ClusterKind::Spatial => c.min_chart_area,
        };
        if bbox.area() < min_area {
            log::debug!(
                "ChartClusterer: cluster area {:.0} below {:.0}",
                bbox.area(),
                min_area
            );
            return None;
        }
        if bbox.area() > page_area * c.max_page_fraction {
            log::debug!(
                "ChartClusterer: cluster covers {:.0}% of page, not a chart",
                bbox.area() / page_area * 100.0
            );
            return None;
        }

        let mut members: Vec<ShapeId> = members.iter().map(|s| s.id).collect();
        members.sort();
        Some(ChartCluster { kind, bbox, members })
    }
}

impl Default for ChartClusterer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::model::RasterImage;
    use crate::raster::NullRasterizer;

    const W: f32 = 960.0;
    const H: f32 = 540.0;

    fn filled(id: usize, x: f32, y: f32, w: f32, h: f32, color: Color) -> Shape {
        Shape::new(ShapeId(id), BBox::from_xywh(x, y, w, h)).with_fill(color)
    }

    /// Five bars of a bar chart in three colors.
    fn bar_chart() -> Vec<Shape> {
        let colors = [
            Color::rgb(0x44, 0x72, 0xC4),
            Color::rgb(0xED, 0x7D, 0x31),
            Color::rgb(0xA5, 0xA5, 0xA5),
        ];
        (0..5)
            .map(|i| {
                let h = 60.0 + 30.0 * i as f32;
                filled(i, 100.0 + 40.0 * i as f32, 350.0 - h, 30.0, h, colors[i % 3])
            })
            .collect()
    }

    struct Broken;

    impl Rasterizer for Broken {
        fn rasterize(&self, _page: u32, _clip: &BBox, _zoom: f32) -> Result<RasterImage> {
            Err(Error::Raster("no backend".to_string()))
        }
    }

    #[test]
    fn test_spatial_cluster_detected() {
        let mut shapes = bar_chart();
        // Unrelated box far away
        shapes.push(filled(5, 800.0, 50.0, 60.0, 60.0, Color::rgb(10, 10, 10)));

        let clusterer = ChartClusterer::new();
        let clusters = clusterer.find_clusters(&shapes, W, H);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].kind, ClusterKind::Spatial);
        assert_eq!(
            clusters[0].members,
            (0..5).map(ShapeId).collect::<Vec<_>>()
        );
        assert_eq!(clusters[0].bbox, BBox::new(100.0, 170.0, 290.0, 350.0));
    }

    #[test]
    fn test_single_color_cluster_rejected() {
        let gray = Color::rgb(0xA5, 0xA5, 0xA5);
        let shapes: Vec<Shape> = (0..5)
            .map(|i| filled(i, 100.0 + 40.0 * i as f32, 100.0, 30.0, 150.0, gray))
            .collect();
        assert!(ChartClusterer::new().find_clusters(&shapes, W, H).is_empty());
    }

    #[test]
    fn test_small_cluster_rejected_unless_exact_overlap() {
        let colors = [Color::rgb(200, 0, 0), Color::rgb(0, 200, 0), Color::rgb(0, 0, 200)];

        // Three small squares side by side: 30x30 area < 10000
        let spread: Vec<Shape> = (0..3)
            .map(|i| filled(i, 100.0 + 12.0 * i as f32, 100.0, 10.0, 30.0, colors[i]))
            .collect();
        assert!(ChartClusterer::new().find_clusters(&spread, W, H).is_empty());

        // Three stacked 40x40 boxes: area 1600 >= 10% of 10000
        let stacked: Vec<Shape> = (0..3)
            .map(|i| filled(i, 300.0 + i as f32, 300.0, 40.0, 40.0, colors[i]))
            .collect();
        let clusters = ChartClusterer::new().find_clusters(&stacked, W, H);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].kind, ClusterKind::ExactOverlap);
    }

    #[test]
    fn test_backgrounds_and_dividers_are_not_candidates() {
        let mut shapes = bar_chart();
        shapes.push(filled(5, 0.0, 0.0, W, H, Color::rgb(250, 250, 250)));
        shapes.push(filled(6, 0.0, 360.0, W, 4.0, Color::rgb(20, 20, 120)));
        shapes.push(filled(7, 0.0, 370.0, W * 0.95, 10.0, Color::rgb(20, 120, 20)));

        let clusters = ChartClusterer::new().find_clusters(&shapes, W, H);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members.len(), 5);
    }

    #[test]
    fn test_cluster_larger_than_page_fraction_rejected() {
        let colors = [Color::rgb(200, 0, 0), Color::rgb(0, 200, 0)];
        let shapes: Vec<Shape> = (0..4)
            .map(|i| filled(i, 20.0 + 230.0 * i as f32, 20.0, 220.0, 480.0, colors[i % 2]))
            .collect();
        assert!(ChartClusterer::new().find_clusters(&shapes, W, H).is_empty());
    }

    #[test]
    fn test_detect_replaces_members_with_raster() {
        let mut shapes = bar_chart();
        shapes.push(filled(5, 800.0, 50.0, 60.0, 60.0, Color::rgb(10, 10, 10)));

        let (regions, remaining) =
            ChartClusterer::new().detect(1, shapes, W, H, &NullRasterizer, 0);
        assert_eq!(regions.len(), 1);
        assert!(regions[0].is_chart);
        // 5% padding of 190x180
        let bbox = regions[0].bbox;
        assert!(bbox.matches_within(&BBox::new(90.5, 161.0, 299.5, 359.0), 1e-3));
        assert!((regions[0].zoom - 300.0 / 72.0).abs() < 1e-5);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, ShapeId(5));
    }

    #[test]
    fn test_failed_raster_keeps_shapes() {
        let (regions, remaining) =
            ChartClusterer::new().detect(1, bar_chart(), W, H, &Broken, 2);
        assert!(regions.is_empty());
        assert_eq!(remaining.len(), 5);
    }
}
