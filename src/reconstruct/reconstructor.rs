//! Page and document reconstruction.
//!
//! Every page runs the same fixed pipeline:
//!
//! 1. Merge ring pairs, drop duplicate overlaps, reclassify hairlines
//! 2. Render icon-font glyphs and take them out of the text
//! 3. Detect tables (consumes cell shapes and the text inside cells)
//! 4. Cluster the remaining shapes into chart rasters
//! 5. Drop text runs inside charts
//! 6. Assemble the remaining runs into blocks
//! 7. Drop shapes that only decorate text
//! 8. Tag shapes and blocks with layout roles
//!
//! Tables are found before charts so colored table grids are never
//! flattened into a picture. Chart text goes before assembly so labels on
//! either side of a chart are never joined into one block.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::{DocumentInput, DocumentLayout, Page, PageInput, PageLayout};
use crate::raster::{NullRasterizer, Rasterizer};

use super::chart_clusterer::ChartClusterer;
use super::icon_extractor::IconExtractor;
use super::options::ReconstructOptions;
use super::overlap_filter::OverlapFilter;
use super::role_classifier::RoleClassifier;
use super::shape_merger::ShapeMerger;
use super::table_detector::TableDetector;
use super::text_assembler::TextAssembler;

/// Runs the reconstruction pipeline over pages.
pub struct Reconstructor {
    options: ReconstructOptions,
    rasterizer: Arc<dyn Rasterizer>,
    merger: ShapeMerger,
    icons: IconExtractor,
    tables: TableDetector,
    charts: ChartClusterer,
    text: TextAssembler,
    overlap: OverlapFilter,
    roles: RoleClassifier,
}

impl Reconstructor {
    /// Create a reconstructor that renders with [`NullRasterizer`].
    pub fn new(options: ReconstructOptions) -> Self {
        Self {
            merger: ShapeMerger::with_config(options.shapes.clone()),
            icons: IconExtractor::with_config(options.icons.clone()),
            tables: TableDetector::with_config(options.tables.clone()),
            charts: ChartClusterer::with_config(options.charts.clone()),
            text: TextAssembler::with_config(options.text.clone()),
            overlap: OverlapFilter::with_config(options.overlap.clone()),
            roles: RoleClassifier::with_config(options.roles.clone()),
            rasterizer: Arc::new(NullRasterizer),
            options,
        }
    }

    /// Use a real rendering backend for chart regions and icons.
    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    /// Get the options.
    pub fn options(&self) -> &ReconstructOptions {
        &self.options
    }

    /// Reconstruct one page, failing on a page that cannot be processed.
    pub fn reconstruct_page(&self, page: Page) -> Result<PageLayout> {
        validate(&page)?;
        Ok(self.run_pipeline(page))
    }

    /// Reconstruct one page, passing its primitives through on failure.
    pub fn reconstruct_page_or_passthrough(&self, page: Page) -> PageLayout {
        match validate(&page) {
            Ok(()) => self.run_pipeline(page),
            Err(e) => {
                log::error!("page {}: {}, passing primitives through", page.number, e);
                PageLayout::passthrough(page)
            }
        }
    }

    /// Reconstruct every selected page of a document.
    ///
    /// A page that fails is logged, passed through and listed in
    /// [`DocumentLayout::failed_pages`]; the other pages are unaffected.
    pub fn reconstruct(&self, input: &DocumentInput) -> DocumentLayout {
        let selected: Vec<(usize, &PageInput)> = input
            .pages
            .iter()
            .enumerate()
            .filter(|(i, p)| self.options.pages.includes(p.number.unwrap_or(*i as u32 + 1)))
            .collect();
        log::info!(
            "Reconstructing {} of {} pages",
            selected.len(),
            input.pages.len()
        );

        let mut layout = DocumentLayout::new();
        for page in self.run_pages(selected, input) {
            layout.add_page(page);
        }
        if !layout.failed_pages.is_empty() {
            log::warn!("Pages passed through after errors: {:?}", layout.failed_pages);
        }
        layout
    }

    fn run_pages(&self, pages: Vec<(usize, &PageInput)>, input: &DocumentInput) -> Vec<PageLayout> {
        #[cfg(feature = "parallel")]
        if self.options.parallel {
            use rayon::prelude::*;
            return pages
                .into_par_iter()
                .map(|(i, p)| self.process_input(i, p, input))
                .collect();
        }

        pages
            .into_iter()
            .map(|(i, p)| self.process_input(i, p, input))
            .collect()
    }

    fn process_input(&self, index: usize, page: &PageInput, input: &DocumentInput) -> PageLayout {
        match page.to_page(index, &input.coefficients) {
            Ok(page) => self.reconstruct_page_or_passthrough(page),
            Err(e) => {
                log::error!("{}, passing primitives through", e);
                PageLayout::passthrough(page.to_page_unchecked(index, &input.coefficients))
            }
        }
    }

    fn run_pipeline(&self, page: Page) -> PageLayout {
        let Page {
            number,
            width,
            height,
            shapes,
            texts,
            images,
        } = page;
        let input_shapes = shapes.len();

        let shapes = self.merger.merge(shapes);

        let (icons, texts) = if self.options.extract_icons {
            self.icons.extract(
                number,
                texts,
                width,
                height,
                self.rasterizer.as_ref(),
                self.options.raster_retries,
            )
        } else {
            (Vec::new(), texts)
        };

        let (tables, shapes, texts) = if self.options.detect_tables {
            let detection = self.tables.detect(shapes, texts, width, height);
            (detection.tables, detection.shapes, detection.texts)
        } else {
            (Vec::new(), shapes, texts)
        };

        let (charts, shapes) = if self.options.detect_charts {
            self.charts.detect(
                number,
                shapes,
                width,
                height,
                self.rasterizer.as_ref(),
                self.options.raster_retries,
            )
        } else {
            (Vec::new(), shapes)
        };

        let texts = self.overlap.filter_chart_runs(texts, &charts);
        let mut blocks = self.text.assemble(texts);
        let mut shapes = self.overlap.filter_decorations(shapes, &blocks);

        if self.options.classify_roles {
            self.roles.classify_shapes(&mut shapes, width, height);
            self.roles.classify_text(&mut blocks, height);
        }

        log::info!(
            "page {}: {} -> {} shapes, {} tables, {} charts, {} icons, {} text blocks",
            number,
            input_shapes,
            shapes.len(),
            tables.len(),
            charts.len(),
            icons.len(),
            blocks.len()
        );

        PageLayout {
            number,
            width,
            height,
            shapes,
            tables,
            charts,
            icons,
            text_blocks: blocks,
            images,
            passthrough: false,
        }
    }
}

impl Default for Reconstructor {
    fn default() -> Self {
        Self::new(ReconstructOptions::default())
    }
}

/// Reject pages whose geometry the heuristics cannot work with.
fn validate(page: &Page) -> Result<()> {
    let invalid = |reason: String| Error::InvalidPage {
        page: page.number,
        reason,
    };
    if !(page.width.is_finite() && page.height.is_finite() && page.width > 0.0 && page.height > 0.0) {
        return Err(invalid(format!("page size {}x{}", page.width, page.height)));
    }
    if let Some(shape) = page.shapes.iter().find(|s| !s.bbox.is_valid()) {
        return Err(invalid(format!("shape {} has bounds {:?}", shape.id.0, shape.bbox)));
    }
    if let Some(run) = page.texts.iter().find(|r| !r.bbox.is_valid()) {
        return Err(invalid(format!("text '{}' has bounds {:?}", run.content, run.bbox)));
    }
    Ok(())
}
