//! Icon-font glyph extraction.
//!
//! Icon fonts map pictures to Private Use Area code points, which a slide
//! editor cannot display without the font. Such runs are taken out of the
//! text stream and rendered to small rasters instead.

use crate::model::{is_icon_text, BBox, IconImage, TextRun};
use crate::raster::{rasterize_with_retry, Rasterizer};

use super::options::IconConfig;

/// Moves icon glyphs from text into rendered images.
pub struct IconExtractor {
    config: IconConfig,
}

impl IconExtractor {
    pub fn new() -> Self {
        Self {
            config: IconConfig::default(),
        }
    }

    pub fn with_config(config: IconConfig) -> Self {
        Self { config }
    }

    /// Split icon runs off `runs` and render each one.
    ///
    /// Icon runs never return to the text, even when rendering fails; a
    /// missing glyph is better than a box of undisplayable characters.
    pub fn extract(
        &self,
        page_number: u32,
        runs: Vec<TextRun>,
        page_width: f32,
        page_height: f32,
        rasterizer: &dyn Rasterizer,
        retries: u32,
    ) -> (Vec<IconImage>, Vec<TextRun>) {
        let (icon_runs, text): (Vec<TextRun>, Vec<TextRun>) =
            runs.into_iter().partition(is_icon_run);
        if icon_runs.is_empty() {
            return (Vec::new(), text);
        }

        let zoom = self.config.render_dpi / 72.0;
        let mut icons = Vec::with_capacity(icon_runs.len());
        for run in icon_runs {
            let clip = self.clip(&run, page_width, page_height);
            match rasterize_with_retry(rasterizer, page_number, &clip, zoom, retries) {
                Ok(raster) => icons.push(IconImage {
                    bbox: run.bbox,
                    clip,
                    glyph: run.content,
                    font_name: run.font_name,
                    raster,
                }),
                Err(e) => log::warn!(
                    "page {}: icon {:?} not rendered: {}",
                    page_number,
                    run.content,
                    e
                ),
            }
        }

        log::debug!("IconExtractor: {} icons rendered", icons.len());
        (icons, text)
    }

    /// Glyph box padded by a share of the font size, kept on the page.
    fn clip(&self, run: &TextRun, page_width: f32, page_height: f32) -> BBox {
        let pad = run.font_size * self.config.padding_fraction;
        BBox::new(
            (run.bbox.x0 - pad).max(0.0),
            (run.bbox.y0 - pad).max(0.0),
            (run.bbox.x1 + pad).min(page_width),
            (run.bbox.y1 + pad).min(page_height),
        )
    }
}

impl Default for IconExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn is_icon_run(run: &TextRun) -> bool {
    run.is_icon || is_icon_text(&run.content, run.font_name.as_deref())
}
