//! Rasterization backend for chart regions.
//!
//! Rendering a page region to pixels belongs to whatever document backend
//! decoded the page, so the engine only sees this trait. Calls are blocking
//! and must be idempotent: a failed call may be repeated with the same
//! arguments.

use crate::error::{Error, Result};
use crate::model::{BBox, RasterImage};

/// Renders a clipped region of a source page.
pub trait Rasterizer: Send + Sync {
    /// Render `clip` (page points) of page `page` (1-indexed) at `zoom` pixels per point.
    fn rasterize(&self, page: u32, clip: &BBox, zoom: f32) -> Result<RasterImage>;
}

/// Rasterizer that produces correctly sized, empty images.
///
/// Used when no rendering backend is attached; the layout still records
/// where each chart region is and how large its raster would be.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRasterizer;

impl Rasterizer for NullRasterizer {
    fn rasterize(&self, _page: u32, clip: &BBox, zoom: f32) -> Result<RasterImage> {
        if !clip.is_valid() || !zoom.is_finite() || zoom <= 0.0 {
            return Err(Error::Raster(format!(
                "cannot render clip {:?} at zoom {}",
                clip, zoom
            )));
        }
        Ok(RasterImage {
            format: "png".to_string(),
            width_px: (clip.width() * zoom).ceil() as u32,
            height_px: (clip.height() * zoom).ceil() as u32,
            data: Vec::new(),
        })
    }
}

/// Call the rasterizer, retrying up to `retries` more times on failure.
pub fn rasterize_with_retry(
    rasterizer: &dyn Rasterizer,
    page: u32,
    clip: &BBox,
    zoom: f32,
    retries: u32,
) -> Result<RasterImage> {
    let mut attempt = 0;
    loop {
        match rasterizer.rasterize(page, clip, zoom) {
            Ok(image) => return Ok(image),
            Err(e) if attempt < retries => {
                attempt += 1;
                log::warn!(
                    "page {}: rasterization attempt {} failed: {}, retrying",
                    page,
                    attempt,
                    e
                );
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    impl Rasterizer for Flaky {
        fn rasterize(&self, page: u32, clip: &BBox, zoom: f32) -> Result<RasterImage> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(Error::Raster("busy".to_string()))
            } else {
                NullRasterizer.rasterize(page, clip, zoom)
            }
        }
    }

    #[test]
    fn test_null_rasterizer_dimensions() {
        let image = NullRasterizer
            .rasterize(1, &BBox::new(0.0, 0.0, 72.0, 36.5), 2.0)
            .unwrap();
        assert_eq!(image.width_px, 144);
        assert_eq!(image.height_px, 73);
        assert!(image.data.is_empty());
    }

    #[test]
    fn test_retry_succeeds_within_budget() {
        let flaky = Flaky {
            failures: 2,
            calls: AtomicU32::new(0),
        };
        let clip = BBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(rasterize_with_retry(&flaky, 1, &clip, 1.0, 2).is_ok());
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_retry_gives_up() {
        let flaky = Flaky {
            failures: 5,
            calls: AtomicU32::new(0),
        };
        let clip = BBox::new(0.0, 0.0, 10.0, 10.0);
        let err = rasterize_with_retry(&flaky, 1, &clip, 1.0, 1).unwrap_err();
        assert!(matches!(err, Error::Raster(_)));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);
    }
}
