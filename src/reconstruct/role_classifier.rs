//! Layout role classification.
//!
//! Tags what each surviving shape and text block does on the slide, so an
//! editor can put backgrounds on the master, keep titles in title
//! placeholders and so on. Roles come from size and position only.

use crate::model::{Shape, ShapeRole, TextBlock, TextRole};

use super::options::LayoutRoleConfig;

/// Assigns [`ShapeRole`] and [`TextRole`] tags.
pub struct RoleClassifier {
    config: LayoutRoleConfig,
}

impl RoleClassifier {
    pub fn new() -> Self {
        Self {
            config: LayoutRoleConfig::default(),
        }
    }

    pub fn with_config(config: LayoutRoleConfig) -> Self {
        Self { config }
    }

    /// Tag every shape.
    pub fn classify_shapes(&self, shapes: &mut [Shape], page_width: f32, page_height: f32) {
        for shape in shapes.iter_mut() {
            shape.role = Some(self.shape_role(shape, page_width, page_height));
        }
    }

    /// Tag every text block.
    pub fn classify_text(&self, blocks: &mut [TextBlock], page_height: f32) {
        for block in blocks.iter_mut() {
            block.role = Some(self.text_role(block, page_height));
        }
        let titles = blocks
            .iter()
            .filter(|b| b.role == Some(TextRole::Title))
            .count();
        log::debug!("RoleClassifier: {} blocks, {} titles", blocks.len(), titles);
    }

    pub fn shape_role(&self, shape: &Shape, page_width: f32, page_height: f32) -> ShapeRole {
        let c = &self.config;
        if shape.is_border() {
            return ShapeRole::Border;
        }
        let (w, h) = (shape.bbox.width(), shape.bbox.height());
        if shape.bbox.area() > page_width * page_height * c.background_page_fraction {
            ShapeRole::Background
        } else if h < c.bar_max_height && w > page_width * c.bar_min_width_fraction {
            ShapeRole::Decoration
        } else if w < c.border_max_width && h > c.border_min_height {
            ShapeRole::Border
        } else if w > c.card_min_width && h > c.card_min_height {
            ShapeRole::CardBackground
        } else {
            ShapeRole::Decoration
        }
    }

    pub fn text_role(&self, block: &TextBlock, page_height: f32) -> TextRole {
        let c = &self.config;
        let size = block.font_size();
        let y = block.bbox.y0;
        if size >= c.title_font_size && y < page_height * c.title_band {
            if size >= c.large_title_font_size {
                TextRole::Title
            } else {
                TextRole::Subtitle
            }
        } else if y < page_height * c.header_band {
            TextRole::Header
        } else if y > page_height * c.footer_band {
            TextRole::Footer
        } else if size >= c.heading_font_size {
            TextRole::Heading
        } else {
            TextRole::Body
        }
    }
}

impl Default for RoleClassifier {
    fn default() -> Self {
        Self::new()
    }
}
