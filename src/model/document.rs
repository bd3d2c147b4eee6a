//! Document-level output.

use serde::{Deserialize, Serialize};

use super::PageLayout;

/// Reconstructed layout of every selected page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentLayout {
    pub pages: Vec<PageLayout>,

    /// Pages that fell back to pass-through
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_pages: Vec<u32>,
}

impl DocumentLayout {
    /// Create an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page, recording it if it fell back.
    pub fn add_page(&mut self, page: PageLayout) {
        if page.passthrough {
            self.failed_pages.push(page.number);
        }
        self.pages.push(page);
    }

    /// Get the number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Get a page by number (1-indexed).
    pub fn page(&self, number: u32) -> Option<&PageLayout> {
        self.pages.iter().find(|p| p.number == number)
    }
}
