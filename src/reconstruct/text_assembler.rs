//! Text line assembly.
//!
//! Orders runs into reading order and merges neighbours on the same line
//! into blocks that share one style.

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::model::geometry::quantize;
use crate::model::{TextBlock, TextRun};

use super::options::TextAssemblyConfig;

/// Merges text runs into style-consistent blocks.
pub struct TextAssembler {
    config: TextAssemblyConfig,
    numeric_token: Regex,
    bracket_annotation: Regex,
}

impl TextAssembler {
    /// Create a new assembler with default configuration.
    pub fn new() -> Self {
        Self::with_config(TextAssemblyConfig::default())
    }

    /// Create a new assembler with custom configuration.
    pub fn with_config(config: TextAssemblyConfig) -> Self {
        Self {
            config,
            // Numbers, versions, IPs, ports, percentages, hex addresses
            numeric_token: Regex::new(r"^(0[xX][0-9A-Fa-f]+|[0-9][0-9.,:/%_-]*)$").unwrap(),
            bracket_annotation: Regex::new(r"^[(\[【〔].*[)\]】〕]$").unwrap(),
        }
    }

    /// Sort runs into reading order: quantized row, then x.
    pub fn order(&self, mut runs: Vec<TextRun>) -> Vec<TextRun> {
        let t = self.config.row_tolerance;
        runs.sort_by(|a, b| {
            let ka = (quantize(a.bbox.y0, t), a.bbox.x0);
            let kb = (quantize(b.bbox.y0, t), b.bbox.x0);
            ka.partial_cmp(&kb).unwrap_or(std::cmp::Ordering::Equal)
        });
        runs
    }

    /// Assemble runs into blocks. Every run ends up in exactly one block.
    pub fn assemble(&self, runs: Vec<TextRun>) -> Vec<TextBlock> {
        let mut blocks: Vec<TextBlock> = Vec::new();
        for run in self.order(runs) {
            if let Some(block) = blocks.last_mut() {
                if block.last_run().is_some_and(|prev| self.can_merge(prev, &run)) {
                    block.push(run, self.config.space_gap);
                    continue;
                }
            }
            blocks.push(TextBlock::from_run(run));
        }
        log::debug!("TextAssembler: {} blocks", blocks.len());
        blocks
    }

    /// Whether `next` continues the block ending with `prev`.
    pub fn can_merge(&self, prev: &TextRun, next: &TextRun) -> bool {
        let t = self.config.row_tolerance;
        if quantize(prev.bbox.y0, t) != quantize(next.bbox.y0, t) {
            return false;
        }
        if prev.is_bold != next.is_bold || prev.is_italic != next.is_italic {
            return false;
        }
        let gap = next.bbox.x0 - prev.bbox.x1;
        gap < self.max_gap(prev, next)
    }

    fn max_gap(&self, a: &TextRun, b: &TextRun) -> f32 {
        let (a, b) = (fold(&a.content), fold(&b.content));
        let annotated = (self.is_numeric(&a) && self.is_annotation(&b))
            || (self.is_annotation(&a) && self.is_numeric(&b));
        if annotated {
            self.config.annotation_gap
        } else {
            self.config.max_gap
        }
    }

    fn is_numeric(&self, s: &str) -> bool {
        self.numeric_token.is_match(s)
    }

    fn is_annotation(&self, s: &str) -> bool {
        self.bracket_annotation.is_match(s)
    }
}

impl Default for TextAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// NFKC fold so fullwidth digits and brackets match their ASCII forms.
fn fold(s: &str) -> String {
    s.trim().nfkc().collect()
}
