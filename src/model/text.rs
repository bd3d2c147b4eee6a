//! Text runs and assembled text blocks.

use serde::{Deserialize, Serialize};

use super::{BBox, Color};

/// Font family fragments that identify icon fonts.
const ICON_FONT_PATTERNS: &[&str] = &[
    "fontawesome",
    "material",
    "ionicons",
    "glyphicons",
    "icofont",
    "feather",
    "iconfont",
    "bookshelfsymbol",
    "webdings",
    "wingdings",
];

/// A run of text drawn with one font and style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub content: String,

    pub bbox: BBox,

    /// Font size in points
    pub font_size: f32,

    pub is_bold: bool,

    pub is_italic: bool,

    pub color: Option<Color>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,

    /// Drawn with an icon font (glyphs in a Private Use Area)
    #[serde(default)]
    pub is_icon: bool,
}

impl TextRun {
    /// Create a plain run.
    pub fn new(content: impl Into<String>, bbox: BBox, font_size: f32) -> Self {
        Self {
            content: content.into(),
            bbox,
            font_size,
            is_bold: false,
            is_italic: false,
            color: None,
            font_name: None,
            is_icon: false,
        }
    }

    /// Set bold.
    pub fn bold(mut self) -> Self {
        self.is_bold = true;
        self
    }

    /// Set italic.
    pub fn italic(mut self) -> Self {
        self.is_italic = true;
        self
    }

    /// Set the text color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Set the font name and re-evaluate the icon flag.
    pub fn with_font(mut self, name: impl Into<String>) -> Self {
        self.font_name = Some(name.into());
        self.is_icon = is_icon_text(&self.content, self.font_name.as_deref());
        self
    }

    /// Same bold and italic flags.
    pub fn same_style(&self, other: &TextRun) -> bool {
        self.is_bold == other.is_bold && self.is_italic == other.is_italic
    }

    /// True if the run has only whitespace.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Where a text block sits in the slide structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextRole {
    Title,
    Subtitle,
    Header,
    Footer,
    Heading,
    Body,
}

/// Consecutive runs on one line sharing a style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Joined text of all runs
    pub text: String,

    /// Union of the run boxes
    pub bbox: BBox,

    pub is_bold: bool,

    pub is_italic: bool,

    /// Runs in reading order
    pub runs: Vec<TextRun>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<TextRole>,
}

impl TextBlock {
    /// Start a block from a single run.
    pub fn from_run(run: TextRun) -> Self {
        Self {
            text: run.content.clone(),
            bbox: run.bbox,
            is_bold: run.is_bold,
            is_italic: run.is_italic,
            runs: vec![run],
            role: None,
        }
    }

    /// Append a run; a space separates runs more than `space_gap` apart.
    pub fn push(&mut self, run: TextRun, space_gap: f32) {
        let gap = run.bbox.x0 - self.bbox.x1;
        if gap > space_gap && !self.text.ends_with(' ') && !run.content.starts_with(' ') {
            self.text.push(' ');
        }
        self.text.push_str(&run.content);
        self.bbox = self.bbox.union(&run.bbox);
        self.runs.push(run);
    }

    /// Largest font size among the runs.
    pub fn font_size(&self) -> f32 {
        self.runs.iter().map(|r| r.font_size).fold(0.0, f32::max)
    }

    /// The last run in the block.
    pub fn last_run(&self) -> Option<&TextRun> {
        self.runs.last()
    }
}

/// Code point in one of the Unicode Private Use Areas, or a replacement/non-character.
pub fn is_private_use(c: char) -> bool {
    matches!(
        c as u32,
        0xE000..=0xF8FF | 0xF0000..=0xFFFFF | 0x100000..=0x10FFFF | 0xFFFD | 0xFFFF
    )
}

/// Whether a run is an icon glyph rather than readable text.
pub fn is_icon_text(content: &str, font_name: Option<&str>) -> bool {
    if let Some(font) = font_name {
        let font = font.to_lowercase();
        if ICON_FONT_PATTERNS.iter().any(|p| font.contains(p)) {
            return true;
        }
    }
    let mut chars = content.chars().filter(|c| !c.is_whitespace()).peekable();
    chars.peek().is_some() && chars.all(is_private_use)
}
