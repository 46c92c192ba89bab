//! Paginated layout of an analysis report on A4 pages.
//!
//! Layout is pure: [`lay_out`] turns a [`ReportDocument`] into pages of
//! positioned [`Mark`]s and never fails. Turning those marks into PDF bytes
//! is [`crate::pdf`]'s job.
//!
//! All coordinates are millimetres from the top-left corner of the page;
//! text `y` is the baseline.

pub mod document;
pub mod metrics;

pub use document::{lay_out, ReportDocument};

// ── Geometry (A4 portrait) ───────────────────────────────────────────────

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const MARGIN: f32 = 20.0;
pub const MAX_WIDTH: f32 = 170.0;
pub const CENTER_X: f32 = PAGE_WIDTH / 2.0;

/// Body text breaks to a new page once the cursor passes `PAGE_HEIGHT - BODY_RESERVE`.
pub const BODY_RESERVE: f32 = 40.0;
/// Room the metadata block wants before it starts.
pub const METADATA_RESERVE: f32 = 100.0;
/// Keyword lines may run lower than body text.
pub const KEYWORD_RESERVE: f32 = 30.0;
/// Cursor position after a break inside body text.
pub const CONTINUATION_TOP: f32 = MARGIN + 10.0;
/// Right end of the separator rule above the metadata block.
pub const RULE_END_X: f32 = 190.0;

pub const TITLE_SIZE: f32 = 24.0;
pub const SUBTITLE_SIZE: f32 = 14.0;
pub const HEADER_SIZE: f32 = 16.0;
pub const BODY_SIZE: f32 = 12.0;
pub const FOOTER_SIZE: f32 = 10.0;

/// An RGB colour with 0-255 channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const TITLE_BLUE: Rgb = Rgb(25, 118, 210);
    pub const KEYWORD_BLUE: Rgb = Rgb(0, 0, 255);
    pub const QUESTION_GREEN: Rgb = Rgb(0, 128, 0);
    pub const SUBTITLE_GREY: Rgb = Rgb(100, 100, 100);
    pub const FOOTER_GREY: Rgb = Rgb(150, 150, 150);
    pub const RULE_GREY: Rgb = Rgb(200, 200, 200);

    /// Channels scaled to `0.0..=1.0`.
    pub fn unit(&self) -> [f32; 3] {
        [self.0, self.1, self.2].map(|c| f32::from(c) / 255.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

/// A single line of text at a fixed position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    /// Left edge.
    pub x: f32,
    /// Baseline.
    pub y: f32,
    pub size: f32,
    pub weight: FontWeight,
    pub color: Rgb,
}

/// Something drawn on a page.
#[derive(Debug, Clone, PartialEq)]
pub enum Mark {
    Text(TextRun),
    /// Horizontal rule from `x1` to `x2` at `y`.
    Rule { x1: f32, x2: f32, y: f32, color: Rgb },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub marks: Vec<Mark>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &TextRun> {
        self.marks.iter().filter_map(|m| match m {
            Mark::Text(t) => Some(t),
            Mark::Rule { .. } => None,
        })
    }

    /// True if any text run on the page equals `text`.
    pub fn contains_text(&self, text: &str) -> bool {
        self.texts().any(|t| t.text == text)
    }
}

/// Document information dictionary entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentProperties {
    pub title: String,
    pub subject: String,
    pub author: String,
    pub keywords: String,
}

impl DocumentProperties {
    pub fn for_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subject: "Image Analysis Report".into(),
            author: "VisionAI Image Identifier".into(),
            keywords: "image, analysis, ai, report".into(),
        }
    }
}

/// Output of [`lay_out`]: at least one page, each ending with its footer.
#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutDocument {
    pub pages: Vec<Page>,
    pub properties: DocumentProperties,
}

/// Vertical position on the current page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageCursor {
    pub y: f32,
    /// Zero-based index of the page being written.
    pub page: usize,
}
