//! Line grammar shared by the converter and every renderer.
//!
//! Analysis text carries ad-hoc markers. Two marker conventions exist:
//!
//! ```text
//! Plain  (model output)      Report (structured report)
//! ─────────────────────      ──────────────────────────
//! Important Information:     ## Important Information:
//! Other Information:         ## Analysis Summary
//! 1. numbered item           1. numbered item
//! -bullet item                  • bullet item
//! any other text             any other text
//! ```
//!
//! [`classify`] maps a single line to a [`Line`] under one [`Dialect`]. The
//! formatter, the terminal renderer and the PDF layout engine all go through
//! it, so the report writer and the report reader cannot drift apart.

use once_cell::sync::Lazy;
use regex::Regex;

/// Headers recognised in model output.
pub const PLAIN_HEADERS: [&str; 2] = ["Important Information:", "Other Information:"];

/// Header prefix of the structured report.
pub const REPORT_HEADER_PREFIX: &str = "## ";

/// Bullet prefix of the structured report: three spaces and a bullet.
pub const REPORT_BULLET_PREFIX: &str = "   •";

static RE_NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.").unwrap());
static RE_NUMBER_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s*").unwrap());

/// Marker convention used to read a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Model output: `Important Information:` headers and `-` bullets.
    Plain,
    /// Structured report: `## ` headers and `   •` bullets.
    Report,
    /// Preformatted text (JSON): every non-blank line is a paragraph.
    Verbatim,
}

/// What a line is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Header,
    Numbered,
    Bulleted,
    Paragraph,
    Blank,
}

/// A classified line, borrowing the raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub kind: LineKind,
    pub dialect: Dialect,
    pub raw: &'a str,
}

impl<'a> Line<'a> {
    /// Item text with the marker removed and surrounding whitespace trimmed.
    ///
    /// Numbered items lose their `N.` prefix, bullets lose `-` or `   •`,
    /// headers lose `## ` in the report dialect.
    pub fn text(&self) -> &'a str {
        match self.kind {
            LineKind::Header => self.heading().trim(),
            LineKind::Numbered => match RE_NUMBER_MARKER.find(self.raw) {
                Some(m) => self.raw[m.end()..].trim(),
                None => self.raw.trim(),
            },
            LineKind::Bulleted => self.bullet_text(),
            LineKind::Paragraph | LineKind::Blank => self.raw.trim(),
        }
    }

    /// Header text as displayed.
    ///
    /// Plain headers are shown verbatim; report headers drop the `## ` prefix.
    pub fn heading(&self) -> &'a str {
        match self.dialect {
            Dialect::Report => self
                .raw
                .strip_prefix(REPORT_HEADER_PREFIX)
                .unwrap_or(self.raw),
            Dialect::Plain | Dialect::Verbatim => self.raw,
        }
    }

    fn bullet_text(&self) -> &'a str {
        let rest = match self.dialect {
            Dialect::Report => self.raw.strip_prefix(REPORT_BULLET_PREFIX),
            Dialect::Plain | Dialect::Verbatim => self.raw.strip_prefix('-'),
        };
        rest.unwrap_or(self.raw).trim()
    }

    pub fn is_blank(&self) -> bool {
        self.kind == LineKind::Blank
    }
}

/// Classify one line under `dialect`.
///
/// Rules are tried in order: blank, header, numbered, bulleted, paragraph.
/// Markers are matched on the raw line; only blankness looks past leading
/// whitespace.
pub fn classify(raw: &str, dialect: Dialect) -> Line<'_> {
    let kind = if raw.trim().is_empty() {
        LineKind::Blank
    } else {
        match dialect {
            Dialect::Plain => {
                if is_plain_header(raw) {
                    LineKind::Header
                } else if RE_NUMBERED.is_match(raw) {
                    LineKind::Numbered
                } else if raw.starts_with('-') {
                    LineKind::Bulleted
                } else {
                    LineKind::Paragraph
                }
            }
            Dialect::Report => {
                if raw.starts_with(REPORT_HEADER_PREFIX) {
                    LineKind::Header
                } else if RE_NUMBERED.is_match(raw) {
                    LineKind::Numbered
                } else if raw.starts_with(REPORT_BULLET_PREFIX) {
                    LineKind::Bulleted
                } else {
                    LineKind::Paragraph
                }
            }
            Dialect::Verbatim => LineKind::Paragraph,
        }
    };
    Line { kind, dialect, raw }
}

/// Classify every `\n`-separated line of `text`, blanks included.
pub fn lines(text: &str, dialect: Dialect) -> impl Iterator<Item = Line<'_>> {
    text.split('\n').map(move |l| classify(l, dialect))
}

fn is_plain_header(raw: &str) -> bool {
    PLAIN_HEADERS.iter().any(|h| raw.starts_with(h))
}

/// Derive a JSON section key from a plain header line.
///
/// `"Important Information:"` → `"important_information"`. The first colon
/// is dropped, then the text is trimmed, lower-cased, and whitespace runs
/// become `_`.
pub fn section_key(header: &str) -> String {
    let without_colon = header.replacen(':', "", 1);
    without_colon
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}
