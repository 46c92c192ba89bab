//! Lays out the title block, the body, the metadata block and the footers.

use super::metrics::{text_width, wrap};
use super::*;
use crate::config::DetailLevel;
use crate::grammar::{self, Dialect, Line, LineKind};
use crate::output::OutputMetadata;

/// Paragraph sub-lines longer than this tighten the paragraph's line height.
const DENSE_LINE_CHARS: usize = 80;

/// Everything needed to lay out one exported report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    /// Shown under the title when present.
    pub detail_level: Option<DetailLevel>,
    /// Pre-formatted generation time.
    pub generated_on: String,
    pub body: String,
    /// Marker convention of `body`.
    pub dialect: Dialect,
    pub metadata: Option<OutputMetadata>,
}

/// Lay out `doc` on as many pages as it needs.
///
/// Always returns at least one page, and every page carries a centred
/// `Page i of N` footer.
pub fn lay_out(doc: &ReportDocument) -> LaidOutDocument {
    let mut engine = LayoutEngine::new();
    engine.title_block(doc);
    for line in grammar::lines(&doc.body, doc.dialect) {
        engine.body_line(line);
    }
    if let Some(meta) = &doc.metadata {
        engine.metadata_block(meta);
    }
    LaidOutDocument {
        pages: engine.finish(),
        properties: DocumentProperties::for_title(doc.title.clone()),
    }
}

/// Pages written so far plus the cursor on the last one.
struct LayoutEngine {
    pages: Vec<Page>,
    cursor: PageCursor,
}

impl LayoutEngine {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            cursor: PageCursor { y: 0.0, page: 0 },
        }
    }

    fn break_page(&mut self, top: f32) {
        self.pages.push(Page::default());
        self.cursor = PageCursor {
            y: top,
            page: self.pages.len() - 1,
        };
    }

    /// Break to a new page starting at `top` if the cursor is past
    /// `PAGE_HEIGHT - reserve`.
    fn ensure_room(&mut self, reserve: f32, top: f32) {
        if self.cursor.y > PAGE_HEIGHT - reserve {
            self.break_page(top);
        }
    }

    fn put(&mut self, text: impl Into<String>, x: f32, size: f32, weight: FontWeight, color: Rgb) {
        let run = TextRun {
            text: text.into(),
            x,
            y: self.cursor.y,
            size,
            weight,
            color,
        };
        self.pages[self.cursor.page].marks.push(Mark::Text(run));
    }

    fn put_centered(&mut self, text: &str, y: f32, size: f32, color: Rgb) {
        let x = CENTER_X - text_width(text, size) / 2.0;
        let run = TextRun {
            text: text.to_string(),
            x,
            y,
            size,
            weight: FontWeight::Regular,
            color,
        };
        self.pages[self.cursor.page].marks.push(Mark::Text(run));
    }

    fn title_block(&mut self, doc: &ReportDocument) {
        self.put_centered(&doc.title, 25.0, TITLE_SIZE, Rgb::TITLE_BLUE);
        let generated = format!("Generated on: {}", doc.generated_on);
        match doc.detail_level {
            Some(level) => {
                let detail = format!("Detail Level: {level}");
                self.put_centered(&detail, 35.0, SUBTITLE_SIZE, Rgb::SUBTITLE_GREY);
                self.put_centered(&generated, 42.0, SUBTITLE_SIZE, Rgb::SUBTITLE_GREY);
                self.cursor.y = 55.0;
            }
            None => {
                self.put_centered(&generated, 35.0, SUBTITLE_SIZE, Rgb::SUBTITLE_GREY);
                self.cursor.y = 50.0;
            }
        }
    }

    fn body_line(&mut self, line: Line<'_>) {
        if line.is_blank() {
            return;
        }
        self.ensure_room(BODY_RESERVE, CONTINUATION_TOP);

        match line.kind {
            LineKind::Header => {
                self.put(
                    line.heading().trim_end(),
                    MARGIN,
                    HEADER_SIZE,
                    FontWeight::Bold,
                    Rgb::TITLE_BLUE,
                );
                self.cursor.y += 15.0;
            }
            LineKind::Numbered => {
                let sub_lines = wrap(line.raw, MAX_WIDTH - 10.0, BODY_SIZE);
                self.list_lines(sub_lines, MARGIN + 10.0);
            }
            LineKind::Bulleted => {
                let sub_lines = wrap(&format!("• {}", line.text()), MAX_WIDTH - 10.0, BODY_SIZE);
                self.list_lines(sub_lines, MARGIN + 15.0);
            }
            LineKind::Paragraph => {
                let mut line_height = 8.0;
                for sub in wrap(line.raw, MAX_WIDTH, BODY_SIZE) {
                    if sub.chars().count() > DENSE_LINE_CHARS {
                        line_height = 7.0;
                    }
                    self.ensure_room(BODY_RESERVE, CONTINUATION_TOP);
                    self.put(sub, MARGIN, BODY_SIZE, FontWeight::Regular, Rgb::BLACK);
                    self.cursor.y += line_height;
                }
                if line.dialect != Dialect::Verbatim {
                    self.cursor.y += 5.0;
                }
            }
            LineKind::Blank => {}
        }
    }

    fn list_lines(&mut self, sub_lines: Vec<String>, x: f32) {
        for sub in sub_lines {
            self.ensure_room(BODY_RESERVE, CONTINUATION_TOP);
            self.put(sub, x, BODY_SIZE, FontWeight::Regular, Rgb::BLACK);
            self.cursor.y += 8.0;
        }
    }

    fn metadata_block(&mut self, meta: &OutputMetadata) {
        if self.cursor.y > PAGE_HEIGHT - METADATA_RESERVE {
            self.break_page(MARGIN);
        } else {
            self.cursor.y += 15.0;
        }

        let y = self.cursor.y;
        self.pages[self.cursor.page].marks.push(Mark::Rule {
            x1: MARGIN,
            x2: RULE_END_X,
            y,
            color: Rgb::RULE_GREY,
        });
        self.cursor.y += 10.0;

        if !meta.keywords.is_empty() {
            self.put(
                "Related Keywords:",
                MARGIN,
                HEADER_SIZE,
                FontWeight::Bold,
                Rgb::KEYWORD_BLUE,
            );
            self.cursor.y += 12.0;
            for sub in wrap(&meta.keywords.join(", "), MAX_WIDTH, BODY_SIZE) {
                self.ensure_room(KEYWORD_RESERVE, MARGIN);
                self.put(sub, MARGIN, BODY_SIZE, FontWeight::Regular, Rgb::BLACK);
                self.cursor.y += 7.0;
            }
            self.cursor.y += 10.0;
        }

        if !meta.questions.is_empty() {
            self.ensure_room(METADATA_RESERVE, MARGIN);
            self.put(
                "Related Questions:",
                MARGIN,
                HEADER_SIZE,
                FontWeight::Bold,
                Rgb::QUESTION_GREEN,
            );
            self.cursor.y += 15.0;
            for (i, question) in meta.questions.iter().enumerate() {
                self.ensure_room(BODY_RESERVE, CONTINUATION_TOP);
                let numbered = format!("{}. {}", i + 1, question);
                for sub in wrap(&numbered, MAX_WIDTH - 10.0, BODY_SIZE) {
                    self.ensure_room(BODY_RESERVE, CONTINUATION_TOP);
                    self.put(sub, MARGIN + 5.0, BODY_SIZE, FontWeight::Regular, Rgb::BLACK);
                    self.cursor.y += 8.0;
                }
                self.cursor.y += 5.0;
            }
        }
    }

    /// Stamp `Page i of N` on every page.
    fn finish(mut self) -> Vec<Page> {
        let total = self.pages.len();
        let y = PAGE_HEIGHT - 10.0;
        for (i, page) in self.pages.iter_mut().enumerate() {
            let text = format!("Page {} of {}", i + 1, total);
            let x = CENTER_X - text_width(&text, FOOTER_SIZE) / 2.0;
            page.marks.push(Mark::Text(TextRun {
                text,
                x,
                y,
                size: FOOTER_SIZE,
                weight: FontWeight::Regular,
                color: Rgb::FOOTER_GREY,
            }));
        }
        self.pages
    }
}
