//! On-screen rendering of one presentation of an analysis.
//!
//! [`elements`] is the stateless line-to-element mapping; [`render_terminal`]
//! turns elements (and optional metadata) into text for a terminal, with or
//! without ANSI colour.

use crate::config::OutputFormat;
use crate::formatter::FormattedOutput;
use crate::grammar::{self, Dialect, LineKind};
use crate::output::OutputMetadata;

/// A display element produced from one line (or, for JSON, the whole text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayElement {
    Heading(String),
    /// Numbered item, shown with its number as written.
    Numbered(String),
    Bullet(String),
    Text(String),
    /// Preformatted block.
    Code(String),
}

/// Marker convention used to read each presentation.
pub fn dialect_for(format: OutputFormat) -> Dialect {
    match format {
        OutputFormat::Plain => Dialect::Plain,
        OutputFormat::Structured => Dialect::Report,
        OutputFormat::Json => Dialect::Verbatim,
    }
}

/// Map the text of one presentation to display elements. Blank lines are
/// omitted; JSON is one preformatted block.
pub fn elements(text: &str, format: OutputFormat) -> Vec<DisplayElement> {
    if format == OutputFormat::Json {
        return vec![DisplayElement::Code(text.to_string())];
    }
    grammar::lines(text, dialect_for(format))
        .filter_map(|line| match line.kind {
            LineKind::Header => Some(DisplayElement::Heading(line.heading().trim_end().to_string())),
            LineKind::Numbered => Some(DisplayElement::Numbered(line.raw.trim().to_string())),
            LineKind::Bulleted => Some(DisplayElement::Bullet(line.text().to_string())),
            LineKind::Paragraph => Some(DisplayElement::Text(line.raw.trim_end().to_string())),
            LineKind::Blank => None,
        })
        .collect()
}

/// Pick the presentation of `formatted` matching `format`.
pub fn select(formatted: &FormattedOutput, format: OutputFormat) -> &str {
    match format {
        OutputFormat::Plain => &formatted.plain,
        OutputFormat::Json => &formatted.json,
        OutputFormat::Structured => &formatted.structured,
    }
}

fn paint(code: &str, s: &str, color: bool) -> String {
    if color {
        format!("\x1b[{code}m{s}\x1b[0m")
    } else {
        s.to_string()
    }
}

/// Render elements, followed by the keyword and question lists when
/// `metadata` has any.
pub fn render_terminal(
    elements: &[DisplayElement],
    metadata: Option<&OutputMetadata>,
    color: bool,
) -> String {
    let mut out = String::new();
    for element in elements {
        match element {
            DisplayElement::Heading(h) => {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(&paint("1;34", h, color));
                out.push('\n');
            }
            DisplayElement::Numbered(t) => {
                out.push_str("  ");
                out.push_str(t);
                out.push('\n');
            }
            DisplayElement::Bullet(t) => {
                out.push_str("    • ");
                out.push_str(t);
                out.push('\n');
            }
            DisplayElement::Text(t) => {
                out.push_str(t);
                out.push('\n');
            }
            DisplayElement::Code(c) => {
                out.push_str(&paint("32", c, color));
                out.push('\n');
            }
        }
    }

    if let Some(meta) = metadata.filter(|m| !m.is_empty()) {
        out.push('\n');
        out.push_str(&paint("2", &"─".repeat(40), color));
        out.push('\n');
        if !meta.keywords.is_empty() {
            out.push_str(&paint("1;33", "Related Keywords", color));
            out.push('\n');
            let chips: Vec<String> = meta
                .keywords
                .iter()
                .map(|k| paint("34", &format!("[{k}]"), color))
                .collect();
            out.push_str(&chips.join(" "));
            out.push('\n');
        }
        if !meta.questions.is_empty() {
            if !meta.keywords.is_empty() {
                out.push('\n');
            }
            out.push_str(&paint("1;32", "Related Questions", color));
            out.push('\n');
            for (i, q) in meta.questions.iter().enumerate() {
                out.push_str(&format!("  {}. {}\n", i + 1, q));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::format_output;
    use pretty_assertions::assert_eq;

    const CAT: &str = "Important Information:\n1. It is a cat\n-Domestic animal\n\nCats are mammals.";

    #[test]
    fn plain_elements() {
        assert_eq!(
            elements(CAT, OutputFormat::Plain),
            vec![
                DisplayElement::Heading("Important Information:".into()),
                DisplayElement::Numbered("1. It is a cat".into()),
                DisplayElement::Bullet("Domestic animal".into()),
                DisplayElement::Text("Cats are mammals.".into()),
            ]
        );
    }

    #[test]
    fn structured_elements_read_report_markers() {
        let formatted = format_output(CAT, None);
        let els = elements(&formatted.structured, OutputFormat::Structured);
        assert_eq!(els[0], DisplayElement::Heading("Important Information:".into()));
        assert!(els.contains(&DisplayElement::Bullet("Domestic animal".into())));
        assert!(els.contains(&DisplayElement::Text("Cats are mammals.".into())));
    }

    #[test]
    fn json_is_one_block() {
        let formatted = format_output(CAT, None);
        let els = elements(select(&formatted, OutputFormat::Json), OutputFormat::Json);
        assert_eq!(els.len(), 1);
        assert!(matches!(&els[0], DisplayElement::Code(c) if c.contains("important_information")));
    }

    #[test]
    fn render_without_color() {
        let meta = OutputMetadata::new(vec!["feline".into(), "tabby".into()], vec!["Is it young?".into()]);
        let text = render_terminal(&elements(CAT, OutputFormat::Plain), Some(&meta), false);
        assert!(text.starts_with("Important Information:\n  1. It is a cat\n    • Domestic animal\n"));
        assert!(text.contains("[feline] [tabby]"));
        assert!(text.contains("  1. Is it young?\n"));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn render_with_color_uses_ansi() {
        let text = render_terminal(&[DisplayElement::Heading("H".into())], None, true);
        assert_eq!(text, "\x1b[1;34mH\x1b[0m\n");
    }
}
