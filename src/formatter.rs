//! Converts one analysis text into its three presentations.
//!
//! * plain: the text itself
//! * json: a section tree built by [`to_json`]
//! * structured: a Markdown-like report built by [`to_structured_report`]
//!
//! Both converters are folds over the lines of the input, classified with the
//! plain [`Dialect`]. Neither can fail: text without any markers degrades to
//! paragraphs under the default section.

use crate::grammar::{self, Dialect, Line, LineKind};
use crate::output::OutputMetadata;
use serde_json::{Map, Value};

/// Section that collects items before the first header.
pub const DEFAULT_SECTION: &str = "main";

/// Title prepended to a report that does not open with its own header.
pub const REPORT_TITLE: &str = "## Image Analysis Report";

/// Header opened by a paragraph that appears before any section.
pub const SUMMARY_HEADER: &str = "## Analysis Summary";

/// The three presentations of one text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedOutput {
    pub plain: String,
    /// The [`to_json`] tree, pretty-printed with two-space indentation.
    pub json: String,
    pub structured: String,
}

/// Format `content` every way at once.
pub fn format_output(content: &str, metadata: Option<&OutputMetadata>) -> FormattedOutput {
    FormattedOutput {
        plain: content.to_string(),
        json: pretty_json(&to_json(content, metadata)),
        structured: to_structured_report(content),
    }
}

/// Pretty-print a JSON value with two-space indentation.
pub fn pretty_json(value: &Value) -> String {
    format!("{:#}", value)
}

// ── JSON tree ────────────────────────────────────────────────────────────

/// Ordered section buckets threaded through the JSON fold.
#[derive(Debug, Clone)]
struct Sections {
    current: usize,
    buckets: Vec<(String, Vec<String>)>,
}

impl Default for Sections {
    fn default() -> Self {
        Self {
            current: 0,
            buckets: vec![(DEFAULT_SECTION.to_string(), Vec::new())],
        }
    }
}

impl Sections {
    fn step(mut self, line: Line<'_>) -> Self {
        match line.kind {
            LineKind::Blank => {}
            LineKind::Header => self.open(grammar::section_key(line.raw)),
            LineKind::Numbered | LineKind::Bulleted | LineKind::Paragraph => {
                self.buckets[self.current].1.push(line.text().to_string());
            }
        }
        self
    }

    /// Make `key` current. A header seen twice keeps appending to its
    /// first bucket so no earlier item is lost.
    fn open(&mut self, key: String) {
        match self.buckets.iter().position(|(k, _)| *k == key) {
            Some(i) => self.current = i,
            None => {
                self.buckets.push((key, Vec::new()));
                self.current = self.buckets.len() - 1;
            }
        }
    }
}

/// Convert `content` into a JSON tree.
///
/// Content that already parses as JSON is returned as parsed, and
/// `metadata` is ignored. Anything else becomes an object whose keys are,
/// in order: `analysis` (always an empty array), `metadata` (when given),
/// `main`, then one key per distinct section header.
///
/// ```
/// use visionai::formatter::to_json;
///
/// let tree = to_json("Important Information:\n1. It is a cat", None);
/// assert_eq!(tree["important_information"][0], "It is a cat");
/// assert_eq!(tree["analysis"], serde_json::json!([]));
/// ```
pub fn to_json(content: &str, metadata: Option<&OutputMetadata>) -> Value {
    if let Ok(parsed) = serde_json::from_str::<Value>(content) {
        return parsed;
    }

    let sections = grammar::lines(content, Dialect::Plain).fold(Sections::default(), Sections::step);

    let mut tree = Map::new();
    tree.insert("analysis".into(), Value::Array(Vec::new()));
    if let Some(meta) = metadata {
        tree.insert("metadata".into(), metadata_value(meta));
    }
    for (key, items) in sections.buckets {
        tree.insert(key, Value::Array(items.into_iter().map(Value::String).collect()));
    }
    Value::Object(tree)
}

fn metadata_value(meta: &OutputMetadata) -> Value {
    let strings = |v: &[String]| Value::Array(v.iter().cloned().map(Value::String).collect());
    let mut m = Map::new();
    m.insert("keywords".into(), strings(&meta.keywords));
    m.insert("questions".into(), strings(&meta.questions));
    Value::Object(m)
}

// ── Structured report ────────────────────────────────────────────────────

/// State threaded through the report fold.
#[derive(Debug, Default)]
struct Report {
    out: String,
    in_section: bool,
    /// The first emitted line was an input header, so no title is needed.
    opened_by_header: bool,
}

impl Report {
    fn step(mut self, line: Line<'_>) -> Self {
        match line.kind {
            LineKind::Blank => {}
            LineKind::Header => {
                if self.out.is_empty() {
                    self.opened_by_header = true;
                }
                if self.in_section {
                    self.out.push('\n');
                }
                self.out.push_str(grammar::REPORT_HEADER_PREFIX);
                self.out.push_str(line.raw.trim_end());
                self.out.push('\n');
                self.in_section = true;
            }
            LineKind::Numbered => {
                self.out.push('\n');
                self.out.push_str(line.raw.trim_end());
            }
            LineKind::Bulleted => {
                self.out.push('\n');
                self.out.push_str(grammar::REPORT_BULLET_PREFIX);
                self.out.push(' ');
                self.out.push_str(line.text());
            }
            LineKind::Paragraph => {
                if self.in_section {
                    self.out.push('\n');
                    self.out.push_str(line.text());
                } else {
                    self.out.push_str(SUMMARY_HEADER);
                    self.out.push_str("\n\n");
                    self.out.push_str(line.text());
                    self.out.push('\n');
                    self.in_section = true;
                }
            }
        }
        self
    }

    fn finish(self) -> String {
        if self.opened_by_header {
            self.out
        } else {
            format!("{REPORT_TITLE}\n\n{}", self.out)
        }
    }
}

/// Convert `content` into a Markdown-like report.
///
/// Headers become `## ` lines, bullets become `   • ` lines, numbered items
/// are kept as they are, and a paragraph before any header opens an
/// `## Analysis Summary` section. Unless the text opens with its own
/// header, `## Image Analysis Report` is prepended.
///
/// ```
/// use visionai::formatter::to_structured_report;
///
/// assert_eq!(
///     to_structured_report("Just a paragraph with no markers."),
///     "## Image Analysis Report\n\n## Analysis Summary\n\nJust a paragraph with no markers.\n"
/// );
/// ```
pub fn to_structured_report(content: &str) -> String {
    grammar::lines(content, Dialect::Plain)
        .fold(Report::default(), Report::step)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const CAT: &str =
        "Important Information:\n1. It is a cat\n-Domestic animal\nOther Information:\nCats are mammals.";

    #[test]
    fn json_sections_from_markers() {
        let tree = to_json(CAT, None);
        assert_eq!(
            tree,
            json!({
                "analysis": [],
                "main": [],
                "important_information": ["It is a cat", "Domestic animal"],
                "other_information": ["Cats are mammals."],
            })
        );
    }

    #[test]
    fn json_key_order() {
        let meta = OutputMetadata::new(vec!["kitten".into()], vec!["Why?".into()]);
        let tree = to_json(CAT, Some(&meta));
        let keys: Vec<&str> = tree.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["analysis", "metadata", "main", "important_information", "other_information"]
        );
        assert_eq!(tree["metadata"]["keywords"], json!(["kitten"]));
    }

    #[test]
    fn json_passthrough_ignores_metadata() {
        let meta = OutputMetadata::new(vec!["x".into()], vec![]);
        assert_eq!(to_json(r#"{"a": [1, 2]}"#, Some(&meta)), json!({"a": [1, 2]}));
        assert_eq!(to_json("42", None), json!(42));
    }

    #[test]
    fn json_unmarked_text_lands_in_main() {
        let tree = to_json("first line\n\n   second line  ", None);
        assert_eq!(tree["main"], json!(["first line", "second line"]));
    }

    #[test]
    fn json_repeated_header_keeps_earlier_items() {
        let tree = to_json(
            "Important Information:\n1. a\nOther Information:\nb\nImportant Information:\n2. c",
            None,
        );
        assert_eq!(tree["important_information"], json!(["a", "c"]));
        assert_eq!(tree["other_information"], json!(["b"]));
    }

    #[test]
    fn report_from_markers() {
        assert_eq!(
            to_structured_report(CAT),
            "## Important Information:\n\n1. It is a cat\n   • Domestic animal\n## Other Information:\n\nCats are mammals."
        );
    }

    #[test]
    fn report_synthesises_summary_and_title() {
        assert_eq!(
            to_structured_report("Just a paragraph with no markers."),
            "## Image Analysis Report\n\n## Analysis Summary\n\nJust a paragraph with no markers.\n"
        );
    }

    #[test]
    fn report_of_empty_text_is_title_only() {
        assert_eq!(to_structured_report(""), "## Image Analysis Report\n\n");
        assert_eq!(to_structured_report("\n  \n"), "## Image Analysis Report\n\n");
    }

    #[test]
    fn report_numbered_before_any_section_gets_title() {
        let r = to_structured_report("1. first\n2. second");
        assert_eq!(r, "## Image Analysis Report\n\n\n1. first\n2. second");
    }

    #[test]
    fn format_output_is_pure() {
        let meta = OutputMetadata::new(vec!["feline".into()], vec!["Is it a kitten?".into()]);
        let a = format_output(CAT, Some(&meta));
        let b = format_output(CAT, Some(&meta));
        assert_eq!(a, b);
        assert_eq!(a.plain, CAT);
        assert!(a.json.starts_with("{\n  \"analysis\": []"));
    }
}
