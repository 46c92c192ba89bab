//! Export of a generated output as a text, JSON or PDF file.
//!
//! Rendering is pure ([`render_export`]); [`export_to_dir`] adds the file
//! name convention and an atomic write (temp file + rename).

use crate::config::{DetailLevel, OutputFormat};
use crate::error::VisionError;
use crate::formatter::{format_output, pretty_json, to_json};
use crate::layout::{lay_out, LaidOutDocument, ReportDocument};
use crate::output::{GeneratedOutput, OutputMetadata};
use crate::pdf::write_pdf;
use crate::screen::dialect_for;
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Title of exported reports.
pub const REPORT_TITLE: &str = "Image Analysis Report";

/// File type of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Text,
    Json,
    Pdf,
}

impl ExportKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportKind::Text => "txt",
            ExportKind::Json => "json",
            ExportKind::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportKind {
    type Err = VisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "txt" | "text" => Ok(ExportKind::Text),
            "json" => Ok(ExportKind::Json),
            "pdf" => Ok(ExportKind::Pdf),
            other => Err(VisionError::InvalidConfig(format!(
                "unknown export type '{other}' (expected txt, json or pdf)"
            ))),
        }
    }
}

/// How an export is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Presentation used for the PDF body.
    pub format: OutputFormat,
    /// Mention the output's detail level in the file name and contents.
    pub include_detail_level: bool,
    pub title: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Plain,
            include_detail_level: true,
            title: REPORT_TITLE.to_string(),
        }
    }
}

impl ExportOptions {
    fn detail(&self, output: &GeneratedOutput) -> Option<DetailLevel> {
        self.include_detail_level.then_some(output.detail_level)
    }
}

/// `visionai-output-<id>[-<detail>].<ext>`
pub fn export_file_name(id: u64, detail: Option<DetailLevel>, kind: ExportKind) -> String {
    match detail {
        Some(level) => format!("visionai-output-{id}-{level}.{}", kind.extension()),
        None => format!("visionai-output-{id}.{}", kind.extension()),
    }
}

/// Plain-text export: the raw content, optionally under a detail-level line.
pub fn render_text(content: &str, detail: Option<DetailLevel>) -> String {
    match detail {
        Some(level) => format!("Detail Level: {level}\n\n{content}"),
        None => content.to_string(),
    }
}

/// JSON export: the [`to_json`] tree, with a leading `detailLevel` field when
/// a level is given. Trees that are not objects are wrapped as
/// `{"detailLevel": .., "content": ..}`.
pub fn render_json(content: &str, metadata: Option<&OutputMetadata>, detail: Option<DetailLevel>) -> String {
    let tree = to_json(content, metadata);
    let Some(level) = detail else {
        return pretty_json(&tree);
    };

    let mut wrapped = Map::new();
    wrapped.insert("detailLevel".into(), Value::String(level.as_str().into()));
    match tree {
        Value::Object(fields) => {
            for (k, v) in fields {
                if k != "detailLevel" {
                    wrapped.insert(k, v);
                }
            }
        }
        other => {
            wrapped.insert("content".into(), other);
        }
    }
    pretty_json(&Value::Object(wrapped))
}

/// Build the document the PDF export lays out.
pub fn report_document(output: &GeneratedOutput, options: &ExportOptions) -> ReportDocument {
    let metadata = Some(&output.metadata).filter(|m| !m.is_empty());
    let formatted = format_output(&output.content, metadata);
    let body = match options.format {
        OutputFormat::Plain => formatted.plain,
        OutputFormat::Json => formatted.json,
        OutputFormat::Structured => formatted.structured,
    };
    ReportDocument {
        title: options.title.clone(),
        detail_level: options.detail(output),
        generated_on: output.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        body,
        dialect: dialect_for(options.format),
        metadata: metadata.cloned(),
    }
}

/// Lay out the PDF export without encoding it.
pub fn lay_out_export(output: &GeneratedOutput, options: &ExportOptions) -> LaidOutDocument {
    lay_out(&report_document(output, options))
}

/// Render `output` as the bytes of a `kind` file.
pub fn render_export(
    output: &GeneratedOutput,
    kind: ExportKind,
    options: &ExportOptions,
) -> Result<Vec<u8>, VisionError> {
    let detail = options.detail(output);
    match kind {
        ExportKind::Text => Ok(render_text(&output.content, detail).into_bytes()),
        ExportKind::Json => {
            let metadata = Some(&output.metadata).filter(|m| !m.is_empty());
            Ok(render_json(&output.content, metadata, detail).into_bytes())
        }
        ExportKind::Pdf => write_pdf(&lay_out_export(output, options)),
    }
}

/// Write `output` into `dir` under its conventional file name.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn export_to_dir(
    output: &GeneratedOutput,
    kind: ExportKind,
    dir: impl AsRef<Path>,
    options: &ExportOptions,
) -> Result<PathBuf, VisionError> {
    let bytes = render_export(output, kind, options)?;
    let dir = dir.as_ref();
    let path = dir.join(export_file_name(output.id, options.detail(output), kind));

    let write_failed = |source: std::io::Error| VisionError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    tokio::fs::create_dir_all(dir).await.map_err(write_failed)?;

    let tmp_path = path.with_extension(format!("{}.tmp", kind.extension()));
    tokio::fs::write(&tmp_path, &bytes).await.map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, &path).await.map_err(write_failed)?;

    info!("Exported {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputKind;
    use chrono::Local;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> GeneratedOutput {
        GeneratedOutput {
            id: 1700000000000,
            kind: OutputKind::Analysis,
            content: "Important Information:\n1. It is a cat".into(),
            timestamp: Local::now(),
            format: OutputFormat::Plain,
            detail_level: DetailLevel::Large,
            metadata: OutputMetadata::new(vec!["feline".into()], vec!["Is it a kitten?".into()]),
        }
    }

    #[test]
    fn file_names() {
        assert_eq!(
            export_file_name(42, Some(DetailLevel::Short), ExportKind::Pdf),
            "visionai-output-42-short.pdf"
        );
        assert_eq!(export_file_name(42, None, ExportKind::Text), "visionai-output-42.txt");
    }

    #[test]
    fn text_export() {
        assert_eq!(render_text("A cat.", Some(DetailLevel::Medium)), "Detail Level: medium\n\nA cat.");
        assert_eq!(render_text("A cat.", None), "A cat.");
    }

    #[test]
    fn json_export_leads_with_detail_level() {
        let out = render_json("A cat.", None, Some(DetailLevel::Short));
        assert!(out.starts_with("{\n  \"detailLevel\": \"short\",\n  \"analysis\": []"));
        let v: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["main"], json!(["A cat."]));
    }

    #[test]
    fn json_export_wraps_non_objects() {
        let out = render_json("[1, 2]", None, Some(DetailLevel::Large));
        let v: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v, json!({"detailLevel": "large", "content": [1, 2]}));
    }

    #[test]
    fn export_kind_parsing() {
        assert_eq!("TXT".parse::<ExportKind>().unwrap(), ExportKind::Text);
        assert_eq!("pdf".parse::<ExportKind>().unwrap(), ExportKind::Pdf);
        assert!("docx".parse::<ExportKind>().is_err());
    }

    #[test]
    fn pdf_document_uses_selected_presentation() {
        let options = ExportOptions {
            format: OutputFormat::Structured,
            ..Default::default()
        };
        let doc = report_document(&sample(), &options);
        assert!(doc.body.starts_with("## Important Information:"));
        assert_eq!(doc.detail_level, Some(DetailLevel::Large));
        assert_eq!(doc.metadata.as_ref().unwrap().keywords, vec!["feline"]);
    }

    #[tokio::test]
    async fn export_writes_atomically_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = sample();
        let path = export_to_dir(&out, ExportKind::Text, dir.path(), &ExportOptions::default())
            .await
            .unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "visionai-output-1700000000000-large.txt"
        );
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("Detail Level: large\n\n"));
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|x| x == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
