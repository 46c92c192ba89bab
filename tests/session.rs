//! Session behaviour against a scripted model.
//!
//! The model is injected through `AnalysisConfig::client`, so these tests
//! make no network calls and always run.

use async_trait::async_trait;
use lopdf::content::Content;
use lopdf::{Document, Object};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use visionai::{
    render_export, AnalysisConfig, AnalysisFailure, AnalysisOutcome, AnalysisProgressCallback,
    DetailLevel, ExportKind, ExportOptions, ModelError, ModelRequest, ModelResponse, ModelStage,
    OutputFormat, OutputKind, Session, VisionError, VisionModel,
};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Replays canned answers in order and records every request.
#[derive(Default)]
struct ScriptedModel {
    answers: Mutex<VecDeque<Result<String, ModelError>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    fn new(answers: Vec<Result<&str, ModelError>>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.into_iter().map(|a| a.map(str::to_string)).collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn push(&self, answer: Result<&str, ModelError>) {
        self.answers.lock().unwrap().push_back(answer.map(str::to_string));
    }

    fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        self.requests.lock().unwrap().push(request.clone());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ModelError::Unrecognised))
            .map(ModelResponse::new)
    }
}

fn tiny_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 120, 40]));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn session_with(model: Arc<ScriptedModel>) -> Session {
    let config = AnalysisConfig::builder()
        .client(model as Arc<dyn VisionModel>)
        .detail_level(DetailLevel::Large)
        .build()
        .unwrap();
    let mut session = Session::new(config).unwrap();
    session.load_image_bytes("cat.png", tiny_png()).unwrap();
    session
}

const ANALYSIS: &str = "Important Information:\n1. It is a tabby kitten\n-Domestic animal\nOther Information:\nKittens sleep a lot.";
const QUESTIONS: &str = "How old is the kitten?\nWhat breed is it?\nIs it friendly?";

/// Tj strings per page of a PDF.
fn pdf_strings(bytes: &[u8]) -> Vec<Vec<String>> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|id| {
            let content = Content::decode(&doc.get_page_content(*id).unwrap()).unwrap();
            content
                .operations
                .iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| match op.operands.first() {
                    Some(Object::String(b, _)) => Some(String::from_utf8_lossy(b).into_owned()),
                    _ => None,
                })
                .collect()
        })
        .collect()
}

// ── Actions ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_identify_appends_output() {
    let model = ScriptedModel::new(vec![Ok(ANALYSIS), Ok(QUESTIONS)]);
    let mut session = session_with(Arc::clone(&model));

    let outcome = session.identify().await.unwrap();
    let out = outcome.output().expect("identify must complete").clone();

    assert_eq!(out.kind, OutputKind::Analysis);
    assert_eq!(out.detail_level, DetailLevel::Large);
    assert_eq!(out.content, ANALYSIS);
    assert_eq!(session.result(), Some(ANALYSIS));
    assert_eq!(
        session.keywords(),
        &["Important", "Information:", "tabby", "kitten", "-Domestic", "animal", "Other", "Kittens"]
    );
    assert_eq!(session.questions().len(), 3);
    assert_eq!(out.metadata.questions, session.questions());
    assert_eq!(session.outputs().len(), 1);

    let requests = model.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].image.is_some(), "identify must carry the image");
    assert!(requests[1].image.is_none(), "questions call is text-only");
    assert!(requests[1].prompt.contains("It is a tabby kitten"));
}

#[tokio::test]
async fn test_model_markdown_is_cleaned() {
    let model = ScriptedModel::new(vec![
        Ok("```\n**Important Information:**\n\n* It is a cat\n```"),
        Ok(""),
    ]);
    let mut session = session_with(model);
    let out = session.identify().await.unwrap();
    assert_eq!(out.display_text(), "Important Information:\n-It is a cat");
}

#[tokio::test]
async fn test_focus_and_question_kinds() {
    let model = ScriptedModel::new(vec![
        Ok(ANALYSIS),
        Ok(QUESTIONS),
        Ok("It is about ten weeks old."),
        Ok(QUESTIONS),
    ]);
    let mut session = session_with(Arc::clone(&model));

    let focus = session.regenerate_for_keyword("whiskers").await.unwrap();
    assert_eq!(focus.output().unwrap().kind, OutputKind::KeywordFocus);

    let answer = session.ask_related_question("How old is the kitten?").await.unwrap();
    assert_eq!(answer.output().unwrap().kind, OutputKind::QuestionAnswer);
    assert_eq!(session.result(), Some("It is about ten weeks old."));

    let requests = model.requests();
    assert!(requests[0].prompt.contains("whiskers"));
    assert!(requests[2].prompt.contains("How old is the kitten?"));
    assert_eq!(session.outputs().len(), 2);
}

// ── Failures ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_overloaded_failure_keeps_log_and_metadata() {
    let model = ScriptedModel::new(vec![Ok(ANALYSIS), Ok(QUESTIONS)]);
    let mut session = session_with(Arc::clone(&model));
    session.identify().await.unwrap();
    let keywords = session.keywords().to_vec();

    model.push(Err(ModelError::from_message(
        "got 503 Service Unavailable: the model is OVERLOADED",
    )));
    let outcome = session.identify().await.unwrap();

    assert_eq!(outcome, AnalysisOutcome::Failed(AnalysisFailure::Overloaded));
    assert_eq!(
        session.result(),
        Some("The AI model is currently overloaded. Please try again in a few minutes.")
    );
    assert_eq!(session.outputs().len(), 1, "a failure appends nothing");
    assert_eq!(session.keywords(), keywords.as_slice());
}

#[tokio::test]
async fn test_other_failures_are_classified() {
    let model = ScriptedModel::new(vec![Err(ModelError::from_message("quota exceeded"))]);
    let mut session = session_with(Arc::clone(&model));
    let outcome = session.identify().await.unwrap();
    assert_eq!(outcome.display_text(), "Error identifying image: quota exceeded");

    model.push(Err(ModelError::Unrecognised));
    let outcome = session.identify().await.unwrap();
    assert_eq!(outcome, AnalysisOutcome::Failed(AnalysisFailure::Unknown));
    assert!(session.outputs().is_empty());
}

#[tokio::test]
async fn test_questions_failure_is_swallowed() {
    let model = ScriptedModel::new(vec![
        Ok(ANALYSIS),
        Err(ModelError::from_message("503 overloaded")),
    ]);
    let mut session = session_with(model);

    let outcome = session.identify().await.unwrap();
    let out = outcome.output().expect("analysis still completes");
    assert!(out.metadata.questions.is_empty());
    assert!(session.questions().is_empty());
    assert!(!session.keywords().is_empty());
    assert_eq!(session.result(), Some(ANALYSIS));
}

#[tokio::test]
async fn test_no_image_loaded() {
    let model = ScriptedModel::new(vec![]);
    let config = AnalysisConfig::builder()
        .client(Arc::clone(&model) as Arc<dyn VisionModel>)
        .build()
        .unwrap();
    let mut session = Session::new(config).unwrap();

    let err = session.identify().await.unwrap_err();
    assert!(matches!(err, VisionError::NoImageLoaded));
    assert!(model.requests().is_empty());
}

#[test]
fn test_rejects_non_image_bytes() {
    let model = ScriptedModel::new(vec![]);
    let mut session = session_with(model);
    let err = session
        .load_image_bytes("notes.txt", b"hello world".to_vec())
        .unwrap_err();
    assert!(matches!(err, VisionError::NotAnImage { .. }));
    assert_eq!(session.image_name(), Some("cat.png"), "previous image stays loaded");
}

#[tokio::test]
async fn test_loading_resets_derived_state() {
    let model = ScriptedModel::new(vec![Ok(ANALYSIS), Ok(QUESTIONS)]);
    let mut session = session_with(model);
    session.identify().await.unwrap();

    session.load_image_bytes("dog.png", tiny_png()).unwrap();
    assert_eq!(session.image_name(), Some("dog.png"));
    assert_eq!(session.result(), None);
    assert!(session.keywords().is_empty());
    assert!(session.questions().is_empty());
    assert_eq!(session.outputs().len(), 1, "the output log survives a reload");
}

#[tokio::test]
async fn test_output_ids_strictly_increase() {
    let answers = (0..4).flat_map(|_| [Ok(ANALYSIS), Ok(QUESTIONS)]).collect();
    let mut session = session_with(ScriptedModel::new(answers));
    for _ in 0..4 {
        session.identify().await.unwrap();
    }
    let ids: Vec<u64> = session.outputs().iter().map(|o| o.id).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]), "ids: {ids:?}");
}

#[test]
fn test_progress_events_in_order() {
    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl AnalysisProgressCallback for Recorder {
        fn on_analysis_start(&self, source: &str) {
            self.events.lock().unwrap().push(format!("start {source}"));
        }
        fn on_model_call_start(&self, stage: ModelStage) {
            self.events.lock().unwrap().push(format!("call {stage}"));
        }
        fn on_model_call_error(&self, stage: ModelStage, _error: &str) {
            self.events.lock().unwrap().push(format!("error {stage}"));
        }
        fn on_analysis_complete(&self, success: bool) {
            self.events.lock().unwrap().push(format!("done {success}"));
        }
    }

    let recorder = Arc::new(Recorder::default());
    let model = ScriptedModel::new(vec![Ok(ANALYSIS), Err(ModelError::Unrecognised)]);
    let config = AnalysisConfig::builder()
        .client(model as Arc<dyn VisionModel>)
        .progress_callback(Arc::clone(&recorder) as Arc<dyn AnalysisProgressCallback>)
        .build()
        .unwrap();
    let mut session = Session::new(config).unwrap();
    session.load_image_bytes("cat.png", tiny_png()).unwrap();

    tokio_test::block_on(session.identify()).unwrap();

    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec![
            "start cat.png",
            "call identify",
            "call related questions",
            "error related questions",
            "done true",
        ]
    );
}

// ── Exports ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_long_analysis_paginates_with_footers() {
    let long = (1..=150)
        .map(|i| format!("{i}. Observation number {i} about the fur pattern"))
        .collect::<Vec<_>>()
        .join("\n");
    let model = ScriptedModel::new(vec![Ok(long.as_str()), Ok(QUESTIONS)]);
    let mut session = session_with(model);
    let outcome = session.identify().await.unwrap();
    let out = outcome.output().unwrap();

    let bytes = render_export(out, ExportKind::Pdf, &ExportOptions::default()).unwrap();
    let pages = pdf_strings(&bytes);
    let n = pages.len();
    assert!(n > 1, "expected several pages, got {n}");
    for (i, strings) in pages.iter().enumerate() {
        let footers: Vec<&String> = strings.iter().filter(|s| s.starts_with("Page ")).collect();
        assert_eq!(footers, vec![&format!("Page {} of {}", i + 1, n)]);
    }
}

#[tokio::test]
async fn test_json_and_pdf_exports_agree_on_metadata() {
    let model = ScriptedModel::new(vec![Ok(ANALYSIS), Ok(QUESTIONS)]);
    let mut session = session_with(model);
    let outcome = session.identify().await.unwrap();
    let out = outcome.output().unwrap();

    for format in [OutputFormat::Plain, OutputFormat::Json, OutputFormat::Structured] {
        let options = ExportOptions {
            format,
            ..Default::default()
        };

        let json_bytes = render_export(out, ExportKind::Json, &options).unwrap();
        let tree: Value = serde_json::from_slice(&json_bytes).unwrap();
        assert_eq!(tree["detailLevel"], json!("large"));
        let keywords: Vec<String> = serde_json::from_value(tree["metadata"]["keywords"].clone()).unwrap();
        let questions: Vec<String> = serde_json::from_value(tree["metadata"]["questions"].clone()).unwrap();
        assert_eq!(keywords, out.metadata.keywords);
        assert_eq!(questions, out.metadata.questions);

        let pdf_bytes = render_export(out, ExportKind::Pdf, &options).unwrap();
        let shown: Vec<String> = pdf_strings(&pdf_bytes).into_iter().flatten().collect();
        let kw_at = shown.iter().position(|s| s == "Related Keywords:").unwrap();
        let q_at = shown.iter().position(|s| s == "Related Questions:").unwrap();
        // Wrapping only breaks at spaces, so the wrapped lines rejoin exactly.
        assert_eq!(shown[kw_at + 1..q_at].join(" "), keywords.join(", "), "{format}");
        for (i, q) in questions.iter().enumerate() {
            assert!(shown.contains(&format!("{}. {}", i + 1, q)), "{format}: missing {q}");
        }
    }
}

#[tokio::test]
async fn test_export_to_dir_writes_every_kind() {
    let model = ScriptedModel::new(vec![Ok(ANALYSIS), Ok(QUESTIONS)]);
    let mut session = session_with(model);
    let outcome = session.identify().await.unwrap();
    let out = outcome.output().unwrap();
    let dir = tempfile::tempdir().unwrap();

    let options = ExportOptions {
        include_detail_level: false,
        ..Default::default()
    };
    for kind in [ExportKind::Text, ExportKind::Json, ExportKind::Pdf] {
        let path = visionai::export_to_dir(out, kind, dir.path(), &options)
            .await
            .unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            format!("visionai-output-{}.{}", out.id, kind.extension())
        );
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    let text = std::fs::read_to_string(dir.path().join(format!("visionai-output-{}.txt", out.id))).unwrap();
    assert_eq!(text, ANALYSIS);
}
