//! Related-question generation: a text-only follow-up call that embeds the
//! analysis it asks about.

use super::llm::{ModelRequest, VisionModel};
use super::postprocess::clean_response;
use crate::error::ModelError;
use crate::prompts;
use tracing::debug;

/// Split a model answer into at most `count` questions, one per non-blank
/// line, trimmed.
pub fn parse_questions(answer: &str, count: usize) -> Vec<String> {
    answer
        .trim()
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(count)
        .map(str::to_string)
        .collect()
}

/// Ask `model` for `count` questions about `analysis`.
pub async fn generate_questions(
    model: &dyn VisionModel,
    analysis: &str,
    count: usize,
) -> Result<Vec<String>, ModelError> {
    let request = ModelRequest::text(prompts::related_questions(analysis, count));
    let response = model.generate(&request).await?;
    let questions = parse_questions(&clean_response(&response.text), count);
    debug!("{} related questions", questions.len());
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::llm::ModelResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[test]
    fn parse_drops_blanks_and_limits() {
        let answer = "\n  What breed is it?\n\nHow old is it?  \nIs it friendly?\nWhat does it eat?\nWhere does it live?\nWhy is it grey?\n";
        let q = parse_questions(answer, 5);
        assert_eq!(q.len(), 5);
        assert_eq!(q[0], "What breed is it?");
        assert_eq!(q[1], "How old is it?");
        assert_eq!(q[4], "Where does it live?");
    }

    struct Recorder {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl VisionModel for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
            assert!(request.image.is_none());
            self.prompts.lock().unwrap().push(request.prompt.clone());
            Ok(ModelResponse::new("1. **Is it a kitten?**\n2. Does it purr?"))
        }
    }

    #[tokio::test]
    async fn generate_embeds_analysis_and_cleans_answer() {
        let model = Recorder {
            prompts: Mutex::new(Vec::new()),
        };
        let q = generate_questions(&model, "A grey cat.", 5).await.unwrap();
        assert_eq!(q, vec!["1. Is it a kitten?", "2. Does it purr?"]);
        assert!(model.prompts.lock().unwrap()[0].contains("A grey cat."));
    }
}
