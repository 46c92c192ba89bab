//! Prompts for image identification and follow-up questions.
//!
//! Every prompt string lives here so wording changes touch exactly one file,
//! and so tests can inspect the prompts without a live model.

use crate::config::DetailLevel;

/// Base instruction sent with the image.
pub const IDENTIFY_PROMPT: &str = "Identify this image and provide its name and important information including a brief explanation about that image.";

/// Detail suffix for the identification call.
pub fn identify_detail(level: DetailLevel) -> &'static str {
    match level {
        DetailLevel::Short => {
            "Provide a brief, concise analysis with only the most essential information. Keep the response short and to the point."
        }
        DetailLevel::Medium => {
            "Provide a balanced analysis with moderate detail. Include key information but keep it reasonably concise."
        }
        DetailLevel::Large => {
            "Provide a comprehensive, detailed analysis with extensive information. Be thorough and include as much relevant detail as possible."
        }
    }
}

/// Detail suffix for follow-up requests (keyword focus, related question).
pub fn follow_up_detail(level: DetailLevel) -> &'static str {
    match level {
        DetailLevel::Short => {
            "Provide a brief, concise response with only the most essential information."
        }
        DetailLevel::Medium => "Provide a balanced response with moderate detail.",
        DetailLevel::Large => {
            "Provide a comprehensive, detailed response with extensive information."
        }
    }
}

/// Full identification prompt: base instruction, detail suffix, then any
/// additional instruction.
pub fn identify_prompt(level: DetailLevel, additional: &str) -> String {
    format!("{} {} {}", IDENTIFY_PROMPT, identify_detail(level), additional)
        .trim_end()
        .to_string()
}

/// Additional instruction for regenerating the analysis around a keyword.
pub fn keyword_focus(keyword: &str, level: DetailLevel) -> String {
    format!(
        "Focus more on aspects related to \"{}\". {}",
        keyword,
        follow_up_detail(level)
    )
}

/// Additional instruction for answering one of the related questions.
pub fn answer_question(question: &str, level: DetailLevel) -> String {
    format!(
        "Answer the following question about the image: \"{}\" {}",
        question,
        follow_up_detail(level)
    )
}

/// Text-only prompt asking for follow-up questions about an analysis.
pub fn related_questions(analysis: &str, count: usize) -> String {
    format!(
        "Based on the following information about an image, generate {count} related questions that someone might ask to learn more about the subject:\n\n{analysis}\n\nFormat the output as a simple list of questions, one per line."
    )
}
