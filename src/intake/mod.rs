//! Submission intake: document text, LLM field extraction, agency matching.

pub mod extract;
pub mod matching;
pub mod parser;
pub mod prompt;

pub use extract::*;
pub use matching::*;
pub use parser::*;
pub use prompt::*;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::db::DatabaseError;
use crate::llm::{ChatMessage, ChatRequest, LlmClient, LlmError};

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Failed to extract text: {0}")]
    Extraction(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Malformed extraction response: {0}")]
    MalformedResponse(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Ask the model for the submission fields found in `text`.
///
/// Never fails: any error is logged and yields an empty map, so an upload
/// still returns its text preview and an empty field set.
pub fn extract_fields(llm: &dyn LlmClient, model: &str, text: &str) -> Map<String, Value> {
    if text.trim().is_empty() {
        return Map::new();
    }
    match try_extract_fields(llm, model, text) {
        Ok(fields) => fields,
        Err(e) => {
            tracing::warn!(error = %e, "AI extraction failed");
            Map::new()
        }
    }
}

fn try_extract_fields(
    llm: &dyn LlmClient,
    model: &str,
    text: &str,
) -> Result<Map<String, Value>, IntakeError> {
    let request = ChatRequest {
        model: model.to_string(),
        temperature: 0.0,
        messages: vec![
            ChatMessage::system(EXTRACTION_SYSTEM_PROMPT),
            ChatMessage::user(build_extraction_prompt(text)),
        ],
    };
    let started = std::time::Instant::now();
    let response = llm.complete(&request)?;
    let fields = parse_extraction_response(&response)?;
    tracing::info!(
        model,
        elapsed_ms = started.elapsed().as_millis() as u64,
        filled = fields.values().filter(|v| v.as_str().is_some_and(|s| !s.is_empty())).count(),
        "Extracted submission fields"
    );
    Ok(fields)
}
