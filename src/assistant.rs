//! Underwriting research assistant on top of the chat LLM.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::{ChatMessage, ChatRequest, ChatRole, LlmClient, LlmError};

pub const CHAT_TEMPERATURE: f32 = 0.7;

const REPORT_SYSTEM_PROMPT: &str = "SYSTEM PROMPT FOR GPT-5.1 (UNDERWRITING REPORT ENGINE)
You are an Elite Insurance Underwriting Reconnaissance Analyst. Your job is to produce exceptionally detailed, accurate, location-specific underwriting intelligence with strong reasoning and verifiable detail. You NEVER hallucinate.

Use only credible public signals, reasonable inference, and visible data. If unknown, state \"cannot be confirmed.\"

Always output:

Google Maps (overhead): https://www.google.com/maps/place/[ADDRESS_ENCODED]

## 1. Basic Property Snapshot
- Exact address
- Property classification
- Estimated year built
- Building & lot SF (reasonable inference allowed)
- Visible site & structure details

## 2. Construction, Protection & Access
(Concrete, tilt-up, roof, hydrants, fire station distance, access paths, fire apparatus turning, etc.)

## 3. Occupancy & Tenants
Identify real tenants whenever possible (e.g., Fix Auto Poway). Include historic occupants if clearly identifiable.

## 4. Surrounding Area & Exposure Analysis
(Adjacent occupancies, wildfire interface, drainage, roadway risks, neighboring hazards.)

## 5. Permit & Update History
Include:
- CUP permits
- CEQA findings
- APCD permits (spray booth)
- Pressure vessel registrations
If none: state so.

## 6. Listings & Market Information
Active / off-market / archived listings with SF, lot, updates, and links.

## 7. Underwriting Positives & Red Flags
Specific to THIS property only.

## 8. Data Gaps & Uncertainties
List ONLY what cannot be verified.

Style:
- Clean underwriting tone
- Bullet points
- Conservative inference
- No generic boilerplate";

const CONTEXT_NOTE: &str = "\n\n(Context has been provided to you in the system message)";

#[derive(Debug, Clone, Deserialize)]
pub struct ChatInput {
    pub message: String,
    #[serde(default)]
    pub context: Option<Value>,
    #[serde(default)]
    pub history: Option<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatOutput {
    pub answer: String,
    pub used_context: Option<Value>,
    pub error: Option<String>,
}

impl ChatOutput {
    fn failed(error: String) -> Self {
        Self {
            answer: String::new(),
            used_context: None,
            error: Some(error),
        }
    }
}

/// Context counts only when it is a non-empty JSON object.
fn effective_context(context: Option<&Value>) -> Option<&serde_json::Map<String, Value>> {
    match context {
        Some(Value::Object(map)) if !map.is_empty() => Some(map),
        _ => None,
    }
}

pub fn build_system_prompt(context: Option<&Value>) -> String {
    let mut prompt = REPORT_SYSTEM_PROMPT.to_string();
    let Some(map) = effective_context(context) else {
        return prompt;
    };

    match map.get("propertyAddress").and_then(Value::as_str) {
        Some(address) if !address.is_empty() => {
            prompt.push_str(&format!(
                "\n\nProduce a full underwriting reconnaissance report for:\n\n{address}\n\n"
            ));
            prompt.push_str("Use the full report format provided in your system instructions.\n");
            prompt.push_str(
                "Focus only on location-specific exposures, visible characteristics, \
                 real listings, and real permit/update indicators.",
            );
        }
        _ => {
            let rendered = serde_json::to_string_pretty(map).unwrap_or_default();
            prompt.push_str(&format!("\n\nContext:\n{rendered}"));
        }
    }
    prompt
}

/// Forward well-formed history turns; anything else is skipped.
fn history_messages(history: Option<&[Value]>) -> Vec<ChatMessage> {
    history
        .unwrap_or_default()
        .iter()
        .filter_map(|turn| {
            let role = ChatRole::parse(turn.get("role")?.as_str()?)?;
            let content = turn.get("content")?.as_str()?;
            Some(ChatMessage {
                role,
                content: content.to_string(),
            })
        })
        .collect()
}

pub fn build_messages(input: &ChatInput) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(build_system_prompt(input.context.as_ref()))];
    messages.extend(history_messages(input.history.as_deref()));

    let mut user = input.message.clone();
    if effective_context(input.context.as_ref()).is_some() {
        user.push_str(CONTEXT_NOTE);
    }
    messages.push(ChatMessage::user(user));
    messages
}

/// Run one assistant turn. Failures are reported in `error`, never raised.
///
/// `llm` is `None` when no API key is configured.
pub fn chat(llm: Option<&dyn LlmClient>, model: &str, input: &ChatInput) -> ChatOutput {
    let Some(llm) = llm else {
        return ChatOutput::failed(format!("Configuration error: {}", LlmError::MissingApiKey));
    };

    let request = ChatRequest {
        model: model.to_string(),
        temperature: CHAT_TEMPERATURE,
        messages: build_messages(input),
    };

    match llm.complete(&request) {
        Ok(answer) => ChatOutput {
            answer: answer.trim().to_string(),
            used_context: input.context.clone(),
            error: None,
        },
        Err(LlmError::MissingApiKey) => {
            ChatOutput::failed(format!("Configuration error: {}", LlmError::MissingApiKey))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Assistant call failed");
            ChatOutput::failed(format!("AI service error: {e}"))
        }
    }
}
