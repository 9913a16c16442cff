use std::sync::Mutex;

use super::{ChatRequest, LlmClient, LlmError};

/// Test double: returns a canned reply (or error) and keeps every request.
pub struct MockLlmClient {
    reply: Result<String, String>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockLlmClient {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with an HTTP client error carrying `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests().pop()
    }
}

impl LlmClient for MockLlmClient {
    fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(request.clone());
        }
        self.reply.clone().map_err(LlmError::HttpClient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatMessage;

    fn request() -> ChatRequest {
        ChatRequest {
            model: "test-model".into(),
            temperature: 0.0,
            messages: vec![ChatMessage::user("ping")],
        }
    }

    #[test]
    fn records_requests() {
        let mock = MockLlmClient::new("pong");
        assert_eq!(mock.complete(&request()).unwrap(), "pong");
        assert_eq!(mock.requests().len(), 1);
        assert_eq!(mock.last_request().unwrap().model, "test-model");
    }

    #[test]
    fn failing_mock_errors() {
        let mock = MockLlmClient::failing("boom");
        assert!(matches!(mock.complete(&request()), Err(LlmError::HttpClient(m)) if m == "boom"));
    }
}
