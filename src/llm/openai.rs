use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{ChatMessage, ChatRequest, LlmClient, LlmError};

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
///
/// The HTTP client is built per call so that it lives and drops on the
/// blocking thread that makes the request.
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    timeout_secs: u64,
}

impl OpenAiClient {
    pub fn new(api_key: &str, base_url: &str, timeout_secs: u64) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn http_client(&self) -> Result<reqwest::blocking::Client, LlmError> {
        reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| LlmError::HttpClient(e.to_string()))
    }
}

/// Request body for /chat/completions
#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: &'a [ChatMessage],
}

/// Response body from /chat/completions
#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

impl LlmClient for OpenAiClient {
    fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }
        let url = format!("{}/chat/completions", self.base_url);
        let body = CompletionRequest {
            model: &request.model,
            temperature: request.temperature,
            messages: &request.messages,
        };

        tracing::debug!(model = %request.model, messages = request.messages.len(), "Chat completion request");

        let response = self
            .http_client()?
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout_secs)
                } else {
                    LlmError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = response
            .json()
            .map_err(|e| LlmError::ResponseParsing(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    fn request() -> ChatRequest {
        ChatRequest {
            model: "gpt-test".into(),
            temperature: 0.7,
            messages: vec![ChatMessage::system("be brief"), ChatMessage::user("hello")],
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sends_bearer_and_returns_first_choice() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({
                    "choices": [{"message": {"content": format!(
                        "{}|{}|{}",
                        auth,
                        body["model"].as_str().unwrap_or_default(),
                        body["messages"][1]["role"].as_str().unwrap_or_default()
                    )}}]
                }))
            }),
        );
        let base = spawn_stub(router).await;

        let client = OpenAiClient::new("sk-test", &base, 5);
        let answer = tokio::task::spawn_blocking(move || client.complete(&request()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(answer, "Bearer sk-test|gpt-test|user");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn non_success_status_is_api_error() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let base = spawn_stub(router).await;

        let client = OpenAiClient::new("sk-wrong", &base, 5);
        let err = tokio::task::spawn_blocking(move || client.complete(&request()))
            .await
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 401, ref body } if body == "bad key"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn empty_choices_is_error() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(json!({"choices": []})) }),
        );
        let base = spawn_stub(router).await;

        let client = OpenAiClient::new("sk-test", &base, 5);
        let err = tokio::task::spawn_blocking(move || client.complete(&request()))
            .await
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse));
    }

    #[test]
    fn blank_key_fails_before_network() {
        let client = OpenAiClient::new("  ", "http://127.0.0.1:9", 1);
        assert!(matches!(client.complete(&request()), Err(LlmError::MissingApiKey)));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = OpenAiClient::new("k", "https://api.example.com/v1/", 1);
        assert_eq!(client.base_url(), "https://api.example.com/v1");
    }
}
