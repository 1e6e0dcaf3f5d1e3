use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Single-turn completion of one user message
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible `/chat/completions` client. Not retried: a failed
/// completion is reported to the caller as-is.
pub struct ChatClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatClient {
    pub fn new(client: Client, base_url: &str, api_key: String, model: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl CompletionClient for ChatClient {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
        };

        info!(
            "Sending completion request (model: {}, prompt length: {} chars, temperature: {})",
            self.model,
            prompt.chars().count(),
            temperature
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Completion(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PipelineError::Completion(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(PipelineError::Completion(format!("status {}: {}", status, body)));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| PipelineError::Completion(format!("unparseable response: {}", e)))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::Completion("response had no choices".to_string()))?;

        info!(
            "Completion finished (finish_reason: {})",
            choice.finish_reason.as_deref().unwrap_or("unknown")
        );

        choice
            .message
            .content
            .ok_or_else(|| PipelineError::Completion("response had no content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ChatClient {
        ChatClient::new(
            Client::new(),
            &format!("{}/v1/", server.uri()),
            "sk-test".to_string(),
            "deepseek-chat".to_string(),
        )
    }

    #[tokio::test]
    async fn sends_single_user_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "deepseek-chat",
                "messages": [{ "role": "user", "content": "Who wins?" }],
                "temperature": 0.5
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": "1. Kipyegon 3:49.50" },
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server).complete("Who wins?", 0.5).await.unwrap();
        assert_eq!(text, "1. Kipyegon 3:49.50");
    }

    #[tokio::test]
    async fn upstream_error_detail_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "error": { "message": "Insufficient Balance" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).complete("Who wins?", 0.7).await.unwrap_err();
        match err {
            PipelineError::Completion(detail) => assert!(detail.contains("Insufficient Balance")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
