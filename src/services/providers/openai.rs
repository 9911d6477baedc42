/// OpenAI chat-completions provider
///
/// Sends one system message and one user message, returns the first choice's
/// text content. Works with any OpenAI-compatible base URL.
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::services::providers::{
    check_status, CompletionProvider, CompletionRequest, ProviderError,
};

#[derive(Clone)]
pub struct OpenAiCompletion {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl OpenAiCompletion {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            model,
        }
    }

    fn chat_request(&self, request: CompletionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system,
                },
                ChatMessage {
                    role: "user",
                    content: request.prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
            frequency_penalty: request.frequency_penalty,
        }
    }

    /// First choice's text, rejecting missing or blank content
    fn response_text(response: ChatCompletionResponse) -> Result<String, ProviderError> {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(ProviderError::EmptyCompletion)
    }
}

#[async_trait::async_trait]
impl CompletionProvider for OpenAiCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.api_url.trim_end_matches('/'));
        let body = self.chat_request(request);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let response = check_status(response).await?;
        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(format!("Failed to parse completion: {}", e)))?;

        if let Some(reason) = parsed
            .choices
            .first()
            .and_then(|choice| choice.finish_reason.as_deref())
        {
            if reason == "length" {
                tracing::warn!(
                    max_tokens = body.max_tokens,
                    "Completion stopped at max_tokens; output may be truncated"
                );
            }
        }

        let text = Self::response_text(parsed)?;
        tracing::info!(
            model = %self.model,
            chars = text.len(),
            provider = "openai",
            "Completion received"
        );

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider() -> OpenAiCompletion {
        OpenAiCompletion::new(
            "test_key".to_string(),
            "http://test.local/v1".to_string(),
            "gpt-3.5-turbo".to_string(),
        )
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            system: "You are a movie recommendation expert.".to_string(),
            prompt: "Recommend something.".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            top_p: None,
            frequency_penalty: Some(0.5),
        }
    }

    #[test]
    fn test_chat_request_shape() {
        let body = serde_json::to_value(provider().chat_request(request())).unwrap();

        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Recommend something.");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["frequency_penalty"], 0.5);
        assert!(body.get("top_p").is_none());
    }

    #[test]
    fn test_response_text_takes_first_choice() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [
                {"message": {"role": "assistant", "content": "{\"recommendations\": []}"}, "finish_reason": "stop"},
                {"message": {"role": "assistant", "content": "ignored"}}
            ]
        }))
        .unwrap();

        let text = OpenAiCompletion::response_text(response).unwrap();
        assert_eq!(text, "{\"recommendations\": []}");
    }

    #[test]
    fn test_missing_or_blank_content_is_error() {
        let no_choices: ChatCompletionResponse =
            serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(matches!(
            OpenAiCompletion::response_text(no_choices),
            Err(ProviderError::EmptyCompletion)
        ));

        let null_content: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        }))
        .unwrap();
        assert!(matches!(
            OpenAiCompletion::response_text(null_content),
            Err(ProviderError::EmptyCompletion)
        ));

        let blank: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "  \n"}}]
        }))
        .unwrap();
        assert!(OpenAiCompletion::response_text(blank).is_err());
    }
}
