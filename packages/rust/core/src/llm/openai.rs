//! OpenAI-compatible `chat/completions` backend (Kimi, OpenAI, OpenRouter).

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use newsdigest_shared::{NewsDigestError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ChatBackend, ChatRequest, Completion, api_error, http_client};

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct RequestBody<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
}

#[derive(Deserialize)]
struct ResponseBody {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// Bearer-authenticated client for any OpenAI-compatible endpoint.
pub struct OpenAiCompatible {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiCompatible {
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

impl fmt::Debug for OpenAiCompatible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiCompatible")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl ChatBackend for OpenAiCompatible {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn complete(&self, request: ChatRequest<'_>) -> Result<Completion> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = RequestBody {
            model: request.model,
            messages: [
                Message {
                    role: "system",
                    content: request.system,
                },
                Message {
                    role: "user",
                    content: request.user,
                },
            ],
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| NewsDigestError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(api_error(self.name(), status, &text));
        }

        let parsed: ResponseBody = response
            .json()
            .await
            .map_err(|e| NewsDigestError::Enrichment(format!("{url}: invalid response: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| NewsDigestError::Enrichment(format!("{url}: response has no choices")))?;
        let usage = parsed.usage.unwrap_or(Usage {
            prompt_tokens: 0,
            completion_tokens: 0,
        });

        Ok(Completion {
            text,
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request<'a>() -> ChatRequest<'a> {
        ChatRequest {
            model: "kimi-k2",
            system: "sys",
            user: "hello",
            temperature: 0.3,
        }
    }

    #[tokio::test]
    async fn sends_chat_request_and_reads_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(serde_json::json!({
                "model": "kimi-k2",
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "hello"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "hi"}}],
                "usage": {"prompt_tokens": 12, "completion_tokens": 3}
            })))
            .mount(&server)
            .await;

        let backend = OpenAiCompatible::new(
            &format!("{}/v1/", server.uri()),
            "secret".into(),
            Duration::from_secs(5),
        )
        .unwrap();
        let completion = backend.complete(request()).await.unwrap();
        assert_eq!(
            completion,
            Completion {
                text: "hi".into(),
                input_tokens: 12,
                output_tokens: 3
            }
        );
    }

    #[tokio::test]
    async fn error_status_becomes_enrichment_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let backend =
            OpenAiCompatible::new(&server.uri(), "k".into(), Duration::from_secs(5)).unwrap();
        let err = backend.complete(request()).await.unwrap_err();
        assert!(matches!(err, NewsDigestError::Enrichment(_)));
        assert!(err.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let backend =
            OpenAiCompatible::new(&server.uri(), "k".into(), Duration::from_secs(5)).unwrap();
        assert!(backend.complete(request()).await.is_err());
    }

    #[test]
    fn debug_redacts_key() {
        let backend =
            OpenAiCompatible::new("https://api.example.com", "sk-123".into(), Duration::from_secs(1))
                .unwrap();
        let debug = format!("{backend:?}");
        assert!(!debug.contains("sk-123"));
        assert!(debug.contains("<redacted>"));
    }
}
