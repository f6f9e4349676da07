use super::prompt::{build_prompt, SYSTEM_PROMPT};
use super::response::{parse_advisor_response, AdvisorResponse};
use super::LlmError;
use crate::models::MarketSnapshot;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::{interval_at, Instant};

pub const DEEPSEEK_API_BASE: &str = "https://api.deepseek.com";
pub const DEEPSEEK_REASONER: &str = "deepseek-reasoner";
const DEFAULT_TIMEOUT_SECS: u64 = 300; // reasoning replies can take minutes
const PROGRESS_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u64,
}

/// Chat-completions client for DeepSeek
///
/// One request per call, no retries.
#[derive(Clone)]
pub struct DeepSeekClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl DeepSeekClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEEPSEEK_API_BASE.to_string(),
            model: DEEPSEEK_REASONER.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send account and market reports and decode the recommendations
    pub async fn advise(
        &self,
        query: &str,
        account_report: &str,
        markets: &[MarketSnapshot],
    ) -> Result<AdvisorResponse, LlmError> {
        let prompt = build_prompt(query, account_report, markets);
        tracing::debug!(chars = prompt.len(), markets = markets.len(), "Built advisor prompt");

        let response = self.complete(&prompt).await?;
        let tokens_used = response.usage.map(|u| u.total_tokens).unwrap_or(0);

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyChoices)?;
        let content = choice.message.content.unwrap_or_default();

        parse_advisor_response(&content, tokens_used)
    }

    /// Run the request under the timeout, logging while the model thinks
    async fn complete(&self, prompt: &str) -> Result<ChatResponse, LlmError> {
        tracing::info!(model = %self.model, "Sending request to DeepSeek API...");

        let request = self.send(prompt);
        tokio::pin!(request);

        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        let mut progress = interval_at(Instant::now() + PROGRESS_INTERVAL, PROGRESS_INTERVAL);

        loop {
            tokio::select! {
                result = &mut request => {
                    tracing::info!("Received response from DeepSeek API");
                    return result;
                }
                _ = &mut deadline => {
                    return Err(LlmError::Timeout(self.timeout.as_secs()));
                }
                _ = progress.tick() => {
                    tracing::info!(
                        "Still waiting for DeepSeek response... (reasoning models can take several minutes)"
                    );
                }
            }
        }
    }

    async fn send(&self, prompt: &str) -> Result<ChatResponse, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn completion(content: &str) -> String {
        json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content, "reasoning_content": "..." },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 900, "completion_tokens": 334, "total_tokens": 1234 }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_advise_sends_prompt_and_parses_reply() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({ "model": "deepseek-reasoner" })),
                Matcher::Regex("User Question: Any trades".to_string()),
                Matcher::Regex("expert cryptocurrency trading advisor".to_string()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(completion(
                "```json\n{\"analysis\": \"calm\", \"recommendations\": [], \"portfolio_suggestions\": \"hold\", \"risk_warnings\": []}\n```",
            ))
            .create_async()
            .await;

        let client = DeepSeekClient::new("sk-test").with_base_url(server.url());
        let response = client.advise("Any trades?", "ACCOUNT", &[]).await.unwrap();

        assert_eq!(response.analysis, "calm");
        assert_eq!(response.portfolio_suggestions, "hold");
        assert_eq!(response.tokens_used, 1234);
        assert!(response.raw_response.starts_with("```json"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_choices_is_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_header("content-type", "application/json")
            .with_body(json!({ "choices": [], "usage": { "total_tokens": 5 } }).to_string())
            .create_async()
            .await;

        let client = DeepSeekClient::new("sk-test").with_base_url(server.url());
        let err = client.advise("", "ACCOUNT", &[]).await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyChoices));
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body("invalid api key")
            .create_async()
            .await;

        let client = DeepSeekClient::new("bad").with_base_url(server.url());
        let err = client.advise("", "ACCOUNT", &[]).await.unwrap_err();
        match err {
            LlmError::Api { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid api key");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout() {
        // Accepts connections but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let client = DeepSeekClient::new("sk-test")
            .with_base_url(format!("http://{}", address))
            .with_timeout(Duration::from_millis(50));
        let err = client.advise("", "ACCOUNT", &[]).await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout(0)));
    }
}
