use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Settings;
use crate::domain::credential::ApiKey;
use crate::llm::error::{GenerationError, GenerationErrorKind};
use crate::llm::{LlmClient, Provider};

const DEFAULT_BASE_URL: &str = "https://api.groq.com";
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
const TIMEOUT_SECS: u64 = 60;
const COMPLETIONS_PATH: &str = "/openai/v1/chat/completions";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroqConfig {
    pub base_url: String,
    pub model: String,
    /// Hard ceiling on generated tokens, sent with every request.
    pub max_tokens: u32,
}

impl GroqConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            base_url: settings
                .groq_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: settings
                .groq_model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: settings
                .groq_max_tokens
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_MAX_TOKENS),
        }
    }
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

#[derive(Debug, Clone)]
pub struct GroqClient {
    http: reqwest::Client,
    api_key: ApiKey,
    config: GroqConfig,
}

impl GroqClient {
    pub fn new(config: GroqConfig, api_key: ApiKey) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                GenerationError::new(
                    Provider::Groq,
                    GenerationErrorKind::Client,
                    format!("failed to build reqwest client: {e}"),
                )
            })?;

        Ok(Self {
            http,
            api_key,
            config,
        })
    }

    pub fn from_settings(settings: &Settings, api_key: ApiKey) -> Result<Self, GenerationError> {
        Self::new(GroqConfig::from_settings(settings), api_key)
    }

    fn request(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![Message {
                role: "user",
                content: prompt.to_string(),
            }],
            max_tokens: self.config.max_tokens,
        }
    }

    fn headers(&self) -> Result<HeaderMap, GenerationError> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {}", self.api_key.expose())).map_err(|_| {
            GenerationError::new(
                Provider::Groq,
                GenerationErrorKind::Auth,
                "API key contains characters not allowed in an HTTP header",
            )
        })?;
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    async fn create_completion(
        &self,
        req: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, GenerationError> {
        let url = format!("{}{COMPLETIONS_PATH}", self.config.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(self.headers()?)
            .json(req)
            .send()
            .await
            .map_err(|e| {
                GenerationError::new(
                    Provider::Groq,
                    GenerationErrorKind::Network,
                    format!("Groq request failed: {e}"),
                )
            })?;

        let status = res.status();
        let text = res.text().await.map_err(|e| {
            GenerationError::new(
                Provider::Groq,
                GenerationErrorKind::Network,
                format!("failed to read Groq response body: {e}"),
            )
        })?;

        if !status.is_success() {
            return Err(
                GenerationError::new(Provider::Groq, classify_status(status), format!("status={status}"))
                    .with_raw_output(text),
            );
        }

        serde_json::from_str::<ChatCompletionResponse>(&text).map_err(|e| {
            GenerationError::new(
                Provider::Groq,
                GenerationErrorKind::Decode,
                format!("failed to decode Groq response: {e}"),
            )
            .with_raw_output(text)
        })
    }
}

fn classify_status(status: StatusCode) -> GenerationErrorKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerationErrorKind::Auth,
        StatusCode::TOO_MANY_REQUESTS => GenerationErrorKind::RateLimited,
        _ => GenerationErrorKind::Http,
    }
}

#[async_trait::async_trait]
impl LlmClient for GroqClient {
    fn provider(&self) -> Provider {
        Provider::Groq
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let req = self.request(prompt);
        let res = self.create_completion(&req).await?;

        if let Some(usage) = &res.usage {
            tracing::debug!(
                model = %self.config.model,
                max_tokens = req.max_tokens,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "groq completion finished"
            );
        }

        res.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                GenerationError::new(
                    Provider::Groq,
                    GenerationErrorKind::Decode,
                    "Groq response contained no choices",
                )
            })
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::spawn_mock;
    use axum::extract::State;
    use axum::http::HeaderMap as AxumHeaderMap;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured {
        body: Arc<Mutex<Option<Value>>>,
        auth: Arc<Mutex<Option<String>>>,
    }

    async fn completions(
        State(captured): State<Captured>,
        headers: AxumHeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        *captured.auth.lock().unwrap() = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        *captured.body.lock().unwrap() = Some(body);
        Json(json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "**Bullish** overall."}}],
            "usage": {"prompt_tokens": 120, "completion_tokens": 40}
        }))
    }

    fn client(base_url: String, max_tokens: u32) -> GroqClient {
        let config = GroqConfig {
            base_url,
            model: "llama-3.3-70b-versatile".to_string(),
            max_tokens,
        };
        GroqClient::new(config, ApiKey::new("gsk_test").unwrap()).unwrap()
    }

    #[test]
    fn defaults_cap_generation_at_1000_tokens() {
        let config = GroqConfig::default();
        assert_eq!(config.max_tokens, 1000);
        assert_eq!(config.model, "llama-3.3-70b-versatile");
    }

    #[test]
    fn zero_cap_from_settings_falls_back_to_default() {
        let settings = Settings {
            groq_max_tokens: Some(0),
            ..Default::default()
        };
        assert_eq!(GroqConfig::from_settings(&settings).max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[tokio::test]
    async fn sends_configured_token_cap_and_single_user_message() {
        let captured = Captured::default();
        let app = Router::new()
            .route(COMPLETIONS_PATH, post(completions))
            .with_state(captured.clone());
        let base = spawn_mock(app).await;

        let text = client(base, 321).complete("hello prompt").await.unwrap();
        assert_eq!(text, "**Bullish** overall.");

        let body = captured.body.lock().unwrap().clone().unwrap();
        assert_eq!(body["max_tokens"], json!(321));
        assert_eq!(body["model"], json!("llama-3.3-70b-versatile"));
        assert_eq!(
            body["messages"],
            json!([{"role": "user", "content": "hello prompt"}])
        );
        assert_eq!(
            captured.auth.lock().unwrap().as_deref(),
            Some("Bearer gsk_test")
        );
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_error() {
        let app = Router::new().route(
            COMPLETIONS_PATH,
            post(|| async {
                (
                    axum::http::StatusCode::UNAUTHORIZED,
                    Json(json!({"error": {"message": "Invalid API Key"}})),
                )
            }),
        );
        let base = spawn_mock(app).await;

        let err = client(base, 1000).complete("p").await.unwrap_err();
        assert_eq!(err.kind, GenerationErrorKind::Auth);
        assert_eq!(err.provider_message(), Some("Invalid API Key"));
    }

    #[tokio::test]
    async fn rate_limit_maps_to_rate_limited() {
        let app = Router::new().route(
            COMPLETIONS_PATH,
            post(|| async { (axum::http::StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let base = spawn_mock(app).await;

        let err = client(base, 1000).complete("p").await.unwrap_err();
        assert_eq!(err.kind, GenerationErrorKind::RateLimited);
        assert_eq!(err.raw_output.as_deref(), Some("slow down"));
    }

    #[tokio::test]
    async fn empty_choices_is_decode_error() {
        let app = Router::new().route(
            COMPLETIONS_PATH,
            post(|| async { Json(json!({"choices": []})) }),
        );
        let base = spawn_mock(app).await;

        let err = client(base, 1000).complete("p").await.unwrap_err();
        assert_eq!(err.kind, GenerationErrorKind::Decode);
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{addr}"), 1000)
            .complete("p")
            .await
            .unwrap_err();
        assert_eq!(err.kind, GenerationErrorKind::Network);
    }
}
