use serde_json::Value;
use std::fmt;

use crate::llm::Provider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationErrorKind {
    /// Rejected credentials (401/403).
    Auth,
    /// 429 from the provider.
    RateLimited,
    /// Any other non-success status.
    Http,
    /// Request never completed.
    Network,
    /// Body could not be decoded, or carried no choice.
    Decode,
    /// The HTTP client could not be built.
    Client,
}

#[derive(Debug, Clone)]
pub struct GenerationError {
    pub provider: Provider,
    pub kind: GenerationErrorKind,
    pub detail: String,
    pub raw_output: Option<String>,
    pub raw_response_json: Option<Value>,
}

impl GenerationError {
    pub fn new(provider: Provider, kind: GenerationErrorKind, detail: impl Into<String>) -> Self {
        Self {
            provider,
            kind,
            detail: detail.into(),
            raw_output: None,
            raw_response_json: None,
        }
    }

    pub fn with_raw_output(mut self, raw: String) -> Self {
        self.raw_response_json = serde_json::from_str::<Value>(&raw).ok();
        self.raw_output = Some(raw);
        self
    }

    /// Provider-supplied message from an OpenAI-style `{"error": {"message": ...}}` body.
    pub fn provider_message(&self) -> Option<&str> {
        self.raw_response_json
            .as_ref()?
            .pointer("/error/message")?
            .as_str()
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LLM error (provider={:?}, kind={:?}): {}",
            self.provider, self.kind, self.detail
        )?;
        if let Some(msg) = self.provider_message() {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

impl std::error::Error for GenerationError {}
