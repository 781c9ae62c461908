//! Failure kinds surfaced by one analysis run.

use thiserror::Error;

pub use crate::llm::error::{GenerationError, GenerationErrorKind};

/// Market-data provider failure: network, unknown symbol, bad status or malformed body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DataFetchError {
    pub ticker: String,
    pub message: String,
}

impl DataFetchError {
    pub fn new(ticker: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            message: message.into(),
        }
    }
}

/// Search provider failure. Never fatal; the caller degrades to an empty result list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SearchError(pub String);

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Please enter your Groq API Key ({0} is not set)")]
    MissingCredential(&'static str),

    #[error("Please enter a valid stock ticker")]
    InvalidTicker(String),

    #[error("Error fetching stock information: {0}")]
    DataFetch(#[from] DataFetchError),

    #[error("Web search error: {0}")]
    Search(#[from] SearchError),

    #[error("AI analysis error: {0}")]
    Generation(#[from] GenerationError),
}
