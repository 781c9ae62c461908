pub mod error;
pub mod groq;
pub mod prompt;

use chrono::Utc;

use crate::domain::report::AnalysisReport;
use crate::domain::stock::MarketSnapshot;
use crate::domain::ticker::TickerSymbol;
use crate::llm::error::GenerationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Groq,
}

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    fn model(&self) -> &str;

    /// Sends one user-role prompt and returns the first generated choice.
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Builds the prompt for `ticker` and asks `llm` for the analysis text.
pub async fn summarize(
    llm: &dyn LlmClient,
    ticker: &TickerSymbol,
    snapshot: &MarketSnapshot,
) -> Result<AnalysisReport, GenerationError> {
    let prompt = prompt::build_prompt(
        ticker,
        &snapshot.summary,
        &snapshot.recommendations,
        &snapshot.news,
    );
    tracing::debug!(%ticker, prompt_chars = prompt.chars().count(), "submitting analysis prompt");

    let text = llm.complete(&prompt).await?;
    Ok(AnalysisReport {
        ticker: ticker.clone(),
        model: llm.model().to_string(),
        generated_at: Utc::now(),
        text,
    })
}
