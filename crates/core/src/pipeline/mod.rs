//! One analysis run: market data, then web search, then LLM summary.
//!
//! The run is a fixed plan of [`ToolInvocation`] steps executed in order by [`Analyzer`]. A
//! market-data failure ends the run; a search failure only empties the search section; a
//! generation failure only drops the analysis text.

use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Settings;
use crate::domain::report::AnalysisReport;
use crate::domain::search::SearchResult;
use crate::domain::stock::MarketSnapshot;
use crate::domain::ticker::TickerSymbol;
use crate::error::AnalysisError;
use crate::llm::groq::GroqClient;
use crate::llm::{self, LlmClient};
use crate::market::yahoo::YahooFinanceClient;
use crate::market::MarketDataProvider;
use crate::search::duckduckgo::DuckDuckGoClient;
use crate::search::{web_search, SearchProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Fetching,
    Searching,
    Generating,
    Rendered,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    MarketData { ticker: TickerSymbol },
    WebSearch { query: String },
    Summarize { ticker: TickerSymbol },
}

impl ToolInvocation {
    pub fn stage(&self) -> Stage {
        match self {
            ToolInvocation::MarketData { .. } => Stage::Fetching,
            ToolInvocation::WebSearch { .. } => Stage::Searching,
            ToolInvocation::Summarize { .. } => Stage::Generating,
        }
    }
}

/// The only plan there is.
pub fn plan(ticker: &TickerSymbol) -> [ToolInvocation; 3] {
    [
        ToolInvocation::MarketData {
            ticker: ticker.clone(),
        },
        ToolInvocation::WebSearch {
            query: ticker.search_query(),
        },
        ToolInvocation::Summarize {
            ticker: ticker.clone(),
        },
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Error,
    Warning,
}

/// A message shown inline to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnalysisRequest {
    pub ticker: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub run_id: Uuid,
    pub ticker: String,
    pub stage: Stage,
    pub market: Option<MarketSnapshot>,
    pub search_results: Vec<SearchResult>,
    pub analysis: Option<AnalysisReport>,
    pub notices: Vec<Notice>,
}

impl AnalysisOutcome {
    fn new(ticker: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            ticker: ticker.to_string(),
            stage: Stage::Idle,
            market: None,
            search_results: Vec::new(),
            analysis: None,
            notices: Vec::new(),
        }
    }

    fn advance(&mut self, stage: Stage) {
        tracing::debug!(from = ?self.stage, to = ?stage, "pipeline stage");
        self.stage = stage;
    }

    fn notify(&mut self, level: NoticeLevel, err: &AnalysisError) {
        self.notices.push(Notice {
            level,
            message: err.to_string(),
        });
    }

    fn fail(mut self, err: AnalysisError) -> Self {
        tracing::error!(error = %err, "analysis aborted");
        self.notify(NoticeLevel::Error, &err);
        self.advance(Stage::Failed);
        self
    }

    pub fn is_failed(&self) -> bool {
        self.stage == Stage::Failed
    }

    pub fn errors(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter().filter(|n| n.level == NoticeLevel::Error)
    }
}

/// Runs the fixed plan against whichever providers it is handed.
pub struct Analyzer<'a> {
    pub market: &'a dyn MarketDataProvider,
    pub search: &'a dyn SearchProvider,
    pub llm: &'a dyn LlmClient,
}

impl<'a> Analyzer<'a> {
    pub fn new(
        market: &'a dyn MarketDataProvider,
        search: &'a dyn SearchProvider,
        llm: &'a dyn LlmClient,
    ) -> Self {
        Self { market, search, llm }
    }

    pub async fn run(&self, ticker: &TickerSymbol) -> AnalysisOutcome {
        let outcome = AnalysisOutcome::new(ticker.as_str());
        let span = tracing::info_span!(
            "analysis",
            run_id = %outcome.run_id,
            %ticker,
            market = self.market.provider_name(),
            search = self.search.provider_name(),
            llm = ?self.llm.provider(),
            model = self.llm.model(),
        );
        self.run_plan(ticker, outcome).instrument(span).await
    }

    async fn run_plan(&self, ticker: &TickerSymbol, mut outcome: AnalysisOutcome) -> AnalysisOutcome {
        for step in plan(ticker) {
            outcome.advance(step.stage());
            match step {
                ToolInvocation::MarketData { ticker } => match self.market.fetch(&ticker).await {
                    Ok(snapshot) => outcome.market = Some(snapshot),
                    Err(err) => return outcome.fail(err.into()),
                },
                ToolInvocation::WebSearch { query } => {
                    let found = web_search(self.search, &query).await;
                    outcome.search_results = found.results;
                    if let Some(warning) = found.warning {
                        outcome.notify(NoticeLevel::Warning, &AnalysisError::from(warning));
                    }
                }
                ToolInvocation::Summarize { ticker } => {
                    let result = match outcome.market.as_ref() {
                        Some(snapshot) => llm::summarize(self.llm, &ticker, snapshot).await,
                        None => continue,
                    };
                    match result {
                        Ok(report) => outcome.analysis = Some(report),
                        Err(err) => {
                            tracing::error!(error = %err, "analysis generation failed");
                            outcome.notify(NoticeLevel::Error, &AnalysisError::from(err));
                        }
                    }
                }
            }
        }

        outcome.advance(Stage::Rendered);
        tracing::info!(
            results = outcome.search_results.len(),
            analysis = outcome.analysis.is_some(),
            notices = outcome.notices.len(),
            "analysis rendered"
        );
        outcome
    }
}

/// Validates the request, builds fresh provider clients and runs one analysis.
pub async fn analyze(settings: &Settings, request: &AnalysisRequest) -> AnalysisOutcome {
    let display_ticker = request.ticker.trim().to_uppercase();

    let api_key = match settings.require_groq_api_key(request.api_key.as_deref()) {
        Ok(key) => key,
        Err(err) => return AnalysisOutcome::new(&display_ticker).fail(err),
    };
    let ticker = match TickerSymbol::parse(&request.ticker) {
        Ok(t) => t,
        Err(err) => return AnalysisOutcome::new(&display_ticker).fail(err),
    };

    let llm = match GroqClient::from_settings(settings, api_key) {
        Ok(c) => c,
        Err(err) => return AnalysisOutcome::new(ticker.as_str()).fail(err.into()),
    };
    let market = match YahooFinanceClient::from_settings(settings) {
        Ok(c) => c,
        Err(err) => {
            let err = crate::error::DataFetchError::new(ticker.as_str(), format!("{err:#}"));
            return AnalysisOutcome::new(ticker.as_str()).fail(err.into());
        }
    };
    // A search client that cannot be built behaves like a provider that returns nothing.
    let search = DuckDuckGoClient::from_settings(settings);

    match &search {
        Ok(search) => Analyzer::new(&market, search, &llm).run(&ticker).await,
        Err(err) => {
            let unavailable = Unavailable(format!("{err:#}"));
            Analyzer::new(&market, &unavailable, &llm).run(&ticker).await
        }
    }
}

struct Unavailable(String);

#[async_trait::async_trait]
impl SearchProvider for Unavailable {
    fn provider_name(&self) -> &'static str {
        "unavailable"
    }

    async fn text_search(
        &self,
        _query: &str,
        _max_results: usize,
    ) -> Result<Vec<SearchResult>, crate::error::SearchError> {
        Err(crate::error::SearchError(self.0.clone()))
    }
}
