use askama::Template;

use analyst_core::domain::recommendation::RecommendationSet;
use analyst_core::pipeline::{AnalysisOutcome, NoticeLevel};

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub ticker: String,
    pub notices: Vec<NoticeView>,
    pub analysis: Option<String>,
    pub summary: Vec<SummaryRow>,
    pub recommendations: Option<String>,
    pub headlines: Vec<LinkView>,
    pub show_results: bool,
    pub results: Vec<ResultView>,
}

pub struct NoticeView {
    pub class: &'static str,
    pub message: String,
}

pub struct SummaryRow {
    pub label: &'static str,
    pub value: String,
}

pub struct LinkView {
    pub title: String,
    pub link: Option<String>,
}

pub struct ResultView {
    pub title: String,
    pub body: String,
    pub link: Option<String>,
}

impl IndexPage {
    pub fn empty(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            notices: Vec::new(),
            analysis: None,
            summary: Vec::new(),
            recommendations: None,
            headlines: Vec::new(),
            show_results: false,
            results: Vec::new(),
        }
    }

    pub fn from_outcome(outcome: &AnalysisOutcome) -> Self {
        let mut page = Self::empty(&outcome.ticker);

        page.notices = outcome
            .notices
            .iter()
            .map(|n| NoticeView {
                class: match n.level {
                    NoticeLevel::Error => "error",
                    NoticeLevel::Warning => "warning",
                },
                message: n.message.clone(),
            })
            .collect();

        page.analysis = outcome.analysis.as_ref().map(|r| r.text.clone());

        if let Some(market) = &outcome.market {
            page.summary = market
                .summary
                .rows()
                .into_iter()
                .map(|(label, value)| SummaryRow {
                    label,
                    value: value.to_string(),
                })
                .collect();
            page.recommendations = Some(match &market.recommendations {
                RecommendationSet::Provided(v) => {
                    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
                }
                none => none.to_string(),
            });
            page.headlines = market
                .news
                .iter()
                .map(|n| LinkView {
                    title: n.title().unwrap_or("Untitled").to_string(),
                    link: n.link().map(str::to_string),
                })
                .collect();
            page.show_results = true;
        }

        page.results = outcome
            .search_results
            .iter()
            .map(|r| ResultView {
                title: r.display_title().to_string(),
                body: r.display_body().to_string(),
                link: r.link.clone(),
            })
            .collect();

        page
    }
}
