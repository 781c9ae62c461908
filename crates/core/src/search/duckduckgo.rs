use anyhow::Context;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

use crate::config::Settings;
use crate::domain::search::SearchResult;
use crate::error::SearchError;
use crate::search::SearchProvider;

const DEFAULT_BASE_URL: &str = "https://html.duckduckgo.com";
const TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// DuckDuckGo web text search through its HTML results page.
#[derive(Debug, Clone)]
pub struct DuckDuckGoClient {
    http: reqwest::Client,
    base_url: String,
}

impl DuckDuckGoClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let base_url = settings
            .search_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build search http client")?;

        Ok(Self { http, base_url })
    }
}

#[async_trait::async_trait]
impl SearchProvider for DuckDuckGoClient {
    fn provider_name(&self) -> &'static str {
        "duckduckgo"
    }

    async fn text_search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError> {
        let url = format!("{}/html/", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .form(&[("q", query), ("b", ""), ("kl", "")])
            .send()
            .await
            .map_err(|e| SearchError(format!("search request failed: {e}")))?;

        // 202 is the bot challenge page, not results.
        let status = res.status();
        if status != reqwest::StatusCode::OK {
            return Err(SearchError(format!("search HTTP {status}")));
        }

        let page = res
            .text()
            .await
            .map_err(|e| SearchError(format!("failed to read search response: {e}")))?;

        parse_results(&page, max_results)
    }
}

fn selector(css: &str) -> Result<Selector, SearchError> {
    Selector::parse(css).map_err(|e| SearchError(format!("bad result selector {css:?}: {e:?}")))
}

/// Organic results from a results page, ads skipped, in page order.
fn parse_results(page: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError> {
    let result_sel = selector("div.result:not(.result--ad)")?;
    let title_sel = selector("a.result__a")?;
    let snippet_sel = selector(".result__snippet")?;
    let url_sel = selector("a.result__url")?;

    let doc = Html::parse_document(page);
    let mut out = Vec::with_capacity(max_results);

    for node in doc.select(&result_sel) {
        if out.len() >= max_results {
            break;
        }
        let anchor = node.select(&title_sel).next();
        let link = anchor
            .and_then(|a| a.value().attr("href"))
            .and_then(resolve_link)
            .or_else(|| {
                node.select(&url_sel)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .and_then(resolve_link)
            });
        let title = anchor.and_then(text_of);
        let body = node.select(&snippet_sel).next().and_then(text_of);

        if title.is_none() && body.is_none() && link.is_none() {
            continue;
        }
        out.push(SearchResult { title, body, link });
    }

    Ok(out)
}

fn text_of(el: ElementRef<'_>) -> Option<String> {
    let text = el.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

/// Unwraps the `/l/?uddg=` redirect the results page puts in front of every target.
fn resolve_link(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    let url = reqwest::Url::parse(&absolute).ok()?;

    if url.path().starts_with("/y.js") {
        return None;
    }
    if url.path().starts_with("/l/") {
        return url
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty());
    }
    Some(absolute)
}
