use anyhow::Context;
use serde_json::Value;
use std::time::Duration;

use crate::config::Settings;
use crate::domain::recommendation::RecommendationSet;
use crate::domain::stock::{FieldValue, MarketSnapshot, NewsItem, StockSummary, MAX_NEWS_ITEMS};
use crate::domain::ticker::TickerSymbol;
use crate::error::DataFetchError;
use crate::market::MarketDataProvider;

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";
const TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const QUOTE_SUMMARY_MODULES: &str =
    "price,assetProfile,summaryDetail,financialData,recommendationTrend";

/// Yahoo Finance JSON endpoints. Every fetch performs the cookie/crumb handshake afresh; nothing
/// is cached between calls.
#[derive(Debug, Clone)]
pub struct YahooFinanceClient {
    http: reqwest::Client,
    base_url: String,
    cookie_url: String,
}

impl YahooFinanceClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let base_url = settings
            .market_data_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let cookie_url = settings
            .market_data_cookie_url
            .clone()
            .unwrap_or_else(|| DEFAULT_COOKIE_URL.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            http,
            base_url,
            cookie_url,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Returns `None` when no crumb could be obtained; the quote request then goes out without
    /// one and any rejection is reported from there.
    async fn crumb(&self) -> Option<String> {
        if let Err(err) = self.http.get(&self.cookie_url).send().await {
            tracing::debug!(error = %err, "cookie bootstrap request failed");
        }

        let res = match self.http.get(self.url("/v1/test/getcrumb")).send().await {
            Ok(res) => res,
            Err(err) => {
                tracing::warn!(error = %err, "crumb request failed; continuing without crumb");
                return None;
            }
        };
        let status = res.status();
        let text = res.text().await.ok()?;
        let crumb = text.trim();
        if !status.is_success() || crumb.is_empty() || crumb.starts_with('{') {
            tracing::warn!(%status, "crumb unavailable; continuing without crumb");
            return None;
        }
        Some(crumb.to_string())
    }

    async fn get_json(
        &self,
        ticker: &TickerSymbol,
        req: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<(reqwest::StatusCode, Value), DataFetchError> {
        let fail = |msg: String| DataFetchError::new(ticker.as_str(), msg);

        let res = req
            .send()
            .await
            .map_err(|e| fail(format!("{what} request failed: {e}")))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| fail(format!("failed to read {what} response: {e}")))?;
        let json = serde_json::from_str::<Value>(&text).map_err(|_| {
            if status.is_success() {
                fail(format!("{what} response is not valid JSON"))
            } else {
                fail(format!("{what} HTTP {status}: {}", text.trim()))
            }
        })?;
        Ok((status, json))
    }

    async fn quote_summary(&self, ticker: &TickerSymbol, crumb: Option<&str>) -> Result<Value, DataFetchError> {
        let mut query = vec![("modules", QUOTE_SUMMARY_MODULES)];
        if let Some(crumb) = crumb {
            query.push(("crumb", crumb));
        }
        let req = self
            .http
            .get(self.url(&format!("/v10/finance/quoteSummary/{}", ticker.as_str())))
            .query(&query);

        let (status, json) = self.get_json(ticker, req, "quote summary").await?;

        if let Some(description) = json
            .pointer("/quoteSummary/error/description")
            .and_then(Value::as_str)
        {
            return Err(DataFetchError::new(ticker.as_str(), description));
        }
        if !status.is_success() {
            return Err(DataFetchError::new(
                ticker.as_str(),
                format!("quote summary HTTP {status}: {json}"),
            ));
        }

        json.pointer("/quoteSummary/result/0")
            .cloned()
            .ok_or_else(|| DataFetchError::new(ticker.as_str(), format!("no data returned for {ticker}")))
    }

    async fn news(&self, ticker: &TickerSymbol) -> Result<Vec<NewsItem>, DataFetchError> {
        let news_count = MAX_NEWS_ITEMS.to_string();
        let req = self.http.get(self.url("/v1/finance/search")).query(&[
            ("q", ticker.as_str()),
            ("quotesCount", "0"),
            ("newsCount", news_count.as_str()),
        ]);

        let (status, json) = self.get_json(ticker, req, "news").await?;
        if !status.is_success() {
            return Err(DataFetchError::new(
                ticker.as_str(),
                format!("news HTTP {status}: {json}"),
            ));
        }

        Ok(json
            .get("news")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .take(MAX_NEWS_ITEMS)
                    .cloned()
                    .map(NewsItem)
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooFinanceClient {
    fn provider_name(&self) -> &'static str {
        "yahoo_finance"
    }

    async fn fetch(&self, ticker: &TickerSymbol) -> Result<MarketSnapshot, DataFetchError> {
        let crumb = self.crumb().await;
        let result = self.quote_summary(ticker, crumb.as_deref()).await?;
        let news = self.news(ticker).await?;

        let summary = summary_from_result(&result);
        let recommendations =
            RecommendationSet::from_provider(result.pointer("/recommendationTrend/trend").cloned());

        tracing::debug!(
            %ticker,
            missing_fields = summary.rows().iter().filter(|(_, v)| !v.is_available()).count(),
            news = news.len(),
            "market data fetched"
        );

        Ok(MarketSnapshot::new(summary, recommendations, news))
    }
}

fn summary_from_result(result: &Value) -> StockSummary {
    StockSummary {
        name: FieldValue::text(
            text_at(result, "/price/longName").or_else(|| text_at(result, "/price/shortName")),
        ),
        sector: FieldValue::text(text_at(result, "/assetProfile/sector")),
        industry: FieldValue::text(text_at(result, "/assetProfile/industry")),
        market_cap: FieldValue::integer(raw_i64(result, "/price/marketCap")),
        current_price: FieldValue::decimal(
            raw_f64(result, "/financialData/currentPrice")
                .or_else(|| raw_f64(result, "/price/regularMarketPrice")),
        ),
        fifty_two_week_high: FieldValue::decimal(raw_f64(result, "/summaryDetail/fiftyTwoWeekHigh")),
        fifty_two_week_low: FieldValue::decimal(raw_f64(result, "/summaryDetail/fiftyTwoWeekLow")),
    }
}

fn text_at<'a>(v: &'a Value, pointer: &str) -> Option<&'a str> {
    v.pointer(pointer).and_then(Value::as_str)
}

// Yahoo wraps numbers as {"raw": 1.0, "fmt": "1.00"}; a bare number is accepted too.
fn raw_number<'a>(v: &'a Value, pointer: &str) -> Option<&'a Value> {
    let node = v.pointer(pointer)?;
    match node.get("raw") {
        Some(raw) => Some(raw),
        None if node.is_number() => Some(node),
        None => None,
    }
}

fn raw_f64(v: &Value, pointer: &str) -> Option<f64> {
    raw_number(v, pointer)?.as_f64()
}

fn raw_i64(v: &Value, pointer: &str) -> Option<i64> {
    let n = raw_number(v, pointer)?;
    n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::spawn_mock;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    async fn quote_summary(
        Path(ticker): Path<String>,
        Query(q): Query<HashMap<String, String>>,
    ) -> axum::response::Response {
        if q.get("crumb").map(String::as_str) != Some("crumb-123") {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"finance": {"error": {"code": "Unauthorized", "description": "Invalid Crumb"}}})),
            )
                .into_response();
        }
        match ticker.as_str() {
            "NVDA" => Json(json!({
                "quoteSummary": {
                    "result": [{
                        "price": {
                            "longName": "NVIDIA Corporation",
                            "marketCap": {"raw": 3000000000000i64, "fmt": "3T"},
                            "regularMarketPrice": {"raw": 134.5}
                        },
                        "assetProfile": {"sector": "Technology", "industry": "Semiconductors"},
                        "summaryDetail": {
                            "fiftyTwoWeekHigh": {"raw": 152.89},
                            "fiftyTwoWeekLow": {"raw": 66.25}
                        },
                        "financialData": {"currentPrice": {"raw": 135.0}},
                        "recommendationTrend": {"trend": [
                            {"period": "0m", "strongBuy": 12, "buy": 45, "hold": 5, "sell": 0, "strongSell": 0}
                        ]}
                    }],
                    "error": null
                }
            }))
            .into_response(),
            "BARE" => Json(json!({
                "quoteSummary": {
                    "result": [{"price": {"shortName": "Bare Co"}}],
                    "error": null
                }
            }))
            .into_response(),
            _ => (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "quoteSummary": {
                        "result": null,
                        "error": {"code": "Not Found", "description": format!("Quote not found for symbol: {ticker}")}
                    }
                })),
            )
                .into_response(),
        }
    }

    async fn search(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
        let ticker = q.get("q").cloned().unwrap_or_default();
        let news: Vec<_> = (1..=5)
            .map(|i| json!({"uuid": format!("n{i}"), "title": format!("{ticker} headline {i}"), "link": format!("https://news.example/{i}")}))
            .collect();
        Json(json!({"news": news}))
    }

    fn router(with_crumb: bool) -> Router {
        let crumb = if with_crumb { "crumb-123" } else { "" };
        Router::new()
            .route("/cookie", get(|| async { StatusCode::NOT_FOUND }))
            .route("/v1/test/getcrumb", get(move || async move { crumb }))
            .route("/v10/finance/quoteSummary/:ticker", get(quote_summary))
            .route("/v1/finance/search", get(search))
    }

    async fn client(with_crumb: bool) -> YahooFinanceClient {
        let base = spawn_mock(router(with_crumb)).await;
        let settings = Settings {
            market_data_base_url: Some(base.clone()),
            market_data_cookie_url: Some(format!("{base}/cookie")),
            ..Default::default()
        };
        YahooFinanceClient::from_settings(&settings).unwrap()
    }

    #[tokio::test]
    async fn maps_full_response() {
        let yahoo = client(true).await;
        let snapshot = yahoo.fetch(&TickerSymbol::parse("nvda").unwrap()).await.unwrap();

        let s = &snapshot.summary;
        assert_eq!(s.name, FieldValue::Text("NVIDIA Corporation".to_string()));
        assert_eq!(s.sector, FieldValue::Text("Technology".to_string()));
        assert_eq!(s.industry, FieldValue::Text("Semiconductors".to_string()));
        assert_eq!(s.market_cap, FieldValue::Integer(3_000_000_000_000));
        assert_eq!(s.current_price, FieldValue::Decimal(135.0));
        assert_eq!(s.fifty_two_week_high, FieldValue::Decimal(152.89));
        assert_eq!(s.fifty_two_week_low, FieldValue::Decimal(66.25));

        assert!(matches!(snapshot.recommendations, RecommendationSet::Provided(_)));
        assert_eq!(snapshot.news.len(), 3);
        assert_eq!(snapshot.news[0].title(), Some("NVDA headline 1"));
    }

    #[tokio::test]
    async fn missing_fields_become_not_available() {
        let yahoo = client(true).await;
        let snapshot = yahoo.fetch(&TickerSymbol::parse("BARE").unwrap()).await.unwrap();

        let s = &snapshot.summary;
        assert_eq!(s.name, FieldValue::Text("Bare Co".to_string()));
        for (label, value) in s.rows().into_iter().skip(1) {
            assert_eq!(*value, FieldValue::NotAvailable, "{label}");
        }
        assert_eq!(snapshot.recommendations, RecommendationSet::NoneAvailable);
    }

    #[tokio::test]
    async fn unknown_ticker_carries_provider_message() {
        let yahoo = client(true).await;
        let err = yahoo.fetch(&TickerSymbol::parse("ZZZZ").unwrap()).await.unwrap_err();
        assert_eq!(err.ticker, "ZZZZ");
        assert_eq!(err.message, "Quote not found for symbol: ZZZZ");
    }

    #[tokio::test]
    async fn missing_crumb_surfaces_provider_rejection() {
        let yahoo = client(false).await;
        let err = yahoo.fetch(&TickerSymbol::parse("NVDA").unwrap()).await.unwrap_err();
        assert!(err.message.contains("401"), "{}", err.message);
    }

    #[test]
    fn raw_numbers_accept_wrapped_and_bare() {
        let v = json!({"a": {"raw": 2.5}, "b": 7, "c": {"fmt": "n/a"}, "d": {"raw": 1.0e12}});
        assert_eq!(raw_f64(&v, "/a"), Some(2.5));
        assert_eq!(raw_f64(&v, "/b"), Some(7.0));
        assert_eq!(raw_f64(&v, "/c"), None);
        assert_eq!(raw_i64(&v, "/d"), Some(1_000_000_000_000));
    }
}
