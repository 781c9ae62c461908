use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::domain::recommendation::RecommendationSet;

pub const NOT_AVAILABLE: &str = "N/A";
pub const MAX_NEWS_ITEMS: usize = 3;

/// One summary value. The provider may omit any field, so every slot can hold the sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    NotAvailable,
}

impl FieldValue {
    pub fn is_available(&self) -> bool {
        !matches!(self, FieldValue::NotAvailable)
    }

    pub fn text(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(s) if !s.is_empty() => FieldValue::Text(s.to_string()),
            _ => FieldValue::NotAvailable,
        }
    }

    pub fn integer(value: Option<i64>) -> Self {
        value.map_or(FieldValue::NotAvailable, FieldValue::Integer)
    }

    pub fn decimal(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => FieldValue::Decimal(v),
            _ => FieldValue::NotAvailable,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(n) => write!(f, "{n}"),
            // Whole numbers keep one fractional digit.
            FieldValue::Decimal(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{v:.1}"),
            FieldValue::Decimal(v) => write!(f, "{v}"),
            FieldValue::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Integer(n) => serializer.serialize_i64(*n),
            FieldValue::Decimal(v) => serializer.serialize_f64(*v),
            FieldValue::NotAvailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockSummary {
    pub name: FieldValue,
    pub sector: FieldValue,
    pub industry: FieldValue,
    pub market_cap: FieldValue,
    pub current_price: FieldValue,
    pub fifty_two_week_high: FieldValue,
    pub fifty_two_week_low: FieldValue,
}

impl StockSummary {
    pub fn not_available() -> Self {
        Self {
            name: FieldValue::NotAvailable,
            sector: FieldValue::NotAvailable,
            industry: FieldValue::NotAvailable,
            market_cap: FieldValue::NotAvailable,
            current_price: FieldValue::NotAvailable,
            fifty_two_week_high: FieldValue::NotAvailable,
            fifty_two_week_low: FieldValue::NotAvailable,
        }
    }

    /// Display rows in a fixed order.
    pub fn rows(&self) -> [(&'static str, &FieldValue); 7] {
        [
            ("Name", &self.name),
            ("Sector", &self.sector),
            ("Industry", &self.industry),
            ("Market Cap", &self.market_cap),
            ("Current Price", &self.current_price),
            ("52 Week High", &self.fifty_two_week_high),
            ("52 Week Low", &self.fifty_two_week_low),
        ]
    }
}

/// Provider news record, passed through as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NewsItem(pub serde_json::Value);

impl NewsItem {
    pub fn title(&self) -> Option<&str> {
        self.0.get("title").and_then(|v| v.as_str())
    }

    pub fn link(&self) -> Option<&str> {
        self.0.get("link").and_then(|v| v.as_str())
    }
}

/// Everything the market-data stage yields for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSnapshot {
    pub summary: StockSummary,
    pub recommendations: RecommendationSet,
    pub news: Vec<NewsItem>,
}

impl MarketSnapshot {
    pub fn new(summary: StockSummary, recommendations: RecommendationSet, mut news: Vec<NewsItem>) -> Self {
        news.truncate(MAX_NEWS_ITEMS);
        Self {
            summary,
            recommendations,
            news,
        }
    }
}
