use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AnalysisError;

pub const DEFAULT_TICKER: &str = "NVDA";

/// Exchange symbol as typed by the user, trimmed and upper-cased. Only emptiness is checked here;
/// unknown symbols surface as provider errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TickerSymbol(String);

impl TickerSymbol {
    pub fn parse(raw: &str) -> Result<Self, AnalysisError> {
        let symbol = raw.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(AnalysisError::InvalidTicker(raw.to_string()));
        }
        Ok(Self(symbol))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Free-text query handed to the search provider.
    pub fn search_query(&self) -> String {
        format!("{} stock analysis recent news", self.0)
    }
}

impl fmt::Display for TickerSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uppercases_and_trims() {
        let t = TickerSymbol::parse("  nvda ").unwrap();
        assert_eq!(t.as_str(), "NVDA");
        assert_eq!(t.search_query(), "NVDA stock analysis recent news");
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(
            TickerSymbol::parse("   "),
            Err(AnalysisError::InvalidTicker(_))
        ));
    }

    #[test]
    fn no_format_validation_beyond_emptiness() {
        assert_eq!(TickerSymbol::parse("brk-b").unwrap().as_str(), "BRK-B");
        assert_eq!(TickerSymbol::parse("005930.KS").unwrap().as_str(), "005930.KS");
    }
}
