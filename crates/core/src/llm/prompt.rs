use crate::domain::recommendation::RecommendationSet;
use crate::domain::stock::{NewsItem, StockSummary};
use crate::domain::ticker::TickerSymbol;

/// Upper bound on the stringified recommendations, in characters.
pub const MAX_RECOMMENDATIONS_CHARS: usize = 2_000;
const TRUNCATION_MARKER: &str = " …(truncated)";

/// Builds the analysis prompt. Pure: the same inputs always give the same string.
pub fn build_prompt(
    ticker: &TickerSymbol,
    summary: &StockSummary,
    recommendations: &RecommendationSet,
    news: &[NewsItem],
) -> String {
    let mut prompt = format!(
        "Provide a concise financial analysis for {ticker}:\n\n\
Stock Summary:\n\
- Name: {}\n\
- Sector: {}\n\
- Market Cap: {}\n\
- Current Price: {}\n\n\
Key Financial Highlights:\n\
{}\n",
        summary.name,
        summary.sector,
        summary.market_cap,
        summary.current_price,
        truncate_chars(&recommendations.to_string(), MAX_RECOMMENDATIONS_CHARS),
    );

    let headlines: Vec<&str> = news.iter().filter_map(NewsItem::title).collect();
    if !headlines.is_empty() {
        prompt.push_str("\nRecent Headlines:\n");
        for title in headlines {
            prompt.push_str("- ");
            prompt.push_str(title);
            prompt.push('\n');
        }
    }

    prompt.push_str(
        "\nPlease provide:\n\
1. Brief market sentiment\n\
2. Top 3 investment considerations\n\
3. Short-term outlook\n",
    );
    prompt
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &s[..cut]),
        None => s.to_string(),
    }
}
