use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use analyst_core::domain::ticker::DEFAULT_TICKER;
use analyst_core::pipeline::{self, AnalysisOutcome, AnalysisRequest, NoticeLevel};

#[derive(Debug, Parser)]
#[command(name = "analyst", about = "AI-assisted stock analysis from the terminal")]
struct Args {
    /// Stock ticker to analyze.
    #[arg(long, short, default_value = DEFAULT_TICKER)]
    ticker: String,

    /// Groq API key. Falls back to GROQ_API_KEY (a local .env is loaded first).
    #[arg(long)]
    api_key: Option<String>,

    /// Print the whole outcome as JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let settings = analyst_core::config::Settings::from_env()?;

    let request = AnalysisRequest {
        ticker: args.ticker,
        api_key: args.api_key,
    };
    let outcome = pipeline::analyze(&settings, &request).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_text(&outcome);
    }

    Ok(if outcome.is_failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn print_text(outcome: &AnalysisOutcome) {
    for notice in &outcome.notices {
        let tag = match notice.level {
            NoticeLevel::Error => "error",
            NoticeLevel::Warning => "warning",
        };
        eprintln!("{tag}: {}", notice.message);
    }

    if let Some(report) = &outcome.analysis {
        println!("## Comprehensive Analysis for {}\n", outcome.ticker);
        println!("{}\n", report.text.trim_end());
    }

    let Some(market) = &outcome.market else {
        return;
    };

    println!("## Stock Summary\n");
    for (label, value) in market.summary.rows() {
        println!("- {label}: {value}");
    }
    println!("\nRecommendations: {}", market.recommendations);
    if !market.news.is_empty() {
        println!("\nRecent News:");
        for item in &market.news {
            println!("- {}", item.title().unwrap_or("Untitled"));
        }
    }

    println!("\n## Additional Web Insights\n");
    for result in &outcome.search_results {
        println!("**{}**", result.display_title());
        println!("{}", result.display_body());
        if let Some(link) = &result.link {
            println!("Source: {link}");
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_nvda_text_output() {
        let args = Args::try_parse_from(["analyst"]).unwrap();
        assert_eq!(args.ticker, "NVDA");
        assert!(args.api_key.is_none());
        assert!(!args.json);
    }

    #[test]
    fn accepts_ticker_key_and_json() {
        let args =
            Args::try_parse_from(["analyst", "-t", "aapl", "--api-key", "gsk_x", "--json"]).unwrap();
        assert_eq!(args.ticker, "aapl");
        assert_eq!(args.api_key.as_deref(), Some("gsk_x"));
        assert!(args.json);
    }
}
