use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use analyst_core::config::Settings;
use analyst_core::domain::ticker::DEFAULT_TICKER;
use analyst_core::pipeline::{self, AnalysisOutcome, AnalysisRequest};

mod view;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;
    if settings.groq_api_key.is_none() {
        tracing::info!("GROQ_API_KEY not set; the key must be entered on the page");
    }

    let state = AppState {
        settings: Arc::new(settings),
    };

    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "web ui listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/analyze", post(analyze_form))
        .route("/api/analyze", post(analyze_json))
        .route("/healthz", get(healthz))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[derive(Clone)]
struct AppState {
    settings: Arc<Settings>,
}

async fn healthz() -> &'static str {
    "ok"
}

async fn index() -> Response {
    render(&view::IndexPage::empty(DEFAULT_TICKER))
}

#[derive(Debug, Deserialize)]
struct AnalyzeForm {
    #[serde(default)]
    ticker: String,
    #[serde(default)]
    api_key: String,
}

async fn analyze_form(State(state): State<AppState>, Form(form): Form<AnalyzeForm>) -> Response {
    let request = AnalysisRequest {
        ticker: form.ticker,
        api_key: Some(form.api_key),
    };
    let outcome = pipeline::analyze(&state.settings, &request).await;
    render(&view::IndexPage::from_outcome(&outcome))
}

async fn analyze_json(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Json<AnalysisOutcome> {
    Json(pipeline::analyze(&state.settings, &request).await)
}

fn render<T: askama::Template>(template: &T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "template render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "template error").into_response()
        }
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
