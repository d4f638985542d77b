use anyhow::{Context, Result};
use axum::{
    extract::{Json, State},
    response::Html,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use super::render;
use super::AppState;
use crate::catalog::{load_perfume_database, Perfume};
use crate::notes::{extract_notes, find_matching_perfumes};
use crate::util::preview;
use crate::TARGET_WEB_REQUEST;

const INDEX_PAGE: &str = include_str!("../../templates/index.html");

/// Request body for `/analyze_comment`.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// Either a single HTML message, or the extracted notes plus one HTML card per perfume.
#[derive(Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalyzeResponse {
    Matches {
        notes_html: String,
        perfumes: Vec<String>,
    },
    Reply {
        reply: String,
    },
}

impl AnalyzeResponse {
    fn reply(reply: String) -> Json<Self> {
        Json(AnalyzeResponse::Reply { reply })
    }
}

/// Service status, including build metadata.
#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    build_timestamp: Option<&'static str>,
    git_hash: Option<&'static str>,
    llm_configured: bool,
}

pub fn router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/", get(index))
        .route("/status", get(status_check))
        .route("/analyze_comment", post(analyze_comment))
        .nest_service("/static", static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured address and serves the API until the process is stopped.
pub async fn app_api_loop(state: AppState) -> Result<()> {
    let addr = format!("{}:{}", state.config.bind_address, state.config.port);
    let app = router(Arc::new(state));

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address {}", addr))?;

    info!(target: TARGET_WEB_REQUEST, "Server running on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .context("HTTP server terminated")?;

    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

async fn status_check(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "OK",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        build_timestamp: option_env!("BUILD_TIMESTAMP"),
        git_hash: option_env!("GIT_HASH"),
        llm_configured: state.llm_params.is_some(),
    })
}

/// Extracts notes from the posted comment and returns the matching perfumes.
///
/// Always answers 200; failures are reported as an HTML `reply` the page can show.
async fn analyze_comment(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AnalyzeRequest>,
) -> Json<AnalyzeResponse> {
    let Some(llm_params) = state.llm_params.as_ref() else {
        warn!(target: TARGET_WEB_REQUEST, "analyze_comment called without an LLM client");
        return AnalyzeResponse::reply(render::error_reply(
            "LLM client could not be established during application startup.",
        ));
    };

    let text = payload.text.unwrap_or_default();
    if text.trim().is_empty() {
        return AnalyzeResponse::reply(render::error_reply("Please enter a comment."));
    }

    info!(target: TARGET_WEB_REQUEST, "Analyzing comment: {}", preview(&text, 80));

    let user_notes = match extract_notes(&text, llm_params).await {
        Ok(notes) => notes,
        Err(e) => {
            error!(target: TARGET_WEB_REQUEST, "Note extraction failed: {:#}", e);
            return AnalyzeResponse::reply(render::api_error_reply(&e.to_string()));
        }
    };

    let database = load_perfume_database(&state.config.database_path);
    if database.is_empty() {
        return AnalyzeResponse::reply(render::error_reply(
            "Perfume database could not be loaded.",
        ));
    }

    Json(build_analysis_response(&user_notes, &database))
}

/// Builds the reply for a set of extracted notes against a loaded catalog.
pub fn build_analysis_response(user_notes: &[String], database: &[Perfume]) -> AnalyzeResponse {
    if user_notes.is_empty() {
        return AnalyzeResponse::Reply {
            reply: render::no_notes_reply(),
        };
    }

    let matching_perfumes = find_matching_perfumes(user_notes, database);
    info!(
        target: TARGET_WEB_REQUEST,
        "Notes {:?} matched {} perfumes",
        user_notes,
        matching_perfumes.len()
    );

    if matching_perfumes.is_empty() {
        return AnalyzeResponse::Reply {
            reply: render::no_match_reply(user_notes),
        };
    }

    AnalyzeResponse::Matches {
        notes_html: render::notes_html(user_notes),
        perfumes: matching_perfumes
            .iter()
            .map(|matched| render::perfume_item(matched, user_notes))
            .collect(),
    }
}
