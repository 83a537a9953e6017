use anyhow::{Context, Result};
use kwhquery::{config::Credentials, Config, Orchestrator, Table};
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, env, fs::File, path::PathBuf, sync::Arc, time::Instant};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};
use warp::{
    http::StatusCode,
    reject::Rejection,
    reply::{self, Reply},
    Filter,
};

const MAX_BODY_BYTES: u64 = 16 * 1024;

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
}

/// `gemini_recommendations` carries the narrative text from whichever
/// backend is configured, or null when narration is off.
#[derive(Serialize)]
struct QueryResponse {
    tapas_answer: String,
    gemini_recommendations: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Loaded once at startup; read-only afterwards.
struct AppState {
    table: Table,
    orchestrator: Orchestrator,
    credentials: Credentials,
}

async fn health_check() -> Result<impl Reply, Rejection> {
    Ok(reply::json(&serde_json::json!({
        "status": "healthy",
        "service": "kwhquery"
    })))
}

async fn handle_query(req: QueryRequest, state: Arc<AppState>) -> Result<impl Reply, Rejection> {
    let start = Instant::now();
    info!("query: {:?}", req.query);

    match state
        .orchestrator
        .answer_query(&state.table, &req.query, &state.credentials)
        .await
    {
        Ok(outcome) => {
            info!(
                "answered {} in {:.3}s",
                outcome.quantity,
                start.elapsed().as_secs_f64()
            );
            Ok(reply::with_status(
                reply::json(&QueryResponse {
                    tapas_answer: outcome.quantity.to_string(),
                    gemini_recommendations: outcome.narrative,
                }),
                StatusCode::OK,
            ))
        }
        Err(e) => {
            let status = if e.is_caller_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            warn!(
                "query failed after {:.3}s ({}): {}",
                start.elapsed().as_secs_f64(),
                status,
                e
            );
            Ok(reply::with_status(
                reply::json(&ErrorResponse {
                    error: e.to_string(),
                }),
                status,
            ))
        }
    }
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) =
        if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
            (StatusCode::BAD_REQUEST, format!("invalid request body: {}", e))
        } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
            (StatusCode::BAD_REQUEST, "expected a JSON body".to_string())
        } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
            (StatusCode::PAYLOAD_TOO_LARGE, "request body too large".to_string())
        } else if err.is_not_found() {
            (StatusCode::NOT_FOUND, "not found".to_string())
        } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
            (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
        } else {
            warn!("unhandled rejection: {:?}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
        };

    Ok(reply::with_status(
        reply::json(&ErrorResponse { error: message }),
        status,
    ))
}

fn routes(
    state: Arc<AppState>,
    static_dir: PathBuf,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    // Health check endpoint
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(health_check);

    // Query endpoint, at the root (static/js/scripts.js posts here) and at /query
    let with_state = warp::any().map(move || state.clone());
    let query = warp::path::end()
        .or(warp::path("query").and(warp::path::end()))
        .unify()
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_state)
        .and_then(handle_query);

    // Everything else: static assets (GET/HEAD only)
    let assets = warp::fs::dir(static_dir);

    health.or(query).or(assets).recover(handle_rejection)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(log_level.parse().unwrap_or(Level::INFO.into())),
        )
        .init();

    if let Err(e) = dotenv::dotenv() {
        info!("no .env loaded: {}", e);
    }
    let config = Config::from_env().context("reading configuration")?;

    let file = File::open(&config.data_path)
        .with_context(|| format!("opening {}", config.data_path.display()))?;
    let table = Table::from_reader(file)
        .with_context(|| format!("parsing {}", config.data_path.display()))?;
    info!(
        "loaded {} ({} columns, {} rows)",
        config.data_path.display(),
        table.num_columns(),
        table.num_rows()
    );

    let orchestrator = Orchestrator::from_config(&config)?;
    if config
        .credentials
        .get(kwhquery::config::Credential::HuggingFace)
        .is_none()
    {
        warn!("HUGGINGFACE_TOKEN is not set; every query will fail");
    }

    let state = Arc::new(AppState {
        table,
        orchestrator,
        credentials: config.credentials.clone(),
    });

    info!("Server starting on port {}", config.port);
    info!("Health check: http://localhost:{}/health", config.port);
    info!("Query endpoint: POST http://localhost:{}/", config.port);

    warp::serve(routes(state, config.static_dir.clone()))
        .run(([0, 0, 0, 0], config.port))
        .await;

    Ok(())
}
