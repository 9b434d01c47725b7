use std::any::Any;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AllowedOrigins, Config};
use crate::error::ApiError;
use crate::models::{HealthResponse, InfoQuery, MemoryUsage, NormalizedResult};
use crate::normalize::normalize;
use crate::state::AppState;
use crate::validate::validate_url;

// ── Router ───────────────────────────────────────────────────────────────────

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();
    // Wrong methods on known paths answer like unknown paths.
    let routes = Router::new()
        .route("/info", get(info).fallback(not_found))
        .route("/download", get(download).fallback(not_found))
        .route("/health", get(health).fallback(not_found))
        .route("/ping", get(ping).fallback(not_found))
        .fallback(not_found)
        .with_state(state);
    with_middleware(routes, &config)
}

/// Panic recovery, CORS and request tracing, outermost last.
pub fn with_middleware(router: Router, config: &Config) -> Router {
    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &AllowedOrigins) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(AnyOrigin);

    match origins {
        AllowedOrigins::Any => layer.allow_origin(AnyOrigin),
        AllowedOrigins::List(list) => {
            let values: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(%origin, "ignoring unparsable CORS origin");
                        None
                    }
                })
                .collect();
            layer.allow_origin(AllowOrigin::list(values))
        }
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!(%detail, "handler panicked");
    ApiError::Unhandled.into_response()
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn info(
    State(state): State<AppState>,
    query: Result<Query<InfoQuery>, QueryRejection>,
) -> Result<Json<NormalizedResult>, ApiError> {
    lookup(&state, query).await
}

/// Older clients still call `/download`; same behaviour as `/info`.
async fn download(
    State(state): State<AppState>,
    query: Result<Query<InfoQuery>, QueryRejection>,
) -> Result<Json<NormalizedResult>, ApiError> {
    lookup(&state, query).await
}

async fn lookup(
    state: &AppState,
    query: Result<Query<InfoQuery>, QueryRejection>,
) -> Result<Json<NormalizedResult>, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        tracing::debug!(%rejection, "unreadable query string");
        ApiError::InvalidFormat
    })?;

    let url = validate_url(query.url.as_deref()).map_err(|e| {
        tracing::debug!(error = %e, "rejected url");
        ApiError::from(e)
    })?;

    tracing::info!(%url, "fetching media info");
    let body = state.upstream.fetch(url).await.map_err(|e| {
        tracing::warn!(%url, error = %e, "upstream call failed");
        ApiError::from(e)
    })?;

    let result = normalize(&body);
    if !result.success() {
        tracing::warn!(%url, "upstream response has no data object");
        return Err(ApiError::MalformedUpstreamResponse);
    }
    Ok(Json(result))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_secs(),
        memory: MemoryUsage {
            rss_bytes: resident_memory_bytes(),
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

async fn ping() -> impl IntoResponse {
    Json(json!({"status": "pong"}))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

// ── Process stats ────────────────────────────────────────────────────────────

#[cfg(target_os = "linux")]
fn resident_memory_bytes() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_vm_rss(&status)
}

#[cfg(not(target_os = "linux"))]
fn resident_memory_bytes() -> Option<u64> {
    None
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_vm_rss(status: &str) -> Option<u64> {
    let line = status.lines().find(|l| l.starts_with("VmRSS:"))?;
    let kib: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kib * 1024)
}

// ── Serving ──────────────────────────────────────────────────────────────────

pub async fn serve(state: AppState) -> std::io::Result<()> {
    let addr = state.config.socket_addr();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
