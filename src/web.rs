use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::Method,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::error::PreviewError;
use crate::extract::types::MetadataRecord;
use crate::preview::{self, PreviewOpts};

#[derive(Clone)]
struct SharedState {
    config: Arc<Config>,
}

/// PreviewError wrapped for axum, carrying the dev flag that controls
/// whether raw diagnostics appear in the body.
struct HttpError {
    err: PreviewError,
    dev: bool,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        let status = axum::http::StatusCode::from_u16(self.err.status_code())
            .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            log::error!("{}: {}", self.err.label(), self.err);
        }

        let mut body = json!({
            "success": false,
            "error": self.err.label(),
            "message": self.err.to_string(),
        });
        if self.dev {
            body["details"] = json!(format!("{:?}", self.err));
        }

        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreviewRequest {
    pub url: Option<String>,
    /// Fetch timeout in milliseconds, clamped server-side.
    pub timeout: Option<u64>,
    /// "true" or "1" enables the supplementary structure fields.
    pub extended: Option<String>,
}

fn flag_enabled(value: Option<&str>) -> bool {
    matches!(value, Some("true") | Some("1"))
}

async fn preview(
    State(state): State<Arc<SharedState>>,
    payload: Result<Query<PreviewRequest>, QueryRejection>,
) -> Result<Json<MetadataRecord>, HttpError> {
    let dev = state.config.dev;

    // A malformed query string still gets the JSON error shape.
    let Query(payload) = payload.map_err(|rejection| HttpError {
        err: PreviewError::InvalidUrl(rejection.body_text()),
        dev,
    })?;

    log::debug!("payload: {payload:?}");
    let url = payload.url.clone().filter(|url| !url.is_empty()).ok_or(HttpError {
        err: PreviewError::InvalidUrl("missing required query parameter 'url'".to_string()),
        dev,
    })?;

    let opts = PreviewOpts {
        timeout_ms: payload.timeout,
        extended: flag_enabled(payload.extended.as_deref()),
    };

    let config = state.config.clone();
    tokio::task::block_in_place(move || {
        preview::fetch_preview(&url, &opts, &config)
            .map(Json)
            .map_err(|err| HttpError { err, dev })
    })
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        axum::http::StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "success": false,
            "error": "Method Not Allowed",
            "message": "only GET is supported",
        })),
    )
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn router(config: Arc<Config>) -> Router {
    let shared_state = Arc::new(SharedState { config });

    // Cross-origin GET from any origin, preflight included.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(health))
        .route("/api/preview", get(preview).fallback(method_not_allowed))
        .layer(cors)
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(shared_state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn start_app(config: Config) {
    let bind = config.bind.clone();
    let app = router(Arc::new(config));

    let listener = tokio::net::TcpListener::bind(&bind).await.unwrap();
    log::info!("listening on {bind}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

pub fn start_daemon(config: Config) {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(async { start_app(config).await });
}
