use crate::cache::ResponseCache;
use crate::config::Config;
use crate::error::{EgographError, Result};
use crate::graph::{BuildOutcome, BuildParameters, GraphBuilder, GraphFormat};
use crate::notify::TelegramNotifier;
use crate::suggest::SuggestionSource;
use axum::{
    extract::{Query, State},
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE, HOST},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Ego graph HTTP server
///
/// Serves the web UI and builds graphs on `POST /?q=<term>&d=&r=&f=`.
pub struct EgographServer {
    state: AppState,
}

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    source: Arc<dyn SuggestionSource>,
    notifier: Arc<TelegramNotifier>,
    cache: Arc<ResponseCache>,
    shutdown: CancellationToken,
}

/// Query parameters of a graph request
#[derive(Debug, Default, Deserialize)]
struct GraphQuery {
    q: Option<String>,
    d: Option<String>,
    r: Option<String>,
    f: Option<String>,
}

impl EgographServer {
    pub fn new(
        config: Config,
        source: Arc<dyn SuggestionSource>,
        notifier: TelegramNotifier,
    ) -> Self {
        let cache = ResponseCache::new(config.server.cache_capacity, config.cache_ttl());
        Self {
            state: AppState {
                config: Arc::new(config),
                source,
                notifier: Arc::new(notifier),
                cache: Arc::new(cache),
                shutdown: CancellationToken::new(),
            },
        }
    }

    /// Cancelling this token stops the server and aborts in-flight builds.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.state.shutdown.clone()
    }

    /// Run the HTTP server until Ctrl-C or the shutdown token fires
    pub async fn run(&self) -> Result<()> {
        let server = &self.state.config.server;
        let addr = format!("{}:{}", server.host, server.port);

        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
            EgographError::Config(format!(
                "Failed to bind to {}: {}. Set server.port in config.toml to use another port.",
                addr, e
            ))
        })?;
        log::info!("HTTP server started at {}...", addr);

        let shutdown = self.shutdown_token();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        log::info!("...server closed.");
        Ok(())
    }

    /// Create the axum router
    pub fn router(&self) -> Router {
        let config = &self.state.config;
        let static_files = ServeDir::new(&config.server.static_dir);

        let cors = if config.server.allowed_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<HeaderValue> = config
                .server
                .allowed_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .route("/", post(handle_graph).get_service(static_files.clone()))
            .route("/health", get(handle_health))
            .fallback_service(static_files)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(cors)
                    .layer(SetResponseHeaderLayer::if_not_present(
                        CACHE_CONTROL,
                        cache_control(&self.state.cache),
                    )),
            )
            .with_state(self.state.clone())
    }
}

async fn shutdown_signal(token: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                log::error!("Failed to listen for Ctrl-C: {}", e);
            }
            log::info!("Shutdown requested");
            token.cancel();
        }
        _ = token.cancelled() => {}
    }
}

fn cache_control(cache: &ResponseCache) -> HeaderValue {
    HeaderValue::from_str(&format!("public, max-age={}", cache.ttl().as_secs()))
        .unwrap_or_else(|_| HeaderValue::from_static("public"))
}

/// `d`/`r` overrides: zero or unparsable values fall back to the default.
fn positive(value: Option<&str>) -> Option<u32> {
    value
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|&v| v > 0)
}

fn build_parameters(config: &Config, query: &GraphQuery, term: &str) -> BuildParameters {
    let defaults = &config.build;
    BuildParameters::new(term)
        .with_pattern(defaults.pattern.clone())
        .with_depth(positive(query.d.as_deref()).unwrap_or(defaults.depth))
        .with_radius(positive(query.r.as_deref()).unwrap_or(defaults.radius))
        .with_format(
            query
                .f
                .as_deref()
                .filter(|f| !f.is_empty())
                .unwrap_or(defaults.format.as_str()),
        )
}

fn cache_key(params: &BuildParameters) -> String {
    format!(
        "{}\u{1f}{}\u{1f}{}\u{1f}{}",
        params.query, params.depth, params.radius, params.format
    )
}

fn error_response(status: StatusCode, message: String) -> Response {
    (
        status,
        [(CACHE_CONTROL, HeaderValue::from_static("no-store"))],
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

fn json_response(body: String, cache: &ResponseCache) -> Response {
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (CACHE_CONTROL, cache_control(cache)),
        ],
        body,
    )
        .into_response()
}

/// Report the served query to the operator channel without waiting on it
fn notify_in_background(notifier: Arc<TelegramNotifier>, text: String) {
    if !notifier.is_enabled() {
        return;
    }
    tokio::spawn(async move {
        if let Err(e) = notifier.send(&text).await {
            log::warn!("Notification failed: {}", e);
        }
    });
}

/// Handle graph build requests
async fn handle_graph(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<GraphQuery>,
) -> Response {
    let term = match query.q.as_deref() {
        Some(q) if !q.is_empty() => q.to_string(),
        _ => {
            let err = EgographError::InvalidInput("missing query parameter 'q'".to_string());
            return error_response(StatusCode::BAD_REQUEST, err.to_string());
        }
    };

    let params = build_parameters(&state.config, &query, &term);
    if let Err(e) = params.format.parse::<GraphFormat>() {
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }

    let key = cache_key(&params);
    if let Some(body) = state.cache.get(&key) {
        log::debug!("Cache hit for '{}'", term);
        return json_response(body, &state.cache);
    }

    // only builds are reported
    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("<unknown host>");
    notify_in_background(state.notifier.clone(), format!("{} -> {}", host, term));

    let mut builder = GraphBuilder::new(params, state.source.clone())
        .with_timeout(state.config.build_timeout())
        .with_cancellation(state.shutdown.child_token());

    let outcome = match builder.build().await {
        Ok(outcome) => outcome,
        Err(EgographError::Cancelled) => {
            return error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "Server is shutting down".to_string(),
            )
        }
        Err(e) => {
            log::error!("Graph build for '{}' failed: {}", term, e);
            return error_response(StatusCode::BAD_GATEWAY, e.to_string());
        }
    };

    let body = match builder.to_result().and_then(|r| Ok(serde_json::to_string(&r)?)) {
        Ok(body) => body,
        Err(e) if e.is_configuration() => {
            return error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    // partial graphs from timed-out builds are served but not cached
    if outcome == BuildOutcome::Completed {
        state.cache.put(key, body.clone());
    }

    json_response(body, &state.cache)
}

/// Handle health check endpoint
async fn handle_health() -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "service": "egograph",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
        .into_response()
}
