//! HTTP server implementation for the API

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{header, Method, StatusCode},
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;

use super::{handlers, models::ApiResponse};
use crate::config::Config;
use crate::library::Library;
use crate::state::{ReaderState, Route};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub reader: Arc<RwLock<ReaderState>>,
    pub library: Library,
    pub config: Arc<Config>,
}

/// Build the router with all routes and middleware
pub fn router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let data_dir = app_state.config.data.data_dir.clone();
    let static_dir = app_state.config.server.static_dir.clone();

    let mut app = Router::new()
        // Health check endpoints (both paths for compatibility)
        .route("/health", get(health_handler))
        .route("/api/health", get(health_handler))

        // Rendered pages
        .route("/", get(toc_page_handler))
        .route("/chapter/:id", get(chapter_page_handler))

        // JSON endpoints
        .route("/api/chapters", get(list_chapters_handler))
        .route("/api/chapters/:id", get(chapter_handler))
        .route("/api/tooltips", get(tooltips_handler))
        .route("/api/reload", post(reload_handler))

        // Raw chapter data for the browser
        .nest_service("/data", ServeDir::new(data_dir));

    if let Some(static_dir) = static_dir {
        app = app.nest_service("/static", ServeDir::new(static_dir));
    }

    app.with_state(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    )
}

/// Configure and start the HTTP server
pub async fn start_http_server(reader: Arc<RwLock<ReaderState>>, library: Library, config: Arc<Config>) -> Result<()> {
    let port = config.server.port;
    info!("🚀 Starting HTTP server on port {}", port);

    let app = router(AppState { reader, library, config });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("🌐 Reader listening on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check handler
async fn health_handler() -> impl IntoResponse {
    match handlers::health_check().await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => {
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            (status, Json(serde_json::json!({"error": e.to_string()}))).into_response()
        }
    }
}

/// Table of contents page handler
async fn toc_page_handler(State(state): State<AppState>) -> impl IntoResponse {
    match handlers::render_page(&state.reader, &Route::Toc).await {
        Ok(html) => (StatusCode::OK, Html(html)).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Chapter page handler
async fn chapter_page_handler(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match handlers::render_page(&state.reader, &Route::Chapter(id)).await {
        Ok(html) => (StatusCode::OK, Html(html)).into_response(),
        Err(e) => (StatusCode::NOT_FOUND, e.to_string()).into_response(),
    }
}

/// List chapters handler
async fn list_chapters_handler(State(state): State<AppState>) -> impl IntoResponse {
    match handlers::list_chapters(&state.reader).await {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::success(data))).into_response(),
        Err(e) => {
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            (status, Json(ApiResponse::<()>::error(e.to_string()))).into_response()
        }
    }
}

/// Chapter detail handler
async fn chapter_handler(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match handlers::get_chapter(&state.reader, &id).await {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::success(data))).into_response(),
        Err(e) => {
            let status = StatusCode::NOT_FOUND;
            (status, Json(ApiResponse::<()>::error(e.to_string()))).into_response()
        }
    }
}

/// Tooltip table handler
async fn tooltips_handler(State(state): State<AppState>) -> impl IntoResponse {
    match handlers::get_tooltips(&state.reader).await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => {
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            (status, Json(serde_json::json!({"error": e.to_string()}))).into_response()
        }
    }
}

/// Reload handler
async fn reload_handler(State(state): State<AppState>) -> impl IntoResponse {
    match handlers::reload(&state.reader, &state.library, &state.config).await {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::success(data))).into_response(),
        Err(e) => {
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            (status, Json(ApiResponse::<()>::error(e.to_string()))).into_response()
        }
    }
}
