//! REST surface for the analysis workspace.
//!
//! Handlers fetch a page from the in-memory store, run the valuation
//! pipelines over it, and return the augmented records. Writes apply the
//! same validation and duplicate rules as the bulk upload screen.

pub mod catalog_routes;
pub mod display;
pub mod earning_routes;
pub mod growth_routes;
pub mod market_routes;
pub mod revenue_routes;
pub mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use analysis_core::{AnalysisError, MarketDataSource, ValidationError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use quote_client::QuoteClient;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use store::RecordStore;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub market: Arc<dyn MarketDataSource>,
}

/// Uniform JSON envelope for every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Handler-level error with an HTTP status. Domain errors map onto 4xx;
/// anything unexpected is logged and returned as a plain 500.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(anyhow::Error),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::NotFound(message) => Self::NotFound(message),
            AnalysisError::Duplicate(message) => Self::Conflict(message),
            AnalysisError::InvalidData(message) | AnalysisError::ImportError(message) => {
                Self::BadRequest(message)
            }
            other => Self::Internal(other.into()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::Conflict(message) => (StatusCode::CONFLICT, message),
            Self::Internal(err) => {
                tracing::error!("request failed: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

/// Pagination envelope for the analysis grids.
#[derive(Debug, Serialize)]
pub struct Paged<T> {
    /// Calendar years backing the +0/+1/+2 growth columns of this page.
    pub years: Vec<i32>,
    pub records: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
}

pub(crate) const DEFAULT_PAGE_SIZE: usize = 50;
pub(crate) const MAX_PAGE_SIZE: usize = 200;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .merge(catalog_routes::catalog_routes())
        .merge(earning_routes::earning_routes())
        .merge(revenue_routes::revenue_routes())
        .merge(growth_routes::growth_routes())
        .merge(market_routes::market_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("ok"))
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let store = match std::env::var("SEED_FILE") {
        Ok(path) => {
            tracing::info!("seeding record store from {}", path);
            RecordStore::from_seed_file(&path)?
        }
        Err(_) => RecordStore::new(),
    };

    let state = AppState {
        store: Arc::new(store),
        market: Arc::new(QuoteClient::from_env()),
    };

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3001".to_string())
        .parse()?;
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}
