//! Market-data proxy endpoints backed by the external quote service.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use analysis_core::{PriceBar, QuoteSnapshot};

use crate::{ApiResponse, AppError, AppState};

const DEFAULT_HISTORY_DAYS: u32 = 7;
const MAX_HISTORY_DAYS: u32 = 365;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub ticker: String,
    pub days: u32,
    pub bars: Vec<PriceBar>,
}

pub fn market_routes() -> Router<AppState> {
    Router::new()
        .route("/api/market/quote/:ticker", get(get_quote))
        .route("/api/market/history/:ticker", get(get_history))
}

async fn get_quote(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<ApiResponse<QuoteSnapshot>>, AppError> {
    let quote = state.market.quote(&ticker).await?;
    Ok(Json(ApiResponse::success(quote)))
}

async fn get_history(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<HistoryResponse>>, AppError> {
    let days = query
        .days
        .unwrap_or(DEFAULT_HISTORY_DAYS)
        .clamp(1, MAX_HISTORY_DAYS);
    let bars = state.market.history(&ticker, days).await?;
    Ok(Json(ApiResponse::success(HistoryResponse {
        ticker: ticker.to_uppercase(),
        days,
        bars,
    })))
}
