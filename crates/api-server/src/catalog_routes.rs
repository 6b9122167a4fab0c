//! Sector and stock master-data endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use analysis_core::{NewSector, NewStock, Sector, Stock};

use crate::store::StockView;
use crate::{ApiResponse, AppError, AppState};

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sectors", get(list_sectors).post(create_sector))
        .route("/api/stocks", get(list_stocks).post(create_stock))
}

async fn list_sectors(State(state): State<AppState>) -> Json<ApiResponse<Vec<Sector>>> {
    Json(ApiResponse::success(state.store.sectors().await))
}

async fn create_sector(
    State(state): State<AppState>,
    Json(new): Json<NewSector>,
) -> Result<(StatusCode, Json<ApiResponse<Sector>>), AppError> {
    let sector = state.store.insert_sector(new).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(sector))))
}

async fn list_stocks(State(state): State<AppState>) -> Json<ApiResponse<Vec<StockView>>> {
    Json(ApiResponse::success(state.store.stocks().await))
}

async fn create_stock(
    State(state): State<AppState>,
    Json(new): Json<NewStock>,
) -> Result<(StatusCode, Json<ApiResponse<Stock>>), AppError> {
    let stock = state.store.insert_stock(new).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(stock))))
}
