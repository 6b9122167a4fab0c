//! Growth-series endpoints for both the EPS and sales series.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use analysis_core::NewGrowthEntry;
use bulk_import::{screen_growth_rows, GrowthRow, ImportContext, ImportReport};

use crate::store::{GrowthEntryView, GrowthKind};
use crate::{ApiResponse, AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct GrowthQuery {
    pub stock_id: Option<i64>,
    pub period: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct BulkGrowthRequest {
    pub entries: Vec<GrowthRow>,
}

pub fn growth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/eps-growth",
            get(list_eps_growth).post(create_eps_growth),
        )
        .route("/api/eps-growth/bulk", post(bulk_upload_eps_growth))
        .route(
            "/api/sales-growth",
            get(list_sales_growth).post(create_sales_growth),
        )
        .route("/api/sales-growth/bulk", post(bulk_upload_sales_growth))
}

async fn list_growth(
    state: AppState,
    kind: GrowthKind,
    query: GrowthQuery,
) -> Json<ApiResponse<Vec<GrowthEntryView>>> {
    let entries = state
        .store
        .fetch_growth(kind, query.stock_id, query.period, query.year)
        .await;
    Json(ApiResponse::success(entries))
}

async fn create_growth(
    state: AppState,
    kind: GrowthKind,
    new: NewGrowthEntry,
) -> Result<(StatusCode, Json<ApiResponse<GrowthEntryView>>), AppError> {
    let stored = state.store.insert_growth_entry(kind, new).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(stored))))
}

async fn bulk_upload_growth(
    state: AppState,
    kind: GrowthKind,
    request: BulkGrowthRequest,
) -> Result<Json<ApiResponse<ImportReport>>, AppError> {
    if request.entries.is_empty() {
        return Err(AppError::BadRequest(
            "Entries array is required and must not be empty".to_string(),
        ));
    }

    let context = ImportContext {
        stock_ids: state.store.ticker_index().await,
        existing_analyses: Default::default(),
        existing_growth: state.store.growth_keys(kind).await,
    };
    let (accepted, report) = screen_growth_rows(&request.entries, &context);
    state.store.insert_growth_bulk(kind, accepted).await;
    Ok(Json(ApiResponse::success(report)))
}

async fn list_eps_growth(
    State(state): State<AppState>,
    Query(query): Query<GrowthQuery>,
) -> Json<ApiResponse<Vec<GrowthEntryView>>> {
    list_growth(state, GrowthKind::Eps, query).await
}

async fn create_eps_growth(
    State(state): State<AppState>,
    Json(new): Json<NewGrowthEntry>,
) -> Result<(StatusCode, Json<ApiResponse<GrowthEntryView>>), AppError> {
    create_growth(state, GrowthKind::Eps, new).await
}

async fn bulk_upload_eps_growth(
    State(state): State<AppState>,
    Json(request): Json<BulkGrowthRequest>,
) -> Result<Json<ApiResponse<ImportReport>>, AppError> {
    bulk_upload_growth(state, GrowthKind::Eps, request).await
}

async fn list_sales_growth(
    State(state): State<AppState>,
    Query(query): Query<GrowthQuery>,
) -> Json<ApiResponse<Vec<GrowthEntryView>>> {
    list_growth(state, GrowthKind::Sales, query).await
}

async fn create_sales_growth(
    State(state): State<AppState>,
    Json(new): Json<NewGrowthEntry>,
) -> Result<(StatusCode, Json<ApiResponse<GrowthEntryView>>), AppError> {
    create_growth(state, GrowthKind::Sales, new).await
}

async fn bulk_upload_sales_growth(
    State(state): State<AppState>,
    Json(request): Json<BulkGrowthRequest>,
) -> Result<Json<ApiResponse<ImportReport>>, AppError> {
    bulk_upload_growth(state, GrowthKind::Sales, request).await
}
