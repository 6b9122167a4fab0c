//! Earning-analysis endpoints: paginated processed reads, single create,
//! bulk upload, CSV export.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use analysis_core::{validate_earning_fields, EarningAnalysis, NewEarningAnalysis};
use bulk_import::{
    export_earning_csv, screen_earning_rows, EarningAnalysisRow, ImportContext, ImportReport,
};
use valuation_engine::{process_earning_batch, ProcessedEarningAnalysis};

use crate::{ApiResponse, AppError, AppState, Paged, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[derive(Debug, Deserialize)]
pub struct AnalysisQuery {
    pub stock_id: Option<i64>,
    pub period: Option<u32>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct BulkEarningRequest {
    pub analyses: Vec<EarningAnalysisRow>,
}

pub fn earning_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/earning-analysis",
            get(list_earning_analyses).post(create_earning_analysis),
        )
        .route("/api/earning-analysis/bulk", post(bulk_upload_earning))
        .route("/api/earning-analysis/export", get(export_earning))
}

pub(crate) fn page_bounds(page: Option<usize>, page_size: Option<usize>) -> (usize, usize) {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, page_size)
}

pub(crate) fn page_slice<T>(items: Vec<T>, page: usize, page_size: usize) -> (Vec<T>, usize) {
    let total = items.len();
    let slice = items
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();
    (slice, total)
}

/// One grid page: filter, order, paginate, then run the valuation pipeline
/// over exactly the records being displayed. The growth-year columns are
/// chosen per page, so every row of a page shares them.
async fn list_earning_analyses(
    State(state): State<AppState>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<ApiResponse<Paged<ProcessedEarningAnalysis>>>, AppError> {
    let analyses = state
        .store
        .fetch_earning_analyses(query.stock_id, query.period)
        .await;
    let (page, page_size) = page_bounds(query.page, query.page_size);
    let (page_records, total) = page_slice(analyses, page, page_size);
    let processed = process_earning_batch(&page_records);

    Ok(Json(ApiResponse::success(Paged {
        years: processed.years,
        records: processed.records,
        page,
        page_size,
        total,
        total_pages: total.div_ceil(page_size).max(1),
    })))
}

async fn create_earning_analysis(
    State(state): State<AppState>,
    Json(new): Json<NewEarningAnalysis>,
) -> Result<(StatusCode, Json<ApiResponse<EarningAnalysis>>), AppError> {
    validate_earning_fields(new.price, new.pe, new.roa)?;
    let stored = state.store.insert_earning_analysis(new).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(stored))))
}

async fn bulk_upload_earning(
    State(state): State<AppState>,
    Json(request): Json<BulkEarningRequest>,
) -> Result<Json<ApiResponse<ImportReport>>, AppError> {
    if request.analyses.is_empty() {
        return Err(AppError::BadRequest(
            "Analyses array is required and must not be empty".to_string(),
        ));
    }

    let context = ImportContext {
        stock_ids: state.store.ticker_index().await,
        existing_analyses: state.store.earning_keys().await,
        existing_growth: Default::default(),
    };
    let (accepted, report) = screen_earning_rows(&request.analyses, &context);
    state.store.insert_earning_bulk(accepted).await;
    Ok(Json(ApiResponse::success(report)))
}

/// Whole filtered grid as CSV, formatted the way the grid displays it.
async fn export_earning(
    State(state): State<AppState>,
    Query(query): Query<AnalysisQuery>,
) -> Result<([(axum::http::HeaderName, &'static str); 2], String), AppError> {
    let analyses = state
        .store
        .fetch_earning_analyses(query.stock_id, query.period)
        .await;
    let processed = process_earning_batch(&analyses);

    let mut out = Vec::new();
    export_earning_csv(&processed, &mut out)?;
    let body = String::from_utf8(out).map_err(|e| AppError::Internal(e.into()))?;
    Ok((
        [
            (axum::http::header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                axum::http::header::CONTENT_DISPOSITION,
                "attachment; filename=\"earning_analysis.csv\"",
            ),
        ],
        body,
    ))
}
