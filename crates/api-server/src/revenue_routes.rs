//! Revenue-analysis endpoints. Same surface as the earning side, P/S-driven.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use analysis_core::{validate_revenue_fields, NewRevenueAnalysis, RevenueAnalysis};
use bulk_import::{
    export_revenue_csv, screen_revenue_rows, ImportContext, ImportReport, RevenueAnalysisRow,
};
use valuation_engine::{process_revenue_batch, ProcessedRevenueAnalysis};

use crate::earning_routes::{page_bounds, page_slice};
use crate::{ApiResponse, AppError, AppState, Paged};

#[derive(Debug, Deserialize)]
pub struct AnalysisQuery {
    pub stock_id: Option<i64>,
    pub period: Option<u32>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct BulkRevenueRequest {
    pub analyses: Vec<RevenueAnalysisRow>,
}

pub fn revenue_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/revenue-analysis",
            get(list_revenue_analyses).post(create_revenue_analysis),
        )
        .route("/api/revenue-analysis/bulk", post(bulk_upload_revenue))
        .route("/api/revenue-analysis/export", get(export_revenue))
}

async fn list_revenue_analyses(
    State(state): State<AppState>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<ApiResponse<Paged<ProcessedRevenueAnalysis>>>, AppError> {
    let analyses = state
        .store
        .fetch_revenue_analyses(query.stock_id, query.period)
        .await;
    let (page, page_size) = page_bounds(query.page, query.page_size);
    let (page_records, total) = page_slice(analyses, page, page_size);
    let processed = process_revenue_batch(&page_records);

    Ok(Json(ApiResponse::success(Paged {
        years: processed.years,
        records: processed.records,
        page,
        page_size,
        total,
        total_pages: total.div_ceil(page_size).max(1),
    })))
}

async fn create_revenue_analysis(
    State(state): State<AppState>,
    Json(new): Json<NewRevenueAnalysis>,
) -> Result<(StatusCode, Json<ApiResponse<RevenueAnalysis>>), AppError> {
    validate_revenue_fields(
        new.price,
        new.ps,
        new.operating_margin,
        new.sales_growth_adjusted_rate,
    )?;
    let stored = state.store.insert_revenue_analysis(new).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(stored))))
}

async fn bulk_upload_revenue(
    State(state): State<AppState>,
    Json(request): Json<BulkRevenueRequest>,
) -> Result<Json<ApiResponse<ImportReport>>, AppError> {
    if request.analyses.is_empty() {
        return Err(AppError::BadRequest(
            "Analyses array is required and must not be empty".to_string(),
        ));
    }

    let context = ImportContext {
        stock_ids: state.store.ticker_index().await,
        existing_analyses: state.store.revenue_keys().await,
        existing_growth: Default::default(),
    };
    let (accepted, report) = screen_revenue_rows(&request.analyses, &context);
    state.store.insert_revenue_bulk(accepted).await;
    Ok(Json(ApiResponse::success(report)))
}

async fn export_revenue(
    State(state): State<AppState>,
    Query(query): Query<AnalysisQuery>,
) -> Result<([(axum::http::HeaderName, &'static str); 2], String), AppError> {
    let analyses = state
        .store
        .fetch_revenue_analyses(query.stock_id, query.period)
        .await;
    let processed = process_revenue_batch(&analyses);

    let mut out = Vec::new();
    export_revenue_csv(&processed, &mut out)?;
    let body = String::from_utf8(out).map_err(|e| AppError::Internal(e.into()))?;
    Ok((
        [
            (axum::http::header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                axum::http::header::CONTENT_DISPOSITION,
                "attachment; filename=\"revenue_analysis.csv\"",
            ),
        ],
        body,
    ))
}
