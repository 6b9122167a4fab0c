//! CSV export of processed analysis grids.
//!
//! Values are rendered the way the grids display them: fractions as
//! percentages (×100, two decimals), prices with two decimals, and an
//! empty cell wherever the pipeline produced no value.

use std::io::Write;

use analysis_core::AnalysisError;
use valuation_engine::{ProcessedBatch, ProcessedEarningAnalysis, ProcessedRevenueAnalysis};

/// Render an optional fraction as a percentage cell.
pub fn format_percent(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}%", v * 100.0))
        .unwrap_or_default()
}

/// Render an optional amount with two decimals.
pub fn format_amount(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

/// Write one processed earning page as CSV.
pub fn export_earning_csv<W: Write>(
    batch: &ProcessedBatch<ProcessedEarningAnalysis>,
    writer: W,
) -> Result<(), AnalysisError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .write_record([
            "ticker",
            "company_name",
            "period",
            "price",
            "pe",
            "roa",
            "eps_revision_grade",
            "eps_growth_0",
            "eps_growth_1",
            "eps_growth_2",
            "eps_growth_avg",
            "eps_ratio",
            "growth_valuation",
            "growth_valuation_price",
            "growth_profitability_valuation",
            "growth_profitability_valuation_price",
            "upside_potential",
        ])
        .map_err(|e| AnalysisError::ImportError(e.to_string()))?;

    for row in &batch.records {
        let analysis = &row.analysis;
        csv_writer
            .write_record([
                analysis.stock.ticker.clone(),
                analysis.stock.company_name.clone(),
                analysis.period.to_string(),
                format_amount(Some(analysis.price)),
                format_amount(Some(analysis.pe)),
                format_percent(Some(analysis.roa)),
                analysis.eps_revision_grade.to_string(),
                format_percent(row.eps_growth_0),
                format_percent(row.eps_growth_1),
                format_percent(row.eps_growth_2),
                format_percent(row.eps_growth_avg),
                format_amount(row.eps_ratio),
                format_amount(row.growth_valuation),
                format_amount(row.growth_valuation_price),
                format_amount(row.growth_profitability_valuation),
                format_amount(row.growth_profitability_valuation_price),
                format_percent(row.upside_potential),
            ])
            .map_err(|e| AnalysisError::ImportError(e.to_string()))?;
    }
    csv_writer
        .flush()
        .map_err(|e| AnalysisError::ImportError(e.to_string()))
}

/// Write one processed revenue page as CSV.
pub fn export_revenue_csv<W: Write>(
    batch: &ProcessedBatch<ProcessedRevenueAnalysis>,
    writer: W,
) -> Result<(), AnalysisError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .write_record([
            "ticker",
            "company_name",
            "period",
            "price",
            "ps",
            "operating_margin",
            "sales_growth_0",
            "sales_growth_1",
            "sales_growth_2",
            "sales_growth_avg",
            "psg_ratio",
            "growth_valuation",
            "growth_valuation_price",
            "growth_profitability_valuation",
            "growth_profitability_valuation_price",
            "upside_potential",
        ])
        .map_err(|e| AnalysisError::ImportError(e.to_string()))?;

    for row in &batch.records {
        let analysis = &row.analysis;
        csv_writer
            .write_record([
                analysis.stock.ticker.clone(),
                analysis.stock.company_name.clone(),
                analysis.period.to_string(),
                format_amount(Some(analysis.price)),
                format_amount(Some(analysis.ps)),
                format_percent(Some(analysis.operating_margin)),
                format_percent(row.sales_growth_0),
                format_percent(row.sales_growth_1),
                format_percent(row.sales_growth_2),
                format_percent(row.sales_growth_avg),
                format_amount(row.psg_ratio),
                format_amount(row.growth_valuation),
                format_amount(row.growth_valuation_price),
                format_amount(row.growth_profitability_valuation),
                format_amount(row.growth_profitability_valuation_price),
                format_percent(row.upside_potential),
            ])
            .map_err(|e| AnalysisError::ImportError(e.to_string()))?;
    }
    csv_writer
        .flush()
        .map_err(|e| AnalysisError::ImportError(e.to_string()))
}
