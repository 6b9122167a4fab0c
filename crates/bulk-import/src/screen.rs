//! Row screening: validate each upload row independently and tally the
//! outcome. One bad row never sinks the batch.

use std::collections::{HashMap, HashSet};

use analysis_core::{
    parse_grade, validate_earning_fields, validate_revenue_fields, NewEarningAnalysis,
    NewGrowthEntry, NewRevenueAnalysis, Stock, ValidationError,
};
use serde::Serialize;

use crate::rows::{EarningAnalysisRow, GrowthRow, RevenueAnalysisRow};

/// Lookup state the screen needs from the store: ticker resolution plus the
/// duplicate keys of everything already persisted.
#[derive(Debug, Clone, Default)]
pub struct ImportContext {
    /// Uppercased ticker -> stock id.
    pub stock_ids: HashMap<String, i64>,
    /// Existing (stock, period) analysis keys for the variant being loaded.
    pub existing_analyses: HashSet<(i64, u32)>,
    /// Existing (stock, period, year) growth keys for the series being loaded.
    pub existing_growth: HashSet<(i64, u32, i32)>,
}

impl ImportContext {
    pub fn with_stocks<'a, I>(stocks: I) -> Self
    where
        I: IntoIterator<Item = &'a Stock>,
    {
        Self {
            stock_ids: stocks
                .into_iter()
                .map(|s| (s.ticker.to_uppercase(), s.id))
                .collect(),
            ..Self::default()
        }
    }

    pub fn resolve_ticker(&self, ticker: &str) -> Option<i64> {
        self.stock_ids.get(&ticker.trim().to_uppercase()).copied()
    }
}

/// Per-row failure in a bulk upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    /// 1-based data-row number (header not counted).
    pub row: usize,
    pub ticker: String,
    pub error: String,
}

/// Success/error tally for one bulk upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub total: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub errors: Vec<RowError>,
}

fn screen_rows<'a, R, T>(
    rows: &'a [R],
    ticker_of: impl Fn(&R) -> &str,
    mut screen_one: impl FnMut(&'a R) -> Result<T, String>,
) -> (Vec<T>, ImportReport) {
    let mut accepted = Vec::new();
    let mut report = ImportReport {
        total: rows.len(),
        ..ImportReport::default()
    };
    for (index, row) in rows.iter().enumerate() {
        match screen_one(row) {
            Ok(new) => {
                accepted.push(new);
                report.success_count += 1;
            }
            Err(error) => {
                report.error_count += 1;
                report.errors.push(RowError {
                    row: index + 1,
                    ticker: ticker_of(row).to_string(),
                    error,
                });
            }
        }
    }
    (accepted, report)
}

fn resolve_row_stock(
    context: &ImportContext,
    ticker: &str,
    period: i64,
) -> Result<(i64, u32), String> {
    if ticker.trim().is_empty() {
        return Err(ValidationError::EmptyTicker.to_string());
    }
    if period < 0 {
        return Err(ValidationError::InvalidPeriod.to_string());
    }
    let stock_id = context
        .resolve_ticker(ticker)
        .ok_or_else(|| format!("Stock with ticker '{ticker}' not found"))?;
    Ok((stock_id, period as u32))
}

/// Screen earning rows against the context and each other. Returns the
/// accepted write shapes alongside the full tally.
pub fn screen_earning_rows(
    rows: &[EarningAnalysisRow],
    context: &ImportContext,
) -> (Vec<NewEarningAnalysis>, ImportReport) {
    let mut seen: HashSet<(i64, u32)> = HashSet::new();
    let (accepted, report) = screen_rows(
        rows,
        |row| row.ticker.as_str(),
        |row| {
            let (stock_id, period) = resolve_row_stock(context, &row.ticker, row.period)?;
            let grade = parse_grade(&row.eps_revision_grade).map_err(|e| e.to_string())?;
            validate_earning_fields(row.price, row.pe, row.roa).map_err(|e| e.to_string())?;
            let key = (stock_id, period);
            if context.existing_analyses.contains(&key) || !seen.insert(key) {
                return Err(format!(
                    "Analysis for {} in period {} already exists",
                    row.ticker.trim().to_uppercase(),
                    period
                ));
            }
            Ok(NewEarningAnalysis {
                stock_id,
                period,
                price: row.price,
                pe: row.pe,
                roa: row.roa,
                eps_revision_grade: grade,
                eps_growth_adjusted_rate: row.eps_growth_adjusted_rate,
            })
        },
    );
    if report.error_count > 0 {
        tracing::warn!(
            rejected = report.error_count,
            total = report.total,
            "earning bulk upload rejected rows"
        );
    }
    (accepted, report)
}

/// Revenue twin of [`screen_earning_rows`].
pub fn screen_revenue_rows(
    rows: &[RevenueAnalysisRow],
    context: &ImportContext,
) -> (Vec<NewRevenueAnalysis>, ImportReport) {
    let mut seen: HashSet<(i64, u32)> = HashSet::new();
    let (accepted, report) = screen_rows(
        rows,
        |row| row.ticker.as_str(),
        |row| {
            let (stock_id, period) = resolve_row_stock(context, &row.ticker, row.period)?;
            validate_revenue_fields(
                row.price,
                row.ps,
                row.operating_margin,
                row.sales_growth_adjusted_rate,
            )
            .map_err(|e| e.to_string())?;
            let key = (stock_id, period);
            if context.existing_analyses.contains(&key) || !seen.insert(key) {
                return Err(format!(
                    "Analysis for {} in period {} already exists",
                    row.ticker.trim().to_uppercase(),
                    period
                ));
            }
            Ok(NewRevenueAnalysis {
                stock_id,
                period,
                price: row.price,
                ps: row.ps,
                operating_margin: row.operating_margin,
                sales_growth_adjusted_rate: row.sales_growth_adjusted_rate,
            })
        },
    );
    if report.error_count > 0 {
        tracing::warn!(
            rejected = report.error_count,
            total = report.total,
            "revenue bulk upload rejected rows"
        );
    }
    (accepted, report)
}

/// Screen growth-series rows. The duplicate key here is (stock, period, year).
pub fn screen_growth_rows(
    rows: &[GrowthRow],
    context: &ImportContext,
) -> (Vec<NewGrowthEntry>, ImportReport) {
    let mut seen: HashSet<(i64, u32, i32)> = HashSet::new();
    screen_rows(
        rows,
        |row| row.ticker.as_str(),
        |row| {
            let (stock_id, period) = resolve_row_stock(context, &row.ticker, row.period)?;
            let key = (stock_id, period, row.year);
            if context.existing_growth.contains(&key) || !seen.insert(key) {
                return Err(format!(
                    "Growth entry for {} in period {}, year {} already exists",
                    row.ticker.trim().to_uppercase(),
                    period,
                    row.year
                ));
            }
            Ok(NewGrowthEntry {
                stock_id,
                period,
                year: row.year,
                value: row.value,
            })
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn context() -> ImportContext {
        let stocks = [
            Stock {
                id: 1,
                ticker: "ACME".to_string(),
                company_name: "Acme Inc.".to_string(),
                sector_id: 1,
            },
            Stock {
                id: 2,
                ticker: "GLOBEX".to_string(),
                company_name: "Globex Corp.".to_string(),
                sector_id: 2,
            },
        ];
        ImportContext::with_stocks(stocks.iter())
    }

    fn earning_row(ticker: &str, period: i64) -> EarningAnalysisRow {
        EarningAnalysisRow {
            ticker: ticker.to_string(),
            period,
            price: 150.0,
            pe: 25.0,
            roa: 0.15,
            eps_revision_grade: "B+".to_string(),
            eps_growth_adjusted_rate: None,
        }
    }

    #[test]
    fn happy_path_tallies_all_successes() {
        let rows = vec![earning_row("ACME", 7), earning_row("globex", 7)];
        let (accepted, report) = screen_earning_rows(&rows, &context());
        assert_eq!(accepted.len(), 2);
        assert_eq!(report.total, 2);
        assert_eq!(report.success_count, 2);
        assert_eq!(report.error_count, 0);
        // Ticker resolution is case-insensitive.
        assert_eq!(accepted[1].stock_id, 2);
    }

    #[test]
    fn unknown_ticker_and_bad_grade_are_rowwise() {
        let mut bad_grade = earning_row("ACME", 8);
        bad_grade.eps_revision_grade = "F".to_string();
        let rows = vec![earning_row("WAYNE", 7), bad_grade, earning_row("ACME", 9)];
        let (accepted, report) = screen_earning_rows(&rows, &context());
        assert_eq!(accepted.len(), 1);
        assert_eq!(report.error_count, 2);
        assert_eq!(report.errors[0].row, 1);
        assert!(report.errors[0].error.contains("WAYNE"));
        assert_eq!(report.errors[1].row, 2);
    }

    #[test]
    fn duplicate_within_file_rejected() {
        let rows = vec![earning_row("ACME", 7), earning_row("acme", 7)];
        let (accepted, report) = screen_earning_rows(&rows, &context());
        assert_eq!(accepted.len(), 1);
        assert_eq!(report.error_count, 1);
        assert!(report.errors[0].error.contains("already exists"));
    }

    #[test]
    fn duplicate_against_store_rejected() {
        let mut ctx = context();
        ctx.existing_analyses.insert((1, 7));
        let rows = vec![earning_row("ACME", 7)];
        let (accepted, report) = screen_earning_rows(&rows, &ctx);
        assert!(accepted.is_empty());
        assert_eq!(report.error_count, 1);
    }

    #[test]
    fn negative_period_rejected() {
        let rows = vec![earning_row("ACME", -1)];
        let (_, report) = screen_earning_rows(&rows, &context());
        assert_eq!(report.error_count, 1);
        assert!(report.errors[0].error.contains("Period"));
    }

    #[test]
    fn revenue_rows_validate_their_own_ranges() {
        let rows = vec![
            RevenueAnalysisRow {
                ticker: "ACME".to_string(),
                period: 7,
                price: 100.0,
                ps: 5.0,
                operating_margin: 0.2,
                sales_growth_adjusted_rate: Some(11.0),
            },
            RevenueAnalysisRow {
                ticker: "GLOBEX".to_string(),
                period: 7,
                price: 100.0,
                ps: 5.0,
                operating_margin: 0.2,
                sales_growth_adjusted_rate: None,
            },
        ];
        let (accepted, report) = screen_revenue_rows(&rows, &context());
        assert_eq!(accepted.len(), 1);
        assert_eq!(report.error_count, 1);
        assert!(report.errors[0].error.contains("Sales Growth Adjusted Rate"));
    }

    #[test]
    fn growth_duplicate_key_includes_year() {
        let rows = vec![
            GrowthRow {
                ticker: "ACME".to_string(),
                period: 7,
                year: 2023,
                value: 0.1,
            },
            GrowthRow {
                ticker: "ACME".to_string(),
                period: 7,
                year: 2024,
                value: 0.2,
            },
            GrowthRow {
                ticker: "ACME".to_string(),
                period: 7,
                year: 2023,
                value: 0.3,
            },
        ];
        let (accepted, report) = screen_growth_rows(&rows, &context());
        assert_eq!(accepted.len(), 2);
        assert_eq!(report.error_count, 1);
        assert_eq!(report.errors[0].row, 3);
    }
}
