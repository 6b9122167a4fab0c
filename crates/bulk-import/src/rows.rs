//! Typed upload rows and CSV parsing.

use std::io::Read;

use analysis_core::AnalysisError;
use serde::{Deserialize, Serialize};

/// One row of an earning-analysis upload file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningAnalysisRow {
    pub ticker: String,
    /// Signed on the wire so a negative period fails validation instead of
    /// failing the parse.
    pub period: i64,
    pub price: f64,
    pub pe: f64,
    pub roa: f64,
    pub eps_revision_grade: String,
    #[serde(default)]
    pub eps_growth_adjusted_rate: Option<f64>,
}

/// One row of a revenue-analysis upload file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueAnalysisRow {
    pub ticker: String,
    pub period: i64,
    pub price: f64,
    pub ps: f64,
    pub operating_margin: f64,
    #[serde(default)]
    pub sales_growth_adjusted_rate: Option<f64>,
}

/// One row of a growth-series upload file (EPS or sales growth alike).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthRow {
    pub ticker: String,
    pub period: i64,
    pub year: i32,
    pub value: f64,
}

fn read_rows<T, R>(reader: R) -> Result<Vec<T>, AnalysisError>
where
    T: serde::de::DeserializeOwned,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();
    for record in csv_reader.deserialize() {
        let row: T = record.map_err(|e| AnalysisError::ImportError(e.to_string()))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Parse an earning-analysis CSV. A malformed file aborts the whole upload;
/// per-row business failures are the screen's job, not the parser's.
pub fn read_earning_rows<R: Read>(reader: R) -> Result<Vec<EarningAnalysisRow>, AnalysisError> {
    read_rows(reader)
}

/// Parse a revenue-analysis CSV.
pub fn read_revenue_rows<R: Read>(reader: R) -> Result<Vec<RevenueAnalysisRow>, AnalysisError> {
    read_rows(reader)
}

/// Parse a growth-series CSV.
pub fn read_growth_rows<R: Read>(reader: R) -> Result<Vec<GrowthRow>, AnalysisError> {
    read_rows(reader)
}

/// Header-only template for earning uploads, offered for download by the UI.
pub fn earning_template() -> String {
    "ticker,period,price,pe,roa,eps_revision_grade,eps_growth_adjusted_rate\n".to_string()
}

/// Header-only template for revenue uploads.
pub fn revenue_template() -> String {
    "ticker,period,price,ps,operating_margin,sales_growth_adjusted_rate\n".to_string()
}

/// Header-only template for growth-series uploads.
pub fn growth_template() -> String {
    "ticker,period,year,value\n".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn earning_rows_parse_with_optional_rate() {
        let csv = "\
ticker,period,price,pe,roa,eps_revision_grade,eps_growth_adjusted_rate
ACME,7,150.0,25.0,0.15,B+,0.12
GLOBEX,7,80.5,18.0,0.08,C,
";
        let rows = read_earning_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].ticker, "ACME");
        assert_eq!(rows[0].eps_revision_grade, "B+");
        assert_eq!(rows[0].eps_growth_adjusted_rate, Some(0.12));
        assert_eq!(rows[1].eps_growth_adjusted_rate, None);
    }

    #[test]
    fn malformed_file_aborts() {
        let csv = "\
ticker,period,price,pe,roa,eps_revision_grade,eps_growth_adjusted_rate
ACME,seven,150.0,25.0,0.15,B+,
";
        assert!(read_earning_rows(csv.as_bytes()).is_err());
    }

    #[test]
    fn growth_rows_parse() {
        let csv = "ticker,period,year,value\nACME,7,2023,-0.05\n";
        let rows = read_growth_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].year, 2023);
        assert_eq!(rows[0].value, -0.05);
    }

    #[test]
    fn templates_match_row_shapes() {
        let rows = read_earning_rows(earning_template().as_bytes()).unwrap();
        assert!(rows.is_empty());
        let rows = read_revenue_rows(revenue_template().as_bytes()).unwrap();
        assert!(rows.is_empty());
        let rows = read_growth_rows(growth_template().as_bytes()).unwrap();
        assert!(rows.is_empty());
    }
}
