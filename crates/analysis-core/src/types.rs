use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::validate::ValidationError;

/// Sector master record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sector {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// Listed stock. Every stock belongs to exactly one sector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stock {
    pub id: i64,
    /// Ticker symbol, stored uppercase, unique across the universe.
    pub ticker: String,
    pub company_name: String,
    pub sector_id: i64,
}

/// Sector-wide reference ratios for one reporting period.
///
/// The valuation pipelines read these as comparison baselines and never
/// mutate them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectorRatio {
    pub sector_id: i64,
    pub period: u32,
    pub roa: f64,
    pub peg_ratio: f64,
    pub psg_ratio: f64,
    pub operating_margin: f64,
}

/// One calendar-year growth observation (EPS or sales, depending on which
/// series it sits in). `value` is a fraction: 0.15 means 15% growth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthDatum {
    pub year: i32,
    pub value: f64,
}

/// Analyst EPS revision grade, A+ (strongest upward revisions) through E.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EpsRevisionGrade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    C,
    #[serde(rename = "C-")]
    CMinus,
    #[serde(rename = "D+")]
    DPlus,
    D,
    #[serde(rename = "D-")]
    DMinus,
    E,
}

impl EpsRevisionGrade {
    /// All grades in rank order, best first.
    pub const ALL: [EpsRevisionGrade; 13] = [
        EpsRevisionGrade::APlus,
        EpsRevisionGrade::A,
        EpsRevisionGrade::AMinus,
        EpsRevisionGrade::BPlus,
        EpsRevisionGrade::B,
        EpsRevisionGrade::BMinus,
        EpsRevisionGrade::CPlus,
        EpsRevisionGrade::C,
        EpsRevisionGrade::CMinus,
        EpsRevisionGrade::DPlus,
        EpsRevisionGrade::D,
        EpsRevisionGrade::DMinus,
        EpsRevisionGrade::E,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EpsRevisionGrade::APlus => "A+",
            EpsRevisionGrade::A => "A",
            EpsRevisionGrade::AMinus => "A-",
            EpsRevisionGrade::BPlus => "B+",
            EpsRevisionGrade::B => "B",
            EpsRevisionGrade::BMinus => "B-",
            EpsRevisionGrade::CPlus => "C+",
            EpsRevisionGrade::C => "C",
            EpsRevisionGrade::CMinus => "C-",
            EpsRevisionGrade::DPlus => "D+",
            EpsRevisionGrade::D => "D",
            EpsRevisionGrade::DMinus => "D-",
            EpsRevisionGrade::E => "E",
        }
    }
}

impl std::fmt::Display for EpsRevisionGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EpsRevisionGrade {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|grade| grade.as_str() == trimmed)
            .ok_or_else(|| ValidationError::InvalidGrade(s.to_string()))
    }
}

/// One stock's earnings-side fundamentals for one reporting period, with the
/// growth history and sector baseline already joined on. This is the shape
/// the P/E valuation pipeline consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningAnalysis {
    pub id: i64,
    pub stock: Stock,
    /// Reporting cycle identifier. Not a calendar year.
    pub period: u32,
    pub price: f64,
    pub pe: f64,
    pub roa: f64,
    pub eps_revision_grade: EpsRevisionGrade,
    /// Analyst-adjusted forward EPS growth estimate, when one exists.
    #[serde(default)]
    pub eps_growth_adjusted_rate: Option<f64>,
    #[serde(default)]
    pub eps_growth_data: Vec<GrowthDatum>,
    #[serde(default)]
    pub sector_ratio: Option<SectorRatio>,
}

/// Revenue-side twin of [`EarningAnalysis`], consumed by the P/S pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueAnalysis {
    pub id: i64,
    pub stock: Stock,
    pub period: u32,
    pub price: f64,
    pub ps: f64,
    pub operating_margin: f64,
    #[serde(default)]
    pub sales_growth_adjusted_rate: Option<f64>,
    #[serde(default)]
    pub sales_growth_data: Vec<GrowthDatum>,
    #[serde(default)]
    pub sector_ratio: Option<SectorRatio>,
}

/// Earning analysis as submitted on the write path (single create or an
/// accepted bulk row).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEarningAnalysis {
    pub stock_id: i64,
    pub period: u32,
    pub price: f64,
    pub pe: f64,
    pub roa: f64,
    pub eps_revision_grade: EpsRevisionGrade,
    #[serde(default)]
    pub eps_growth_adjusted_rate: Option<f64>,
}

/// Revenue analysis write shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRevenueAnalysis {
    pub stock_id: i64,
    pub period: u32,
    pub price: f64,
    pub ps: f64,
    pub operating_margin: f64,
    #[serde(default)]
    pub sales_growth_adjusted_rate: Option<f64>,
}

/// Sector write shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSector {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Stock write shape. Tickers are normalized to uppercase on insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStock {
    pub ticker: String,
    pub company_name: String,
    pub sector_id: i64,
}

/// Growth-series entry write shape (EPS or sales growth alike).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGrowthEntry {
    pub stock_id: i64,
    pub period: u32,
    pub year: i32,
    pub value: f64,
}

/// Point-in-time quote for one ticker from the external quote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub ticker: String,
    pub current_price: f64,
    pub price_change: Option<f64>,
    pub price_change_percent: Option<f64>,
    pub volume: Option<f64>,
    pub market_cap: Option<f64>,
    pub previous_close: Option<f64>,
}

/// Daily OHLCV bar from the external quote service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_round_trips_through_str() {
        for grade in EpsRevisionGrade::ALL {
            let parsed: EpsRevisionGrade = grade.as_str().parse().unwrap();
            assert_eq!(parsed, grade);
        }
    }

    #[test]
    fn grade_parse_trims_whitespace() {
        let parsed: EpsRevisionGrade = " B+ ".parse().unwrap();
        assert_eq!(parsed, EpsRevisionGrade::BPlus);
    }

    #[test]
    fn grade_parse_rejects_unknown() {
        assert!("F".parse::<EpsRevisionGrade>().is_err());
        assert!("a+".parse::<EpsRevisionGrade>().is_err());
    }
}
