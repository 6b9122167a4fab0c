//! Field-level validation for the analysis write paths.
//!
//! These rules guard API creates and bulk uploads. The valuation pipelines
//! assume their numeric inputs already passed this layer.

use thiserror::Error;

use crate::EpsRevisionGrade;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Ticker must not be empty")]
    EmptyTicker,

    #[error("Period must be an integer greater than or equal to 0")]
    InvalidPeriod,

    #[error("Price must be positive")]
    InvalidPrice,

    #[error("P/E ratio must be between 0 and 1000")]
    PeOutOfRange,

    #[error("P/S ratio must not be negative")]
    PsOutOfRange,

    #[error("ROA must be between 0 and 1")]
    RoaOutOfRange,

    #[error("Operating Margin must be between -1 and 1")]
    OperatingMarginOutOfRange,

    #[error("Sales Growth Adjusted Rate must be between -1 and 10")]
    AdjustedRateOutOfRange,

    #[error("Invalid EPS revision grade: '{0}'. Must be one of: A+, A, A-, B+, B, B-, C+, C, C-, D+, D, D-, E")]
    InvalidGrade(String),
}

/// Check the scalar fields of an earning analysis.
pub fn validate_earning_fields(price: f64, pe: f64, roa: f64) -> Result<(), ValidationError> {
    if !(price > 0.0) {
        return Err(ValidationError::InvalidPrice);
    }
    if !(0.0..=1000.0).contains(&pe) {
        return Err(ValidationError::PeOutOfRange);
    }
    if !(0.0..=1.0).contains(&roa) {
        return Err(ValidationError::RoaOutOfRange);
    }
    Ok(())
}

/// Check the scalar fields of a revenue analysis.
pub fn validate_revenue_fields(
    price: f64,
    ps: f64,
    operating_margin: f64,
    sales_growth_adjusted_rate: Option<f64>,
) -> Result<(), ValidationError> {
    if !(price > 0.0) {
        return Err(ValidationError::InvalidPrice);
    }
    if !(ps >= 0.0) {
        return Err(ValidationError::PsOutOfRange);
    }
    if !(-1.0..=1.0).contains(&operating_margin) {
        return Err(ValidationError::OperatingMarginOutOfRange);
    }
    if let Some(rate) = sales_growth_adjusted_rate {
        if !(-1.0..=10.0).contains(&rate) {
            return Err(ValidationError::AdjustedRateOutOfRange);
        }
    }
    Ok(())
}

/// Parse an EPS revision grade from its display form.
pub fn parse_grade(s: &str) -> Result<EpsRevisionGrade, ValidationError> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earning_fields_accept_boundaries() {
        assert!(validate_earning_fields(0.01, 0.0, 0.0).is_ok());
        assert!(validate_earning_fields(150.0, 1000.0, 1.0).is_ok());
    }

    #[test]
    fn earning_fields_reject_out_of_range() {
        assert_eq!(
            validate_earning_fields(0.0, 25.0, 0.1),
            Err(ValidationError::InvalidPrice)
        );
        assert_eq!(
            validate_earning_fields(100.0, 1000.5, 0.1),
            Err(ValidationError::PeOutOfRange)
        );
        assert_eq!(
            validate_earning_fields(100.0, -0.1, 0.1),
            Err(ValidationError::PeOutOfRange)
        );
        assert_eq!(
            validate_earning_fields(100.0, 25.0, 1.2),
            Err(ValidationError::RoaOutOfRange)
        );
    }

    #[test]
    fn earning_fields_reject_nan() {
        assert!(validate_earning_fields(f64::NAN, 25.0, 0.1).is_err());
        assert!(validate_earning_fields(100.0, f64::NAN, 0.1).is_err());
        assert!(validate_earning_fields(100.0, 25.0, f64::NAN).is_err());
    }

    #[test]
    fn revenue_fields_cover_ranges() {
        assert!(validate_revenue_fields(100.0, 0.0, -1.0, None).is_ok());
        assert!(validate_revenue_fields(100.0, 5.0, 0.2, Some(10.0)).is_ok());
        assert_eq!(
            validate_revenue_fields(100.0, -0.5, 0.2, None),
            Err(ValidationError::PsOutOfRange)
        );
        assert_eq!(
            validate_revenue_fields(100.0, 5.0, 1.5, None),
            Err(ValidationError::OperatingMarginOutOfRange)
        );
        assert_eq!(
            validate_revenue_fields(100.0, 5.0, 0.2, Some(10.5)),
            Err(ValidationError::AdjustedRateOutOfRange)
        );
    }
}
