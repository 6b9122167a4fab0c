//! Variant-specific valuation formulas.
//!
//! The earning (P/E) and revenue (P/S) pipelines differ only in which
//! multiple they normalize and in a handful of formula branches, so both
//! are expressed as strategies over a shared per-record input. The two
//! formula sets are intentionally NOT symmetric: the revenue side has no
//! haircut guard on its fair prices and discounts the raw multiple for
//! negative growth. Do not unify the branches without a domain owner's
//! sign-off.

/// Per-record inputs to a valuation strategy, extracted from either
/// analysis variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuationInput {
    /// Current share price.
    pub price: f64,
    /// Reported multiple: P/E for earning analyses, P/S for revenue.
    pub multiple: f64,
    /// Analyst-adjusted forward growth estimate, when one exists.
    pub adjusted_growth: Option<f64>,
    /// Reported profitability: ROA (earning) or operating margin (revenue).
    pub profitability: f64,
    /// Sector growth-normalized multiple baseline (PEG or PSG).
    pub sector_growth_multiple: Option<f64>,
    /// Sector profitability baseline (ROA or operating margin).
    pub sector_profitability: Option<f64>,
}

/// Bounds on the earning-side profitability multiplier.
const PROFITABILITY_FLOOR: f64 = 0.7;
const PROFITABILITY_CEIL: f64 = 1.3;

/// Fallback when a sector has no growth-multiple baseline.
const DEFAULT_SECTOR_MULTIPLE: f64 = 1.0;

/// Haircut applied when an earning-side fair price degenerates.
const DEGENERATE_PRICE_HAIRCUT: f64 = 0.9;

/// One formula set. The shared pipeline drives whichever variant it is
/// handed; every method is total, with missing inputs surfacing as `None`.
pub trait ValuationStrategy {
    /// Growth-only fair multiple (the `x` term).
    fn growth_valuation(&self, input: &ValuationInput, average_growth: Option<f64>)
        -> Option<f64>;

    /// Fair price implied by the growth-only multiple.
    fn growth_valuation_price(&self, input: &ValuationInput, valuation: Option<f64>)
        -> Option<f64>;

    /// Profitability-adjusted fair multiple, from the growth-only one.
    fn profitability_valuation(&self, input: &ValuationInput, valuation: Option<f64>)
        -> Option<f64>;

    /// Fair price implied by the profitability-adjusted multiple.
    fn profitability_valuation_price(
        &self,
        input: &ValuationInput,
        valuation: Option<f64>,
    ) -> Option<f64>;
}

/// Treat zero as absent: a 0% growth figure carries no valuation signal and
/// must fall through to the next source, never into a denominator.
fn non_zero(value: f64) -> Option<f64> {
    if value == 0.0 {
        None
    } else {
        Some(value)
    }
}

/// `price * fair_multiple / reported_multiple`, or `None` when the reported
/// multiple cannot serve as a denominator.
fn fair_price(input: &ValuationInput, valuation: f64) -> Option<f64> {
    if input.multiple <= 0.0 {
        return None;
    }
    Some(input.price * valuation / input.multiple)
}

/// Growth-normalized multiple (PEG-like): `multiple / (avg growth × 100)`.
pub fn multiple_to_growth_ratio(multiple: f64, average_growth: Option<f64>) -> Option<f64> {
    let average = average_growth.and_then(non_zero)?;
    Some(multiple / (average * 100.0))
}

/// Signed upside of a fair price against the current price. Positive reads
/// as undervalued.
pub fn upside_potential(fair_price: Option<f64>, price: f64) -> Option<f64> {
    let fair = fair_price?;
    if price <= 0.0 {
        return None;
    }
    Some(fair / price - 1.0)
}

/// Bounded log penalty/bonus from the ROA gap against the sector.
pub fn profitability_multiplier(roa: f64, sector_roa: f64) -> f64 {
    let factor = if roa > sector_roa {
        1.0 + (1.0 + (roa - sector_roa)).ln()
    } else {
        1.0 - (1.0 + (sector_roa - roa)).ln()
    };
    factor.clamp(PROFITABILITY_FLOOR, PROFITABILITY_CEIL)
}

/// Signed half-gap between the record's operating margin and the sector's.
/// A loss-making margin below the baseline averages the two levels instead
/// of halving the gap.
pub fn valuation_discount_rate(operating_margin: f64, sector_margin: f64) -> f64 {
    if operating_margin < sector_margin && operating_margin < 0.0 {
        (operating_margin + sector_margin) / 2.0
    } else {
        (operating_margin - sector_margin) / 2.0
    }
}

/// P/E-driven formula set for earning analyses.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeGrowthStrategy;

impl ValuationStrategy for PeGrowthStrategy {
    fn growth_valuation(
        &self,
        input: &ValuationInput,
        average_growth: Option<f64>,
    ) -> Option<f64> {
        let peg = input
            .sector_growth_multiple
            .unwrap_or(DEFAULT_SECTOR_MULTIPLE);
        let rate = input
            .adjusted_growth
            .and_then(non_zero)
            .or_else(|| average_growth.and_then(non_zero))?;
        Some(rate * 100.0 * peg)
    }

    fn growth_valuation_price(
        &self,
        input: &ValuationInput,
        valuation: Option<f64>,
    ) -> Option<f64> {
        let raw = fair_price(input, valuation?)?;
        if raw > 0.0 {
            Some(raw)
        } else {
            Some(input.price * DEGENERATE_PRICE_HAIRCUT)
        }
    }

    fn profitability_valuation(
        &self,
        input: &ValuationInput,
        valuation: Option<f64>,
    ) -> Option<f64> {
        // Skipped entirely when the sector carries no ROA baseline.
        let sector_roa = input.sector_profitability?;
        let valuation = valuation?;
        Some(valuation * profitability_multiplier(input.profitability, sector_roa))
    }

    fn profitability_valuation_price(
        &self,
        input: &ValuationInput,
        valuation: Option<f64>,
    ) -> Option<f64> {
        let raw = fair_price(input, valuation?)?;
        // Unlike the growth price, an exact zero passes through unfloored.
        if raw < 0.0 {
            Some(input.price * DEGENERATE_PRICE_HAIRCUT)
        } else {
            Some(raw)
        }
    }
}

/// P/S-driven formula set for revenue analyses.
#[derive(Debug, Clone, Copy, Default)]
pub struct PsGrowthStrategy;

impl ValuationStrategy for PsGrowthStrategy {
    fn growth_valuation(
        &self,
        input: &ValuationInput,
        average_growth: Option<f64>,
    ) -> Option<f64> {
        let psg = input
            .sector_growth_multiple
            .unwrap_or(DEFAULT_SECTOR_MULTIPLE);
        if let Some(adjusted) = input.adjusted_growth.and_then(non_zero) {
            return Some(adjusted * 100.0 * psg);
        }
        let average = average_growth.and_then(non_zero)?;
        if average < 0.0 {
            // Shrinking sales: discount the reported multiple directly.
            Some(input.multiple + input.multiple * average)
        } else {
            Some(average * 100.0 * psg)
        }
    }

    fn growth_valuation_price(
        &self,
        input: &ValuationInput,
        valuation: Option<f64>,
    ) -> Option<f64> {
        fair_price(input, valuation?)
    }

    fn profitability_valuation(
        &self,
        input: &ValuationInput,
        valuation: Option<f64>,
    ) -> Option<f64> {
        let sector_margin = input.sector_profitability?;
        let valuation = valuation?;
        let discount = valuation_discount_rate(input.profitability, sector_margin);
        Some(valuation * (1.0 + discount))
    }

    fn profitability_valuation_price(
        &self,
        input: &ValuationInput,
        valuation: Option<f64>,
    ) -> Option<f64> {
        fair_price(input, valuation?)
    }
}
