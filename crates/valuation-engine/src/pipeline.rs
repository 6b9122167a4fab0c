//! Batch orchestration: fetched records in, augmented records out.

use analysis_core::{EarningAnalysis, GrowthDatum, RevenueAnalysis};
use serde::Serialize;

use crate::series::{average_growth, positional_growth, select_batch_years, GROWTH_WINDOW};
use crate::strategy::{
    multiple_to_growth_ratio, upside_potential, PeGrowthStrategy, PsGrowthStrategy,
    ValuationInput, ValuationStrategy,
};

/// Everything the pipelines derive for one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedValuation {
    pub growth_by_column: [Option<f64>; GROWTH_WINDOW],
    pub growth_avg: Option<f64>,
    pub growth_ratio: Option<f64>,
    pub growth_valuation: Option<f64>,
    pub growth_valuation_price: Option<f64>,
    pub growth_profitability_valuation: Option<f64>,
    pub growth_profitability_valuation_price: Option<f64>,
    pub upside_potential: Option<f64>,
}

/// Run the full per-record chain against one strategy. `years` is the
/// batch-wide selection from [`select_batch_years`], threaded in explicitly
/// so every record of a batch shares it.
pub fn derive_valuation<S: ValuationStrategy>(
    strategy: &S,
    input: &ValuationInput,
    series: &[GrowthDatum],
    years: &[i32],
) -> DerivedValuation {
    let growth_by_column = positional_growth(series, years);
    let growth_avg = average_growth(series, years);
    let growth_ratio = multiple_to_growth_ratio(input.multiple, growth_avg);
    let growth_valuation = strategy.growth_valuation(input, growth_avg);
    let growth_valuation_price = strategy.growth_valuation_price(input, growth_valuation);
    let growth_profitability_valuation =
        strategy.profitability_valuation(input, growth_valuation);
    let growth_profitability_valuation_price =
        strategy.profitability_valuation_price(input, growth_profitability_valuation);
    let upside = upside_potential(growth_profitability_valuation_price, input.price);

    DerivedValuation {
        growth_by_column,
        growth_avg,
        growth_ratio,
        growth_valuation,
        growth_valuation_price,
        growth_profitability_valuation,
        growth_profitability_valuation_price,
        upside_potential: upside,
    }
}

/// Earning analysis with its derived grid columns attached.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedEarningAnalysis {
    #[serde(flatten)]
    pub analysis: EarningAnalysis,
    pub eps_growth_0: Option<f64>,
    pub eps_growth_1: Option<f64>,
    pub eps_growth_2: Option<f64>,
    pub eps_growth_avg: Option<f64>,
    pub eps_ratio: Option<f64>,
    pub growth_valuation: Option<f64>,
    pub growth_valuation_price: Option<f64>,
    pub growth_profitability_valuation: Option<f64>,
    pub growth_profitability_valuation_price: Option<f64>,
    pub upside_potential: Option<f64>,
}

/// Revenue analysis with its derived grid columns attached.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedRevenueAnalysis {
    #[serde(flatten)]
    pub analysis: RevenueAnalysis,
    pub sales_growth_0: Option<f64>,
    pub sales_growth_1: Option<f64>,
    pub sales_growth_2: Option<f64>,
    pub sales_growth_avg: Option<f64>,
    pub psg_ratio: Option<f64>,
    pub growth_valuation: Option<f64>,
    pub growth_valuation_price: Option<f64>,
    pub growth_profitability_valuation: Option<f64>,
    pub growth_profitability_valuation_price: Option<f64>,
    pub upside_potential: Option<f64>,
}

/// One processed page: the shared year columns plus every augmented record.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedBatch<T> {
    /// Calendar years backing columns +0, +1, +2 for this batch.
    pub years: Vec<i32>,
    pub records: Vec<T>,
}

fn earning_input(analysis: &EarningAnalysis) -> ValuationInput {
    ValuationInput {
        price: analysis.price,
        multiple: analysis.pe,
        adjusted_growth: analysis.eps_growth_adjusted_rate,
        profitability: analysis.roa,
        sector_growth_multiple: analysis.sector_ratio.map(|s| s.peg_ratio),
        sector_profitability: analysis.sector_ratio.map(|s| s.roa),
    }
}

fn revenue_input(analysis: &RevenueAnalysis) -> ValuationInput {
    ValuationInput {
        price: analysis.price,
        multiple: analysis.ps,
        adjusted_growth: analysis.sales_growth_adjusted_rate,
        profitability: analysis.operating_margin,
        sector_growth_multiple: analysis.sector_ratio.map(|s| s.psg_ratio),
        sector_profitability: analysis.sector_ratio.map(|s| s.operating_margin),
    }
}

/// Process one fetched page of earning analyses: pick the batch years once,
/// then derive every record's valuation columns. Pure; the input page is
/// left untouched.
pub fn process_earning_batch(
    analyses: &[EarningAnalysis],
) -> ProcessedBatch<ProcessedEarningAnalysis> {
    let years = select_batch_years(analyses.iter().map(|a| a.eps_growth_data.as_slice()));
    let strategy = PeGrowthStrategy;
    let records = analyses
        .iter()
        .map(|analysis| {
            let derived = derive_valuation(
                &strategy,
                &earning_input(analysis),
                &analysis.eps_growth_data,
                &years,
            );
            ProcessedEarningAnalysis {
                analysis: analysis.clone(),
                eps_growth_0: derived.growth_by_column[0],
                eps_growth_1: derived.growth_by_column[1],
                eps_growth_2: derived.growth_by_column[2],
                eps_growth_avg: derived.growth_avg,
                eps_ratio: derived.growth_ratio,
                growth_valuation: derived.growth_valuation,
                growth_valuation_price: derived.growth_valuation_price,
                growth_profitability_valuation: derived.growth_profitability_valuation,
                growth_profitability_valuation_price: derived
                    .growth_profitability_valuation_price,
                upside_potential: derived.upside_potential,
            }
        })
        .collect();
    ProcessedBatch { years, records }
}

/// Revenue twin of [`process_earning_batch`].
pub fn process_revenue_batch(
    analyses: &[RevenueAnalysis],
) -> ProcessedBatch<ProcessedRevenueAnalysis> {
    let years = select_batch_years(analyses.iter().map(|a| a.sales_growth_data.as_slice()));
    let strategy = PsGrowthStrategy;
    let records = analyses
        .iter()
        .map(|analysis| {
            let derived = derive_valuation(
                &strategy,
                &revenue_input(analysis),
                &analysis.sales_growth_data,
                &years,
            );
            ProcessedRevenueAnalysis {
                analysis: analysis.clone(),
                sales_growth_0: derived.growth_by_column[0],
                sales_growth_1: derived.growth_by_column[1],
                sales_growth_2: derived.growth_by_column[2],
                sales_growth_avg: derived.growth_avg,
                psg_ratio: derived.growth_ratio,
                growth_valuation: derived.growth_valuation,
                growth_valuation_price: derived.growth_valuation_price,
                growth_profitability_valuation: derived.growth_profitability_valuation,
                growth_profitability_valuation_price: derived
                    .growth_profitability_valuation_price,
                upside_potential: derived.upside_potential,
            }
        })
        .collect();
    ProcessedBatch { years, records }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{EpsRevisionGrade, SectorRatio, Stock};
    use approx::assert_relative_eq;

    fn stock(id: i64, ticker: &str) -> Stock {
        Stock {
            id,
            ticker: ticker.to_string(),
            company_name: format!("{ticker} Inc."),
            sector_id: 1,
        }
    }

    fn sector_ratio() -> SectorRatio {
        SectorRatio {
            sector_id: 1,
            period: 7,
            roa: 0.10,
            peg_ratio: 1.2,
            psg_ratio: 0.8,
            operating_margin: 0.20,
        }
    }

    fn earning(id: i64, ticker: &str, growth: Vec<GrowthDatum>) -> EarningAnalysis {
        EarningAnalysis {
            id,
            stock: stock(id, ticker),
            period: 7,
            price: 150.0,
            pe: 25.0,
            roa: 0.15,
            eps_revision_grade: EpsRevisionGrade::B,
            eps_growth_adjusted_rate: None,
            eps_growth_data: growth,
            sector_ratio: Some(sector_ratio()),
        }
    }

    fn datum(year: i32, value: f64) -> GrowthDatum {
        GrowthDatum { year, value }
    }

    #[test]
    fn earning_end_to_end() {
        let batch = vec![earning(
            1,
            "ACME",
            vec![datum(2022, 0.10), datum(2023, 0.20)],
        )];
        let processed = process_earning_batch(&batch);
        assert_eq!(processed.years, vec![2022, 2023]);

        let row = &processed.records[0];
        assert_eq!(row.eps_growth_0, Some(0.10));
        assert_eq!(row.eps_growth_1, Some(0.20));
        assert_eq!(row.eps_growth_2, None);

        let avg = row.eps_growth_avg.unwrap();
        assert_relative_eq!(avg, 0.15, max_relative = 1e-12);
        assert_relative_eq!(row.eps_ratio.unwrap(), 25.0 / 15.0, max_relative = 1e-9);

        // x = avg * 100 * peg
        let x = avg * 100.0 * 1.2;
        assert_relative_eq!(row.growth_valuation.unwrap(), x, max_relative = 1e-12);
        assert_relative_eq!(
            row.growth_valuation_price.unwrap(),
            150.0 * x / 25.0,
            max_relative = 1e-12
        );

        // y = 1 + ln(1 + (0.15 - 0.10))
        let y = 1.0 + 1.05f64.ln();
        let adjusted = x * y;
        assert_relative_eq!(
            row.growth_profitability_valuation.unwrap(),
            adjusted,
            max_relative = 1e-12
        );
        let fair = 150.0 * adjusted / 25.0;
        assert_relative_eq!(
            row.growth_profitability_valuation_price.unwrap(),
            fair,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            row.upside_potential.unwrap(),
            fair / 150.0 - 1.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn earning_missing_growth_nulls_cascade() {
        let batch = vec![earning(1, "ACME", Vec::new())];
        let processed = process_earning_batch(&batch);
        assert!(processed.years.is_empty());

        let row = &processed.records[0];
        assert_eq!(row.eps_growth_avg, None);
        assert_eq!(row.eps_ratio, None);
        assert_eq!(row.growth_valuation, None);
        assert_eq!(row.growth_valuation_price, None);
        assert_eq!(row.growth_profitability_valuation, None);
        assert_eq!(row.growth_profitability_valuation_price, None);
        assert_eq!(row.upside_potential, None);
    }

    #[test]
    fn earning_adjusted_rate_bypasses_missing_history() {
        let mut analysis = earning(1, "ACME", Vec::new());
        analysis.eps_growth_adjusted_rate = Some(0.12);
        let processed = process_earning_batch(&vec![analysis]);
        let row = &processed.records[0];
        // Average stays None but the adjusted rate still drives valuation.
        assert_eq!(row.eps_growth_avg, None);
        let x = 0.12 * 100.0 * 1.2;
        assert_relative_eq!(row.growth_valuation.unwrap(), x, max_relative = 1e-12);
    }

    #[test]
    fn batch_years_shared_across_records() {
        // Second record has no 2022 datum; its +0 column must still be 2022.
        let batch = vec![
            earning(1, "ACME", vec![datum(2022, 0.10)]),
            earning(2, "GLOBEX", vec![datum(2023, 0.30)]),
        ];
        let processed = process_earning_batch(&batch);
        assert_eq!(processed.years, vec![2022, 2023]);
        assert_eq!(processed.records[1].eps_growth_0, None);
        assert_eq!(processed.records[1].eps_growth_1, Some(0.30));
    }

    #[test]
    fn earning_profitability_skipped_without_sector() {
        let mut analysis = earning(1, "ACME", vec![datum(2022, 0.10)]);
        analysis.sector_ratio = None;
        let processed = process_earning_batch(&vec![analysis]);
        let row = &processed.records[0];
        // Growth valuation still computes with the 1.0 default multiple...
        assert_relative_eq!(
            row.growth_valuation.unwrap(),
            0.10 * 100.0,
            max_relative = 1e-12
        );
        // ...but the profitability leg and everything after it are None.
        assert_eq!(row.growth_profitability_valuation, None);
        assert_eq!(row.growth_profitability_valuation_price, None);
        assert_eq!(row.upside_potential, None);
    }

    fn revenue(id: i64, ticker: &str, growth: Vec<GrowthDatum>) -> RevenueAnalysis {
        RevenueAnalysis {
            id,
            stock: stock(id, ticker),
            period: 7,
            price: 100.0,
            ps: 5.0,
            operating_margin: 0.10,
            sales_growth_adjusted_rate: None,
            sales_growth_data: growth,
            sector_ratio: Some(sector_ratio()),
        }
    }

    #[test]
    fn revenue_negative_growth_end_to_end() {
        let batch = vec![revenue(1, "ACME", vec![datum(2022, -0.05)])];
        let processed = process_revenue_batch(&batch);
        let row = &processed.records[0];

        assert_relative_eq!(row.sales_growth_avg.unwrap(), -0.05, max_relative = 1e-12);
        // Negative growth discounts the raw multiple: 5 + 5 * -0.05 = 4.75.
        assert_relative_eq!(row.growth_valuation.unwrap(), 4.75, max_relative = 1e-12);
        assert_relative_eq!(
            row.growth_valuation_price.unwrap(),
            95.0,
            max_relative = 1e-12
        );

        // Margin 0.10 below sector 0.20 and profitable: discount -0.05.
        let adjusted = 4.75 * (1.0 + (0.10 - 0.20) / 2.0);
        assert_relative_eq!(
            row.growth_profitability_valuation.unwrap(),
            adjusted,
            max_relative = 1e-12
        );
        let fair = 100.0 * adjusted / 5.0;
        assert_relative_eq!(
            row.growth_profitability_valuation_price.unwrap(),
            fair,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            row.upside_potential.unwrap(),
            fair / 100.0 - 1.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn revenue_zero_average_growth_propagates_none() {
        let batch = vec![revenue(1, "ACME", vec![datum(2022, 0.0)])];
        let processed = process_revenue_batch(&batch);
        let row = &processed.records[0];
        assert_eq!(row.sales_growth_avg, Some(0.0));
        assert_eq!(row.psg_ratio, None);
        assert_eq!(row.growth_valuation, None);
        assert_eq!(row.growth_valuation_price, None);
        assert_eq!(row.upside_potential, None);
    }

    #[test]
    fn pipelines_are_idempotent_and_do_not_mutate_input() {
        let batch = vec![
            earning(1, "ACME", vec![datum(2022, 0.10), datum(2023, 0.20)]),
            earning(2, "GLOBEX", vec![datum(2024, -0.10)]),
        ];
        let snapshot = batch.clone();
        let first = process_earning_batch(&batch);
        let second = process_earning_batch(&batch);

        assert_eq!(first.years, second.years);
        assert_eq!(first.records.len(), second.records.len());
        for (a, b) in first.records.iter().zip(second.records.iter()) {
            assert_eq!(a.eps_growth_avg, b.eps_growth_avg);
            assert_eq!(a.growth_valuation, b.growth_valuation);
            assert_eq!(a.upside_potential, b.upside_potential);
        }
        // Input untouched.
        for (before, after) in snapshot.iter().zip(batch.iter()) {
            assert_eq!(before.id, after.id);
            assert_eq!(before.eps_growth_data, after.eps_growth_data);
        }
    }
}
