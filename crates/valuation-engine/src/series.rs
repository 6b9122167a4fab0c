//! Growth-series selection and averaging.

use std::collections::BTreeSet;

use analysis_core::GrowthDatum;

/// Number of growth columns shown on the analysis grids (+0, +1, +2).
pub const GROWTH_WINDOW: usize = 3;

/// Pick the reference years for a batch: the union of every year appearing
/// in any record's growth history, ascending, first three.
///
/// Computed once per batch so all rows share the same column ordering even
/// when their own histories cover different years.
pub fn select_batch_years<'a, I>(batch: I) -> Vec<i32>
where
    I: IntoIterator<Item = &'a [GrowthDatum]>,
{
    let years: BTreeSet<i32> = batch
        .into_iter()
        .flat_map(|series| series.iter().map(|g| g.year))
        .collect();
    years.into_iter().take(GROWTH_WINDOW).collect()
}

/// Growth value reported for an exact calendar year, if any.
pub fn growth_for_year(series: &[GrowthDatum], year: i32) -> Option<f64> {
    series.iter().find(|g| g.year == year).map(|g| g.value)
}

/// Growth values in column order. Positions past the selected years, and
/// years the record has no datum for, stay `None`.
pub fn positional_growth(series: &[GrowthDatum], years: &[i32]) -> [Option<f64>; GROWTH_WINDOW] {
    let mut values = [None; GROWTH_WINDOW];
    for (slot, &year) in values.iter_mut().zip(years.iter()) {
        *slot = growth_for_year(series, year);
    }
    values
}

/// Arithmetic mean of the growth values present for the selected years.
///
/// Zero matches yields `None`, never `0`: a record with no usable history
/// must not read as 0% growth.
pub fn average_growth(series: &[GrowthDatum], years: &[i32]) -> Option<f64> {
    let matched: Vec<f64> = years
        .iter()
        .filter_map(|&year| growth_for_year(series, year))
        .collect();
    if matched.is_empty() {
        return None;
    }
    Some(matched.iter().sum::<f64>() / matched.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn datum(year: i32, value: f64) -> GrowthDatum {
        GrowthDatum { year, value }
    }

    #[test]
    fn batch_years_sorted_deduped_capped() {
        let a = vec![datum(2025, 0.1), datum(2023, 0.2)];
        let b = vec![datum(2024, 0.3), datum(2023, 0.4), datum(2026, 0.5)];
        let years = select_batch_years([a.as_slice(), b.as_slice()]);
        assert_eq!(years, vec![2023, 2024, 2025]);
    }

    #[test]
    fn batch_years_insensitive_to_input_order() {
        let a = vec![datum(2024, 0.1)];
        let b = vec![datum(2022, 0.2)];
        let forward = select_batch_years([a.as_slice(), b.as_slice()]);
        let reverse = select_batch_years([b.as_slice(), a.as_slice()]);
        assert_eq!(forward, reverse);
    }

    #[test]
    fn batch_years_empty_when_no_data() {
        assert!(select_batch_years(std::iter::empty::<&[GrowthDatum]>()).is_empty());
        let empty: Vec<GrowthDatum> = Vec::new();
        assert!(select_batch_years([empty.as_slice()]).is_empty());
    }

    #[test]
    fn positional_growth_is_by_column_not_by_gap() {
        // 2023 missing from this record: column +1 is None, +2 still fills.
        let series = vec![datum(2022, 0.10), datum(2024, 0.30)];
        let values = positional_growth(&series, &[2022, 2023, 2024]);
        assert_eq!(values, [Some(0.10), None, Some(0.30)]);
    }

    #[test]
    fn positional_growth_short_year_list() {
        let series = vec![datum(2022, 0.10)];
        let values = positional_growth(&series, &[2022]);
        assert_eq!(values, [Some(0.10), None, None]);
    }

    #[test]
    fn average_ignores_missing_years() {
        let series = vec![datum(2022, 0.10), datum(2024, 0.30)];
        let avg = average_growth(&series, &[2022, 2023, 2024]).unwrap();
        assert_relative_eq!(avg, 0.20, max_relative = 1e-12);
    }

    #[test]
    fn average_is_none_with_zero_matches() {
        let series = vec![datum(2019, 0.10)];
        assert_eq!(average_growth(&series, &[2022, 2023, 2024]), None);
        assert_eq!(average_growth(&[], &[2022]), None);
        assert_eq!(average_growth(&series, &[]), None);
    }
}
