//! Depletion estimation and urgency classification.
//!
//! The estimator projects, for one customer-product row, how long the
//! customer's holdings last and when they run out; the classifier maps the
//! signed distance to that date into exactly one of three urgency states.
//! Both are pure functions of their arguments.
//!
//! Coverage math, for one row:
//!   units    = max(units_owned or 1, 1)
//!   coverage = round(days_per_unit x units)       whole days, ties to even
//!   due_date = last_purchase_date + coverage
//!   days_to_due = due_date - as_of_date           signed days

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::asof::resolve_asof_date_at;
use crate::benchmark::{resolve_days_per_unit, resolve_days_per_unit_by_group};
use crate::defaults::MIN_UNITS_OWNED;
use crate::error::EngineResult;
use crate::params::LiveParams;
use crate::types::{BenchmarkRow, CustomerProductRecord, StatusRecord, UrgencyStatus};

/// Map a signed days-to-due onto an urgency status.
///
/// Total and mutually exclusive for every integer input and every
/// non-negative window; a window of 0 collapses the due-soon band to the
/// single boundary `days_to_due == 0`.
pub fn classify_urgency(days_to_due: i64, due_soon_window: i64) -> UrgencyStatus {
    if days_to_due < 0 {
        UrgencyStatus::Overdue
    } else if days_to_due <= due_soon_window {
        UrgencyStatus::DueSoon
    } else {
        UrgencyStatus::Ok
    }
}

/// Derive the full status row for one customer-product record.
///
/// `days_per_unit` must already be resolved and positive; zero and unknown
/// holdings both clamp to one unit, so an estimate never drops below a single
/// unit's coverage.
pub fn derive_status(
    record: &CustomerProductRecord,
    days_per_unit: f64,
    asof_date: NaiveDate,
    due_soon_window: i64,
) -> StatusRecord {
    let units = record.units_owned.unwrap_or(MIN_UNITS_OWNED).max(MIN_UNITS_OWNED);
    // Ties round to even, so exact half-day products don't drift upward.
    let coverage_days = (days_per_unit * units).round_ties_even() as i64;
    let due_date = record.last_purchase_date + Duration::days(coverage_days);
    let days_to_due = (due_date - asof_date).num_days();

    StatusRecord {
        customer_id: record.customer_id.clone(),
        product_group: record.product_group.clone(),
        last_purchase_date: record.last_purchase_date,
        units_owned: record.units_owned,
        days_per_unit_used: days_per_unit,
        coverage_days_estimate: coverage_days,
        due_date,
        days_to_due,
        status: classify_urgency(days_to_due, due_soon_window),
    }
}

/// Row-level result table for a single product group, plus the resolved
/// scalars callers surface alongside it.
#[derive(Clone, Debug, Serialize)]
pub struct GroupStatusView {
    pub product_group: String,
    pub asof_date: NaiveDate,
    pub days_per_unit: f64,
    pub rows: Vec<StatusRecord>,
}

/// Row-level result table across all product groups.
#[derive(Clone, Debug, Serialize)]
pub struct StatusTable {
    pub asof_date: NaiveDate,
    pub rows: Vec<StatusRecord>,
}

/// Compute the live status table for one product group.
///
/// Fails fast: an empty table in dataset mode, an unknown product group in
/// quantile mode, or an invalid parameter tuple all surface as errors.
pub fn compute_group_status(
    live: &[CustomerProductRecord],
    benchmarks: &[BenchmarkRow],
    product_group: &str,
    params: &LiveParams,
    today: NaiveDate,
) -> EngineResult<GroupStatusView> {
    params.validate()?;
    let asof_date = resolve_asof_date_at(live, params.asof, today)?;
    let days_per_unit = resolve_days_per_unit(benchmarks, product_group, &params.benchmark)?;

    let rows = live
        .iter()
        .filter(|r| r.product_group == product_group)
        .map(|r| derive_status(r, days_per_unit, asof_date, params.due_soon_window_days))
        .collect();

    Ok(GroupStatusView {
        product_group: product_group.to_string(),
        asof_date,
        days_per_unit,
        rows,
    })
}

/// Compute the live status table across every product group in the input.
///
/// Favors availability: groups without a benchmark row are estimated with
/// `params.missing_benchmark_fallback` instead of failing the whole view.
/// Row order follows input order.
pub fn compute_all_groups_status(
    live: &[CustomerProductRecord],
    benchmarks: &[BenchmarkRow],
    params: &LiveParams,
    today: NaiveDate,
) -> EngineResult<StatusTable> {
    params.validate()?;
    let asof_date = resolve_asof_date_at(live, params.asof, today)?;
    let by_group = resolve_days_per_unit_by_group(
        live,
        benchmarks,
        &params.benchmark,
        params.missing_benchmark_fallback,
    )?;

    let rows = live
        .iter()
        .map(|r| {
            let days_per_unit = by_group
                .get(&r.product_group)
                .copied()
                .unwrap_or(params.missing_benchmark_fallback);
            derive_status(r, days_per_unit, asof_date, params.due_soon_window_days)
        })
        .collect();

    Ok(StatusTable { asof_date, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{AsofMode, BenchmarkQuantile, BenchmarkSelection};

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn record(customer: &str, group: &str, last: &str, units: Option<f64>) -> CustomerProductRecord {
        CustomerProductRecord {
            customer_id: customer.into(),
            product_group: group.into(),
            last_purchase_date: date(last),
            units_owned: units,
        }
    }

    // -----------------------------------------------------------------------
    // Classifier
    // -----------------------------------------------------------------------

    #[test]
    fn classifier_bands_are_exhaustive_and_exclusive() {
        for window in [0i64, 1, 14, 60] {
            for d in -400..400i64 {
                let status = classify_urgency(d, window);
                let expected = if d < 0 {
                    UrgencyStatus::Overdue
                } else if d <= window {
                    UrgencyStatus::DueSoon
                } else {
                    UrgencyStatus::Ok
                };
                assert_eq!(status, expected, "d={} window={}", d, window);
            }
        }
    }

    #[test]
    fn classification_is_monotonic_in_days_to_due() {
        // Walking days_to_due downward never moves a row away from overdue.
        let severity = |s: UrgencyStatus| match s {
            UrgencyStatus::Ok => 0,
            UrgencyStatus::DueSoon => 1,
            UrgencyStatus::Overdue => 2,
        };
        let window = 14;
        for d in -100..100i64 {
            assert!(
                severity(classify_urgency(d - 1, window)) >= severity(classify_urgency(d, window))
            );
        }
    }

    #[test]
    fn zero_window_collapses_due_soon_to_the_boundary() {
        assert_eq!(classify_urgency(-1, 0), UrgencyStatus::Overdue);
        assert_eq!(classify_urgency(0, 0), UrgencyStatus::DueSoon);
        assert_eq!(classify_urgency(1, 0), UrgencyStatus::Ok);
    }

    // -----------------------------------------------------------------------
    // Estimator
    // -----------------------------------------------------------------------

    #[test]
    fn two_units_at_ninety_days_each_go_overdue_after_two_hundred_days() {
        // Worked example: 2 units x 90 days = 180-day coverage, checked 200
        // days after purchase.
        let r = record("c-1", "red_wine", "2024-01-01", Some(2.0));
        let asof = date("2024-01-01") + Duration::days(200);
        let status = derive_status(&r, 90.0, asof, 14);

        assert_eq!(status.coverage_days_estimate, 180);
        assert_eq!(status.due_date, date("2024-06-29"));
        assert_eq!(status.days_to_due, -20);
        assert_eq!(status.status, UrgencyStatus::Overdue);
    }

    #[test]
    fn unknown_zero_and_negative_units_all_clamp_to_one() {
        let asof = date("2024-01-01");
        for units in [None, Some(0.0), Some(0.4), Some(-3.0)] {
            let r = record("c-1", "red_wine", "2024-01-01", units);
            let status = derive_status(&r, 90.0, asof, 14);
            assert_eq!(status.coverage_days_estimate, 90, "units={:?}", units);
        }
    }

    #[test]
    fn fractional_units_round_to_whole_days() {
        let r = record("c-1", "red_wine", "2024-01-01", Some(1.5));
        let status = derive_status(&r, 45.0, date("2024-01-01"), 14);
        // 45 x 1.5 = 67.5, rounds to 68
        assert_eq!(status.coverage_days_estimate, 68);
    }

    #[test]
    fn half_day_products_round_to_even() {
        let asof = date("2024-01-01");
        let r = record("c-1", "red_wine", "2024-01-01", Some(1.0));
        // 2.5 -> 2, 3.5 -> 4: nearest even neighbour, not away from zero.
        assert_eq!(derive_status(&r, 2.5, asof, 0).coverage_days_estimate, 2);
        assert_eq!(derive_status(&r, 3.5, asof, 0).coverage_days_estimate, 4);
    }

    #[test]
    fn due_date_arithmetic_crosses_leap_day_exactly() {
        let r = record("c-1", "red_wine", "2024-02-28", Some(1.0));
        let status = derive_status(&r, 2.0, date("2024-02-28"), 0);
        assert_eq!(status.due_date, date("2024-03-01"));
        assert_eq!(status.days_to_due, 2);
    }

    #[test]
    fn due_date_arithmetic_crosses_year_boundary_exactly() {
        let r = record("c-1", "red_wine", "2023-12-20", Some(1.0));
        let status = derive_status(&r, 20.0, date("2024-01-05"), 14);
        assert_eq!(status.due_date, date("2024-01-09"));
        assert_eq!(status.days_to_due, 4);
        assert_eq!(status.status, UrgencyStatus::DueSoon);
    }

    // -----------------------------------------------------------------------
    // Group computation
    // -----------------------------------------------------------------------

    fn benchmarks() -> Vec<BenchmarkRow> {
        vec![BenchmarkRow {
            product_group: "red_wine".into(),
            p25: 30.0,
            median: 90.0,
            p75: 120.0,
        }]
    }

    #[test]
    fn single_row_dataset_resolves_to_its_own_purchase_date() {
        // Second worked example: dataset as-of over one row, median benchmark.
        let live = vec![record("c-1", "red_wine", "2024-01-01", Some(1.0))];
        let params = LiveParams::new(
            AsofMode::Dataset,
            BenchmarkSelection::Quantile(BenchmarkQuantile::Median),
        );
        let view =
            compute_group_status(&live, &benchmarks(), "red_wine", &params, date("2025-01-01"))
                .unwrap();

        assert_eq!(view.asof_date, date("2024-01-01"));
        assert_eq!(view.days_per_unit, 90.0);
        let row = &view.rows[0];
        assert_eq!(row.coverage_days_estimate, 90);
        assert_eq!(row.due_date, date("2024-03-31"));
        assert_eq!(row.days_to_due, 90);
        assert_eq!(row.status, UrgencyStatus::Ok);
    }

    #[test]
    fn group_computation_filters_to_the_requested_group() {
        let live = vec![
            record("c-1", "red_wine", "2024-01-01", Some(1.0)),
            record("c-2", "gin", "2024-01-01", Some(1.0)),
        ];
        let params = LiveParams::new(AsofMode::Dataset, BenchmarkSelection::Manual(30.0));
        let view =
            compute_group_status(&live, &benchmarks(), "red_wine", &params, date("2025-01-01"))
                .unwrap();
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].customer_id, "c-1");
    }

    #[test]
    fn all_groups_computation_covers_every_row_with_fallback() {
        let live = vec![
            record("c-1", "red_wine", "2024-01-01", Some(1.0)),
            record("c-2", "gin", "2024-01-01", Some(1.0)),
        ];
        let params = LiveParams::new(
            AsofMode::Dataset,
            BenchmarkSelection::Quantile(BenchmarkQuantile::Median),
        );
        let table =
            compute_all_groups_status(&live, &benchmarks(), &params, date("2025-01-01")).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].days_per_unit_used, 90.0);
        // gin has no benchmark row: falls back to the documented default
        assert_eq!(table.rows[1].days_per_unit_used, 90.0);
        assert_eq!(table.rows[1].coverage_days_estimate, 90);
    }

    #[test]
    fn repeated_computation_is_deterministic() {
        let live = vec![
            record("c-1", "red_wine", "2024-01-01", Some(2.0)),
            record("c-2", "red_wine", "2024-02-01", None),
        ];
        let params = LiveParams::new(AsofMode::Dataset, BenchmarkSelection::Manual(60.0));
        let a = compute_all_groups_status(&live, &benchmarks(), &params, date("2025-01-01")).unwrap();
        let b = compute_all_groups_status(&live, &benchmarks(), &params, date("2025-01-01")).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
