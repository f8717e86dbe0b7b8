//! Days-per-unit benchmark resolution.
//!
//! A benchmark answers one question: how many days does a single unit of a
//! product group last? The answer comes from a quantile column of the
//! precomputed benchmark table, or from a manually supplied constant.
//!
//! Two resolution paths with different failure behaviour:
//! - single group: a missing benchmark row is an error surfaced to the caller
//! - all groups: a missing row is masked with a fallback, because the
//!   cross-group view must never fail wholesale over one group's history

use std::collections::BTreeMap;

use crate::error::{EngineError, EngineResult};
use crate::params::{BenchmarkQuantile, BenchmarkSelection};
use crate::types::{BenchmarkRow, CustomerProductRecord};

impl BenchmarkRow {
    /// The candidate value for one quantile column.
    pub fn quantile(&self, q: BenchmarkQuantile) -> f64 {
        match q {
            BenchmarkQuantile::P25 => self.p25,
            BenchmarkQuantile::Median => self.median,
            BenchmarkQuantile::P75 => self.p75,
        }
    }
}

/// Resolve days-per-unit for a single product group.
pub fn resolve_days_per_unit(
    benchmarks: &[BenchmarkRow],
    product_group: &str,
    selection: &BenchmarkSelection,
) -> EngineResult<f64> {
    selection.validate()?;
    match selection {
        BenchmarkSelection::Manual(days) => Ok(*days),
        BenchmarkSelection::Quantile(q) => benchmarks
            .iter()
            .find(|row| row.product_group == product_group)
            .map(|row| row.quantile(*q))
            .ok_or_else(|| EngineError::UnknownProductGroup(product_group.to_string())),
    }
}

/// Resolve days-per-unit for every product group present in the live table.
///
/// Groups without a benchmark row get `fallback` instead of an error, so the
/// aggregate view degrades gracefully. Each substitution is logged.
pub fn resolve_days_per_unit_by_group(
    live: &[CustomerProductRecord],
    benchmarks: &[BenchmarkRow],
    selection: &BenchmarkSelection,
    fallback: f64,
) -> EngineResult<BTreeMap<String, f64>> {
    selection.validate()?;
    let mut by_group = BTreeMap::new();
    for record in live {
        if by_group.contains_key(&record.product_group) {
            continue;
        }
        let days = match selection {
            BenchmarkSelection::Manual(days) => *days,
            BenchmarkSelection::Quantile(q) => benchmarks
                .iter()
                .find(|row| row.product_group == record.product_group)
                .map(|row| row.quantile(*q))
                .unwrap_or_else(|| {
                    log::warn!(
                        "no benchmark row for product group '{}', using fallback of {} days",
                        record.product_group,
                        fallback
                    );
                    fallback
                }),
        };
        by_group.insert(record.product_group.clone(), days);
    }
    Ok(by_group)
}

/// Human-readable description of the active benchmark, for captions and
/// report headers. Pure formatting.
pub fn benchmark_label(selection: &BenchmarkSelection) -> String {
    match selection {
        BenchmarkSelection::Manual(days) => {
            format!("Manual retention = {:.0} days/unit", days)
        }
        BenchmarkSelection::Quantile(q) => {
            format!("Benchmark = {} days/unit (per product group)", q)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn benchmarks() -> Vec<BenchmarkRow> {
        vec![
            BenchmarkRow {
                product_group: "red_wine".into(),
                p25: 30.0,
                median: 60.0,
                p75: 120.0,
            },
            BenchmarkRow {
                product_group: "white_wine".into(),
                p25: 25.0,
                median: 45.0,
                p75: 90.0,
            },
        ]
    }

    fn live_record(group: &str) -> CustomerProductRecord {
        CustomerProductRecord {
            customer_id: "c-1".into(),
            product_group: group.into(),
            last_purchase_date: "2024-01-01".parse().unwrap(),
            units_owned: Some(1.0),
        }
    }

    #[test]
    fn quantile_mode_reads_the_requested_column() {
        let sel = BenchmarkSelection::Quantile(BenchmarkQuantile::P75);
        let days = resolve_days_per_unit(&benchmarks(), "red_wine", &sel).unwrap();
        assert_eq!(days, 120.0);
    }

    #[test]
    fn manual_mode_returns_the_supplied_value() {
        let sel = BenchmarkSelection::Manual(42.5);
        let days = resolve_days_per_unit(&benchmarks(), "red_wine", &sel).unwrap();
        assert_eq!(days, 42.5);
    }

    #[test]
    fn manual_mode_rejects_non_positive_values() {
        let sel = BenchmarkSelection::Manual(-1.0);
        assert!(resolve_days_per_unit(&benchmarks(), "red_wine", &sel).is_err());
    }

    #[test]
    fn unknown_group_fails_in_single_group_mode() {
        let sel = BenchmarkSelection::Quantile(BenchmarkQuantile::Median);
        let err = resolve_days_per_unit(&benchmarks(), "rum", &sel).unwrap_err();
        assert!(matches!(err, EngineError::UnknownProductGroup(g) if g == "rum"));
    }

    #[test]
    fn batched_path_masks_missing_benchmarks_with_fallback() {
        let live = vec![
            live_record("red_wine"),
            live_record("rum"),
            live_record("red_wine"),
        ];
        let sel = BenchmarkSelection::Quantile(BenchmarkQuantile::Median);
        let by_group = resolve_days_per_unit_by_group(&live, &benchmarks(), &sel, 90.0).unwrap();
        assert_eq!(by_group.len(), 2);
        assert_eq!(by_group["red_wine"], 60.0);
        assert_eq!(by_group["rum"], 90.0);
    }

    #[test]
    fn batched_manual_mode_broadcasts_to_every_group() {
        let live = vec![live_record("red_wine"), live_record("white_wine")];
        let sel = BenchmarkSelection::Manual(75.0);
        let by_group = resolve_days_per_unit_by_group(&live, &benchmarks(), &sel, 90.0).unwrap();
        assert!(by_group.values().all(|d| *d == 75.0));
    }

    #[test]
    fn labels_describe_the_active_mode() {
        assert_eq!(
            benchmark_label(&BenchmarkSelection::Manual(90.0)),
            "Manual retention = 90 days/unit"
        );
        assert_eq!(
            benchmark_label(&BenchmarkSelection::Quantile(BenchmarkQuantile::P25)),
            "Benchmark = p25 days/unit (per product group)"
        );
    }
}
