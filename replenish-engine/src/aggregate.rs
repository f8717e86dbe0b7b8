//! Cross-product and cross-customer aggregation.
//!
//! Rolls the row-level status table up into (a) per-product-group operational
//! metrics and (b) a per-customer contact list keyed by each customer's most
//! urgent product.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::types::{PurchaseInterval, StatusRecord, UrgencyStatus};

/// Operational summary for one product group.
#[derive(Clone, Debug, Serialize)]
pub struct ProductGroupMetrics {
    pub product_group: String,
    /// Distinct customers holding this product group.
    pub customers: usize,
    /// Distinct customers with at least one observed repeat-purchase cycle.
    pub repeat_customers: usize,
    /// Median of adjusted retention days over this group's intervals.
    /// `None` when the group has no historical intervals.
    pub median_retention_days: Option<f64>,
    pub overdue_customers: usize,
    pub due_soon_customers: usize,
    /// Non-negative residual: total minus overdue minus due-soon, floored at
    /// zero so a customer appearing under several statuses cannot push the
    /// count negative.
    pub ok_customers: usize,
    pub repeat_rate_pct: f64,
    pub overdue_rate_pct: f64,
    pub due_soon_rate_pct: f64,
    pub ok_rate_pct: f64,
}

/// Per-group metrics over a status table and the historical intervals.
///
/// Groups come from the union of both tables: a group with interval history
/// but no live rows still gets a metrics row (zero customers, zero rates),
/// mirroring an outer join on group. Groups are reported by descending
/// customer count; ties break on group name so repeated runs produce
/// identical output.
pub fn product_group_metrics(
    rows: &[StatusRecord],
    intervals: &[PurchaseInterval],
) -> Vec<ProductGroupMetrics> {
    let mut groups: Vec<&str> = rows
        .iter()
        .map(|r| r.product_group.as_str())
        .chain(intervals.iter().map(|i| i.product_group.as_str()))
        .collect();
    groups.sort_unstable();
    groups.dedup();

    let mut metrics: Vec<ProductGroupMetrics> = groups
        .into_iter()
        .map(|group| {
            let customers = distinct_customers(rows, group, None);
            let overdue_customers = distinct_customers(rows, group, Some(UrgencyStatus::Overdue));
            let due_soon_customers = distinct_customers(rows, group, Some(UrgencyStatus::DueSoon));
            let ok_customers = customers.saturating_sub(overdue_customers + due_soon_customers);

            let repeat_customers = intervals
                .iter()
                .filter(|i| i.product_group == group)
                .map(|i| i.customer_id.as_str())
                .collect::<HashSet<_>>()
                .len();
            let retention: Vec<f64> = intervals
                .iter()
                .filter(|i| i.product_group == group)
                .map(|i| i.adjusted_retention_days)
                .collect();

            ProductGroupMetrics {
                product_group: group.to_string(),
                customers,
                repeat_customers,
                median_retention_days: median(&retention),
                overdue_customers,
                due_soon_customers,
                ok_customers,
                repeat_rate_pct: rate_pct(repeat_customers, customers),
                overdue_rate_pct: rate_pct(overdue_customers, customers),
                due_soon_rate_pct: rate_pct(due_soon_customers, customers),
                ok_rate_pct: rate_pct(ok_customers, customers),
            }
        })
        .collect();

    metrics.sort_by(|a, b| {
        b.customers
            .cmp(&a.customers)
            .then_with(|| a.product_group.cmp(&b.product_group))
    });
    metrics
}

/// One row per customer: their single most urgent actionable product.
///
/// Restricts to overdue and due-soon rows, keeps the row with the strictly
/// smallest `days_to_due` per customer (first occurrence wins ties), and
/// returns the result sorted most-urgent-first.
pub fn most_urgent_per_customer(rows: &[StatusRecord]) -> Vec<StatusRecord> {
    let mut slot_by_customer: HashMap<&str, usize> = HashMap::new();
    let mut selected: Vec<&StatusRecord> = Vec::new();

    for row in rows.iter().filter(|r| r.status.is_actionable()) {
        match slot_by_customer.get(row.customer_id.as_str()) {
            None => {
                slot_by_customer.insert(row.customer_id.as_str(), selected.len());
                selected.push(row);
            }
            Some(&slot) => {
                // Strict comparison keeps the earlier row on ties.
                if row.days_to_due < selected[slot].days_to_due {
                    selected[slot] = row;
                }
            }
        }
    }

    let mut out: Vec<StatusRecord> = selected.into_iter().cloned().collect();
    out.sort_by_key(|r| r.days_to_due);
    out
}

/// All of one customer's rows, most urgent first. Ordering: status severity,
/// then days-to-due, then product group.
pub fn customer_drilldown(rows: &[StatusRecord], customer_id: &str) -> Vec<StatusRecord> {
    let mut out: Vec<StatusRecord> = rows
        .iter()
        .filter(|r| r.customer_id == customer_id)
        .cloned()
        .collect();
    out.sort_by(|a, b| {
        a.status
            .cmp(&b.status)
            .then(a.days_to_due.cmp(&b.days_to_due))
            .then_with(|| a.product_group.cmp(&b.product_group))
    });
    out
}

/// Median of a slice. Even lengths average the two middle values; empty
/// input yields `None`.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

fn distinct_customers(rows: &[StatusRecord], group: &str, status: Option<UrgencyStatus>) -> usize {
    rows.iter()
        .filter(|r| r.product_group == group && status.map_or(true, |s| r.status == s))
        .map(|r| r.customer_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

fn rate_pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
