use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Input tables
// ---------------------------------------------------------------------------

/// Live snapshot row: one per customer x product group.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustomerProductRecord {
    /// Opaque anonymized customer identifier.
    pub customer_id: String,
    pub product_group: String,
    /// Date of the most recent purchase in this product group.
    pub last_purchase_date: NaiveDate,
    /// Units currently held. `None` means unknown; the estimator treats
    /// unknown and zero alike (both clamp to one unit).
    pub units_owned: Option<f64>,
}

/// One observed repeat-purchase cycle, normalized per unit.
///
/// Historical input only: the live estimator never reads these rows, the
/// aggregator uses them for repeat-customer counts and median retention.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PurchaseInterval {
    pub customer_id: String,
    pub product_group: String,
    /// Days between consecutive purchases, divided by units bought.
    pub adjusted_retention_days: f64,
}

/// Precomputed retention benchmark for one product group: three candidate
/// days-per-unit values at different quantiles of historical behaviour.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchmarkRow {
    pub product_group: String,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
}

// ---------------------------------------------------------------------------
// Derived output
// ---------------------------------------------------------------------------

/// Replenishment urgency for a single customer-product row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyStatus {
    /// Projected depletion is past the as-of date.
    Overdue,
    /// Projected depletion falls within the due-soon window.
    DueSoon,
    /// Projected depletion is beyond the due-soon window.
    Ok,
}

impl UrgencyStatus {
    /// True for the statuses that warrant contacting the customer.
    pub fn is_actionable(self) -> bool {
        matches!(self, UrgencyStatus::Overdue | UrgencyStatus::DueSoon)
    }
}

impl fmt::Display for UrgencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrgencyStatus::Overdue => write!(f, "overdue"),
            UrgencyStatus::DueSoon => write!(f, "due_soon"),
            UrgencyStatus::Ok => write!(f, "ok"),
        }
    }
}

/// Output of the depletion estimator + urgency classifier: one per input
/// CustomerProductRecord. Recomputed on every parameter change, never
/// persisted.
#[derive(Clone, Debug, Serialize)]
pub struct StatusRecord {
    pub customer_id: String,
    pub product_group: String,
    pub last_purchase_date: NaiveDate,
    pub units_owned: Option<f64>,
    /// The days-per-unit benchmark this row was estimated with.
    pub days_per_unit_used: f64,
    /// round(days_per_unit x clamped units), whole days.
    pub coverage_days_estimate: i64,
    /// last_purchase_date + coverage_days_estimate.
    pub due_date: NaiveDate,
    /// Signed day distance from the as-of date to the due date.
    /// Negative means the projected depletion already passed.
    pub days_to_due: i64,
    pub status: UrgencyStatus,
}
