//! Live replenishment status engine.
//!
//! Estimates, per customer and product group, when the customer's current
//! stock is expected to run out, classifies replenishment urgency
//! (ok / due_soon / overdue), and aggregates the per-row results into
//! product-group and customer-level views.
//!
//! The engine is a pure library: every entry point is a deterministic,
//! side-effect-free function of immutable input tables plus an explicit
//! parameter tuple. Loading tables and rendering results belong to callers.

pub mod aggregate;
pub mod asof;
pub mod benchmark;
pub mod cache;
pub mod defaults;
pub mod error;
pub mod estimate;
pub mod params;
pub mod types;

pub use aggregate::{most_urgent_per_customer, product_group_metrics, ProductGroupMetrics};
pub use asof::resolve_asof_date;
pub use benchmark::{benchmark_label, resolve_days_per_unit, resolve_days_per_unit_by_group};
pub use cache::{CachedStatusEngine, MemoryStatusCache, StatusCache};
pub use error::{EngineError, EngineResult};
pub use estimate::{
    classify_urgency, compute_all_groups_status, compute_group_status, derive_status,
    GroupStatusView, StatusTable,
};
pub use params::{AsofMode, BenchmarkQuantile, BenchmarkSelection, LiveParams};
pub use types::{BenchmarkRow, CustomerProductRecord, PurchaseInterval, StatusRecord, UrgencyStatus};
