//! Centralized engine defaults.
//!
//! Changing a value here affects every caller that builds `LiveParams`
//! without overriding it.

/// Days-per-unit substituted in the all-groups path when a product group has
/// no benchmark row. The cross-group view degrades to this estimate rather
/// than failing wholesale because one group lacks history.
pub const FALLBACK_DAYS_PER_UNIT: f64 = 90.0;

/// Default grace period before a projected depletion counts as urgent.
pub const DEFAULT_DUE_SOON_WINDOW_DAYS: i64 = 14;

/// Units assumed when a row records no holdings. A customer with zero or
/// unknown recorded units is still assumed to hold one unit, so an estimate
/// never drops below a single unit's coverage.
pub const MIN_UNITS_OWNED: f64 = 1.0;
