//! Reference date resolution.
//!
//! Every "time remaining" figure in the engine is measured against a single
//! as-of date: either the newest purchase date in the live table (so a
//! historical export stays internally consistent) or the real current date.

use chrono::{Local, NaiveDate};

use crate::error::{EngineError, EngineResult};
use crate::params::AsofMode;
use crate::types::CustomerProductRecord;

/// Resolve the as-of date for a live table.
///
/// `Today` mode reads the system clock; for clock-free callers and tests use
/// [`resolve_asof_date_at`].
pub fn resolve_asof_date(
    live: &[CustomerProductRecord],
    mode: AsofMode,
) -> EngineResult<NaiveDate> {
    resolve_asof_date_at(live, mode, Local::now().date_naive())
}

/// Clock-injected variant: `today` stands in for the current date.
pub fn resolve_asof_date_at(
    live: &[CustomerProductRecord],
    mode: AsofMode,
    today: NaiveDate,
) -> EngineResult<NaiveDate> {
    match mode {
        AsofMode::Today => Ok(today),
        AsofMode::Dataset => live
            .iter()
            .map(|r| r.last_purchase_date)
            .max()
            .ok_or(EngineError::EmptyInput),
    }
}
