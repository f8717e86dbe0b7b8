//! Control parameters for a live status computation.
//!
//! The engine never reads ambient state: everything that influences a result
//! travels in one explicit `LiveParams` tuple, validated before any
//! computation runs.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::defaults;
use crate::error::{EngineError, EngineResult};

/// How the reference "as-of" date is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AsofMode {
    /// Latest `last_purchase_date` observed in the live table.
    Dataset,
    /// The current calendar date.
    Today,
}

impl FromStr for AsofMode {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        match s {
            "dataset" => Ok(AsofMode::Dataset),
            "today" => Ok(AsofMode::Today),
            other => Err(EngineError::invalid(
                "asof_mode",
                format!("expected 'dataset' or 'today', got '{}'", other),
            )),
        }
    }
}

impl fmt::Display for AsofMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsofMode::Dataset => write!(f, "dataset"),
            AsofMode::Today => write!(f, "today"),
        }
    }
}

/// Which column of the benchmark table supplies days-per-unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkQuantile {
    P25,
    Median,
    P75,
}

impl FromStr for BenchmarkQuantile {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        match s {
            "p25" => Ok(BenchmarkQuantile::P25),
            "median" => Ok(BenchmarkQuantile::Median),
            "p75" => Ok(BenchmarkQuantile::P75),
            other => Err(EngineError::invalid(
                "benchmark_quantile",
                format!("expected 'p25', 'median' or 'p75', got '{}'", other),
            )),
        }
    }
}

impl fmt::Display for BenchmarkQuantile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchmarkQuantile::P25 => write!(f, "p25"),
            BenchmarkQuantile::Median => write!(f, "median"),
            BenchmarkQuantile::P75 => write!(f, "p75"),
        }
    }
}

/// Benchmark source: a quantile of the per-group benchmark table, or a
/// manually supplied constant applied to every group.
///
/// The payload carries the mode's required argument, so "quantile mode
/// without a quantile" or "manual mode without a value" cannot be built.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum BenchmarkSelection {
    Quantile(BenchmarkQuantile),
    Manual(f64),
}

impl BenchmarkSelection {
    /// Reject non-positive or non-finite manual values before computation.
    pub fn validate(&self) -> EngineResult<()> {
        match self {
            BenchmarkSelection::Quantile(_) => Ok(()),
            BenchmarkSelection::Manual(days) => {
                if days.is_finite() && *days > 0.0 {
                    Ok(())
                } else {
                    Err(EngineError::invalid(
                        "manual_days_per_unit",
                        format!("must be a positive finite number, got {}", days),
                    ))
                }
            }
        }
    }
}

/// The full control tuple for one live status computation.
#[derive(Clone, Debug, Serialize)]
pub struct LiveParams {
    pub asof: AsofMode,
    pub benchmark: BenchmarkSelection,
    /// Inclusive upper bound of the due-soon band, in days.
    pub due_soon_window_days: i64,
    /// Days-per-unit substituted for groups without a benchmark row in the
    /// all-groups path.
    pub missing_benchmark_fallback: f64,
    /// Restrict the computation to one product group.
    pub product_group: Option<String>,
}

impl LiveParams {
    pub fn new(asof: AsofMode, benchmark: BenchmarkSelection) -> Self {
        LiveParams {
            asof,
            benchmark,
            due_soon_window_days: defaults::DEFAULT_DUE_SOON_WINDOW_DAYS,
            missing_benchmark_fallback: defaults::FALLBACK_DAYS_PER_UNIT,
            product_group: None,
        }
    }

    /// Validate the whole tuple. Called by every engine entry point before
    /// touching the input tables.
    pub fn validate(&self) -> EngineResult<()> {
        self.benchmark.validate()?;
        if self.due_soon_window_days < 0 {
            return Err(EngineError::invalid(
                "due_soon_window_days",
                format!("must be >= 0, got {}", self.due_soon_window_days),
            ));
        }
        if !(self.missing_benchmark_fallback.is_finite() && self.missing_benchmark_fallback > 0.0) {
            return Err(EngineError::invalid(
                "missing_benchmark_fallback",
                format!(
                    "must be a positive finite number, got {}",
                    self.missing_benchmark_fallback
                ),
            ));
        }
        Ok(())
    }
}
