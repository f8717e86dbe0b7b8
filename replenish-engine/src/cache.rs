//! Result memoization.
//!
//! Every engine output is a pure function of (input tables, parameter tuple,
//! injected today), so results can be cached keyed by a digest of exactly
//! those inputs. This layer is an optimization only: a cache hit returns a
//! table bit-identical to recomputation.

use chrono::NaiveDate;

use crate::error::EngineResult;
use crate::estimate::{compute_all_groups_status, StatusTable};
use crate::params::{BenchmarkSelection, LiveParams};
use crate::types::{BenchmarkRow, CustomerProductRecord};

/// FNV-1a hash for deterministic digests.
pub fn fnv1a_hash(data: &[u8]) -> u64 {
    let mut hash: u64 = 14695981039346656037;
    for &byte in data {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    hash
}

fn fnv1a_extend(mut hash: u64, data: &[u8]) -> u64 {
    for &byte in data {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    hash
}

/// Content digest of the two input tables.
pub fn table_digest(live: &[CustomerProductRecord], benchmarks: &[BenchmarkRow]) -> u64 {
    let mut hash = fnv1a_hash(b"replenish_status_v1");
    for r in live {
        hash = fnv1a_extend(hash, r.customer_id.as_bytes());
        hash = fnv1a_extend(hash, r.product_group.as_bytes());
        hash = fnv1a_extend(hash, r.last_purchase_date.to_string().as_bytes());
        hash = fnv1a_extend(hash, &r.units_owned.unwrap_or(f64::NAN).to_bits().to_le_bytes());
    }
    for b in benchmarks {
        hash = fnv1a_extend(hash, b.product_group.as_bytes());
        for v in [b.p25, b.median, b.p75] {
            hash = fnv1a_extend(hash, &v.to_bits().to_le_bytes());
        }
    }
    hash
}

/// Digest of the parameter tuple plus the injected current date.
pub fn params_digest(params: &LiveParams, today: NaiveDate) -> u64 {
    let mut hash = fnv1a_hash(params.asof.to_string().as_bytes());
    match params.benchmark {
        BenchmarkSelection::Quantile(q) => {
            hash = fnv1a_extend(hash, b"quantile");
            hash = fnv1a_extend(hash, q.to_string().as_bytes());
        }
        BenchmarkSelection::Manual(days) => {
            hash = fnv1a_extend(hash, b"manual");
            hash = fnv1a_extend(hash, &days.to_bits().to_le_bytes());
        }
    }
    hash = fnv1a_extend(hash, &params.due_soon_window_days.to_le_bytes());
    hash = fnv1a_extend(
        hash,
        &params.missing_benchmark_fallback.to_bits().to_le_bytes(),
    );
    if let Some(group) = &params.product_group {
        hash = fnv1a_extend(hash, group.as_bytes());
    }
    fnv1a_extend(hash, today.to_string().as_bytes())
}

/// Pluggable cache for computed status tables.
pub trait StatusCache {
    fn get(&self, key: u64) -> Option<&StatusTable>;
    fn put(&mut self, key: u64, table: StatusTable);
}

/// Simple unbounded in-memory cache. Input tables are loaded once per
/// session and parameter tuples are few, so eviction is not worth carrying.
#[derive(Default)]
pub struct MemoryStatusCache {
    entries: std::collections::HashMap<u64, StatusTable>,
}

impl MemoryStatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StatusCache for MemoryStatusCache {
    fn get(&self, key: u64) -> Option<&StatusTable> {
        self.entries.get(&key)
    }

    fn put(&mut self, key: u64, table: StatusTable) {
        self.entries.insert(key, table);
    }
}

/// Memoizing wrapper around the all-groups computation.
pub struct CachedStatusEngine<C: StatusCache> {
    cache: C,
}

impl<C: StatusCache> CachedStatusEngine<C> {
    pub fn new(cache: C) -> Self {
        CachedStatusEngine { cache }
    }

    /// Compute the all-groups status table, reusing a cached result when the
    /// tables, parameters, and injected date are unchanged.
    pub fn all_groups_status(
        &mut self,
        live: &[CustomerProductRecord],
        benchmarks: &[BenchmarkRow],
        params: &LiveParams,
        today: NaiveDate,
    ) -> EngineResult<StatusTable> {
        let key = table_digest(live, benchmarks) ^ params_digest(params, today);
        if let Some(table) = self.cache.get(key) {
            log::debug!("status cache hit for key {:016x}", key);
            return Ok(table.clone());
        }
        let table = compute_all_groups_status(live, benchmarks, params, today)?;
        self.cache.put(key, table.clone());
        Ok(table)
    }
}
