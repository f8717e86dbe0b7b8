//! CSV loaders for the three input tables.
//!
//! Expected columns:
//!   live_customer_product_state: customer_id, product_group,
//!     last_purchase_date (YYYY-MM-DD), units_owned (may be empty)
//!   purchase_intervals: customer_id, product_group, adjusted_retention_days
//!   retention_benchmarks: product_group, p25, median, p75
//!
//! Loading is presentation-side glue: errors here are contextual strings,
//! not part of the engine's error taxonomy.

use std::io::Read;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use replenish_engine::{BenchmarkRow, CustomerProductRecord, PurchaseInterval};

/// Load the live customer-product snapshot from a CSV reader.
pub fn load_live_state<R: Read>(reader: R) -> Result<Vec<CustomerProductRecord>, String> {
    deserialize_csv::<LiveStateCsv, R>(reader, "live_customer_product_state")
        .map(|rows| rows.into_iter().map(LiveStateCsv::into_record).collect())
}

/// Load the historical purchase intervals from a CSV reader.
pub fn load_intervals<R: Read>(reader: R) -> Result<Vec<PurchaseInterval>, String> {
    deserialize_csv(reader, "purchase_intervals")
}

/// Load the per-group retention benchmarks from a CSV reader.
pub fn load_benchmarks<R: Read>(reader: R) -> Result<Vec<BenchmarkRow>, String> {
    deserialize_csv(reader, "retention_benchmarks")
}

/// File-path variant of the three loaders.
pub fn load_live_state_file(path: &str) -> Result<Vec<CustomerProductRecord>, String> {
    load_live_state(open(path)?)
}

pub fn load_intervals_file(path: &str) -> Result<Vec<PurchaseInterval>, String> {
    load_intervals(open(path)?)
}

pub fn load_benchmarks_file(path: &str) -> Result<Vec<BenchmarkRow>, String> {
    load_benchmarks(open(path)?)
}

fn open(path: &str) -> Result<std::fs::File, String> {
    std::fs::File::open(path).map_err(|e| format!("Failed to open '{}': {}", path, e))
}

fn deserialize_csv<T, R>(reader: R, table: &str) -> Result<Vec<T>, String>
where
    T: for<'de> Deserialize<'de>,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (line_num, result) in csv_reader.deserialize().enumerate() {
        let record: T = result
            .map_err(|e| format!("{} CSV parse error at line {}: {}", table, line_num + 2, e))?;
        records.push(record);
    }
    Ok(records)
}

/// CSV shape of a live row. Dates arrive as `YYYY-MM-DD`, units may be an
/// empty cell meaning unknown.
#[derive(Debug, Deserialize)]
struct LiveStateCsv {
    customer_id: String,
    product_group: String,
    #[serde(deserialize_with = "deserialize_date")]
    last_purchase_date: NaiveDate,
    #[serde(deserialize_with = "deserialize_optional_f64")]
    units_owned: Option<f64>,
}

impl LiveStateCsv {
    fn into_record(self) -> CustomerProductRecord {
        CustomerProductRecord {
            customer_id: self.customer_id,
            product_group: self.product_group,
            last_purchase_date: self.last_purchase_date,
            units_owned: self.units_owned,
        }
    }
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| {
        serde::de::Error::custom(format!("expected YYYY-MM-DD date, got '{}': {}", s, e))
    })
}

/// Empty cell -> None, anything else must parse as a float.
fn deserialize_optional_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|e| serde::de::Error::custom(format!("expected number, got '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIVE_CSV: &str = "\
customer_id,product_group,last_purchase_date,units_owned
anon-1,red_wine,2024-01-01,2
anon-1,white_wine,2024-06-01,
anon-2,red_wine,2024-03-10,1.5
";

    const INTERVALS_CSV: &str = "\
customer_id,product_group,adjusted_retention_days
anon-1,red_wine,80.0
anon-2,red_wine,95.5
";

    const BENCHMARKS_CSV: &str = "\
product_group,p25,median,p75
red_wine,45,90,150
white_wine,30,60,100
";

    #[test]
    fn live_state_parses_dates_and_optional_units() {
        let records = load_live_state(LIVE_CSV.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(
            records[0].last_purchase_date,
            "2024-01-01".parse::<NaiveDate>().unwrap()
        );
        assert_eq!(records[0].units_owned, Some(2.0));
        assert_eq!(records[1].units_owned, None);
        assert_eq!(records[2].units_owned, Some(1.5));
    }

    #[test]
    fn intervals_and_benchmarks_parse() {
        let intervals = load_intervals(INTERVALS_CSV.as_bytes()).unwrap();
        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[1].adjusted_retention_days, 95.5);

        let benchmarks = load_benchmarks(BENCHMARKS_CSV.as_bytes()).unwrap();
        assert_eq!(benchmarks.len(), 2);
        assert_eq!(benchmarks[0].median, 90.0);
    }

    #[test]
    fn malformed_date_reports_the_line() {
        let bad = "\
customer_id,product_group,last_purchase_date,units_owned
anon-1,red_wine,01/02/2024,1
";
        let err = load_live_state(bad.as_bytes()).unwrap_err();
        assert!(err.contains("line 2"), "{}", err);
    }

    #[test]
    fn malformed_units_fail_rather_than_defaulting() {
        let bad = "\
customer_id,product_group,last_purchase_date,units_owned
anon-1,red_wine,2024-01-01,many
";
        assert!(load_live_state(bad.as_bytes()).is_err());
    }
}
