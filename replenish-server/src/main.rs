use std::env;
use std::process;
use std::time::Instant;

use chrono::{Local, NaiveDate, Utc};
use serde::Serialize;

use replenish_engine::{
    benchmark_label, compute_group_status, most_urgent_per_customer, product_group_metrics,
    AsofMode, BenchmarkQuantile, BenchmarkRow, BenchmarkSelection, CachedStatusEngine,
    CustomerProductRecord, GroupStatusView, LiveParams, MemoryStatusCache, ProductGroupMetrics,
    PurchaseInterval, StatusRecord, UrgencyStatus,
};

mod loader;

use loader::{load_benchmarks_file, load_intervals_file, load_live_state_file};

// ---------------------------------------------------------------------------
// JSON output contract
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ReportJson {
    generated_at: String,
    asof_date: NaiveDate,
    benchmark: String,
    due_soon_window_days: i64,
    compute_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<GroupStatusView>,
    product_groups: Vec<ProductGroupMetrics>,
    most_urgent: Vec<StatusRecord>,
    summary: SummaryJson,
}

#[derive(Serialize)]
struct SummaryJson {
    records_processed: usize,
    product_groups: usize,
    customers_needing_action: usize,
}

// ---------------------------------------------------------------------------
// Human-readable output
// ---------------------------------------------------------------------------

fn print_human(
    report: &ReportJson,
    params: &LiveParams,
    top: usize,
) {
    println!();
    println!("  ================================================================");
    println!("  REPLENISHMENT RADAR - Live Status Digest");
    println!("  ================================================================");
    println!();
    println!(
        "  ASOF_DATE = {}  |  {}  |  due soon window = {}d",
        report.asof_date, report.benchmark, params.due_soon_window_days
    );
    println!();

    if let Some(view) = &report.group {
        let overdue = count_status(&view.rows, UrgencyStatus::Overdue);
        let due_soon = count_status(&view.rows, UrgencyStatus::DueSoon);
        let ok = count_status(&view.rows, UrgencyStatus::Ok);
        println!(
            "  [{}]  days_per_unit = {:.1}  |  {} rows: {} overdue, {} due soon, {} ok",
            view.product_group,
            view.days_per_unit,
            view.rows.len(),
            overdue,
            due_soon,
            ok
        );
        println!();
    }

    println!("  Product groups (by customer count)");
    println!("  ----------------------------------------------------------------");
    for m in &report.product_groups {
        let median = m
            .median_retention_days
            .map(|d| format!("{:.1}d", d))
            .unwrap_or_else(|| "-".into());
        println!(
            "  {:<24} {:>6} customers  repeat {:>5.1}%  median {:>7}  overdue {:>5.1}%  due soon {:>5.1}%",
            m.product_group,
            m.customers,
            m.repeat_rate_pct,
            median,
            m.overdue_rate_pct,
            m.due_soon_rate_pct
        );
    }
    println!();

    println!(
        "  Contact list: {} customers needing action (showing up to {})",
        report.summary.customers_needing_action, top
    );
    println!("  ----------------------------------------------------------------");
    for r in report.most_urgent.iter().take(top) {
        println!(
            "  {:<12} {:<24} {:>8}  due {}  ({} days)",
            r.customer_id, r.product_group, r.status.to_string(), r.due_date, r.days_to_due
        );
    }
    println!();
}

fn count_status(rows: &[StatusRecord], status: UrgencyStatus) -> usize {
    rows.iter().filter(|r| r.status == status).count()
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn usage() -> ! {
    eprintln!("Usage: replenish-server <live.csv> <intervals.csv> <benchmarks.csv> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --group NAME        Also compute the single-group view for NAME");
    eprintln!("  --asof MODE         'dataset' (default) or 'today'");
    eprintln!("  --quantile Q        Benchmark quantile: p25, median (default), p75");
    eprintln!("  --manual-days N     Manual days-per-unit (overrides --quantile)");
    eprintln!("  --due-soon N        Due-soon window in days (default: 14)");
    eprintln!("  --fallback-days N   Days-per-unit for unbenchmarked groups (default: 90)");
    eprintln!("  --top N             Contact list rows to print (default: 20)");
    eprintln!("  --json              Output as JSON instead of formatted text");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  replenish-server live.csv intervals.csv benchmarks.csv --group red_wine --json");
    process::exit(1);
}

fn flag_value<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    match args.get(i + 1) {
        Some(v) => v,
        None => {
            eprintln!("Error: {} requires a value", flag);
            process::exit(1);
        }
    }
}

fn parse_or_exit<T: std::str::FromStr>(value: &str, flag: &str) -> T
where
    T::Err: std::fmt::Display,
{
    value.parse().unwrap_or_else(|e| {
        eprintln!("Error: bad value for {}: {}", flag, e);
        process::exit(1);
    })
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        usage();
    }

    let live_path = &args[1];
    let intervals_path = &args[2];
    let benchmarks_path = &args[3];

    let mut group: Option<String> = None;
    let mut asof = AsofMode::Dataset;
    let mut quantile = BenchmarkQuantile::Median;
    let mut manual_days: Option<f64> = None;
    let mut due_soon_window: i64 = replenish_engine::defaults::DEFAULT_DUE_SOON_WINDOW_DAYS;
    let mut fallback_days: f64 = replenish_engine::defaults::FALLBACK_DAYS_PER_UNIT;
    let mut top: usize = 20;
    let mut json_output = false;

    let mut i = 4;
    while i < args.len() {
        match args[i].as_str() {
            "--group" => {
                group = Some(flag_value(&args, i, "--group").to_string());
                i += 2;
            }
            "--asof" => {
                asof = parse_or_exit(flag_value(&args, i, "--asof"), "--asof");
                i += 2;
            }
            "--quantile" => {
                quantile = parse_or_exit(flag_value(&args, i, "--quantile"), "--quantile");
                i += 2;
            }
            "--manual-days" => {
                manual_days = Some(parse_or_exit(flag_value(&args, i, "--manual-days"), "--manual-days"));
                i += 2;
            }
            "--due-soon" => {
                due_soon_window = parse_or_exit(flag_value(&args, i, "--due-soon"), "--due-soon");
                i += 2;
            }
            "--fallback-days" => {
                fallback_days = parse_or_exit(flag_value(&args, i, "--fallback-days"), "--fallback-days");
                i += 2;
            }
            "--top" => {
                top = parse_or_exit(flag_value(&args, i, "--top"), "--top");
                i += 2;
            }
            "--json" => {
                json_output = true;
                i += 1;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
    }

    let benchmark = match manual_days {
        Some(days) => BenchmarkSelection::Manual(days),
        None => BenchmarkSelection::Quantile(quantile),
    };
    let mut params = LiveParams::new(asof, benchmark);
    params.due_soon_window_days = due_soon_window;
    params.missing_benchmark_fallback = fallback_days;
    params.product_group = group.clone();
    if let Err(e) = params.validate() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    let live = load_or_exit(load_live_state_file(live_path));
    let intervals = load_or_exit(load_intervals_file(intervals_path));
    let benchmarks = load_or_exit(load_benchmarks_file(benchmarks_path));
    log::info!(
        "loaded {} live rows, {} intervals, {} benchmark rows",
        live.len(),
        intervals.len(),
        benchmarks.len()
    );

    let today = Local::now().date_naive();
    let compute_start = Instant::now();
    let mut report = match build_report(&live, &intervals, &benchmarks, &params, today) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    report.compute_ms = compute_start.elapsed().as_millis();

    if json_output {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing report: {}", e);
                process::exit(1);
            }
        }
    } else {
        print_human(&report, &params, top);
    }
}

fn load_or_exit<T>(result: Result<Vec<T>, String>) -> Vec<T> {
    match result {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("Error loading CSV: {}", e);
            process::exit(1);
        }
    }
}

/// Run the engine and assemble the full report.
///
/// The cross-group table feeds both the comparison metrics and the contact
/// list; the memoizing engine makes the second request a cache hit.
fn build_report(
    live: &[CustomerProductRecord],
    intervals: &[PurchaseInterval],
    benchmarks: &[BenchmarkRow],
    params: &LiveParams,
    today: NaiveDate,
) -> Result<ReportJson, replenish_engine::EngineError> {
    let mut engine = CachedStatusEngine::new(MemoryStatusCache::new());

    let table = engine.all_groups_status(live, benchmarks, params, today)?;
    let metrics = product_group_metrics(&table.rows, intervals);

    let table_again = engine.all_groups_status(live, benchmarks, params, today)?;
    let most_urgent = most_urgent_per_customer(&table_again.rows);

    let group_view = match &params.product_group {
        Some(group) => Some(compute_group_status(live, benchmarks, group, params, today)?),
        None => None,
    };

    Ok(ReportJson {
        generated_at: Utc::now().to_rfc3339(),
        asof_date: table.asof_date,
        benchmark: benchmark_label(&params.benchmark),
        due_soon_window_days: params.due_soon_window_days,
        compute_ms: 0,
        group: group_view,
        product_groups: metrics,
        summary: SummaryJson {
            records_processed: table.rows.len(),
            product_groups: {
                let mut groups: Vec<&str> =
                    table.rows.iter().map(|r| r.product_group.as_str()).collect();
                groups.sort_unstable();
                groups.dedup();
                groups.len()
            },
            customers_needing_action: most_urgent.len(),
        },
        most_urgent,
    })
}
