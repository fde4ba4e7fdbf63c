//! Benchmarks for the CSV scan that precedes every ingestion run.
//!
//! The real dataset has a few hundred thousand rows, most of which are
//! rejected by year, location or topic, so the scan cost is dominated by
//! decoding and rejecting rows rather than staging them.

use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use heartmap_ingest::{scan, InclusionPolicy};

const TOPICS: [&str; 4] = [
    "Stroke Mortality",
    "Heart Failure",
    "Coronary Heart Disease",
    "Diabetes",
];
const STATES: [(&str, &str); 5] = [
    ("US", "United States"),
    ("NY", "New York"),
    ("CA", "California"),
    ("TX", "Texas"),
    ("WA", "Washington"),
];
const BREAKOUTS: [(&str, &str); 4] = [
    ("Overall", "Overall"),
    ("Gender", "Male"),
    ("Gender", "Female"),
    ("Race", "Hispanic"),
];

/// Build a synthetic CSV with `rows` data rows spread over 2015..2023.
fn generate_csv(rows: usize) -> String {
    let mut out = String::from(
        "YearStart,LocationAbbr,LocationDesc,Topic,Question,Data_Value,Data_Value_Unit,Break_Out_Category,Break_Out\n",
    );
    for i in 0..rows {
        let (abbr, name) = STATES[i % STATES.len()];
        let topic = TOPICS[(i / 5) % TOPICS.len()];
        let (category, breakout) = BREAKOUTS[(i / 7) % BREAKOUTS.len()];
        let year = 2015 + (i % 9);
        let value = if i % 11 == 0 {
            String::new()
        } else {
            format!("{}.{}", i % 400, i % 10)
        };
        out.push_str(&format!(
            "{},{},{},{},\"Rate of {} per 100,000\",{},per 100000,{},{}\n",
            year, abbr, name, topic, topic, value, category, breakout
        ));
    }
    out
}

fn bench_scan(c: &mut Criterion) {
    let csv = generate_csv(50_000);

    let mut group = c.benchmark_group("scan");
    group.throughput(Throughput::Bytes(csv.len() as u64));
    group.measurement_time(Duration::from_secs(10));

    let capped = InclusionPolicy::capped_dual_topic(2020, 500);
    group.bench_function("capped_dual_topic", |b| {
        b.iter(|| scan(&capped, csv.as_bytes()).unwrap())
    });

    let multi = InclusionPolicy::multi_year_demographic(2019..=2022, ["Overall", "Gender"], None);
    group.bench_function("multi_year_demographic", |b| {
        b.iter(|| scan(&multi, csv.as_bytes()).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_scan);
criterion_main!(benches);
