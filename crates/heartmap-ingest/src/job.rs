//! The ingestion job: scan the CSV, then replace the store contents.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use heartmap_core::error::HeartMapError;
use heartmap_core::types::NewHealthRecord;
use heartmap_storage::{Database, RecordRepository};

use crate::policy::{InclusionPolicy, Tally};
use crate::source::{validate_headers, SourceRow};

/// Records staged by a scan, plus what happened to every other row.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub records: Vec<NewHealthRecord>,
    pub rows_scanned: u64,
    /// Rows rejected by location, year, category or topic.
    pub skipped_filtered: u64,
    /// Rows whose topic buckets (or the overall cap) had no room.
    pub skipped_capped: u64,
    pub skipped_blank_value: u64,
    /// Rows that failed to decode or whose year/value did not coerce.
    pub skipped_invalid: u64,
    pub per_topic: BTreeMap<String, usize>,
    /// Scanning halted because every cap was reached.
    pub stopped_early: bool,
}

/// Summary of one ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub run_id: Uuid,
    pub source: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// The source file was absent; the store was cleared and nothing loaded.
    pub source_missing: bool,
    pub rows_scanned: u64,
    pub inserted: usize,
    pub skipped_filtered: u64,
    pub skipped_capped: u64,
    pub skipped_blank_value: u64,
    pub skipped_invalid: u64,
    pub per_topic: BTreeMap<String, usize>,
    pub stopped_early: bool,
}

impl IngestOutcome {
    fn missing(run_id: Uuid, source: &Path, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            source: source.to_path_buf(),
            started_at,
            finished_at: Utc::now(),
            source_missing: true,
            rows_scanned: 0,
            inserted: 0,
            skipped_filtered: 0,
            skipped_capped: 0,
            skipped_blank_value: 0,
            skipped_invalid: 0,
            per_topic: BTreeMap::new(),
            stopped_early: false,
        }
    }
}

/// Stream CSV rows from `reader` and stage the ones `policy` admits.
///
/// Only staged records are held in memory. Row-level problems are counted,
/// never returned as errors; a missing required column is.
pub fn scan<R: Read>(policy: &InclusionPolicy, reader: R) -> Result<ScanResult, HeartMapError> {
    policy.validate()?;

    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| HeartMapError::Csv(format!("Failed to read header row: {}", e)))?
        .clone();
    validate_headers(&headers)?;
    if headers.get(0).map_or(false, |h| h.starts_with('\u{feff}')) {
        let cleaned: csv::StringRecord = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}'))
            .collect();
        rdr.set_headers(cleaned);
    }

    let mut result = ScanResult::default();
    let mut tally = Tally::new(policy);

    if tally.is_saturated(policy) {
        debug!("Caps admit no rows, skipping scan");
        result.stopped_early = true;
        result.per_topic = tally.by_keyword(policy);
        return Ok(result);
    }

    for decoded in rdr.deserialize::<SourceRow>() {
        result.rows_scanned += 1;

        let row = match decoded {
            Ok(row) => row,
            Err(e) => {
                debug!(error = %e, "Undecodable CSV row skipped");
                result.skipped_invalid += 1;
                continue;
            }
        };

        if !policy.admits_location(&row.location_abbr) {
            result.skipped_filtered += 1;
            continue;
        }

        let Some(year) = row.year() else {
            result.skipped_invalid += 1;
            continue;
        };

        if !policy.admits_year(year)
            || !policy.admits_category(&row.break_out_category)
            || !policy.admits_topic(&row.topic)
        {
            result.skipped_filtered += 1;
            continue;
        }

        if row.value_is_blank() {
            result.skipped_blank_value += 1;
            continue;
        }

        let Some(value) = row.value() else {
            result.skipped_invalid += 1;
            continue;
        };

        let Some(buckets) = tally.buckets_for(policy, &row.topic) else {
            result.skipped_capped += 1;
            continue;
        };

        let demographic = policy.demographic_for(&row.break_out_category, &row.break_out);
        result.records.push(NewHealthRecord {
            year,
            state_abbr: row.location_abbr,
            state_name: row.location_desc,
            topic: row.topic,
            indicator: row.question,
            value,
            unit: row.data_value_unit,
            demographic,
        });
        tally.record(&buckets);

        if tally.is_saturated(policy) {
            debug!(staged = tally.total(), "All caps reached, stopping scan");
            result.stopped_early = true;
            break;
        }
    }

    result.per_topic = tally.by_keyword(policy);
    Ok(result)
}

/// One-shot CSV load into the record store.
pub struct IngestJob {
    repo: RecordRepository,
    policy: InclusionPolicy,
}

impl IngestJob {
    pub fn new(db: Arc<Database>, policy: InclusionPolicy) -> Self {
        Self {
            repo: RecordRepository::new(db),
            policy,
        }
    }

    pub fn policy(&self) -> &InclusionPolicy {
        &self.policy
    }

    /// Load `source`, replacing everything in the store.
    ///
    /// A missing source is not an error: the store is cleared, the problem is
    /// logged, and the outcome has `source_missing` set.
    pub fn run(&self, source: &Path) -> Result<IngestOutcome, HeartMapError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        if !source.exists() {
            error!(run_id = %run_id, path = %source.display(), "Source file not found");
            let cleared = self.repo.clear()?;
            debug!(run_id = %run_id, cleared, "Store cleared");
            return Ok(IngestOutcome::missing(run_id, source, started_at));
        }

        info!(run_id = %run_id, path = %source.display(), "Ingestion started");

        let file = File::open(source)?;
        let scanned = scan(&self.policy, file)?;
        let inserted = self.repo.replace_all(&scanned.records)?;

        let outcome = IngestOutcome {
            run_id,
            source: source.to_path_buf(),
            started_at,
            finished_at: Utc::now(),
            source_missing: false,
            rows_scanned: scanned.rows_scanned,
            inserted,
            skipped_filtered: scanned.skipped_filtered,
            skipped_capped: scanned.skipped_capped,
            skipped_blank_value: scanned.skipped_blank_value,
            skipped_invalid: scanned.skipped_invalid,
            per_topic: scanned.per_topic,
            stopped_early: scanned.stopped_early,
        };

        info!(
            run_id = %run_id,
            rows_scanned = outcome.rows_scanned,
            inserted = outcome.inserted,
            skipped_filtered = outcome.skipped_filtered,
            skipped_capped = outcome.skipped_capped,
            skipped_blank_value = outcome.skipped_blank_value,
            skipped_invalid = outcome.skipped_invalid,
            stopped_early = outcome.stopped_early,
            "Ingestion finished"
        );

        Ok(outcome)
    }
}
