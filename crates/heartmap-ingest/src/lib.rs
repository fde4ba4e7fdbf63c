//! HeartMap Ingest crate - CSV load of heart disease and stroke statistics.
//!
//! Streams the source CSV, admits rows through a configurable
//! [`InclusionPolicy`], coerces them into records and replaces the store
//! contents in a single transaction.

pub mod job;
pub mod policy;
pub mod source;

pub use job::{scan, IngestJob, IngestOutcome, ScanResult};
pub use policy::{InclusionPolicy, Tally};
pub use source::{SourceRow, REQUIRED_COLUMNS};
