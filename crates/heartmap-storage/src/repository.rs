//! Write-side repository for health records.
//!
//! Ingestion replaces the whole table in one transaction; there are no
//! per-record updates or deletes.

use std::sync::Arc;

use tracing::debug;

use heartmap_core::error::HeartMapError;
use heartmap_core::types::NewHealthRecord;

use crate::db::Database;

/// Repository for the health_records table.
pub struct RecordRepository {
    db: Arc<Database>,
}

impl RecordRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Replace every stored record with `records`.
    ///
    /// The delete and all inserts share one transaction, so a reader on
    /// another connection sees either the old contents or the new ones.
    /// Returns the number of records inserted.
    pub fn replace_all(&self, records: &[NewHealthRecord]) -> Result<usize, HeartMapError> {
        self.db.with_conn_mut(|conn| {
            let tx = conn
                .transaction()
                .map_err(|e| HeartMapError::Storage(format!("Failed to begin replace: {}", e)))?;

            let deleted = tx
                .execute("DELETE FROM health_records", [])
                .map_err(|e| HeartMapError::Storage(format!("Failed to clear records: {}", e)))?;

            {
                let mut stmt = tx
                    .prepare(
                        "INSERT INTO health_records
                            (year, state_abbr, state_name, topic, indicator, value, unit, demographic)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    )
                    .map_err(|e| HeartMapError::Storage(e.to_string()))?;

                for record in records {
                    stmt.execute(rusqlite::params![
                        record.year,
                        record.state_abbr,
                        record.state_name,
                        record.topic,
                        record.indicator,
                        record.value,
                        record.unit,
                        record.demographic,
                    ])
                    .map_err(|e| HeartMapError::Storage(format!("Failed to insert record: {}", e)))?;
                }
            }

            tx.commit()
                .map_err(|e| HeartMapError::Storage(format!("Failed to commit replace: {}", e)))?;

            debug!(deleted, inserted = records.len(), "Health records replaced");
            Ok(records.len())
        })
    }

    /// Delete every stored record. Returns the number removed.
    pub fn clear(&self) -> Result<usize, HeartMapError> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM health_records", [])
                .map_err(|e| HeartMapError::Storage(format!("Failed to clear records: {}", e)))
        })
    }

    /// Count stored records.
    pub fn count(&self) -> Result<u64, HeartMapError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM health_records", [], |row| row.get(0))
                .map_err(|e| HeartMapError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(state: &str, topic: &str, value: f64) -> NewHealthRecord {
        NewHealthRecord {
            year: 2020,
            state_abbr: state.to_string(),
            state_name: format!("{} name", state),
            topic: topic.to_string(),
            indicator: "Mortality".to_string(),
            value,
            unit: "per 100,000".to_string(),
            demographic: "Overall".to_string(),
        }
    }

    fn make_repo() -> RecordRepository {
        RecordRepository::new(Arc::new(Database::in_memory().unwrap()))
    }

    #[test]
    fn test_replace_all_inserts() {
        let repo = make_repo();
        let inserted = repo
            .replace_all(&[record("NY", "Stroke", 8.1), record("CA", "Heart", 3.0)])
            .unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn test_replace_all_discards_previous_contents() {
        let repo = make_repo();
        repo.replace_all(&[record("NY", "Stroke", 8.1), record("CA", "Heart", 3.0)])
            .unwrap();
        repo.replace_all(&[record("TX", "Stroke", 1.0)]).unwrap();
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_replace_all_is_atomic_on_failure() {
        let repo = make_repo();
        repo.replace_all(&[record("NY", "Stroke", 8.1)]).unwrap();

        // The US row violates the CHECK constraint, so the whole replace rolls back.
        let result = repo.replace_all(&[record("CA", "Heart", 3.0), record("US", "Heart", 1.0)]);
        assert!(result.is_err());
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_clear() {
        let repo = make_repo();
        repo.replace_all(&[record("NY", "Stroke", 8.1)]).unwrap();
        assert_eq!(repo.clear().unwrap(), 1);
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_replace_all_empty() {
        let repo = make_repo();
        repo.replace_all(&[record("NY", "Stroke", 8.1)]).unwrap();
        assert_eq!(repo.replace_all(&[]).unwrap(), 0);
        assert_eq!(repo.count().unwrap(), 0);
    }
}
