//! Read-side queries for the API layer.
//!
//! Record listing with optional filters, distinct filter values for the
//! map's select boxes, and store statistics.

use std::sync::Arc;

use rusqlite::types::ToSql;
use rusqlite::Connection;

use heartmap_core::error::HeartMapError;
use heartmap_core::types::{FilterOptions, HealthRecord, RecordFilters};

use crate::db::Database;

/// Predicate for a case-insensitive, wildcard-free substring match.
const TOPIC_CONTAINS: &str = "instr(lower(topic), lower(?)) > 0";
const INDICATOR_CONTAINS: &str = "instr(lower(indicator), lower(?)) > 0";

/// Summary statistics of the record store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub total_records: u64,
    pub states: u64,
    pub topics: u64,
    pub years: u64,
}

/// Query service over the health_records table.
pub struct QueryService {
    db: Arc<Database>,
}

impl QueryService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// List every record matching all present filters, ordered by id.
    pub fn list_records(&self, filters: &RecordFilters) -> Result<Vec<HealthRecord>, HeartMapError> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(ref topic) = filters.topic {
            clauses.push(TOPIC_CONTAINS);
            params_vec.push(Box::new(topic.clone()));
        }
        if let Some(ref indicator) = filters.indicator {
            clauses.push(INDICATOR_CONTAINS);
            params_vec.push(Box::new(indicator.clone()));
        }
        if let Some(year) = filters.year {
            clauses.push("year = ?");
            params_vec.push(Box::new(year));
        }
        if let Some(ref demographic) = filters.demographic {
            clauses.push("demographic = ?");
            params_vec.push(Box::new(demographic.clone()));
        }

        let mut sql = String::from(
            "SELECT id, year, state_abbr, state_name, topic, indicator, value, unit, demographic
             FROM health_records",
        );
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY id ASC");

        let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();

        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| HeartMapError::Storage(format!("Records query prepare: {}", e)))?;

            let rows = stmt
                .query_map(params_refs.as_slice(), map_record_row)
                .map_err(|e| HeartMapError::Storage(format!("Records query: {}", e)))?;

            let mut results = Vec::new();
            for row in rows {
                results.push(row.map_err(|e| HeartMapError::Storage(e.to_string()))?);
            }
            Ok(results)
        })
    }

    /// Distinct, ascending values for each filter field.
    ///
    /// With `cascade` set and a topic given, indicators, years and
    /// demographics only come from records whose topic contains it.
    /// The topic list is always computed over the whole store.
    pub fn filter_options(
        &self,
        topic: Option<&str>,
        cascade: bool,
    ) -> Result<FilterOptions, HeartMapError> {
        let narrow_by = if cascade { topic } else { None };

        self.db.with_conn(|conn| {
            Ok(FilterOptions {
                topics: distinct_strings(conn, "topic", None)?,
                indicators: distinct_strings(conn, "indicator", narrow_by)?,
                years: distinct_years(conn, narrow_by)?,
                demographics: distinct_strings(conn, "demographic", narrow_by)?,
            })
        })
    }

    /// Get store statistics.
    pub fn stats(&self) -> Result<StoreStats, HeartMapError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*), COUNT(DISTINCT state_abbr), COUNT(DISTINCT topic),
                        COUNT(DISTINCT year)
                 FROM health_records",
                [],
                |row| {
                    Ok(StoreStats {
                        total_records: row.get::<_, i64>(0)? as u64,
                        states: row.get::<_, i64>(1)? as u64,
                        topics: row.get::<_, i64>(2)? as u64,
                        years: row.get::<_, i64>(3)? as u64,
                    })
                },
            )
            .map_err(|e| HeartMapError::Storage(e.to_string()))
        })
    }
}

/// `column` must be one of the fixed column names above, never user input.
fn distinct_strings(
    conn: &Connection,
    column: &str,
    topic: Option<&str>,
) -> Result<Vec<String>, HeartMapError> {
    let sql = match topic {
        Some(_) => format!(
            "SELECT DISTINCT {col} FROM health_records WHERE {pred} ORDER BY {col} ASC",
            col = column,
            pred = TOPIC_CONTAINS
        ),
        None => format!(
            "SELECT DISTINCT {col} FROM health_records ORDER BY {col} ASC",
            col = column
        ),
    };

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| HeartMapError::Storage(format!("Options query prepare: {}", e)))?;

    let params_refs: Vec<&dyn ToSql> = topic.iter().map(|t| t as &dyn ToSql).collect();
    let rows = stmt
        .query_map(params_refs.as_slice(), |row| row.get::<_, String>(0))
        .map_err(|e| HeartMapError::Storage(format!("Options query: {}", e)))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| HeartMapError::Storage(e.to_string()))
}

fn distinct_years(conn: &Connection, topic: Option<&str>) -> Result<Vec<i64>, HeartMapError> {
    let sql = match topic {
        Some(_) => format!(
            "SELECT DISTINCT year FROM health_records WHERE {} ORDER BY year ASC",
            TOPIC_CONTAINS
        ),
        None => "SELECT DISTINCT year FROM health_records ORDER BY year ASC".to_string(),
    };

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| HeartMapError::Storage(format!("Years query prepare: {}", e)))?;

    let params_refs: Vec<&dyn ToSql> = topic.iter().map(|t| t as &dyn ToSql).collect();
    let rows = stmt
        .query_map(params_refs.as_slice(), |row| row.get::<_, i64>(0))
        .map_err(|e| HeartMapError::Storage(format!("Years query: {}", e)))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| HeartMapError::Storage(e.to_string()))
}

fn map_record_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HealthRecord> {
    Ok(HealthRecord {
        id: row.get(0)?,
        year: row.get(1)?,
        state_abbr: row.get(2)?,
        state_name: row.get(3)?,
        topic: row.get(4)?,
        indicator: row.get(5)?,
        value: row.get(6)?,
        unit: row.get(7)?,
        demographic: row.get(8)?,
    })
}
