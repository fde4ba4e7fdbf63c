use serde::{Deserialize, Serialize};

/// Location code of the national aggregate row. Never stored.
pub const EXCLUDED_LOCATION: &str = "US";

/// Demographic label used when a row carries no breakout in scope.
pub const DEFAULT_DEMOGRAPHIC: &str = "Overall";

/// Literal a front-end sends for an unset select box.
pub const UNSET_PARAM: &str = "undefined";

// =============================================================================
// Records
// =============================================================================

/// One stored observation: a metric for a state, year and demographic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    /// Store-assigned identifier.
    pub id: i64,
    pub year: i64,
    pub state_abbr: String,
    pub state_name: String,
    pub topic: String,
    pub indicator: String,
    /// Nullable in the schema; ingestion never writes a null.
    pub value: Option<f64>,
    pub unit: String,
    pub demographic: String,
}

/// A record produced by ingestion, before the store assigns an id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewHealthRecord {
    pub year: i64,
    pub state_abbr: String,
    pub state_name: String,
    pub topic: String,
    pub indicator: String,
    pub value: f64,
    pub unit: String,
    pub demographic: String,
}

// =============================================================================
// Query inputs and outputs
// =============================================================================

/// Filters for listing records. `None` imposes no constraint.
///
/// `topic` and `indicator` are case-insensitive substring matches;
/// `year` and `demographic` are exact matches. All present filters are ANDed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordFilters {
    pub topic: Option<String>,
    pub indicator: Option<String>,
    pub year: Option<i64>,
    pub demographic: Option<String>,
}

impl RecordFilters {
    /// Filters that match every record.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_indicator(mut self, indicator: impl Into<String>) -> Self {
        self.indicator = Some(indicator.into());
        self
    }

    pub fn with_year(mut self, year: i64) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_demographic(mut self, demographic: impl Into<String>) -> Self {
        self.demographic = Some(demographic.into());
        self
    }
}

/// Distinct values currently available for each filter field, ascending.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub topics: Vec<String>,
    pub indicators: Vec<String>,
    pub years: Vec<i64>,
    pub demographics: Vec<String>,
}

/// A query parameter that is missing or blank imposes no constraint.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Like [`non_blank`], but a select box's `"undefined"` also counts as unset.
pub fn normalize_param(value: Option<&str>) -> Option<&str> {
    non_blank(value).filter(|v| *v != UNSET_PARAM)
}
