//! Source CSV row layout and type coercion.

use serde::Deserialize;

use heartmap_core::error::HeartMapError;

/// Columns without which no row can be built.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "YearStart",
    "LocationAbbr",
    "LocationDesc",
    "Topic",
    "Question",
    "Data_Value",
];

/// One raw CSV row. Every field is kept as text; coercion happens later so a
/// bad cell skips the row instead of failing the decode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceRow {
    #[serde(rename = "YearStart")]
    pub year_start: String,
    #[serde(rename = "LocationAbbr")]
    pub location_abbr: String,
    #[serde(rename = "LocationDesc")]
    pub location_desc: String,
    #[serde(rename = "Topic")]
    pub topic: String,
    #[serde(rename = "Question")]
    pub question: String,
    #[serde(rename = "Data_Value")]
    pub data_value: String,
    #[serde(rename = "Data_Value_Unit", default)]
    pub data_value_unit: String,
    #[serde(rename = "Break_Out_Category", default)]
    pub break_out_category: String,
    #[serde(rename = "Break_Out", default)]
    pub break_out: String,
}

impl SourceRow {
    pub fn year(&self) -> Option<i64> {
        self.year_start.trim().parse().ok()
    }

    /// True when the value cell is empty or whitespace.
    pub fn value_is_blank(&self) -> bool {
        self.data_value.trim().is_empty()
    }

    /// Parsed measurement. NaN and infinities are rejected since SQLite
    /// would store them as NULL.
    pub fn value(&self) -> Option<f64> {
        self.data_value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }
}

/// Check a header row for every required column.
pub fn validate_headers(headers: &csv::StringRecord) -> Result<(), HeartMapError> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h.trim_start_matches('\u{feff}') == *col))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(HeartMapError::Ingest(format!(
            "Source is missing required column(s): {}",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: &str, value: &str) -> SourceRow {
        SourceRow {
            year_start: year.to_string(),
            data_value: value.to_string(),
            ..SourceRow::default()
        }
    }

    #[test]
    fn test_year_coercion() {
        assert_eq!(row("2020", "").year(), Some(2020));
        assert_eq!(row(" 2019 ", "").year(), Some(2019));
        assert_eq!(row("20x0", "").year(), None);
        assert_eq!(row("", "").year(), None);
    }

    #[test]
    fn test_value_coercion() {
        assert_eq!(row("2020", "8.1").value(), Some(8.1));
        assert_eq!(row("2020", " 12 ").value(), Some(12.0));
        assert_eq!(row("2020", "~").value(), None);
        assert_eq!(row("2020", "NaN").value(), None);
        assert_eq!(row("2020", "inf").value(), None);
    }

    #[test]
    fn test_value_is_blank() {
        assert!(row("2020", "").value_is_blank());
        assert!(row("2020", "   ").value_is_blank());
        assert!(!row("2020", "0").value_is_blank());
    }

    #[test]
    fn test_validate_headers() {
        let full = csv::StringRecord::from(vec![
            "YearStart",
            "LocationAbbr",
            "LocationDesc",
            "Topic",
            "Question",
            "Data_Value",
            "Data_Value_Unit",
        ]);
        assert!(validate_headers(&full).is_ok());

        let partial = csv::StringRecord::from(vec!["YearStart", "Topic", "Data_Value"]);
        let err = validate_headers(&partial).unwrap_err().to_string();
        assert!(err.contains("LocationAbbr"));
        assert!(err.contains("Question"));
        assert!(!err.contains("YearStart"));
    }
}
