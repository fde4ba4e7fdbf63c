//! Row inclusion rules for an ingestion run.
//!
//! Both ingestion modes are the same policy with different fields set:
//! capped dual-topic mode sets one year and a per-topic cap, multi-year
//! demographic mode sets a year set, a breakout category scope and an
//! optional overall cap.

use std::collections::{BTreeMap, BTreeSet};

use heartmap_core::config::{IngestConfig, IngestMode};
use heartmap_core::error::HeartMapError;
use heartmap_core::types::{DEFAULT_DEMOGRAPHIC, EXCLUDED_LOCATION};

/// Which rows an ingestion run keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionPolicy {
    /// Allowed years. `None` admits any year.
    pub years: Option<BTreeSet<i64>>,
    /// Allowed `Break_Out_Category` values. `None` admits every category and
    /// labels every record with the default demographic.
    pub categories: Option<BTreeSet<String>>,
    /// Case-sensitive substrings; a topic must contain at least one.
    pub topic_keywords: Vec<String>,
    /// Cap applied to each keyword bucket independently.
    pub per_topic_cap: Option<usize>,
    /// Cap on the number of records across all buckets.
    pub overall_cap: Option<usize>,
}

impl InclusionPolicy {
    /// One target year, Stroke/Heart capped at `cap` each, demographic ignored.
    pub fn capped_dual_topic(target_year: i64, cap: usize) -> Self {
        Self {
            years: Some(BTreeSet::from([target_year])),
            categories: None,
            topic_keywords: default_keywords(),
            per_topic_cap: Some(cap),
            overall_cap: None,
        }
    }

    /// Several years and breakout categories, no per-topic cap.
    pub fn multi_year_demographic<Y, C, S>(years: Y, categories: C, overall_cap: Option<usize>) -> Self
    where
        Y: IntoIterator<Item = i64>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            years: Some(years.into_iter().collect()),
            categories: Some(categories.into_iter().map(Into::into).collect()),
            topic_keywords: default_keywords(),
            per_topic_cap: None,
            overall_cap,
        }
    }

    /// Build the policy for the configured mode.
    pub fn from_config(config: &IngestConfig) -> Self {
        let policy = match config.mode {
            IngestMode::CappedDualTopic => {
                Self::capped_dual_topic(config.target_year, config.per_topic_cap)
            }
            IngestMode::MultiYearDemographic => Self::multi_year_demographic(
                config.years.iter().copied(),
                config.categories.iter().cloned(),
                config.overall_cap,
            ),
        };
        policy.with_keywords(config.topic_keywords.iter().cloned())
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topic_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Reject policies that could never admit a row.
    pub fn validate(&self) -> Result<(), HeartMapError> {
        if self.topic_keywords.is_empty() || self.topic_keywords.iter().any(|k| k.is_empty()) {
            return Err(HeartMapError::Config(
                "Ingest topic_keywords must contain at least one non-empty keyword".to_string(),
            ));
        }
        if matches!(self.years, Some(ref y) if y.is_empty()) {
            return Err(HeartMapError::Config(
                "Ingest years must not be empty".to_string(),
            ));
        }
        if matches!(self.categories, Some(ref c) if c.is_empty()) {
            return Err(HeartMapError::Config(
                "Ingest categories must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn admits_location(&self, state_abbr: &str) -> bool {
        state_abbr != EXCLUDED_LOCATION
    }

    pub fn admits_year(&self, year: i64) -> bool {
        self.years.as_ref().map_or(true, |years| years.contains(&year))
    }

    pub fn admits_category(&self, category: &str) -> bool {
        self.categories
            .as_ref()
            .map_or(true, |categories| categories.contains(category))
    }

    /// True when the topic contains any keyword.
    pub fn admits_topic(&self, topic: &str) -> bool {
        self.topic_keywords.iter().any(|k| topic.contains(k.as_str()))
    }

    /// Demographic label for a row: the breakout value verbatim when its
    /// category is in scope, otherwise the default.
    pub fn demographic_for(&self, category: &str, breakout: &str) -> String {
        match self.categories {
            Some(ref categories) if categories.contains(category) && !breakout.trim().is_empty() => {
                breakout.to_string()
            }
            _ => DEFAULT_DEMOGRAPHIC.to_string(),
        }
    }
}

fn default_keywords() -> Vec<String> {
    vec!["Stroke".to_string(), "Heart".to_string()]
}

/// Running counts of staged records against a policy's caps.
#[derive(Debug, Clone)]
pub struct Tally {
    per_keyword: Vec<usize>,
    total: usize,
}

impl Tally {
    pub fn new(policy: &InclusionPolicy) -> Self {
        Self {
            per_keyword: vec![0; policy.topic_keywords.len()],
            total: 0,
        }
    }

    /// Buckets a topic counts against: every keyword it contains.
    ///
    /// `None` when any of those buckets is full or the overall cap is
    /// reached, so a topic naming both keywords never pushes either count
    /// past its cap.
    pub fn buckets_for(&self, policy: &InclusionPolicy, topic: &str) -> Option<Vec<usize>> {
        if policy.overall_cap.map_or(false, |cap| self.total >= cap) {
            return None;
        }
        let buckets: Vec<usize> = policy
            .topic_keywords
            .iter()
            .enumerate()
            .filter(|(_, keyword)| topic.contains(keyword.as_str()))
            .map(|(i, _)| i)
            .collect();

        if buckets.is_empty() {
            return None;
        }
        let has_room = |i: &usize| policy.per_topic_cap.map_or(true, |cap| self.per_keyword[*i] < cap);
        if buckets.iter().all(has_room) {
            Some(buckets)
        } else {
            None
        }
    }

    pub fn record(&mut self, buckets: &[usize]) {
        for &bucket in buckets {
            self.per_keyword[bucket] += 1;
        }
        self.total += 1;
    }

    /// True once no further row could be admitted, so scanning can stop.
    pub fn is_saturated(&self, policy: &InclusionPolicy) -> bool {
        if policy.overall_cap.map_or(false, |cap| self.total >= cap) {
            return true;
        }
        match policy.per_topic_cap {
            Some(cap) => self.per_keyword.iter().all(|&n| n >= cap),
            None => false,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Counts keyed by keyword.
    pub fn by_keyword(&self, policy: &InclusionPolicy) -> BTreeMap<String, usize> {
        policy
            .topic_keywords
            .iter()
            .cloned()
            .zip(self.per_keyword.iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capped_preset() {
        let p = InclusionPolicy::capped_dual_topic(2020, 500);
        assert!(p.admits_year(2020));
        assert!(!p.admits_year(2019));
        assert!(p.admits_category("Race"));
        assert_eq!(p.per_topic_cap, Some(500));
        assert!(p.overall_cap.is_none());
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_multi_year_preset() {
        let p = InclusionPolicy::multi_year_demographic([2019, 2020], ["Overall", "Gender"], Some(10));
        assert!(p.admits_year(2019));
        assert!(!p.admits_year(2018));
        assert!(p.admits_category("Gender"));
        assert!(!p.admits_category("Race"));
        assert!(p.per_topic_cap.is_none());
        assert_eq!(p.overall_cap, Some(10));
    }

    #[test]
    fn test_us_location_excluded() {
        let p = InclusionPolicy::capped_dual_topic(2020, 1);
        assert!(!p.admits_location("US"));
        assert!(p.admits_location("NY"));
    }

    #[test]
    fn test_topic_matching_is_case_sensitive_substring() {
        let p = InclusionPolicy::capped_dual_topic(2020, 1);
        assert!(p.admits_topic("Stroke Mortality"));
        assert!(p.admits_topic("Coronary Heart Disease"));
        assert!(!p.admits_topic("stroke mortality"));
        assert!(!p.admits_topic("Diabetes"));
    }

    #[test]
    fn test_demographic_mapping() {
        let capped = InclusionPolicy::capped_dual_topic(2020, 1);
        assert_eq!(capped.demographic_for("Gender", "Female"), "Overall");

        let multi = InclusionPolicy::multi_year_demographic([2020], ["Overall", "Gender"], None);
        assert_eq!(multi.demographic_for("Gender", "Female"), "Female");
        assert_eq!(multi.demographic_for("Overall", "Overall"), "Overall");
        assert_eq!(multi.demographic_for("Gender", ""), "Overall");
        assert_eq!(multi.demographic_for("Race", "Hispanic"), "Overall");
    }

    #[test]
    fn test_from_config_uses_mode_and_keywords() {
        let mut config = IngestConfig::default();
        config.topic_keywords = vec!["Stroke".to_string()];
        let p = InclusionPolicy::from_config(&config);
        assert_eq!(p, InclusionPolicy::capped_dual_topic(2020, 500).with_keywords(["Stroke"]));

        config.mode = IngestMode::MultiYearDemographic;
        config.overall_cap = Some(3);
        let p = InclusionPolicy::from_config(&config);
        assert_eq!(p.years, Some(BTreeSet::from([2019, 2020, 2021, 2022])));
        assert_eq!(p.overall_cap, Some(3));
        assert_eq!(p.topic_keywords, vec!["Stroke"]);
    }

    #[test]
    fn test_validate_rejects_empty_keywords() {
        let p = InclusionPolicy::capped_dual_topic(2020, 1).with_keywords(Vec::<String>::new());
        assert!(p.validate().is_err());
        let p = InclusionPolicy::multi_year_demographic(Vec::<i64>::new(), ["Gender"], None);
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_tally_per_topic_caps() {
        let p = InclusionPolicy::capped_dual_topic(2020, 2);
        let mut t = Tally::new(&p);

        for _ in 0..2 {
            let b = t.buckets_for(&p, "Stroke Mortality").unwrap();
            t.record(&b);
        }
        assert_eq!(t.buckets_for(&p, "Stroke Mortality"), None);
        assert!(!t.is_saturated(&p));

        let b = t.buckets_for(&p, "Heart Disease").unwrap();
        assert_eq!(b, vec![1]);
        t.record(&b);
        let b = t.buckets_for(&p, "Heart Disease").unwrap();
        t.record(&b);
        assert!(t.is_saturated(&p));

        let counts = t.by_keyword(&p);
        assert_eq!(counts["Stroke"], 2);
        assert_eq!(counts["Heart"], 2);
    }

    #[test]
    fn test_tally_topic_with_both_keywords_counts_against_both() {
        let p = InclusionPolicy::capped_dual_topic(2020, 1);
        let mut t = Tally::new(&p);

        let buckets = t.buckets_for(&p, "Heart Disease and Stroke").unwrap();
        assert_eq!(buckets, vec![0, 1]);
        t.record(&buckets);

        // Both buckets are now full, so neither keyword can exceed its cap.
        assert_eq!(t.buckets_for(&p, "Heart Disease and Stroke"), None);
        assert_eq!(t.buckets_for(&p, "Stroke Mortality"), None);
        assert_eq!(t.buckets_for(&p, "Heart Failure"), None);
        assert!(t.is_saturated(&p));
        assert_eq!(t.total(), 1);
    }

    #[test]
    fn test_tally_combined_topic_rejected_when_one_bucket_full() {
        let p = InclusionPolicy::capped_dual_topic(2020, 1);
        let mut t = Tally::new(&p);
        t.record(&t.buckets_for(&p, "Stroke Mortality").unwrap());

        assert_eq!(t.buckets_for(&p, "Heart Disease and Stroke"), None);
        assert_eq!(t.buckets_for(&p, "Heart Failure"), Some(vec![1]));
    }

    #[test]
    fn test_tally_overall_cap() {
        let p = InclusionPolicy::multi_year_demographic([2020], ["Overall"], Some(2));
        let mut t = Tally::new(&p);
        t.record(&t.buckets_for(&p, "Stroke").unwrap());
        t.record(&t.buckets_for(&p, "Heart").unwrap());
        assert!(t.is_saturated(&p));
        assert_eq!(t.buckets_for(&p, "Stroke"), None);
        assert_eq!(t.total(), 2);
    }

    #[test]
    fn test_tally_zero_cap_is_saturated_from_the_start() {
        let p = InclusionPolicy::capped_dual_topic(2020, 0);
        let t = Tally::new(&p);
        assert!(t.is_saturated(&p));
        assert_eq!(t.buckets_for(&p, "Stroke"), None);
    }

    #[test]
    fn test_tally_uncapped_never_saturates() {
        let p = InclusionPolicy::multi_year_demographic([2020], ["Overall"], None);
        let mut t = Tally::new(&p);
        for _ in 0..1000 {
            t.record(&t.buckets_for(&p, "Stroke").unwrap());
        }
        assert!(!t.is_saturated(&p));
    }
}
