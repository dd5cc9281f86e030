//! Filter/group/reduce queries over a [`Dataset`].
//!
//! Every query borrows the dataset immutably and returns a plain series or
//! mapping; nothing here knows about charts.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::dataset::{CaseRecord, Dataset};
use crate::error::InsightsError;

/// Bin count used when the active-cases series is drawn as a histogram.
pub const HISTOGRAM_BINS: usize = 30;

/// Number of entries returned by [`top_regions`].
pub const TOP_K: usize = 5;

/// Per-region sums, iterated in region order.
pub type RegionTotals = BTreeMap<String, u64>;

/// Optional region and inclusive date bounds applied to case rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseFilter {
    pub region: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl CaseFilter {
    /// A filter that matches every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_start(mut self, start: NaiveDate) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_end(mut self, end: NaiveDate) -> Self {
        self.end = Some(end);
        self
    }

    pub fn matches(&self, record: &CaseRecord) -> bool {
        if let Some(region) = &self.region {
            if record.region != *region {
                return false;
            }
        }
        if let Some(start) = self.start {
            if record.date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if record.date > end {
                return false;
            }
        }
        true
    }
}

/// Metric used to rank regions in [`top_regions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RankingCriterion {
    MaxDeaths,
    MaxVaccinations,
    MaxConfirmed,
}

impl RankingCriterion {
    pub const ALL: [RankingCriterion; 3] = [
        RankingCriterion::MaxDeaths,
        RankingCriterion::MaxVaccinations,
        RankingCriterion::MaxConfirmed,
    ];

    /// Human-readable label, e.g. `"Maximum Deaths"`.
    pub fn label(self) -> &'static str {
        match self {
            RankingCriterion::MaxDeaths => "Maximum Deaths",
            RankingCriterion::MaxVaccinations => "Maximum Vaccinations",
            RankingCriterion::MaxConfirmed => "Maximum Confirmed",
        }
    }

    /// Short command-line name, e.g. `"max-deaths"`.
    pub fn slug(self) -> &'static str {
        match self {
            RankingCriterion::MaxDeaths => "max-deaths",
            RankingCriterion::MaxVaccinations => "max-vaccinations",
            RankingCriterion::MaxConfirmed => "max-confirmed",
        }
    }
}

impl fmt::Display for RankingCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RankingCriterion {
    type Err = InsightsError;

    /// Accepts the slug or the label, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.slug().eq_ignore_ascii_case(wanted) || c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| InsightsError::InvalidCriterion(s.to_string()))
    }
}

/// Active-case values of the rows matching `filter`, in source order.
/// Empty when nothing matches.
#[tracing::instrument(skip(dataset))]
pub fn active_cases_distribution(dataset: &Dataset, filter: &CaseFilter) -> Vec<i64> {
    let values: Vec<i64> = dataset
        .cases()
        .iter()
        .filter(|c| filter.matches(c))
        .map(CaseRecord::active_cases)
        .collect();

    debug!(matched = values.len(), "Active cases filtered");
    values
}

/// Total deaths per region over the rows matching `filter`.
#[tracing::instrument(skip(dataset))]
pub fn deaths_by_region(dataset: &Dataset, filter: &CaseFilter) -> RegionTotals {
    group_sum(
        dataset.cases().iter().filter(|c| filter.matches(c)),
        |c| &c.region,
        |c| c.deaths,
    )
}

/// Total vaccinated per region, optionally restricted to one region.
#[tracing::instrument(skip(dataset))]
pub fn vaccination_by_region(dataset: &Dataset, region: Option<&str>) -> RegionTotals {
    group_sum(
        dataset
            .vaccinations()
            .iter()
            .filter(|v| region.is_none_or(|r| v.region == r)),
        |v| &v.region,
        |v| v.total_vaccinated,
    )
}

/// The [`TOP_K`] regions with the largest sum for `criterion`, descending.
/// Exact ties keep region order.
#[tracing::instrument(skip(dataset))]
pub fn top_regions(dataset: &Dataset, criterion: RankingCriterion) -> Vec<(String, u64)> {
    let totals = match criterion {
        RankingCriterion::MaxDeaths => group_sum(dataset.cases(), |c| &c.region, |c| c.deaths),
        RankingCriterion::MaxConfirmed => {
            group_sum(dataset.cases(), |c| &c.region, |c| c.confirmed)
        }
        RankingCriterion::MaxVaccinations => group_sum(
            dataset.vaccinations(),
            |v| &v.region,
            |v| v.total_vaccinated,
        ),
    };

    top_k(totals, TOP_K)
}

/// Sums `value` per `key` over `rows`, saturating at `u64::MAX`.
fn group_sum<'a, T: 'a>(
    rows: impl IntoIterator<Item = &'a T>,
    key: impl Fn(&'a T) -> &'a String,
    value: impl Fn(&T) -> u64,
) -> RegionTotals {
    let mut totals = RegionTotals::new();
    for row in rows {
        let total = totals.entry(key(row).clone()).or_default();
        *total = total.saturating_add(value(row));
    }
    totals
}

/// Largest `k` entries by value, descending; stable so ties keep map order.
fn top_k(totals: RegionTotals, k: usize) -> Vec<(String, u64)> {
    let mut ranked: Vec<(String, u64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::VaccinationRecord;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, m, d).unwrap()
    }

    fn dataset() -> Dataset {
        Dataset::new(
            vec![
                CaseRecord::new("X", date(3, 1), 100, 80, 5),
                CaseRecord::new("X", date(3, 2), 50, 10, 0),
                CaseRecord::new("Y", date(3, 2), 20, 30, 7),
                CaseRecord::new("Z", date(3, 5), 9, 1, 2),
            ],
            vec![
                VaccinationRecord::new("India", date(3, 1), 9999),
                VaccinationRecord::new("X", date(3, 1), 300),
                VaccinationRecord::new("Y", date(3, 1), 100),
                VaccinationRecord::new("X", date(3, 2), 50),
            ],
        )
    }

    #[test]
    fn test_active_cases_for_region() {
        let values = active_cases_distribution(&dataset(), &CaseFilter::all().with_region("X"));
        assert_eq!(values, vec![15, 40]);
    }

    #[test]
    fn test_active_cases_date_bounds_are_inclusive() {
        let filter = CaseFilter::all().with_start(date(3, 2)).with_end(date(3, 2));
        let values = active_cases_distribution(&dataset(), &filter);
        assert_eq!(values, vec![40, -17]);
    }

    #[test]
    fn test_active_cases_empty_range() {
        let filter = CaseFilter::all().with_start(date(3, 4)).with_end(date(3, 3));
        assert!(active_cases_distribution(&dataset(), &filter).is_empty());
    }

    #[test]
    fn test_unknown_region_yields_empty() {
        let filter = CaseFilter::all().with_region("Atlantis");
        assert!(active_cases_distribution(&dataset(), &filter).is_empty());
        assert!(deaths_by_region(&dataset(), &filter).is_empty());
        assert!(vaccination_by_region(&dataset(), Some("Atlantis")).is_empty());
    }

    #[test]
    fn test_deaths_by_region_groups_and_sums() {
        let totals = deaths_by_region(&dataset(), &CaseFilter::all());
        assert_eq!(totals.get("X"), Some(&5));
        assert_eq!(totals.get("Y"), Some(&7));
        assert_eq!(totals.get("Z"), Some(&2));
    }

    #[test]
    fn test_deaths_by_region_respects_dates() {
        let totals = deaths_by_region(&dataset(), &CaseFilter::all().with_end(date(3, 1)));
        assert_eq!(totals.len(), 1);
        assert_eq!(totals.get("X"), Some(&5));
    }

    #[test]
    fn test_vaccination_excludes_sentinel() {
        let totals = vaccination_by_region(&dataset(), None);
        assert!(!totals.contains_key("India"));
        assert_eq!(totals.get("X"), Some(&350));
        assert_eq!(totals.get("Y"), Some(&100));
    }

    #[test]
    fn test_vaccination_grouping_preserves_totals() {
        let ds = dataset();
        let all = vaccination_by_region(&ds, None);

        let mut rebuilt = RegionTotals::new();
        for region in ds.vaccination_regions() {
            rebuilt.extend(vaccination_by_region(&ds, Some(region)));
        }
        assert_eq!(all, rebuilt);
    }

    #[test]
    fn test_top_confirmed_orders_descending() {
        let ds = Dataset::new(
            vec![
                CaseRecord::new("A", date(1, 1), 200, 0, 0),
                CaseRecord::new("B", date(1, 1), 500, 0, 0),
                CaseRecord::new("C", date(1, 1), 100, 0, 0),
            ],
            vec![],
        );

        let top = top_regions(&ds, RankingCriterion::MaxConfirmed);
        assert_eq!(
            top,
            vec![("B".to_string(), 500), ("A".to_string(), 200), ("C".to_string(), 100)]
        );
    }

    #[test]
    fn test_top_regions_caps_at_five_and_breaks_ties_stably() {
        let cases = ["F", "E", "D", "C", "B", "A"]
            .iter()
            .map(|r| CaseRecord::new(r, date(1, 1), 10, 0, 1))
            .collect();
        let ds = Dataset::new(cases, vec![]);

        let top = top_regions(&ds, RankingCriterion::MaxDeaths);
        let names: Vec<&str> = top.iter().map(|(r, _)| r.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn test_region_sums_saturate() {
        let ds = Dataset::new(
            vec![
                CaseRecord::new("A", date(1, 1), 0, 0, u64::MAX),
                CaseRecord::new("A", date(1, 2), 0, 0, 1),
                CaseRecord::new("B", date(1, 1), 0, 0, 7),
            ],
            vec![],
        );

        let top = top_regions(&ds, RankingCriterion::MaxDeaths);
        assert_eq!(top, vec![("A".to_string(), u64::MAX), ("B".to_string(), 7)]);
        assert_eq!(deaths_by_region(&ds, &CaseFilter::all()).get("A"), Some(&u64::MAX));
    }

    #[test]
    fn test_top_vaccinations_uses_vaccination_table() {
        let top = top_regions(&dataset(), RankingCriterion::MaxVaccinations);
        assert_eq!(top, vec![("X".to_string(), 350), ("Y".to_string(), 100)]);
    }

    #[test]
    fn test_criterion_parsing() {
        assert_eq!("max-deaths".parse::<RankingCriterion>().unwrap(), RankingCriterion::MaxDeaths);
        assert_eq!(
            "Maximum Vaccinations".parse::<RankingCriterion>().unwrap(),
            RankingCriterion::MaxVaccinations
        );
        assert_eq!(
            "MAX-CONFIRMED".parse::<RankingCriterion>().unwrap(),
            RankingCriterion::MaxConfirmed
        );

        let err = "Minimum Deaths".parse::<RankingCriterion>().unwrap_err();
        assert!(matches!(err, InsightsError::InvalidCriterion(_)));
    }
}
