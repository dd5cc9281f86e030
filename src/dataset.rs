//! Typed, cleaned records and the immutable [`Dataset`] that queries read.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use tracing::info;

use crate::error::Result;
use crate::loader::RawTable;
use crate::preprocess::{self, CASE_TABLE, VACCINATION_TABLE};

/// Region value of the synthetic national-aggregate row in the vaccination table.
pub const NATIONAL_SENTINEL: &str = "India";

/// One day of case counts for one region.
///
/// Active cases are not stored; they are derived from the three counts on
/// every read, so a record can never disagree with itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseRecord {
    pub region: String,
    pub date: NaiveDate,
    pub confirmed: u64,
    pub cured: u64,
    pub deaths: u64,
}

impl CaseRecord {
    pub fn new(region: &str, date: NaiveDate, confirmed: u64, cured: u64, deaths: u64) -> Self {
        Self {
            region: region.to_string(),
            date,
            confirmed,
            cured,
            deaths,
        }
    }

    /// `confirmed - (cured + deaths)`. Negative when the source is inconsistent.
    /// Saturates at the `i64` bounds instead of wrapping.
    pub fn active_cases(&self) -> i64 {
        let active =
            i128::from(self.confirmed) - (i128::from(self.cured) + i128::from(self.deaths));
        active.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }
}

// Exported rows carry the derived column after the source counts.
impl Serialize for CaseRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut row = serializer.serialize_struct("CaseRecord", 6)?;
        row.serialize_field("region", &self.region)?;
        row.serialize_field("date", &self.date)?;
        row.serialize_field("confirmed", &self.confirmed)?;
        row.serialize_field("cured", &self.cured)?;
        row.serialize_field("deaths", &self.deaths)?;
        row.serialize_field("active_cases", &self.active_cases())?;
        row.end()
    }
}

/// One reporting day of cumulative vaccinations for one region.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct VaccinationRecord {
    pub region: String,
    pub date: NaiveDate,
    pub total_vaccinated: u64,
}

impl VaccinationRecord {
    pub fn new(region: &str, date: NaiveDate, total_vaccinated: u64) -> Self {
        Self {
            region: region.to_string(),
            date,
            total_vaccinated,
        }
    }
}

/// Counters collected while cleaning the raw tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct DataQuality {
    pub dropped_case_columns: usize,
    pub negative_active_rows: usize,
    pub sentinel_rows_removed: usize,
    pub blank_vaccination_totals: usize,
}

/// Both cleaned tables. Built once, then only read.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    cases: Vec<CaseRecord>,
    vaccinations: Vec<VaccinationRecord>,
    quality: DataQuality,
}

impl Dataset {
    /// Builds a dataset from already-typed records. Sentinel vaccination rows
    /// are discarded here as well, so every `Dataset` upholds the same invariant.
    pub fn new(cases: Vec<CaseRecord>, mut vaccinations: Vec<VaccinationRecord>) -> Self {
        let before = vaccinations.len();
        vaccinations.retain(|v| v.region != NATIONAL_SENTINEL);

        let quality = DataQuality {
            negative_active_rows: cases.iter().filter(|c| c.active_cases() < 0).count(),
            sentinel_rows_removed: before - vaccinations.len(),
            ..Default::default()
        };

        Self {
            cases,
            vaccinations,
            quality,
        }
    }

    pub(crate) fn from_parts(
        cases: Vec<CaseRecord>,
        vaccinations: Vec<VaccinationRecord>,
        quality: DataQuality,
    ) -> Self {
        Self {
            cases,
            vaccinations,
            quality,
        }
    }

    /// Reads both files and runs them through the preprocessor.
    #[tracing::instrument(skip_all, fields(cases = %cases_path.display(), vaccinations = %vaccinations_path.display()))]
    pub fn load(cases_path: &Path, vaccinations_path: &Path) -> Result<Self> {
        let cases = RawTable::from_path(CASE_TABLE, cases_path)?;
        let vaccinations = RawTable::from_path(VACCINATION_TABLE, vaccinations_path)?;

        let dataset = preprocess::preprocess(cases, vaccinations)?;

        info!(
            case_rows = dataset.cases.len(),
            vaccination_rows = dataset.vaccinations.len(),
            "Dataset loaded"
        );

        Ok(dataset)
    }

    pub fn cases(&self) -> &[CaseRecord] {
        &self.cases
    }

    pub fn vaccinations(&self) -> &[VaccinationRecord] {
        &self.vaccinations
    }

    pub fn quality(&self) -> &DataQuality {
        &self.quality
    }

    /// Distinct case-table regions, sorted.
    pub fn case_regions(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.cases.iter().map(|c| c.region.as_str()).collect();
        set.into_iter().collect()
    }

    /// Distinct vaccination-table regions, sorted.
    pub fn vaccination_regions(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self
            .vaccinations
            .iter()
            .map(|v| v.region.as_str())
            .collect();
        set.into_iter().collect()
    }
}
