use chrono::NaiveDate;
use serde::Serialize;

use crate::chart::pct;
use crate::dataset::{DataQuality, Dataset};

/// Shape of a loaded [`Dataset`]: sizes, coverage, and cleaning counters.
#[derive(Debug, Default, Serialize)]
pub struct DatasetSummary {
    pub case_rows: usize,
    pub vaccination_rows: usize,
    pub case_regions: usize,
    pub vaccination_regions: usize,

    // case-table date span
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,

    pub total_confirmed: u64,
    pub total_deaths: u64,

    /// Share of case rows whose active count came out negative.
    pub negative_active_pct: f64,

    pub quality: DataQuality,
}

impl DatasetSummary {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let cases = dataset.cases();
        let quality = dataset.quality();

        DatasetSummary {
            case_rows: cases.len(),
            vaccination_rows: dataset.vaccinations().len(),
            case_regions: dataset.case_regions().len(),
            vaccination_regions: dataset.vaccination_regions().len(),
            first_date: cases.iter().map(|c| c.date).min(),
            last_date: cases.iter().map(|c| c.date).max(),
            total_confirmed: cases.iter().fold(0, |acc: u64, c| acc.saturating_add(c.confirmed)),
            total_deaths: cases.iter().fold(0, |acc: u64, c| acc.saturating_add(c.deaths)),
            negative_active_pct: pct(quality.negative_active_rows as u64, cases.len() as u64),
            quality: quality.clone(),
        }
    }
}
