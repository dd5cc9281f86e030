//! Turns the two raw tables into typed, cleaned records.
//!
//! Case table: unused identifier/nationality columns are dropped, `Date` is
//! parsed as `%Y-%m-%d`, and active cases are derived per row.
//! Vaccination table: the total column is renamed to `Total` and the national
//! aggregate row is removed.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::dataset::{CaseRecord, DataQuality, Dataset, NATIONAL_SENTINEL, VaccinationRecord};
use crate::error::{InsightsError, Result};
use crate::loader::RawTable;

pub const CASE_TABLE: &str = "cases";
pub const VACCINATION_TABLE: &str = "vaccinations";

pub const CASE_DATE_FORMAT: &str = "%Y-%m-%d";
pub const VACCINATION_DATE_FORMAT: &str = "%d/%m/%Y";

/// Source column names.
pub mod columns {
    pub const REGION: &str = "State/UnionTerritory";
    pub const DATE: &str = "Date";
    pub const CONFIRMED: &str = "Confirmed";
    pub const CURED: &str = "Cured";
    pub const DEATHS: &str = "Deaths";

    /// Dropped from the case table when present.
    pub const UNUSED: &[&str] = &[
        "Sno",
        "Time",
        "ConfirmedIndianNational",
        "ConfirmedForeignNational",
    ];

    pub const VACCINATION_REGION: &str = "State";
    pub const VACCINATION_DATE: &str = "Updated On";
    pub const VACCINATION_TOTAL_SOURCE: &str = "Total Individuals Vaccinated";
    pub const VACCINATION_TOTAL: &str = "Total";
}

/// Cleans both tables and assembles the [`Dataset`].
pub fn preprocess(cases: RawTable, vaccinations: RawTable) -> Result<Dataset> {
    let mut quality = DataQuality::default();

    let cases = clean_cases(cases, &mut quality)?;
    let vaccinations = clean_vaccinations(vaccinations, &mut quality)?;

    if quality.negative_active_rows > 0 {
        warn!(
            rows = quality.negative_active_rows,
            "Case rows with negative active cases (cured + deaths exceed confirmed); values kept as-is"
        );
    }
    if quality.blank_vaccination_totals > 0 {
        warn!(
            rows = quality.blank_vaccination_totals,
            "Vaccination rows with a blank total; counted as zero"
        );
    }

    Ok(Dataset::from_parts(cases, vaccinations, quality))
}

/// Types the case table. Fails on the first malformed date or count.
#[tracing::instrument(skip_all, fields(rows = raw.len()))]
pub fn clean_cases(mut raw: RawTable, quality: &mut DataQuality) -> Result<Vec<CaseRecord>> {
    quality.dropped_case_columns = raw.drop_columns(columns::UNUSED);
    debug!(dropped = quality.dropped_case_columns, "Dropped unused case columns");

    let region = raw.require_column(columns::REGION)?;
    let date = raw.require_column(columns::DATE)?;
    let confirmed = raw.require_column(columns::CONFIRMED)?;
    let cured = raw.require_column(columns::CURED)?;
    let deaths = raw.require_column(columns::DEATHS)?;

    let mut records = Vec::with_capacity(raw.len());

    for (row_no, row) in raw.numbered_rows() {
        let cell = |idx: usize| row.get(idx).unwrap_or("");

        let record = CaseRecord::new(
            cell(region).trim(),
            parse_date(columns::DATE, row_no, cell(date), CASE_DATE_FORMAT)?,
            parse_count(columns::CONFIRMED, row_no, cell(confirmed))?,
            parse_count(columns::CURED, row_no, cell(cured))?,
            parse_count(columns::DEATHS, row_no, cell(deaths))?,
        );

        if record.active_cases() < 0 {
            quality.negative_active_rows += 1;
        }
        records.push(record);
    }

    info!(rows = records.len(), "Case table cleaned");
    Ok(records)
}

/// Types the vaccination table after removing national-aggregate rows.
#[tracing::instrument(skip_all, fields(rows = raw.len()))]
pub fn clean_vaccinations(
    mut raw: RawTable,
    quality: &mut DataQuality,
) -> Result<Vec<VaccinationRecord>> {
    raw.rename_column(columns::VACCINATION_TOTAL_SOURCE, columns::VACCINATION_TOTAL);
    quality.sentinel_rows_removed =
        raw.retain_rows(columns::VACCINATION_REGION, |name| name != NATIONAL_SENTINEL)?;

    let region = raw.require_column(columns::VACCINATION_REGION)?;
    let date = raw.require_column(columns::VACCINATION_DATE)?;
    let total = raw.require_column(columns::VACCINATION_TOTAL)?;

    let mut records = Vec::with_capacity(raw.len());

    for (row_no, row) in raw.numbered_rows() {
        let cell = |idx: usize| row.get(idx).unwrap_or("");

        let raw_total = cell(total);
        let total_vaccinated = if raw_total.trim().is_empty() {
            quality.blank_vaccination_totals += 1;
            0
        } else {
            parse_count(columns::VACCINATION_TOTAL, row_no, raw_total)?
        };

        records.push(VaccinationRecord::new(
            cell(region).trim(),
            parse_date(columns::VACCINATION_DATE, row_no, cell(date), VACCINATION_DATE_FORMAT)?,
            total_vaccinated,
        ));
    }

    info!(
        rows = records.len(),
        sentinel_removed = quality.sentinel_rows_removed,
        "Vaccination table cleaned"
    );
    Ok(records)
}

/// Parses `value` with a fixed `format`, naming the cell on failure.
pub fn parse_date(column: &str, row: usize, value: &str, format: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), format).map_err(|e| {
        InsightsError::data_format(column, row, value, format!("expected date {format}: {e}"))
    })
}

/// Largest count any column may hold, so derived values stay within `i64`.
pub const MAX_COUNT: u64 = i64::MAX as u64;

/// Parses a non-negative whole count no larger than [`MAX_COUNT`]. Integral
/// decimals such as `"48276.0"` are accepted because spreadsheet exports write
/// counts that way; the fraction must be all zeros.
pub fn parse_count(column: &str, row: usize, value: &str) -> Result<u64> {
    let v = value.trim();
    let digits = match v.split_once('.') {
        Some((whole, fraction)) if fraction.bytes().all(|b| b == b'0') => whole,
        _ => v,
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InsightsError::data_format(
            column,
            row,
            value,
            "expected a non-negative whole number",
        ));
    }

    match digits.parse::<u64>() {
        Ok(n) if n <= MAX_COUNT => Ok(n),
        _ => Err(InsightsError::data_format(
            column,
            row,
            value,
            format!("count exceeds {MAX_COUNT}"),
        )),
    }
}
