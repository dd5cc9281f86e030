//! Chart selection and renderer-neutral chart payloads.
//!
//! [`dispatch`] maps a [`ChartKind`] onto the matching query and packages the
//! result as [`ChartData`]: a titled histogram, pie, or bar series that any
//! plotting backend (or the CLI's table/JSON/CSV sinks) can draw.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::InsightsError;
use crate::query::{
    self, CaseFilter, HISTOGRAM_BINS, RankingCriterion, RegionTotals, TOP_K,
};

/// The six views the shell can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    ActiveCasesHistogram,
    DeathsPie,
    VaccinationPie,
    TopByDeaths,
    TopByVaccinations,
    TopByConfirmed,
}

impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        ChartKind::ActiveCasesHistogram,
        ChartKind::DeathsPie,
        ChartKind::VaccinationPie,
        ChartKind::TopByDeaths,
        ChartKind::TopByVaccinations,
        ChartKind::TopByConfirmed,
    ];

    /// Name shown in the chart-type selector.
    pub fn label(self) -> &'static str {
        match self {
            ChartKind::ActiveCasesHistogram => "Active Cases Histogram",
            ChartKind::DeathsPie => "Deaths Pie Chart",
            ChartKind::VaccinationPie => "Vaccinations Pie Chart",
            ChartKind::TopByDeaths => "Top 5 States by Maximum Deaths",
            ChartKind::TopByVaccinations => "Top 5 States by Maximum Vaccinations",
            ChartKind::TopByConfirmed => "Top 5 States by Maximum Confirmed",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            ChartKind::ActiveCasesHistogram => "active-cases-histogram",
            ChartKind::DeathsPie => "deaths-pie",
            ChartKind::VaccinationPie => "vaccination-pie",
            ChartKind::TopByDeaths => "top-by-deaths",
            ChartKind::TopByVaccinations => "top-by-vaccinations",
            ChartKind::TopByConfirmed => "top-by-confirmed",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ChartKind {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.slug().eq_ignore_ascii_case(wanted) || k.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| InsightsError::UnknownChart(s.to_string()))
    }
}

/// A chart kind plus the filters collected alongside it.
///
/// The vaccination pie only honours `filter.region`; top-5 views ignore the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRequest {
    pub kind: ChartKind,
    pub filter: CaseFilter,
}

impl ChartRequest {
    pub fn new(kind: ChartKind) -> Self {
        Self {
            kind,
            filter: CaseFilter::default(),
        }
    }

    pub fn with_filter(mut self, filter: CaseFilter) -> Self {
        self.filter = filter;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: String,
    pub value: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: u64,
}

/// Ready-to-draw chart payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "chart", rename_all = "snake_case")]
pub enum ChartData {
    Histogram {
        title: String,
        x_label: String,
        y_label: String,
        values: Vec<i64>,
        bins: Vec<HistogramBin>,
    },
    Pie {
        title: String,
        slices: Vec<PieSlice>,
    },
    Bar {
        title: String,
        x_label: String,
        y_label: String,
        bars: Vec<Bar>,
    },
}

impl ChartData {
    pub fn title(&self) -> &str {
        match self {
            ChartData::Histogram { title, .. }
            | ChartData::Pie { title, .. }
            | ChartData::Bar { title, .. } => title,
        }
    }

    /// True when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        match self {
            ChartData::Histogram { values, .. } => values.is_empty(),
            ChartData::Pie { slices, .. } => slices.is_empty(),
            ChartData::Bar { bars, .. } => bars.is_empty(),
        }
    }

    /// Flattens the chart into `(label, value)` rows for tabular sinks.
    pub fn series(&self) -> Vec<(String, f64)> {
        match self {
            ChartData::Histogram { bins, .. } => bins
                .iter()
                .map(|b| (format!("{:.1}..{:.1}", b.lower, b.upper), b.count as f64))
                .collect(),
            ChartData::Pie { slices, .. } => slices
                .iter()
                .map(|s| (s.label.clone(), s.value as f64))
                .collect(),
            ChartData::Bar { bars, .. } => bars
                .iter()
                .map(|b| (b.label.clone(), b.value as f64))
                .collect(),
        }
    }
}

/// Runs the query behind `request.kind` and wraps the result for rendering.
#[tracing::instrument(skip(dataset), fields(kind = %request.kind))]
pub fn dispatch(dataset: &Dataset, request: &ChartRequest) -> ChartData {
    let chart = match request.kind {
        ChartKind::ActiveCasesHistogram => {
            let values = query::active_cases_distribution(dataset, &request.filter);
            let bins = histogram(&values, HISTOGRAM_BINS);
            ChartData::Histogram {
                title: "Histogram of Active Cases in India".to_string(),
                x_label: "Number of Active Cases".to_string(),
                y_label: "Frequency".to_string(),
                values,
                bins,
            }
        }
        ChartKind::DeathsPie => ChartData::Pie {
            title: "Distribution of Total Deaths by State".to_string(),
            slices: pie_slices(&query::deaths_by_region(dataset, &request.filter)),
        },
        ChartKind::VaccinationPie => {
            let region = request.filter.region.as_deref();
            ChartData::Pie {
                title: format!(
                    "Vaccination Distribution for {}",
                    region.unwrap_or("All States")
                ),
                slices: pie_slices(&query::vaccination_by_region(dataset, region)),
            }
        }
        ChartKind::TopByDeaths => top_chart(dataset, RankingCriterion::MaxDeaths),
        ChartKind::TopByVaccinations => top_chart(dataset, RankingCriterion::MaxVaccinations),
        ChartKind::TopByConfirmed => top_chart(dataset, RankingCriterion::MaxConfirmed),
    };

    debug!(empty = chart.is_empty(), title = chart.title(), "Chart prepared");
    chart
}

/// Bar chart of the top regions for `criterion`.
pub fn top_chart(dataset: &Dataset, criterion: RankingCriterion) -> ChartData {
    ChartData::Bar {
        title: format!("Top {TOP_K} States by {criterion}"),
        x_label: "States".to_string(),
        y_label: "Number of People".to_string(),
        bars: query::top_regions(dataset, criterion)
            .into_iter()
            .map(|(label, value)| Bar { label, value })
            .collect(),
    }
}

/// Equal-width bins over `[min, max]`; the last bin is closed on the right.
/// A constant series is centred in a unit-wide range.
pub fn histogram(values: &[i64], bins: usize) -> Vec<HistogramBin> {
    let (Some(&min), Some(&max)) = (values.iter().min(), values.iter().max()) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }

    let (lo, hi) = if min == max {
        (min as f64 - 0.5, max as f64 + 0.5)
    } else {
        (min as f64, max as f64)
    };
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v as f64 - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: lo + width * i as f64,
            upper: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count,
        })
        .collect()
}

/// Slices in region order, each with its share of the total.
pub fn pie_slices(totals: &RegionTotals) -> Vec<PieSlice> {
    let total: u64 = totals.values().sum();
    totals
        .iter()
        .map(|(label, &value)| PieSlice {
            label: label.clone(),
            value,
            percent: pct(value, total),
        })
        .collect()
}

pub fn pct(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}
