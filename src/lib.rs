pub mod chart;
pub mod config;
pub mod dataset;
pub mod error;
pub mod loader;
pub mod output;
pub mod preprocess;
pub mod query;
pub mod summary;

pub use chart::{ChartData, ChartKind, ChartRequest, dispatch};
pub use dataset::{CaseRecord, Dataset, VaccinationRecord};
pub use error::{InsightsError, Result};
pub use query::{CaseFilter, RankingCriterion, RegionTotals};
