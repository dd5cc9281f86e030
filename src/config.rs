use std::path::PathBuf;

pub const DEFAULT_CASES_PATH: &str = "data/covid_19_india.csv";
pub const DEFAULT_VACCINE_PATH: &str = "data/covid_vaccine_statewise.csv";
pub const DEFAULT_LOG_FILE_PATH: &str = "logs/covid_insights.log";

/// Input locations and log destination, taken from the environment
/// (after `.env` is loaded) with fallbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub cases_path: PathBuf,
    pub vaccinations_path: PathBuf,
    pub log_file_path: PathBuf,
}

impl Settings {
    /// Reads `COVID_CASES_PATH`, `COVID_VACCINE_PATH` and `LOG_FILE_PATH`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            PathBuf::from(
                lookup(key)
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or_else(|| default.to_string()),
            )
        };

        Self {
            cases_path: get("COVID_CASES_PATH", DEFAULT_CASES_PATH),
            vaccinations_path: get("COVID_VACCINE_PATH", DEFAULT_VACCINE_PATH),
            log_file_path: get("LOG_FILE_PATH", DEFAULT_LOG_FILE_PATH),
        }
    }

    /// Replaces the input paths with any per-invocation overrides.
    pub fn with_overrides(mut self, cases: Option<PathBuf>, vaccinations: Option<PathBuf>) -> Self {
        if let Some(path) = cases {
            self.cases_path = path;
        }
        if let Some(path) = vaccinations {
            self.vaccinations_path = path;
        }
        self
    }
}
