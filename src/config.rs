use std::path::PathBuf;

const DEFAULT_RESULTS_FILE: &str = "quiz_results.json";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("ACCESS_CODE is not set")]
    MissingAccessCode,
    #[error("ACCESS_CODE must not be empty")]
    EmptyAccessCode,
}

/// Runtime settings. The bot token is not part of it: `Bot::from_env` reads
/// `TELOXIDE_TOKEN` on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub access_code: String,
    pub results_file: PathBuf,
    pub courses_file: Option<PathBuf>,
    pub log_filter: String,
}

impl Config {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env is fine, the variables may come from the environment
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Compared verbatim later on, so no trimming here
        let access_code = lookup("ACCESS_CODE").ok_or(ConfigError::MissingAccessCode)?;
        if access_code.is_empty() {
            return Err(ConfigError::EmptyAccessCode);
        }

        let results_file = lookup("RESULTS_FILE")
            .filter(|path| !path.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_RESULTS_FILE.to_string())
            .into();
        let courses_file = lookup("COURSES_FILE")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        let log_filter = lookup("RUST_LOG")
            .filter(|filter| !filter.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            access_code,
            results_file,
            courses_file,
            log_filter,
        })
    }
}
