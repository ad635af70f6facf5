use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Score for one (user, test) pair, as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TestResult {
    pub correct: usize,
    pub total: usize,
}

impl TestResult {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64 * 100.0
    }
}

/// user id -> test id -> result. Sorted maps keep the file stable between saves.
pub type Results = BTreeMap<String, BTreeMap<String, TestResult>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    AlreadyRecorded,
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write-once quiz results backed by a JSON file.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    results: Results,
}

impl Ledger {
    /// Reads the ledger file. Never fails: a missing or broken file gives an
    /// empty ledger.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let results = match read_results(&path) {
            Ok(results) => {
                log::info!("Loaded quiz results for {} users from {}", results.len(), path.display());
                results
            }
            Err(LedgerError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                log::warn!("Results file {} not found, starting empty", path.display());
                Results::new()
            }
            Err(LedgerError::Json(e)) => {
                log::error!("Results file {} is malformed ({}), starting empty", path.display(), e);
                Results::new()
            }
            Err(e) => {
                log::error!("Can't read results file {} ({}), starting empty", path.display(), e);
                Results::new()
            }
        };

        Self { path, results }
    }

    pub fn results(&self) -> &Results {
        &self.results
    }

    pub fn user_results(&self, user_id: &str) -> Option<&BTreeMap<String, TestResult>> {
        self.results.get(user_id).filter(|tests| !tests.is_empty())
    }

    pub fn get(&self, user_id: &str, test_id: &str) -> Option<TestResult> {
        self.results.get(user_id)?.get(test_id).copied()
    }

    /// Stores the first result for a (user, test) pair and saves the file.
    /// Later results for the same pair are dropped.
    pub fn record(&mut self, user_id: &str, test_id: &str, result: TestResult) -> RecordOutcome {
        let tests = self.results.entry(user_id.to_string()).or_default();
        if tests.contains_key(test_id) {
            log::info!("User {} already has a result for {}, not recording", user_id, test_id);
            return RecordOutcome::AlreadyRecorded;
        }

        tests.insert(test_id.to_string(), result);
        log::info!(
            "Recorded {}/{} for user {} on {}",
            result.correct,
            result.total,
            user_id,
            test_id
        );
        self.save();
        RecordOutcome::Recorded
    }

    /// Overwrites the file with the whole ledger. Failures are only logged.
    pub fn save(&self) {
        match self.try_save() {
            Ok(()) => log::info!("Quiz results saved to {}", self.path.display()),
            Err(e) => log::error!("Failed to save quiz results to {}: {}", self.path.display(), e),
        }
    }

    pub fn try_save(&self) -> Result<(), LedgerError> {
        let json = serde_json::to_string(&self.results)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

fn read_results(path: &Path) -> Result<Results, LedgerError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
