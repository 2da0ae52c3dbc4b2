mod parser;
mod stats;

use std::path::PathBuf;

pub use stats::{ProcfsStatsSource, StatsError};

/// Configuration for the proc root (overridable for tests and
/// container mounts)
#[derive(Debug, Clone)]
pub struct ProcfsConfig {
    pub proc_path: PathBuf,
}

impl ProcfsConfig {
    pub fn new(proc_path: impl Into<PathBuf>) -> Self {
        Self {
            proc_path: proc_path.into(),
        }
    }

    pub fn host() -> Self {
        Self {
            proc_path: PathBuf::from("/proc"),
        }
    }
}

impl Default for ProcfsConfig {
    fn default() -> Self {
        Self::host()
    }
}
