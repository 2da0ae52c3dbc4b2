pub mod procfs;
pub mod supervisor;

pub use procfs::{ProcfsConfig, ProcfsStatsSource};
pub use supervisor::SupervisorClient;
