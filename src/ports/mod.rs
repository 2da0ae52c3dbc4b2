pub mod process_directory;
pub mod stats_source;

pub use process_directory::{DaemonIdentity, ProcessDirectory};
pub use stats_source::{CpuSampling, ProcessStatsSource};
