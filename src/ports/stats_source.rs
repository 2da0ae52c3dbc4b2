use std::time::Duration;

use crate::domain::{CpuUsage, CtxSwitches};

/// How the CPU probe samples a process
#[derive(Debug, Clone, Copy)]
pub struct CpuSampling {
    pub samples: u32,
    pub interval: Duration,
}

impl CpuSampling {
    pub fn new(samples: u32, interval: Duration) -> Self {
        Self { samples, interval }
    }
}

/// Port for reading per-pid kernel metrics
pub trait ProcessStatsSource {
    /// Sample CPU utilization over `sampling.samples` intervals
    fn sample_cpu(
        &self,
        pid: u32,
        sampling: CpuSampling,
    ) -> Result<CpuUsage, Box<dyn std::error::Error + Send + Sync>>;

    /// Resident set size in bytes
    fn resident_memory(&self, pid: u32) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;

    /// Number of open file descriptors
    fn open_fds(&self, pid: u32) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;

    /// Number of threads
    fn thread_count(&self, pid: u32) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;

    /// Number of open inet socket connections
    fn connection_count(&self, pid: u32)
        -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;

    /// Voluntary and involuntary context switch counters
    fn context_switches(
        &self,
        pid: u32,
    ) -> Result<CtxSwitches, Box<dyn std::error::Error + Send + Sync>>;
}
