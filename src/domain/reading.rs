/// Sampled CPU utilization for one process
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuUsage {
    pub avg_percent: f64,
    pub max_percent: f64,
}

impl CpuUsage {
    pub fn new(avg_percent: f64, max_percent: f64) -> Self {
        Self {
            avg_percent,
            max_percent,
        }
    }

    pub fn zero() -> Self {
        Self {
            avg_percent: 0.0,
            max_percent: 0.0,
        }
    }
}

/// Context switch counters for one process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CtxSwitches {
    pub voluntary: u64,
    pub involuntary: u64,
}

impl CtxSwitches {
    pub fn new(voluntary: u64, involuntary: u64) -> Self {
        Self {
            voluntary,
            involuntary,
        }
    }
}

/// One process's value for one metric category
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Cpu(CpuUsage),
    /// Resident set size in bytes
    ResidentMemory(u64),
    OpenFds(u64),
    Threads(u64),
    Connections(u64),
    ContextSwitches(CtxSwitches),
}

impl Reading {
    /// Value for the n-th graph of the owning category (two-series
    /// categories expose avg/max and voluntary/involuntary).
    pub fn series_value(&self, series: usize) -> f64 {
        match (self, series) {
            (Self::Cpu(cpu), 0) => cpu.avg_percent,
            (Self::Cpu(cpu), _) => cpu.max_percent,
            (Self::ResidentMemory(bytes), _) => *bytes as f64 / (1024.0 * 1024.0),
            (Self::OpenFds(n), _) => *n as f64,
            (Self::Threads(n), _) => *n as f64,
            (Self::Connections(n), _) => *n as f64,
            (Self::ContextSwitches(ctx), 0) => ctx.voluntary as f64,
            (Self::ContextSwitches(ctx), _) => ctx.involuntary as f64,
        }
    }
}
