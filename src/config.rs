use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::ports::CpuSampling;

/// Plugin configuration, read from the environment. Munin passes
/// `env.url` style directives through as plain variables, so the names
/// are the bare lowercase words a plugin config would set.
#[derive(Debug, Clone)]
pub struct Config {
    pub url: String,
    pub proc_path: PathBuf,
    pub cpu_samples: u32,
    pub cpu_sample_interval: Duration,
    pub rpc_timeout: Duration,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            url: lookup("url").unwrap_or_else(|| "unix:///var/run/supervisord.sock".to_string()),
            proc_path: lookup("proc_path")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("/proc")),
            cpu_samples: lookup("cpu_samples")
                .and_then(|s| s.parse().ok())
                .unwrap_or(20),
            cpu_sample_interval: Duration::from_millis(
                lookup("cpu_sample_interval_ms")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(100),
            ),
            rpc_timeout: Duration::from_millis(
                lookup("rpc_timeout_ms")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5000),
            ),
            log_level: lookup("log_level").unwrap_or_else(|| "warn".to_string()),
        }
    }

    pub fn cpu_sampling(&self) -> CpuSampling {
        CpuSampling::new(self.cpu_samples, self.cpu_sample_interval)
    }
}
