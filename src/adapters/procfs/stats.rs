use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use nix::unistd::{sysconf, SysconfVar};
use thiserror::Error;
use tracing::trace;

use crate::domain::{CpuUsage, CtxSwitches};
use crate::ports::{CpuSampling, ProcessStatsSource};

use super::parser::{self, ParseError};
use super::ProcfsConfig;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("process {0} no longer exists")]
    Vanished(u32),

    #[error("cannot read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

type StatsResult<T> = Result<T, StatsError>;

/// Per-pid metric source reading /proc
pub struct ProcfsStatsSource {
    config: ProcfsConfig,
    clock_ticks: f64,
}

impl ProcfsStatsSource {
    pub fn new(config: ProcfsConfig) -> Self {
        Self {
            config,
            clock_ticks: clock_ticks(),
        }
    }

    fn pid_path(&self, pid: u32, name: &str) -> PathBuf {
        self.config.proc_path.join(pid.to_string()).join(name)
    }

    fn read_pid_file(&self, pid: u32, name: &str) -> StatsResult<String> {
        let path = self.pid_path(pid, name);
        fs::read_to_string(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                StatsError::Vanished(pid)
            } else {
                StatsError::Io { path, source }
            }
        })
    }

    fn read_cpu(&self, pid: u32, sampling: CpuSampling) -> StatsResult<CpuUsage> {
        if sampling.samples == 0 {
            return Ok(CpuUsage::zero());
        }

        let mut previous = parser::parse_proc_stat(&self.read_pid_file(pid, "stat")?)?;
        let mut previous_at = Instant::now();
        let mut samples = Vec::with_capacity(sampling.samples as usize);

        for _ in 0..sampling.samples {
            thread::sleep(sampling.interval);
            let current = parser::parse_proc_stat(&self.read_pid_file(pid, "stat")?)?;
            let now = Instant::now();

            let ticks = current.total_ticks().saturating_sub(previous.total_ticks());
            samples.push(cpu_percent(
                ticks,
                self.clock_ticks,
                now.duration_since(previous_at).as_secs_f64(),
            ));

            previous = current;
            previous_at = now;
        }

        let max = samples.iter().copied().fold(0.0, f64::max);
        let avg = samples.iter().sum::<f64>() / samples.len() as f64;
        trace!(pid, avg, max, "sampled cpu");
        Ok(CpuUsage::new(avg, max))
    }

    fn read_open_fds(&self, pid: u32) -> StatsResult<u64> {
        Ok(self.fd_entries(pid)?.len() as u64)
    }

    fn read_connections(&self, pid: u32) -> StatsResult<u64> {
        let mut socket_inodes = HashSet::new();
        for entry in self.fd_entries(pid)? {
            // A descriptor may close between listing and readlink
            let Ok(target) = fs::read_link(&entry) else {
                continue;
            };
            if let Some(inode) = parser::parse_socket_inode(&target.to_string_lossy()) {
                socket_inodes.insert(inode);
            }
        }

        // Inet sockets only: match fd inodes against the kernel tables
        let mut count = 0;
        for table in ["tcp", "tcp6", "udp", "udp6"] {
            let path = self.config.proc_path.join("net").join(table);
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                // Table absent on kernels without the protocol
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(source) => return Err(StatsError::Io { path, source }),
            };
            count += parser::parse_net_table_inodes(&content)
                .intersection(&socket_inodes)
                .count() as u64;
        }

        Ok(count)
    }

    fn fd_entries(&self, pid: u32) -> StatsResult<Vec<PathBuf>> {
        let path = self.pid_path(pid, "fd");
        let entries = fs::read_dir(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                StatsError::Vanished(pid)
            } else {
                StatsError::Io { path: path.clone(), source }
            }
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StatsError::Io {
                path: path.clone(),
                source,
            })?;
            paths.push(entry.path());
        }
        Ok(paths)
    }
}

impl ProcessStatsSource for ProcfsStatsSource {
    fn sample_cpu(
        &self,
        pid: u32,
        sampling: CpuSampling,
    ) -> Result<CpuUsage, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.read_cpu(pid, sampling)?)
    }

    fn resident_memory(&self, pid: u32) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        let status = parser::parse_proc_status(&self.read_pid_file(pid, "status")?)?;
        Ok(status.vm_rss_bytes)
    }

    fn open_fds(&self, pid: u32) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.read_open_fds(pid)?)
    }

    fn thread_count(&self, pid: u32) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        let stat = parser::parse_proc_stat(&self.read_pid_file(pid, "stat")?)?;
        Ok(stat.num_threads)
    }

    fn connection_count(
        &self,
        pid: u32,
    ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.read_connections(pid)?)
    }

    fn context_switches(
        &self,
        pid: u32,
    ) -> Result<CtxSwitches, Box<dyn std::error::Error + Send + Sync>> {
        let status = parser::parse_proc_status(&self.read_pid_file(pid, "status")?)?;
        Ok(CtxSwitches::new(
            status.voluntary_ctxt_switches,
            status.nonvoluntary_ctxt_switches,
        ))
    }
}

fn cpu_percent(ticks: u64, clock_ticks: f64, wall_secs: f64) -> f64 {
    if wall_secs <= 0.0 {
        return 0.0;
    }
    (ticks as f64 / clock_ticks) / wall_secs * 100.0
}

fn clock_ticks() -> f64 {
    match sysconf(SysconfVar::CLK_TCK) {
        Ok(Some(hz)) if hz > 0 => hz as f64,
        // USER_HZ has been 100 on every mainstream kernel
        _ => 100.0,
    }
}
