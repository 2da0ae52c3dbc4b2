use tracing::debug;

use crate::domain::{MetricCategory, Reading, SupervisedProcess};
use crate::ports::{CpuSampling, DaemonIdentity, ProcessDirectory, ProcessStatsSource};

type CollectResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// One collection pass for one metric category
#[derive(Debug)]
pub struct Report {
    pub identity: DaemonIdentity,
    pub readings: Vec<(SupervisedProcess, Reading)>,
}

/// Application service tying the supervisor directory to the kernel
/// stats source
pub struct MetricCollector {
    directory: Box<dyn ProcessDirectory>,
    stats: Box<dyn ProcessStatsSource>,
    cpu_sampling: CpuSampling,
}

impl MetricCollector {
    pub fn new(
        directory: Box<dyn ProcessDirectory>,
        stats: Box<dyn ProcessStatsSource>,
        cpu_sampling: CpuSampling,
    ) -> Self {
        Self {
            directory,
            stats,
            cpu_sampling,
        }
    }

    /// Supervised processes that are currently RUNNING. Anything else
    /// has no live pid to poll and gets no graph field.
    pub fn running_processes(&self) -> CollectResult<Vec<SupervisedProcess>> {
        let processes = self.directory.list_processes()?;
        let running: Vec<_> = processes.into_iter().filter(|p| p.is_running()).collect();
        debug!(count = running.len(), "running supervised processes");
        Ok(running)
    }

    /// Collect one category for every running process. Any failing
    /// read fails the whole pass; no partial metric sets are emitted.
    pub fn collect(&self, category: MetricCategory) -> CollectResult<Report> {
        let identity = self.directory.identification()?;
        debug!(
            identifier = %identity.identifier,
            pid = identity.pid,
            "connected to supervisor"
        );

        let mut readings = Vec::new();
        for process in self.running_processes()? {
            let reading = self.read(category, process.pid)?;
            readings.push((process, reading));
        }

        Ok(Report { identity, readings })
    }

    fn read(&self, category: MetricCategory, pid: u32) -> CollectResult<Reading> {
        Ok(match category {
            MetricCategory::Cpu => Reading::Cpu(self.stats.sample_cpu(pid, self.cpu_sampling)?),
            MetricCategory::Memory => Reading::ResidentMemory(self.stats.resident_memory(pid)?),
            MetricCategory::FileDescriptors => Reading::OpenFds(self.stats.open_fds(pid)?),
            MetricCategory::Threads => Reading::Threads(self.stats.thread_count(pid)?),
            MetricCategory::Connections => Reading::Connections(self.stats.connection_count(pid)?),
            MetricCategory::ContextSwitches => {
                Reading::ContextSwitches(self.stats.context_switches(pid)?)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::{CpuUsage, CtxSwitches, SupervisorState};

    struct FakeDirectory {
        processes: Vec<SupervisedProcess>,
    }

    impl ProcessDirectory for FakeDirectory {
        fn identification(
            &self,
        ) -> Result<DaemonIdentity, Box<dyn std::error::Error + Send + Sync>> {
            Ok(DaemonIdentity {
                identifier: "supervisor".into(),
                pid: 1,
            })
        }

        fn list_processes(
            &self,
        ) -> Result<Vec<SupervisedProcess>, Box<dyn std::error::Error + Send + Sync>> {
            Ok(self.processes.clone())
        }
    }

    struct FakeStats {
        fds: u64,
        vanished: bool,
    }

    impl ProcessStatsSource for FakeStats {
        fn sample_cpu(
            &self,
            _pid: u32,
            _sampling: CpuSampling,
        ) -> Result<CpuUsage, Box<dyn std::error::Error + Send + Sync>> {
            Ok(CpuUsage::new(12.5, 40.0))
        }

        fn resident_memory(
            &self,
            _pid: u32,
        ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
            Ok(64 * 1024 * 1024)
        }

        fn open_fds(&self, pid: u32) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
            if self.vanished {
                return Err(format!("process {pid} no longer exists").into());
            }
            Ok(self.fds)
        }

        fn thread_count(&self, _pid: u32) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
            Ok(2)
        }

        fn connection_count(
            &self,
            _pid: u32,
        ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
            Ok(5)
        }

        fn context_switches(
            &self,
            _pid: u32,
        ) -> Result<CtxSwitches, Box<dyn std::error::Error + Send + Sync>> {
            Ok(CtxSwitches::new(100, 10))
        }
    }

    fn processes() -> Vec<SupervisedProcess> {
        vec![
            SupervisedProcess::new("web".into(), "web".into(), 100, SupervisorState::Running),
            SupervisedProcess::new("worker".into(), "web".into(), 101, SupervisorState::Running),
            SupervisedProcess::new("old".into(), "old".into(), 0, SupervisorState::Stopped),
        ]
    }

    fn collector(vanished: bool) -> MetricCollector {
        MetricCollector::new(
            Box::new(FakeDirectory {
                processes: processes(),
            }),
            Box::new(FakeStats { fds: 17, vanished }),
            CpuSampling::new(1, Duration::from_millis(1)),
        )
    }

    #[test]
    fn test_collect_skips_non_running() {
        let report = collector(false).collect(MetricCategory::FileDescriptors).unwrap();
        assert_eq!(report.identity.identifier, "supervisor");
        assert_eq!(report.readings.len(), 2);
        assert!(report.readings.iter().all(|(p, _)| p.is_running()));
        assert_eq!(report.readings[0].1, Reading::OpenFds(17));
    }

    #[test]
    fn test_collect_cpu() {
        let report = collector(false).collect(MetricCategory::Cpu).unwrap();
        assert_eq!(report.readings[0].1, Reading::Cpu(CpuUsage::new(12.5, 40.0)));
    }

    #[test]
    fn test_failed_read_fails_whole_pass() {
        let err = collector(true)
            .collect(MetricCategory::FileDescriptors)
            .unwrap_err();
        assert!(err.to_string().contains("no longer exists"));
    }
}
