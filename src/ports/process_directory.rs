use crate::domain::SupervisedProcess;

/// Identity of the managing daemon
#[derive(Debug, Clone)]
pub struct DaemonIdentity {
    pub identifier: String,
    pub pid: i64,
}

/// Port for enumerating supervised processes
pub trait ProcessDirectory {
    /// Identify the daemon behind the endpoint
    fn identification(&self) -> Result<DaemonIdentity, Box<dyn std::error::Error + Send + Sync>>;

    /// List all managed processes, regardless of state
    fn list_processes(
        &self,
    ) -> Result<Vec<SupervisedProcess>, Box<dyn std::error::Error + Send + Sync>>;
}
