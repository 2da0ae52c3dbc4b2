/// Supervisord process state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Stopped,
    Starting,
    Running,
    Backoff,
    Stopping,
    Exited,
    Fatal,
    Unknown,
}

impl SupervisorState {
    /// Decode the numeric state code from getAllProcessInfo, falling
    /// back to the state name for codes we do not recognize.
    pub fn from_code(code: i64, name: &str) -> Self {
        match code {
            0 => Self::Stopped,
            10 => Self::Starting,
            20 => Self::Running,
            30 => Self::Backoff,
            40 => Self::Stopping,
            100 => Self::Exited,
            200 => Self::Fatal,
            _ => Self::from_name(name),
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "STOPPED" => Self::Stopped,
            "STARTING" => Self::Starting,
            "RUNNING" => Self::Running,
            "BACKOFF" => Self::Backoff,
            "STOPPING" => Self::Stopping,
            "EXITED" => Self::Exited,
            "FATAL" => Self::Fatal,
            _ => Self::Unknown,
        }
    }
}

/// One process managed by Supervisord
#[derive(Debug, Clone)]
pub struct SupervisedProcess {
    pub name: String,
    pub group: String,
    pub pid: u32,
    pub state: SupervisorState,
}

impl SupervisedProcess {
    pub fn new(name: String, group: String, pid: u32, state: SupervisorState) -> Self {
        Self {
            name,
            group,
            pid,
            state,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == SupervisorState::Running
    }

    /// Graph label: a process that is its own group shows its pid, one
    /// inside a named group shows the group prefix.
    pub fn label(&self) -> String {
        if self.group == self.name {
            format!("{}.{}", self.name, self.pid)
        } else {
            format!("{}:{}", self.group, self.name)
        }
    }
}
