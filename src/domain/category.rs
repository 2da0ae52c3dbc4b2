use std::fmt;

/// Metric family served by one plugin entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricCategory {
    Cpu,
    Memory,
    FileDescriptors,
    Threads,
    Connections,
    ContextSwitches,
}

impl MetricCategory {
    pub const ALL: [MetricCategory; 6] = [
        Self::Cpu,
        Self::Memory,
        Self::FileDescriptors,
        Self::Threads,
        Self::Connections,
        Self::ContextSwitches,
    ];

    /// Mode word used on the command line and as the plugin file name
    /// suffix (`supervisord_cpu`, `supervisord_fds`, ...).
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Memory => "memory",
            Self::FileDescriptors => "fds",
            Self::Threads => "threads",
            Self::Connections => "connections",
            Self::ContextSwitches => "ctxswitches",
        }
    }

    pub fn from_mode(mode: &str) -> Option<Self> {
        match mode {
            "cpu" => Some(Self::Cpu),
            "memory" => Some(Self::Memory),
            "fds" => Some(Self::FileDescriptors),
            "threads" => Some(Self::Threads),
            "connections" => Some(Self::Connections),
            "ctxswitches" | "context-switches" | "context_switches" => {
                Some(Self::ContextSwitches)
            }
            _ => None,
        }
    }

    /// Resolve the category from the invoked program name. Munin runs
    /// plugins through symlinks named `supervisord_<mode>`.
    pub fn from_program_name(program: &str) -> Option<Self> {
        program
            .strip_prefix("supervisord_")
            .and_then(Self::from_mode)
    }
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mode())
    }
}
