use crate::domain::{MetricCategory, SupervisedProcess};

/// Static definition of one Munin graph
#[derive(Debug, Clone, Copy)]
pub struct GraphSpec {
    /// Multigraph name, kept from the original plugin family so
    /// existing RRD files keep their identity
    pub name: &'static str,
    pub title: &'static str,
    pub vlabel: Option<&'static str>,
    pub info: &'static str,
    pub args: Option<&'static str>,
    pub min_zero: bool,
}

const CPU: [GraphSpec; 2] = [
    GraphSpec {
        name: "supervisord_processes_cpu_percent_avg",
        title: "Supervisord - CPU utilization as a percentage (avg)",
        vlabel: Some("Avg CPU percentage"),
        info: "CPU utilization as a percentage (avg)",
        args: None,
        min_zero: false,
    },
    GraphSpec {
        name: "supervisord_processes_cpu_percent_max",
        title: "Supervisord - CPU utilization as a percentage (max)",
        vlabel: Some("Max CPU percentage"),
        info: "CPU utilization as a percentage (max)",
        args: None,
        min_zero: false,
    },
];

const MEMORY: [GraphSpec; 1] = [GraphSpec {
    name: "supervisord_processes_memory_usage",
    title: "Supervisord - Memory usage",
    vlabel: Some("Memory usage (MiB)"),
    info: "Memory usage",
    args: None,
    min_zero: false,
}];

const FDS: [GraphSpec; 1] = [GraphSpec {
    name: "supervisord_processes_num_fds",
    title: "Supervisord - File descriptors used",
    vlabel: None,
    info: "File descriptors used",
    args: Some("--lower-limit 0"),
    min_zero: true,
}];

const THREADS: [GraphSpec; 1] = [GraphSpec {
    name: "supervisord_processes_num_threads",
    title: "Supervisord - Threads currently used",
    vlabel: None,
    info: "Threads currently used",
    args: Some("--lower-limit 0"),
    min_zero: true,
}];

const CONNECTIONS: [GraphSpec; 1] = [GraphSpec {
    name: "supervisord_processes_num_connections",
    title: "Supervisord - Socket connections opened",
    vlabel: None,
    info: "Socket connections opened",
    args: Some("--lower-limit 0"),
    min_zero: true,
}];

const CTX_SWITCHES: [GraphSpec; 2] = [
    GraphSpec {
        name: "supervisord_processes_num_context_switches_voluntary",
        title: "Supervisord - Context switches (voluntary)",
        vlabel: Some("Voluntary context switches"),
        info: "Context switches (voluntary)",
        args: Some("--lower-limit 0"),
        min_zero: true,
    },
    GraphSpec {
        name: "supervisord_processes_num_context_switches_involuntary",
        title: "Supervisord - Context switches (involuntary)",
        vlabel: Some("Involuntary context switches"),
        info: "Context switches (involuntary)",
        args: Some("--lower-limit 0"),
        min_zero: true,
    },
];

/// The graphs a category draws; two-series categories draw two
pub fn graphs_for(category: MetricCategory) -> &'static [GraphSpec] {
    match category {
        MetricCategory::Cpu => &CPU,
        MetricCategory::Memory => &MEMORY,
        MetricCategory::FileDescriptors => &FDS,
        MetricCategory::Threads => &THREADS,
        MetricCategory::Connections => &CONNECTIONS,
        MetricCategory::ContextSwitches => &CTX_SWITCHES,
    }
}

/// Munin field names must match [A-Za-z_][A-Za-z0-9_]*
pub fn field_name(process: &SupervisedProcess) -> String {
    let mut out = String::with_capacity(process.name.len());
    for (i, c) in process.name.chars().enumerate() {
        let valid = if i == 0 {
            c.is_ascii_alphabetic() || c == '_'
        } else {
            c.is_ascii_alphanumeric() || c == '_'
        };
        out.push(if valid { c } else { '_' });
    }
    if out.is_empty() {
        out.push('_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SupervisorState;

    fn process(name: &str) -> SupervisedProcess {
        SupervisedProcess::new(name.into(), name.into(), 1, SupervisorState::Running)
    }

    #[test]
    fn test_two_series_categories() {
        assert_eq!(graphs_for(MetricCategory::Cpu).len(), 2);
        assert_eq!(graphs_for(MetricCategory::ContextSwitches).len(), 2);
        assert_eq!(graphs_for(MetricCategory::Memory).len(), 1);
    }

    #[test]
    fn test_field_name_sanitization() {
        assert_eq!(field_name(&process("web")), "web");
        assert_eq!(field_name(&process("my-app.1")), "my_app_1");
        assert_eq!(field_name(&process("9lives")), "_lives");
        assert_eq!(field_name(&process("")), "_");
    }
}
