use std::io::{self, BufWriter, Write};

use crate::application::Report;
use crate::domain::{MetricCategory, SupervisedProcess};

use super::graph::{field_name, graphs_for};

/// Emit the `config` block for one category. Two-series categories
/// emit one multigraph section per graph.
pub fn write_config<W: Write>(
    handle: &mut BufWriter<W>,
    category: MetricCategory,
    processes: &[SupervisedProcess],
) -> io::Result<()> {
    let graphs = graphs_for(category);
    let multigraph = graphs.len() > 1;

    for graph in graphs {
        if multigraph {
            writeln!(handle, "multigraph {}", graph.name)?;
        }
        writeln!(handle, "graph_title {}", graph.title)?;
        if let Some(args) = graph.args {
            writeln!(handle, "graph_args {args}")?;
        }
        if let Some(vlabel) = graph.vlabel {
            writeln!(handle, "graph_vlabel {vlabel}")?;
        }
        writeln!(handle, "graph_category supervisord")?;
        writeln!(handle, "graph_info {}", graph.info)?;

        for process in processes {
            let field = field_name(process);
            writeln!(handle, "{field}.label {}", process.label())?;
            writeln!(handle, "{field}.info {}", graph.info)?;
            writeln!(handle, "{field}.draw LINE2")?;
            writeln!(handle, "{field}.type GAUGE")?;
            if graph.min_zero {
                writeln!(handle, "{field}.min 0")?;
            }
        }
    }

    Ok(())
}

/// Emit the fetch block for one category: one value line per process
/// per graph.
pub fn write_values<W: Write>(
    handle: &mut BufWriter<W>,
    category: MetricCategory,
    report: &Report,
) -> io::Result<()> {
    let graphs = graphs_for(category);
    let multigraph = graphs.len() > 1;

    for (series, graph) in graphs.iter().enumerate() {
        if multigraph {
            writeln!(handle, "multigraph {}", graph.name)?;
        }
        for (process, reading) in &report.readings {
            writeln!(
                handle,
                "{}.value {}",
                field_name(process),
                reading.series_value(series)
            )?;
        }
    }

    Ok(())
}

/// The url cannot be guessed, so the plugin never auto-configures
pub fn write_autoconf<W: Write>(handle: &mut BufWriter<W>) -> io::Result<()> {
    writeln!(handle, "no")
}

/// Modes munin-node-configure may link the wildcard plugin under
pub fn write_suggest<W: Write>(handle: &mut BufWriter<W>) -> io::Result<()> {
    for category in MetricCategory::ALL {
        writeln!(handle, "{}", category.mode())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CpuUsage, CtxSwitches, Reading, SupervisorState};
    use crate::ports::DaemonIdentity;

    fn processes() -> Vec<SupervisedProcess> {
        vec![
            SupervisedProcess::new("web".into(), "web".into(), 100, SupervisorState::Running),
            SupervisedProcess::new(
                "worker_00".into(),
                "workers".into(),
                101,
                SupervisorState::Running,
            ),
        ]
    }

    fn report(readings: Vec<Reading>) -> Report {
        Report {
            identity: DaemonIdentity {
                identifier: "supervisor".into(),
                pid: 1,
            },
            readings: processes().into_iter().zip(readings).collect(),
        }
    }

    fn render<F>(write: F) -> String
    where
        F: FnOnce(&mut BufWriter<Vec<u8>>) -> io::Result<()>,
    {
        let mut handle = BufWriter::new(Vec::new());
        write(&mut handle).unwrap();
        String::from_utf8(handle.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_config_single_graph() {
        let out = render(|h| write_config(h, MetricCategory::FileDescriptors, &processes()));
        assert!(out.contains("graph_title Supervisord - File descriptors used\n"));
        assert!(out.contains("graph_args --lower-limit 0\n"));
        assert!(out.contains("graph_category supervisord\n"));
        assert!(out.contains("web.label web.100\n"));
        assert!(out.contains("worker_00.label workers:worker_00\n"));
        assert!(out.contains("web.min 0\n"));
        assert!(!out.contains("multigraph"));
    }

    #[test]
    fn test_config_multigraph_cpu() {
        let out = render(|h| write_config(h, MetricCategory::Cpu, &processes()));
        assert!(out.contains("multigraph supervisord_processes_cpu_percent_avg\n"));
        assert!(out.contains("multigraph supervisord_processes_cpu_percent_max\n"));
        assert!(out.contains("graph_vlabel Avg CPU percentage\n"));
        assert!(out.contains("graph_vlabel Max CPU percentage\n"));
        // Field definitions repeat under each sub-graph
        assert_eq!(out.matches("web.label web.100\n").count(), 2);
    }

    #[test]
    fn test_values_single_graph_one_line_per_process() {
        let out = render(|h| {
            write_values(
                h,
                MetricCategory::FileDescriptors,
                &report(vec![Reading::OpenFds(17), Reading::OpenFds(4)]),
            )
        });
        assert_eq!(out, "web.value 17\nworker_00.value 4\n");
    }

    #[test]
    fn test_values_memory_in_mib() {
        let out = render(|h| {
            write_values(
                h,
                MetricCategory::Memory,
                &report(vec![
                    Reading::ResidentMemory(64 * 1024 * 1024),
                    Reading::ResidentMemory(3 * 1024 * 1024 / 2),
                ]),
            )
        });
        assert_eq!(out, "web.value 64\nworker_00.value 1.5\n");
    }

    #[test]
    fn test_values_multigraph_ctx_switches() {
        let out = render(|h| {
            write_values(
                h,
                MetricCategory::ContextSwitches,
                &report(vec![
                    Reading::ContextSwitches(CtxSwitches::new(120, 7)),
                    Reading::ContextSwitches(CtxSwitches::new(30, 1)),
                ]),
            )
        });
        assert_eq!(
            out,
            "multigraph supervisord_processes_num_context_switches_voluntary\n\
             web.value 120\n\
             worker_00.value 30\n\
             multigraph supervisord_processes_num_context_switches_involuntary\n\
             web.value 7\n\
             worker_00.value 1\n"
        );
    }

    #[test]
    fn test_values_cpu_avg_then_max() {
        let out = render(|h| {
            write_values(
                h,
                MetricCategory::Cpu,
                &report(vec![
                    Reading::Cpu(CpuUsage::new(12.5, 40.0)),
                    Reading::Cpu(CpuUsage::new(0.0, 0.0)),
                ]),
            )
        });
        assert!(out.contains("multigraph supervisord_processes_cpu_percent_avg\nweb.value 12.5\n"));
        assert!(out.contains("multigraph supervisord_processes_cpu_percent_max\nweb.value 40\n"));
    }

    #[test]
    fn test_empty_report_emits_no_value_lines() {
        let report = Report {
            identity: DaemonIdentity {
                identifier: "supervisor".into(),
                pid: 1,
            },
            readings: Vec::new(),
        };
        let out = render(|h| write_values(h, MetricCategory::Threads, &report));
        assert!(out.is_empty());
    }

    #[test]
    fn test_autoconf() {
        let out = render(|h| write_autoconf(h));
        assert_eq!(out, "no\n");
    }

    #[test]
    fn test_suggest_lists_every_mode() {
        let out = render(|h| write_suggest(h));
        assert_eq!(out, "cpu\nmemory\nfds\nthreads\nconnections\nctxswitches\n");
    }
}
