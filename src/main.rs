mod adapters;
mod application;
mod config;
mod domain;
mod interface;
mod ports;

use std::env;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process::ExitCode;

use tracing::debug;

use adapters::{ProcfsConfig, ProcfsStatsSource, SupervisorClient};
use application::MetricCollector;
use config::Config;
use domain::{MetricCategory, SupervisedProcess};
use interface::munin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Config,
    Autoconf,
    Suggest,
    Fetch,
}

fn main() -> ExitCode {
    let config = Config::from_env();

    // stdout belongs to the plugin protocol; diagnostics go to stderr
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("supmon={}", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("supmon: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args: Vec<String> = env::args().collect();
    let (category, verb) = parse_invocation(&args)?;
    debug!(?category, ?verb, url = %config.url, "plugin invoked");

    let stdout = io::stdout();
    let mut handle = BufWriter::new(stdout.lock());

    match verb {
        Verb::Autoconf => munin::write_autoconf(&mut handle)?,
        Verb::Suggest => munin::write_suggest(&mut handle)?,
        Verb::Config => {
            let category = require_category(category)?;
            let collector = build_collector(config)?;
            if dirtyconfig() {
                let report = collector.collect(category)?;
                let processes: Vec<SupervisedProcess> =
                    report.readings.iter().map(|(p, _)| p.clone()).collect();
                munin::write_config(&mut handle, category, &processes)?;
                munin::write_values(&mut handle, category, &report)?;
            } else {
                let processes = collector.running_processes()?;
                munin::write_config(&mut handle, category, &processes)?;
            }
        }
        Verb::Fetch => {
            let category = require_category(category)?;
            let collector = build_collector(config)?;
            let report = collector.collect(category)?;
            munin::write_values(&mut handle, category, &report)?;
        }
    }

    handle.flush()?;
    Ok(())
}

fn build_collector(
    config: &Config,
) -> Result<MetricCollector, Box<dyn std::error::Error + Send + Sync>> {
    let client = SupervisorClient::from_url(&config.url, config.rpc_timeout)?;
    let stats = ProcfsStatsSource::new(ProcfsConfig::new(config.proc_path.clone()));
    Ok(MetricCollector::new(
        Box::new(client),
        Box::new(stats),
        config.cpu_sampling(),
    ))
}

/// Munin selects the metric family through the plugin link name
/// (`supervisord_cpu` ...); an explicit mode word works for running the
/// binary directly. The munin verb is the remaining argument.
fn parse_invocation(
    args: &[String],
) -> Result<(Option<MetricCategory>, Verb), Box<dyn std::error::Error + Send + Sync>> {
    let program = args
        .first()
        .map(|arg| {
            Path::new(arg)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
        .unwrap_or_default();

    let mut category = MetricCategory::from_program_name(&program);
    let mut verb = Verb::Fetch;

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "config" => verb = Verb::Config,
            "autoconf" => verb = Verb::Autoconf,
            "suggest" => verb = Verb::Suggest,
            "fetch" => verb = Verb::Fetch,
            other => match MetricCategory::from_mode(other) {
                Some(mode) => category = Some(mode),
                None => return Err(format!("unknown argument {other:?}").into()),
            },
        }
    }

    Ok((category, verb))
}

fn require_category(
    category: Option<MetricCategory>,
) -> Result<MetricCategory, Box<dyn std::error::Error + Send + Sync>> {
    category.ok_or_else(|| {
        let modes: Vec<_> = MetricCategory::ALL.iter().map(|c| c.mode()).collect();
        format!(
            "no metric category selected: link the plugin as supervisord_<mode> \
             or pass one of: {}",
            modes.join(", ")
        )
        .into()
    })
}

fn dirtyconfig() -> bool {
    env::var("MUNIN_CAP_DIRTYCONFIG")
        .map(|v| v == "1")
        .unwrap_or(false)
}
