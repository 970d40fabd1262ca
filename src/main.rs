use anyhow::{anyhow, Result};
use clap::{CommandFactory, Parser};
use std::time::Duration;
use tracing::{info, warn};

use typosentry::cli::Cli;
use typosentry::config::AppConfig;
use typosentry::discovery::{Invoker, PermutationTool, ToolKind};
use typosentry::logger::{self, VerbosityLevel};
use typosentry::notify::{EmailNotifier, Notifier};
use typosentry::paths::RunPaths;
use typosentry::pipeline::{print_run_summary, Pipeline, RunInputs};

/// Exit code for configuration errors and failed runs
const EXIT_FAILURE: i32 = 1;
/// Exit code when the report was written but the notification could not be sent
const EXIT_NOTIFY_FAILED: i32 = 2;

/// Termination signal that cut a run short. Exit codes follow the 128 + signal convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shutdown {
    Interrupt,
    Terminate,
    Hangup,
}

impl Shutdown {
    fn exit_code(self) -> i32 {
        match self {
            Shutdown::Interrupt => 130,
            Shutdown::Terminate => 143,
            Shutdown::Hangup => 129,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Shutdown::Interrupt => "Interrupt",
            Shutdown::Terminate => "Termination signal",
            Shutdown::Hangup => "Hangup",
        }
    }
}

#[tokio::main]
async fn main() {
    if std::env::args_os().len() <= 1 {
        let _ = Cli::command().print_help();
        println!();
        std::process::exit(EXIT_FAILURE);
    }

    let cli = Cli::parse();
    let verbosity = VerbosityLevel::from_verbose_count(cli.verbose);
    if let Err(e) = logger::init_tracing(verbosity) {
        eprintln!("⚠️  Warning: Failed to initialise logging: {}", e);
    }

    let code = run(cli, verbosity).await;
    std::process::exit(code);
}

async fn run(cli: Cli, verbosity: VerbosityLevel) -> i32 {
    if let Err(e) = cli.validate() {
        eprintln!("❌ Invalid arguments: {}", e);
        return EXIT_FAILURE;
    }

    if cli.init {
        return match AppConfig::create_default_config(&cli.config_dir()) {
            Ok(path) => {
                println!("✅ Created default settings file at: {}", path.display());
                println!("   Edit this file to customize tool paths, then run typosentry again.");
                0
            }
            Err(e) => {
                eprintln!("❌ Failed to create settings file: {}", e);
                EXIT_FAILURE
            }
        };
    }

    let (pipeline, notifier) = match prepare(&cli, verbosity) {
        Ok(prepared) => prepared,
        Err(e) => {
            eprintln!("❌ Configuration error: {}", e);
            eprintln!("   Please verify configuration. Exiting...");
            return EXIT_FAILURE;
        }
    };

    // Dropping the pipeline future kills running tools and removes temporary files.
    // Signal listeners are polled first so they are registered before any tool starts.
    let summary = tokio::select! {
        biased;
        signal = shutdown_signal() => {
            eprintln!("\n⚠️  {} received. Temporary files removed, exiting...", signal.name());
            return signal.exit_code();
        }
        result = pipeline.run() => match result {
            Ok(summary) => summary,
            Err(e) => {
                eprintln!("❌ Run failed: {:#}", e);
                return EXIT_FAILURE;
            }
        },
    };

    print_run_summary(&summary);

    if let Some(notifier) = notifier {
        let name = notifier.name().to_string();
        let to_send = summary.clone();
        let sent = tokio::task::spawn_blocking(move || notifier.notify(&to_send))
            .await
            .map_err(|e| anyhow!("notification task failed: {}", e))
            .and_then(|r| r);
        if let Err(e) = sent {
            eprintln!("❌ Failed to send {} notification: {:#}", name, e);
            return EXIT_NOTIFY_FAILED;
        }
    }

    0
}

/// Resolves once Ctrl-C is received. Never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}. Interrupts will not clean up gracefully.", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn unix_signal(kind: tokio::signal::unix::SignalKind, name: &str) {
    match tokio::signal::unix::signal(kind) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            warn!("Failed to listen for {}: {}. It will not clean up gracefully.", name, e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> Shutdown {
    use tokio::signal::unix::SignalKind;

    tokio::select! {
        _ = ctrl_c() => Shutdown::Interrupt,
        _ = unix_signal(SignalKind::terminate(), "SIGTERM") => Shutdown::Terminate,
        _ = unix_signal(SignalKind::hangup(), "SIGHUP") => Shutdown::Hangup,
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Shutdown {
    ctrl_c().await;
    Shutdown::Interrupt
}

/// Everything that can fail before work starts: settings, paths, domain lists, tool availability, notifier.
fn prepare(cli: &Cli, verbosity: VerbosityLevel) -> Result<(Pipeline, Option<Box<dyn Notifier>>)> {
    let config_dir = cli.config_dir();
    let config = AppConfig::load_for_run(cli.settings.as_deref(), &config_dir)?;
    let paths = RunPaths::resolve(&config_dir, &cli.output_dir(), &cli.output, &config.inputs)?;
    let inputs = RunInputs::load(&paths)?;

    let default_timeout = Duration::from_secs(config.run.timeout_secs);
    let mut tools = Vec::new();
    for kind in ToolKind::ALL {
        let (enabled, tool_config, path_override) = match kind {
            ToolKind::UrlCrazy => (cli.urlcrazy, &config.tools.urlcrazy, &cli.urlcrazy_path),
            ToolKind::DnsTwist => (cli.dnstwist, &config.tools.dnstwist, &cli.dnstwist_path),
        };
        if !enabled {
            continue;
        }

        let mut tool = PermutationTool::from_config(kind, tool_config, default_timeout);
        if let Some(path) = path_override {
            tool = tool.with_binary(path.clone());
        }
        if let Some(secs) = cli.timeout {
            tool = tool.with_timeout(Duration::from_secs(secs));
        }
        tool.ensure_available()?;
        info!("{} enabled at {}", kind, tool.binary_path().display());
        tools.push(tool);
    }
    if !cli.any_tool_enabled() {
        warn!("No discovery tool enabled (use --urlcrazy and/or --dnstwist); the report will contain only the header");
    }

    let notifier: Option<Box<dyn Notifier>> = if cli.notify {
        let email = config
            .notify
            .email
            .clone()
            .ok_or_else(|| anyhow!("--notify requires a [notify.email] section in the settings file"))?;
        Some(Box::new(EmailNotifier::from_env(email)?))
    } else {
        None
    };

    let parallel_jobs = cli.parallel_jobs.unwrap_or(config.run.parallel_jobs);
    let total = (tools.len() * inputs.monitored.len()) as u64;
    let invoker = Invoker::new(tools, parallel_jobs)
        .with_progress(logger::invocation_progress(total, verbosity));

    Ok((Pipeline::new(paths, inputs, invoker), notifier))
}
