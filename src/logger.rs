use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, IsTerminal};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub enum VerbosityLevel {
    Summary = 0,  // Run milestones, warnings for skipped tools/artifacts (default)
    Detailed = 1, // Per-invocation and per-artifact detail
    Debug = 2,    // Everything including subprocess stderr excerpts
}

impl VerbosityLevel {
    pub fn from_verbose_count(count: u8) -> Self {
        match count {
            0 => VerbosityLevel::Summary,
            1 => VerbosityLevel::Detailed,
            2.. => VerbosityLevel::Debug,
        }
    }

    fn filter_directive(&self) -> &'static str {
        match self {
            VerbosityLevel::Summary => "typosentry=info",
            VerbosityLevel::Detailed => "typosentry=debug",
            VerbosityLevel::Debug => "typosentry=trace",
        }
    }
}

/// Install the global tracing subscriber writing to stderr. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbosity: VerbosityLevel) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Progress bar over tool invocations. Hidden unless stderr is a terminal and logging is quiet.
pub fn invocation_progress(total: u64, verbosity: VerbosityLevel) -> ProgressBar {
    if verbosity > VerbosityLevel::Summary || !io::stderr().is_terminal() {
        return ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::hidden());
    }

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    pb.set_message("Running permutation tools...");
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_from_count() {
        assert_eq!(VerbosityLevel::from_verbose_count(0), VerbosityLevel::Summary);
        assert_eq!(VerbosityLevel::from_verbose_count(1), VerbosityLevel::Detailed);
        assert_eq!(VerbosityLevel::from_verbose_count(7), VerbosityLevel::Debug);
    }

    #[test]
    fn test_progress_hidden_when_verbose() {
        let pb = invocation_progress(4, VerbosityLevel::Debug);
        assert!(pb.is_hidden());
        assert_eq!(pb.length(), Some(4));
    }
}
