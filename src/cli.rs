use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "typosentry")]
#[command(about = "Detect new typosquatted domain registrations using the output of urlcrazy and/or dnstwist")]
#[command(version)]
pub struct Cli {
    /// Directory containing the monitored and known domain lists (defaults to current directory)
    #[arg(short, long, value_name = "DIR")]
    pub config: Option<PathBuf>,

    /// Report filename, written inside --directory
    #[arg(short, long, default_value = "results.csv")]
    pub output: String,

    /// Directory for temporary files and the report (defaults to current directory)
    #[arg(short, long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Use urlcrazy for domain discovery
    #[arg(long)]
    pub urlcrazy: bool,

    /// Use dnstwist for domain discovery
    #[arg(long)]
    pub dnstwist: bool,

    /// Path to the urlcrazy binary (overrides settings)
    #[arg(long, value_name = "PATH")]
    pub urlcrazy_path: Option<PathBuf>,

    /// Path to the dnstwist binary (overrides settings)
    #[arg(long, value_name = "PATH")]
    pub dnstwist_path: Option<PathBuf>,

    /// Per-invocation timeout for external tools in seconds (overrides settings)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Number of tool invocations to run in parallel (overrides settings)
    #[arg(short = 'j', long, value_name = "N")]
    pub parallel_jobs: Option<usize>,

    /// Settings file (defaults to <config dir>/typosentry.toml, then built-in defaults)
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Create default settings file in the config directory and exit
    #[arg(long)]
    pub init: bool,

    /// Send the report through the notifier configured in settings
    #[arg(long)]
    pub notify: bool,

    /// Verbose logging (use -v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn config_dir(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn any_tool_enabled(&self) -> bool {
        self.urlcrazy || self.dnstwist
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.parallel_jobs == Some(0) {
            return Err("--parallel-jobs must be at least 1".to_string());
        }
        if self.timeout == Some(0) {
            return Err("--timeout must be at least 1 second".to_string());
        }
        if self.output.trim().is_empty() {
            return Err("--output cannot be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["typosentry", "--urlcrazy"]).unwrap();
        assert_eq!(cli.output, "results.csv");
        assert_eq!(cli.config_dir(), PathBuf::from("."));
        assert_eq!(cli.output_dir(), PathBuf::from("."));
        assert!(cli.urlcrazy);
        assert!(!cli.dnstwist);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::try_parse_from([
            "typosentry", "-c", "/etc/typosentry", "-o", "new.csv", "-d", "/var/tmp", "-vv", "--dnstwist",
        ])
        .unwrap();
        assert_eq!(cli.config_dir(), PathBuf::from("/etc/typosentry"));
        assert_eq!(cli.output, "new.csv");
        assert_eq!(cli.output_dir(), PathBuf::from("/var/tmp"));
        assert_eq!(cli.verbose, 2);
        assert!(cli.any_tool_enabled());
    }

    #[test]
    fn test_validate_rejects_zero_jobs() {
        let cli = Cli::try_parse_from(["typosentry", "--dnstwist", "-j", "0"]).unwrap();
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let cli = Cli::try_parse_from(["typosentry", "--dnstwist", "--timeout", "0"]).unwrap();
        assert!(cli.validate().is_err());
    }
}
