//! Settings management for typosentry
//!
//! Settings are read from `<config dir>/typosentry.toml` (or an explicit `--settings` file).
//! When neither exists the template shipped in `config/typosentry.toml` is used as-is, so the
//! template is the single place defaults live.

use serde::Deserialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Settings file name looked up inside the configuration directory
pub const SETTINGS_FILE: &str = "typosentry.toml";

/// Default settings content - this is the ONLY place defaults exist
pub const DEFAULT_CONFIG: &str = include_str!("../config/typosentry.toml");

/// Placeholder replaced with the monitored domain in tool argument templates
pub const DOMAIN_PLACEHOLDER: &str = "{domain}";

/// Placeholder replaced with the temporary artifact path in tool argument templates
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Fatal configuration problems. Nothing past path resolution runs when one of these occurs.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration directory {0} does not exist or is not a directory")]
    ConfigDirMissing(PathBuf),

    #[error("Output directory {0} does not exist or is not a directory")]
    OutputDirMissing(PathBuf),

    #[error("Unable to write to output directory {path}: {source}")]
    OutputDirNotWritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Monitored domain list not found at {0}")]
    MonitoredListMissing(PathBuf),

    #[error("Known domain list not found at {0}")]
    KnownListMissing(PathBuf),

    #[error("Results path {0} exists but is not a regular file")]
    ResultsPathNotFile(PathBuf),

    #[error("Failed to read monitored domain list {path}: {source}")]
    MonitoredDomains {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read known domain list {path}: {reason}")]
    KnownDomains { path: PathBuf, reason: String },

    #[error("{tool} is enabled but was not found at {path}")]
    ToolNotFound { tool: String, path: PathBuf },

    #[error("Settings file not found at {0}")]
    FileNotFound(PathBuf),

    #[error("Settings file already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("Failed to read settings file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse settings file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Settings field '{field}' cannot be empty")]
    EmptyRequired { field: String },

    #[error("Settings field '{field}' is invalid: {reason}")]
    Invalid { field: String, reason: String },
}

/// Root settings structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub inputs: InputsConfig,
    pub run: RunConfig,
    pub tools: ToolsConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Names of the input lists inside the configuration directory
#[derive(Debug, Clone, Deserialize)]
pub struct InputsConfig {
    pub monitored_file: String,
    pub known_file: String,
}

/// Run-wide execution settings
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Concurrent tool invocations
    pub parallel_jobs: usize,
    /// Default per-invocation timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolsConfig {
    pub urlcrazy: ToolConfig,
    pub dnstwist: ToolConfig,
}

/// One external permutation generator
#[derive(Debug, Clone, Deserialize)]
pub struct ToolConfig {
    /// Binary path, or a bare name resolved through PATH
    pub path: String,
    /// Argument vector template with `{domain}` and optional `{output}` placeholders
    pub args: Vec<String>,
    /// Overrides `run.timeout_secs` for this tool
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub email: Option<EmailConfig>,
}

/// SMTP submission settings. The password is read from the environment, never from the file.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub from_address: String,
    pub to_addresses: Vec<String>,
    pub username: String,
    #[serde(default = "default_password_env")]
    pub password_env: String,
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_password_env() -> String {
    "TYPOSENTRY_SMTP_PASSWORD".to_string()
}

fn default_subject_prefix() -> String {
    "[typosentry]".to_string()
}

impl AppConfig {
    /// Parse the built-in template
    pub fn from_defaults() -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(DEFAULT_CONFIG)?;
        config.validate()?;
        Ok(config)
    }

    /// Load settings from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve settings for a run: an explicit file must exist, otherwise the config
    /// directory's `typosentry.toml` is used when present, otherwise the defaults.
    pub fn load_for_run(explicit: Option<&Path>, config_dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }

        let candidate = config_dir.join(SETTINGS_FILE);
        if candidate.is_file() {
            tracing::debug!("Loading settings from {}", candidate.display());
            Self::load_from_path(&candidate)
        } else {
            tracing::debug!("No settings file in {}, using built-in defaults", config_dir.display());
            Self::from_defaults()
        }
    }

    /// Validate all settings values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inputs.monitored_file.trim().is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "inputs.monitored_file".to_string(),
            });
        }
        if self.inputs.known_file.trim().is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "inputs.known_file".to_string(),
            });
        }
        if self.run.parallel_jobs == 0 {
            return Err(ConfigError::Invalid {
                field: "run.parallel_jobs".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.run.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "run.timeout_secs".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Self::validate_tool("tools.urlcrazy", &self.tools.urlcrazy)?;
        Self::validate_tool("tools.dnstwist", &self.tools.dnstwist)?;

        if let Some(email) = &self.notify.email {
            if email.smtp_server.is_empty() {
                return Err(ConfigError::EmptyRequired {
                    field: "notify.email.smtp_server".to_string(),
                });
            }
            if email.to_addresses.is_empty() {
                return Err(ConfigError::EmptyRequired {
                    field: "notify.email.to_addresses".to_string(),
                });
            }
        }

        Ok(())
    }

    fn validate_tool(name: &str, tool: &ToolConfig) -> Result<(), ConfigError> {
        if tool.path.trim().is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: format!("{}.path", name),
            });
        }
        if !tool.args.iter().any(|a| a.contains(DOMAIN_PLACEHOLDER)) {
            return Err(ConfigError::Invalid {
                field: format!("{}.args", name),
                reason: format!("must contain the {} placeholder", DOMAIN_PLACEHOLDER),
            });
        }
        if tool.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid {
                field: format!("{}.timeout_secs", name),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Write the default settings file into `config_dir`. Never overwrites.
    pub fn create_default_config(config_dir: &Path) -> Result<PathBuf, ConfigError> {
        let path = config_dir.join(SETTINGS_FILE);
        if path.exists() {
            return Err(ConfigError::AlreadyExists(path));
        }

        fs::create_dir_all(config_dir)?;
        let mut file = fs::File::create(&path)?;
        file.write_all(DEFAULT_CONFIG.as_bytes())?;

        Ok(path)
    }
}
