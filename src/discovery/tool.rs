//! External permutation generators (urlcrazy, dnstwist) invoked as subprocesses.

use crate::config::{ConfigError, ToolConfig, DOMAIN_PLACEHOLDER, OUTPUT_PLACEHOLDER};
use crate::error::ToolError;
use std::ffi::OsString;
use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Supported generators. Declaration order is the normalization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ToolKind {
    UrlCrazy,
    DnsTwist,
}

impl ToolKind {
    pub const ALL: [ToolKind; 2] = [ToolKind::UrlCrazy, ToolKind::DnsTwist];

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::UrlCrazy => "urlcrazy",
            ToolKind::DnsTwist => "dnstwist",
        }
    }

    pub fn artifact_suffix(&self) -> &'static str {
        match self {
            ToolKind::UrlCrazy => ".uctmp",
            ToolKind::DnsTwist => ".dttmp",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct PermutationTool {
    kind: ToolKind,
    binary_path: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl PermutationTool {
    pub fn new(kind: ToolKind, binary_path: PathBuf, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            kind,
            binary_path,
            args,
            timeout,
        }
    }

    pub fn from_config(kind: ToolKind, config: &ToolConfig, default_timeout: Duration) -> Self {
        let timeout = config
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(default_timeout);
        Self::new(kind, PathBuf::from(&config.path), config.args.clone(), timeout)
    }

    pub fn with_binary(mut self, binary_path: PathBuf) -> Self {
        self.binary_path = binary_path;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_available(&self) -> bool {
        self.binary_path.is_file() || which::which(&self.binary_path).is_ok()
    }

    /// Startup check for an enabled tool.
    pub fn ensure_available(&self) -> Result<(), ConfigError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(ConfigError::ToolNotFound {
                tool: self.kind.to_string(),
                path: self.binary_path.clone(),
            })
        }
    }

    /// True when the tool writes its CSV to `{output}` itself; otherwise stdout is captured.
    pub fn writes_output_file(&self) -> bool {
        self.args.iter().any(|a| a.contains(OUTPUT_PLACEHOLDER))
    }

    /// Expand the argument template. Each element stays one argument; nothing goes through a shell.
    pub fn build_args(&self, domain: &str, output: &Path) -> Vec<OsString> {
        let output_text = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                if arg == OUTPUT_PLACEHOLDER {
                    output.as_os_str().to_os_string()
                } else {
                    expand_placeholders(arg, domain, &output_text).into()
                }
            })
            .collect()
    }

    /// Run the tool for one domain, leaving its CSV output in `artifact`.
    pub async fn invoke(&self, domain: &str, artifact: &Path) -> Result<(), ToolError> {
        debug!("Running {} for domain: {}", self.kind, domain);

        let mut cmd = Command::new(&self.binary_path);
        cmd.args(self.build_args(domain, artifact))
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if self.writes_output_file() {
            cmd.stdout(Stdio::null());
        } else {
            let file = OpenOptions::new()
                .write(true)
                .truncate(true)
                .open(artifact)
                .map_err(|source| ToolError::Artifact {
                    tool: self.kind,
                    path: artifact.to_path_buf(),
                    source,
                })?;
            cmd.stdout(Stdio::from(file));
        }

        let child = cmd.spawn().map_err(|source| ToolError::Spawn {
            tool: self.kind,
            domain: domain.to_string(),
            source,
        })?;

        // dropping the wait future on timeout drops the child, which kills it
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| ToolError::Spawn {
                tool: self.kind,
                domain: domain.to_string(),
                source,
            })?,
            Err(_) => {
                return Err(ToolError::Timeout {
                    tool: self.kind,
                    domain: domain.to_string(),
                    timeout: self.timeout,
                })
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if let Some(last) = stderr.lines().rev().find(|l| !l.trim().is_empty()) {
                debug!("{} stderr for {}: {}", self.kind, domain, last.trim());
            }
            return Err(ToolError::NonZeroExit {
                tool: self.kind,
                domain: domain.to_string(),
                status: output.status.to_string(),
            });
        }

        debug!("{} finished for {}", self.kind, domain);
        Ok(())
    }
}

/// Single left-to-right pass, so placeholder text inside a substituted value is never expanded.
fn expand_placeholders(template: &str, domain: &str, output: &str) -> String {
    let mut expanded = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        expanded.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix(DOMAIN_PLACEHOLDER) {
            expanded.push_str(domain);
            rest = after;
        } else if let Some(after) = tail.strip_prefix(OUTPUT_PLACEHOLDER) {
            expanded.push_str(output);
            rest = after;
        } else {
            expanded.push('{');
            rest = &tail[1..];
        }
    }
    expanded.push_str(rest);
    expanded
}
