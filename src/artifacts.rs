//! Run-scoped registry of temporary tool output files.
//!
//! Every artifact is registered the moment its file is created, before the tool runs, so
//! cleanup can find it whatever happens afterwards. Dropping the registry removes every file
//! still registered.

use crate::discovery::ToolKind;
use crate::error::CleanupError;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactState {
    /// Created, tool not finished yet
    Pending,
    /// Tool finished successfully; ready for normalization
    Produced,
    /// Tool failed; contents must be ignored
    Failed,
}

#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: PathBuf,
    pub tool: ToolKind,
    pub domain: String,
    /// Position of `domain` in the monitored list, used for deterministic ordering
    pub domain_index: usize,
    pub state: ArtifactState,
}

#[derive(Debug, Default)]
pub struct CleanupReport {
    pub removed: usize,
    pub failed: Vec<CleanupError>,
}

#[derive(Debug)]
pub struct ArtifactRegistry {
    dir: PathBuf,
    artifacts: Mutex<Vec<Artifact>>,
}

impl ArtifactRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            artifacts: Mutex::new(Vec::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Artifact>> {
        // a panic while holding the lock must not stop cleanup
        self.artifacts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create a uniquely named empty file `<domain>.XXXXXX<suffix>` and register it.
    pub fn create(&self, tool: ToolKind, domain: &str, domain_index: usize) -> io::Result<Artifact> {
        let prefix = format!("{}.", file_safe(domain));
        let file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(tool.artifact_suffix())
            .tempfile_in(&self.dir)?;
        let (_, path) = file.keep().map_err(|e| e.error)?;

        let artifact = Artifact {
            path,
            tool,
            domain: domain.to_string(),
            domain_index,
            state: ArtifactState::Pending,
        };
        debug!("Registered artifact {}", artifact.path.display());
        self.lock().push(artifact.clone());
        Ok(artifact)
    }

    pub fn mark(&self, path: &Path, state: ArtifactState) {
        if let Some(a) = self.lock().iter_mut().find(|a| a.path == path) {
            a.state = state;
        }
    }

    /// Successfully produced artifacts ordered by tool, then by monitored-domain position.
    pub fn produced(&self) -> Vec<Artifact> {
        let mut produced: Vec<Artifact> = self
            .lock()
            .iter()
            .filter(|a| a.state == ArtifactState::Produced)
            .cloned()
            .collect();
        produced.sort_by_key(|a| (a.tool, a.domain_index));
        produced
    }

    /// Delete every registered artifact. All items are attempted; failures are logged and
    /// reported, never returned as an error. Calling it again is a no-op.
    pub fn cleanup(&self) -> CleanupReport {
        let artifacts: Vec<Artifact> = self.lock().drain(..).collect();
        let mut report = CleanupReport::default();

        for artifact in artifacts {
            match std::fs::remove_file(&artifact.path) {
                Ok(()) => report.removed += 1,
                Err(source) => {
                    let err = CleanupError {
                        path: artifact.path,
                        source,
                    };
                    warn!("{}", err);
                    report.failed.push(err);
                }
            }
        }

        if report.removed > 0 || !report.failed.is_empty() {
            debug!(
                "Cleanup removed {} temporary files, {} failures",
                report.removed,
                report.failed.len()
            );
        }
        report
    }
}

impl Drop for ArtifactRegistry {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Keep domain strings from escaping the artifact directory when used in a file name.
fn file_safe(domain: &str) -> String {
    domain
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
