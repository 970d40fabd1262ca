//! Fans every (monitored domain, tool) pair out to the external generators.

use super::PermutationTool;
use crate::artifacts::{ArtifactRegistry, ArtifactState};
use crate::error::ToolError;
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvocationStats {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

pub struct Invoker {
    tools: Vec<PermutationTool>,
    parallel_jobs: usize,
    progress: ProgressBar,
}

impl Invoker {
    pub fn new(mut tools: Vec<PermutationTool>, parallel_jobs: usize) -> Self {
        tools.sort_by_key(|t| t.kind());
        Self {
            tools,
            parallel_jobs: parallel_jobs.max(1),
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Run every pair. Each invocation writes to its own artifact, so pairs are independent;
    /// a failure only removes that pair's contribution.
    pub async fn run_all(&self, domains: &[String], registry: &ArtifactRegistry) -> InvocationStats {
        let pairs: Vec<(usize, &str, &PermutationTool)> = domains
            .iter()
            .enumerate()
            .flat_map(|(idx, domain)| self.tools.iter().map(move |tool| (idx, domain.as_str(), tool)))
            .collect();

        info!(
            "Invoking {} tool(s) for {} domain(s) ({} parallel)",
            self.tools.len(),
            domains.len(),
            self.parallel_jobs
        );

        let mut stats = InvocationStats {
            attempted: pairs.len(),
            ..Default::default()
        };

        let outcomes: Vec<bool> = stream::iter(pairs)
            .map(|(idx, domain, tool)| async move {
                let ok = invoke_one(tool, domain, idx, registry).await;
                self.progress.inc(1);
                ok
            })
            .buffer_unordered(self.parallel_jobs)
            .collect()
            .await;
        self.progress.finish_and_clear();

        stats.succeeded = outcomes.iter().filter(|ok| **ok).count();
        stats.failed = stats.attempted - stats.succeeded;
        info!(
            "Tool invocations complete: {} succeeded, {} failed",
            stats.succeeded, stats.failed
        );
        stats
    }
}

async fn invoke_one(tool: &PermutationTool, domain: &str, idx: usize, registry: &ArtifactRegistry) -> bool {
    let artifact = match registry.create(tool.kind(), domain, idx) {
        Ok(a) => a,
        Err(source) => {
            let err = ToolError::Artifact {
                tool: tool.kind(),
                path: registry.dir().to_path_buf(),
                source,
            };
            warn!("Skipping {} for {}: {}", tool.kind(), domain, err);
            return false;
        }
    };

    match tool.invoke(domain, &artifact.path).await {
        Ok(()) => {
            registry.mark(&artifact.path, ArtifactState::Produced);
            debug!("{} output for {} at {}", tool.kind(), domain, artifact.path.display());
            true
        }
        Err(err) => {
            registry.mark(&artifact.path, ArtifactState::Failed);
            warn!("Skipping {} for {}: {}", tool.kind(), domain, err);
            false
        }
    }
}
