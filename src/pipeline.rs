//! Discovery → normalization → diff → report, with artifact cleanup on every path.

use crate::artifacts::ArtifactRegistry;
use crate::diff::diff;
use crate::discovery::{InvocationStats, Invoker};
use crate::config::ConfigError;
use crate::domains::{load_monitored_domains, KnownDomains};
use crate::normalize::normalize_artifacts;
use crate::paths::RunPaths;
use crate::report::{remove_stale_report, write_report};
use anyhow::Result;
use std::path::PathBuf;
use tracing::{info, warn};

/// What a completed run produced. Handed to the notifier.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub report_path: PathBuf,
    pub new_domains: Vec<String>,
    pub monitored: usize,
    pub invocations: InvocationStats,
    pub artifacts_parsed: usize,
    pub parse_failures: usize,
    pub candidates: usize,
    pub cleanup_removed: usize,
    pub cleanup_failures: usize,
}

impl RunSummary {
    pub fn new_count(&self) -> usize {
        self.new_domains.len()
    }

    pub fn has_new_domains(&self) -> bool {
        !self.new_domains.is_empty()
    }
}

/// Both domain lists, read during startup so a bad list is a configuration error
/// raised before the previous report is touched.
#[derive(Debug, Clone)]
pub struct RunInputs {
    pub monitored: Vec<String>,
    pub known: KnownDomains,
}

impl RunInputs {
    pub fn load(paths: &RunPaths) -> Result<Self, ConfigError> {
        Ok(Self {
            monitored: load_monitored_domains(&paths.monitored_list)?,
            known: KnownDomains::load(&paths.known_list)?,
        })
    }
}

pub struct Pipeline {
    paths: RunPaths,
    inputs: RunInputs,
    invoker: Invoker,
}

impl Pipeline {
    pub fn new(paths: RunPaths, inputs: RunInputs, invoker: Invoker) -> Self {
        Self {
            paths,
            inputs,
            invoker,
        }
    }

    /// Execute one run. Artifacts are removed before this returns, and also if the
    /// returned future is dropped part-way (the registry's `Drop` cleans up).
    pub async fn run(&self) -> Result<RunSummary> {
        let registry = ArtifactRegistry::new(&self.paths.output_dir);
        let result = self.run_stages(&registry).await;

        let cleanup = registry.cleanup();
        if !cleanup.failed.is_empty() {
            warn!(
                "{} temporary files could not be removed",
                cleanup.failed.len()
            );
        }

        let mut summary = result?;
        summary.cleanup_removed = cleanup.removed;
        summary.cleanup_failures = cleanup.failed.len();
        Ok(summary)
    }

    async fn run_stages(&self, registry: &ArtifactRegistry) -> Result<RunSummary> {
        remove_stale_report(&self.paths.results_file)?;

        let RunInputs { monitored, known } = &self.inputs;
        let invocations = self.invoker.run_all(monitored, registry).await;

        let normalized = normalize_artifacts(registry);
        let candidates = normalized.candidates.len();
        info!(
            "Collected {} candidates from {} artifacts ({} unreadable)",
            candidates, normalized.parsed, normalized.failed
        );

        let new_domains = diff(normalized.candidates, known);
        info!(
            "{} new domains after removing duplicates and {} known domains",
            new_domains.len(),
            known.len()
        );

        write_report(&self.paths.results_file, &new_domains)?;

        Ok(RunSummary {
            report_path: self.paths.results_file.clone(),
            new_domains,
            monitored: monitored.len(),
            invocations,
            artifacts_parsed: normalized.parsed,
            parse_failures: normalized.failed,
            candidates,
            cleanup_removed: 0,
            cleanup_failures: 0,
        })
    }
}

pub fn print_run_summary(summary: &RunSummary) {
    println!("\n=== Run Summary ===");
    println!("Monitored domains: {}", summary.monitored);
    println!(
        "Tool invocations: {} ({} failed)",
        summary.invocations.attempted, summary.invocations.failed
    );
    println!(
        "Artifacts parsed: {} ({} skipped)",
        summary.artifacts_parsed, summary.parse_failures
    );
    println!("Candidates collected: {}", summary.candidates);
    if summary.has_new_domains() {
        println!("New domains: {}", summary.new_count());
        for domain in &summary.new_domains {
            println!("  {}", domain);
        }
    } else {
        println!("No new domains found.");
    }
    println!("Report: {}", summary.report_path.display());
    println!("===================\n");
}
