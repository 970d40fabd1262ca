//! Turns each generator's raw CSV into plain candidate domain strings.
//!
//! Fields are trimmed of surrounding whitespace, matching how the known-domain list is read.
//! Case and trailing dots are left alone.

use crate::artifacts::{Artifact, ArtifactRegistry};
use crate::discovery::ToolKind;
use crate::error::ParseError;
use tracing::{debug, warn};

/// urlcrazy column holding the permutation
pub const URLCRAZY_DOMAIN_COLUMN: &str = "Typo";
/// urlcrazy column holding the resolved country code
pub const URLCRAZY_CLASSIFICATION_COLUMN: &str = "CC-A";
/// Classification value meaning the permutation could not be classified
pub const UNCLASSIFIED: &str = "?";

/// Lines before the first dnstwist data row: the header and the echo of the queried domain
pub const DNSTWIST_PREAMBLE_LINES: usize = 2;
/// Zero-based dnstwist column holding the permutation
pub const DNSTWIST_DOMAIN_COLUMN: usize = 1;

/// One variant per supported generator output shape.
pub trait OutputAdapter {
    fn normalize(&self, raw: &[u8]) -> Result<Vec<String>, ParseError>;
}

pub struct UrlCrazyAdapter;

pub struct DnsTwistAdapter;

pub fn adapter_for(kind: ToolKind) -> &'static dyn OutputAdapter {
    match kind {
        ToolKind::UrlCrazy => &UrlCrazyAdapter,
        ToolKind::DnsTwist => &DnsTwistAdapter,
    }
}

/// Strip NUL bytes and replace invalid UTF-8 so bad tool encoding never aborts parsing.
fn sanitize(raw: &[u8]) -> String {
    let without_nul: Vec<u8> = raw.iter().copied().filter(|b| *b != 0).collect();
    String::from_utf8_lossy(&without_nul).into_owned()
}

fn reader(content: &str, has_headers: bool) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .from_reader(content.as_bytes())
}

impl OutputAdapter for UrlCrazyAdapter {
    fn normalize(&self, raw: &[u8]) -> Result<Vec<String>, ParseError> {
        let content = sanitize(raw);
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mut rdr = reader(&content, true);

        let headers = rdr.headers()?.clone();
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| ParseError::MissingColumn(name.to_string()))
        };
        let domain_idx = position(URLCRAZY_DOMAIN_COLUMN)?;
        let class_idx = position(URLCRAZY_CLASSIFICATION_COLUMN)?;

        let mut candidates = Vec::new();
        for (line, record) in rdr.records().enumerate() {
            let record = record?;
            let (Some(domain), Some(class)) = (record.get(domain_idx), record.get(class_idx)) else {
                debug!("urlcrazy row {} is missing columns, skipping", line + 1);
                continue;
            };
            let domain = domain.trim();
            if class.trim() == UNCLASSIFIED || domain.is_empty() {
                continue;
            }
            candidates.push(domain.to_string());
        }
        Ok(candidates)
    }
}

impl OutputAdapter for DnsTwistAdapter {
    fn normalize(&self, raw: &[u8]) -> Result<Vec<String>, ParseError> {
        let content = sanitize(raw);
        let mut rdr = reader(&content, false);

        let mut candidates = Vec::new();
        for (line, record) in rdr.records().enumerate().skip(DNSTWIST_PREAMBLE_LINES) {
            let record = record?;
            match record.get(DNSTWIST_DOMAIN_COLUMN).map(str::trim) {
                Some(domain) if !domain.is_empty() => candidates.push(domain.to_string()),
                _ => debug!("dnstwist row {} has no domain column, skipping", line + 1),
            }
        }
        Ok(candidates)
    }
}

#[derive(Debug, Default)]
pub struct NormalizeOutcome {
    pub candidates: Vec<String>,
    pub parsed: usize,
    pub failed: usize,
}

/// Read every produced artifact, in tool then monitored-domain order.
pub fn normalize_artifacts(registry: &ArtifactRegistry) -> NormalizeOutcome {
    let mut outcome = NormalizeOutcome::default();

    for artifact in registry.produced() {
        match normalize_artifact(&artifact) {
            Ok(mut found) => {
                debug!(
                    "{} produced {} candidates for {}",
                    artifact.tool,
                    found.len(),
                    artifact.domain
                );
                outcome.parsed += 1;
                outcome.candidates.append(&mut found);
            }
            Err(err) => {
                warn!(
                    "Skipping {} output for {} ({}): {}",
                    artifact.tool,
                    artifact.domain,
                    artifact.path.display(),
                    err
                );
                outcome.failed += 1;
            }
        }
    }
    outcome
}

fn normalize_artifact(artifact: &Artifact) -> Result<Vec<String>, ParseError> {
    let raw = std::fs::read(&artifact.path)?;
    adapter_for(artifact.tool).normalize(&raw)
}
