//! Input lists: the monitored portfolio and the previously triaged known domains.
//!
//! Known-domain matching is exact and case-sensitive. `Example.com` and `example.com.`
//! are different entries from `example.com`; this mirrors how the lists have always been
//! compared and may under-deduplicate.
//!
//! The one normalization applied is trimming surrounding whitespace from each field, both
//! here and on generator output, so `" examp1e.com"` in a hand-edited list still matches.
//! Nothing inside the domain string is touched.

use crate::config::ConfigError;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Read the monitored domain list: one domain per line, no header.
///
/// Surrounding whitespace is trimmed; blank lines and `#` comments are skipped.
pub fn load_monitored_domains(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::MonitoredDomains {
        path: path.to_path_buf(),
        source,
    })?;

    let domains: Vec<String> = parse_monitored_domains(&content);
    info!("Loaded {} monitored domains from {}", domains.len(), path.display());
    Ok(domains)
}

pub fn parse_monitored_domains(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Why a domain was triaged. Informational only; filtering never looks at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnownReason {
    Squatter,
    ValidSite,
    Other(String),
}

impl KnownReason {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Squatter" => KnownReason::Squatter,
            "Valid Site" | "ValidSite" => KnownReason::ValidSite,
            other => KnownReason::Other(other.to_string()),
        }
    }
}

impl fmt::Display for KnownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnownReason::Squatter => write!(f, "Squatter"),
            KnownReason::ValidSite => write!(f, "Valid Site"),
            KnownReason::Other(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownDomain {
    pub domain: String,
    pub reason: KnownReason,
}

#[derive(Debug, Deserialize)]
struct KnownDomainRow {
    #[serde(rename = "Domain")]
    domain: String,
    #[serde(rename = "Reason", default)]
    reason: Option<String>,
}

/// Lookup set over the known-domain list.
#[derive(Debug, Default, Clone)]
pub struct KnownDomains {
    entries: Vec<KnownDomain>,
    lookup: HashSet<String>,
}

impl KnownDomains {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path).map_err(|e| ConfigError::KnownDomains {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let known = Self::from_reader(bytes.as_slice()).map_err(|e| ConfigError::KnownDomains {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let squatters = known
            .entries
            .iter()
            .filter(|e| e.reason == KnownReason::Squatter)
            .count();
        info!(
            "Loaded {} known domains ({} squatters) from {}",
            known.len(),
            squatters,
            path.display()
        );
        Ok(known)
    }

    /// Parse a `Domain,Reason` CSV
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, csv::Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut known = KnownDomains::default();
        for row in rdr.deserialize::<KnownDomainRow>() {
            let row = row?;
            if row.domain.is_empty() {
                continue;
            }
            let reason = KnownReason::parse(row.reason.as_deref().unwrap_or_default());
            known.insert(row.domain, reason);
        }
        Ok(known)
    }

    pub fn insert(&mut self, domain: String, reason: KnownReason) {
        if self.lookup.insert(domain.clone()) {
            self.entries.push(KnownDomain { domain, reason });
        } else {
            debug!("Duplicate known domain entry ignored: {}", domain);
        }
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.lookup.contains(domain)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for KnownDomains {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut known = KnownDomains::default();
        for domain in iter {
            known.insert(domain.into(), KnownReason::Squatter);
        }
        known
    }
}
