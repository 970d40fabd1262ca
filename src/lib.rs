//! Detects newly registered typosquatted variants of a monitored domain portfolio.
//!
//! External permutation generators (urlcrazy, dnstwist) are run per monitored domain, their
//! CSV output is normalized into candidate domains, and candidates already on the known-domain
//! list are dropped. Whatever is left is written to a single-column report for human review.

pub mod artifacts;
pub mod cli;
pub mod config;
pub mod diff;
pub mod discovery;
pub mod domains;
pub mod error;
pub mod logger;
pub mod normalize;
pub mod notify;
pub mod paths;
pub mod pipeline;
pub mod report;

pub use config::{AppConfig, ConfigError};
pub use pipeline::{Pipeline, RunSummary};
