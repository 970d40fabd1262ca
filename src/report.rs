use anyhow::{Context, Result};
use csv::Writer;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// The report's only column
pub const REPORT_HEADER: &str = "Domain";

#[derive(Debug, Deserialize)]
struct ReportRow {
    #[serde(rename = "Domain")]
    domain: String,
}

/// Write the report, replacing any previous file. An empty slice still yields the header row.
pub fn write_report(path: &Path, domains: &[String]) -> Result<()> {
    debug!("Writing {} new domains to {}", domains.len(), path.display());

    let file = File::create(path)
        .with_context(|| format!("Failed to create report file: {}", path.display()))?;
    let mut wtr = Writer::from_writer(file);

    wtr.write_record([REPORT_HEADER])?;
    for domain in domains {
        wtr.write_record([domain])?;
    }

    wtr.flush()?;
    info!("Wrote report with {} new domains to {}", domains.len(), path.display());

    Ok(())
}

/// Read a report written by [`write_report`].
pub fn read_report(path: &Path) -> Result<Vec<String>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open report file: {}", path.display()))?;

    let headers = rdr.headers()?;
    if headers.len() != 1 || &headers[0] != REPORT_HEADER {
        anyhow::bail!("Unexpected report header in {}: {:?}", path.display(), headers);
    }

    let mut domains = Vec::new();
    for row in rdr.deserialize::<ReportRow>() {
        domains.push(row?.domain);
    }
    Ok(domains)
}

/// Remove a report left by an earlier run. A missing file is fine.
pub fn remove_stale_report(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed stale report {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove stale report: {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_report_is_header_only() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("results.csv");
        write_report(&path, &[]).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Domain\n");
        assert!(read_report(&path).unwrap().is_empty());
    }

    #[test]
    fn test_report_round_trip_preserves_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("results.csv");
        let domains = vec![
            "exarnple.com".to_string(),
            "examp1e.com".to_string(),
            "odd,name.com".to_string(),
        ];
        write_report(&path, &domains).unwrap();
        assert_eq!(read_report(&path).unwrap(), domains);
    }

    #[test]
    fn test_report_overwrites_previous_run() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("results.csv");
        write_report(&path, &["old1.com".to_string(), "old2.com".to_string()]).unwrap();
        write_report(&path, &["new.com".to_string()]).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Domain\nnew.com\n");
    }

    #[test]
    fn test_remove_stale_report() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("results.csv");
        remove_stale_report(&path).unwrap();

        std::fs::write(&path, "Domain\nold.com\n").unwrap();
        remove_stale_report(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_read_report_rejects_foreign_header() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("results.csv");
        std::fs::write(&path, "Domain,Reason\na.com,Squatter\n").unwrap();
        assert!(read_report(&path).is_err());
    }
}
