//! Resolves and checks every filesystem location a run touches before any work starts.

use crate::config::{ConfigError, InputsConfig};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RunPaths {
    pub monitored_list: PathBuf,
    pub known_list: PathBuf,
    /// Where temporary artifacts and the report are written
    pub output_dir: PathBuf,
    pub results_file: PathBuf,
}

impl RunPaths {
    pub fn resolve(
        config_dir: &Path,
        output_dir: &Path,
        output_name: &str,
        inputs: &InputsConfig,
    ) -> Result<Self, ConfigError> {
        if !config_dir.is_dir() {
            return Err(ConfigError::ConfigDirMissing(config_dir.to_path_buf()));
        }
        if !output_dir.is_dir() {
            return Err(ConfigError::OutputDirMissing(output_dir.to_path_buf()));
        }
        probe_writable(output_dir)?;

        let monitored_list = config_dir.join(&inputs.monitored_file);
        if !monitored_list.is_file() {
            return Err(ConfigError::MonitoredListMissing(monitored_list));
        }
        let known_list = config_dir.join(&inputs.known_file);
        if !known_list.is_file() {
            return Err(ConfigError::KnownListMissing(known_list));
        }

        let results_file = output_dir.join(output_name);
        if results_file.exists() && !results_file.is_file() {
            return Err(ConfigError::ResultsPathNotFile(results_file));
        }

        debug!(
            "Resolved paths: monitored={}, known={}, results={}",
            monitored_list.display(),
            known_list.display(),
            results_file.display()
        );

        Ok(Self {
            monitored_list,
            known_list,
            output_dir: output_dir.to_path_buf(),
            results_file,
        })
    }
}

/// Create and immediately release an anonymous temp file in `dir`.
fn probe_writable(dir: &Path) -> Result<(), ConfigError> {
    tempfile::tempfile_in(dir)
        .map(drop)
        .map_err(|source| ConfigError::OutputDirNotWritable {
            path: dir.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn inputs() -> InputsConfig {
        InputsConfig {
            monitored_file: "mydomains.csv".to_string(),
            known_file: "knowndomains.csv".to_string(),
        }
    }

    fn populated_config_dir() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("mydomains.csv"), "example.com\n").unwrap();
        fs::write(tmp.path().join("knowndomains.csv"), "Domain,Reason\n").unwrap();
        tmp
    }

    #[test]
    fn test_resolve_success() {
        let config = populated_config_dir();
        let out = TempDir::new().unwrap();

        let paths = RunPaths::resolve(config.path(), out.path(), "results.csv", &inputs()).unwrap();
        assert_eq!(paths.results_file, out.path().join("results.csv"));
        assert_eq!(paths.monitored_list, config.path().join("mydomains.csv"));
        // the writability probe must not leave anything behind
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_config_dir() {
        let out = TempDir::new().unwrap();
        let missing = out.path().join("does-not-exist");
        let err = RunPaths::resolve(&missing, out.path(), "results.csv", &inputs()).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigDirMissing(_)));
    }

    #[test]
    fn test_output_dir_is_a_file() {
        let config = populated_config_dir();
        let file = config.path().join("mydomains.csv");
        let err = RunPaths::resolve(config.path(), &file, "results.csv", &inputs()).unwrap_err();
        assert!(matches!(err, ConfigError::OutputDirMissing(_)));
    }

    #[test]
    fn test_missing_known_list() {
        let config = populated_config_dir();
        fs::remove_file(config.path().join("knowndomains.csv")).unwrap();
        let err = RunPaths::resolve(config.path(), config.path(), "results.csv", &inputs()).unwrap_err();
        assert!(matches!(err, ConfigError::KnownListMissing(_)));
    }

    #[test]
    fn test_missing_monitored_list() {
        let config = populated_config_dir();
        fs::remove_file(config.path().join("mydomains.csv")).unwrap();
        let err = RunPaths::resolve(config.path(), config.path(), "results.csv", &inputs()).unwrap_err();
        assert!(matches!(err, ConfigError::MonitoredListMissing(_)));
    }

    #[test]
    fn test_results_path_is_directory() {
        let config = populated_config_dir();
        let out = TempDir::new().unwrap();
        fs::create_dir(out.path().join("results.csv")).unwrap();
        let err = RunPaths::resolve(config.path(), out.path(), "results.csv", &inputs()).unwrap_err();
        assert!(matches!(err, ConfigError::ResultsPathNotFile(_)));
    }
}
