#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use typosentry::config::InputsConfig;
use typosentry::discovery::{PermutationTool, ToolKind};
use typosentry::paths::RunPaths;
use typosentry::pipeline::RunInputs;

/// A throwaway config dir, output dir and script dir for one test.
pub struct Workspace {
    pub root: TempDir,
    pub config_dir: PathBuf,
    pub output_dir: PathBuf,
    pub bin_dir: PathBuf,
}

impl Workspace {
    pub fn new(monitored: &[&str], known: &[(&str, &str)]) -> Self {
        let root = TempDir::new().expect("create temp dir");
        let config_dir = root.path().join("config");
        let output_dir = root.path().join("out");
        let bin_dir = root.path().join("bin");
        for dir in [&config_dir, &output_dir, &bin_dir] {
            fs::create_dir_all(dir).unwrap();
        }

        let mut monitored_content = monitored.join("\n");
        monitored_content.push('\n');
        fs::write(config_dir.join("mydomains.csv"), monitored_content).unwrap();

        let mut known_content = String::from("Domain,Reason\n");
        for (domain, reason) in known {
            known_content.push_str(&format!("{},{}\n", domain, reason));
        }
        fs::write(config_dir.join("knowndomains.csv"), known_content).unwrap();

        Self {
            root,
            config_dir,
            output_dir,
            bin_dir,
        }
    }

    pub fn results(&self) -> PathBuf {
        self.output_dir.join("results.csv")
    }

    pub fn paths(&self) -> RunPaths {
        let inputs = InputsConfig {
            monitored_file: "mydomains.csv".to_string(),
            known_file: "knowndomains.csv".to_string(),
        };
        RunPaths::resolve(&self.config_dir, &self.output_dir, "results.csv", &inputs).unwrap()
    }

    pub fn inputs(&self) -> RunInputs {
        RunInputs::load(&self.paths()).unwrap()
    }

    pub fn write_script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.bin_dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    /// Temporary tool output files still present in the output directory
    pub fn leftover_artifacts(&self) -> Vec<PathBuf> {
        fs::read_dir(&self.output_dir)
            .unwrap()
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                let name = p.to_string_lossy();
                name.ends_with(".uctmp") || name.ends_with(".dttmp")
            })
            .collect()
    }
}

/// urlcrazy-style CSV from (typo, CC-A) pairs
pub fn urlcrazy_csv(rows: &[(&str, &str)]) -> String {
    let mut csv = String::from("Typo Type,Typo,Valid,Pop,DNS-A,CC-A,DNS-MX,Extn\n");
    for (typo, cc) in rows {
        csv.push_str(&format!("Homoglyphs,{},true,,1.2.3.4,{},,com\n", typo, cc));
    }
    csv
}

/// dnstwist-style CSV: header, the original domain, then one row per permutation
pub fn dnstwist_csv(original: &str, rows: &[&str]) -> String {
    let mut csv = String::from("fuzzer,domain,dns_a,dns_mx\n");
    csv.push_str(&format!("*original,{},93.184.216.34,\n", original));
    for (i, domain) in rows.iter().enumerate() {
        csv.push_str(&format!("{},{},1.2.3.4,\n", i + 1, domain));
    }
    csv
}

/// Shell script emitting canned output per domain and failing for any other domain.
///
/// With `to_file` the script is called as `sh script <output> <domain>` and writes the file;
/// otherwise as `sh script <domain>` and prints to stdout.
pub fn canned_script(outputs: &[(&str, &str)], to_file: bool) -> String {
    let (var, redirect) = if to_file { ("$2", " > \"$1\"") } else { ("$1", "") };
    let mut script = format!("#!/bin/sh\ncase \"{}\" in\n", var);
    for (domain, content) in outputs {
        script.push_str(&format!(
            "  '{}')\n    cat <<'TYPOSENTRY_EOF'{}\n{}TYPOSENTRY_EOF\n    ;;\n",
            domain, redirect, content
        ));
    }
    script.push_str("  *)\n    echo \"unexpected domain\" >&2\n    exit 1\n    ;;\nesac\n");
    script
}

/// urlcrazy stand-in writing its CSV to the `{output}` path
pub fn urlcrazy_tool(script: &Path) -> PermutationTool {
    PermutationTool::new(
        ToolKind::UrlCrazy,
        PathBuf::from("/bin/sh"),
        vec![
            script.to_string_lossy().into_owned(),
            "{output}".to_string(),
            "{domain}".to_string(),
        ],
        Duration::from_secs(10),
    )
}

/// dnstwist stand-in printing its CSV to stdout
pub fn dnstwist_tool(script: &Path) -> PermutationTool {
    PermutationTool::new(
        ToolKind::DnsTwist,
        PathBuf::from("/bin/sh"),
        vec![script.to_string_lossy().into_owned(), "{domain}".to_string()],
        Duration::from_secs(10),
    )
}
