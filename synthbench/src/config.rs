// SPDX-License-Identifier: Apache-2.0

//! The benchmark manifest and the resolved settings for one harness run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::summary::SummaryValue;
use crate::synthbench_error::{Result, SynthbenchError};

pub const MANIFEST_ENV: &str = "SYNTHBENCH_MANIFEST";
pub const OUTPUT_DIR_ENV: &str = "SYNTHBENCH_OUTPUT_DIR";
pub const ITERATIONS_ENV: &str = "SYNTHBENCH_ITERATIONS";

pub const DEFAULT_MANIFEST_PATH: &str = "manifest.toml";
pub const DEFAULT_OUTPUT_DIR: &str = "out";
pub const DEFAULT_ITERATIONS: u32 = 1;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BenchmarkEntry {
    /// SystemVerilog source; the file stem names both the benchmark and its
    /// top module.
    pub filepath: PathBuf,
    /// Extra flags appended to Vivado's `synth_design`.
    #[serde(default)]
    pub synth_options: Option<String>,
    /// Copied into the Vivado summary, e.g. `{ dsp = true }`.
    #[serde(default)]
    pub features: BTreeMap<String, SummaryValue>,
}

impl BenchmarkEntry {
    pub fn name(&self) -> String {
        self.filepath
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BenchManifest {
    pub benchmarks: Vec<BenchmarkEntry>,
    pub vivado_num_attempts: u32,
    pub vivado_part_name: String,
    pub yosys_family: String,
    /// Relative to the run's output directory.
    pub output_csv_filepath: PathBuf,
    pub mul_verify_experiment_timeout_s: f64,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub iterations: Option<u32>,
}

impl BenchManifest {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let manifest: BenchManifest = toml::from_str(text)
            .map_err(|e| SynthbenchError::Config(format!("invalid manifest: {}", e)))?;
        if manifest.vivado_num_attempts == 0 {
            return Err(SynthbenchError::Config(
                "vivado_num_attempts must be at least 1".to_string(),
            ));
        }
        let timeout = manifest.mul_verify_experiment_timeout_s;
        if !timeout.is_finite() || timeout <= 0.0 {
            return Err(SynthbenchError::Config(
                "mul_verify_experiment_timeout_s must be a positive number of seconds".to_string(),
            ));
        }
        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SynthbenchError::io(format!("failed to read manifest {}", path.display()), e)
        })?;
        Self::from_toml_str(&text)
    }
}

/// Values given on the command line; `None` means "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOverrides {
    pub manifest_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub iterations: Option<u32>,
}

/// Settings for a harness run, resolved once at startup and passed down
/// explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub manifest_path: PathBuf,
    pub output_dir: PathBuf,
    pub iterations: u32,
    pub manifest: BenchManifest,
}

impl RunConfig {
    /// Resolves each setting as environment variable, then command line, then
    /// manifest entry, then built-in default. `env` looks up a variable.
    pub fn resolve<F>(overrides: &RunOverrides, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let manifest_path = env(MANIFEST_ENV)
            .map(PathBuf::from)
            .or_else(|| overrides.manifest_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST_PATH));
        let manifest = BenchManifest::load(&manifest_path)?;

        let output_dir = env(OUTPUT_DIR_ENV)
            .map(PathBuf::from)
            .or_else(|| overrides.output_dir.clone())
            .or_else(|| manifest.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let env_iterations = match env(ITERATIONS_ENV) {
            Some(value) => Some(value.trim().parse::<u32>().map_err(|e| {
                SynthbenchError::Config(format!(
                    "{} must be a non-negative integer; got {:?}: {}",
                    ITERATIONS_ENV, value, e
                ))
            })?),
            None => None,
        };
        let iterations = env_iterations
            .or(overrides.iterations)
            .or(manifest.iterations)
            .unwrap_or(DEFAULT_ITERATIONS);
        if iterations == 0 {
            return Err(SynthbenchError::Config(
                "iterations must be at least 1".to_string(),
            ));
        }

        log::debug!(
            "RunConfig::resolve; manifest={} output_dir={} iterations={}",
            manifest_path.display(),
            output_dir.display(),
            iterations
        );
        Ok(RunConfig {
            manifest_path,
            output_dir,
            iterations,
            manifest,
        })
    }

    /// [`RunConfig::resolve`] against the process environment.
    pub fn from_process_env(overrides: &RunOverrides) -> Result<Self> {
        Self::resolve(overrides, |key| std::env::var(key).ok())
    }

    /// Where a benchmark's source lives; relative paths are taken relative to
    /// the manifest's directory.
    pub fn benchmark_path(&self, entry: &BenchmarkEntry) -> PathBuf {
        if entry.filepath.is_absolute() {
            return entry.filepath.clone();
        }
        match self.manifest_path.parent() {
            Some(dir) => dir.join(&entry.filepath),
            None => entry.filepath.clone(),
        }
    }

    pub fn output_csv_path(&self) -> PathBuf {
        self.output_dir.join(&self.manifest.output_csv_filepath)
    }

    pub fn mul_verify_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.manifest.mul_verify_experiment_timeout_s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    const MANIFEST: &str = r#"
vivado_num_attempts = 3
vivado_part_name = "xczu3eg-sbva484-1-e"
yosys_family = "xcup"
output_csv_filepath = "collected_data.csv"
mul_verify_experiment_timeout_s = 60
output_dir = "from-manifest"

[[benchmarks]]
filepath = "benchmarks/mul8.sv"
synth_options = "-max_dsp 0"
features = { dsp = false, pipeline_depth = 2 }

[[benchmarks]]
filepath = "benchmarks/add16.sv"
"#;

    fn write_manifest(dir: &Path) -> PathBuf {
        let path = dir.join("manifest.toml");
        std::fs::write(&path, MANIFEST).unwrap();
        path
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_manifest() {
        let manifest = BenchManifest::from_toml_str(MANIFEST).unwrap();
        assert_eq!(manifest.benchmarks.len(), 2);
        assert_eq!(manifest.benchmarks[0].name(), "mul8");
        assert_eq!(
            manifest.benchmarks[0].synth_options.as_deref(),
            Some("-max_dsp 0")
        );
        assert_eq!(
            manifest.benchmarks[0].features.get("dsp"),
            Some(&SummaryValue::Bool(false))
        );
        assert_eq!(
            manifest.benchmarks[0].features.get("pipeline_depth"),
            Some(&SummaryValue::Int(2))
        );
        assert!(manifest.benchmarks[1].features.is_empty());
        assert_eq!(manifest.mul_verify_experiment_timeout_s, 60.0);
        assert_eq!(manifest.iterations, None);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let text = MANIFEST.replace("vivado_num_attempts = 3", "vivado_num_attempts = 0");
        let err = BenchManifest::from_toml_str(&text).unwrap_err();
        assert!(matches!(err, SynthbenchError::Config(_)));
    }

    #[test]
    fn test_missing_required_key_rejected() {
        let text = MANIFEST.replace("yosys_family = \"xcup\"\n", "");
        let err = BenchManifest::from_toml_str(&text).unwrap_err();
        assert!(err.to_string().contains("yosys_family"), "got {}", err);
    }

    #[test]
    fn test_file_beats_default() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = write_manifest(dir.path());
        let overrides = RunOverrides {
            manifest_path: Some(manifest_path.clone()),
            ..Default::default()
        };
        let config = RunConfig::resolve(&overrides, env_from(&[])).unwrap();
        assert_eq!(config.manifest_path, manifest_path);
        assert_eq!(config.output_dir, PathBuf::from("from-manifest"));
        assert_eq!(config.iterations, DEFAULT_ITERATIONS);
        assert_eq!(
            config.output_csv_path(),
            PathBuf::from("from-manifest/collected_data.csv")
        );
    }

    #[test]
    fn test_cli_beats_file() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = RunOverrides {
            manifest_path: Some(write_manifest(dir.path())),
            output_dir: Some(PathBuf::from("from-cli")),
            iterations: Some(4),
        };
        let config = RunConfig::resolve(&overrides, env_from(&[])).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("from-cli"));
        assert_eq!(config.iterations, 4);
    }

    #[test]
    fn test_env_beats_everything() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = write_manifest(dir.path());
        let overrides = RunOverrides {
            manifest_path: Some(PathBuf::from("/no/such/manifest.toml")),
            output_dir: Some(PathBuf::from("from-cli")),
            iterations: Some(4),
        };
        let manifest_str = manifest_path.display().to_string();
        let env = env_from(&[
            (MANIFEST_ENV, manifest_str.as_str()),
            (OUTPUT_DIR_ENV, "from-env"),
            (ITERATIONS_ENV, "7"),
        ]);
        let config = RunConfig::resolve(&overrides, env).unwrap();
        assert_eq!(config.manifest_path, manifest_path);
        assert_eq!(config.output_dir, PathBuf::from("from-env"));
        assert_eq!(config.iterations, 7);
    }

    #[test]
    fn test_bad_iterations_env_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = RunOverrides {
            manifest_path: Some(write_manifest(dir.path())),
            ..Default::default()
        };
        let err = RunConfig::resolve(&overrides, env_from(&[(ITERATIONS_ENV, "many")]))
            .unwrap_err();
        assert!(matches!(err, SynthbenchError::Config(_)), "got {:?}", err);
    }

    #[test]
    fn test_benchmark_paths_relative_to_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = RunOverrides {
            manifest_path: Some(write_manifest(dir.path())),
            ..Default::default()
        };
        let config = RunConfig::resolve(&overrides, env_from(&[])).unwrap();
        let entry = &config.manifest.benchmarks[0];
        assert_eq!(
            config.benchmark_path(entry),
            dir.path().join("benchmarks/mul8.sv")
        );
    }
}
