//! TOML configuration deserialisation for inversion jobs.

use serde::Deserialize;

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Input section.
#[derive(Debug, Deserialize)]
pub struct InputConfig {
    /// Path to the matrix file.
    pub matrix: String,
}

/// Solver section.
#[derive(Debug, Deserialize)]
pub struct SolverConfig {
    /// Number of worker ranks (default: available parallelism).
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Singularity threshold for pivot values.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            tolerance: default_tolerance(),
        }
    }
}

/// Output section.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output file path (default: "inverse.txt").
    #[serde(default = "default_output_path")]
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_tolerance() -> f64 {
    invertix_core::engine::DEFAULT_TOLERANCE
}

fn default_output_path() -> String {
    "inverse.txt".into()
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<JobConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: JobConfig = toml::from_str(&content)?;
    Ok(config)
}
