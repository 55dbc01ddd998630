//! TOML configuration deserialisation for sweep jobs and task files.

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use rcs_core::types::{DEFAULT_MIN_SIZE_PARAMETER, DEFAULT_N_MAX, SPEED_OF_LIGHT};
use rcs_core::mie::DEFAULT_DEGENERATE_TOLERANCE;
use rcs_core::{SingularityPolicy, SweepOptions};

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    pub target: TargetSpec,
    #[serde(default)]
    pub sweep: SweepSettings,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Sphere and frequency range: inline values or a reference to a task file.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TargetSpec {
    Inline {
        /// Sphere diameter (m).
        diameter: f64,
        /// Lowest frequency (Hz).
        fmin: f64,
        /// Highest frequency (Hz).
        fmax: f64,
    },
    Task {
        /// Path (relative to the job file) or `http(s)://` URL.
        task: String,
        /// Top-level table of the task file holding this job's values.
        variant: String,
    },
}

/// Sweep parameters from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepSettings {
    #[serde(default = "default_points")]
    pub points: usize,
    #[serde(default = "default_n_max")]
    pub n_max: usize,
    #[serde(default = "default_speed_of_light")]
    pub speed_of_light: f64,
    #[serde(default = "default_min_size_parameter")]
    pub min_size_parameter: f64,
    #[serde(default = "default_degenerate_tolerance")]
    pub degenerate_tolerance: f64,
    #[serde(default)]
    pub on_singularity: SingularityPolicy,
    /// Compute backend: "auto", "serial", or "cpu". Default: "auto".
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Worker threads for the "cpu" backend. Default: all available.
    #[serde(default)]
    pub threads: Option<usize>,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            points: default_points(),
            n_max: default_n_max(),
            speed_of_light: default_speed_of_light(),
            min_size_parameter: default_min_size_parameter(),
            degenerate_tolerance: default_degenerate_tolerance(),
            on_singularity: SingularityPolicy::default(),
            backend: default_backend(),
            threads: None,
        }
    }
}

impl SweepSettings {
    pub fn options(&self) -> SweepOptions {
        SweepOptions {
            n_max: self.n_max,
            speed_of_light: self.speed_of_light,
            min_size_parameter: self.min_size_parameter,
            degenerate_tolerance: self.degenerate_tolerance,
            on_singularity: self.on_singularity,
        }
    }
}

fn default_points() -> usize {
    200
}
fn default_n_max() -> usize {
    DEFAULT_N_MAX
}
fn default_speed_of_light() -> f64 {
    SPEED_OF_LIGHT
}
fn default_min_size_parameter() -> f64 {
    DEFAULT_MIN_SIZE_PARAMETER
}
fn default_degenerate_tolerance() -> f64 {
    DEFAULT_DEGENERATE_TOLERANCE
}
fn default_backend() -> String {
    "auto".into()
}

/// Output configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: "./output").
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// File name of the JSON result (default: "rcs.json").
    #[serde(default = "default_json_file")]
    pub json_file: String,
    /// File name of the text table (default: "rcs.txt").
    #[serde(default = "default_text_file")]
    pub text_file: String,
    /// Whether to write the JSON result (default: true).
    #[serde(default = "default_true")]
    pub save_json: bool,
    /// Whether to also write the text table (default: false).
    #[serde(default)]
    pub save_text: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            json_file: default_json_file(),
            text_file: default_text_file(),
            save_json: true,
            save_text: false,
        }
    }
}

fn default_output_dir() -> String {
    "./output".into()
}
fn default_json_file() -> String {
    "rcs.json".into()
}
fn default_text_file() -> String {
    "rcs.txt".into()
}
fn default_true() -> bool {
    true
}

/// Sphere parameters read from one variant of a task file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereTask {
    pub diameter: f64,
    pub fmin: f64,
    pub fmax: f64,
}

/// Parse the variant table of a task file.
///
/// Task files keep one top-level table per variant with the keys `D`, `fmin`
/// and `fmax`. Values may be TOML numbers or numeric strings such as
/// `"70e-3"`.
pub fn parse_task(content: &str, variant: &str) -> Result<SphereTask> {
    let doc: toml::Table = toml::from_str(content).context("Task file is not valid TOML")?;
    let table = doc
        .get(variant)
        .and_then(|v| v.as_table())
        .with_context(|| format!("Variant '{}' not found in task file", variant))?;

    let field = |key: &str| -> Result<f64> {
        match table.get(key) {
            Some(toml::Value::Float(v)) => Ok(*v),
            Some(toml::Value::Integer(v)) => Ok(*v as f64),
            Some(toml::Value::String(s)) => s
                .trim()
                .trim_matches('"')
                .parse::<f64>()
                .with_context(|| format!("Variant '{}': '{}' = {:?} is not a number", variant, key, s)),
            Some(other) => bail!(
                "Variant '{}': '{}' must be a number, found {}",
                variant,
                key,
                other.type_str()
            ),
            None => bail!("Variant '{}' has no '{}' field", variant, key),
        }
    };

    Ok(SphereTask {
        diameter: field("D")?,
        fmin: field("fmin")?,
        fmax: field("fmax")?,
    })
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &std::path::Path) -> Result<JobConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read job file {}", path.display()))?;
    let config: JobConfig = toml::from_str(&content)
        .with_context(|| format!("Cannot parse job file {}", path.display()))?;
    Ok(config)
}
