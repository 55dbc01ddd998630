//! Sweep runner: ties together the job configuration, the engine and the
//! result writers.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use rcs_compute::{ComputeBackend, CpuBackend, SerialBackend};
use rcs_core::types::RcsSpectrum;
use rcs_core::{RcsSweep, SweepConfig, SweepOptions};

use crate::config::{parse_task, JobConfig, SphereTask, SweepSettings, TargetSpec};
use crate::fetch::read_task_source;

/// Results from a sweep run.
pub struct SweepOutput {
    pub config: SweepConfig,
    pub options: SweepOptions,
    pub spectrum: RcsSpectrum,
}

/// Resolve the sphere and frequency range named by the job's target.
pub fn resolve_target(target: &TargetSpec, base_dir: &Path) -> Result<SphereTask> {
    match target {
        TargetSpec::Inline { diameter, fmin, fmax } => Ok(SphereTask {
            diameter: *diameter,
            fmin: *fmin,
            fmax: *fmax,
        }),
        TargetSpec::Task { task, variant } => {
            log::debug!("Resolving task '{}' variant '{}'", task, variant);
            let content = read_task_source(task, base_dir)?;
            parse_task(&content, variant)
                .with_context(|| format!("Task source '{}'", task))
        }
    }
}

/// Build the validated sweep configuration and options without running it.
pub fn prepare(job: &JobConfig, base_dir: &Path) -> Result<(SweepConfig, SweepOptions)> {
    let sphere = resolve_target(&job.target, base_dir)?;
    let config = SweepConfig::new(sphere.diameter, sphere.fmin, sphere.fmax, job.sweep.points)?;
    let options = job.sweep.options();
    options.validate()?;
    Ok((config, options))
}

/// Run a full sweep from a parsed job configuration.
///
/// `base_dir` is the directory relative task paths are resolved against,
/// normally the directory of the job file.
pub fn run_sweep(job: &JobConfig, base_dir: &Path) -> Result<SweepOutput> {
    let (config, options) = prepare(job, base_dir)?;
    println!(
        "Sphere: D={} m, f=[{:.4e}, {:.4e}] Hz, {} points, n_max={}",
        config.diameter(),
        config.fmin(),
        config.fmax(),
        config.num_points(),
        options.n_max
    );

    let backend = create_backend(&job.sweep)?;
    let info = backend.device_info();
    log::info!("Using {:?} backend ({:?} compute units)", info.backend_type, info.compute_units);
    println!("Backend: {}", info.name);

    let sweep = RcsSweep::with_backend(options.clone(), backend);
    let spectrum = sweep.run(&config)?;

    let total = spectrum.len();
    for (i, r) in spectrum.results.iter().enumerate() {
        if (i + 1) % 20 == 0 || i == 0 || i + 1 == total {
            println!(
                "  [{}/{}] f={:.4e} Hz: kr={:.4}, RCS={:.4e} m^2",
                i + 1,
                total,
                r.frequency_hz,
                r.size_parameter,
                r.rcs_m2
            );
        }
    }
    if let Some(peak) = spectrum.peak() {
        println!(
            "Peak RCS {:.4e} m^2 at f={:.4e} Hz ({:.3} x geometric cross-section)",
            peak.rcs_m2,
            peak.frequency_hz,
            peak.rcs_m2 / config.geometric_cross_section()
        );
    }
    if !spectrum.skipped.is_empty() {
        println!("Skipped points: {}", spectrum.skipped.len());
    }
    if spectrum.degraded_count() > 0 {
        println!("Degraded points: {}", spectrum.degraded_count());
    }

    Ok(SweepOutput {
        config,
        options,
        spectrum,
    })
}

/// JSON layout of a result file: parallel arrays keyed by quantity.
#[derive(Serialize)]
struct RcsJson {
    freq: Vec<f64>,
    lambda: Vec<f64>,
    rcs: Vec<f64>,
}

/// Write the spectrum as `{"freq": [...], "lambda": [...], "rcs": [...]}`.
pub fn write_rcs_json(spectrum: &RcsSpectrum, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let data = RcsJson {
        freq: spectrum.frequencies(),
        lambda: spectrum.wavelengths(),
        rcs: spectrum.rcs_values(),
    };

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    data.serialize(&mut serializer)
        .map_err(|e| anyhow::anyhow!("JSON serialisation error: {}", e))?;
    std::fs::write(path, buf)?;

    println!("Results (JSON) written to: {}", path.display());
    Ok(())
}

/// Write the spectrum as a whitespace-separated table with a metadata header.
pub fn write_rcs_text(output: &SweepOutput, path: &Path) -> Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);

    writeln!(file, "# Sphere RCS - Mie series, perfect conductor")?;
    writeln!(file, "# Version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(file, "# diameter_m: {}", output.config.diameter())?;
    writeln!(
        file,
        "# frequency_range_hz: [{:e}, {:e}]",
        output.config.fmin(),
        output.config.fmax()
    )?;
    writeln!(file, "# n_max: {}", output.options.n_max)?;
    writeln!(file, "# speed_of_light: {:e}", output.options.speed_of_light)?;
    writeln!(file, "#")?;
    writeln!(file, "freq_hz    lambda_m    rcs_m2")?;

    for r in &output.spectrum.results {
        writeln!(
            file,
            "{:.6e}    {:.6e}    {:.10e}",
            r.frequency_hz, r.wavelength_m, r.rcs_m2
        )?;
    }
    file.flush()?;

    println!("Results (text) written to: {}", path.display());
    Ok(())
}

/// Create a compute backend based on the user's preference string.
///
/// - `"serial"`: evaluate points on the calling thread.
/// - `"cpu"`: Rayon thread pool (`threads` workers, or all cores).
/// - `"auto"` (default): Rayon on the global pool.
pub fn create_backend(settings: &SweepSettings) -> Result<Arc<dyn ComputeBackend>> {
    match settings.backend.as_str() {
        "serial" => Ok(Arc::new(SerialBackend::new())),
        "cpu" => match settings.threads {
            Some(n) => Ok(Arc::new(CpuBackend::with_threads(n)?)),
            None => Ok(Arc::new(CpuBackend::new())),
        },
        "auto" => Ok(Arc::new(CpuBackend::new())),
        other => anyhow::bail!(
            "Unknown backend '{}'. Valid backends: auto, serial, cpu",
            other
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::path::PathBuf;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rcs-cli-{}-{}", tag, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn small_job() -> JobConfig {
        toml::from_str(
            r#"
            [target]
            diameter = 70e-3
            fmin = 1e9
            fmax = 10e9

            [sweep]
            points = 10
            backend = "serial"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_run_sweep_from_inline_job() {
        let out = run_sweep(&small_job(), Path::new(".")).unwrap();
        assert_eq!(out.spectrum.len(), 10);
        assert_eq!(out.config.fmax(), 10e9);
        assert!(out.spectrum.rcs_values().iter().all(|&s| s >= 0.0));
    }

    #[test]
    fn test_task_file_target_relative_to_job_dir() {
        let dir = scratch_dir("task");
        std::fs::write(
            dir.join("task.toml"),
            "[12]\nD = \"70e-3\"\nfmin = \"0.01e9\"\nfmax = \"25e9\"\n",
        )
        .unwrap();
        let job: JobConfig = toml::from_str(
            "[target]\ntask = \"task.toml\"\nvariant = \"12\"\n[sweep]\nbackend = \"serial\"\n",
        )
        .unwrap();

        let (config, options) = prepare(&job, &dir).unwrap();
        assert_relative_eq!(config.diameter(), 0.07);
        assert_eq!(config.num_points(), 200);
        assert_eq!(options.n_max, 49);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_invalid_range_rejected_before_sweep() {
        let job: JobConfig =
            toml::from_str("[target]\ndiameter = 0.1\nfmin = 5e9\nfmax = 1e9\n").unwrap();
        let err = prepare(&job, Path::new(".")).err().unwrap();
        assert!(err.to_string().contains("Invalid configuration"));
    }

    #[test]
    fn test_json_layout() {
        let dir = scratch_dir("json");
        let out = run_sweep(&small_job(), Path::new(".")).unwrap();
        let path = dir.join("nested").join("rcs.json");
        write_rcs_json(&out.spectrum, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let freq = value["freq"].as_array().unwrap();
        let lambda = value["lambda"].as_array().unwrap();
        let rcs = value["rcs"].as_array().unwrap();
        assert_eq!(freq.len(), 10);
        assert_eq!(lambda.len(), 10);
        assert_eq!(rcs.len(), 10);
        assert_relative_eq!(lambda[0].as_f64().unwrap(), 0.3, max_relative = 1e-12);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_text_table_has_header_and_rows() {
        let dir = scratch_dir("text");
        let out = run_sweep(&small_job(), Path::new(".")).unwrap();
        let path = dir.join("rcs.txt");
        write_rcs_text(&out, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let rows: Vec<&str> = content
            .lines()
            .filter(|l| !l.starts_with('#'))
            .skip(1)
            .collect();
        assert_eq!(rows.len(), 10);
        let cols: Vec<f64> = rows[0]
            .split("    ")
            .map(|c| c.trim().parse().unwrap())
            .collect();
        assert_eq!(cols.len(), 3);
        assert_relative_eq!(cols[0], 1e9, max_relative = 1e-6);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_backend_selection() {
        let mut settings = SweepSettings::default();
        assert!(create_backend(&settings).is_ok());
        settings.backend = "serial".into();
        assert_eq!(create_backend(&settings).unwrap().device_info().compute_units, Some(1));
        settings.backend = "cpu".into();
        settings.threads = Some(2);
        assert_eq!(create_backend(&settings).unwrap().device_info().compute_units, Some(2));
        settings.backend = "gpu".into();
        assert!(create_backend(&settings).is_err());
    }
}
