//! Sphere RCS command-line interface.
//!
//! Run frequency sweeps from TOML job files:
//! ```sh
//! rcs-cli run job.toml
//! rcs-cli validate job.toml
//! rcs-cli point --diameter 0.07 --frequency 10e9
//! ```

mod config;
mod fetch;
mod runner;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use rcs_core::{RcsSweep, SweepOptions};

#[derive(Parser)]
#[command(name = "rcs-cli")]
#[command(about = "Backscatter RCS of a perfectly conducting sphere (Mie series)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a frequency sweep from a TOML job file.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output directory (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a job file and its target without running the sweep.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
    /// Evaluate the RCS of a sphere at a single frequency.
    Point {
        /// Sphere diameter (m).
        #[arg(long)]
        diameter: f64,
        /// Frequency (Hz).
        #[arg(long)]
        frequency: f64,
        /// Highest multipole order.
        #[arg(long, default_value_t = rcs_core::types::DEFAULT_N_MAX)]
        n_max: usize,
    },
}

fn job_dir(config: &Path) -> PathBuf {
    config
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output } => {
            println!("Sphere RCS sweep");
            println!("================");
            let job = config::load_config(&config)?;
            println!("Configuration: {}", config.display());

            let result = runner::run_sweep(&job, &job_dir(&config))?;

            let out_dir = output.unwrap_or_else(|| PathBuf::from(&job.output.directory));

            if job.output.save_json {
                let json_path = out_dir.join(&job.output.json_file);
                runner::write_rcs_json(&result.spectrum, &json_path)?;
            }
            if job.output.save_text {
                let text_path = out_dir.join(&job.output.text_file);
                runner::write_rcs_text(&result, &text_path)?;
            }

            println!("Sweep complete.");
            Ok(())
        }
        Commands::Validate { config } => {
            let job = config::load_config(&config)?;
            let (sweep, options) = runner::prepare(&job, &job_dir(&config))?;
            runner::create_backend(&job.sweep)?;
            println!("Configuration is valid: {}", config.display());
            println!(
                "  D={} m, f=[{:e}, {:e}] Hz, {} points, n_max={}",
                sweep.diameter(),
                sweep.fmin(),
                sweep.fmax(),
                sweep.num_points(),
                options.n_max
            );
            Ok(())
        }
        Commands::Point {
            diameter,
            frequency,
            n_max,
        } => {
            let options = SweepOptions {
                n_max,
                ..SweepOptions::default()
            };
            options.validate()?;
            let r = RcsSweep::new(options).evaluate_frequency(diameter, frequency)?;
            println!("frequency_hz:   {:e}", r.frequency_hz);
            println!("wavelength_m:   {:e}", r.wavelength_m);
            println!("size_parameter: {:.6}", r.size_parameter);
            println!("rcs_m2:         {:.10e}", r.rcs_m2);
            println!(
                "orders_summed:  {} (last term {:.3e})",
                r.diagnostics.orders_summed, r.diagnostics.last_term_magnitude
            );
            if !r.diagnostics.excluded_orders.is_empty() {
                println!("excluded:       {:?}", r.diagnostics.excluded_orders);
            }
            Ok(())
        }
    }
}
