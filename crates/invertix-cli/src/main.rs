//! Invertix command-line interface.
//!
//! Invert matrices from plain-text files:
//! ```sh
//! invertix run job.toml
//! invertix invert matrix.txt -o inverse.txt -w 4
//! invertix validate matrix.txt
//! ```

mod config;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "invertix")]
#[command(about = "Invertix: distributed Gauss-Jordan matrix inversion")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an inversion job from a TOML configuration file.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output file (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Invert a matrix file directly, without a job file.
    Invert {
        /// Path to the input matrix file.
        matrix: PathBuf,
        /// Output file (default: "<input>.inverse").
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Number of worker ranks.
        #[arg(short, long, default_value_t = config::default_workers())]
        workers: usize,
        /// Singularity threshold for pivot values.
        #[arg(long, default_value_t = invertix_core::engine::DEFAULT_TOLERANCE)]
        tolerance: f64,
    },
    /// Parse and shape-check a matrix file without inverting it.
    Validate {
        /// Path to the matrix file.
        matrix: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output } => {
            let job = config::load_config(&config)?;
            println!("Job: {}", config.display());

            let input = PathBuf::from(&job.input.matrix);
            let inverse =
                runner::invert_file(&input, job.solver.workers, job.solver.tolerance)?;

            let out_path = output.unwrap_or_else(|| PathBuf::from(&job.output.path));
            runner::write_output(&out_path, &inverse)?;
            Ok(())
        }
        Commands::Invert {
            matrix,
            output,
            workers,
            tolerance,
        } => {
            let inverse = runner::invert_file(&matrix, workers, tolerance)?;
            let out_path = output.unwrap_or_else(|| {
                let mut p = matrix.clone();
                p.set_extension("inverse");
                p
            });
            runner::write_output(&out_path, &inverse)?;
            Ok(())
        }
        Commands::Validate { matrix } => {
            let m = invertix_core::format::read_matrix(&matrix)?;
            println!(
                "Matrix file is valid: {} (order {})",
                matrix.display(),
                m.nrows()
            );
            Ok(())
        }
    }
}
