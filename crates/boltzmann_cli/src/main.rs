//! # cc-test
//!
//! Computes the conservative collision operator from stored Wigner samples and
//! compares it with reference spectra.
//!
//! ```bash
//! cc-test --data-dir ../test/data
//! cc-test --config run.json --json
//! RUST_LOG=debug cc-test --grid-dim 32 --save-result out/
//! ```

use anyhow::{Context, Result};
use boltzmann_core::collision::RelaxationEvaluator;
use boltzmann_core::config::RunConfig;
use boltzmann_core::io;
use boltzmann_core::pipeline::{run, RunReport};
use boltzmann_core::quadrature::PolarQuadrature;
use clap::Parser;
use num_complex::Complex64;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Conservative collision operator test
#[derive(Parser, Debug)]
#[command(name = "cc-test", version)]
#[command(about = "Evaluate the conservative collision operator and compare with reference data")]
struct Args {
    /// JSON file with run parameters; flags override its values
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Directory holding the sample and reference files
    #[arg(long, short = 'd')]
    data_dir: Option<PathBuf>,

    /// Grid dimension N
    #[arg(long)]
    grid_dim: Option<usize>,

    /// Quadrature node count per direction
    #[arg(long)]
    quadrature_count: Option<usize>,

    /// Side length L of the periodic domain
    #[arg(long)]
    domain_length: Option<f64>,

    /// Momentum cutoff radius R
    #[arg(long)]
    cutoff_radius: Option<f64>,

    /// Relative error accepted as agreement
    #[arg(long)]
    tolerance: Option<f64>,

    /// Store the computed spectra here, named like the reference files
    #[arg(long)]
    save_result: Option<PathBuf>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Exit with status 2 when the relative error is undefined or too large
    #[arg(long)]
    strict: bool,
}

impl Args {
    fn resolve(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_json_file(path)?,
            None => RunConfig::default(),
        };
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(n) = self.grid_dim {
            config.grid_dim = n;
        }
        if let Some(count) = self.quadrature_count {
            config.quadrature_count = count;
        }
        if let Some(l) = self.domain_length {
            config.domain_length = l;
        }
        if let Some(r) = self.cutoff_radius {
            config.cutoff_radius = r;
        }
        if let Some(tol) = self.tolerance {
            config.tolerance = tol;
        }
        config.validate()?;
        Ok(config)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn format_complex(z: Complex64) -> String {
    format!("{} + {}i", z.re, z.im)
}

fn print_report(report: &RunReport) {
    println!("example:");
    for p in &report.probes {
        println!(
            "Cc->comp[{}].data[{}]: {}",
            p.component,
            p.index,
            format_complex(p.computed)
        );
    }
    for p in &report.probes {
        println!(
            "Cc_ref->comp[{}].data[{}]: {}",
            p.component,
            p.index,
            format_complex(p.reference)
        );
    }
    println!(
        "\ncumulative error: {:e}, relative error: {}",
        report.comparison.cumulative_error, report.comparison.relative_error
    );
    println!(
        "CPU time: {:.3} s, tolerance {:e}: {}",
        report.elapsed_seconds,
        report.tolerance,
        if report.passed { "passed" } else { "FAILED" }
    );
}

fn execute(args: &Args) -> Result<bool> {
    let config = args.resolve().context("invalid run configuration")?;
    let report = run(&config, &PolarQuadrature, &RelaxationEvaluator).with_context(|| {
        format!(
            "collision operator test failed (data directory {})",
            config.data_dir.display()
        )
    })?;

    if let Some(dir) = &args.save_result {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        io::write_spectra(dir, &config.reference_pattern, &report.result)
            .context("failed to store computed spectra")?;
        tracing::info!(dir = %dir.display(), "stored computed spectra");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(report.passed)
}

/// Process status for a finished run: 1 on error, 2 when `--strict` and the
/// comparison failed, 0 otherwise.
fn exit_code(result: &Result<bool>, strict: bool) -> i32 {
    match result {
        Ok(true) => 0,
        Ok(false) if strict => 2,
        Ok(false) => 0,
        Err(_) => 1,
    }
}

fn main() {
    let args = Args::parse();
    init_tracing();
    let result = execute(&args);
    if let Err(e) = &result {
        eprintln!("error: {e:#}");
    }
    let code = exit_code(&result, args.strict);
    if code != 0 {
        process::exit(code);
    }
}
