//! Load → transform → evaluate → compare.
//!
//! The run is a fail-fast sequence. The quadrature set and the evaluator
//! workspace live in a [`CollisionContext`] and are released when it drops,
//! on the success path and on every early return alike.

use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::grid::{Component, GridDim, SampleBundle, SpectrumBundle};
use crate::io;
use crate::spectral::SpectralTransform;
use crate::traits::{CollisionEvaluator, QuadratureProvider};
use crate::validation::{compare, probe, Comparison};
use num_complex::Complex64;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, info_span};

/// Cells echoed in every report: index 5 of components 0 and 1.
pub const PROBE_CELLS: [(Component, usize); 2] = [(Component::C0, 5), (Component::C1, 5)];

/// An evaluator together with the quadrature set and workspace it runs on.
pub struct CollisionContext<'e, E: CollisionEvaluator> {
    evaluator: &'e E,
    quadrature: E::Quadrature,
    workspace: E::Workspace,
    dim: GridDim,
}

impl<'e, E: CollisionEvaluator> CollisionContext<'e, E> {
    pub fn new<P>(provider: &P, evaluator: &'e E, config: &RunConfig, dim: GridDim) -> Result<Self>
    where
        P: QuadratureProvider<Set = E::Quadrature>,
    {
        let quadrature = provider.build(
            config.quadrature_count,
            config.domain_length,
            config.cutoff_radius,
        )?;
        let workspace = evaluator.create_workspace(dim)?;
        Ok(Self {
            evaluator,
            quadrature,
            workspace,
            dim,
        })
    }

    pub fn quadrature(&self) -> &E::Quadrature {
        &self.quadrature
    }

    /// Applies the collision operator and checks the output shape.
    pub fn evaluate(&mut self, spectrum: &SpectrumBundle) -> Result<SpectrumBundle> {
        if spectrum.dim() != self.dim {
            return Err(Error::ShapeMismatch {
                expected: self.dim.get(),
                found: spectrum.dim().get(),
            });
        }
        let result = self
            .evaluator
            .evaluate(spectrum, &self.quadrature, &mut self.workspace)?;
        if result.dim() != spectrum.dim() {
            return Err(Error::Evaluator(format!(
                "output grid dimension {} differs from input {}",
                result.dim().get(),
                spectrum.dim().get()
            )));
        }
        Ok(result)
    }
}

/// One echoed cell of the computed and reference bundles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Probe {
    pub component: usize,
    pub index: usize,
    pub computed: Complex64,
    pub reference: Complex64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub grid_dim: usize,
    pub comparison: Comparison,
    pub tolerance: f64,
    pub passed: bool,
    /// Wall time of the collision evaluation alone.
    pub elapsed_seconds: f64,
    pub probes: Vec<Probe>,
    #[serde(skip)]
    pub result: SpectrumBundle,
}

/// Transforms and evaluates in-memory samples, without touching the disk.
pub fn evaluate_samples<P, E>(
    samples: &SampleBundle,
    config: &RunConfig,
    provider: &P,
    evaluator: &E,
) -> Result<SpectrumBundle>
where
    P: QuadratureProvider<Set = E::Quadrature>,
    E: CollisionEvaluator,
{
    let dim = samples.dim();
    let spectrum = SpectralTransform::new(dim).reconstruct_bundle(samples)?;
    let mut context = CollisionContext::new(provider, evaluator, config, dim)?;
    context.evaluate(&spectrum)
}

/// Runs the full test against the files described by `config`.
pub fn run<P, E>(config: &RunConfig, provider: &P, evaluator: &E) -> Result<RunReport>
where
    P: QuadratureProvider<Set = E::Quadrature>,
    E: CollisionEvaluator,
{
    let span = info_span!("cc_run", grid_dim = config.grid_dim);
    let _guard = span.enter();

    config.validate()?;
    let dim = config.grid()?;

    let samples = io::load_samples(&config.data_dir, &config.sample_pattern, dim)?;
    info!(dir = %config.data_dir.display(), "loaded sample components");

    let spectrum = SpectralTransform::new(dim).reconstruct_bundle(&samples)?;
    drop(samples);
    debug!("spectrum bundle reconstructed");

    let mut context = CollisionContext::new(provider, evaluator, config, dim)?;

    info!("calculating conservative collision operator");
    let start = Instant::now();
    let result = context.evaluate(&spectrum)?;
    let elapsed_seconds = start.elapsed().as_secs_f64();
    info!(elapsed_seconds, "finished calculation");

    let reference = io::load_spectra(&config.data_dir, &config.reference_pattern, dim)?;
    let comparison = compare(&result, &reference)?;
    info!(
        cumulative_error = comparison.cumulative_error,
        relative_error = %comparison.relative_error,
        "compared with reference"
    );

    let probes = PROBE_CELLS
        .iter()
        .filter_map(|&(component, index)| {
            Some(Probe {
                component: component.index(),
                index,
                computed: probe(&result, component, index)?,
                reference: probe(&reference, component, index)?,
            })
        })
        .collect();

    Ok(RunReport {
        grid_dim: dim.get(),
        passed: comparison.within(config.tolerance),
        comparison,
        tolerance: config.tolerance,
        elapsed_seconds,
        probes,
        result,
    })
}
