//! Built-in collision backend.
//!
//! `RelaxationEvaluator` applies the mass-conserving multiplier
//! `m(k) / m(0) - 1` to every component, where `m(k)` is the quadrature
//! average of `cos(2 pi / L * k . v)` over the cutoff disk. The multiplier is
//! real and even in `k`, so Hermitian symmetry of the input carries over to
//! the output, and the zero mode vanishes.

use crate::error::{Error, Result};
use crate::grid::{try_alloc, ComplexGrid, GridDim, SpectrumBundle};
use crate::quadrature::QuadratureSet;
use crate::traits::CollisionEvaluator;
use std::f64::consts::PI;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, Default)]
pub struct RelaxationEvaluator;

/// Scratch owned by one evaluation context. Holds the multiplier grid, which
/// is rebuilt only when the quadrature changes.
#[derive(Debug)]
pub struct RelaxationWorkspace {
    dim: GridDim,
    multiplier: Vec<f64>,
    key: Option<(usize, u64, u64)>,
}

impl RelaxationWorkspace {
    pub fn dim(&self) -> GridDim {
        self.dim
    }

    pub fn multiplier(&self) -> Option<&[f64]> {
        self.key.map(|_| self.multiplier.as_slice())
    }

    fn prepare(&mut self, quadrature: &QuadratureSet) -> Result<()> {
        let key = (
            quadrature.count(),
            quadrature.domain_length().to_bits(),
            quadrature.cutoff_radius().to_bits(),
        );
        if self.key == Some(key) {
            return Ok(());
        }
        let mass = quadrature.total_weight();
        if quadrature.is_empty() || mass <= 0.0 {
            return Err(Error::Evaluator(
                "quadrature set carries no positive weight".to_string(),
            ));
        }

        let n = self.dim.get();
        let wavenumber = 2.0 * PI / quadrature.domain_length();
        for j in 0..n {
            let kx = wavenumber * signed_frequency(j, n);
            for k in 0..n {
                let ky = wavenumber * signed_frequency(k, n);
                let m: f64 = quadrature
                    .nodes()
                    .iter()
                    .zip(quadrature.weights())
                    .map(|([vx, vy], w)| w * (kx * vx + ky * vy).cos())
                    .sum();
                self.multiplier[self.dim.idx(j, k)] = m / mass - 1.0;
            }
        }
        // the zero mode is conserved exactly
        self.multiplier[0] = 0.0;
        self.key = Some(key);
        debug!(dim = n, nodes = quadrature.len(), "built relaxation multiplier");
        Ok(())
    }
}

impl Drop for RelaxationWorkspace {
    fn drop(&mut self) {
        trace!(dim = self.dim.get(), "releasing collision workspace");
    }
}

/// Frequency of FFT bin `i`, in `(-N/2, N/2]`.
fn signed_frequency(i: usize, n: usize) -> f64 {
    if i <= n / 2 {
        i as f64
    } else {
        i as f64 - n as f64
    }
}

impl CollisionEvaluator for RelaxationEvaluator {
    type Quadrature = QuadratureSet;
    type Workspace = RelaxationWorkspace;

    fn create_workspace(&self, dim: GridDim) -> Result<RelaxationWorkspace> {
        Ok(RelaxationWorkspace {
            dim,
            multiplier: try_alloc(dim.cells(), 0.0, "collision workspace")?,
            key: None,
        })
    }

    fn evaluate(
        &self,
        spectrum: &SpectrumBundle,
        quadrature: &QuadratureSet,
        workspace: &mut RelaxationWorkspace,
    ) -> Result<SpectrumBundle> {
        if spectrum.dim() != workspace.dim {
            return Err(Error::ShapeMismatch {
                expected: workspace.dim.get(),
                found: spectrum.dim().get(),
            });
        }
        workspace.prepare(quadrature)?;

        let multiplier = &workspace.multiplier;
        SpectrumBundle::try_from_fn(|c| {
            let input = spectrum.component(c).as_slice();
            let data = input
                .iter()
                .zip(multiplier)
                .map(|(z, m)| *z * *m)
                .collect();
            ComplexGrid::from_vec(spectrum.dim(), data)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Component, RealGrid, SampleBundle};
    use crate::quadrature::PolarQuadrature;
    use crate::spectral::SpectralTransform;
    use crate::traits::QuadratureProvider;

    fn spectrum(dim: GridDim) -> SpectrumBundle {
        let samples = SampleBundle::try_from_fn(|c| {
            let shift = c.index() as f64;
            Ok(RealGrid::from_fn(dim, |row, col| {
                (0.4 * row as f64 + shift).cos() * (0.9 * col as f64 - shift).sin() + 0.5
            }))
        })
        .unwrap();
        SpectralTransform::new(dim).reconstruct_bundle(&samples).unwrap()
    }

    #[test]
    fn evaluation_conserves_zero_mode_and_shape() {
        let dim = GridDim::new(8).unwrap();
        let quad = PolarQuadrature.build(8, 12.0, 7.5).unwrap();
        let evaluator = RelaxationEvaluator;
        let mut ws = evaluator.create_workspace(dim).unwrap();
        let input = spectrum(dim);
        let output = evaluator.evaluate(&input, &quad, &mut ws).unwrap();
        assert_eq!(output.dim(), input.dim());
        for c in Component::ALL {
            assert_eq!(output.component(c)[(0, 0)].norm(), 0.0);
        }
    }

    #[test]
    fn evaluation_preserves_hermitian_symmetry() {
        let dim = GridDim::new(8).unwrap();
        let quad = PolarQuadrature.build(12, 12.0, 7.5).unwrap();
        let evaluator = RelaxationEvaluator;
        let mut ws = evaluator.create_workspace(dim).unwrap();
        let output = evaluator.evaluate(&spectrum(dim), &quad, &mut ws).unwrap();
        let n = dim.get();
        for (_, grid) in output.iter() {
            for j in 0..n {
                for k in 0..n {
                    let mirrored = grid[(dim.comp(j), dim.comp(k))].conj();
                    assert!((grid[(j, k)] - mirrored).norm() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn repeated_evaluation_is_deterministic() {
        let dim = GridDim::new(8).unwrap();
        let quad = PolarQuadrature.build(8, 12.0, 7.5).unwrap();
        let evaluator = RelaxationEvaluator;
        let mut ws = evaluator.create_workspace(dim).unwrap();
        let input = spectrum(dim);
        let first = evaluator.evaluate(&input, &quad, &mut ws).unwrap();
        let second = evaluator.evaluate(&input, &quad, &mut ws).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn workspace_rebuilds_multiplier_for_new_quadrature() {
        let dim = GridDim::new(6).unwrap();
        let evaluator = RelaxationEvaluator;
        let mut ws = evaluator.create_workspace(dim).unwrap();
        assert!(ws.multiplier().is_none());
        let input = spectrum(dim);

        let narrow = PolarQuadrature.build(8, 12.0, 1.0).unwrap();
        evaluator.evaluate(&input, &narrow, &mut ws).unwrap();
        let first = ws.multiplier().unwrap().to_vec();

        let wide = PolarQuadrature.build(8, 12.0, 7.5).unwrap();
        evaluator.evaluate(&input, &wide, &mut ws).unwrap();
        assert_ne!(ws.multiplier().unwrap(), first.as_slice());
    }

    #[test]
    fn rebuilt_quadrature_reuses_cached_multiplier() {
        let dim = GridDim::new(6).unwrap();
        let evaluator = RelaxationEvaluator;
        let input = spectrum(dim);

        let mut cached = evaluator.create_workspace(dim).unwrap();
        let first = PolarQuadrature.build(8, 12.0, 7.5).unwrap();
        evaluator.evaluate(&input, &first, &mut cached).unwrap();
        drop(first);

        // same parameters always yield the same nodes and weights
        let rebuilt = PolarQuadrature.build(8, 12.0, 7.5).unwrap();
        let from_cache = evaluator.evaluate(&input, &rebuilt, &mut cached).unwrap();

        let mut fresh = evaluator.create_workspace(dim).unwrap();
        let from_scratch = evaluator.evaluate(&input, &rebuilt, &mut fresh).unwrap();
        assert_eq!(from_cache, from_scratch);
        assert_eq!(cached.multiplier(), fresh.multiplier());
    }

    #[test]
    fn evaluation_rejects_mismatched_workspace() {
        let evaluator = RelaxationEvaluator;
        let quad = PolarQuadrature.build(8, 12.0, 7.5).unwrap();
        let mut ws = evaluator.create_workspace(GridDim::new(6).unwrap()).unwrap();
        let input = spectrum(GridDim::new(8).unwrap());
        assert!(matches!(
            evaluator.evaluate(&input, &quad, &mut ws),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
