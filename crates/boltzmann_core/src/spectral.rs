//! Real-to-complex 2D transform and Hermitian expansion to the full spectrum.
//!
//! The forward transform is scaled by `1 / N^2`, so the stored spectrum is
//! directly usable by the collision kernel without a normalization pass.

use crate::error::{Error, Result};
use crate::grid::{try_alloc, ComplexGrid, GridDim, RealGrid, SampleBundle, SpectrumBundle};
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;
use tracing::debug;

/// Non-redundant output of a real-to-complex transform:
/// `N` rows by `N/2 + 1` columns, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct HalfSpectrum {
    dim: GridDim,
    data: Vec<Complex64>,
}

impl HalfSpectrum {
    pub fn dim(&self) -> GridDim {
        self.dim
    }

    /// Entry `(row, col)`, or `None` outside `N x (N/2 + 1)`.
    pub fn get(&self, row: usize, col: usize) -> Option<Complex64> {
        if row >= self.dim.get() || col >= self.dim.half_cols() {
            return None;
        }
        self.data.get(self.dim.half_cols() * row + col).copied()
    }

    // Callers keep row < N and col <= N/2.
    fn at(&self, row: usize, col: usize) -> Complex64 {
        self.data[self.dim.half_cols() * row + col]
    }

    pub fn as_slice(&self) -> &[Complex64] {
        &self.data
    }

    /// Expands to the full `N x N` spectrum using conjugate symmetry.
    ///
    /// Columns `0..=N/2` are copied; column `k > N/2` of row `j` is the
    /// conjugate of entry `(comp(j), N - k)`.
    pub fn expand(&self) -> Result<ComplexGrid> {
        let dim = self.dim;
        let n = dim.get();
        let mut full = ComplexGrid::filled(dim, Complex64::default())?;
        for j in 0..n {
            let jc = dim.comp(j);
            for k in 0..=n / 2 {
                full[(j, k)] = self.at(j, k);
            }
            for k in n / 2 + 1..n {
                let kc = n - k;
                full[(j, k)] = self.at(jc, kc).conj();
            }
        }
        Ok(full)
    }
}

/// Planned transform for one grid dimension, reused across components.
pub struct SpectralTransform {
    dim: GridDim,
    fft: Arc<dyn Fft<f64>>,
}

impl SpectralTransform {
    pub fn new(dim: GridDim) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(dim.get());
        Self { dim, fft }
    }

    pub fn dim(&self) -> GridDim {
        self.dim
    }

    /// Computes the scaled half spectrum of one real grid.
    pub fn forward_half(&self, grid: &RealGrid) -> Result<HalfSpectrum> {
        if grid.dim() != self.dim {
            return Err(Error::ShapeMismatch {
                expected: self.dim.get(),
                found: grid.dim().get(),
            });
        }
        let n = self.dim.get();
        let h = self.dim.half_cols();
        let zero = Complex64::default();

        let mut data = try_alloc(n * h, zero, "half spectrum")?;
        let mut line = try_alloc(n, zero, "transform line")?;
        let mut scratch = try_alloc(self.fft.get_inplace_scratch_len(), zero, "transform scratch")?;

        // transform each row, keeping the non-negative frequencies
        for (row, samples) in grid.rows().enumerate() {
            for (dst, &x) in line.iter_mut().zip(samples) {
                *dst = Complex64::new(x, 0.0);
            }
            self.fft.process_with_scratch(&mut line, &mut scratch);
            data[row * h..(row + 1) * h].copy_from_slice(&line[..h]);
        }

        // then each kept column
        let scale = 1.0 / self.dim.cells() as f64;
        for col in 0..h {
            for row in 0..n {
                line[row] = data[row * h + col];
            }
            self.fft.process_with_scratch(&mut line, &mut scratch);
            for row in 0..n {
                data[row * h + col] = line[row] * scale;
            }
        }

        Ok(HalfSpectrum {
            dim: self.dim,
            data,
        })
    }

    /// Full `N x N` spectrum of one real grid. The half-spectrum scratch is
    /// dropped before returning.
    pub fn reconstruct(&self, grid: &RealGrid) -> Result<ComplexGrid> {
        let half = self.forward_half(grid)?;
        half.expand()
    }

    /// Reconstructs all four components, stopping at the first failure.
    pub fn reconstruct_bundle(&self, samples: &SampleBundle) -> Result<SpectrumBundle> {
        SpectrumBundle::try_from_fn(|c| {
            debug!(component = c.index(), "reconstructing spectrum");
            self.reconstruct(samples.component(c))
        })
    }
}

/// `sum |F|^2` over the full spectrum.
pub fn spectral_energy(spectrum: &ComplexGrid) -> f64 {
    spectrum.as_slice().iter().map(|z| z.norm_sqr()).sum()
}

/// `sum x^2 / N^2`, which equals [`spectral_energy`] of the scaled transform.
pub fn spatial_energy(grid: &RealGrid) -> f64 {
    let sum: f64 = grid.as_slice().iter().map(|x| x * x).sum();
    sum / grid.dim().cells() as f64
}
