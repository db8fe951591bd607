//! Square sample grids and the fixed four-component bundle.
//!
//! Every grid in a run is `N x N`, stored row-major. Symmetry lookups use the
//! complementary index `comp(i) = (N - i) mod N`.

use crate::error::{Error, Result};
use num_complex::Complex64;
use std::ops::{Index, IndexMut};

/// Smallest grid dimension accepted by the spectral scheme.
pub const MIN_GRID_DIM: usize = 4;

/// Number of independent components of the matrix-valued field.
pub const COMPONENTS: usize = 4;

/// Validated grid dimension `N`: even and not too small.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridDim(usize);

impl GridDim {
    pub fn new(n: usize) -> Result<Self> {
        if n < MIN_GRID_DIM {
            return Err(Error::InvalidDimension {
                dim: n,
                reason: "grid dimension is too small for the spectral scheme",
            });
        }
        if n % 2 != 0 {
            return Err(Error::InvalidDimension {
                dim: n,
                reason: "grid dimension must be even",
            });
        }
        // the largest buffer is N*N complex values of 16 bytes each
        if n.checked_mul(n).and_then(|cells| cells.checked_mul(16)).is_none() {
            return Err(Error::InvalidDimension {
                dim: n,
                reason: "grid of N*N complex cells does not fit in memory addressing",
            });
        }
        Ok(Self(n))
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// Total number of cells, `N * N`.
    pub fn cells(self) -> usize {
        self.0 * self.0
    }

    /// Columns kept by a real-to-complex transform, `N/2 + 1`.
    pub fn half_cols(self) -> usize {
        self.0 / 2 + 1
    }

    /// Complementary index `(N - i) mod N`.
    pub fn comp(self, i: usize) -> usize {
        (self.0 - i % self.0) % self.0
    }

    /// Row-major linear index `N * row + col`.
    pub fn idx(self, row: usize, col: usize) -> usize {
        self.0 * row + col
    }
}

/// Allocates `len` copies of `value`, reporting exhaustion as an error at
/// the caller's location.
#[track_caller]
pub(crate) fn try_alloc<T: Clone>(len: usize, value: T, what: &'static str) -> Result<Vec<T>> {
    let mut data = Vec::new();
    if data.try_reserve_exact(len).is_err() {
        return Err(Error::allocation("reserve buffer", what, len));
    }
    data.resize(len, value);
    Ok(data)
}

/// One `N x N` row-major grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    dim: GridDim,
    data: Vec<T>,
}

pub type RealGrid = Grid<f64>;
pub type ComplexGrid = Grid<Complex64>;

impl<T: Clone> Grid<T> {
    #[track_caller]
    pub fn filled(dim: GridDim, value: T) -> Result<Self> {
        Ok(Self {
            dim,
            data: try_alloc(dim.cells(), value, "grid")?,
        })
    }
}

impl<T> Grid<T> {
    /// Takes ownership of exactly `N * N` row-major samples.
    pub fn from_vec(dim: GridDim, data: Vec<T>) -> Result<Self> {
        if data.len() != dim.cells() {
            return Err(Error::ShapeMismatch {
                expected: dim.cells(),
                found: data.len(),
            });
        }
        Ok(Self { dim, data })
    }

    /// Builds a grid by evaluating `f(row, col)` at every cell.
    pub fn from_fn(dim: GridDim, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let n = dim.get();
        let mut data = Vec::with_capacity(dim.cells());
        for row in 0..n {
            for col in 0..n {
                data.push(f(row, col));
            }
        }
        Self { dim, data }
    }

    pub fn dim(&self) -> GridDim {
        self.dim
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        let n = self.dim.get();
        if row >= n || col >= n {
            return None;
        }
        self.data.get(self.dim.idx(row, col))
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut T> {
        let n = self.dim.get();
        if row >= n || col >= n {
            return None;
        }
        let i = self.dim.idx(row, col);
        self.data.get_mut(i)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'_, T> {
        self.data.chunks_exact(self.dim.get())
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        &self.data[self.dim.idx(row, col)]
    }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        let i = self.dim.idx(row, col);
        &mut self.data[i]
    }
}

/// Slot of the four-component bundle. The physical meaning of each slot is
/// left to the collision kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    C0,
    C1,
    C2,
    C3,
}

impl Component {
    pub const ALL: [Component; COMPONENTS] =
        [Component::C0, Component::C1, Component::C2, Component::C3];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }
}

/// Exactly four same-shaped grids: the unit of exchange at every boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle<T> {
    comp: [Grid<T>; COMPONENTS],
}

/// Real phase-space samples of all four components.
pub type SampleBundle = Bundle<f64>;
/// Full complex spectra of all four components.
pub type SpectrumBundle = Bundle<Complex64>;

impl<T> Bundle<T> {
    pub fn new(comp: [Grid<T>; COMPONENTS]) -> Result<Self> {
        let expected = comp[0].dim().get();
        for grid in &comp[1..] {
            if grid.dim().get() != expected {
                return Err(Error::ShapeMismatch {
                    expected,
                    found: grid.dim().get(),
                });
            }
        }
        Ok(Self { comp })
    }

    /// Builds each component with `f`, failing on the first error.
    pub fn try_from_fn(mut f: impl FnMut(Component) -> Result<Grid<T>>) -> Result<Self> {
        let [a, b, c, d] = Component::ALL;
        Self::new([f(a)?, f(b)?, f(c)?, f(d)?])
    }

    pub fn dim(&self) -> GridDim {
        self.comp[0].dim()
    }

    pub fn component(&self, c: Component) -> &Grid<T> {
        &self.comp[c.index()]
    }

    pub fn component_mut(&mut self, c: Component) -> &mut Grid<T> {
        &mut self.comp[c.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Component, &Grid<T>)> {
        Component::ALL.into_iter().zip(self.comp.iter())
    }

    pub fn into_components(self) -> [Grid<T>; COMPONENTS] {
        self.comp
    }
}
