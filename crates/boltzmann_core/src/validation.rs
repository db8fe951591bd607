//! Agreement between a computed spectrum bundle and stored reference data.

use crate::error::{Error, Result};
use crate::grid::{Bundle, Component};
use num_complex::{Complex, Complex64};
use num_traits::Float;
use serde::Serialize;
use std::fmt;

/// `|re + i im|` without squaring the larger part, so extreme ratios neither
/// overflow nor underflow.
pub fn complex_abs<T: Float>(re: T, im: T) -> T {
    let a = re.abs();
    let b = im.abs();
    if a < b {
        let q = a / b;
        b * (T::one() + q * q).sqrt()
    } else if a == T::zero() {
        T::zero()
    } else {
        let q = b / a;
        a * (T::one() + q * q).sqrt()
    }
}

pub fn magnitude<T: Float>(z: Complex<T>) -> T {
    complex_abs(z.re, z.im)
}

/// Cumulative error divided by cumulative reference norm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RelativeError {
    Defined(f64),
    /// The reference norm is zero.
    Undefined,
}

impl RelativeError {
    pub fn value(self) -> Option<f64> {
        match self {
            RelativeError::Defined(v) => Some(v),
            RelativeError::Undefined => None,
        }
    }
}

impl fmt::Display for RelativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelativeError::Defined(v) => write!(f, "{v:e}"),
            RelativeError::Undefined => f.write_str("undefined (zero reference norm)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Comparison {
    pub cumulative_error: f64,
    pub reference_norm: f64,
    pub relative_error: RelativeError,
}

impl Comparison {
    /// True when the relative error is defined and below `tolerance`.
    pub fn within(&self, tolerance: f64) -> bool {
        matches!(self.relative_error, RelativeError::Defined(v) if v < tolerance)
    }
}

/// Sums `|computed - reference|` and `|reference|` over all four components
/// and all cells.
pub fn compare(
    computed: &Bundle<Complex64>,
    reference: &Bundle<Complex64>,
) -> Result<Comparison> {
    if computed.dim() != reference.dim() {
        return Err(Error::ShapeMismatch {
            expected: reference.dim().get(),
            found: computed.dim().get(),
        });
    }

    let mut err = 0.0;
    let mut nrf = 0.0;
    for c in Component::ALL {
        let lhs = computed.component(c).as_slice();
        let rhs = reference.component(c).as_slice();
        for (z, r) in lhs.iter().zip(rhs) {
            err += magnitude(*z - *r);
            nrf += magnitude(*r);
        }
    }

    let relative_error = if nrf > 0.0 {
        RelativeError::Defined(err / nrf)
    } else {
        RelativeError::Undefined
    };
    Ok(Comparison {
        cumulative_error: err,
        reference_norm: nrf,
        relative_error,
    })
}

/// One cell of a bundle, addressed by component and row-major linear index.
pub fn probe<T: Copy>(bundle: &Bundle<T>, component: Component, index: usize) -> Option<T> {
    bundle.component(component).as_slice().get(index).copied()
}
