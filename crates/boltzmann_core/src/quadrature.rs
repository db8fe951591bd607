//! Built-in polar quadrature on the momentum disk `|v| <= R`.

use crate::error::{Error, Result};
use crate::traits::QuadratureProvider;
use std::f64::consts::PI;
use tracing::trace;

/// Smallest node count per direction the scheme tolerates.
pub const MIN_QUADRATURE_COUNT: usize = 4;

/// Nodes and weights of one quadrature rule together with the domain it was
/// built for.
///
/// Fields are read-only once built: nodes and weights are a function of
/// `(count, domain_length, cutoff_radius)`, which collision workspaces use
/// as their cache key.
#[derive(Debug, Clone)]
pub struct QuadratureSet {
    count: usize,
    domain_length: f64,
    cutoff_radius: f64,
    nodes: Vec<[f64; 2]>,
    weights: Vec<f64>,
}

impl QuadratureSet {
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn domain_length(&self) -> f64 {
        self.domain_length
    }

    pub fn cutoff_radius(&self) -> f64 {
        self.cutoff_radius
    }

    pub fn nodes(&self) -> &[[f64; 2]] {
        &self.nodes
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }
}

impl Drop for QuadratureSet {
    fn drop(&mut self) {
        trace!(nodes = self.weights.len(), "releasing quadrature set");
    }
}

/// Midpoint rule in polar coordinates: `count` radial shells times `count`
/// angles, weights `r dr dtheta`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolarQuadrature;

impl QuadratureProvider for PolarQuadrature {
    type Set = QuadratureSet;

    fn build(&self, count: usize, domain_length: f64, cutoff_radius: f64) -> Result<QuadratureSet> {
        if count < MIN_QUADRATURE_COUNT {
            return Err(Error::Quadrature(format!(
                "node count {count} is below the stability floor {MIN_QUADRATURE_COUNT}"
            )));
        }
        if !(domain_length > 0.0 && domain_length.is_finite()) {
            return Err(Error::Quadrature(format!(
                "domain length must be positive, got {domain_length}"
            )));
        }
        if !(cutoff_radius > 0.0 && cutoff_radius.is_finite()) {
            return Err(Error::Quadrature(format!(
                "cutoff radius must be positive, got {cutoff_radius}"
            )));
        }

        let dr = cutoff_radius / count as f64;
        let dtheta = 2.0 * PI / count as f64;
        let mut nodes = Vec::with_capacity(count * count);
        let mut weights = Vec::with_capacity(count * count);
        for i in 0..count {
            let r = (i as f64 + 0.5) * dr;
            for m in 0..count {
                let theta = m as f64 * dtheta;
                nodes.push([r * theta.cos(), r * theta.sin()]);
                weights.push(r * dr * dtheta);
            }
        }

        Ok(QuadratureSet {
            count,
            domain_length,
            cutoff_radius,
            nodes,
            weights,
        })
    }
}
