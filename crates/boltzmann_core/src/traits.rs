use crate::error::Result;
use crate::grid::{GridDim, SpectrumBundle};

/// Builds the integration rule consumed by a collision evaluator.
///
/// The returned set is opaque to the pipeline; dropping it releases it.
pub trait QuadratureProvider {
    type Set;

    /// count: number of nodes per direction, above the scheme's stability floor
    /// domain_length: side length of the periodic domain
    /// cutoff_radius: momentum cutoff of the integration region
    fn build(&self, count: usize, domain_length: f64, cutoff_radius: f64) -> Result<Self::Set>;
}

/// Evaluates the collision operator on a four-component spectrum.
///
/// Evaluators are treated as non-reentrant: a workspace is borrowed mutably
/// for the duration of each call.
pub trait CollisionEvaluator {
    type Quadrature;
    type Workspace;

    /// Creates the intermediate workspace. Dropping it releases it.
    fn create_workspace(&self, dim: GridDim) -> Result<Self::Workspace>;

    /// Must be deterministic and return a bundle shaped like `spectrum`.
    fn evaluate(
        &self,
        spectrum: &SpectrumBundle,
        quadrature: &Self::Quadrature,
        workspace: &mut Self::Workspace,
    ) -> Result<SpectrumBundle>;
}
