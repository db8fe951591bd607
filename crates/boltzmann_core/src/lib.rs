pub mod collision;
pub mod config;
pub mod error;
pub mod grid;
pub mod io;
pub mod pipeline;
pub mod quadrature;
pub mod spectral;
/// The `boltzmann_core` crate verifies spectral evaluations of the conservative
/// collision operator of the matrix-valued quantum Boltzmann equation.
///
/// Key components:
/// - **Grid**: square row-major grids and the fixed four-component `Bundle`.
/// - **Spectral**: real-to-complex 2D transform (scaled by `1/N^2`) and the
///   Hermitian expansion to the full spectrum.
/// - **Traits**: `QuadratureProvider` and `CollisionEvaluator`, the seams where
///   a numerical backend plugs in. `collision` and `quadrature` hold the
///   built-in backend.
/// - **Validation**: overflow-safe complex magnitude and cumulative/relative
///   error against reference data.
/// - **Pipeline**: the load → transform → evaluate → compare driver.
pub mod traits;
pub mod validation;

pub use error::{Error, Result};
