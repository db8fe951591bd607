//! Parameters of one collision-operator test run.

use crate::error::{Error, Result};
use crate::grid::GridDim;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Grid dimension N of every sample and spectrum.
    pub grid_dim: usize,
    /// Quadrature node count per direction.
    pub quadrature_count: usize,
    /// Side length L of the periodic domain.
    pub domain_length: f64,
    /// Momentum cutoff R.
    pub cutoff_radius: f64,
    pub data_dir: PathBuf,
    /// File name of the raw samples, `{}` stands for the component index.
    pub sample_pattern: String,
    /// File name of the reference spectra, `{}` stands for the component index.
    pub reference_pattern: String,
    pub tolerance: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            grid_dim: 48,
            quadrature_count: 48,
            domain_length: 12.0,
            cutoff_radius: 7.5,
            data_dir: PathBuf::from("../test/data"),
            sample_pattern: "W{}.dat".to_string(),
            reference_pattern: "Cc{}_ref.dat".to_string(),
            tolerance: 1e-6,
        }
    }
}

impl RunConfig {
    /// Reads a JSON file; keys that are absent keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text =
            std::fs::read_to_string(path).map_err(|e| Error::io(path, "read config file", e))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    pub fn grid(&self) -> Result<GridDim> {
        GridDim::new(self.grid_dim)
    }

    pub fn validate(&self) -> Result<()> {
        self.grid()?;
        if !(self.domain_length > 0.0 && self.domain_length.is_finite()) {
            return Err(Error::Config(format!(
                "domain_length must be positive, got {}",
                self.domain_length
            )));
        }
        if !(self.cutoff_radius > 0.0 && self.cutoff_radius.is_finite()) {
            return Err(Error::Config(format!(
                "cutoff_radius must be positive, got {}",
                self.cutoff_radius
            )));
        }
        if !(self.tolerance > 0.0) {
            return Err(Error::Config(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        for (name, pattern) in [
            ("sample_pattern", &self.sample_pattern),
            ("reference_pattern", &self.reference_pattern),
        ] {
            if !pattern.contains("{}") {
                return Err(Error::Config(format!(
                    "{name} '{pattern}' has no '{{}}' placeholder for the component index"
                )));
            }
        }
        Ok(())
    }
}
