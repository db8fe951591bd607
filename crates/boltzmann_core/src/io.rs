//! Flat binary sample files.
//!
//! Files carry no header: raw samples are `N*N` little-endian `f64` values,
//! reference spectra are `N*N` `(re, im)` pairs of `f64`.

use crate::error::{Error, Result};
use crate::grid::{
    Bundle, Component, ComplexGrid, Grid, GridDim, RealGrid, SampleBundle, SpectrumBundle,
};
use num_complex::Complex64;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const F64_SIZE: usize = std::mem::size_of::<f64>();
const COMPLEX_SIZE: usize = 2 * F64_SIZE;

/// Substitutes the component index for `{}` in `pattern` and joins it onto `dir`.
pub fn component_path(dir: &Path, pattern: &str, component: Component) -> PathBuf {
    dir.join(pattern.replace("{}", &component.index().to_string()))
}

/// Reads exactly `count` elements of `element_size` bytes as `f64` words.
///
/// A missing or unreadable file is an [`Error::Io`]; a file whose length is
/// not exactly `count * element_size` bytes is an [`Error::ElementCount`].
/// A byte size that cannot be represented is an [`Error::Allocation`].
pub fn read_data(path: &Path, element_size: usize, count: usize) -> Result<Vec<f64>> {
    let Some(expected_bytes) = element_size.checked_mul(count) else {
        return Err(Error::allocation(
            "compute expected file size",
            "file buffer",
            count,
        ));
    };
    let mut file = File::open(path).map_err(|e| Error::io(path, "open data file", e))?;
    let found = file
        .metadata()
        .map_err(|e| Error::io(path, "query file size", e))?
        .len();
    if found != expected_bytes as u64 || element_size % F64_SIZE != 0 {
        return Err(Error::element_count(
            path,
            "check data file length",
            element_size,
            count,
            found,
        ));
    }

    let mut bytes = Vec::new();
    if bytes.try_reserve_exact(expected_bytes).is_err() {
        return Err(Error::allocation(
            "reserve file buffer",
            "file buffer",
            expected_bytes,
        ));
    }
    file.read_to_end(&mut bytes)
        .map_err(|e| Error::io(path, "read data file", e))?;
    if bytes.len() != expected_bytes {
        // file changed size between the length check and the read
        return Err(Error::element_count(
            path,
            "read data file",
            element_size,
            count,
            bytes.len() as u64,
        ));
    }

    Ok(bytes
        .chunks_exact(F64_SIZE)
        .map(|chunk| {
            let mut word = [0u8; F64_SIZE];
            word.copy_from_slice(chunk);
            f64::from_le_bytes(word)
        })
        .collect())
}

pub fn read_real_grid(path: &Path, dim: GridDim) -> Result<RealGrid> {
    let data = read_data(path, F64_SIZE, dim.cells())?;
    Grid::from_vec(dim, data)
}

pub fn read_complex_grid(path: &Path, dim: GridDim) -> Result<ComplexGrid> {
    let words = read_data(path, COMPLEX_SIZE, dim.cells())?;
    let data = words
        .chunks_exact(2)
        .map(|pair| Complex64::new(pair[0], pair[1]))
        .collect();
    Grid::from_vec(dim, data)
}

fn write_words(path: &Path, words: impl Iterator<Item = f64>) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io(path, "create data file", e))?;
    let mut writer = BufWriter::new(file);
    for w in words {
        writer
            .write_all(&w.to_le_bytes())
            .map_err(|e| Error::io(path, "write data file", e))?;
    }
    writer
        .flush()
        .map_err(|e| Error::io(path, "flush data file", e))
}

pub fn write_real_grid(path: &Path, grid: &RealGrid) -> Result<()> {
    write_words(path, grid.as_slice().iter().copied())
}

pub fn write_complex_grid(path: &Path, grid: &ComplexGrid) -> Result<()> {
    write_words(path, grid.as_slice().iter().flat_map(|z| [z.re, z.im]))
}

/// Loads the four raw sample components named by `pattern`.
pub fn load_samples(dir: &Path, pattern: &str, dim: GridDim) -> Result<SampleBundle> {
    Bundle::try_from_fn(|c| {
        let path = component_path(dir, pattern, c);
        debug!(path = %path.display(), "loading sample component");
        read_real_grid(&path, dim)
    })
}

/// Loads the four reference spectra named by `pattern`.
pub fn load_spectra(dir: &Path, pattern: &str, dim: GridDim) -> Result<SpectrumBundle> {
    Bundle::try_from_fn(|c| {
        let path = component_path(dir, pattern, c);
        debug!(path = %path.display(), "loading reference component");
        read_complex_grid(&path, dim)
    })
}

pub fn write_samples(dir: &Path, pattern: &str, samples: &SampleBundle) -> Result<()> {
    for (c, grid) in samples.iter() {
        write_real_grid(&component_path(dir, pattern, c), grid)?;
    }
    Ok(())
}

pub fn write_spectra(dir: &Path, pattern: &str, spectra: &SpectrumBundle) -> Result<()> {
    for (c, grid) in spectra.iter() {
        write_complex_grid(&component_path(dir, pattern, c), grid)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn component_path_substitutes_index() {
        let path = component_path(Path::new("data"), "Cc{}_ref.dat", Component::C2);
        assert_eq!(path, Path::new("data").join("Cc2_ref.dat"));
    }

    #[test]
    fn real_grid_survives_disk() {
        let dir = tempdir().unwrap();
        let dim = GridDim::new(4).unwrap();
        let grid = RealGrid::from_fn(dim, |r, c| r as f64 - 0.5 * c as f64);
        let path = dir.path().join("W0.dat");
        write_real_grid(&path, &grid).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 16 * 8);
        assert_eq!(read_real_grid(&path, dim).unwrap(), grid);
    }

    #[test]
    fn complex_grid_is_stored_as_interleaved_pairs() {
        let dir = tempdir().unwrap();
        let dim = GridDim::new(4).unwrap();
        let grid = ComplexGrid::from_fn(dim, |r, c| Complex64::new(r as f64, -(c as f64)));
        let path = dir.path().join("Cc0_ref.dat");
        write_complex_grid(&path, &grid).unwrap();

        let words = read_data(&path, F64_SIZE, 32).unwrap();
        assert_eq!(&words[..4], &[0.0, -0.0, 0.0, -1.0]);
        assert_eq!(read_complex_grid(&path, dim).unwrap(), grid);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let result = read_real_grid(&dir.path().join("W9.dat"), GridDim::new(4).unwrap());
        match result {
            Err(Error::Io { operation, .. }) => assert_eq!(operation, "open data file"),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn short_file_is_an_element_count_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("W0.dat");
        std::fs::write(&path, vec![0u8; 15 * 8 + 3]).unwrap();
        let err = read_real_grid(&path, GridDim::new(4).unwrap()).unwrap_err();
        match &err {
            Error::ElementCount {
                expected,
                found,
                operation,
                ..
            } => {
                assert_eq!(*expected, 16);
                assert_eq!(*found, 123);
                assert_eq!(*operation, "check data file length");
            }
            other => panic!("expected ElementCount error, got {other:?}"),
        }
        let message = err.to_string();
        assert!(message.contains("io.rs"), "{message}");
        assert!(message.contains("check data file length"));
        assert!(message.contains("W0.dat"));
    }

    #[test]
    fn unrepresentable_file_size_is_an_allocation_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("W0.dat");
        std::fs::write(&path, vec![0u8; 8]).unwrap();
        match read_data(&path, COMPLEX_SIZE, usize::MAX) {
            Err(err @ Error::Allocation { .. }) => {
                let message = err.to_string();
                assert!(message.contains("compute expected file size"));
                assert!(message.contains("io.rs"));
            }
            other => panic!("expected Allocation error, got {other:?}"),
        }
    }

    #[test]
    fn sample_file_read_as_spectrum_is_rejected() {
        let dir = tempdir().unwrap();
        let dim = GridDim::new(4).unwrap();
        let path = dir.path().join("W0.dat");
        write_real_grid(&path, &RealGrid::filled(dim, 1.0).unwrap()).unwrap();
        assert!(matches!(
            read_complex_grid(&path, dim),
            Err(Error::ElementCount { .. })
        ));
    }

    #[test]
    fn bundles_load_by_pattern() {
        let dir = tempdir().unwrap();
        let dim = GridDim::new(4).unwrap();
        let samples =
            SampleBundle::try_from_fn(|c| Ok(RealGrid::filled(dim, c.index() as f64)?)).unwrap();
        write_samples(dir.path(), "W{}.dat", &samples).unwrap();
        let loaded = load_samples(dir.path(), "W{}.dat", dim).unwrap();
        assert_eq!(loaded, samples);
        assert!(load_spectra(dir.path(), "Cc{}_ref.dat", dim).is_err());
    }
}
