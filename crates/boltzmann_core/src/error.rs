use std::panic::Location;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised anywhere along the load → transform → evaluate → compare chain.
///
/// None of these are recovered internally; callers abort the run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{}: '{operation}' failed at {location}: {source}", .path.display())]
    Io {
        path: PathBuf,
        operation: &'static str,
        location: &'static Location<'static>,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "{}: '{operation}' failed at {location}: expected {expected} elements of {element_size} bytes, found {found} bytes",
        .path.display()
    )]
    ElementCount {
        path: PathBuf,
        operation: &'static str,
        location: &'static Location<'static>,
        element_size: usize,
        expected: usize,
        found: u64,
    },

    #[error("'{operation}' failed at {location}: cannot allocate {what} ({elements} elements)")]
    Allocation {
        what: &'static str,
        elements: usize,
        operation: &'static str,
        location: &'static Location<'static>,
    },

    #[error("invalid grid dimension {dim}: {reason}")]
    InvalidDimension { dim: usize, reason: &'static str },

    #[error("shape mismatch: expected grid dimension {expected}, got {found}")]
    ShapeMismatch { expected: usize, found: usize },

    #[error("quadrature: {0}")]
    Quadrature(String),

    #[error("collision evaluator: {0}")]
    Evaluator(String),

    #[error("configuration: {0}")]
    Config(String),
}

impl Error {
    /// Wraps an I/O failure, recording the caller's source location.
    #[track_caller]
    pub fn io(path: &Path, operation: &'static str, source: std::io::Error) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            operation,
            location: Location::caller(),
            source,
        }
    }

    /// A data file whose length does not match the expected element count.
    #[track_caller]
    pub fn element_count(
        path: &Path,
        operation: &'static str,
        element_size: usize,
        expected: usize,
        found: u64,
    ) -> Self {
        Error::ElementCount {
            path: path.to_path_buf(),
            operation,
            location: Location::caller(),
            element_size,
            expected,
            found,
        }
    }

    /// A buffer of `elements` entries that could not be obtained.
    #[track_caller]
    pub fn allocation(operation: &'static str, what: &'static str, elements: usize) -> Self {
        Error::Allocation {
            what,
            elements,
            operation,
            location: Location::caller(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_reports_path_operation_and_location() {
        let err = Error::io(
            Path::new("data/W0.dat"),
            "open sample file",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        let message = err.to_string();
        assert!(message.contains("data/W0.dat"));
        assert!(message.contains("open sample file"));
        assert!(message.contains("error.rs"));
    }

    #[test]
    fn element_count_error_is_distinct_from_io() {
        let err = Error::element_count(
            Path::new("Cc0_ref.dat"),
            "check data file length",
            16,
            4,
            48,
        );
        assert!(matches!(err, Error::ElementCount { .. }));
        let message = err.to_string();
        assert!(message.contains("expected 4 elements"));
        assert!(message.contains("check data file length"));
        assert!(message.contains("error.rs"));
    }

    #[test]
    fn allocation_error_reports_operation_and_location() {
        let err = Error::allocation("reserve buffer", "half spectrum", 1 << 20);
        let message = err.to_string();
        assert!(message.contains("reserve buffer"));
        assert!(message.contains("half spectrum"));
        assert!(message.contains("error.rs"));
    }
}
