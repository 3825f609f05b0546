//! Error types for demflow

use thiserror::Error;

/// Main error type for demflow operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("grid is empty")]
    EmptyGrid,

    #[error("invalid grid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("row {row} has {got} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("cannot parse {value:?} on line {line}")]
    Parse { value: String, line: usize },

    #[error("missing input map: {0}")]
    MissingInput(&'static str),

    #[error("unknown {kind}: {value:?}")]
    UnknownOption { kind: &'static str, value: String },
}

/// Result type alias for demflow operations
pub type Result<T> = std::result::Result<T, Error>;
