use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error types for the mediahash library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Source could not be decoded into pixel data
    #[error("decode error: {0}")]
    Decode(#[from] image::ImageError),

    /// Buffer allocation failure inside a numeric kernel
    #[error("resource error: {0}")]
    Resource(String),

    /// Degenerate input not covered by the zero-area policy
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Incompatible shapes in a matrix operation; indicates a logic bug
    #[error("dimension mismatch: {left_rows}x{left_cols} against {right_rows}x{right_cols}")]
    DimensionMismatch {
        left_rows: usize,
        left_cols: usize,
        right_rows: usize,
        right_cols: usize,
    },

    /// Video container could not be opened or demuxed
    #[error("source error: {0}")]
    Source(String),
}
