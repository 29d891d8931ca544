/// Module containing the error types for wavkit
use thiserror::Error;

pub type WavkitResult<T> = Result<T, WavkitError>;

/// Error types for wavkit
#[derive(Error, Debug)]
pub enum WavkitError {
    /// The container is structurally malformed, or a format field is out of range.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    /// The container is valid but its audio encoding cannot be decoded.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Unsupported conversion from {from} channel(s) to {to} channel(s)")]
    UnsupportedConversion { from: u16, to: u16 },
    /// Every sample frame in the data chunk has already been read.
    #[error("End of sample data reached")]
    EndOfData,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "ndarray")]
    #[error("IO error with ndarray")]
    NdArray(#[from] ndarray::ShapeError),
}

impl WavkitError {
    pub fn invalid_format<S: Into<String>>(message: S) -> Self {
        WavkitError::InvalidFormat(message.into())
    }

    pub fn unsupported_format<S: Into<String>>(message: S) -> Self {
        WavkitError::UnsupportedFormat(message.into())
    }

    /// The error returned when a closed reader or writer is used again.
    pub(crate) fn closed_stream() -> Self {
        WavkitError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "stream is closed",
        ))
    }
}
