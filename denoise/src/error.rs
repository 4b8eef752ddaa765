//! Error types for filtering and raster I/O.

use std::io;

use thiserror::Error;

/// Errors that can occur while reading, filtering or writing rasters.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Wrong magic, garbled header, truncated payload or inconsistent buffer size.
    #[error("Malformed raster: {0}")]
    MalformedRaster(String),

    #[error("Invalid filter configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Image codec error: {0}")]
    Codec(#[from] image::ImageError),

    /// A rank failed to deliver or receive its rows. Fatal to the whole pass.
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("GPU context not available")]
    NoGpu,
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::InvalidConfig("min_window must be odd".into()).to_string(),
            "Invalid filter configuration: min_window must be odd"
        );
        assert_eq!(
            Error::Transport("rank 2 disconnected".into()).to_string(),
            "Transport failure: rank 2 disconnected"
        );
        assert_eq!(Error::NoGpu.to_string(), "GPU context not available");
    }

    #[test]
    fn test_io_error_converts() {
        let err: Error = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
        assert!(matches!(err, Error::Io(_)));
    }
}
