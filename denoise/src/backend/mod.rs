//! Interchangeable work decompositions.
//!
//! Every backend maps the same [`estimator`](crate::estimator) over the interior
//! coordinates of a [`PaddedRaster`]; they differ only in how rows or pixels are
//! handed out and how partial results are assembled.

pub mod distributed;
#[cfg(feature = "wgpu")]
pub mod gpu;
mod row_parallel;
mod sequential;

pub use distributed::Distributed;
#[cfg(feature = "wgpu")]
pub use gpu::GpuMedian;
pub use row_parallel::RowParallel;
pub use sequential::Sequential;

use crate::config::{FilterConfig, Strategy};
#[cfg(feature = "wgpu")]
use crate::config::GPU_MAX_WINDOW;
use crate::config::WindowSize;
use crate::error::{Error, Result};
use crate::padding::PaddedRaster;

/// Work decomposition over the interior of a padded plane.
pub trait Decomposition: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Filters every interior pixel of `padded` exactly once.
    ///
    /// Returns `padded.width() * padded.height()` samples, row-major.
    fn run(&self, padded: &PaddedRaster, window: WindowSize) -> Result<Vec<u8>>;
}

/// Builds the backend for `config.strategy`.
///
/// `Strategy::Auto` prefers the GPU when an adapter is available and the window
/// fits the kernel, and falls back to the row-parallel CPU backend otherwise.
/// An explicit `Strategy::Gpu` without an adapter is an error.
pub fn select_backend(config: &FilterConfig) -> Result<Box<dyn Decomposition>> {
    match config.strategy {
        Strategy::Sequential => Ok(Box::new(Sequential)),
        Strategy::Threaded { threads } => Ok(Box::new(RowParallel::new(threads)?)),
        Strategy::Distributed { ranks, halo } => Ok(Box::new(Distributed::new(ranks, halo)?)),
        Strategy::Gpu => gpu_backend(),
        Strategy::Auto => auto_backend(config.window),
    }
}

#[cfg(feature = "wgpu")]
fn gpu_backend() -> Result<Box<dyn Decomposition>> {
    Ok(Box::new(GpuMedian::new()?))
}

#[cfg(not(feature = "wgpu"))]
fn gpu_backend() -> Result<Box<dyn Decomposition>> {
    Err(Error::NoGpu)
}

#[cfg(feature = "wgpu")]
fn auto_backend(window: WindowSize) -> Result<Box<dyn Decomposition>> {
    if window.max > GPU_MAX_WINDOW {
        tracing::debug!(
            max_window = window.max,
            "Window exceeds GPU capacity, using CPU backend"
        );
        return Ok(Box::new(RowParallel::new(0)?));
    }

    match GpuMedian::new() {
        Ok(gpu) => Ok(Box::new(gpu)),
        Err(e) => {
            tracing::warn!("GPU unavailable, falling back to CPU: {}", e);
            Ok(Box::new(RowParallel::new(0)?))
        }
    }
}

#[cfg(not(feature = "wgpu"))]
fn auto_backend(_window: WindowSize) -> Result<Box<dyn Decomposition>> {
    Ok(Box::new(RowParallel::new(0)?))
}

/// Rejects a backend result that does not cover the interior exactly.
pub(crate) fn check_output(backend: &str, padded: &PaddedRaster, output: &[u8]) -> Result<()> {
    let expected = padded.width() * padded.height();
    if output.len() != expected {
        return Err(Error::MalformedRaster(format!(
            "{} backend produced {} samples, expected {}",
            backend,
            output.len(),
            expected
        )));
    }
    Ok(())
}
