// Configuration
pub use crate::config::{
    DEFAULT_MAX_WINDOW, DEFAULT_MIN_WINDOW, FilterConfig, GPU_MAX_WINDOW, Halo, Strategy,
    WindowSize,
};

// Error handling
pub use crate::error::{Error, Result};

// Raster types and I/O
pub use crate::padding::PaddedRaster;
pub use crate::raster::{Raster, SUPPORTED_EXTENSIONS, read_pnm, write_pnm};

// Estimator
pub use crate::estimator::{Decision, Estimate, Estimator, estimate, fill_rows};

// Filtering
pub use crate::filter::{AdaptiveMedianFilter, filter};
pub use crate::noise::add_salt_and_pepper;

// Backends
pub use crate::backend::distributed::{
    ChannelCommunicator, Communicator, Message, ROOT, run_root, run_worker,
};
pub use crate::backend::{
    Decomposition, Distributed, RowParallel, Sequential, select_backend,
};

// GPU
#[cfg(feature = "wgpu")]
pub use crate::backend::gpu::{Gpu, GpuMedian};
