#[cfg(test)]
mod tests;

use std::time::Instant;

use tracing::{debug, info};

use crate::backend::{Decomposition, check_output, select_backend};
use crate::config::{FilterConfig, WindowSize};
use crate::error::Result;
use crate::padding::PaddedRaster;
use crate::raster::Raster;

/// Adaptive median filter bound to one decomposition backend.
///
/// Channels are filtered independently: each is split into its own plane,
/// padded for the largest window, run through the backend and re-interleaved.
#[derive(Debug)]
pub struct AdaptiveMedianFilter {
    window: WindowSize,
    backend: Box<dyn Decomposition>,
}

impl AdaptiveMedianFilter {
    /// Validates `config` and builds its backend. No pixel work happens here.
    pub fn new(config: FilterConfig) -> Result<Self> {
        config.validate()?;
        let backend = select_backend(&config)?;

        debug!(
            strategy = %config.strategy,
            backend = backend.name(),
            "Filter backend selected"
        );

        Ok(Self {
            window: config.window,
            backend,
        })
    }

    /// Uses a caller-provided backend, e.g. a distributed run over a custom transport.
    pub fn with_backend(window: WindowSize, backend: Box<dyn Decomposition>) -> Result<Self> {
        window.validate()?;
        Ok(Self { window, backend })
    }

    pub fn window(&self) -> WindowSize {
        self.window
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Filters every channel of `source`; the result has the same dimensions.
    pub fn apply(&self, source: &Raster) -> Result<Raster> {
        let start = Instant::now();

        info!(
            width = source.width(),
            height = source.height(),
            channels = source.channels(),
            min_window = self.window.min,
            max_window = self.window.max,
            backend = self.backend.name(),
            "Filtering raster"
        );

        let planes = (0..source.channels())
            .map(|c| self.apply_plane(&source.channel(c), c))
            .collect::<Result<Vec<_>>>()?;
        let output = Raster::from_channels(&planes)?;

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Filtering finished"
        );

        Ok(output)
    }

    fn apply_plane(&self, plane: &Raster, channel: usize) -> Result<Raster> {
        let start = Instant::now();

        let padded = PaddedRaster::new(plane, self.window.max)?;
        let output = self.backend.run(&padded, self.window)?;
        check_output(self.backend.name(), &padded, &output)?;

        debug!(
            channel,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Filtered channel"
        );

        Raster::new_with_data(plane.width(), plane.height(), 1, output)
    }
}

/// Filters `source` with windows `min_window..=max_window` on the default backend.
pub fn filter(source: &Raster, min_window: usize, max_window: usize) -> Result<Raster> {
    AdaptiveMedianFilter::new(FilterConfig::new(min_window, max_window))?.apply(source)
}
