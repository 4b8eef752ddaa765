//! wgpu compute backend, one invocation per output pixel.

mod kernel;
mod pipeline;

use std::sync::Arc;

pub use pipeline::MedianPipeline;

use super::Decomposition;
use crate::config::{GPU_MAX_WINDOW, WindowSize};
use crate::error::{Error, Result};
use crate::padding::PaddedRaster;

/// GPU context holding wgpu device and queue for compute operations.
#[derive(Debug, Clone)]
pub struct Gpu {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
}

impl Gpu {
    /// Creates a new GPU context, initializing wgpu with default settings.
    pub fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| Error::Gpu(format!("failed to find suitable GPU adapter: {}", e)))?;

        let (device, queue) =
            pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default()))
                .map_err(|e| Error::Gpu(format!("failed to create device: {}", e)))?;

        tracing::debug!(adapter = ?adapter.get_info().name, "GPU context created");

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Blocks until all submitted work has finished.
    pub fn wait(&self) -> Result<()> {
        self.device
            .poll(wgpu::PollType::Wait)
            .map_err(|e| Error::Gpu(format!("device poll failed: {}", e)))?;
        Ok(())
    }
}

/// Adaptive median on the GPU; windows up to [`GPU_MAX_WINDOW`].
#[derive(Debug)]
pub struct GpuMedian {
    ctx: Gpu,
    pipeline: MedianPipeline,
}

impl GpuMedian {
    pub fn new() -> Result<Self> {
        Ok(Self::with_context(Gpu::new()?))
    }

    pub fn with_context(ctx: Gpu) -> Self {
        let pipeline = MedianPipeline::new(&ctx);
        Self { ctx, pipeline }
    }

    pub fn context(&self) -> &Gpu {
        &self.ctx
    }
}

impl Decomposition for GpuMedian {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn run(&self, padded: &PaddedRaster, window: WindowSize) -> Result<Vec<u8>> {
        if window.max > GPU_MAX_WINDOW {
            return Err(Error::InvalidConfig(format!(
                "max_window {} exceeds GPU capacity {}",
                window.max, GPU_MAX_WINDOW
            )));
        }

        kernel::apply(&self.ctx, &self.pipeline, padded, window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Sequential;
    use crate::raster::Raster;

    fn gpu_or_skip() -> Option<GpuMedian> {
        match GpuMedian::new() {
            Ok(gpu) => Some(gpu),
            Err(e) => {
                eprintln!("Skipping test - no GPU available: {}", e);
                None
            }
        }
    }

    fn noisy_plane(width: usize, height: usize) -> Raster {
        let data = (0..width * height)
            .map(|i| match (i * 5) % 17 {
                0 => 0,
                3 => 255,
                _ => (30 + (i * 29) % 190) as u8,
            })
            .collect();
        Raster::new_with_data(width, height, 1, data).unwrap()
    }

    #[test]
    fn test_gpu_context_creation() {
        let result = Gpu::new();
        if let Err(e) = &result {
            eprintln!(
                "GPU context creation failed (expected on headless systems): {}",
                e
            );
        }
    }

    #[test]
    fn test_gpu_matches_sequential() {
        let Some(gpu) = gpu_or_skip() else { return };

        // Sizes that are not multiples of the 16x16 workgroup.
        for (width, height, window) in [
            (37, 21, WindowSize::new(3, 7)),
            (16, 16, WindowSize::new(3, 3)),
            (5, 40, WindowSize::new(1, 15)),
        ] {
            let padded = PaddedRaster::new(&noisy_plane(width, height), window.max).unwrap();
            let expected = Sequential.run(&padded, window).unwrap();
            assert_eq!(
                gpu.run(&padded, window).unwrap(),
                expected,
                "{width}x{height} {window:?}"
            );
        }
    }

    #[test]
    fn test_gpu_pipeline_reuse() {
        let Some(gpu) = gpu_or_skip() else { return };

        let window = WindowSize::new(3, 5);
        let padded = PaddedRaster::new(&noisy_plane(24, 24), window.max).unwrap();
        let first = gpu.run(&padded, window).unwrap();
        let second = gpu.run(&padded, window).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_gpu_rejects_oversized_window() {
        let Some(gpu) = gpu_or_skip() else { return };

        let window = WindowSize::new(3, GPU_MAX_WINDOW + 2);
        let padded = PaddedRaster::new(&noisy_plane(8, 8), window.max).unwrap();
        assert!(matches!(
            gpu.run(&padded, window),
            Err(Error::InvalidConfig(_))
        ));
    }
}
