use std::sync::mpsc;

use wgpu::util::DeviceExt;

use super::Gpu;
use super::pipeline::MedianPipeline;
use crate::config::WindowSize;
use crate::error::{Error, Result};
use crate::padding::PaddedRaster;

const WORKGROUP_SIZE: u32 = 16;

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Params {
    width: u32,
    height: u32,
    border: u32,
    stride: u32,
    min_window: u32,
    max_window: u32,
    _padding: [u32; 2],
}

/// Uploads `padded`, runs the kernel over every interior pixel and downloads the result.
pub(super) fn apply(
    ctx: &Gpu,
    pipeline: &MedianPipeline,
    padded: &PaddedRaster,
    window: WindowSize,
) -> Result<Vec<u8>> {
    let device = ctx.device();
    let queue = ctx.queue();

    let width = to_u32(padded.width(), "width")?;
    let height = to_u32(padded.height(), "height")?;

    let input: Vec<u32> = padded.data().iter().map(|&v| u32::from(v)).collect();
    let input_size = (input.len() * size_of::<u32>()) as u64;
    let output_size = (padded.width() * padded.height() * size_of::<u32>()) as u64;

    let max_binding = u64::from(device.limits().max_storage_buffer_binding_size);
    if input_size > max_binding || output_size > max_binding {
        return Err(Error::Gpu(format!(
            "plane of {}x{} exceeds storage binding limit of {} bytes",
            width, height, max_binding
        )));
    }

    let params = Params {
        width,
        height,
        border: to_u32(padded.border(), "border")?,
        stride: to_u32(padded.stride(), "stride")?,
        min_window: to_u32(window.min, "min_window")?,
        max_window: to_u32(window.max, "max_window")?,
        _padding: [0; 2],
    };

    let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("adaptive_median_params_buffer"),
        contents: bytemuck::cast_slice(&[params]),
        usage: wgpu::BufferUsages::UNIFORM,
    });

    let input_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("adaptive_median_input_buffer"),
        contents: bytemuck::cast_slice(&input),
        usage: wgpu::BufferUsages::STORAGE,
    });

    let output_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("adaptive_median_output_buffer"),
        size: output_size,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });

    let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("adaptive_median_staging_buffer"),
        size: output_size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("adaptive_median_bind_group"),
        layout: &pipeline.bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: input_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: output_buffer.as_entire_binding(),
            },
        ],
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("adaptive_median_encoder"),
    });

    {
        let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("adaptive_median_pass"),
            timestamp_writes: None,
        });
        compute_pass.set_pipeline(&pipeline.compute_pipeline);
        compute_pass.set_bind_group(0, &bind_group, &[]);
        compute_pass.dispatch_workgroups(
            width.div_ceil(WORKGROUP_SIZE),
            height.div_ceil(WORKGROUP_SIZE),
            1,
        );
    }

    encoder.copy_buffer_to_buffer(&output_buffer, 0, &staging_buffer, 0, output_size);
    queue.submit(std::iter::once(encoder.finish()));

    let buffer_slice = staging_buffer.slice(..);
    let (tx, rx) = mpsc::channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });

    ctx.wait()?;

    rx.recv()
        .map_err(|_| Error::Gpu("buffer map callback dropped".to_string()))?
        .map_err(|e| Error::Gpu(format!("failed to map output buffer: {}", e)))?;

    let mapped = buffer_slice.get_mapped_range();
    let output = mapped
        .chunks_exact(size_of::<u32>())
        .map(|word| u32::from_le_bytes([word[0], word[1], word[2], word[3]]) as u8)
        .collect();
    drop(mapped);
    staging_buffer.unmap();

    Ok(output)
}

fn to_u32(value: usize, name: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::Gpu(format!("{} {} exceeds u32", name, value)))
}
