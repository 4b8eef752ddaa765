mod io;
mod pnm;


use std::path::Path;

use crate::error::{Error, Result};

pub use pnm::{read_pnm, write_pnm};

/// Supported raster file extensions for reading and writing.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "pgm", "ppm", "pnm", "png", "jpg", "jpeg", "tiff", "tif", "bmp",
];

/// 8-bit raster with interleaved channels, rows stored top to bottom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<u8>,
}

impl Raster {
    /// Zero-filled raster.
    pub fn new_empty(width: usize, height: usize, channels: usize) -> Result<Raster> {
        validate_dims(width, height, channels)?;

        Ok(Raster {
            width,
            height,
            channels,
            data: vec![0; width * height * channels],
        })
    }

    pub fn new_with_data(
        width: usize,
        height: usize,
        channels: usize,
        data: Vec<u8>,
    ) -> Result<Raster> {
        validate_dims(width, height, channels)?;

        let expected = width * height * channels;
        if data.len() != expected {
            return Err(Error::MalformedRaster(format!(
                "buffer length {} does not match {}x{}x{} = {}",
                data.len(),
                width,
                height,
                channels,
                expected
            )));
        }

        Ok(Raster {
            width,
            height,
            channels,
            data,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn take_data(self) -> Vec<u8> {
        self.data
    }

    /// Sample at (row, col) of channel `channel`.
    #[inline]
    pub fn get(&self, row: usize, col: usize, channel: usize) -> u8 {
        debug_assert!(row < self.height && col < self.width && channel < self.channels);
        self.data[(row * self.width + col) * self.channels + channel]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, channel: usize, value: u8) {
        debug_assert!(row < self.height && col < self.width && channel < self.channels);
        self.data[(row * self.width + col) * self.channels + channel] = value;
    }

    /// Extracts one channel as a single-channel raster.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= self.channels()`.
    pub fn channel(&self, channel: usize) -> Raster {
        assert!(
            channel < self.channels,
            "channel {} out of range for {} channels",
            channel,
            self.channels
        );

        if self.channels == 1 {
            return self.clone();
        }

        let data = self
            .data
            .iter()
            .skip(channel)
            .step_by(self.channels)
            .copied()
            .collect();

        Raster {
            width: self.width,
            height: self.height,
            channels: 1,
            data,
        }
    }

    /// Interleaves single-channel planes of equal size into one raster.
    pub fn from_channels(planes: &[Raster]) -> Result<Raster> {
        let first = planes
            .first()
            .ok_or_else(|| Error::MalformedRaster("no channel planes given".to_string()))?;

        let (width, height) = (first.width, first.height);
        for plane in planes {
            if plane.channels != 1 || plane.width != width || plane.height != height {
                return Err(Error::MalformedRaster(format!(
                    "channel plane {}x{}x{} does not match {}x{}x1",
                    plane.width, plane.height, plane.channels, width, height
                )));
            }
        }

        if planes.len() == 1 {
            return Ok(first.clone());
        }

        let channels = planes.len();
        let mut data = vec![0u8; width * height * channels];
        for (c, plane) in planes.iter().enumerate() {
            for (pixel, &value) in plane.data.iter().enumerate() {
                data[pixel * channels + c] = value;
            }
        }

        Raster::new_with_data(width, height, channels, data)
    }

    pub fn read_file<P: AsRef<Path>>(filename: P) -> Result<Raster> {
        let filename = filename.as_ref();
        let extension = extension_of(filename)?;

        match extension.as_str() {
            "pgm" | "ppm" | "pnm" => io::load_pnm(filename),
            "png" | "jpeg" | "jpg" | "tiff" | "tif" | "bmp" => io::load_image(filename),

            _ => Err(Error::UnsupportedFormat(extension)),
        }
    }

    pub fn save_file<P: AsRef<Path>>(&self, filename: P) -> Result<()> {
        let filename = filename.as_ref();
        let extension = extension_of(filename)?;

        match extension.as_str() {
            "pgm" | "ppm" | "pnm" => io::save_pnm(self, filename),
            "png" => io::save_image(self, filename, image::ImageFormat::Png),
            "jpeg" | "jpg" => io::save_image(self, filename, image::ImageFormat::Jpeg),
            "tiff" | "tif" => io::save_image(self, filename, image::ImageFormat::Tiff),
            "bmp" => io::save_image(self, filename, image::ImageFormat::Bmp),

            _ => Err(Error::UnsupportedFormat(extension)),
        }
    }
}

fn validate_dims(width: usize, height: usize, channels: usize) -> Result<()> {
    if width == 0 || height == 0 || channels == 0 {
        return Err(Error::MalformedRaster(format!(
            "zero dimension {}x{}x{}",
            width, height, channels
        )));
    }
    Ok(())
}

fn extension_of(filename: &Path) -> Result<String> {
    filename
        .extension()
        .and_then(|os_str| os_str.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .ok_or_else(|| Error::UnsupportedFormat("missing extension".to_string()))
}
