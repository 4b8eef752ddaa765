use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use image as image_lib;

use super::{Raster, pnm};
use crate::error::{Error, Result};

pub(crate) fn load_pnm(filename: &Path) -> Result<Raster> {
    let file = File::open(filename)?;
    pnm::read_pnm(BufReader::new(file))
}

pub(crate) fn save_pnm(raster: &Raster, filename: &Path) -> Result<()> {
    let file = File::create(filename)?;
    pnm::write_pnm(raster, BufWriter::new(file))
}

/// Grayscale images load as one channel, everything else as RGB with alpha dropped.
pub(crate) fn load_image(filename: &Path) -> Result<Raster> {
    let img = image_lib::open(filename)?;

    let width = img.width() as usize;
    let height = img.height() as usize;

    match img.color() {
        image_lib::ColorType::L8 | image_lib::ColorType::L16 | image_lib::ColorType::La8
        | image_lib::ColorType::La16 => {
            Raster::new_with_data(width, height, 1, img.into_luma8().into_raw())
        }
        _ => Raster::new_with_data(width, height, 3, img.into_rgb8().into_raw()),
    }
}

pub(crate) fn save_image(
    raster: &Raster,
    filename: &Path,
    format: image_lib::ImageFormat,
) -> Result<()> {
    let color_type = match raster.channels() {
        1 => image_lib::ColorType::L8,
        3 => image_lib::ColorType::Rgb8,
        4 if format != image_lib::ImageFormat::Jpeg => image_lib::ColorType::Rgba8,
        n => {
            return Err(Error::UnsupportedFormat(format!(
                "{:?} cannot store {} channels",
                format, n
            )));
        }
    };

    image_lib::save_buffer_with_format(
        filename,
        raster.data(),
        image_dimension(raster.width(), "width")?,
        image_dimension(raster.height(), "height")?,
        color_type,
        format,
    )?;

    Ok(())
}

pub(super) fn image_dimension(value: usize, name: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        Error::UnsupportedFormat(format!("{} {} exceeds image codec limit", name, value))
    })
}
