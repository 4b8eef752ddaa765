//! Binary PGM (`P5`) and PPM (`P6`) codec.
//!
//! Header tokens are whitespace separated and may be interleaved with `#`
//! comments running to the end of the line. Exactly one whitespace byte
//! follows the max-value token; the payload starts right after it.

use std::io::{BufRead, ErrorKind, Read, Write};

use super::Raster;
use crate::error::{Error, Result};

const HEADER_COMMENT: &str = "# Created by denoise";

pub fn read_pnm<R: BufRead>(mut reader: R) -> Result<Raster> {
    let mut magic = [0u8; 2];
    reader.read_exact(&mut magic).map_err(truncated)?;

    let channels = match &magic {
        b"P5" => 1,
        b"P6" => 3,
        _ => {
            return Err(Error::MalformedRaster(format!(
                "unexpected magic {:?}, expected P5 or P6",
                String::from_utf8_lossy(&magic)
            )));
        }
    };
    let separator = next_byte(&mut reader)?;
    if !separator.is_ascii_whitespace() {
        return Err(Error::MalformedRaster(format!(
            "magic {} not followed by whitespace",
            String::from_utf8_lossy(&magic)
        )));
    }

    let width = read_header_value(&mut reader, "width")?;
    let height = read_header_value(&mut reader, "height")?;
    let max_value = read_header_value(&mut reader, "max value")?;

    if width == 0 || height == 0 {
        return Err(Error::MalformedRaster(format!(
            "zero dimension {}x{}",
            width, height
        )));
    }
    if max_value == 0 || max_value > 255 {
        return Err(Error::MalformedRaster(format!(
            "max value {} outside 1..=255",
            max_value
        )));
    }

    let len = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(channels))
        .ok_or_else(|| {
            Error::MalformedRaster(format!("dimensions {}x{} overflow", width, height))
        })?;

    let mut data = Vec::new();
    let read = reader.take(len as u64).read_to_end(&mut data)?;
    if read < len {
        return Err(Error::MalformedRaster(format!(
            "truncated payload: expected {} bytes, got {}",
            len, read
        )));
    }

    Raster::new_with_data(width, height, channels, data)
}

pub fn write_pnm<W: Write>(raster: &Raster, mut writer: W) -> Result<()> {
    let magic = match raster.channels() {
        1 => "P5",
        3 => "P6",
        n => {
            return Err(Error::UnsupportedFormat(format!(
                "PNM cannot store {} channels",
                n
            )));
        }
    };

    write!(
        writer,
        "{}\n{}\n{} {}\n255\n",
        magic,
        HEADER_COMMENT,
        raster.width(),
        raster.height()
    )?;
    writer.write_all(raster.data())?;
    writer.flush()?;

    Ok(())
}

/// Reads one decimal header token, skipping whitespace and comments before it,
/// and consumes the single whitespace byte that terminates it.
fn read_header_value<R: BufRead>(reader: &mut R, name: &str) -> Result<usize> {
    let mut byte = next_byte(reader)?;
    loop {
        match byte {
            b'#' => {
                let mut comment = Vec::new();
                reader.read_until(b'\n', &mut comment)?;
                if comment.last() != Some(&b'\n') {
                    return Err(truncated_header());
                }
                byte = next_byte(reader)?;
            }
            b if b.is_ascii_whitespace() => byte = next_byte(reader)?,
            _ => break,
        }
    }

    let mut value: usize = 0;
    loop {
        if !byte.is_ascii_digit() {
            return Err(Error::MalformedRaster(format!(
                "invalid {}: unexpected byte 0x{:02x}",
                name, byte
            )));
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(usize::from(byte - b'0')))
            .ok_or_else(|| Error::MalformedRaster(format!("{} too large", name)))?;

        byte = next_byte(reader)?;
        if byte.is_ascii_whitespace() {
            return Ok(value);
        }
    }
}

fn next_byte<R: Read>(reader: &mut R) -> Result<u8> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte).map_err(truncated)?;
    Ok(byte[0])
}

fn truncated(err: std::io::Error) -> Error {
    if err.kind() == ErrorKind::UnexpectedEof {
        truncated_header()
    } else {
        Error::Io(err)
    }
}

fn truncated_header() -> Error {
    Error::MalformedRaster("truncated header".to_string())
}
