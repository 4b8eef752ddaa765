//! Mirror-padded single-channel plane.

use std::ops::Range;

use crate::error::{Error, Result};
use crate::raster::Raster;

/// Single-channel plane extended by `border` reflected samples on every side.
///
/// Interior coordinate `(row, col)` lives at padded coordinate
/// `(row + border, col + border)`. Any window of side `<= 2 * border + 1`
/// centred on an interior coordinate stays inside the buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaddedRaster {
    width: usize,
    height: usize,
    border: usize,
    data: Vec<u8>,
}

impl PaddedRaster {
    /// Pads `plane` for windows up to `max_window`.
    pub fn new(plane: &Raster, max_window: usize) -> Result<PaddedRaster> {
        if max_window == 0 || max_window % 2 == 0 {
            return Err(Error::InvalidConfig(format!(
                "max_window must be positive and odd, got {}",
                max_window
            )));
        }
        if plane.channels() != 1 {
            return Err(Error::InvalidConfig(format!(
                "padding expects a single-channel plane, got {} channels",
                plane.channels()
            )));
        }

        let width = plane.width();
        let height = plane.height();
        let border = max_window / 2;
        let stride = width + 2 * border;
        let src = plane.data();

        let mut data = Vec::with_capacity(stride * (height + 2 * border));
        for prow in 0..height + 2 * border {
            let src_row = reflect(prow as isize - border as isize, height);
            let row = &src[src_row * width..(src_row + 1) * width];
            data.extend(
                (0..stride).map(|pcol| row[reflect(pcol as isize - border as isize, width)]),
            );
        }

        Ok(PaddedRaster {
            width,
            height,
            border,
            data,
        })
    }

    /// Interior width.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Interior height.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn border(&self) -> usize {
        self.border
    }

    /// Row length of the padded buffer.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width + 2 * self.border
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Sample at padded coordinate `(prow, pcol)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate lies outside the padded buffer.
    #[inline]
    pub fn at(&self, prow: usize, pcol: usize) -> u8 {
        let stride = self.stride();
        assert!(
            prow < self.height + 2 * self.border && pcol < stride,
            "padded coordinate ({}, {}) out of bounds",
            prow,
            pcol
        );
        self.data[prow * stride + pcol]
    }

    /// Unpadded sample at interior coordinate `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if `(row, col)` is not an interior coordinate.
    #[inline]
    pub fn center(&self, row: usize, col: usize) -> u8 {
        assert!(
            row < self.height && col < self.width,
            "interior coordinate ({}, {}) outside {}x{}",
            row,
            col,
            self.width,
            self.height
        );
        self.at(row + self.border, col + self.border)
    }

    /// `len` samples of padded row `prow` starting at padded column `pcol`.
    #[inline]
    pub fn span(&self, prow: usize, pcol: usize, len: usize) -> &[u8] {
        let start = prow * self.stride() + pcol;
        &self.data[start..start + len]
    }

    /// Interior rows `rows` together with `border` halo rows on each side.
    ///
    /// The result is itself a padded raster of height `rows.len()`, so filtering
    /// it gives exactly the rows `rows` of filtering `self`.
    ///
    /// # Panics
    ///
    /// Panics if `rows` is not within `0..self.height()`.
    pub fn slice_rows(&self, rows: Range<usize>) -> PaddedRaster {
        assert!(
            rows.start <= rows.end && rows.end <= self.height,
            "row range {:?} outside 0..{}",
            rows,
            self.height
        );

        let stride = self.stride();
        let start = rows.start * stride;
        let end = (rows.end + 2 * self.border) * stride;

        PaddedRaster {
            width: self.width,
            height: rows.len(),
            border: self.border,
            data: self.data[start..end].to_vec(),
        }
    }

    /// Rebuilds a padded raster from its parts, as received over a transport.
    pub fn from_parts(
        width: usize,
        height: usize,
        border: usize,
        data: Vec<u8>,
    ) -> Result<PaddedRaster> {
        let expected = (width + 2 * border) * (height + 2 * border);
        if data.len() != expected {
            return Err(Error::MalformedRaster(format!(
                "padded buffer length {} does not match expected {}",
                data.len(),
                expected
            )));
        }

        Ok(PaddedRaster {
            width,
            height,
            border,
            data,
        })
    }

    pub fn into_parts(self) -> (usize, usize, usize, Vec<u8>) {
        (self.width, self.height, self.border, self.data)
    }
}

/// Mirror index with the edge sample repeated: `-1 -> 0`, `n -> n - 1`.
/// Applied repeatedly so borders wider than the plane still land in range.
fn reflect(mut i: isize, n: usize) -> usize {
    let n = n as isize;
    debug_assert!(n > 0);
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= n {
            i = 2 * n - i - 1;
        } else {
            return i as usize;
        }
    }
}
