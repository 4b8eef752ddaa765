//! Adaptive median window estimator.
//!
//! For each output pixel the window grows from `min` to `max` in steps of two
//! until its median lies strictly between the window minimum and maximum.
//! The centre sample is kept when it is itself strictly inside that range and
//! replaced by the median otherwise. When no window qualifies the median of
//! the largest window is returned.
//!
//! The result for a pixel depends only on the padded input and the window
//! range, never on other output pixels, so rows can be computed in any order
//! and on any execution unit.


use std::ops::Range;

use crate::config::WindowSize;
use crate::padding::PaddedRaster;

/// How a pixel's value was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Centre sample judged clean and left untouched.
    Kept,
    /// Centre sample judged noisy and replaced by the window median.
    Replaced,
    /// No window up to `max` had an interior median; the last median was used.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Estimate {
    pub value: u8,
    /// Side of the window that produced `value`.
    pub window: usize,
    pub decision: Decision,
}

/// Per-worker estimator with a scratch buffer sized for the largest window.
#[derive(Debug)]
pub struct Estimator {
    window: WindowSize,
    samples: Vec<u8>,
}

impl Estimator {
    pub fn new(window: WindowSize) -> Self {
        Self {
            window,
            samples: Vec::with_capacity(window.max_samples()),
        }
    }

    #[inline]
    pub fn estimate(&mut self, padded: &PaddedRaster, row: usize, col: usize) -> u8 {
        self.estimate_detailed(padded, row, col).value
    }

    /// # Panics
    ///
    /// Panics if `(row, col)` is not an interior coordinate of `padded` or its
    /// border is narrower than half the largest window.
    pub fn estimate_detailed(&mut self, padded: &PaddedRaster, row: usize, col: usize) -> Estimate {
        assert!(
            self.window.border() <= padded.border(),
            "padding {} too small for window {}",
            padded.border(),
            self.window.max
        );

        let border = padded.border();
        let center = padded.center(row, col);

        let mut med = center;
        let mut side = self.window.min;

        for k in self.window.sizes() {
            let half = k / 2;
            let top = row + border - half;
            let left = col + border - half;

            self.samples.clear();
            for prow in top..top + k {
                self.samples.extend_from_slice(padded.span(prow, left, k));
            }

            let (lower, median, upper) = self.samples.select_nth_unstable(k * k / 2);
            med = *median;
            let lo = lower.iter().copied().min().unwrap_or(med);
            let hi = upper.iter().copied().max().unwrap_or(med);
            side = k;

            if lo < med && med < hi {
                return if lo < center && center < hi {
                    Estimate {
                        value: center,
                        window: k,
                        decision: Decision::Kept,
                    }
                } else {
                    Estimate {
                        value: med,
                        window: k,
                        decision: Decision::Replaced,
                    }
                };
            }
        }

        Estimate {
            value: med,
            window: side,
            decision: Decision::Exhausted,
        }
    }

    /// Writes interior rows `rows` of `padded` into `out`, row-major.
    ///
    /// # Panics
    ///
    /// Panics if `out.len() != rows.len() * padded.width()`.
    pub fn fill_rows(&mut self, padded: &PaddedRaster, rows: Range<usize>, out: &mut [u8]) {
        let width = padded.width();
        assert_eq!(
            out.len(),
            rows.len() * width,
            "output block does not match {} rows of width {}",
            rows.len(),
            width
        );

        for (row, out_row) in rows.zip(out.chunks_exact_mut(width)) {
            for (col, value) in out_row.iter_mut().enumerate() {
                *value = self.estimate(padded, row, col);
            }
        }
    }
}

/// Replacement value for interior pixel `(row, col)`.
pub fn estimate(padded: &PaddedRaster, row: usize, col: usize, window: WindowSize) -> u8 {
    Estimator::new(window).estimate(padded, row, col)
}

/// Filters interior rows `rows` of `padded` into `out` with a fresh estimator.
pub fn fill_rows(padded: &PaddedRaster, rows: Range<usize>, window: WindowSize, out: &mut [u8]) {
    Estimator::new(window).fill_rows(padded, rows, out);
}
