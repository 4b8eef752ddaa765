use super::Decomposition;
use crate::config::WindowSize;
use crate::error::Result;
use crate::estimator::fill_rows;
use crate::padding::PaddedRaster;

/// All rows in one loop on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sequential;

impl Decomposition for Sequential {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn run(&self, padded: &PaddedRaster, window: WindowSize) -> Result<Vec<u8>> {
        let mut output = vec![0u8; padded.width() * padded.height()];
        fill_rows(padded, 0..padded.height(), window, &mut output);
        Ok(output)
    }
}
