use common::parallel::ParRowsMutAuto;
use rayon::prelude::*;

use super::Decomposition;
use crate::config::WindowSize;
use crate::error::Result;
use crate::estimator::Estimator;
use crate::padding::PaddedRaster;

/// Row-aligned chunks on a fixed-size rayon pool.
///
/// Each task owns a disjoint block of output rows; the padded input is shared
/// read-only, so the only synchronization is the join at the end of the pass.
#[derive(Debug)]
pub struct RowParallel {
    pool: rayon::ThreadPool,
}

impl RowParallel {
    /// `threads == 0` uses rayon's default thread count.
    pub fn new(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("denoise-worker-{i}"))
            .build()?;

        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl Decomposition for RowParallel {
    fn name(&self) -> &'static str {
        "row_parallel"
    }

    fn run(&self, padded: &PaddedRaster, window: WindowSize) -> Result<Vec<u8>> {
        let width = padded.width();
        let mut output = vec![0u8; width * padded.height()];

        self.pool.install(|| {
            output.par_rows_mut_auto(width).for_each_init(
                || Estimator::new(window),
                |estimator, (start_row, chunk)| {
                    let rows = start_row..start_row + chunk.len() / width;
                    estimator.fill_rows(padded, rows, chunk);
                },
            );
        });

        Ok(output)
    }
}
