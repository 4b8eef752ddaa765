//! Parallel processing utilities.

use std::ops::Range;

use rayon::prelude::*;


/// Multiplier for number of chunks relative to CPU threads.
/// Using 3x threads provides good load balancing when some chunks finish faster.
const CHUNKS_PER_THREAD: usize = 3;

/// Rows per chunk so that `height` splits into roughly `threads * CHUNKS_PER_THREAD` chunks.
///
/// Uses the thread count of the current rayon pool, so calling this inside
/// `ThreadPool::install` sizes chunks for that pool.
#[inline]
pub fn rows_per_chunk(height: usize) -> usize {
    let num_chunks = rayon::current_num_threads() * CHUNKS_PER_THREAD;
    (height / num_chunks).max(1)
}

/// Splits `0..height` into `parts` contiguous, disjoint ranges covering every row.
///
/// The first `height % parts` ranges get one extra row. When `parts > height`
/// the trailing ranges are empty.
///
/// # Panics
///
/// Panics if `parts` is 0.
pub fn row_blocks(height: usize, parts: usize) -> Vec<Range<usize>> {
    assert!(parts > 0, "parts must be > 0");

    let base = height / parts;
    let extra = height % parts;

    let mut blocks = Vec::with_capacity(parts);
    let mut start = 0;
    for i in 0..parts {
        let len = base + usize::from(i < extra);
        blocks.push(start..start + len);
        start += len;
    }
    debug_assert_eq!(start, height);

    blocks
}

/// Extension trait for row-aligned mutable parallel chunks with automatic sizing.
pub trait ParRowsMutAuto<T: Send> {
    /// Split into mutable parallel chunks aligned to row boundaries.
    /// Yields `(chunk_start_row, chunk)` pairs where chunk contains complete rows.
    ///
    /// # Panics
    ///
    /// Panics if `width` is 0 or the slice length is not a multiple of `width`.
    fn par_rows_mut_auto<'a>(
        &'a mut self,
        width: usize,
    ) -> impl IndexedParallelIterator<Item = (usize, &'a mut [T])> + 'a
    where
        T: 'a;
}

impl<T: Send> ParRowsMutAuto<T> for [T] {
    fn par_rows_mut_auto<'a>(
        &'a mut self,
        width: usize,
    ) -> impl IndexedParallelIterator<Item = (usize, &'a mut [T])> + 'a
    where
        T: 'a,
    {
        assert!(width > 0, "width must be > 0");
        assert!(
            self.len().is_multiple_of(width),
            "slice length {} is not a multiple of width {}",
            self.len(),
            width
        );

        let height = self.len() / width;
        let chunk_rows = rows_per_chunk(height);
        self.par_chunks_mut(width * chunk_rows)
            .enumerate()
            .map(move |(idx, chunk)| (idx * chunk_rows, chunk))
    }
}
