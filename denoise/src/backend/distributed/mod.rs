//! Row-block decomposition over message-passing ranks.
//!
//! Rank 0 splits the interior rows into one contiguous block per rank, ships
//! each worker its block assignment together with the input it needs, filters
//! its own block, then gathers and validates every worker's rows.
//!
//! A block near its edge reads up to `border` rows it does not own. With
//! [`Halo::Scatter`] each worker receives exactly its rows plus that halo, cut
//! from the padded plane; with [`Halo::Broadcast`] it receives the whole plane.

mod comm;

#[cfg(test)]
mod tests;

use std::ops::Range;
use std::thread;
use std::time::Instant;

use common::parallel::row_blocks;

pub use comm::{ChannelCommunicator, Communicator, Message, ROOT};

use super::Decomposition;
use crate::config::{Halo, WindowSize};
use crate::error::{Error, Result};
use crate::estimator::fill_rows;
use crate::padding::PaddedRaster;

/// Row blocks on `ranks` threads connected by [`ChannelCommunicator`]s.
#[derive(Debug, Clone, Copy)]
pub struct Distributed {
    ranks: usize,
    halo: Halo,
}

impl Distributed {
    pub fn new(ranks: usize, halo: Halo) -> Result<Self> {
        if ranks == 0 {
            return Err(Error::InvalidConfig(
                "distributed strategy needs at least one rank".into(),
            ));
        }
        Ok(Self { ranks, halo })
    }

    pub fn ranks(&self) -> usize {
        self.ranks
    }

    pub fn halo(&self) -> Halo {
        self.halo
    }
}

impl Decomposition for Distributed {
    fn name(&self) -> &'static str {
        "distributed"
    }

    fn run(&self, padded: &PaddedRaster, window: WindowSize) -> Result<Vec<u8>> {
        let mut world = ChannelCommunicator::world(self.ranks).into_iter();
        let Some(root) = world.next() else {
            return Err(Error::InvalidConfig("empty rank world".into()));
        };

        thread::scope(|scope| {
            let workers: Vec<_> = world
                .map(|comm| {
                    let rank = comm.rank();
                    thread::Builder::new()
                        .name(format!("denoise-rank-{rank}"))
                        .spawn_scoped(scope, move || run_worker(comm))
                        .map_err(|e| format!("failed to start rank {rank}: {e}"))
                })
                .collect();

            // Root runs on the calling thread; its communicator is dropped on
            // return so workers still waiting for work see a closed channel.
            let result = match workers.iter().find_map(|w| w.as_ref().err()) {
                Some(message) => {
                    drop(root);
                    Err(Error::Transport(message.clone()))
                }
                None => run_root(root, padded, window, self.halo),
            };

            let mut worker_error = None;
            for (i, worker) in workers.into_iter().enumerate() {
                let Ok(handle) = worker else { continue };
                let outcome = match handle.join() {
                    Ok(outcome) => outcome,
                    Err(_) => Err(Error::Transport(format!("rank {} panicked", i + 1))),
                };
                if let Err(e) = outcome {
                    worker_error.get_or_insert(e);
                }
            }

            match (result, worker_error) {
                (Err(e), _) => Err(e),
                (Ok(_), Some(e)) => Err(e),
                (Ok(output), None) => Ok(output),
            }
        })
    }
}

/// Rank 0: hand out row blocks, filter its own block, gather the rest.
pub fn run_root<C: Communicator>(
    mut comm: C,
    padded: &PaddedRaster,
    window: WindowSize,
    halo: Halo,
) -> Result<Vec<u8>> {
    debug_assert_eq!(comm.rank(), ROOT);

    let width = padded.width();
    let blocks = row_blocks(padded.height(), comm.size());
    let start = Instant::now();

    for (rank, rows) in blocks.iter().enumerate().skip(1) {
        let (local, input) = match halo {
            Halo::Scatter => (0..rows.len(), padded.slice_rows(rows.clone())),
            Halo::Broadcast => (rows.clone(), padded.clone()),
        };

        tracing::debug!(
            rank,
            rows = ?rows,
            input_rows = input.height() + 2 * input.border(),
            "Sending row block"
        );

        comm.send(
            rank,
            Message::Work {
                rows: rows.clone(),
                local,
                window,
                input,
            },
        )?;
    }

    let mut output = vec![0u8; width * padded.height()];

    let own = &blocks[ROOT];
    fill_rows(
        padded,
        own.clone(),
        window,
        &mut output[own.start * width..own.end * width],
    );

    for (rank, rows) in blocks.iter().enumerate().skip(1) {
        match comm.recv(rank)? {
            Message::Rows { start, data } => {
                check_reply(rank, rows, width, start, &data)?;
                output[rows.start * width..rows.end * width].copy_from_slice(&data);
            }
            other => {
                return Err(Error::Transport(format!(
                    "rank {} sent unexpected {} message",
                    rank,
                    other.kind()
                )));
            }
        }
    }

    tracing::debug!(
        ranks = comm.size(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Gathered all row blocks"
    );

    Ok(output)
}

/// Worker rank: wait for one block assignment, filter it, send the rows back.
pub fn run_worker<C: Communicator>(mut comm: C) -> Result<()> {
    let rank = comm.rank();

    match comm.recv(ROOT)? {
        Message::Work {
            rows,
            local,
            window,
            input,
        } => {
            if local.len() != rows.len() || local.end > input.height() {
                return Err(Error::Transport(format!(
                    "rank {} got inconsistent block {:?} / local {:?} of {} rows",
                    rank,
                    rows,
                    local,
                    input.height()
                )));
            }
            if window.border() > input.border() {
                return Err(Error::Transport(format!(
                    "rank {} got halo {} narrower than window {}",
                    rank,
                    input.border(),
                    window.max
                )));
            }

            let mut data = vec![0u8; local.len() * input.width()];
            fill_rows(&input, local, window, &mut data);

            comm.send(
                ROOT,
                Message::Rows {
                    start: rows.start,
                    data,
                },
            )
        }
        other => Err(Error::Transport(format!(
            "rank {} expected work, got {} message",
            rank,
            other.kind()
        ))),
    }
}

fn check_reply(
    rank: usize,
    rows: &Range<usize>,
    width: usize,
    start: usize,
    data: &[u8],
) -> Result<()> {
    if start != rows.start || data.len() != rows.len() * width {
        return Err(Error::Transport(format!(
            "rank {} returned {} samples at row {}, expected {} at row {}",
            rank,
            data.len(),
            start,
            rows.len() * width,
            rows.start
        )));
    }
    Ok(())
}
