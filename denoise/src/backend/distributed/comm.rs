use std::collections::VecDeque;
use std::ops::Range;
use std::sync::mpsc::{Receiver, Sender, channel};

use crate::config::WindowSize;
use crate::error::{Error, Result};
use crate::padding::PaddedRaster;

/// Rank 0 owns the input and assembles the output.
pub const ROOT: usize = 0;

#[derive(Debug, Clone)]
pub enum Message {
    /// Root to worker: filter `rows` (global interior rows) from `input`.
    /// `local` addresses the same rows inside `input`.
    Work {
        rows: Range<usize>,
        local: Range<usize>,
        window: WindowSize,
        input: PaddedRaster,
    },
    /// Worker to root: filtered rows starting at global row `start`.
    Rows { start: usize, data: Vec<u8> },
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Work { .. } => "work",
            Message::Rows { .. } => "rows",
        }
    }
}

/// Point-to-point message passing between the ranks of one filtering pass.
pub trait Communicator {
    fn rank(&self) -> usize;

    /// Number of ranks, root included.
    fn size(&self) -> usize;

    fn send(&self, to: usize, message: Message) -> Result<()>;

    /// Blocks until a message from rank `from` arrives. Messages from other
    /// ranks that arrive first are kept for later calls.
    fn recv(&mut self, from: usize) -> Result<Message>;
}

/// In-process transport: one channel per rank, root connected to every worker.
///
/// Workers only talk to the root, so a rank that disappears closes its channel
/// and turns the peer's pending `recv` into a transport error instead of a hang.
#[derive(Debug)]
pub struct ChannelCommunicator {
    rank: usize,
    size: usize,
    peers: Vec<Option<Sender<(usize, Message)>>>,
    inbox: Receiver<(usize, Message)>,
    pending: VecDeque<(usize, Message)>,
}

impl ChannelCommunicator {
    /// Creates the communicators of a `size`-rank world, indexed by rank.
    ///
    /// # Panics
    ///
    /// Panics if `size` is 0.
    pub fn world(size: usize) -> Vec<ChannelCommunicator> {
        assert!(size > 0, "world size must be > 0");

        let (senders, inboxes): (Vec<_>, Vec<_>) =
            (0..size).map(|_| channel::<(usize, Message)>()).unzip();

        inboxes
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| {
                let peers = (0..size)
                    .map(|peer| {
                        let linked = peer != rank && (rank == ROOT || peer == ROOT);
                        linked.then(|| senders[peer].clone())
                    })
                    .collect();

                ChannelCommunicator {
                    rank,
                    size,
                    peers,
                    inbox,
                    pending: VecDeque::new(),
                }
            })
            .collect()
    }
}

impl Communicator for ChannelCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send(&self, to: usize, message: Message) -> Result<()> {
        let peer = self
            .peers
            .get(to)
            .and_then(Option::as_ref)
            .ok_or_else(|| {
                Error::Transport(format!("rank {} has no link to rank {}", self.rank, to))
            })?;

        peer.send((self.rank, message))
            .map_err(|_| Error::Transport(format!("rank {} is unreachable", to)))
    }

    fn recv(&mut self, from: usize) -> Result<Message> {
        if let Some(pos) = self.pending.iter().position(|(src, _)| *src == from) {
            if let Some((_, message)) = self.pending.remove(pos) {
                return Ok(message);
            }
        }

        loop {
            let (src, message) = self.inbox.recv().map_err(|_| {
                Error::Transport(format!(
                    "rank {} disconnected while waiting for rank {}",
                    self.rank, from
                ))
            })?;

            if src == from {
                return Ok(message);
            }
            self.pending.push_back((src, message));
        }
    }
}
