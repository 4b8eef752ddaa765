//! Filter configuration.
//!
//! [`FilterConfig`] groups the window range and the decomposition strategy.
//! All types deserialize from YAML/JSON; missing fields fall back to defaults.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_MIN_WINDOW: usize = 3;
pub const DEFAULT_MAX_WINDOW: usize = 7;

/// Largest window side the GPU kernel can hold in its fixed sample array.
pub const GPU_MAX_WINDOW: usize = 15;

// ============================================================================
// Window range
// ============================================================================

/// Range of window sides tried by the estimator, `min, min + 2, ..., max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSize {
    /// Smallest window side tried. Positive and odd.
    pub min: usize,
    /// Largest window side tried before giving up and returning the last median.
    /// Odd and `>= min`.
    pub max: usize,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_WINDOW,
            max: DEFAULT_MAX_WINDOW,
        }
    }
}

impl WindowSize {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn validate(&self) -> Result<()> {
        if self.min == 0 {
            return Err(Error::InvalidConfig("min_window must be positive".into()));
        }
        if self.min % 2 == 0 {
            return Err(Error::InvalidConfig(format!(
                "min_window must be odd, got {}",
                self.min
            )));
        }
        if self.max % 2 == 0 {
            return Err(Error::InvalidConfig(format!(
                "max_window must be odd, got {}",
                self.max
            )));
        }
        if self.min > self.max {
            return Err(Error::InvalidConfig(format!(
                "min_window {} exceeds max_window {}",
                self.min, self.max
            )));
        }
        Ok(())
    }

    /// Padding needed on each side so the largest window stays in bounds.
    #[inline]
    pub fn border(&self) -> usize {
        self.max / 2
    }

    /// Sample count of the largest window.
    #[inline]
    pub fn max_samples(&self) -> usize {
        self.max * self.max
    }

    /// Window sides in escalation order.
    pub fn sizes(&self) -> impl Iterator<Item = usize> {
        (self.min..=self.max).step_by(2)
    }
}

// ============================================================================
// Strategy
// ============================================================================

/// How halo rows reach the ranks of the distributed strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Halo {
    /// Each rank receives its own rows plus `max_window / 2` halo rows on each side.
    #[default]
    Scatter,
    /// Each rank receives the whole padded raster.
    Broadcast,
}

/// Work decomposition used for a filtering pass.
///
/// Every strategy produces byte-identical output for the same input and window range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Single loop on the calling thread.
    Sequential,
    /// Row chunks on a fixed-size rayon pool. `threads == 0` uses rayon's default.
    Threaded {
        #[serde(default)]
        threads: usize,
    },
    /// Row blocks on `ranks` message-passing participants, gathered on rank 0.
    Distributed {
        ranks: usize,
        #[serde(default)]
        halo: Halo,
    },
    /// One GPU invocation per pixel.
    Gpu,
    /// GPU when available and the window fits, otherwise `Threaded`.
    Auto,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Threaded { threads: 0 }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Sequential => write!(f, "sequential"),
            Strategy::Threaded { threads: 0 } => write!(f, "threaded"),
            Strategy::Threaded { threads } => write!(f, "threaded({threads})"),
            Strategy::Distributed { ranks, halo } => {
                write!(f, "distributed({ranks} ranks, {halo:?} halo)")
            }
            Strategy::Gpu => write!(f, "gpu"),
            Strategy::Auto => write!(f, "auto"),
        }
    }
}

// ============================================================================
// Filter configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub window: WindowSize,
    pub strategy: Strategy,
}

impl FilterConfig {
    pub fn new(min_window: usize, max_window: usize) -> Self {
        Self {
            window: WindowSize::new(min_window, max_window),
            strategy: Strategy::default(),
        }
    }

    /// Builder method to set the strategy.
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Rejects the configuration before any pixel work begins.
    pub fn validate(&self) -> Result<()> {
        self.window.validate()?;

        match self.strategy {
            Strategy::Distributed { ranks: 0, .. } => Err(Error::InvalidConfig(
                "distributed strategy needs at least one rank".into(),
            )),
            Strategy::Gpu if self.window.max > GPU_MAX_WINDOW => {
                Err(Error::InvalidConfig(format!(
                    "max_window {} exceeds GPU capacity {}",
                    self.window.max, GPU_MAX_WINDOW
                )))
            }
            _ => Ok(()),
        }
    }
}
