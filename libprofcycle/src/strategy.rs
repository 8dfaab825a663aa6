//! Image selection strategies
//!
//! Three strategies decide which pool member is served next:
//!
//! - `Random`: a uniform pick on every call, no state kept
//! - `Sequential`: the pool sorted once per cycle, then served in order
//! - `Shuffle`: the pool permuted once per cycle, then served in order
//!
//! The two preordered strategies share one algorithm backed by
//! [`RotationState`]. Stale entries at the front of the pending list are
//! pruned lazily; entries further down are only checked when they reach
//! the front.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use libprofcycle::strategy::{Selector, StrategyKind};
//!
//! # fn example() -> libprofcycle::Result<()> {
//! let mut selector = Selector::new();
//! let next = selector.select(Path::new("/home/me/icons"), StrategyKind::Shuffle)?;
//! println!("Next icon: {}", next);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use rand::rngs::ThreadRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ProfcycleError, Result, SelectionError};
use crate::pool::ImagePool;
use crate::rotation::RotationState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Random,
    Sequential,
    Shuffle,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::Random,
        StrategyKind::Sequential,
        StrategyKind::Shuffle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Random => "random",
            StrategyKind::Sequential => "sequential",
            StrategyKind::Shuffle => "shuffle",
        }
    }

    /// Whether this strategy keeps a pending list between calls
    pub fn is_preordered(&self) -> bool {
        !matches!(self, StrategyKind::Random)
    }
}

impl FromStr for StrategyKind {
    type Err = ProfcycleError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "random" => Ok(StrategyKind::Random),
            "sequential" => Ok(StrategyKind::Sequential),
            "shuffle" => Ok(StrategyKind::Shuffle),
            _ => Err(SelectionError::UnknownStrategy(s.to_string()).into()),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks the next image from a directory according to a strategy
pub struct Selector<R = ThreadRng> {
    rng: R,
}

impl Selector<ThreadRng> {
    pub fn new() -> Self {
        Self::with_rng(rand::thread_rng())
    }
}

impl Default for Selector<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> Selector<R> {
    /// Create a selector drawing randomness from `rng`
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Return the next file name from `dir` and update persisted state
    ///
    /// # Errors
    ///
    /// - `DirectoryNotFound` if `dir` does not exist
    /// - `EmptyPool` if `dir` holds no eligible image
    pub fn select(&mut self, dir: &Path, kind: StrategyKind) -> Result<String> {
        let pool = ImagePool::new(dir);
        pool.ensure_exists()?;

        match kind {
            StrategyKind::Random => self.pick_random(&pool),
            StrategyKind::Sequential | StrategyKind::Shuffle => self.pick_preordered(&pool, kind),
        }
    }

    /// Like [`Selector::select`] but with a strategy name from configuration
    pub fn select_named(&mut self, dir: &Path, strategy: &str) -> Result<String> {
        let kind: StrategyKind = strategy.parse()?;
        self.select(dir, kind)
    }

    fn pick_random(&mut self, pool: &ImagePool) -> Result<String> {
        let images = pool.list_eligible()?;
        images
            .choose(&mut self.rng)
            .cloned()
            .ok_or_else(|| SelectionError::EmptyPool(pool.dir().to_path_buf()).into())
    }

    fn pick_preordered(&mut self, pool: &ImagePool, kind: StrategyKind) -> Result<String> {
        let state = RotationState::for_pool(pool.dir(), kind);
        let mut pending = state.load_pending()?;

        while let Some(candidate) = pending.pop_front() {
            if !pool.contains(&candidate) {
                tracing::debug!(
                    "{} is lost: ignored",
                    pool.dir().join(&candidate).display()
                );
                continue;
            }
            state.save(&pending)?;
            return Ok(candidate);
        }

        // Cycle complete (or drained by stale entries): drop what is left on
        // disk before starting over
        state.clear()?;
        tracing::debug!("No pending image list for {}", pool.dir().display());

        let mut images = pool.list_eligible()?;
        if images.is_empty() {
            return Err(SelectionError::EmptyPool(pool.dir().to_path_buf()).into());
        }
        self.order(kind, &mut images);
        tracing::debug!("New {} order: {:?}", kind, images);

        let mut pending: std::collections::VecDeque<String> = images.into();
        let first = pending
            .pop_front()
            .ok_or_else(|| SelectionError::EmptyPool(pool.dir().to_path_buf()))?;
        state.save(&pending)?;

        Ok(first)
    }

    fn order(&mut self, kind: StrategyKind, images: &mut [String]) {
        match kind {
            StrategyKind::Sequential => images.sort(),
            StrategyKind::Shuffle => images.shuffle(&mut self.rng),
            StrategyKind::Random => {}
        }
    }
}
