//! The process-wide pseudo-random stream.
//!
//! One [`SharedRng`] is created from the configured seed and handed to the
//! subsystems that draw from it (configurator, registry selection, host
//! naming, delays, sweep intervals). The lock is only held for the duration
//! of a single draw, never across an `.await`.

use std::{
    ops::Range,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use rand::{rngs::StdRng, Rng, SeedableRng};

#[derive(Clone)]
pub struct SharedRng {
    inner: Arc<Mutex<StdRng>>,
}

impl SharedRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    pub fn with<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    /// A non-negative 31-bit draw.
    pub fn next_seed(&self) -> u32 {
        self.with(|rng| rng.gen_range(0..=i32::MAX as u32))
    }

    pub fn index(&self, len: usize) -> usize {
        self.with(|rng| rng.gen_range(0..len))
    }

    /// Uniform draw in `[range.start, range.end)`; an empty range yields its start.
    pub fn duration_between(&self, range: Range<Duration>) -> Duration {
        if range.end <= range.start {
            return range.start;
        }
        let (start, end) = (range.start.as_secs_f64(), range.end.as_secs_f64());
        let secs = self.with(|rng| rng.gen_range(start..end));
        Duration::from_secs_f64(secs)
    }

    /// Derives an independent generator, e.g. for a single instance.
    pub fn fork(seed: u32) -> StdRng {
        StdRng::seed_from_u64(u64::from(seed))
    }
}

impl std::fmt::Debug for SharedRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRng").finish_non_exhaustive()
    }
}
