use std::time::Duration;

use rand::{rngs::StdRng, Rng};

use super::{Behavior, Identity, VariantKind};

/// Logs only when `(draw + seed) % 13 == 0` for a fresh draw in `0..100`.
#[derive(Debug, Default)]
pub struct Sporadic {
    identity: Identity,
}

impl Sporadic {
    pub(crate) fn fires(draw: u32, seed: u32) -> bool {
        (u64::from(draw) + u64::from(seed)) % 13 == 0
    }
}

impl Behavior for Sporadic {
    fn kind(&self) -> VariantKind {
        VariantKind::Sporadic
    }

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }

    fn tick_interval(&self) -> Option<Duration> {
        // 1.0s + (seed mod 5) * 0.1s
        Some(Duration::from_millis(1000 + u64::from(self.seed() % 5) * 100))
    }

    fn on_tick(&mut self, _elapsed: Duration, rng: &mut StdRng) -> Option<String> {
        let draw: u32 = rng.gen_range(0..100);
        Self::fires(draw, self.identity.seed)
            .then(|| format!("Sporadic {} heartbeat {}", self.identity.tag, draw))
    }
}
