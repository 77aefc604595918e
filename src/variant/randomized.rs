use std::time::Duration;

use rand::{rngs::StdRng, Rng};

use super::{Behavior, Identity, VariantKind};

const MIN_INTERVAL_MS: u64 = 50;
const EVENT_THRESHOLD: f64 = 0.9;

/// Ticks fast and logs only when a fresh uniform draw exceeds 0.9.
#[derive(Debug, Default)]
pub struct RandomizedEvent {
    identity: Identity,
}

impl Behavior for RandomizedEvent {
    fn kind(&self) -> VariantKind {
        VariantKind::RandomizedEvent
    }

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }

    fn tick_interval(&self) -> Option<Duration> {
        // max(0.05s, (seed mod 17) * 0.01s)
        let millis = u64::from(self.seed() % 17) * 10;
        Some(Duration::from_millis(millis.max(MIN_INTERVAL_MS)))
    }

    fn on_tick(&mut self, _elapsed: Duration, rng: &mut StdRng) -> Option<String> {
        let draw: f64 = rng.gen();
        (draw > EVENT_THRESHOLD)
            .then(|| format!("RandomizedEvent {} spontaneous event", self.identity.tag))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn test_interval_has_floor() {
        let mut event = RandomizedEvent::default();
        for seed in [0, 1, 2, 3, 4, 17, 34] {
            event.set_seed(seed);
            assert_eq!(event.tick_interval(), Some(Duration::from_millis(50)));
        }
        event.set_seed(16);
        assert_eq!(event.tick_interval(), Some(Duration::from_millis(160)));
    }

    #[test]
    fn test_event_rate_is_roughly_one_in_ten() {
        let mut event = RandomizedEvent::default();
        event.set_identity_tag("tag-1".to_string());
        let mut rng = StdRng::seed_from_u64(2024);

        let fired = (0..10_000)
            .filter_map(|_| event.on_tick(Duration::ZERO, &mut rng))
            .inspect(|line| assert_eq!(line, "RandomizedEvent tag-1 spontaneous event"))
            .count();
        assert!((700..1300).contains(&fired), "fired {} times", fired);
    }
}
