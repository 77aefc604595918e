use std::time::Duration;

use rand::rngs::StdRng;

use super::{Behavior, Identity, VariantKind};

/// Logs on every tick.
#[derive(Debug, Default)]
pub struct Heartbeat {
    identity: Identity,
}

impl Behavior for Heartbeat {
    fn kind(&self) -> VariantKind {
        VariantKind::Heartbeat
    }

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }

    fn tick_interval(&self) -> Option<Duration> {
        // 0.3s + (seed mod 7) * 0.05s
        Some(Duration::from_millis(300 + u64::from(self.seed() % 7) * 50))
    }

    fn on_tick(&mut self, elapsed: Duration, _rng: &mut StdRng) -> Option<String> {
        Some(format!(
            "Heartbeat {} tick {:.3} seed {}",
            self.identity.tag,
            elapsed.as_secs_f64(),
            self.identity.seed
        ))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn test_interval_formula() {
        let mut heartbeat = Heartbeat::default();
        heartbeat.set_seed(0);
        assert_eq!(heartbeat.tick_interval(), Some(Duration::from_millis(300)));
        heartbeat.set_seed(13); // 13 % 7 == 6
        assert_eq!(heartbeat.tick_interval(), Some(Duration::from_millis(600)));
    }

    #[test]
    fn test_always_logs() {
        let mut heartbeat = Heartbeat::default();
        heartbeat.set_seed(9);
        heartbeat.set_identity_tag("tag-9".to_string());
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..10 {
            let line = heartbeat.on_tick(Duration::from_millis(1500), &mut rng);
            assert_eq!(line.as_deref(), Some("Heartbeat tag-9 tick 1.500 seed 9"));
        }
    }
}
