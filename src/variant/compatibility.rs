use std::time::Duration;

use rand::rngs::StdRng;

use super::{Behavior, Identity, VariantKind};

/// Logs the derived value `seed mod 42` on every tick.
#[derive(Debug, Default)]
pub struct CompatibilityCheck {
    identity: Identity,
}

impl CompatibilityCheck {
    pub fn derived_value(&self) -> u32 {
        self.identity.seed % 42
    }
}

impl Behavior for CompatibilityCheck {
    fn kind(&self) -> VariantKind {
        VariantKind::CompatibilityCheck
    }

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }

    fn tick_interval(&self) -> Option<Duration> {
        // 0.75s + (seed mod 11) * 0.02s
        Some(Duration::from_millis(750 + u64::from(self.seed() % 11) * 20))
    }

    fn on_tick(&mut self, _elapsed: Duration, _rng: &mut StdRng) -> Option<String> {
        Some(format!(
            "CompatibilityCheck {} checking compatibility {}",
            self.identity.tag,
            self.derived_value()
        ))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn test_interval_formula() {
        let mut check = CompatibilityCheck::default();
        check.set_seed(21); // 21 % 11 == 10
        assert_eq!(check.tick_interval(), Some(Duration::from_millis(950)));
        check.set_seed(22);
        assert_eq!(check.tick_interval(), Some(Duration::from_millis(750)));
    }

    #[test]
    fn test_logs_derived_value() {
        let mut check = CompatibilityCheck::default();
        check.set_seed(100);
        check.set_identity_tag("tag-100".to_string());
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            check.on_tick(Duration::ZERO, &mut rng).as_deref(),
            Some("CompatibilityCheck tag-100 checking compatibility 16")
        );
    }
}
