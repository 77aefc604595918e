use tracing::debug;

use crate::{
    log_sink::LogSink,
    random::SharedRng,
    variant::{Behavior, Identity},
};

const TAG_MODULUS: u32 = 10_000;

/// `"tag-" + (seed mod 10000)`. Not unique; collisions are expected.
pub fn identity_tag_for(seed: u32) -> String {
    format!("tag-{}", seed % TAG_MODULUS)
}

/// Writes a fresh seed and the tag derived from it into a new instance.
#[derive(Debug, Clone)]
pub struct InstanceConfigurator {
    rng: SharedRng,
    sink: LogSink,
}

impl InstanceConfigurator {
    pub fn new(rng: SharedRng, sink: LogSink) -> Self {
        Self { rng, sink }
    }

    pub fn configure(&self, behavior: &mut dyn Behavior) -> Identity {
        let seed = self.rng.next_seed();
        let tag = identity_tag_for(seed);
        behavior.set_seed(seed);
        behavior.set_identity_tag(tag.clone());
        debug!(kind = %behavior.kind(), seed, tag = %tag, "instance configured");
        self.sink
            .write(format!("Configured {} with seed {}", behavior.kind(), seed));
        Identity { seed, tag }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::variant::VariantKind;

    #[test]
    fn test_identity_tag_formula() {
        assert_eq!(identity_tag_for(0), "tag-0");
        assert_eq!(identity_tag_for(42), "tag-42");
        assert_eq!(identity_tag_for(123_456_789), "tag-6789");
        assert_eq!(identity_tag_for(20_000), "tag-0");
    }

    #[test]
    fn test_configure_draws_from_shared_stream() {
        let rng = SharedRng::from_seed(42);
        let reference = SharedRng::from_seed(42);
        let configurator = InstanceConfigurator::new(rng, LogSink::console_only());

        let mut behavior = VariantKind::Heartbeat.create();
        let identity = configurator.configure(behavior.as_mut());

        let expected = reference.next_seed();
        assert_eq!(identity.seed, expected);
        assert_eq!(behavior.seed(), expected);
        assert_eq!(behavior.identity_tag(), identity_tag_for(expected));
    }

    #[test]
    fn test_consecutive_instances_get_consecutive_draws() {
        let configurator =
            InstanceConfigurator::new(SharedRng::from_seed(9), LogSink::console_only());
        let reference = SharedRng::from_seed(9);

        for kind in [VariantKind::Sporadic, VariantKind::Composing] {
            let mut behavior = kind.create();
            configurator.configure(behavior.as_mut());
            assert_eq!(behavior.seed(), reference.next_seed());
        }
    }

    proptest! {
        #[test]
        fn test_tag_is_derived_from_seed(seed in any::<u32>()) {
            let tag = identity_tag_for(seed);
            prop_assert_eq!(tag.clone(), format!("tag-{}", seed % 10_000));
            let suffix: u32 = tag.trim_start_matches("tag-").parse().unwrap();
            prop_assert!(suffix < 10_000);
        }
    }
}
