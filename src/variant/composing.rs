use std::time::Duration;

use rand::rngs::StdRng;

use super::{Behavior, Identity, VariantKind};

/// Upper bound on extra instances a single composing instance may request.
pub const MAX_COMPOSED_ATTACHMENTS: usize = 3;

/// Attaches other variants to its own host when created. Has no tick loop.
#[derive(Debug, Default)]
pub struct Composing {
    identity: Identity,
}

impl Behavior for Composing {
    fn kind(&self) -> VariantKind {
        VariantKind::Composing
    }

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }

    fn tick_interval(&self) -> Option<Duration> {
        None
    }

    fn on_tick(&mut self, _elapsed: Duration, _rng: &mut StdRng) -> Option<String> {
        None
    }

    /// Picks `catalog[(seed + i) % len]` for the first few `i`, skipping its own kind.
    fn compose(&self, catalog: &[VariantKind]) -> Vec<VariantKind> {
        let seed = self.identity.seed as usize;
        (0..MAX_COMPOSED_ATTACHMENTS.min(catalog.len()))
            .map(|i| catalog[(seed + i) % catalog.len()])
            .filter(|kind| *kind != VariantKind::Composing)
            .collect()
    }
}
