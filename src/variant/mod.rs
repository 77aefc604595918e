//! # Behavior variants
//!
//! A variant is one concrete kind of behavior that can be attached to a host.
//! All variants share the [`Behavior`] contract:
//!
//! - an [`Identity`] (seed + tag) written once by the
//!   [`InstanceConfigurator`](crate::configurator::InstanceConfigurator),
//! - an optional tick loop whose interval is derived from the seed,
//! - a ping answered on demand,
//! - an optional composition request for extra instances on the same host.
//!
//! Behaviors never write logs themselves. They return the line to emit and
//! the driver (ticker or registry) sends it to the log sink.
//!
//! The full set of kinds is fixed at compile time in [`VariantKind`]; the
//! [`VariantCatalog`] maps each kind to its factory.

pub mod catalog;
pub mod compatibility;
pub mod composing;
pub mod heartbeat;
pub mod randomized;
pub mod sporadic;

use std::time::Duration;

use rand::rngs::StdRng;
use thiserror::Error;

pub use catalog::{VariantCatalog, VariantFactory};
pub use compatibility::CompatibilityCheck;
pub use composing::Composing;
pub use heartbeat::Heartbeat;
pub use randomized::RandomizedEvent;
pub use sporadic::Sporadic;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum VariantKind {
    Heartbeat,
    Sporadic,
    Composing,
    CompatibilityCheck,
    RandomizedEvent,
}

impl VariantKind {
    /// Builds an unconfigured instance of this kind.
    pub fn create(self) -> Box<dyn Behavior> {
        match self {
            VariantKind::Heartbeat => Box::new(Heartbeat::default()),
            VariantKind::Sporadic => Box::new(Sporadic::default()),
            VariantKind::Composing => Box::new(Composing::default()),
            VariantKind::CompatibilityCheck => Box::new(CompatibilityCheck::default()),
            VariantKind::RandomizedEvent => Box::new(RandomizedEvent::default()),
        }
    }
}

/// Seed and tag assigned to an instance at configuration time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub seed: u32,
    pub tag: String,
}

pub trait Behavior: Send + Sync {
    fn kind(&self) -> VariantKind;

    fn identity(&self) -> &Identity;

    fn identity_mut(&mut self) -> &mut Identity;

    fn seed(&self) -> u32 {
        self.identity().seed
    }

    fn set_seed(&mut self, seed: u32) {
        self.identity_mut().seed = seed;
    }

    fn identity_tag(&self) -> &str {
        &self.identity().tag
    }

    fn set_identity_tag(&mut self, tag: String) {
        self.identity_mut().tag = tag;
    }

    /// Time between ticks, or `None` for behaviors without a tick loop.
    fn tick_interval(&self) -> Option<Duration>;

    /// Called once per interval. Returns the line to log, if any.
    fn on_tick(&mut self, elapsed: Duration, rng: &mut StdRng) -> Option<String>;

    fn on_ping(&self) -> VariantResult<String> {
        Ok(format!("{} {} ping", self.kind(), self.identity_tag()))
    }

    /// Kinds to attach alongside this instance on its host.
    fn compose(&self, _catalog: &[VariantKind]) -> Vec<VariantKind> {
        Vec::new()
    }
}

#[derive(Debug, Error)]
pub enum VariantError {
    #[error("Failed to construct {kind}: {message}")]
    Construction { kind: VariantKind, message: String },
    #[error("Variant kind not registered: {0}")]
    UnknownKind(VariantKind),
    #[error("Ping failed on {kind} {tag}: {message}")]
    Ping {
        kind: VariantKind,
        tag: String,
        message: String,
    },
}

pub type VariantResult<T> = Result<T, VariantError>;
