//! # console-faces: a dynamic component registry
//!
//! Spawns a number of logical hosts, attaches a random selection of behavior
//! variants to each one, gives every instance a seed and identity tag from a
//! single seeded random stream, and drives their tick loops on tokio timers.
//!
//! ## Layout
//!
//! Leaves first:
//! - Behavior variants and their factory table ([`variant`])
//! - Seed and tag assignment ([`configurator`])
//! - Hosts and instances ([`instance`]), driven by [`ticker`]
//! - Selection, instantiation, ping and sweep ([`registry`], [`sweep`])
//! - Timers, cancellation and the ready latch ([`scheduler`])
//! - Startup routines, ready signal and shutdown ([`system`])
//!
//! Ambient pieces: [`config`], [`error`], [`event`] (lifecycle broadcast),
//! [`log_sink`] (per-run log file), [`random`] and [`timestamp`].
//!
//! ## Lifecycle
//!
//! ```text
//! System::new ─> start ─┬─> bootstrap (mdl hosts, one per kind)
//!                       ├─> spawn     (svc hosts, random selections)
//!                       ├─> sweep     (every 5..8s)
//!                       └─> ready listener ─(Ready)─> ping_all
//! ```
//!
//! Everything observes a stop token, so [`system::System::shutdown`] ends all
//! loops at their next suspension point.

pub mod config;
pub mod configurator;
pub mod error;
pub mod event;
pub mod instance;
pub mod log_sink;
pub mod random;
pub mod registry;
pub mod scheduler;
pub mod sweep;
pub mod system;
pub mod ticker;
pub mod timestamp;
pub mod variant;

// Re-exports
pub use error::*;
pub use event::*;
pub use registry::{ComponentRegistry, RegistryContext, RegistryError, RegistryResult};
pub use system::{System, SystemStatus};
pub use variant::{Behavior, VariantCatalog, VariantKind};

#[cfg(test)]
mod tests {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    #[ctor::ctor]
    fn init_tests() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
    }
}
