//! Hosts and the instances they own.
//!
//! A [`Host`] holds strong references to its instances, so dropping the host
//! destroys them. Everything else (the registry's tracking list, tick loops)
//! refers to instances through `Weak` handles and must tolerate them having
//! gone away.

use std::{sync::Arc, time::Duration};

use rand::rngs::StdRng;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::{
    random::SharedRng,
    scheduler::StopToken,
    variant::{Behavior, Identity, VariantKind, VariantResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostId(Uuid);

impl HostId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HostId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for HostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct InstanceState {
    behavior: Box<dyn Behavior>,
    rng: StdRng,
}

/// A configured behavior attached to a host.
///
/// Seed and tag are copied out of the behavior at construction and never
/// change afterwards.
pub struct Instance {
    id: InstanceId,
    host_id: HostId,
    kind: VariantKind,
    identity: Identity,
    tick_interval: Option<Duration>,
    state: Mutex<InstanceState>,
    stop: StopToken,
}

impl Instance {
    /// Wraps an already configured behavior.
    pub fn new(host_id: HostId, behavior: Box<dyn Behavior>) -> Self {
        let identity = behavior.identity().clone();
        Self {
            id: InstanceId::new(),
            host_id,
            kind: behavior.kind(),
            tick_interval: behavior.tick_interval(),
            state: Mutex::new(InstanceState {
                rng: SharedRng::fork(identity.seed),
                behavior,
            }),
            identity,
            stop: StopToken::new(),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn host_id(&self) -> HostId {
        self.host_id
    }

    pub fn kind(&self) -> VariantKind {
        self.kind
    }

    pub fn seed(&self) -> u32 {
        self.identity.seed
    }

    pub fn identity_tag(&self) -> &str {
        &self.identity.tag
    }

    pub fn tick_interval(&self) -> Option<Duration> {
        self.tick_interval
    }

    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    pub async fn tick(&self, elapsed: Duration) -> Option<String> {
        let mut state = self.state.lock().await;
        let InstanceState { behavior, rng } = &mut *state;
        behavior.on_tick(elapsed, rng)
    }

    pub async fn ping(&self) -> VariantResult<String> {
        self.state.lock().await.behavior.on_ping()
    }

    pub async fn compose(&self, catalog: &[VariantKind]) -> Vec<VariantKind> {
        self.state.lock().await.behavior.compose(catalog)
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        self.stop.stop();
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("host_id", &self.host_id)
            .field("kind", &self.kind)
            .field("identity", &self.identity)
            .finish()
    }
}

/// Persistent container owning zero or more instances.
#[derive(Debug)]
pub struct Host {
    id: HostId,
    name: String,
    instances: RwLock<Vec<Arc<Instance>>>,
}

impl Host {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: HostId::new(),
            name: name.into(),
            instances: RwLock::new(Vec::new()),
        }
    }

    pub fn id(&self) -> HostId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn instances(&self) -> Vec<Arc<Instance>> {
        self.instances.read().await.clone()
    }

    pub async fn instance_count(&self) -> usize {
        self.instances.read().await.len()
    }

    pub(crate) async fn attach(&self, instance: Arc<Instance>) {
        self.instances.write().await.push(instance);
    }

    /// Stops every owned instance and releases them.
    pub(crate) async fn release(&self) -> Vec<InstanceId> {
        let released: Vec<Arc<Instance>> = self.instances.write().await.drain(..).collect();
        released
            .iter()
            .map(|instance| {
                instance.stop();
                instance.id()
            })
            .collect()
    }
}
