//! # Component registry
//!
//! Enumerates the variant catalog, picks random selections of kinds, creates
//! and configures instances, attaches them to hosts and keeps a non-owning
//! list of everything it created.
//!
//! ```text
//! spawn_host ──> Host ──owns──> Instance ──weak──> tracked
//!                                   │
//!                                   └──weak──> InstanceTicker (tokio task)
//! ```
//!
//! Instantiation, sweep and ping failures are recovered locally: they are
//! written to the log sink, counted, and published on the event bus. None of
//! them stop the registry.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
    time::Duration,
};

use async_recursion::async_recursion;
use dashmap::DashMap;
use rand::Rng;
use thiserror::Error;
use tokio::{sync::RwLock, task::JoinHandle, time::Instant};
use tracing::{debug, warn};

use crate::{
    configurator::InstanceConfigurator,
    event::{ErrorEvent, ErrorSeverity, Event, EventBus, EventType, Value},
    instance::{Host, HostId, Instance, InstanceId},
    log_sink::LogSink,
    random::SharedRng,
    scheduler::{Scheduler, StopToken},
    ticker::InstanceTicker,
    variant::{VariantCatalog, VariantError, VariantKind},
};

/// How far composition may nest. Instances created by a composing instance
/// never compose further.
pub const MAX_COMPOSITION_DEPTH: usize = 1;

pub const HOST_NAME_PARTS: [&str; 8] = [
    "alpha", "bridge", "core", "node", "svc", "proxy", "shim", "mux",
];

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Host not found: {host_id}")]
    HostNotFound { host_id: HostId },
    #[error("Failed to instantiate {kind} on host {host_id}: {source}")]
    InstantiationFailure {
        kind: VariantKind,
        host_id: HostId,
        #[source]
        source: VariantError,
    },
    #[error("Sweep failed: {message}")]
    SweepFailure { message: String },
    #[error("Shutdown did not finish within {timeout:?}")]
    ShutdownTimeout { timeout: Duration },
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Collaborators shared by the registry and the loops it starts.
#[derive(Clone)]
pub struct RegistryContext {
    pub event_bus: Arc<EventBus>,
    pub scheduler: Arc<dyn Scheduler>,
    pub sink: LogSink,
    pub rng: SharedRng,
}

#[derive(Debug, Default)]
struct FailureCounters {
    instantiation: AtomicU64,
    sweep: AtomicU64,
    ping: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailureStats {
    pub instantiation: u64,
    pub sweep: u64,
    pub ping: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PingReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

pub struct ComponentRegistry {
    context: RegistryContext,
    catalog: VariantCatalog,
    configurator: InstanceConfigurator,
    hosts: Arc<DashMap<HostId, Arc<Host>>>,
    tracked: Arc<RwLock<Vec<Weak<Instance>>>>,
    running_tickers: Arc<DashMap<InstanceId, JoinHandle<()>>>,
    shutdown: StopToken,
    failures: Arc<FailureCounters>,
}

impl Clone for ComponentRegistry {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
            catalog: self.catalog.clone(),
            configurator: self.configurator.clone(),
            hosts: self.hosts.clone(),
            tracked: self.tracked.clone(),
            running_tickers: self.running_tickers.clone(),
            shutdown: self.shutdown.clone(),
            failures: self.failures.clone(),
        }
    }
}

impl ComponentRegistry {
    pub fn new(context: RegistryContext, catalog: VariantCatalog) -> Self {
        let configurator = InstanceConfigurator::new(context.rng.clone(), context.sink.clone());
        Self {
            context,
            catalog,
            configurator,
            hosts: Arc::new(DashMap::new()),
            tracked: Arc::new(RwLock::new(Vec::new())),
            running_tickers: Arc::new(DashMap::new()),
            shutdown: StopToken::new(),
            failures: Arc::new(FailureCounters::default()),
        }
    }

    pub fn context(&self) -> &RegistryContext {
        &self.context
    }

    pub fn catalog(&self) -> &VariantCatalog {
        &self.catalog
    }

    /// Fires when [`shutdown`](Self::shutdown) starts.
    pub fn shutdown_token(&self) -> StopToken {
        self.shutdown.clone()
    }

    /// The catalog's kinds, in the same order on every call.
    pub fn enumerate_variant_kinds(&self) -> Vec<VariantKind> {
        self.catalog.kinds()
    }

    /// Draws a count in `1..=max(1, max_per_host)`, then that many kinds with
    /// replacement. Returns nothing if the catalog is empty.
    pub fn create_random_selection(&self, max_per_host: usize) -> Vec<VariantKind> {
        let kinds = self.catalog.kinds();
        if kinds.is_empty() {
            return Vec::new();
        }
        let upper = max_per_host.max(1);
        let selection: Vec<VariantKind> = self.context.rng.with(|rng| {
            let count = rng.gen_range(1..=upper);
            (0..count)
                .map(|_| kinds[rng.gen_range(0..kinds.len())])
                .collect()
        });
        debug!(?selection, "random selection drawn");
        selection
    }

    /// `{prefix}.{part}.{index}.{n}` with `part` and `n` drawn from the shared stream.
    pub fn generate_name(&self, prefix: &str, index: usize) -> String {
        let (part, n) = self.context.rng.with(|rng| {
            let part = HOST_NAME_PARTS[rng.gen_range(0..HOST_NAME_PARTS.len())];
            (part, rng.gen_range(0..10_000u32))
        });
        format!("{}.{}.{}.{}", prefix, part, index, n)
    }

    pub async fn spawn_host(&self, prefix: &str, index: usize) -> Arc<Host> {
        let host = Arc::new(Host::new(self.generate_name(prefix, index)));
        self.hosts.insert(host.id(), host.clone());
        debug!(host_id = %host.id(), name = host.name(), "host spawned");

        let event = Event::new(EventType::HostSpawned)
            .with_parameter("host_id", host.id().to_string().into())
            .with_parameter("host_name", host.name().into());
        self.publish(event).await;
        host
    }

    /// Drops the host and every instance it owns. Their tick loops end.
    pub async fn destroy_host(&self, host_id: HostId) -> RegistryResult<()> {
        let (_, host) = self
            .hosts
            .remove(&host_id)
            .ok_or(RegistryError::HostNotFound { host_id })?;

        for instance_id in host.release().await {
            self.running_tickers.remove(&instance_id);
        }
        self.prune_tracked().await;
        debug!(host_id = %host_id, name = host.name(), "host destroyed");

        let event = Event::new(EventType::HostDestroyed)
            .with_parameter("host_id", host_id.to_string().into())
            .with_parameter("host_name", host.name().into());
        self.publish(event).await;
        Ok(())
    }

    pub fn host(&self, host_id: HostId) -> Option<Arc<Host>> {
        self.hosts.get(&host_id).map(|entry| entry.value().clone())
    }

    pub fn hosts(&self) -> Vec<Arc<Host>> {
        self.hosts.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    /// Tracked instances that are still alive.
    pub async fn tracked_count(&self) -> usize {
        self.tracked
            .read()
            .await
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    pub async fn tracked_instances(&self) -> Vec<Arc<Instance>> {
        self.tracked
            .read()
            .await
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    pub fn running_ticker_count(&self) -> usize {
        self.running_tickers.len()
    }

    pub fn stats(&self) -> FailureStats {
        FailureStats {
            instantiation: self.failures.instantiation.load(Ordering::SeqCst),
            sweep: self.failures.sweep.load(Ordering::SeqCst),
            ping: self.failures.ping.load(Ordering::SeqCst),
        }
    }

    /// Creates, configures, tracks and attaches one instance, then starts its
    /// tick loop. A composing instance adds its requested kinds to the same
    /// host before this returns.
    ///
    /// Failures are logged and counted here; callers may ignore the error.
    #[tracing::instrument(skip(self))]
    pub async fn instantiate(
        &self,
        host_id: HostId,
        kind: VariantKind,
    ) -> RegistryResult<Arc<Instance>> {
        match self.instantiate_at_depth(host_id, kind, 0).await {
            Ok(instance) => Ok(instance),
            Err(e) => {
                self.report_instantiation_failure(kind, &e).await;
                Err(e)
            }
        }
    }

    #[async_recursion]
    async fn instantiate_at_depth(
        &self,
        host_id: HostId,
        kind: VariantKind,
        depth: usize,
    ) -> RegistryResult<Arc<Instance>> {
        let host = self
            .host(host_id)
            .ok_or(RegistryError::HostNotFound { host_id })?;

        let mut behavior =
            self.catalog
                .create(kind)
                .map_err(|source| RegistryError::InstantiationFailure {
                    kind,
                    host_id,
                    source,
                })?;
        self.configurator.configure(behavior.as_mut());
        let instance = Arc::new(Instance::new(host_id, behavior));
        self.publish(instance_event(EventType::InstanceConfigured, &instance))
            .await;

        self.tracked.write().await.push(Arc::downgrade(&instance));
        host.attach(instance.clone()).await;
        self.publish(
            instance_event(EventType::InstanceAttached, &instance)
                .with_parameter("host_name", host.name().into()),
        )
        .await;

        if let Some(ticker) = InstanceTicker::new(&instance, &self.context, self.shutdown.clone()) {
            self.running_tickers.insert(instance.id(), ticker.spawn());
        }

        if depth < MAX_COMPOSITION_DEPTH {
            let requested = instance.compose(&self.catalog.kinds()).await;
            for composed in requested {
                if let Err(e) = self.instantiate_at_depth(host_id, composed, depth + 1).await {
                    debug!("Composed attachment of {} skipped: {}", composed, e);
                    self.failures.instantiation.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        Ok(instance)
    }

    async fn report_instantiation_failure(&self, kind: VariantKind, error: &RegistryError) {
        self.failures.instantiation.fetch_add(1, Ordering::SeqCst);
        warn!("Failed to add component {}: {}", kind, error);
        self.context
            .sink
            .write(format!("Failed to add component {}: {}", kind, error));
        self.publish(
            Event::new(EventType::InstanceFailed)
                .with_parameter("kind", kind.to_string().into())
                .with_parameter("message", error.to_string().into()),
        )
        .await;
        self.publish_error("InstantiationFailure", error.to_string(), ErrorSeverity::Warning)
            .await;
    }

    /// Pings every tracked instance that is still alive. A failing ping is
    /// logged and counted; the remaining instances are still pinged.
    #[tracing::instrument(skip(self))]
    pub async fn ping_all(&self) -> PingReport {
        let instances = self.tracked_instances().await;
        let mut report = PingReport {
            attempted: instances.len(),
            ..Default::default()
        };

        for instance in instances {
            match instance.ping().await {
                Ok(line) => {
                    report.succeeded += 1;
                    self.context.sink.write(&line);
                }
                Err(e) => {
                    report.failed += 1;
                    self.failures.ping.fetch_add(1, Ordering::SeqCst);
                    warn!("Ping error on {}: {}", instance.kind(), e);
                    self.context
                        .sink
                        .write(format!("Ping error on {}: {}", instance.kind(), e));
                    self.publish_error("PingFailure", e.to_string(), ErrorSeverity::Warning)
                        .await;
                }
            }
        }

        self.publish(
            Event::new(EventType::PingCompleted)
                .with_parameter("attempted", report.attempted.into())
                .with_parameter("succeeded", report.succeeded.into())
                .with_parameter("failed", report.failed.into()),
        )
        .await;
        report
    }

    /// Re-enumerates the catalog. Observational only: nothing is
    /// instantiated. An empty catalog counts as a failure.
    pub fn sweep(&self) -> RegistryResult<usize> {
        let discovered = self.enumerate_variant_kinds().len();
        if discovered == 0 {
            self.failures.sweep.fetch_add(1, Ordering::SeqCst);
            return Err(RegistryError::SweepFailure {
                message: "no variant kinds registered".to_string(),
            });
        }
        Ok(discovered)
    }

    /// Stops every tick loop and waits for them up to `timeout`. Loops still
    /// running after that are aborted.
    pub async fn shutdown(&self, timeout: Duration) -> RegistryResult<()> {
        self.shutdown_until(Instant::now() + timeout).await
    }

    /// Like [`shutdown`](Self::shutdown), but against an absolute deadline so
    /// callers can share one budget across several waits.
    pub async fn shutdown_until(&self, deadline: Instant) -> RegistryResult<()> {
        let started = Instant::now();
        self.shutdown.stop();
        for instance in self.tracked_instances().await {
            instance.stop();
        }

        let ids: Vec<InstanceId> = self.running_tickers.iter().map(|entry| *entry.key()).collect();
        let handles: Vec<JoinHandle<()>> = ids
            .into_iter()
            .filter_map(|id| self.running_tickers.remove(&id).map(|(_, handle)| handle))
            .collect();
        let aborts: Vec<_> = handles.iter().map(JoinHandle::abort_handle).collect();

        let joined = tokio::time::timeout_at(deadline, futures::future::join_all(handles)).await;
        if joined.is_err() {
            for abort in aborts {
                abort.abort();
            }
            return Err(RegistryError::ShutdownTimeout {
                timeout: deadline.saturating_duration_since(started),
            });
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn track_ticker(&self, id: InstanceId, handle: JoinHandle<()>) {
        self.running_tickers.insert(id, handle);
    }

    async fn prune_tracked(&self) {
        self.tracked
            .write()
            .await
            .retain(|weak| weak.strong_count() > 0);
    }

    pub(crate) async fn publish(&self, event: Event) {
        if let Err(e) = self.context.event_bus.publish(event).await {
            debug!("Event dropped: {}", e);
        }
    }

    pub(crate) async fn publish_error(
        &self,
        error_type: &str,
        message: String,
        severity: ErrorSeverity,
    ) {
        let error = ErrorEvent {
            error_type: error_type.to_string(),
            message,
            severity,
            parameters: Default::default(),
        };
        if let Err(e) = self.context.event_bus.publish_error(error).await {
            debug!("Error event dropped: {}", e);
        }
    }
}

pub(crate) fn instance_event(event_type: EventType, instance: &Instance) -> Event {
    Event::new(event_type)
        .with_parameter("instance_id", instance.id().to_string().into())
        .with_parameter("host_id", instance.host_id().to_string().into())
        .with_parameter("kind", instance.kind().to_string().into())
        .with_parameter("seed", Value::Integer(i64::from(instance.seed())))
        .with_parameter("identity_tag", instance.identity_tag().into())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rand::rngs::StdRng;

    use super::*;
    use crate::{
        configurator::identity_tag_for,
        log_sink::LineWriter,
        scheduler::TokioScheduler,
        variant::{Behavior, Identity, VariantFactory, VariantResult},
    };

    #[derive(Default)]
    struct RecordingWriter {
        lines: Mutex<Vec<String>>,
    }

    impl LineWriter for RecordingWriter {
        fn write_line(&self, line: &str) -> std::io::Result<()> {
            self.lines.lock().unwrap().push(line.to_string());
            Ok(())
        }
    }

    impl RecordingWriter {
        fn messages(&self) -> Vec<String> {
            self.lines
                .lock()
                .unwrap()
                .iter()
                .map(|line| line.split_once(" | ").unwrap().1.to_string())
                .collect()
        }
    }

    /// Reports itself as Heartbeat but refuses every ping.
    #[derive(Default)]
    struct FailingPing {
        identity: Identity,
    }

    impl Behavior for FailingPing {
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
            None
        }

        fn on_tick(&mut self, _elapsed: Duration, _rng: &mut StdRng) -> Option<String> {
            None
        }

        fn on_ping(&self) -> VariantResult<String> {
            Err(VariantError::Ping {
                kind: self.kind(),
                tag: self.identity.tag.clone(),
                message: "unreachable".to_string(),
            })
        }
    }

    fn registry_with(
        catalog: VariantCatalog,
        seed: u64,
    ) -> (ComponentRegistry, Arc<RecordingWriter>) {
        let writer = Arc::new(RecordingWriter::default());
        let context = RegistryContext {
            event_bus: Arc::new(EventBus::new(256)),
            scheduler: Arc::new(TokioScheduler),
            sink: LogSink::with_writer(writer.clone()),
            rng: SharedRng::from_seed(seed),
        };
        (ComponentRegistry::new(context, catalog), writer)
    }

    fn registry(seed: u64) -> (ComponentRegistry, Arc<RecordingWriter>) {
        registry_with(VariantCatalog::builtin(), seed)
    }

    #[test]
    fn test_enumeration_is_stable() {
        let (registry, _) = registry(1);
        let kinds = registry.enumerate_variant_kinds();
        assert_eq!(kinds.len(), 5);
        assert_eq!(registry.enumerate_variant_kinds(), kinds);
    }

    #[test]
    fn test_selection_is_reproducible() {
        let (a, _) = registry(42);
        let (b, _) = registry(42);
        for _ in 0..20 {
            assert_eq!(a.create_random_selection(4), b.create_random_selection(4));
        }
    }

    #[test]
    fn test_selection_of_empty_catalog() {
        let (registry, _) = registry_with(VariantCatalog::from_kinds(Vec::<VariantKind>::new()), 1);
        assert!(registry.create_random_selection(4).is_empty());
    }

    #[test]
    fn test_generated_names() {
        let (registry, _) = registry(3);
        let name = registry.generate_name("svc", 7);
        let parts: Vec<&str> = name.split('.').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "svc");
        assert!(HOST_NAME_PARTS.contains(&parts[1]));
        assert_eq!(parts[2], "7");
        assert!(parts[3].parse::<u32>().unwrap() < 10_000);
    }

    proptest! {
        #[test]
        fn test_selection_length_bounds(seed in any::<u64>(), max in 0usize..12) {
            let (registry, _) = registry(seed);
            let selection = registry.create_random_selection(max);
            prop_assert!(!selection.is_empty());
            prop_assert!(selection.len() <= max.max(1));
            prop_assert!(selection.iter().all(|kind| registry.catalog().contains(*kind)));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_instantiate_configures_before_tracking() {
        let (registry, writer) = registry(5);
        let host = registry.spawn_host("svc", 0).await;

        let instance = registry
            .instantiate(host.id(), VariantKind::Heartbeat)
            .await
            .unwrap();

        assert_eq!(instance.identity_tag(), identity_tag_for(instance.seed()));
        assert_eq!(registry.tracked_count().await, 1);
        assert_eq!(host.instance_count().await, 1);
        assert_eq!(registry.running_ticker_count(), 1);
        assert_eq!(
            writer.messages(),
            vec![format!("Configured Heartbeat with seed {}", instance.seed())]
        );
        registry.shutdown(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_instantiate_on_unknown_host_fails() {
        let (registry, writer) = registry(5);
        let result = registry
            .instantiate(HostId::new(), VariantKind::Sporadic)
            .await;

        assert!(matches!(result, Err(RegistryError::HostNotFound { .. })));
        assert_eq!(registry.tracked_count().await, 0);
        assert_eq!(registry.stats().instantiation, 1);
        assert!(writer.messages()[0].starts_with("Failed to add component Sporadic"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_factory_failure_tracks_nothing() {
        let failing: VariantFactory = Arc::new(|| {
            Err(VariantError::Construction {
                kind: VariantKind::Sporadic,
                message: "refused".to_string(),
            })
        });
        let catalog = VariantCatalog::builtin().with_factory(VariantKind::Sporadic, failing);
        let (registry, _) = registry_with(catalog, 5);
        let host = registry.spawn_host("svc", 0).await;

        let result = registry.instantiate(host.id(), VariantKind::Sporadic).await;

        assert!(matches!(
            result,
            Err(RegistryError::InstantiationFailure {
                kind: VariantKind::Sporadic,
                ..
            })
        ));
        assert_eq!(registry.tracked_count().await, 0);
        assert_eq!(host.instance_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_composing_attaches_up_to_three_on_same_host() {
        let (registry, _) = registry(11);
        let host = registry.spawn_host("svc", 0).await;

        let composing = registry
            .instantiate(host.id(), VariantKind::Composing)
            .await
            .unwrap();

        let instances = host.instances().await;
        let composed: Vec<VariantKind> = instances.iter().skip(1).map(|i| i.kind()).collect();
        assert_eq!(instances[0].id(), composing.id());
        assert!((2..=3).contains(&composed.len()));
        assert!(!composed.contains(&VariantKind::Composing));
        assert_eq!(registry.tracked_count().await, 1 + composed.len());
        assert!(instances.iter().all(|i| i.host_id() == host.id()));
        registry.shutdown(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_composed_failures_are_swallowed() {
        let failing: VariantFactory = Arc::new(|| {
            Err(VariantError::Construction {
                kind: VariantKind::Heartbeat,
                message: "refused".to_string(),
            })
        });
        let catalog = VariantCatalog::from_kinds([VariantKind::Composing, VariantKind::Heartbeat])
            .with_factory(VariantKind::Heartbeat, failing);
        let (registry, _) = registry_with(catalog, 11);
        let host = registry.spawn_host("svc", 0).await;

        let result = registry.instantiate(host.id(), VariantKind::Composing).await;

        assert!(result.is_ok());
        assert_eq!(host.instance_count().await, 1);
        assert!(registry.stats().instantiation >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ping_failure_does_not_abort() {
        let failing: VariantFactory =
            Arc::new(|| Ok(Box::new(FailingPing::default()) as Box<dyn Behavior>));
        let catalog = VariantCatalog::from_kinds([VariantKind::Heartbeat, VariantKind::Sporadic])
            .with_factory(VariantKind::Heartbeat, failing);
        let (registry, writer) = registry_with(catalog, 8);
        let host = registry.spawn_host("svc", 0).await;

        registry.instantiate(host.id(), VariantKind::Heartbeat).await.unwrap();
        let second = registry.instantiate(host.id(), VariantKind::Sporadic).await.unwrap();
        registry.instantiate(host.id(), VariantKind::Sporadic).await.unwrap();

        let report = registry.ping_all().await;

        assert_eq!(
            report,
            PingReport {
                attempted: 3,
                succeeded: 2,
                failed: 1
            }
        );
        assert_eq!(registry.stats().ping, 1);
        let messages = writer.messages();
        assert!(messages.iter().any(|m| m.starts_with("Ping error on Heartbeat")));
        assert!(messages.contains(&format!("Sporadic {} ping", second.identity_tag())));
        registry.shutdown(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_host_untracks_instances() {
        let (registry, _) = registry(21);
        let host = registry.spawn_host("svc", 0).await;
        let instance = registry
            .instantiate(host.id(), VariantKind::Heartbeat)
            .await
            .unwrap();
        let token = instance.stop_token();
        drop(instance);

        registry.destroy_host(host.id()).await.unwrap();

        assert!(token.is_stopped());
        assert_eq!(registry.host_count(), 0);
        assert_eq!(registry.tracked_count().await, 0);
        assert_eq!(registry.running_ticker_count(), 0);
        assert!(matches!(
            registry.destroy_host(host.id()).await,
            Err(RegistryError::HostNotFound { .. })
        ));
    }

    #[test]
    fn test_sweep_counts_kinds() {
        let (registry, _) = registry(1);
        assert_eq!(registry.sweep().unwrap(), 5);

        let (empty, _) = registry_with(VariantCatalog::from_kinds(Vec::<VariantKind>::new()), 1);
        assert!(matches!(empty.sweep(), Err(RegistryError::SweepFailure { .. })));
        assert_eq!(empty.stats().sweep, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_aborts_tickers_at_deadline() {
        let (registry, _) = registry(2);
        registry.track_ticker(InstanceId::new(), tokio::spawn(std::future::pending::<()>()));

        let started = Instant::now();
        let result = registry.shutdown_until(started + Duration::from_millis(300)).await;

        assert!(matches!(
            result,
            Err(RegistryError::ShutdownTimeout { timeout }) if timeout == Duration::from_millis(300)
        ));
        assert!(started.elapsed() < Duration::from_millis(400));
        assert_eq!(registry.running_ticker_count(), 0);
    }
}
