use std::{path::Path, sync::Arc, time::Duration};

use tokio::{sync::Mutex, task::JoinHandle, time::Instant};
use tracing::{debug, info, warn};

use crate::{
    config::{DelayRange, SystemConfig},
    event::{Event, EventBus, EventType},
    log_sink::LogSink,
    random::SharedRng,
    registry::{ComponentRegistry, FailureStats, RegistryContext},
    scheduler::{ReadySignal, Scheduler, StopToken, TokioScheduler},
    sweep::PeriodicSweep,
    timestamp::Timestamp,
    variant::VariantCatalog,
    InternalResult,
};

/// Snapshot of what the system currently holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemStatus {
    pub seed: u64,
    pub host_count: usize,
    pub tracked_count: usize,
    pub running_tickers: usize,
    pub failures: FailureStats,
}

/// Owns the registry and the background routines built on it.
///
/// ```text
/// new()    seed, log file, "Awake"
/// start()  ready listener -> bootstrap -> spawn -> sweep
/// signal_ready()  ready latch -> listener pings every instance once
/// shutdown()      stop tokens, drain tasks before one deadline
/// ```
pub struct System {
    config: SystemConfig,
    seed: u64,
    event_bus: Arc<EventBus>,
    registry: ComponentRegistry,
    stop: StopToken,
    ready: ReadySignal,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl System {
    /// Built-in catalog, tokio timers, and a per-run log file in `config.log_dir`.
    pub fn new(config: SystemConfig) -> Self {
        let started_at = Timestamp::now();
        let sink = LogSink::per_run(&config.log_dir, &started_at);
        Self::with_components(
            config,
            VariantCatalog::builtin(),
            sink,
            Arc::new(TokioScheduler),
        )
    }

    pub fn with_components(
        config: SystemConfig,
        catalog: VariantCatalog,
        sink: LogSink,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let seed = config
            .seed
            .unwrap_or_else(|| Timestamp::now().millis_since_epoch());
        let event_bus = Arc::new(EventBus::new(config.event_buffer_size));
        let context = RegistryContext {
            event_bus: event_bus.clone(),
            scheduler,
            sink: sink.clone(),
            rng: SharedRng::from_seed(seed),
        };

        info!(seed, log_file = ?sink.path(), "system created");
        sink.write(format!("Awake - seed {}", seed));

        Self {
            config,
            seed,
            event_bus,
            registry: ComponentRegistry::new(context, catalog),
            stop: StopToken::new(),
            ready: ReadySignal::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        self.event_bus.clone()
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.registry.context().sink.path()
    }

    /// Launches the startup routines. Returns once they are scheduled; hosts
    /// appear as the routines progress.
    pub async fn start(&self) -> InternalResult<()> {
        self.event_bus
            .publish(Event::new(EventType::SystemStarting))
            .await?;

        let mut tasks = self.tasks.lock().await;
        tasks.push(tokio::spawn(ready_listener(
            self.registry.clone(),
            self.ready.clone(),
            self.config.console_faces.clone(),
            self.stop.clone(),
        )));

        if self.config.bootstrap_enabled {
            tasks.push(tokio::spawn(bootstrap(
                self.registry.clone(),
                self.config.bootstrap_delay,
                self.stop.clone(),
            )));
        }

        tasks.push(tokio::spawn(spawn_hosts(
            self.registry.clone(),
            self.config.effective_spawn_count(),
            self.config.effective_max_components(),
            self.config.spawn_delay,
            self.stop.clone(),
        )));

        tasks.push(
            PeriodicSweep::new(
                self.registry.clone(),
                self.config.sweep_interval,
                self.stop.clone(),
            )
            .spawn(),
        );
        drop(tasks);

        self.event_bus
            .publish(Event::new(EventType::SystemStarted))
            .await?;
        info!("system started");
        Ok(())
    }

    /// Fires the one-shot ready signal and announces it on the bus. Later
    /// calls are no-ops.
    pub async fn signal_ready(&self) -> InternalResult<()> {
        if !self.ready.fire() {
            debug!("Ready signal already fired");
            return Ok(());
        }
        self.event_bus
            .publish(
                Event::new(EventType::Ready)
                    .with_parameter("at", Timestamp::now().to_string().into()),
            )
            .await?;
        Ok(())
    }

    pub async fn status(&self) -> SystemStatus {
        SystemStatus {
            seed: self.seed,
            host_count: self.registry.host_count(),
            tracked_count: self.registry.tracked_count().await,
            running_tickers: self.registry.running_ticker_count(),
            failures: self.registry.stats(),
        }
    }

    /// Stops every routine and tick loop. Tickers and routines share one
    /// deadline, `shutdown_timeout` from now; stragglers are aborted.
    pub async fn shutdown(&self) -> InternalResult<()> {
        self.event_bus
            .publish(Event::new(EventType::SystemStopping))
            .await?;
        info!("system stopping");

        self.stop.stop();
        let timeout = self.config.shutdown_timeout;
        let deadline = Instant::now() + timeout;
        let registry_result = self.registry.shutdown_until(deadline).await;

        let handles: Vec<JoinHandle<()>> = self.tasks.lock().await.drain(..).collect();
        let aborts: Vec<_> = handles.iter().map(JoinHandle::abort_handle).collect();
        if tokio::time::timeout_at(deadline, futures::future::join_all(handles))
            .await
            .is_err()
        {
            warn!("Background tasks still running after {:?}; aborting", timeout);
            for abort in aborts {
                abort.abort();
            }
        }

        self.event_bus
            .publish(Event::new(EventType::SystemStopped))
            .await?;
        info!("system stopped");
        registry_result?;
        Ok(())
    }
}

/// Waits `delay` unless `stop` fires first. Returns whether the wait completed.
async fn wait_or_stop(scheduler: &dyn Scheduler, delay: Duration, stop: &StopToken) -> bool {
    tokio::select! {
        biased;
        _ = stop.stopped() => false,
        _ = scheduler.after(delay) => true,
    }
}

/// One `mdl` host per catalog kind, each holding one instance of that kind.
/// A host whose instantiation fails is discarded.
async fn bootstrap(registry: ComponentRegistry, delay: DelayRange, stop: StopToken) {
    let context = registry.context().clone();
    let delay = context.rng.duration_between(delay.as_range());
    if !wait_or_stop(context.scheduler.as_ref(), delay, &stop).await {
        return;
    }

    let kinds = registry.enumerate_variant_kinds();
    context
        .sink
        .write(format!("Bootstrap found {} variant kinds", kinds.len()));
    for (index, kind) in kinds.into_iter().enumerate() {
        if stop.is_stopped() {
            return;
        }
        let host = registry.spawn_host("mdl", index).await;
        if registry.instantiate(host.id(), kind).await.is_err() {
            debug!("Discarding bootstrap host {}", host.name());
            let _ = registry.destroy_host(host.id()).await;
        }
    }
}

/// `count` `svc` hosts, each with a random selection of kinds, spaced by a
/// random delay. Failed instantiations leave the host in place.
async fn spawn_hosts(
    registry: ComponentRegistry,
    count: usize,
    max_components: usize,
    delay: DelayRange,
    stop: StopToken,
) {
    let context = registry.context().clone();
    for index in 0..count {
        if stop.is_stopped() {
            return;
        }
        let host = registry.spawn_host("svc", index).await;
        for kind in registry.create_random_selection(max_components) {
            // Failures are already reported by the registry.
            let _ = registry.instantiate(host.id(), kind).await;
        }

        let wait = context.rng.duration_between(delay.as_range());
        if !wait_or_stop(context.scheduler.as_ref(), wait, &stop).await {
            return;
        }
    }
    info!(count, "host spawning finished");
}

/// Waits for the ready signal, logs it, and pings every tracked instance once.
async fn ready_listener(
    registry: ComponentRegistry,
    ready: ReadySignal,
    display: String,
    stop: StopToken,
) {
    tokio::select! {
        biased;
        _ = stop.stopped() => return,
        _ = ready.fired() => {}
    }

    let sink = &registry.context().sink;
    sink.write(format!("Ready signal received at {}", Timestamp::now()));
    sink.write(&display);
    let report = registry.ping_all().await;
    info!(
        attempted = report.attempted,
        succeeded = report.succeeded,
        failed = report.failed,
        "ready ping finished"
    );
}
