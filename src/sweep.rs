use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{
    config::DelayRange,
    event::{ErrorSeverity, Event, EventType},
    registry::ComponentRegistry,
    scheduler::StopToken,
    timestamp::Timestamp,
};

/// Background loop re-enumerating the catalog on a randomized interval.
///
/// The wait is drawn fresh from the shared stream before every cycle. The
/// loop exits at the next suspension point after its stop token or the
/// registry's shutdown token fires.
pub struct PeriodicSweep {
    registry: ComponentRegistry,
    interval: DelayRange,
    stop: StopToken,
}

impl PeriodicSweep {
    pub fn new(registry: ComponentRegistry, interval: DelayRange, stop: StopToken) -> Self {
        Self {
            registry,
            interval,
            stop,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        let rng = self.registry.context().rng.clone();
        let range = self.interval.as_range();
        let mut cycles = self
            .registry
            .context()
            .scheduler
            .every(Box::new(move || rng.duration_between(range.clone())));
        let shutdown = self.registry.shutdown_token();

        debug!(interval = ?self.interval, "sweep started");
        loop {
            tokio::select! {
                biased;
                _ = self.stop.stopped() => break,
                _ = shutdown.stopped() => break,
                next = cycles.next() => {
                    if next.is_none() {
                        break;
                    }
                }
            }
            self.sweep_once().await;
        }
        debug!("sweep stopped");
    }

    async fn sweep_once(&self) {
        let sink = &self.registry.context().sink;
        match self.registry.sweep() {
            Ok(discovered) => {
                sink.write(format!(
                    "Sweep discovered {} variant kinds at {}",
                    discovered,
                    Timestamp::now()
                ));
                self.registry
                    .publish(
                        Event::new(EventType::SweepCompleted)
                            .with_parameter("discovered", discovered.into()),
                    )
                    .await;
            }
            Err(e) => {
                warn!("Sweep failure: {}", e);
                sink.write(format!("Sweep failure: {}", e));
                self.registry
                    .publish(
                        Event::new(EventType::SweepFailed)
                            .with_parameter("message", e.to_string().into()),
                    )
                    .await;
                self.registry
                    .publish_error("SweepFailure", e.to_string(), ErrorSeverity::Warning)
                    .await;
            }
        }
    }
}
