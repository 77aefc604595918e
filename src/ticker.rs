use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::{
    event::{EventBus, EventType},
    instance::{Instance, InstanceId},
    log_sink::LogSink,
    registry::{instance_event, RegistryContext},
    scheduler::{Scheduler, StopToken},
};

/// Drives one instance's tick loop.
///
/// Holds only a weak reference: the loop ends when the instance is dropped,
/// when its own stop token fires, or when the registry shuts down.
pub struct InstanceTicker {
    instance: Weak<Instance>,
    instance_id: InstanceId,
    interval: Duration,
    stop: StopToken,
    shutdown: StopToken,
    scheduler: Arc<dyn Scheduler>,
    sink: LogSink,
    event_bus: Arc<EventBus>,
}

impl InstanceTicker {
    /// Returns `None` for instances without a tick loop.
    pub fn new(
        instance: &Arc<Instance>,
        context: &RegistryContext,
        shutdown: StopToken,
    ) -> Option<Self> {
        let interval = instance.tick_interval()?;
        Some(Self {
            instance: Arc::downgrade(instance),
            instance_id: instance.id(),
            interval,
            stop: instance.stop_token(),
            shutdown,
            scheduler: context.scheduler.clone(),
            sink: context.sink.clone(),
            event_bus: context.event_bus.clone(),
        })
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        let interval = self.interval;
        debug!(instance_id = %self.instance_id, ?interval, "ticker started");
        let mut ticks = self.scheduler.every(Box::new(move || interval));

        loop {
            let elapsed = tokio::select! {
                biased;
                _ = self.stop.stopped() => break,
                _ = self.shutdown.stopped() => break,
                next = ticks.next() => match next {
                    Some(elapsed) => elapsed,
                    None => break,
                },
            };

            let Some(instance) = self.instance.upgrade() else {
                break;
            };
            if let Some(line) = instance.tick(elapsed).await {
                self.sink.write(&line);
                let event = instance_event(EventType::InstanceTicked, &instance)
                    .with_parameter("elapsed", elapsed.into());
                if let Err(e) = self.event_bus.publish(event).await {
                    trace!("Tick event dropped: {}", e);
                }
            }
        }

        debug!(instance_id = %self.instance_id, "ticker stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{
        instance::HostId,
        log_sink::LineWriter,
        random::SharedRng,
        scheduler::TokioScheduler,
        variant::VariantKind,
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
        fn count(&self) -> usize {
            self.lines.lock().unwrap().len()
        }
    }

    fn setup() -> (RegistryContext, Arc<RecordingWriter>) {
        let writer = Arc::new(RecordingWriter::default());
        let context = RegistryContext {
            event_bus: Arc::new(EventBus::new(64)),
            scheduler: Arc::new(TokioScheduler),
            sink: LogSink::with_writer(writer.clone()),
            rng: SharedRng::from_seed(1),
        };
        (context, writer)
    }

    fn heartbeat(seed: u32) -> Arc<Instance> {
        let mut behavior = VariantKind::Heartbeat.create();
        behavior.set_seed(seed);
        behavior.set_identity_tag(format!("tag-{}", seed));
        Arc::new(Instance::new(HostId::new(), behavior))
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_ticks_on_its_interval() {
        let (context, writer) = setup();
        let instance = heartbeat(0); // 300ms
        let handle = InstanceTicker::new(&instance, &context, StopToken::new())
            .unwrap()
            .spawn();

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(writer.count(), 3);

        instance.stop();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_instance_ends_loop() {
        let (context, writer) = setup();
        let instance = heartbeat(0);
        let handle = InstanceTicker::new(&instance, &context, StopToken::new())
            .unwrap()
            .spawn();

        tokio::time::sleep(Duration::from_millis(350)).await;
        drop(instance);
        handle.await.unwrap();
        let seen = writer.count();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(writer.count(), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_token_ends_loop() {
        let (context, _) = setup();
        let instance = heartbeat(5);
        let shutdown = StopToken::new();
        let handle = InstanceTicker::new(&instance, &context, shutdown.clone())
            .unwrap()
            .spawn();

        shutdown.stop();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_composing_has_no_ticker() {
        let (context, _) = setup();
        let instance = Arc::new(Instance::new(HostId::new(), VariantKind::Composing.create()));
        assert!(InstanceTicker::new(&instance, &context, StopToken::new()).is_none());
    }
}
