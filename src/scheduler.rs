//! Scheduling contract used by the registry.
//!
//! The registry never touches timers directly. It asks a [`Scheduler`] for a
//! one-off delay ([`Scheduler::after`]) or a repeating sequence of suspension
//! points ([`Scheduler::every`]), and every loop built on top of them watches
//! a [`StopToken`] at each suspension point.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::{stream::BoxStream, StreamExt};
use tokio::{sync::watch, time::Instant};

/// Supplies the wait before each repetition of [`Scheduler::every`].
pub type IntervalProvider = Box<dyn FnMut() -> Duration + Send>;

#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn after(&self, delay: Duration);

    /// Yields the time elapsed since the stream was created, once per
    /// interval. The provider is consulted before every wait.
    fn every(&self, interval: IntervalProvider) -> BoxStream<'static, Duration>;
}

/// Scheduler backed by tokio timers. Honors a paused test clock.
#[derive(Debug, Default, Clone)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn after(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }

    fn every(&self, interval: IntervalProvider) -> BoxStream<'static, Duration> {
        let started = Instant::now();
        futures::stream::unfold(interval, move |mut interval| async move {
            let delay = interval();
            tokio::time::sleep(delay).await;
            Some((started.elapsed(), interval))
        })
        .boxed()
    }
}

/// One-way boolean flag that wakes every waiter when set.
#[derive(Clone)]
struct Latch {
    sender: Arc<watch::Sender<bool>>,
}

impl Latch {
    fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Returns whether this call flipped the flag.
    fn set(&self) -> bool {
        !self.sender.send_replace(true)
    }

    fn is_set(&self) -> bool {
        *self.sender.borrow()
    }

    async fn wait(&self) {
        let mut receiver = self.sender.subscribe();
        loop {
            if *receiver.borrow_and_update() {
                return;
            }
            if receiver.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Cooperative cancellation flag shared by a loop and whoever owns it.
#[derive(Clone)]
pub struct StopToken {
    latch: Latch,
}

impl StopToken {
    pub fn new() -> Self {
        Self {
            latch: Latch::new(),
        }
    }

    pub fn stop(&self) {
        self.latch.set();
    }

    pub fn is_stopped(&self) -> bool {
        self.latch.is_set()
    }

    /// Resolves once [`stop`](Self::stop) has been called, immediately if it already was.
    pub async fn stopped(&self) {
        self.latch.wait().await
    }
}

impl Default for StopToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StopToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopToken")
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// One-shot ready signal. Independent of any event buffer, so a waiter that
/// starts late or falls behind still observes it.
#[derive(Clone)]
pub struct ReadySignal {
    latch: Latch,
}

impl ReadySignal {
    pub fn new() -> Self {
        Self {
            latch: Latch::new(),
        }
    }

    /// Returns `false` if the signal had already fired.
    pub fn fire(&self) -> bool {
        self.latch.set()
    }

    pub fn is_fired(&self) -> bool {
        self.latch.is_set()
    }

    pub async fn fired(&self) {
        self.latch.wait().await
    }
}

impl Default for ReadySignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ReadySignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadySignal")
            .field("fired", &self.is_fired())
            .finish()
    }
}
