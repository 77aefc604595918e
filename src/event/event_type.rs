/// Kinds of event published on the [`EventBus`](super::event_bus::EventBus).
#[derive(
    Debug, Clone, PartialEq, Hash, Eq, strum::EnumString, strum::Display, Default, PartialOrd, Ord,
)]
pub enum EventType {
    // Host / instance lifecycle
    #[default]
    HostSpawned,
    HostDestroyed,
    InstanceConfigured,
    InstanceAttached,
    InstanceFailed,
    InstanceTicked,
    // Ready signal and the ping pass it triggers
    Ready,
    PingCompleted,
    // Sweep
    SweepCompleted,
    SweepFailed,
    // SystemLifecycle
    SystemStarting,
    SystemStarted,
    SystemStopping,
    SystemStopped,
}
