//! # Registry events
//!
//! The registry reports everything it does on a broadcast [`EventBus`]:
//!
//! ```text
//! ┌──────────┐     ┌──────────┐     ┌──────────┐
//! │ Registry │────▶│ EventBus │────▶│Subscriber│
//! └──────────┘     └──────────┘     └──────────┘
//!                       ▲
//!   signal_ready() ─────┘  (EventType::Ready, announced once)
//! ```
//!
//! Regular events and error events use separate channels; see
//! [`event_bus`] for details.

pub mod event_bus;
pub mod event_type;

pub use event_bus::{
    ErrorEvent, ErrorReceiver, ErrorSeverity, Event, EventBus, EventError, EventReceiver,
    EventResult, Value,
};
pub use event_type::EventType;
