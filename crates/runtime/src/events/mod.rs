//! Topic-based event bus for runtime events.
//!
//! Collector lifecycle and dispatch failures are published to specific
//! topics so observers (metrics exporters, tests) subscribe only to what they
//! need.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{CollectorEvent, DispatchEvent};
