//! Public runtime API surface.
//!
//! This module gathers the types exposed to game code so the collector,
//! dispatch, and routing layers can stay focused on orchestration.

pub mod errors;
pub mod handle;
pub mod handlers;
pub mod sink;

pub use errors::{Result, RuntimeError};
pub use handle::RuntimeHandle;
pub use handlers::{CollectorHandler, HandlerContext, HandlerCriticality, PacketHandler};
pub use sink::ResponseSink;
