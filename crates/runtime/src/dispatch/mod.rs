//! Handler dispatch.

mod dispatcher;
mod registry;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use registry::{HandlerRegistry, SYSTEM_ROUTES};
