//! Ephemeral, node-local collector state.

mod outcome;
mod runtime;
mod settings;
mod slot;
mod view;

pub use outcome::{ReactOutcome, Rejection};
pub use runtime::CollectorRuntime;
pub use settings::CollectorSettings;
pub use slot::{CollectorSlot, CollectorStatus};
pub use view::{CollectorView, EndedCollector, ReceivedReaction};
