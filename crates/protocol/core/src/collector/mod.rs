//! Collector descriptors and the prompt builders that produce them.
//!
//! A collector is a server-declared, time-bounded prompt with a finite list of
//! options. Every option and the shared data carry an explicit string
//! discriminant (see [`variants`]) because front-ends receive plain data and
//! cannot recover Rust types. Prompt kinds differ only in the options they
//! build, never in wire machinery.

mod descriptor;
mod prompt;
mod prompts;

pub use descriptor::{CollectorData, CollectorDescriptor, Payload, ReactionOption};
pub use prompt::CollectorPrompt;
pub use prompts::{AcceptRefusePrompt, AmountTierPrompt, NamedOptionsPrompt, NumberedChoicePrompt};

/// Stable discriminants for reaction options shared by the built-in prompts.
pub mod variants {
    pub const ACCEPT: &str = "accept";
    /// The designated refusal option. The collector's initiator may always
    /// select it, even when the collector is restricted to other reactors.
    pub const REFUSE: &str = "refuse";
    pub const NUMBER: &str = "number";
    pub const AMOUNT: &str = "amount";
    pub const NAMED: &str = "named";
    /// Shared data of a collector that carries no feature payload.
    pub const NONE: &str = "none";
}
