//! Relay node composition: configuration, logging, the stdio front-end link,
//! and the features this node hosts.
pub mod config;
pub mod features;
pub mod logging;
pub mod resolver;
pub mod stdio;

use std::sync::Arc;

use runtime::{Runtime, RuntimeBuilder};

pub use config::NodeConfig;
pub use resolver::HandleResolver;

/// Builder with this node's configuration, features, and resolver applied.
/// Links are added by the caller.
pub fn builder(config: &NodeConfig) -> runtime::Result<RuntimeBuilder> {
    let builder = Runtime::builder()
        .config(config.runtime.clone())
        .resolver(Arc::new(HandleResolver));
    features::install(builder)
}
