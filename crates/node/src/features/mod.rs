//! Game features hosted by this node.
pub mod invite;

use std::sync::Arc;

use runtime::RuntimeBuilder;

pub use invite::{InviteCommandPacket, InviteHandler, InviteResultPacket};

/// Registers every feature's packets and handlers.
pub fn install(builder: RuntimeBuilder) -> runtime::Result<RuntimeBuilder> {
    builder
        .packet::<InviteCommandPacket>()?
        .packet::<InviteResultPacket>()?
        .handler::<InviteCommandPacket>(Arc::new(InviteHandler))
}
