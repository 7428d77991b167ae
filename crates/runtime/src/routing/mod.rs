//! Front-end links, egress, and node-sticky routing.

mod outbound;
mod router;

pub use outbound::{ChannelOutbound, Egress, Outbound};
pub use router::NodeRouter;
