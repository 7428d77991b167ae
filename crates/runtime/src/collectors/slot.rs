//! Runtime state of one collector.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;

use protocol_core::{BlockReason, CollectorDescriptor, CollectorId, RoutingContext, SubjectId};

use super::view::ReceivedReaction;
use crate::api::CollectorHandler;

const ACTIVE: u8 = 0;
const ENDED: u8 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum CollectorStatus {
    Active,
    Ended,
}

/// A live collector owned by this node.
///
/// `status` only ever moves from active to ended, through
/// [`try_claim_end`](Self::try_claim_end). The reactions list is guarded by an
/// async mutex that also serializes every react for this id; the runtime
/// claims the end while holding it.
pub struct CollectorSlot {
    descriptor: Arc<CollectorDescriptor>,
    context: RoutingContext,
    handler: Arc<dyn CollectorHandler>,
    blocks: Vec<(SubjectId, BlockReason)>,
    status: AtomicU8,
    pub(crate) reactions: tokio::sync::Mutex<Vec<ReceivedReaction>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl CollectorSlot {
    pub(crate) fn new(
        descriptor: CollectorDescriptor,
        context: RoutingContext,
        handler: Arc<dyn CollectorHandler>,
        blocks: Vec<(SubjectId, BlockReason)>,
    ) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
            context,
            handler,
            blocks,
            status: AtomicU8::new(ACTIVE),
            reactions: tokio::sync::Mutex::new(Vec::new()),
            timer: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &CollectorId {
        &self.descriptor.id
    }

    pub fn descriptor(&self) -> &Arc<CollectorDescriptor> {
        &self.descriptor
    }

    /// Context of the creating request (already stamped with this node).
    pub fn context(&self) -> &RoutingContext {
        &self.context
    }

    /// Subject that opened the collector.
    pub fn initiator(&self) -> &SubjectId {
        &self.context.subject
    }

    pub(crate) fn handler(&self) -> &Arc<dyn CollectorHandler> {
        &self.handler
    }

    pub(crate) fn blocks(&self) -> &[(SubjectId, BlockReason)] {
        &self.blocks
    }

    pub fn status(&self) -> CollectorStatus {
        match self.status.load(Ordering::Acquire) {
            ACTIVE => CollectorStatus::Active,
            _ => CollectorStatus::Ended,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status() == CollectorStatus::Active
    }

    /// Atomically moves the collector to ended.
    ///
    /// Exactly one caller ever gets `true`; that caller owns the end path.
    pub fn try_claim_end(&self) -> bool {
        self.status
            .compare_exchange(ACTIVE, ENDED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Whether `reactor` may pick an option (`is_refusal` for the refusal one).
    ///
    /// The initiator may always pick the refusal option, even when the allow
    /// list excludes them.
    pub(crate) fn may_react(&self, reactor: &SubjectId, is_refusal: bool) -> bool {
        self.descriptor.is_allowed(reactor) || (is_refusal && reactor == self.initiator())
    }

    /// Whether `subject` may stop the collector from a front-end.
    pub(crate) fn may_stop(&self, subject: &SubjectId) -> bool {
        subject == self.initiator() || self.descriptor.allowed_reactor_ids.contains(subject)
    }

    pub(crate) fn set_timer(&self, timer: JoinHandle<()>) {
        *self.timer.lock().unwrap_or_else(PoisonError::into_inner) = Some(timer);
    }

    pub(crate) fn take_timer(&self) -> Option<JoinHandle<()>> {
        self.timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
