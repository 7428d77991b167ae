//! Collector registry and state machine.
//!
//! A collector is ACTIVE from [`CollectorRuntime::open`] until exactly one of
//! its timer, a reaction reaching the limit, or an explicit stop wins
//! [`CollectorSlot::try_claim_end`]. The winner alone runs the end path:
//! remove the slot, release its blocks, run the end hook, notify the
//! front-end.
//!
//! Locking: the slot map sits behind a short-lived std mutex (lookups,
//! inserts, removals only). Each slot carries an async mutex that serializes
//! reacts for that id and under which every end claim is taken. No lock is
//! held while any hook runs.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use protocol_core::{
    CollectorId, CollectorPrompt, EndReason, Envelope, InteractionNoticePacket, NodeId, Packet,
    ReactionCollectorEndedPacket, ReactionCollectorReactPacket, ReactionCollectorStopPacket,
    ReactionOption, RoutingContext, SubjectId, now_millis,
};

use super::outcome::{ReactOutcome, Rejection};
use super::settings::CollectorSettings;
use super::slot::CollectorSlot;
use super::view::{CollectorView, EndedCollector, ReceivedReaction};
use crate::api::{CollectorHandler, ResponseSink, Result, RuntimeError};
use crate::blocking::BlockingCoordinator;
use crate::events::{CollectorEvent, EventBus};
use crate::routing::Egress;

const TARGET: &str = "runtime::collectors";

struct Inner {
    node: NodeId,
    default_timeout: Duration,
    block_grace: Duration,
    slots: Mutex<HashMap<CollectorId, Arc<CollectorSlot>>>,
    blocking: Arc<BlockingCoordinator>,
    egress: Arc<dyn Egress>,
    events: EventBus,
}

/// Owner of every collector living on this node.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct CollectorRuntime {
    inner: Arc<Inner>,
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Runs a hook in its own task so a panic is contained.
///
/// Returns the sink only if the hook succeeded.
async fn run_hook<F>(id: &CollectorId, hook: &'static str, future: F) -> Option<ResponseSink>
where
    F: Future<Output = (anyhow::Result<()>, ResponseSink)> + Send + 'static,
{
    match tokio::spawn(future).await {
        Ok((Ok(()), sink)) => Some(sink),
        Ok((Err(err), _)) => {
            error!(target: TARGET, collector = %id, hook, error = ?err, "collector hook failed");
            None
        }
        Err(err) => {
            error!(target: TARGET, collector = %id, hook, error = %err, "collector hook panicked");
            None
        }
    }
}

impl CollectorRuntime {
    pub fn new(
        node: NodeId,
        default_timeout: Duration,
        block_grace: Duration,
        blocking: Arc<BlockingCoordinator>,
        egress: Arc<dyn Egress>,
        events: EventBus,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                node,
                default_timeout,
                block_grace,
                slots: Mutex::new(HashMap::new()),
                blocking,
                egress,
                events,
            }),
        }
    }

    pub fn node(&self) -> &NodeId {
        &self.inner.node
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, HashMap<CollectorId, Arc<CollectorSlot>>> {
        self.inner.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, id: &CollectorId) -> Option<Arc<CollectorSlot>> {
        self.slots().get(id).cloned()
    }

    pub fn is_active(&self, id: &CollectorId) -> bool {
        self.slot(id).is_some_and(|slot| slot.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.slots().len()
    }

    pub fn active_ids(&self) -> Vec<CollectorId> {
        self.slots().keys().cloned().collect()
    }

    /// Opens a collector for `prompt` and sends its creation packet to the
    /// front-end named in `context`.
    ///
    /// The collector id is generated here. `context` is re-stamped with this
    /// node so reacts find their way back.
    ///
    /// # Errors
    ///
    /// - [`RuntimeError::Descriptor`](crate::RuntimeError::Descriptor) for an
    ///   invalid descriptor (no options, zero limit, past deadline)
    /// - [`RuntimeError::Blocked`](crate::RuntimeError::Blocked) for an
    ///   exclusive collector whose subjects are already busy; nothing is sent
    /// - any egress error; the collector is then discarded without running
    ///   its end hook and its blocks are released
    pub async fn open(
        &self,
        context: RoutingContext,
        prompt: &dyn CollectorPrompt,
        settings: CollectorSettings,
        handler: Arc<dyn CollectorHandler>,
    ) -> Result<CollectorId> {
        let timeout = settings.timeout.unwrap_or(self.inner.default_timeout);
        let id = CollectorId::generate();
        let end_time = now_millis().saturating_add(duration_millis(timeout));
        let context = context.on_node(self.inner.node.clone());

        let descriptor = prompt
            .creation_packet(id.clone(), end_time, settings.main_replacement)
            .with_reaction_limit(settings.reaction_limit)
            .with_allowed_reactors(settings.allowed_reactors);
        descriptor.validate()?;
        let creation = Envelope::from_packet(context.clone(), &descriptor.creation_packet())?;
        let options = descriptor.options.len();

        let block_ttl = Some(timeout.saturating_add(self.inner.block_grace));
        if settings.exclusive {
            if let Err(reasons) = self.inner.blocking.try_block(&settings.blocks, block_ttl) {
                debug!(
                    target: TARGET,
                    initiator = %context.subject,
                    reasons = ?reasons,
                    "exclusive collector refused"
                );
                return Err(RuntimeError::Blocked { reasons });
            }
        } else {
            for (subject, reason) in &settings.blocks {
                self.inner.blocking.block(subject, *reason, block_ttl);
            }
        }

        let slot = Arc::new(CollectorSlot::new(descriptor, context, handler, settings.blocks));
        self.slots().insert(id.clone(), Arc::clone(&slot));

        if let Err(err) = self.inner.egress.send(creation).await {
            self.discard(&slot);
            return Err(err);
        }

        info!(
            target: TARGET,
            collector = %id,
            initiator = %slot.initiator(),
            options,
            timeout_ms = duration_millis(timeout),
            "collector opened"
        );
        self.inner.events.publish(CollectorEvent::Opened {
            id: id.clone(),
            initiator: slot.initiator().clone(),
            end_time,
            options,
        });

        let runtime = self.clone();
        let timer_id = id.clone();
        slot.set_timer(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            runtime.terminate(&timer_id, EndReason::Timeout).await;
        }));
        // Ended while the creation packet was in flight: the end path already
        // looked for a timer and found none.
        if !slot.is_active()
            && let Some(timer) = slot.take_timer()
        {
            timer.abort();
        }

        Ok(id)
    }

    /// Folds a react into its collector.
    ///
    /// Rejections are returned as values and answered with a soft notice to
    /// `context`; they never mutate collector state or reach any hook.
    ///
    /// The per-collector lock covers only the status check, the append, and
    /// the limit claim. The reaction hook runs after it is released, so the
    /// hook may stop its own collector and the timer is never held back by a
    /// slow hook.
    pub async fn react(&self, context: &RoutingContext, packet: ReactionCollectorReactPacket) -> ReactOutcome {
        let Some(slot) = self.slot(&packet.id) else {
            return self
                .reject(context, &packet.id, &packet.reactor_id, Rejection::UnknownCollector)
                .await;
        };

        let option = slot.descriptor().option(packet.reaction_index).cloned();
        let is_refusal = option.as_ref().is_some_and(ReactionOption::is_refusal);

        let mut reactions = slot.reactions.lock().await;
        // Every end claim is taken under this lock, so the status cannot
        // change until it is released.
        if !slot.is_active() {
            drop(reactions);
            return self
                .reject(context, &packet.id, &packet.reactor_id, Rejection::Ended)
                .await;
        }
        if !slot.may_react(&packet.reactor_id, is_refusal) {
            drop(reactions);
            return self
                .reject(context, &packet.id, &packet.reactor_id, Rejection::NotAllowed)
                .await;
        }
        let Some(option) = option else {
            drop(reactions);
            return self
                .reject(context, &packet.id, &packet.reactor_id, Rejection::InvalidIndex)
                .await;
        };

        let reaction = ReceivedReaction {
            reactor: packet.reactor_id.clone(),
            index: packet.reaction_index,
            option,
            received_at: now_millis(),
        };
        reactions.push(reaction.clone());
        let count = reactions.len();
        let view = CollectorView {
            descriptor: Arc::clone(slot.descriptor()),
            context: slot.context().clone(),
            reactions: reactions.clone(),
        };
        let ended = count >= slot.descriptor().reaction_limit as usize && slot.try_claim_end();
        let final_reactions = ended.then(|| std::mem::take(&mut *reactions));
        drop(reactions);

        debug!(
            target: TARGET,
            collector = %packet.id,
            reactor = %packet.reactor_id,
            index = packet.reaction_index,
            count,
            "reaction accepted"
        );
        self.inner.events.publish(CollectorEvent::Reacted {
            id: packet.id.clone(),
            reactor: packet.reactor_id.clone(),
            index: packet.reaction_index,
        });

        let handler = Arc::clone(slot.handler());
        let mut sink = ResponseSink::new(context.clone());
        let hook = run_hook(&packet.id, "on_reaction", async move {
            let result = handler.on_reaction(view, reaction, &mut sink).await;
            (result, sink)
        })
        .await;
        if let Some(sink) = hook {
            self.deliver(sink).await;
        }

        if let Some(final_reactions) = final_reactions {
            self.finish(slot, EndReason::LimitReached, final_reactions).await;
        }
        ReactOutcome::Accepted { ended }
    }

    /// Explicitly stops a collector. Returns false if it was not active.
    pub async fn stop(&self, id: &CollectorId) -> bool {
        self.terminate(id, EndReason::Stopped).await
    }

    /// Stop requested by a front-end.
    ///
    /// Only the initiator or a listed reactor may stop a collector.
    pub async fn stop_requested(&self, context: &RoutingContext, packet: ReactionCollectorStopPacket) -> bool {
        let Some(slot) = self.slot(&packet.id) else {
            self.notify(context, &packet.id, Rejection::UnknownCollector).await;
            return false;
        };
        if !slot.may_stop(&context.subject) {
            debug!(
                target: TARGET,
                collector = %packet.id,
                subject = %context.subject,
                "stop request from outsider ignored"
            );
            self.notify(context, &packet.id, Rejection::NotAllowed).await;
            return false;
        }
        self.terminate(&packet.id, EndReason::Stopped).await
    }

    /// Claims termination for `id` and runs the end path if the claim wins.
    pub(crate) async fn terminate(&self, id: &CollectorId, reason: EndReason) -> bool {
        let Some(slot) = self.slot(id) else {
            return false;
        };
        let mut reactions = slot.reactions.lock().await;
        if !slot.try_claim_end() {
            return false;
        }
        let final_reactions = std::mem::take(&mut *reactions);
        drop(reactions);

        self.finish(slot, reason, final_reactions).await;
        true
    }

    /// Stops every active collector (process teardown).
    pub async fn shutdown(&self) {
        for id in self.active_ids() {
            self.terminate(&id, EndReason::Stopped).await;
        }
    }

    /// End path, run once by the winner of the end claim.
    async fn finish(&self, slot: Arc<CollectorSlot>, reason: EndReason, reactions: Vec<ReceivedReaction>) {
        self.slots().remove(slot.id());
        // The timer task is the caller on the timeout path.
        if let Some(timer) = slot.take_timer()
            && reason != EndReason::Timeout
        {
            timer.abort();
        }
        self.release_blocks(&slot);

        info!(
            target: TARGET,
            collector = %slot.id(),
            reason = %reason,
            reactions = reactions.len(),
            "collector ended"
        );
        self.inner.events.publish(CollectorEvent::Ended {
            id: slot.id().clone(),
            reason,
            reactions: reactions.len(),
        });

        let ended = EndedCollector {
            descriptor: Arc::clone(slot.descriptor()),
            context: slot.context().clone(),
            reason,
            reactions,
        };
        let handler = Arc::clone(slot.handler());
        let mut sink = ResponseSink::new(slot.context().clone());
        let hook = run_hook(slot.id(), "on_end", async move {
            let result = handler.on_end(ended, &mut sink).await;
            (result, sink)
        })
        .await;

        let notice = ReactionCollectorEndedPacket {
            id: slot.id().clone(),
            reason,
        };
        match Envelope::from_packet(slot.context().clone(), &notice) {
            Ok(envelope) => self.send(envelope).await,
            Err(err) => warn!(target: TARGET, collector = %slot.id(), error = %err, "failed to build end packet"),
        }
        if let Some(sink) = hook {
            self.deliver(sink).await;
        }
    }

    /// Drops a collector whose creation packet never left the node.
    fn discard(&self, slot: &CollectorSlot) {
        if !slot.try_claim_end() {
            return;
        }
        self.slots().remove(slot.id());
        if let Some(timer) = slot.take_timer() {
            timer.abort();
        }
        self.release_blocks(slot);
        warn!(target: TARGET, collector = %slot.id(), "creation packet undeliverable, collector discarded");
    }

    fn release_blocks(&self, slot: &CollectorSlot) {
        for (subject, reason) in slot.blocks() {
            self.inner.blocking.unblock(subject, *reason);
        }
    }

    async fn reject(
        &self,
        context: &RoutingContext,
        id: &CollectorId,
        reactor: &SubjectId,
        rejection: Rejection,
    ) -> ReactOutcome {
        debug!(
            target: TARGET,
            collector = %id,
            reactor = %reactor,
            rejection = %rejection,
            "reaction rejected"
        );
        self.inner.events.publish(CollectorEvent::Rejected {
            id: id.clone(),
            reactor: reactor.clone(),
            rejection,
        });
        self.notify(context, id, rejection).await;
        ReactOutcome::Rejected(rejection)
    }

    async fn notify(&self, context: &RoutingContext, id: &CollectorId, rejection: Rejection) {
        let notice = InteractionNoticePacket {
            collector_id: Some(id.clone()),
            notice: rejection.notice(),
        };
        match Envelope::from_packet(context.clone(), &notice) {
            Ok(envelope) => self.send(envelope).await,
            Err(err) => warn!(target: TARGET, collector = %id, error = %err, "failed to build notice"),
        }
    }

    async fn deliver(&self, sink: ResponseSink) {
        for envelope in sink.into_envelopes() {
            self.send(envelope).await;
        }
    }

    async fn send(&self, envelope: Envelope) {
        let packet = envelope.name().to_owned();
        if let Err(err) = self.inner.egress.send(envelope).await {
            warn!(target: TARGET, packet = %packet, error = %err, "egress failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use protocol_core::{
        AcceptRefusePrompt, BlockReason, CollectorData, NumberedChoicePrompt,
        ReactionCollectorCreationPacket, variants,
    };

    use super::*;

    #[derive(Default)]
    struct RecordingEgress {
        sent: Mutex<Vec<Envelope>>,
    }

    impl RecordingEgress {
        fn names(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|envelope| envelope.name().to_owned())
                .collect()
        }
    }

    #[async_trait]
    impl Egress for RecordingEgress {
        async fn send(&self, envelope: Envelope) -> Result<()> {
            self.sent.lock().unwrap().push(envelope);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingHandler {
        ended: Mutex<Vec<EndedCollector>>,
        fail_reactions: bool,
    }

    #[async_trait]
    impl CollectorHandler for RecordingHandler {
        async fn on_reaction(
            &self,
            _view: CollectorView,
            _reaction: ReceivedReaction,
            _sink: &mut ResponseSink,
        ) -> anyhow::Result<()> {
            if self.fail_reactions {
                anyhow::bail!("reaction hook exploded");
            }
            Ok(())
        }

        async fn on_end(&self, ended: EndedCollector, _sink: &mut ResponseSink) -> anyhow::Result<()> {
            self.ended.lock().unwrap().push(ended);
            Ok(())
        }
    }

    fn runtime(egress: Arc<RecordingEgress>) -> (CollectorRuntime, Arc<BlockingCoordinator>) {
        let blocking = Arc::new(BlockingCoordinator::new());
        let runtime = CollectorRuntime::new(
            NodeId::from("node-a"),
            Duration::from_secs(60),
            Duration::from_secs(5),
            Arc::clone(&blocking),
            egress,
            EventBus::new(),
        );
        (runtime, blocking)
    }

    fn ctx(subject: &str) -> RoutingContext {
        RoutingContext::new(subject, "bot", "elsewhere")
    }

    fn react(id: &CollectorId, reactor: &str, index: u32) -> ReactionCollectorReactPacket {
        ReactionCollectorReactPacket {
            id: id.clone(),
            reactor_id: reactor.into(),
            reaction_index: index,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn open_sends_creation_stamped_with_this_node() {
        let egress = Arc::new(RecordingEgress::default());
        let (runtime, _) = runtime(Arc::clone(&egress));
        let handler = Arc::new(RecordingHandler::default());

        let id = runtime
            .open(
                ctx("u-1"),
                &AcceptRefusePrompt::new(CollectorData::default()),
                CollectorSettings::new().allow("u-1"),
                handler,
            )
            .await
            .unwrap();

        let sent = egress.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].context.node, NodeId::from("node-a"));
        let creation: ReactionCollectorCreationPacket = sent[0].packet.decode().unwrap();
        assert_eq!(creation.id, id);
        assert_eq!(creation.allowed_reactor_ids, vec![SubjectId::from("u-1")]);
        assert!(runtime.is_active(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn failing_reaction_hook_does_not_prevent_the_end() {
        let egress = Arc::new(RecordingEgress::default());
        let (runtime, _) = runtime(Arc::clone(&egress));
        let handler = Arc::new(RecordingHandler {
            fail_reactions: true,
            ..Default::default()
        });

        let id = runtime
            .open(
                ctx("u-1"),
                &NumberedChoicePrompt::new(3, CollectorData::default()),
                CollectorSettings::new(),
                handler.clone(),
            )
            .await
            .unwrap();

        let outcome = runtime.react(&ctx("u-9"), react(&id, "u-9", 2)).await;

        assert_eq!(outcome, ReactOutcome::Accepted { ended: true });
        let ended = handler.ended.lock().unwrap();
        assert_eq!(ended.len(), 1);
        assert_eq!(ended[0].reason, EndReason::LimitReached);
        assert_eq!(ended[0].reactions[0].index, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_index_is_rejected_with_a_notice() {
        let egress = Arc::new(RecordingEgress::default());
        let (runtime, _) = runtime(Arc::clone(&egress));

        let id = runtime
            .open(
                ctx("u-1"),
                &AcceptRefusePrompt::new(CollectorData::default()),
                CollectorSettings::new(),
                Arc::new(RecordingHandler::default()),
            )
            .await
            .unwrap();

        let outcome = runtime.react(&ctx("u-1"), react(&id, "u-1", 7)).await;

        assert_eq!(outcome, ReactOutcome::Rejected(Rejection::InvalidIndex));
        assert!(runtime.is_active(&id));
        assert_eq!(
            egress.names().last().map(String::as_str),
            Some(InteractionNoticePacket::NAME)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn initiator_refusal_ends_a_restricted_collector() {
        let egress = Arc::new(RecordingEgress::default());
        let (runtime, _) = runtime(Arc::clone(&egress));
        let handler = Arc::new(RecordingHandler::default());

        let id = runtime
            .open(
                ctx("u-1"),
                &AcceptRefusePrompt::new(CollectorData::default()),
                CollectorSettings::new().allow("u-2"),
                handler.clone(),
            )
            .await
            .unwrap();

        assert_eq!(
            runtime.react(&ctx("u-1"), react(&id, "u-1", 0)).await,
            ReactOutcome::Rejected(Rejection::NotAllowed)
        );
        assert_eq!(
            runtime.react(&ctx("u-1"), react(&id, "u-1", 1)).await,
            ReactOutcome::Accepted { ended: true }
        );

        let ended = handler.ended.lock().unwrap();
        assert!(ended[0].first_is(variants::REFUSE));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_requests_from_outsiders_are_ignored() {
        let egress = Arc::new(RecordingEgress::default());
        let (runtime, blocking) = runtime(Arc::clone(&egress));
        let handler = Arc::new(RecordingHandler::default());

        let id = runtime
            .open(
                ctx("u-1"),
                &AcceptRefusePrompt::new(CollectorData::default()),
                CollectorSettings::new()
                    .allow("u-2")
                    .block("u-1", BlockReason::Trade),
                handler.clone(),
            )
            .await
            .unwrap();
        assert!(blocking.is_blocked_for(&"u-1".into(), BlockReason::Trade));

        let stop = ReactionCollectorStopPacket { id: id.clone() };
        assert!(!runtime.stop_requested(&ctx("u-3"), stop.clone()).await);
        assert!(runtime.is_active(&id));

        assert!(runtime.stop_requested(&ctx("u-1"), stop).await);
        assert!(!runtime.is_active(&id));
        assert!(!blocking.is_blocked(&"u-1".into()));
        assert_eq!(handler.ended.lock().unwrap()[0].reason, EndReason::Stopped);
        assert_eq!(
            egress.names().last().map(String::as_str),
            Some(ReactionCollectorEndedPacket::NAME)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_after_end_is_a_noop() {
        let egress = Arc::new(RecordingEgress::default());
        let (runtime, _) = runtime(egress);
        let handler = Arc::new(RecordingHandler::default());

        let id = runtime
            .open(
                ctx("u-1"),
                &AcceptRefusePrompt::new(CollectorData::default()),
                CollectorSettings::new().timeout(Duration::from_secs(1)),
                handler.clone(),
            )
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!runtime.stop(&id).await);
        assert_eq!(handler.ended.lock().unwrap().len(), 1);
        assert_eq!(handler.ended.lock().unwrap()[0].reason, EndReason::Timeout);
    }
}
