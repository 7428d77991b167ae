//! Per-subject interaction blocks.
//!
//! A block marks a subject as busy with some kind of interaction (a fight, a
//! trade, a pending invite) so game logic can refuse to start a conflicting
//! one. Entries are keyed by (subject, reason); reasons never interfere with
//! each other.
//!
//! The coordinator is process-local and constructed explicitly by the
//! runtime builder. Nothing is persisted: blocks owned by a collector are
//! released when it ends, and every collector block also carries an expiry so
//! a lost collector cannot pin a subject forever.

use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use protocol_core::{BlockReason, SubjectId};

type Entries = HashMap<SubjectId, HashMap<BlockReason, Option<Instant>>>;

fn live(expiry: &Option<Instant>, now: Instant) -> bool {
    expiry.is_none_or(|at| at > now)
}

/// A TTL too large to represent never expires.
fn expiry_after(ttl: Option<Duration>) -> Option<Instant> {
    ttl.and_then(|ttl| Instant::now().checked_add(ttl))
}

fn live_reasons(entries: &Entries, subject: &SubjectId, now: Instant) -> BTreeSet<BlockReason> {
    entries
        .get(subject)
        .map(|reasons| {
            reasons
                .iter()
                .filter(|(_, expiry)| live(expiry, now))
                .map(|(reason, _)| *reason)
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Default)]
pub struct BlockingCoordinator {
    entries: RwLock<Entries>,
}

impl BlockingCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks `subject` for `reason`. Re-blocking replaces the expiry.
    pub fn block(&self, subject: &SubjectId, reason: BlockReason, ttl: Option<Duration>) {
        let expiry = expiry_after(ttl);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries
            .entry(subject.clone())
            .or_default()
            .insert(reason, expiry);
        debug!(
            target: "runtime::blocking",
            subject = %subject,
            reason = %reason,
            ttl_ms = ttl.map(|ttl| ttl.as_millis() as u64),
            "blocked"
        );
    }

    /// Blocks every `(subject, reason)` pair only if none of those subjects
    /// is busy yet.
    ///
    /// Check and insert happen under one write lock, so two callers racing
    /// for the same subject cannot both succeed.
    ///
    /// # Errors
    ///
    /// The live reasons already held by the requested subjects; nothing is
    /// blocked in that case.
    pub fn try_block(
        &self,
        blocks: &[(SubjectId, BlockReason)],
        ttl: Option<Duration>,
    ) -> Result<(), BTreeSet<BlockReason>> {
        let now = Instant::now();
        let expiry = expiry_after(ttl);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        let busy: BTreeSet<BlockReason> = blocks
            .iter()
            .flat_map(|(subject, _)| live_reasons(&entries, subject, now))
            .collect();
        if !busy.is_empty() {
            debug!(target: "runtime::blocking", reasons = ?busy, "block refused, subject busy");
            return Err(busy);
        }

        for (subject, reason) in blocks {
            entries
                .entry(subject.clone())
                .or_default()
                .insert(*reason, expiry);
            debug!(target: "runtime::blocking", subject = %subject, reason = %reason, "blocked");
        }
        Ok(())
    }

    /// Removes the (subject, reason) entry. Returns false if there was none.
    pub fn unblock(&self, subject: &SubjectId, reason: BlockReason) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let Some(reasons) = entries.get_mut(subject) else {
            return false;
        };
        let removed = reasons.remove(&reason).is_some();
        if reasons.is_empty() {
            entries.remove(subject);
        }
        if removed {
            debug!(target: "runtime::blocking", subject = %subject, reason = %reason, "unblocked");
        }
        removed
    }

    /// Live block reasons for `subject`.
    pub fn reasons(&self, subject: &SubjectId) -> BTreeSet<BlockReason> {
        let now = Instant::now();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        live_reasons(&entries, subject, now)
    }

    pub fn is_blocked(&self, subject: &SubjectId) -> bool {
        !self.reasons(subject).is_empty()
    }

    pub fn is_blocked_for(&self, subject: &SubjectId, reason: BlockReason) -> bool {
        let now = Instant::now();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(subject)
            .and_then(|reasons| reasons.get(&reason))
            .is_some_and(|expiry| live(expiry, now))
    }

    /// Drops every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let mut purged = 0;
        entries.retain(|_, reasons| {
            let before = reasons.len();
            reasons.retain(|_, expiry| live(expiry, now));
            purged += before - reasons.len();
            !reasons.is_empty()
        });
        if purged > 0 {
            debug!(target: "runtime::blocking", purged, "purged expired blocks");
        }
        purged
    }

    /// Number of subjects holding at least one entry (expired or not).
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Teardown: drops every block.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> SubjectId {
        SubjectId::from("u-1")
    }

    #[test]
    fn reasons_are_independent() {
        let blocking = BlockingCoordinator::new();
        blocking.block(&subject(), BlockReason::Fight, None);

        assert!(!blocking.unblock(&subject(), BlockReason::Trade));
        assert!(blocking.is_blocked_for(&subject(), BlockReason::Fight));
        assert_eq!(
            blocking.reasons(&subject()),
            BTreeSet::from([BlockReason::Fight])
        );
    }

    #[test]
    fn unblock_is_a_noop_for_unknown_subjects() {
        let blocking = BlockingCoordinator::new();
        assert!(!blocking.unblock(&subject(), BlockReason::Shop));
        assert!(blocking.is_empty());
    }

    #[test]
    fn last_unblock_forgets_the_subject() {
        let blocking = BlockingCoordinator::new();
        blocking.block(&subject(), BlockReason::Fight, None);
        blocking.block(&subject(), BlockReason::Report, None);

        assert!(blocking.unblock(&subject(), BlockReason::Fight));
        assert_eq!(blocking.len(), 1);
        assert!(blocking.unblock(&subject(), BlockReason::Report));
        assert!(blocking.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_blocks_are_invisible_then_purged() {
        let blocking = BlockingCoordinator::new();
        blocking.block(&subject(), BlockReason::GroupInvite, Some(Duration::from_secs(10)));
        blocking.block(&subject(), BlockReason::Fight, None);

        tokio::time::advance(Duration::from_secs(11)).await;

        assert_eq!(
            blocking.reasons(&subject()),
            BTreeSet::from([BlockReason::Fight])
        );
        assert!(!blocking.is_blocked_for(&subject(), BlockReason::GroupInvite));
        assert_eq!(blocking.purge_expired(), 1);
        assert_eq!(blocking.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unrepresentable_ttl_never_expires() {
        let blocking = BlockingCoordinator::new();
        blocking.block(&subject(), BlockReason::Trade, Some(Duration::MAX));

        tokio::time::advance(Duration::from_secs(3600)).await;

        assert!(blocking.is_blocked_for(&subject(), BlockReason::Trade));
        assert!(blocking.try_block(&[(subject(), BlockReason::Shop)], Some(Duration::MAX)).is_err());
    }

    #[test]
    fn try_block_is_all_or_nothing() {
        let blocking = BlockingCoordinator::new();
        let other = SubjectId::from("u-2");
        blocking.block(&other, BlockReason::Fight, None);

        let refused = blocking.try_block(
            &[
                (subject(), BlockReason::GroupInvite),
                (other.clone(), BlockReason::GroupInvite),
            ],
            None,
        );

        assert_eq!(refused, Err(BTreeSet::from([BlockReason::Fight])));
        assert!(!blocking.is_blocked(&subject()));
        assert!(!blocking.is_blocked_for(&other, BlockReason::GroupInvite));

        blocking.unblock(&other, BlockReason::Fight);
        assert!(blocking
            .try_block(&[(subject(), BlockReason::GroupInvite), (other.clone(), BlockReason::GroupInvite)], None)
            .is_ok());
        assert!(blocking.is_blocked_for(&other, BlockReason::GroupInvite));
    }

    #[test]
    fn concurrent_try_block_admits_one_caller() {
        let blocking = std::sync::Arc::new(BlockingCoordinator::new());
        let admitted: usize = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| {
                    let blocking = &blocking;
                    scope.spawn(move || {
                        blocking
                            .try_block(&[(subject(), BlockReason::GroupInvite)], None)
                            .is_ok()
                    })
                })
                .collect();
            workers
                .into_iter()
                .map(|worker| usize::from(worker.join().unwrap()))
                .sum()
        });
        assert_eq!(admitted, 1);
    }
}
