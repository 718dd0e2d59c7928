use crate::messenger::PhotoRef;
use sluice_types::{AccountId, Address, MessageId, NetworkId, TokenAmount};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    SocialPost,
    Screenshot,
}

impl TaskKind {
    pub fn describe(&self) -> &'static str {
        match self {
            TaskKind::SocialPost => "social post",
            TaskKind::Screenshot => "partner bot screenshot",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Evidence {
    SocialPost { handle: String, link: String },
    Screenshot(PhotoRef),
}

/// Everything a reviewer needs to execute or reject one payout.
#[derive(Debug, Clone)]
pub struct PendingVerification {
    pub task: TaskKind,
    pub network: NetworkId,
    pub amount: TokenAmount,
    pub address: Address,
    pub evidence: Evidence,
    pub submitter_name: String,
    pub submitter_username: Option<String>,
    /// True when this account already completed the campaign once; approval
    /// of such a record must not trigger a payment.
    pub reentry: bool,
    /// The reviewer-channel message carrying the approve/reject actions.
    pub reviewer_msg: MessageId,
}

/// At most one unresolved human-review request per account, by
/// construction: enqueue always replaces, dequeue always removes.
#[derive(Default)]
pub struct VerificationQueue {
    pending: RwLock<HashMap<AccountId, PendingVerification>>,
}

impl VerificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a submission, returning any prior unresolved record for the
    /// same account so its reviewer message can be annotated as stale.
    pub async fn enqueue(
        &self,
        account: AccountId,
        record: PendingVerification,
    ) -> Option<PendingVerification> {
        let mut pending = self.pending.write().await;
        let replaced = pending.insert(account, record);
        if replaced.is_some() {
            warn!(account = %account, "Pending verification replaced by resubmission");
        } else {
            info!(account = %account, "📋 Verification request queued");
        }
        replaced
    }

    /// Remove and return the account's pending record. `None` means the
    /// submission was already processed (reviewer double-click).
    pub async fn dequeue(&self, account: AccountId) -> Option<PendingVerification> {
        let mut pending = self.pending.write().await;
        pending.remove(&account)
    }

    /// Put a record back after a failed payout, so the approval can be
    /// retried by the reviewer.
    pub async fn restore(&self, account: AccountId, record: PendingVerification) {
        let mut pending = self.pending.write().await;
        pending.insert(account, record);
    }

    pub async fn len(&self) -> usize {
        self.pending.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pending.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(reviewer_msg: i64) -> PendingVerification {
        PendingVerification {
            task: TaskKind::SocialPost,
            network: NetworkId::new("sepolia"),
            amount: TokenAmount::from_base_units(1),
            address: Address::parse("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap(),
            evidence: Evidence::SocialPost {
                handle: "@alice".to_string(),
                link: "https://x.com/alice/status/1".to_string(),
            },
            submitter_name: "Alice".to_string(),
            submitter_username: None,
            reentry: false,
            reviewer_msg: MessageId(reviewer_msg),
        }
    }

    #[tokio::test]
    async fn test_enqueue_replaces_and_returns_prior() {
        let queue = VerificationQueue::new();
        let account = AccountId(2002);

        assert!(queue.enqueue(account, record(1)).await.is_none());
        let prior = queue.enqueue(account, record(2)).await.unwrap();
        assert_eq!(prior.reviewer_msg, MessageId(1));
        assert_eq!(queue.len().await, 1);
    }

    #[tokio::test]
    async fn test_dequeue_exactly_once() {
        let queue = VerificationQueue::new();
        let account = AccountId(2002);
        queue.enqueue(account, record(1)).await;

        assert!(queue.dequeue(account).await.is_some());
        assert!(queue.dequeue(account).await.is_none());
    }

    #[tokio::test]
    async fn test_restore_after_failed_payout() {
        let queue = VerificationQueue::new();
        let account = AccountId(2002);
        queue.enqueue(account, record(1)).await;

        let taken = queue.dequeue(account).await.unwrap();
        queue.restore(account, taken).await;
        assert!(queue.dequeue(account).await.is_some());
    }
}
