use serde::{Deserialize, Serialize};
use sluice_types::NetworkId;
use std::collections::{BTreeSet, HashMap};

/// Campaign flag recorded once an account's first task-based reward payout
/// has been sent.
pub const CAMPAIGN_EARN_REWARD: &str = "earn_reward";

/// Per-account durable state. Created on first observed interaction and
/// never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
    pub display_name: String,
    #[serde(default)]
    pub username: Option<String>,
    pub first_seen: i64,
    #[serde(default)]
    pub last_claim_times: HashMap<NetworkId, i64>,
    #[serde(default)]
    pub completed_campaigns: BTreeSet<String>,
}

impl AccountRecord {
    pub fn new(display_name: String, username: Option<String>, first_seen: i64) -> Self {
        Self {
            display_name,
            username,
            first_seen,
            last_claim_times: HashMap::new(),
            completed_campaigns: BTreeSet::new(),
        }
    }

    pub fn last_claim(&self, network: &NetworkId) -> Option<i64> {
        self.last_claim_times.get(network).copied()
    }

    pub fn campaign_done(&self, campaign: &str) -> bool {
        self.completed_campaigns.contains(campaign)
    }
}
