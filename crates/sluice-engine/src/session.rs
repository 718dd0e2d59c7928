use sluice_types::{Address, NetworkId, TokenAmount};

/// Everything the reward flow has collected by the time the account picks
/// a task branch.
#[derive(Debug, Clone)]
pub struct RewardContext {
    pub network: NetworkId,
    pub amount: TokenAmount,
    pub address: Address,
    /// Set when the account already completed the campaign, or re-entered
    /// with an address it redeemed before.
    pub reentry: bool,
}

/// Per-account conversation state, one variant per awaited input. Sessions
/// are ephemeral: discarded on completion, cancellation, error, or process
/// restart (no payout happens before a terminal, persisted step).
#[derive(Debug, Clone)]
pub enum Session {
    AwaitingClaimAddress {
        network: NetworkId,
    },
    SelectingPurchaseNetwork,
    AwaitingPurchaseAmount {
        network: NetworkId,
    },
    SelectingRewardNetwork {
        campaign_reentry: bool,
    },
    AwaitingRewardAddress {
        network: NetworkId,
        amount: TokenAmount,
        campaign_reentry: bool,
    },
    ChoosingTask {
        ctx: RewardContext,
    },
    AwaitingFollowPrimary {
        ctx: RewardContext,
    },
    AwaitingSocialHandle {
        ctx: RewardContext,
    },
    AwaitingFollowSecondary {
        ctx: RewardContext,
        handle: String,
    },
    AwaitingPostLink {
        ctx: RewardContext,
        handle: String,
    },
    AwaitingScreenshot {
        ctx: RewardContext,
    },
}
