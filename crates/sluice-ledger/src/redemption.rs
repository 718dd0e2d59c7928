use sluice_store::StateStore;
use sluice_types::{AccountId, Address, Result, SluiceError};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Outcome of resolving a payout address against the redemption ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Free,
    OwnedBySelf,
    OwnedByOther,
}

/// Enforces one-owner-per-payout-address across the campaign's lifetime.
///
/// `bind` re-validates ownership inside the registry's write scope, so two
/// accounts racing the same address between their `resolve` reads cannot
/// both bind it.
pub struct RedemptionRegistry {
    store: Arc<dyn StateStore>,
    write_scope: Mutex<()>,
}

impl RedemptionRegistry {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            write_scope: Mutex::new(()),
        }
    }

    pub async fn resolve(&self, address: &Address, account: AccountId) -> Result<Ownership> {
        Ok(match self.store.redemption_owner(address).await? {
            None => Ownership::Free,
            Some(owner) if owner == account => Ownership::OwnedBySelf,
            Some(_) => Ownership::OwnedByOther,
        })
    }

    /// Bind an address to its owner. Called once, after a first-time,
    /// non-re-entry reward payout has been confirmed sent. Idempotent for
    /// the same pair; refuses an address bound to a different account.
    pub async fn bind(&self, address: &Address, account: AccountId) -> Result<()> {
        let _scope = self.write_scope.lock().await;

        match self.store.redemption_owner(address).await? {
            Some(owner) if owner == account => Ok(()),
            Some(owner) => {
                warn!(
                    address = %address,
                    owner = %owner,
                    attempted_by = %account,
                    "Redemption bind refused, address already owned"
                );
                Err(SluiceError::Conflict(format!(
                    "address {} already bound to account {}",
                    address, owner
                )))
            }
            None => {
                self.store.put_redemption(address.clone(), account).await?;
                info!(address = %address, owner = %account, "🔗 Payout address bound");
                Ok(())
            }
        }
    }

    pub async fn count(&self) -> Result<usize> {
        self.store.redemption_count().await
    }
}
