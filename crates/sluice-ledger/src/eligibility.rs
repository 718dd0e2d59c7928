use sluice_store::{AccountRecord, StateStore};
use sluice_types::{AccountId, NetworkId, Result, SluiceError};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Minimum interval between successful claims for one (account, network).
pub const CLAIM_COOLDOWN_SECS: i64 = 86_400;

type ClaimKey = (AccountId, NetworkId);
type InFlight = Arc<Mutex<HashSet<ClaimKey>>>;

/// Gates faucet claims on the per-account, per-network cooldown.
///
/// `check_and_reserve` and `commit` are deliberately split: the cooldown
/// timestamp is written only after the payout is confirmed sent, so a
/// failed send never consumes the window. The reservation guard keeps a
/// second claim for the same key from slipping in between the two steps.
pub struct EligibilityLedger {
    store: Arc<dyn StateStore>,
    in_flight: InFlight,
}

/// RAII claim slot. Dropping it without committing releases the slot and
/// leaves the cooldown window untouched.
#[must_use = "dropping the reservation releases the claim slot"]
#[derive(Debug)]
pub struct ClaimReservation {
    key: ClaimKey,
    in_flight: InFlight,
}

impl Drop for ClaimReservation {
    fn drop(&mut self) {
        let mut set = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        set.remove(&self.key);
    }
}

impl EligibilityLedger {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Answer "may this account claim this network now?" and, if yes, hold
    /// the claim slot until the reservation is committed or dropped.
    pub async fn check_and_reserve(
        &self,
        account: AccountId,
        network: &NetworkId,
        now: i64,
    ) -> Result<ClaimReservation> {
        let last = self
            .store
            .get_account(account)
            .await?
            .and_then(|r| r.last_claim(network));

        if let Some(last) = last {
            let elapsed = now - last;
            if elapsed < CLAIM_COOLDOWN_SECS {
                debug!(
                    account = %account,
                    network = %network,
                    elapsed,
                    "Claim refused, cooldown active"
                );
                return Err(SluiceError::RateLimited {
                    remaining_secs: CLAIM_COOLDOWN_SECS - elapsed,
                });
            }
        }

        let key = (account, network.clone());
        let mut set = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !set.insert(key.clone()) {
            return Err(SluiceError::Conflict(format!(
                "claim already in flight for {} on {}",
                account, network
            )));
        }

        Ok(ClaimReservation {
            key,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Record the claim time. Called only after the payout is confirmed
    /// sent; the reservation is released when the guard drops.
    pub async fn commit(&self, reservation: ClaimReservation, now: i64) -> Result<()> {
        let (account, network) = reservation.key.clone();

        let mut record = match self.store.get_account(account).await? {
            Some(record) => record,
            None => AccountRecord::new(account.to_string(), None, now),
        };
        record.last_claim_times.insert(network.clone(), now);
        self.store.put_account(account, record).await?;

        info!(
            account = %account,
            network = %network,
            claimed_at = now,
            "⏲️ Claim cooldown committed"
        );
        Ok(())
    }
}
