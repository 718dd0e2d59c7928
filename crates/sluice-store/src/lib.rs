pub mod json;
pub mod memory;
pub mod record;

pub use json::JsonStore;
pub use memory::MemoryStore;
pub use record::AccountRecord;

use async_trait::async_trait;
use sluice_types::{AccountId, Address, Result};

/// Durable state surviving process restarts: the account map and the
/// redeemed-address map, persisted as two independent documents.
///
/// Implementations persist synchronously inside each mutating call, so a
/// caller that has seen `Ok(())` may confirm to the user.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get_account(&self, id: AccountId) -> Result<Option<AccountRecord>>;
    async fn put_account(&self, id: AccountId, record: AccountRecord) -> Result<()>;
    async fn account_ids(&self) -> Result<Vec<AccountId>>;
    async fn account_count(&self) -> Result<usize>;

    async fn redemption_owner(&self, address: &Address) -> Result<Option<AccountId>>;
    async fn put_redemption(&self, address: Address, owner: AccountId) -> Result<()>;
    async fn redemption_count(&self) -> Result<usize>;
}
