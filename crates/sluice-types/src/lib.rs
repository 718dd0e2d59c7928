pub mod address;
pub mod amount;
pub mod error;
pub mod ids;
pub mod network;

pub use address::Address;
pub use amount::TokenAmount;
pub use error::{ChainError, Result, SluiceError};
pub use ids::{AccountId, ChatId, MessageId};
pub use network::{NetworkConfig, NetworkId, Networks};
