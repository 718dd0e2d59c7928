pub mod client;
pub mod executor;
pub mod simulated;

pub use client::{ChainClient, ClientSet, TransferRequest};
pub use executor::{PayoutExecutor, PayoutNotifier, TxReceipt};
pub use simulated::SimulatedChainClient;
