use thiserror::Error;

/// Failures reported by a chain client or the payout path. A `ChainError`
/// is returned before any ledger is touched, so the triggering operation is
/// always safe to retry by hand.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("not connected to the {network} network")]
    NotConnected { network: String },

    #[error("rpc request failed: {0}")]
    Rpc(String),

    #[error("transaction signing failed: {0}")]
    Signing(String),

    #[error("transaction broadcast rejected: {0}")]
    Broadcast(String),
}

#[derive(Error, Debug)]
pub enum SluiceError {
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("link does not match a recognized social post URL")]
    InvalidLink,

    #[error("submission is missing the required image evidence")]
    MissingEvidence,

    #[error("claim cooldown active, {remaining_secs}s remaining")]
    RateLimited { remaining_secs: i64 },

    #[error("address already redeemed by another account")]
    DuplicateAddress,

    #[error("conflicting ledger write: {0}")]
    Conflict(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("not authorized")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, SluiceError>;

/// Render a remaining cooldown as whole hours and minutes, the way it is
/// reported back to a rate-limited account.
pub fn format_wait(remaining_secs: i64) -> String {
    let remaining = remaining_secs.max(0);
    let hours = remaining / 3600;
    let minutes = (remaining % 3600) / 60;
    format!("{} hours, {} minutes", hours, minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_wait() {
        assert_eq!(format_wait(85400), "23 hours, 43 minutes");
        assert_eq!(format_wait(59), "0 hours, 0 minutes");
        assert_eq!(format_wait(3660), "1 hours, 1 minutes");
        assert_eq!(format_wait(-5), "0 hours, 0 minutes");
    }

    #[test]
    fn test_rate_limited_message() {
        let err = SluiceError::RateLimited {
            remaining_secs: 85400,
        };
        assert!(err.to_string().contains("85400"));
    }
}
