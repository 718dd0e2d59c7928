pub mod accounts;
pub mod eligibility;
pub mod redemption;

pub use accounts::AccountRegistry;
pub use eligibility::{ClaimReservation, EligibilityLedger, CLAIM_COOLDOWN_SECS};
pub use redemption::{Ownership, RedemptionRegistry};
