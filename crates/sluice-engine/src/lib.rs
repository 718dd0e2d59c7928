pub mod auth;
mod commands;
pub mod engine;
pub mod maintenance;
pub mod messenger;
pub mod queue;
pub mod session;

pub use auth::AuthPolicy;
pub use engine::{ConversationEngine, EngineConfig, SocialTasksConfig};
pub use maintenance::Maintenance;
pub use messenger::{Action, Event, EventKind, Messenger, PhotoRef};
pub use queue::{Evidence, PendingVerification, TaskKind, VerificationQueue};
pub use session::{RewardContext, Session};
