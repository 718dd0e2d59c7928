use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Process-wide maintenance flag. Starts off; while on, every non-owner
/// flow is refused with a standard notice.
#[derive(Debug, Default)]
pub struct Maintenance {
    on: AtomicBool,
}

impl Maintenance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }

    pub fn set(&self, on: bool) {
        self.on.store(on, Ordering::SeqCst);
        info!(maintenance = on, "🔧 Maintenance mode toggled");
    }
}
