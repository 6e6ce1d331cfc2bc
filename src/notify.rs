use tracing::warn;

use crate::pet::PetStatus;

/// Receives alerts about the pet. Never feeds back into game state.
pub trait Notifier: Send {
    fn low_stat(&self, stat: &'static str, value: i32);

    fn game_over(&self, _status: &PetStatus) {}
}

/// Logs alerts instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn low_stat(&self, stat: &'static str, value: i32) {
        warn!(stat, value, "pet stat is running low");
    }

    fn game_over(&self, status: &PetStatus) {
        warn!(
            happiness = status.happiness(),
            health = status.health(),
            hunger = status.hunger(),
            "pet needs a reset"
        );
    }
}
