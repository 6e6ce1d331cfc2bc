use thiserror::Error;

/// Reasons a shop purchase is refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseError {
    #[error("Not enough coins for this item")]
    InsufficientFunds,

    #[error("Upgrade does not follow the current species")]
    InvalidUpgrade,

    #[error("Item is already owned")]
    AlreadyOwned,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("Task not found: {0}")]
    NotFound(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error("Inventory item not found: {0}")]
    NotFound(String),

    #[error("Animals are switched by selection, not unequipped")]
    AnimalAlwaysEquipped,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObjectiveError {
    #[error("No active objective")]
    NoActiveObjective,

    #[error("Objective is not satisfied yet")]
    NotSatisfied,
}

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Snapshot version {found} is newer than supported version {supported}")]
    VersionTooNew { found: u32, supported: u32 },

    #[error("State file is in use by another habitpet process: {}", .0.display())]
    Locked(std::path::PathBuf),
}

/// Failure reported by a verification collaborator. Never fatal to the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Verification source unavailable: {0}")]
    Unavailable(String),

    #[error("Evidence does not apply to this habit: {0}")]
    WrongEvidence(String),
}
