use clap::{Args, Subcommand};

#[derive(Subcommand)]
pub enum Commands {
    /// Show the pet's stats, coins and today's progress
    Status,
    /// List pending habit tasks
    Tasks,
    /// Complete a pending task
    Complete {
        /// Task id, or a habit name such as `water`
        task: String,
        /// Skip verification
        #[arg(long)]
        force: bool,
        #[command(flatten)]
        evidence: EvidenceArgs,
    },
    /// Show the shop catalog
    Shop,
    /// Buy an item by name
    Buy {
        item: String,
    },
    /// List owned items
    Inventory,
    /// Equip an owned item by id or name
    Equip {
        item: String,
    },
    /// Unequip an owned item by id or name
    Unequip {
        item: String,
    },
    /// Show today's objective
    Objective {
        /// Claim the reward if the objective is done
        #[arg(long)]
        claim: bool,
    },
    /// Start over with a fresh blob. Coins are kept.
    Reset,
    /// Keep the pet alive in the foreground until Ctrl+C
    Run,
}

/// Proof offered for verification. At most one is used.
#[derive(Args, Debug, Default)]
pub struct EvidenceArgs {
    /// Step count for exercise
    #[arg(long)]
    pub steps: Option<u32>,
    /// Hours slept
    #[arg(long)]
    pub sleep_hours: Option<f32>,
    /// Minutes spent outdoors
    #[arg(long)]
    pub outdoor_minutes: Option<u32>,
    /// Text recognised from a screenshot
    #[arg(long)]
    pub text: Option<String>,
}
