//! Habit-tracking virtual pet engine.
//!
//! Completing real-life habits inside their time windows keeps a pet healthy
//! and earns coins for the shop. Stats decay on a timer, and the whole game
//! state is saved after every change.

pub mod cli;
pub mod config;
pub mod core;
pub mod decay;
pub mod game;
pub mod habit;
pub mod inventory;
pub mod notify;
pub mod objective;
pub mod pet;
pub mod runtime;
pub mod scheduler;
pub mod shop;
pub mod status;
pub mod store;
pub mod verifier;

pub use config::Config;
pub use game::{Completion, GameContext, GameSettings};
pub use pet::{Pet, PetStatus, Species};
pub use store::{JsonFileGateway, MemoryGateway, PersistenceGateway, StateSnapshot};
