//! Snapshot persistence.
//!
//! The whole game state is flattened into a [`StateSnapshot`] and handed to a
//! [`PersistenceGateway`]. The file gateway writes JSON next to the config.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::NaiveDateTime;
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::core::PersistError;
use crate::habit::Habit;
use crate::inventory::{Background, InventoryItem};
use crate::objective::{DailyObjective, ObjectiveRecord};
use crate::pet::Species;
use crate::scheduler::{CompletedTaskRecord, HabitTask};
use crate::shop::PurchaseRecord;

/// Version number for the snapshot format (increment when fields change meaning)
pub const SNAPSHOT_VERSION: u32 = 1;

/// Flat record of everything that survives a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    pub species: Species,
    pub happiness: i32,
    pub health: i32,
    pub hunger: i32,
    #[serde(default)]
    pub coins: u32,
    #[serde(default)]
    pub purchases: Vec<PurchaseRecord>,
    #[serde(default)]
    pub active_tasks: Vec<HabitTask>,
    #[serde(default)]
    pub completed_tasks: Vec<CompletedTaskRecord>,
    #[serde(default)]
    pub cooldowns: HashMap<Habit, NaiveDateTime>,
    #[serde(default)]
    pub current_objective: Option<DailyObjective>,
    #[serde(default)]
    pub objective_history: Vec<ObjectiveRecord>,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    #[serde(default)]
    pub background: Background,
    pub last_decay_at: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decay_interval_secs: Option<u64>,
}

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

impl StateSnapshot {
    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(content: &str) -> Result<Self, PersistError> {
        let snapshot: StateSnapshot = serde_json::from_str(content)?;
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(PersistError::VersionTooNew {
                found: snapshot.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        Ok(snapshot)
    }
}

/// Storage boundary. `load` returning `None` means "start from defaults".
pub trait PersistenceGateway {
    fn save(&self, snapshot: &StateSnapshot) -> Result<(), PersistError>;
    fn load(&self) -> Result<Option<StateSnapshot>, PersistError>;
}

/// JSON file on disk. Saves go through a temp file and a rename so a failed
/// write never clobbers the previous snapshot.
pub struct JsonFileGateway {
    path: PathBuf,
    lock: Option<File>,
}

impl JsonFileGateway {
    /// Unlocked gateway. Only safe when nothing else writes the same file.
    pub fn new(path: PathBuf) -> Self {
        Self { path, lock: None }
    }

    /// Gateway holding an exclusive lock on the sibling `.json.lock` file.
    /// Closing the file on drop releases the lock.
    /// Fails with [`PersistError::Locked`] while another gateway holds it.
    pub fn open_exclusive(path: PathBuf) -> Result<Self, PersistError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let lock_path = path.with_extension("json.lock");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;
        if let Err(e) = file.try_lock_exclusive() {
            if e.kind() == fs2::lock_contended_error().kind() {
                return Err(PersistError::Locked(path));
            }
            return Err(e.into());
        }
        Ok(Self {
            path,
            lock: Some(file),
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_some()
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl PersistenceGateway for JsonFileGateway {
    fn save(&self, snapshot: &StateSnapshot) -> Result<(), PersistError> {
        let json = snapshot.to_json()?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.temp_path();
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<StateSnapshot>, PersistError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        StateSnapshot::from_json(&content).map(Some)
    }
}

/// Keeps the serialized JSON in memory. Useful for tests and embedding.
#[derive(Default)]
pub struct MemoryGateway {
    stored: Mutex<Option<String>>,
    fail_saves: bool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway whose saves always fail, leaving prior content intact.
    pub fn failing() -> Self {
        Self {
            stored: Mutex::new(None),
            fail_saves: true,
        }
    }

    pub fn with_json(json: impl Into<String>) -> Self {
        Self {
            stored: Mutex::new(Some(json.into())),
            fail_saves: false,
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.stored.lock().ok().and_then(|guard| guard.clone())
    }
}

impl PersistenceGateway for MemoryGateway {
    fn save(&self, snapshot: &StateSnapshot) -> Result<(), PersistError> {
        if self.fail_saves {
            return Err(PersistError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "storage unavailable",
            )));
        }
        let json = snapshot.to_json()?;
        if let Ok(mut guard) = self.stored.lock() {
            *guard = Some(json);
        }
        Ok(())
    }

    fn load(&self) -> Result<Option<StateSnapshot>, PersistError> {
        let raw = self.raw();
        match raw {
            Some(content) => StateSnapshot::from_json(&content).map(Some),
            None => Ok(None),
        }
    }
}

impl<G: PersistenceGateway + ?Sized> PersistenceGateway for Box<G> {
    fn save(&self, snapshot: &StateSnapshot) -> Result<(), PersistError> {
        (**self).save(snapshot)
    }

    fn load(&self) -> Result<Option<StateSnapshot>, PersistError> {
        (**self).load()
    }
}
