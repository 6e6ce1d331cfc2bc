//! The game context: single owner of all mutable game state.
//!
//! Every mutating operation goes through [`GameContext`], which saves a full
//! snapshot afterwards. Components never reach back into their owner.

use chrono::NaiveDateTime;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::core::{InventoryError, ObjectiveError, PurchaseError, TaskError};
use crate::decay::DecayEngine;
use crate::inventory::{Background, Inventory, InventoryItem, ItemKind};
use crate::notify::{LogNotifier, Notifier};
use crate::objective::{DailyObjective, ObjectiveRecord, ObjectiveTracker};
use crate::pet::{Pet, PetStatus, Species};
use crate::scheduler::{CompletedTaskRecord, HabitTask, TaskScheduler};
use crate::shop::{PurchaseEngine, PurchaseRecord, ShopItem};
use crate::store::{PersistenceGateway, StateSnapshot, SNAPSHOT_VERSION};
use crate::verifier::{Evidence, TaskVerifier};

/// Tunables the context needs from the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSettings {
    pub decay_interval_secs: u64,
    pub low_stat_threshold: i32,
    pub objective_reward: u32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            decay_interval_secs: crate::decay::DEFAULT_INTERVAL_SECS,
            low_stat_threshold: 20,
            objective_reward: 25,
        }
    }
}

impl From<&Config> for GameSettings {
    fn from(config: &Config) -> Self {
        Self {
            decay_interval_secs: config.decay_interval_secs,
            low_stat_threshold: config.low_stat_threshold,
            objective_reward: config.objective_reward,
        }
    }
}

/// Result of a verified completion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Completed(CompletedTaskRecord),
    /// The task stays pending; the detail explains why.
    NotVerified(String),
}

pub struct GameContext<G: PersistenceGateway> {
    pet: Pet,
    scheduler: TaskScheduler,
    shop: PurchaseEngine,
    inventory: Inventory,
    decay: DecayEngine,
    decay_override: Option<u64>,
    objectives: ObjectiveTracker,
    settings: GameSettings,
    gateway: G,
    notifier: Box<dyn Notifier>,
    rng: StdRng,
    saves_suspended: bool,
}

impl<G: PersistenceGateway> GameContext<G> {
    /// Fresh game: full stats, no coins, a blob in the living room.
    pub fn new(gateway: G, settings: GameSettings, now: NaiveDateTime) -> Self {
        Self {
            pet: Pet::default(),
            scheduler: TaskScheduler::new(),
            shop: PurchaseEngine::default(),
            inventory: Inventory::starter(now),
            decay: DecayEngine::new(settings.decay_interval_secs, now),
            decay_override: None,
            objectives: ObjectiveTracker::default(),
            settings,
            gateway,
            notifier: Box::new(LogNotifier),
            rng: StdRng::from_entropy(),
            saves_suspended: false,
        }
    }

    /// Restore from the gateway, or start fresh when nothing is stored.
    ///
    /// An unreadable snapshot is left untouched on storage: the game runs in
    /// memory with saving suspended.
    pub fn load(gateway: G, settings: GameSettings, now: NaiveDateTime) -> Self {
        match gateway.load() {
            Ok(Some(snapshot)) => {
                info!(species = %snapshot.species, coins = snapshot.coins, "state loaded");
                Self::from_snapshot(gateway, settings, snapshot)
            }
            Ok(None) => {
                info!("no saved state, starting fresh");
                Self::new(gateway, settings, now)
            }
            Err(e) => {
                warn!("failed to load state, saving disabled for this session: {}", e);
                let mut ctx = Self::new(gateway, settings, now);
                ctx.saves_suspended = true;
                ctx
            }
        }
    }

    fn from_snapshot(gateway: G, settings: GameSettings, snapshot: StateSnapshot) -> Self {
        let pet = Pet {
            species: snapshot.species,
            status: PetStatus::new(snapshot.happiness, snapshot.health, snapshot.hunger),
        };

        let mut inventory = Inventory::from_items(snapshot.inventory);
        let acquired = snapshot.last_decay_at;
        if !inventory.owns(ItemKind::Animal(pet.species)) {
            inventory.add(ItemKind::Animal(pet.species), true, acquired);
        }
        if inventory.active_background().is_none() {
            let id = inventory.add(ItemKind::Background(snapshot.background), false, acquired);
            let _ = inventory.equip(id);
        }

        let interval = snapshot
            .decay_interval_secs
            .unwrap_or(settings.decay_interval_secs);

        Self {
            pet,
            scheduler: TaskScheduler::from_parts(
                snapshot.active_tasks,
                snapshot.completed_tasks,
                snapshot.cooldowns,
            ),
            shop: PurchaseEngine::new(snapshot.coins, snapshot.purchases),
            inventory,
            decay: DecayEngine::new(interval, snapshot.last_decay_at),
            decay_override: snapshot.decay_interval_secs,
            objectives: ObjectiveTracker::new(
                snapshot.current_objective,
                snapshot.objective_history,
            ),
            settings,
            gateway,
            notifier: Box::new(LogNotifier),
            rng: StdRng::from_entropy(),
            saves_suspended: false,
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Deterministic objective draws.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            version: SNAPSHOT_VERSION,
            species: self.pet.species,
            happiness: self.pet.status.happiness(),
            health: self.pet.status.health(),
            hunger: self.pet.status.hunger(),
            coins: self.shop.coins(),
            purchases: self.shop.history().to_vec(),
            active_tasks: self.scheduler.pending().to_vec(),
            completed_tasks: self.scheduler.completed().to_vec(),
            cooldowns: self.scheduler.cooldowns().clone(),
            current_objective: self.objectives.current().copied(),
            objective_history: self.objectives.history().to_vec(),
            inventory: self.inventory.items().to_vec(),
            background: self.background(),
            last_decay_at: self.decay.last_decay_at(),
            decay_interval_secs: self.decay_override,
        }
    }

    /// Save a full snapshot. Failures are logged and the game carries on.
    pub fn persist(&self) -> bool {
        if self.saves_suspended {
            debug!("save skipped, saving suspended");
            return false;
        }
        match self.gateway.save(&self.snapshot()) {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to save state: {}", e);
                false
            }
        }
    }

    pub fn saves_suspended(&self) -> bool {
        self.saves_suspended
    }

    pub fn pet(&self) -> &Pet {
        &self.pet
    }

    pub fn coins(&self) -> u32 {
        self.shop.coins()
    }

    pub fn background(&self) -> Background {
        self.inventory.active_background().unwrap_or_default()
    }

    pub fn scheduler(&self) -> &TaskScheduler {
        &self.scheduler
    }

    pub fn pending_tasks(&self) -> &[HabitTask] {
        self.scheduler.pending()
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn purchases(&self) -> &[PurchaseRecord] {
        self.shop.history()
    }

    pub fn decay(&self) -> &DecayEngine {
        &self.decay
    }

    pub fn objectives(&self) -> &ObjectiveTracker {
        &self.objectives
    }

    pub fn settings(&self) -> GameSettings {
        self.settings
    }

    /// Any stat at zero. Decay is paused until a reset.
    pub fn is_game_over(&self) -> bool {
        self.pet.status.is_depleted()
    }

    fn report_stats(&self) {
        for (stat, value) in self.pet.status.low_stats(self.settings.low_stat_threshold) {
            self.notifier.low_stat(stat, value);
        }
        if self.is_game_over() {
            self.notifier.game_over(&self.pet.status);
        }
    }

    /// Startup or return from background: generate due tasks, backfill
    /// decay and make sure today has an objective.
    pub fn resume(&mut self, now: NaiveDateTime) {
        self.scheduler.tick(now);
        if self.is_game_over() {
            self.decay.restart(now);
        } else {
            let ticks = self.decay.resume(&mut self.pet.status, now);
            if ticks > 0 {
                info!(ticks, "caught up on missed decay");
                self.report_stats();
            }
        }
        self.objectives.check_in(now.date(), &mut self.rng);
        self.persist();
    }

    /// Scheduler timer callback.
    pub fn tick_scheduler(&mut self, now: NaiveDateTime) -> Vec<HabitTask> {
        let before: Vec<Uuid> = self.scheduler.pending().iter().map(|t| t.id).collect();
        let created = self.scheduler.tick(now);
        let after: Vec<Uuid> = self.scheduler.pending().iter().map(|t| t.id).collect();
        if before != after {
            self.persist();
        }
        created
    }

    /// Decay timer callback. Paused while the game is over.
    pub fn tick_decay(&mut self, now: NaiveDateTime) -> bool {
        if self.is_game_over() {
            debug!("decay paused, game over");
            return false;
        }
        let changed = self.decay.tick(&mut self.pet.status, now);
        if changed {
            self.report_stats();
            self.persist();
        }
        changed
    }

    /// Apply decay for `elapsed_secs` of missed time, in whole intervals.
    pub fn catch_up(&mut self, elapsed_secs: i64) -> u64 {
        let ticks = self.decay.catch_up(&mut self.pet.status, elapsed_secs);
        if ticks > 0 {
            self.report_stats();
            self.persist();
        }
        ticks
    }

    pub fn set_decay_interval(&mut self, interval_secs: u64) {
        self.decay = DecayEngine::new(interval_secs, self.decay.last_decay_at());
        self.decay_override = Some(self.decay.interval_secs());
        self.persist();
    }

    /// Complete a pending task, applying its stat rewards and coins.
    pub fn complete_task(
        &mut self,
        task_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<CompletedTaskRecord, TaskError> {
        let record = self.scheduler.complete(task_id, now, &mut self.pet.status)?;
        self.shop.deposit(record.habit.rewards().coins);
        self.persist();
        Ok(record)
    }

    /// Manual override after a failed or skipped automated check.
    pub fn force_complete(
        &mut self,
        task_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<CompletedTaskRecord, TaskError> {
        info!(task_id = %task_id, "completing without verification");
        self.complete_task(task_id, now)
    }

    /// Verify first, then complete. Low confidence or a verifier failure
    /// leaves the task pending.
    pub async fn complete_verified<V: TaskVerifier>(
        &mut self,
        task_id: Uuid,
        evidence: &Evidence,
        verifier: &V,
        now: NaiveDateTime,
    ) -> Result<Completion, TaskError> {
        let task = self
            .scheduler
            .find(task_id)
            .cloned()
            .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;

        match verifier.verify(&task, evidence).await {
            Ok(verdict) if verdict.confident => {
                self.complete_task(task_id, now).map(Completion::Completed)
            }
            Ok(verdict) => {
                info!(habit = %task.habit, detail = %verdict.detail, "verification not confident");
                Ok(Completion::NotVerified(verdict.detail))
            }
            Err(e) => {
                warn!(habit = %task.habit, "verification failed: {}", e);
                Ok(Completion::NotVerified(e.to_string()))
            }
        }
    }

    pub fn can_buy(&self, item: ShopItem) -> bool {
        self.shop.can_buy(item, &self.pet, &self.inventory)
    }

    pub fn check_purchase(&self, item: ShopItem) -> Result<(), PurchaseError> {
        self.shop.check(item, &self.pet, &self.inventory)
    }

    pub fn buy(&mut self, item: ShopItem, now: NaiveDateTime) -> Result<PurchaseRecord, PurchaseError> {
        let record = self
            .shop
            .buy(item, &mut self.pet, &mut self.inventory, now)?;
        self.persist();
        Ok(record)
    }

    /// Equip an owned item. Selecting an animal switches the pet's species.
    pub fn equip(&mut self, item_id: Uuid) -> Result<InventoryItem, InventoryError> {
        let item = self.inventory.equip(item_id)?.clone();
        if let ItemKind::Animal(species) = item.item_type {
            self.pet.species = species;
        }
        self.persist();
        Ok(item)
    }

    pub fn unequip(&mut self, item_id: Uuid) -> Result<(), InventoryError> {
        self.inventory.unequip(item_id)?;
        self.persist();
        Ok(())
    }

    /// Draw today's objective if the current one is stale.
    pub fn assign_new_objective(&mut self, now: NaiveDateTime) -> Option<DailyObjective> {
        let objective = self.objectives.assign_new(now.date(), &mut self.rng).copied();
        self.persist();
        objective
    }

    /// At most one objective per calendar day.
    pub fn check_in_objective(&mut self, now: NaiveDateTime) -> Option<DailyObjective> {
        let objective = self.objectives.check_in(now.date(), &mut self.rng).copied();
        self.persist();
        objective
    }

    pub fn objective_satisfied(&self, now: NaiveDateTime) -> bool {
        self.objectives
            .is_current_satisfied(now, self.scheduler.completed(), self.shop.history())
    }

    /// Archive the current objective without checking it.
    pub fn complete_objective(&mut self, now: NaiveDateTime) -> Option<ObjectiveRecord> {
        let record = self.objectives.complete(now);
        self.persist();
        record
    }

    /// Check the predicate, pay the reward and archive the objective.
    pub fn claim_objective(&mut self, now: NaiveDateTime) -> Result<ObjectiveRecord, ObjectiveError> {
        if self.objectives.current().is_none() {
            return Err(ObjectiveError::NoActiveObjective);
        }
        if !self.objective_satisfied(now) {
            return Err(ObjectiveError::NotSatisfied);
        }
        self.shop.deposit(self.settings.objective_reward);
        let record = self
            .objectives
            .complete(now)
            .ok_or(ObjectiveError::NoActiveObjective)?;
        self.persist();
        Ok(record)
    }

    /// Start the pet over. Coins and history survive; owned items, the
    /// species and active tasks do not.
    pub fn reset(&mut self, now: NaiveDateTime) {
        let starter = [
            ItemKind::Animal(Species::Blob),
            ItemKind::Background(Background::LivingRoom),
        ];
        let owned: Vec<ItemKind> = self
            .inventory
            .items()
            .iter()
            .map(|i| i.item_type)
            .filter(|kind| !starter.contains(kind))
            .collect();
        for kind in owned {
            self.inventory.remove(kind);
        }
        for kind in starter {
            let id = self.inventory.add(kind, true, now);
            let _ = self.inventory.equip(id);
        }
        self.pet = Pet {
            species: Species::Blob,
            status: PetStatus::full(),
        };
        self.scheduler.clear_active();
        self.decay.restart(now);
        info!("game reset");
        self.persist();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PersistError;
    use crate::habit::Habit;
    use crate::objective::ObjectiveOutcome;
    use crate::store::MemoryGateway;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Memory gateway that counts how often it was asked to save.
    #[derive(Default)]
    struct CountingGateway {
        saves: AtomicUsize,
        inner: MemoryGateway,
    }

    impl CountingGateway {
        fn saves(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }
    }

    impl PersistenceGateway for CountingGateway {
        fn save(&self, snapshot: &StateSnapshot) -> Result<(), PersistError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner.save(snapshot)
        }

        fn load(&self) -> Result<Option<StateSnapshot>, PersistError> {
            self.inner.load()
        }
    }

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn fresh() -> GameContext<MemoryGateway> {
        GameContext::new(MemoryGateway::new(), GameSettings::default(), at(4, 8, 0)).with_seed(11)
    }

    #[test]
    fn test_defaults() {
        let ctx = fresh();
        assert_eq!(ctx.pet().species, Species::Blob);
        assert_eq!(ctx.pet().status, PetStatus::full());
        assert_eq!(ctx.coins(), 0);
        assert_eq!(ctx.background(), Background::LivingRoom);
    }

    #[test]
    fn test_complete_task_pays_coins_and_saves() {
        let mut ctx = fresh();
        ctx.tick_scheduler(at(4, 9, 0));
        let jobs = ctx.pending_tasks().iter().find(|t| t.habit == Habit::Jobs).unwrap().id;
        ctx.complete_task(jobs, at(4, 9, 5)).unwrap();
        assert_eq!(ctx.coins(), Habit::Jobs.rewards().coins);

        let saved = ctx.gateway.load().unwrap().unwrap();
        assert_eq!(saved.coins, ctx.coins());
        assert_eq!(saved.completed_tasks.len(), 1);
    }

    #[test]
    fn test_decay_pauses_on_game_over() {
        let mut ctx = fresh();
        ctx.pet.status = PetStatus::new(50, 50, 0);
        assert!(ctx.is_game_over());
        assert!(!ctx.tick_decay(at(4, 8, 10)));
        assert_eq!(ctx.pet().status.health(), 50);

        ctx.reset(at(4, 9, 0));
        assert!(!ctx.is_game_over());
        assert!(ctx.tick_decay(at(4, 9, 10)));
    }

    #[test]
    fn test_failed_save_does_not_break_play() {
        let mut ctx = GameContext::new(MemoryGateway::failing(), GameSettings::default(), at(4, 8, 0));
        ctx.tick_scheduler(at(4, 9, 0));
        let jobs = ctx.pending_tasks().iter().find(|t| t.habit == Habit::Jobs).unwrap().id;
        assert!(ctx.complete_task(jobs, at(4, 9, 5)).is_ok());
        assert!(!ctx.persist());
    }

    #[test]
    fn test_unreadable_snapshot_suspends_saving() {
        let gateway = MemoryGateway::with_json("{ definitely not a snapshot");
        let mut ctx = GameContext::load(gateway, GameSettings::default(), at(4, 8, 0));
        assert!(ctx.saves_suspended());
        ctx.tick_decay(at(4, 8, 10));
        assert_eq!(ctx.gateway.raw().unwrap(), "{ definitely not a snapshot");
    }

    #[test]
    fn test_assign_new_objective_archives_stale_one() {
        let mut ctx = fresh();
        let first = ctx.assign_new_objective(at(4, 8, 0)).unwrap();
        assert_eq!(first.assigned_date, at(4, 8, 0).date());
        assert_eq!(ctx.assign_new_objective(at(4, 20, 0)), Some(first));

        let saved = ctx.gateway.load().unwrap().unwrap();
        assert_eq!(saved.current_objective, Some(first));
        assert!(saved.objective_history.is_empty());

        let second = ctx.assign_new_objective(at(5, 8, 0)).unwrap();
        assert_eq!(second.assigned_date, at(5, 8, 0).date());

        let saved = ctx.gateway.load().unwrap().unwrap();
        assert_eq!(saved.current_objective, Some(second));
        assert_eq!(
            saved.objective_history,
            vec![ObjectiveRecord {
                objective: first,
                outcome: ObjectiveOutcome::Missed,
            }]
        );
    }

    #[test]
    fn test_complete_objective_archives_without_reward() {
        let mut ctx = fresh();
        assert!(ctx.complete_objective(at(4, 9, 0)).is_none());

        let objective = ctx.assign_new_objective(at(4, 8, 0)).unwrap();
        let record = ctx.complete_objective(at(4, 9, 0)).unwrap();
        assert_eq!(record.objective, objective);
        assert_eq!(record.outcome, ObjectiveOutcome::Claimed { at: at(4, 9, 0) });
        assert_eq!(ctx.coins(), 0);
        assert!(ctx.objectives().current().is_none());

        let saved = ctx.gateway.load().unwrap().unwrap();
        assert!(saved.current_objective.is_none());
        assert_eq!(saved.objective_history, vec![record]);

        // Today's objective is done; nothing new until tomorrow.
        assert!(ctx.check_in_objective(at(4, 18, 0)).is_none());
        assert!(ctx.check_in_objective(at(5, 8, 0)).is_some());
    }

    #[test]
    fn test_only_real_changes_are_saved() {
        let gateway = CountingGateway::default();
        let mut ctx = GameContext::new(gateway, GameSettings::default(), at(4, 9, 0));
        assert_eq!(ctx.gateway.saves(), 0);

        assert!(!ctx.tick_scheduler(at(4, 9, 0)).is_empty());
        assert_eq!(ctx.gateway.saves(), 1);
        assert!(ctx.tick_scheduler(at(4, 9, 5)).is_empty());
        assert_eq!(ctx.gateway.saves(), 1);

        assert!(ctx.tick_decay(at(4, 9, 10)));
        assert_eq!(ctx.gateway.saves(), 2);

        ctx.pet.status = PetStatus::new(50, 50, 0);
        assert!(!ctx.tick_decay(at(4, 9, 20)));
        assert!(!ctx.tick_decay(at(4, 9, 30)));
        assert_eq!(ctx.gateway.saves(), 2);

        assert_eq!(ctx.catch_up(599), 0);
        assert_eq!(ctx.gateway.saves(), 2);
    }
}
