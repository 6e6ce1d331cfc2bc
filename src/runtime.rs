//! Async driver for a long-running game.
//!
//! The driver task owns the [`GameContext`]. Timers and requests from any
//! number of [`GameHandle`]s are serialized through one `select!` loop, so
//! mutations never interleave.

use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDateTime};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::{InventoryError, ObjectiveError, PurchaseError, TaskError};
use crate::game::{Completion, GameContext};
use crate::inventory::InventoryItem;
use crate::objective::ObjectiveRecord;
use crate::scheduler::{CompletedTaskRecord, HabitTask};
use crate::shop::{PurchaseRecord, ShopItem};
use crate::store::{PersistenceGateway, StateSnapshot};
use crate::verifier::{Evidence, TaskVerifier};

const COMMAND_BUFFER: usize = 32;

pub type Clock = fn() -> NaiveDateTime;

pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Time left until the next decay boundary. The part of the interval that
/// already elapsed before startup counts toward the first tick.
fn first_decay_delay(
    last_decay_at: NaiveDateTime,
    now: NaiveDateTime,
    period: Duration,
) -> Duration {
    let elapsed = (now - last_decay_at).to_std().unwrap_or(Duration::ZERO);
    period.saturating_sub(elapsed)
}

enum Command {
    Snapshot(oneshot::Sender<StateSnapshot>),
    FindTask {
        task_id: Uuid,
        reply: oneshot::Sender<Option<HabitTask>>,
    },
    CompleteTask {
        task_id: Uuid,
        reply: oneshot::Sender<Result<CompletedTaskRecord, TaskError>>,
    },
    Buy {
        item: ShopItem,
        reply: oneshot::Sender<Result<PurchaseRecord, PurchaseError>>,
    },
    Equip {
        item_id: Uuid,
        reply: oneshot::Sender<Result<InventoryItem, InventoryError>>,
    },
    Unequip {
        item_id: Uuid,
        reply: oneshot::Sender<Result<(), InventoryError>>,
    },
    ClaimObjective(oneshot::Sender<Result<ObjectiveRecord, ObjectiveError>>),
    Reset(oneshot::Sender<()>),
}

pub struct GameDriver<G: PersistenceGateway> {
    ctx: GameContext<G>,
    commands: mpsc::Receiver<Command>,
    scheduler_period: Duration,
    clock: Clock,
}

impl<G: PersistenceGateway> GameDriver<G> {
    pub fn new(ctx: GameContext<G>, scheduler_tick_secs: u64) -> (Self, GameHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let driver = Self {
            ctx,
            commands: rx,
            scheduler_period: Duration::from_secs(scheduler_tick_secs.max(1)),
            clock: local_now,
        };
        (driver, GameHandle { tx })
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Run until `shutdown` fires or every handle is dropped, then hand the
    /// context back.
    pub async fn run(mut self, mut shutdown: oneshot::Receiver<()>) -> GameContext<G> {
        self.ctx.resume((self.clock)());

        let decay_period = Duration::from_secs(self.ctx.decay().interval_secs());
        let last_decay_at = self.ctx.decay().last_decay_at();
        let first = first_decay_delay(last_decay_at, (self.clock)(), decay_period);
        let mut decay = interval_at(Instant::now() + first, decay_period);
        decay.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut scheduler = interval(self.scheduler_period);
        scheduler.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            decay_secs = decay_period.as_secs(),
            scheduler_secs = self.scheduler_period.as_secs(),
            "game driver started"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("game driver shutting down");
                    break;
                }
                _ = decay.tick() => {
                    self.ctx.tick_decay((self.clock)());
                }
                _ = scheduler.tick() => {
                    let created = self.ctx.tick_scheduler((self.clock)());
                    if !created.is_empty() {
                        debug!(count = created.len(), "new tasks available");
                    }
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.dispatch(command),
                    None => {
                        info!("all handles dropped, game driver stopping");
                        break;
                    }
                },
            }
        }

        self.ctx.persist();
        self.ctx
    }

    fn dispatch(&mut self, command: Command) {
        let now = (self.clock)();
        // A dropped reply receiver just means the caller stopped waiting.
        match command {
            Command::Snapshot(reply) => {
                let _ = reply.send(self.ctx.snapshot());
            }
            Command::FindTask { task_id, reply } => {
                let _ = reply.send(self.ctx.scheduler().find(task_id).cloned());
            }
            Command::CompleteTask { task_id, reply } => {
                let _ = reply.send(self.ctx.complete_task(task_id, now));
            }
            Command::Buy { item, reply } => {
                let _ = reply.send(self.ctx.buy(item, now));
            }
            Command::Equip { item_id, reply } => {
                let _ = reply.send(self.ctx.equip(item_id));
            }
            Command::Unequip { item_id, reply } => {
                let _ = reply.send(self.ctx.unequip(item_id));
            }
            Command::ClaimObjective(reply) => {
                let _ = reply.send(self.ctx.claim_objective(now));
            }
            Command::Reset(reply) => {
                self.ctx.reset(now);
                let _ = reply.send(());
            }
        }
    }
}

/// Cheap, cloneable front door to a running [`GameDriver`].
#[derive(Clone)]
pub struct GameHandle {
    tx: mpsc::Sender<Command>,
}

impl GameHandle {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| anyhow!("game driver is not running"))?;
        rx.await.map_err(|_| anyhow!("game driver dropped the request"))
    }

    pub async fn snapshot(&self) -> Result<StateSnapshot> {
        self.request(Command::Snapshot).await
    }

    pub async fn complete_task(&self, task_id: Uuid) -> Result<CompletedTaskRecord> {
        Ok(self
            .request(|reply| Command::CompleteTask { task_id, reply })
            .await??)
    }

    /// Verification runs on the caller's task; the driver keeps ticking
    /// while it is pending.
    pub async fn complete_verified<V: TaskVerifier>(
        &self,
        task_id: Uuid,
        evidence: &Evidence,
        verifier: &V,
    ) -> Result<Completion> {
        let task = self
            .request(|reply| Command::FindTask { task_id, reply })
            .await?
            .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;

        match verifier.verify(&task, evidence).await {
            Ok(verdict) if verdict.confident => {
                Ok(Completion::Completed(self.complete_task(task_id).await?))
            }
            Ok(verdict) => Ok(Completion::NotVerified(verdict.detail)),
            Err(e) => Ok(Completion::NotVerified(e.to_string())),
        }
    }

    pub async fn buy(&self, item: ShopItem) -> Result<PurchaseRecord> {
        Ok(self.request(|reply| Command::Buy { item, reply }).await??)
    }

    pub async fn equip(&self, item_id: Uuid) -> Result<InventoryItem> {
        Ok(self.request(|reply| Command::Equip { item_id, reply }).await??)
    }

    pub async fn unequip(&self, item_id: Uuid) -> Result<()> {
        Ok(self
            .request(|reply| Command::Unequip { item_id, reply })
            .await??)
    }

    pub async fn claim_objective(&self) -> Result<ObjectiveRecord> {
        Ok(self.request(Command::ClaimObjective).await??)
    }

    pub async fn reset(&self) -> Result<()> {
        self.request(Command::Reset).await
    }
}
