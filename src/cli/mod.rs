use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use colored::*;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::config::Config;
use crate::game::{Completion, GameContext, GameSettings};
use crate::habit::Habit;
use crate::runtime::{local_now, GameDriver};
use crate::shop::ShopItem;
use crate::status;
use crate::store::JsonFileGateway;
use crate::verifier::{Evidence, EvidenceVerifier};

pub use commands::{Commands, EvidenceArgs};

mod commands;

type Game = GameContext<JsonFileGateway>;

/// Only one process may write the state file at a time.
fn lock_state(config: &Config) -> Result<JsonFileGateway> {
    JsonFileGateway::open_exclusive(config.state_file())
        .context("State is busy; stop `habitpet run` before using other commands")
}

fn open(data_dir: Option<PathBuf>) -> Result<(Config, Game, NaiveDateTime)> {
    let config = Config::new(data_dir)?;
    let gateway = lock_state(&config)?;
    let now = local_now();
    let mut ctx = GameContext::load(gateway, GameSettings::from(&config), now);
    ctx.resume(now);
    Ok((config, ctx, now))
}

pub async fn handle_status(data_dir: Option<PathBuf>) -> Result<()> {
    let (_, ctx, now) = open(data_dir)?;
    status::print_status(&ctx, now);
    Ok(())
}

pub async fn handle_tasks(data_dir: Option<PathBuf>) -> Result<()> {
    let (_, ctx, now) = open(data_dir)?;
    status::print_tasks(&ctx, now);
    Ok(())
}

fn resolve_task(ctx: &Game, task: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(task) {
        return Ok(id);
    }
    let wanted = task.trim().to_lowercase();
    let habit = Habit::ALL
        .into_iter()
        .find(|h| h.to_string() == wanted)
        .ok_or_else(|| anyhow!("Not a task id or habit: {}", task))?;
    ctx.pending_tasks()
        .iter()
        .find(|t| t.habit == habit)
        .map(|t| t.id)
        .ok_or_else(|| anyhow!("No pending {} task", habit))
}

impl EvidenceArgs {
    fn into_evidence(self) -> Evidence {
        if let Some(count) = self.steps {
            Evidence::Steps { count }
        } else if let Some(hours) = self.sleep_hours {
            Evidence::Sleep { hours }
        } else if let Some(minutes) = self.outdoor_minutes {
            Evidence::Outdoors { minutes }
        } else if let Some(content) = self.text {
            Evidence::Text { content }
        } else {
            Evidence::None
        }
    }
}

pub async fn handle_complete(
    task: String,
    force: bool,
    evidence: EvidenceArgs,
    data_dir: Option<PathBuf>,
) -> Result<()> {
    let (_, mut ctx, now) = open(data_dir)?;
    let task_id = resolve_task(&ctx, &task)?;

    let record = if force {
        ctx.force_complete(task_id, now)?
    } else {
        let verifier = EvidenceVerifier::default();
        match ctx
            .complete_verified(task_id, &evidence.into_evidence(), &verifier, now)
            .await?
        {
            Completion::Completed(record) => record,
            Completion::NotVerified(detail) => {
                println!("{} {}", "Could not verify:".yellow(), detail);
                println!("Use --force to complete it anyway.");
                return Ok(());
            }
        }
    };

    let rewards = record.habit.rewards();
    println!(
        "{} {} (+{} coins)",
        "Completed".green().bold(),
        record.habit,
        rewards.coins
    );
    status::print_status(&ctx, now);
    Ok(())
}

pub async fn handle_shop(data_dir: Option<PathBuf>) -> Result<()> {
    let (_, ctx, _) = open(data_dir)?;
    status::print_shop(&ctx);
    Ok(())
}

pub async fn handle_buy(item: String, data_dir: Option<PathBuf>) -> Result<()> {
    let item = ShopItem::from_str(&item)?;
    let (_, mut ctx, now) = open(data_dir)?;
    let record = ctx
        .buy(item, now)
        .with_context(|| format!("Cannot buy {}", item))?;
    println!(
        "{} {} for {} coins ({} left)",
        "Bought".green().bold(),
        record.item,
        record.coins_cost,
        ctx.coins()
    );
    Ok(())
}

pub async fn handle_inventory(data_dir: Option<PathBuf>) -> Result<()> {
    let (_, ctx, _) = open(data_dir)?;
    status::print_inventory(&ctx);
    Ok(())
}

fn resolve_item(ctx: &Game, item: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(item) {
        return Ok(id);
    }
    let kind = ShopItem::from_str(item)?
        .inventory_kind()
        .ok_or_else(|| anyhow!("{} is not something you can equip", item))?;
    ctx.inventory()
        .find(kind)
        .map(|i| i.id)
        .ok_or_else(|| anyhow!("You do not own {}", item))
}

pub async fn handle_equip(item: String, data_dir: Option<PathBuf>) -> Result<()> {
    let (_, mut ctx, _) = open(data_dir)?;
    let id = resolve_item(&ctx, &item)?;
    let equipped = ctx.equip(id)?;
    println!("{} {}", "Equipped".green(), equipped.item_type);
    Ok(())
}

pub async fn handle_unequip(item: String, data_dir: Option<PathBuf>) -> Result<()> {
    let (_, mut ctx, _) = open(data_dir)?;
    let id = resolve_item(&ctx, &item)?;
    ctx.unequip(id)?;
    println!("{} {}", "Unequipped".green(), item);
    Ok(())
}

pub async fn handle_objective(claim: bool, data_dir: Option<PathBuf>) -> Result<()> {
    let (config, mut ctx, now) = open(data_dir)?;
    if claim {
        ctx.claim_objective(now)?;
        println!(
            "{} +{} coins",
            "Objective claimed!".green().bold(),
            config.objective_reward
        );
    }
    status::print_objective(&ctx, now);
    Ok(())
}

pub async fn handle_reset(data_dir: Option<PathBuf>) -> Result<()> {
    let (_, mut ctx, now) = open(data_dir)?;
    ctx.reset(now);
    println!("{}", "A fresh blob has moved in.".cyan());
    status::print_status(&ctx, now);
    Ok(())
}

pub async fn handle_run(data_dir: Option<PathBuf>) -> Result<()> {
    let config = Config::new(data_dir)?;
    let gateway = lock_state(&config)?;
    let ctx = GameContext::load(gateway, GameSettings::from(&config), local_now());

    let (driver, _handle) = GameDriver::new(ctx, config.scheduler_tick_secs);
    let (stop, shutdown) = oneshot::channel();
    let running = tokio::spawn(driver.run(shutdown));

    println!("{}", "habitpet is running. Press Ctrl+C to stop.".cyan());
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    let _ = stop.send(());
    let ctx = running.await.context("Game driver panicked")?;
    status::print_status(&ctx, local_now());
    Ok(())
}
