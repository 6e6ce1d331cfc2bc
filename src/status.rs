use chrono::NaiveDateTime;
use colored::*;

use crate::game::GameContext;
use crate::inventory::EquipSlot;
use crate::objective::ObjectiveOutcome;
use crate::pet::{PetStatus, STAT_MAX};
use crate::shop::{ItemCategory, ShopItem};
use crate::store::PersistenceGateway;

const BAR_WIDTH: usize = 20;

/// Plain text gauge, e.g. `[#####...............]`.
pub fn gauge(value: i32) -> String {
    let filled = (value.clamp(0, STAT_MAX) as usize * BAR_WIDTH) / STAT_MAX as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn colored_stat(value: i32, threshold: i32) -> ColoredString {
    let text = format!("{} {:>3}", gauge(value), value);
    if value == 0 {
        text.red().bold()
    } else if value < threshold {
        text.yellow()
    } else {
        text.green()
    }
}

fn print_stats(status: &PetStatus, threshold: i32) {
    println!("  Happiness {}", colored_stat(status.happiness(), threshold));
    println!("  Health    {}", colored_stat(status.health(), threshold));
    println!("  Hunger    {}", colored_stat(status.hunger(), threshold));
}

pub fn print_status<G: PersistenceGateway>(ctx: &GameContext<G>, now: NaiveDateTime) {
    let pet = ctx.pet();
    println!("{}", format!("Your {}", pet.species).cyan().bold());
    print_stats(&pet.status, ctx.settings().low_stat_threshold);

    println!("\n{} {}", "Coins:".cyan(), ctx.coins().to_string().yellow());
    println!("{} {:?}", "Background:".cyan(), ctx.background());
    if let Some(next) = pet.species.successor() {
        println!(
            "{} {} ({} coins)",
            "Next upgrade:".cyan(),
            next,
            ShopItem::Upgrade(next).cost()
        );
    }

    let worn: Vec<String> = ctx
        .inventory()
        .equipped()
        .filter(|i| !matches!(i.item_type.slot(), EquipSlot::Animal | EquipSlot::Background))
        .map(|i| i.item_type.to_string())
        .collect();
    if !worn.is_empty() {
        println!("{} {}", "Wearing:".cyan(), worn.join(", "));
    }

    println!(
        "{} {} pending, {} done today",
        "Tasks:".cyan(),
        ctx.pending_tasks().len(),
        ctx.scheduler().completed_on(now)
    );

    if ctx.is_game_over() {
        println!(
            "\n{}",
            "Your pet has given up. Run `habitpet reset` to start over.".red().bold()
        );
    }
    if ctx.saves_suspended() {
        println!("{}", "Saved state could not be read; changes will not be saved.".yellow());
    }
}

pub fn print_tasks<G: PersistenceGateway>(ctx: &GameContext<G>, now: NaiveDateTime) {
    let pending = ctx.pending_tasks();
    if pending.is_empty() {
        println!("No tasks right now.");
    } else {
        println!("{}", format!("Pending tasks ({}):", pending.len()).cyan().bold());
        for task in pending {
            let rewards = task.habit.rewards();
            println!(
                "  {} {:<9} {} (+{} coins)",
                task.id.to_string().dimmed(),
                task.habit.to_string().bold(),
                task.habit.description(),
                rewards.coins
            );
        }
    }

    let cooling: Vec<String> = ctx
        .scheduler()
        .cooldowns()
        .iter()
        .filter(|(_, until)| **until > now)
        .map(|(habit, until)| format!("{} until {}", habit, until.format("%H:%M")))
        .collect();
    if !cooling.is_empty() {
        println!("{} {}", "Done for now:".dimmed(), cooling.join(", "));
    }
}

fn category_title(category: ItemCategory) -> &'static str {
    match category {
        ItemCategory::Food => "Food",
        ItemCategory::Accessory => "Accessories",
        ItemCategory::Background => "Backgrounds",
        ItemCategory::Upgrade => "Upgrades",
    }
}

pub fn print_shop<G: PersistenceGateway>(ctx: &GameContext<G>) {
    println!("{} {}", "Coins:".cyan(), ctx.coins().to_string().yellow());
    let catalog = ShopItem::catalog();
    for category in [
        ItemCategory::Food,
        ItemCategory::Accessory,
        ItemCategory::Background,
        ItemCategory::Upgrade,
    ] {
        println!("\n{}", category_title(category).cyan().bold());
        for item in catalog.iter().filter(|i| i.category() == category) {
            let line = format!("  {:<12} {:>5}", item.name(), item.cost());
            match ctx.check_purchase(*item) {
                Ok(()) => println!("{}", line.green()),
                Err(e) => println!("{}  {}", line.dimmed(), e.to_string().dimmed()),
            }
        }
    }
}

pub fn print_inventory<G: PersistenceGateway>(ctx: &GameContext<G>) {
    println!("{}", "Inventory".cyan().bold());
    for item in ctx.inventory().items() {
        let marker = if item.is_equipped { "*".green() } else { " ".normal() };
        println!(
            "  {} {} {}",
            marker,
            item.id.to_string().dimmed(),
            item.item_type
        );
    }
}

pub fn print_objective<G: PersistenceGateway>(ctx: &GameContext<G>, now: NaiveDateTime) {
    match ctx.objectives().current() {
        Some(objective) => {
            println!(
                "{} {}",
                "Today's objective:".cyan().bold(),
                objective.objective_type.description()
            );
            if ctx.objective_satisfied(now) {
                println!("{}", "Done! Claim it with `habitpet objective --claim`.".green());
            } else {
                println!("{}", "Not done yet.".yellow());
            }
        }
        None => println!("No objective right now. Come back tomorrow."),
    }

    let claimed = ctx
        .objectives()
        .history()
        .iter()
        .filter(|r| matches!(r.outcome, ObjectiveOutcome::Claimed { .. }))
        .count();
    println!(
        "{} {} claimed, {} missed",
        "History:".dimmed(),
        claimed,
        ctx.objectives().history().len() - claimed
    );
}
