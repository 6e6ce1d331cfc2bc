use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::core::PurchaseError;
use crate::inventory::{Accessory, Background, Inventory, ItemKind};
use crate::pet::{Pet, Species, StatEffect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Food {
    Steak,
    Potion,
    Pills,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShopItem {
    Food(Food),
    Accessory(Accessory),
    Background(Background),
    Upgrade(Species),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemCategory {
    Food,
    Accessory,
    Background,
    Upgrade,
}

impl ShopItem {
    /// Everything the shop lists, in display order.
    pub fn catalog() -> Vec<ShopItem> {
        let mut items = vec![
            ShopItem::Food(Food::Steak),
            ShopItem::Food(Food::Potion),
            ShopItem::Food(Food::Pills),
        ];
        items.extend(Accessory::ALL.into_iter().map(ShopItem::Accessory));
        items.extend(Background::ALL.into_iter().map(ShopItem::Background));
        items.extend(
            Species::CHAIN
                .into_iter()
                .filter(|s| s.predecessor().is_some())
                .map(ShopItem::Upgrade),
        );
        items
    }

    pub fn cost(self) -> u32 {
        match self {
            ShopItem::Food(Food::Steak) => 20,
            ShopItem::Food(Food::Potion) => 40,
            ShopItem::Food(Food::Pills) => 15,
            ShopItem::Accessory(Accessory::Fedora) => 60,
            ShopItem::Accessory(Accessory::Sunglasses) => 50,
            ShopItem::Accessory(Accessory::Tie) => 40,
            ShopItem::Accessory(Accessory::Bowtie) => 45,
            ShopItem::Background(Background::LivingRoom) => 0,
            ShopItem::Background(Background::City) => 80,
            ShopItem::Background(Background::Forest) => 100,
            ShopItem::Background(Background::Desert) => 100,
            ShopItem::Background(Background::Ocean) => 120,
            ShopItem::Upgrade(Species::Blob) => 0,
            ShopItem::Upgrade(Species::Fish) => 100,
            ShopItem::Upgrade(Species::Gecko) => 200,
            ShopItem::Upgrade(Species::Cat) => 350,
            ShopItem::Upgrade(Species::Dog) => 500,
            ShopItem::Upgrade(Species::Unicorn) => 1000,
        }
    }

    pub fn effect(self) -> StatEffect {
        match self {
            ShopItem::Food(Food::Steak) => StatEffect::Hunger(30),
            ShopItem::Food(Food::Potion) => StatEffect::Health(30),
            ShopItem::Food(Food::Pills) => StatEffect::Health(10),
            ShopItem::Accessory(Accessory::Fedora) => StatEffect::Happiness(15),
            ShopItem::Accessory(Accessory::Sunglasses) => StatEffect::Happiness(12),
            ShopItem::Accessory(Accessory::Tie) => StatEffect::Happiness(10),
            ShopItem::Accessory(Accessory::Bowtie) => StatEffect::Happiness(10),
            ShopItem::Background(_) => StatEffect::Happiness(20),
            ShopItem::Upgrade(_) => StatEffect::None,
        }
    }

    pub fn category(self) -> ItemCategory {
        match self {
            ShopItem::Food(_) => ItemCategory::Food,
            ShopItem::Accessory(_) => ItemCategory::Accessory,
            ShopItem::Background(_) => ItemCategory::Background,
            ShopItem::Upgrade(_) => ItemCategory::Upgrade,
        }
    }

    pub fn is_consumable(self) -> bool {
        matches!(self, ShopItem::Food(_))
    }

    /// Inventory footprint of a non-consumable.
    pub fn inventory_kind(self) -> Option<ItemKind> {
        match self {
            ShopItem::Food(_) => None,
            ShopItem::Accessory(a) => Some(ItemKind::Accessory(a)),
            ShopItem::Background(b) => Some(ItemKind::Background(b)),
            ShopItem::Upgrade(s) => Some(ItemKind::Animal(s)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShopItem::Food(Food::Steak) => "steak",
            ShopItem::Food(Food::Potion) => "potion",
            ShopItem::Food(Food::Pills) => "pills",
            ShopItem::Accessory(Accessory::Fedora) => "fedora",
            ShopItem::Accessory(Accessory::Sunglasses) => "sunglasses",
            ShopItem::Accessory(Accessory::Tie) => "tie",
            ShopItem::Accessory(Accessory::Bowtie) => "bowtie",
            ShopItem::Background(Background::Forest) => "forest",
            ShopItem::Background(Background::Desert) => "desert",
            ShopItem::Background(Background::Ocean) => "ocean",
            ShopItem::Background(Background::City) => "city",
            ShopItem::Background(Background::LivingRoom) => "living-room",
            ShopItem::Upgrade(Species::Blob) => "blob",
            ShopItem::Upgrade(Species::Fish) => "fish",
            ShopItem::Upgrade(Species::Gecko) => "gecko",
            ShopItem::Upgrade(Species::Cat) => "cat",
            ShopItem::Upgrade(Species::Dog) => "dog",
            ShopItem::Upgrade(Species::Unicorn) => "unicorn",
        }
    }
}

impl std::str::FromStr for ShopItem {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ShopItem::catalog()
            .into_iter()
            .find(|item| item.name() == wanted)
            .ok_or_else(|| anyhow::anyhow!("Unknown shop item: {}", s))
    }
}

impl std::fmt::Display for ShopItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub id: Uuid,
    pub item: ShopItem,
    pub timestamp: NaiveDateTime,
    pub coins_cost: u32,
}

/// Coin purse plus the append-only purchase ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurchaseEngine {
    coins: u32,
    history: Vec<PurchaseRecord>,
}

impl PurchaseEngine {
    pub fn new(coins: u32, history: Vec<PurchaseRecord>) -> Self {
        Self { coins, history }
    }

    pub fn coins(&self) -> u32 {
        self.coins
    }

    pub fn history(&self) -> &[PurchaseRecord] {
        &self.history
    }

    pub fn deposit(&mut self, amount: u32) {
        self.coins = self.coins.saturating_add(amount);
    }

    /// Why `item` cannot be bought right now, if anything.
    pub fn check(&self, item: ShopItem, pet: &Pet, inventory: &Inventory) -> Result<(), PurchaseError> {
        if self.coins < item.cost() {
            return Err(PurchaseError::InsufficientFunds);
        }
        if let Some(kind) = item.inventory_kind() {
            if inventory.owns(kind) {
                return Err(PurchaseError::AlreadyOwned);
            }
        }
        if let ShopItem::Upgrade(target) = item {
            if target.predecessor() != Some(pet.species) {
                return Err(PurchaseError::InvalidUpgrade);
            }
        }
        Ok(())
    }

    pub fn can_buy(&self, item: ShopItem, pet: &Pet, inventory: &Inventory) -> bool {
        self.check(item, pet, inventory).is_ok()
    }

    /// Validate and apply a purchase. Nothing changes on error.
    pub fn buy(
        &mut self,
        item: ShopItem,
        pet: &mut Pet,
        inventory: &mut Inventory,
        now: NaiveDateTime,
    ) -> Result<PurchaseRecord, PurchaseError> {
        self.check(item, pet, inventory)?;

        self.coins -= item.cost();
        match item {
            ShopItem::Upgrade(target) => {
                pet.species = target;
                inventory.add(ItemKind::Animal(target), true, now);
            }
            ShopItem::Background(background) => {
                let id = inventory.add(ItemKind::Background(background), false, now);
                // Freshly added, so the id is present.
                let _ = inventory.equip(id);
            }
            ShopItem::Accessory(accessory) => {
                inventory.add(ItemKind::Accessory(accessory), false, now);
            }
            ShopItem::Food(_) => {}
        }
        pet.status.apply_effect(item.effect());

        let record = PurchaseRecord {
            id: Uuid::new_v4(),
            item,
            timestamp: now,
            coins_cost: item.cost(),
        };
        self.history.push(record.clone());
        info!(item = %item, cost = item.cost(), coins_left = self.coins, "purchase completed");
        Ok(record)
    }
}
