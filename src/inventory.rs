use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::InventoryError;
use crate::pet::Species;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accessory {
    Fedora,
    Sunglasses,
    Tie,
    Bowtie,
}

impl Accessory {
    pub const ALL: [Accessory; 4] = [
        Accessory::Fedora,
        Accessory::Sunglasses,
        Accessory::Tie,
        Accessory::Bowtie,
    ];

    pub fn slot(self) -> EquipSlot {
        match self {
            Accessory::Fedora => EquipSlot::Hat,
            Accessory::Sunglasses => EquipSlot::Eyewear,
            Accessory::Tie | Accessory::Bowtie => EquipSlot::Neckwear,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Background {
    Forest,
    Desert,
    Ocean,
    City,
    LivingRoom,
}

impl Background {
    pub const ALL: [Background; 5] = [
        Background::Forest,
        Background::Desert,
        Background::Ocean,
        Background::City,
        Background::LivingRoom,
    ];
}

impl Default for Background {
    fn default() -> Self {
        Background::LivingRoom
    }
}

/// At most one item per slot is equipped. Accessories get one slot per body part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EquipSlot {
    Hat,
    Eyewear,
    Neckwear,
    Background,
    Animal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Accessory(Accessory),
    Background(Background),
    Animal(Species),
}

impl ItemKind {
    pub fn slot(self) -> EquipSlot {
        match self {
            ItemKind::Accessory(a) => a.slot(),
            ItemKind::Background(_) => EquipSlot::Background,
            ItemKind::Animal(_) => EquipSlot::Animal,
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Accessory(a) => write!(f, "accessory:{:?}", a),
            ItemKind::Background(b) => write!(f, "background:{:?}", b),
            ItemKind::Animal(s) => write!(f, "animal:{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub item_type: ItemKind,
    pub acquired_at: NaiveDateTime,
    pub is_equipped: bool,
}

/// Owned non-consumable items. Each kind is owned at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    items: Vec<InventoryItem>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh inventory: a blob and the living room, both equipped.
    pub fn starter(now: NaiveDateTime) -> Self {
        let mut inventory = Self::new();
        inventory.add(ItemKind::Animal(Species::Blob), true, now);
        inventory.add(ItemKind::Background(Background::LivingRoom), true, now);
        inventory
    }

    pub fn from_items(items: Vec<InventoryItem>) -> Self {
        let mut inventory = Self::new();
        for item in items {
            if !inventory.owns(item.item_type) {
                inventory.items.push(item);
            }
        }
        inventory
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn owns(&self, kind: ItemKind) -> bool {
        self.items.iter().any(|i| i.item_type == kind)
    }

    pub fn get(&self, id: Uuid) -> Option<&InventoryItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn find(&self, kind: ItemKind) -> Option<&InventoryItem> {
        self.items.iter().find(|i| i.item_type == kind)
    }

    /// Register an item. No-op returning the existing id if already owned.
    pub fn add(&mut self, kind: ItemKind, equipped: bool, now: NaiveDateTime) -> Uuid {
        if let Some(existing) = self.find(kind) {
            return existing.id;
        }
        let item = InventoryItem {
            id: Uuid::new_v4(),
            item_type: kind,
            acquired_at: now,
            is_equipped: false,
        };
        let id = item.id;
        self.items.push(item);
        if equipped {
            self.equip_in_slot(id);
        }
        id
    }

    pub fn equip(&mut self, id: Uuid) -> Result<&InventoryItem, InventoryError> {
        if self.get(id).is_none() {
            return Err(InventoryError::NotFound(id.to_string()));
        }
        self.equip_in_slot(id);
        self.get(id)
            .ok_or_else(|| InventoryError::NotFound(id.to_string()))
    }

    fn equip_in_slot(&mut self, id: Uuid) {
        let Some(slot) = self.get(id).map(|i| i.item_type.slot()) else {
            return;
        };
        for item in self.items.iter_mut() {
            if item.item_type.slot() == slot {
                item.is_equipped = item.id == id;
            }
        }
    }

    pub fn unequip(&mut self, id: Uuid) -> Result<(), InventoryError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| InventoryError::NotFound(id.to_string()))?;
        if matches!(item.item_type, ItemKind::Animal(_)) {
            return Err(InventoryError::AnimalAlwaysEquipped);
        }
        item.is_equipped = false;
        Ok(())
    }

    /// Drop an owned kind entirely. Used by resets.
    pub fn remove(&mut self, kind: ItemKind) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.item_type != kind);
        before != self.items.len()
    }

    pub fn equipped(&self) -> impl Iterator<Item = &InventoryItem> {
        self.items.iter().filter(|i| i.is_equipped)
    }

    pub fn equipped_in(&self, slot: EquipSlot) -> Option<&InventoryItem> {
        self.equipped().find(|i| i.item_type.slot() == slot)
    }

    pub fn active_background(&self) -> Option<Background> {
        match self.equipped_in(EquipSlot::Background)?.item_type {
            ItemKind::Background(b) => Some(b),
            _ => None,
        }
    }
}
