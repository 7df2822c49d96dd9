use crate::{
    config::NewGameConfig,
    document::{restore_lenient, to_document},
    subsystem::Persistable,
    types::Document,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;

/// Distinct item kinds the player can carry at once.
pub const CARRIED_SLOTS: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InventoryState {
    pub gold:              u32,
    pub carried:           BTreeMap<String, u32>,
    pub storage:           BTreeMap<String, u32>,
    pub unlocked_recipes:  Vec<String>,
    pub mastered_recipes:  Vec<String>,
    pub favorite_recipes:  Vec<String>,
    pub auto_sort_enabled: bool,
}

impl InventoryState {
    pub fn starting(config: &NewGameConfig) -> Self {
        Self {
            gold:              config.starting_gold,
            carried:           BTreeMap::new(),
            storage:           BTreeMap::new(),
            unlocked_recipes:  config.default_recipes.clone(),
            mastered_recipes:  Vec::new(),
            favorite_recipes:  Vec::new(),
            auto_sort_enabled: true,
        }
    }
}

impl Default for InventoryState {
    fn default() -> Self {
        Self::starting(&NewGameConfig::default())
    }
}

pub struct InventorySubsystem {
    pub state: InventoryState,
    fresh:     InventoryState,
}

impl InventorySubsystem {
    pub fn new(config: &NewGameConfig) -> Self {
        let fresh = InventoryState::starting(config);
        Self { state: fresh.clone(), fresh }
    }

    pub fn gold(&self) -> u32 {
        self.state.gold
    }

    pub fn add_gold(&mut self, amount: u32) {
        self.state.gold = self.state.gold.saturating_add(amount);
    }

    /// Returns false, leaving gold untouched, when the balance is short.
    pub fn spend_gold(&mut self, amount: u32) -> bool {
        if self.state.gold < amount {
            return false;
        }
        self.state.gold -= amount;
        true
    }

    /// Add to the carried bag. A new item kind needs a free slot; returns
    /// the quantity actually added.
    pub fn add_item(&mut self, item_id: &str, quantity: u32) -> u32 {
        if quantity == 0 {
            return 0;
        }
        if !self.state.carried.contains_key(item_id) && self.state.carried.len() >= CARRIED_SLOTS {
            log::debug!("inventory full; dropped {quantity}x {item_id}");
            return 0;
        }
        *self.state.carried.entry(item_id.to_string()).or_insert(0) += quantity;
        quantity
    }

    pub fn remove_item(&mut self, item_id: &str, quantity: u32) -> bool {
        match self.state.carried.get_mut(item_id) {
            Some(held) if *held >= quantity => {
                *held -= quantity;
                if *held == 0 {
                    self.state.carried.remove(item_id);
                }
                true
            }
            _ => false,
        }
    }

    pub fn item_count(&self, item_id: &str) -> u32 {
        self.state.carried.get(item_id).copied().unwrap_or(0)
            + self.state.storage.get(item_id).copied().unwrap_or(0)
    }

    /// Move everything carried into storage.
    pub fn deposit_all(&mut self) {
        for (item, quantity) in std::mem::take(&mut self.state.carried) {
            *self.state.storage.entry(item).or_insert(0) += quantity;
        }
    }

    pub fn unlock_recipe(&mut self, recipe_id: &str) -> bool {
        if self.has_recipe(recipe_id) {
            return false;
        }
        self.state.unlocked_recipes.push(recipe_id.to_string());
        true
    }

    pub fn has_recipe(&self, recipe_id: &str) -> bool {
        self.state.unlocked_recipes.iter().any(|r| r == recipe_id)
    }
}

impl Default for InventorySubsystem {
    fn default() -> Self { Self::new(&NewGameConfig::default()) }
}

impl Persistable for InventorySubsystem {
    fn name(&self) -> &'static str { "inventory" }

    fn snapshot(&self) -> Document {
        to_document(self.name(), &self.state)
    }

    fn restore(&mut self, doc: &Document) {
        self.state = restore_lenient(self.name(), doc, self.fresh.clone());
    }

    fn as_any(&self) -> &dyn Any { self }
    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}
