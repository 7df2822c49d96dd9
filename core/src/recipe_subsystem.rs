use crate::{
    config::NewGameConfig,
    document::{restore_lenient, to_document},
    subsystem::Persistable,
    types::Document,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;

/// Cooks needed before a recipe can be mastered.
pub const MASTERY_COOK_COUNT: u32 = 10;
/// Five-star cooks needed for mastery.
pub const MASTERY_PERFECT_COUNT: u32 = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeMastery {
    pub times_cooked:  u32,
    pub perfect_cooks: u32,
    pub best_quality:  u8,
    pub mastered:      bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecipeState {
    pub unlocked:       Vec<String>,
    pub discovered:     Vec<String>,
    pub mastery:        BTreeMap<String, RecipeMastery>,
    pub story_progress: Vec<String>,
}

impl RecipeState {
    pub fn starting(config: &NewGameConfig) -> Self {
        Self {
            unlocked:       config.default_recipes.clone(),
            discovered:     Vec::new(),
            mastery:        BTreeMap::new(),
            story_progress: Vec::new(),
        }
    }
}

impl Default for RecipeState {
    fn default() -> Self {
        Self::starting(&NewGameConfig::default())
    }
}

pub struct RecipeSubsystem {
    pub state: RecipeState,
    fresh:     RecipeState,
}

impl RecipeSubsystem {
    pub fn new(config: &NewGameConfig) -> Self {
        let fresh = RecipeState::starting(config);
        Self { state: fresh.clone(), fresh }
    }

    pub fn unlock(&mut self, recipe_id: &str) -> bool {
        if self.is_unlocked(recipe_id) {
            return false;
        }
        self.state.discovered.retain(|r| r != recipe_id);
        self.state.unlocked.push(recipe_id.to_string());
        true
    }

    pub fn discover(&mut self, recipe_id: &str) -> bool {
        if self.is_unlocked(recipe_id) || self.state.discovered.iter().any(|r| r == recipe_id) {
            return false;
        }
        self.state.discovered.push(recipe_id.to_string());
        true
    }

    pub fn is_unlocked(&self, recipe_id: &str) -> bool {
        self.state.unlocked.iter().any(|r| r == recipe_id)
    }

    pub fn unlocked_count(&self) -> usize {
        self.state.unlocked.len()
    }

    /// Record one cook at `quality` (1..=5). Returns true when this cook
    /// mastered the recipe.
    pub fn record_cook(&mut self, recipe_id: &str, quality: u8) -> bool {
        let entry = self.state.mastery.entry(recipe_id.to_string()).or_default();
        entry.times_cooked += 1;
        entry.best_quality = entry.best_quality.max(quality.min(5));
        if quality >= 5 {
            entry.perfect_cooks += 1;
        }
        if !entry.mastered
            && entry.times_cooked >= MASTERY_COOK_COUNT
            && entry.perfect_cooks >= MASTERY_PERFECT_COUNT
        {
            entry.mastered = true;
            log::info!("recipe {recipe_id} mastered");
            return true;
        }
        false
    }

    pub fn mastered(&self) -> Vec<String> {
        self.state
            .mastery
            .iter()
            .filter(|(_, m)| m.mastered)
            .map(|(id, _)| id.clone())
            .collect()
    }
}

impl Default for RecipeSubsystem {
    fn default() -> Self { Self::new(&NewGameConfig::default()) }
}

impl Persistable for RecipeSubsystem {
    fn name(&self) -> &'static str { "recipes" }

    fn snapshot(&self) -> Document {
        to_document(self.name(), &self.state)
    }

    fn restore(&mut self, doc: &Document) {
        self.state = restore_lenient(self.name(), doc, self.fresh.clone());
    }

    fn as_any(&self) -> &dyn Any { self }
    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}
