//! Dragon Haven Cafe game core: clock, persistable subsystems, state
//! aggregation, save slots, and the screen/mode state machine.

pub mod aggregator;
pub mod clock;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod mode;
pub mod modes;
pub mod notify;
pub mod settings;
pub mod store;
pub mod subsystem;
pub mod types;

pub mod achievement_subsystem;
pub mod cafe_subsystem;
pub mod character_subsystem;
pub mod dialogue_subsystem;
pub mod dragon_subsystem;
pub mod economy_subsystem;
pub mod inventory_subsystem;
pub mod recipe_subsystem;
pub mod resource_subsystem;
pub mod story_subsystem;
pub mod world_subsystem;
