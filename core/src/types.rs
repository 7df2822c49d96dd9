//! Shared primitive types used across the game core.

/// A 1-based in-game day number.
pub type Day = u32;

/// A save slot number. Slots are 1-based; slot 1 doubles as the autosave.
pub type SlotId = u8;

/// The generic nested key-value document a subsystem snapshots into.
pub type Document = serde_json::Value;

/// Stable identifier for one playthrough, carried in save metadata.
pub type PlaythroughId = String;
