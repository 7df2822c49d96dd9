//! Save documents.
//!
//! Subsystems keep typed state and exchange it as a generic nested
//! key-value document (`serde_json::Value`). Validation happens on the way
//! in, field by field, so one malformed value never discards its siblings.
//!
//! The unified document stores one section per subsystem under that
//! subsystem's name, plus `meta`, `playtime_seconds` and `progression`.
//! Documents older than `SCHEMA_VERSION` are upgraded before anything
//! reads them.

use crate::types::{Document, PlaythroughId, SlotId};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const SCHEMA_VERSION: u32 = 2;

/// Sections a version-1 document had no data for; they load as defaults.
pub const V1_UNMAPPED_SECTIONS: [&str; 6] =
    ["resources", "economy", "characters", "dialogue", "recipes", "achievements"];

// ── Field-level helpers ───────────────────────────────────────────────────────

/// Serialize typed state into a document. Serialization of plain state
/// structs does not fail in practice; if it does, an empty mapping is
/// returned so a save still lands with that section defaulted.
pub fn to_document<T: Serialize>(section: &str, value: &T) -> Document {
    match serde_json::to_value(value) {
        Ok(doc) => doc,
        Err(e) => {
            log::error!("snapshot of '{section}' failed: {e}");
            Value::Object(Map::new())
        }
    }
}

/// Merge `doc` over `base` one top-level field at a time.
///
/// - keys `base` does not have are dropped
/// - keys `doc` does not have keep the `base` value
/// - a key whose value does not fit the field's type keeps the `base` value
///
/// A `doc` that is not a mapping yields `base` unchanged.
pub fn restore_lenient<T>(section: &str, doc: &Document, base: T) -> T
where
    T: Serialize + DeserializeOwned,
{
    let Some(incoming) = doc.as_object() else {
        if !doc.is_null() {
            log::warn!("'{section}' document is not a mapping; using defaults");
        }
        return base;
    };
    let mut merged = match serde_json::to_value(&base) {
        Ok(Value::Object(fields)) => fields,
        _ => return base,
    };

    for (key, value) in incoming {
        if !merged.contains_key(key) {
            log::debug!("'{section}': ignoring unknown field '{key}'");
            continue;
        }
        let previous = merged.insert(key.clone(), value.clone());
        if serde_json::from_value::<T>(Value::Object(merged.clone())).is_err() {
            log::warn!("'{section}': field '{key}' has an unexpected shape; keeping default");
            if let Some(previous) = previous {
                merged.insert(key.clone(), previous);
            }
        }
    }

    serde_json::from_value(Value::Object(merged)).unwrap_or(base)
}

/// Read `path` (a sequence of keys) out of a nested document.
pub fn lookup<'a>(doc: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(doc, |node, key| node.get(*key))
}

// ── Unified document ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveMeta {
    pub schema_version: u32,
    pub slot:           SlotId,
    pub saved_at:       String,
    pub created_at:     String,
    pub playthrough_id: PlaythroughId,
    pub game_version:   String,
}

impl Default for SaveMeta {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            slot:           0,
            saved_at:       String::new(),
            created_at:     String::new(),
            playthrough_id: String::new(),
            game_version:   env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Cross-playthrough progress (New Game+).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progression {
    pub ng_plus_level:        u32,
    pub ng_plus_unlocked:     bool,
    pub dragon_names_history: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnifiedDocument {
    #[serde(default)]
    pub meta:             SaveMeta,
    #[serde(default)]
    pub playtime_seconds: f64,
    #[serde(default)]
    pub progression:      Progression,
    /// One entry per subsystem, keyed by the subsystem's name.
    #[serde(flatten)]
    pub sections:         Map<String, Value>,
}

impl UnifiedDocument {
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.sections.get(name)
    }

    pub fn set_section(&mut self, name: &str, doc: Document) {
        self.sections.insert(name.to_string(), doc);
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parse stored text. Fails only when the text is not JSON or is not a
    /// mapping; everything else is upgraded and read leniently.
    pub fn from_json(text: &str) -> serde_json::Result<Option<Self>> {
        let raw: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(raw))
    }

    pub fn from_value(raw: Value) -> Option<Self> {
        let Value::Object(mut fields) = upgrade(raw) else {
            return None;
        };
        let meta = fields
            .remove("meta")
            .map(|m| restore_lenient("meta", &m, SaveMeta::default()))
            .unwrap_or_default();
        let playtime_seconds = fields
            .remove("playtime_seconds")
            .and_then(|p| p.as_f64())
            .filter(|p| p.is_finite() && *p >= 0.0)
            .unwrap_or(0.0);
        let progression = fields
            .remove("progression")
            .map(|p| restore_lenient("progression", &p, Progression::default()))
            .unwrap_or_default();
        Some(Self { meta, playtime_seconds, progression, sections: fields })
    }
}

// ── Schema evolution ──────────────────────────────────────────────────────────

/// Version of a raw stored document. Documents without
/// `meta.schema_version` predate the unified layout and count as version 1.
pub fn schema_version_of(raw: &Value) -> u32 {
    lookup(raw, &["meta", "schema_version"])
        .and_then(Value::as_u64)
        .map(|v| v as u32)
        .unwrap_or(1)
}

/// Bring a raw stored document up to `SCHEMA_VERSION`.
pub fn upgrade(raw: Value) -> Value {
    if !raw.is_object() {
        return raw;
    }
    match schema_version_of(&raw) {
        1 => migrate_v1(&raw),
        v if v > SCHEMA_VERSION => {
            log::warn!("save schema {v} is newer than {SCHEMA_VERSION}; reading what is recognisable");
            raw
        }
        _ => raw,
    }
}

/// Version 1 kept a flat `meta/player/dragon/cafe/world/story/inventory`
/// layout. This mapping carries the fields that have a home in version 2;
/// sections listed in `V1_UNMAPPED_SECTIONS` are left for the loader to
/// default.
fn migrate_v1(raw: &Value) -> Value {
    let get = |path: &[&str]| lookup(raw, path).cloned();
    let mut doc = Map::new();

    let mut meta = Map::new();
    meta.insert("schema_version".into(), json!(SCHEMA_VERSION));
    for (to, from) in [("slot", "slot"), ("created_at", "created_at"), ("saved_at", "last_saved")] {
        if let Some(value) = get(&["meta", from]) {
            meta.insert(to.into(), value);
        }
    }
    doc.insert("meta".into(), Value::Object(meta));
    if let Some(playtime) = get(&["meta", "playtime_seconds"]) {
        doc.insert("playtime_seconds".into(), playtime);
    }

    doc.insert("time".into(), pick(raw, &[
        ("current_day",  "world", "day_number"),
        ("current_hour", "world", "current_time"),
    ]));
    doc.insert("inventory".into(), pick(raw, &[
        ("gold",             "cafe",      "gold"),
        ("unlocked_recipes", "cafe",      "recipes_unlocked"),
        ("carried",          "inventory", "items"),
    ]));
    doc.insert("cafe".into(), pick(raw, &[
        ("reputation", "cafe", "reputation"),
        ("cafe_level", "cafe", "level"),
    ]));
    doc.insert("story".into(), pick(raw, &[
        ("completed_events", "story", "events_completed"),
        ("flags",            "story", "dialogue_flags"),
    ]));
    doc.insert("world".into(), pick(raw, &[
        ("current_zone_id", "world", "current_zone"),
        ("weather",         "world", "weather"),
        ("unlocked_zones",  "world", "zones_unlocked"),
    ]));

    let mut dragon = match pick(raw, &[
        ("name",      "dragon", "name"),
        ("stage",     "dragon", "stage"),
        ("hunger",    "dragon", "hunger"),
        ("happiness", "dragon", "happiness"),
        ("stamina",   "dragon", "energy"),
        ("bond",      "dragon", "bond"),
    ]) {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    if let Some(days) = get(&["dragon", "age_days"]).and_then(|d| d.as_f64()) {
        dragon.insert("age_hours".into(), json!(days * 24.0));
    }
    doc.insert("dragon".into(), Value::Object(dragon));

    log::info!(
        "migrated version 1 save; {} start from defaults",
        V1_UNMAPPED_SECTIONS.join(", ")
    );
    Value::Object(doc)
}

/// Copy `(target, section, key)` triples out of a flat version-1 document.
fn pick(raw: &Value, pairs: &[(&str, &str, &str)]) -> Value {
    let fields: Map<String, Value> = pairs
        .iter()
        .filter_map(|(to, section, key)| {
            lookup(raw, &[*section, *key]).map(|v| (to.to_string(), v.clone()))
        })
        .collect();
    Value::Object(fields)
}
