//! Player settings, persisted in a small JSON file next to the saves.
//!
//! Loading merges key by key over the defaults: a missing file, an
//! unparseable file or a bad value all fall back to defaults without
//! failing. Saving goes through a temp file and a rename.

use crate::document::restore_lenient;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const GAME_SPEEDS: [f64; 3] = [0.75, 1.0, 1.25];
pub const MAX_VOLUME: u8 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CookingDifficulty {
    Easy,
    #[default]
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeChannel {
    Master,
    Sfx,
    Music,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub master_volume:      u8,
    pub sfx_volume:         u8,
    pub music_volume:       u8,
    pub game_speed:         f64,
    pub cooking_difficulty: CookingDifficulty,
    pub fullscreen:         bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume:      80,
            sfx_volume:         80,
            music_volume:       60,
            game_speed:         1.0,
            cooking_difficulty: CookingDifficulty::Normal,
            fullscreen:         false,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_json(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                log::warn!("settings: cannot read {}: {e}; using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn from_json(text: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(value) => restore_lenient("settings", &value, Self::default()).sanitized(),
            Err(e) => {
                log::warn!("settings: unparseable file ({e}); using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> bool {
        let result = serde_json::to_string_pretty(self)
            .map_err(std::io::Error::from)
            .and_then(|text| {
                if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                    fs::create_dir_all(dir)?;
                }
                let tmp = path.with_extension("json.tmp");
                fs::write(&tmp, text)?;
                fs::rename(&tmp, path)
            });
        match result {
            Ok(()) => {
                log::debug!("settings saved to {}", path.display());
                true
            }
            Err(e) => {
                log::error!("settings: cannot save {}: {e}", path.display());
                false
            }
        }
    }

    fn sanitized(mut self) -> Self {
        for volume in [&mut self.master_volume, &mut self.sfx_volume, &mut self.music_volume] {
            *volume = (*volume).min(MAX_VOLUME);
        }
        if !GAME_SPEEDS.contains(&self.game_speed) {
            log::warn!("settings: game speed {} is not offered; using 1.0", self.game_speed);
            self.game_speed = 1.0;
        }
        self
    }

    pub fn volume(&self, channel: VolumeChannel) -> u8 {
        match channel {
            VolumeChannel::Master => self.master_volume,
            VolumeChannel::Sfx    => self.sfx_volume,
            VolumeChannel::Music  => self.music_volume,
        }
    }

    pub fn adjust_volume(&mut self, channel: VolumeChannel, delta: i16) -> u8 {
        let slot = match channel {
            VolumeChannel::Master => &mut self.master_volume,
            VolumeChannel::Sfx    => &mut self.sfx_volume,
            VolumeChannel::Music  => &mut self.music_volume,
        };
        *slot = (i16::from(*slot) + delta).clamp(0, i16::from(MAX_VOLUME)) as u8;
        *slot
    }

    /// Step to the next (or previous) offered game speed, wrapping around.
    pub fn cycle_game_speed(&mut self, forward: bool) -> f64 {
        let here = GAME_SPEEDS.iter().position(|s| *s == self.game_speed).unwrap_or(1);
        let len = GAME_SPEEDS.len();
        let next = if forward { (here + 1) % len } else { (here + len - 1) % len };
        self.game_speed = GAME_SPEEDS[next];
        self.game_speed
    }

    pub fn toggle_difficulty(&mut self) -> CookingDifficulty {
        self.cooking_difficulty = match self.cooking_difficulty {
            CookingDifficulty::Easy   => CookingDifficulty::Normal,
            CookingDifficulty::Normal => CookingDifficulty::Easy,
        };
        self.cooking_difficulty
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
