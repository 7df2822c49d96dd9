//! Settings file tests: defaults, per-key merge, sanitising, save/reload.

use dragonhaven_core::{
    config::GameConfig,
    engine::GameContext,
    settings::{CookingDifficulty, Settings, VolumeChannel, GAME_SPEEDS},
    store::SqliteSaveBackend,
};
use std::fs;
use std::path::PathBuf;

fn temp_path(tag: &str) -> PathBuf {
    let _ = env_logger::builder().is_test(true).try_init();
    std::env::temp_dir()
        .join(format!("haven-{tag}-{}", uuid::Uuid::new_v4()))
        .join("settings.json")
}

#[test]
fn missing_file_gives_defaults() {
    let path = temp_path("missing");
    assert_eq!(Settings::load(&path), Settings::default());
    assert!(!path.exists(), "loading must not create the file");
}

/// An unparseable file is treated as absent.
#[test]
fn corrupt_file_gives_defaults() {
    assert_eq!(Settings::from_json("{ \"master_volume\": "), Settings::default());
    assert_eq!(Settings::from_json("[]"), Settings::default());
}

/// Keys present in the file win; everything else keeps its default.
#[test]
fn keys_merge_over_defaults() {
    let settings = Settings::from_json(r#"{ "music_volume": 15, "fullscreen": true, "theme": "dark" }"#);
    assert_eq!(settings.music_volume, 15);
    assert!(settings.fullscreen);
    assert_eq!(settings.master_volume, 80);
    assert_eq!(settings.cooking_difficulty, CookingDifficulty::Normal);
}

/// Out-of-range values are pulled back into range or reset.
#[test]
fn bad_values_are_sanitised() {
    let settings = Settings::from_json(
        r#"{ "master_volume": 150, "sfx_volume": "loud", "game_speed": 3.0, "cooking_difficulty": "hard" }"#,
    );
    assert_eq!(settings.master_volume, 100);
    assert_eq!(settings.sfx_volume, 80, "wrong type keeps the default");
    assert_eq!(settings.game_speed, 1.0);
    assert_eq!(settings.cooking_difficulty, CookingDifficulty::Normal);
}

#[test]
fn save_then_load_round_trips() {
    let path = temp_path("roundtrip");
    let mut settings = Settings::default();
    settings.adjust_volume(VolumeChannel::Sfx, -30);
    settings.cycle_game_speed(true);
    settings.toggle_difficulty();

    assert!(settings.save(&path));
    assert!(!path.with_extension("json.tmp").exists(), "temp file should be renamed away");
    assert_eq!(Settings::load(&path), settings);

    if let Some(dir) = path.parent() {
        let _ = fs::remove_dir_all(dir);
    }
}

#[test]
fn game_speed_cycles_with_wraparound() {
    let mut settings = Settings::default();
    assert_eq!(settings.cycle_game_speed(true), 1.25);
    assert_eq!(settings.cycle_game_speed(true), 0.75);
    assert_eq!(settings.cycle_game_speed(false), 1.25);
    assert!(GAME_SPEEDS.contains(&settings.game_speed));
}

#[test]
fn volume_and_difficulty_adjustments() {
    let mut settings = Settings::default();
    assert_eq!(settings.adjust_volume(VolumeChannel::Master, 50), 100);
    assert_eq!(settings.adjust_volume(VolumeChannel::Music, -200), 0);
    assert_eq!(settings.volume(VolumeChannel::Music), 0);
    assert_eq!(settings.toggle_difficulty(), CookingDifficulty::Easy);
    assert_eq!(settings.toggle_difficulty(), CookingDifficulty::Normal);

    settings.reset();
    assert_eq!(settings, Settings::default());
}

/// The game speed setting drives the clock's time scale.
#[test]
fn settings_file_drives_clock_speed() {
    let path = temp_path("engine");
    let mut stored = Settings::default();
    stored.game_speed = 1.25;
    assert!(stored.save(&path));

    let backend = SqliteSaveBackend::in_memory().expect("in-memory save backend");
    let mut ctx = GameContext::new(GameConfig::default_test(), Box::new(backend));
    ctx.use_settings_file(path.clone());
    assert_eq!(ctx.clock.time_scale(), 1.25);

    ctx.settings.cycle_game_speed(false);
    ctx.apply_settings();
    assert_eq!(ctx.clock.time_scale(), 1.0);
    assert!(ctx.save_settings());
    assert_eq!(Settings::load(&path).game_speed, 1.0);

    if let Some(dir) = path.parent() {
        let _ = fs::remove_dir_all(dir);
    }
}
