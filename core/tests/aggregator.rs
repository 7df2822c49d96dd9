//! State aggregator tests: collection order, apply semantics, restore({})
//! defaults, playtime, new game and New Game+.

use dragonhaven_core::{
    achievement_subsystem::AchievementTracker,
    aggregator::StateAggregator,
    cafe_subsystem::CafeSubsystem,
    character_subsystem::CharacterSubsystem,
    config::GameConfig,
    dragon_subsystem::{DragonStage, DragonSubsystem},
    engine::GameContext,
    inventory_subsystem::InventorySubsystem,
    recipe_subsystem::RecipeSubsystem,
    store::SqliteSaveBackend,
    story_subsystem::StorySubsystem,
    subsystem::Persistable,
    world_subsystem::WorldSubsystem,
};
use serde_json::json;

fn build() -> GameContext {
    let _ = env_logger::builder().is_test(true).try_init();
    let backend = SqliteSaveBackend::in_memory().expect("in-memory save backend");
    GameContext::new(GameConfig::default_test(), Box::new(backend))
}

const SECTION_ORDER: [&str; 11] = [
    "inventory", "world", "resources", "economy", "cafe", "story",
    "characters", "dialogue", "recipes", "dragon", "achievements",
];

/// Put some distinctive state into several subsystems.
fn play_a_little(ctx: &mut GameContext) {
    ctx.new_game();
    ctx.subsystem_mut::<InventorySubsystem>().unwrap().add_gold(75);
    ctx.subsystem_mut::<InventorySubsystem>().unwrap().add_item("wild_berries", 4);
    ctx.subsystem_mut::<WorldSubsystem>().unwrap().unlock_zone("forest_depths");
    ctx.subsystem_mut::<WorldSubsystem>().unwrap().travel_to("forest_depths");
    ctx.subsystem_mut::<CafeSubsystem>().unwrap().add_reputation(40);
    ctx.subsystem_mut::<StorySubsystem>().unwrap().complete_event("met_the_baker");
    ctx.subsystem_mut::<CharacterSubsystem>().unwrap().add_affinity("baker", 30);
    ctx.advance_time(30.0 * 24.0 * 2.5);
    ctx.record_playtime(321.0);
}

/// Registration (and therefore collection) order is fixed.
#[test]
fn subsystems_register_in_documented_order() {
    let ctx = build();
    assert_eq!(ctx.subsystems.names(), SECTION_ORDER.to_vec());
}

/// collect() emits the clock plus one section per subsystem.
#[test]
fn collect_emits_every_section() {
    let ctx = build();
    let doc = ctx.aggregator.collect(&ctx.clock, &ctx.subsystems);
    assert!(doc.section("time").is_some(), "time section missing");
    for name in SECTION_ORDER {
        assert!(doc.section(name).is_some(), "section '{name}' missing");
    }
    assert_eq!(doc.sections.len(), SECTION_ORDER.len() + 1);
}

/// Applying a collected document to a fresh context reproduces every section.
#[test]
fn collect_then_apply_round_trips() {
    let mut source = build();
    play_a_little(&mut source);
    let doc = source.aggregator.collect(&source.clock, &source.subsystems);

    let mut target = build();
    target.aggregator.apply(&doc, &mut target.clock, &mut target.subsystems);
    let again = target.aggregator.collect(&target.clock, &target.subsystems);

    for (name, section) in &doc.sections {
        assert_eq!(again.section(name), Some(section), "section '{name}' changed in the round trip");
    }
    assert_eq!(target.aggregator.playtime_seconds(), 321.0);
    assert_eq!(target.aggregator.playthrough_id(), source.aggregator.playthrough_id());
    assert_eq!(target.clock.current_day(), 3);
}

/// Subsystems without a section are left alone; unknown sections are ignored.
#[test]
fn apply_touches_only_present_sections() {
    let mut ctx = build();
    ctx.new_game();
    ctx.subsystem_mut::<InventorySubsystem>().unwrap().add_gold(1000);

    let mut doc = ctx.aggregator.collect(&ctx.clock, &ctx.subsystems);
    doc.sections.remove("inventory");
    doc.set_section("cafe", json!({ "reputation": 123 }));
    doc.set_section("minigames", json!({ "high_score": 9 }));

    ctx.aggregator.apply(&doc, &mut ctx.clock, &mut ctx.subsystems);
    assert_eq!(ctx.subsystem::<InventorySubsystem>().unwrap().gold(), 1150, "inventory must be untouched");
    assert_eq!(ctx.subsystem::<CafeSubsystem>().unwrap().reputation(), 123);
}

/// Filling missing sections makes a partial save reset what it lacks.
#[test]
fn fill_missing_sections_defaults_absent_subsystems() {
    let mut ctx = build();
    ctx.new_game();
    ctx.subsystem_mut::<InventorySubsystem>().unwrap().add_gold(1000);

    let mut doc = ctx.aggregator.collect(&ctx.clock, &ctx.subsystems);
    doc.sections.remove("inventory");
    StateAggregator::fill_missing_sections(&mut doc, &ctx.clock, &ctx.subsystems);
    assert_eq!(doc.section("inventory"), Some(&json!({})));

    ctx.aggregator.apply(&doc, &mut ctx.clock, &mut ctx.subsystems);
    assert_eq!(ctx.subsystem::<InventorySubsystem>().unwrap().gold(), 150);
}

/// restore({}) yields the same snapshot as a freshly constructed subsystem.
#[test]
fn restore_empty_matches_fresh_construction() {
    let fresh = build();
    let mut played = build();
    play_a_little(&mut played);
    played.subsystem_mut::<AchievementTracker>().unwrap().force_unlock("cafe_grand_opening");

    for subsystem in played.subsystems.iter_mut() {
        subsystem.restore(&json!({}));
    }
    for (a, b) in fresh.subsystems.iter().zip(played.subsystems.iter()) {
        assert_eq!(a.snapshot(), b.snapshot(), "restore({{}}) of '{}' differs from a fresh one", a.name());
    }
}

/// Restoring twice gives the same state as restoring once.
#[test]
fn restore_is_idempotent() {
    let mut source = build();
    play_a_little(&mut source);
    let doc = source.aggregator.collect(&source.clock, &source.subsystems);

    let mut target = build();
    target.aggregator.apply(&doc, &mut target.clock, &mut target.subsystems);
    let once = target.aggregator.collect(&target.clock, &target.subsystems);
    target.aggregator.apply(&doc, &mut target.clock, &mut target.subsystems);
    let twice = target.aggregator.collect(&target.clock, &target.subsystems);
    assert_eq!(once.sections, twice.sections);
}

/// Playtime only grows, and bad deltas are ignored.
#[test]
fn playtime_accumulates_and_ignores_bad_ticks() {
    let mut ctx = build();
    ctx.record_playtime(1.5);
    ctx.record_playtime(-4.0);
    ctx.record_playtime(f64::NAN);
    ctx.record_playtime(2.5);
    assert_eq!(ctx.aggregator.playtime_seconds(), 4.0);
}

/// A new game does not depend on anything that came before it.
#[test]
fn new_game_resets_to_documented_starting_state() {
    let mut ctx = build();
    play_a_little(&mut ctx);
    ctx.subsystem_mut::<AchievementTracker>().unwrap().force_unlock("cafe_grand_opening");
    let old_id = ctx.aggregator.playthrough_id().to_string();

    ctx.new_game();

    assert_eq!(ctx.clock.current_day(), 1);
    assert_eq!(ctx.clock.current_hour(), 8.0);
    assert_eq!(ctx.aggregator.playtime_seconds(), 0.0);
    assert_ne!(ctx.aggregator.playthrough_id(), old_id);

    let inventory = ctx.subsystem::<InventorySubsystem>().unwrap();
    assert_eq!(inventory.gold(), 150);
    assert_eq!(inventory.state.unlocked_recipes, ctx.config.new_game.default_recipes);
    assert!(inventory.state.carried.is_empty());

    assert_eq!(ctx.subsystem::<WorldSubsystem>().unwrap().current_zone(), "cafe_grounds");
    assert_eq!(ctx.subsystem::<CafeSubsystem>().unwrap().reputation(), 0);
    let story = ctx.subsystem::<StorySubsystem>().unwrap();
    assert_eq!(story.current_chapter(), "prologue");
    assert!(!story.is_completed("met_the_baker"));
    assert_eq!(ctx.subsystem::<CharacterSubsystem>().unwrap().affinity("baker"), 0);
    assert_eq!(ctx.subsystem::<AchievementTracker>().unwrap().unlocked_count(), 0);
    assert_eq!(ctx.subsystem::<DragonSubsystem>().unwrap().stage(), Some(DragonStage::Egg));
}

/// New Game+ is refused until the finale is done.
#[test]
fn new_game_plus_requires_unlock() {
    let mut ctx = build();
    ctx.new_game();
    assert!(!ctx.new_game_plus());
    assert_eq!(ctx.aggregator.ng_plus_level(), 0);
    assert_eq!(ctx.aggregator.ng_plus_modifier("gold_bonus"), 1.0);
}

/// New Game+ carries recipes, achievements, part of each affinity and the
/// dragon's name; it resets the world and grants the bonus.
#[test]
fn new_game_plus_carries_progress() {
    let mut ctx = build();
    ctx.new_game();
    ctx.subsystem_mut::<RecipeSubsystem>().unwrap().unlock("dragon_fruit_tart");
    ctx.subsystem_mut::<CharacterSubsystem>().unwrap().add_affinity("baker", 80);
    ctx.subsystem_mut::<AchievementTracker>().unwrap().force_unlock("cafe_grand_opening");
    let dragon = ctx.subsystem_mut::<DragonSubsystem>().unwrap();
    dragon.dragon_mut().unwrap().hatched = true;
    dragon.set_name("Ember").unwrap();
    ctx.subsystem_mut::<StorySubsystem>().unwrap().complete_event("finale_end");
    ctx.check_progress();
    assert!(ctx.aggregator.ng_plus_unlocked());

    assert!(ctx.new_game_plus());

    assert_eq!(ctx.aggregator.ng_plus_level(), 1);
    assert_eq!(ctx.aggregator.dragon_names_history(), ["Ember".to_string()]);
    assert_eq!(ctx.clock.current_day(), 1);
    assert_eq!(ctx.subsystem::<InventorySubsystem>().unwrap().gold(), 650);
    assert!(ctx.subsystem::<InventorySubsystem>().unwrap().has_recipe("dragon_fruit_tart"));
    assert!(ctx.subsystem::<RecipeSubsystem>().unwrap().is_unlocked("dragon_fruit_tart"));
    assert_eq!(ctx.subsystem::<CafeSubsystem>().unwrap().reputation(), 50);
    assert_eq!(ctx.subsystem::<CharacterSubsystem>().unwrap().affinity("baker"), 40);
    assert!(ctx.subsystem::<AchievementTracker>().unwrap().is_unlocked("cafe_grand_opening"));
    assert!(!ctx.subsystem::<StorySubsystem>().unwrap().is_completed("finale_end"));
    assert_eq!(ctx.subsystem::<DragonSubsystem>().unwrap().stage(), Some(DragonStage::Egg));
    assert!((ctx.aggregator.ng_plus_modifier("gold_bonus") - 1.25).abs() < 1e-12);
    assert_eq!(ctx.aggregator.ng_plus_modifier("unknown"), 1.0);
}

/// The dragon section survives a round trip, and an absent dragon stays absent.
#[test]
fn dragon_snapshot_handles_no_dragon() {
    let mut ctx = build();
    let dragon = ctx.subsystem_mut::<DragonSubsystem>().unwrap();
    assert_eq!(dragon.snapshot(), json!({}));
    dragon.create_dragon();
    let snapshot = dragon.snapshot();
    dragon.restore(&json!({}));
    assert!(dragon.dragon().is_none());
    dragon.restore(&snapshot);
    assert_eq!(dragon.stage(), Some(DragonStage::Egg));
}
