//! haven-runner: headless driver for the Dragon Haven core.
//!
//! Usage:
//!   haven-runner --frames 3600 --dt 0.5 --db saves.db
//!   haven-runner --save-dir ./saves --settings ./settings.json
//!   haven-runner --ipc-mode          (JSON lines on stdin/stdout)

use anyhow::Result;
use dragonhaven_core::{
    cafe_subsystem::CafeSubsystem,
    config::GameConfig,
    dragon_subsystem::DragonSubsystem,
    engine::GameEngine,
    inventory_subsystem::InventorySubsystem,
    mode::{Flow, InputEvent, Key, TextSurface},
    store::{JsonFileSaveBackend, SaveBackend, SqliteSaveBackend},
    world_subsystem::WorldSubsystem,
};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Frame {
        #[serde(default = "default_dt")]
        dt:   f64,
        #[serde(default)]
        keys: Vec<String>,
        #[serde(default)]
        text: String,
    },
    Draw,
    Quit,
}

fn default_dt() -> f64 {
    1.0 / 60.0
}

#[derive(serde::Serialize)]
struct UiState {
    mode:             Option<String>,
    transitioning:    bool,
    day:              u32,
    season:           String,
    time:             String,
    paused:           bool,
    zone:             String,
    gold:             u32,
    reputation:       i32,
    dragon:           Option<String>,
    dragon_stage:     Option<String>,
    achievements:     usize,
    playtime_seconds: f64,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let frames = parse_arg(&args, "--frames", 3600u32);
    let dt = parse_arg(&args, "--dt", 0.5f64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let save_dir = flag_value(&args, "--save-dir");
    let settings = flag_value(&args, "--settings").map(PathBuf::from);
    let config = match flag_value(&args, "--config") {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };

    let backend: Box<dyn SaveBackend> = match save_dir {
        Some(dir) => Box::new(JsonFileSaveBackend::new(dir)),
        None => Box::new(SqliteSaveBackend::open(db)?),
    };

    if !ipc_mode {
        println!("Dragon Haven Cafe - haven-runner");
        println!("  frames:    {frames}");
        println!("  dt:        {dt}");
        match save_dir {
            Some(dir) => println!("  saves:     {dir} (json files)"),
            None => println!("  saves:     {db} (sqlite)"),
        }
        println!();
    }

    let mut engine = GameEngine::build(config, backend, settings);

    if ipc_mode {
        run_ipc_loop(&mut engine)?;
    } else {
        let started = chrono::Utc::now();
        run_script(&mut engine, frames, dt);
        print_summary(&engine, started)?;
    }
    Ok(())
}

/// Start a new game, then loop a small day: gather, wander, serve at the
/// cafe while it is open, sleep at night.
fn run_script(engine: &mut GameEngine, frames: u32, dt: f64) {
    engine.frame(dt, &[InputEvent::Key(Key::Confirm)]);
    engine.settle(dt);

    for frame in 0..frames {
        let mode = engine.current_mode().unwrap_or_default().to_string();
        let events: Vec<InputEvent> = match mode.as_str() {
            "dragon_naming" => "Ember"
                .chars()
                .map(InputEvent::Text)
                .chain([InputEvent::Key(Key::Confirm)])
                .collect(),
            "exploration" if engine.ctx.clock.is_nighttime() => vec![InputEvent::Key(Key::Sleep)],
            "exploration" if engine.ctx.clock.is_cafe_open() && frame % 240 == 0 => {
                vec![InputEvent::Key(Key::Cafe)]
            }
            "exploration" if frame % 40 == 0 => vec![InputEvent::Key(Key::Interact)],
            "exploration" if frame % 97 == 0 => vec![InputEvent::Key(Key::Right)],
            "cafe" if frame % 20 == 0 => vec![InputEvent::Key(Key::Confirm)],
            "cafe" if frame % 180 == 0 => vec![InputEvent::Key(Key::Back)],
            _ => Vec::new(),
        };
        if engine.frame(dt, &events) == Flow::Quit {
            break;
        }
    }
}

fn run_ipc_loop(engine: &mut GameEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        if handle.read_line(&mut buffer)? == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => {}
            IpcCommand::Frame { dt, keys, text } => {
                let mut events: Vec<InputEvent> = text.chars().map(InputEvent::Text).collect();
                for name in &keys {
                    match parse_key(name) {
                        Some(key) => events.push(InputEvent::Key(key)),
                        None => log::warn!("unknown key: {name}"),
                    }
                }
                if engine.frame(dt, &events) == Flow::Quit {
                    break;
                }
            }
            IpcCommand::Draw => {
                let mut surface = TextSurface::default();
                engine.draw(&mut surface);
                writeln!(stdout, "{}", serde_json::json!({ "lines": surface.lines, "overlay": surface.overlay }))?;
                stdout.flush()?;
                continue;
            }
        }
        writeln!(stdout, "{}", serde_json::to_string(&build_ui_state(engine))?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn parse_key(name: &str) -> Option<Key> {
    let key = match name.to_ascii_lowercase().as_str() {
        "up" => Key::Up,
        "down" => Key::Down,
        "left" => Key::Left,
        "right" => Key::Right,
        "confirm" | "enter" => Key::Confirm,
        "back" | "escape" => Key::Back,
        "backspace" => Key::Backspace,
        "delete" => Key::Delete,
        "pause" => Key::Pause,
        "inventory" => Key::Inventory,
        "recipe_book" => Key::RecipeBook,
        "dragon_status" => Key::DragonStatus,
        "interact" => Key::Interact,
        "cafe" => Key::Cafe,
        "sleep" => Key::Sleep,
        _ => return None,
    };
    Some(key)
}

fn build_ui_state(engine: &GameEngine) -> UiState {
    let ctx = &engine.ctx;
    let dragon = ctx.subsystem::<DragonSubsystem>().and_then(|d| d.dragon());
    UiState {
        mode:             engine.current_mode().map(str::to_string),
        transitioning:    engine.modes.is_transitioning(),
        day:              ctx.clock.current_day(),
        season:           ctx.clock.season_name().to_string(),
        time:             ctx.clock.formatted_time(),
        paused:           ctx.clock.is_paused(),
        zone:             ctx.subsystem::<WorldSubsystem>().map(|w| w.current_zone().to_string()).unwrap_or_default(),
        gold:             ctx.subsystem::<InventorySubsystem>().map(|i| i.gold()).unwrap_or(0),
        reputation:       ctx.subsystem::<CafeSubsystem>().map(|c| c.reputation()).unwrap_or(0),
        dragon:           dragon.map(|d| d.display_name().to_string()),
        dragon_stage:     dragon.map(|d| d.stage.as_str().to_string()),
        achievements:     ctx
            .subsystem::<dragonhaven_core::achievement_subsystem::AchievementTracker>()
            .map(|a| a.unlocked_count())
            .unwrap_or(0),
        playtime_seconds: ctx.aggregator.playtime_seconds(),
    }
}

fn print_summary(engine: &GameEngine, started: chrono::DateTime<chrono::Utc>) -> Result<()> {
    let state = build_ui_state(engine);
    let wall = chrono::Utc::now() - started;
    println!("=== RUN SUMMARY ===");
    println!("  wall time:     {}ms", wall.num_milliseconds());
    println!("  mode:          {}", state.mode.as_deref().unwrap_or("-"));
    println!("  day:           {} ({})", state.day, state.season);
    println!("  time:          {}", state.time);
    println!("  zone:          {}", state.zone);
    println!("  gold:          {}", state.gold);
    println!("  reputation:    {}", state.reputation);
    println!(
        "  dragon:        {} ({})",
        state.dragon.as_deref().unwrap_or("-"),
        state.dragon_stage.as_deref().unwrap_or("-"),
    );
    println!("  achievements:  {}", state.achievements);
    println!("  playtime:      {:.0}s", state.playtime_seconds);

    println!();
    println!("=== SAVE SLOTS ===");
    for (slot, summary) in engine.ctx.saves.list_summaries() {
        match summary {
            Some(s) => println!("  slot {slot}: day {} {} | {}g | saved {}", s.day, s.season, s.gold, s.saved_at),
            None => println!("  slot {slot}: (empty)"),
        }
    }
    println!();
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    flag_value(args, flag).and_then(|v| v.parse().ok()).unwrap_or(default)
}
