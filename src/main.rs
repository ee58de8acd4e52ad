/// Entry point and host loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Parser;
use log::{error, info};

use config::GameConfig;
use domain::treasure::{CatalogSource, DelayedSource, TreasureSource};
use sim::game::Game;
use sim::save::{self, DiscoveryLog, JsonFileStore};
use sim::world::Phase;
use ui::input::{Command, InputState};
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

#[derive(Parser, Debug)]
#[command(name = "digquest", version, about = "Sixty seconds, one shovel, buried treasure")]
struct Args {
    /// Config file to use instead of searching for config.toml.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for map generation and treasure draws.
    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() {
    let args = Args::parse();
    let (config, origin) = GameConfig::load(args.config.as_deref());
    match init_logging(&config.log_file) {
        Some(path) => info!("logging to {}", path.display()),
        None => eprintln!("warning: no writable log file; running without logs ({origin})"),
    }
    origin.log();

    let source: Box<dyn TreasureSource> = match config.timing.treasure_latency_ms {
        0 => Box::new(CatalogSource::new(args.seed)),
        ms => Box::new(DelayedSource::new(args.seed, Duration::from_millis(ms))),
    };
    let store = JsonFileStore::in_save_dir(&config.discovery_log);
    info!("discovery log at {}", store.path().display());
    let discoveries = DiscoveryLog::open(Box::new(store));

    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms.max(1));
    let tile_size = config.view.tile_size;
    let mut game = Game::new(config, args.seed, source, discoveries);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut game, &mut renderer, tick_rate, tile_size);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        error!("game loop failed: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Dig Quest!");
    println!("Treasure book: {}/{} discovered", game.discoveries.len(), domain::treasure::registry_len());
}

/// Logs go to a file; the terminal belongs to the renderer. Tries the
/// configured file, then the same name in the temp dir. Returns the file
/// in use, `None` if neither could be created.
fn init_logging(configured: &Path) -> Option<PathBuf> {
    let primary = save::resolve_in_save_dir(configured);
    let name = configured.file_name().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("digquest.log"));
    let spare = std::env::temp_dir().join(name);

    let (path, file) = [primary, spare]
        .into_iter()
        .find_map(|p| File::create(&p).ok().map(|f| (p, f)))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Some(path)
}

fn game_loop(
    game: &mut Game,
    renderer: &mut Renderer,
    tick_rate: Duration,
    tile_size: f32,
) -> std::io::Result<()> {
    let mut input = InputState::new(tile_size);
    let mut last_tick = Instant::now();

    loop {
        input.drain_events();
        for cmd in input.commands.drain(..) {
            if !handle_command(game, cmd) {
                return Ok(());
            }
        }

        let elapsed = last_tick.elapsed();
        if elapsed >= tick_rate {
            game.tick(elapsed.as_millis() as u64);
            last_tick = Instant::now();
        }

        renderer.render(&game.view())?;
        std::thread::sleep(FRAME_SLEEP);
    }
}

/// Returns false when the player asked to quit.
fn handle_command(game: &mut Game, cmd: Command) -> bool {
    let phase = game.world.phase;
    match cmd {
        Command::Quit => return false,
        Command::Back => match phase {
            Phase::TreasureBook | Phase::GameOver | Phase::TimeUp => { game.restart(); }
            Phase::TreasureFound => { game.close_treasure_dialog(); }
            _ => return false,
        },
        Command::Confirm => match phase {
            Phase::Title => { game.start(); }
            Phase::TreasureFound => { game.close_treasure_dialog(); }
            _ => { game.restart(); }
        },
        Command::OpenBook => { game.open_book(); }
        Command::DigHere => { game.self_dig(); }
        Command::Pan { dx, dy } => game.pan(dx, dy),
        Command::PointerDown { x, y } => game.pointer_down(x, y),
        Command::PointerMove { x, y } => { game.pointer_move(x, y); }
        Command::PointerUp { x, y } => { game.pointer_up(x, y); }
    }
    true
}
