/// WorldState: the complete snapshot of a running game.
///
/// One authoritative mutable struct. The tick, the tap resolver and the
/// dig protocol all operate on it directly; the renderer only ever sees
/// a borrowed `ViewSnapshot` derived from it.
///
/// ## Camera / Viewport
///
/// The camera is a continuous world position: the point shown at the
/// centre of the viewport. It is independent of the player:
///   - auto-follow with a dead zone while the player has a move order
///   - manual panning from drag gestures
///   - both clamp to the same map-derived limits
///   - on an axis where the map is smaller than the viewport, the camera
///     locks to the map's centre

use std::ops::Range;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::GameConfig;
use crate::domain::entity::{Enemy, Player, Position};
use crate::domain::map::TileMap;
use crate::domain::tile::Tile;
use crate::domain::treasure::TreasureInstance;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    Playing,
    TreasureFound,
    Dying,
    GameOver,
    TimeUp,
    TreasureBook,
}

impl Phase {
    /// Run is over; only restart leaves these.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::GameOver | Phase::TimeUp)
    }
}

#[derive(Clone, Debug)]
pub struct Camera {
    /// World position at the viewport centre.
    pub x: f32,
    pub y: f32,
    /// Viewport size in tiles.
    pub view_w: f32,
    pub view_h: f32,
}

/// Dead-zone margins are a quarter of the viewport, capped per axis.
const DEADZONE_CAP_X: f32 = 3.0;
const DEADZONE_CAP_Y: f32 = 4.0;

impl Camera {
    pub fn new(view_w: f32, view_h: f32) -> Self {
        Camera { x: 0.0, y: 0.0, view_w, view_h }
    }

    /// Snap directly onto a position (no dead zone). Used on run start.
    pub fn center_on(&mut self, target: Position, world_w: usize, world_h: usize) {
        self.x = target.x;
        self.y = target.y;
        self.clamp(world_w, world_h);
    }

    /// Scroll only as far as needed to keep `target` within the dead zone
    /// around the viewport centre.
    pub fn follow(&mut self, target: Position, world_w: usize, world_h: usize) {
        self.x = follow_axis(self.x, target.x, self.view_w, DEADZONE_CAP_X);
        self.y = follow_axis(self.y, target.y, self.view_h, DEADZONE_CAP_Y);
        self.clamp(world_w, world_h);
    }

    /// Manual pan by a pixel delta: dragging right moves the world right,
    /// so the camera moves left.
    pub fn pan(&mut self, dx_px: f32, dy_px: f32, tile_size: f32, world_w: usize, world_h: usize) {
        self.x -= dx_px / tile_size;
        self.y -= dy_px / tile_size;
        self.clamp(world_w, world_h);
    }

    pub fn clamp(&mut self, world_w: usize, world_h: usize) {
        self.x = clamp_axis(self.x, self.view_w, world_w);
        self.y = clamp_axis(self.y, self.view_h, world_h);
    }

    /// Tile index ranges worth drawing: the viewport plus `buffer` tiles
    /// each side, clipped to the map.
    pub fn visible_range(&self, world_w: usize, world_h: usize, buffer: usize) -> (Range<usize>, Range<usize>) {
        (
            visible_axis(self.x, self.view_w, world_w, buffer),
            visible_axis(self.y, self.view_h, world_h, buffer),
        )
    }
}

fn follow_axis(cam: f32, target: f32, view: f32, cap: f32) -> f32 {
    let margin = cap.min(view * 0.25);
    let threshold = view / 2.0 - margin;
    let diff = target - cam;
    if diff > threshold {
        cam + (diff - threshold)
    } else if diff < -threshold {
        cam + (diff + threshold)
    } else {
        cam
    }
}

/// Tile `i` spans `[i - 0.5, i + 0.5]`, so the map spans
/// `[-0.5, size - 0.5]` and the centre may range over that minus half
/// a viewport on each side.
fn clamp_axis(cam: f32, view: f32, size: usize) -> f32 {
    let size = size as f32;
    if size > view {
        let lo = view / 2.0 - 0.5;
        let hi = size - 0.5 - view / 2.0;
        cam.clamp(lo, hi)
    } else {
        (size - 1.0) / 2.0
    }
}

fn visible_axis(cam: f32, view: f32, size: usize, buffer: usize) -> Range<usize> {
    let lo = (cam - view / 2.0).floor() as i64 - buffer as i64;
    let hi = (cam + view / 2.0).ceil() as i64 + buffer as i64 + 1;
    let lo = lo.clamp(0, size as i64) as usize;
    let hi = hi.clamp(0, size as i64) as usize;
    lo..hi.max(lo)
}

pub struct WorldState {
    // ── Terrain ──
    pub map: TileMap,
    pub spawn: (usize, usize),

    // ── Entities ──
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub next_enemy_id: u32,

    // ── Run tracking ──
    pub phase: Phase,
    pub run_id: u64,
    pub gold: u32,
    pub treasures: Vec<TreasureInstance>,
    /// Shown by the treasure dialog while in `TreasureFound`.
    pub found_treasure: Option<TreasureInstance>,
    pub time_left: u32,
    /// A treasure request is in flight: world paused, timer suspended.
    pub generating: bool,

    // ── UI ──
    pub message: String,
    pub message_timer_ms: u64,

    // ── Camera / Viewport ──
    pub camera: Camera,

    pub config: GameConfig,
    pub rng: StdRng,
}

// ── Construction ──

impl WorldState {
    pub fn new(config: GameConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        WorldState {
            map: TileMap::filled(0, 0, Tile::Water),
            spawn: (0, 0),
            player: Player::new(Position::new(0.0, 0.0)),
            enemies: vec![],
            next_enemy_id: 1,
            phase: Phase::Title,
            run_id: 0,
            gold: 0,
            treasures: vec![],
            found_treasure: None,
            time_left: config.timing.game_duration_secs,
            generating: false,
            message: String::new(),
            message_timer_ms: 0,
            camera: Camera::new(config.view.viewport_width_tiles, config.view.viewport_height_tiles),
            config,
            rng,
        }
    }

    pub fn set_message(&mut self, msg: &str, duration_ms: u64) {
        self.message = msg.to_string();
        self.message_timer_ms = duration_ms;
    }

    /// Age the transient message by one frame.
    pub fn tick_message(&mut self, dt_ms: u64) {
        if self.message_timer_ms == 0 { return; }
        self.message_timer_ms = self.message_timer_ms.saturating_sub(dt_ms);
        if self.message_timer_ms == 0 { self.message.clear(); }
    }

    /// Tile under the player's rounded position, `None` outside the map.
    pub fn tile_under_player(&self) -> Option<Tile> {
        let (x, y) = self.player.pos.tile();
        self.map.get(x, y)
    }
}

#[cfg(test)]
impl WorldState {
    /// A playing world on an ASCII map (see `TileMap::from_rows`),
    /// player standing on tile `at`, default config, fixed seed.
    pub fn from_rows(rows: &[&str], at: (usize, usize)) -> Self {
        let mut w = WorldState::new(GameConfig::default(), Some(1));
        w.map = TileMap::from_rows(rows);
        w.spawn = at;
        w.player = Player::new(Position::at_tile(at.0, at.1));
        w.camera.center_on(w.player.pos, w.map.width, w.map.height);
        w.phase = Phase::Playing;
        w
    }
}
