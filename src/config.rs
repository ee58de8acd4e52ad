/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD), or from an
/// explicit path. Falls back to sensible defaults if the file is missing or
/// incomplete.

use std::fmt;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Deserialize;

use crate::domain::ai::AiParams;
use crate::domain::mapgen::MapParams;
use crate::error::{GameError, GameResult};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub map: MapParams,
    pub speed: SpeedConfig,
    pub timing: TimingConfig,
    pub view: ViewConfig,
    pub input: InputConfig,
    pub discovery_log: PathBuf,
    pub log_file: PathBuf,
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
    pub player_speed: f32,           // tiles per tick
    pub enemy_drift_chance: f64,     // per tick, outside detection range
    pub enemy_drift_multiplier: f32,
    pub enemy_relevance_range: f32,  // beyond this, enemies stand still
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub game_duration_secs: u32,
    pub dig_delay_ms: u64,
    pub death_delay_ms: u64,
    pub treasure_latency_ms: u64,    // 0 = answer synchronously
}

#[derive(Clone, Debug)]
pub struct ViewConfig {
    pub tile_size: f32,              // pixels per tile
    pub viewport_width_tiles: f32,
    pub viewport_height_tiles: f32,
}

/// How a tap away from the player is interpreted.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TapMode {
    /// Walk there, then dig on arrival.
    MoveThenDig,
    /// Walk there; digging needs a tap on the player.
    MoveOnly,
}

#[derive(Clone, Debug)]
pub struct InputConfig {
    pub tap_mode: TapMode,
    pub self_tap_radius: f32,
    pub drag_threshold_px: f32,
    pub edge_margin: f32,
    pub arrive_epsilon: f32,
    pub contact_radius: f32,
}

impl SpeedConfig {
    pub fn ai_params(&self) -> AiParams {
        AiParams {
            relevance_range: self.enemy_relevance_range,
            drift_chance: self.enemy_drift_chance,
            drift_multiplier: self.enemy_drift_multiplier,
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    map: TomlMap,
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    view: TomlView,
    #[serde(default)]
    input: TomlInput,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlMap {
    #[serde(default = "default_map_width")]
    width: usize,
    #[serde(default = "default_map_height")]
    height: usize,
    #[serde(default = "default_enemy_count")]
    enemy_count: usize,
    #[serde(default = "default_treasure_chance")]
    treasure_chance: f64,
    #[serde(default = "default_walk_coverage")]
    walk_coverage: f64,
    #[serde(default = "default_grass_weight")]
    grass_weight: u32,
    #[serde(default = "default_dirt_weight")]
    dirt_weight: u32,
    #[serde(default = "default_rock_weight")]
    rock_weight: u32,
    #[serde(default = "default_min_spawn_distance")]
    enemy_min_spawn_distance: f32,
    #[serde(default = "default_spawn_attempts")]
    spawn_attempts: u32,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_player_speed")]
    player_speed: f32,
    #[serde(default = "default_drift_chance")]
    enemy_drift_chance: f64,
    #[serde(default = "default_drift_multiplier")]
    enemy_drift_multiplier: f32,
    #[serde(default = "default_relevance_range")]
    enemy_relevance_range: f32,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_game_duration")]
    game_duration_secs: u32,
    #[serde(default = "default_dig_delay")]
    dig_delay_ms: u64,
    #[serde(default = "default_death_delay")]
    death_delay_ms: u64,
    #[serde(default = "default_treasure_latency")]
    treasure_latency_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlView {
    #[serde(default = "default_tile_size")]
    tile_size: f32,
    #[serde(default = "default_viewport_w")]
    viewport_width_tiles: f32,
    #[serde(default = "default_viewport_h")]
    viewport_height_tiles: f32,
}

#[derive(Deserialize, Debug)]
struct TomlInput {
    #[serde(default = "default_tap_mode")]
    tap_mode: TapMode,
    #[serde(default = "default_self_tap_radius")]
    self_tap_radius: f32,
    #[serde(default = "default_drag_threshold")]
    drag_threshold_px: f32,
    #[serde(default = "default_edge_margin")]
    edge_margin: f32,
    #[serde(default = "default_arrive_epsilon")]
    arrive_epsilon: f32,
    #[serde(default = "default_contact_radius")]
    contact_radius: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_discovery_log")]
    discovery_log: String,
    #[serde(default = "default_log_file")]
    log_file: String,
}

// ── Defaults ──

fn default_map_width() -> usize { 30 }
fn default_map_height() -> usize { 30 }
fn default_enemy_count() -> usize { 4 }
fn default_treasure_chance() -> f64 { 0.05 }
fn default_walk_coverage() -> f64 { 0.7 }
fn default_grass_weight() -> u32 { 80 }
fn default_dirt_weight() -> u32 { 15 }
fn default_rock_weight() -> u32 { 5 }
fn default_min_spawn_distance() -> f32 { 5.0 }
fn default_spawn_attempts() -> u32 { 20 }

fn default_tick_rate() -> u64 { 16 }          // ~60 ticks per second
fn default_player_speed() -> f32 { 0.15 }
fn default_drift_chance() -> f64 { 0.05 }

/// TOML accepts `nan` and `inf`; those fall back to the default.
fn probability(p: f64, fallback: f64) -> f64 {
    if p.is_finite() { p.clamp(0.0, 1.0) } else { fallback }
}
fn default_drift_multiplier() -> f32 { 3.0 }
fn default_relevance_range() -> f32 { 30.0 }

fn default_game_duration() -> u32 { 60 }
fn default_dig_delay() -> u64 { 300 }
fn default_death_delay() -> u64 { 2500 }
fn default_treasure_latency() -> u64 { 600 }

fn default_tile_size() -> f32 { 48.0 }
fn default_viewport_w() -> f32 { 11.0 }
fn default_viewport_h() -> f32 { 15.0 }

fn default_tap_mode() -> TapMode { TapMode::MoveThenDig }
fn default_self_tap_radius() -> f32 { 0.8 }
fn default_drag_threshold() -> f32 { 10.0 }
fn default_edge_margin() -> f32 { 0.1 }
fn default_arrive_epsilon() -> f32 { 0.1 }
fn default_contact_radius() -> f32 { 0.6 }

fn default_discovery_log() -> String { "discoveries.json".into() }
fn default_log_file() -> String { "digquest.log".into() }

impl Default for TomlMap {
    fn default() -> Self {
        TomlMap {
            width: default_map_width(),
            height: default_map_height(),
            enemy_count: default_enemy_count(),
            treasure_chance: default_treasure_chance(),
            walk_coverage: default_walk_coverage(),
            grass_weight: default_grass_weight(),
            dirt_weight: default_dirt_weight(),
            rock_weight: default_rock_weight(),
            enemy_min_spawn_distance: default_min_spawn_distance(),
            spawn_attempts: default_spawn_attempts(),
        }
    }
}

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_ms: default_tick_rate(),
            player_speed: default_player_speed(),
            enemy_drift_chance: default_drift_chance(),
            enemy_drift_multiplier: default_drift_multiplier(),
            enemy_relevance_range: default_relevance_range(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            game_duration_secs: default_game_duration(),
            dig_delay_ms: default_dig_delay(),
            death_delay_ms: default_death_delay(),
            treasure_latency_ms: default_treasure_latency(),
        }
    }
}

impl Default for TomlView {
    fn default() -> Self {
        TomlView {
            tile_size: default_tile_size(),
            viewport_width_tiles: default_viewport_w(),
            viewport_height_tiles: default_viewport_h(),
        }
    }
}

impl Default for TomlInput {
    fn default() -> Self {
        TomlInput {
            tap_mode: default_tap_mode(),
            self_tap_radius: default_self_tap_radius(),
            drag_threshold_px: default_drag_threshold(),
            edge_margin: default_edge_margin(),
            arrive_epsilon: default_arrive_epsilon(),
            contact_radius: default_contact_radius(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            discovery_log: default_discovery_log(),
            log_file: default_log_file(),
        }
    }
}

impl From<TomlConfig> for GameConfig {
    fn from(t: TomlConfig) -> Self {
        GameConfig {
            map: MapParams {
                width: t.map.width.max(1),
                height: t.map.height.max(1),
                enemy_count: t.map.enemy_count,
                treasure_chance: probability(t.map.treasure_chance, default_treasure_chance()),
                walk_coverage: t.map.walk_coverage,
                land_weights: [t.map.grass_weight, t.map.dirt_weight, t.map.rock_weight],
                min_spawn_distance: t.map.enemy_min_spawn_distance,
                spawn_attempts: t.map.spawn_attempts,
            },
            speed: SpeedConfig {
                tick_rate_ms: t.speed.tick_rate_ms.max(1),
                player_speed: t.speed.player_speed,
                enemy_drift_chance: probability(t.speed.enemy_drift_chance, default_drift_chance()),
                enemy_drift_multiplier: t.speed.enemy_drift_multiplier,
                enemy_relevance_range: t.speed.enemy_relevance_range,
            },
            timing: TimingConfig {
                game_duration_secs: t.timing.game_duration_secs,
                dig_delay_ms: t.timing.dig_delay_ms,
                death_delay_ms: t.timing.death_delay_ms,
                treasure_latency_ms: t.timing.treasure_latency_ms,
            },
            view: ViewConfig {
                tile_size: t.view.tile_size.max(1.0),
                viewport_width_tiles: t.view.viewport_width_tiles,
                viewport_height_tiles: t.view.viewport_height_tiles,
            },
            input: InputConfig {
                tap_mode: t.input.tap_mode,
                self_tap_radius: t.input.self_tap_radius,
                drag_threshold_px: t.input.drag_threshold_px,
                edge_margin: t.input.edge_margin,
                arrive_epsilon: t.input.arrive_epsilon,
                contact_radius: t.input.contact_radius,
            },
            discovery_log: PathBuf::from(t.general.discovery_log),
            log_file: PathBuf::from(t.general.log_file),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        TomlConfig::default().into()
    }
}

// ── Loading ──

impl GameConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> GameResult<Self> {
        let cfg: TomlConfig = toml::from_str(text)?;
        Ok(cfg.into())
    }

    /// Load config from `explicit`, or search for `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// A missing file or an unreadable/malformed one falls back to defaults.
    /// Nothing is logged here: the logger is configured from the result,
    /// so the caller logs the returned `ConfigOrigin` once it is installed.
    pub fn load(explicit: Option<&Path>) -> (Self, ConfigOrigin) {
        let candidates: Vec<PathBuf> = match explicit {
            Some(p) => vec![p.to_path_buf()],
            None => candidate_dirs().into_iter().map(|d| d.join("config.toml")).collect(),
        };

        for path in candidates {
            if !path.exists() { continue; }
            let parsed = std::fs::read_to_string(&path)
                .map_err(GameError::from)
                .and_then(|text| Self::from_toml_str(&text));
            return match parsed {
                Ok(cfg) => (cfg, ConfigOrigin::File(path)),
                Err(e) => (GameConfig::default(), ConfigOrigin::Fallback { path, reason: e.to_string() }),
            };
        }
        (GameConfig::default(), ConfigOrigin::Defaults)
    }
}

/// Where the active configuration came from.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigOrigin {
    /// No config file found.
    Defaults,
    File(PathBuf),
    /// A file was found but could not be used.
    Fallback { path: PathBuf, reason: String },
}

impl ConfigOrigin {
    pub fn log(&self) {
        match self {
            ConfigOrigin::Fallback { .. } => warn!("{self}"),
            _ => info!("{self}"),
        }
    }
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigOrigin::Defaults => write!(f, "no config.toml found; using default settings"),
            ConfigOrigin::File(path) => write!(f, "loaded config from {}", path.display()),
            ConfigOrigin::Fallback { path, reason } => {
                write!(f, "{}: {reason}; using default settings", path.display())
            }
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}
