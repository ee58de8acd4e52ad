/// Procedural island generator.
///
/// Pipeline (each stage reads the previous one's output):
///   1. All water.
///   2. Random walk from the center, laying land on every water cell it
///      visits (weighted grass / dirt / rock). The walker stays one cell
///      inside the border so the island is always ringed by water or sand.
///   3. Coastline pass: water with 3+ land neighbours becomes sand.
///   4. Spawn tile (center) forced to grass.
///   5. Hidden treasure: each grass/dirt cell independently, fixed chance.
///   6. Enemies: uniform random cells, walkable and far from spawn,
///      kind drawn from the weighted kind table.
///
/// Not seed-stable across versions, but deterministic for a given RNG state.

use log::{debug, warn};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use super::entity::{Enemy, EnemyKind, Position};
use super::map::TileMap;
use super::tile::Tile;

#[derive(Clone, Debug)]
pub struct MapParams {
    pub width: usize,
    pub height: usize,
    pub enemy_count: usize,
    /// Per grass/dirt cell.
    pub treasure_chance: f64,
    /// Walk length as a fraction of `width * height`.
    pub walk_coverage: f64,
    /// Relative weights for grass, dirt, rock.
    pub land_weights: [u32; 3],
    /// Enemies never spawn this close (Euclidean, tiles) to the player.
    pub min_spawn_distance: f32,
    /// Random placement tries per enemy before falling back to a scan.
    pub spawn_attempts: u32,
}

impl Default for MapParams {
    fn default() -> Self {
        MapParams {
            width: 30,
            height: 30,
            enemy_count: 4,
            treasure_chance: 0.05,
            walk_coverage: 0.7,
            land_weights: [80, 15, 5],
            min_spawn_distance: 5.0,
            spawn_attempts: 20,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GeneratedMap {
    pub map: TileMap,
    pub spawn: (usize, usize),
    pub enemies: Vec<Enemy>,
}

const LAND_TILES: [Tile; 3] = [Tile::Grass, Tile::Dirt, Tile::Rock];
const WALK_DIRS: [(i64, i64); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// Generate a fresh map. Enemy ids are taken from `next_id` and advance it.
pub fn generate<R: Rng>(params: &MapParams, rng: &mut R, next_id: &mut u32) -> GeneratedMap {
    let width = params.width.max(1);
    let height = params.height.max(1);
    let mut map = TileMap::filled(width, height, Tile::Water);

    let spawn = (width / 2, height / 2);
    random_walk(&mut map, spawn, params, rng);
    smooth_coastline(&mut map);
    map.set_tile(spawn.0, spawn.1, Tile::Grass);
    scatter_treasure(&mut map, params.treasure_chance, rng);

    let avoid = Position::at_tile(spawn.0, spawn.1);
    let mut enemies = Vec::with_capacity(params.enemy_count);
    for _ in 0..params.enemy_count {
        match place_enemy(&map, avoid, params.min_spawn_distance, params.spawn_attempts, rng) {
            Some((x, y)) => {
                let kind = roll_enemy_kind(rng);
                enemies.push(Enemy::new(*next_id, Position::at_tile(x, y), kind));
                *next_id += 1;
            }
            None => {
                warn!("map {}x{} has no valid enemy spawn left", width, height);
                break;
            }
        }
    }

    debug!(
        "generated {}x{} map: {} treasures, {} enemies",
        width, height, map.treasure_count(), enemies.len()
    );

    GeneratedMap { map, spawn, enemies }
}

fn random_walk<R: Rng>(map: &mut TileMap, start: (usize, usize), params: &MapParams, rng: &mut R) {
    let steps = (map.width as f64 * map.height as f64 * params.walk_coverage).max(0.0) as usize;
    let land = WeightedIndex::new(params.land_weights).ok();

    // Walker bounds: one cell inside the border when the map allows it.
    let (min_x, max_x) = inner_range(map.width);
    let (min_y, max_y) = inner_range(map.height);

    let (mut x, mut y) = (start.0 as i64, start.1 as i64);
    for _ in 0..steps {
        if map.tile_at(x as usize, y as usize) == Tile::Water {
            let tile = match &land {
                Some(dist) => LAND_TILES[dist.sample(rng)],
                None => Tile::Grass,
            };
            map.set_tile(x as usize, y as usize, tile);
        }

        let (dx, dy) = WALK_DIRS[rng.gen_range(0..WALK_DIRS.len())];
        x = (x + dx).clamp(min_x, max_x);
        y = (y + dy).clamp(min_y, max_y);
    }
}

/// Inclusive walker range on one axis.
fn inner_range(size: usize) -> (i64, i64) {
    let size = size as i64;
    if size >= 3 { (1, size - 2) } else { (0, size - 1) }
}

fn smooth_coastline(map: &mut TileMap) {
    let mut coast = Vec::new();
    for (x, y, tile) in map.cells() {
        if tile != Tile::Water { continue; }
        let land = WALK_DIRS.iter()
            .filter(|&&(dx, dy)| {
                map.get(x as i64 + dx, y as i64 + dy).is_some_and(|t| t.is_land())
            })
            .count();
        if land >= 3 {
            coast.push((x, y));
        }
    }
    // Applied after the scan so new sand doesn't feed its neighbours' counts.
    for (x, y) in coast {
        map.set_tile(x, y, Tile::Sand);
    }
}

fn scatter_treasure<R: Rng>(map: &mut TileMap, chance: f64, rng: &mut R) {
    let chance = if chance.is_finite() { chance.clamp(0.0, 1.0) } else { 0.0 };
    let candidates: Vec<(usize, usize)> = map.cells()
        .filter(|&(_, _, t)| t.can_hide_treasure())
        .map(|(x, y, _)| (x, y))
        .collect();
    for (x, y) in candidates {
        if rng.gen_bool(chance) {
            map.set_treasure(x, y, true);
        }
    }
}

struct SpawnRule<'a> {
    map: &'a TileMap,
    avoid: Position,
    min_distance: f32,
}

impl SpawnRule<'_> {
    fn accepts(&self, x: usize, y: usize) -> bool {
        self.map.tile_at(x, y).is_spawnable()
            && Position::at_tile(x, y).distance(self.avoid) > self.min_distance
    }
}

/// Pick an enemy spawn cell: walkable and farther than `min_distance`
/// from `avoid`. Tries `attempts` uniform draws, then scans every cell
/// and picks uniformly among the valid ones. `None` only if no cell qualifies.
pub fn place_enemy<R: Rng>(
    map: &TileMap,
    avoid: Position,
    min_distance: f32,
    attempts: u32,
    rng: &mut R,
) -> Option<(usize, usize)> {
    if map.width == 0 || map.height == 0 { return None; }
    let rule = SpawnRule { map, avoid, min_distance };

    for _ in 0..attempts {
        let x = rng.gen_range(0..map.width);
        let y = rng.gen_range(0..map.height);
        if rule.accepts(x, y) {
            return Some((x, y));
        }
    }

    let valid: Vec<(usize, usize)> = map.cells()
        .map(|(x, y, _)| (x, y))
        .filter(|&(x, y)| rule.accepts(x, y))
        .collect();
    if valid.is_empty() {
        None
    } else {
        Some(valid[rng.gen_range(0..valid.len())])
    }
}

/// Weighted draw over `EnemyKind::ALL`.
pub fn roll_enemy_kind<R: Rng>(rng: &mut R) -> EnemyKind {
    match WeightedIndex::new(EnemyKind::SPAWN_WEIGHTS) {
        Ok(dist) => EnemyKind::ALL[dist.sample(rng)],
        Err(_) => EnemyKind::Slime,
    }
}
