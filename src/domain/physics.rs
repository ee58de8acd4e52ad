/// Continuous movement against the tile grid.
///
/// ## Collision model
///
/// A mover occupies the tile its position rounds to. A candidate step is
/// rejected if that destination tile blocks the mover's class:
///
/// ┌─────────┬──────────────┬──────────────┐
/// │ Mover   │ Blocked by    │ Outside map  │
/// ├─────────┼──────────────┼──────────────┤
/// │ Walker  │ Water, Rock   │ blocked      │
/// │ Flyer   │ Rock          │ blocked      │
/// │ Ghost   │ nothing       │ blocked      │
/// └─────────┴──────────────┴──────────────┘
///
/// Steps are axis-separated: X is tried first, then Y from the (possibly
/// updated) position, so a mover slides along walls instead of sticking.

use super::entity::{EnemyStats, Position};
use super::map::TileMap;

/// Collision class of a moving entity.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mover {
    Walker,
    Flyer,
    Ghost,
}

impl Mover {
    pub fn for_enemy(stats: EnemyStats) -> Self {
        if stats.ghost {
            Mover::Ghost
        } else if stats.flying {
            Mover::Flyer
        } else {
            Mover::Walker
        }
    }
}

/// Would `mover` be blocked standing at `pos`?
pub fn is_blocked(map: &TileMap, mover: Mover, pos: Position) -> bool {
    let (tx, ty) = pos.tile();
    match map.get(tx, ty) {
        None => true,
        Some(tile) => match mover {
            Mover::Ghost => false,
            Mover::Flyer => tile.blocks_flyer(),
            Mover::Walker => tile.blocks_ground(),
        },
    }
}

/// Result of one axis-separated step.
#[derive(Clone, Copy, Debug)]
pub struct StepResult {
    pub pos: Position,
    pub moved_x: bool,
    pub moved_y: bool,
}

impl StepResult {
    pub fn moved(&self) -> bool {
        self.moved_x || self.moved_y
    }
}

/// Advance `pos` by `(vx, vy)`, each axis checked on its own.
/// A zero component never counts as movement on that axis.
pub fn step(map: &TileMap, mover: Mover, pos: Position, vx: f32, vy: f32) -> StepResult {
    let mut out = StepResult { pos, moved_x: false, moved_y: false };

    let cand_x = Position::new(pos.x + vx, out.pos.y);
    if vx != 0.0 && !is_blocked(map, mover, cand_x) {
        out.pos.x = cand_x.x;
        out.moved_x = true;
    }

    let cand_y = Position::new(out.pos.x, pos.y + vy);
    if vy != 0.0 && !is_blocked(map, mover, cand_y) {
        out.pos.y = cand_y.y;
        out.moved_y = true;
    }

    out
}

/// Orthogonal neighbour order for the unstick safeguard: up, down, left, right.
const NEIGHBOURS: [(i64, i64); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// First walkable orthogonal neighbour of (x, y), if any.
pub fn safe_neighbour(map: &TileMap, x: usize, y: usize) -> Option<(usize, usize)> {
    NEIGHBOURS.iter().find_map(|&(dx, dy)| {
        let nx = x as i64 + dx;
        let ny = y as i64 + dy;
        match map.get(nx, ny) {
            Some(tile) if !tile.blocks_ground() => Some((nx as usize, ny as usize)),
            _ => None,
        }
    })
}

/// Clamp a world position into the map, `margin` inside its outer tile
/// edges. Tile centres sit on integers, so the range per axis is
/// `[-0.5 + margin, size - 0.5 - margin]` and always rounds into the grid.
pub fn clamp_into_map(map: &TileMap, pos: Position, margin: f32) -> Position {
    Position::new(
        clamp_axis(pos.x, map.width, margin),
        clamp_axis(pos.y, map.height, margin),
    )
}

fn clamp_axis(v: f32, size: usize, margin: f32) -> f32 {
    let margin = margin.clamp(0.0, 0.49);
    let lo = -0.5 + margin;
    let hi = (size as f32 - 0.5 - margin).max(lo);
    v.clamp(lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walker_blocked_by_water_and_rock() {
        let map = TileMap::from_rows(&[
            ".~#",
        ]);
        assert!(!is_blocked(&map, Mover::Walker, Position::at_tile(0, 0)));
        assert!(is_blocked(&map, Mover::Walker, Position::at_tile(1, 0)));
        assert!(is_blocked(&map, Mover::Walker, Position::at_tile(2, 0)));
    }

    #[test]
    fn flyer_crosses_water_not_rock() {
        let map = TileMap::from_rows(&[
            ".~#",
        ]);
        assert!(!is_blocked(&map, Mover::Flyer, Position::at_tile(1, 0)));
        assert!(is_blocked(&map, Mover::Flyer, Position::at_tile(2, 0)));
    }

    #[test]
    fn ghost_ignores_solids_but_not_map_edge() {
        let map = TileMap::from_rows(&[
            ".~#",
        ]);
        assert!(!is_blocked(&map, Mover::Ghost, Position::at_tile(2, 0)));
        assert!(is_blocked(&map, Mover::Ghost, Position::new(3.0, 0.0)));
        assert!(is_blocked(&map, Mover::Ghost, Position::new(0.0, -0.6)));
    }

    #[test]
    fn slides_along_wall() {
        // Rock to the right: X is rejected, Y still advances.
        let map = TileMap::from_rows(&[
            ".#",
            "..",
        ]);
        let r = step(&map, Mover::Walker, Position::new(0.4, 0.0), 0.2, 0.2);
        assert!(!r.moved_x);
        assert!(r.moved_y);
        assert!((r.pos.x - 0.4).abs() < 1e-6);
        assert!((r.pos.y - 0.2).abs() < 1e-6);
    }

    #[test]
    fn straight_into_wall_is_not_movement() {
        let map = TileMap::from_rows(&[".#"]);
        let r = step(&map, Mover::Walker, Position::new(0.45, 0.0), 0.1, 0.0);
        assert!(!r.moved());
    }

    #[test]
    fn boxed_in_does_not_move() {
        let map = TileMap::from_rows(&[
            ".#",
            "#.",
        ]);
        let r = step(&map, Mover::Walker, Position::new(0.4, 0.4), 0.2, 0.2);
        assert!(!r.moved());
    }

    #[test]
    fn safe_neighbour_order_is_up_down_left_right() {
        let map = TileMap::from_rows(&[
            "#.#",
            "...",
            "#.#",
        ]);
        assert_eq!(safe_neighbour(&map, 1, 1), Some((1, 0)));

        let map = TileMap::from_rows(&[
            "###",
            "~..",
            "###",
        ]);
        assert_eq!(safe_neighbour(&map, 1, 1), Some((2, 1)));

        let map = TileMap::from_rows(&[
            "#~#",
            "~.#",
            "###",
        ]);
        assert_eq!(safe_neighbour(&map, 1, 1), None);
    }

    #[test]
    fn clamp_keeps_margin() {
        let map = TileMap::filled(10, 8, crate::domain::tile::Tile::Grass);
        let p = clamp_into_map(&map, Position::new(-3.0, 42.0), 0.1);
        assert!((p.x + 0.4).abs() < 1e-6);
        assert!((p.y - 7.4).abs() < 1e-6);
        let inside = Position::new(4.2, 3.7);
        assert_eq!(clamp_into_map(&map, inside, 0.1), inside);
    }

    #[test]
    fn clamped_points_round_into_the_grid() {
        let map = TileMap::filled(10, 8, crate::domain::tile::Tile::Grass);
        for &(x, y) in &[(-5.0, -5.0), (9.7, 7.8), (99.0, -0.45), (10.0, 8.0)] {
            let (tx, ty) = clamp_into_map(&map, Position::new(x, y), 0.1).tile();
            assert!(map.in_bounds(tx, ty), "({x}, {y}) clamped to tile ({tx}, {ty})");
        }
    }
}
