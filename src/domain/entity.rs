/// Entities: Player and Enemy, plus the continuous Position they move on.
/// Positions are in tile units; a whole number is a tile center.

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Position { x, y }
    }

    pub fn at_tile(x: usize, y: usize) -> Self {
        Position { x: x as f32, y: y as f32 }
    }

    pub fn distance(self, other: Position) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Tile this position rounds to (nearest tile center).
    /// May be out of the grid; callers bounds-check before indexing.
    pub fn tile(self) -> (i64, i64) {
        (round_tile(self.x), round_tile(self.y))
    }
}

/// Nearest tile index. Halves round up, matching `floor(v + 0.5)`.
#[inline]
pub fn round_tile(v: f32) -> i64 {
    (v + 0.5).floor() as i64
}

/// Last committed facing, for sprite selection.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Direction {
    #[default]
    Down,
    Up,
    Left,
    Right,
}

impl Direction {
    /// Dominant axis of a motion vector. Horizontal wins ties.
    pub fn from_motion(vx: f32, vy: f32) -> Self {
        if vx.abs() >= vy.abs() {
            if vx > 0.0 { Direction::Right } else { Direction::Left }
        } else if vy > 0.0 {
            Direction::Down
        } else {
            Direction::Up
        }
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Position,
    pub facing: Direction,
    /// Movement order; `None` = idle.
    pub target: Option<Position>,
    /// Dig automatically when the current target is reached.
    pub pending_dig: bool,
    /// Dig animation in progress; blocks input and movement.
    pub digging: bool,
}

impl Player {
    pub fn new(pos: Position) -> Self {
        Player {
            pos,
            facing: Direction::Down,
            target: None,
            pending_dig: false,
            digging: false,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.target.is_some()
    }

    /// Drop any movement order and queued dig.
    pub fn cancel_orders(&mut self) {
        self.target = None;
        self.pending_dig = false;
    }
}

/// Enemy archetypes. Stats are static per kind.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnemyKind {
    Slime,
    Bat,
    Ghost,
}

#[derive(Clone, Copy, Debug)]
pub struct EnemyStats {
    /// Tiles per tick.
    pub speed: f32,
    /// Chase when the player is closer than this.
    pub detection_range: f32,
    /// Crosses water, never falls into holes.
    pub flying: bool,
    /// Passes through every solid tile.
    pub ghost: bool,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 3] = [EnemyKind::Slime, EnemyKind::Bat, EnemyKind::Ghost];

    /// Spawn weights, parallel to `ALL`: 65% slime, 20% bat, 15% ghost.
    pub const SPAWN_WEIGHTS: [u32; 3] = [65, 20, 15];

    pub fn stats(self) -> EnemyStats {
        match self {
            EnemyKind::Slime => EnemyStats { speed: 0.025, detection_range: 10.0, flying: false, ghost: false },
            EnemyKind::Bat   => EnemyStats { speed: 0.05,  detection_range: 7.0,  flying: true,  ghost: false },
            EnemyKind::Ghost => EnemyStats { speed: 0.015, detection_range: 50.0, flying: true,  ghost: true },
        }
    }
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub id: u32,
    pub pos: Position,
    pub kind: EnemyKind,
}

impl Enemy {
    pub fn new(id: u32, pos: Position, kind: EnemyKind) -> Self {
        Enemy { id, pos, kind }
    }

    pub fn stats(&self) -> EnemyStats {
        self.kind.stats()
    }
}
