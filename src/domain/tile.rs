/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tile {
    #[default]
    Grass,
    Dirt,
    Water,
    Rock,
    Sand,     // Coastline, walkable but never holds treasure
    Hole,     // Dug out; traps ground enemies
    TreasureMark,
}

impl Tile {
    /// Land = anything that is not open water.
    pub fn is_land(self) -> bool {
        self != Tile::Water
    }

    /// Blocks walking (player, ground enemies).
    pub fn blocks_ground(self) -> bool {
        matches!(self, Tile::Water | Tile::Rock)
    }

    /// Blocks flying enemies. Water is open air to them.
    pub fn blocks_flyer(self) -> bool {
        matches!(self, Tile::Rock)
    }

    /// Too hard to dig.
    pub fn is_hard(self) -> bool {
        matches!(self, Tile::Water | Tile::Rock)
    }

    /// Already dug out.
    pub fn is_dug(self) -> bool {
        matches!(self, Tile::Hole | Tile::TreasureMark)
    }

    /// Can this tile carry a hidden treasure?
    pub fn can_hide_treasure(self) -> bool {
        matches!(self, Tile::Grass | Tile::Dirt)
    }

    /// Valid enemy spawn tile.
    pub fn is_spawnable(self) -> bool {
        !self.blocks_ground()
    }
}
