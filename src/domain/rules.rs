/// Dig rules, truth-table driven.
///
/// Pure functions: they decide what a dig does to a tile without
/// performing it. The caller re-reads the tile at completion time and
/// applies the verdict.
///
/// ## Dig Truth Table
///
/// ┌──────────────────────┬─────────────┬──────────────────────┐
/// │ Tile under player    │ Verdict     │ Effect               │
/// ├──────────────────────┼─────────────┼──────────────────────┤
/// │ outside the map      │ TooHard     │ none                 │
/// │ Water, Rock          │ TooHard     │ none                 │
/// │ Hole, TreasureMark   │ AlreadyDug  │ none                 │
/// │ Grass, Dirt          │ Dig         │ tile → Hole          │
/// │ Sand                 │ Dig         │ tile → Hole          │
/// └──────────────────────┴─────────────┴──────────────────────┘
///
/// Treasure is only ever hidden under Grass/Dirt, so the reveal check
/// is independent of the verdict: `Dig` + hidden flag = treasure.

use super::tile::Tile;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DigVerdict {
    TooHard,
    AlreadyDug,
    Dig,
}

/// Classify a dig on `tile` (`None` = outside the map).
pub fn dig_verdict(tile: Option<Tile>) -> DigVerdict {
    match tile {
        None => DigVerdict::TooHard,
        Some(t) if t.is_hard() => DigVerdict::TooHard,
        Some(t) if t.is_dug() => DigVerdict::AlreadyDug,
        Some(_) => DigVerdict::Dig,
    }
}

/// Tile left behind by a successful dig.
pub const DUG_TILE: Tile = Tile::Hole;

/// Tile a trapped enemy leaves behind: the hole is filled solid.
pub const TRAP_FILL_TILE: Tile = Tile::Rock;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hard_tiles_refuse() {
        assert_eq!(dig_verdict(Some(Tile::Water)), DigVerdict::TooHard);
        assert_eq!(dig_verdict(Some(Tile::Rock)), DigVerdict::TooHard);
        assert_eq!(dig_verdict(None), DigVerdict::TooHard);
    }

    #[test]
    fn dug_tiles_refuse() {
        assert_eq!(dig_verdict(Some(Tile::Hole)), DigVerdict::AlreadyDug);
        assert_eq!(dig_verdict(Some(Tile::TreasureMark)), DigVerdict::AlreadyDug);
    }

    #[test]
    fn soft_tiles_dig() {
        for t in [Tile::Grass, Tile::Dirt, Tile::Sand] {
            assert_eq!(dig_verdict(Some(t)), DigVerdict::Dig);
        }
    }

    #[test]
    fn trap_fill_blocks_walkers() {
        assert!(TRAP_FILL_TILE.blocks_ground());
        assert!(DUG_TILE.is_dug());
    }
}
