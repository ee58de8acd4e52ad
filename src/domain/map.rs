/// The world map: tile grid plus the parallel hidden-treasure mask.
///
/// Both layers are row-major `[y][x]` with identical, fixed dimensions.
/// All signed lookups are bounds-checked here so nothing else indexes raw.

use super::tile::Tile;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TileMap {
    pub width: usize,
    pub height: usize,
    tiles: Vec<Vec<Tile>>,
    treasure: Vec<Vec<bool>>,
}

impl TileMap {
    /// A map of one tile type with no treasure.
    pub fn filled(width: usize, height: usize, tile: Tile) -> Self {
        TileMap {
            width,
            height,
            tiles: vec![vec![tile; width]; height],
            treasure: vec![vec![false; width]; height],
        }
    }

    #[inline]
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Tile at signed coordinates; `None` outside the grid.
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> Option<Tile> {
        if self.in_bounds(x, y) {
            Some(self.tiles[y as usize][x as usize])
        } else {
            None
        }
    }

    /// Tile at (x, y). Out of bounds reads as water.
    #[inline]
    pub fn tile_at(&self, x: usize, y: usize) -> Tile {
        if x < self.width && y < self.height {
            self.tiles[y][x]
        } else {
            Tile::Water
        }
    }

    #[inline]
    pub fn set_tile(&mut self, x: usize, y: usize, tile: Tile) {
        if x < self.width && y < self.height {
            self.tiles[y][x] = tile;
        }
    }

    #[inline]
    pub fn has_treasure(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.treasure[y][x]
    }

    #[inline]
    pub fn set_treasure(&mut self, x: usize, y: usize, hidden: bool) {
        if x < self.width && y < self.height {
            self.treasure[y][x] = hidden;
        }
    }

    /// Clear the hidden flag. Returns true only if it was set.
    pub fn take_treasure(&mut self, x: usize, y: usize) -> bool {
        if self.has_treasure(x, y) {
            self.treasure[y][x] = false;
            true
        } else {
            false
        }
    }

    /// Iterate `(x, y, tile)` over the whole grid.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, Tile)> + '_ {
        self.tiles.iter().enumerate().flat_map(|(y, row)| {
            row.iter().enumerate().map(move |(x, &t)| (x, y, t))
        })
    }

    pub fn treasure_count(&self) -> usize {
        self.treasure.iter().flatten().filter(|&&t| t).count()
    }

    /// Build from ASCII rows:
    /// `.` grass, `,` dirt, `~` water, `#` rock, `s` sand, `o` hole, `x` mark,
    /// `*` grass with treasure, `$` dirt with treasure.
    #[cfg(test)]
    pub fn from_rows(rows: &[&str]) -> Self {
        let h = rows.len();
        let w = rows[0].len();
        let mut map = TileMap::filled(w, h, Tile::Grass);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let tile = match ch {
                    ',' | '$' => Tile::Dirt,
                    '~' => Tile::Water,
                    '#' => Tile::Rock,
                    's' => Tile::Sand,
                    'o' => Tile::Hole,
                    'x' => Tile::TreasureMark,
                    _ => Tile::Grass,
                };
                map.set_tile(x, y, tile);
                map.set_treasure(x, y, ch == '*' || ch == '$');
            }
        }
        map
    }
}
