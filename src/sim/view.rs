/// Read-only view of the world for the presentation layer.
///
/// Borrowed from the authoritative state each frame; nothing here is a
/// second copy that could drift.

use std::ops::Range;

use crate::domain::entity::{Enemy, Player, Position};
use crate::domain::map::TileMap;
use crate::domain::treasure::TreasureInstance;
use super::save::{DiscoveryLog, TreasureBook};
use super::world::{Camera, Phase, WorldState};

/// Extra tiles drawn beyond each viewport edge.
const VISIBLE_BUFFER: usize = 2;

pub struct ViewSnapshot<'a> {
    pub phase: Phase,
    pub map: &'a TileMap,
    pub player: &'a Player,
    pub target: Option<Position>,
    pub enemies: &'a [Enemy],
    pub camera: &'a Camera,
    pub visible: (Range<usize>, Range<usize>),
    pub gold: u32,
    pub time_left: u32,
    pub message: Option<&'a str>,
    pub generating: bool,
    pub found_treasure: Option<&'a TreasureInstance>,
    pub treasures: &'a [TreasureInstance],
    discoveries: &'a DiscoveryLog,
}

impl<'a> ViewSnapshot<'a> {
    pub fn capture(world: &'a WorldState, discoveries: &'a DiscoveryLog) -> Self {
        ViewSnapshot {
            phase: world.phase,
            map: &world.map,
            player: &world.player,
            target: world.player.target,
            enemies: &world.enemies,
            camera: &world.camera,
            visible: world.camera.visible_range(world.map.width, world.map.height, VISIBLE_BUFFER),
            gold: world.gold,
            time_left: world.time_left,
            message: (!world.message.is_empty()).then_some(world.message.as_str()),
            generating: world.generating,
            found_treasure: world.found_treasure.as_ref(),
            treasures: &world.treasures,
            discoveries,
        }
    }

    pub fn book(&self) -> TreasureBook {
        self.discoveries.book()
    }
}
