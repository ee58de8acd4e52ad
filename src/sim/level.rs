/// Run setup.
///
/// Every run starts on a freshly generated island. All per-run state is
/// reset here and nowhere else; the discovery log is the only thing that
/// carries over.

use log::info;

use crate::domain::entity::{Player, Position};
use crate::domain::mapgen::{self, GeneratedMap};
use super::event::GameEvent;
use super::scheduler::Scheduler;
use super::world::{Phase, WorldState};

const MSG_START_HINT: &str = "Tap to walk and dig. Tap yourself to dig here!";
const START_HINT_MS: u64 = 3000;

/// Generate a map and start a run on it.
pub fn start_run(world: &mut WorldState, sched: &mut Scheduler) -> Vec<GameEvent> {
    let generated = mapgen::generate(&world.config.map, &mut world.rng, &mut world.next_enemy_id);
    begin_run(world, sched, generated)
}

/// Start a run on an already generated map. Cancels everything the
/// previous run left scheduled.
pub fn begin_run(world: &mut WorldState, sched: &mut Scheduler, generated: GeneratedMap) -> Vec<GameEvent> {
    let run_id = sched.begin_run();
    let GeneratedMap { map, spawn, enemies } = generated;

    world.run_id = run_id;
    world.map = map;
    world.spawn = spawn;
    world.player = Player::new(Position::at_tile(spawn.0, spawn.1));
    world.enemies = enemies;
    world.camera.center_on(world.player.pos, world.map.width, world.map.height);

    world.gold = 0;
    world.treasures.clear();
    world.found_treasure = None;
    world.time_left = world.config.timing.game_duration_secs;
    world.generating = false;
    world.phase = Phase::Playing;
    world.set_message(MSG_START_HINT, START_HINT_MS);

    info!(
        "run {run_id} started: {}x{} map, spawn ({}, {}), {} enemies, {} treasures hidden",
        world.map.width, world.map.height, spawn.0, spawn.1,
        world.enemies.len(), world.map.treasure_count()
    );

    vec![GameEvent::RunStarted { run_id }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::tile::Tile;
    use crate::domain::treasure::{fallback_entry, TreasureInstance};
    use crate::sim::scheduler::Deferred;

    #[test]
    fn start_run_resets_everything() {
        let mut w = WorldState::new(GameConfig::default(), Some(9));
        let mut s = Scheduler::new();
        w.gold = 500;
        w.treasures.push(TreasureInstance::new(fallback_entry()));
        w.time_left = 3;
        w.generating = true;
        s.schedule(100, Deferred::DeathToGameOver);

        let ev = start_run(&mut w, &mut s);
        assert_eq!(ev, vec![GameEvent::RunStarted { run_id: 1 }]);
        assert_eq!(w.run_id, 1);
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!(w.gold, 0);
        assert!(w.treasures.is_empty());
        assert_eq!(w.time_left, 60);
        assert!(!w.generating);
        assert_eq!(s.pending(), 0);
        assert_eq!(w.enemies.len(), 4);
        assert_eq!(w.map.tile_at(w.spawn.0, w.spawn.1), Tile::Grass);
        assert_eq!(w.player.pos, Position::at_tile(15, 15));
        assert!(!w.message.is_empty());
    }

    #[test]
    fn consecutive_runs_get_fresh_ids() {
        let mut w = WorldState::new(GameConfig::default(), Some(2));
        let mut s = Scheduler::new();
        start_run(&mut w, &mut s);
        let first: Vec<u32> = w.enemies.iter().map(|e| e.id).collect();
        start_run(&mut w, &mut s);
        assert_eq!(w.run_id, 2);
        assert!(w.enemies.iter().all(|e| !first.contains(&e.id)));
    }
}
