/// The step function: advances the world by one frame.
///
/// Processing order:
///   1. Player movement (arrival → queued dig)
///   2. Camera follow (only while the player had a move order)
///   3. Enemies, one at a time, in roster order:
///        a. trap check (non-flyer on a hole)
///        b. contact with the player (fatal, ends the pass)
///        c. AI steering + axis-separated movement
///   4. Respawned enemies join the roster
///
/// Skipped entirely outside `Playing` and while a treasure request is in
/// flight. Timers live in the scheduler, not here.

use log::{info, warn};

use crate::domain::ai;
use crate::domain::entity::{Direction, Enemy, Position};
use crate::domain::mapgen;
use crate::domain::physics::{self, Mover};
use crate::domain::rules;
use crate::domain::tile::Tile;
use super::dig;
use super::event::GameEvent;
use super::scheduler::{Deferred, Scheduler};
use super::world::{Phase, WorldState};

const MSG_ENEMY_DEFEATED: &str = "Enemy defeated!";
const DEFEAT_MESSAGE_MS: u64 = 1000;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, sched: &mut Scheduler) -> Vec<GameEvent> {
    if world.phase != Phase::Playing || world.generating { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();

    let had_order = world.player.target.is_some();
    resolve_player_movement(world, sched, &mut events);
    if had_order {
        world.camera.follow(world.player.pos, world.map.width, world.map.height);
    }
    resolve_enemies(world, sched, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Player movement
// ══════════════════════════════════════════════════════════════

fn resolve_player_movement(world: &mut WorldState, sched: &mut Scheduler, events: &mut Vec<GameEvent>) {
    let target = match world.player.target { Some(t) => t, None => return };
    if world.player.digging { return; }

    let pos = world.player.pos;
    let dist = pos.distance(target);

    if dist < world.config.input.arrive_epsilon {
        let dig_now = world.player.pending_dig;
        world.player.cancel_orders();
        events.push(GameEvent::Arrived);
        if dig_now {
            dig::request_dig(world, sched, events);
        }
        return;
    }

    // Never overshoot the target.
    let len = world.config.speed.player_speed.min(dist);
    let vx = (target.x - pos.x) / dist * len;
    let vy = (target.y - pos.y) / dist * len;
    world.player.facing = Direction::from_motion(vx, vy);

    let result = physics::step(&world.map, Mover::Walker, pos, vx, vy);
    if result.moved() {
        world.player.pos = result.pos;
    } else {
        world.player.cancel_orders();
        events.push(GameEvent::MoveBlocked);
    }
}

// ══════════════════════════════════════════════════════════════
// Enemies
// ══════════════════════════════════════════════════════════════

fn resolve_enemies(world: &mut WorldState, sched: &mut Scheduler, events: &mut Vec<GameEvent>) {
    let params = world.config.speed.ai_params();
    let contact = world.config.input.contact_radius;
    let mut spawned: Vec<Enemy> = Vec::new();

    let mut i = 0;
    while i < world.enemies.len() {
        let enemy = world.enemies[i].clone();

        if let Some((tx, ty)) = trap_tile(world, &enemy) {
            world.enemies.remove(i);
            spring_trap(world, &enemy, tx, ty, &mut spawned, events);
            continue;
        }

        if enemy.pos.distance(world.player.pos) < contact {
            kill_player(world, sched, enemy.id, events);
            break;
        }

        let intent = ai::decide(&enemy, world.player.pos, &params, &mut world.rng);
        let (vx, vy) = intent.velocity();
        if vx != 0.0 || vy != 0.0 {
            let mover = Mover::for_enemy(enemy.stats());
            let result = physics::step(&world.map, mover, enemy.pos, vx, vy);
            world.enemies[i].pos = result.pos;
        }
        i += 1;
    }

    world.enemies.extend(spawned);
}

/// Tile of the hole this enemy has walked into, if any. Flyers never fall.
fn trap_tile(world: &WorldState, enemy: &Enemy) -> Option<(usize, usize)> {
    if enemy.stats().flying { return None; }
    let (tx, ty) = enemy.pos.tile();
    match world.map.get(tx, ty) {
        Some(Tile::Hole) => Some((tx as usize, ty as usize)),
        _ => None,
    }
}

/// Fill the hole, queue one replacement enemy, and move the player off the
/// filled tile if they were standing on it.
fn spring_trap(
    world: &mut WorldState,
    enemy: &Enemy,
    tx: usize,
    ty: usize,
    spawned: &mut Vec<Enemy>,
    events: &mut Vec<GameEvent>,
) {
    world.map.set_tile(tx, ty, rules::TRAP_FILL_TILE);
    info!("enemy {} ({:?}) trapped at ({tx}, {ty})", enemy.id, enemy.kind);
    events.push(GameEvent::EnemyTrapped { id: enemy.id, x: tx, y: ty });
    world.set_message(MSG_ENEMY_DEFEATED, DEFEAT_MESSAGE_MS);

    let placement = mapgen::place_enemy(
        &world.map,
        world.player.pos,
        world.config.map.min_spawn_distance,
        world.config.map.spawn_attempts,
        &mut world.rng,
    );
    match placement {
        Some((x, y)) => {
            let kind = mapgen::roll_enemy_kind(&mut world.rng);
            let id = world.next_enemy_id;
            world.next_enemy_id += 1;
            spawned.push(Enemy::new(id, Position::at_tile(x, y), kind));
            events.push(GameEvent::EnemyRespawned { id });
        }
        None => warn!("no room to respawn an enemy; roster shrinks"),
    }

    let (px, py) = world.player.pos.tile();
    if (px, py) == (tx as i64, ty as i64) {
        if let Some((nx, ny)) = physics::safe_neighbour(&world.map, tx, ty) {
            world.player.pos = Position::at_tile(nx, ny);
            world.player.cancel_orders();
            events.push(GameEvent::PlayerRelocated { x: nx, y: ny });
        }
    }
}

fn kill_player(world: &mut WorldState, sched: &mut Scheduler, by: u32, events: &mut Vec<GameEvent>) {
    info!("player caught by enemy {by}");
    world.phase = Phase::Dying;
    world.player.cancel_orders();
    sched.schedule(world.config.timing.death_delay_ms, Deferred::DeathToGameOver);
    events.push(GameEvent::PlayerKilled { by });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::EnemyKind;

    fn setup(rows: &[&str], at: (usize, usize)) -> (WorldState, Scheduler) {
        let mut s = Scheduler::new();
        s.begin_run();
        (WorldState::from_rows(rows, at), s)
    }

    fn add_enemy(w: &mut WorldState, x: f32, y: f32, kind: EnemyKind) -> u32 {
        let id = w.next_enemy_id;
        w.next_enemy_id += 1;
        w.enemies.push(Enemy::new(id, Position::new(x, y), kind));
        id
    }

    // ── Player ──

    #[test]
    fn arrival_within_epsilon_clears_order() {
        let (mut w, mut s) = setup(&["....."], (2, 0));
        w.player.target = Some(Position::new(2.05, 0.0));
        let ev = step(&mut w, &mut s);
        assert!(w.player.target.is_none());
        assert!(!w.player.is_moving());
        assert_eq!(ev, vec![GameEvent::Arrived]);
    }

    #[test]
    fn arrival_with_pending_dig_starts_dig() {
        let (mut w, mut s) = setup(&["....."], (2, 0));
        w.player.target = Some(Position::new(2.0, 0.0));
        w.player.pending_dig = true;
        let ev = step(&mut w, &mut s);
        assert!(w.player.digging);
        assert!(!w.player.pending_dig);
        assert!(s.is_scheduled(Deferred::DigComplete));
        assert_eq!(ev, vec![GameEvent::Arrived, GameEvent::DigStarted]);
    }

    #[test]
    fn taps_past_any_map_edge_walk_to_the_border_and_dig() {
        use crate::sim::interact::{resolve_tap, TapOutcome};
        let rows = ["ssssssssss"; 3];
        let cases = [
            ((8, 1), Position::new(9.7, 1.0), (9, 1)),
            ((1, 1), Position::new(-0.3, 1.0), (0, 1)),
            ((4, 1), Position::new(4.0, 2.9), (4, 2)),
            ((4, 1), Position::new(4.0, -0.6), (4, 0)),
        ];
        for (start, tap, tile) in cases {
            let (mut w, mut s) = setup(&rows, start);
            let mut ev = Vec::new();
            assert!(matches!(resolve_tap(&mut w, &mut s, tap, &mut ev), TapOutcome::MoveOrder(_)));
            for _ in 0..40 {
                ev.extend(step(&mut w, &mut s));
            }
            assert!(!ev.contains(&GameEvent::MoveBlocked), "tap {tap:?} was blocked");
            assert!(ev.contains(&GameEvent::Arrived), "tap {tap:?} never arrived");
            assert!(ev.contains(&GameEvent::DigStarted), "tap {tap:?} did not dig");
            assert!(w.player.digging);
            assert_eq!(w.player.pos.tile(), tile);
        }
    }

    #[test]
    fn walks_toward_target_and_faces_it() {
        let (mut w, mut s) = setup(&["......"], (0, 0));
        w.player.target = Some(Position::new(5.0, 0.0));
        step(&mut w, &mut s);
        assert!((w.player.pos.x - 0.15).abs() < 1e-5);
        assert_eq!(w.player.facing, Direction::Right);
        for _ in 0..200 {
            step(&mut w, &mut s);
        }
        assert!(w.player.target.is_none());
        assert!((w.player.pos.x - 5.0).abs() < 0.1);
    }

    #[test]
    fn slides_along_wall() {
        let (mut w, mut s) = setup(&[
            "..",
            "#.",
        ], (0, 0));
        // Diagonal order into rock: y is blocked, x still moves.
        w.player.pos = Position::new(0.0, 0.45);
        w.player.target = Some(Position::new(1.0, 1.0));
        step(&mut w, &mut s);
        assert!(w.player.pos.x > 0.0);
        assert_eq!(w.player.pos.y, 0.45);
        assert!(w.player.target.is_some());
    }

    #[test]
    fn fully_blocked_cancels_order() {
        let (mut w, mut s) = setup(&["..~"], (1, 0));
        w.player.pos = Position::new(1.45, 0.0);
        w.player.target = Some(Position::new(2.0, 0.0));
        w.player.pending_dig = true;
        let ev = step(&mut w, &mut s);
        assert_eq!(ev, vec![GameEvent::MoveBlocked]);
        assert!(w.player.target.is_none());
        assert!(!w.player.pending_dig);
        assert!(!w.player.digging);
    }

    #[test]
    fn digging_freezes_movement() {
        let (mut w, mut s) = setup(&["....."], (0, 0));
        w.player.target = Some(Position::new(4.0, 0.0));
        w.player.digging = true;
        step(&mut w, &mut s);
        assert_eq!(w.player.pos.x, 0.0);
    }

    #[test]
    fn generating_pauses_everything() {
        let (mut w, mut s) = setup(&["........"], (0, 0));
        add_enemy(&mut w, 3.0, 0.0, EnemyKind::Slime);
        w.player.target = Some(Position::new(4.0, 0.0));
        w.generating = true;
        assert!(step(&mut w, &mut s).is_empty());
        assert_eq!(w.player.pos.x, 0.0);
        assert_eq!(w.enemies[0].pos.x, 3.0);
    }

    #[test]
    fn camera_follows_only_while_ordered() {
        let row = ".".repeat(40);
        let (mut w, mut s) = setup(&[row.as_str()], (5, 0));
        let before = w.camera.x;
        w.player.pos = Position::new(20.0, 0.0); // teleport, no order
        step(&mut w, &mut s);
        assert_eq!(w.camera.x, before);
        w.player.target = Some(Position::new(30.0, 0.0));
        step(&mut w, &mut s);
        assert!(w.camera.x > before);
    }

    // ── Enemies ──

    #[test]
    fn walker_falls_into_hole_and_is_replaced() {
        let row = ".".repeat(20);
        let (mut w, mut s) = setup(&[row.as_str(), row.as_str(), row.as_str()], (0, 0));
        w.map.set_tile(12, 1, Tile::Hole);
        let id = add_enemy(&mut w, 12.0, 1.0, EnemyKind::Slime);

        let ev = step(&mut w, &mut s);
        assert_eq!(w.map.tile_at(12, 1), rules::TRAP_FILL_TILE);
        assert_eq!(w.enemies.len(), 1);
        assert_ne!(w.enemies[0].id, id);
        assert!(w.enemies[0].pos.distance(w.player.pos) > w.config.map.min_spawn_distance);
        assert!(ev.contains(&GameEvent::EnemyTrapped { id, x: 12, y: 1 }));
        assert!(matches!(ev.last(), Some(GameEvent::EnemyRespawned { .. })));
    }

    #[test]
    fn flyers_cross_holes() {
        let row = ".".repeat(20);
        let (mut w, mut s) = setup(&[row.as_str()], (0, 0));
        w.map.set_tile(12, 0, Tile::Hole);
        let id = add_enemy(&mut w, 12.0, 0.0, EnemyKind::Bat);
        step(&mut w, &mut s);
        assert_eq!(w.enemies[0].id, id);
        assert_eq!(w.map.tile_at(12, 0), Tile::Hole);
    }

    #[test]
    fn trap_under_player_relocates_player() {
        let (mut w, mut s) = setup(&[
            "#.#......",
            ".........",
            "#.#......",
        ], (1, 1));
        w.map.set_tile(1, 1, Tile::Hole);
        w.player.target = Some(Position::new(8.0, 1.0));
        w.player.digging = true; // hold the player still for this frame
        // Enemy standing on the same hole; contact is checked after the trap.
        add_enemy(&mut w, 1.0, 1.0, EnemyKind::Slime);

        let ev = step(&mut w, &mut s);
        assert_eq!(w.map.tile_at(1, 1), Tile::Rock);
        assert_eq!(w.player.pos, Position::at_tile(1, 0));
        assert!(w.player.target.is_none());
        assert!(ev.contains(&GameEvent::PlayerRelocated { x: 1, y: 0 }));
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn contact_is_fatal_but_delayed() {
        let (mut w, mut s) = setup(&["....."], (1, 0));
        let id = add_enemy(&mut w, 1.5, 0.0, EnemyKind::Slime);
        w.player.target = Some(Position::new(4.0, 0.0));
        w.player.digging = true;

        let ev = step(&mut w, &mut s);
        assert_eq!(w.phase, Phase::Dying);
        assert!(w.player.target.is_none());
        assert_eq!(ev, vec![GameEvent::PlayerKilled { by: id }]);
        assert!(s.is_scheduled(Deferred::DeathToGameOver));

        // Dying: the world no longer advances.
        let x = w.enemies[0].pos.x;
        assert!(step(&mut w, &mut s).is_empty());
        assert_eq!(w.enemies[0].pos.x, x);
    }

    #[test]
    fn ghost_passes_rock_walker_does_not() {
        let (mut w, mut s) = setup(&["...#...."], (7, 0));
        w.player.digging = true;
        add_enemy(&mut w, 2.49, 0.0, EnemyKind::Ghost);
        add_enemy(&mut w, 2.49, 0.0, EnemyKind::Slime);
        step(&mut w, &mut s);
        assert!(w.enemies[0].pos.x > 2.5, "ghost at {}", w.enemies[0].pos.x);
        assert_eq!(w.enemies[1].pos.x, 2.49);
    }

    #[test]
    fn bat_crosses_water_but_not_rock() {
        let (mut w, mut s) = setup(&["..~#...."], (7, 0));
        w.player.digging = true;
        add_enemy(&mut w, 1.49, 0.0, EnemyKind::Bat);
        step(&mut w, &mut s);
        assert!(w.enemies[0].pos.x > 1.5);

        w.enemies[0].pos = Position::new(2.49, 0.0);
        step(&mut w, &mut s);
        assert_eq!(w.enemies[0].pos.x, 2.49);
    }

    #[test]
    fn far_enemies_stand_still() {
        let row = ".".repeat(45);
        let (mut w, mut s) = setup(&[row.as_str()], (0, 0));
        add_enemy(&mut w, 40.0, 0.0, EnemyKind::Ghost);
        for _ in 0..100 {
            step(&mut w, &mut s);
        }
        assert_eq!(w.enemies[0].pos.x, 40.0);
    }
}
