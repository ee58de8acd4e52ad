/// Pointer interaction: pixels → gestures → world actions.
///
/// ## Gesture disambiguation
///
/// A press starts tracking. While held, the largest displacement from the
/// press point is remembered. Once it exceeds the drag threshold the
/// gesture is a pan for the rest of its life: the distance already
/// travelled is released as one pan delta, then every move reports its own
/// delta. Release fires a tap only if the threshold was never exceeded.
///
/// ## Tap resolution
///
/// ┌────────────────────────────────────┬─────────────────────────────────┐
/// │ Condition                          │ Action                          │
/// ├────────────────────────────────────┼─────────────────────────────────┤
/// │ not Playing, generating or digging │ ignored                         │
/// │ within self-tap radius of player   │ dig here (orders cancelled)     │
/// │ anywhere else                      │ move order, clamped to the map; │
/// │                                    │ dig on arrival in move_then_dig │
/// └────────────────────────────────────┴─────────────────────────────────┘

use crate::config::{TapMode, ViewConfig};
use crate::domain::entity::Position;
use crate::domain::physics;
use super::dig;
use super::event::GameEvent;
use super::scheduler::Scheduler;
use super::world::{Camera, Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Gestures
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Gesture {
    None,
    Pan { dx: f32, dy: f32 },
    Tap { x: f32, y: f32 },
}

#[derive(Clone, Copy, Debug)]
struct Press {
    origin: (f32, f32),
    last: (f32, f32),
    max_disp: f32,
    dragging: bool,
}

#[derive(Clone, Debug)]
pub struct PointerTracker {
    threshold: f32,
    press: Option<Press>,
}

impl PointerTracker {
    pub fn new(threshold_px: f32) -> Self {
        PointerTracker { threshold: threshold_px, press: None }
    }

    pub fn press(&mut self, x: f32, y: f32) {
        self.press = Some(Press { origin: (x, y), last: (x, y), max_disp: 0.0, dragging: false });
    }

    pub fn moved(&mut self, x: f32, y: f32) -> Gesture {
        let threshold = self.threshold;
        let p = match self.press.as_mut() { Some(p) => p, None => return Gesture::None };

        let disp = ((x - p.origin.0).powi(2) + (y - p.origin.1).powi(2)).sqrt();
        p.max_disp = p.max_disp.max(disp);

        if !p.dragging && p.max_disp > threshold {
            p.dragging = true;
            p.last = (x, y);
            return Gesture::Pan { dx: x - p.origin.0, dy: y - p.origin.1 };
        }
        if p.dragging {
            let (dx, dy) = (x - p.last.0, y - p.last.1);
            p.last = (x, y);
            return Gesture::Pan { dx, dy };
        }
        Gesture::None
    }

    pub fn release(&mut self, x: f32, y: f32) -> Gesture {
        let tail = self.moved(x, y);
        match self.press.take() {
            Some(p) if p.dragging => tail,
            Some(_) => Gesture::Tap { x, y },
            None => Gesture::None,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Coordinates
// ══════════════════════════════════════════════════════════════

/// Viewport-pixel → world tile coordinates. The viewport centre shows
/// the camera position.
pub fn screen_to_world(camera: &Camera, view: &ViewConfig, sx: f32, sy: f32) -> Position {
    let vp_w = view.viewport_width_tiles * view.tile_size;
    let vp_h = view.viewport_height_tiles * view.tile_size;
    Position::new(
        camera.x + (sx - vp_w / 2.0) / view.tile_size,
        camera.y + (sy - vp_h / 2.0) / view.tile_size,
    )
}

// ══════════════════════════════════════════════════════════════
// Tap resolution
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum TapOutcome {
    Ignored,
    SelfDig,
    MoveOrder(Position),
}

pub fn resolve_tap(
    world: &mut WorldState,
    sched: &mut Scheduler,
    at: Position,
    events: &mut Vec<GameEvent>,
) -> TapOutcome {
    if world.phase != Phase::Playing || world.generating || world.player.digging {
        return TapOutcome::Ignored;
    }

    if at.distance(world.player.pos) < world.config.input.self_tap_radius {
        return if dig::request_dig(world, sched, events) {
            TapOutcome::SelfDig
        } else {
            TapOutcome::Ignored
        };
    }

    let target = physics::clamp_into_map(&world.map, at, world.config.input.edge_margin);
    world.player.target = Some(target);
    world.player.pending_dig = world.config.input.tap_mode == TapMode::MoveThenDig;
    events.push(GameEvent::MoveOrdered { x: target.x, y: target.y });
    TapOutcome::MoveOrder(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::sim::scheduler::Deferred;

    fn open_map(size: usize) -> Vec<String> {
        vec![".".repeat(size); size]
    }

    fn setup(at: (usize, usize)) -> (WorldState, Scheduler) {
        let rows = open_map(20);
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        (WorldState::from_rows(&rows, at), Scheduler::new())
    }

    // ── Gestures ──

    #[test]
    fn small_wobble_is_still_a_tap() {
        let mut p = PointerTracker::new(10.0);
        p.press(100.0, 100.0);
        assert_eq!(p.moved(104.0, 103.0), Gesture::None);
        assert_eq!(p.release(102.0, 101.0), Gesture::Tap { x: 102.0, y: 101.0 });
        assert_eq!(p.release(102.0, 101.0), Gesture::None);
    }

    #[test]
    fn drag_becomes_pan_and_never_taps() {
        let mut p = PointerTracker::new(10.0);
        p.press(0.0, 0.0);
        assert_eq!(p.moved(12.0, 0.0), Gesture::Pan { dx: 12.0, dy: 0.0 });
        assert_eq!(p.moved(15.0, 4.0), Gesture::Pan { dx: 3.0, dy: 4.0 });
        // Back near the origin: still a drag, release is not a tap.
        assert_eq!(p.moved(1.0, 0.0), Gesture::Pan { dx: -14.0, dy: -4.0 });
        assert_eq!(p.release(1.0, 0.0), Gesture::Pan { dx: 0.0, dy: 0.0 });
    }

    #[test]
    fn moves_without_press_are_ignored() {
        let mut p = PointerTracker::new(10.0);
        assert_eq!(p.moved(50.0, 50.0), Gesture::None);
        assert_eq!(p.release(50.0, 50.0), Gesture::None);
    }

    // ── Coordinates ──

    #[test]
    fn viewport_centre_is_camera() {
        let cfg = GameConfig::default();
        let mut cam = Camera::new(11.0, 15.0);
        cam.x = 10.0;
        cam.y = 12.0;
        let p = screen_to_world(&cam, &cfg.view, 11.0 * 48.0 / 2.0, 15.0 * 48.0 / 2.0);
        assert_eq!(p, Position::new(10.0, 12.0));
        let p = screen_to_world(&cam, &cfg.view, 11.0 * 24.0 + 96.0, 15.0 * 24.0 - 48.0);
        assert_eq!(p, Position::new(12.0, 11.0));
    }

    // ── Taps ──

    #[test]
    fn self_tap_digs_instead_of_moving() {
        let (mut w, mut s) = setup((10, 10));
        let mut ev = vec![];
        let out = resolve_tap(&mut w, &mut s, Position::new(10.5, 10.5), &mut ev);
        assert_eq!(out, TapOutcome::SelfDig);
        assert!(w.player.digging);
        assert!(w.player.target.is_none());
        assert!(s.is_scheduled(Deferred::DigComplete));
    }

    #[test]
    fn far_tap_orders_move_then_dig() {
        let (mut w, mut s) = setup((10, 10));
        let out = resolve_tap(&mut w, &mut s, Position::new(14.0, 10.0), &mut vec![]);
        assert_eq!(out, TapOutcome::MoveOrder(Position::new(14.0, 10.0)));
        assert!(w.player.pending_dig);
        assert!(!w.player.digging);
    }

    #[test]
    fn move_only_mode_skips_pending_dig() {
        let (mut w, mut s) = setup((10, 10));
        w.config.input.tap_mode = TapMode::MoveOnly;
        resolve_tap(&mut w, &mut s, Position::new(14.0, 10.0), &mut vec![]);
        assert!(w.player.target.is_some());
        assert!(!w.player.pending_dig);
    }

    #[test]
    fn taps_outside_map_are_clamped() {
        let (mut w, mut s) = setup((10, 10));
        let out = resolve_tap(&mut w, &mut s, Position::new(-3.0, 99.0), &mut vec![]);
        match out {
            TapOutcome::MoveOrder(t) => {
                assert!((t.x + 0.4).abs() < 1e-5);
                assert!((t.y - 19.4).abs() < 1e-5);
            }
            other => panic!("expected move order, got {other:?}"),
        }
    }

    #[test]
    fn taps_ignored_while_busy() {
        let (mut w, mut s) = setup((10, 10));
        w.player.digging = true;
        assert_eq!(resolve_tap(&mut w, &mut s, Position::new(14.0, 10.0), &mut vec![]), TapOutcome::Ignored);

        w.player.digging = false;
        w.generating = true;
        assert_eq!(resolve_tap(&mut w, &mut s, Position::new(14.0, 10.0), &mut vec![]), TapOutcome::Ignored);

        w.generating = false;
        w.phase = Phase::TreasureFound;
        assert_eq!(resolve_tap(&mut w, &mut s, Position::new(10.0, 10.0), &mut vec![]), TapOutcome::Ignored);
        assert!(w.player.target.is_none());
    }
}
