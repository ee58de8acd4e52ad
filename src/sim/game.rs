/// Game: the simulation context the host drives.
///
/// Owns the world, the scheduler, the treasure source, the at-most-one
/// in-flight treasure request and the discovery log. The host calls
/// `tick(dt)` once per frame and forwards input; everything else happens
/// in here on the one game thread.
///
/// ## Phase transitions
///
/// ┌───────────────┬───────────────────────────┬───────────────┐
/// │ From          │ Trigger                   │ To            │
/// ├───────────────┼───────────────────────────┼───────────────┤
/// │ Title         │ start                     │ Playing       │
/// │ Title         │ open_book                 │ TreasureBook  │
/// │ Playing       │ treasure acquired         │ TreasureFound │
/// │ TreasureFound │ close_treasure_dialog     │ Playing       │
/// │ Playing       │ enemy contact             │ Dying         │
/// │ Dying         │ death delay (same run)    │ GameOver      │
/// │ Playing       │ timer reaches 0           │ TimeUp        │
/// │ GameOver,     │ restart                   │ Title         │
/// │ TimeUp,       │                           │               │
/// │ TreasureBook  │                           │               │
/// └───────────────┴───────────────────────────┴───────────────┘

use log::{debug, info};

use crate::config::GameConfig;
use crate::domain::entity::Position;
use crate::domain::treasure::{PendingTreasure, TreasureSource};
use super::dig;
use super::event::GameEvent;
use super::interact::{self, Gesture, PointerTracker};
use super::level;
use super::save::DiscoveryLog;
use super::scheduler::{Deferred, Due, Scheduler};
use super::step;
use super::view::ViewSnapshot;
use super::world::{Phase, WorldState};

pub struct Game {
    pub world: WorldState,
    pub scheduler: Scheduler,
    pub discoveries: DiscoveryLog,
    source: Box<dyn TreasureSource>,
    pending: Option<PendingTreasure>,
    pointer: PointerTracker,
}

impl Game {
    pub fn new(
        config: GameConfig,
        seed: Option<u64>,
        source: Box<dyn TreasureSource>,
        discoveries: DiscoveryLog,
    ) -> Self {
        let pointer = PointerTracker::new(config.input.drag_threshold_px);
        Game {
            world: WorldState::new(config, seed),
            scheduler: Scheduler::new(),
            discoveries,
            source,
            pending: None,
            pointer,
        }
    }

    pub fn view(&self) -> ViewSnapshot<'_> {
        ViewSnapshot::capture(&self.world, &self.discoveries)
    }

    // ══════════════════════════════════════════════════════════
    // Phase transitions
    // ══════════════════════════════════════════════════════════

    /// Title → Playing on a freshly generated map.
    pub fn start(&mut self) -> Vec<GameEvent> {
        if self.world.phase != Phase::Title { return vec![]; }
        self.pending = None;
        let events = level::start_run(&mut self.world, &mut self.scheduler);
        self.sync_countdown();
        events
    }

    pub fn close_treasure_dialog(&mut self) -> bool {
        if self.world.phase != Phase::TreasureFound { return false; }
        self.world.found_treasure = None;
        self.world.phase = Phase::Playing;
        self.sync_countdown();
        true
    }

    pub fn open_book(&mut self) -> bool {
        if self.world.phase != Phase::Title { return false; }
        self.world.phase = Phase::TreasureBook;
        true
    }

    /// Back to the title from a finished run or the treasure book.
    pub fn restart(&mut self) -> bool {
        if !(self.world.phase.is_terminal() || self.world.phase == Phase::TreasureBook) {
            return false;
        }
        info!("returning to title from {:?}", self.world.phase);
        self.world.phase = Phase::Title;
        self.world.message.clear();
        self.world.message_timer_ms = 0;
        self.scheduler.stop_countdown();
        true
    }

    // ══════════════════════════════════════════════════════════
    // Input
    // ══════════════════════════════════════════════════════════

    /// A tap already converted to world coordinates.
    pub fn tap(&mut self, at: Position) -> Vec<GameEvent> {
        let mut events = Vec::new();
        interact::resolve_tap(&mut self.world, &mut self.scheduler, at, &mut events);
        events
    }

    /// Tap on the player: dig where they stand.
    pub fn self_dig(&mut self) -> Vec<GameEvent> {
        let at = self.world.player.pos;
        self.tap(at)
    }

    /// Manual camera pan by a pixel delta.
    pub fn pan(&mut self, dx_px: f32, dy_px: f32) {
        if !matches!(self.world.phase, Phase::Playing | Phase::TreasureFound | Phase::Dying) {
            return;
        }
        let (w, h) = (self.world.map.width, self.world.map.height);
        let tile = self.world.config.view.tile_size;
        self.world.camera.pan(dx_px, dy_px, tile, w, h);
    }

    pub fn pointer_down(&mut self, sx: f32, sy: f32) {
        self.pointer.press(sx, sy);
    }

    pub fn pointer_move(&mut self, sx: f32, sy: f32) -> Vec<GameEvent> {
        let gesture = self.pointer.moved(sx, sy);
        self.apply_gesture(gesture)
    }

    pub fn pointer_up(&mut self, sx: f32, sy: f32) -> Vec<GameEvent> {
        let gesture = self.pointer.release(sx, sy);
        self.apply_gesture(gesture)
    }

    fn apply_gesture(&mut self, gesture: Gesture) -> Vec<GameEvent> {
        match gesture {
            Gesture::None => vec![],
            Gesture::Pan { dx, dy } => {
                self.pan(dx, dy);
                vec![]
            }
            Gesture::Tap { x, y } => {
                let at = interact::screen_to_world(&self.world.camera, &self.world.config.view, x, y);
                self.tap(at)
            }
        }
    }

    // ══════════════════════════════════════════════════════════
    // Frame
    // ══════════════════════════════════════════════════════════

    /// Advance by `dt_ms` of real time. Call once per frame in every phase;
    /// phases without gameplay just age messages.
    pub fn tick(&mut self, dt_ms: u64) -> Vec<GameEvent> {
        let mut events = Vec::new();

        self.world.tick_message(dt_ms);
        self.poll_treasure(&mut events);
        self.sync_countdown();

        let fired = self.scheduler.advance(dt_ms);
        for due in fired.deferred {
            self.apply_deferred(due, &mut events);
        }
        for _ in 0..fired.seconds {
            self.count_down(&mut events);
        }

        events.extend(step::step(&mut self.world, &mut self.scheduler));
        self.sync_countdown();
        events
    }

    /// The countdown runs only while playing with the world unpaused.
    fn sync_countdown(&mut self) {
        if self.world.phase == Phase::Playing && !self.world.generating {
            self.scheduler.start_countdown();
        } else {
            self.scheduler.stop_countdown();
        }
    }

    fn count_down(&mut self, events: &mut Vec<GameEvent>) {
        if self.world.phase != Phase::Playing || self.world.generating { return; }
        if self.world.time_left <= 1 {
            self.world.time_left = 0;
            self.world.phase = Phase::TimeUp;
            self.world.player.cancel_orders();
            self.scheduler.stop_countdown();
            info!("run {} timed out with {}g", self.world.run_id, self.world.gold);
            events.push(GameEvent::TimeUp);
        } else {
            self.world.time_left -= 1;
        }
    }

    fn apply_deferred(&mut self, due: Due, events: &mut Vec<GameEvent>) {
        if due.run_id != self.world.run_id {
            debug!("dropping stale {:?} from run {}", due.what, due.run_id);
            return;
        }
        match due.what {
            Deferred::DigComplete => {
                let pending = dig::complete_dig(
                    &mut self.world,
                    self.source.as_mut(),
                    &mut self.discoveries,
                    events,
                );
                if pending.is_some() {
                    self.pending = pending;
                }
            }
            Deferred::DeathToGameOver => {
                if self.world.phase == Phase::Dying {
                    self.world.phase = Phase::GameOver;
                    info!("run {} over with {}g", self.world.run_id, self.world.gold);
                    events.push(GameEvent::GameOver);
                }
            }
        }
    }

    fn poll_treasure(&mut self, events: &mut Vec<GameEvent>) {
        let result = match &self.pending {
            Some(p) => p.poll(),
            None => None,
        };
        if let Some(result) = result {
            self.pending = None;
            dig::finish_acquisition(&mut self.world, &mut self.discoveries, result, events);
        }
    }
}
