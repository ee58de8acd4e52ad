/// Dig protocol: request → delayed completion → optional treasure.
///
///   1. `request_dig` marks the player busy and schedules completion.
///      Nothing in the world changes yet.
///   2. `complete_dig` runs when the delay elapses. It re-reads the tile
///      under the player at that instant (enemies or a relocation may have
///      changed it) and applies the dig verdict.
///   3. A hidden treasure starts an acquisition. While it is in flight the
///      world is paused (`generating`). `finish_acquisition` always clears
///      that flag, on success and on failure.

use log::{info, warn};

use crate::domain::rules::{self, DigVerdict};
use crate::domain::treasure::{self, Acquisition, CatalogEntry, PendingTreasure, TreasureInstance, TreasureSource};
use crate::error::GameResult;
use super::event::{DigRejection, GameEvent};
use super::save::DiscoveryLog;
use super::scheduler::{Deferred, Scheduler};
use super::world::{Phase, WorldState};

const MSG_TOO_HARD: &str = "Too hard to dig here...";
const MSG_ALREADY_DUG: &str = "Already dug here...";
const MSG_CRUMBLED: &str = "Something was here, but it crumbled away...";
const REJECT_MESSAGE_MS: u64 = 1000;
const FAILURE_MESSAGE_MS: u64 = 1500;

/// Start a dig at the player's position. Returns false if refused
/// (not playing, already digging, or a treasure is being generated).
pub fn request_dig(world: &mut WorldState, sched: &mut Scheduler, events: &mut Vec<GameEvent>) -> bool {
    if world.phase != Phase::Playing || world.player.digging || world.generating {
        return false;
    }
    world.player.cancel_orders();
    world.player.digging = true;
    sched.schedule(world.config.timing.dig_delay_ms, Deferred::DigComplete);
    events.push(GameEvent::DigStarted);
    true
}

/// Apply a dig that has come due. The caller has already checked the run id.
/// Returns the in-flight request if the dig revealed treasure and the
/// source answers asynchronously.
pub fn complete_dig(
    world: &mut WorldState,
    source: &mut dyn TreasureSource,
    log: &mut DiscoveryLog,
    events: &mut Vec<GameEvent>,
) -> Option<PendingTreasure> {
    world.player.digging = false;
    if world.phase != Phase::Playing { return None; }

    let (tx, ty) = world.player.pos.tile();
    match rules::dig_verdict(world.tile_under_player()) {
        DigVerdict::TooHard => {
            world.set_message(MSG_TOO_HARD, REJECT_MESSAGE_MS);
            events.push(GameEvent::DigRejected(DigRejection::TooHard));
            None
        }
        DigVerdict::AlreadyDug => {
            world.set_message(MSG_ALREADY_DUG, REJECT_MESSAGE_MS);
            events.push(GameEvent::DigRejected(DigRejection::AlreadyDug));
            None
        }
        DigVerdict::Dig => {
            // In bounds: dig_verdict only says Dig for a real tile.
            let (x, y) = (tx as usize, ty as usize);
            world.map.set_tile(x, y, rules::DUG_TILE);
            events.push(GameEvent::HoleDug { x, y });

            if !world.map.take_treasure(x, y) {
                return None;
            }
            info!("treasure revealed at ({x}, {y})");
            events.push(GameEvent::TreasureRevealed { x, y });
            world.generating = true;

            match source.acquire() {
                Acquisition::Ready(result) => {
                    finish_acquisition(world, log, result, events);
                    None
                }
                Acquisition::Pending(pending) => Some(pending),
            }
        }
    }
}

/// Settle a treasure request. Success credits the treasure, records the
/// discovery and opens the treasure dialog. Failure credits the fallback
/// treasure and resumes play with a message. Either way the world resumes.
pub fn finish_acquisition(
    world: &mut WorldState,
    log: &mut DiscoveryLog,
    result: GameResult<CatalogEntry>,
    events: &mut Vec<GameEvent>,
) {
    match result {
        Ok(entry) => {
            let first_discovery = log.record(entry.catalog_id);
            info!(
                "acquired {} (#{}, {}g){}",
                entry.name, entry.catalog_id, entry.value,
                if first_discovery { ", new discovery" } else { "" }
            );
            events.push(GameEvent::TreasureAcquired {
                catalog_id: entry.catalog_id,
                value: entry.value,
                first_discovery,
            });
            let instance = TreasureInstance::new(entry);
            world.gold += instance.entry.value;
            world.treasures.push(instance.clone());
            if world.phase == Phase::Playing {
                world.found_treasure = Some(instance);
                world.phase = Phase::TreasureFound;
            }
        }
        Err(e) => {
            warn!("treasure source failed, using fallback: {e}");
            let instance = TreasureInstance::new(treasure::fallback_entry());
            world.gold += instance.entry.value;
            world.treasures.push(instance);
            world.set_message(MSG_CRUMBLED, FAILURE_MESSAGE_MS);
            events.push(GameEvent::TreasureFailed);
        }
    }
    world.generating = false;
}
