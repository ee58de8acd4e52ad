/// Treasure catalog, rarity tiers and the treasure-content collaborator.
///
/// The core never knows where treasure comes from. It asks a
/// `TreasureSource` for one catalog entry and gets either an immediate
/// answer or a channel that answers later. Exactly one request is in
/// flight at a time; the caller enforces that.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::error::{GameError, GameResult};

/// Immutable catalog definition. `catalog_id` is the discovery-log key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    pub catalog_id: u32,
    pub name: String,
    pub description: String,
    pub value: u32,
    pub icon: String,
}

/// One acquired treasure: a catalog entry plus a fresh instance id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreasureInstance {
    pub id: Uuid,
    pub entry: CatalogEntry,
}

impl TreasureInstance {
    pub fn new(entry: CatalogEntry) -> Self {
        TreasureInstance { id: Uuid::new_v4(), entry }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn from_value(value: u32) -> Self {
        match value {
            0..=99 => Rarity::Common,
            100..=399 => Rarity::Rare,
            400..=799 => Rarity::Epic,
            _ => Rarity::Legendary,
        }
    }

    pub fn stars(self) -> u8 {
        match self {
            Rarity::Common => 1,
            Rarity::Rare => 2,
            Rarity::Epic => 3,
            Rarity::Legendary => 4,
        }
    }

    /// Relative draw weight for the catalog table.
    fn draw_weight(self) -> u32 {
        match self {
            Rarity::Common => 60,
            Rarity::Rare => 25,
            Rarity::Epic => 11,
            Rarity::Legendary => 4,
        }
    }
}

/// Catalog id of the placeholder handed out when the source fails.
/// Not a registry entry, so it never enters the discovery log.
pub const FALLBACK_CATALOG_ID: u32 = 0;

pub fn fallback_entry() -> CatalogEntry {
    CatalogEntry {
        catalog_id: FALLBACK_CATALOG_ID,
        name: "Mysterious Bone".into(),
        description: "An old bone that smells oddly delicious. Whatever was buried here crumbled away.".into(),
        value: 10,
        icon: "🦴".into(),
    }
}

// (catalog_id, name, description, value, icon)
const REGISTRY: &[(u32, &str, &str, u32, &str)] = &[
    (1, "Rusty Spoon", "Bent from years of digging. Still scoops.", 12, "🥄"),
    (2, "Lost Button", "Fell off a very important coat.", 15, "🔘"),
    (3, "Chewed Ball", "Someone loved this ball very much.", 20, "🎾"),
    (4, "Bottle Cap", "A collector's item, if you ask a magpie.", 25, "🍾"),
    (5, "Smooth Pebble", "Perfectly round. Suspiciously round.", 30, "🪨"),
    (6, "Old Coin", "The king on it looks a little smug.", 45, "🪙"),
    (7, "Glass Marble", "A tiny galaxy trapped in glass.", 60, "🔮"),
    (8, "Tin Whistle", "Only dogs can hear its best notes.", 80, "📯"),
    (9, "Silver Ring", "Engraved: 'to my best boy'.", 120, "💍"),
    (10, "Pirate Compass", "Always points to the nearest snack.", 180, "🧭"),
    (11, "Fossil Shell", "Older than every tree on the island.", 220, "🐚"),
    (12, "Jeweled Collar", "Fit for a very small monarch.", 300, "📿"),
    (13, "Golden Goblet", "Drinking from it makes water taste fancy.", 380, "🏆"),
    (14, "Ancient Map", "The X is right where you're standing.", 450, "🗺️"),
    (15, "Ruby Bone", "A bone carved from a single gemstone.", 600, "🦴"),
    (16, "Crystal Skull", "It hums when ghosts are near.", 750, "💀"),
    (17, "Dragon Egg", "Warm to the touch. Do not sit on it.", 900, "🥚"),
    (18, "Crown of the Deep", "Worn by the first dog to swim the strait.", 1000, "👑"),
];

/// The full catalog, in catalog-id order.
pub fn registry() -> Vec<CatalogEntry> {
    REGISTRY
        .iter()
        .map(|&(catalog_id, name, description, value, icon)| CatalogEntry {
            catalog_id,
            name: name.into(),
            description: description.into(),
            value,
            icon: icon.into(),
        })
        .collect()
}

pub fn registry_len() -> usize {
    REGISTRY.len()
}

/// Weighted draw from the catalog: rarer tiers come up less often.
pub fn draw_entry<R: Rng>(catalog: &[CatalogEntry], rng: &mut R) -> Option<CatalogEntry> {
    let weights = catalog.iter().map(|e| Rarity::from_value(e.value).draw_weight());
    let dist = WeightedIndex::new(weights).ok()?;
    Some(catalog[dist.sample(rng)].clone())
}

// ── Collaborator ──

/// Answer to a treasure request.
pub enum Acquisition {
    /// Resolved synchronously.
    Ready(GameResult<CatalogEntry>),
    /// Resolves later; poll with `PendingTreasure::poll`.
    Pending(PendingTreasure),
}

/// A request in flight.
pub struct PendingTreasure {
    rx: Receiver<GameResult<CatalogEntry>>,
}

impl PendingTreasure {
    /// `None` while still waiting. A dropped sender counts as failure.
    pub fn poll(&self) -> Option<GameResult<CatalogEntry>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(GameError::TreasureSource(
                "treasure source hung up".into(),
            ))),
        }
    }
}

/// Produces treasure records for the core.
pub trait TreasureSource {
    fn acquire(&mut self) -> Acquisition;
}

/// Synchronous weighted draw from the static catalog.
pub struct CatalogSource {
    catalog: Vec<CatalogEntry>,
    rng: StdRng,
}

impl CatalogSource {
    pub fn new(seed: Option<u64>) -> Self {
        CatalogSource { catalog: registry(), rng: seeded(seed) }
    }
}

impl TreasureSource for CatalogSource {
    fn acquire(&mut self) -> Acquisition {
        let result = draw_entry(&self.catalog, &mut self.rng)
            .ok_or_else(|| GameError::TreasureSource("catalog is empty".into()));
        Acquisition::Ready(result)
    }
}

/// Catalog draw answered from a worker thread after a delay,
/// standing in for a remote generator.
pub struct DelayedSource {
    catalog: Vec<CatalogEntry>,
    rng: StdRng,
    latency: Duration,
}

impl DelayedSource {
    pub fn new(seed: Option<u64>, latency: Duration) -> Self {
        DelayedSource { catalog: registry(), rng: seeded(seed), latency }
    }
}

impl TreasureSource for DelayedSource {
    fn acquire(&mut self) -> Acquisition {
        // Draw now so the result is reproducible from the seed.
        let result = draw_entry(&self.catalog, &mut self.rng)
            .ok_or_else(|| GameError::TreasureSource("catalog is empty".into()));
        let (tx, rx) = mpsc::channel();
        let latency = self.latency;
        thread::spawn(move || {
            thread::sleep(latency);
            let _ = tx.send(result);
        });
        Acquisition::Pending(PendingTreasure { rx })
    }
}

fn seeded(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_ids_are_unique_and_nonzero() {
        let reg = registry();
        let mut ids: Vec<u32> = reg.iter().map(|e| e.catalog_id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), reg.len());
        assert!(!ids.contains(&FALLBACK_CATALOG_ID));
        assert!(reg.iter().all(|e| (10..=1000).contains(&e.value)));
    }

    #[test]
    fn rarity_tiers() {
        assert_eq!(Rarity::from_value(10), Rarity::Common);
        assert_eq!(Rarity::from_value(100), Rarity::Rare);
        assert_eq!(Rarity::from_value(799), Rarity::Epic);
        assert_eq!(Rarity::from_value(1000), Rarity::Legendary);
        assert_eq!(Rarity::Legendary.stars(), 4);
    }

    #[test]
    fn commons_dominate_draws() {
        let reg = registry();
        let mut rng = StdRng::seed_from_u64(4);
        let mut commons = 0;
        for _ in 0..1000 {
            let e = draw_entry(&reg, &mut rng).unwrap();
            if Rarity::from_value(e.value) == Rarity::Common {
                commons += 1;
            }
        }
        assert!(commons > 500, "commons = {commons}");
    }

    #[test]
    fn empty_catalog_fails_cleanly() {
        let mut source = CatalogSource { catalog: vec![], rng: seeded(Some(1)) };
        match source.acquire() {
            Acquisition::Ready(Err(GameError::TreasureSource(_))) => {}
            _ => panic!("expected a source error"),
        }
    }

    #[test]
    fn delayed_source_eventually_answers() {
        let mut source = DelayedSource::new(Some(2), Duration::from_millis(5));
        let pending = match source.acquire() {
            Acquisition::Pending(p) => p,
            Acquisition::Ready(_) => panic!("expected pending"),
        };
        let mut answer = None;
        for _ in 0..200 {
            if let Some(r) = pending.poll() {
                answer = Some(r);
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(matches!(answer, Some(Ok(_))));
    }

    #[test]
    fn dropped_sender_is_a_failure() {
        let (tx, rx) = mpsc::channel::<GameResult<CatalogEntry>>();
        drop(tx);
        let pending = PendingTreasure { rx };
        assert!(matches!(pending.poll(), Some(Err(_))));
    }

    #[test]
    fn instances_get_distinct_ids() {
        let a = TreasureInstance::new(fallback_entry());
        let b = TreasureInstance::new(fallback_entry());
        assert_ne!(a.id, b.id);
    }
}
