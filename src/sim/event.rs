/// Events emitted while the game advances.
/// The presentation layer consumes these for animation and logging.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DigRejection {
    TooHard,
    AlreadyDug,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    RunStarted { run_id: u64 },
    MoveOrdered { x: f32, y: f32 },
    Arrived,
    MoveBlocked,
    DigStarted,
    DigRejected(DigRejection),
    HoleDug { x: usize, y: usize },
    TreasureRevealed { x: usize, y: usize },
    TreasureAcquired { catalog_id: u32, value: u32, first_discovery: bool },
    TreasureFailed,
    EnemyTrapped { id: u32, x: usize, y: usize },
    EnemyRespawned { id: u32 },
    PlayerRelocated { x: usize, y: usize },
    PlayerKilled { by: u32 },
    GameOver,
    TimeUp,
}
