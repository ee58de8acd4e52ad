/// Error type for the I/O boundaries: config, discovery log, terminal.
///
/// Gameplay rejections (digging rock, tapping while busy) are not errors;
/// they travel as `GameEvent`s and transient messages.

#[derive(thiserror::Error, Debug)]
pub enum GameError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("discovery log is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("treasure source failed: {0}")]
    TreasureSource(String),
}

pub type GameResult<T> = Result<T, GameError>;
