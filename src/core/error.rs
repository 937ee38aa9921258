use thiserror::Error;

use crate::core::types::EntityHandle;
use crate::squad::SquadId;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Unknown agent: {0}")]
    UnknownAgent(EntityHandle),

    #[error("Unknown squad: {0:?}")]
    UnknownSquad(SquadId),

    #[error("Agent {0} already belongs to a squad")]
    AlreadyInSquad(EntityHandle),

    #[error("Agent {0} is on a solo mission")]
    SoloMission(EntityHandle),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BotError>;
