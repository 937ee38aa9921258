pub mod config;
pub mod error;
pub mod random;
pub mod timer;
pub mod types;

pub use config::BotConfig;
pub use error::{BotError, Result};
pub use timer::{CountdownTimer, IntervalTimer};
pub use types::{AreaId, Difficulty, EntityHandle, PerTeam, Role, Seconds, Team};
