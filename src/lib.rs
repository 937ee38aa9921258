//! Skirmish Bots - AI core for team-based shooter bots
//!
//! Perception, decisions, locomotion, path costs, squads and population
//! quotas for computer-controlled participants. The host owns the world and
//! feeds it in through [`world::WorldQuery`] and [`nav::NavGraph`].

pub mod agent;
pub mod core;
pub mod decision;
pub mod locomotion;
pub mod nav;
pub mod perception;
pub mod population;
pub mod simulation;
pub mod squad;
pub mod world;

pub use crate::agent::Agent;
pub use crate::core::{BotConfig, BotError, Result};
pub use crate::simulation::BotSimulation;
