//! Notifications emitted by the bot core

use serde::{Deserialize, Serialize};

use crate::core::types::{EntityHandle, Role, Seconds, Team};
use crate::decision::Mission;
use crate::squad::SquadId;

/// Something the host (or a log) should hear about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum BotEvent {
    AgentSpawned {
        agent: EntityHandle,
        name: String,
        team: Team,
        role: Role,
    },
    /// A pooled spectator agent went back into play
    AgentReassigned {
        agent: EntityHandle,
        team: Team,
        role: Role,
    },
    AgentRemoved {
        agent: EntityHandle,
    },
    /// Moved to spectators on death
    AgentBenched {
        agent: EntityHandle,
    },
    AgentDied {
        agent: EntityHandle,
        attacker: Option<EntityHandle>,
    },
    MissionChanged {
        agent: EntityHandle,
        mission: Mission,
    },
    SquadFormed {
        squad: SquadId,
        leader: EntityHandle,
    },
    SquadLeaderChanged {
        squad: SquadId,
        leader: EntityHandle,
    },
    SquadDisbanded {
        squad: SquadId,
        members: Vec<EntityHandle>,
    },
    /// An agent unmasked a disguised or hidden hostile
    SuspicionEscalated {
        agent: EntityHandle,
        subject: EntityHandle,
    },
    /// An ally nearby learned of the unmasking
    SuspicionShared {
        agent: EntityHandle,
        subject: EntityHandle,
    },
}

/// A [`BotEvent`] stamped with simulation time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub time: Seconds,
    #[serde(flatten)]
    pub event: BotEvent,
}
