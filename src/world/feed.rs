//! Events fed in by the host simulation

use serde::{Deserialize, Serialize};

use crate::core::types::{EntityHandle, Seconds};

/// Damage dealt to a participant
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DamageEvent {
    pub victim: EntityHandle,
    pub attacker: Option<EntityHandle>,
    pub amount: f32,
    pub fatal: bool,
    pub time: Seconds,
}

/// Physical contact between an agent and another participant
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContactEvent {
    pub agent: EntityHandle,
    pub subject: EntityHandle,
    pub time: Seconds,
}
