//! Primary threat selection

use std::cmp::Reverse;

use glam::Vec3;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::types::EntityHandle;
use crate::perception::KnownEntityMemory;

/// The subject an agent is currently dealing with
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threat {
    pub subject: EntityHandle,
    pub position: Vec3,
    pub visible: bool,
    pub danger: f32,
    pub range: f32,
}

/// Most pressing remembered threat
///
/// Visible beats remembered, then higher danger, then nearer.
pub fn select_primary_threat(memory: &KnownEntityMemory, position: Vec3) -> Option<Threat> {
    memory
        .iter()
        .map(|known| Threat {
            subject: known.subject,
            position: known.last_known_position,
            visible: known.visible,
            danger: known.danger,
            range: position.distance(known.last_known_position),
        })
        .max_by_key(|threat| {
            (
                threat.visible,
                OrderedFloat(threat.danger),
                Reverse(OrderedFloat(threat.range)),
                Reverse(threat.subject),
            )
        })
}
