//! Threat danger table
//!
//! Normalized severity of a subject: 0.0 harmless, 1.0 lethal.

use crate::core::types::Role;
use crate::world::{ObjectKind, Participant, WorldObject};

/// Reach of an automated emplacement
pub const SENTRY_RANGE: f32 = 1100.0;

/// Base danger of a role and, for ranged specialists, the distance beyond
/// which it cannot hurt anyone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreatProfile {
    pub danger: f32,
    pub envelope: Option<f32>,
}

pub fn role_threat(role: Role) -> ThreatProfile {
    let (danger, envelope) = match role {
        Role::Scout => (0.6, None),
        Role::Soldier => (0.8, None),
        Role::Pyro => (0.8, Some(750.0)),
        Role::Demolitions => (0.8, None),
        Role::Heavy => (1.0, Some(1500.0)),
        Role::Engineer => (0.4, None),
        Role::Medic => (0.2, None),
        Role::Sniper => (0.9, Some(4000.0)),
        Role::Spy => (1.0, None),
    };
    ThreatProfile { danger, envelope }
}

/// Danger of a participant seen at `range`
pub fn participant_danger(subject: &Participant, range: f32) -> f32 {
    if subject.invulnerable {
        return 1.0;
    }

    let profile = role_threat(subject.role);
    match profile.envelope {
        Some(envelope) if range > envelope => 0.0,
        _ => profile.danger,
    }
}

/// Danger of a world object seen at `range`
pub fn object_danger(object: &WorldObject, range: f32) -> f32 {
    if object.disabled {
        return 0.0;
    }
    match object.kind {
        ObjectKind::Sentry if range <= SENTRY_RANGE => 1.0,
        _ => 0.0,
    }
}
