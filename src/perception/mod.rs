//! Perception - what an agent knows about the world
//!
//! Each tick the perception module scans potentially visible subjects,
//! filters out what the agent should ignore, waits out a recognition delay
//! and keeps a [`KnownEntityMemory`] that forgets on timeout.

pub mod memory;
pub mod system;
pub mod threat;

use ahash::AHashSet;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::types::{Difficulty, EntityHandle, Role, Seconds, Team};
use crate::world::WorldQuery;

pub use memory::{KnownEntity, KnownEntityMemory};
pub use system::PerceptionSystem;
pub use threat::{object_danger, participant_danger, role_threat, ThreatProfile};

/// Designer-flagged subject categories an agent skips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IgnoreCategory {
    Role(Role),
    Sentries,
    /// Dispensers and teleporters
    SupportStructures,
}

/// Conditions that reveal an otherwise ignorable subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoticeCause {
    Burning,
    Bleeding,
    PartiallyConcealed,
    Sabotage,
}

/// Why a record left memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForgetReason {
    Timeout,
    /// A hidden hostile changed disguise while out of sight
    DisguiseChanged,
    /// A known hostile went fully concealed
    Concealed,
}

/// Things the decision layer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PerceptionEvent {
    Recognized { subject: EntityHandle },
    ForcedNotice { subject: EntityHandle, cause: NoticeCause },
    Forgotten { subject: EntityHandle, reason: ForgetReason },
}

/// The observing agent as perception needs to see it
#[derive(Debug, Clone, Copy)]
pub struct Observer<'a> {
    pub handle: EntityHandle,
    pub team: Team,
    pub position: Vec3,
    pub difficulty: Difficulty,
    pub ignored: &'a [IgnoreCategory],
    /// Hostiles this agent has unmasked; never ignored for their disguise
    pub known_hostiles: &'a AHashSet<EntityHandle>,
    /// Agents currently active, drives scan throttling
    pub population: usize,
}

/// Swappable perception strategy attached to an agent
pub trait Perception {
    /// Scan the world and refresh memory
    fn update(
        &mut self,
        observer: &Observer<'_>,
        world: &dyn WorldQuery,
        now: Seconds,
    ) -> Vec<PerceptionEvent>;

    fn known(&self) -> &KnownEntityMemory;

    /// Recognize a subject immediately, skipping the recognition delay
    fn recognize_now(
        &mut self,
        observer: &Observer<'_>,
        subject: EntityHandle,
        world: &dyn WorldQuery,
        now: Seconds,
    ) -> bool;

    fn forget(&mut self, subject: EntityHandle);

    /// Wipe all memory, used on respawn
    fn reset(&mut self);
}
