//! The world as the bot core sees it
//!
//! The host simulation owns bodies, props and physics. Each tick it exposes
//! them through [`WorldQuery`]; the bot core only reads.

pub mod feed;
pub mod inventory;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::types::{AreaId, EntityHandle, Role, Team};

pub use feed::{ContactEvent, DamageEvent};
pub use inventory::{Loadout, Weapon, WeaponCategory, WeaponId, WeaponSlot};

/// Who drives a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Controller {
    Human,
    Bot,
}

/// A living or dead player in the simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub handle: EntityHandle,
    pub team: Team,
    pub role: Role,
    pub controller: Controller,
    pub position: Vec3,
    pub alive: bool,
    pub on_ground: bool,
    pub invulnerable: bool,
    /// 0.0 = fully visible, 1.0 = fully concealed
    pub concealment: f32,
    /// Team this participant currently appears to belong to
    pub disguise: Option<Team>,
    pub burning: bool,
    pub bleeding: bool,
    /// Busy attaching a sabotage device to a structure
    pub placing_sabotage: bool,
}

impl Participant {
    pub fn new(handle: EntityHandle, team: Team, role: Role, position: Vec3) -> Self {
        Self {
            handle,
            team,
            role,
            controller: Controller::Bot,
            position,
            alive: true,
            on_ground: true,
            invulnerable: false,
            concealment: 0.0,
            disguise: None,
            burning: false,
            bleeding: false,
            placing_sabotage: false,
        }
    }

    pub fn human(handle: EntityHandle, team: Team, role: Role, position: Vec3) -> Self {
        Self {
            controller: Controller::Human,
            ..Self::new(handle, team, role, position)
        }
    }

    pub fn is_human(&self) -> bool {
        self.controller == Controller::Human
    }

    /// Team an observer believes this participant is on
    pub fn apparent_team(&self) -> Team {
        self.disguise.unwrap_or(self.team)
    }
}

/// Objective styles a scenario can use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectiveKind {
    ControlPoint,
    Flag,
    Cart,
}

/// Kinds of notable non-player objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Sentry,
    Dispenser,
    Teleporter,
    Objective(ObjectiveKind),
}

impl ObjectKind {
    /// Stationary team structures
    pub fn is_fortification(&self) -> bool {
        matches!(self, ObjectKind::Sentry | ObjectKind::Dispenser | ObjectKind::Teleporter)
    }
}

/// A structure or objective marker in the world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldObject {
    pub handle: EntityHandle,
    pub kind: ObjectKind,
    pub team: Team,
    pub position: Vec3,
    pub area: Option<AreaId>,
    /// Sapped, being carried, or otherwise neutralized
    pub disabled: bool,
    /// For objectives: whether it can currently be captured or pushed
    pub active: bool,
}

impl WorldObject {
    pub fn new(handle: EntityHandle, kind: ObjectKind, team: Team, position: Vec3) -> Self {
        Self {
            handle,
            kind,
            team,
            position,
            area: None,
            disabled: false,
            active: true,
        }
    }
}

/// Read-only view of the world consumed by the bot core
pub trait WorldQuery {
    fn participants(&self) -> &[Participant];

    fn objects(&self) -> &[WorldObject];

    /// True when nothing solid lies between the two points
    fn is_line_of_sight_clear(&self, from: Vec3, to: Vec3) -> bool;

    /// Team that has already won the current round, if decided
    fn round_winner(&self) -> Option<Team>;

    fn participant(&self, handle: EntityHandle) -> Option<&Participant> {
        self.participants().iter().find(|p| p.handle == handle)
    }

    fn object(&self, handle: EntityHandle) -> Option<&WorldObject> {
        self.objects().iter().find(|o| o.handle == handle)
    }

    /// Living participants on a team
    fn living(&self, team: Team) -> Vec<&Participant> {
        self.participants()
            .iter()
            .filter(|p| p.alive && p.team == team)
            .collect()
    }

    /// Enabled stationary structures owned by a team
    fn fortifications(&self, team: Team) -> Vec<&WorldObject> {
        self.objects()
            .iter()
            .filter(|o| o.kind.is_fortification() && o.team == team && !o.disabled)
            .collect()
    }

    /// Objective markers of any team
    fn objectives(&self) -> Vec<&WorldObject> {
        self.objects()
            .iter()
            .filter(|o| matches!(o.kind, ObjectKind::Objective(_)))
            .collect()
    }
}

/// Sphere that blocks sight
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Occluder {
    pub center: Vec3,
    pub radius: f32,
}

impl Occluder {
    /// Does the segment `from..to` pass through this sphere?
    pub fn blocks(&self, from: Vec3, to: Vec3) -> bool {
        let segment = to - from;
        let length_sq = segment.length_squared();
        if length_sq <= f32::EPSILON {
            return from.distance_squared(self.center) <= self.radius * self.radius;
        }
        let t = ((self.center - from).dot(segment) / length_sq).clamp(0.0, 1.0);
        let closest = from + segment * t;
        closest.distance_squared(self.center) <= self.radius * self.radius
    }
}

/// Plain per-tick copy of the world a host fills in
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub participants: Vec<Participant>,
    pub objects: Vec<WorldObject>,
    pub occluders: Vec<Occluder>,
    pub round_winner: Option<Team>,
}

impl WorldSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn participant_mut(&mut self, handle: EntityHandle) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.handle == handle)
    }

    /// Insert or replace a participant
    pub fn upsert(&mut self, participant: Participant) {
        match self.participant_mut(participant.handle) {
            Some(existing) => *existing = participant,
            None => self.participants.push(participant),
        }
    }

    pub fn remove(&mut self, handle: EntityHandle) {
        self.participants.retain(|p| p.handle != handle);
    }
}

impl WorldQuery for WorldSnapshot {
    fn participants(&self) -> &[Participant] {
        &self.participants
    }

    fn objects(&self) -> &[WorldObject] {
        &self.objects
    }

    fn is_line_of_sight_clear(&self, from: Vec3, to: Vec3) -> bool {
        !self.occluders.iter().any(|o| o.blocks(from, to))
    }

    fn round_winner(&self) -> Option<Team> {
        self.round_winner
    }
}
