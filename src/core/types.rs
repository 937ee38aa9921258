//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Simulation time in seconds
pub type Seconds = f32;

/// Handle of any participant or world object known to the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityHandle(pub u32);

impl EntityHandle {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Navigation area identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AreaId(pub u32);

/// Team membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Unassigned,
    Spectator,
    Red,
    Blue,
}

impl Team {
    /// The two teams that actually play a round
    pub const PLAYING: [Team; 2] = [Team::Red, Team::Blue];

    pub fn is_playing(&self) -> bool {
        matches!(self, Team::Red | Team::Blue)
    }

    /// Opposing playing team, if this is a playing team
    pub fn opponent(&self) -> Option<Team> {
        match self {
            Team::Red => Some(Team::Blue),
            Team::Blue => Some(Team::Red),
            _ => None,
        }
    }
}

/// A value kept separately for each playing team
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerTeam<T> {
    pub red: T,
    pub blue: T,
}

impl<T: Copy> PerTeam<T> {
    pub fn splat(value: T) -> Self {
        Self { red: value, blue: value }
    }

    /// Value for a playing team; `None` for spectators and unassigned
    pub fn get(&self, team: Team) -> Option<T> {
        match team {
            Team::Red => Some(self.red),
            Team::Blue => Some(self.blue),
            _ => None,
        }
    }

    pub fn set(&mut self, team: Team, value: T) {
        match team {
            Team::Red => self.red = value,
            Team::Blue => self.blue = value,
            _ => {}
        }
    }
}

/// Player roles (classes) a participant can play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Scout,
    Soldier,
    Pyro,
    Demolitions,
    Heavy,
    Engineer,
    Medic,
    Sniper,
    Spy,
}

impl Role {
    pub const ALL: [Role; 9] = [
        Role::Scout,
        Role::Soldier,
        Role::Pyro,
        Role::Demolitions,
        Role::Heavy,
        Role::Engineer,
        Role::Medic,
        Role::Sniper,
        Role::Spy,
    ];

    /// Roles that keep their own spacing instead of holding a squad slot
    pub fn self_manages_formation(&self) -> bool {
        matches!(self, Role::Medic)
    }

    /// Roles that try not to be noticed while moving
    pub fn is_stealthy(&self) -> bool {
        matches!(self, Role::Spy)
    }

    /// Roles that can take down an entrenched enemy fortification
    pub fn counters_fortifications(&self) -> bool {
        matches!(self, Role::Spy | Role::Demolitions | Role::Soldier)
    }

    /// Roles that never crouch-jump (spun-up weapons lose their stance)
    pub fn remains_standing(&self) -> bool {
        matches!(self, Role::Heavy)
    }
}

/// Bot skill level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
    Expert,
}

impl Difficulty {
    /// Index into per-difficulty tables
    pub fn index(&self) -> usize {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Normal => 1,
            Difficulty::Hard => 2,
            Difficulty::Expert => 3,
        }
    }
}

/// Whole-second slot a time falls into
pub fn whole_second(now: Seconds) -> i64 {
    now.floor() as i64
}
